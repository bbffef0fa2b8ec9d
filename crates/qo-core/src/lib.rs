//! qo-core - Core library for qopt
//!
//! This crate provides the column primitives shared by every layer of the
//! optimizer IR: opaque identifiers, column sets and lists, orderings, the
//! per-compilation metadata registry, catalog definitions and configuration.

pub mod catalog;
pub mod colset;
pub mod config;
pub mod error;
pub mod ids;
pub mod metadata;
pub mod ordering;

pub use catalog::{CatalogDef, ColumnDef, ColumnType, IndexDef, SequenceDef, TableDef};
pub use colset::{ColList, ColSet};
pub use config::{Config, OutputFormat};
pub use error::{CoreError, CoreResult};
pub use ids::{ColumnId, IndexOrdinal, SequenceId, TableId, ValuesId};
pub use metadata::{ColumnMeta, IndexMeta, Metadata, SequenceMeta, TableMeta};
pub use ordering::{Ordering, OrderingChoice, OrderingChoiceColumn, OrderingColumn};
