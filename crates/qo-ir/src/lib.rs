//! qo-ir: relational expression IR for a cost-based query optimizer
//!
//! This crate provides the closed set of relational operators, their private
//! metadata and static tags, a factory that checks each operator's
//! construction rules and derives relational properties, a plan printer,
//! YAML plan definitions and a reference evaluator.

pub mod catalog;
pub(crate) mod error;
pub mod eval;
pub(crate) mod factory;
pub mod format;
pub(crate) mod operator;
pub mod plan_def;
pub mod private;
pub(crate) mod props;
pub(crate) mod relop;
pub mod scalar;
pub(crate) mod tag;
pub mod telemetry;
pub(crate) mod validate;
pub mod walk;

#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;

pub use catalog::{operator_def, operator_defs, ChildSlot, OperatorDef, PrivateDef, PrivateField};
pub use error::{ExecError, ExecResult, IrError, IrResult};
pub use eval::{DataStore, Evaluator, Relation, SequenceState};
pub use factory::Factory;
pub use format::{render, render_with, FormatOptions};
pub use operator::Operator;
pub use plan_def::{BuiltPlan, PlanDef};
pub use props::{table_props, Cardinality, RelProps};
pub use relop::{Child, ChildKind, GroupingExpr, JoinExpr, RelExpr, RelNode, RelRef, SetExpr};
pub use scalar::{
    AggFunc, AggregationItem, BinOp, Datum, Filters, Generator, ProjectionItem, ScalarExpr, UnOp,
    ZipItem,
};
pub use tag::{Tag, TagSet};
pub use telemetry::FeatureCounts;
