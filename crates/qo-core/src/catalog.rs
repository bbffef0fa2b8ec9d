//! Declarative catalog definitions (tables, indexes, sequences) loaded from YAML

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Logical type of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    /// BOOL
    Bool,
    /// INT (64-bit)
    Int,
    /// STRING
    String,
    /// Type could not be determined
    #[default]
    Unknown,
}

impl std::fmt::Display for ColumnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ColumnType::Bool => write!(f, "bool"),
            ColumnType::Int => write!(f, "int"),
            ColumnType::String => write!(f, "string"),
            ColumnType::Unknown => write!(f, "unknown"),
        }
    }
}

/// A column of a table definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ColumnDef {
    /// Column name, unique within the table
    pub name: String,
    /// Column type
    #[serde(rename = "type", default)]
    pub ty: ColumnType,
    /// Whether the column accepts NULL
    #[serde(default = "default_nullable")]
    pub nullable: bool,
}

fn default_nullable() -> bool {
    true
}

/// A secondary index definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IndexDef {
    /// Index name
    pub name: String,
    /// Key columns in index order. A leading `-` marks a descending column.
    pub columns: Vec<String>,
    /// Whether the declared key columns are unique
    #[serde(default)]
    pub unique: bool,
}

/// A table definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TableDef {
    /// Table name
    pub name: String,
    /// Columns in table order
    pub columns: Vec<ColumnDef>,
    /// Primary key columns; required for non-virtual tables
    #[serde(default)]
    pub primary_key: Vec<String>,
    /// Secondary indexes
    #[serde(default)]
    pub indexes: Vec<IndexDef>,
    /// Virtual (system) table: no indexes, always fully scanned
    #[serde(default, rename = "virtual")]
    pub is_virtual: bool,
}

/// A sequence definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SequenceDef {
    /// Sequence name
    pub name: String,
}

/// A catalog file: tables and sequences known to a compilation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CatalogDef {
    /// Table definitions
    #[serde(default)]
    pub tables: Vec<TableDef>,
    /// Sequence definitions
    #[serde(default)]
    pub sequences: Vec<SequenceDef>,
}

impl CatalogDef {
    /// Load a catalog from a YAML file
    pub fn load(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        let catalog: CatalogDef = serde_yaml::from_str(&content)?;
        Ok(catalog)
    }

    /// Append another catalog's definitions to this one
    pub fn merge(&mut self, other: CatalogDef) {
        self.tables.extend(other.tables);
        self.sequences.extend(other.sequences);
    }
}

impl TableDef {
    /// Ordinal of the named column within the table
    pub fn column_ordinal(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.name.eq_ignore_ascii_case(name))
    }
}

/// Split an index column spec (`"-col"` / `"col"`) into name and direction
pub(crate) fn parse_index_column(spec: &str) -> (&str, bool) {
    match spec.strip_prefix('-') {
        Some(name) => (name, true),
        None => (spec, false),
    }
}
