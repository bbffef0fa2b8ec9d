//! Per-compilation metadata registry and identifier allocator.
//!
//! A [`Metadata`] is created for exactly one query compilation. It hands out
//! every [`ColumnId`], [`TableId`], [`SequenceId`] and [`ValuesId`] used by
//! that compilation and resolves them back to names and types. Expressions
//! only ever store the ids.
//!
//! `Metadata` is `Sync`: column registration is serialized by one mutex so
//! that ids stay unique when several workers allocate concurrently.

use crate::catalog::{parse_index_column, CatalogDef, ColumnType, SequenceDef, TableDef};
use crate::colset::{ColList, ColSet};
use crate::error::{CoreError, CoreResult};
use crate::ids::{ColumnId, IndexOrdinal, SequenceId, TableId, ValuesId};
use crate::ordering::{Ordering, OrderingColumn};
use std::sync::atomic::{AtomicU32, Ordering as AtomicOrdering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

/// Resolved information about a column id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMeta {
    /// The column's id
    pub id: ColumnId,
    /// Display name (unqualified)
    pub name: String,
    /// Column type
    pub ty: ColumnType,
    /// Whether the column may hold NULL
    pub nullable: bool,
    /// Owning table, for base-table columns
    pub table: Option<TableId>,
}

impl ColumnMeta {
    /// `table.column` for base-table columns, the bare name otherwise
    pub fn qualified_name(&self, md: &Metadata) -> String {
        match self.table.and_then(|t| md.table(t).ok()) {
            Some(table) => format!("{}.{}", table.name, self.name),
            None => self.name.clone(),
        }
    }
}

/// A registered index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexMeta {
    /// Index name
    pub name: String,
    /// Key columns in index order (including the implicit primary key suffix
    /// of secondary indexes)
    pub key: Ordering,
    /// Number of leading key columns that are unique
    pub unique_prefix: Option<usize>,
}

impl IndexMeta {
    /// Key column ids in index order
    pub fn key_cols(&self) -> ColList {
        self.key.col_list()
    }
}

/// A registered table with the column ids allocated for it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableMeta {
    /// The table's id
    pub id: TableId,
    /// Table name
    pub name: String,
    /// Column ids in table order
    pub columns: ColList,
    /// Columns declared NOT NULL
    pub not_null: ColSet,
    /// Indexes; ordinal 0 is the primary index (absent for virtual tables)
    pub indexes: Vec<IndexMeta>,
    /// Virtual table flag
    pub is_virtual: bool,
}

impl TableMeta {
    /// All column ids of the table
    pub fn col_set(&self) -> ColSet {
        self.columns.to_set()
    }

    /// Resolve an index ordinal
    pub fn index(&self, ordinal: IndexOrdinal) -> CoreResult<&IndexMeta> {
        self.indexes
            .get(ordinal.0 as usize)
            .ok_or_else(|| CoreError::UnknownIndex {
                table: self.name.clone(),
                index: ordinal.0,
            })
    }

    /// Primary key column ids
    pub fn primary_key(&self) -> ColList {
        self.indexes
            .first()
            .map(IndexMeta::key_cols)
            .unwrap_or_default()
    }

    /// Find an index by name
    pub fn index_by_name(&self, name: &str) -> Option<IndexOrdinal> {
        self.indexes
            .iter()
            .position(|i| i.name.eq_ignore_ascii_case(name))
            .map(|i| IndexOrdinal(i as u32))
    }
}

/// A registered sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceMeta {
    /// The sequence's id
    pub id: SequenceId,
    /// Sequence name
    pub name: String,
}

/// Metadata for one query compilation
#[derive(Debug, Default)]
pub struct Metadata {
    columns: Mutex<Vec<ColumnMeta>>,
    tables: RwLock<Vec<Arc<TableMeta>>>,
    sequences: RwLock<Vec<SequenceMeta>>,
    next_values_id: AtomicU32,
}

impl Metadata {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with every table and sequence of `catalog` registered
    pub fn from_catalog(catalog: &CatalogDef) -> CoreResult<Self> {
        let md = Self::new();
        for table in &catalog.tables {
            md.add_table(table)?;
        }
        for seq in &catalog.sequences {
            md.add_sequence(seq);
        }
        Ok(md)
    }

    /// Allocate a new synthesized column (projection, aggregate, row number...)
    pub fn add_column(&self, name: impl Into<String>, ty: ColumnType) -> ColumnId {
        let mut columns = self.columns.lock().unwrap_or_else(PoisonError::into_inner);
        Self::push_column(&mut columns, name.into(), ty, true, None)
    }

    fn push_column(
        columns: &mut Vec<ColumnMeta>,
        name: String,
        ty: ColumnType,
        nullable: bool,
        table: Option<TableId>,
    ) -> ColumnId {
        let id = ColumnId::new(columns.len() as u32 + 1);
        columns.push(ColumnMeta {
            id,
            name,
            ty,
            nullable,
            table,
        });
        id
    }

    /// Register a table, allocating one column id per table column
    pub fn add_table(&self, def: &TableDef) -> CoreResult<TableId> {
        if !def.is_virtual && def.primary_key.is_empty() {
            return Err(CoreError::CatalogInvalid {
                name: def.name.clone(),
                message: "non-virtual tables require a primary_key".to_string(),
            });
        }
        if def.is_virtual && !def.indexes.is_empty() {
            return Err(CoreError::CatalogInvalid {
                name: def.name.clone(),
                message: "virtual tables cannot declare indexes".to_string(),
            });
        }

        let mut tables = self.tables.write().unwrap_or_else(PoisonError::into_inner);
        if tables.iter().any(|t| t.name.eq_ignore_ascii_case(&def.name)) {
            return Err(CoreError::DuplicateTable {
                name: def.name.clone(),
            });
        }
        let table_id = TableId::new(tables.len() as u32 + 1);

        // Validate key columns before allocating so a bad definition burns no ids.
        let resolve = |spec: &str| -> CoreResult<(usize, bool)> {
            let (name, descending) = parse_index_column(spec);
            def.column_ordinal(name)
                .map(|ord| (ord, descending))
                .ok_or_else(|| CoreError::CatalogInvalid {
                    name: def.name.clone(),
                    message: format!("unknown key column '{name}'"),
                })
        };
        let pk: Vec<(usize, bool)> = def
            .primary_key
            .iter()
            .map(|s| resolve(s))
            .collect::<CoreResult<_>>()?;
        let secondary: Vec<Vec<(usize, bool)>> = def
            .indexes
            .iter()
            .map(|idx| idx.columns.iter().map(|s| resolve(s)).collect())
            .collect::<CoreResult<_>>()?;

        let mut columns = self.columns.lock().unwrap_or_else(PoisonError::into_inner);
        let col_ids: Vec<ColumnId> = def
            .columns
            .iter()
            .map(|c| {
                Self::push_column(&mut columns, c.name.clone(), c.ty, c.nullable, Some(table_id))
            })
            .collect();
        drop(columns);

        let to_ordering = |keys: &[(usize, bool)]| -> Ordering {
            keys.iter()
                .map(|&(ord, descending)| OrderingColumn {
                    col: col_ids[ord],
                    descending,
                })
                .collect()
        };

        let mut indexes = Vec::new();
        if !def.is_virtual {
            indexes.push(IndexMeta {
                name: "primary".to_string(),
                key: to_ordering(&pk),
                unique_prefix: Some(pk.len()),
            });
            for (idx, keys) in def.indexes.iter().zip(&secondary) {
                // Secondary indexes are implicitly suffixed by the primary key.
                let mut full = keys.clone();
                for key in &pk {
                    if !full.iter().any(|(ord, _)| *ord == key.0) {
                        full.push(*key);
                    }
                }
                indexes.push(IndexMeta {
                    name: idx.name.clone(),
                    key: to_ordering(&full),
                    unique_prefix: idx.unique.then_some(keys.len()),
                });
            }
        }

        let not_null = def
            .columns
            .iter()
            .zip(&col_ids)
            .filter(|(c, _)| !c.nullable)
            .map(|(_, id)| *id)
            .collect();

        log::debug!(
            "registered table '{}' as {} with {} columns",
            def.name,
            table_id,
            col_ids.len()
        );
        tables.push(Arc::new(TableMeta {
            id: table_id,
            name: def.name.clone(),
            columns: col_ids.into(),
            not_null,
            indexes,
            is_virtual: def.is_virtual,
        }));
        Ok(table_id)
    }

    /// Register a sequence
    pub fn add_sequence(&self, def: &SequenceDef) -> SequenceId {
        let mut sequences = self.sequences.write().unwrap_or_else(PoisonError::into_inner);
        let id = SequenceId::new(sequences.len() as u32 + 1);
        sequences.push(SequenceMeta {
            id,
            name: def.name.clone(),
        });
        id
    }

    /// Allocate a fresh identity for a `Values` node
    pub fn next_values_id(&self) -> ValuesId {
        ValuesId::new(self.next_values_id.fetch_add(1, AtomicOrdering::SeqCst) + 1)
    }

    /// Resolve a column id
    pub fn column(&self, id: ColumnId) -> CoreResult<ColumnMeta> {
        let columns = self.columns.lock().unwrap_or_else(PoisonError::into_inner);
        columns
            .get(id.index())
            .filter(|c| c.id == id)
            .cloned()
            .ok_or(CoreError::UnknownColumn { id: id.get() })
    }

    /// Display name for a column, falling back to `@id` for unknown ids
    pub fn column_label(&self, id: ColumnId) -> String {
        self.column(id)
            .map(|c| c.qualified_name(self))
            .unwrap_or_else(|_| id.to_string())
    }

    /// Number of columns allocated so far
    pub fn column_count(&self) -> usize {
        self.columns
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Resolve a table id
    pub fn table(&self, id: TableId) -> CoreResult<Arc<TableMeta>> {
        let tables = self.tables.read().unwrap_or_else(PoisonError::into_inner);
        tables
            .get(id.index())
            .filter(|t| t.id == id)
            .cloned()
            .ok_or(CoreError::UnknownTable { id: id.get() })
    }

    /// Find a table by name (case-insensitive)
    pub fn table_by_name(&self, name: &str) -> CoreResult<Arc<TableMeta>> {
        let tables = self.tables.read().unwrap_or_else(PoisonError::into_inner);
        tables
            .iter()
            .find(|t| t.name.eq_ignore_ascii_case(name))
            .cloned()
            .ok_or_else(|| CoreError::UnknownTableName {
                name: name.to_string(),
            })
    }

    /// Resolve a sequence id
    pub fn sequence(&self, id: SequenceId) -> CoreResult<SequenceMeta> {
        let sequences = self.sequences.read().unwrap_or_else(PoisonError::into_inner);
        sequences
            .get(id.index())
            .filter(|s| s.id == id)
            .cloned()
            .ok_or(CoreError::UnknownSequence { id: id.get() })
    }

    /// Find a sequence by name (case-insensitive)
    pub fn sequence_by_name(&self, name: &str) -> Option<SequenceId> {
        let sequences = self.sequences.read().unwrap_or_else(PoisonError::into_inner);
        sequences
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(name))
            .map(|s| s.id)
    }
}

#[cfg(test)]
#[path = "metadata_test.rs"]
mod tests;
