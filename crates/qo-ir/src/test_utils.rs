//! Shared test utilities for qo-ir

use crate::factory::Factory;
use crate::relop::RelRef;
use crate::scalar::{AggFunc, AggregationItem, Datum, ScalarExpr};
use qo_core::{CatalogDef, ColList, ColumnId, ColumnType, IndexOrdinal, Metadata, TableId};

/// Catalog registered by [`Fixture::new`].
///
/// Column ids: t.a=1 t.b=2 t.c=3, u.x=4 u.y=5, kv.k=6 kv.v=7 kv.w=8,
/// tv.name=9 tv.value=10.
pub const FIXTURE_CATALOG: &str = r#"
tables:
  - name: t
    columns:
      - { name: a, type: int, nullable: false }
      - { name: b, type: string }
      - { name: c, type: int, nullable: false }
    primary_key: [a]
    indexes:
      - { name: t_c, columns: [c] }
  - name: u
    columns:
      - { name: x, type: int, nullable: false }
      - { name: y, type: int }
    primary_key: [x]
    indexes:
      - { name: u_y, columns: [y] }
  - name: kv
    columns:
      - { name: k, type: int, nullable: false }
      - { name: v, type: string }
      - { name: w, type: int }
    primary_key: [k]
    indexes:
      - { name: kv_v, columns: [v] }
      - { name: kv_w, columns: ["-w"] }
  - name: tv
    virtual: true
    columns:
      - { name: name, type: string }
      - { name: value, type: int }
sequences:
  - name: s
"#;

/// A metadata registry preloaded with [`FIXTURE_CATALOG`]
pub struct Fixture {
    /// The registry
    pub md: Metadata,
}

impl Default for Fixture {
    fn default() -> Self {
        Self::new()
    }
}

impl Fixture {
    /// Register the fixture catalog
    pub fn new() -> Self {
        let catalog: CatalogDef =
            serde_yaml::from_str(FIXTURE_CATALOG).expect("fixture catalog parses");
        let md = Metadata::from_catalog(&catalog).expect("fixture catalog registers");
        Self { md }
    }

    /// A factory over the fixture's registry
    pub fn factory(&self) -> Factory<'_> {
        Factory::new(&self.md)
    }

    /// Table id by name
    pub fn table(&self, name: &str) -> TableId {
        self.md.table_by_name(name).expect("fixture table").id
    }

    /// Index ordinal by table and index name
    pub fn index(&self, table: &str, index: &str) -> IndexOrdinal {
        self.md
            .table_by_name(table)
            .expect("fixture table")
            .index_by_name(index)
            .expect("fixture index")
    }

    /// Column id by `table.column`
    pub fn col(&self, qualified: &str) -> ColumnId {
        let (table, column) = qualified.split_once('.').expect("table.column");
        let meta = self.md.table_by_name(table).expect("fixture table");
        let found = meta
            .columns
            .iter()
            .find(|c| {
                self.md
                    .column(*c)
                    .map(|m| m.name == column)
                    .unwrap_or(false)
            });
        found.expect("fixture column")
    }

    /// Primary-index scan of every column of `table`
    pub fn scan(&self, table: &str) -> RelRef {
        self.factory()
            .scan_table(self.table(table))
            .expect("fixture scan")
    }
}

/// Column reference
pub fn col(c: ColumnId) -> ScalarExpr {
    ScalarExpr::col(c)
}

/// Constant
pub fn lit(v: impl Into<Datum>) -> ScalarExpr {
    ScalarExpr::lit(v)
}

/// `left = right`
pub fn eq(left: ScalarExpr, right: ScalarExpr) -> ScalarExpr {
    ScalarExpr::eq(left, right)
}

/// One-column Values node of integers over a fresh column `x`
pub fn int_values(f: &Factory<'_>, values: &[i64]) -> (RelRef, ColumnId) {
    let c = f.metadata().add_column("x", ColumnType::Int);
    let rows = values.iter().map(|v| vec![lit(*v)]).collect();
    let node = f
        .values(rows, ColList::from(vec![c]))
        .expect("fixture values");
    (node, c)
}

/// `COUNT(*)` into a fresh column
pub fn count_rows(f: &Factory<'_>) -> AggregationItem {
    AggregationItem {
        col: f.metadata().add_column("count", ColumnType::Int),
        func: AggFunc::CountRows,
        arg: None,
    }
}
