use super::*;
use crate::catalog::{ColumnDef, IndexDef};
use std::collections::HashSet;

fn col(name: &str, ty: ColumnType, nullable: bool) -> ColumnDef {
    ColumnDef {
        name: name.to_string(),
        ty,
        nullable,
    }
}

fn orders_def() -> TableDef {
    TableDef {
        name: "orders".to_string(),
        columns: vec![
            col("id", ColumnType::Int, false),
            col("customer", ColumnType::Int, true),
            col("status", ColumnType::String, true),
        ],
        primary_key: vec!["id".to_string()],
        indexes: vec![IndexDef {
            name: "by_customer".to_string(),
            columns: vec!["customer".to_string(), "-status".to_string()],
            unique: false,
        }],
        is_virtual: false,
    }
}

#[test]
fn test_add_table_allocates_columns_in_order() {
    let md = Metadata::new();
    let t = md.add_table(&orders_def()).unwrap();
    let table = md.table(t).unwrap();
    assert_eq!(table.columns.len(), 3);
    assert_eq!(table.columns[0], ColumnId::new(1));
    assert_eq!(table.columns[2], ColumnId::new(3));
    assert_eq!(md.column(ColumnId::new(2)).unwrap().name, "customer");
    assert_eq!(md.column_label(ColumnId::new(3)), "orders.status");
    assert!(table.not_null.contains(ColumnId::new(1)));
    assert!(!table.not_null.contains(ColumnId::new(2)));
}

#[test]
fn test_secondary_index_has_primary_key_suffix() {
    let md = Metadata::new();
    let t = md.add_table(&orders_def()).unwrap();
    let table = md.table(t).unwrap();
    assert_eq!(table.indexes.len(), 2);
    assert_eq!(table.primary_key(), vec![ColumnId::new(1)].into());

    let idx = table.index(IndexOrdinal(1)).unwrap();
    assert_eq!(
        idx.key_cols(),
        vec![ColumnId::new(2), ColumnId::new(3), ColumnId::new(1)].into()
    );
    assert!(idx.key.get(1).unwrap().descending);
    assert_eq!(table.index_by_name("BY_CUSTOMER"), Some(IndexOrdinal(1)));
    assert!(table.index(IndexOrdinal(7)).is_err());
}

#[test]
fn test_synthesized_columns_follow_table_columns() {
    let md = Metadata::new();
    md.add_table(&orders_def()).unwrap();
    let c = md.add_column("count_rows", ColumnType::Int);
    assert_eq!(c, ColumnId::new(4));
    assert_eq!(md.column_label(c), "count_rows");
    assert_eq!(md.column_count(), 4);
}

#[test]
fn test_invalid_table_burns_no_ids() {
    let md = Metadata::new();
    let mut def = orders_def();
    def.primary_key = vec!["missing".to_string()];
    assert!(matches!(
        md.add_table(&def),
        Err(CoreError::CatalogInvalid { .. })
    ));
    assert_eq!(md.column_count(), 0);
}

#[test]
fn test_duplicate_table_rejected() {
    let md = Metadata::new();
    md.add_table(&orders_def()).unwrap();
    assert!(matches!(
        md.add_table(&orders_def()),
        Err(CoreError::DuplicateTable { .. })
    ));
}

#[test]
fn test_virtual_table_has_no_indexes() {
    let md = Metadata::new();
    let t = md
        .add_table(&TableDef {
            name: "pg_settings".to_string(),
            columns: vec![col("name", ColumnType::String, true)],
            primary_key: vec![],
            indexes: vec![],
            is_virtual: true,
        })
        .unwrap();
    let table = md.table(t).unwrap();
    assert!(table.is_virtual);
    assert!(table.indexes.is_empty());
}

#[test]
fn test_unknown_ids() {
    let md = Metadata::new();
    assert!(matches!(
        md.column(ColumnId::new(1)),
        Err(CoreError::UnknownColumn { id: 1 })
    ));
    assert!(md.table(TableId::new(1)).is_err());
    assert!(md.sequence(SequenceId::new(1)).is_err());
    assert_eq!(md.column_label(ColumnId::new(9)), "@9");
}

#[test]
fn test_values_ids_are_distinct() {
    let md = Metadata::new();
    let a = md.next_values_id();
    let b = md.next_values_id();
    assert_ne!(a, b);
    assert_eq!(a, ValuesId::new(1));
}

#[test]
fn test_concurrent_allocation_never_duplicates() {
    let md = Metadata::new();
    let ids: Vec<ColumnId> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|w| {
                let md = &md;
                s.spawn(move || {
                    (0..200)
                        .map(|i| md.add_column(format!("w{w}_{i}"), ColumnType::Int))
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect()
    });
    let unique: HashSet<ColumnId> = ids.iter().copied().collect();
    assert_eq!(unique.len(), 1600);
    assert_eq!(md.column_count(), 1600);
    for id in ids {
        assert_eq!(md.column(id).unwrap().id, id);
    }
}

#[test]
fn test_from_catalog_registers_sequences() {
    let catalog: CatalogDef = serde_yaml::from_str(
        "tables:\n  - name: t\n    columns: [{name: a, type: int}]\n    primary_key: [a]\nsequences:\n  - name: s\n",
    )
    .unwrap();
    let md = Metadata::from_catalog(&catalog).unwrap();
    let seq = md.sequence_by_name("S").unwrap();
    assert_eq!(md.sequence(seq).unwrap().name, "s");
    assert_eq!(md.table_by_name("t").unwrap().columns.len(), 1);
}
