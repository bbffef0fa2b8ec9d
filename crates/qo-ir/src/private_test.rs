use super::*;
use qo_core::OrderingColumn;

fn ints(values: &[i64]) -> Vec<Datum> {
    values.iter().map(|v| Datum::Int(*v)).collect()
}

#[test]
fn test_scan_direction() {
    let mut scan = ScanPrivate::new(TableId::new(1), ColSet::new());
    assert_eq!(scan.direction(), None);

    // A direction without a forced index carries no weight.
    scan.flags.direction = Some(ScanDirection::Reverse);
    assert_eq!(scan.direction(), None);
    scan.flags.force_index = true;
    assert_eq!(scan.direction(), Some(ScanDirection::Reverse));

    scan.hard_limit = Some(ScanLimit {
        rows: 5,
        reverse: false,
    });
    assert_eq!(scan.direction(), Some(ScanDirection::Forward));
    scan.hard_limit = Some(ScanLimit {
        rows: 5,
        reverse: true,
    });
    assert_eq!(scan.direction(), Some(ScanDirection::Reverse));
}

#[test]
fn test_span_bounds() {
    let span = Span {
        start: ints(&[2]),
        start_inclusive: false,
        end: ints(&[5]),
        end_inclusive: true,
    };
    assert!(!span.contains(&ints(&[2]), &[false]));
    assert!(span.contains(&ints(&[3]), &[false]));
    assert!(span.contains(&ints(&[5]), &[false]));
    assert!(!span.contains(&ints(&[6]), &[false]));

    let open = Span {
        start: vec![],
        start_inclusive: true,
        end: vec![],
        end_inclusive: true,
    };
    assert!(open.contains(&[Datum::Null], &[false]));
}

#[test]
fn test_span_prefix_and_descending_keys() {
    let point = Span::point(ints(&[7]));
    assert!(point.contains(&ints(&[7, 1]), &[false, false]));
    assert!(point.contains(&ints(&[7, 99]), &[false, false]));
    assert!(!point.contains(&ints(&[8, 1]), &[false, false]));

    // On a descending column the span runs from high to low values.
    let desc = Span {
        start: ints(&[9]),
        start_inclusive: true,
        end: ints(&[3]),
        end_inclusive: true,
    };
    assert!(desc.contains(&ints(&[5]), &[true]));
    assert!(!desc.contains(&ints(&[10]), &[true]));
    assert!(!desc.contains(&ints(&[5]), &[false]));
}

#[test]
fn test_constraint_matches_any_span() {
    let constraint = Constraint {
        columns: Ordering::from(vec![OrderingColumn::asc(ColumnId::new(3))]),
        spans: vec![Span::point(ints(&[1])), Span::point(ints(&[4]))],
    };
    assert!(constraint.contains(&ints(&[1])));
    assert!(constraint.contains(&ints(&[4])));
    assert!(!constraint.contains(&ints(&[2])));
}

#[test]
fn test_join_type_columns() {
    assert!(JoinType::Semi.left_cols_only());
    assert!(JoinType::Anti.left_cols_only());
    assert!(!JoinType::Left.left_cols_only());
    assert_eq!(JoinType::Full.to_string(), "full");
}

#[test]
fn test_private_yaml_defaults() {
    let scan: ScanPrivate = serde_yaml::from_str("{ table: 1, index: 0, cols: [1, 2] }").unwrap();
    assert_eq!(scan.constraint, None);
    assert_eq!(scan.flags, ScanFlags::default());
    assert!(scan.cols.contains(ColumnId::new(2)));

    let span: Span = serde_yaml::from_str("{ start: [1] }").unwrap();
    assert!(span.start_inclusive && span.end_inclusive);
    assert!(span.end.is_empty());

    let trace: ShowTracePrivate = serde_yaml::from_str("{ cols: [4] }").unwrap();
    assert_eq!(trace.trace_type, TraceType::Trace);
    assert!(!trace.compact);
}

fn cols(ids: &[u32]) -> ColList {
    ids.iter().map(|i| ColumnId::new(*i)).collect()
}

fn set(ids: &[u32]) -> ColSet {
    ids.iter().map(|i| ColumnId::new(*i)).collect()
}

/// JSON and YAML both give back an equal value
fn assert_round_trip<T>(value: &T)
where
    T: Serialize + serde::de::DeserializeOwned + PartialEq + std::fmt::Debug,
{
    let json = serde_json::to_string(value).unwrap();
    let from_json: T = serde_json::from_str(&json).unwrap();
    assert_eq!(&from_json, value, "json: {json}");

    let yaml = serde_yaml::to_string(value).unwrap();
    let from_yaml: T = serde_yaml::from_str(&yaml).unwrap();
    assert_eq!(&from_yaml, value, "yaml: {yaml}");
}

#[test]
fn test_scan_privates_round_trip() {
    let ordering = Ordering::from(vec![
        OrderingColumn::asc(ColumnId::new(3)),
        OrderingColumn::desc(ColumnId::new(1)),
    ]);
    let scan = ScanPrivate {
        table: TableId::new(1),
        index: IndexOrdinal(1),
        cols: set(&[1, 3]),
        constraint: Some(Constraint {
            columns: ordering,
            spans: vec![
                Span::point(vec![Datum::Int(4), Datum::Null]),
                Span {
                    start: vec![Datum::String("10".into())],
                    start_inclusive: false,
                    end: vec![],
                    end_inclusive: true,
                },
            ],
        }),
        hard_limit: Some(ScanLimit {
            rows: 10,
            reverse: true,
        }),
        flags: ScanFlags {
            no_index_join: true,
            force_index: true,
            direction: Some(ScanDirection::Reverse),
        },
    };
    assert_round_trip(&scan);
    assert_round_trip(&ScanPrivate::new(TableId::new(2), ColSet::new()));
    assert_round_trip(&VirtualScanPrivate {
        table: TableId::new(4),
        cols: set(&[9, 10]),
    });
    assert_round_trip(&SequenceSelectPrivate {
        sequence: SequenceId::new(1),
        cols: cols(&[11, 12, 13]),
    });
    assert_round_trip(&ValuesPrivate {
        cols: cols(&[14, 15]),
        id: ValuesId::new(2),
    });
}

#[test]
fn test_join_privates_round_trip() {
    assert_round_trip(&JoinPrivate {
        flags: JoinFlags {
            disallow_merge_join: true,
            ..JoinFlags::default()
        },
    });
    assert_round_trip(&IndexJoinPrivate {
        table: TableId::new(1),
        cols: set(&[1, 2, 3]),
    });
    assert_round_trip(&LookupJoinPrivate {
        join_type: JoinType::Left,
        table: TableId::new(2),
        index: IndexOrdinal(1),
        key_cols: cols(&[2]),
        cols: set(&[1, 2, 4, 5]),
    });
    let left = Ordering::from(vec![OrderingColumn::desc(ColumnId::new(1))]);
    let right = Ordering::from(vec![OrderingColumn::desc(ColumnId::new(4))]);
    let mut right_ordering = OrderingChoice::from_ordering(&right);
    right_ordering.optional = set(&[5]);
    assert_round_trip(&MergeJoinPrivate {
        join_type: JoinType::Full,
        left_ordering: OrderingChoice::from_ordering(&left),
        right_ordering,
        left_eq: left,
        right_eq: right,
    });
    assert_round_trip(&ZigzagJoinPrivate {
        left_table: TableId::new(3),
        left_index: IndexOrdinal(1),
        right_table: TableId::new(3),
        right_index: IndexOrdinal(2),
        left_eq_cols: cols(&[6]),
        right_eq_cols: cols(&[6]),
        left_fixed_cols: cols(&[7]),
        right_fixed_cols: cols(&[8]),
        left_fixed_vals: vec![Datum::String("1".into())],
        right_fixed_vals: vec![Datum::Int(-2)],
        cols: set(&[6, 7, 8]),
    });
}

#[test]
fn test_other_privates_round_trip() {
    assert_round_trip(&GroupingPrivate {
        grouping_cols: set(&[1, 2]),
        ordering: OrderingChoice::from_ordering(&Ordering::from(vec![OrderingColumn::asc(
            ColumnId::new(3),
        )])),
    });
    assert_round_trip(&GroupingPrivate::default());
    assert_round_trip(&SetPrivate {
        left_cols: cols(&[1, 2]),
        right_cols: cols(&[4, 5]),
        out_cols: cols(&[20, 21]),
    });
    assert_round_trip(&RowNumberPrivate {
        ordering: OrderingChoice::any(),
        col: ColumnId::new(22),
    });
    assert_round_trip(&ExplainPrivate {
        options: ExplainOptions {
            verbose: true,
            types: false,
        },
        cols: cols(&[23]),
    });
    assert_round_trip(&ShowTracePrivate {
        trace_type: TraceType::Kv,
        compact: true,
        cols: cols(&[24, 25, 26]),
    });
    assert_round_trip(&FakeRelPrivate {
        props: RelProps {
            output_cols: set(&[1, 2]),
            output_list: Some(cols(&[2, 1])),
            outer_cols: set(&[4]),
            cardinality: crate::props::Cardinality::at_most(1),
            not_null_cols: set(&[1]),
        },
    });
}
