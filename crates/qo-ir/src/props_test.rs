use super::*;
use crate::private::{JoinPrivate, ScanLimit, ScanPrivate};
use crate::test_utils::*;
use qo_core::{ColumnType, OrderingChoice};

#[test]
fn test_cardinality_arithmetic() {
    let three = Cardinality::exactly(3);
    assert_eq!(three.limit(2), Cardinality::exactly(2));
    assert_eq!(three.skip(5), Cardinality::exactly(0));
    assert_eq!(three.as_optional(), Cardinality::at_most(3));
    assert_eq!(three.add(Cardinality::ANY), Cardinality { min: 3, max: None });
    assert_eq!(three.product(Cardinality::exactly(4)), Cardinality::exactly(12));
    assert_eq!(Cardinality::ANY.limit(1), Cardinality::at_most(1));
    assert!(three.allows(3));
    assert!(!three.allows(2));
    assert_eq!(Cardinality::ANY.to_string(), "[0 - ]");
    assert_eq!(three.to_string(), "[3 - 3]");
}

#[test]
fn test_scan_props() {
    let fx = Fixture::new();
    let f = fx.factory();
    let scan = fx.scan("t");
    let props = scan.props();
    assert_eq!(props.output_cols.len(), 3);
    assert!(props.not_null_cols.contains(fx.col("t.a")));
    assert!(!props.not_null_cols.contains(fx.col("t.b")));
    assert!(props.is_closed());
    assert_eq!(props.cardinality, Cardinality::ANY);

    let mut private = ScanPrivate::new(fx.table("t"), ColSet::single(fx.col("t.a")));
    private.hard_limit = Some(ScanLimit {
        rows: 4,
        reverse: false,
    });
    let limited = f.scan(private).unwrap();
    assert_eq!(limited.props().cardinality, Cardinality::at_most(4));
}

#[test]
fn test_values_props() {
    let fx = Fixture::new();
    let f = fx.factory();
    let c = fx.md.add_column("v", ColumnType::Int);
    let values = f
        .values(
            vec![vec![lit(1)], vec![ScalarExpr::null()]],
            ColList::from(vec![c]),
        )
        .unwrap();
    assert_eq!(values.props().cardinality, Cardinality::exactly(2));
    assert!(values.props().not_null_cols.is_empty());
    assert_eq!(values.props().output_list, Some(ColList::from(vec![c])));

    let (ints, x) = int_values(&f, &[1, 2]);
    assert!(ints.props().not_null_cols.contains(x));
}

#[test]
fn test_select_rejects_nulls() {
    let fx = Fixture::new();
    let f = fx.factory();
    let b = fx.col("t.b");
    let select = f.select(fx.scan("t"), vec![eq(col(b), lit("x"))]).unwrap();
    assert!(select.props().not_null_cols.contains(b));
    assert_eq!(select.props().cardinality, Cardinality::ANY);
}

#[test]
fn test_correlated_select_has_outer_cols() {
    let fx = Fixture::new();
    let f = fx.factory();
    let select = f
        .select(fx.scan("u"), vec![eq(col(fx.col("u.x")), col(fx.col("t.a")))])
        .unwrap();
    assert_eq!(select.props().outer_cols, ColSet::single(fx.col("t.a")));
    assert!(!select.props().is_closed());
}

#[test]
fn test_apply_join_binds_left_columns() {
    let fx = Fixture::new();
    let f = fx.factory();
    let right = f
        .select(fx.scan("u"), vec![eq(col(fx.col("u.x")), col(fx.col("t.a")))])
        .unwrap();
    let apply = f
        .join(
            Operator::InnerJoinApply,
            fx.scan("t"),
            right,
            vec![],
            JoinPrivate::default(),
        )
        .unwrap();
    assert!(apply.props().is_closed());
    assert_eq!(apply.output_cols().len(), 5);
}

#[test]
fn test_join_nullability_by_type() {
    let fx = Fixture::new();
    let f = fx.factory();
    let on = || vec![eq(col(fx.col("t.a")), col(fx.col("u.x")))];
    let build = |op: Operator| {
        f.join(op, fx.scan("t"), fx.scan("u"), on(), JoinPrivate::default())
            .unwrap()
    };
    let (a, x) = (fx.col("t.a"), fx.col("u.x"));

    let inner = build(Operator::InnerJoin);
    assert!(inner.props().not_null_cols.contains(a) && inner.props().not_null_cols.contains(x));

    let left = build(Operator::LeftJoin);
    assert!(left.props().not_null_cols.contains(a));
    assert!(!left.props().not_null_cols.contains(x));

    let right = build(Operator::RightJoin);
    assert!(!right.props().not_null_cols.contains(a));
    assert!(right.props().not_null_cols.contains(x));

    let full = build(Operator::FullJoin);
    assert!(full.props().not_null_cols.is_empty());

    let semi = build(Operator::SemiJoin);
    assert_eq!(semi.output_cols(), fx.scan("t").output_cols());
}

#[test]
fn test_grouping_cardinality() {
    let fx = Fixture::new();
    let f = fx.factory();
    let (input, x) = int_values(&f, &[1, 2, 3]);

    let grouped = f
        .group_by(input.clone(), vec![count_rows(&f)], ColSet::single(x))
        .unwrap();
    assert_eq!(grouped.props().cardinality, Cardinality { min: 1, max: Some(3) });
    assert!(grouped.props().not_null_cols.contains(x));

    let one = f
        .group_by(input.clone(), vec![count_rows(&f)], ColSet::new())
        .unwrap();
    assert_eq!(one.props().cardinality, Cardinality::exactly(1));

    let empty = f.select(input, vec![lit(false)]).unwrap();
    let scalar = f.scalar_group_by(empty.clone(), vec![count_rows(&f)]).unwrap();
    assert_eq!(scalar.props().cardinality, Cardinality::exactly(1));
    let grouped = f.group_by(empty, vec![], ColSet::new()).unwrap();
    assert_eq!(grouped.props().cardinality, Cardinality::at_most(1));
}

#[test]
fn test_set_op_props() {
    let fx = Fixture::new();
    let f = fx.factory();
    let (two, l) = int_values(&f, &[1, 2]);
    let (three, r) = int_values(&f, &[2, 3, 4]);
    let build = |op: Operator| {
        f.set_op_new_cols(
            op,
            two.clone(),
            three.clone(),
            ColList::from(vec![l]),
            ColList::from(vec![r]),
        )
        .unwrap()
    };
    assert_eq!(build(Operator::UnionAll).props().cardinality, Cardinality::exactly(5));
    assert_eq!(
        build(Operator::Union).props().cardinality,
        Cardinality { min: 1, max: Some(5) }
    );
    assert_eq!(build(Operator::Intersect).props().cardinality, Cardinality::at_most(2));
    assert_eq!(build(Operator::ExceptAll).props().cardinality, Cardinality::at_most(2));

    let union = build(Operator::Union);
    assert_eq!(union.props().not_null_cols.len(), 1);
    assert_eq!(union.props().output_list.as_ref().map(ColList::len), Some(1));
}

#[test]
fn test_limit_and_offset_cardinality() {
    let fx = Fixture::new();
    let f = fx.factory();
    let (input, _) = int_values(&f, &[1, 2, 3]);
    let limit = f
        .limit(input.clone(), lit(2), OrderingChoice::any())
        .unwrap();
    assert_eq!(limit.props().cardinality, Cardinality::exactly(2));
    let offset = f
        .offset(input.clone(), lit(1), OrderingChoice::any())
        .unwrap();
    assert_eq!(offset.props().cardinality, Cardinality::exactly(2));
    let max1 = f.max1_row(input).unwrap();
    assert_eq!(max1.props().cardinality, Cardinality::exactly(1));

    let scan_limit = f
        .limit(fx.scan("t"), lit(10), OrderingChoice::any())
        .unwrap();
    assert_eq!(scan_limit.props().cardinality, Cardinality::at_most(10));
}

#[test]
fn test_row_number_adds_not_null_column() {
    let fx = Fixture::new();
    let f = fx.factory();
    let numbered = f.row_number(fx.scan("t"), OrderingChoice::any()).unwrap();
    assert_eq!(numbered.output_cols().len(), 4);
    let RelExpr::RowNumber { private, .. } = numbered.expr() else {
        panic!("expected row-number");
    };
    assert!(numbered.props().not_null_cols.contains(private.col));
}

#[test]
fn test_table_props_on_demand() {
    let fx = Fixture::new();
    let props = table_props(&fx.md, fx.table("kv"), fx.index("kv", "kv_w")).unwrap();
    assert_eq!(props.output_cols.len(), 3);
    assert_eq!(props.not_null_cols, ColSet::single(fx.col("kv.k")));

    let missing = table_props(&fx.md, fx.table("kv"), IndexOrdinal(9));
    assert!(missing.is_err());
}

#[test]
fn test_fake_rel_reports_props_verbatim() {
    let fx = Fixture::new();
    let f = fx.factory();
    let c = fx.md.add_column("fake", ColumnType::Int);
    let props = RelProps {
        cardinality: Cardinality::exactly(7),
        not_null_cols: ColSet::single(c),
        ..RelProps::with_cols(ColSet::single(c))
    };
    let fake = f.fake_rel(props.clone()).unwrap();
    assert_eq!(fake.props(), &props);
}
