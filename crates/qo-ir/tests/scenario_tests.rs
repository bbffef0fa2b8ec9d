//! End-to-end scenarios: build plans through the factory and evaluate them

use qo_core::{ColList, ColumnType};
use qo_ir::private::{JoinType, LookupJoinPrivate};
use qo_ir::test_utils::{count_rows, int_values, lit, Fixture};
use qo_ir::{Cardinality, DataStore, Datum, Evaluator, IrError, Operator, RelRef, Relation};

fn eval(fx: &Fixture, plan: &RelRef) -> Relation {
    Evaluator::new(&fx.md, &DataStore::new())
        .eval(plan)
        .expect("plan evaluates")
}

fn sorted_ints(rel: &Relation) -> Vec<i64> {
    let mut out: Vec<i64> = rel
        .rows
        .iter()
        .map(|row| row[0].as_int().expect("int column"))
        .collect();
    out.sort_unstable();
    out
}

/// x = {1,1,2} and y = {1,2,3} combined by a bag set operator
fn bag_op(fx: &Fixture, op: Operator) -> (RelRef, Relation) {
    let f = fx.factory();
    let (x, xc) = int_values(&f, &[1, 1, 2]);
    let (y, yc) = int_values(&f, &[1, 2, 3]);
    let node = f
        .set_op_new_cols(op, x, y, ColList::from(vec![xc]), ColList::from(vec![yc]))
        .expect("set op builds");
    let rel = eval(fx, &node);
    (node, rel)
}

#[test]
fn test_values_output_and_rows() {
    let fx = Fixture::new();
    let f = fx.factory();
    let c1 = fx.md.add_column("c1", ColumnType::Int);
    let c2 = fx.md.add_column("c2", ColumnType::String);
    let values = f
        .values(
            vec![vec![lit(1), lit("a")], vec![lit(2), lit("b")]],
            ColList::from(vec![c1, c2]),
        )
        .unwrap();
    assert_eq!(values.props().output_list, Some(ColList::from(vec![c1, c2])));
    assert_eq!(values.props().cardinality, Cardinality::exactly(2));

    let rel = eval(&fx, &values);
    assert_eq!(rel.cols, ColList::from(vec![c1, c2]));
    assert_eq!(
        rel.rows,
        vec![
            vec![Datum::Int(1), Datum::from("a")],
            vec![Datum::Int(2), Datum::from("b")],
        ]
    );
}

#[test]
fn test_union_all_keeps_every_row() {
    let fx = Fixture::new();
    let (node, rel) = bag_op(&fx, Operator::UnionAll);
    assert_eq!(sorted_ints(&rel), vec![1, 1, 1, 2, 2, 3]);
    assert!(node.props().cardinality.allows(6));
}

#[test]
fn test_intersect_all_keeps_the_smaller_multiplicity() {
    let fx = Fixture::new();
    let (_, rel) = bag_op(&fx, Operator::IntersectAll);
    // 1 appears twice on the left and once on the right.
    assert_eq!(sorted_ints(&rel), vec![1, 2]);
}

#[test]
fn test_except_all_subtracts_multiplicities() {
    let fx = Fixture::new();
    let (_, rel) = bag_op(&fx, Operator::ExceptAll);
    assert_eq!(sorted_ints(&rel), vec![1]);
}

#[test]
fn test_distinct_set_ops() {
    let fx = Fixture::new();
    assert_eq!(sorted_ints(&bag_op(&fx, Operator::Union).1), vec![1, 2, 3]);
    assert_eq!(sorted_ints(&bag_op(&fx, Operator::Intersect).1), vec![1, 2]);
    assert!(bag_op(&fx, Operator::Except).1.is_empty());
}

#[test]
fn test_scalar_group_by_over_empty_input() {
    let fx = Fixture::new();
    let f = fx.factory();
    let (input, _) = int_values(&f, &[1, 2]);
    let empty = f.select(input, vec![lit(false)]).unwrap();
    let count = count_rows(&f);
    let count_col = count.col;
    let agg = f.scalar_group_by(empty, vec![count]).unwrap();
    assert_eq!(agg.props().cardinality, Cardinality::exactly(1));

    let rel = eval(&fx, &agg);
    assert_eq!(rel.len(), 1);
    assert_eq!(rel.column(count_col), Some(vec![Datum::Int(0)]));
}

#[test]
fn test_lookup_join_without_key_columns_fails_at_construction() {
    let fx = Fixture::new();
    let f = fx.factory();
    let private = LookupJoinPrivate {
        join_type: JoinType::Inner,
        table: fx.table("u"),
        index: fx.index("u", "u_y"),
        key_cols: ColList::new(),
        cols: fx.scan("t").output_cols().clone(),
    };
    let err = f.lookup_join(fx.scan("t"), vec![], private).unwrap_err();
    assert!(matches!(
        err,
        IrError::Contract {
            op: Operator::LookupJoin,
            ..
        }
    ));
}
