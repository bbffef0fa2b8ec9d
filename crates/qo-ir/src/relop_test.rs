use super::*;
use crate::catalog::operator_def;
use crate::scalar::Datum;
use crate::test_utils::*;
use qo_core::ColList;

fn assert_slots_match_catalog(node: &RelNode) {
    let def = operator_def(node.op());
    assert_eq!(node.child_count(), def.children.len(), "{}", node.op());
    for (i, slot) in def.children.iter().enumerate() {
        let child = node.child(i).unwrap();
        assert_eq!(child.kind(), slot.kind, "{} slot {}", node.op(), slot.name);
    }
    assert!(node.child(def.children.len()).is_none());
}

#[test]
fn test_leaf_and_unary_slots() {
    let fx = Fixture::new();
    let f = fx.factory();
    let scan = fx.scan("t");
    assert_slots_match_catalog(&scan);
    assert!(scan.rel_children().is_empty());

    let select = f
        .select(scan.clone(), vec![eq(col(fx.col("t.a")), lit(1))])
        .unwrap();
    assert_slots_match_catalog(&select);
    assert!(Arc::ptr_eq(select.rel_children()[0], &scan));

    let (values, _) = int_values(&f, &[1, 2]);
    assert_slots_match_catalog(&values);
    assert!(matches!(values.child(0), Some(Child::Rows(rows)) if rows.len() == 2));
}

#[test]
fn test_join_slots() {
    let fx = Fixture::new();
    let f = fx.factory();
    let on = vec![eq(col(fx.col("t.a")), col(fx.col("u.x")))];
    let join = f.inner_join(fx.scan("t"), fx.scan("u"), on.clone()).unwrap();
    assert_slots_match_catalog(&join);
    assert_eq!(join.rel_children().len(), 2);
    assert!(matches!(join.child(2), Some(Child::Filters(filters)) if filters == on.as_slice()));
    assert!(join.expr().as_join().is_some());
    assert!(join.expr().as_grouping().is_none());
}

#[test]
fn test_with_rel_children_replaces_in_slot_order() {
    let fx = Fixture::new();
    let f = fx.factory();
    let join = f.inner_join(fx.scan("t"), fx.scan("u"), vec![]).unwrap();
    let (left, right) = (fx.scan("t"), fx.scan("u"));
    let expr = join
        .expr()
        .with_rel_children(&[left.clone(), right.clone()])
        .unwrap();
    let j = expr.as_join().unwrap();
    assert!(Arc::ptr_eq(&j.left, &left));
    assert!(Arc::ptr_eq(&j.right, &right));

    assert!(join.expr().with_rel_children(&[left]).is_none());
}

#[test]
fn test_leaf_with_rel_children() {
    let fx = Fixture::new();
    let f = fx.factory();
    let (values, c) = int_values(&f, &[3]);
    let same = values.expr().with_rel_children(&[]).unwrap();
    assert_eq!(&same, values.expr());
    assert!(values.expr().with_rel_children(&[fx.scan("t")]).is_none());
    assert_eq!(values.output_cols().first(), Some(c));
}

#[test]
fn test_constructors_reject_other_families() {
    let fx = Fixture::new();
    let join = JoinExpr {
        left: fx.scan("t"),
        right: fx.scan("u"),
        on: vec![],
        private: JoinPrivate::default(),
    };
    assert!(RelExpr::join(Operator::GroupBy, join.clone()).is_none());
    let expr = RelExpr::join(Operator::AntiJoinApply, join).unwrap();
    assert_eq!(expr.op(), Operator::AntiJoinApply);

    let set = SetExpr {
        left: fx.scan("t"),
        right: fx.scan("t"),
        private: SetPrivate {
            left_cols: ColList::new(),
            right_cols: ColList::new(),
            out_cols: ColList::new(),
        },
    };
    assert!(RelExpr::set_op(Operator::Limit, set.clone()).is_none());
    assert!(RelExpr::set_op(Operator::ExceptAll, set).unwrap().as_set().is_some());
}

#[test]
fn test_scalar_slot_of_limit() {
    let fx = Fixture::new();
    let f = fx.factory();
    let limit = f
        .limit(fx.scan("t"), lit(2), OrderingChoice::any())
        .unwrap();
    assert_slots_match_catalog(&limit);
    assert!(matches!(
        limit.child(1),
        Some(Child::Scalar(ScalarExpr::Const(Datum::Int(2))))
    ));
}
