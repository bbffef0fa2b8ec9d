//! Every operator, built once, checked against the static catalog and tags

use qo_core::{ColList, ColSet, ColumnType, Ordering, OrderingChoice, OrderingColumn};
use qo_ir::private::{
    ExplainOptions, GroupingPrivate, IndexJoinPrivate, JoinPrivate, JoinType, LookupJoinPrivate,
    MergeJoinPrivate, ScanPrivate, TraceType, ZigzagJoinPrivate,
};
use qo_ir::test_utils::{col, count_rows, eq, int_values, lit, Fixture};
use qo_ir::{
    operator_def, operator_defs, render, AggFunc, AggregationItem, Datum, FeatureCounts,
    Generator, Operator, ProjectionItem, RelProps, RelRef, Tag, ZipItem,
};

fn sample(fx: &Fixture, op: Operator) -> RelRef {
    let f = fx.factory();
    let (a, c, x) = (fx.col("t.a"), fx.col("t.c"), fx.col("u.x"));
    let t_cols = fx.scan("t").output_cols().clone();
    let u_cols = fx.scan("u").output_cols().clone();
    let built = match op {
        Operator::Scan => Ok(fx.scan("t")),
        Operator::VirtualScan => f.virtual_scan(fx.table("tv")),
        Operator::SequenceSelect => f.sequence_select(fx.md.sequence_by_name("s").unwrap()),
        Operator::Values => Ok(int_values(&f, &[1, 2]).0),
        Operator::Select => f.select(fx.scan("t"), vec![eq(col(c), lit(10))]),
        Operator::Project => {
            let out = fx.md.add_column("a_plus", ColumnType::Int);
            f.project(
                fx.scan("t"),
                vec![ProjectionItem {
                    col: out,
                    expr: col(a),
                }],
                ColSet::single(c),
            )
        }
        op if op.is_join_family() => {
            f.join(
                op,
                fx.scan("t"),
                fx.scan("u"),
                vec![eq(col(a), col(x))],
                JoinPrivate::default(),
            )
        }
        Operator::IndexJoin => {
            let mut scan = ScanPrivate::new(fx.table("t"), [a, c].into_iter().collect());
            scan.index = fx.index("t", "t_c");
            let input = f.scan(scan).unwrap();
            f.index_join(
                input,
                IndexJoinPrivate {
                    table: fx.table("t"),
                    cols: t_cols,
                },
            )
        }
        Operator::LookupJoin => f.lookup_join(
            fx.scan("t"),
            vec![],
            LookupJoinPrivate {
                join_type: JoinType::Left,
                table: fx.table("u"),
                index: fx.index("u", "u_y"),
                key_cols: ColList::from(vec![c]),
                cols: t_cols.union(&u_cols),
            },
        ),
        Operator::MergeJoin => {
            let left = Ordering::from(vec![OrderingColumn::asc(a)]);
            let right = Ordering::from(vec![OrderingColumn::asc(x)]);
            f.merge_join(
                fx.scan("t"),
                fx.scan("u"),
                vec![],
                MergeJoinPrivate {
                    join_type: JoinType::Full,
                    left_ordering: OrderingChoice::from_ordering(&left),
                    right_ordering: OrderingChoice::from_ordering(&right),
                    left_eq: left,
                    right_eq: right,
                },
            )
        }
        Operator::ZigzagJoin => {
            let kv = fx.table("kv");
            let k = fx.col("kv.k");
            f.zigzag_join(
                vec![],
                ZigzagJoinPrivate {
                    left_table: kv,
                    left_index: fx.index("kv", "kv_v"),
                    right_table: kv,
                    right_index: fx.index("kv", "kv_w"),
                    left_eq_cols: ColList::from(vec![k]),
                    right_eq_cols: ColList::from(vec![k]),
                    left_fixed_cols: ColList::from(vec![fx.col("kv.v")]),
                    right_fixed_cols: ColList::from(vec![fx.col("kv.w")]),
                    left_fixed_vals: vec![Datum::from("a")],
                    right_fixed_vals: vec![Datum::Int(1)],
                    cols: fx.scan("kv").output_cols().clone(),
                },
            )
        }
        Operator::GroupBy => f.group_by(fx.scan("t"), vec![count_rows(&f)], ColSet::single(c)),
        Operator::ScalarGroupBy => f.scalar_group_by(fx.scan("t"), vec![count_rows(&f)]),
        Operator::DistinctOn => f.distinct_on(
            fx.scan("t"),
            vec![AggregationItem {
                col: fx.md.add_column("first_a", ColumnType::Int),
                func: AggFunc::FirstAgg,
                arg: Some(col(a)),
            }],
            GroupingPrivate {
                grouping_cols: ColSet::single(c),
                ordering: OrderingChoice::any(),
            },
        ),
        op if op.is_set() => {
            let (left, l) = int_values(&f, &[1]);
            let (right, r) = int_values(&f, &[2]);
            f.set_op_new_cols(op, left, right, ColList::from(vec![l]), ColList::from(vec![r]))
        }
        Operator::Limit => f.limit(fx.scan("t"), lit(1), OrderingChoice::any()),
        Operator::Offset => f.offset(fx.scan("t"), lit(1), OrderingChoice::any()),
        Operator::Max1Row => f.max1_row(fx.scan("t")),
        Operator::RowNumber => f.row_number(fx.scan("t"), OrderingChoice::any()),
        Operator::ProjectSet => {
            let n = fx.md.add_column("n", ColumnType::Int);
            f.project_set(
                fx.scan("t"),
                vec![ZipItem {
                    func: Generator::GenerateSeries {
                        start: lit(1),
                        stop: col(c),
                    },
                    cols: ColList::from(vec![n]),
                }],
            )
        }
        Operator::Explain => f.explain(fx.scan("t"), ExplainOptions::default()),
        Operator::ShowTraceForSession => f.show_trace(TraceType::Kv, true),
        Operator::FakeRel => f.fake_rel(RelProps::with_cols(ColSet::single(a))),
        other => panic!("no sample for {other}"),
    };
    built.unwrap_or_else(|e| panic!("sample {op} builds: {e}"))
}

#[test]
fn test_every_operator_matches_its_catalog_entry() {
    let fx = Fixture::new();
    for op in Operator::ALL {
        let node = sample(&fx, op);
        assert_eq!(node.op(), op);
        let def = operator_def(op);
        assert_eq!(def.name, op.name());
        assert_eq!(def.tags, op.tags());
        assert_eq!(node.child_count(), def.children.len(), "{op}");
        for (i, slot) in def.children.iter().enumerate() {
            let child = node
                .child(i)
                .unwrap_or_else(|| panic!("{op} is missing slot {}", slot.name));
            assert_eq!(child.kind(), slot.kind, "{op} slot {}", slot.name);
        }
    }
}

#[test]
fn test_catalog_lists_every_operator_once() {
    let defs = operator_defs();
    assert_eq!(defs.len(), Operator::COUNT);
    for (def, op) in defs.iter().zip(Operator::ALL) {
        assert_eq!(def.name, op.name());
        assert_eq!(Operator::from_name(def.name), Some(op));
    }
}

#[test]
fn test_rebuilding_over_the_same_children_is_equal() {
    let fx = Fixture::new();
    let f = fx.factory();
    for op in Operator::ALL {
        let node = sample(&fx, op);
        let children: Vec<RelRef> = node.rel_children().into_iter().cloned().collect();
        let rebuilt = f.replace_rel_children(&node, children).unwrap();
        assert_eq!(rebuilt, node, "{op}");
    }
}

#[test]
fn test_every_sample_renders_its_operator_name() {
    let fx = Fixture::new();
    for op in Operator::ALL {
        let node = sample(&fx, op);
        let text = render(&node, &fx.md);
        assert!(
            text.lines().next().unwrap_or_default().starts_with(op.name()),
            "{op}: {text}"
        );
    }
}

#[test]
fn test_feature_counts_skip_untagged_nodes() {
    let fx = Fixture::new();
    let node = sample(&fx, Operator::IndexJoin);
    let counts = FeatureCounts::from_plan(&node);
    assert_eq!(counts.get("index-join"), 1);
    // Scans are not Telemetry-tagged.
    assert_eq!(counts.get("scan"), 0);
    assert_eq!(counts.iter().count(), 1);
}

#[test]
fn test_apply_variants_pair_with_plain_joins() {
    for op in Operator::ALL.into_iter().filter(|op| op.has_tag(Tag::JoinApply)) {
        let join_type = op.join_type().unwrap();
        assert_eq!(Operator::join_for(join_type, true), op);
        assert!(Operator::join_for(join_type, false).has_tag(Tag::JoinNonApply));
    }
}
