//! Declarative operator catalog
//!
//! One [`OperatorDef`] per operator: its name, tags, ordered child slots and
//! private field list. External code generators consume this catalog (it is
//! serializable to JSON and YAML); inside the crate it names child slots for
//! plan rendering and is cross-checked against `RelExpr::child` in tests.

use crate::operator::Operator;
use crate::relop::ChildKind;
use crate::tag::TagSet;
use serde::Serialize;

/// A child slot of an operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChildSlot {
    /// Slot name
    pub name: &'static str,
    /// What the slot holds
    pub kind: ChildKind,
}

/// A private data field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PrivateField {
    /// Field name
    pub name: &'static str,
    /// Field type
    #[serde(rename = "type")]
    pub ty: &'static str,
}

/// Private data attached to an operator
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrivateDef {
    /// Private struct name
    pub name: &'static str,
    /// Fields in declaration order
    pub fields: Vec<PrivateField>,
}

/// Catalog entry for one operator
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperatorDef {
    /// Kebab-case operator name
    pub name: &'static str,
    /// Static tags
    pub tags: TagSet,
    /// Child slots in order
    pub children: Vec<ChildSlot>,
    /// Private data, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private: Option<PrivateDef>,
}

const fn slot(name: &'static str, kind: ChildKind) -> ChildSlot {
    ChildSlot { name, kind }
}

const INPUT: ChildSlot = slot("input", ChildKind::Relational);
const LEFT: ChildSlot = slot("left", ChildKind::Relational);
const RIGHT: ChildSlot = slot("right", ChildKind::Relational);
const ON: ChildSlot = slot("on", ChildKind::Filters);

fn fields(name: &'static str, fields: &[(&'static str, &'static str)]) -> Option<PrivateDef> {
    Some(PrivateDef {
        name,
        fields: fields
            .iter()
            .map(|&(name, ty)| PrivateField { name, ty })
            .collect(),
    })
}

fn join_private() -> Option<PrivateDef> {
    fields("JoinPrivate", &[("flags", "JoinFlags")])
}

fn grouping_private() -> Option<PrivateDef> {
    fields(
        "GroupingPrivate",
        &[("grouping_cols", "ColSet"), ("ordering", "OrderingChoice")],
    )
}

fn set_private() -> Option<PrivateDef> {
    fields(
        "SetPrivate",
        &[
            ("left_cols", "ColList"),
            ("right_cols", "ColList"),
            ("out_cols", "ColList"),
        ],
    )
}

/// Catalog entry for `op`
pub fn operator_def(op: Operator) -> OperatorDef {
    let (children, private): (Vec<ChildSlot>, Option<PrivateDef>) = match op {
        Operator::Scan => (
            vec![],
            fields(
                "ScanPrivate",
                &[
                    ("table", "TableId"),
                    ("index", "IndexOrdinal"),
                    ("cols", "ColSet"),
                    ("constraint", "Option<Constraint>"),
                    ("hard_limit", "Option<ScanLimit>"),
                    ("flags", "ScanFlags"),
                ],
            ),
        ),
        Operator::VirtualScan => (
            vec![],
            fields(
                "VirtualScanPrivate",
                &[("table", "TableId"), ("cols", "ColSet")],
            ),
        ),
        Operator::SequenceSelect => (
            vec![],
            fields(
                "SequenceSelectPrivate",
                &[("sequence", "SequenceId"), ("cols", "ColList")],
            ),
        ),
        Operator::Values => (
            vec![slot("rows", ChildKind::Rows)],
            fields("ValuesPrivate", &[("cols", "ColList"), ("id", "ValuesId")]),
        ),
        Operator::Select => (vec![INPUT, slot("filters", ChildKind::Filters)], None),
        Operator::Project => (
            vec![INPUT, slot("projections", ChildKind::Projections)],
            fields("ProjectPrivate", &[("passthrough", "ColSet")]),
        ),
        Operator::InnerJoin
        | Operator::LeftJoin
        | Operator::RightJoin
        | Operator::FullJoin
        | Operator::SemiJoin
        | Operator::AntiJoin
        | Operator::InnerJoinApply
        | Operator::LeftJoinApply
        | Operator::RightJoinApply
        | Operator::FullJoinApply
        | Operator::SemiJoinApply
        | Operator::AntiJoinApply => (vec![LEFT, RIGHT, ON], join_private()),
        Operator::IndexJoin => (
            vec![INPUT],
            fields("IndexJoinPrivate", &[("table", "TableId"), ("cols", "ColSet")]),
        ),
        Operator::LookupJoin => (
            vec![INPUT, ON],
            fields(
                "LookupJoinPrivate",
                &[
                    ("join_type", "JoinType"),
                    ("table", "TableId"),
                    ("index", "IndexOrdinal"),
                    ("key_cols", "ColList"),
                    ("cols", "ColSet"),
                ],
            ),
        ),
        Operator::MergeJoin => (
            vec![LEFT, RIGHT, ON],
            fields(
                "MergeJoinPrivate",
                &[
                    ("join_type", "JoinType"),
                    ("left_eq", "Ordering"),
                    ("right_eq", "Ordering"),
                    ("left_ordering", "OrderingChoice"),
                    ("right_ordering", "OrderingChoice"),
                ],
            ),
        ),
        Operator::ZigzagJoin => (
            vec![ON],
            fields(
                "ZigzagJoinPrivate",
                &[
                    ("left_table", "TableId"),
                    ("left_index", "IndexOrdinal"),
                    ("right_table", "TableId"),
                    ("right_index", "IndexOrdinal"),
                    ("left_eq_cols", "ColList"),
                    ("right_eq_cols", "ColList"),
                    ("left_fixed_cols", "ColList"),
                    ("right_fixed_cols", "ColList"),
                    ("left_fixed_vals", "Vec<Datum>"),
                    ("right_fixed_vals", "Vec<Datum>"),
                    ("cols", "ColSet"),
                ],
            ),
        ),
        Operator::GroupBy | Operator::ScalarGroupBy | Operator::DistinctOn => (
            vec![INPUT, slot("aggregations", ChildKind::Aggregations)],
            grouping_private(),
        ),
        Operator::Union
        | Operator::Intersect
        | Operator::Except
        | Operator::UnionAll
        | Operator::IntersectAll
        | Operator::ExceptAll => (vec![LEFT, RIGHT], set_private()),
        Operator::Limit => (
            vec![INPUT, slot("limit", ChildKind::Scalar)],
            fields("LimitPrivate", &[("ordering", "OrderingChoice")]),
        ),
        Operator::Offset => (
            vec![INPUT, slot("offset", ChildKind::Scalar)],
            fields("OffsetPrivate", &[("ordering", "OrderingChoice")]),
        ),
        Operator::Max1Row => (vec![INPUT], None),
        Operator::RowNumber => (
            vec![INPUT],
            fields(
                "RowNumberPrivate",
                &[("ordering", "OrderingChoice"), ("col", "ColumnId")],
            ),
        ),
        Operator::ProjectSet => (vec![INPUT, slot("zip", ChildKind::Zip)], None),
        Operator::Explain => (
            vec![INPUT],
            fields(
                "ExplainPrivate",
                &[("options", "ExplainOptions"), ("cols", "ColList")],
            ),
        ),
        Operator::ShowTraceForSession => (
            vec![],
            fields(
                "ShowTracePrivate",
                &[
                    ("trace_type", "TraceType"),
                    ("compact", "bool"),
                    ("cols", "ColList"),
                ],
            ),
        ),
        Operator::FakeRel => (vec![], fields("FakeRelPrivate", &[("props", "RelProps")])),
    };
    OperatorDef {
        name: op.name(),
        tags: op.tags(),
        children,
        private,
    }
}

/// The whole catalog, in operator declaration order
pub fn operator_defs() -> Vec<OperatorDef> {
    Operator::ALL.into_iter().map(operator_def).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tag::Tag;

    #[test]
    fn test_catalog_covers_every_operator() {
        let defs = operator_defs();
        assert_eq!(defs.len(), Operator::COUNT);
        for (def, op) in defs.iter().zip(Operator::ALL) {
            assert_eq!(def.name, op.name());
            assert_eq!(def.tags, op.tags());
        }
    }

    #[test]
    fn test_join_family_shares_slots_and_private() {
        let inner = operator_def(Operator::InnerJoin);
        for op in Operator::with_tag(Tag::JoinApply) {
            let def = operator_def(op);
            assert_eq!(def.children, inner.children);
            assert_eq!(def.private, inner.private);
        }
    }

    #[test]
    fn test_no_private_field_is_an_expression() {
        for def in operator_defs() {
            let Some(private) = def.private else { continue };
            for field in private.fields {
                assert!(
                    !field.ty.contains("Expr") && !field.ty.contains("RelRef"),
                    "{}.{} holds an expression",
                    private.name,
                    field.name
                );
            }
        }
    }

    #[test]
    fn test_catalog_serializes_to_json() {
        let json = serde_json::to_value(operator_def(Operator::Select)).unwrap();
        assert_eq!(json["name"], "select");
        assert_eq!(json["tags"][0], "Relational");
        assert_eq!(json["children"][1]["kind"], "filters");
        assert!(json.get("private").is_none());
    }
}
