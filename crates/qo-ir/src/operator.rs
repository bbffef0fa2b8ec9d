//! The closed set of relational operators

use crate::tag::{Tag, TagSet, OPERATOR_TAGS};
use serde::{Deserialize, Serialize};

/// Identifies one relational operator variant.
///
/// `Operator` is the fieldless twin of [`RelExpr`](crate::RelExpr): every
/// `RelExpr` variant maps to exactly one `Operator`, which indexes the static
/// tag table and the declarative operator catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[repr(u8)]
pub enum Operator {
    Scan,
    VirtualScan,
    SequenceSelect,
    Values,
    Select,
    Project,
    InnerJoin,
    LeftJoin,
    RightJoin,
    FullJoin,
    SemiJoin,
    AntiJoin,
    InnerJoinApply,
    LeftJoinApply,
    RightJoinApply,
    FullJoinApply,
    SemiJoinApply,
    AntiJoinApply,
    IndexJoin,
    LookupJoin,
    MergeJoin,
    ZigzagJoin,
    GroupBy,
    ScalarGroupBy,
    DistinctOn,
    Union,
    Intersect,
    Except,
    UnionAll,
    IntersectAll,
    ExceptAll,
    Limit,
    Offset,
    Max1Row,
    RowNumber,
    ProjectSet,
    Explain,
    ShowTraceForSession,
    FakeRel,
}

impl Operator {
    /// Number of operator variants
    pub const COUNT: usize = 39;

    /// Every operator, in declaration order
    pub const ALL: [Operator; Operator::COUNT] = [
        Operator::Scan,
        Operator::VirtualScan,
        Operator::SequenceSelect,
        Operator::Values,
        Operator::Select,
        Operator::Project,
        Operator::InnerJoin,
        Operator::LeftJoin,
        Operator::RightJoin,
        Operator::FullJoin,
        Operator::SemiJoin,
        Operator::AntiJoin,
        Operator::InnerJoinApply,
        Operator::LeftJoinApply,
        Operator::RightJoinApply,
        Operator::FullJoinApply,
        Operator::SemiJoinApply,
        Operator::AntiJoinApply,
        Operator::IndexJoin,
        Operator::LookupJoin,
        Operator::MergeJoin,
        Operator::ZigzagJoin,
        Operator::GroupBy,
        Operator::ScalarGroupBy,
        Operator::DistinctOn,
        Operator::Union,
        Operator::Intersect,
        Operator::Except,
        Operator::UnionAll,
        Operator::IntersectAll,
        Operator::ExceptAll,
        Operator::Limit,
        Operator::Offset,
        Operator::Max1Row,
        Operator::RowNumber,
        Operator::ProjectSet,
        Operator::Explain,
        Operator::ShowTraceForSession,
        Operator::FakeRel,
    ];

    /// Kebab-case operator name used in plan output
    pub fn name(self) -> &'static str {
        match self {
            Operator::Scan => "scan",
            Operator::VirtualScan => "virtual-scan",
            Operator::SequenceSelect => "sequence-select",
            Operator::Values => "values",
            Operator::Select => "select",
            Operator::Project => "project",
            Operator::InnerJoin => "inner-join",
            Operator::LeftJoin => "left-join",
            Operator::RightJoin => "right-join",
            Operator::FullJoin => "full-join",
            Operator::SemiJoin => "semi-join",
            Operator::AntiJoin => "anti-join",
            Operator::InnerJoinApply => "inner-join-apply",
            Operator::LeftJoinApply => "left-join-apply",
            Operator::RightJoinApply => "right-join-apply",
            Operator::FullJoinApply => "full-join-apply",
            Operator::SemiJoinApply => "semi-join-apply",
            Operator::AntiJoinApply => "anti-join-apply",
            Operator::IndexJoin => "index-join",
            Operator::LookupJoin => "lookup-join",
            Operator::MergeJoin => "merge-join",
            Operator::ZigzagJoin => "zigzag-join",
            Operator::GroupBy => "group-by",
            Operator::ScalarGroupBy => "scalar-group-by",
            Operator::DistinctOn => "distinct-on",
            Operator::Union => "union",
            Operator::Intersect => "intersect",
            Operator::Except => "except",
            Operator::UnionAll => "union-all",
            Operator::IntersectAll => "intersect-all",
            Operator::ExceptAll => "except-all",
            Operator::Limit => "limit",
            Operator::Offset => "offset",
            Operator::Max1Row => "max1-row",
            Operator::RowNumber => "row-number",
            Operator::ProjectSet => "project-set",
            Operator::Explain => "explain",
            Operator::ShowTraceForSession => "show-trace-for-session",
            Operator::FakeRel => "fake-rel",
        }
    }

    /// Look up an operator by its kebab-case name (case-insensitive)
    pub fn from_name(name: &str) -> Option<Operator> {
        Self::ALL
            .iter()
            .copied()
            .find(|op| op.name().eq_ignore_ascii_case(name))
    }

    /// Static tag set of this operator. O(1): one table lookup.
    pub fn tags(self) -> TagSet {
        OPERATOR_TAGS[self as usize]
    }

    /// Whether this operator carries `tag`
    pub fn has_tag(self, tag: Tag) -> bool {
        self.tags().contains(tag)
    }

    /// All operators carrying `tag`, in declaration order
    pub fn with_tag(tag: Tag) -> impl Iterator<Item = Operator> {
        Self::ALL.into_iter().filter(move |op| op.has_tag(tag))
    }

    /// Whether this is a standard or Apply join of the Inner/Left/Right/Full/
    /// Semi/Anti family (joins with Left, Right and On children)
    pub fn is_join_family(self) -> bool {
        self.has_tag(Tag::JoinApply) || self.has_tag(Tag::JoinNonApply)
    }

    /// Whether this operator is one of the six set operators
    pub fn is_set(self) -> bool {
        self.has_tag(Tag::Set)
    }

    /// Whether this operator is one of the grouping operators
    pub fn is_grouping(self) -> bool {
        self.has_tag(Tag::Grouping)
    }

    /// For Join-family operators, the logical join type
    pub fn join_type(self) -> Option<crate::private::JoinType> {
        use crate::private::JoinType;
        match self {
            Operator::InnerJoin | Operator::InnerJoinApply => Some(JoinType::Inner),
            Operator::LeftJoin | Operator::LeftJoinApply => Some(JoinType::Left),
            Operator::RightJoin | Operator::RightJoinApply => Some(JoinType::Right),
            Operator::FullJoin | Operator::FullJoinApply => Some(JoinType::Full),
            Operator::SemiJoin | Operator::SemiJoinApply => Some(JoinType::Semi),
            Operator::AntiJoin | Operator::AntiJoinApply => Some(JoinType::Anti),
            _ => None,
        }
    }

    /// The Join-family operator for a join type, standard or Apply
    pub fn join_for(join_type: crate::private::JoinType, apply: bool) -> Operator {
        use crate::private::JoinType;
        match (join_type, apply) {
            (JoinType::Inner, false) => Operator::InnerJoin,
            (JoinType::Left, false) => Operator::LeftJoin,
            (JoinType::Right, false) => Operator::RightJoin,
            (JoinType::Full, false) => Operator::FullJoin,
            (JoinType::Semi, false) => Operator::SemiJoin,
            (JoinType::Anti, false) => Operator::AntiJoin,
            (JoinType::Inner, true) => Operator::InnerJoinApply,
            (JoinType::Left, true) => Operator::LeftJoinApply,
            (JoinType::Right, true) => Operator::RightJoinApply,
            (JoinType::Full, true) => Operator::FullJoinApply,
            (JoinType::Semi, true) => Operator::SemiJoinApply,
            (JoinType::Anti, true) => Operator::AntiJoinApply,
        }
    }
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
