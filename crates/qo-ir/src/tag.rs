//! Static capability tags layered over the operator taxonomy.
//!
//! Tags are assigned once per operator in [`OPERATOR_TAGS`], a table indexed
//! by `Operator as usize`. They only classify: every behavioural difference
//! between operators comes from the operator itself and its private data.

use crate::operator::Operator;
use serde::{Deserialize, Serialize};

/// A capability label shared by a family of operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum Tag {
    /// Produces a row set (every operator)
    Relational,
    /// Combines rows of two inputs (or an input and an index)
    Join,
    /// Join whose right side may reference the left side's columns
    JoinApply,
    /// Join whose right side is independent of the left side
    JoinNonApply,
    /// Partitions its input into groups
    Grouping,
    /// Set operation over two inputs with positional column mapping
    Set,
    /// Usage is counted in feature telemetry
    Telemetry,
}

impl Tag {
    /// Every tag, in declaration order
    pub const ALL: [Tag; 7] = [
        Tag::Relational,
        Tag::Join,
        Tag::JoinApply,
        Tag::JoinNonApply,
        Tag::Grouping,
        Tag::Set,
        Tag::Telemetry,
    ];

    const fn bit(self) -> u8 {
        1 << (self as u8)
    }

    /// Tag name
    pub fn name(self) -> &'static str {
        match self {
            Tag::Relational => "Relational",
            Tag::Join => "Join",
            Tag::JoinApply => "JoinApply",
            Tag::JoinNonApply => "JoinNonApply",
            Tag::Grouping => "Grouping",
            Tag::Set => "Set",
            Tag::Telemetry => "Telemetry",
        }
    }

    /// Look up a tag by name (case-insensitive)
    pub fn from_name(name: &str) -> Option<Tag> {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.name().eq_ignore_ascii_case(name))
    }
}

impl std::fmt::Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A set of tags packed into a bitmask
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TagSet(u8);

impl TagSet {
    /// The empty set
    pub const EMPTY: TagSet = TagSet(0);

    /// Build a set from a list of tags (usable in constants)
    pub const fn of(tags: &[Tag]) -> TagSet {
        let mut bits = 0u8;
        let mut i = 0;
        while i < tags.len() {
            bits |= tags[i].bit();
            i += 1;
        }
        TagSet(bits)
    }

    /// Membership test
    pub const fn contains(self, tag: Tag) -> bool {
        self.0 & tag.bit() != 0
    }

    /// Number of tags in the set
    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Whether the set is empty
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Tags in declaration order
    pub fn iter(self) -> impl Iterator<Item = Tag> {
        Tag::ALL.into_iter().filter(move |t| self.contains(*t))
    }
}

impl std::fmt::Display for TagSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.iter().map(Tag::name).collect();
        write!(f, "[{}]", names.join(", "))
    }
}

impl Serialize for TagSet {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

const REL: TagSet = TagSet::of(&[Tag::Relational]);
const REL_TELEMETRY: TagSet = TagSet::of(&[Tag::Relational, Tag::Telemetry]);
const JOIN: TagSet = TagSet::of(&[
    Tag::Relational,
    Tag::Join,
    Tag::JoinNonApply,
    Tag::Telemetry,
]);
const JOIN_APPLY: TagSet = TagSet::of(&[
    Tag::Relational,
    Tag::Join,
    Tag::JoinApply,
    Tag::Telemetry,
]);
const JOIN_PHYSICAL: TagSet = TagSet::of(&[Tag::Relational, Tag::Join, Tag::Telemetry]);
const GROUPING: TagSet = TagSet::of(&[Tag::Relational, Tag::Grouping]);
const GROUPING_TELEMETRY: TagSet = TagSet::of(&[Tag::Relational, Tag::Grouping, Tag::Telemetry]);
const SET: TagSet = TagSet::of(&[Tag::Relational, Tag::Set]);

/// Tag table indexed by `Operator as usize`. Must list operators in
/// declaration order.
pub(crate) static OPERATOR_TAGS: [TagSet; Operator::COUNT] = [
    REL,                // Scan
    REL,                // VirtualScan
    REL,                // SequenceSelect
    REL,                // Values
    REL,                // Select
    REL,                // Project
    JOIN,               // InnerJoin
    JOIN,               // LeftJoin
    JOIN,               // RightJoin
    JOIN,               // FullJoin
    JOIN,               // SemiJoin
    JOIN,               // AntiJoin
    JOIN_APPLY,         // InnerJoinApply
    JOIN_APPLY,         // LeftJoinApply
    JOIN_APPLY,         // RightJoinApply
    JOIN_APPLY,         // FullJoinApply
    JOIN_APPLY,         // SemiJoinApply
    JOIN_APPLY,         // AntiJoinApply
    JOIN_PHYSICAL,      // IndexJoin
    JOIN_PHYSICAL,      // LookupJoin
    JOIN_PHYSICAL,      // MergeJoin
    JOIN_PHYSICAL,      // ZigzagJoin
    GROUPING,           // GroupBy
    GROUPING,           // ScalarGroupBy
    GROUPING_TELEMETRY, // DistinctOn
    SET,                // Union
    SET,                // Intersect
    SET,                // Except
    SET,                // UnionAll
    SET,                // IntersectAll
    SET,                // ExceptAll
    REL,                // Limit
    REL,                // Offset
    REL_TELEMETRY,      // Max1Row
    REL_TELEMETRY,      // RowNumber
    REL_TELEMETRY,      // ProjectSet
    REL,                // Explain
    REL,                // ShowTraceForSession
    REL,                // FakeRel
];

#[cfg(test)]
#[path = "tag_test.rs"]
mod tests;
