//! Private metadata attached to operators.
//!
//! Private structs are immutable configuration: table and index ids, column
//! lists, orderings, flags. They never hold expression children; anything a
//! generic traversal must see lives in the operator's child slots instead.
//! `JoinPrivate`, `GroupingPrivate` and `SetPrivate` are shared by whole
//! operator families so one rewrite path can serve every member.

use crate::props::RelProps;
use crate::scalar::Datum;
use qo_core::{
    ColList, ColSet, ColumnId, IndexOrdinal, Ordering, OrderingChoice, SequenceId, TableId,
    ValuesId,
};
use serde::{Deserialize, Serialize};

/// Logical join type carried by physical join privates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JoinType {
    /// Inner join
    Inner,
    /// Left outer join
    Left,
    /// Right outer join
    Right,
    /// Full outer join
    Full,
    /// Left rows with at least one match
    Semi,
    /// Left rows with no match
    Anti,
}

impl JoinType {
    /// Whether the output contains only left-side columns
    pub fn left_cols_only(self) -> bool {
        matches!(self, JoinType::Semi | JoinType::Anti)
    }
}

impl std::fmt::Display for JoinType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JoinType::Inner => write!(f, "inner"),
            JoinType::Left => write!(f, "left"),
            JoinType::Right => write!(f, "right"),
            JoinType::Full => write!(f, "full"),
            JoinType::Semi => write!(f, "semi"),
            JoinType::Anti => write!(f, "anti"),
        }
    }
}

/// Scan direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanDirection {
    /// Index order
    Forward,
    /// Reverse index order
    Reverse,
}

/// Row cap of a scan; fixes the scan direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScanLimit {
    /// Maximum number of rows returned
    pub rows: u64,
    /// Scan in reverse index order
    #[serde(default)]
    pub reverse: bool,
}

/// Planner hints on a scan
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScanFlags {
    /// Do not introduce an index join above this scan
    #[serde(default)]
    pub no_index_join: bool,
    /// The index was chosen explicitly
    #[serde(default)]
    pub force_index: bool,
    /// Forced direction; only meaningful with `force_index`
    #[serde(default)]
    pub direction: Option<ScanDirection>,
}

/// A span over index keys. Empty keys are unbounded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    /// Start key (prefix of the constrained columns)
    #[serde(default)]
    pub start: Vec<Datum>,
    /// Whether the start key is included
    #[serde(default = "default_inclusive")]
    pub start_inclusive: bool,
    /// End key (prefix of the constrained columns)
    #[serde(default)]
    pub end: Vec<Datum>,
    /// Whether the end key is included
    #[serde(default = "default_inclusive")]
    pub end_inclusive: bool,
}

fn default_inclusive() -> bool {
    true
}

impl Span {
    /// Span containing exactly the keys with the given prefix
    pub fn point(key: Vec<Datum>) -> Self {
        Self {
            start: key.clone(),
            start_inclusive: true,
            end: key,
            end_inclusive: true,
        }
    }

    /// Whether `key` (a full key over the constrained columns, compared in
    /// index direction) lies within the span
    pub fn contains(&self, key: &[Datum], descending: &[bool]) -> bool {
        let start_ok = self.start.is_empty() || {
            let ord = compare_prefix(key, &self.start, descending);
            ord == std::cmp::Ordering::Greater
                || (ord == std::cmp::Ordering::Equal && self.start_inclusive)
        };
        let end_ok = self.end.is_empty() || {
            let ord = compare_prefix(key, &self.end, descending);
            ord == std::cmp::Ordering::Less
                || (ord == std::cmp::Ordering::Equal && self.end_inclusive)
        };
        start_ok && end_ok
    }
}

/// Compare the first `bound.len()` values of `key` to `bound` in index order
fn compare_prefix(key: &[Datum], bound: &[Datum], descending: &[bool]) -> std::cmp::Ordering {
    for (i, b) in bound.iter().enumerate() {
        let Some(k) = key.get(i) else {
            return std::cmp::Ordering::Less;
        };
        let mut ord = k.cmp(b);
        if descending.get(i).copied().unwrap_or(false) {
            ord = ord.reverse();
        }
        if ord != std::cmp::Ordering::Equal {
            return ord;
        }
    }
    std::cmp::Ordering::Equal
}

/// Restriction of a scan to key spans over a prefix of the index columns
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Constraint {
    /// Constrained index columns (a prefix of the index key, same directions)
    pub columns: Ordering,
    /// Disjoint spans; a row qualifies if its key lies in any span
    pub spans: Vec<Span>,
}

impl Constraint {
    /// Whether the key (values of `columns`, in order) satisfies the constraint
    pub fn contains(&self, key: &[Datum]) -> bool {
        let descending: Vec<bool> = self.columns.iter().map(|c| c.descending).collect();
        self.spans.iter().any(|s| s.contains(key, &descending))
    }
}

/// Private data of `Scan`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScanPrivate {
    /// Table scanned
    pub table: TableId,
    /// Index scanned
    pub index: IndexOrdinal,
    /// Columns produced (subset of the table's columns)
    pub cols: ColSet,
    /// Optional key-span restriction
    #[serde(default)]
    pub constraint: Option<Constraint>,
    /// Optional row cap
    #[serde(default)]
    pub hard_limit: Option<ScanLimit>,
    /// Planner hints
    #[serde(default)]
    pub flags: ScanFlags,
}

impl ScanPrivate {
    /// Unconstrained scan of `cols` over the primary index
    pub fn new(table: TableId, cols: ColSet) -> Self {
        Self {
            table,
            index: IndexOrdinal::PRIMARY,
            cols,
            constraint: None,
            hard_limit: None,
            flags: ScanFlags::default(),
        }
    }

    /// Fixed scan direction, if any. A hard limit fixes the direction; a
    /// forced index may; otherwise the direction is free.
    pub fn direction(&self) -> Option<ScanDirection> {
        match self.hard_limit {
            Some(limit) if limit.reverse => Some(ScanDirection::Reverse),
            Some(_) => Some(ScanDirection::Forward),
            None if self.flags.force_index => self.flags.direction,
            None => None,
        }
    }
}

/// Private data of `VirtualScan`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VirtualScanPrivate {
    /// Virtual table scanned
    pub table: TableId,
    /// Columns produced: always every column of the table
    pub cols: ColSet,
}

/// Private data of `SequenceSelect`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SequenceSelectPrivate {
    /// Sequence read
    pub sequence: SequenceId,
    /// Exactly three columns: last value, log count, is-called flag
    pub cols: ColList,
}

/// Private data of `Values`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ValuesPrivate {
    /// Output columns; every row has one value per column
    pub cols: ColList,
    /// Identity distinguishing structurally identical Values nodes
    pub id: ValuesId,
}

/// Join hints
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JoinFlags {
    /// Never implement as a hash join
    #[serde(default)]
    pub disallow_hash_join: bool,
    /// Never implement as a merge join
    #[serde(default)]
    pub disallow_merge_join: bool,
    /// Never implement as a lookup join
    #[serde(default)]
    pub disallow_lookup_join: bool,
}

/// Private data shared by the Inner/Left/Right/Full/Semi/Anti joins and
/// their Apply variants
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JoinPrivate {
    /// Planner hints
    #[serde(default)]
    pub flags: JoinFlags,
}

/// Private data of `IndexJoin`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndexJoinPrivate {
    /// Table whose primary index is looked up
    pub table: TableId,
    /// Output columns (table columns)
    pub cols: ColSet,
}

/// Private data of `LookupJoin`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LookupJoinPrivate {
    /// Inner or Left
    pub join_type: JoinType,
    /// Table looked up
    pub table: TableId,
    /// Index looked up
    pub index: IndexOrdinal,
    /// Input columns matched positionally against the index key prefix
    pub key_cols: ColList,
    /// Output columns (input columns and looked-up table columns)
    pub cols: ColSet,
}

/// Private data of `MergeJoin`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MergeJoinPrivate {
    /// Logical join type
    pub join_type: JoinType,
    /// Left equality columns with directions
    pub left_eq: Ordering,
    /// Right equality columns; directions pair with `left_eq`
    pub right_eq: Ordering,
    /// Ordering required of the left input
    pub left_ordering: OrderingChoice,
    /// Ordering required of the right input
    pub right_ordering: OrderingChoice,
}

/// Private data of `ZigzagJoin`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ZigzagJoinPrivate {
    /// Left table
    pub left_table: TableId,
    /// Left index
    pub left_index: IndexOrdinal,
    /// Right table
    pub right_table: TableId,
    /// Right index
    pub right_index: IndexOrdinal,
    /// Left equality columns (follow the fixed columns in index order)
    pub left_eq_cols: ColList,
    /// Right equality columns
    pub right_eq_cols: ColList,
    /// Left columns constrained to constants (leading index columns)
    pub left_fixed_cols: ColList,
    /// Right columns constrained to constants
    pub right_fixed_cols: ColList,
    /// Constants for `left_fixed_cols`
    pub left_fixed_vals: Vec<Datum>,
    /// Constants for `right_fixed_cols`
    pub right_fixed_vals: Vec<Datum>,
    /// Output columns
    pub cols: ColSet,
}

/// Private data shared by `GroupBy`, `ScalarGroupBy` and `DistinctOn`
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupingPrivate {
    /// Grouping columns; empty means one group
    pub grouping_cols: ColSet,
    /// Order of rows within each group (which row is "first")
    #[serde(default)]
    pub ordering: OrderingChoice,
}

/// Private data shared by the six set operators
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SetPrivate {
    /// Left input columns
    pub left_cols: ColList,
    /// Right input columns
    pub right_cols: ColList,
    /// Output columns; position i maps left_cols[i] and right_cols[i]
    pub out_cols: ColList,
}

/// Private data of `RowNumber`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RowNumberPrivate {
    /// Order in which numbers are assigned
    #[serde(default)]
    pub ordering: OrderingChoice,
    /// The numbering column
    pub col: ColumnId,
}

/// EXPLAIN options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExplainOptions {
    /// Include relational properties
    #[serde(default)]
    pub verbose: bool,
    /// Include column types
    #[serde(default)]
    pub types: bool,
}

/// Private data of `Explain`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExplainPrivate {
    /// Options
    #[serde(default)]
    pub options: ExplainOptions,
    /// Output columns; the plan text goes to the first
    pub cols: ColList,
}

/// Kind of session trace
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TraceType {
    /// Full trace
    #[default]
    Trace,
    /// Key-value operations only
    Kv,
}

/// Private data of `ShowTraceForSession`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShowTracePrivate {
    /// Kind of trace
    #[serde(default)]
    pub trace_type: TraceType,
    /// Compact output
    #[serde(default)]
    pub compact: bool,
    /// Output columns
    pub cols: ColList,
}

/// Private data of `FakeRel`: pre-computed properties, no real children
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FakeRelPrivate {
    /// Properties the node reports
    pub props: RelProps,
}

#[cfg(test)]
#[path = "private_test.rs"]
mod tests;
