//! Relational operators: the nodes of the plan tree
//!
//! A [`RelNode`] pairs an immutable [`RelExpr`] with the [`RelProps`] derived
//! for it when the [`Factory`](crate::Factory) built it. Children are shared
//! [`RelRef`] handles; rewriting builds a new parent over existing children
//! and never mutates a node in place.

use crate::operator::Operator;
use crate::private::{
    ExplainPrivate, FakeRelPrivate, GroupingPrivate, IndexJoinPrivate, JoinPrivate,
    LookupJoinPrivate, MergeJoinPrivate, RowNumberPrivate, ScanPrivate, SequenceSelectPrivate,
    SetPrivate, ShowTracePrivate, ValuesPrivate, VirtualScanPrivate, ZigzagJoinPrivate,
};
use crate::props::RelProps;
use crate::scalar::{AggregationItem, Filters, ProjectionItem, ScalarExpr, ZipItem};
use crate::tag::Tag;
use qo_core::{ColSet, OrderingChoice};
use std::sync::Arc;

/// Shared handle to an immutable plan node
pub type RelRef = Arc<RelNode>;

/// Children and private data of the Inner/Left/Right/Full/Semi/Anti joins
/// and their Apply variants
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinExpr {
    /// Left input
    pub left: RelRef,
    /// Right input; may reference `left` columns only for Apply joins
    pub right: RelRef,
    /// Join predicate (conjunction)
    pub on: Filters,
    /// Join hints
    pub private: JoinPrivate,
}

/// Children and private data of `GroupBy`, `ScalarGroupBy` and `DistinctOn`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupingExpr {
    /// Input relation
    pub input: RelRef,
    /// Aggregates computed per group
    pub aggregations: Vec<AggregationItem>,
    /// Grouping columns and intra-group ordering
    pub private: GroupingPrivate,
}

/// Children and private data of the six set operators
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetExpr {
    /// Left input
    pub left: RelRef,
    /// Right input
    pub right: RelRef,
    /// Positional column correspondence
    pub private: SetPrivate,
}

/// Relational operator with its children and private metadata.
///
/// One variant per [`Operator`]. Matching code should `match` exhaustively
/// or go through [`RelExpr::op`] and the tag table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelExpr {
    /// Read an index of a table
    Scan(ScanPrivate),
    /// Read every column of a virtual table
    VirtualScan(VirtualScanPrivate),
    /// One row describing a sequence's state
    SequenceSelect(SequenceSelectPrivate),
    /// Constant rows
    Values {
        /// One list of scalars per row, positional with `private.cols`
        rows: Vec<Vec<ScalarExpr>>,
        /// Columns and identity
        private: ValuesPrivate,
    },
    /// Keep rows for which every filter is true
    Select {
        /// Input relation
        input: RelRef,
        /// Predicates (conjunction)
        filters: Filters,
    },
    /// Synthesize columns and pass others through
    Project {
        /// Input relation
        input: RelRef,
        /// Synthesized columns
        projections: Vec<ProjectionItem>,
        /// Input columns kept as-is
        passthrough: ColSet,
    },
    /// Inner join
    InnerJoin(JoinExpr),
    /// Left outer join
    LeftJoin(JoinExpr),
    /// Right outer join
    RightJoin(JoinExpr),
    /// Full outer join
    FullJoin(JoinExpr),
    /// Semi join
    SemiJoin(JoinExpr),
    /// Anti join
    AntiJoin(JoinExpr),
    /// Correlated inner join
    InnerJoinApply(JoinExpr),
    /// Correlated left outer join
    LeftJoinApply(JoinExpr),
    /// Correlated right outer join
    RightJoinApply(JoinExpr),
    /// Correlated full outer join
    FullJoinApply(JoinExpr),
    /// Correlated semi join
    SemiJoinApply(JoinExpr),
    /// Correlated anti join
    AntiJoinApply(JoinExpr),
    /// Fetch the remaining columns of each input row from the primary index
    IndexJoin {
        /// Input relation producing primary key columns
        input: RelRef,
        /// Table and output columns
        private: IndexJoinPrivate,
    },
    /// Probe an index once per input row
    LookupJoin {
        /// Input relation
        input: RelRef,
        /// Additional predicate over input and looked-up columns
        on: Filters,
        /// Join type, index and key columns
        private: LookupJoinPrivate,
    },
    /// Join two inputs sorted on their equality columns
    MergeJoin {
        /// Left input
        left: RelRef,
        /// Right input
        right: RelRef,
        /// Additional predicate
        on: Filters,
        /// Equality columns and required orderings
        private: MergeJoinPrivate,
    },
    /// Join two indexes directly
    ZigzagJoin {
        /// Additional predicate
        on: Filters,
        /// Indexes, fixed values and equality columns
        private: ZigzagJoinPrivate,
    },
    /// Group rows and compute aggregates
    GroupBy(GroupingExpr),
    /// Aggregate the whole input into exactly one row
    ScalarGroupBy(GroupingExpr),
    /// Keep the first row of each group
    DistinctOn(GroupingExpr),
    /// Distinct union
    Union(SetExpr),
    /// Distinct intersection
    Intersect(SetExpr),
    /// Distinct difference
    Except(SetExpr),
    /// Bag union
    UnionAll(SetExpr),
    /// Bag intersection
    IntersectAll(SetExpr),
    /// Bag difference
    ExceptAll(SetExpr),
    /// First N rows
    Limit {
        /// Input relation
        input: RelRef,
        /// Row count
        limit: ScalarExpr,
        /// Order defining "first"
        ordering: OrderingChoice,
    },
    /// Skip N rows
    Offset {
        /// Input relation
        input: RelRef,
        /// Row count
        offset: ScalarExpr,
        /// Order defining which rows are skipped
        ordering: OrderingChoice,
    },
    /// Fail at runtime if the input has more than one row
    Max1Row {
        /// Input relation
        input: RelRef,
    },
    /// Number rows
    RowNumber {
        /// Input relation
        input: RelRef,
        /// Numbering column and order
        private: RowNumberPrivate,
    },
    /// Zip set-returning generators with each input row
    ProjectSet {
        /// Input relation
        input: RelRef,
        /// Generators and their output columns
        zip: Vec<ZipItem>,
    },
    /// Describe the input plan
    Explain {
        /// Plan being explained
        input: RelRef,
        /// Options and output columns
        private: ExplainPrivate,
    },
    /// Session trace rows
    ShowTraceForSession(ShowTracePrivate),
    /// Node with fixed properties, for testing property derivation
    FakeRel(FakeRelPrivate),
}

/// Kind of a child slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChildKind {
    /// A relational input
    Relational,
    /// A conjunction of predicates
    Filters,
    /// A single scalar expression
    Scalar,
    /// Rows of scalars
    Rows,
    /// Projection items
    Projections,
    /// Aggregation items
    Aggregations,
    /// Generator items
    Zip,
}

/// A child slot's contents
#[derive(Debug, Clone, Copy)]
pub enum Child<'a> {
    /// Relational input
    Rel(&'a RelRef),
    /// Conjunction of predicates
    Filters(&'a [ScalarExpr]),
    /// Single scalar
    Scalar(&'a ScalarExpr),
    /// Values rows
    Rows(&'a [Vec<ScalarExpr>]),
    /// Project items
    Projections(&'a [ProjectionItem]),
    /// Grouping aggregates
    Aggregations(&'a [AggregationItem]),
    /// ProjectSet generators
    Zip(&'a [ZipItem]),
}

impl<'a> Child<'a> {
    /// The slot kind
    pub fn kind(&self) -> ChildKind {
        match self {
            Child::Rel(_) => ChildKind::Relational,
            Child::Filters(_) => ChildKind::Filters,
            Child::Scalar(_) => ChildKind::Scalar,
            Child::Rows(_) => ChildKind::Rows,
            Child::Projections(_) => ChildKind::Projections,
            Child::Aggregations(_) => ChildKind::Aggregations,
            Child::Zip(_) => ChildKind::Zip,
        }
    }

    /// The relational input, if this is one
    pub fn as_rel(&self) -> Option<&'a RelRef> {
        match self {
            Child::Rel(r) => Some(r),
            _ => None,
        }
    }
}

impl RelExpr {
    /// The operator of this expression
    pub fn op(&self) -> Operator {
        match self {
            RelExpr::Scan(_) => Operator::Scan,
            RelExpr::VirtualScan(_) => Operator::VirtualScan,
            RelExpr::SequenceSelect(_) => Operator::SequenceSelect,
            RelExpr::Values { .. } => Operator::Values,
            RelExpr::Select { .. } => Operator::Select,
            RelExpr::Project { .. } => Operator::Project,
            RelExpr::InnerJoin(_) => Operator::InnerJoin,
            RelExpr::LeftJoin(_) => Operator::LeftJoin,
            RelExpr::RightJoin(_) => Operator::RightJoin,
            RelExpr::FullJoin(_) => Operator::FullJoin,
            RelExpr::SemiJoin(_) => Operator::SemiJoin,
            RelExpr::AntiJoin(_) => Operator::AntiJoin,
            RelExpr::InnerJoinApply(_) => Operator::InnerJoinApply,
            RelExpr::LeftJoinApply(_) => Operator::LeftJoinApply,
            RelExpr::RightJoinApply(_) => Operator::RightJoinApply,
            RelExpr::FullJoinApply(_) => Operator::FullJoinApply,
            RelExpr::SemiJoinApply(_) => Operator::SemiJoinApply,
            RelExpr::AntiJoinApply(_) => Operator::AntiJoinApply,
            RelExpr::IndexJoin { .. } => Operator::IndexJoin,
            RelExpr::LookupJoin { .. } => Operator::LookupJoin,
            RelExpr::MergeJoin { .. } => Operator::MergeJoin,
            RelExpr::ZigzagJoin { .. } => Operator::ZigzagJoin,
            RelExpr::GroupBy(_) => Operator::GroupBy,
            RelExpr::ScalarGroupBy(_) => Operator::ScalarGroupBy,
            RelExpr::DistinctOn(_) => Operator::DistinctOn,
            RelExpr::Union(_) => Operator::Union,
            RelExpr::Intersect(_) => Operator::Intersect,
            RelExpr::Except(_) => Operator::Except,
            RelExpr::UnionAll(_) => Operator::UnionAll,
            RelExpr::IntersectAll(_) => Operator::IntersectAll,
            RelExpr::ExceptAll(_) => Operator::ExceptAll,
            RelExpr::Limit { .. } => Operator::Limit,
            RelExpr::Offset { .. } => Operator::Offset,
            RelExpr::Max1Row { .. } => Operator::Max1Row,
            RelExpr::RowNumber { .. } => Operator::RowNumber,
            RelExpr::ProjectSet { .. } => Operator::ProjectSet,
            RelExpr::Explain { .. } => Operator::Explain,
            RelExpr::ShowTraceForSession(_) => Operator::ShowTraceForSession,
            RelExpr::FakeRel(_) => Operator::FakeRel,
        }
    }

    /// Whether the operator carries `tag`
    pub fn has_tag(&self, tag: Tag) -> bool {
        self.op().has_tag(tag)
    }

    /// Build a Join-family expression for `op`. Returns `None` when `op` is
    /// not one of the twelve Join-family operators.
    pub fn join(op: Operator, join: JoinExpr) -> Option<RelExpr> {
        Some(match op {
            Operator::InnerJoin => RelExpr::InnerJoin(join),
            Operator::LeftJoin => RelExpr::LeftJoin(join),
            Operator::RightJoin => RelExpr::RightJoin(join),
            Operator::FullJoin => RelExpr::FullJoin(join),
            Operator::SemiJoin => RelExpr::SemiJoin(join),
            Operator::AntiJoin => RelExpr::AntiJoin(join),
            Operator::InnerJoinApply => RelExpr::InnerJoinApply(join),
            Operator::LeftJoinApply => RelExpr::LeftJoinApply(join),
            Operator::RightJoinApply => RelExpr::RightJoinApply(join),
            Operator::FullJoinApply => RelExpr::FullJoinApply(join),
            Operator::SemiJoinApply => RelExpr::SemiJoinApply(join),
            Operator::AntiJoinApply => RelExpr::AntiJoinApply(join),
            _ => return None,
        })
    }

    /// Build a grouping expression for `op`
    pub fn grouping(op: Operator, grouping: GroupingExpr) -> Option<RelExpr> {
        Some(match op {
            Operator::GroupBy => RelExpr::GroupBy(grouping),
            Operator::ScalarGroupBy => RelExpr::ScalarGroupBy(grouping),
            Operator::DistinctOn => RelExpr::DistinctOn(grouping),
            _ => return None,
        })
    }

    /// Build a set-operation expression for `op`
    pub fn set_op(op: Operator, set: SetExpr) -> Option<RelExpr> {
        Some(match op {
            Operator::Union => RelExpr::Union(set),
            Operator::Intersect => RelExpr::Intersect(set),
            Operator::Except => RelExpr::Except(set),
            Operator::UnionAll => RelExpr::UnionAll(set),
            Operator::IntersectAll => RelExpr::IntersectAll(set),
            Operator::ExceptAll => RelExpr::ExceptAll(set),
            _ => return None,
        })
    }

    /// Shared join payload of any Join-family operator
    pub fn as_join(&self) -> Option<&JoinExpr> {
        match self {
            RelExpr::InnerJoin(j)
            | RelExpr::LeftJoin(j)
            | RelExpr::RightJoin(j)
            | RelExpr::FullJoin(j)
            | RelExpr::SemiJoin(j)
            | RelExpr::AntiJoin(j)
            | RelExpr::InnerJoinApply(j)
            | RelExpr::LeftJoinApply(j)
            | RelExpr::RightJoinApply(j)
            | RelExpr::FullJoinApply(j)
            | RelExpr::SemiJoinApply(j)
            | RelExpr::AntiJoinApply(j) => Some(j),
            _ => None,
        }
    }

    /// Shared grouping payload of any Grouping operator
    pub fn as_grouping(&self) -> Option<&GroupingExpr> {
        match self {
            RelExpr::GroupBy(g) | RelExpr::ScalarGroupBy(g) | RelExpr::DistinctOn(g) => Some(g),
            _ => None,
        }
    }

    /// Shared set payload of any Set operator
    pub fn as_set(&self) -> Option<&SetExpr> {
        match self {
            RelExpr::Union(s)
            | RelExpr::Intersect(s)
            | RelExpr::Except(s)
            | RelExpr::UnionAll(s)
            | RelExpr::IntersectAll(s)
            | RelExpr::ExceptAll(s) => Some(s),
            _ => None,
        }
    }

    /// Number of child slots. Always equals the operator catalog's slot count.
    pub fn child_count(&self) -> usize {
        match self {
            RelExpr::Scan(_)
            | RelExpr::VirtualScan(_)
            | RelExpr::SequenceSelect(_)
            | RelExpr::ShowTraceForSession(_)
            | RelExpr::FakeRel(_) => 0,
            RelExpr::Values { .. }
            | RelExpr::IndexJoin { .. }
            | RelExpr::ZigzagJoin { .. }
            | RelExpr::Max1Row { .. }
            | RelExpr::RowNumber { .. }
            | RelExpr::Explain { .. } => 1,
            RelExpr::Select { .. }
            | RelExpr::Project { .. }
            | RelExpr::LookupJoin { .. }
            | RelExpr::GroupBy(_)
            | RelExpr::ScalarGroupBy(_)
            | RelExpr::DistinctOn(_)
            | RelExpr::Union(_)
            | RelExpr::Intersect(_)
            | RelExpr::Except(_)
            | RelExpr::UnionAll(_)
            | RelExpr::IntersectAll(_)
            | RelExpr::ExceptAll(_)
            | RelExpr::Limit { .. }
            | RelExpr::Offset { .. }
            | RelExpr::ProjectSet { .. } => 2,
            RelExpr::InnerJoin(_)
            | RelExpr::LeftJoin(_)
            | RelExpr::RightJoin(_)
            | RelExpr::FullJoin(_)
            | RelExpr::SemiJoin(_)
            | RelExpr::AntiJoin(_)
            | RelExpr::InnerJoinApply(_)
            | RelExpr::LeftJoinApply(_)
            | RelExpr::RightJoinApply(_)
            | RelExpr::FullJoinApply(_)
            | RelExpr::SemiJoinApply(_)
            | RelExpr::AntiJoinApply(_)
            | RelExpr::MergeJoin { .. } => 3,
        }
    }

    /// The `i`th child slot, in catalog order
    pub fn child(&self, i: usize) -> Option<Child<'_>> {
        let child = match (self, i) {
            (RelExpr::Values { rows, .. }, 0) => Child::Rows(rows),
            (RelExpr::Select { input, .. }, 0) => Child::Rel(input),
            (RelExpr::Select { filters, .. }, 1) => Child::Filters(filters),
            (RelExpr::Project { input, .. }, 0) => Child::Rel(input),
            (RelExpr::Project { projections, .. }, 1) => Child::Projections(projections),
            (RelExpr::IndexJoin { input, .. }, 0) => Child::Rel(input),
            (RelExpr::LookupJoin { input, .. }, 0) => Child::Rel(input),
            (RelExpr::LookupJoin { on, .. }, 1) => Child::Filters(on),
            (RelExpr::MergeJoin { left, .. }, 0) => Child::Rel(left),
            (RelExpr::MergeJoin { right, .. }, 1) => Child::Rel(right),
            (RelExpr::MergeJoin { on, .. }, 2) => Child::Filters(on),
            (RelExpr::ZigzagJoin { on, .. }, 0) => Child::Filters(on),
            (RelExpr::Limit { input, .. }, 0) => Child::Rel(input),
            (RelExpr::Limit { limit, .. }, 1) => Child::Scalar(limit),
            (RelExpr::Offset { input, .. }, 0) => Child::Rel(input),
            (RelExpr::Offset { offset, .. }, 1) => Child::Scalar(offset),
            (RelExpr::Max1Row { input }, 0) => Child::Rel(input),
            (RelExpr::RowNumber { input, .. }, 0) => Child::Rel(input),
            (RelExpr::ProjectSet { input, .. }, 0) => Child::Rel(input),
            (RelExpr::ProjectSet { zip, .. }, 1) => Child::Zip(zip),
            (RelExpr::Explain { input, .. }, 0) => Child::Rel(input),
            (expr, i) => {
                if let Some(j) = expr.as_join() {
                    match i {
                        0 => Child::Rel(&j.left),
                        1 => Child::Rel(&j.right),
                        2 => Child::Filters(&j.on),
                        _ => return None,
                    }
                } else if let Some(g) = expr.as_grouping() {
                    match i {
                        0 => Child::Rel(&g.input),
                        1 => Child::Aggregations(&g.aggregations),
                        _ => return None,
                    }
                } else if let Some(s) = expr.as_set() {
                    match i {
                        0 => Child::Rel(&s.left),
                        1 => Child::Rel(&s.right),
                        _ => return None,
                    }
                } else {
                    return None;
                }
            }
        };
        Some(child)
    }

    /// Every child slot, in catalog order
    pub fn children(&self) -> impl Iterator<Item = Child<'_>> + '_ {
        (0..self.child_count()).filter_map(move |i| self.child(i))
    }

    /// Relational children, in slot order
    pub fn rel_children(&self) -> Vec<&RelRef> {
        self.children().filter_map(|c| c.as_rel()).collect()
    }

    /// A copy of this expression with its relational children replaced, in
    /// slot order. Returns `None` when the number of children differs.
    pub fn with_rel_children(&self, children: &[RelRef]) -> Option<RelExpr> {
        if children.len() != self.rel_children().len() {
            return None;
        }
        let mut next = children.iter().cloned();
        let mut expr = self.clone();
        match &mut expr {
            RelExpr::Select { input, .. }
            | RelExpr::Project { input, .. }
            | RelExpr::IndexJoin { input, .. }
            | RelExpr::LookupJoin { input, .. }
            | RelExpr::Limit { input, .. }
            | RelExpr::Offset { input, .. }
            | RelExpr::Max1Row { input }
            | RelExpr::RowNumber { input, .. }
            | RelExpr::ProjectSet { input, .. }
            | RelExpr::Explain { input, .. } => *input = next.next()?,
            RelExpr::MergeJoin { left, right, .. } => {
                *left = next.next()?;
                *right = next.next()?;
            }
            RelExpr::InnerJoin(j)
            | RelExpr::LeftJoin(j)
            | RelExpr::RightJoin(j)
            | RelExpr::FullJoin(j)
            | RelExpr::SemiJoin(j)
            | RelExpr::AntiJoin(j)
            | RelExpr::InnerJoinApply(j)
            | RelExpr::LeftJoinApply(j)
            | RelExpr::RightJoinApply(j)
            | RelExpr::FullJoinApply(j)
            | RelExpr::SemiJoinApply(j)
            | RelExpr::AntiJoinApply(j) => {
                j.left = next.next()?;
                j.right = next.next()?;
            }
            RelExpr::GroupBy(g) | RelExpr::ScalarGroupBy(g) | RelExpr::DistinctOn(g) => {
                g.input = next.next()?;
            }
            RelExpr::Union(s)
            | RelExpr::Intersect(s)
            | RelExpr::Except(s)
            | RelExpr::UnionAll(s)
            | RelExpr::IntersectAll(s)
            | RelExpr::ExceptAll(s) => {
                s.left = next.next()?;
                s.right = next.next()?;
            }
            RelExpr::Scan(_)
            | RelExpr::VirtualScan(_)
            | RelExpr::SequenceSelect(_)
            | RelExpr::Values { .. }
            | RelExpr::ZigzagJoin { .. }
            | RelExpr::ShowTraceForSession(_)
            | RelExpr::FakeRel(_) => {}
        }
        Some(expr)
    }
}

/// An immutable plan node: an expression and its derived properties.
///
/// Only the [`Factory`](crate::Factory) builds nodes, so every `RelNode`
/// has passed its operator's construction checks.
#[derive(Debug, PartialEq, Eq)]
pub struct RelNode {
    expr: RelExpr,
    props: RelProps,
}

impl RelNode {
    pub(crate) fn new(expr: RelExpr, props: RelProps) -> Self {
        Self { expr, props }
    }

    /// The expression
    pub fn expr(&self) -> &RelExpr {
        &self.expr
    }

    /// Derived relational properties
    pub fn props(&self) -> &RelProps {
        &self.props
    }

    /// The operator
    pub fn op(&self) -> Operator {
        self.expr.op()
    }

    /// Whether the operator carries `tag`
    pub fn has_tag(&self, tag: Tag) -> bool {
        self.expr.has_tag(tag)
    }

    /// Output columns
    pub fn output_cols(&self) -> &ColSet {
        &self.props.output_cols
    }

    /// Number of child slots
    pub fn child_count(&self) -> usize {
        self.expr.child_count()
    }

    /// The `i`th child slot
    pub fn child(&self, i: usize) -> Option<Child<'_>> {
        self.expr.child(i)
    }

    /// Relational children, in slot order
    pub fn rel_children(&self) -> Vec<&RelRef> {
        self.expr.rel_children()
    }
}

#[cfg(test)]
#[path = "relop_test.rs"]
mod tests;
