//! Derived relational properties
//!
//! Properties are derived once, when the factory builds a node, from the
//! node's private data, its children's properties and the metadata
//! registry. They are never recomputed or updated afterwards.

use crate::error::IrResult;
use crate::operator::Operator;
use crate::private::{JoinType, LookupJoinPrivate, ZigzagJoinPrivate};
use crate::relop::{GroupingExpr, RelExpr, RelNode, SetExpr};
use crate::scalar::{filters_cols, Datum, ScalarExpr};
use qo_core::{ColList, ColSet, IndexOrdinal, Metadata, TableId};
use serde::{Deserialize, Serialize};

/// Bounds on the number of rows a relation produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cardinality {
    /// Lower bound
    pub min: u64,
    /// Upper bound; `None` is unbounded
    pub max: Option<u64>,
}

impl Default for Cardinality {
    fn default() -> Self {
        Self::ANY
    }
}

impl Cardinality {
    /// Any number of rows
    pub const ANY: Cardinality = Cardinality { min: 0, max: None };

    /// Exactly `n` rows
    pub const fn exactly(n: u64) -> Self {
        Cardinality {
            min: n,
            max: Some(n),
        }
    }

    /// Between zero and `n` rows
    pub const fn at_most(n: u64) -> Self {
        Cardinality { min: 0, max: Some(n) }
    }

    /// Whether `count` rows are within the bounds
    pub fn allows(self, count: u64) -> bool {
        count >= self.min && self.max.map_or(true, |max| count <= max)
    }

    /// Keep the upper bound, drop the lower bound to zero
    pub fn as_optional(self) -> Self {
        Cardinality {
            min: 0,
            max: self.max,
        }
    }

    /// Cap both bounds at `n`
    pub fn limit(self, n: u64) -> Self {
        Cardinality {
            min: self.min.min(n),
            max: Some(self.max.map_or(n, |max| max.min(n))),
        }
    }

    /// Bounds after skipping `n` rows
    pub fn skip(self, n: u64) -> Self {
        Cardinality {
            min: self.min.saturating_sub(n),
            max: self.max.map(|max| max.saturating_sub(n)),
        }
    }

    /// Bounds of the concatenation of two relations
    pub fn add(self, other: Cardinality) -> Self {
        Cardinality {
            min: self.min.saturating_add(other.min),
            max: match (self.max, other.max) {
                (Some(a), Some(b)) => Some(a.saturating_add(b)),
                _ => None,
            },
        }
    }

    /// Bounds of the cross product of two relations
    pub fn product(self, other: Cardinality) -> Self {
        Cardinality {
            min: self.min.saturating_mul(other.min),
            max: match (self.max, other.max) {
                (Some(a), Some(b)) => Some(a.saturating_mul(b)),
                _ => None,
            },
        }
    }
}

impl std::fmt::Display for Cardinality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.max {
            Some(max) => write!(f, "[{} - {}]", self.min, max),
            None => write!(f, "[{} - ]", self.min),
        }
    }
}

/// Logical properties of a relational node
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RelProps {
    /// Columns produced
    pub output_cols: ColSet,
    /// Output column order, for operators with positional output
    #[serde(default)]
    pub output_list: Option<ColList>,
    /// Columns referenced but bound outside the node
    #[serde(default)]
    pub outer_cols: ColSet,
    /// Row count bounds
    #[serde(default)]
    pub cardinality: Cardinality,
    /// Output columns that are never NULL
    #[serde(default)]
    pub not_null_cols: ColSet,
}

impl RelProps {
    /// Properties with the given output columns and nothing else known
    pub fn with_cols(output_cols: ColSet) -> Self {
        Self {
            output_cols,
            ..Self::default()
        }
    }

    /// Whether the node references no columns from outside
    pub fn is_closed(&self) -> bool {
        self.outer_cols.is_empty()
    }
}

/// Columns referenced by `refs` that `bound` does not provide
fn free_cols(refs: &ColSet, bound: &ColSet) -> ColSet {
    refs.difference(bound)
}

/// Properties of an index read "as if" it were another relational input:
/// every table column, with the table's NOT NULL columns.
///
/// Derived on demand from the table metadata; nothing is cached.
pub fn table_props(md: &Metadata, table: TableId, index: IndexOrdinal) -> IrResult<RelProps> {
    let meta = md.table(table)?;
    meta.index(index)?;
    let output_cols = meta.col_set();
    Ok(RelProps {
        not_null_cols: meta.not_null.intersection(&output_cols),
        output_cols,
        ..RelProps::default()
    })
}

impl LookupJoinPrivate {
    /// Properties of the looked-up index as a relational input
    pub fn lookup_props(&self, md: &Metadata) -> IrResult<RelProps> {
        table_props(md, self.table, self.index)
    }
}

impl ZigzagJoinPrivate {
    /// Properties of the left index as a relational input
    pub fn left_props(&self, md: &Metadata) -> IrResult<RelProps> {
        table_props(md, self.left_table, self.left_index)
    }

    /// Properties of the right index as a relational input
    pub fn right_props(&self, md: &Metadata) -> IrResult<RelProps> {
        table_props(md, self.right_table, self.right_index)
    }
}

/// Whether a scalar is known never to be NULL in rows of `input`
fn never_null(expr: &ScalarExpr, input_not_null: &ColSet) -> bool {
    match expr {
        ScalarExpr::Const(d) => !d.is_null(),
        ScalarExpr::Variable(c) => input_not_null.contains(*c),
        ScalarExpr::IsNull { .. } => true,
        _ => false,
    }
}

/// Output and not-null columns of a join of `join_type` over two inputs
fn join_output(
    join_type: JoinType,
    left: &RelProps,
    right: &RelProps,
    on: &[ScalarExpr],
) -> (ColSet, ColSet, Cardinality) {
    let both = left.output_cols.union(&right.output_cols);
    let product = left.cardinality.product(right.cardinality);
    match join_type {
        JoinType::Inner => {
            let mut not_null = left.not_null_cols.union(&right.not_null_cols);
            for f in on {
                not_null.union_with(&f.null_rejected_cols().intersection(&both));
            }
            let card = if on.is_empty() {
                product
            } else {
                product.as_optional()
            };
            (both, not_null, card)
        }
        JoinType::Left => {
            let card = Cardinality {
                min: left.cardinality.min,
                max: product.max.map(|m| m.max(left.cardinality.max.unwrap_or(0))),
            };
            (both, left.not_null_cols.clone(), card)
        }
        JoinType::Right => {
            let card = Cardinality {
                min: right.cardinality.min,
                max: product.max.map(|m| m.max(right.cardinality.max.unwrap_or(0))),
            };
            (both, right.not_null_cols.clone(), card)
        }
        JoinType::Full => {
            let card = Cardinality {
                min: left.cardinality.min.max(right.cardinality.min),
                max: product.add(left.cardinality.add(right.cardinality)).max,
            };
            (both, ColSet::new(), card)
        }
        JoinType::Semi | JoinType::Anti => (
            left.output_cols.clone(),
            left.not_null_cols.clone(),
            left.cardinality.as_optional(),
        ),
    }
}

fn derive_join(join_type: JoinType, left: &RelNode, right: &RelNode, on: &[ScalarExpr]) -> RelProps {
    let left = left.props();
    let right = right.props();
    let (output_cols, not_null_cols, cardinality) = join_output(join_type, left, right, on);
    let mut refs = left.outer_cols.union(&right.outer_cols);
    refs.union_with(&filters_cols(on));
    // Apply joins bind the right side's references to left columns here.
    let outer_cols = free_cols(&refs, &left.output_cols.union(&right.output_cols));
    RelProps {
        output_cols,
        output_list: None,
        outer_cols,
        cardinality,
        not_null_cols,
    }
}

fn derive_grouping(g: &GroupingExpr, scalar: bool) -> RelProps {
    let input = g.input.props();
    let mut output_cols = g.private.grouping_cols.clone();
    let mut not_null_cols = g.private.grouping_cols.intersection(&input.not_null_cols);
    let mut refs = input.outer_cols.clone();
    for agg in &g.aggregations {
        output_cols.insert(agg.col);
        if agg.func.is_count() {
            not_null_cols.insert(agg.col);
        }
        if let Some(arg) = &agg.arg {
            refs.union_with(&free_cols(&arg.referenced_cols(), &input.output_cols));
        }
    }
    let cardinality = if scalar {
        Cardinality::exactly(1)
    } else if g.private.grouping_cols.is_empty() {
        Cardinality {
            min: input.cardinality.min.min(1),
            max: Some(input.cardinality.max.map_or(1, |m| m.min(1))),
        }
    } else {
        Cardinality {
            min: input.cardinality.min.min(1),
            max: input.cardinality.max,
        }
    };
    RelProps {
        output_cols,
        output_list: None,
        outer_cols: refs,
        cardinality,
        not_null_cols,
    }
}

fn derive_set(op: Operator, s: &SetExpr) -> RelProps {
    let left = s.left.props();
    let right = s.right.props();
    let out = &s.private.out_cols;
    let mut not_null_cols = ColSet::new();
    for (i, col) in out.iter().enumerate() {
        let l = s.private.left_cols.get(i).is_some_and(|c| left.not_null_cols.contains(c));
        let r = s.private.right_cols.get(i).is_some_and(|c| right.not_null_cols.contains(c));
        let keep = match op {
            Operator::Union | Operator::UnionAll => l && r,
            Operator::Intersect | Operator::IntersectAll => l || r,
            _ => l,
        };
        if keep {
            not_null_cols.insert(col);
        }
    }
    let (lc, rc) = (left.cardinality, right.cardinality);
    let cardinality = match op {
        Operator::UnionAll => lc.add(rc),
        Operator::Union => Cardinality {
            min: lc.min.max(rc.min).min(1),
            max: lc.add(rc).max,
        },
        Operator::Intersect | Operator::IntersectAll => Cardinality {
            min: 0,
            max: match (lc.max, rc.max) {
                (Some(a), Some(b)) => Some(a.min(b)),
                (a, b) => a.or(b),
            },
        },
        _ => lc.as_optional(),
    };
    RelProps {
        output_cols: out.to_set(),
        output_list: Some(out.clone()),
        outer_cols: left.outer_cols.union(&right.outer_cols),
        cardinality,
        not_null_cols,
    }
}

/// Constant non-negative integer value of a limit/offset expression
pub(crate) fn const_count(expr: &ScalarExpr) -> Option<u64> {
    match expr.as_const() {
        Some(Datum::Int(n)) => u64::try_from(*n).ok(),
        _ => None,
    }
}

/// Pass-through properties of a unary operator with extra scalar references
fn passthrough(input: &RelNode, scalar_refs: ColSet) -> RelProps {
    let props = input.props();
    let mut outer_cols = props.outer_cols.clone();
    outer_cols.union_with(&free_cols(&scalar_refs, &props.output_cols));
    RelProps {
        output_cols: props.output_cols.clone(),
        output_list: None,
        outer_cols,
        cardinality: props.cardinality,
        not_null_cols: props.not_null_cols.clone(),
    }
}

/// Derive the properties of `expr`. The expression has already passed
/// construction checks.
pub(crate) fn derive(expr: &RelExpr, md: &Metadata) -> IrResult<RelProps> {
    let props = match expr {
        RelExpr::Scan(p) => {
            let table = md.table(p.table)?;
            RelProps {
                not_null_cols: p.cols.intersection(&table.not_null),
                output_cols: p.cols.clone(),
                output_list: None,
                outer_cols: ColSet::new(),
                cardinality: match p.hard_limit {
                    Some(limit) => Cardinality::at_most(limit.rows),
                    None => Cardinality::ANY,
                },
            }
        }
        RelExpr::VirtualScan(p) => {
            let table = md.table(p.table)?;
            RelProps {
                not_null_cols: p.cols.intersection(&table.not_null),
                output_cols: p.cols.clone(),
                output_list: Some(table.columns.clone()),
                ..RelProps::default()
            }
        }
        RelExpr::SequenceSelect(p) => RelProps {
            output_cols: p.cols.to_set(),
            output_list: Some(p.cols.clone()),
            outer_cols: ColSet::new(),
            cardinality: Cardinality::exactly(1),
            not_null_cols: p.cols.to_set(),
        },
        RelExpr::Values { rows, private } => {
            let mut outer_cols = ColSet::new();
            let mut not_null_cols = ColSet::new();
            let none = ColSet::new();
            for (i, col) in private.cols.iter().enumerate() {
                if rows.iter().all(|r| r.get(i).is_some_and(|e| never_null(e, &none))) {
                    not_null_cols.insert(col);
                }
            }
            for row in rows {
                outer_cols.union_with(&filters_cols(row));
            }
            RelProps {
                output_cols: private.cols.to_set(),
                output_list: Some(private.cols.clone()),
                outer_cols,
                cardinality: Cardinality::exactly(rows.len() as u64),
                not_null_cols,
            }
        }
        RelExpr::Select { input, filters } => {
            let mut props = passthrough(input, filters_cols(filters));
            if !filters.is_empty() {
                props.cardinality = props.cardinality.as_optional();
            }
            for f in filters {
                let rejected = f.null_rejected_cols().intersection(&props.output_cols);
                props.not_null_cols.union_with(&rejected);
            }
            props
        }
        RelExpr::Project {
            input,
            projections,
            passthrough: kept,
        } => {
            let in_props = input.props();
            let mut output_cols = kept.clone();
            let mut not_null_cols = kept.intersection(&in_props.not_null_cols);
            let mut refs = ColSet::new();
            for p in projections {
                output_cols.insert(p.col);
                if never_null(&p.expr, &in_props.not_null_cols) {
                    not_null_cols.insert(p.col);
                }
                refs.union_with(&p.expr.referenced_cols());
            }
            let mut outer_cols = in_props.outer_cols.clone();
            outer_cols.union_with(&free_cols(&refs, &in_props.output_cols));
            RelProps {
                output_cols,
                output_list: None,
                outer_cols,
                cardinality: in_props.cardinality,
                not_null_cols,
            }
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
            let join_type = expr.op().join_type().unwrap_or(JoinType::Inner);
            derive_join(join_type, &j.left, &j.right, &j.on)
        }
        RelExpr::IndexJoin { input, private } => {
            let in_props = input.props();
            let table = md.table(private.table)?;
            let from_table = private.cols.intersection(&table.not_null);
            let from_input = private.cols.intersection(&in_props.not_null_cols);
            RelProps {
                output_cols: private.cols.clone(),
                output_list: None,
                outer_cols: in_props.outer_cols.clone(),
                cardinality: in_props.cardinality,
                not_null_cols: from_table.union(&from_input),
            }
        }
        RelExpr::LookupJoin { input, on, private } => {
            let in_props = input.props();
            let lookup = private.lookup_props(md)?;
            let (_, not_null, cardinality) = join_output(private.join_type, in_props, &lookup, on);
            let bound = in_props.output_cols.union(&lookup.output_cols);
            let mut outer_cols = in_props.outer_cols.clone();
            outer_cols.union_with(&free_cols(&filters_cols(on), &bound));
            RelProps {
                not_null_cols: not_null.intersection(&private.cols),
                output_cols: private.cols.clone(),
                output_list: None,
                outer_cols,
                // A lookup may match many index rows.
                cardinality: Cardinality {
                    min: cardinality.min.min(in_props.cardinality.min),
                    max: None,
                },
            }
        }
        RelExpr::MergeJoin {
            left,
            right,
            on,
            private,
        } => derive_join(private.join_type, left, right, on),
        RelExpr::ZigzagJoin { on, private } => {
            let left = private.left_props(md)?;
            let right = private.right_props(md)?;
            let bound = left.output_cols.union(&right.output_cols);
            let not_null = left.not_null_cols.union(&right.not_null_cols);
            RelProps {
                not_null_cols: not_null.intersection(&private.cols),
                output_cols: private.cols.clone(),
                output_list: None,
                outer_cols: free_cols(&filters_cols(on), &bound),
                cardinality: Cardinality::ANY,
            }
        }
        RelExpr::GroupBy(g) | RelExpr::DistinctOn(g) => derive_grouping(g, false),
        RelExpr::ScalarGroupBy(g) => derive_grouping(g, true),
        RelExpr::Union(s)
        | RelExpr::Intersect(s)
        | RelExpr::Except(s)
        | RelExpr::UnionAll(s)
        | RelExpr::IntersectAll(s)
        | RelExpr::ExceptAll(s) => derive_set(expr.op(), s),
        RelExpr::Limit { input, limit, .. } => {
            let mut props = passthrough(input, limit.referenced_cols());
            props.cardinality = match const_count(limit) {
                Some(n) => props.cardinality.limit(n),
                None => props.cardinality.as_optional(),
            };
            props
        }
        RelExpr::Offset { input, offset, .. } => {
            let mut props = passthrough(input, offset.referenced_cols());
            props.cardinality = match const_count(offset) {
                Some(n) => props.cardinality.skip(n),
                None => props.cardinality.as_optional(),
            };
            props
        }
        RelExpr::Max1Row { input } => {
            let mut props = passthrough(input, ColSet::new());
            props.cardinality = props.cardinality.limit(1);
            props
        }
        RelExpr::RowNumber { input, private } => {
            let mut props = passthrough(input, ColSet::new());
            props.output_cols.insert(private.col);
            props.not_null_cols.insert(private.col);
            props
        }
        RelExpr::ProjectSet { input, zip } => {
            let mut refs = ColSet::new();
            for item in zip {
                refs.union_with(&item.func.referenced_cols());
            }
            let mut props = passthrough(input, refs);
            for item in zip {
                props.output_cols.union_with(&item.cols.to_set());
            }
            props.cardinality = Cardinality::ANY;
            props
        }
        RelExpr::Explain { input, private } => RelProps {
            output_cols: private.cols.to_set(),
            output_list: Some(private.cols.clone()),
            outer_cols: input.props().outer_cols.clone(),
            cardinality: Cardinality::ANY,
            not_null_cols: ColSet::new(),
        },
        RelExpr::ShowTraceForSession(p) => RelProps {
            output_cols: p.cols.to_set(),
            output_list: Some(p.cols.clone()),
            ..RelProps::default()
        },
        RelExpr::FakeRel(p) => p.props.clone(),
    };
    Ok(props)
}

#[cfg(test)]
#[path = "props_test.rs"]
mod tests;
