//! Construction-time contract checks
//!
//! Every node passes [`check`] before the factory derives its properties.
//! A failed check is a producer bug and surfaces as
//! [`IrError::Contract`]; nothing is coerced into shape.

use crate::error::{IrError, IrResult};
use crate::operator::Operator;
use crate::private::{JoinType, ScanDirection, ScanPrivate, SetPrivate, ZigzagJoinPrivate};
use crate::props::const_count;
use crate::relop::{GroupingExpr, JoinExpr, RelExpr, RelNode};
use crate::scalar::{AggFunc, Generator, ScalarExpr};
use crate::tag::Tag;
use qo_core::{ColList, ColSet, ColumnType, IndexOrdinal, Metadata, OrderingChoice, TableId};

fn ensure(cond: bool, op: Operator, message: impl FnOnce() -> String) -> IrResult<()> {
    if cond {
        Ok(())
    } else {
        Err(IrError::contract(op, message()))
    }
}

fn ensure_subset(cols: &ColSet, of: &ColSet, op: Operator, what: &str) -> IrResult<()> {
    let missing = cols.difference(of);
    ensure(missing.is_empty(), op, || {
        format!("{what} {missing} not produced by the input")
    })
}

fn ensure_ordering(ordering: &OrderingChoice, input: &RelNode, op: Operator) -> IrResult<()> {
    ensure_subset(&ordering.col_set(), input.output_cols(), op, "ordering columns")
}

fn ensure_distinct(cols: &ColList, op: Operator, what: &str) -> IrResult<()> {
    ensure(!cols.has_duplicates(), op, || {
        format!("{what} {cols} contains duplicates")
    })
}

/// Check the structural contract of `expr`
pub(crate) fn check(expr: &RelExpr, md: &Metadata) -> IrResult<()> {
    let op = expr.op();
    match expr {
        RelExpr::Scan(p) => check_scan(p, md),
        RelExpr::VirtualScan(p) => {
            let table = md.table(p.table)?;
            ensure(table.is_virtual, op, || {
                format!("table '{}' is not virtual", table.name)
            })?;
            ensure(p.cols == table.col_set(), op, || {
                format!(
                    "columns {} must be every column of '{}' {}",
                    p.cols,
                    table.name,
                    table.col_set()
                )
            })
        }
        RelExpr::SequenceSelect(p) => {
            md.sequence(p.sequence)?;
            ensure(p.cols.len() == 3, op, || {
                format!("expected 3 columns, got {}", p.cols.len())
            })?;
            ensure_distinct(&p.cols, op, "columns")
        }
        RelExpr::Values { rows, private } => {
            ensure_distinct(&private.cols, op, "columns")?;
            for (i, row) in rows.iter().enumerate() {
                ensure(row.len() == private.cols.len(), op, || {
                    format!(
                        "row {i} has {} values but {} columns are declared",
                        row.len(),
                        private.cols.len()
                    )
                })?;
            }
            Ok(())
        }
        RelExpr::Select { .. } => Ok(()),
        RelExpr::Project {
            input,
            projections,
            passthrough,
        } => {
            ensure_subset(passthrough, input.output_cols(), op, "passthrough columns")?;
            let mut seen = ColSet::new();
            for p in projections {
                ensure(!input.output_cols().contains(p.col), op, || {
                    format!("projection {} shadows an input column", p.col)
                })?;
                ensure(seen.insert(p.col), op, || {
                    format!("projection {} is defined twice", p.col)
                })?;
            }
            Ok(())
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
        | RelExpr::AntiJoinApply(j) => check_join(op, j),
        RelExpr::IndexJoin { input, private } => {
            let table = md.table(private.table)?;
            ensure(!table.is_virtual, op, || {
                format!("virtual table '{}' has no primary index", table.name)
            })?;
            let pk = table.primary_key().to_set();
            ensure_subset(&pk, input.output_cols(), op, "primary key columns")?;
            let available = table.col_set().union(input.output_cols());
            let extra = private.cols.difference(&available);
            ensure(extra.is_empty(), op, || {
                format!("columns {extra} belong to neither '{}' nor the input", table.name)
            })
        }
        RelExpr::LookupJoin { input, private, .. } => {
            ensure(
                matches!(private.join_type, JoinType::Inner | JoinType::Left),
                op,
                || format!("join type {} is not inner or left", private.join_type),
            )?;
            ensure(!private.key_cols.is_empty(), op, || {
                "key columns must not be empty".to_string()
            })?;
            ensure_subset(&private.key_cols.to_set(), input.output_cols(), op, "key columns")?;
            let table = md.table(private.table)?;
            let index = table.index(private.index)?;
            ensure(private.key_cols.len() <= index.key.len(), op, || {
                format!(
                    "{} key columns exceed the {} columns of index '{}'",
                    private.key_cols.len(),
                    index.key.len(),
                    index.name
                )
            })?;
            for (key, idx) in private.key_cols.iter().zip(index.key.iter()) {
                let (key_ty, idx_ty) = (md.column(key)?.ty, md.column(idx.col)?.ty);
                ensure(
                    key_ty == idx_ty || key_ty == ColumnType::Unknown || idx_ty == ColumnType::Unknown,
                    op,
                    || format!("key column {key} ({key_ty}) cannot look up {} ({idx_ty})", idx.col),
                )?;
            }
            let shared = input.output_cols().intersection(&table.col_set());
            ensure(shared.is_empty(), op, || {
                format!("input already produces table columns {shared}")
            })?;
            let available = table.col_set().union(input.output_cols());
            let extra = private.cols.difference(&available);
            ensure(extra.is_empty(), op, || {
                format!("columns {extra} belong to neither '{}' nor the input", table.name)
            })
        }
        RelExpr::MergeJoin {
            left,
            right,
            private,
            ..
        } => {
            let shared = left.output_cols().intersection(right.output_cols());
            ensure(shared.is_empty(), op, || {
                format!("inputs both produce {shared}")
            })?;
            ensure_uncorrelated(op, left, right)?;
            ensure(private.left_eq.len() == private.right_eq.len(), op, || {
                format!(
                    "left equality columns ({}) and right equality columns ({}) differ in length",
                    private.left_eq.len(),
                    private.right_eq.len()
                )
            })?;
            ensure(!private.left_eq.is_empty(), op, || {
                "equality columns must not be empty".to_string()
            })?;
            for (l, r) in private.left_eq.iter().zip(private.right_eq.iter()) {
                ensure(l.descending == r.descending, op, || {
                    format!("equality pair {l}/{r} has mismatched directions")
                })?;
            }
            ensure_subset(&private.left_eq.col_set(), left.output_cols(), op, "left equality columns")?;
            ensure_subset(&private.right_eq.col_set(), right.output_cols(), op, "right equality columns")?;
            ensure_ordering(&private.left_ordering, left, op)?;
            ensure_ordering(&private.right_ordering, right, op)?;
            ensure(private.left_ordering.satisfied_by(&private.left_eq), op, || {
                format!(
                    "left ordering {} is not satisfied by {}",
                    private.left_ordering, private.left_eq
                )
            })?;
            ensure(private.right_ordering.satisfied_by(&private.right_eq), op, || {
                format!(
                    "right ordering {} is not satisfied by {}",
                    private.right_ordering, private.right_eq
                )
            })
        }
        RelExpr::ZigzagJoin { private, .. } => check_zigzag(private, md),
        RelExpr::GroupBy(g) | RelExpr::ScalarGroupBy(g) | RelExpr::DistinctOn(g) => {
            check_grouping(op, g)
        }
        RelExpr::Union(s)
        | RelExpr::Intersect(s)
        | RelExpr::Except(s)
        | RelExpr::UnionAll(s)
        | RelExpr::IntersectAll(s)
        | RelExpr::ExceptAll(s) => {
            check_set_private(op, &s.private)?;
            ensure_subset(&s.private.left_cols.to_set(), s.left.output_cols(), op, "left columns")?;
            ensure_subset(&s.private.right_cols.to_set(), s.right.output_cols(), op, "right columns")
        }
        RelExpr::Limit {
            input,
            limit,
            ordering,
        } => {
            check_count(op, limit)?;
            ensure_ordering(ordering, input, op)?;
            if ordering.is_any() && input.props().cardinality.max.map_or(true, |m| m > 1) {
                log::warn!("limit without an ordering keeps an arbitrary subset of rows");
            }
            Ok(())
        }
        RelExpr::Offset {
            input,
            offset,
            ordering,
        } => {
            check_count(op, offset)?;
            ensure_ordering(ordering, input, op)?;
            if ordering.is_any() && input.props().cardinality.max.map_or(true, |m| m > 1) {
                log::warn!("offset without an ordering skips an arbitrary subset of rows");
            }
            Ok(())
        }
        RelExpr::Max1Row { .. } => Ok(()),
        RelExpr::RowNumber { input, private } => {
            ensure(!input.output_cols().contains(private.col), op, || {
                format!("row number column {} is already produced by the input", private.col)
            })?;
            ensure_ordering(&private.ordering, input, op)
        }
        RelExpr::ProjectSet { input, zip } => {
            let mut seen = input.output_cols().clone();
            for item in zip {
                ensure(!item.cols.is_empty(), op, || {
                    "generator must produce at least one column".to_string()
                })?;
                if let Some(arity) = item.func.arity() {
                    ensure(arity == item.cols.len(), op, || {
                        format!(
                            "generator yields {arity} columns but {} are declared",
                            item.cols.len()
                        )
                    })?;
                }
                if let Generator::Rows(rows) = &item.func {
                    for row in rows {
                        ensure(row.len() == item.cols.len(), op, || {
                            format!(
                                "generator row has {} values but {} columns are declared",
                                row.len(),
                                item.cols.len()
                            )
                        })?;
                    }
                }
                for col in &item.cols {
                    ensure(seen.insert(col), op, || {
                        format!("generator column {col} is not new")
                    })?;
                }
            }
            Ok(())
        }
        RelExpr::Explain { private, .. } => {
            ensure(!private.cols.is_empty(), op, || "explain needs an output column".to_string())
        }
        RelExpr::ShowTraceForSession(p) => {
            ensure(!p.cols.is_empty(), op, || "trace needs output columns".to_string())?;
            ensure_distinct(&p.cols, op, "columns")
        }
        RelExpr::FakeRel(p) => ensure_subset(
            &p.props.not_null_cols,
            &p.props.output_cols,
            op,
            "not-null columns",
        ),
    }
}

fn check_scan(p: &ScanPrivate, md: &Metadata) -> IrResult<()> {
    let op = Operator::Scan;
    let table = md.table(p.table)?;
    ensure(!table.is_virtual, op, || {
        format!("virtual table '{}' must be read by virtual-scan", table.name)
    })?;
    let index = table.index(p.index)?;
    let extra = p.cols.difference(&table.col_set());
    ensure(extra.is_empty(), op, || {
        format!("columns {extra} are not columns of '{}'", table.name)
    })?;
    if let Some(limit) = p.hard_limit {
        ensure(limit.rows > 0, op, || "hard limit must be positive".to_string())?;
    }
    ensure(p.flags.direction.is_none() || p.flags.force_index, op, || {
        "a forced direction requires a forced index".to_string()
    })?;
    if let (Some(limit), Some(direction)) = (p.hard_limit, p.flags.direction) {
        ensure(limit.reverse == (direction == ScanDirection::Reverse), op, || {
            format!("forced direction {direction:?} contradicts the hard limit direction")
        })?;
    }
    if let Some(constraint) = &p.constraint {
        let prefix = constraint.columns.len() <= index.key.len()
            && constraint
                .columns
                .iter()
                .zip(index.key.iter())
                .all(|(c, k)| c == k);
        ensure(prefix, op, || {
            format!(
                "constraint columns {} are not a prefix of index '{}' ({})",
                constraint.columns, index.name, index.key
            )
        })?;
        for span in &constraint.spans {
            ensure(
                span.start.len() <= constraint.columns.len()
                    && span.end.len() <= constraint.columns.len(),
                op,
                || "span key is longer than the constrained columns".to_string(),
            )?;
        }
    }
    Ok(())
}

fn check_join(op: Operator, j: &JoinExpr) -> IrResult<()> {
    let left = j.left.output_cols();
    let right = j.right.output_cols();
    let shared = left.intersection(right);
    ensure(shared.is_empty(), op, || format!("inputs both produce {shared}"))?;
    if op.has_tag(Tag::JoinNonApply) {
        ensure_uncorrelated(op, &j.left, &j.right)?;
    }
    Ok(())
}

/// Only Apply joins may let the right input reference left columns
fn ensure_uncorrelated(op: Operator, left: &RelNode, right: &RelNode) -> IrResult<()> {
    let correlated = right.props().outer_cols.intersection(left.output_cols());
    ensure(correlated.is_empty(), op, || {
        format!("right input references left columns {correlated}; use the apply variant")
    })
}

fn check_zigzag(p: &ZigzagJoinPrivate, md: &Metadata) -> IrResult<()> {
    let op = Operator::ZigzagJoin;
    ensure(p.left_eq_cols.len() == p.right_eq_cols.len(), op, || {
        format!(
            "left equality columns ({}) and right equality columns ({}) differ in length",
            p.left_eq_cols.len(),
            p.right_eq_cols.len()
        )
    })?;
    ensure(!p.left_eq_cols.is_empty(), op, || {
        "equality columns must not be empty".to_string()
    })?;
    check_zigzag_side(
        op,
        md,
        (p.left_table, p.left_index),
        &p.left_fixed_cols,
        p.left_fixed_vals.len(),
        &p.left_eq_cols,
        "left",
    )?;
    check_zigzag_side(
        op,
        md,
        (p.right_table, p.right_index),
        &p.right_fixed_cols,
        p.right_fixed_vals.len(),
        &p.right_eq_cols,
        "right",
    )?;
    let available = md.table(p.left_table)?.col_set().union(&md.table(p.right_table)?.col_set());
    let extra = p.cols.difference(&available);
    ensure(extra.is_empty(), op, || {
        format!("columns {extra} belong to neither index")
    })
}

fn check_zigzag_side(
    op: Operator,
    md: &Metadata,
    (table, index): (TableId, IndexOrdinal),
    fixed: &ColList,
    fixed_vals: usize,
    eq: &ColList,
    side: &str,
) -> IrResult<()> {
    ensure(fixed.len() == fixed_vals, op, || {
        format!(
            "{side} side has {} fixed columns but {fixed_vals} fixed values",
            fixed.len()
        )
    })?;
    let table = md.table(table)?;
    let index = table.index(index)?;
    let key = index.key_cols();
    let expected: ColList = fixed.iter().chain(eq.iter()).collect();
    ensure(key.starts_with(&expected), op, || {
        format!(
            "{side} fixed columns {fixed} followed by equality columns {eq} are not a prefix of index '{}' {}",
            index.name, key
        )
    })
}

fn check_grouping(op: Operator, g: &GroupingExpr) -> IrResult<()> {
    let input = &g.input;
    if op == Operator::ScalarGroupBy {
        ensure(g.private.grouping_cols.is_empty(), op, || {
            format!("grouping columns must be empty, got {}", g.private.grouping_cols)
        })?;
    }
    ensure_subset(&g.private.grouping_cols, input.output_cols(), op, "grouping columns")?;
    ensure_ordering(&g.private.ordering, input, op)?;
    let mut seen = ColSet::new();
    for agg in &g.aggregations {
        ensure(!g.private.grouping_cols.contains(agg.col), op, || {
            format!("aggregate column {} is also a grouping column", agg.col)
        })?;
        ensure(seen.insert(agg.col), op, || {
            format!("aggregate column {} is defined twice", agg.col)
        })?;
        ensure(agg.func.takes_arg() == agg.arg.is_some(), op, || {
            format!("{} has the wrong number of arguments", agg.func.name())
        })?;
        if op == Operator::DistinctOn {
            ensure(
                matches!(agg.func, AggFunc::FirstAgg | AggFunc::ConstAgg),
                op,
                || format!("{} cannot pick a row; use first_agg", agg.func.name()),
            )?;
        }
    }
    Ok(())
}

fn check_set_private(op: Operator, p: &SetPrivate) -> IrResult<()> {
    ensure(
        p.left_cols.len() == p.right_cols.len() && p.right_cols.len() == p.out_cols.len(),
        op,
        || {
            format!(
                "column lists differ in length: left {}, right {}, out {}",
                p.left_cols.len(),
                p.right_cols.len(),
                p.out_cols.len()
            )
        },
    )?;
    ensure_distinct(&p.out_cols, op, "output columns")
}

fn check_count(op: Operator, count: &ScalarExpr) -> IrResult<()> {
    match count.as_const() {
        Some(_) => ensure(const_count(count).is_some(), op, || {
            format!("count {count} is not a non-negative integer")
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
#[path = "validate_test.rs"]
mod tests;
