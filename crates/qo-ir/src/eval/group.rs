//! Grouping and set operator evaluation

use super::scalar::{eval_scalar, Env, Scope};
use super::{positions, Relation};
use crate::error::{ExecError, ExecResult};
use crate::operator::Operator;
use crate::private::SetPrivate;
use crate::relop::GroupingExpr;
use crate::scalar::{AggFunc, AggregationItem, Datum};
use qo_core::ColList;
use std::collections::{HashMap, HashSet};

/// Group `input` by the grouping columns and compute the aggregates.
///
/// Groups come out in order of first appearance after the input is sorted by
/// the intra-group ordering. With `scalar` set, an empty input still yields
/// one row of aggregate defaults.
pub(super) fn group(
    g: &GroupingExpr,
    mut input: Relation,
    scalar: bool,
    env: &Env,
) -> ExecResult<Relation> {
    input.sort_by(&g.private.ordering.to_ordering());
    let grouping: ColList = g.private.grouping_cols.iter().collect();
    let key_pos = positions(&input.cols, &grouping)?;

    let mut index: HashMap<Vec<Datum>, usize> = HashMap::new();
    let mut groups: Vec<(Vec<Datum>, Vec<usize>)> = Vec::new();
    for (i, row) in input.rows.iter().enumerate() {
        let key: Vec<Datum> = key_pos.iter().map(|&p| row[p].clone()).collect();
        let slot = *index.entry(key.clone()).or_insert_with(|| {
            groups.push((key, Vec::new()));
            groups.len() - 1
        });
        groups[slot].1.push(i);
    }
    if scalar && groups.is_empty() {
        groups.push((Vec::new(), Vec::new()));
    }

    let mut cols = grouping;
    for agg in &g.aggregations {
        cols.push(agg.col);
    }
    let mut rows = Vec::with_capacity(groups.len());
    for (key, members) in groups {
        let mut out = key;
        for agg in &g.aggregations {
            out.push(aggregate(agg, &input, &members, env)?);
        }
        rows.push(out);
    }
    Ok(Relation { cols, rows })
}

fn aggregate(
    agg: &AggregationItem,
    input: &Relation,
    members: &[usize],
    env: &Env,
) -> ExecResult<Datum> {
    if agg.func == AggFunc::CountRows {
        return Ok(Datum::Int(members.len() as i64));
    }
    let Some(arg) = &agg.arg else {
        return Ok(agg.func.default_value());
    };
    let mut values = Vec::with_capacity(members.len());
    for &i in members {
        let scope = Scope {
            cols: &input.cols,
            row: &input.rows[i],
            env,
        };
        values.push(eval_scalar(arg, &scope)?);
    }
    let mut non_null = values.iter().filter(|v| !v.is_null());
    let result = match agg.func {
        AggFunc::CountRows | AggFunc::Count => Datum::Int(non_null.count() as i64),
        AggFunc::Sum => {
            let mut sum: Option<i64> = None;
            for v in non_null {
                let n = v.as_int().ok_or_else(|| ExecError::TypeMismatch {
                    message: format!("sum expects integers, got {v}"),
                })?;
                sum = Some(sum.unwrap_or(0).checked_add(n).ok_or(ExecError::Overflow)?);
            }
            sum.map_or(Datum::Null, Datum::Int)
        }
        AggFunc::Min => non_null.min().cloned().unwrap_or(Datum::Null),
        AggFunc::Max => non_null.max().cloned().unwrap_or(Datum::Null),
        AggFunc::BoolAnd | AggFunc::BoolOr => {
            let mut acc: Option<bool> = None;
            for v in non_null {
                let Datum::Bool(b) = v else {
                    return Err(ExecError::TypeMismatch {
                        message: format!("{} expects booleans, got {v}", agg.func.name()),
                    });
                };
                acc = Some(match (acc, agg.func) {
                    (None, _) => *b,
                    (Some(a), AggFunc::BoolAnd) => a && *b,
                    (Some(a), _) => a || *b,
                });
            }
            acc.map_or(Datum::Null, Datum::Bool)
        }
        AggFunc::ConstAgg | AggFunc::FirstAgg => values.first().cloned().unwrap_or(Datum::Null),
        AggFunc::AnyNotNull => non_null.next().cloned().unwrap_or(Datum::Null),
    };
    Ok(result)
}

fn bag(rows: &[Vec<Datum>]) -> HashMap<&[Datum], usize> {
    let mut counts = HashMap::new();
    for row in rows {
        *counts.entry(row.as_slice()).or_insert(0) += 1;
    }
    counts
}

fn distinct(rows: impl IntoIterator<Item = Vec<Datum>>) -> Vec<Vec<Datum>> {
    let mut seen = HashSet::new();
    rows.into_iter()
        .filter(|r| seen.insert(r.clone()))
        .collect()
}

/// Combine two inputs positionally with bag or set semantics
pub(super) fn set_op(
    op: Operator,
    private: &SetPrivate,
    left: &Relation,
    right: &Relation,
) -> ExecResult<Relation> {
    let l = left.project(&private.left_cols)?.rows;
    let r = right.project(&private.right_cols)?.rows;
    let mut counts = bag(&r);
    let rows = match op {
        Operator::UnionAll => l.iter().chain(r.iter()).cloned().collect(),
        Operator::Union => distinct(l.iter().chain(r.iter()).cloned()),
        Operator::IntersectAll => l
            .iter()
            .filter(|row| match counts.get_mut(row.as_slice()) {
                Some(n) if *n > 0 => {
                    *n -= 1;
                    true
                }
                _ => false,
            })
            .cloned()
            .collect(),
        Operator::Intersect => distinct(
            l.iter()
                .filter(|row| counts.contains_key(row.as_slice()))
                .cloned(),
        ),
        Operator::ExceptAll => l
            .iter()
            .filter(|row| match counts.get_mut(row.as_slice()) {
                Some(n) if *n > 0 => {
                    *n -= 1;
                    false
                }
                _ => true,
            })
            .cloned()
            .collect(),
        Operator::Except => distinct(
            l.iter()
                .filter(|row| !counts.contains_key(row.as_slice()))
                .cloned(),
        ),
        op => return Err(ExecError::NotExecutable { op }),
    };
    Ok(Relation {
        cols: private.out_cols.clone(),
        rows,
    })
}
