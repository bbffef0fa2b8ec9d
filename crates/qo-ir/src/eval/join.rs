//! Nested-loop evaluation of the join operators

use super::scalar::{filters_pass, Env, Scope};
use super::{positions, result_cols, Evaluator, Relation};
use crate::error::{ExecError, ExecResult};
use crate::operator::Operator;
use crate::private::{JoinType, LookupJoinPrivate, ZigzagJoinPrivate};
use crate::relop::RelRef;
use crate::scalar::{Datum, ScalarExpr};
use qo_core::{ColList, TableMeta};

fn concat_cols(left: &ColList, right: &ColList) -> ColList {
    left.iter().chain(right.iter()).collect()
}

fn nulls(n: usize) -> impl Iterator<Item = Datum> {
    std::iter::repeat(Datum::Null).take(n)
}

/// Join two materialized inputs on `on` with the semantics of `join_type`
pub(super) fn join_relations(
    join_type: JoinType,
    left: &Relation,
    right: &Relation,
    on: &[ScalarExpr],
    env: &Env,
) -> ExecResult<Relation> {
    let combined = concat_cols(&left.cols, &right.cols);
    let cols = if join_type.left_cols_only() {
        left.cols.clone()
    } else {
        combined.clone()
    };
    let mut rows = Vec::new();
    let mut right_matched = vec![false; right.rows.len()];
    for l in &left.rows {
        let mut matched = false;
        for (ri, r) in right.rows.iter().enumerate() {
            let row: Vec<Datum> = l.iter().chain(r.iter()).cloned().collect();
            let scope = Scope {
                cols: &combined,
                row: &row,
                env,
            };
            if !filters_pass(on, &scope)? {
                continue;
            }
            matched = true;
            right_matched[ri] = true;
            match join_type {
                JoinType::Semi => break,
                JoinType::Anti => break,
                _ => rows.push(row),
            }
        }
        match (join_type, matched) {
            (JoinType::Left | JoinType::Full, false) => {
                rows.push(l.iter().cloned().chain(nulls(right.cols.len())).collect());
            }
            (JoinType::Semi, true) | (JoinType::Anti, false) => rows.push(l.clone()),
            _ => {}
        }
    }
    if matches!(join_type, JoinType::Right | JoinType::Full) {
        for (r, matched) in right.rows.iter().zip(right_matched) {
            if !matched {
                rows.push(nulls(left.cols.len()).chain(r.iter().cloned()).collect());
            }
        }
    }
    Ok(Relation { cols, rows })
}

/// Re-evaluate `right` once per left row with the left row's columns bound
pub(super) fn apply_join(
    ev: &Evaluator<'_>,
    op: Operator,
    join_type: JoinType,
    left: &Relation,
    right: &RelRef,
    on: &[ScalarExpr],
    env: &Env,
) -> ExecResult<Relation> {
    // Unmatched right rows have no single binding of the left columns.
    if matches!(join_type, JoinType::Right | JoinType::Full) {
        return Err(ExecError::NotExecutable { op });
    }
    let right_cols = result_cols(right);
    let cols = if join_type.left_cols_only() {
        left.cols.clone()
    } else {
        concat_cols(&left.cols, &right_cols)
    };
    let mut out = Relation::empty(cols);
    for l in &left.rows {
        let mut bound = env.clone();
        for (c, v) in left.cols.iter().zip(l.iter()) {
            bound.insert(c, v.clone());
        }
        let r = ev.eval_in(right, &bound)?;
        let single = Relation {
            cols: left.cols.clone(),
            rows: vec![l.clone()],
        };
        out.rows
            .extend(join_relations(join_type, &single, &r, on, &bound)?.rows);
    }
    Ok(out)
}

/// Fetch each input row's table row by primary key
pub(super) fn index_join(
    input: &Relation,
    table_rows: &Relation,
    table: &TableMeta,
) -> ExecResult<Relation> {
    let pk = table.primary_key();
    let input_pos = positions(&input.cols, &pk)?;
    let table_pos = positions(&table_rows.cols, &pk)?;
    let extra: ColList = table_rows
        .cols
        .iter()
        .filter(|c| !input.cols.contains(*c))
        .collect();
    let extra_pos = positions(&table_rows.cols, &extra)?;
    let mut rows = Vec::with_capacity(input.rows.len());
    for row in &input.rows {
        let key: Vec<&Datum> = input_pos.iter().map(|&i| &row[i]).collect();
        let found = table_rows
            .rows
            .iter()
            .find(|t| table_pos.iter().map(|&i| &t[i]).eq(key.iter().copied()))
            .ok_or_else(|| ExecError::MissingRow {
                table: table.name.clone(),
                key: key
                    .iter()
                    .map(|d| d.to_string())
                    .collect::<Vec<_>>()
                    .join(", "),
            })?;
        rows.push(
            row.iter()
                .cloned()
                .chain(extra_pos.iter().map(|&i| found[i].clone()))
                .collect(),
        );
    }
    Ok(Relation {
        cols: concat_cols(&input.cols, &extra),
        rows,
    })
}

/// Probe the index prefix matching `key_cols` once per input row
pub(super) fn lookup_join(
    private: &LookupJoinPrivate,
    input: &Relation,
    table_rows: &Relation,
    index_key: &ColList,
    on: &[ScalarExpr],
    env: &Env,
) -> ExecResult<Relation> {
    let prefix: ColList = index_key.iter().take(private.key_cols.len()).collect();
    let input_pos = positions(&input.cols, &private.key_cols)?;
    let table_pos = positions(&table_rows.cols, &prefix)?;
    let combined = concat_cols(&input.cols, &table_rows.cols);
    let mut rows = Vec::new();
    for row in &input.rows {
        let key: Vec<&Datum> = input_pos.iter().map(|&i| &row[i]).collect();
        let mut matched = false;
        if !key.iter().any(|d| d.is_null()) {
            for t in &table_rows.rows {
                if !table_pos.iter().map(|&i| &t[i]).eq(key.iter().copied()) {
                    continue;
                }
                let out: Vec<Datum> = row.iter().chain(t.iter()).cloned().collect();
                let scope = Scope {
                    cols: &combined,
                    row: &out,
                    env,
                };
                if filters_pass(on, &scope)? {
                    matched = true;
                    rows.push(out);
                }
            }
        }
        if !matched && private.join_type == JoinType::Left {
            rows.push(
                row.iter()
                    .cloned()
                    .chain(nulls(table_rows.cols.len()))
                    .collect(),
            );
        }
    }
    Ok(Relation {
        cols: combined,
        rows,
    })
}

fn fixed_match(rel: &Relation, cols: &ColList, vals: &[Datum]) -> ExecResult<Vec<Vec<Datum>>> {
    let pos = positions(&rel.cols, cols)?;
    Ok(rel
        .rows
        .iter()
        .filter(|r| pos.iter().zip(vals).all(|(&i, v)| &r[i] == v))
        .cloned()
        .collect())
}

/// Intersect two index scans on their equality columns
pub(super) fn zigzag_join(
    private: &ZigzagJoinPrivate,
    left: &Relation,
    right: &Relation,
    on: &[ScalarExpr],
    env: &Env,
) -> ExecResult<Relation> {
    let left_rows = fixed_match(left, &private.left_fixed_cols, &private.left_fixed_vals)?;
    let right_rows = fixed_match(right, &private.right_fixed_cols, &private.right_fixed_vals)?;
    let left_eq = positions(&left.cols, &private.left_eq_cols)?;
    let right_eq = positions(&right.cols, &private.right_eq_cols)?;

    // Both sides may read the same table; keep its columns once.
    let right_extra: ColList = right
        .cols
        .iter()
        .filter(|c| !left.cols.contains(*c))
        .collect();
    let right_extra_pos = positions(&right.cols, &right_extra)?;
    let cols = concat_cols(&left.cols, &right_extra);

    let mut rows = Vec::new();
    for l in &left_rows {
        if left_eq.iter().any(|&i| l[i].is_null()) {
            continue;
        }
        for r in &right_rows {
            if !left_eq
                .iter()
                .zip(&right_eq)
                .all(|(&li, &ri)| l[li] == r[ri])
            {
                continue;
            }
            let out: Vec<Datum> = l
                .iter()
                .cloned()
                .chain(right_extra_pos.iter().map(|&i| r[i].clone()))
                .collect();
            let scope = Scope {
                cols: &cols,
                row: &out,
                env,
            };
            if filters_pass(on, &scope)? {
                rows.push(out);
            }
        }
    }
    Ok(Relation { cols, rows })
}
