//! Reference evaluator over in-memory table data
//!
//! The evaluator gives every executable operator its row-level meaning so
//! plans can be checked end to end. It favours clarity over speed: joins are
//! nested loops and every node materializes its full result.

mod group;
mod join;
pub(crate) mod scalar;

use crate::error::{ExecError, ExecResult};
use crate::format::{render_with, FormatOptions};
use crate::relop::{RelExpr, RelNode, RelRef};
use crate::scalar::{Datum, Generator, ScalarExpr};
use qo_core::{ColList, Metadata, Ordering, SequenceId, TableId, TableMeta};
use scalar::{eval_scalar, filters_pass, Env, Scope};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// State reported by `SequenceSelect`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SequenceState {
    /// Last value handed out (or the start value)
    pub last_value: i64,
    /// Values pre-allocated but not yet logged
    pub log_cnt: i64,
    /// Whether `last_value` has been handed out
    pub is_called: bool,
}

impl Default for SequenceState {
    fn default() -> Self {
        Self {
            last_value: 1,
            log_cnt: 0,
            is_called: false,
        }
    }
}

/// In-memory rows for tables and state for sequences
#[derive(Debug, Clone, Default)]
pub struct DataStore {
    tables: HashMap<TableId, Vec<Vec<Datum>>>,
    sequences: HashMap<SequenceId, SequenceState>,
}

impl DataStore {
    /// Empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Append rows to a table. Each row holds one value per table column,
    /// in table order.
    pub fn insert_rows(
        &mut self,
        table: &TableMeta,
        rows: impl IntoIterator<Item = Vec<Datum>>,
    ) -> ExecResult<()> {
        let stored = self.tables.entry(table.id).or_default();
        for row in rows {
            if row.len() != table.columns.len() {
                return Err(ExecError::TypeMismatch {
                    message: format!(
                        "row for '{}' has {} values, table has {} columns",
                        table.name,
                        row.len(),
                        table.columns.len()
                    ),
                });
            }
            stored.push(row);
        }
        Ok(())
    }

    /// Set a sequence's state
    pub fn set_sequence(&mut self, sequence: SequenceId, state: SequenceState) {
        self.sequences.insert(sequence, state);
    }

    /// Rows of a table, if any were inserted
    pub fn rows(&self, table: TableId) -> Option<&[Vec<Datum>]> {
        self.tables.get(&table).map(Vec::as_slice)
    }

    /// State of a sequence (the initial state if never set)
    pub fn sequence(&self, sequence: SequenceId) -> SequenceState {
        self.sequences.get(&sequence).copied().unwrap_or_default()
    }
}

/// A materialized result: rows positional with `cols`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Relation {
    /// Column order of every row
    pub cols: ColList,
    /// Rows
    pub rows: Vec<Vec<Datum>>,
}

impl Relation {
    /// Relation with no rows
    pub fn empty(cols: ColList) -> Self {
        Self {
            cols,
            rows: Vec::new(),
        }
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether there are no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Values of one column, in row order
    pub fn column(&self, col: qo_core::ColumnId) -> Option<Vec<Datum>> {
        let i = self.cols.position(col)?;
        Some(self.rows.iter().map(|r| r[i].clone()).collect())
    }

    /// Rows reordered to `cols`
    pub fn project(&self, cols: &ColList) -> ExecResult<Relation> {
        let positions = positions(&self.cols, cols)?;
        let rows = self
            .rows
            .iter()
            .map(|r| positions.iter().map(|&i| r[i].clone()).collect())
            .collect();
        Ok(Relation {
            cols: cols.clone(),
            rows,
        })
    }

    /// Stable sort by `ordering`; columns absent from the relation are ignored
    pub fn sort_by(&mut self, ordering: &Ordering) {
        let keys: Vec<(usize, bool)> = ordering
            .iter()
            .filter_map(|oc| self.cols.position(oc.col).map(|i| (i, oc.descending)))
            .collect();
        if keys.is_empty() {
            return;
        }
        self.rows.sort_by(|a, b| {
            for &(i, descending) in &keys {
                let ord = a[i].cmp(&b[i]);
                let ord = if descending { ord.reverse() } else { ord };
                if ord.is_ne() {
                    return ord;
                }
            }
            std::cmp::Ordering::Equal
        });
    }
}

/// Positions of `wanted` within `cols`
pub(crate) fn positions(cols: &ColList, wanted: &ColList) -> ExecResult<Vec<usize>> {
    wanted
        .iter()
        .map(|c| {
            cols.position(c).ok_or_else(|| ExecError::UnboundColumn {
                col: c.to_string(),
            })
        })
        .collect()
}

/// Column order of a node's evaluated result: its positional output if it
/// has one, ascending column ids otherwise
pub fn result_cols(node: &RelNode) -> ColList {
    let props = node.props();
    props
        .output_list
        .clone()
        .unwrap_or_else(|| props.output_cols.iter().collect())
}

/// Evaluates plans against a [`DataStore`]
pub struct Evaluator<'a> {
    md: &'a Metadata,
    data: &'a DataStore,
}

impl<'a> Evaluator<'a> {
    /// Create an evaluator
    pub fn new(md: &'a Metadata, data: &'a DataStore) -> Self {
        Self { md, data }
    }

    /// Evaluate a closed plan. Columns come back in [`result_cols`] order.
    pub fn eval(&self, plan: &RelRef) -> ExecResult<Relation> {
        self.eval_in(plan, &Env::new())
    }

    pub(crate) fn eval_in(&self, node: &RelRef, env: &Env) -> ExecResult<Relation> {
        let rel = self.eval_node(node, env)?;
        let rel = rel.project(&result_cols(node))?;
        log::debug!("evaluated {} into {} rows", node.op(), rel.len());
        Ok(rel)
    }

    fn table(&self, table: TableId) -> ExecResult<Arc<TableMeta>> {
        self.md
            .table(table)
            .map_err(|_| ExecError::MissingTableData {
                table: table.to_string(),
            })
    }

    fn table_rows(&self, table: &TableMeta) -> ExecResult<Relation> {
        let rows = self
            .data
            .rows(table.id)
            .ok_or_else(|| ExecError::MissingTableData {
                table: table.name.clone(),
            })?;
        Ok(Relation {
            cols: table.columns.clone(),
            rows: rows.to_vec(),
        })
    }

    fn eval_count(&self, expr: &ScalarExpr, env: &Env, what: &'static str) -> ExecResult<Option<usize>> {
        match eval_scalar(expr, &Scope::outer(env))? {
            Datum::Null => Ok(None),
            Datum::Int(n) if n >= 0 => Ok(Some(usize::try_from(n).unwrap_or(usize::MAX))),
            other => Err(ExecError::InvalidCount {
                what,
                value: other.to_string(),
            }),
        }
    }

    fn eval_node(&self, node: &RelRef, env: &Env) -> ExecResult<Relation> {
        match node.expr() {
            RelExpr::Scan(p) => {
                let table = self.table(p.table)?;
                let mut rel = self.table_rows(&table)?;
                let index = table
                    .index(p.index)
                    .map_err(|_| ExecError::MissingTableData {
                        table: table.name.clone(),
                    })?;
                if let Some(c) = &p.constraint {
                    let key_pos = positions(&rel.cols, &c.columns.col_list())?;
                    rel.rows.retain(|r| {
                        let key: Vec<Datum> = key_pos.iter().map(|&i| r[i].clone()).collect();
                        c.contains(&key)
                    });
                }
                rel.sort_by(&index.key);
                if let Some(limit) = p.hard_limit {
                    if limit.reverse {
                        rel.rows.reverse();
                    }
                    rel.rows.truncate(usize::try_from(limit.rows).unwrap_or(usize::MAX));
                }
                Ok(rel)
            }
            RelExpr::VirtualScan(p) => {
                let table = self.table(p.table)?;
                Ok(self
                    .table_rows(&table)
                    .unwrap_or_else(|_| Relation::empty(table.columns.clone())))
            }
            RelExpr::SequenceSelect(p) => {
                let state = self.data.sequence(p.sequence);
                Ok(Relation {
                    cols: p.cols.clone(),
                    rows: vec![vec![
                        Datum::Int(state.last_value),
                        Datum::Int(state.log_cnt),
                        Datum::Bool(state.is_called),
                    ]],
                })
            }
            RelExpr::Values { rows, private } => {
                let scope = Scope::outer(env);
                let rows = rows
                    .iter()
                    .map(|row| row.iter().map(|e| eval_scalar(e, &scope)).collect())
                    .collect::<ExecResult<Vec<Vec<Datum>>>>()?;
                Ok(Relation {
                    cols: private.cols.clone(),
                    rows,
                })
            }
            RelExpr::Select { input, filters } => {
                let mut rel = self.eval_in(input, env)?;
                let mut kept = Vec::with_capacity(rel.rows.len());
                for row in rel.rows.drain(..) {
                    let scope = Scope {
                        cols: &rel.cols,
                        row: &row,
                        env,
                    };
                    if filters_pass(filters, &scope)? {
                        kept.push(row);
                    }
                }
                rel.rows = kept;
                Ok(rel)
            }
            RelExpr::Project {
                input,
                projections,
                passthrough,
            } => {
                let rel = self.eval_in(input, env)?;
                let kept: ColList = rel.cols.iter().filter(|c| passthrough.contains(*c)).collect();
                let kept_pos = positions(&rel.cols, &kept)?;
                let mut cols = kept.clone();
                for p in projections {
                    cols.push(p.col);
                }
                let mut rows = Vec::with_capacity(rel.rows.len());
                for row in &rel.rows {
                    let scope = Scope {
                        cols: &rel.cols,
                        row,
                        env,
                    };
                    let mut out: Vec<Datum> = kept_pos.iter().map(|&i| row[i].clone()).collect();
                    for p in projections {
                        out.push(eval_scalar(&p.expr, &scope)?);
                    }
                    rows.push(out);
                }
                Ok(Relation { cols, rows })
            }
            RelExpr::IndexJoin { input, private } => {
                let rel = self.eval_in(input, env)?;
                let table = self.table(private.table)?;
                join::index_join(&rel, &self.table_rows(&table)?, &table)
            }
            RelExpr::LookupJoin { input, on, private } => {
                let rel = self.eval_in(input, env)?;
                let table = self.table(private.table)?;
                let index = table
                    .index(private.index)
                    .map_err(|_| ExecError::MissingTableData {
                        table: table.name.clone(),
                    })?;
                join::lookup_join(
                    private,
                    &rel,
                    &self.table_rows(&table)?,
                    &index.key_cols(),
                    on,
                    env,
                )
            }
            RelExpr::MergeJoin {
                left,
                right,
                on,
                private,
            } => {
                let l = self.eval_in(left, env)?;
                let r = self.eval_in(right, env)?;
                let mut on = on.clone();
                for (lc, rc) in private.left_eq.iter().zip(private.right_eq.iter()) {
                    on.push(ScalarExpr::eq(ScalarExpr::col(lc.col), ScalarExpr::col(rc.col)));
                }
                join::join_relations(private.join_type, &l, &r, &on, env)
            }
            RelExpr::ZigzagJoin { on, private } => {
                let left = self.table(private.left_table)?;
                let right = self.table(private.right_table)?;
                join::zigzag_join(
                    private,
                    &self.table_rows(&left)?,
                    &self.table_rows(&right)?,
                    on,
                    env,
                )
            }
            RelExpr::GroupBy(g) | RelExpr::DistinctOn(g) => {
                let rel = self.eval_in(&g.input, env)?;
                group::group(g, rel, false, env)
            }
            RelExpr::ScalarGroupBy(g) => {
                let rel = self.eval_in(&g.input, env)?;
                group::group(g, rel, true, env)
            }
            RelExpr::Union(s)
            | RelExpr::Intersect(s)
            | RelExpr::Except(s)
            | RelExpr::UnionAll(s)
            | RelExpr::IntersectAll(s)
            | RelExpr::ExceptAll(s) => {
                let l = self.eval_in(&s.left, env)?;
                let r = self.eval_in(&s.right, env)?;
                group::set_op(node.op(), &s.private, &l, &r)
            }
            RelExpr::Limit {
                input,
                limit,
                ordering,
            } => {
                let mut rel = self.eval_in(input, env)?;
                rel.sort_by(&ordering.to_ordering());
                if let Some(n) = self.eval_count(limit, env, "limit")? {
                    rel.rows.truncate(n);
                }
                Ok(rel)
            }
            RelExpr::Offset {
                input,
                offset,
                ordering,
            } => {
                let mut rel = self.eval_in(input, env)?;
                rel.sort_by(&ordering.to_ordering());
                if let Some(n) = self.eval_count(offset, env, "offset")? {
                    rel.rows.drain(..n.min(rel.rows.len()));
                }
                Ok(rel)
            }
            RelExpr::Max1Row { input } => {
                let rel = self.eval_in(input, env)?;
                if rel.len() > 1 {
                    return Err(ExecError::MoreThanOneRow);
                }
                Ok(rel)
            }
            RelExpr::RowNumber { input, private } => {
                let mut rel = self.eval_in(input, env)?;
                rel.sort_by(&private.ordering.to_ordering());
                rel.cols.push(private.col);
                for (i, row) in rel.rows.iter_mut().enumerate() {
                    row.push(Datum::Int(i as i64 + 1));
                }
                Ok(rel)
            }
            RelExpr::ProjectSet { input, zip } => {
                let rel = self.eval_in(input, env)?;
                let mut cols = rel.cols.clone();
                for item in zip {
                    for c in &item.cols {
                        cols.push(c);
                    }
                }
                let mut rows = Vec::new();
                for row in &rel.rows {
                    let scope = Scope {
                        cols: &rel.cols,
                        row,
                        env,
                    };
                    let generated = zip
                        .iter()
                        .map(|item| generate(&item.func, &scope))
                        .collect::<ExecResult<Vec<_>>>()?;
                    let longest = generated.iter().map(Vec::len).max().unwrap_or(0);
                    for i in 0..longest {
                        let mut out = row.clone();
                        for (item, gen_rows) in zip.iter().zip(&generated) {
                            match gen_rows.get(i) {
                                Some(values) => out.extend(values.iter().cloned()),
                                None => out.extend((0..item.cols.len()).map(|_| Datum::Null)),
                            }
                        }
                        rows.push(out);
                    }
                }
                Ok(Relation { cols, rows })
            }
            RelExpr::Explain { input, private } => {
                let text = render_with(
                    input,
                    self.md,
                    FormatOptions {
                        verbose: private.options.verbose,
                    },
                );
                let rows = text
                    .lines()
                    .map(|line| {
                        let mut row = vec![Datum::String(line.to_string())];
                        row.resize(private.cols.len(), Datum::Null);
                        row
                    })
                    .collect();
                Ok(Relation {
                    cols: private.cols.clone(),
                    rows,
                })
            }
            RelExpr::ShowTraceForSession(p) => Ok(Relation::empty(p.cols.clone())),
            RelExpr::FakeRel(_) => Err(ExecError::NotExecutable { op: node.op() }),
            expr => {
                let Some(j) = expr.as_join() else {
                    return Err(ExecError::NotExecutable { op: node.op() });
                };
                let op = node.op();
                let join_type = op
                    .join_type()
                    .ok_or(ExecError::NotExecutable { op })?;
                let left = self.eval_in(&j.left, env)?;
                if !op.has_tag(crate::tag::Tag::JoinApply) {
                    let right = self.eval_in(&j.right, env)?;
                    return join::join_relations(join_type, &left, &right, &j.on, env);
                }
                join::apply_join(self, op, join_type, &left, &j.right, &j.on, env)
            }
        }
    }
}

/// Most rows one `generate_series` call may produce
pub const MAX_SERIES_ROWS: u64 = 1_000_000;

/// Rows produced by a generator for one input row
fn generate(generator: &Generator, scope: &Scope<'_>) -> ExecResult<Vec<Vec<Datum>>> {
    match generator {
        Generator::Unnest(items) => items
            .iter()
            .map(|e| Ok(vec![eval_scalar(e, scope)?]))
            .collect(),
        Generator::GenerateSeries { start, stop } => {
            match (eval_scalar(start, scope)?, eval_scalar(stop, scope)?) {
                (Datum::Int(a), Datum::Int(b)) => {
                    let len = (i128::from(b) - i128::from(a) + 1).max(0);
                    if len > i128::from(MAX_SERIES_ROWS) {
                        return Err(ExecError::SeriesTooLong {
                            rows: len,
                            max: MAX_SERIES_ROWS,
                        });
                    }
                    Ok((a..=b).map(|i| vec![Datum::Int(i)]).collect())
                }
                (Datum::Null, _) | (_, Datum::Null) => Ok(Vec::new()),
                (a, b) => Err(ExecError::TypeMismatch {
                    message: format!("generate_series({a}, {b}) expects integers"),
                }),
            }
        }
        Generator::Rows(rows) => rows
            .iter()
            .map(|row| row.iter().map(|e| eval_scalar(e, scope)).collect())
            .collect(),
    }
}

#[cfg(test)]
#[path = "eval_test.rs"]
mod tests;
