//! Scalar evaluation with SQL three-valued logic

use crate::error::{ExecError, ExecResult};
use crate::scalar::{BinOp, Datum, ScalarExpr, UnOp};
use qo_core::{ColList, ColumnId};
use std::collections::BTreeMap;

/// Values bound outside the relation being evaluated (Apply joins)
pub(crate) type Env = BTreeMap<ColumnId, Datum>;

/// The row a scalar is evaluated against
pub(crate) struct Scope<'a> {
    pub cols: &'a ColList,
    pub row: &'a [Datum],
    pub env: &'a Env,
}

impl<'a> Scope<'a> {
    /// A scope with no row, only outer bindings
    pub fn outer(env: &'a Env) -> Self {
        const EMPTY: &ColList = &ColList::new();
        Scope {
            cols: EMPTY,
            row: &[],
            env,
        }
    }

    fn lookup(&self, col: ColumnId) -> ExecResult<&Datum> {
        if let Some(v) = self.cols.position(col).and_then(|i| self.row.get(i)) {
            return Ok(v);
        }
        self.env.get(&col).ok_or_else(|| ExecError::UnboundColumn {
            col: col.to_string(),
        })
    }
}

fn mismatch(op: impl std::fmt::Display, l: &Datum, r: &Datum) -> ExecError {
    ExecError::TypeMismatch {
        message: format!("{l} {op} {r}"),
    }
}

fn as_bool(d: &Datum, context: &str) -> ExecResult<Option<bool>> {
    match d {
        Datum::Null => Ok(None),
        Datum::Bool(b) => Ok(Some(*b)),
        other => Err(ExecError::TypeMismatch {
            message: format!("{context} expects a boolean, got {other}"),
        }),
    }
}

fn same_type(l: &Datum, r: &Datum) -> bool {
    std::mem::discriminant(l) == std::mem::discriminant(r)
}

fn binary(op: BinOp, l: Datum, r: Datum) -> ExecResult<Datum> {
    if op.is_logical() {
        let (a, b) = (as_bool(&l, "AND/OR")?, as_bool(&r, "AND/OR")?);
        let out = match op {
            BinOp::And => match (a, b) {
                (Some(false), _) | (_, Some(false)) => Some(false),
                (Some(true), Some(true)) => Some(true),
                _ => None,
            },
            _ => match (a, b) {
                (Some(true), _) | (_, Some(true)) => Some(true),
                (Some(false), Some(false)) => Some(false),
                _ => None,
            },
        };
        return Ok(out.map_or(Datum::Null, Datum::Bool));
    }
    if l.is_null() || r.is_null() {
        return Ok(Datum::Null);
    }
    if op.is_comparison() {
        if !same_type(&l, &r) {
            return Err(mismatch(op, &l, &r));
        }
        let ord = l.cmp(&r);
        let result = match op {
            BinOp::Eq => ord.is_eq(),
            BinOp::NotEq => ord.is_ne(),
            BinOp::Lt => ord.is_lt(),
            BinOp::LtEq => ord.is_le(),
            BinOp::Gt => ord.is_gt(),
            _ => ord.is_ge(),
        };
        return Ok(Datum::Bool(result));
    }
    match (op, &l, &r) {
        (BinOp::Plus, Datum::Int(a), Datum::Int(b)) => {
            a.checked_add(*b).map(Datum::Int).ok_or(ExecError::Overflow)
        }
        (BinOp::Minus, Datum::Int(a), Datum::Int(b)) => {
            a.checked_sub(*b).map(Datum::Int).ok_or(ExecError::Overflow)
        }
        (BinOp::Multiply, Datum::Int(a), Datum::Int(b)) => {
            a.checked_mul(*b).map(Datum::Int).ok_or(ExecError::Overflow)
        }
        (BinOp::Concat, Datum::String(a), Datum::String(b)) => Ok(Datum::String(format!("{a}{b}"))),
        _ => Err(mismatch(op, &l, &r)),
    }
}

/// Evaluate `expr` against `scope`
pub(crate) fn eval_scalar(expr: &ScalarExpr, scope: &Scope<'_>) -> ExecResult<Datum> {
    match expr {
        ScalarExpr::Variable(c) => scope.lookup(*c).cloned(),
        ScalarExpr::Const(d) => Ok(d.clone()),
        ScalarExpr::Binary { op, left, right } => {
            let l = eval_scalar(left, scope)?;
            // AND/OR short-circuit on a deciding left operand.
            match (op, &l) {
                (BinOp::And, Datum::Bool(false)) => return Ok(Datum::Bool(false)),
                (BinOp::Or, Datum::Bool(true)) => return Ok(Datum::Bool(true)),
                _ => {}
            }
            let r = eval_scalar(right, scope)?;
            binary(*op, l, r)
        }
        ScalarExpr::Unary { op, input } => {
            let v = eval_scalar(input, scope)?;
            match (op, v) {
                (_, Datum::Null) => Ok(Datum::Null),
                (UnOp::Not, v) => Ok(Datum::Bool(!as_bool(&v, "NOT")?.unwrap_or(false))),
                (UnOp::Minus, Datum::Int(i)) => i.checked_neg().map(Datum::Int).ok_or(ExecError::Overflow),
                (UnOp::Minus, other) => Err(ExecError::TypeMismatch {
                    message: format!("cannot negate {other}"),
                }),
            }
        }
        ScalarExpr::IsNull { input, negated } => {
            let is_null = eval_scalar(input, scope)?.is_null();
            Ok(Datum::Bool(is_null != *negated))
        }
        ScalarExpr::Coalesce(args) => {
            for arg in args {
                let v = eval_scalar(arg, scope)?;
                if !v.is_null() {
                    return Ok(v);
                }
            }
            Ok(Datum::Null)
        }
    }
}

/// Whether every filter evaluates to true (NULL and false both reject)
pub(crate) fn filters_pass(filters: &[ScalarExpr], scope: &Scope<'_>) -> ExecResult<bool> {
    for f in filters {
        match as_bool(&eval_scalar(f, scope)?, "filter")? {
            Some(true) => {}
            _ => return Ok(false),
        }
    }
    Ok(true)
}
