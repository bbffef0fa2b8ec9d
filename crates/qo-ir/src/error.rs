//! Error types for qo-ir

use crate::operator::Operator;
use thiserror::Error;

/// Construction and plan-definition errors.
///
/// `Contract` is an internal error: a producer handed the factory inputs
/// that break an operator's structural rules. It aborts compilation and is
/// never coerced into a valid node.
#[derive(Error, Debug)]
pub enum IrError {
    /// IR001: Operator contract violated at construction time
    #[error("[IR001] {op} contract violation: {message}")]
    Contract { op: Operator, message: String },

    /// IR002: Column name not in scope while building a plan definition
    #[error("[IR002] Unknown column '{name}'")]
    UnknownColumnName { name: String },

    /// IR003: Ambiguous unqualified column name
    #[error("[IR003] Column '{name}' is ambiguous; qualify it as table.column")]
    AmbiguousColumnName { name: String },

    /// IR004: Unknown operator name in a plan definition
    #[error("[IR004] Unknown operator '{name}'")]
    UnknownOperator { name: String },

    /// IR005: Malformed plan definition
    #[error("[IR005] Invalid plan definition: {message}")]
    PlanDef { message: String },

    /// IR006: Unknown index name
    #[error("[IR006] Table '{table}' has no index '{index}'")]
    UnknownIndexName { table: String, index: String },

    /// IR007: Plan definition could not be parsed
    #[error("[IR007] Failed to parse plan definition: {0}")]
    PlanParse(#[from] serde_yaml::Error),

    /// IR008: Core error propagation
    #[error("[IR008] Core error: {0}")]
    Core(#[from] qo_core::CoreError),
}

impl IrError {
    /// Shorthand for a contract violation on `op`
    pub fn contract(op: Operator, message: impl Into<String>) -> Self {
        IrError::Contract {
            op,
            message: message.into(),
        }
    }

    /// Whether this is an internal contract violation
    pub fn is_contract(&self) -> bool {
        matches!(self, IrError::Contract { .. })
    }
}

/// Result type alias for IrError
pub type IrResult<T> = Result<T, IrError>;

/// Query execution errors raised by the reference evaluator.
///
/// These are user-visible and distinct from [`IrError`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExecError {
    /// X001: Max1Row input produced more than one row
    #[error("[X001] more than one row returned by a subquery used as an expression")]
    MoreThanOneRow,

    /// X002: Operator has no executable semantics
    #[error("[X002] operator {op} cannot be executed")]
    NotExecutable { op: Operator },

    /// X003: Scalar operator applied to values of the wrong type
    #[error("[X003] type mismatch: {message}")]
    TypeMismatch { message: String },

    /// X004: No rows provided for a scanned table
    #[error("[X004] no data for table '{table}'")]
    MissingTableData { table: String },

    /// X005: Column referenced but not bound in the current row
    #[error("[X005] column {col} is not bound")]
    UnboundColumn { col: String },

    /// X006: Integer overflow
    #[error("[X006] integer out of range")]
    Overflow,

    /// X007: Limit or offset is negative or not an integer
    #[error("[X007] invalid {what} value: {value}")]
    InvalidCount { what: &'static str, value: String },

    /// X008: IndexJoin found no primary-index row for an input key
    #[error("[X008] no row in '{table}' for key {key}")]
    MissingRow { table: String, key: String },

    /// X009: generate_series range exceeds the row cap
    #[error("[X009] generate_series would produce {rows} rows (at most {max} allowed)")]
    SeriesTooLong { rows: i128, max: u64 },
}

/// Result type alias for ExecError
pub type ExecResult<T> = Result<T, ExecError>;
