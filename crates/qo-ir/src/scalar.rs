//! Scalar expressions consumed as children of relational operators

use qo_core::{ColList, ColSet, ColumnId, ColumnType, Metadata};
use serde::{Deserialize, Serialize};

/// A constant value
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Datum {
    /// SQL NULL
    Null,
    /// Boolean
    Bool(bool),
    /// 64-bit integer
    Int(i64),
    /// String
    String(String),
}

impl Datum {
    /// Whether this is NULL
    pub fn is_null(&self) -> bool {
        matches!(self, Datum::Null)
    }

    /// Type of the value (`Unknown` for NULL)
    pub fn column_type(&self) -> ColumnType {
        match self {
            Datum::Null => ColumnType::Unknown,
            Datum::Bool(_) => ColumnType::Bool,
            Datum::Int(_) => ColumnType::Int,
            Datum::String(_) => ColumnType::String,
        }
    }

    /// Integer value, if this is an integer
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Datum::Int(i) => Some(*i),
            _ => None,
        }
    }
}

impl From<i64> for Datum {
    fn from(v: i64) -> Self {
        Datum::Int(v)
    }
}

impl From<i32> for Datum {
    fn from(v: i32) -> Self {
        Datum::Int(v.into())
    }
}

impl From<bool> for Datum {
    fn from(v: bool) -> Self {
        Datum::Bool(v)
    }
}

impl From<&str> for Datum {
    fn from(v: &str) -> Self {
        Datum::String(v.to_string())
    }
}

impl std::fmt::Display for Datum {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Datum::Null => write!(f, "NULL"),
            Datum::Bool(b) => write!(f, "{b}"),
            Datum::Int(i) => write!(f, "{i}"),
            Datum::String(s) => write!(f, "'{s}'"),
        }
    }
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinOp {
    /// Equality (=)
    Eq,
    /// Inequality (<>)
    NotEq,
    /// Less than (<)
    Lt,
    /// Less than or equal (<=)
    LtEq,
    /// Greater than (>)
    Gt,
    /// Greater than or equal (>=)
    GtEq,
    /// Logical AND
    And,
    /// Logical OR
    Or,
    /// Addition (+)
    Plus,
    /// Subtraction (-)
    Minus,
    /// Multiplication (*)
    Multiply,
    /// String concatenation (||)
    Concat,
}

impl BinOp {
    /// Check if this is a comparison operator
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinOp::Eq | BinOp::NotEq | BinOp::Lt | BinOp::LtEq | BinOp::Gt | BinOp::GtEq
        )
    }

    /// Check if this is a logical operator
    pub fn is_logical(self) -> bool {
        matches!(self, BinOp::And | BinOp::Or)
    }
}

impl std::fmt::Display for BinOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BinOp::Eq => write!(f, "="),
            BinOp::NotEq => write!(f, "<>"),
            BinOp::Lt => write!(f, "<"),
            BinOp::LtEq => write!(f, "<="),
            BinOp::Gt => write!(f, ">"),
            BinOp::GtEq => write!(f, ">="),
            BinOp::And => write!(f, "AND"),
            BinOp::Or => write!(f, "OR"),
            BinOp::Plus => write!(f, "+"),
            BinOp::Minus => write!(f, "-"),
            BinOp::Multiply => write!(f, "*"),
            BinOp::Concat => write!(f, "||"),
        }
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnOp {
    /// Logical NOT
    Not,
    /// Negation
    Minus,
}

impl std::fmt::Display for UnOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnOp::Not => write!(f, "NOT"),
            UnOp::Minus => write!(f, "-"),
        }
    }
}

/// Scalar expression tree
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScalarExpr {
    /// Reference to a column produced by an input (or bound from outside)
    Variable(ColumnId),
    /// Constant value
    Const(Datum),
    /// Binary operation
    Binary {
        /// Operator
        op: BinOp,
        /// Left operand
        left: Box<ScalarExpr>,
        /// Right operand
        right: Box<ScalarExpr>,
    },
    /// Unary operation
    Unary {
        /// Operator
        op: UnOp,
        /// Operand
        input: Box<ScalarExpr>,
    },
    /// IS NULL / IS NOT NULL
    IsNull {
        /// Expression being tested
        input: Box<ScalarExpr>,
        /// True for IS NOT NULL
        negated: bool,
    },
    /// First non-NULL argument
    Coalesce(Vec<ScalarExpr>),
}

impl ScalarExpr {
    /// Column reference
    pub fn col(col: ColumnId) -> Self {
        ScalarExpr::Variable(col)
    }

    /// Constant
    pub fn lit(value: impl Into<Datum>) -> Self {
        ScalarExpr::Const(value.into())
    }

    /// NULL constant
    pub fn null() -> Self {
        ScalarExpr::Const(Datum::Null)
    }

    /// Binary operation
    pub fn binary(op: BinOp, left: ScalarExpr, right: ScalarExpr) -> Self {
        ScalarExpr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// `left = right`
    pub fn eq(left: ScalarExpr, right: ScalarExpr) -> Self {
        Self::binary(BinOp::Eq, left, right)
    }

    /// Columns referenced anywhere in the expression
    pub fn referenced_cols(&self) -> ColSet {
        let mut cols = ColSet::new();
        self.collect_cols(&mut cols);
        cols
    }

    fn collect_cols(&self, cols: &mut ColSet) {
        match self {
            ScalarExpr::Variable(c) => {
                cols.insert(*c);
            }
            ScalarExpr::Const(_) => {}
            ScalarExpr::Binary { left, right, .. } => {
                left.collect_cols(cols);
                right.collect_cols(cols);
            }
            ScalarExpr::Unary { input, .. } | ScalarExpr::IsNull { input, .. } => {
                input.collect_cols(cols)
            }
            ScalarExpr::Coalesce(args) => args.iter().for_each(|a| a.collect_cols(cols)),
        }
    }

    /// The constant value, if this is a constant
    pub fn as_const(&self) -> Option<&Datum> {
        match self {
            ScalarExpr::Const(d) => Some(d),
            _ => None,
        }
    }

    /// Static type of the expression's result
    pub fn result_type(&self, md: &Metadata) -> ColumnType {
        match self {
            ScalarExpr::Variable(c) => md.column(*c).map(|m| m.ty).unwrap_or_default(),
            ScalarExpr::Const(d) => d.column_type(),
            ScalarExpr::Binary { op, .. } if op.is_comparison() || op.is_logical() => {
                ColumnType::Bool
            }
            ScalarExpr::Binary {
                op: BinOp::Concat, ..
            } => ColumnType::String,
            ScalarExpr::Binary { .. } => ColumnType::Int,
            ScalarExpr::Unary { op: UnOp::Not, .. } | ScalarExpr::IsNull { .. } => {
                ColumnType::Bool
            }
            ScalarExpr::Unary { .. } => ColumnType::Int,
            ScalarExpr::Coalesce(args) => args
                .iter()
                .map(|a| a.result_type(md))
                .find(|t| *t != ColumnType::Unknown)
                .unwrap_or_default(),
        }
    }

    /// Columns that must be non-NULL for this predicate to be true.
    ///
    /// Comparisons reject NULL on every column operand; AND rejects the union
    /// of its sides; IS NOT NULL rejects its column.
    pub fn null_rejected_cols(&self) -> ColSet {
        match self {
            ScalarExpr::Binary { op, left, right } if op.is_comparison() => {
                let mut cols = ColSet::new();
                for side in [left, right] {
                    if let ScalarExpr::Variable(c) = &**side {
                        cols.insert(*c);
                    }
                }
                cols
            }
            ScalarExpr::Binary {
                op: BinOp::And,
                left,
                right,
            } => left.null_rejected_cols().union(&right.null_rejected_cols()),
            ScalarExpr::IsNull {
                input,
                negated: true,
            } => match &**input {
                ScalarExpr::Variable(c) => ColSet::single(*c),
                _ => ColSet::new(),
            },
            _ => ColSet::new(),
        }
    }
}

impl std::fmt::Display for ScalarExpr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScalarExpr::Variable(c) => write!(f, "{c}"),
            ScalarExpr::Const(d) => write!(f, "{d}"),
            ScalarExpr::Binary { op, left, right } => write!(f, "({left} {op} {right})"),
            ScalarExpr::Unary { op, input } => write!(f, "{op} {input}"),
            ScalarExpr::IsNull { input, negated } => {
                if *negated {
                    write!(f, "{input} IS NOT NULL")
                } else {
                    write!(f, "{input} IS NULL")
                }
            }
            ScalarExpr::Coalesce(args) => {
                let parts: Vec<String> = args.iter().map(|a| a.to_string()).collect();
                write!(f, "COALESCE({})", parts.join(", "))
            }
        }
    }
}

/// Conjunction of predicates; empty means TRUE
pub type Filters = Vec<ScalarExpr>;

/// Columns referenced by a list of filters
pub fn filters_cols(filters: &[ScalarExpr]) -> ColSet {
    let mut cols = ColSet::new();
    for f in filters {
        cols.union_with(&f.referenced_cols());
    }
    cols
}

/// A synthesized column computed by `Project`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProjectionItem {
    /// Output column
    pub col: ColumnId,
    /// Value of the column
    pub expr: ScalarExpr,
}

/// Aggregate functions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggFunc {
    /// COUNT(*)
    CountRows,
    /// COUNT(x): non-NULL values
    Count,
    /// SUM(x)
    Sum,
    /// MIN(x)
    Min,
    /// MAX(x)
    Max,
    /// BOOL_AND(x)
    BoolAnd,
    /// BOOL_OR(x)
    BoolOr,
    /// Value that is constant within the group
    ConstAgg,
    /// Any non-NULL value of the group (NULL if none)
    AnyNotNull,
    /// Value from the first row of the group
    FirstAgg,
}

impl AggFunc {
    /// Result on an empty input (ScalarGroupBy over no rows)
    pub fn default_value(self) -> Datum {
        match self {
            AggFunc::CountRows | AggFunc::Count => Datum::Int(0),
            _ => Datum::Null,
        }
    }

    /// Whether the function takes an argument
    pub fn takes_arg(self) -> bool {
        !matches!(self, AggFunc::CountRows)
    }

    /// Whether the result is never NULL
    pub fn is_count(self) -> bool {
        matches!(self, AggFunc::CountRows | AggFunc::Count)
    }

    /// SQL-ish name
    pub fn name(self) -> &'static str {
        match self {
            AggFunc::CountRows => "count_rows",
            AggFunc::Count => "count",
            AggFunc::Sum => "sum",
            AggFunc::Min => "min",
            AggFunc::Max => "max",
            AggFunc::BoolAnd => "bool_and",
            AggFunc::BoolOr => "bool_or",
            AggFunc::ConstAgg => "const_agg",
            AggFunc::AnyNotNull => "any_not_null",
            AggFunc::FirstAgg => "first_agg",
        }
    }

    /// Result type given the argument type
    pub fn result_type(self, arg: ColumnType) -> ColumnType {
        match self {
            AggFunc::CountRows | AggFunc::Count | AggFunc::Sum => ColumnType::Int,
            AggFunc::BoolAnd | AggFunc::BoolOr => ColumnType::Bool,
            _ => arg,
        }
    }
}

/// An aggregate computed by a grouping operator
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AggregationItem {
    /// Output column
    pub col: ColumnId,
    /// Aggregate function
    pub func: AggFunc,
    /// Argument (absent for COUNT(*))
    pub arg: Option<ScalarExpr>,
}

/// A set-returning generator zipped by `ProjectSet`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Generator {
    /// One row per list element
    Unnest(Vec<ScalarExpr>),
    /// Integers from `start` to `stop` inclusive
    GenerateSeries {
        /// First value
        start: ScalarExpr,
        /// Last value
        stop: ScalarExpr,
    },
    /// Fixed rows of several columns
    Rows(Vec<Vec<ScalarExpr>>),
}

impl Generator {
    /// Number of columns each generated row has, when fixed by the generator
    pub fn arity(&self) -> Option<usize> {
        match self {
            Generator::Unnest(_) | Generator::GenerateSeries { .. } => Some(1),
            Generator::Rows(rows) => rows.first().map(Vec::len),
        }
    }

    /// Columns referenced by the generator's arguments
    pub fn referenced_cols(&self) -> ColSet {
        match self {
            Generator::Unnest(items) => filters_cols(items),
            Generator::GenerateSeries { start, stop } => {
                start.referenced_cols().union(&stop.referenced_cols())
            }
            Generator::Rows(rows) => {
                let mut cols = ColSet::new();
                for row in rows {
                    cols.union_with(&filters_cols(row));
                }
                cols
            }
        }
    }
}

/// One generator of a `ProjectSet` and the columns it produces
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ZipItem {
    /// The generator
    pub func: Generator,
    /// Output columns
    pub cols: ColList,
}
