//! Orderings and ordering choices over columns

use crate::colset::{ColList, ColSet};
use crate::ids::ColumnId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One column of an [`Ordering`] with its direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderingColumn {
    /// Column sorted on
    pub col: ColumnId,
    /// Descending (true) or ascending (false)
    #[serde(default)]
    pub descending: bool,
}

impl OrderingColumn {
    /// Ascending column
    pub fn asc(col: ColumnId) -> Self {
        Self {
            col,
            descending: false,
        }
    }

    /// Descending column
    pub fn desc(col: ColumnId) -> Self {
        Self {
            col,
            descending: true,
        }
    }
}

impl fmt::Display for OrderingColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.descending { '-' } else { '+' };
        write!(f, "{}{}", sign, self.col.get())
    }
}

/// A fully specified sort order: a sequence of (column, direction)
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ordering(Vec<OrderingColumn>);

impl Ordering {
    /// The empty ordering
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Number of ordering columns
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the ordering has no columns
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Columns and directions in order
    pub fn iter(&self) -> impl Iterator<Item = &OrderingColumn> + '_ {
        self.0.iter()
    }

    /// Column at position `i`
    pub fn get(&self, i: usize) -> Option<&OrderingColumn> {
        self.0.get(i)
    }

    /// Column ids in order
    pub fn col_list(&self) -> ColList {
        self.0.iter().map(|c| c.col).collect()
    }

    /// Column ids as a set
    pub fn col_set(&self) -> ColSet {
        self.0.iter().map(|c| c.col).collect()
    }
}

impl From<Vec<OrderingColumn>> for Ordering {
    fn from(cols: Vec<OrderingColumn>) -> Self {
        Self(cols)
    }
}

impl FromIterator<OrderingColumn> for Ordering {
    fn from_iter<I: IntoIterator<Item = OrderingColumn>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for Ordering {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, col) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{col}")?;
        }
        Ok(())
    }
}

/// One position of an [`OrderingChoice`]: any column of `group`, in the
/// given direction, satisfies it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderingChoiceColumn {
    /// Equivalent columns, any of which satisfies this position
    pub group: ColSet,
    /// Descending (true) or ascending (false)
    #[serde(default)]
    pub descending: bool,
}

/// A set of acceptable orderings.
///
/// `optional` columns may appear anywhere in a satisfying ordering (they are
/// typically constant). Each entry of `columns` must then be matched in order.
/// The empty choice is satisfied by any ordering.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderingChoice {
    /// Columns that may appear anywhere in a satisfying ordering
    #[serde(default)]
    pub optional: ColSet,
    /// Required positions, in order
    #[serde(default)]
    pub columns: Vec<OrderingChoiceColumn>,
}

impl OrderingChoice {
    /// The unconstrained choice, satisfied by any ordering
    pub fn any() -> Self {
        Self::default()
    }

    /// Whether this choice places no constraint on order
    pub fn is_any(&self) -> bool {
        self.columns.is_empty()
    }

    /// Build a choice requiring exactly the given ordering
    pub fn from_ordering(ordering: &Ordering) -> Self {
        Self {
            optional: ColSet::new(),
            columns: ordering
                .iter()
                .map(|c| OrderingChoiceColumn {
                    group: ColSet::single(c.col),
                    descending: c.descending,
                })
                .collect(),
        }
    }

    /// Every column mentioned by the choice, optional ones included
    pub fn col_set(&self) -> ColSet {
        let mut cols = self.optional.clone();
        for c in &self.columns {
            cols.union_with(&c.group);
        }
        cols
    }

    /// Whether `ordering` satisfies this choice.
    ///
    /// Optional columns are skipped wherever they occur. Each required
    /// position must be matched by the next remaining ordering column, which
    /// must belong to the position's group and share its direction. Trailing
    /// ordering columns beyond the last required position are allowed.
    pub fn satisfied_by(&self, ordering: &Ordering) -> bool {
        let mut required = self.columns.iter();
        let mut next = required.next();
        for oc in ordering.iter() {
            let Some(want) = next else {
                return true;
            };
            if want.group.contains(oc.col) {
                if want.descending != oc.descending {
                    return false;
                }
                next = required.next();
                continue;
            }
            if self.optional.contains(oc.col) {
                continue;
            }
            return false;
        }
        next.is_none()
    }

    /// Pick one concrete ordering satisfying this choice (the lowest column
    /// id of each group).
    pub fn to_ordering(&self) -> Ordering {
        self.columns
            .iter()
            .filter_map(|c| {
                c.group.first().map(|col| OrderingColumn {
                    col,
                    descending: c.descending,
                })
            })
            .collect()
    }

    /// Restrict the choice to columns in `cols`.
    ///
    /// Group members outside `cols` are dropped; the choice is truncated at
    /// the first position whose group becomes empty.
    pub fn project(&self, cols: &ColSet) -> OrderingChoice {
        let mut columns = Vec::with_capacity(self.columns.len());
        for c in &self.columns {
            let group = c.group.intersection(cols);
            if group.is_empty() {
                break;
            }
            columns.push(OrderingChoiceColumn {
                group,
                descending: c.descending,
            });
        }
        OrderingChoice {
            optional: self.optional.intersection(cols),
            columns,
        }
    }
}

impl fmt::Display for OrderingChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, c) in self.columns.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            let sign = if c.descending { '-' } else { '+' };
            if c.group.len() == 1 {
                if let Some(col) = c.group.first() {
                    write!(f, "{}{}", sign, col.get())?;
                }
            } else {
                let ids: Vec<String> = c.group.iter().map(|col| col.get().to_string()).collect();
                write!(f, "{}({})", sign, ids.join("|"))?;
            }
        }
        if !self.optional.is_empty() {
            if !self.columns.is_empty() {
                write!(f, " ")?;
            }
            write!(f, "opt{}", self.optional)?;
        }
        Ok(())
    }
}
