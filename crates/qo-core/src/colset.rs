//! Column groupings: unordered [`ColSet`] and ordered [`ColList`]

use crate::ids::ColumnId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Unordered, duplicate-free set of columns.
///
/// Backed by a `BTreeSet` so iteration and display are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColSet(BTreeSet<ColumnId>);

impl ColSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self(BTreeSet::new())
    }

    /// Create a set containing a single column
    pub fn single(col: ColumnId) -> Self {
        let mut set = Self::new();
        set.insert(col);
        set
    }

    /// Add a column, returning whether it was newly inserted
    pub fn insert(&mut self, col: ColumnId) -> bool {
        self.0.insert(col)
    }

    /// Remove a column, returning whether it was present
    pub fn remove(&mut self, col: ColumnId) -> bool {
        self.0.remove(&col)
    }

    /// Membership test
    pub fn contains(&self, col: ColumnId) -> bool {
        self.0.contains(&col)
    }

    /// Number of columns in the set
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the set has no columns
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Columns in ascending id order
    pub fn iter(&self) -> impl Iterator<Item = ColumnId> + '_ {
        self.0.iter().copied()
    }

    /// Set union
    pub fn union(&self, other: &ColSet) -> ColSet {
        Self(self.0.union(&other.0).copied().collect())
    }

    /// Set intersection
    pub fn intersection(&self, other: &ColSet) -> ColSet {
        Self(self.0.intersection(&other.0).copied().collect())
    }

    /// Columns in `self` but not in `other`
    pub fn difference(&self, other: &ColSet) -> ColSet {
        Self(self.0.difference(&other.0).copied().collect())
    }

    /// In-place union
    pub fn union_with(&mut self, other: &ColSet) {
        self.0.extend(other.0.iter().copied());
    }

    /// In-place difference
    pub fn difference_with(&mut self, other: &ColSet) {
        for col in &other.0 {
            self.0.remove(col);
        }
    }

    /// Whether every column of `self` is in `other`
    pub fn is_subset_of(&self, other: &ColSet) -> bool {
        self.0.is_subset(&other.0)
    }

    /// Whether the two sets share no column
    pub fn is_disjoint(&self, other: &ColSet) -> bool {
        self.0.is_disjoint(&other.0)
    }

    /// Whether the two sets share at least one column
    pub fn intersects(&self, other: &ColSet) -> bool {
        !self.is_disjoint(other)
    }

    /// Smallest column id in the set
    pub fn first(&self) -> Option<ColumnId> {
        self.0.first().copied()
    }
}

impl FromIterator<ColumnId> for ColSet {
    fn from_iter<I: IntoIterator<Item = ColumnId>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Extend<ColumnId> for ColSet {
    fn extend<I: IntoIterator<Item = ColumnId>>(&mut self, iter: I) {
        self.0.extend(iter);
    }
}

impl<'a> IntoIterator for &'a ColSet {
    type Item = ColumnId;
    type IntoIter = std::iter::Copied<std::collections::btree_set::Iter<'a, ColumnId>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter().copied()
    }
}

impl fmt::Display for ColSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, col) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", col.get())?;
        }
        write!(f, ")")
    }
}

/// Ordered sequence of columns. Equality is positional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColList(Vec<ColumnId>);

impl ColList {
    /// Create an empty list
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Number of columns in the list
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the list has no columns
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Column at position `i`
    pub fn get(&self, i: usize) -> Option<ColumnId> {
        self.0.get(i).copied()
    }

    /// Append a column
    pub fn push(&mut self, col: ColumnId) {
        self.0.push(col);
    }

    /// Position of the first occurrence of `col`
    pub fn position(&self, col: ColumnId) -> Option<usize> {
        self.0.iter().position(|c| *c == col)
    }

    /// Membership test
    pub fn contains(&self, col: ColumnId) -> bool {
        self.0.contains(&col)
    }

    /// Columns in list order
    pub fn iter(&self) -> impl Iterator<Item = ColumnId> + '_ {
        self.0.iter().copied()
    }

    /// Borrow as a slice
    pub fn as_slice(&self) -> &[ColumnId] {
        &self.0
    }

    /// Collapse into an unordered set (dropping duplicates)
    pub fn to_set(&self) -> ColSet {
        self.0.iter().copied().collect()
    }

    /// Whether any column appears more than once
    pub fn has_duplicates(&self) -> bool {
        self.to_set().len() != self.len()
    }

    /// Whether `prefix` equals the first `prefix.len()` columns of this list
    pub fn starts_with(&self, prefix: &ColList) -> bool {
        self.0.starts_with(&prefix.0)
    }
}

impl From<Vec<ColumnId>> for ColList {
    fn from(cols: Vec<ColumnId>) -> Self {
        Self(cols)
    }
}

impl FromIterator<ColumnId> for ColList {
    fn from_iter<I: IntoIterator<Item = ColumnId>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a ColList {
    type Item = ColumnId;
    type IntoIter = std::iter::Copied<std::slice::Iter<'a, ColumnId>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter().copied()
    }
}

impl std::ops::Index<usize> for ColList {
    type Output = ColumnId;

    fn index(&self, i: usize) -> &ColumnId {
        &self.0[i]
    }
}

impl fmt::Display for ColList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, col) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", col.get())?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
#[path = "colset_test.rs"]
mod tests;
