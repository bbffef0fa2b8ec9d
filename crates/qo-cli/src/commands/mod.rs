//! Command implementations

pub(crate) mod check;
pub(crate) mod common;
pub(crate) mod eval;
pub(crate) mod ops;
