//! Opaque identifier handles scoped to one query compilation.
//!
//! All identifiers share the same shape (a non-zero `u32` handed out by
//! [`Metadata`](crate::Metadata)) and the same set of trait impls. The
//! `define_id!` macro generates them from a single invocation.

/// Define a strongly-typed, opaque identifier newtype.
///
/// Generates:
/// - The struct with `Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord`
/// - Transparent `Serialize` / `Deserialize`
/// - `new()`, `get()` and `index()` (zero-based position in a registry)
/// - `Display` using the given prefix (e.g. `@3` for column 3)
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $vis:vis struct $Name:ident => $prefix:literal;
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord,
            serde::Serialize, serde::Deserialize,
        )]
        #[serde(transparent)]
        $vis struct $Name(u32);

        impl $Name {
            /// Wrap a raw identifier value.
            pub const fn new(id: u32) -> Self {
                Self(id)
            }

            /// Return the raw identifier value.
            pub const fn get(self) -> u32 {
                self.0
            }

            /// Zero-based position of this id in its registry.
            pub(crate) fn index(self) -> usize {
                (self.0 as usize).saturating_sub(1)
            }
        }

        impl std::fmt::Display for $Name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }
    };
}

define_id! {
    /// Identifies a column within one compilation. Allocated monotonically
    /// starting at 1 and never reused.
    pub struct ColumnId => "@";
}

define_id! {
    /// Identifies a table registered in one compilation's metadata.
    pub struct TableId => "t";
}

define_id! {
    /// Identifies a sequence registered in one compilation's metadata.
    pub struct SequenceId => "seq";
}

define_id! {
    /// Distinguishes structurally identical `Values` nodes.
    pub struct ValuesId => "v";
}

/// Ordinal of an index within its table. Ordinal 0 is the primary index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct IndexOrdinal(pub u32);

impl IndexOrdinal {
    /// The primary index of every table
    pub const PRIMARY: IndexOrdinal = IndexOrdinal(0);

    /// Whether this ordinal names the primary index
    pub fn is_primary(self) -> bool {
        self == Self::PRIMARY
    }
}

impl std::fmt::Display for IndexOrdinal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "idx{}", self.0)
    }
}
