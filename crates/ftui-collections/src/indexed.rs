#![forbid(unsafe_code)]

//! Index-based list contract and the errors it reports.
//!
//! [`IndexedList`] describes positional editing of a list. Filtered
//! collections expose their visible subset as a projection of the backing
//! set, so positions in it are not independently addressable; they implement
//! the trait only to refuse every operation with
//! [`CollectionError::Unsupported`].

use std::fmt;

/// An index-based list operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexedOp {
    Insert,
    Move,
    RemoveAt,
    Set,
    IndexOf,
}

impl IndexedOp {
    /// Stable name used in error messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Insert => "insert",
            Self::Move => "move",
            Self::RemoveAt => "remove_at",
            Self::Set => "set",
            Self::IndexOf => "index_of",
        }
    }
}

impl fmt::Display for IndexedOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors from collection operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionError {
    /// The collection does not support this operation. No state was changed.
    Unsupported(IndexedOp),
}

impl fmt::Display for CollectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unsupported(op) => write!(f, "operation not supported: {op}"),
        }
    }
}

impl std::error::Error for CollectionError {}

/// Result alias for collection operations.
pub type CollectionResult<T> = Result<T, CollectionError>;

/// Positional editing of a list.
pub trait IndexedList<T> {
    /// Insert `item` at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`CollectionError::Unsupported`] if positions are not addressable.
    fn insert(&self, index: usize, item: T) -> CollectionResult<()>;

    /// Move the item at `from` to `to`.
    ///
    /// # Errors
    ///
    /// Returns [`CollectionError::Unsupported`] if positions are not addressable.
    fn move_item(&self, from: usize, to: usize) -> CollectionResult<()>;

    /// Remove and return the item at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`CollectionError::Unsupported`] if positions are not addressable.
    fn remove_at(&self, index: usize) -> CollectionResult<T>;

    /// Replace the item at `index`, returning the old one.
    ///
    /// # Errors
    ///
    /// Returns [`CollectionError::Unsupported`] if positions are not addressable.
    fn set(&self, index: usize, item: T) -> CollectionResult<T>;

    /// Position of the first occurrence of `item`.
    ///
    /// # Errors
    ///
    /// Returns [`CollectionError::Unsupported`] if positions are not addressable.
    fn index_of(&self, item: &T) -> CollectionResult<Option<usize>>;
}
