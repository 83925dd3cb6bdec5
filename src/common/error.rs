//! Error types for rangeindex.

use thiserror::Error;

use crate::common::PageId;

/// Convenient Result type alias.
///
/// Instead of writing `Result<T, Error>` everywhere, we can write `Result<T>`.
pub type Result<T> = std::result::Result<T, Error>;

/// All possible errors raised by the index and its paged store.
///
/// `Io` and `PageNotFound` are store failures and abort the operation.
/// `NotFound` and `EndOfIndex` are normal outcomes of a range scan that runs
/// past the data; see [`Error::is_end_of_scan`].
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error from the backing file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Requested page is not allocated in the file.
    #[error("{0} not found")]
    PageNotFound(PageId),

    /// A plain insert would exceed the node's capacity.
    ///
    /// The index recovers from this by splitting; it never reaches callers
    /// of [`BTreeIndex::insert`](crate::BTreeIndex::insert).
    #[error("Node is full")]
    NodeFull,

    /// No entry with a key greater than or equal to the search key.
    #[error("No matching entry")]
    NotFound,

    /// The scan cursor ran past the last leaf.
    #[error("End of index")]
    EndOfIndex,

    /// API contract violation by the caller.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Mutation attempted on an index opened in read mode.
    #[error("Index is opened read-only")]
    ReadOnly,

    /// On-disk structures failed validation.
    #[error("Index corrupted: {0}")]
    Corrupted(String),

    /// Rejected configuration value.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The file was created with a different page size.
    #[error("Page size mismatch: expected {expected}, found {actual}")]
    PageSizeMismatch { expected: usize, actual: usize },
}

impl Error {
    /// True for the two errors that mean "no more matching rows".
    pub fn is_end_of_scan(&self) -> bool {
        matches!(self, Error::NotFound | Error::EndOfIndex)
    }
}
