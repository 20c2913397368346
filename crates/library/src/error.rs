//! Library Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction. Errors from the store, extraction
//! and storage crates are raised into one of these kinds, so the full tree
//! stays available to whoever reports it.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A library error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// No plugin handles this file; the book cannot be opened.
    #[display("no extractor for file: {}", _0.display())]
    ExtractorNotFound(#[error(not(source))] PathBuf),
    /// The plugin ran but could not read the file.
    #[display("metadata extraction failed in plugin '{_0}'")]
    ExtractionFailed(#[error(not(source))] String),
    /// The persistence gateway failed; nothing from the operation was committed.
    #[display("book store error")]
    Store,
    #[display("invalid book path: {}", _0.display())]
    InvalidPath(#[error(not(source))] PathBuf),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Store | Self::ExtractionFailed(_))
    }
}
