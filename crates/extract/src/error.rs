//! Extraction Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// An extraction error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for extraction operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// No registered plugin handles this kind of file. The book cannot be
    /// opened at all.
    #[display("no extractor for file: {}", _0.display())]
    ExtractorNotFound(#[error(not(source))] PathBuf),
    /// The file could not be read from disk.
    #[display("unable to read file: {}", _0.display())]
    Io(#[error(not(source))] PathBuf),
    /// The file was read, but its structure is too broken to process.
    #[display("malformed document")]
    MalformedDocument,
    /// A plugin ran but could not produce metadata.
    #[display("extraction failed in plugin '{_0}'")]
    ExtractionFailed(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Io(_))
    }
}
