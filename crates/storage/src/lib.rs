//! File identity for books in a quire library.
//!
//! Every book is backed by exactly one file, addressed by a path relative to
//! the library root. The [`BookFile`] is the book's identity: two in-memory
//! books referencing the same file are the same book, whatever their row id
//! or metadata says.

pub mod error;
mod file;
mod path;

pub use crate::file::BookFile;
pub use crate::path::validate as validate_path;
