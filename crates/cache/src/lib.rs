//! Persistence for book metadata.
//!
//! The [`BookStore`] trait is the gateway the book aggregate talks to;
//! [`SqliteStore`] implements it over a migrated SQLite [`Database`]. With
//! the `mock` feature enabled, [`MockStore`] implements it in memory and
//! counts writes, for use in other crates' tests.
//!
//! # Schema
//! One `books` row per book file (path, title, encoding, language), and one
//! child table per collection (authors, tags, labels, series, identifiers,
//! visited links, bookmarks), all cascading from `books`.

mod db;
pub mod error;
#[cfg(any(test, feature = "mock"))]
mod mock;
mod models;
mod repo;
mod store;

pub use crate::db::Database;
#[cfg(any(test, feature = "mock"))]
pub use crate::mock::{MockBook, MockStore};
pub use crate::repo::{SqliteStore, SqliteTransaction};
pub use crate::store::{BookRecord, BookStore, StoreHandle, StoreTransaction};
