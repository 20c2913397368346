//! The persistence gateway consumed by the book aggregate.
//!
//! Reads go straight through a [`BookStore`]. Writes happen inside a
//! [`StoreTransaction`], so that a book's row and every one of its child
//! collections are committed together or not at all.

use crate::error::Result;
use async_trait::async_trait;
use quire_extract::models::{Author, SeriesInfo, Tag, Uid};
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub type StoreHandle = Arc<dyn BookStore + Send + Sync>;

/// The scalar columns of a stored book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookRecord {
    /// Row identity; `-1` for a record that has not been inserted.
    pub id: i64,
    /// Path of the book file, relative to the library root.
    pub path: PathBuf,
    pub title: Option<String>,
    pub encoding: Option<String>,
    pub language: Option<String>,
}

impl BookRecord {
    /// A record for a book that is not stored yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { id: -1, path: path.into(), title: None, encoding: None, language: None }
    }
}

#[async_trait]
pub trait BookStore: Send + Sync {
    async fn book(&self, id: i64) -> Result<Option<BookRecord>>;

    async fn book_by_path(&self, path: &Path) -> Result<Option<BookRecord>>;

    /// Every stored book, in insertion order.
    async fn list_books(&self) -> Result<Vec<BookRecord>>;

    /// Authors in the order they were saved.
    async fn list_authors(&self, book_id: i64) -> Result<Vec<Author>>;

    /// Tags in the order they were saved.
    async fn list_tags(&self, book_id: i64) -> Result<Vec<Tag>>;

    async fn list_labels(&self, book_id: i64) -> Result<Vec<String>>;

    async fn series_info(&self, book_id: i64) -> Result<Option<SeriesInfo>>;

    async fn list_uids(&self, book_id: i64) -> Result<Vec<Uid>>;

    /// Whether the book has at least one bookmark the reader shows.
    async fn has_visible_bookmark(&self, book_id: i64) -> Result<bool>;

    async fn visited_hyperlinks(&self, book_id: i64) -> Result<Vec<String>>;

    /// Record one visited link, outside of any save transaction. Recording a
    /// link twice is not an error.
    async fn add_visited_hyperlink(&self, book_id: i64, link: &str) -> Result<()>;

    /// Start a unit of work. Nothing it writes is visible to readers until
    /// [`StoreTransaction::commit`] succeeds.
    async fn begin(&self) -> Result<Box<dyn StoreTransaction>>;
}

/// One atomic unit of writes.
///
/// Dropping a transaction without committing it rolls back everything it
/// wrote.
#[async_trait]
pub trait StoreTransaction: Send {
    /// Insert a book row and return its generated id. `record.id` is ignored.
    async fn insert_book(&mut self, record: &BookRecord) -> Result<i64>;

    /// Overwrite the scalar columns of the row `record.id`.
    ///
    /// Fails with [`BookNotFound`](crate::error::ErrorKind::BookNotFound) if
    /// there is no such row.
    async fn update_book(&mut self, record: &BookRecord) -> Result<()>;

    async fn delete_all_authors(&mut self, book_id: i64) -> Result<()>;

    async fn save_author(&mut self, book_id: i64, position: usize, author: &Author) -> Result<()>;

    async fn delete_all_tags(&mut self, book_id: i64) -> Result<()>;

    async fn save_tag(&mut self, book_id: i64, position: usize, tag: &Tag) -> Result<()>;

    /// Labels as currently stored, including writes made earlier in this
    /// transaction.
    async fn list_labels(&mut self, book_id: i64) -> Result<Vec<String>>;

    async fn set_label(&mut self, book_id: i64, label: &str) -> Result<()>;

    async fn remove_label(&mut self, book_id: i64, label: &str) -> Result<()>;

    /// Replace the stored series wholesale; `None` clears it.
    async fn save_series(&mut self, book_id: i64, series: Option<&SeriesInfo>) -> Result<()>;

    async fn delete_all_uids(&mut self, book_id: i64) -> Result<()>;

    async fn save_uid(&mut self, book_id: i64, uid: &Uid) -> Result<()>;

    async fn add_visited_hyperlink(&mut self, book_id: i64, link: &str) -> Result<()>;

    async fn commit(self: Box<Self>) -> Result<()>;
}
