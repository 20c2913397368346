//! In-memory book store for testing.

use crate::error::{ErrorKind, Result};
use crate::store::{BookRecord, BookStore, StoreTransaction};
use async_trait::async_trait;
use exn::OptionExt;
use quire_extract::models::{Author, SeriesInfo, Tag, Uid};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Everything the mock store knows about one book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockBook {
    pub record: BookRecord,
    pub authors: Vec<Author>,
    pub tags: Vec<Tag>,
    pub labels: Vec<String>,
    pub series: Option<SeriesInfo>,
    pub uids: Vec<Uid>,
    pub hyperlinks: Vec<String>,
    pub bookmark: bool,
}

impl MockBook {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            record: BookRecord::new(path),
            authors: Vec::new(),
            tags: Vec::new(),
            labels: Vec::new(),
            series: None,
            uids: Vec::new(),
            hyperlinks: Vec::new(),
            bookmark: false,
        }
    }

    fn add_hyperlink(&mut self, link: &str) {
        if !self.hyperlinks.iter().any(|l| l == link) {
            self.hyperlinks.push(link.to_string());
        }
    }
}

#[derive(Debug, Default)]
struct State {
    books: BTreeMap<i64, MockBook>,
    next_id: i64,
    commits: usize,
    hyperlink_appends: usize,
    fail_commits: bool,
}

/// Book store that keeps everything in memory and counts writes.
///
/// Transactions work on a private copy of the stored books that replaces
/// the shared state on commit, so uncommitted writes are never visible.
#[derive(Debug, Clone, Default)]
pub struct MockStore {
    state: Arc<Mutex<State>>,
}

impl MockStore {
    /// Store a book as if it had been saved earlier. A negative
    /// `record.id` is replaced with the next free id.
    pub async fn seed(&self, mut book: MockBook) -> i64 {
        let mut state = self.state.lock().await;
        if book.record.id < 0 {
            book.record.id = state.next_id.max(1);
        }
        let id = book.record.id;
        state.next_id = state.next_id.max(id + 1);
        state.books.insert(id, book);
        id
    }

    /// A snapshot of a stored book.
    pub async fn stored(&self, id: i64) -> Option<MockBook> {
        self.state.lock().await.books.get(&id).cloned()
    }

    /// Number of committed transactions.
    pub async fn commits(&self) -> usize {
        self.state.lock().await.commits
    }

    /// Number of visited links appended outside of a transaction.
    pub async fn hyperlink_appends(&self) -> usize {
        self.state.lock().await.hyperlink_appends
    }

    /// Make every following commit fail (and roll back).
    pub async fn fail_commits(&self, fail: bool) {
        self.state.lock().await.fail_commits = fail;
    }

    async fn with_book<T>(&self, id: i64, f: impl FnOnce(&MockBook) -> T) -> Option<T> {
        self.state.lock().await.books.get(&id).map(f)
    }
}

#[async_trait]
impl BookStore for MockStore {
    async fn book(&self, id: i64) -> Result<Option<BookRecord>> {
        Ok(self.with_book(id, |book| book.record.clone()).await)
    }

    async fn book_by_path(&self, path: &Path) -> Result<Option<BookRecord>> {
        let state = self.state.lock().await;
        Ok(state.books.values().find(|book| book.record.path == path).map(|book| book.record.clone()))
    }

    async fn list_books(&self) -> Result<Vec<BookRecord>> {
        Ok(self.state.lock().await.books.values().map(|book| book.record.clone()).collect())
    }

    async fn list_authors(&self, book_id: i64) -> Result<Vec<Author>> {
        Ok(self.with_book(book_id, |book| book.authors.clone()).await.unwrap_or_default())
    }

    async fn list_tags(&self, book_id: i64) -> Result<Vec<Tag>> {
        Ok(self.with_book(book_id, |book| book.tags.clone()).await.unwrap_or_default())
    }

    async fn list_labels(&self, book_id: i64) -> Result<Vec<String>> {
        Ok(self.with_book(book_id, |book| book.labels.clone()).await.unwrap_or_default())
    }

    async fn series_info(&self, book_id: i64) -> Result<Option<SeriesInfo>> {
        Ok(self.with_book(book_id, |book| book.series.clone()).await.flatten())
    }

    async fn list_uids(&self, book_id: i64) -> Result<Vec<Uid>> {
        Ok(self.with_book(book_id, |book| book.uids.clone()).await.unwrap_or_default())
    }

    async fn has_visible_bookmark(&self, book_id: i64) -> Result<bool> {
        Ok(self.with_book(book_id, |book| book.bookmark).await.unwrap_or_default())
    }

    async fn visited_hyperlinks(&self, book_id: i64) -> Result<Vec<String>> {
        Ok(self.with_book(book_id, |book| book.hyperlinks.clone()).await.unwrap_or_default())
    }

    async fn add_visited_hyperlink(&self, book_id: i64, link: &str) -> Result<()> {
        let mut state = self.state.lock().await;
        state.hyperlink_appends += 1;
        let book = state.books.get_mut(&book_id).ok_or_raise(|| ErrorKind::BookNotFound(book_id))?;
        book.add_hyperlink(link);
        Ok(())
    }

    async fn begin(&self) -> Result<Box<dyn StoreTransaction>> {
        let state = self.state.lock().await;
        Ok(Box::new(MockTransaction {
            shared: Arc::clone(&self.state),
            books: state.books.clone(),
            next_id: state.next_id,
        }))
    }
}

struct MockTransaction {
    shared: Arc<Mutex<State>>,
    books: BTreeMap<i64, MockBook>,
    next_id: i64,
}

impl MockTransaction {
    fn book(&mut self, id: i64) -> Result<&mut MockBook> {
        self.books.get_mut(&id).ok_or_raise(|| ErrorKind::BookNotFound(id))
    }
}

#[async_trait]
impl StoreTransaction for MockTransaction {
    async fn insert_book(&mut self, record: &BookRecord) -> Result<i64> {
        let id = self.next_id.max(1);
        self.next_id = id + 1;
        let mut book = MockBook::new(record.path.clone());
        book.record = BookRecord { id, ..record.clone() };
        self.books.insert(id, book);
        Ok(id)
    }

    async fn update_book(&mut self, record: &BookRecord) -> Result<()> {
        self.book(record.id)?.record = record.clone();
        Ok(())
    }

    async fn delete_all_authors(&mut self, book_id: i64) -> Result<()> {
        self.book(book_id)?.authors.clear();
        Ok(())
    }

    async fn save_author(&mut self, book_id: i64, position: usize, author: &Author) -> Result<()> {
        let authors = &mut self.book(book_id)?.authors;
        authors.insert(position.min(authors.len()), author.clone());
        Ok(())
    }

    async fn delete_all_tags(&mut self, book_id: i64) -> Result<()> {
        self.book(book_id)?.tags.clear();
        Ok(())
    }

    async fn save_tag(&mut self, book_id: i64, position: usize, tag: &Tag) -> Result<()> {
        let tags = &mut self.book(book_id)?.tags;
        tags.insert(position.min(tags.len()), tag.clone());
        Ok(())
    }

    async fn list_labels(&mut self, book_id: i64) -> Result<Vec<String>> {
        Ok(self.book(book_id)?.labels.clone())
    }

    async fn set_label(&mut self, book_id: i64, label: &str) -> Result<()> {
        let labels = &mut self.book(book_id)?.labels;
        if !labels.iter().any(|l| l == label) {
            labels.push(label.to_string());
        }
        Ok(())
    }

    async fn remove_label(&mut self, book_id: i64, label: &str) -> Result<()> {
        self.book(book_id)?.labels.retain(|l| l != label);
        Ok(())
    }

    async fn save_series(&mut self, book_id: i64, series: Option<&SeriesInfo>) -> Result<()> {
        self.book(book_id)?.series = series.cloned();
        Ok(())
    }

    async fn delete_all_uids(&mut self, book_id: i64) -> Result<()> {
        self.book(book_id)?.uids.clear();
        Ok(())
    }

    async fn save_uid(&mut self, book_id: i64, uid: &Uid) -> Result<()> {
        let uids = &mut self.book(book_id)?.uids;
        if !uids.contains(uid) {
            uids.push(uid.clone());
        }
        Ok(())
    }

    async fn add_visited_hyperlink(&mut self, book_id: i64, link: &str) -> Result<()> {
        self.book(book_id)?.add_hyperlink(link);
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let Self { shared, books, next_id } = *self;
        let mut state = shared.lock().await;
        if state.fail_commits {
            exn::bail!(ErrorKind::Database);
        }
        state.books = books;
        state.next_id = next_id;
        state.commits += 1;
        Ok(())
    }
}
