use crate::error::{ErrorKind, Result};
use crate::{Book, Context};
use exn::ResultExt;
use quire_storage::BookFile;
use std::path::Path;
use tracing::instrument;

/// Entry point for opening books, stored or not.
#[derive(Debug, Clone)]
pub struct Library {
    ctx: Context,
}

impl Library {
    pub fn new(ctx: Context) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    /// The stored book with this id, rehydrated lean.
    pub async fn book(&self, id: i64) -> Result<Option<Book>> {
        let record = self.ctx.store().book(id).await.or_raise(|| ErrorKind::Store)?;
        record.map(|record| Book::rehydrate(self.ctx.clone(), record)).transpose()
    }

    /// The book for a file relative to the library root: rehydrated if it
    /// has been stored, otherwise opened fresh from the file.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub async fn book_for_file(&self, path: impl AsRef<Path>) -> Result<Book> {
        let path = path.as_ref();
        let file = BookFile::new(self.ctx.root(), path).or_raise(|| ErrorKind::InvalidPath(path.to_path_buf()))?;
        match self.ctx.store().book_by_path(file.path()).await.or_raise(|| ErrorKind::Store)? {
            Some(record) => Book::rehydrate(self.ctx.clone(), record),
            None => Book::open(self.ctx.clone(), file).await,
        }
    }

    /// Every stored book, rehydrated lean.
    pub async fn books(&self) -> Result<Vec<Book>> {
        let records = self.ctx.store().list_books().await.or_raise(|| ErrorKind::Store)?;
        records.into_iter().map(|record| Book::rehydrate(self.ctx.clone(), record)).collect()
    }

    /// Stored books for which [`Book::matches`] holds.
    pub async fn search(&self, pattern: &str) -> Result<Vec<Book>> {
        let mut found = Vec::new();
        for book in self.books().await? {
            if book.matches(pattern).await? {
                found.push(book);
            }
        }
        Ok(found)
    }
}
