//! SQLite implementation of the persistence gateway.
//!
//! Each child collection lives in its own table keyed by `book_id`, with
//! cascading deletes from `books`. Ordered collections (authors, tags) carry
//! an explicit `position` so that they read back in the order they were saved.

use crate::Database;
use crate::error::{ErrorKind, Result};
use crate::models::{AuthorRow, BookRow, SeriesRow, UidRow, parse_tag};
use crate::store::{BookRecord, BookStore, StoreTransaction};
use async_trait::async_trait;
use exn::{OptionExt, ResultExt};
use quire_extract::models::{Author, SeriesInfo, Tag, Uid};
use sqlx::{Sqlite, SqlitePool, Transaction};
use std::path::Path;
use tracing::instrument;

fn sqlx_hates_paths(path: &Path) -> Result<&str> {
    path.to_str().ok_or_raise(|| ErrorKind::InvalidData("path"))
}

fn position(position: usize) -> Result<i64> {
    i64::try_from(position).or_raise(|| ErrorKind::InvalidData("position"))
}

/// Book store backed by a SQLite connection pool.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl From<&Database> for SqliteStore {
    fn from(db: &Database) -> Self {
        Self { pool: db.pool().clone() }
    }
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookStore for SqliteStore {
    async fn book(&self, id: i64) -> Result<Option<BookRecord>> {
        let row: Option<BookRow> = sqlx::query_as(include_str!("../queries/get_book.sql"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(row.map(BookRecord::from))
    }

    async fn book_by_path(&self, path: &Path) -> Result<Option<BookRecord>> {
        let row: Option<BookRow> = sqlx::query_as(include_str!("../queries/get_book_by_path.sql"))
            .bind(sqlx_hates_paths(path)?)
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(row.map(BookRecord::from))
    }

    async fn list_books(&self) -> Result<Vec<BookRecord>> {
        let rows: Vec<BookRow> = sqlx::query_as(include_str!("../queries/list_books.sql"))
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(rows.into_iter().map(BookRecord::from).collect())
    }

    async fn list_authors(&self, book_id: i64) -> Result<Vec<Author>> {
        let rows: Vec<AuthorRow> = sqlx::query_as(include_str!("../queries/list_authors.sql"))
            .bind(book_id)
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(rows.into_iter().map(Author::from).collect())
    }

    async fn list_tags(&self, book_id: i64) -> Result<Vec<Tag>> {
        let names: Vec<String> = sqlx::query_scalar(include_str!("../queries/list_tags.sql"))
            .bind(book_id)
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        names.iter().map(|name| parse_tag(name)).collect()
    }

    async fn list_labels(&self, book_id: i64) -> Result<Vec<String>> {
        sqlx::query_scalar(include_str!("../queries/list_labels.sql"))
            .bind(book_id)
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)
    }

    async fn series_info(&self, book_id: i64) -> Result<Option<SeriesInfo>> {
        let row: Option<SeriesRow> = sqlx::query_as(include_str!("../queries/get_series.sql"))
            .bind(book_id)
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        row.map(SeriesInfo::try_from).transpose()
    }

    async fn list_uids(&self, book_id: i64) -> Result<Vec<Uid>> {
        let rows: Vec<UidRow> = sqlx::query_as(include_str!("../queries/list_uids.sql"))
            .bind(book_id)
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        rows.into_iter().map(Uid::try_from).collect()
    }

    async fn has_visible_bookmark(&self, book_id: i64) -> Result<bool> {
        let exists: i64 = sqlx::query_scalar(include_str!("../queries/has_visible_bookmark.sql"))
            .bind(book_id)
            .fetch_one(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(exists != 0)
    }

    async fn visited_hyperlinks(&self, book_id: i64) -> Result<Vec<String>> {
        sqlx::query_scalar(include_str!("../queries/list_visited_hyperlinks.sql"))
            .bind(book_id)
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)
    }

    async fn add_visited_hyperlink(&self, book_id: i64, link: &str) -> Result<()> {
        sqlx::query(include_str!("../queries/add_visited_hyperlink.sql"))
            .bind(book_id)
            .bind(link)
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(())
    }

    async fn begin(&self) -> Result<Box<dyn StoreTransaction>> {
        let tx = self.pool.begin().await.or_raise(|| ErrorKind::Database)?;
        Ok(Box::new(SqliteTransaction { tx }))
    }
}

/// A SQLite transaction; rolled back on drop unless committed.
pub struct SqliteTransaction {
    tx: Transaction<'static, Sqlite>,
}

#[async_trait]
impl StoreTransaction for SqliteTransaction {
    #[instrument(level = "debug", skip_all, fields(path = %record.path.display()))]
    async fn insert_book(&mut self, record: &BookRecord) -> Result<i64> {
        let row = BookRow::try_from(record)?;
        let result = sqlx::query(include_str!("../queries/insert_book.sql"))
            .bind(row.path)
            .bind(row.title)
            .bind(row.encoding)
            .bind(row.language)
            .execute(&mut *self.tx)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(result.last_insert_rowid())
    }

    async fn update_book(&mut self, record: &BookRecord) -> Result<()> {
        let row = BookRow::try_from(record)?;
        let result = sqlx::query(include_str!("../queries/update_book.sql"))
            .bind(row.path)
            .bind(row.title)
            .bind(row.encoding)
            .bind(row.language)
            .bind(row.id)
            .execute(&mut *self.tx)
            .await
            .or_raise(|| ErrorKind::Database)?;
        if result.rows_affected() == 0 {
            exn::bail!(ErrorKind::BookNotFound(record.id));
        }
        Ok(())
    }

    async fn delete_all_authors(&mut self, book_id: i64) -> Result<()> {
        sqlx::query(include_str!("../queries/delete_authors.sql"))
            .bind(book_id)
            .execute(&mut *self.tx)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(())
    }

    async fn save_author(&mut self, book_id: i64, index: usize, author: &Author) -> Result<()> {
        sqlx::query(include_str!("../queries/insert_author.sql"))
            .bind(book_id)
            .bind(position(index)?)
            .bind(author.display_name.as_str())
            .bind(author.sort_key.as_str())
            .execute(&mut *self.tx)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(())
    }

    async fn delete_all_tags(&mut self, book_id: i64) -> Result<()> {
        sqlx::query(include_str!("../queries/delete_tags.sql"))
            .bind(book_id)
            .execute(&mut *self.tx)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(())
    }

    async fn save_tag(&mut self, book_id: i64, index: usize, tag: &Tag) -> Result<()> {
        sqlx::query(include_str!("../queries/insert_tag.sql"))
            .bind(book_id)
            .bind(position(index)?)
            .bind(tag.full_name())
            .execute(&mut *self.tx)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(())
    }

    async fn list_labels(&mut self, book_id: i64) -> Result<Vec<String>> {
        sqlx::query_scalar(include_str!("../queries/list_labels.sql"))
            .bind(book_id)
            .fetch_all(&mut *self.tx)
            .await
            .or_raise(|| ErrorKind::Database)
    }

    async fn set_label(&mut self, book_id: i64, label: &str) -> Result<()> {
        sqlx::query(include_str!("../queries/insert_label.sql"))
            .bind(book_id)
            .bind(label)
            .execute(&mut *self.tx)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(())
    }

    async fn remove_label(&mut self, book_id: i64, label: &str) -> Result<()> {
        sqlx::query(include_str!("../queries/delete_label.sql"))
            .bind(book_id)
            .bind(label)
            .execute(&mut *self.tx)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(())
    }

    async fn save_series(&mut self, book_id: i64, series: Option<&SeriesInfo>) -> Result<()> {
        let query = match series {
            Some(series) => sqlx::query(include_str!("../queries/upsert_series.sql"))
                .bind(book_id)
                .bind(series.name.as_str())
                .bind(series.index.as_ref().map(|index| index.as_str())),
            None => sqlx::query(include_str!("../queries/delete_series.sql")).bind(book_id),
        };
        query.execute(&mut *self.tx).await.or_raise(|| ErrorKind::Database)?;
        Ok(())
    }

    async fn delete_all_uids(&mut self, book_id: i64) -> Result<()> {
        sqlx::query(include_str!("../queries/delete_uids.sql"))
            .bind(book_id)
            .execute(&mut *self.tx)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(())
    }

    async fn save_uid(&mut self, book_id: i64, uid: &Uid) -> Result<()> {
        sqlx::query(include_str!("../queries/insert_uid.sql"))
            .bind(book_id)
            .bind(uid.kind.as_str())
            .bind(uid.id.as_str())
            .execute(&mut *self.tx)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(())
    }

    async fn add_visited_hyperlink(&mut self, book_id: i64, link: &str) -> Result<()> {
        sqlx::query(include_str!("../queries/add_visited_hyperlink.sql"))
            .bind(book_id)
            .bind(link)
            .execute(&mut *self.tx)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        self.tx.commit().await.or_raise(|| ErrorKind::Database)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quire_extract::models::SeriesIndex;

    async fn store() -> SqliteStore {
        SqliteStore::from(&Database::connect_in_memory().await.unwrap())
    }

    fn record(path: &str, title: &str) -> BookRecord {
        BookRecord { title: Some(title.to_string()), ..BookRecord::new(path) }
    }

    async fn insert(store: &SqliteStore, path: &str) -> i64 {
        let mut tx = store.begin().await.unwrap();
        let id = tx.insert_book(&record(path, "Untitled")).await.unwrap();
        tx.commit().await.unwrap();
        id
    }

    #[tokio::test]
    async fn test_insert_then_update() {
        let store = store().await;
        let mut tx = store.begin().await.unwrap();
        let id = tx.insert_book(&record("a.html", "First")).await.unwrap();
        tx.commit().await.unwrap();
        assert!(id > 0);

        let mut tx = store.begin().await.unwrap();
        let updated = BookRecord { id, language: Some("en".to_string()), ..record("b.html", "Second") };
        tx.update_book(&updated).await.unwrap();
        tx.commit().await.unwrap();

        assert_eq!(store.book(id).await.unwrap(), Some(updated.clone()));
        assert_eq!(store.book_by_path(Path::new("b.html")).await.unwrap(), Some(updated));
        assert_eq!(store.book_by_path(Path::new("a.html")).await.unwrap(), None);
        assert_eq!(store.list_books().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_missing_book() {
        let store = store().await;
        let mut tx = store.begin().await.unwrap();
        let err = tx.update_book(&BookRecord { id: 42, ..BookRecord::new("a.html") }).await.unwrap_err();
        assert_eq!(*err, ErrorKind::BookNotFound(42));
    }

    #[tokio::test]
    async fn test_child_collections_keep_order() {
        let store = store().await;
        let id = insert(&store, "a.html").await;
        let authors = [Author::new("Zed Zulu", "Zulu"), Author::new("Amy Alpha", "Alpha")];
        let tags = [Tag::parse("Fiction/Zoo").unwrap(), Tag::parse("Animals").unwrap()];
        let uids = [Uid::new("ISBN", "2").unwrap(), Uid::new("ISBN", "1").unwrap()];

        let mut tx = store.begin().await.unwrap();
        for (i, author) in authors.iter().enumerate() {
            tx.save_author(id, i, author).await.unwrap();
        }
        for (i, tag) in tags.iter().enumerate() {
            tx.save_tag(id, i, tag).await.unwrap();
        }
        for uid in &uids {
            tx.save_uid(id, uid).await.unwrap();
        }
        tx.save_series(id, Some(&SeriesInfo::new("Zoo", "3".parse().ok()))).await.unwrap();
        tx.commit().await.unwrap();

        assert_eq!(store.list_authors(id).await.unwrap(), authors);
        assert_eq!(store.list_tags(id).await.unwrap(), tags);
        assert_eq!(store.list_uids(id).await.unwrap(), uids);
        let series = store.series_info(id).await.unwrap().unwrap();
        assert_eq!(series.index, Some(SeriesIndex::from(3)));
    }

    #[tokio::test]
    async fn test_replace_collections() {
        let store = store().await;
        let id = insert(&store, "a.html").await;
        let mut tx = store.begin().await.unwrap();
        tx.save_author(id, 0, &Author::new("Homer", "Homer")).await.unwrap();
        tx.save_tag(id, 0, &Tag::parse("Epic").unwrap()).await.unwrap();
        tx.save_uid(id, &Uid::new("ISBN", "1").unwrap()).await.unwrap();
        tx.save_series(id, Some(&SeriesInfo::new("Cycle", None))).await.unwrap();
        tx.commit().await.unwrap();

        let mut tx = store.begin().await.unwrap();
        tx.delete_all_authors(id).await.unwrap();
        tx.delete_all_tags(id).await.unwrap();
        tx.delete_all_uids(id).await.unwrap();
        tx.save_series(id, None).await.unwrap();
        tx.commit().await.unwrap();

        assert!(store.list_authors(id).await.unwrap().is_empty());
        assert!(store.list_tags(id).await.unwrap().is_empty());
        assert!(store.list_uids(id).await.unwrap().is_empty());
        assert_eq!(store.series_info(id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_labels_in_transaction() {
        let store = store().await;
        let id = insert(&store, "a.html").await;
        let mut tx = store.begin().await.unwrap();
        tx.set_label(id, "read").await.unwrap();
        tx.set_label(id, "favorite").await.unwrap();
        tx.set_label(id, "read").await.unwrap();
        assert_eq!(tx.list_labels(id).await.unwrap(), ["read", "favorite"]);
        tx.remove_label(id, "read").await.unwrap();
        tx.commit().await.unwrap();
        assert_eq!(store.list_labels(id).await.unwrap(), ["favorite"]);
    }

    #[tokio::test]
    async fn test_visited_hyperlinks() {
        let store = store().await;
        let id = insert(&store, "a.html").await;
        store.add_visited_hyperlink(id, "#ch1").await.unwrap();
        store.add_visited_hyperlink(id, "#ch1").await.unwrap();
        let mut tx = store.begin().await.unwrap();
        tx.add_visited_hyperlink(id, "#ch2").await.unwrap();
        tx.commit().await.unwrap();
        assert_eq!(store.visited_hyperlinks(id).await.unwrap(), ["#ch1", "#ch2"]);
    }

    #[tokio::test]
    async fn test_bookmark_visibility() {
        let db = Database::connect_in_memory().await.unwrap();
        let store = SqliteStore::from(&db);
        let id = insert(&store, "a.html").await;
        assert!(!store.has_visible_bookmark(id).await.unwrap());
        sqlx::query("INSERT INTO bookmarks (book_id, visible) VALUES (?, 0)").bind(id).execute(db.pool()).await.unwrap();
        assert!(!store.has_visible_bookmark(id).await.unwrap());
        sqlx::query("INSERT INTO bookmarks (book_id, visible) VALUES (?, 1)").bind(id).execute(db.pool()).await.unwrap();
        assert!(store.has_visible_bookmark(id).await.unwrap());
    }

    #[tokio::test]
    async fn test_dropped_transaction_rolls_back() {
        let store = store().await;
        let mut tx = store.begin().await.unwrap();
        let id = tx.insert_book(&record("a.html", "Lost")).await.unwrap();
        tx.save_author(id, 0, &Author::new("Homer", "Homer")).await.unwrap();
        drop(tx);
        assert!(store.list_books().await.unwrap().is_empty());
        assert!(store.list_authors(id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_statement_aborts_unit_of_work() {
        let store = store().await;
        let mut tx = store.begin().await.unwrap();
        let id = tx.insert_book(&record("a.html", "Half")).await.unwrap();
        // No such book: the foreign key rejects the row.
        let result = tx.save_author(id + 1, 0, &Author::new("Homer", "Homer")).await;
        assert_eq!(*result.unwrap_err(), ErrorKind::Database);
        drop(tx);
        assert_eq!(store.book(id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_deleting_a_book_cascades() {
        let db = Database::connect_in_memory().await.unwrap();
        let store = SqliteStore::from(&db);
        let id = insert(&store, "a.html").await;
        store.add_visited_hyperlink(id, "#ch1").await.unwrap();
        sqlx::query("DELETE FROM books WHERE id = ?").bind(id).execute(db.pool()).await.unwrap();
        assert!(store.visited_hyperlinks(id).await.unwrap().is_empty());
    }
}
