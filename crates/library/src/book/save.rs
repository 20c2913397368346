//! The save protocol.
//!
//! A save writes the book's complete state in one store transaction: the
//! row itself, then every child collection. Either all of it commits or
//! none of it does.

use super::Book;
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use quire_cache::BookRecord;
use quire_extract::models::Metadata;
use std::sync::atomic::Ordering;
use tracing::{debug, instrument};

impl Book {
    /// Persist the book. Returns `true` if anything was written.
    ///
    /// Unless `force` is set, a stored book that is not dirty is left alone.
    /// The dirty flag is cleared once the transaction commits; if it fails,
    /// the book stays dirty and (if new) unsaved.
    #[instrument(skip(self), fields(book_id = self.id(), path = %self.file))]
    pub async fn save(&self, force: bool) -> Result<bool> {
        if !self.needs_save(force) {
            return Ok(false);
        }
        // Loading may recover identifiers and save everything pending.
        let saved_while_loading = self.ensure_loaded().await?;
        let _saving = self.saving.lock().await;
        Ok(self.save_inner(force).await? || saved_while_loading)
    }

    fn needs_save(&self, force: bool) -> bool {
        force || self.id() < 0 || self.is_dirty()
    }

    /// Callers must hold the save lock, and the lists must be loaded.
    pub(super) async fn save_inner(&self, force: bool) -> Result<bool> {
        // Another save may have finished while this one waited for the lock.
        if !self.needs_save(force) {
            return Ok(false);
        }
        // Cleared up front: edits made while the transaction runs set it again.
        self.dirty.store(false, Ordering::Release);
        let id = self.id();
        let snapshot = self.read().clone();
        let record = BookRecord {
            id,
            path: self.file.path().to_path_buf(),
            title: Some(snapshot.title()).filter(|title| !title.is_empty()).map(str::to_string),
            encoding: snapshot.encoding().map(str::to_string),
            language: snapshot.language().map(str::to_string),
        };
        let result = match id < 0 {
            true => {
                // Held until the id is published, so links marked meanwhile
                // are appended to the store instead of being lost.
                let links = self.hyperlinks.lock().await;
                let pending: Vec<String> = links.iter().flatten().cloned().collect();
                let result = self.write_transaction(record, &snapshot, &pending).await;
                if let Ok(id) = result {
                    self.id.store(id, Ordering::Release);
                }
                result
            },
            false => self.write_transaction(record, &snapshot, &[]).await,
        };
        match result {
            Ok(id) => {
                debug!(book_id = id, "Saved book");
                Ok(true)
            },
            Err(err) => {
                self.dirty.store(true, Ordering::Release);
                Err(err)
            },
        }
    }

    /// Returns the book's id (newly generated for an insert).
    async fn write_transaction(&self, record: BookRecord, info: &Metadata, pending_links: &[String]) -> Result<i64> {
        let mut tx = self.ctx.store().begin().await.or_raise(|| ErrorKind::Store)?;
        let id = match record.id < 0 {
            true => {
                let id = tx.insert_book(&record).await.or_raise(|| ErrorKind::Store)?;
                for link in pending_links {
                    tx.add_visited_hyperlink(id, link).await.or_raise(|| ErrorKind::Store)?;
                }
                id
            },
            false => {
                tx.update_book(&record).await.or_raise(|| ErrorKind::Store)?;
                record.id
            },
        };

        tx.delete_all_authors(id).await.or_raise(|| ErrorKind::Store)?;
        for (position, author) in info.authors().iter().enumerate() {
            tx.save_author(id, position, author).await.or_raise(|| ErrorKind::Store)?;
        }
        tx.delete_all_tags(id).await.or_raise(|| ErrorKind::Store)?;
        for (position, tag) in info.tags().iter().enumerate() {
            tx.save_tag(id, position, tag).await.or_raise(|| ErrorKind::Store)?;
        }
        tx.delete_all_uids(id).await.or_raise(|| ErrorKind::Store)?;
        for uid in info.uids() {
            tx.save_uid(id, uid).await.or_raise(|| ErrorKind::Store)?;
        }

        let stored = tx.list_labels(id).await.or_raise(|| ErrorKind::Store)?;
        for label in stored.iter().filter(|label| !info.labels().contains(label)) {
            tx.remove_label(id, label).await.or_raise(|| ErrorKind::Store)?;
        }
        for label in info.labels().iter().filter(|label| !stored.contains(label)) {
            tx.set_label(id, label).await.or_raise(|| ErrorKind::Store)?;
        }

        tx.save_series(id, info.series()).await.or_raise(|| ErrorKind::Store)?;
        tx.commit().await.or_raise(|| ErrorKind::Store)?;
        Ok(id)
    }
}
