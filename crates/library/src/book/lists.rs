//! Lazily loaded list fields, and their change-reporting mutators.
//!
//! Every accessor and mutator here first makes sure the lists have been
//! read from the store, so an edit can never be overwritten by a late load.

use super::Book;
use crate::error::{Error, ErrorKind, Result};
use exn::ResultExt;
use quire_extract::models::{Author, Metadata, SeriesIndex, SeriesInfo, Tag, Uid};
use std::sync::atomic::Ordering;
use tracing::{debug, instrument};

impl Book {
    /// Returns `true` if this call loaded the lists and recovering
    /// identifiers along the way saved the book.
    pub(super) async fn ensure_loaded(&self) -> Result<bool> {
        let mut saved = false;
        let flag = &mut saved;
        self.loaded
            .get_or_try_init(|| async move {
                *flag = self.load_lists().await?;
                Ok::<_, Error>(())
            })
            .await?;
        Ok(saved)
    }

    /// Read every list from the store in one pass. Lists count as clean
    /// afterwards; pending scalar edits keep the book dirty.
    ///
    /// If the store knows no identifiers, the plugin is asked for them; any
    /// it finds are saved straight away. Returns whether that save happened.
    #[instrument(skip(self), fields(book_id = self.id()))]
    async fn load_lists(&self) -> Result<bool> {
        let id = self.id();
        if id < 0 {
            return Ok(false);
        }
        let store = self.ctx.store();
        let authors = store.list_authors(id).await.or_raise(|| ErrorKind::Store)?;
        let tags = store.list_tags(id).await.or_raise(|| ErrorKind::Store)?;
        let labels = store.list_labels(id).await.or_raise(|| ErrorKind::Store)?;
        let series = store.series_info(id).await.or_raise(|| ErrorKind::Store)?;
        let uids = store.list_uids(id).await.or_raise(|| ErrorKind::Store)?;
        let bookmark = store.has_visible_bookmark(id).await.or_raise(|| ErrorKind::Store)?;
        let missing_uids = uids.is_empty();
        self.write().replace_lists(authors, tags, labels, series, uids);
        self.has_bookmark.store(bookmark, Ordering::Release);
        match missing_uids {
            true => self.recover_uids().await,
            false => Ok(false),
        }
    }

    async fn recover_uids(&self) -> Result<bool> {
        let plugin = match self.plugin() {
            Ok(plugin) => plugin,
            Err(err) => {
                debug!(error = %err, "No plugin to recover identifiers with");
                return Ok(false);
            },
        };
        let mut found = Metadata::default();
        if let Err(err) = plugin.read_uids(&self.file, &mut found).await {
            debug!(plugin = plugin.name(), error = %err, "Identifier recovery failed");
            return Ok(false);
        }
        if found.uids().is_empty() {
            return Ok(false);
        }
        {
            let mut info = self.write();
            for uid in found.uids() {
                info.add_uid(uid.clone());
            }
        }
        debug!(count = found.uids().len(), "Recovered identifiers; saving them");
        let _saving = self.saving.lock().await;
        self.save_inner(true).await
    }

    fn snapshot<T>(&self, f: impl FnOnce(&Metadata) -> T) -> T {
        f(&self.read())
    }
}

/// Authors
impl Book {
    pub async fn authors(&self) -> Result<Vec<Author>> {
        self.ensure_loaded().await?;
        Ok(self.snapshot(|info| info.authors().to_vec()))
    }

    pub async fn add_author(&self, author: Author) -> Result<bool> {
        self.ensure_loaded().await?;
        Ok(self.edit(|info| info.add_author(author)))
    }

    /// Normalise and add an author by name; see [`Author::from_name`].
    pub async fn add_author_name(&self, name: &str, sort_key: Option<&str>) -> Result<bool> {
        self.ensure_loaded().await?;
        Ok(self.edit(|info| info.add_author_name(name, sort_key)))
    }

    pub async fn remove_all_authors(&self) -> Result<bool> {
        self.ensure_loaded().await?;
        Ok(self.edit(Metadata::remove_all_authors))
    }
}

/// Tags
impl Book {
    pub async fn tags(&self) -> Result<Vec<Tag>> {
        self.ensure_loaded().await?;
        Ok(self.snapshot(|info| info.tags().to_vec()))
    }

    pub async fn add_tag(&self, tag: Tag) -> Result<bool> {
        self.ensure_loaded().await?;
        Ok(self.edit(|info| info.add_tag(tag)))
    }

    pub async fn add_tag_name(&self, name: &str) -> Result<bool> {
        self.ensure_loaded().await?;
        Ok(self.edit(|info| info.add_tag_name(name)))
    }

    pub async fn remove_all_tags(&self) -> Result<bool> {
        self.ensure_loaded().await?;
        Ok(self.edit(Metadata::remove_all_tags))
    }
}

/// Labels
impl Book {
    pub async fn labels(&self) -> Result<Vec<String>> {
        self.ensure_loaded().await?;
        Ok(self.snapshot(|info| info.labels().to_vec()))
    }

    pub async fn add_label(&self, label: &str) -> Result<bool> {
        self.ensure_loaded().await?;
        Ok(self.edit(|info| info.add_label(label)))
    }

    pub async fn remove_label(&self, label: &str) -> Result<bool> {
        self.ensure_loaded().await?;
        Ok(self.edit(|info| info.remove_label(label)))
    }
}

/// Series
impl Book {
    pub async fn series(&self) -> Result<Option<SeriesInfo>> {
        self.ensure_loaded().await?;
        Ok(self.snapshot(|info| info.series().cloned()))
    }

    /// Assign the series; a `None` name removes it whatever the index.
    pub async fn set_series(&self, name: Option<&str>, index: Option<SeriesIndex>) -> Result<bool> {
        self.ensure_loaded().await?;
        Ok(self.edit(|info| info.set_series(name, index)))
    }
}

/// Identifiers
impl Book {
    pub async fn uids(&self) -> Result<Vec<Uid>> {
        self.ensure_loaded().await?;
        Ok(self.snapshot(|info| info.uids().to_vec()))
    }

    pub async fn add_uid(&self, uid: Uid) -> Result<bool> {
        self.ensure_loaded().await?;
        Ok(self.edit(|info| info.add_uid(uid)))
    }

    pub async fn remove_all_uids(&self) -> Result<bool> {
        self.ensure_loaded().await?;
        Ok(self.edit(Metadata::remove_all_uids))
    }

    pub async fn matches_uid(&self, uid: &Uid) -> Result<bool> {
        self.ensure_loaded().await?;
        Ok(self.snapshot(|info| info.uids().contains(uid)))
    }
}
