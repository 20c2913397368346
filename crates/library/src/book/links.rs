//! Visited hyperlinks.
//!
//! Kept apart from the save transaction: once a book is stored, each newly
//! visited link is appended to the store on its own, and never makes the
//! book dirty.

use super::Book;
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use std::collections::BTreeSet;
use tokio::sync::MutexGuard;

type Links<'a> = MutexGuard<'a, Option<BTreeSet<String>>>;

impl Book {
    /// The link set, read from the store on first use.
    async fn links(&self) -> Result<Links<'_>> {
        let mut links = self.hyperlinks.lock().await;
        if links.is_none() {
            let id = self.id();
            let stored = match id < 0 {
                true => Vec::new(),
                false => self.ctx.store().visited_hyperlinks(id).await.or_raise(|| ErrorKind::Store)?,
            };
            *links = Some(stored.into_iter().collect());
        }
        Ok(links)
    }

    pub async fn is_hyperlink_visited(&self, link: &str) -> Result<bool> {
        let links = self.links().await?;
        Ok(links.as_ref().is_some_and(|links| links.contains(link)))
    }

    /// Every visited link, sorted.
    pub async fn visited_hyperlinks(&self) -> Result<Vec<String>> {
        let links = self.links().await?;
        Ok(links.iter().flatten().cloned().collect())
    }

    /// Record a visited link. Returns `false` if it was already recorded.
    ///
    /// An unsaved book only remembers the link; it is written along with the
    /// book's first save.
    pub async fn mark_hyperlink_visited(&self, link: &str) -> Result<bool> {
        let mut guard = self.links().await?;
        let links = guard.get_or_insert_with(BTreeSet::new);
        if links.contains(link) {
            return Ok(false);
        }
        let id = self.id();
        if id >= 0 {
            self.ctx.store().add_visited_hyperlink(id, link).await.or_raise(|| ErrorKind::Store)?;
        }
        links.insert(link.to_string());
        Ok(true)
    }
}
