//! The book aggregate.
//!
//! A [`Book`] reconciles three sources of truth: the metadata embedded in its
//! file, the rows persisted in the store, and edits made at runtime. It is
//! either opened fresh from a file ([`Book::open`]: unsaved and dirty) or
//! rehydrated from a stored row ([`Book::rehydrate`]: lean and clean, with
//! every list loaded from the store on first access).
//!
//! A book may be shared between tasks. Each field is individually safe to
//! read and write, but a sequence of edits is not atomic: concurrent editors
//! interleave, and whoever writes last decides the dirty flag. Cover lookup
//! and saving are the two exceptions, each serialised per book.

mod links;
mod lists;
mod save;

use crate::Context;
use crate::cover::CoverCell;
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use quire_cache::BookRecord;
use quire_extract::PluginHandle;
use quire_extract::models::{Cover, Metadata};
use quire_storage::BookFile;
use std::collections::BTreeSet;
use std::fmt::{Debug, Display, Formatter, Result as FmtResult};
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, instrument};

/// Row id of a book that has never been saved.
pub const UNSAVED: i64 = -1;
const DEFAULT_ENCODING: &str = "utf-8";

pub struct Book {
    ctx: Context,
    file: BookFile,
    id: AtomicI64,
    info: RwLock<Metadata>,
    has_bookmark: AtomicBool,
    dirty: AtomicBool,
    /// Set once the lists have been read from the store (or extracted).
    loaded: OnceCell<()>,
    /// `None` until first touched.
    hyperlinks: Mutex<Option<BTreeSet<String>>>,
    cover: Mutex<CoverCell>,
    saving: Mutex<()>,
}

impl Book {
    fn new(ctx: Context, file: BookFile, id: i64, info: Metadata, fresh: bool) -> Self {
        Self {
            ctx,
            file,
            id: AtomicI64::new(id),
            info: RwLock::new(info),
            has_bookmark: AtomicBool::new(false),
            dirty: AtomicBool::new(fresh),
            loaded: match fresh {
                true => OnceCell::new_with(Some(())),
                false => OnceCell::new(),
            },
            hyperlinks: Mutex::new(None),
            cover: Mutex::new(CoverCell::default()),
            saving: Mutex::new(()),
        }
    }

    /// Open a book that has not been stored, reading its metadata from the
    /// file.
    ///
    /// The book starts unsaved and dirty. Fails with
    /// [`ExtractorNotFound`](ErrorKind::ExtractorNotFound) if no plugin
    /// handles the file, and with
    /// [`ExtractionFailed`](ErrorKind::ExtractionFailed) if the plugin could
    /// not read it.
    #[instrument(skip_all, fields(path = %file))]
    pub async fn open(ctx: Context, file: BookFile) -> Result<Self> {
        let plugin = plugin_for(&ctx, &file)?;
        let info = extract(&ctx, &plugin, &file).await?;
        debug!(title = info.title(), plugin = plugin.name(), "Extracted book metadata");
        Ok(Self::new(ctx, file, UNSAVED, info, true))
    }

    /// Rebuild a lean book from its stored row.
    ///
    /// Only the row's own columns are read here; lists are loaded on first
    /// access. The book starts clean.
    pub fn rehydrate(ctx: Context, record: BookRecord) -> Result<Self> {
        let file = BookFile::new(ctx.root(), &record.path).or_raise(|| ErrorKind::InvalidPath(record.path.clone()))?;
        let mut info = Metadata::default();
        // Language first, so the title's sort key is derived with it.
        info.set_language(record.language.as_deref());
        info.set_title(record.title.as_deref());
        info.set_encoding(record.encoding.as_deref());
        Ok(Self::new(ctx, file, record.id, info, false))
    }

    pub fn id(&self) -> i64 {
        self.id.load(Ordering::Acquire)
    }

    pub fn file(&self) -> &BookFile {
        &self.file
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::Acquire)
    }

    /// Resolve the plugin for this book's file.
    pub fn plugin(&self) -> Result<PluginHandle> {
        plugin_for(&self.ctx, &self.file)
    }

    fn read(&self) -> RwLockReadGuard<'_, Metadata> {
        self.info.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Metadata> {
        self.info.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply a change-reporting mutation, marking the book dirty if it
    /// reported a change.
    fn edit(&self, f: impl FnOnce(&mut Metadata) -> bool) -> bool {
        let changed = f(&mut self.write());
        if changed {
            self.dirty.store(true, Ordering::Release);
        }
        changed
    }
}

/// Scalars
impl Book {
    /// The title; never empty for a book opened from a file.
    pub fn title(&self) -> String {
        self.read().title().to_string()
    }

    pub fn sort_key(&self) -> String {
        self.read().sort_key().to_string()
    }

    pub fn set_title(&self, title: Option<&str>) -> bool {
        self.edit(|info| info.set_title(title))
    }

    pub fn language(&self) -> Option<String> {
        self.read().language().map(str::to_string)
    }

    pub fn set_language(&self, language: Option<&str>) -> bool {
        self.edit(|info| info.set_language(language))
    }

    /// The stored encoding, without attempting detection.
    pub fn encoding_no_detection(&self) -> Option<String> {
        self.read().encoding().map(str::to_string)
    }

    pub fn set_encoding(&self, encoding: Option<&str>) -> bool {
        self.edit(|info| info.set_encoding(encoding))
    }

    /// The encoding, detected through the plugin if it is unset.
    ///
    /// Detection may also fill in the language. If nothing can be detected
    /// the encoding becomes `utf-8`. Either way the book is marked dirty.
    pub async fn encoding(&self) -> String {
        if let Some(encoding) = self.encoding_no_detection() {
            return encoding;
        }
        let mut probe = Metadata::default();
        probe.set_language(self.language().as_deref());
        match self.plugin() {
            Ok(plugin) => {
                if let Err(err) = plugin.detect_language_and_encoding(&self.file, &mut probe).await {
                    debug!(path = %self.file, error = %err, "Encoding detection failed");
                }
            },
            Err(err) => debug!(path = %self.file, error = %err, "No plugin to detect encoding with"),
        }
        let encoding = probe.encoding().unwrap_or(DEFAULT_ENCODING).to_string();
        self.edit(|info| {
            let language = info.language().is_none() && info.set_language(probe.language());
            info.set_encoding(Some(&encoding)) | language
        });
        encoding
    }

    /// Whether the reader shows a bookmark for this book. Read from the store
    /// along with the lists; see [`authors`](Self::authors).
    pub fn has_bookmark(&self) -> bool {
        self.has_bookmark.load(Ordering::Acquire)
    }

    /// Bookmarks belong to the reader; this flag is never saved.
    pub fn set_has_bookmark(&self, visible: bool) {
        self.has_bookmark.store(visible, Ordering::Release);
    }
}

/// File refresh
impl Book {
    /// Read the metadata from the file again, keeping labels.
    ///
    /// Best effort: if the file cannot be read, the current metadata is kept
    /// and `false` is returned.
    #[instrument(skip(self), fields(book_id = self.id(), path = %self.file))]
    pub async fn reload_from_file(&self) -> bool {
        // Loaded lists would otherwise overwrite the extracted ones later.
        if let Err(err) = self.ensure_loaded().await {
            debug!(error = %err, "Could not load stored lists; not reloading");
            return false;
        }
        let extracted = match self.plugin() {
            Ok(plugin) => extract(&self.ctx, &plugin, &self.file).await,
            Err(err) => Err(err),
        };
        match extracted {
            Ok(info) => {
                self.write().absorb_extracted(info);
                self.dirty.store(true, Ordering::Release);
                true
            },
            Err(err) => {
                debug!(error = %err, "Reload failed; keeping current metadata");
                false
            },
        }
    }

    /// The cover image, decoded on first request.
    ///
    /// A cover that could not be decoded is reported as absent, and stays
    /// absent until [`invalidate_cover`](Self::invalidate_cover).
    pub async fn cover(&self) -> Option<Arc<Cover>> {
        let mut cell = self.cover.lock().await;
        if let Some(cached) = cell.cached() {
            return cached;
        }
        let decoded = match self.plugin() {
            Ok(plugin) => plugin.read_cover(&self.file).await.unwrap_or_else(|err| {
                debug!(path = %self.file, error = %err, "Cover could not be decoded");
                None
            }),
            Err(_) => None,
        };
        cell.resolve(decoded)
    }

    /// Forget the cached cover outcome.
    pub async fn invalidate_cover(&self) {
        *self.cover.lock().await = CoverCell::Unresolved;
    }
}

/// Copying and matching
impl Book {
    /// Copy the state of another in-memory copy of the same stored book.
    ///
    /// Does nothing unless both share the same id. Lists are only copied if
    /// `other` has loaded them. Returns `true` if anything changed.
    pub fn update_from(&self, other: &Book) -> bool {
        if std::ptr::eq(self, other) || self.id() != other.id() {
            return false;
        }
        let theirs = other.read().clone();
        let lists = other.loaded.initialized();
        let changed = self.edit(|info| {
            let mut changed = info.set_language(theirs.language());
            changed |= info.set_title(Some(theirs.title()));
            changed |= info.set_encoding(theirs.encoding());
            let differ = info.authors() != theirs.authors()
                || info.tags() != theirs.tags()
                || info.labels() != theirs.labels()
                || info.series() != theirs.series()
                || info.uids() != theirs.uids();
            if lists && differ {
                info.replace_lists(
                    theirs.authors().to_vec(),
                    theirs.tags().to_vec(),
                    theirs.labels().to_vec(),
                    theirs.series().cloned(),
                    theirs.uids().to_vec(),
                );
                changed = true;
            }
            changed
        });
        if lists {
            // Already set means already loaded; either way the lists are current.
            _ = self.loaded.set(());
        }
        self.set_has_bookmark(other.has_bookmark());
        changed
    }

    /// Case-insensitive search over title, series, authors, tags and then
    /// the file path, stopping at the first hit.
    pub async fn matches(&self, pattern: &str) -> Result<bool> {
        self.ensure_loaded().await?;
        if self.read().matches(pattern) {
            return Ok(true);
        }
        Ok(quire_extract::models::contains_ignore_case(&self.file.long_name(), &pattern.to_lowercase()))
    }
}

fn plugin_for(ctx: &Context, file: &BookFile) -> Result<PluginHandle> {
    ctx.plugins().plugin_for(file).or_raise(|| ErrorKind::ExtractorNotFound(file.path().to_path_buf()))
}

/// Run a full extraction: metadata, then identifiers if none came with it,
/// then the base-name title fallback, then the context's hooks.
async fn extract(ctx: &Context, plugin: &PluginHandle, file: &BookFile) -> Result<Metadata> {
    let mut info = Metadata::default();
    plugin
        .read_metadata(file, &mut info)
        .await
        .or_raise(|| ErrorKind::ExtractionFailed(plugin.name().to_string()))?;
    if info.uids().is_empty() {
        plugin
            .read_uids(file, &mut info)
            .await
            .or_raise(|| ErrorKind::ExtractionFailed(plugin.name().to_string()))?;
    }
    if info.title().is_empty() {
        info.set_title(Some(&file.base_name()));
    }
    ctx.apply_hooks(file, &mut info);
    Ok(info)
}

impl PartialEq for Book {
    fn eq(&self, other: &Self) -> bool {
        self.file == other.file
    }
}
impl Eq for Book {}

impl Hash for Book {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.file.hash(state);
    }
}

impl Display for Book {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "Book[{}, {}]", self.file, self.id())
    }
}

impl Debug for Book {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("Book")
            .field("id", &self.id())
            .field("file", &self.file)
            .field("dirty", &self.is_dirty())
            .field("info", &*self.read())
            .finish_non_exhaustive()
    }
}
