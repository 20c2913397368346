//! Shared fixtures for the aggregate's tests.

use crate::Context;
use async_trait::async_trait;
use quire_cache::MockStore;
use quire_extract::error::{ErrorKind as ExtractErrorKind, Result as ExtractResult};
use quire_extract::models::{Cover, Metadata, Uid};
use quire_extract::{FormatPlugin, PluginCollection};
use quire_storage::BookFile;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub(crate) const ROOT: &str = "/library";

/// Plugin for `.book` files that hands out canned metadata and counts calls.
#[derive(Default)]
pub(crate) struct StubPlugin {
    pub(crate) metadata: Mutex<Metadata>,
    /// Only returned when identifiers are asked for specifically.
    pub(crate) uids: Vec<Uid>,
    pub(crate) cover: Option<Cover>,
    pub(crate) fail: AtomicBool,
    /// Fails identifier reads only.
    pub(crate) fail_uids: AtomicBool,
    pub(crate) uid_reads: AtomicUsize,
    pub(crate) cover_reads: AtomicUsize,
}

impl StubPlugin {
    /// Title "Sample" by "Jane Q. Public".
    pub(crate) fn sample() -> Self {
        let mut meta = Metadata::default();
        meta.set_title(Some("Sample"));
        meta.add_author_name("Jane Q. Public", None);
        Self { metadata: Mutex::new(meta), ..Self::default() }
    }

    pub(crate) fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn set_failing_uids(&self, fail: bool) {
        self.fail_uids.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn edit(&self, f: impl FnOnce(&mut Metadata)) {
        f(&mut self.metadata.lock().unwrap());
    }

    fn check(&self) -> ExtractResult<()> {
        if self.fail.load(Ordering::SeqCst) {
            exn::bail!(ExtractErrorKind::MalformedDocument);
        }
        Ok(())
    }
}

#[async_trait]
impl FormatPlugin for StubPlugin {
    fn name(&self) -> &str {
        "stub"
    }

    fn accepts(&self, file: &BookFile) -> bool {
        file.extension().as_deref() == Some("book")
    }

    async fn read_metadata(&self, _file: &BookFile, meta: &mut Metadata) -> ExtractResult<()> {
        self.check()?;
        let canned = self.metadata.lock().unwrap().clone();
        meta.absorb_extracted(canned);
        Ok(())
    }

    async fn read_uids(&self, _file: &BookFile, meta: &mut Metadata) -> ExtractResult<()> {
        self.uid_reads.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        if self.fail_uids.load(Ordering::SeqCst) {
            exn::bail!(ExtractErrorKind::MalformedDocument);
        }
        for uid in &self.uids {
            meta.add_uid(uid.clone());
        }
        Ok(())
    }

    async fn read_cover(&self, _file: &BookFile) -> ExtractResult<Option<Cover>> {
        self.cover_reads.fetch_add(1, Ordering::SeqCst);
        // Give concurrent lookups a chance to pile up behind the cover lock.
        tokio::task::yield_now().await;
        self.check()?;
        Ok(self.cover.clone())
    }
}

pub(crate) struct Fixture {
    pub(crate) store: MockStore,
    pub(crate) plugin: Arc<StubPlugin>,
    pub(crate) ctx: Context,
}

pub(crate) fn fixture(plugin: StubPlugin) -> Fixture {
    let store = MockStore::default();
    let plugin = Arc::new(plugin);
    let plugins = PluginCollection::default().with(plugin.clone());
    let ctx = Context::new(Arc::new(store.clone()), plugins, ROOT);
    Fixture { store, plugin, ctx }
}

pub(crate) fn file(path: &str) -> BookFile {
    BookFile::new(ROOT, path).unwrap()
}
