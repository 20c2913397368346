use quire_cache::StoreHandle;
use quire_extract::PluginCollection;
use quire_extract::models::Metadata;
use quire_storage::BookFile;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Adjusts freshly extracted metadata before a book sees it.
///
/// Hooks run after extraction (and after the base-name title fallback) on
/// both fresh construction and reload, in registration order.
pub trait MetadataHook: Send + Sync {
    fn apply(&self, file: &BookFile, meta: &mut Metadata);
}

/// Marks books that live in the library's demo directory: the demo label is
/// appended to the title and added as a tag.
#[derive(Debug, Clone)]
pub struct DemoContent {
    dir: PathBuf,
    label: String,
}

impl DemoContent {
    pub fn new(dir: impl Into<PathBuf>, label: impl Into<String>) -> Self {
        Self { dir: dir.into(), label: label.into() }
    }
}

impl MetadataHook for DemoContent {
    fn apply(&self, file: &BookFile, meta: &mut Metadata) {
        if !file.is_under(&self.dir) {
            return;
        }
        let title = format!("{} ({})", meta.title(), self.label);
        meta.set_title(Some(&title));
        meta.add_tag_name(&self.label);
    }
}

/// Everything a book needs to reach its collaborators.
///
/// Cheap to clone; every book holds its own copy.
#[derive(Clone)]
pub struct Context {
    store: StoreHandle,
    plugins: Arc<PluginCollection>,
    root: PathBuf,
    hooks: Vec<Arc<dyn MetadataHook>>,
}

impl Context {
    pub fn new(store: StoreHandle, plugins: PluginCollection, root: impl Into<PathBuf>) -> Self {
        Self { store, plugins: Arc::new(plugins), root: root.into(), hooks: Vec::new() }
    }

    pub fn with_hook(mut self, hook: impl MetadataHook + 'static) -> Self {
        self.hooks.push(Arc::new(hook));
        self
    }

    pub fn store(&self) -> &StoreHandle {
        &self.store
    }

    pub fn plugins(&self) -> &PluginCollection {
        &self.plugins
    }

    /// Library root every book path is relative to.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub(crate) fn apply_hooks(&self, file: &BookFile, meta: &mut Metadata) {
        for hook in &self.hooks {
            hook.apply(file, meta);
        }
    }
}

impl Debug for Context {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("Context")
            .field("root", &self.root)
            .field("plugins", &self.plugins)
            .field("hooks", &self.hooks.len())
            .finish_non_exhaustive()
    }
}
