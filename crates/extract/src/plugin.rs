//! Format plugins: the bridge between book files and their metadata.

use crate::error::{ErrorKind, Result};
use crate::models::{Cover, Metadata};
use async_trait::async_trait;
use quire_storage::BookFile;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;

pub type PluginHandle = Arc<dyn FormatPlugin + Send + Sync>;

/// Reads metadata out of one family of book file formats.
///
/// Plugins write into a [`Metadata`] through its checked mutators, so they
/// never need to deduplicate anything themselves. They are free to leave
/// fields untouched when the file carries no such information.
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use quire_extract::error::Result;
/// use quire_extract::models::{Cover, Metadata};
/// use quire_extract::FormatPlugin;
/// use quire_storage::BookFile;
///
/// struct PlainText;
///
/// #[async_trait]
/// impl FormatPlugin for PlainText {
///     fn name(&self) -> &str {
///         "txt"
///     }
///     fn accepts(&self, file: &BookFile) -> bool {
///         file.extension().as_deref() == Some("txt")
///     }
///     async fn read_metadata(&self, _file: &BookFile, meta: &mut Metadata) -> Result<()> {
///         meta.set_encoding(Some("utf-8"));
///         Ok(())
///     }
///     async fn read_uids(&self, _file: &BookFile, _meta: &mut Metadata) -> Result<()> {
///         Ok(())
///     }
///     async fn read_cover(&self, _file: &BookFile) -> Result<Option<Cover>> {
///         Ok(None)
///     }
/// }
/// ```
#[async_trait]
pub trait FormatPlugin: Send + Sync {
    /// Short, unique plugin name (used for logging and error reports).
    fn name(&self) -> &str;

    /// Whether this plugin understands the given file.
    fn accepts(&self, file: &BookFile) -> bool;

    /// Populate title, encoding, language, authors, tags and series; and
    /// identifiers too, if they come cheaply with the rest.
    async fn read_metadata(&self, file: &BookFile, meta: &mut Metadata) -> Result<()>;

    /// Populate external identifiers only. Called when
    /// [`read_metadata`](Self::read_metadata) produced none, since some
    /// formats only expose identifiers when asked for them specifically.
    async fn read_uids(&self, file: &BookFile, meta: &mut Metadata) -> Result<()>;

    /// Fill in the encoding and language if they are unset. The default
    /// implementation detects nothing.
    async fn detect_language_and_encoding(&self, _file: &BookFile, _meta: &mut Metadata) -> Result<()> {
        Ok(())
    }

    /// Decode the cover image, or report that the file has none.
    async fn read_cover(&self, file: &BookFile) -> Result<Option<Cover>>;
}

/// The set of known plugins, consulted in registration order.
#[derive(Clone, Default)]
pub struct PluginCollection {
    plugins: Vec<PluginHandle>,
}

impl PluginCollection {
    /// A collection holding every plugin that ships with this crate.
    pub fn builtin() -> Self {
        Self::default().with(Arc::new(crate::HtmlPlugin))
    }

    /// Add a plugin; it is consulted after all previously added ones.
    pub fn with(mut self, plugin: PluginHandle) -> Self {
        self.plugins.push(plugin);
        self
    }

    /// Resolve the first plugin that accepts `file`.
    ///
    /// Fails with [`ExtractorNotFound`](ErrorKind::ExtractorNotFound) if no
    /// plugin does.
    pub fn plugin_for(&self, file: &BookFile) -> Result<PluginHandle> {
        match self.plugins.iter().find(|plugin| plugin.accepts(file)) {
            Some(plugin) => Ok(Arc::clone(plugin)),
            None => exn::bail!(ErrorKind::ExtractorNotFound(file.path().to_path_buf())),
        }
    }
}

impl Debug for PluginCollection {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_list().entries(self.plugins.iter().map(|plugin| plugin.name())).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Named(&'static str, &'static str);

    #[async_trait]
    impl FormatPlugin for Named {
        fn name(&self) -> &str {
            self.0
        }
        fn accepts(&self, file: &BookFile) -> bool {
            file.extension().as_deref() == Some(self.1)
        }
        async fn read_metadata(&self, _file: &BookFile, _meta: &mut Metadata) -> Result<()> {
            Ok(())
        }
        async fn read_uids(&self, _file: &BookFile, _meta: &mut Metadata) -> Result<()> {
            Ok(())
        }
        async fn read_cover(&self, _file: &BookFile) -> Result<Option<Cover>> {
            Ok(None)
        }
    }

    #[test]
    fn test_resolves_first_accepting_plugin() {
        let plugins = PluginCollection::default()
            .with(Arc::new(Named("first", "epub")))
            .with(Arc::new(Named("second", "epub")))
            .with(Arc::new(Named("third", "fb2")));
        let epub = BookFile::new("/lib", "a.epub").unwrap();
        let fb2 = BookFile::new("/lib", "b.fb2").unwrap();
        assert_eq!(plugins.plugin_for(&epub).unwrap().name(), "first");
        assert_eq!(plugins.plugin_for(&fb2).unwrap().name(), "third");
    }

    #[test]
    fn test_extractor_not_found() {
        let plugins = PluginCollection::builtin();
        let file = BookFile::new("/lib", "scan.pdf").unwrap();
        let Err(err) = plugins.plugin_for(&file) else {
            panic!("no plugin should accept a PDF");
        };
        assert_eq!(*err, ErrorKind::ExtractorNotFound("scan.pdf".into()));
    }

    #[test]
    fn test_debug_lists_plugin_names() {
        assert_eq!(format!("{:?}", PluginCollection::builtin()), r#"["html"]"#);
    }
}
