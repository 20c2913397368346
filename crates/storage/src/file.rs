use crate::error::Result;
use crate::path::validate;
use std::borrow::Cow;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::{Path, PathBuf};

/// The file backing a book.
///
/// Holds the library root and a validated path relative to it. Equality and
/// hashing cover both, so the same relative path under two different library
/// roots names two different books.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BookFile {
    root: PathBuf,
    path: PathBuf,
}

impl BookFile {
    /// Create a file identity for `path` inside the library at `root`.
    ///
    /// Returns [`InvalidPath`](crate::error::ErrorKind::InvalidPath) if the
    /// path is empty or escapes the library root.
    pub fn new(root: impl Into<PathBuf>, path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self {
            root: root.into(),
            path: validate(path)?,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path relative to the library root; this is what gets persisted.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Location on disk, for plugins that need to read the file.
    pub fn full_path(&self) -> PathBuf {
        self.root.join(&self.path)
    }

    /// The file name without any directories (e.g. `dune.epub`).
    pub fn short_name(&self) -> Cow<'_, str> {
        self.path.file_name().map(|name| name.to_string_lossy()).unwrap_or_default()
    }

    /// The full display path, relative to the library root.
    pub fn long_name(&self) -> Cow<'_, str> {
        self.path.to_string_lossy()
    }

    /// The short name with its last extension removed.
    ///
    /// Dot-files keep their name: `.hidden` stays `.hidden`.
    pub fn base_name(&self) -> String {
        let name = self.short_name();
        match name.rfind('.') {
            Some(index) if index > 0 => name[..index].to_string(),
            _ => name.into_owned(),
        }
    }

    /// Lowercase extension, if any.
    pub fn extension(&self) -> Option<String> {
        self.path.extension().map(|ext| ext.to_string_lossy().to_lowercase())
    }

    /// Returns `true` if the file sits somewhere below `prefix` (relative to
    /// the library root).
    pub fn is_under(&self, prefix: impl AsRef<Path>) -> bool {
        let prefix = prefix.as_ref();
        self.path.starts_with(prefix) && self.path != prefix
    }
}

impl Display for BookFile {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.path.display())
    }
}
