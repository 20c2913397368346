//! Library-relative path validation.

use std::path::{Component, Path, PathBuf};

use crate::error::{ErrorKind, Result};

/// Validates a book path relative to the library root.
///
/// Parent references are resolved lexically, and a path that would climb out
/// of the library root is rejected, as are empty paths, null bytes and
/// platform prefixes. Leading root separators are dropped so that `/a/b` and
/// `a/b` name the same book.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use quire_storage::validate_path;
/// assert!(validate_path("Fiction/dune.epub").is_ok());
/// assert!(validate_path("../outside.epub").is_err());
/// assert_eq!(
///     validate_path("Fiction/./../Demos//intro.html").unwrap(),
///     Path::new("Demos/intro.html")
/// );
/// ```
pub fn validate(path: impl AsRef<Path>) -> Result<PathBuf> {
    let original = path.as_ref();
    let invalid = || ErrorKind::InvalidPath(original.to_path_buf());
    let mut components = Vec::new();
    for component in original.components() {
        match component {
            Component::Normal(segment) => {
                // Null bytes survive Path::components() on Unix.
                if segment.as_encoded_bytes().contains(&0) {
                    exn::bail!(invalid());
                }
                components.push(segment);
            },
            Component::CurDir | Component::RootDir => {},
            Component::Prefix(_) => exn::bail!(invalid()),
            Component::ParentDir => {
                if components.pop().is_none() {
                    exn::bail!(invalid());
                }
            },
        }
    }
    if components.is_empty() {
        exn::bail!(invalid());
    }
    Ok(components.into_iter().collect())
}
