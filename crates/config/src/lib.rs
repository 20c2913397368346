//! Layered configuration for quire.
//!
//! Values are merged from, lowest priority first: built-in defaults, a config
//! file, and `QUIRE_`-prefixed environment variables with nested keys split
//! on `__` (so `QUIRE_DATABASE__PATH` sets `database.path`).
//!
//! The config file is either named explicitly or found as `config.toml` in
//! the platform's config directory. Files ending in `.yaml`, `.yml` or
//! `.json` are read in that format; anything else is read as TOML.

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

const ENV_PREFIX: &str = "QUIRE_";
const CONFIG_FILE: &str = "config.toml";
const DATABASE_FILE: &str = "library.db";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub library: LibraryConfig,
    pub database: DatabaseConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LibraryConfig {
    /// Directory every book path is relative to.
    pub root: PathBuf,
    /// Directory (relative to the root) holding demo content. Empty to
    /// disable demo marking.
    pub demo_dir: PathBuf,
    /// Appended to demo titles and added as a tag.
    pub demo_label: String,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            demo_dir: PathBuf::from("Demos"),
            demo_label: "demo".to_string(),
        }
    }
}

impl LibraryConfig {
    pub fn demo_dir(&self) -> Option<&Path> {
        Some(self.demo_dir.as_path()).filter(|dir| !dir.as_os_str().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: PathBuf,
    /// Pool size; the database's own default when unset.
    pub max_connections: Option<u32>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        let path = match project_dirs() {
            Some(dirs) => dirs.data_dir().join(DATABASE_FILE),
            None => PathBuf::from(DATABASE_FILE),
        };
        Self { path, max_connections: None }
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "quire")
}

impl Config {
    /// Load and validate the configuration, reading `path` if given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::from_figment(Self::figment(path)?)
    }

    /// The layered sources, unmerged.
    ///
    /// Fails with [`NotFound`](ErrorKind::NotFound) if `path` is given but
    /// does not exist; the default location is skipped if it has no file.
    pub fn figment(path: Option<&Path>) -> Result<Figment> {
        let file = match path {
            Some(path) if !path.is_file() => exn::bail!(ErrorKind::NotFound(path.to_path_buf())),
            Some(path) => Some(path.to_path_buf()),
            None => project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE)).filter(|file| file.is_file()),
        };
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(file) = file {
            debug!(path = %file.display(), "Reading config file");
            figment = merge_file(figment, &file);
        }
        Ok(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: Self = figment.extract().or_raise(|| ErrorKind::Load)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.library.root.as_os_str().is_empty() {
            exn::bail!(ErrorKind::Invalid("library.root must not be empty"));
        }
        if self.library.demo_dir().is_some() && self.library.demo_label.trim().is_empty() {
            exn::bail!(ErrorKind::Invalid("library.demo_label must not be empty"));
        }
        if self.database.path.as_os_str().is_empty() {
            exn::bail!(ErrorKind::Invalid("database.path must not be empty"));
        }
        if self.database.max_connections == Some(0) {
            exn::bail!(ErrorKind::Invalid("database.max_connections must be positive"));
        }
        Ok(())
    }
}

fn merge_file(figment: Figment, file: &Path) -> Figment {
    let extension = file.extension().map(|ext| ext.to_string_lossy().to_lowercase());
    match extension.as_deref() {
        Some("yaml" | "yml") => figment.merge(Yaml::file(file)),
        Some("json") => figment.merge(Json::file(file)),
        _ => figment.merge(Toml::file(file)),
    }
}
