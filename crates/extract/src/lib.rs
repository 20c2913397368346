//! Book metadata value types, and the format plugins that read them out of
//! book files.
//!
//! Plugins are resolved per file through a [`PluginCollection`]; each one
//! fills in a [`Metadata`](models::Metadata) using its checked mutators.

mod consts;
pub mod error;
mod html;
pub mod models;
mod plugin;

pub use crate::html::HtmlPlugin;
pub use crate::plugin::{FormatPlugin, PluginCollection, PluginHandle};
