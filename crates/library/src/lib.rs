//! The book aggregate and the library facade over it.
//!
//! A [`Context`] wires a [`BookStore`](quire_cache::BookStore), the format
//! plugins and any [`MetadataHook`]s together; a [`Library`] uses it to open
//! [`Book`]s by id or by file.

mod book;
mod context;
mod cover;
pub mod error;
mod library;
#[cfg(test)]
mod testing;

pub use crate::book::{Book, UNSAVED};
pub use crate::context::{Context, DemoContent, MetadataHook};
pub use crate::library::Library;
