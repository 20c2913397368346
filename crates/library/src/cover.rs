use quire_extract::models::Cover;
use std::sync::{Arc, Weak};

/// What is known about a book's cover.
///
/// A present cover is held weakly: once every caller has dropped it, the
/// next lookup decodes it again.
#[derive(Debug, Default)]
pub(crate) enum CoverCell {
    #[default]
    Unresolved,
    Absent,
    Present(Weak<Cover>),
}

impl CoverCell {
    /// The cached outcome, or `None` if the plugin has to be asked (again).
    pub(crate) fn cached(&self) -> Option<Option<Arc<Cover>>> {
        match self {
            Self::Unresolved => None,
            Self::Absent => Some(None),
            Self::Present(cover) => cover.upgrade().map(Some),
        }
    }

    /// Record a lookup outcome and hand it back.
    pub(crate) fn resolve(&mut self, cover: Option<Cover>) -> Option<Arc<Cover>> {
        match cover {
            Some(cover) => {
                let cover = Arc::new(cover);
                *self = Self::Present(Arc::downgrade(&cover));
                Some(cover)
            },
            None => {
                *self = Self::Absent;
                None
            },
        }
    }
}
