use std::fmt::{Display, Formatter, Result as FmtResult};

/// An external identifier for a book, such as an ISBN or a catalog number.
///
/// Distinct from the store's internal row id: a book may carry any number of
/// these, each tagged with the scheme it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Uid {
    /// Identifier scheme (e.g. `ISBN`, `URI`, `calibre`)
    pub kind: String,
    pub id: String,
}

impl Uid {
    /// Build an identifier from untrusted input. Both parts are trimmed;
    /// returns `None` if either is then empty.
    pub fn new(kind: &str, id: &str) -> Option<Self> {
        let (kind, id) = (kind.trim(), id.trim());
        (!kind.is_empty() && !id.is_empty()).then(|| Self {
            kind: kind.to_string(),
            id: id.to_string(),
        })
    }
}

impl Display for Uid {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}:{}", self.kind, self.id)
    }
}
