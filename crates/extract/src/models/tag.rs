use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// Separator between the segments of a hierarchical tag.
pub const TAG_SEPARATOR: char = '/';

/// A hierarchical tag, such as `Fiction/Science Fiction/Space Opera`.
///
/// Always holds at least one segment, and no segment is empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Tag {
    segments: Vec<String>,
}

impl Tag {
    /// Build a tag from its segments, root first. Segments are trimmed and
    /// empty ones dropped; returns `None` if nothing is left.
    pub fn from_segments<S: AsRef<str>>(segments: impl IntoIterator<Item = S>) -> Option<Self> {
        let segments: Vec<String> = segments
            .into_iter()
            .flat_map(|s| s.as_ref().split(TAG_SEPARATOR).map(|p| p.trim().to_string()).collect::<Vec<_>>())
            .filter(|s| !s.is_empty())
            .collect();
        (!segments.is_empty()).then_some(Self { segments })
    }

    /// Parse a `/`-separated tag path.
    pub fn parse(path: &str) -> Option<Self> {
        Self::from_segments([path])
    }

    /// The leaf segment.
    pub fn name(&self) -> &str {
        // Construction guarantees at least one segment.
        self.segments.last().map(String::as_str).unwrap_or_default()
    }

    /// The parent tag, if this is not a root tag.
    pub fn parent(&self) -> Option<Self> {
        let (_, parent) = self.segments.split_last()?;
        (!parent.is_empty()).then(|| Self { segments: parent.to_vec() })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// All segments joined with [`TAG_SEPARATOR`]; this is the persisted form.
    pub fn full_name(&self) -> String {
        self.segments.join(&TAG_SEPARATOR.to_string())
    }
}

impl FromStr for Tag {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or(())
    }
}

impl Display for Tag {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.full_name())
    }
}
