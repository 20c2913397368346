use std::cmp::Ordering;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// A book's position within a series, such as `3` or `2.5`.
///
/// Stored in a normalized decimal form (no sign, no leading zeros in the
/// integer part, no trailing zeros in the fraction) so that `"02.50"` and
/// `"2.5"` compare and hash equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SeriesIndex(String);

impl SeriesIndex {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn parts(&self) -> (&str, &str) {
        self.0.split_once('.').unwrap_or((&self.0, ""))
    }
}

impl FromStr for SeriesIndex {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (int, frac) = s.split_once('.').unwrap_or((s, ""));
        let digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if (int.is_empty() && frac.is_empty()) || !digits(int) || !digits(frac) {
            return Err(());
        }
        let int = match int.trim_start_matches('0') {
            "" => "0",
            trimmed => trimmed,
        };
        Ok(Self(match frac.trim_end_matches('0') {
            "" => int.to_string(),
            frac => format!("{int}.{frac}"),
        }))
    }
}

impl From<u32> for SeriesIndex {
    fn from(value: u32) -> Self {
        Self(value.to_string())
    }
}

impl Ord for SeriesIndex {
    fn cmp(&self, other: &Self) -> Ordering {
        let (a_int, a_frac) = self.parts();
        let (b_int, b_frac) = other.parts();
        a_int
            .len()
            .cmp(&b_int.len())
            .then_with(|| a_int.cmp(b_int))
            .then_with(|| a_frac.cmp(b_frac))
    }
}
impl PartialOrd for SeriesIndex {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Display for SeriesIndex {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}

/// Series membership: a series name plus an optional position in it.
///
/// A book without a series has no `SeriesInfo` at all; there is no such
/// thing as an index without a name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SeriesInfo {
    pub name: String,
    pub index: Option<SeriesIndex>,
}

impl SeriesInfo {
    pub fn new(name: impl Into<String>, index: Option<SeriesIndex>) -> Self {
        Self { name: name.into(), index }
    }
}

impl Display for SeriesInfo {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match &self.index {
            Some(index) => write!(f, "{} #{index}", self.name),
            None => write!(f, "{}", self.name),
        }
    }
}
