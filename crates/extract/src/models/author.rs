use std::fmt::{Display, Formatter, Result as FmtResult};

/// A person credited with writing a book.
///
/// Equality covers both fields: "Jane Public" sorted under "Public" and
/// "Jane Public" sorted under "Jane" are different authors.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Author {
    /// Name as shown to the reader
    pub display_name: String,
    /// Key used when ordering authors
    pub sort_key: String,
}

impl Author {
    /// Create an author with an explicit display name and sort key, as they
    /// were stored. No normalization is applied.
    pub fn new(display_name: impl Into<String>, sort_key: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            sort_key: sort_key.into(),
        }
    }

    /// Build an author from user or plugin input.
    ///
    /// Both parts are trimmed. With no sort key, the last space-delimited
    /// token of the name becomes the key and any run of spaces before it is
    /// collapsed, so `"Jane Q.   Public"` becomes `"Jane Q. Public"` sorted
    /// under `"Public"`. Returns `None` if the name is empty after trimming.
    ///
    /// # Examples
    ///
    /// ```
    /// use quire_extract::models::Author;
    /// let author = Author::from_name("  Jane Q. Public ", None).unwrap();
    /// assert_eq!(author.display_name, "Jane Q. Public");
    /// assert_eq!(author.sort_key, "Public");
    /// assert!(Author::from_name("   ", None).is_none());
    /// ```
    pub fn from_name(name: &str, sort_key: Option<&str>) -> Option<Self> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        let sort_key = sort_key.map(str::trim).unwrap_or_default();
        if !sort_key.is_empty() {
            return Some(Self::new(name, sort_key));
        }
        Some(match name.rsplit_once(' ') {
            Some((head, last)) => Self::new(format!("{} {last}", head.trim_end_matches(' ')), last),
            None => Self::new(name, name),
        })
    }
}

impl Display for Author {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.display_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Jane Q. Public", None, "Jane Q. Public", "Public")]
    #[case("  Jane Q. Public  ", None, "Jane Q. Public", "Public")]
    #[case("Jane   Public", None, "Jane Public", "Public")]
    #[case("Homer", None, "Homer", "Homer")]
    #[case("Ursula K. Le Guin", Some("Le Guin"), "Ursula K. Le Guin", "Le Guin")]
    #[case("Ursula K. Le Guin", Some("   "), "Ursula K. Le Guin", "Guin")]
    fn test_from_name(
        #[case] name: &str,
        #[case] sort_key: Option<&str>,
        #[case] display: &str,
        #[case] key: &str,
    ) {
        let author = Author::from_name(name, sort_key).unwrap();
        assert_eq!(author, Author::new(display, key));
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    fn test_empty_name(#[case] name: &str) {
        assert!(Author::from_name(name, Some("key")).is_none());
    }
}
