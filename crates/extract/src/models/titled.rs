use crate::consts;
use regex::Regex;

/// A title paired with the key it sorts under.
///
/// The sort key is derived, never set directly: it is recomputed whenever the
/// title changes, and [`recompute`](Self::recompute) must be called when the
/// language used to derive it changes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Titled {
    title: Option<String>,
    sort_key: String,
}

impl Titled {
    /// The title, or an empty string if none is set.
    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.title().is_empty()
    }

    pub fn sort_key(&self) -> &str {
        &self.sort_key
    }

    /// Set the title; returns `true` if the observable title changed.
    ///
    /// `None` and `Some("")` are the same observable title.
    pub fn set(&mut self, title: Option<&str>, language: Option<&str>) -> bool {
        if self.title() == title.unwrap_or_default() {
            return false;
        }
        self.title = title.map(str::to_string);
        self.recompute(language);
        true
    }

    /// Derive the sort key again from the current title.
    pub fn recompute(&mut self, language: Option<&str>) {
        let lowered = self.title().trim().to_lowercase();
        let key = {
            let stripped = consts::LEADING_PUNCTUATION.replace(&lowered, "");
            match article_for(language) {
                Some(article) => article.replace(&stripped, "").into_owned(),
                None => stripped.into_owned(),
            }
        };
        // A title made only of an article ("The") keeps it.
        self.sort_key = match key.is_empty() {
            true => lowered,
            false => key,
        };
    }
}

fn article_for(language: Option<&str>) -> Option<&'static Regex> {
    let primary = language.unwrap_or("en").split(['-', '_']).next().unwrap_or_default();
    Some(match primary.to_ascii_lowercase().as_str() {
        "en" | "" => &consts::ARTICLE_EN,
        "fr" => &consts::ARTICLE_FR,
        "de" => &consts::ARTICLE_DE,
        "es" => &consts::ARTICLE_ES,
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("The Left Hand of Darkness", None, "left hand of darkness")]
    #[case("A Wizard of Earthsea", Some("en-GB"), "wizard of earthsea")]
    #[case("...And Then There Were None", Some("en"), "and then there were none")]
    #[case("L'Étranger", Some("fr"), "étranger")]
    #[case("Les Misérables", Some("fr"), "misérables")]
    #[case("Der Process", Some("de"), "process")]
    #[case("The Trial", Some("ru"), "the trial")]
    #[case("The", None, "the")]
    fn test_sort_key(#[case] title: &str, #[case] language: Option<&str>, #[case] expected: &str) {
        let mut titled = Titled::default();
        titled.set(Some(title), language);
        assert_eq!(titled.sort_key(), expected);
    }

    #[test]
    fn test_set_reports_change() {
        let mut titled = Titled::default();
        assert!(!titled.set(None, None));
        assert!(!titled.set(Some(""), None));
        assert!(titled.set(Some("Dune"), None));
        assert!(!titled.set(Some("Dune"), None));
        assert!(titled.set(None, None));
        assert!(titled.is_empty());
    }

    #[test]
    fn test_recompute_on_language_change() {
        let mut titled = Titled::default();
        titled.set(Some("Die Verwandlung"), Some("en"));
        assert_eq!(titled.sort_key(), "die verwandlung");
        titled.recompute(Some("de"));
        assert_eq!(titled.sort_key(), "verwandlung");
    }
}
