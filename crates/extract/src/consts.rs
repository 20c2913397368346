use regex::Regex;
use scraper::Selector;
use std::sync::LazyLock;

macro_rules! selector {
    ($name:ident, $css:expr) => {
        pub(crate) static $name: LazyLock<Selector> = LazyLock::new(|| Selector::parse($css).unwrap());
    };
}

macro_rules! regex {
    ($name:ident, $regex:expr) => {
        pub(crate) static $name: LazyLock<Regex> = LazyLock::new(|| Regex::new($regex).unwrap());
    };
}

// Leading articles dropped from sort keys, per language.
regex!(ARTICLE_EN, r"^(?:the|a|an)\s+");
regex!(ARTICLE_FR, r"^(?:(?:le|la|les)\s+|l'\s*)");
regex!(ARTICLE_DE, r"^(?:der|die|das)\s+");
regex!(ARTICLE_ES, r"^(?:el|la|los|las)\s+");
regex!(LEADING_PUNCTUATION, r"^[\p{P}\s]+");

selector!(HTML_SELECTOR, "html");
selector!(TITLE_SELECTOR, "head > title");
selector!(DC_TITLE_SELECTOR, r#"meta[name="dc.title" i][content]"#);
selector!(AUTHOR_SELECTOR, r#"meta[name="author" i][content], meta[name="dc.creator" i][content]"#);
selector!(KEYWORDS_SELECTOR, r#"meta[name="keywords" i][content], meta[name="dc.subject" i][content]"#);
selector!(DC_LANGUAGE_SELECTOR, r#"meta[name="dc.language" i][content]"#);
selector!(CHARSET_SELECTOR, "meta[charset]");
selector!(SERIES_SELECTOR, r#"meta[name="calibre:series" i][content]"#);
selector!(SERIES_INDEX_SELECTOR, r#"meta[name="calibre:series_index" i][content]"#);
selector!(IDENTIFIER_SELECTOR, r#"meta[name="dc.identifier" i][content]"#);
selector!(COVER_SELECTOR, r#"link[rel="cover" i][href]"#);
