use super::{Author, SeriesIndex, SeriesInfo, Tag, Titled, Uid};

/// Well-known label for books the reader marked as favourites.
pub const FAVORITE_LABEL: &str = "favorite";
/// Well-known label for books the reader has finished.
pub const READ_LABEL: &str = "read";

/// The metadata fields of a book.
///
/// Plugins fill one of these in during extraction, and the book aggregate
/// keeps one as its current state. Every list is an ordered sequence with set
/// semantics: inserts are membership-checked and keep first-insertion order.
///
/// Every mutator returns `true` only if it changed something observable,
/// which is what the owning book uses to maintain its dirty flag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    titled: Titled,
    encoding: Option<String>,
    language: Option<String>,
    authors: Vec<Author>,
    tags: Vec<Tag>,
    labels: Vec<String>,
    series: Option<SeriesInfo>,
    uids: Vec<Uid>,
}

/// Scalars
impl Metadata {
    pub fn title(&self) -> &str {
        self.titled.title()
    }

    pub fn sort_key(&self) -> &str {
        self.titled.sort_key()
    }

    pub fn set_title(&mut self, title: Option<&str>) -> bool {
        self.titled.set(title, self.language.as_deref())
    }

    pub fn encoding(&self) -> Option<&str> {
        self.encoding.as_deref()
    }

    pub fn set_encoding(&mut self, encoding: Option<&str>) -> bool {
        if self.encoding.as_deref() == encoding {
            return false;
        }
        self.encoding = encoding.map(str::to_string);
        true
    }

    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    /// Set the language, re-deriving the title's sort key.
    pub fn set_language(&mut self, language: Option<&str>) -> bool {
        if self.language.as_deref() == language {
            return false;
        }
        self.language = language.map(str::to_string);
        self.titled.recompute(language);
        true
    }
}

/// Authors
impl Metadata {
    pub fn authors(&self) -> &[Author] {
        &self.authors
    }

    pub fn add_author(&mut self, author: Author) -> bool {
        push_unique(&mut self.authors, author)
    }

    /// Normalize and add an author; see [`Author::from_name`].
    pub fn add_author_name(&mut self, name: &str, sort_key: Option<&str>) -> bool {
        Author::from_name(name, sort_key).is_some_and(|author| self.add_author(author))
    }

    pub fn remove_all_authors(&mut self) -> bool {
        clear(&mut self.authors)
    }
}

/// Tags
impl Metadata {
    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    pub fn add_tag(&mut self, tag: Tag) -> bool {
        push_unique(&mut self.tags, tag)
    }

    /// Parse and add a `/`-separated tag; blank names are ignored.
    pub fn add_tag_name(&mut self, name: &str) -> bool {
        Tag::parse(name).is_some_and(|tag| self.add_tag(tag))
    }

    pub fn remove_all_tags(&mut self) -> bool {
        clear(&mut self.tags)
    }
}

/// Labels
impl Metadata {
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn add_label(&mut self, label: &str) -> bool {
        if self.labels.iter().any(|l| l == label) {
            return false;
        }
        self.labels.push(label.to_string());
        true
    }

    pub fn remove_label(&mut self, label: &str) -> bool {
        let before = self.labels.len();
        self.labels.retain(|l| l != label);
        self.labels.len() != before
    }
}

/// Series
impl Metadata {
    pub fn series(&self) -> Option<&SeriesInfo> {
        self.series.as_ref()
    }

    /// Assign the series. A `None` name means "no series", whatever the index.
    pub fn set_series(&mut self, name: Option<&str>, index: Option<SeriesIndex>) -> bool {
        let next = name.map(|name| SeriesInfo::new(name, index));
        if self.series == next {
            return false;
        }
        self.series = next;
        true
    }
}

/// Identifiers
impl Metadata {
    pub fn uids(&self) -> &[Uid] {
        &self.uids
    }

    pub fn add_uid(&mut self, uid: Uid) -> bool {
        push_unique(&mut self.uids, uid)
    }

    /// Add an identifier from raw parts; blank parts are ignored.
    pub fn add_uid_parts(&mut self, kind: &str, id: &str) -> bool {
        Uid::new(kind, id).is_some_and(|uid| self.add_uid(uid))
    }

    pub fn remove_all_uids(&mut self) -> bool {
        clear(&mut self.uids)
    }
}

/// Bulk replacement, used when state comes from a trusted source (the store,
/// or a completed extraction) rather than through the checked mutators.
impl Metadata {
    /// Replace every list field at once. Duplicates are dropped, keeping
    /// first occurrences.
    pub fn replace_lists(
        &mut self,
        authors: Vec<Author>,
        tags: Vec<Tag>,
        labels: Vec<String>,
        series: Option<SeriesInfo>,
        uids: Vec<Uid>,
    ) {
        self.authors = dedup(authors);
        self.tags = dedup(tags);
        self.labels = dedup(labels);
        self.series = series;
        self.uids = dedup(uids);
    }

    /// Take every extracted field from `other`, keeping this value's labels
    /// (labels are user state, never extracted).
    pub fn absorb_extracted(&mut self, other: Metadata) {
        let labels = std::mem::take(&mut self.labels);
        *self = Self { labels, ..other };
    }

    /// Returns `true` if the title, series name, or any author or tag name
    /// contains `pattern`, ignoring case. Fields are checked in that order.
    pub fn matches(&self, pattern: &str) -> bool {
        let pattern = pattern.to_lowercase();
        contains_ignore_case(self.title(), &pattern)
            || self.series.as_ref().is_some_and(|s| contains_ignore_case(&s.name, &pattern))
            || self.authors.iter().any(|a| contains_ignore_case(&a.display_name, &pattern))
            || self.tags.iter().any(|t| contains_ignore_case(t.name(), &pattern))
    }
}

/// Case-insensitive containment; `lowered_pattern` must already be lowercase.
pub fn contains_ignore_case(text: &str, lowered_pattern: &str) -> bool {
    text.to_lowercase().contains(lowered_pattern)
}

fn push_unique<T: PartialEq>(list: &mut Vec<T>, item: T) -> bool {
    if list.contains(&item) {
        return false;
    }
    list.push(item);
    true
}

fn clear<T>(list: &mut Vec<T>) -> bool {
    let changed = !list.is_empty();
    list.clear();
    changed
}

fn dedup<T: PartialEq>(items: Vec<T>) -> Vec<T> {
    let mut unique = Vec::with_capacity(items.len());
    for item in items {
        push_unique(&mut unique, item);
    }
    unique
}
