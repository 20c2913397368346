//! Metadata extraction for standalone HTML books.
//!
//! Reads the conventional `<head>` metadata: `<title>`, Dublin Core `dc.*`
//! meta tags, `author`/`keywords`, the Calibre series tags, `<meta charset>`,
//! and a `<link rel="cover">` pointing at an image next to the document.

use crate::consts;
use crate::error::{ErrorKind, Result};
use crate::models::{Cover, Metadata, SeriesIndex, Uid};
use crate::plugin::FormatPlugin;
use async_trait::async_trait;
use exn::ResultExt;
use quire_storage::BookFile;
use scraper::{ElementRef, Html, Selector};
use std::path::Path;
use tracing::instrument;

const EXTENSIONS: [&str; 3] = ["html", "htm", "xhtml"];

/// Plugin for `.html`, `.htm` and `.xhtml` books.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlPlugin;

impl HtmlPlugin {
    async fn read(file: &BookFile) -> Result<Vec<u8>> {
        let bytes = tokio::fs::read(file.full_path()).await.or_raise(|| ErrorKind::Io(file.path().to_path_buf()))?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            exn::bail!(ErrorKind::MalformedDocument);
        }
        Ok(bytes)
    }
}

#[async_trait]
impl FormatPlugin for HtmlPlugin {
    fn name(&self) -> &str {
        "html"
    }

    fn accepts(&self, file: &BookFile) -> bool {
        file.extension().is_some_and(|ext| EXTENSIONS.contains(&ext.as_str()))
    }

    #[instrument(skip_all, fields(path = %file))]
    async fn read_metadata(&self, file: &BookFile, meta: &mut Metadata) -> Result<()> {
        let bytes = Self::read(file).await?;
        Head::parse(&bytes).apply(meta);
        Ok(())
    }

    async fn read_uids(&self, file: &BookFile, meta: &mut Metadata) -> Result<()> {
        let bytes = Self::read(file).await?;
        for uid in Head::parse(&bytes).uids {
            meta.add_uid(uid);
        }
        Ok(())
    }

    async fn detect_language_and_encoding(&self, file: &BookFile, meta: &mut Metadata) -> Result<()> {
        let bytes = Self::read(file).await?;
        let head = Head::parse(&bytes);
        if meta.encoding().is_none() {
            let detected = match head.charset {
                Some(charset) => Some(charset),
                None => std::str::from_utf8(&bytes).is_ok().then(|| "utf-8".to_string()),
            };
            meta.set_encoding(detected.as_deref());
        }
        if meta.language().is_none() {
            meta.set_language(head.language.as_deref());
        }
        Ok(())
    }

    #[instrument(skip_all, fields(path = %file))]
    async fn read_cover(&self, file: &BookFile) -> Result<Option<Cover>> {
        let bytes = Self::read(file).await?;
        let Some(href) = Head::parse(&bytes).cover else {
            return Ok(None);
        };
        let relative = file.path().parent().unwrap_or(Path::new("")).join(&href);
        // Resolving through BookFile keeps the cover inside the library root.
        let image = BookFile::new(file.root(), &relative).or_raise(|| ErrorKind::Io(relative.clone()))?;
        let Some(mime) = image.extension().as_deref().and_then(Cover::mime_for_extension) else {
            tracing::debug!(cover = %image, "Cover link does not point at a known image type");
            return Ok(None);
        };
        let data = tokio::fs::read(image.full_path()).await.or_raise(|| ErrorKind::Io(relative))?;
        Ok(Some(Cover::new(mime, data)))
    }
}

/// Everything this plugin reads out of a document head, gathered in one
/// synchronous pass so the parsed tree never lives across an await.
#[derive(Debug, Default)]
struct Head {
    title: Option<String>,
    charset: Option<String>,
    language: Option<String>,
    authors: Vec<String>,
    tags: Vec<String>,
    series: Option<(String, Option<SeriesIndex>)>,
    uids: Vec<Uid>,
    cover: Option<String>,
}

impl Head {
    fn parse(bytes: &[u8]) -> Self {
        let document = Html::parse_document(&String::from_utf8_lossy(bytes));
        let contents = |selector: &Selector| -> Vec<String> {
            document.select(selector).filter_map(|el| attr(el, "content")).collect()
        };
        Self {
            title: document
                .select(&consts::TITLE_SELECTOR)
                .next()
                .map(|el| el.text().collect::<String>().trim().to_string())
                .filter(|title| !title.is_empty())
                .or_else(|| contents(&consts::DC_TITLE_SELECTOR).into_iter().next()),
            charset: document.select(&consts::CHARSET_SELECTOR).find_map(|el| attr(el, "charset")),
            language: document
                .select(&consts::HTML_SELECTOR)
                .find_map(|el| attr(el, "lang"))
                .or_else(|| contents(&consts::DC_LANGUAGE_SELECTOR).into_iter().next()),
            authors: contents(&consts::AUTHOR_SELECTOR),
            tags: contents(&consts::KEYWORDS_SELECTOR)
                .iter()
                .flat_map(|keywords| keywords.split(',').map(|k| k.trim().to_string()))
                .filter(|k| !k.is_empty())
                .collect(),
            series: contents(&consts::SERIES_SELECTOR).into_iter().next().map(|name| {
                let index = contents(&consts::SERIES_INDEX_SELECTOR).into_iter().find_map(|i| i.parse().ok());
                (name, index)
            }),
            uids: document
                .select(&consts::IDENTIFIER_SELECTOR)
                .filter_map(|el| {
                    let content = attr(el, "content")?;
                    match attr(el, "scheme") {
                        Some(scheme) => Uid::new(&scheme, &content),
                        None => match content.strip_prefix("urn:isbn:") {
                            Some(isbn) => Uid::new("ISBN", isbn),
                            None => Uid::new("URI", &content),
                        },
                    }
                })
                .collect(),
            cover: document.select(&consts::COVER_SELECTOR).find_map(|el| attr(el, "href")),
        }
    }

    fn apply(self, meta: &mut Metadata) {
        meta.set_title(self.title.as_deref());
        meta.set_encoding(self.charset.as_deref());
        meta.set_language(self.language.as_deref());
        for author in &self.authors {
            meta.add_author_name(author, None);
        }
        for tag in &self.tags {
            meta.add_tag_name(tag);
        }
        if let Some((name, index)) = self.series {
            meta.set_series(Some(&name), index);
        }
        for uid in self.uids {
            meta.add_uid(uid);
        }
    }
}

fn attr(element: ElementRef<'_>, name: &str) -> Option<String> {
    element.value().attr(name).map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Author;
    use std::fs;
    use tempfile::TempDir;

    const SAMPLE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="windows-1252">
    <title> Sample </title>
    <meta name="author" content="Jane Q. Public">
    <meta name="DC.creator" content="John Roe">
    <meta name="keywords" content="Fiction/Mystery, Short Stories, ">
    <meta name="calibre:series" content="Casebook">
    <meta name="calibre:series_index" content="2.0">
    <meta name="DC.identifier" scheme="ISBN" content="9780000000002">
    <meta name="dc.identifier" content="urn:isbn:9780000000019">
    <link rel="cover" href="images/cover.png">
</head>
<body><p>Once upon a time.</p></body>
</html>"#;

    fn library(files: &[(&str, &[u8])]) -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        for (path, data) in files {
            let full = dir.path().join(path);
            fs::create_dir_all(full.parent().unwrap()).unwrap();
            fs::write(full, data).unwrap();
        }
        dir
    }

    #[test]
    fn test_accepts_html_extensions() {
        for (path, expected) in [("a.html", true), ("a.HTM", true), ("a.xhtml", true), ("a.epub", false)] {
            let file = BookFile::new("/lib", path).unwrap();
            assert_eq!(HtmlPlugin.accepts(&file), expected, "{path}");
        }
    }

    #[tokio::test]
    async fn test_read_metadata() {
        let dir = library(&[("books/sample.html", SAMPLE.as_bytes())]);
        let file = BookFile::new(dir.path(), "books/sample.html").unwrap();
        let mut meta = Metadata::default();
        HtmlPlugin.read_metadata(&file, &mut meta).await.unwrap();
        assert_eq!(meta.title(), "Sample");
        assert_eq!(meta.encoding(), Some("windows-1252"));
        assert_eq!(meta.language(), Some("en"));
        assert_eq!(meta.authors(), [Author::new("Jane Q. Public", "Public"), Author::new("John Roe", "Roe")]);
        let tags: Vec<_> = meta.tags().iter().map(|t| t.full_name()).collect();
        assert_eq!(tags, ["Fiction/Mystery", "Short Stories"]);
        let series = meta.series().unwrap();
        assert_eq!(series.name, "Casebook");
        assert_eq!(series.index, Some(SeriesIndex::from(2)));
        let uids: Vec<_> = meta.uids().iter().map(|u| u.to_string()).collect();
        assert_eq!(uids, ["ISBN:9780000000002", "ISBN:9780000000019"]);
    }

    #[tokio::test]
    async fn test_read_uids_only() {
        let dir = library(&[("sample.html", SAMPLE.as_bytes())]);
        let file = BookFile::new(dir.path(), "sample.html").unwrap();
        let mut meta = Metadata::default();
        HtmlPlugin.read_uids(&file, &mut meta).await.unwrap();
        assert_eq!(meta.uids().len(), 2);
        assert!(meta.title().is_empty());
        assert!(meta.authors().is_empty());
    }

    #[tokio::test]
    async fn test_detect_encoding_and_language() {
        let html = b"<html lang=\"de\"><head><title>Ohne</title></head></html>";
        let dir = library(&[("plain.html", html.as_slice())]);
        let file = BookFile::new(dir.path(), "plain.html").unwrap();
        let mut meta = Metadata::default();
        HtmlPlugin.detect_language_and_encoding(&file, &mut meta).await.unwrap();
        assert_eq!(meta.encoding(), Some("utf-8"));
        assert_eq!(meta.language(), Some("de"));
    }

    #[tokio::test]
    async fn test_read_cover() {
        let dir = library(&[("books/sample.html", SAMPLE.as_bytes()), ("books/images/cover.png", b"\x89PNG".as_slice())]);
        let file = BookFile::new(dir.path(), "books/sample.html").unwrap();
        let cover = HtmlPlugin.read_cover(&file).await.unwrap().unwrap();
        assert_eq!(cover.mime, "image/png");
        assert_eq!(cover.data, b"\x89PNG");
    }

    #[tokio::test]
    async fn test_cover_absent_without_link() {
        let dir = library(&[("plain.html", b"<html><head><title>T</title></head></html>".as_slice())]);
        let file = BookFile::new(dir.path(), "plain.html").unwrap();
        assert_eq!(HtmlPlugin.read_cover(&file).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_cover_may_not_escape_library() {
        let html = b"<html><head><link rel=\"cover\" href=\"../../etc/cover.png\"></head></html>";
        let dir = library(&[("plain.html", html.as_slice())]);
        let file = BookFile::new(dir.path(), "plain.html").unwrap();
        assert!(HtmlPlugin.read_cover(&file).await.is_err());
    }

    #[tokio::test]
    async fn test_missing_and_empty_files() {
        let dir = library(&[("empty.html", b"  \n".as_slice())]);
        let mut meta = Metadata::default();
        let empty = BookFile::new(dir.path(), "empty.html").unwrap();
        let err = HtmlPlugin.read_metadata(&empty, &mut meta).await.unwrap_err();
        assert_eq!(*err, ErrorKind::MalformedDocument);
        let missing = BookFile::new(dir.path(), "missing.html").unwrap();
        let err = HtmlPlugin.read_metadata(&missing, &mut meta).await.unwrap_err();
        assert!(err.is_retryable());
    }
}
