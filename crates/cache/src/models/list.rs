use crate::error::{Error, ErrorKind, Result};
use exn::OptionExt;
use quire_extract::models::{Author, SeriesIndex, SeriesInfo, Tag, Uid};

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct AuthorRow {
    display_name: String,
    sort_key: String,
}

impl From<AuthorRow> for Author {
    fn from(row: AuthorRow) -> Self {
        Author::new(row.display_name, row.sort_key)
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct SeriesRow {
    name: String,
    series_index: Option<String>,
}

impl TryFrom<SeriesRow> for SeriesInfo {
    type Error = Error;
    fn try_from(row: SeriesRow) -> Result<Self> {
        let index = match row.series_index {
            Some(index) => Some(index.parse::<SeriesIndex>().ok().ok_or_raise(|| ErrorKind::InvalidData("series index"))?),
            None => None,
        };
        Ok(SeriesInfo::new(row.name, index))
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct UidRow {
    kind: String,
    uid: String,
}

impl TryFrom<UidRow> for Uid {
    type Error = Error;
    fn try_from(row: UidRow) -> Result<Self> {
        Uid::new(&row.kind, &row.uid).ok_or_raise(|| ErrorKind::InvalidData("uid"))
    }
}

pub(crate) fn parse_tag(name: &str) -> Result<Tag> {
    Tag::parse(name).ok_or_raise(|| ErrorKind::InvalidData("tag"))
}
