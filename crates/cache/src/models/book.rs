use crate::error::{Error, ErrorKind};
use crate::store::BookRecord;
use exn::OptionExt;
use std::path::PathBuf;

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct BookRow {
    pub(crate) id: i64,
    pub(crate) path: String,
    pub(crate) title: Option<String>,
    pub(crate) encoding: Option<String>,
    pub(crate) language: Option<String>,
}

impl TryFrom<&BookRecord> for BookRow {
    type Error = Error;
    fn try_from(record: &BookRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: record.id,
            // SQLite stores text; a path that is not UTF-8 cannot round-trip.
            path: record.path.to_str().ok_or_raise(|| ErrorKind::InvalidData("path"))?.to_string(),
            title: record.title.clone(),
            encoding: record.encoding.clone(),
            language: record.language.clone(),
        })
    }
}

impl From<BookRow> for BookRecord {
    fn from(row: BookRow) -> Self {
        Self {
            id: row.id,
            path: PathBuf::from(row.path),
            title: row.title,
            encoding: row.encoding,
            language: row.language,
        }
    }
}
