mod book;
mod list;

pub(crate) use self::book::BookRow;
pub(crate) use self::list::{AuthorRow, SeriesRow, UidRow, parse_tag};
