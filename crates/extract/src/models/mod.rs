mod author;
mod cover;
mod metadata;
mod series;
mod tag;
mod titled;
mod uid;

pub use self::author::Author;
pub use self::cover::Cover;
pub use self::metadata::{FAVORITE_LABEL, Metadata, READ_LABEL, contains_ignore_case};
pub use self::series::{SeriesIndex, SeriesInfo};
pub use self::tag::{TAG_SEPARATOR, Tag};
pub use self::titled::Titled;
pub use self::uid::Uid;
