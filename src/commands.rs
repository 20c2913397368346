use crate::{CliError, Command, Result};
use exn::{OptionExt, ResultExt};
use quire_library::error::ErrorKind as LibraryErrorKind;
use quire_library::{Book, Library};
use tracing::warn;

pub(crate) async fn execute(library: &Library, command: Command) -> Result<()> {
    match command {
        Command::Add { paths } => {
            for path in paths {
                let book = match library.book_for_file(&path).await {
                    Ok(book) => book,
                    Err(err) if matches!(*err, LibraryErrorKind::ExtractorNotFound(_)) => {
                        warn!(path = %path.display(), "No extractor handles this file; skipping");
                        continue;
                    },
                    Err(err) => return Err(err).or_raise(|| CliError::Library),
                };
                book.save(false).await.or_raise(|| CliError::Library)?;
                println!("{}\t{}", book.id(), book.title());
            }
        },
        Command::Show { id } => show(&stored(library, id).await?).await?,
        Command::Search { pattern } => {
            for book in library.search(&pattern).await.or_raise(|| CliError::Library)? {
                println!("{}\t{}\t{}", book.id(), book.title(), book.file());
            }
        },
        Command::Label { id, label, remove } => {
            let book = stored(library, id).await?;
            let changed = match remove {
                true => book.remove_label(&label).await,
                false => book.add_label(&label).await,
            };
            if changed.or_raise(|| CliError::Library)? {
                book.save(false).await.or_raise(|| CliError::Library)?;
            }
            println!("{}", book.labels().await.or_raise(|| CliError::Library)?.join(", "));
        },
        Command::Reload { id } => {
            let book = stored(library, id).await?;
            if !book.reload_from_file().await {
                warn!(book_id = id, path = %book.file(), "Could not read the file; metadata unchanged");
                return Ok(());
            }
            book.save(false).await.or_raise(|| CliError::Library)?;
            show(&book).await?;
        },
    }
    Ok(())
}

async fn stored(library: &Library, id: i64) -> Result<Book> {
    library
        .book(id)
        .await
        .or_raise(|| CliError::Library)?
        .ok_or_raise(|| CliError::NoSuchBook(id))
}

async fn show(book: &Book) -> Result<()> {
    let joined = |items: Vec<String>| items.join(", ");
    let authors = book.authors().await.or_raise(|| CliError::Library)?;
    let tags = book.tags().await.or_raise(|| CliError::Library)?;
    let series = book.series().await.or_raise(|| CliError::Library)?;
    let uids = book.uids().await.or_raise(|| CliError::Library)?;
    let labels = book.labels().await.or_raise(|| CliError::Library)?;

    println!("Id:          {}", book.id());
    println!("Path:        {}", book.file());
    println!("Title:       {}", book.title());
    println!("Sort key:    {}", book.sort_key());
    println!("Authors:     {}", joined(authors.iter().map(ToString::to_string).collect()));
    println!("Tags:        {}", joined(tags.iter().map(ToString::to_string).collect()));
    if let Some(series) = series {
        println!("Series:      {series}");
    }
    println!("Identifiers: {}", joined(uids.iter().map(ToString::to_string).collect()));
    println!("Labels:      {}", joined(labels));
    println!("Language:    {}", book.language().unwrap_or_default());
    println!("Encoding:    {}", book.encoding_no_detection().unwrap_or_default());
    println!("Bookmark:    {}", if book.has_bookmark() { "yes" } else { "no" });
    Ok(())
}
