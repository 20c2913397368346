//! `quire`: keep a library's book metadata in a SQLite database.

mod commands;

use clap::{Parser, Subcommand};
use derive_more::{Display, Error};
use exn::ResultExt;
use quire_cache::{Database, SqliteStore};
use quire_config::Config;
use quire_extract::PluginCollection;
use quire_library::{Context, DemoContent, Library};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Debug, Display, Error)]
pub(crate) enum CliError {
    #[display("could not load configuration")]
    Config,
    #[display("could not open the book database")]
    Database,
    #[display("library operation failed")]
    Library,
    #[display("no stored book with id {_0}")]
    NoSuchBook(#[error(not(source))] i64),
}

pub(crate) type Result<T> = std::result::Result<T, exn::Exn<CliError>>;

#[derive(Debug, Parser)]
#[command(name = "quire", version, about = "Book metadata library")]
struct Cli {
    /// Config file (TOML, YAML or JSON)
    #[arg(long, short, global = true, env = "QUIRE_CONFIG")]
    config: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Command {
    /// Add files to the library and print their ids
    Add {
        /// Paths relative to the library root
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Print everything known about a stored book
    Show { id: i64 },
    /// List stored books whose title, series, authors, tags or path match
    Search { pattern: String },
    /// Add (or remove) a label on a stored book
    Label {
        id: i64,
        label: String,
        #[arg(long)]
        remove: bool,
    },
    /// Read a stored book's file again, keeping its labels
    Reload { id: i64 },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::FAILURE
        },
    }
}

fn init_tracing(verbose: bool) {
    let default = match verbose {
        true => "quire=debug",
        false => "quire=info",
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load(cli.config.as_deref()).or_raise(|| CliError::Config)?;
    debug!(?config, "Loaded configuration");
    let db = open_database(&config).await?;
    let library = Library::new(context(&config, &db));
    let result = commands::execute(&library, cli.command).await;
    db.close().await;
    result
}

async fn open_database(config: &Config) -> Result<Database> {
    let path = &config.database.path;
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.or_raise(|| CliError::Database)?;
    }
    info!(path = %path.display(), "Opening book database");
    Database::connect_with(path, config.database.max_connections).await.or_raise(|| CliError::Database)
}

fn context(config: &Config, db: &Database) -> Context {
    let ctx = Context::new(Arc::new(SqliteStore::from(db)), PluginCollection::builtin(), &config.library.root);
    match config.library.demo_dir() {
        Some(dir) => ctx.with_hook(DemoContent::new(dir, &config.library.demo_label)),
        None => ctx,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_label() {
        let cli = Cli::try_parse_from(["quire", "-v", "label", "3", "favorite", "--remove"]).unwrap();
        assert!(cli.verbose);
        assert!(matches!(cli.command, Command::Label { id: 3, ref label, remove: true } if label == "favorite"));
    }

    #[test]
    fn test_add_requires_paths() {
        assert!(Cli::try_parse_from(["quire", "add"]).is_err());
    }
}
