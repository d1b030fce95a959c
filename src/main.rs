use clap::{ArgAction, Parser, Subcommand};
use librarium::lifecycle::{self, Library, LibraryPaths, LifecycleError, Operation};
use librarium::{config, output};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "librarium")]
#[command(about = "Tiny CMS for a library of hand-written HTML documents")]
#[command(long_about = "\
Tiny CMS for a library of hand-written HTML documents

Every document is a directory holding a source.html. Librarium reads its
<title> and body, keeps an ordered index of documents, renders each document
through a page template and rebuilds the HTML, RSS and Atom listings.

Library structure:

  ./
  ├── cms/
  │   ├── config.toml              # Library URL, title, editor (optional)
  │   └── templates/
  │       ├── doc                  # Page template
  │       └── indices/<format>/    # entire + item per feed format
  ├── notes/rust/
  │   ├── source.html              # Hand-written document
  │   └── index.html               # Rendered page
  ├── index.json                   # The index (index.json~ is the previous one)
  └── index.html, index.rss, index.atom

Document ids are directories relative to the library root, e.g. notes/rust.

Run 'librarium init' to scaffold a config and stock templates.")]
#[command(version)]
struct Cli {
    /// Library root
    #[arg(long, default_value = ".", global = true)]
    root: PathBuf,

    /// CMS directory (config and templates), relative to the root
    #[arg(long, default_value = "cms", global = true)]
    cms: PathBuf,

    /// More diagnostics on stderr (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Index a document and render its page
    Add { doc: String },
    /// Index a document without rendering its page
    Index { doc: String },
    /// Remove a document from the index
    Remove { doc: String },
    /// Re-read a document, keeping its publication time, and render its page
    Update { doc: String },
    /// Move a document to the front of the index
    Popup { doc: String },
    /// Render a document's page from its current source
    Reform { doc: String },
    /// Render every indexed document's page
    Renovate,
    /// Show the index
    List,
    /// Scaffold config.toml and stock templates
    Init,
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), LifecycleError> {
    let paths = LibraryPaths::new(&cli.root, &cli.cms);

    let op = match cli.command {
        Command::Add { doc } => Operation::Add(doc),
        Command::Index { doc } => Operation::Index(doc),
        Command::Remove { doc } => Operation::Remove(doc),
        Command::Update { doc } => Operation::Update(doc),
        Command::Popup { doc } => Operation::Popup(doc),
        Command::Reform { doc } => Operation::Reform(doc),
        Command::Renovate => Operation::Renovate,
        Command::List => {
            let library = Library::open(paths)?;
            output::print_index_listing(library.index());
            return Ok(());
        }
        Command::Init => {
            let report = lifecycle::init(&paths)?;
            output::print_init(&report, &paths.root);
            return Ok(());
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
            return Ok(());
        }
    };

    let mut library = Library::open(paths)?;
    let outcome = library.run(&op)?;
    output::print_outcome(&outcome, &library.paths().root);
    Ok(())
}

/// Diagnostics go to stderr so stdout carries only command results.
fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        _ => LevelFilter::DEBUG,
    };
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}
