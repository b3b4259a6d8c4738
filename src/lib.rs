//! kasten - linked notes, hashtag hierarchies and spaced-repetition flashcards

pub mod cli;
pub mod clock;
pub mod domain;
pub mod index;
pub mod notify;
pub mod review;
pub mod signal;
pub mod store;
pub mod workspace;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::Path;
use tracing_subscriber::EnvFilter;

use cli::{
    Cli, Command,
    config::Config,
    handlers::{
        handle_backlinks, handle_card, handle_completions, handle_due, handle_graph, handle_list,
        handle_mv, handle_new, handle_rate, handle_rm, handle_search, handle_show,
        handle_tag_move, handle_tag_parents, handle_tags, handle_write,
    },
};

/// Main entry point for the CLI application.
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Command::Completions(args) = &cli.command {
        return handle_completions(args);
    }

    let config = Config::load()?;
    let notes_dir = config.notes_dir(cli.dir.as_ref());

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    runtime.block_on(dispatch(&cli.command, &config, &notes_dir))
}

async fn dispatch(command: &Command, config: &Config, notes_dir: &Path) -> Result<()> {
    let workspace = cli::handlers::open_workspace(notes_dir, config).await?;
    let ws = &workspace;

    match command {
        Command::New(args) => handle_new(args, ws).await,
        Command::Write(args) => handle_write(args, ws).await,
        Command::Show(args) => handle_show(args, ws),
        Command::List(args) => handle_list(args, ws),
        Command::Search(args) => handle_search(args, ws),
        Command::Rm(args) => handle_rm(args, ws).await,
        Command::Graph(args) => handle_graph(args, ws),
        Command::Backlinks(args) => handle_backlinks(args, ws),
        Command::Mv(args) => handle_mv(args, ws).await,
        Command::Tags(args) => handle_tags(args, ws),
        Command::TagParents(args) => handle_tag_parents(args, ws).await,
        Command::TagMove(args) => handle_tag_move(args, ws).await,
        Command::Card(args) => handle_card(args, ws).await,
        Command::Due(args) => handle_due(args, ws),
        Command::Rate(args) => handle_rate(args, ws).await,
        Command::Completions(args) => handle_completions(args),
    }
}

// Diagnostics go to stderr. `RUST_LOG` takes precedence over `-v`.
fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("kasten={default_level}")));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
