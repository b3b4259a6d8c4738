//! CLI command definitions and handlers

pub mod config;
pub mod handlers;
pub mod output;

use clap::{ArgAction, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

use crate::domain::Rating;
use output::OutputFormat;

/// kasten - linked notes, hashtag hierarchies and flashcard review
#[derive(Parser, Debug)]
#[command(name = "kasten", version, about, long_about = None)]
pub struct Cli {
    /// Vault directory (overrides config file)
    #[arg(short = 'd', long, global = true)]
    pub dir: Option<PathBuf>,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a new note
    New(NewArgs),

    /// Replace a note's content
    Write(WriteArgs),

    /// Show a note with its references
    Show(ShowArgs),

    /// List notes, optionally only those with a tag
    #[command(name = "ls")]
    List(ListArgs),

    /// Case-insensitive search over titles and content
    Search(SearchArgs),

    /// Delete a note
    Rm(RmArgs),

    /// Print the reference graph
    Graph(GraphArgs),

    /// Show notes that reference a given note
    Backlinks(BacklinksArgs),

    /// Rename a note and rewrite references to it
    Mv(MvArgs),

    /// Show tag groups (top level, or the children of a tag)
    Tags(TagsArgs),

    /// Set the parent tags of a tag
    #[command(name = "tag-parents")]
    TagParents(TagParentsArgs),

    /// Move a tag from one parent to another
    #[command(name = "tag-move")]
    TagMove(TagMoveArgs),

    /// Manage flashcards
    Card(CardArgs),

    /// List flashcards due for review
    Due(DueArgs),

    /// Rate a flashcard review
    Rate(RateArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Arguments for the `new` command
#[derive(Parser, Debug)]
pub struct NewArgs {
    /// Note title
    pub title: String,

    /// Initial content
    #[arg(short, long)]
    pub content: Option<String>,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Human)]
    pub format: OutputFormat,
}

/// Arguments for the `write` command
#[derive(Parser, Debug)]
pub struct WriteArgs {
    /// Note ID or title
    pub note: String,

    /// New content (read from stdin if omitted)
    pub content: Option<String>,

    /// Append to the existing content instead of replacing it
    #[arg(short, long)]
    pub append: bool,
}

/// Arguments for the `show` command
#[derive(Parser, Debug)]
pub struct ShowArgs {
    /// Note ID or title
    pub note: String,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Human)]
    pub format: OutputFormat,
}

/// Arguments for the `ls` (list) command
#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Only notes in this tag group (e.g. "#rust", "untagged")
    #[arg(short, long)]
    pub tag: Option<String>,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Human)]
    pub format: OutputFormat,
}

/// Arguments for the `search` command
#[derive(Parser, Debug)]
pub struct SearchArgs {
    /// Search query
    pub query: String,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Human)]
    pub format: OutputFormat,
}

/// Arguments for the `rm` command
#[derive(Parser, Debug)]
pub struct RmArgs {
    /// Note ID or title
    pub note: String,
}

/// Arguments for the `graph` command
#[derive(Parser, Debug)]
pub struct GraphArgs {
    /// Output format
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Human)]
    pub format: OutputFormat,
}

/// Arguments for the `backlinks` command
#[derive(Parser, Debug)]
pub struct BacklinksArgs {
    /// Note ID or title
    pub note: String,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Human)]
    pub format: OutputFormat,
}

/// Arguments for the `mv` command (rename note)
#[derive(Parser, Debug)]
pub struct MvArgs {
    /// Note ID or title
    pub note: String,

    /// New title
    pub title: String,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Human)]
    pub format: OutputFormat,
}

/// Arguments for the `tags` command
#[derive(Parser, Debug)]
pub struct TagsArgs {
    /// Show the children of this tag instead of the top level
    pub tag: Option<String>,

    /// List every tag group, ignoring the hierarchy
    #[arg(long, conflicts_with = "tag")]
    pub flat: bool,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Human)]
    pub format: OutputFormat,
}

/// Arguments for the `tag-parents` command
#[derive(Parser, Debug)]
pub struct TagParentsArgs {
    /// Tag whose parents are replaced
    pub tag: String,

    /// New parent tags (none makes the tag top level)
    pub parents: Vec<String>,
}

/// Arguments for the `tag-move` command
#[derive(Parser, Debug)]
pub struct TagMoveArgs {
    /// Tag to move
    pub tag: String,

    /// Current parent tag
    #[arg(long, default_value = crate::domain::ROOT_TAG)]
    pub from: String,

    /// New parent tag
    #[arg(long)]
    pub to: String,
}

/// Arguments for the `card` command
#[derive(Parser, Debug)]
pub struct CardArgs {
    #[command(subcommand)]
    pub command: CardCommand,
}

#[derive(Subcommand, Debug)]
pub enum CardCommand {
    /// Add a flashcard
    Add(CardAddArgs),

    /// Delete a flashcard
    Rm(CardRmArgs),

    /// List all flashcards
    Ls(CardListArgs),
}

/// Arguments for the `card add` command
#[derive(Parser, Debug)]
pub struct CardAddArgs {
    /// Front side
    pub side1: String,

    /// Back side
    pub side2: String,

    /// Tag for the card (can be specified multiple times)
    #[arg(short, long = "tag", action = ArgAction::Append)]
    pub tags: Vec<String>,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Human)]
    pub format: OutputFormat,
}

/// Arguments for the `card rm` command
#[derive(Parser, Debug)]
pub struct CardRmArgs {
    /// Flashcard ID or unique ID prefix
    pub card: String,
}

/// Arguments for the `card ls` command
#[derive(Parser, Debug)]
pub struct CardListArgs {
    /// Output format
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Human)]
    pub format: OutputFormat,
}

/// Arguments for the `due` command
#[derive(Parser, Debug)]
pub struct DueArgs {
    /// Output format
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Human)]
    pub format: OutputFormat,
}

/// Arguments for the `rate` command
#[derive(Parser, Debug)]
pub struct RateArgs {
    /// Flashcard ID or unique ID prefix
    pub card: String,

    /// Rating: 0-3 or blackout, hard, good, easy
    pub rating: Rating,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Human)]
    pub format: OutputFormat,
}

/// Arguments for the `completions` command
#[derive(Parser, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for (bash, zsh, fish)
    #[arg(value_enum)]
    pub shell: Shell,
}
