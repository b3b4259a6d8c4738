//! Output format types for CLI commands.

use clap::ValueEnum;
use serde::Serialize;

use crate::domain::{Flashcard, Note};
use crate::index::TagGroup;

/// Output format for command results.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output (default)
    #[default]
    Human,
    /// JSON output for programmatic consumption
    Json,
}

/// Wrapper for serializable command output.
#[derive(Debug, Serialize)]
pub struct Output<T: Serialize> {
    pub data: T,
}

impl<T: Serialize> Output<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// Prints `data` as pretty JSON wrapped in [`Output`].
pub fn print_json<T: Serialize>(data: T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(&Output::new(data))?);
    Ok(())
}

/// A single note in listing output.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteListing {
    pub id: String,
    pub title: String,
    pub last_changed: i64,
}

impl From<&Note> for NoteListing {
    fn from(note: &Note) -> Self {
        Self {
            id: note.id().to_string(),
            title: note.title().to_string(),
            last_changed: note.last_changed(),
        }
    }
}

/// A full note with its resolved and unresolved references.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteDetail {
    pub id: String,
    pub title: String,
    pub content: String,
    pub last_changed: i64,
    pub references: Vec<String>,
    pub unresolved: Vec<String>,
    pub backlinks: Vec<NoteListing>,
}

/// A tag group in listing output.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TagListing {
    pub tag: String,
    pub count: usize,
    pub newest_note_change_timestamp: i64,
    pub children: Vec<String>,
}

impl TagListing {
    pub fn new(group: &TagGroup, children: Vec<String>) -> Self {
        Self {
            tag: group.tag.clone(),
            count: group.note_ids.len(),
            newest_note_change_timestamp: group.newest_note_change_timestamp,
            children,
        }
    }
}

/// Result of a rename.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameListing {
    pub id: String,
    pub old_title: String,
    pub new_title: String,
    pub renamed_note_count: usize,
    pub renamed_back_ref_count: usize,
}

/// A flashcard in listing output.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardListing {
    pub id: String,
    pub side1: String,
    pub side2: String,
    pub tags: Vec<String>,
    pub num_repetitions: u32,
    pub easiness_factor: f64,
    pub next_repetition: i64,
}

impl From<&Flashcard> for CardListing {
    fn from(card: &Flashcard) -> Self {
        Self {
            id: card.id.to_string(),
            side1: card.side1.clone(),
            side2: card.side2.clone(),
            tags: card.tags.clone(),
            num_repetitions: card.learning_data.num_repetitions,
            easiness_factor: card.learning_data.easiness_factor,
            next_repetition: card.next_repetition_epoch_millis,
        }
    }
}

/// Formats epoch milliseconds as a UTC date and time.
pub fn format_millis(millis: i64) -> String {
    chrono::DateTime::from_timestamp_millis(millis)
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| millis.to_string())
}
