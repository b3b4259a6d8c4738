//! Storage collaborator: snapshot streams plus async writes

mod memory;
mod schema;
mod sqlite;

use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;

use crate::domain::{Flashcard, FlashcardId, Note, NoteId, NoteMetadata};
use crate::index::NestedTagGroups;
use crate::signal::Subscription;

pub use memory::{MemoryStore, StoreCall};
pub use schema::create_schema;
pub use sqlite::SqliteStore;

/// Errors that can occur while talking to storage.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The requested item does not exist in storage.
    #[error("not found: {id}")]
    NotFound { id: String },

    /// A database error occurred.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A stored payload could not be (de)serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// An I/O error occurred.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Stored data could not be interpreted.
    #[error("corrupt vault: {0}")]
    Corrupt(String),

    /// The backend refused or could not complete the request.
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Result type for storage operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// A backend holding notes, flashcards and the tag hierarchy.
///
/// Each collection is published as a full snapshot whenever it changes;
/// subscribers get the latest snapshot, never a delta. Writes are async and
/// last-write-wins.
#[async_trait]
pub trait Storage: Send + Sync {
    fn notes(&self) -> Subscription<Vec<Note>>;

    fn flashcards(&self) -> Subscription<Vec<Flashcard>>;

    fn nested_tag_groups(&self) -> Subscription<NestedTagGroups>;

    /// Creates an empty note and returns its metadata.
    async fn create_note(&self, title: &str) -> StoreResult<NoteMetadata>;

    async fn rename_file(&self, id: &NoteId, new_title: &str) -> StoreResult<()>;

    async fn delete_file(&self, id: &NoteId) -> StoreResult<()>;

    /// Saves a note body. With `notify` unset the notes snapshot is not
    /// republished for this write.
    async fn save_content(&self, id: &NoteId, content: &str, notify: bool) -> StoreResult<()>;

    /// Replaces the whole tag hierarchy.
    async fn save_nested_tag_groups(&self, mapping: &NestedTagGroups) -> StoreResult<()>;

    /// Inserts or replaces a flashcard.
    async fn save_flashcard(&self, card: &Flashcard) -> StoreResult<()>;

    async fn delete_flashcard(&self, id: &FlashcardId) -> StoreResult<()>;
}
