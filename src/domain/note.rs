//! Note struct representing a titled markdown note.

use crate::domain::NoteId;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Error returned when a proposed note title is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TitleError {
    #[error("invalid title: title cannot be empty")]
    Empty,

    #[error("invalid title: a note titled '{existing}' already exists")]
    Duplicate { existing: String },
}

/// A note with its title, body and modification time.
///
/// Titles are unique within the active note set for lookup purposes
/// (ignoring case), but the core does not enforce that: callers validate
/// new titles with [`NoteGraphIndex::validate_new_title`] before creating
/// or renaming notes.
///
/// [`NoteGraphIndex::validate_new_title`]: crate::index::NoteGraphIndex::validate_new_title
///
/// # Examples
///
/// ```
/// use kasten::domain::Note;
///
/// let note = Note::new("n1".parse().unwrap(), "API Design", "see [[REST]]", 1_700_000_000_000);
/// assert_eq!(note.title(), "API Design");
/// ```
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    id: NoteId,
    title: String,
    content: String,
    last_changed_epoch_millis: i64,
}

impl Note {
    /// Creates a new Note.
    pub fn new(
        id: NoteId,
        title: impl Into<String>,
        content: impl Into<String>,
        last_changed_epoch_millis: i64,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            content: content.into(),
            last_changed_epoch_millis,
        }
    }

    /// Returns the note's identifier.
    pub fn id(&self) -> &NoteId {
        &self.id
    }

    /// Returns the note's title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the note's body text.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Returns when the note was last changed, in epoch milliseconds.
    pub fn last_changed(&self) -> i64 {
        self.last_changed_epoch_millis
    }

    /// Returns the note's metadata without its body.
    pub fn metadata(&self) -> NoteMetadata {
        NoteMetadata {
            id: self.id.clone(),
            title: self.title.clone(),
            last_changed_epoch_millis: self.last_changed_epoch_millis,
        }
    }

    pub(crate) fn set_title(&mut self, title: impl Into<String>, now: i64) {
        self.title = title.into();
        self.last_changed_epoch_millis = now;
    }

    pub(crate) fn set_content(&mut self, content: impl Into<String>, now: i64) {
        self.content = content.into();
        self.last_changed_epoch_millis = now;
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.title, self.id.prefix())
    }
}

impl fmt::Debug for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Note")
            .field("id", &self.id)
            .field("title", &self.title)
            .field("content_len", &self.content.len())
            .field("last_changed", &self.last_changed_epoch_millis)
            .finish()
    }
}

/// Metadata returned by storage when a note is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteMetadata {
    pub id: NoteId,
    pub title: String,
    pub last_changed_epoch_millis: i64,
}

impl NoteMetadata {
    /// Turns the metadata into an empty note.
    pub fn into_note(self) -> Note {
        Note::new(self.id, self.title, "", self.last_changed_epoch_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn id(s: &str) -> NoteId {
        s.parse().unwrap()
    }

    #[test]
    fn accessors_return_fields() {
        let note = Note::new(id("1"), "Title", "body", 42);
        assert_eq!(note.id(), &id("1"));
        assert_eq!(note.title(), "Title");
        assert_eq!(note.content(), "body");
        assert_eq!(note.last_changed(), 42);
    }

    #[test]
    fn set_content_bumps_last_changed() {
        let mut note = Note::new(id("1"), "Title", "old", 1);
        note.set_content("new", 5);
        assert_eq!(note.content(), "new");
        assert_eq!(note.last_changed(), 5);
    }

    #[test]
    fn set_title_bumps_last_changed() {
        let mut note = Note::new(id("1"), "Old", "", 1);
        note.set_title("New", 9);
        assert_eq!(note.title(), "New");
        assert_eq!(note.last_changed(), 9);
    }

    #[test]
    fn serializes_with_camel_case_fields() {
        let note = Note::new(id("1"), "T", "c", 7);
        let json = serde_json::to_value(&note).unwrap();
        assert_eq!(json["lastChangedEpochMillis"], 7);
        assert_eq!(json["id"], "1");
    }

    #[test]
    fn metadata_roundtrips_into_empty_note() {
        let note = Note::new(id("1"), "T", "content", 7);
        let empty = note.metadata().into_note();
        assert_eq!(empty.title(), "T");
        assert_eq!(empty.content(), "");
        assert_eq!(empty.last_changed(), 7);
    }

    #[test]
    fn display_shows_title_and_prefix() {
        let note = Note::new(id("abc"), "Hello", "", 0);
        assert_eq!(note.to_string(), "Hello [abc]");
    }
}
