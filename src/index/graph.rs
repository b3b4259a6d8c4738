//! Title-based note lookups and the `[[reference]]` graph.

use serde::Serialize;
use std::collections::{HashMap, HashSet};

use crate::domain::{
    Note, NoteId, Reference, TitleError, extract_candidates, extract_references,
};

/// One node of the reference graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphNode {
    pub note_id: NoteId,
    pub note_title: String,
    /// Resolved reference targets in document order. A title referenced
    /// twice appears twice.
    pub connected_to: Vec<String>,
    pub last_changed: i64,
}

/// Immutable lookup tables over one snapshot of the note collection.
///
/// The index is never patched: any change to a note produces a new index
/// built from the full collection, so the three lookup maps always agree.
/// When two notes share a title, lookups return the first one in
/// collection order.
#[derive(Debug, Clone, Default)]
pub struct NoteGraphIndex {
    notes: Vec<Note>,
    id_to_note: HashMap<NoteId, usize>,
    title_to_note: HashMap<String, usize>,
    title_to_note_case_insensitive: HashMap<String, usize>,
    titles: HashSet<String>,
}

impl NoteGraphIndex {
    /// Builds the lookup tables for a full note collection.
    pub fn new(notes: Vec<Note>) -> Self {
        let mut id_to_note = HashMap::with_capacity(notes.len());
        let mut title_to_note = HashMap::with_capacity(notes.len());
        let mut title_to_note_case_insensitive = HashMap::with_capacity(notes.len());
        let mut titles = HashSet::with_capacity(notes.len());

        for (idx, note) in notes.iter().enumerate() {
            id_to_note.entry(note.id().clone()).or_insert(idx);
            title_to_note.entry(note.title().to_string()).or_insert(idx);
            title_to_note_case_insensitive
                .entry(note.title().to_lowercase())
                .or_insert(idx);
            titles.insert(note.title().to_string());
        }

        Self {
            notes,
            id_to_note,
            title_to_note,
            title_to_note_case_insensitive,
            titles,
        }
    }

    /// Returns all notes in collection order.
    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Returns the set of current titles.
    pub fn titles(&self) -> &HashSet<String> {
        &self.titles
    }

    pub fn get_note(&self, id: &NoteId) -> Option<&Note> {
        self.id_to_note.get(id).map(|&idx| &self.notes[idx])
    }

    /// Exact (case-sensitive) title lookup.
    pub fn get_note_for_title(&self, title: &str) -> Option<&Note> {
        self.title_to_note.get(title).map(|&idx| &self.notes[idx])
    }

    pub fn get_note_for_title_case_insensitive(&self, title: &str) -> Option<&Note> {
        self.title_to_note_case_insensitive
            .get(&title.to_lowercase())
            .map(|&idx| &self.notes[idx])
    }

    /// Returns the resolved references in a note's content.
    pub fn references_from(&self, note: &Note) -> Vec<Reference> {
        extract_references(note.content(), &self.titles)
    }

    /// Builds the reference graph for every note.
    pub fn graph_representation(&self) -> Vec<GraphNode> {
        self.notes
            .iter()
            .map(|note| GraphNode {
                note_id: note.id().clone(),
                note_title: note.title().to_string(),
                connected_to: self
                    .references_from(note)
                    .into_iter()
                    .map(|r| r.title)
                    .collect(),
                last_changed: note.last_changed(),
            })
            .collect()
    }

    /// Returns the notes that reference the given note's title.
    ///
    /// Each referencing note appears once, in collection order. Unknown ids
    /// yield an empty list.
    pub fn backreferences(&self, id: &NoteId) -> Vec<&Note> {
        let Some(target) = self.get_note(id) else {
            return Vec::new();
        };
        let title = target.title();

        self.notes
            .iter()
            .filter(|note| {
                self.references_from(note)
                    .iter()
                    .any(|r| r.title == title)
            })
            .collect()
    }

    /// Returns bracketed titles in a note that do not name any note.
    pub fn unresolved_references(&self, id: &NoteId) -> Vec<String> {
        let Some(note) = self.get_note(id) else {
            return Vec::new();
        };
        extract_candidates(note.content())
            .into_iter()
            .filter(|r| !self.titles.contains(&r.title))
            .map(|r| r.title)
            .collect()
    }

    /// Case-insensitive substring search over titles and content.
    ///
    /// Results keep collection order; there is no ranking.
    pub fn search(&self, query: &str) -> Vec<&Note> {
        let needle = query.to_lowercase();
        self.notes
            .iter()
            .filter(|note| {
                note.title().to_lowercase().contains(&needle)
                    || note.content().to_lowercase().contains(&needle)
            })
            .collect()
    }

    /// Validates a title for a new or renamed note.
    ///
    /// Returns the trimmed title. A title matching an existing note ignoring
    /// case is rejected, except when that note is `renaming` itself.
    pub fn validate_new_title(
        &self,
        title: &str,
        renaming: Option<&NoteId>,
    ) -> Result<String, TitleError> {
        let trimmed = title.trim();
        if trimmed.is_empty() {
            return Err(TitleError::Empty);
        }

        if let Some(existing) = self.get_note_for_title_case_insensitive(trimmed)
            && Some(existing.id()) != renaming
        {
            return Err(TitleError::Duplicate {
                existing: existing.title().to_string(),
            });
        }

        Ok(trimmed.to_string())
    }
}
