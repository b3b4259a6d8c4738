//! Propagation of note renames through `[[Title]]` backreferences.

use std::collections::HashMap;

use crate::domain::{Note, NoteId, reference_token};
use crate::index::NoteGraphIndex;

/// New content for one note that referenced the renamed title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentRewrite {
    pub note_id: NoteId,
    pub content: String,
    /// Number of `[[old]]` tokens replaced in this note.
    pub occurrences: usize,
}

/// Everything needed to apply and persist a rename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenamePlan {
    pub note_id: NoteId,
    pub old_title: String,
    pub new_title: String,
    pub rewrites: Vec<ContentRewrite>,
}

impl RenamePlan {
    /// Number of referencing notes whose content changes.
    pub fn renamed_note_count(&self) -> usize {
        self.rewrites.len()
    }

    /// Total number of reference tokens replaced.
    pub fn renamed_back_ref_count(&self) -> usize {
        self.rewrites.iter().map(|r| r.occurrences).sum()
    }

    /// Applies the rename to a note collection in place.
    ///
    /// Every touched note gets `now` as its change time.
    pub fn apply(&self, notes: &mut [Note], now: i64) {
        let rewrites: HashMap<&NoteId, &ContentRewrite> =
            self.rewrites.iter().map(|r| (&r.note_id, r)).collect();

        for note in notes.iter_mut() {
            if note.id() == &self.note_id {
                note.set_title(self.new_title.clone(), now);
            }
            if let Some(rewrite) = rewrites.get(note.id()) {
                note.set_content(rewrite.content.clone(), now);
            }
        }
    }
}

/// Plans renaming `note_id` to `new_title`.
///
/// Backreferences are found on the graph as it stands before the rename.
/// Each referencing note is split on the literal `[[old]]` token and
/// rejoined with `[[new]]`. Returns `None` for an unknown note.
///
/// Title collisions are not checked here; callers validate the new title
/// first.
pub fn plan_rename(index: &NoteGraphIndex, note_id: &NoteId, new_title: &str) -> Option<RenamePlan> {
    let note = index.get_note(note_id)?;
    let old_title = note.title().to_string();
    let old_token = reference_token(&old_title);
    let new_token = reference_token(new_title);

    let rewrites = index
        .graph_representation()
        .into_iter()
        .filter(|node| node.connected_to.iter().any(|t| *t == old_title))
        .filter_map(|node| {
            let source = index.get_note(&node.note_id)?;
            let parts: Vec<&str> = source.content().split(old_token.as_str()).collect();
            Some(ContentRewrite {
                note_id: node.note_id,
                content: parts.join(&new_token),
                occurrences: parts.len() - 1,
            })
        })
        .collect();

    Some(RenamePlan {
        note_id: note_id.clone(),
        old_title,
        new_title: new_title.to_string(),
        rewrites,
    })
}
