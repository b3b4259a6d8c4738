//! Note and flashcard resolution utilities.

use anyhow::{Result, bail};

use crate::domain::{Flashcard, Note, NoteId};
use crate::index::NoteGraphIndex;

/// Result of resolving a note identifier.
#[derive(Debug)]
pub enum ResolveResult<'a> {
    /// Exactly one note matched.
    Unique(&'a Note),
    /// Multiple notes matched (ambiguous).
    Ambiguous(Vec<&'a Note>),
    /// No notes matched.
    NotFound,
}

/// Prints the candidates of an ambiguous identifier.
pub(crate) fn print_ambiguous_notes(identifier: &str, notes: &[&Note]) {
    eprintln!("Ambiguous: '{}' matches {} notes:", identifier, notes.len());
    for note in notes {
        eprintln!("  {} - {}", note.id().prefix(), note.title());
    }
    eprintln!();
    eprintln!("Use the ID prefix to specify which note you mean.");
}

/// Resolves a note identifier.
///
/// Resolution order:
/// 1. Exact ID
/// 2. ID prefix (if input looks like a ULID prefix)
/// 3. Exact title
/// 4. Title ignoring case
pub fn resolve_note<'a>(graph: &'a NoteGraphIndex, identifier: &str) -> ResolveResult<'a> {
    let identifier = identifier.trim();

    if let Ok(id) = identifier.parse::<NoteId>()
        && let Some(note) = graph.get_note(&id)
    {
        return ResolveResult::Unique(note);
    }

    let looks_like_id =
        identifier.len() >= 4 && identifier.chars().all(|c| c.is_ascii_alphanumeric());
    if looks_like_id {
        let prefix = identifier.to_ascii_uppercase();
        let matches: Vec<&Note> = graph
            .notes()
            .iter()
            .filter(|n| n.id().as_str().to_ascii_uppercase().starts_with(&prefix))
            .collect();
        match matches.len() {
            0 => {}
            1 => return ResolveResult::Unique(matches[0]),
            _ => return ResolveResult::Ambiguous(matches),
        }
    }

    if let Some(note) = graph.get_note_for_title(identifier) {
        return ResolveResult::Unique(note);
    }
    match graph.get_note_for_title_case_insensitive(identifier) {
        Some(note) => ResolveResult::Unique(note),
        None => ResolveResult::NotFound,
    }
}

/// Resolves a note identifier, failing unless exactly one note matches.
pub(crate) fn require_note(graph: &NoteGraphIndex, identifier: &str) -> Result<Note> {
    match resolve_note(graph, identifier) {
        ResolveResult::Unique(note) => Ok(note.clone()),
        ResolveResult::Ambiguous(notes) => {
            print_ambiguous_notes(identifier, &notes);
            bail!("ambiguous note identifier: {}", identifier)
        }
        ResolveResult::NotFound => bail!("note not found: {}", identifier),
    }
}

/// Resolves a flashcard by exact ID or unique ID prefix.
pub(crate) fn require_card(cards: &[Flashcard], identifier: &str) -> Result<Flashcard> {
    let identifier = identifier.trim();
    if let Some(card) = cards.iter().find(|c| c.id.as_str() == identifier) {
        return Ok(card.clone());
    }

    let prefix = identifier.to_ascii_uppercase();
    let matches: Vec<&Flashcard> = cards
        .iter()
        .filter(|c| c.id.as_str().to_ascii_uppercase().starts_with(&prefix))
        .collect();
    match matches.as_slice() {
        [card] => Ok((*card).clone()),
        [] => bail!("flashcard not found: {}", identifier),
        _ => bail!(
            "ambiguous flashcard identifier: '{}' matches {} cards",
            identifier,
            matches.len()
        ),
    }
}
