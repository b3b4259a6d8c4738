//! Core types: Note, NoteId, references, tags, Flashcard

mod flashcard;
mod note;
mod note_id;
mod reference;
mod tag;

pub use flashcard::{
    DEFAULT_EASINESS_FACTOR, Flashcard, FlashcardId, LearningData, MIN_EASINESS_FACTOR,
    ParseRatingError, Rating,
};
pub use note::{Note, NoteMetadata, TitleError};
pub use note_id::{NoteId, ParseNoteIdError};
pub use reference::{Reference, extract_candidates, extract_references, reference_token};
pub use tag::{ALL_TAG, ROOT_TAG, TAG_DELIMITER, UNTAGGED_TAG, extract_tags, is_synthetic_tag};
