//! In-memory storage backend.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use super::{Storage, StoreError, StoreResult};
use crate::clock::{Clock, SystemClock};
use crate::domain::{Flashcard, FlashcardId, Note, NoteId, NoteMetadata};
use crate::index::NestedTagGroups;
use crate::signal::{Signal, Subscription};

/// A write request received by a [`MemoryStore`], in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    CreateNote(String),
    RenameFile(NoteId, String),
    DeleteFile(NoteId),
    SaveContent(NoteId),
    SaveNestedTagGroups,
    SaveFlashcard(FlashcardId),
    DeleteFlashcard(FlashcardId),
}

#[derive(Debug, Default)]
struct State {
    notes: Vec<Note>,
    flashcards: Vec<Flashcard>,
    hierarchy: NestedTagGroups,
    calls: Vec<StoreCall>,
}

/// Storage kept entirely in memory.
///
/// Besides serving as a backend for tests and scratch sessions, it can
/// simulate remote refreshes (`emit_*`) and failing writes
/// (`set_fail_writes`). Every write request is recorded, including failed
/// ones.
pub struct MemoryStore {
    state: Mutex<State>,
    notes: Signal<Vec<Note>>,
    flashcards: Signal<Vec<Flashcard>>,
    hierarchy: Signal<NestedTagGroups>,
    clock: Arc<dyn Clock>,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    /// Creates a store holding the given collections and publishes them.
    pub fn new(notes: Vec<Note>, flashcards: Vec<Flashcard>, hierarchy: NestedTagGroups) -> Self {
        let store = Self {
            state: Mutex::new(State::default()),
            notes: Signal::new(),
            flashcards: Signal::new(),
            hierarchy: Signal::new(),
            clock: Arc::new(SystemClock),
            fail_writes: AtomicBool::new(false),
        };
        store.emit_notes(notes);
        store.emit_flashcards(flashcards);
        store.emit_nested_tag_groups(hierarchy);
        store
    }

    pub fn empty() -> Self {
        Self::new(Vec::new(), Vec::new(), NestedTagGroups::new())
    }

    /// Uses `clock` for the change times the store assigns.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Makes every subsequent write fail (or succeed again).
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Returns the write requests received so far.
    pub fn calls(&self) -> Vec<StoreCall> {
        self.lock().map(|s| s.calls.clone()).unwrap_or_default()
    }

    /// Returns the stored notes, whether or not they were published.
    pub fn stored_notes(&self) -> Vec<Note> {
        self.lock().map(|s| s.notes.clone()).unwrap_or_default()
    }

    pub fn stored_flashcards(&self) -> Vec<Flashcard> {
        self.lock().map(|s| s.flashcards.clone()).unwrap_or_default()
    }

    pub fn stored_nested_tag_groups(&self) -> NestedTagGroups {
        self.lock().map(|s| s.hierarchy.clone()).unwrap_or_default()
    }

    /// Replaces the notes as if a remote change arrived.
    pub fn emit_notes(&self, notes: Vec<Note>) {
        if let Ok(mut state) = self.lock() {
            state.notes = notes.clone();
        }
        self.notes.set(notes);
    }

    /// Replaces the flashcards as if a remote change arrived.
    pub fn emit_flashcards(&self, flashcards: Vec<Flashcard>) {
        if let Ok(mut state) = self.lock() {
            state.flashcards = flashcards.clone();
        }
        self.flashcards.set(flashcards);
    }

    /// Replaces the tag hierarchy as if a remote change arrived.
    pub fn emit_nested_tag_groups(&self, hierarchy: NestedTagGroups) {
        if let Ok(mut state) = self.lock() {
            state.hierarchy = hierarchy.clone();
        }
        self.hierarchy.set(hierarchy);
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".to_string()))
    }

    fn write<R>(
        &self,
        call: StoreCall,
        apply: impl FnOnce(&mut State) -> StoreResult<R>,
    ) -> StoreResult<R> {
        let mut state = self.lock()?;
        state.calls.push(call);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("write rejected".to_string()));
        }
        apply(&mut state)
    }

    fn note_mut<'a>(state: &'a mut State, id: &NoteId) -> StoreResult<&'a mut Note> {
        state
            .notes
            .iter_mut()
            .find(|n| n.id() == id)
            .ok_or_else(|| StoreError::NotFound { id: id.to_string() })
    }
}

#[async_trait]
impl Storage for MemoryStore {
    fn notes(&self) -> Subscription<Vec<Note>> {
        self.notes.subscribe()
    }

    fn flashcards(&self) -> Subscription<Vec<Flashcard>> {
        self.flashcards.subscribe()
    }

    fn nested_tag_groups(&self) -> Subscription<NestedTagGroups> {
        self.hierarchy.subscribe()
    }

    async fn create_note(&self, title: &str) -> StoreResult<NoteMetadata> {
        let now = self.clock.now_millis();
        self.write(StoreCall::CreateNote(title.to_string()), |state| {
            let note = Note::new(NoteId::new(), title, "", now);
            let metadata = note.metadata();
            state.notes.push(note);
            self.notes.set(state.notes.clone());
            Ok(metadata)
        })
    }

    async fn rename_file(&self, id: &NoteId, new_title: &str) -> StoreResult<()> {
        let now = self.clock.now_millis();
        self.write(
            StoreCall::RenameFile(id.clone(), new_title.to_string()),
            |state| {
                Self::note_mut(state, id)?.set_title(new_title, now);
                self.notes.set(state.notes.clone());
                Ok(())
            },
        )
    }

    async fn delete_file(&self, id: &NoteId) -> StoreResult<()> {
        self.write(StoreCall::DeleteFile(id.clone()), |state| {
            let before = state.notes.len();
            state.notes.retain(|n| n.id() != id);
            if state.notes.len() == before {
                return Err(StoreError::NotFound { id: id.to_string() });
            }
            self.notes.set(state.notes.clone());
            Ok(())
        })
    }

    async fn save_content(&self, id: &NoteId, content: &str, notify: bool) -> StoreResult<()> {
        let now = self.clock.now_millis();
        self.write(StoreCall::SaveContent(id.clone()), |state| {
            Self::note_mut(state, id)?.set_content(content, now);
            if notify {
                self.notes.set(state.notes.clone());
            }
            Ok(())
        })
    }

    async fn save_nested_tag_groups(&self, mapping: &NestedTagGroups) -> StoreResult<()> {
        self.write(StoreCall::SaveNestedTagGroups, |state| {
            state.hierarchy = mapping.clone();
            self.hierarchy.set(mapping.clone());
            Ok(())
        })
    }

    async fn save_flashcard(&self, card: &Flashcard) -> StoreResult<()> {
        self.write(StoreCall::SaveFlashcard(card.id.clone()), |state| {
            match state.flashcards.iter_mut().find(|c| c.id == card.id) {
                Some(existing) => *existing = card.clone(),
                None => state.flashcards.push(card.clone()),
            }
            self.flashcards.set(state.flashcards.clone());
            Ok(())
        })
    }

    async fn delete_flashcard(&self, id: &FlashcardId) -> StoreResult<()> {
        self.write(StoreCall::DeleteFlashcard(id.clone()), |state| {
            let before = state.flashcards.len();
            state.flashcards.retain(|c| &c.id != id);
            if state.flashcards.len() == before {
                return Err(StoreError::NotFound { id: id.to_string() });
            }
            self.flashcards.set(state.flashcards.clone());
            Ok(())
        })
    }
}
