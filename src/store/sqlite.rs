//! SQLite-backed storage for a local vault.

use async_trait::async_trait;
use rusqlite::{Connection, OptionalExtension, params};
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use super::schema::{NESTED_TAG_GROUPS_KEY, create_schema};
use super::{Storage, StoreError, StoreResult};
use crate::clock::{Clock, SystemClock};
use crate::domain::{Flashcard, FlashcardId, Note, NoteId, NoteMetadata};
use crate::index::NestedTagGroups;
use crate::signal::{Signal, Subscription};

// ===========================================
// SqliteStore Struct
// ===========================================

/// Storage backed by a single SQLite file.
///
/// Snapshots are loaded when the store is opened and reloaded after every
/// write that changes them.
pub struct SqliteStore {
    conn: Mutex<Connection>,
    clock: Arc<dyn Clock>,
    notes: Signal<Vec<Note>>,
    flashcards: Signal<Vec<Flashcard>>,
    hierarchy: Signal<NestedTagGroups>,
}

impl SqliteStore {
    // ===========================================
    // Connections
    // ===========================================

    /// Opens an in-memory vault.
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn)
    }

    /// Opens or creates a vault at the given path.
    ///
    /// Creates parent directories if they don't exist.
    pub fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent).map_err(|e| StoreError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> StoreResult<Self> {
        create_schema(&conn)?;
        let store = Self {
            conn: Mutex::new(conn),
            clock: Arc::new(SystemClock),
            notes: Signal::new(),
            flashcards: Signal::new(),
            hierarchy: Signal::new(),
        };
        {
            let conn = store.conn()?;
            store.publish_notes(&conn)?;
            store.publish_flashcards(&conn)?;
            store.publish_hierarchy(&conn)?;
        }
        tracing::debug!("vault opened");
        Ok(store)
    }

    /// Uses `clock` for the change times the store assigns.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    fn conn(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Unavailable("vault connection lock poisoned".to_string()))
    }

    // ===========================================
    // Loading
    // ===========================================

    fn publish_notes(&self, conn: &Connection) -> StoreResult<()> {
        self.notes.set(load_notes(conn)?);
        Ok(())
    }

    fn publish_flashcards(&self, conn: &Connection) -> StoreResult<()> {
        self.flashcards.set(load_flashcards(conn)?);
        Ok(())
    }

    fn publish_hierarchy(&self, conn: &Connection) -> StoreResult<()> {
        self.hierarchy.set(load_hierarchy(conn)?);
        Ok(())
    }
}

fn load_notes(conn: &Connection) -> StoreResult<Vec<Note>> {
    let mut stmt =
        conn.prepare("SELECT id, title, content, last_changed FROM notes ORDER BY rowid")?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, i64>(3)?,
        ))
    })?;

    let mut notes = Vec::new();
    for row in rows {
        let (id, title, content, last_changed) = row?;
        let id: NoteId = id
            .parse()
            .map_err(|e| StoreError::Corrupt(format!("invalid note id in vault: {e}")))?;
        notes.push(Note::new(id, title, content, last_changed));
    }
    Ok(notes)
}

fn load_flashcards(conn: &Connection) -> StoreResult<Vec<Flashcard>> {
    let mut stmt = conn.prepare("SELECT data FROM flashcards ORDER BY created, rowid")?;
    let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

    let mut cards = Vec::new();
    for data in rows {
        cards.push(serde_json::from_str(&data?)?);
    }
    Ok(cards)
}

fn load_hierarchy(conn: &Connection) -> StoreResult<NestedTagGroups> {
    let value: Option<String> = conn
        .query_row(
            "SELECT value FROM settings WHERE key = ?",
            [NESTED_TAG_GROUPS_KEY],
            |row| row.get(0),
        )
        .optional()?;
    match value {
        Some(json) => Ok(serde_json::from_str(&json)?),
        None => Ok(NestedTagGroups::new()),
    }
}

fn ensure_changed(changed: usize, id: &impl ToString) -> StoreResult<()> {
    if changed == 0 {
        return Err(StoreError::NotFound { id: id.to_string() });
    }
    Ok(())
}

// ===========================================
// Storage Implementation
// ===========================================

#[async_trait]
impl Storage for SqliteStore {
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
        let note = Note::new(NoteId::new(), title, "", self.clock.now_millis());
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO notes (id, title, content, last_changed) VALUES (?1, ?2, '', ?3)",
            params![note.id().as_str(), note.title(), note.last_changed()],
        )?;
        self.publish_notes(&conn)?;
        tracing::debug!(id = %note.id(), "note created");
        Ok(note.metadata())
    }

    async fn rename_file(&self, id: &NoteId, new_title: &str) -> StoreResult<()> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE notes SET title = ?1, last_changed = ?2 WHERE id = ?3",
            params![new_title, self.clock.now_millis(), id.as_str()],
        )?;
        ensure_changed(changed, id)?;
        self.publish_notes(&conn)
    }

    async fn delete_file(&self, id: &NoteId) -> StoreResult<()> {
        let conn = self.conn()?;
        let changed = conn.execute("DELETE FROM notes WHERE id = ?", [id.as_str()])?;
        ensure_changed(changed, id)?;
        self.publish_notes(&conn)
    }

    async fn save_content(&self, id: &NoteId, content: &str, notify: bool) -> StoreResult<()> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE notes SET content = ?1, last_changed = ?2 WHERE id = ?3",
            params![content, self.clock.now_millis(), id.as_str()],
        )?;
        ensure_changed(changed, id)?;
        if notify {
            self.publish_notes(&conn)?;
        }
        Ok(())
    }

    async fn save_nested_tag_groups(&self, mapping: &NestedTagGroups) -> StoreResult<()> {
        let json = serde_json::to_string(mapping)?;
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO settings (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![NESTED_TAG_GROUPS_KEY, json],
        )?;
        self.publish_hierarchy(&conn)
    }

    async fn save_flashcard(&self, card: &Flashcard) -> StoreResult<()> {
        let json = serde_json::to_string(card)?;
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO flashcards (id, created, data) VALUES (?1, ?2, ?3)
             ON CONFLICT(id) DO UPDATE SET data = excluded.data",
            params![card.id.as_str(), card.created_epoch_millis, json],
        )?;
        self.publish_flashcards(&conn)
    }

    async fn delete_flashcard(&self, id: &FlashcardId) -> StoreResult<()> {
        let conn = self.conn()?;
        let changed = conn.execute("DELETE FROM flashcards WHERE id = ?", [id.as_str()])?;
        ensure_changed(changed, id)?;
        self.publish_flashcards(&conn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn store() -> SqliteStore {
        SqliteStore::open_in_memory()
            .unwrap()
            .with_clock(Arc::new(ManualClock::new(1_000)))
    }

    #[tokio::test]
    async fn empty_vault_publishes_empty_snapshots() {
        let store = store();
        assert!(store.notes().next().await.unwrap().is_empty());
        assert!(store.flashcards().next().await.unwrap().is_empty());
        assert!(store.nested_tag_groups().next().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn notes_keep_creation_order() {
        let store = store();
        store.create_note("B").await.unwrap();
        store.create_note("A").await.unwrap();

        let notes = store.notes().next().await.unwrap();
        let titles: Vec<&str> = notes.iter().map(|n| n.title()).collect();
        assert_eq!(titles, vec!["B", "A"]);
        assert_eq!(notes[0].last_changed(), 1_000);
    }

    #[tokio::test]
    async fn rename_and_save_content() {
        let store = store();
        let meta = store.create_note("Old").await.unwrap();
        store.rename_file(&meta.id, "New").await.unwrap();
        store.save_content(&meta.id, "body #tag", true).await.unwrap();

        let notes = store.notes().next().await.unwrap();
        assert_eq!(notes[0].title(), "New");
        assert_eq!(notes[0].content(), "body #tag");
    }

    #[tokio::test]
    async fn save_content_without_notify_defers_publish() {
        let store = store();
        let meta = store.create_note("A").await.unwrap();
        store.save_content(&meta.id, "quiet", false).await.unwrap();
        assert_eq!(store.notes().next().await.unwrap()[0].content(), "");

        store.rename_file(&meta.id, "A").await.unwrap();
        assert_eq!(store.notes().next().await.unwrap()[0].content(), "quiet");
    }

    #[tokio::test]
    async fn missing_note_is_not_found() {
        let store = store();
        let id: NoteId = "ghost".parse().unwrap();
        assert!(matches!(
            store.delete_file(&id).await,
            Err(StoreError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn hierarchy_round_trips() {
        let store = store();
        let mapping = NestedTagGroups::from([("#a", &["#b", "#c"][..])]);
        store.save_nested_tag_groups(&mapping).await.unwrap();
        assert_eq!(*store.nested_tag_groups().next().await.unwrap(), mapping);
    }

    #[tokio::test]
    async fn flashcards_upsert_and_delete() {
        let store = store();
        let mut card = Flashcard::new("front", "back", 5);
        store.save_flashcard(&card).await.unwrap();
        card.side1 = "edited".to_string();
        store.save_flashcard(&card).await.unwrap();

        let cards = store.flashcards().next().await.unwrap();
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].side1, "edited");

        store.delete_flashcard(&card.id).await.unwrap();
        assert!(store.flashcards().next().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn vault_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("vault.db");
        {
            let store = SqliteStore::open(&path).unwrap();
            store.create_note("Persisted").await.unwrap();
        }
        let store = SqliteStore::open(&path).unwrap();
        let notes = store.notes().next().await.unwrap();
        assert_eq!(notes[0].title(), "Persisted");
    }
}
