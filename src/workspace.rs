//! The workspace: live indices over a storage backend plus the mutating
//! operations on notes, tags and flashcards.
//!
//! A [`Workspace`] is built explicitly by the entry point. It subscribes to
//! the storage snapshot streams and republishes derived state (the note
//! graph, tag groups, the due queue) through [`Signal`]s. Local edits are
//! applied to that state first and persisted in the background; a failed
//! save is reported through the [`Notifier`] and never rolled back.

use futures::future::join_all;
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;

use crate::clock::Clock;
use crate::domain::{Flashcard, FlashcardId, Note, NoteId, Rating, TitleError};
use crate::index::{NestedTagGroups, NoteGraphIndex, Recency, TagHierarchyIndex, plan_rename};
use crate::notify::{Notification, Notifier};
use crate::review::{Scheduler, SchedulerConfig};
use crate::signal::{Signal, Subscription, debounced};
use crate::store::{Storage, StoreError, StoreResult};

/// Quiet period before an incoming flashcard snapshot is merged.
pub const DEFAULT_FLASHCARD_DEBOUNCE: Duration = Duration::from_millis(500);

/// Errors from workspace operations that wait on storage or validate input.
#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error(transparent)]
    Title(#[from] TitleError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Settings for a [`Workspace`].
#[derive(Debug, Clone)]
pub struct WorkspaceConfig {
    /// Tags left out of tag groups.
    pub ignored_tags: HashSet<String>,
    pub recency: Recency,
    pub scheduler: SchedulerConfig,
    pub flashcard_debounce: Duration,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            ignored_tags: HashSet::new(),
            recency: Recency::default(),
            scheduler: SchedulerConfig::default(),
            flashcard_debounce: DEFAULT_FLASHCARD_DEBOUNCE,
        }
    }
}

// ===========================================
// Save Handles
// ===========================================

/// Outcome of a background persist.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaveReport {
    pub succeeded: usize,
    pub failed: usize,
}

impl SaveReport {
    pub fn is_ok(&self) -> bool {
        self.failed == 0
    }
}

/// Handle to the storage writes started by a local edit.
///
/// Dropping the handle does not cancel the writes.
#[derive(Debug)]
pub struct SaveHandle {
    task: JoinHandle<SaveReport>,
}

impl SaveHandle {
    /// Waits for the writes to finish.
    pub async fn wait(self) -> SaveReport {
        self.task.await.unwrap_or_else(|err| {
            tracing::error!(error = %err, "save task did not complete");
            SaveReport {
                succeeded: 0,
                failed: 1,
            }
        })
    }
}

/// Result of a rename: counts are known immediately, the writes finish later.
#[derive(Debug)]
pub struct RenameOutcome {
    pub renamed_note_count: usize,
    pub renamed_back_ref_count: usize,
    pub completion: SaveHandle,
}

// ===========================================
// Workspace
// ===========================================

struct Shared {
    storage: Arc<dyn Storage>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    scheduler: Scheduler,
    recency: Recency,
    graph: Signal<NoteGraphIndex>,
    ignored_tags: Signal<HashSet<String>>,
    hierarchy: Signal<NestedTagGroups>,
    tag_index: Signal<TagHierarchyIndex>,
    flashcards: Signal<Vec<Flashcard>>,
    due_flashcards: Signal<Vec<Flashcard>>,
}

/// Live note, tag and flashcard state over one storage backend.
pub struct Workspace {
    shared: Arc<Shared>,
    tasks: Vec<JoinHandle<()>>,
}

impl Workspace {
    /// Wires `storage` into a new workspace.
    ///
    /// Must be called from within a tokio runtime: the subscription tasks
    /// are spawned immediately and live until the workspace is dropped.
    pub fn start(
        storage: Arc<dyn Storage>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
        config: WorkspaceConfig,
    ) -> Self {
        let shared = Arc::new(Shared {
            storage,
            notifier,
            clock,
            scheduler: Scheduler::new(config.scheduler),
            recency: config.recency,
            graph: Signal::new(),
            ignored_tags: Signal::with_value(config.ignored_tags),
            hierarchy: Signal::new(),
            tag_index: Signal::new(),
            flashcards: Signal::new(),
            due_flashcards: Signal::new(),
        });

        let tasks = vec![
            tokio::spawn(pump_notes(Arc::clone(&shared))),
            tokio::spawn(pump_hierarchy(Arc::clone(&shared))),
            tokio::spawn(join_tag_index(Arc::clone(&shared))),
            tokio::spawn(pump_flashcards(
                Arc::clone(&shared),
                config.flashcard_debounce,
            )),
        ];

        Self { shared, tasks }
    }

    /// Waits until storage has delivered its first snapshots and the
    /// derived indices have been computed from them.
    pub async fn ready(&self) {
        self.shared.graph.subscribe().wait_for(|_| true).await;
        self.shared.tag_index.subscribe().wait_for(|_| true).await;
        self.shared.flashcards.subscribe().wait_for(|_| true).await;
    }

    // ===========================================
    // Snapshots
    // ===========================================

    pub fn graph(&self) -> Arc<NoteGraphIndex> {
        self.shared.graph.get().unwrap_or_default()
    }

    pub fn tag_index(&self) -> Arc<TagHierarchyIndex> {
        self.shared.tag_index.get().unwrap_or_default()
    }

    pub fn hierarchy(&self) -> Arc<NestedTagGroups> {
        self.shared.hierarchy.get().unwrap_or_default()
    }

    pub fn ignored_tags(&self) -> Arc<HashSet<String>> {
        self.shared.ignored_tags.get().unwrap_or_default()
    }

    pub fn flashcards(&self) -> Arc<Vec<Flashcard>> {
        self.shared.flashcards.get().unwrap_or_default()
    }

    /// Returns the due queue as of the last flashcard change or
    /// [`refresh_due`](Self::refresh_due).
    pub fn due_flashcards(&self) -> Arc<Vec<Flashcard>> {
        self.shared.due_flashcards.get().unwrap_or_default()
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.shared.scheduler
    }

    pub fn subscribe_graph(&self) -> Subscription<NoteGraphIndex> {
        self.shared.graph.subscribe()
    }

    pub fn subscribe_tag_index(&self) -> Subscription<TagHierarchyIndex> {
        self.shared.tag_index.subscribe()
    }

    pub fn subscribe_flashcards(&self) -> Subscription<Vec<Flashcard>> {
        self.shared.flashcards.subscribe()
    }

    pub fn subscribe_due_flashcards(&self) -> Subscription<Vec<Flashcard>> {
        self.shared.due_flashcards.subscribe()
    }

    // ===========================================
    // Notes
    // ===========================================

    /// Creates a note after validating its title against the current graph.
    pub async fn create_note(&self, title: &str) -> Result<Note, WorkspaceError> {
        let title = self.graph().validate_new_title(title, None)?;
        let note = self.shared.storage.create_note(&title).await?.into_note();

        self.shared.graph.update(|graph| {
            if graph.is_some_and(|g| g.get_note(note.id()).is_some()) {
                return None;
            }
            let mut notes = graph.map(|g| g.notes().to_vec()).unwrap_or_default();
            notes.push(note.clone());
            Some((NoteGraphIndex::new(notes), ()))
        });
        tracing::info!(id = %note.id(), title = note.title(), "note created");
        Ok(note)
    }

    /// Replaces a note body. Returns `None` for an unknown note.
    pub fn save_content(&self, id: &NoteId, content: &str, notify: bool) -> Option<SaveHandle> {
        let now = self.shared.clock.now_millis();
        let title = self.shared.graph.update(|graph| {
            let graph = graph?;
            let mut notes = graph.notes().to_vec();
            let note = notes.iter_mut().find(|n| n.id() == id)?;
            note.set_content(content, now);
            let title = note.title().to_string();
            Some((NoteGraphIndex::new(notes), title))
        })?;

        let storage = Arc::clone(&self.shared.storage);
        let (id, content) = (id.clone(), content.to_string());
        Some(self.spawn_saves(async move {
            let result = storage.save_content(&id, &content, notify).await;
            vec![(format!("note '{title}'"), result)]
        }))
    }

    /// Deletes a note. Returns `None` for an unknown note.
    pub fn delete_note(&self, id: &NoteId) -> Option<SaveHandle> {
        let title = self.shared.graph.update(|graph| {
            let graph = graph?;
            let title = graph.get_note(id)?.title().to_string();
            let notes = graph.notes().iter().filter(|n| n.id() != id).cloned().collect();
            Some((NoteGraphIndex::new(notes), title))
        })?;

        let storage = Arc::clone(&self.shared.storage);
        let id = id.clone();
        Some(self.spawn_saves(async move {
            let result = storage.delete_file(&id).await;
            vec![(format!("deletion of '{title}'"), result)]
        }))
    }

    /// Renames a note and rewrites every `[[old]]` reference to it.
    ///
    /// The new title and the rewritten bodies are visible locally before
    /// anything is persisted. The file rename is persisted first, then the
    /// rewritten bodies concurrently. Returns `None` for an unknown note.
    ///
    /// The title is applied as given. Callers validate it first, see
    /// [`NoteGraphIndex::validate_new_title`].
    pub fn rename_note(&self, id: &NoteId, new_title: &str) -> Option<RenameOutcome> {
        let now = self.shared.clock.now_millis();

        let plan = self.shared.graph.update(|graph| {
            let graph = graph?;
            let plan = plan_rename(graph, id, new_title)?;
            let mut notes = graph.notes().to_vec();
            plan.apply(&mut notes, now);
            Some((NoteGraphIndex::new(notes), plan))
        });
        let plan = plan?;

        tracing::info!(
            old = %plan.old_title,
            new = %plan.new_title,
            notes = plan.renamed_note_count(),
            references = plan.renamed_back_ref_count(),
            "note renamed"
        );

        let renamed_note_count = plan.renamed_note_count();
        let renamed_back_ref_count = plan.renamed_back_ref_count();
        let storage = Arc::clone(&self.shared.storage);
        let completion = self.spawn_saves(async move {
            let mut results = vec![(
                format!("rename to '{}'", plan.new_title),
                storage.rename_file(&plan.note_id, &plan.new_title).await,
            )];
            let saves = plan.rewrites.iter().map(|rewrite| {
                let storage = &storage;
                async move {
                    let result = storage
                        .save_content(&rewrite.note_id, &rewrite.content, true)
                        .await;
                    (format!("references in note {}", rewrite.note_id), result)
                }
            });
            results.extend(join_all(saves).await);
            results
        });

        Some(RenameOutcome {
            renamed_note_count,
            renamed_back_ref_count,
            completion,
        })
    }

    // ===========================================
    // Tags
    // ===========================================

    /// Moves `child` from `old_parent` to `new_parent` and persists the
    /// whole hierarchy.
    pub fn change_parent_tag(&self, old_parent: &str, new_parent: &str, child: &str) -> SaveHandle {
        self.edit_hierarchy(|mapping| mapping.change_parent_tag(old_parent, new_parent, child))
    }

    /// Replaces the parents of `child` and persists the whole hierarchy.
    pub fn update_parent_tags(&self, child: &str, new_parents: &[String]) -> SaveHandle {
        self.edit_hierarchy(|mapping| mapping.update_parent_tags(child, new_parents))
    }

    /// Replaces the ignored tag set. Tag groups are recomputed.
    pub fn set_ignored_tags(&self, ignored: HashSet<String>) {
        self.shared.ignored_tags.set(ignored);
    }

    fn edit_hierarchy(&self, edit: impl FnOnce(&mut NestedTagGroups) -> bool) -> SaveHandle {
        let mapping = self
            .shared
            .hierarchy
            .update(|current| {
                let mut mapping = current.cloned().unwrap_or_default();
                if !edit(&mut mapping) {
                    tracing::debug!("tag hierarchy unchanged");
                }
                Some((mapping.clone(), mapping))
            })
            .unwrap_or_default();

        let storage = Arc::clone(&self.shared.storage);
        self.spawn_saves(async move {
            let result = storage.save_nested_tag_groups(&mapping).await;
            vec![("tag hierarchy".to_string(), result)]
        })
    }

    // ===========================================
    // Flashcards
    // ===========================================

    /// Adds a new flashcard.
    pub fn create_flashcard(
        &self,
        side1: &str,
        side2: &str,
        tags: Vec<String>,
    ) -> (Flashcard, SaveHandle) {
        let now = self.shared.clock.now_millis();
        let mut card = Flashcard::new(side1, side2, now);
        card.tags = tags;
        self.shared.scheduler.refresh(&mut card);

        self.shared.update_flashcards(|current| {
            let mut cards = current.to_vec();
            cards.push(card.clone());
            Some((cards, ()))
        });

        let storage = Arc::clone(&self.shared.storage);
        let saved = card.clone();
        let handle = self.spawn_saves(async move {
            let result = storage.save_flashcard(&saved).await;
            vec![(format!("flashcard {}", saved.id), result)]
        });
        (card, handle)
    }

    /// Deletes a flashcard. Returns `None` for an unknown card.
    pub fn delete_flashcard(&self, id: &FlashcardId) -> Option<SaveHandle> {
        self.shared.update_flashcards(|current| {
            if !current.iter().any(|c| &c.id == id) {
                return None;
            }
            Some((current.iter().filter(|c| &c.id != id).cloned().collect(), ()))
        })?;

        let storage = Arc::clone(&self.shared.storage);
        let id = id.clone();
        Some(self.spawn_saves(async move {
            let result = storage.delete_flashcard(&id).await;
            vec![(format!("deletion of flashcard {id}"), result)]
        }))
    }

    /// Applies a review rating to a flashcard and persists it.
    ///
    /// The rated card replaces the live copy at once, so the due queue
    /// reflects the rating before storage confirms it. Returns `None` for an
    /// unknown card.
    pub fn submit_flashcard_rating(
        &self,
        id: &FlashcardId,
        rating: Rating,
    ) -> Option<(Flashcard, SaveHandle)> {
        let now = self.shared.clock.now_millis();
        let rated = self.shared.update_flashcards(|current| {
            let mut cards = current.to_vec();
            let card = cards.iter_mut().find(|c| &c.id == id)?;
            self.shared.scheduler.submit_rating(card, rating, now);
            let rated = card.clone();
            Some((cards, rated))
        })?;

        tracing::debug!(
            id = %rated.id,
            rating = rating.value(),
            next = rated.next_repetition_epoch_millis,
            "flashcard rated"
        );

        let storage = Arc::clone(&self.shared.storage);
        let saved = rated.clone();
        let handle = self.spawn_saves(async move {
            let result = storage.save_flashcard(&saved).await;
            vec![(format!("flashcard {}", saved.id), result)]
        });
        Some((rated, handle))
    }

    /// Recomputes the due queue against the current time.
    pub fn refresh_due(&self) -> Arc<Vec<Flashcard>> {
        let now = self.shared.clock.now_millis();
        // Runs under the flashcards lock without replacing the cards.
        self.shared.flashcards.update(|current| {
            let cards = current.map(Vec::as_slice).unwrap_or_default();
            let due = self.shared.scheduler.due_flashcards(cards, now);
            self.shared.due_flashcards.set(due);
            None::<(Vec<Flashcard>, ())>
        });
        self.due_flashcards()
    }

    // ===========================================
    // Persistence
    // ===========================================

    fn spawn_saves<F>(&self, saves: F) -> SaveHandle
    where
        F: Future<Output = Vec<(String, StoreResult<()>)>> + Send + 'static,
    {
        let notifier = Arc::clone(&self.shared.notifier);
        let task = tokio::spawn(async move {
            let mut report = SaveReport::default();
            for (what, result) in saves.await {
                match result {
                    Ok(()) => report.succeeded += 1,
                    Err(err) => {
                        report.failed += 1;
                        tracing::warn!(what = %what, error = %err, "save failed");
                        notifier.notify(Notification::SaveFailed {
                            what,
                            error: err.to_string(),
                        });
                    }
                }
            }
            report
        });
        SaveHandle { task }
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

impl Shared {
    /// Replaces the live flashcards with ones computed from the current
    /// cards. The due queue is derived and published under the same lock,
    /// so no other writer lands in between.
    fn update_flashcards<R>(
        &self,
        f: impl FnOnce(&[Flashcard]) -> Option<(Vec<Flashcard>, R)>,
    ) -> Option<R> {
        self.flashcards.update(|current| {
            let (cards, result) = f(current.map(Vec::as_slice).unwrap_or_default())?;
            let due = self.scheduler.due_flashcards(&cards, self.clock.now_millis());
            self.due_flashcards.set(due);
            Some((cards, result))
        })
    }

    /// Replaces the live flashcards with a storage snapshot.
    ///
    /// Cards sharing an id collapse into one entry at the first position,
    /// holding the last copy. Cached due times are recomputed.
    fn merge_flashcards(&self, incoming: &[Flashcard]) {
        let mut cards: Vec<Flashcard> = Vec::with_capacity(incoming.len());
        let mut positions: HashMap<&FlashcardId, usize> = HashMap::new();
        for card in incoming {
            let mut refreshed = card.clone();
            self.scheduler.refresh(&mut refreshed);
            match positions.get(&card.id) {
                Some(&idx) => cards[idx] = refreshed,
                None => {
                    positions.insert(&card.id, cards.len());
                    cards.push(refreshed);
                }
            }
        }
        tracing::debug!(count = cards.len(), "flashcards merged");
        self.update_flashcards(|_| Some((cards, ())));
    }
}

// ===========================================
// Subscription Tasks
// ===========================================

async fn pump_notes(shared: Arc<Shared>) {
    let mut notes = shared.storage.notes();
    while let Some(snapshot) = notes.next().await {
        let graph = NoteGraphIndex::new(snapshot.to_vec());
        tracing::debug!(notes = graph.len(), "note graph rebuilt");
        shared.graph.set(graph);
    }
}

async fn pump_hierarchy(shared: Arc<Shared>) {
    let mut hierarchy = shared.storage.nested_tag_groups();
    while let Some(mapping) = hierarchy.next().await {
        shared.hierarchy.set(NestedTagGroups::clone(&mapping));
    }
}

// Recomputes tag groups whenever notes, ignored tags or the hierarchy
// change, once each of them has a value.
async fn join_tag_index(shared: Arc<Shared>) {
    let mut graph = shared.graph.subscribe();
    let mut ignored = shared.ignored_tags.subscribe();
    let mut hierarchy = shared.hierarchy.subscribe();

    loop {
        if let (Some(g), Some(i), Some(h)) = (graph.current(), ignored.current(), hierarchy.current())
        {
            let index = TagHierarchyIndex::new(g.notes(), &i, NestedTagGroups::clone(&h), shared.recency);
            tracing::debug!(notes = g.len(), "tag groups recomputed");
            shared.tag_index.set(index);
        }

        let open = tokio::select! {
            open = graph.changed() => open,
            open = ignored.changed() => open,
            open = hierarchy.changed() => open,
        };
        if !open {
            break;
        }
    }
}

// The first snapshot is applied at once; later ones after a quiet period.
async fn pump_flashcards(shared: Arc<Shared>, quiet: Duration) {
    let mut flashcards = shared.storage.flashcards();
    let Some(first) = flashcards.next().await else {
        return;
    };
    shared.merge_flashcards(&first);

    while let Some(snapshot) = debounced(&mut flashcards, quiet).await {
        shared.merge_flashcards(&snapshot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::notify::RecordingNotifier;
    use crate::store::{MemoryStore, StoreCall};
    use pretty_assertions::assert_eq;

    const NOW: i64 = 1_700_000_000_000;
    const DAY: i64 = 24 * 60 * 60 * 1000;

    struct Fixture {
        ws: Workspace,
        store: Arc<MemoryStore>,
        notifier: Arc<RecordingNotifier>,
    }

    fn note(id: &str, title: &str, content: &str) -> Note {
        Note::new(id.parse().unwrap(), title, content, NOW - DAY)
    }

    fn id(s: &str) -> NoteId {
        s.parse().unwrap()
    }

    async fn fixture(notes: Vec<Note>, cards: Vec<Flashcard>, hierarchy: NestedTagGroups) -> Fixture {
        let clock = Arc::new(ManualClock::new(NOW));
        let store = Arc::new(MemoryStore::new(notes, cards, hierarchy).with_clock(clock.clone()));
        let notifier = Arc::new(RecordingNotifier::new());
        let ws = Workspace::start(
            store.clone(),
            notifier.clone(),
            clock,
            WorkspaceConfig::default(),
        );
        ws.ready().await;
        Fixture { ws, store, notifier }
    }

    fn group_ids(index: &TagHierarchyIndex, tag: &str) -> Vec<String> {
        index
            .get_tag_group_for_tag(tag)
            .map(|g| g.note_ids.iter().map(|id| id.to_string()).collect())
            .unwrap_or_default()
    }

    // ===========================================
    // Derived State
    // ===========================================

    #[tokio::test]
    async fn storage_snapshot_drives_graph_and_tag_groups() {
        let f = fixture(
            vec![note("1", "X", "#t [[Y]]"), note("2", "Y", "")],
            Vec::new(),
            NestedTagGroups::new(),
        )
        .await;

        let tags = f.ws.tag_index();
        assert_eq!(group_ids(&tags, "#t"), vec!["1"]);
        assert_eq!(group_ids(&tags, "all"), vec!["1", "2"]);
        assert_eq!(group_ids(&tags, "untagged"), vec!["2"]);

        let graph = f.ws.graph();
        let backrefs: Vec<&str> = graph.backreferences(&id("2")).iter().map(|n| n.title()).collect();
        assert_eq!(backrefs, vec!["X"]);
    }

    #[tokio::test]
    async fn remote_note_change_rebuilds_indices() {
        let f = fixture(vec![note("1", "A", "")], Vec::new(), NestedTagGroups::new()).await;
        f.store.emit_notes(vec![note("1", "A", "#new")]);

        let index = f
            .ws
            .subscribe_tag_index()
            .wait_for(|i| i.get_tag_group_for_tag("#new").is_some())
            .await
            .unwrap();
        assert_eq!(group_ids(&index, "#new"), vec!["1"]);
    }

    #[tokio::test]
    async fn ignored_tags_recompute_groups() {
        let f = fixture(vec![note("1", "A", "#a #b")], Vec::new(), NestedTagGroups::new()).await;
        f.ws.set_ignored_tags(HashSet::from(["#a".to_string()]));

        let index = f
            .ws
            .subscribe_tag_index()
            .wait_for(|i| i.get_tag_group_for_tag("#a").is_none())
            .await
            .unwrap();
        assert_eq!(group_ids(&index, "#b"), vec!["1"]);
    }

    // ===========================================
    // Note Mutations
    // ===========================================

    #[tokio::test]
    async fn create_note_validates_title() {
        let f = fixture(vec![note("1", "Existing", "")], Vec::new(), NestedTagGroups::new()).await;

        let created = f.ws.create_note("  Fresh ").await.unwrap();
        assert_eq!(created.title(), "Fresh");
        assert!(f.ws.graph().get_note(created.id()).is_some());

        let dup = f.ws.create_note("existing").await.unwrap_err();
        assert!(matches!(dup, WorkspaceError::Title(TitleError::Duplicate { .. })));
        let empty = f.ws.create_note("   ").await.unwrap_err();
        assert!(matches!(empty, WorkspaceError::Title(TitleError::Empty)));
    }

    #[tokio::test]
    async fn save_content_is_visible_before_storage_confirms() {
        let f = fixture(vec![note("1", "A", "old")], Vec::new(), NestedTagGroups::new()).await;

        let handle = f.ws.save_content(&id("1"), "new #tag", true).unwrap();
        assert_eq!(f.ws.graph().get_note(&id("1")).unwrap().content(), "new #tag");
        assert_eq!(f.ws.graph().get_note(&id("1")).unwrap().last_changed(), NOW);

        assert_eq!(handle.wait().await, SaveReport { succeeded: 1, failed: 0 });
        assert_eq!(f.store.stored_notes()[0].content(), "new #tag");
    }

    #[tokio::test]
    async fn failed_save_notifies_and_keeps_local_edit() {
        let f = fixture(vec![note("1", "A", "old")], Vec::new(), NestedTagGroups::new()).await;
        f.store.set_fail_writes(true);

        let report = f.ws.save_content(&id("1"), "mine", true).unwrap().wait().await;

        assert!(!report.is_ok());
        assert_eq!(f.ws.graph().get_note(&id("1")).unwrap().content(), "mine");
        let received = f.notifier.received();
        assert_eq!(received.len(), 1);
        assert!(received[0].to_string().starts_with("could not save note 'A'"));
    }

    #[tokio::test]
    async fn unknown_note_mutations_are_no_ops() {
        let f = fixture(vec![note("1", "A", "")], Vec::new(), NestedTagGroups::new()).await;
        assert!(f.ws.save_content(&id("nope"), "x", true).is_none());
        assert!(f.ws.delete_note(&id("nope")).is_none());
        assert!(f.ws.rename_note(&id("nope"), "B").is_none());
        assert!(f.store.calls().is_empty());
    }

    #[tokio::test]
    async fn delete_note_removes_it_locally_and_in_storage() {
        let f = fixture(
            vec![note("1", "A", ""), note("2", "B", "")],
            Vec::new(),
            NestedTagGroups::new(),
        )
        .await;

        let handle = f.ws.delete_note(&id("1")).unwrap();
        assert!(f.ws.graph().get_note(&id("1")).is_none());
        assert!(handle.wait().await.is_ok());
        assert_eq!(f.store.stored_notes().len(), 1);
    }

    #[tokio::test]
    async fn rename_rewrites_backreferences_and_persists_in_order() {
        let f = fixture(
            vec![
                note("1", "A", ""),
                note("2", "B", "see [[A]] and [[A]]"),
                note("3", "C", "[[A]]"),
                note("4", "D", "[[AB]] untouched"),
            ],
            Vec::new(),
            NestedTagGroups::new(),
        )
        .await;

        let outcome = f.ws.rename_note(&id("1"), "Alpha").unwrap();
        assert_eq!(outcome.renamed_note_count, 2);
        assert_eq!(outcome.renamed_back_ref_count, 3);

        let graph = f.ws.graph();
        assert_eq!(graph.get_note(&id("1")).unwrap().title(), "Alpha");
        assert_eq!(
            graph.get_note(&id("2")).unwrap().content(),
            "see [[Alpha]] and [[Alpha]]"
        );
        assert_eq!(graph.get_note(&id("4")).unwrap().content(), "[[AB]] untouched");

        let report = outcome.completion.wait().await;
        assert_eq!(report, SaveReport { succeeded: 3, failed: 0 });

        let calls = f.store.calls();
        assert_eq!(calls[0], StoreCall::RenameFile(id("1"), "Alpha".to_string()));
        let mut saved: Vec<StoreCall> = calls[1..].to_vec();
        saved.sort_by_key(|c| format!("{c:?}"));
        assert_eq!(
            saved,
            vec![StoreCall::SaveContent(id("2")), StoreCall::SaveContent(id("3"))]
        );
        assert_eq!(f.store.stored_notes()[2].content(), "[[Alpha]]");
    }

    #[tokio::test]
    async fn rename_applies_colliding_title_as_given() {
        let f = fixture(
            vec![note("1", "A", ""), note("2", "B", ""), note("3", "C", "[[A]]")],
            Vec::new(),
            NestedTagGroups::new(),
        )
        .await;

        let outcome = f.ws.rename_note(&id("1"), " b ").unwrap();
        assert_eq!(outcome.renamed_back_ref_count, 1);
        assert!(outcome.completion.wait().await.is_ok());

        let graph = f.ws.graph();
        assert_eq!(graph.get_note(&id("1")).unwrap().title(), " b ");
        assert_eq!(graph.get_note(&id("2")).unwrap().title(), "B");
        assert_eq!(graph.get_note(&id("3")).unwrap().content(), "[[ b ]]");
        assert!(f.notifier.received().is_empty());
    }

    // ===========================================
    // Tag Hierarchy
    // ===========================================

    #[tokio::test]
    async fn change_parent_tag_persists_whole_hierarchy() {
        let f = fixture(
            vec![note("1", "A", "#a #b #c")],
            Vec::new(),
            NestedTagGroups::from([("#a", &["#c"][..])]),
        )
        .await;

        let handle = f.ws.change_parent_tag("#a", "#b", "#c");
        assert_eq!(f.ws.hierarchy().children("#b"), ["#c".to_string()]);
        assert!(handle.wait().await.is_ok());

        let stored = f.store.stored_nested_tag_groups();
        assert!(stored.children("#a").is_empty());
        assert_eq!(stored.children("#b"), ["#c".to_string()]);
        assert_eq!(f.store.calls(), vec![StoreCall::SaveNestedTagGroups]);
    }

    #[tokio::test]
    async fn update_parent_tags_moves_child_under_new_parents() {
        let f = fixture(vec![note("1", "A", "#x #y")], Vec::new(), NestedTagGroups::new()).await;

        f.ws.update_parent_tags("#y", &["#x".to_string()]).wait().await;

        let index = f
            .ws
            .subscribe_tag_index()
            .wait_for(|i| !i.child_tags("#x").is_empty())
            .await
            .unwrap();
        let roots: Vec<&str> = index.root_tags().iter().map(|g| g.tag.as_str()).collect();
        assert!(roots.contains(&"#x"));
        assert!(!roots.contains(&"#y"));
    }

    // ===========================================
    // Flashcards
    // ===========================================

    fn due_card(side1: &str) -> Flashcard {
        Flashcard::new(side1, "back", NOW - DAY)
    }

    #[tokio::test]
    async fn snapshot_cards_get_due_times_and_queue() {
        let mut later = Flashcard::new("later", "back", NOW);
        later.next_repetition_epoch_millis = 0;
        let f = fixture(Vec::new(), vec![due_card("due"), later], NestedTagGroups::new()).await;

        let due = f.ws.due_flashcards();
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].side1, "due");
        assert_eq!(f.ws.flashcards()[1].next_repetition_epoch_millis, NOW + 10 * 60 * 1000);
    }

    #[tokio::test]
    async fn rating_updates_queue_immediately() {
        let card = due_card("q");
        let f = fixture(Vec::new(), vec![card.clone()], NestedTagGroups::new()).await;
        assert_eq!(f.ws.due_flashcards().len(), 1);

        let (rated, handle) = f.ws.submit_flashcard_rating(&card.id, Rating::Good).unwrap();
        assert_eq!(rated.learning_data.num_repetitions, 1);
        assert_eq!(rated.next_repetition_epoch_millis, NOW + DAY);
        assert!(f.ws.due_flashcards().is_empty());
        assert_eq!(f.ws.flashcards()[0], rated);

        assert!(handle.wait().await.is_ok());
        assert_eq!(f.store.stored_flashcards()[0], rated);
    }

    #[tokio::test]
    async fn blackout_restarts_initial_schedule() {
        let mut card = due_card("q");
        card.learning_data.num_repetitions = 5;
        let f = fixture(Vec::new(), vec![card.clone()], NestedTagGroups::new()).await;

        let (rated, _) = f.ws.submit_flashcard_rating(&card.id, Rating::Blackout).unwrap();
        assert_eq!(rated.learning_data.num_repetitions, 0);
        assert_eq!(rated.next_repetition_epoch_millis, NOW + 10 * 60 * 1000);
    }

    #[tokio::test]
    async fn unknown_card_is_ignored() {
        let f = fixture(Vec::new(), Vec::new(), NestedTagGroups::new()).await;
        let ghost = FlashcardId::from("ghost");
        assert!(f.ws.submit_flashcard_rating(&ghost, Rating::Easy).is_none());
        assert!(f.ws.delete_flashcard(&ghost).is_none());
    }

    #[tokio::test]
    async fn create_and_delete_flashcard() {
        let f = fixture(Vec::new(), Vec::new(), NestedTagGroups::new()).await;

        let (card, handle) = f.ws.create_flashcard("front", "back", vec!["#lang".to_string()]);
        assert_eq!(f.ws.flashcards().len(), 1);
        assert!(f.ws.due_flashcards().is_empty());
        assert!(handle.wait().await.is_ok());
        assert_eq!(f.store.stored_flashcards()[0].tags, vec!["#lang".to_string()]);

        f.ws.delete_flashcard(&card.id).unwrap().wait().await;
        assert!(f.ws.flashcards().is_empty());
        assert!(f.store.stored_flashcards().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn remote_flashcard_bursts_are_debounced_and_deduplicated() {
        let f = fixture(Vec::new(), Vec::new(), NestedTagGroups::new()).await;
        let a = due_card("a");
        let b = due_card("b");
        let mut b_edited = b.clone();
        b_edited.side1 = "b2".to_string();

        f.store.emit_flashcards(vec![a.clone()]);
        f.store.emit_flashcards(vec![a.clone(), b.clone()]);
        f.store.emit_flashcards(vec![a, b, b_edited]);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(f.ws.flashcards().is_empty());

        tokio::time::sleep(Duration::from_millis(600)).await;
        let cards = f.ws.flashcards();
        let sides: Vec<&str> = cards.iter().map(|c| c.side1.as_str()).collect();
        assert_eq!(sides, vec!["a", "b2"]);
        assert_eq!(f.ws.due_flashcards().len(), 2);
    }

    #[tokio::test]
    async fn refresh_due_picks_up_time_passing() {
        let clock = Arc::new(ManualClock::new(NOW));
        let store = Arc::new(MemoryStore::empty().with_clock(clock.clone()));
        let ws = Workspace::start(
            store,
            Arc::new(RecordingNotifier::new()),
            clock.clone(),
            WorkspaceConfig::default(),
        );
        ws.ready().await;

        ws.create_flashcard("q", "a", Vec::new());
        assert!(ws.refresh_due().is_empty());

        clock.advance(10 * 60 * 1000);
        assert_eq!(ws.refresh_due().len(), 1);
    }

    fn immediate_review_workspace() -> Workspace {
        let clock = Arc::new(ManualClock::new(NOW));
        Workspace::start(
            Arc::new(MemoryStore::empty().with_clock(clock.clone())),
            Arc::new(RecordingNotifier::new()),
            clock,
            WorkspaceConfig {
                scheduler: SchedulerConfig::from_minutes(&[0]),
                flashcard_debounce: Duration::from_secs(3600),
                ..WorkspaceConfig::default()
            },
        )
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_flashcard_edits_are_not_lost() {
        let ws = Arc::new(immediate_review_workspace());
        ws.ready().await;

        let writers: Vec<_> = (0..8)
            .map(|w| {
                let ws = Arc::clone(&ws);
                tokio::spawn(async move {
                    for i in 0..25 {
                        ws.create_flashcard(&format!("{w}-{i}"), "a", Vec::new());
                        tokio::task::yield_now().await;
                    }
                })
            })
            .collect();
        for writer in join_all(writers).await {
            writer.unwrap();
        }

        assert_eq!(ws.flashcards().len(), 200);
        assert_eq!(ws.due_flashcards().len(), 200);
    }

    #[tokio::test]
    async fn due_queue_is_published_with_its_cards() {
        let ws = immediate_review_workspace();
        ws.ready().await;
        let mut due = ws.subscribe_due_flashcards();
        due.current();

        let (card, _) = ws.create_flashcard("q", "a", Vec::new());
        let queue = due.next().await.unwrap();
        assert_eq!(queue.len(), 1);
        assert_eq!(queue[0].id, card.id);
        assert!(ws.flashcards().iter().any(|c| c.id == card.id));

        let (rated, _) = ws.submit_flashcard_rating(&card.id, Rating::Easy).unwrap();
        let queue = due.next().await.unwrap();
        assert_eq!(queue[0], rated);
        assert_eq!(ws.flashcards()[0], rated);
    }
}
