//! Isolated test environment with temp directory.

// Allow dead code since not every test binary uses every helper
#![allow(dead_code)]

use super::{KastenCommand, TestNote};
use kasten::domain::{Flashcard, FlashcardId, NoteId};
use kasten::store::{SqliteStore, Storage};
use std::future::Future;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Isolated test environment with a temporary vault directory.
///
/// Creates a temp directory that is automatically cleaned up on drop.
/// Notes and flashcards are seeded straight into the vault database, the
/// same file the binary opens.
pub struct TestEnv {
    /// The temporary directory (kept for lifetime management)
    _temp_dir: TempDir,
    /// Path to the vault directory
    notes_dir: PathBuf,
    /// Stand-in for `$XDG_CONFIG_HOME`
    config_home: PathBuf,
}

impl TestEnv {
    /// Creates a new isolated test environment.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let notes_dir = temp_dir.path().join("vault");
        let config_home = temp_dir.path().join("config");
        std::fs::create_dir_all(&notes_dir).expect("Failed to create vault directory");
        std::fs::create_dir_all(&config_home).expect("Failed to create config directory");
        Self {
            _temp_dir: temp_dir,
            notes_dir,
            config_home,
        }
    }

    /// Returns the path to the vault directory.
    pub fn notes_dir(&self) -> &Path {
        &self.notes_dir
    }

    /// Returns the path of the vault database.
    pub fn vault_path(&self) -> PathBuf {
        self.notes_dir.join(".kasten").join("vault.db")
    }

    /// Adds a note to the vault and returns its id.
    pub fn add_note(&self, test_note: &TestNote) -> NoteId {
        let store = self.open_store();
        block_on(async {
            let meta = store
                .create_note(test_note.get_title())
                .await
                .expect("Failed to create test note");
            if !test_note.get_content().is_empty() {
                store
                    .save_content(&meta.id, test_note.get_content(), true)
                    .await
                    .expect("Failed to save test note content");
            }
            meta.id
        })
    }

    /// Adds a flashcard created now and returns its id.
    pub fn add_card(&self, side1: &str, side2: &str) -> FlashcardId {
        let now = chrono::Utc::now().timestamp_millis();
        let card = Flashcard::new(side1, side2, now);
        self.add_flashcard(&card);
        card.id
    }

    /// Stores a prepared flashcard as-is.
    pub fn add_flashcard(&self, card: &Flashcard) {
        let store = self.open_store();
        block_on(store.save_flashcard(card)).expect("Failed to save test flashcard");
    }

    fn open_store(&self) -> SqliteStore {
        SqliteStore::open(&self.vault_path()).expect("Failed to open vault")
    }

    /// Writes `kasten/config.toml` under the isolated config home.
    pub fn write_config(&self, contents: &str) -> PathBuf {
        let dir = self.config_home.join("kasten");
        std::fs::create_dir_all(&dir).expect("Failed to create config dir");
        let path = dir.join("config.toml");
        std::fs::write(&path, contents).expect("Failed to write config");
        path
    }

    /// Creates a KastenCommand configured for this test environment.
    pub fn cmd(&self) -> KastenCommand {
        KastenCommand::new()
            .dir(&self.notes_dir)
            .config_home(&self.config_home)
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

fn block_on<F: Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("Failed to build runtime")
        .block_on(future)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_creates_temp_directory() {
        let env = TestEnv::new();
        assert!(env.notes_dir().is_dir(), "vault directory should exist");
    }

    #[test]
    fn test_env_cleanup_on_drop() {
        let path = {
            let env = TestEnv::new();
            env.notes_dir().to_path_buf()
        };
        assert!(!path.exists(), "temp directory should be cleaned up on drop");
    }

    #[test]
    fn test_env_vault_path() {
        let env = TestEnv::new();
        let vault = env.vault_path();
        assert!(vault.ends_with(".kasten/vault.db"));
        assert!(vault.starts_with(env.notes_dir()));
    }

    #[test]
    fn test_env_provides_command() {
        let env = TestEnv::new();
        let cmd = env.cmd();
        let args = cmd.get_args();
        assert_eq!(args[0], "--dir");
        assert_eq!(args[1], env.notes_dir().to_string_lossy());
    }

    #[test]
    fn test_env_add_note_creates_vault() {
        let env = TestEnv::new();
        let id = env.add_note(&TestNote::new("Seeded").content("body #tag"));
        assert!(env.vault_path().exists(), "vault file should be created");
        assert_eq!(id.as_str().len(), 26);
    }
}
