//! SQLite schema for the vault database.

use rusqlite::Connection;

/// Current schema version written to `schema_version`.
pub const SCHEMA_VERSION: i64 = 1;

/// Key under which the tag hierarchy is kept in `settings`.
pub(crate) const NESTED_TAG_GROUPS_KEY: &str = "nested_tag_groups";

/// Creates the vault schema.
///
/// Idempotent: calling it on an existing vault is safe.
///
/// # Tables Created
/// - `notes` - Note titles, bodies and change times
/// - `flashcards` - Flashcards as JSON documents
/// - `settings` - Key/value documents (the tag hierarchy)
/// - `schema_version` - Schema version tracking
pub fn create_schema(conn: &Connection) -> rusqlite::Result<()> {
    // ===========================================
    // Notes
    // ===========================================
    // rowid order is creation order; snapshots are published in it
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS notes (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            content TEXT NOT NULL DEFAULT '',
            last_changed INTEGER NOT NULL
        );",
    )?;

    // ===========================================
    // Flashcards
    // ===========================================
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS flashcards (
            id TEXT PRIMARY KEY,
            created INTEGER NOT NULL,
            data TEXT NOT NULL
        );",
    )?;

    // ===========================================
    // Settings
    // ===========================================
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );",
    )?;

    conn.execute_batch(
        "CREATE INDEX IF NOT EXISTS idx_notes_title ON notes(title);
         CREATE INDEX IF NOT EXISTS idx_flashcards_created ON flashcards(created);",
    )?;

    // ===========================================
    // Schema Version
    // ===========================================
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL
        );",
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version, applied_at) VALUES (?1, datetime('now'))",
        [SCHEMA_VERSION],
    )?;

    Ok(())
}

/// Returns the current schema version.
#[cfg(test)]
fn get_schema_version(conn: &Connection) -> rusqlite::Result<i64> {
    conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| {
        row.get(0)
    })
}
