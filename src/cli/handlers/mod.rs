//! Command handlers for the CLI.

mod cards;
mod completions;
mod graph;
mod notes;
mod resolve;
mod tags;

use anyhow::{Context, Result, bail};
use std::path::Path;
use std::sync::Arc;

use crate::cli::config::Config;
use crate::clock::SystemClock;
use crate::notify::LogNotifier;
use crate::store::SqliteStore;
use crate::workspace::{SaveHandle, Workspace};

// Re-export public items
pub use cards::{handle_card, handle_due, handle_rate};
pub use completions::handle_completions;
pub use graph::{handle_backlinks, handle_graph, handle_mv};
pub use notes::{handle_list, handle_new, handle_rm, handle_search, handle_show, handle_write};
pub use resolve::{ResolveResult, resolve_note};
pub use tags::{handle_tag_move, handle_tag_parents, handle_tags};

// ===========================================
// Shared Utilities
// ===========================================

/// Opens the vault under `notes_dir` and waits for the workspace to load it.
pub(crate) async fn open_workspace(notes_dir: &Path, config: &Config) -> Result<Workspace> {
    let db_path = Config::vault_path(notes_dir);
    let store = SqliteStore::open(&db_path)
        .with_context(|| format!("failed to open vault at {}", db_path.display()))?;

    let workspace = Workspace::start(
        Arc::new(store),
        Arc::new(LogNotifier),
        Arc::new(SystemClock),
        config.workspace_config(),
    );
    workspace.ready().await;
    Ok(workspace)
}

/// Waits for background saves, failing if any of them did.
pub(crate) async fn finish_saves(handle: SaveHandle, what: &str) -> Result<()> {
    let report = handle.wait().await;
    if !report.is_ok() {
        bail!(
            "failed to save {}: {} of {} writes failed",
            what,
            report.failed,
            report.failed + report.succeeded
        );
    }
    Ok(())
}

/// Truncates a string to a maximum display width, adding ellipsis if needed.
pub(crate) fn truncate_str(s: &str, max_width: usize) -> String {
    if s.chars().count() <= max_width {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_width.saturating_sub(1)).collect();
        format!("{}…", truncated)
    }
}
