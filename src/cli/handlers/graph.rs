//! Reference graph handlers: graph, backlinks, mv.

use anyhow::{Context, Result};

use super::finish_saves;
use super::notes::print_note_list;
use super::resolve::require_note;
use crate::cli::output::{OutputFormat, RenameListing, print_json};
use crate::cli::{BacklinksArgs, GraphArgs, MvArgs};
use crate::workspace::Workspace;

pub fn handle_graph(args: &GraphArgs, workspace: &Workspace) -> Result<()> {
    let nodes = workspace.graph().graph_representation();

    match args.format {
        OutputFormat::Human => {
            if nodes.is_empty() {
                println!("No notes found.");
            }
            for node in &nodes {
                if node.connected_to.is_empty() {
                    println!("{}", node.note_title);
                } else {
                    println!("{} -> {}", node.note_title, node.connected_to.join(", "));
                }
            }
        }
        OutputFormat::Json => print_json(&nodes)?,
    }
    Ok(())
}

pub fn handle_backlinks(args: &BacklinksArgs, workspace: &Workspace) -> Result<()> {
    let graph = workspace.graph();
    let note = require_note(&graph, &args.note)?;
    let backlinks = graph.backreferences(note.id());

    if matches!(args.format, OutputFormat::Human) && backlinks.is_empty() {
        println!("No notes reference '{}'.", note.title());
        return Ok(());
    }
    print_note_list(&backlinks, args.format)
}

pub async fn handle_mv(args: &MvArgs, workspace: &Workspace) -> Result<()> {
    let graph = workspace.graph();
    let note = require_note(&graph, &args.note)?;
    let new_title = graph
        .validate_new_title(&args.title, Some(note.id()))
        .with_context(|| format!("failed to rename '{}'", note.title()))?;

    let outcome = workspace
        .rename_note(note.id(), &new_title)
        .with_context(|| format!("note not found: {}", args.note))?;

    let listing = RenameListing {
        id: note.id().to_string(),
        old_title: note.title().to_string(),
        new_title,
        renamed_note_count: outcome.renamed_note_count,
        renamed_back_ref_count: outcome.renamed_back_ref_count,
    };
    finish_saves(outcome.completion, "rename").await?;

    match args.format {
        OutputFormat::Human => println!(
            "Renamed '{}' to '{}' ({} reference(s) in {} note(s) updated)",
            listing.old_title,
            listing.new_title,
            listing.renamed_back_ref_count,
            listing.renamed_note_count
        ),
        OutputFormat::Json => print_json(listing)?,
    }
    Ok(())
}
