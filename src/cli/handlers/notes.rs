//! Note command handlers: new, write, show, ls, search, rm.

use anyhow::{Context, Result, bail};
use std::io::Read;

use super::resolve::require_note;
use super::{finish_saves, truncate_str};
use crate::cli::output::{NoteDetail, NoteListing, OutputFormat, format_millis, print_json};
use crate::cli::{ListArgs, NewArgs, RmArgs, SearchArgs, ShowArgs, WriteArgs};
use crate::domain::Note;
use crate::workspace::Workspace;

pub async fn handle_new(args: &NewArgs, workspace: &Workspace) -> Result<()> {
    let note = workspace
        .create_note(&args.title)
        .await
        .with_context(|| format!("failed to create note '{}'", args.title))?;

    if let Some(content) = &args.content {
        let Some(handle) = workspace.save_content(note.id(), content, true) else {
            bail!("note vanished after creation: {}", note.id());
        };
        finish_saves(handle, "note content").await?;
    }

    match args.format {
        OutputFormat::Human => println!("Created note: {} ({})", note.title(), note.id()),
        OutputFormat::Json => print_json(NoteListing::from(&note))?,
    }
    Ok(())
}

pub async fn handle_write(args: &WriteArgs, workspace: &Workspace) -> Result<()> {
    let note = require_note(&workspace.graph(), &args.note)?;

    let input = match &args.content {
        Some(content) => content.clone(),
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read content from stdin")?;
            buf
        }
    };
    let content = if args.append && !note.content().is_empty() {
        format!("{}\n{}", note.content(), input)
    } else {
        input
    };

    let Some(handle) = workspace.save_content(note.id(), &content, true) else {
        bail!("note not found: {}", args.note);
    };
    finish_saves(handle, "note content").await?;
    println!("Saved: {}", note.title());
    Ok(())
}

pub fn handle_show(args: &ShowArgs, workspace: &Workspace) -> Result<()> {
    let graph = workspace.graph();
    let note = require_note(&graph, &args.note)?;

    let references: Vec<String> = graph
        .references_from(&note)
        .into_iter()
        .map(|r| r.title)
        .collect();
    let unresolved = graph.unresolved_references(note.id());
    let backlinks: Vec<&Note> = graph.backreferences(note.id());

    match args.format {
        OutputFormat::Human => {
            println!("# {}", note.title());
            println!("id: {}  changed: {}", note.id(), format_millis(note.last_changed()));
            println!();
            if !note.content().is_empty() {
                println!("{}", note.content());
                println!();
            }
            if !references.is_empty() {
                println!("References: {}", references.join(", "));
            }
            if !unresolved.is_empty() {
                println!("Unresolved: {}", unresolved.join(", "));
            }
            if !backlinks.is_empty() {
                let titles: Vec<&str> = backlinks.iter().map(|n| n.title()).collect();
                println!("Backlinks: {}", titles.join(", "));
            }
        }
        OutputFormat::Json => print_json(NoteDetail {
            id: note.id().to_string(),
            title: note.title().to_string(),
            content: note.content().to_string(),
            last_changed: note.last_changed(),
            references,
            unresolved,
            backlinks: backlinks.into_iter().map(NoteListing::from).collect(),
        })?,
    }
    Ok(())
}

pub fn handle_list(args: &ListArgs, workspace: &Workspace) -> Result<()> {
    let graph = workspace.graph();

    let mut notes: Vec<&Note> = match &args.tag {
        Some(tag) => {
            let tags = workspace.tag_index();
            let Some(group) = tags.get_tag_group_for_tag(tag) else {
                bail!("no notes tagged {}", tag);
            };
            group
                .note_ids
                .iter()
                .filter_map(|id| graph.get_note(id))
                .collect()
        }
        None => graph.notes().iter().collect(),
    };

    // Most recently changed first
    notes.sort_by_key(|n| std::cmp::Reverse(n.last_changed()));

    print_note_list(&notes, args.format)
}

pub fn handle_search(args: &SearchArgs, workspace: &Workspace) -> Result<()> {
    let graph = workspace.graph();
    let notes = graph.search(&args.query);
    print_note_list(&notes, args.format)
}

pub async fn handle_rm(args: &RmArgs, workspace: &Workspace) -> Result<()> {
    let note = require_note(&workspace.graph(), &args.note)?;
    let Some(handle) = workspace.delete_note(note.id()) else {
        bail!("note not found: {}", args.note);
    };
    finish_saves(handle, "note deletion").await?;
    println!("Deleted note: {}", note.title());
    Ok(())
}

pub(crate) fn print_note_list(notes: &[&Note], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Human => {
            if notes.is_empty() {
                println!("No notes found.");
                return Ok(());
            }
            println!("{:<10}  {:<50}  {:>16}", "ID", "Title", "Changed");
            println!(
                "{:<10}  {:<50}  {:>16}",
                "----------",
                "--------------------------------------------------",
                "----------------"
            );
            for note in notes {
                println!(
                    "{:<10}  {:<50}  {:>16}",
                    note.id().prefix(),
                    truncate_str(note.title(), 50),
                    format_millis(note.last_changed())
                );
            }
            println!();
            println!("{} note(s)", notes.len());
        }
        OutputFormat::Json => {
            let listings: Vec<NoteListing> = notes.iter().map(|n| NoteListing::from(*n)).collect();
            print_json(listings)?;
        }
    }
    Ok(())
}
