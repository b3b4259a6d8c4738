//! Tag handlers: tags, tag-parents, tag-move.

use anyhow::{Result, bail};

use super::finish_saves;
use crate::cli::output::{OutputFormat, TagListing, format_millis, print_json};
use crate::cli::{TagMoveArgs, TagParentsArgs, TagsArgs};
use crate::domain::{ROOT_TAG, TAG_DELIMITER, is_synthetic_tag};
use crate::index::{TagGroup, TagHierarchyIndex};
use crate::workspace::Workspace;

pub fn handle_tags(args: &TagsArgs, workspace: &Workspace) -> Result<()> {
    let index = workspace.tag_index();

    let groups: Vec<&TagGroup> = match &args.tag {
        Some(tag) => {
            if index.get_tag_group_for_tag(tag).is_none() && index.hierarchy().children(tag).is_empty()
            {
                bail!("unknown tag: {}", tag);
            }
            index.child_tags(tag)
        }
        None if args.flat => index.tag_groups(),
        None => index.root_tags(),
    };

    let listings: Vec<TagListing> = groups
        .iter()
        .map(|g| TagListing::new(g, child_names(&index, &g.tag)))
        .collect();

    match args.format {
        OutputFormat::Human => {
            if listings.is_empty() {
                println!("No tags found.");
            }
            for listing in &listings {
                let nested = if listing.children.is_empty() {
                    String::new()
                } else {
                    format!("  > {}", listing.children.join(", "))
                };
                println!(
                    "{:<24} {:>5}  {}{}",
                    listing.tag,
                    listing.count,
                    format_millis(listing.newest_note_change_timestamp),
                    nested
                );
            }
        }
        OutputFormat::Json => print_json(listings)?,
    }
    Ok(())
}

pub async fn handle_tag_parents(args: &TagParentsArgs, workspace: &Workspace) -> Result<()> {
    validate_tag(&args.tag)?;
    for parent in &args.parents {
        validate_parent(parent)?;
    }

    let handle = workspace.update_parent_tags(&args.tag, &args.parents);
    finish_saves(handle, "tag hierarchy").await?;

    if args.parents.is_empty() {
        println!("{} is now a top-level tag", args.tag);
    } else {
        println!("{} now under {}", args.tag, args.parents.join(", "));
    }
    Ok(())
}

pub async fn handle_tag_move(args: &TagMoveArgs, workspace: &Workspace) -> Result<()> {
    validate_tag(&args.tag)?;
    validate_parent(&args.from)?;
    validate_parent(&args.to)?;

    let handle = workspace.change_parent_tag(&args.from, &args.to, &args.tag);
    finish_saves(handle, "tag hierarchy").await?;
    println!("Moved {} from {} to {}", args.tag, args.from, args.to);
    Ok(())
}

fn child_names(index: &TagHierarchyIndex, tag: &str) -> Vec<String> {
    index
        .child_tags(tag)
        .into_iter()
        .map(|g| g.tag.clone())
        .collect()
}

// Only content tags can be nested; the synthetic groups stay at the top.
fn validate_tag(tag: &str) -> Result<()> {
    if !tag.starts_with(TAG_DELIMITER) || tag.len() == 1 || is_synthetic_tag(tag) {
        bail!("invalid tag '{}': tags start with '{}'", tag, TAG_DELIMITER);
    }
    Ok(())
}

fn validate_parent(tag: &str) -> Result<()> {
    if tag == ROOT_TAG {
        return Ok(());
    }
    validate_tag(tag)
}
