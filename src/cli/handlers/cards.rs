//! Flashcard handlers: card add|rm|ls, due, rate.

use anyhow::{Result, bail};

use super::finish_saves;
use super::resolve::require_card;
use super::truncate_str;
use crate::cli::output::{CardListing, OutputFormat, format_millis, print_json};
use crate::cli::{CardAddArgs, CardArgs, CardCommand, CardListArgs, CardRmArgs, DueArgs, RateArgs};
use crate::domain::Flashcard;
use crate::workspace::Workspace;

pub async fn handle_card(args: &CardArgs, workspace: &Workspace) -> Result<()> {
    match &args.command {
        CardCommand::Add(args) => handle_card_add(args, workspace).await,
        CardCommand::Rm(args) => handle_card_rm(args, workspace).await,
        CardCommand::Ls(args) => handle_card_list(args, workspace),
    }
}

async fn handle_card_add(args: &CardAddArgs, workspace: &Workspace) -> Result<()> {
    if args.side1.trim().is_empty() {
        bail!("flashcard front side cannot be empty");
    }

    let (card, handle) = workspace.create_flashcard(&args.side1, &args.side2, args.tags.clone());
    finish_saves(handle, "flashcard").await?;

    match args.format {
        OutputFormat::Human => println!(
            "Created flashcard: {} (first review {})",
            card.id,
            format_millis(card.next_repetition_epoch_millis)
        ),
        OutputFormat::Json => print_json(CardListing::from(&card))?,
    }
    Ok(())
}

async fn handle_card_rm(args: &CardRmArgs, workspace: &Workspace) -> Result<()> {
    let card = require_card(&workspace.flashcards(), &args.card)?;
    let Some(handle) = workspace.delete_flashcard(&card.id) else {
        bail!("flashcard not found: {}", args.card);
    };
    finish_saves(handle, "flashcard deletion").await?;
    println!("Deleted flashcard: {}", card.id);
    Ok(())
}

fn handle_card_list(args: &CardListArgs, workspace: &Workspace) -> Result<()> {
    let cards = workspace.flashcards();
    print_cards(&cards, args.format, "No flashcards.")
}

pub fn handle_due(args: &DueArgs, workspace: &Workspace) -> Result<()> {
    let due = workspace.refresh_due();
    print_cards(&due, args.format, "Nothing due.")
}

pub async fn handle_rate(args: &RateArgs, workspace: &Workspace) -> Result<()> {
    let card = require_card(&workspace.flashcards(), &args.card)?;
    let Some((rated, handle)) = workspace.submit_flashcard_rating(&card.id, args.rating) else {
        bail!("flashcard not found: {}", args.card);
    };
    finish_saves(handle, "flashcard").await?;

    match args.format {
        OutputFormat::Human => println!(
            "Rated {}: next review {} (repetitions {}, easiness {:.2})",
            rated.id,
            format_millis(rated.next_repetition_epoch_millis),
            rated.learning_data.num_repetitions,
            rated.learning_data.easiness_factor
        ),
        OutputFormat::Json => print_json(CardListing::from(&rated))?,
    }
    Ok(())
}

fn print_cards(cards: &[Flashcard], format: OutputFormat, empty: &str) -> Result<()> {
    match format {
        OutputFormat::Human => {
            if cards.is_empty() {
                println!("{}", empty);
                return Ok(());
            }
            for card in cards {
                println!(
                    "{}  {:<40}  {}",
                    card.id,
                    truncate_str(&card.side1, 40),
                    format_millis(card.next_repetition_epoch_millis)
                );
            }
            println!();
            println!("{} card(s)", cards.len());
        }
        OutputFormat::Json => {
            let listings: Vec<CardListing> = cards.iter().map(CardListing::from).collect();
            print_json(listings)?;
        }
    }
    Ok(())
}
