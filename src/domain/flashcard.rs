//! Flashcards and their spaced-repetition learning state.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use ulid::Ulid;

/// Lowest easiness factor a card can reach.
pub const MIN_EASINESS_FACTOR: f64 = 1.3;

/// Easiness factor of a card that was never rated.
pub const DEFAULT_EASINESS_FACTOR: f64 = 2.5;

/// Opaque flashcard identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlashcardId(String);

impl FlashcardId {
    /// Creates a new ULID-based identifier.
    pub fn new() -> Self {
        Self(Ulid::new().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for FlashcardId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for FlashcardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for FlashcardId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// SM-2 learning state of a card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningData {
    pub easiness_factor: f64,
    pub num_repetitions: u32,
    /// `None` until the card is rated for the first time.
    pub prev_repetition_epoch_millis: Option<i64>,
    pub prev_repetition_interval_millis: i64,
}

impl Default for LearningData {
    fn default() -> Self {
        Self {
            easiness_factor: DEFAULT_EASINESS_FACTOR,
            num_repetitions: 0,
            prev_repetition_epoch_millis: None,
            prev_repetition_interval_millis: 0,
        }
    }
}

/// A two-sided flashcard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flashcard {
    pub id: FlashcardId,
    pub created_epoch_millis: i64,
    pub last_changed_epoch_millis: i64,
    #[serde(default)]
    pub tags: Vec<String>,
    pub side1: String,
    pub side2: String,
    #[serde(default)]
    pub is_two_way: bool,
    #[serde(default)]
    pub learning_data: LearningData,
    /// Cached due time; recomputed by the scheduler whenever the card changes.
    #[serde(default)]
    pub next_repetition_epoch_millis: i64,
}

impl Flashcard {
    /// Creates an unrated card. The due time is filled in by the scheduler.
    pub fn new(side1: impl Into<String>, side2: impl Into<String>, now: i64) -> Self {
        Self {
            id: FlashcardId::new(),
            created_epoch_millis: now,
            last_changed_epoch_millis: now,
            tags: Vec::new(),
            side1: side1.into(),
            side2: side2.into(),
            is_two_way: false,
            learning_data: LearningData::default(),
            next_repetition_epoch_millis: now,
        }
    }

    /// Time the card was last reviewed, or its creation time if never reviewed.
    pub fn last_reviewed_or_created(&self) -> i64 {
        self.learning_data
            .prev_repetition_epoch_millis
            .unwrap_or(self.created_epoch_millis)
    }
}

/// A review rating on the four-point scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Rating {
    /// Total blackout: the card restarts its schedule.
    Blackout,
    Hard,
    Good,
    Easy,
}

impl Rating {
    /// Returns the numeric rating, 0 through 3.
    pub fn value(self) -> u8 {
        match self {
            Rating::Blackout => 0,
            Rating::Hard => 1,
            Rating::Good => 2,
            Rating::Easy => 3,
        }
    }
}

/// Error returned for ratings outside 0..=3.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid rating '{0}': expected 0, 1, 2 or 3")]
pub struct ParseRatingError(String);

impl TryFrom<u8> for Rating {
    type Error = ParseRatingError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Rating::Blackout),
            1 => Ok(Rating::Hard),
            2 => Ok(Rating::Good),
            3 => Ok(Rating::Easy),
            other => Err(ParseRatingError(other.to_string())),
        }
    }
}

impl From<Rating> for u8 {
    fn from(rating: Rating) -> Self {
        rating.value()
    }
}

impl FromStr for Rating {
    type Err = ParseRatingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "0" | "blackout" => Ok(Rating::Blackout),
            "1" | "hard" => Ok(Rating::Hard),
            "2" | "good" => Ok(Rating::Good),
            "3" | "easy" => Ok(Rating::Easy),
            _ => Err(ParseRatingError(s.to_string())),
        }
    }
}
