//! SM-2 style scheduling of flashcard reviews.

use serde::{Deserialize, Serialize};

use crate::domain::{DEFAULT_EASINESS_FACTOR, Flashcard, LearningData, MIN_EASINESS_FACTOR, Rating};

const MINUTE_MILLIS: i64 = 60 * 1000;

/// Which number feeds the easiness update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EasinessScale {
    /// The rating value itself (1 to 3 for passing answers). Every passing
    /// rating lowers easiness, the top rating least.
    #[default]
    Rating,
    /// Classic SM-2 response quality: ratings 1 to 3 become grades 3 to 5,
    /// so the top rating raises easiness.
    Sm2Quality,
}

impl EasinessScale {
    /// The value `q` plugged into the easiness formula.
    pub fn quality(self, rating: Rating) -> f64 {
        match (self, rating) {
            (_, Rating::Blackout) => 0.0,
            (EasinessScale::Rating, other) => f64::from(other.value()),
            (EasinessScale::Sm2Quality, other) => f64::from(other.value() + 2),
        }
    }
}

/// Scheduler settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Delays for the first reviews, indexed by repetition count. Once a card
    /// has been reviewed this many times its interval grows with easiness.
    pub initial_delay_periods_millis: Vec<i64>,
    #[serde(default)]
    pub easiness_scale: EasinessScale,
}

impl SchedulerConfig {
    /// Builds a config from delays in minutes. Delays too large to express in
    /// milliseconds saturate.
    pub fn from_minutes(minutes: &[i64]) -> Self {
        Self {
            initial_delay_periods_millis: minutes
                .iter()
                .map(|m| m.saturating_mul(MINUTE_MILLIS))
                .collect(),
            easiness_scale: EasinessScale::default(),
        }
    }

    pub fn with_easiness_scale(mut self, scale: EasinessScale) -> Self {
        self.easiness_scale = scale;
        self
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        // 10 minutes, 1 day, 3 days
        Self::from_minutes(&[10, 24 * 60, 3 * 24 * 60])
    }
}

/// Returns the easiness factor after answering with `rating`:
/// `max(1.3, ef - 0.8 + 0.28q - 0.02q²)` with `q` taken from `scale`.
pub fn next_easiness_factor(previous: f64, rating: Rating, scale: EasinessScale) -> f64 {
    let q = scale.quality(rating);
    (previous - 0.8 + 0.28 * q - 0.02 * q * q).max(MIN_EASINESS_FACTOR)
}

/// Computes due times and applies ratings.
#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    config: SchedulerConfig,
}

impl Scheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Returns when `card` is next due, in epoch milliseconds.
    pub fn next_repetition_time(&self, card: &Flashcard) -> i64 {
        let data = &card.learning_data;
        let delays = &self.config.initial_delay_periods_millis;

        match delays.get(data.num_repetitions as usize) {
            Some(delay) => card.last_reviewed_or_created().saturating_add(*delay),
            None => {
                let interval = data.prev_repetition_interval_millis as f64 * data.easiness_factor;
                card.last_reviewed_or_created().saturating_add(interval.round() as i64)
            }
        }
    }

    /// Refreshes the cached due time of `card`.
    pub fn refresh(&self, card: &mut Flashcard) {
        card.next_repetition_epoch_millis = self.next_repetition_time(card);
    }

    /// Applies a review rating given at `now`.
    ///
    /// A blackout resets the learning state, so the card starts its initial
    /// delays again counting from `now`. Any other rating advances the card
    /// one repetition.
    pub fn submit_rating(&self, card: &mut Flashcard, rating: Rating, now: i64) {
        card.learning_data = match rating {
            Rating::Blackout => LearningData {
                easiness_factor: DEFAULT_EASINESS_FACTOR,
                num_repetitions: 0,
                prev_repetition_epoch_millis: Some(now),
                prev_repetition_interval_millis: 0,
            },
            _ => {
                let data = &card.learning_data;
                LearningData {
                    easiness_factor: next_easiness_factor(
                        data.easiness_factor,
                        rating,
                        self.config.easiness_scale,
                    ),
                    num_repetitions: data.num_repetitions + 1,
                    prev_repetition_epoch_millis: Some(now),
                    prev_repetition_interval_millis: now - card.last_reviewed_or_created(),
                }
            }
        };
        card.last_changed_epoch_millis = now;
        self.refresh(card);
    }

    /// Returns the cards due at `now`, least recently reviewed first.
    pub fn due_flashcards(&self, cards: &[Flashcard], now: i64) -> Vec<Flashcard> {
        let mut due: Vec<Flashcard> = cards
            .iter()
            .filter(|c| now >= c.next_repetition_epoch_millis)
            .cloned()
            .collect();
        due.sort_by_key(Flashcard::last_reviewed_or_created);
        due
    }
}
