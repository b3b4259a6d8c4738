//! Spaced-repetition review of flashcards

mod scheduler;

pub use scheduler::{EasinessScale, Scheduler, SchedulerConfig, next_easiness_factor};
