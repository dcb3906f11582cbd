//! Vocabulary progress tracking with spaced repetition.
//!
//! The core is the mastery rule in [`progress`] and the interval table in
//! [`schedule`]. Both take the current time as an argument; [`clock`] supplies
//! it for callers that need a live or frozen time source.

pub mod clock;
pub mod config;
pub mod error;
pub mod models;
pub mod progress;
pub mod schedule;
pub mod storage;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{ProgressError, Result};
pub use models::{
    AnswerOutcome, ProgressStage, Vocabulary, VocabularyStats, Word, WordProgress, WordStatus,
};
pub use progress::{progress_message, progress_stage, should_mark_as_learned};
pub use schedule::{calculate_next_review_date, next_review_after, Scheduler};
