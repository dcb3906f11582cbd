//! Mastery decision for a word.
//!
//! A word graduates from learning to done only when it has been recalled
//! often enough, accurately enough, over a long enough period, and the last
//! recall is not from the same cramming session.

use chrono::{DateTime, Duration, Local};
use tracing::info;

use crate::error::Result;
use crate::models::{ProgressStage, Word, WordProgress, WordStatus};

/// Minimum number of presentations before a word can graduate.
pub const MIN_RECALLS: u32 = 8;
/// Minimum share of correct answers for graduation.
pub const MIN_SUCCESS_RATE: f64 = 0.8;
/// Minimum age of the word, in days.
pub const MIN_DAYS_LEARNING: i64 = 3;
/// Minimum time since the last recall, in hours.
pub const MIN_HOURS_SINCE_RECALL: i64 = 24;

const ACQUAINTED_RECALLS: u32 = 3;
const MEMORIZING_RECALLS: u32 = 5;
const MEMORIZING_SUCCESS_RATE: f64 = 0.7;

/// Decide whether a word has been mastered as of `now`.
pub fn should_mark_as_learned(progress: &WordProgress, now: DateTime<Local>) -> bool {
    if progress.recall_count < MIN_RECALLS {
        return false;
    }

    match progress.success_rate() {
        Some(rate) if rate >= MIN_SUCCESS_RATE => {}
        _ => return false,
    }

    if now.signed_duration_since(progress.created_at) < Duration::days(MIN_DAYS_LEARNING) {
        return false;
    }

    if let Some(last) = progress.last_recall_date {
        if now.signed_duration_since(last) < Duration::hours(MIN_HOURS_SINCE_RECALL) {
            return false;
        }
    }

    true
}

pub fn progress_stage(progress: &WordProgress, now: DateTime<Local>) -> ProgressStage {
    let recalls = progress.recall_count;

    if recalls < ACQUAINTED_RECALLS {
        ProgressStage::JustStarted
    } else if recalls < MEMORIZING_RECALLS {
        ProgressStage::GettingAcquainted
    } else if recalls < MIN_RECALLS {
        // recalls >= 5 here, so the rate is always present
        let rate = progress.success_rate().unwrap_or(0.0);
        if rate >= MEMORIZING_SUCCESS_RATE {
            ProgressStage::MemorizingWell
        } else {
            ProgressStage::NeedsRepetition
        }
    } else if should_mark_as_learned(progress, now) {
        ProgressStage::ReadyToGraduate
    } else {
        ProgressStage::AlmostLearned
    }
}

pub fn progress_message(progress: &WordProgress, now: DateTime<Local>) -> &'static str {
    progress_stage(progress, now).message()
}

/// Promote a learning word to done if it now qualifies. Never demotes.
///
/// Returns `true` when the status changed.
pub fn apply_mastery(word: &mut Word, now: DateTime<Local>) -> bool {
    if word.status != WordStatus::Learning || !should_mark_as_learned(&word.progress, now) {
        return false;
    }

    word.status = WordStatus::Done;
    info!(
        word = %word.english,
        recalls = word.progress.recall_count,
        correct = word.progress.correct_count,
        "word marked as learned"
    );
    true
}

/// Record one exercise attempt and re-evaluate mastery.
pub fn record_and_promote(word: &mut Word, correct: bool, now: DateTime<Local>) -> Result<bool> {
    word.progress.validate()?;
    word.progress.record_attempt(correct, now);
    Ok(apply_mastery(word, now))
}
