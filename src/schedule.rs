//! Review scheduling on a fixed interval table.

use chrono::{DateTime, Days, Duration, Local, LocalResult, NaiveDateTime, TimeZone, Timelike};
use tracing::debug;

use crate::clock::{Clock, SystemClock};
use crate::error::{ProgressError, Result};
use crate::models::{Word, WordProgress};
use crate::progress;

/// Days until the next review, indexed by how many times the word was recalled.
pub const REVIEW_INTERVALS_DAYS: [u32; 8] = [0, 1, 3, 7, 14, 30, 60, 120];

// Longest wall-clock gap we expect a time zone transition to produce.
const MAX_GAP_MINUTES: i64 = 24 * 60;

/// Interval for a recall count, clamped to the last table entry.
pub fn interval_days(recall_count: u32) -> u32 {
    let last = REVIEW_INTERVALS_DAYS.len() - 1;
    let idx = usize::try_from(recall_count).map_or(last, |n| n.min(last));
    REVIEW_INTERVALS_DAYS[idx]
}

/// Date of the next review counted from `now`.
///
/// Advances the calendar date and keeps the wall-clock time, so the result
/// stays at the same time of day across DST changes.
pub fn calculate_next_review_date<Tz: TimeZone>(
    recall_count: i64,
    now: &DateTime<Tz>,
) -> Result<DateTime<Tz>> {
    if recall_count < 0 {
        return Err(ProgressError::InvalidArgument(format!(
            "recall count must not be negative, got {}",
            recall_count
        )));
    }

    let recalls = u32::try_from(recall_count).unwrap_or(u32::MAX);
    add_calendar_days(now, interval_days(recalls))
}

/// When a word is due, counted from its last recall (or creation if never recalled).
pub fn next_review_after(progress: &WordProgress) -> Result<DateTime<Local>> {
    let anchor = progress.last_recall_date.unwrap_or(progress.created_at);
    add_calendar_days(&anchor, interval_days(progress.recall_count))
}

fn add_calendar_days<Tz: TimeZone>(from: &DateTime<Tz>, days: u32) -> Result<DateTime<Tz>> {
    let target = from
        .naive_local()
        .checked_add_days(Days::new(u64::from(days)))
        .ok_or_else(|| {
            ProgressError::OutOfRange(format!("{} days after {}", days, from.naive_local()))
        })?;

    resolve_local(&from.timezone(), target)
}

fn resolve_local<Tz: TimeZone>(tz: &Tz, local: NaiveDateTime) -> Result<DateTime<Tz>> {
    match tz.from_local_datetime(&local) {
        LocalResult::Single(dt) => Ok(dt),
        LocalResult::Ambiguous(earliest, _) => Ok(earliest),
        LocalResult::None => {
            // Wall-clock time skipped by a transition: take the first whole minute after it.
            let minute_start = local
                .with_second(0)
                .and_then(|t| t.with_nanosecond(0))
                .unwrap_or(local);
            for minute in 1..=MAX_GAP_MINUTES {
                let probe = minute_start + Duration::minutes(minute);
                if let Some(dt) = tz.from_local_datetime(&probe).earliest() {
                    debug!(%local, %probe, "review time fell into a time zone gap");
                    return Ok(dt);
                }
            }
            Err(ProgressError::OutOfRange(format!(
                "{} does not exist in the time zone",
                local
            )))
        }
    }
}

/// Applies the review schedule and mastery rules against an injected clock.
pub struct Scheduler<C: Clock = SystemClock> {
    clock: C,
}

impl Scheduler<SystemClock> {
    pub fn new() -> Self {
        Self { clock: SystemClock }
    }
}

impl<C: Clock> Scheduler<C> {
    pub fn with_clock(clock: C) -> Self {
        Self { clock }
    }

    pub fn now(&self) -> DateTime<Local> {
        self.clock.now()
    }

    pub fn next_review_date(&self, recall_count: i64) -> Result<DateTime<Local>> {
        calculate_next_review_date(recall_count, &self.clock.now())
    }

    pub fn due_date(&self, word: &Word) -> Result<DateTime<Local>> {
        next_review_after(&word.progress)
    }

    pub fn is_due(&self, word: &Word) -> Result<bool> {
        Ok(!word.is_done() && self.due_date(word)? <= self.clock.now())
    }

    pub fn progress_message(&self, word: &Word) -> &'static str {
        progress::progress_message(&word.progress, self.clock.now())
    }

    /// Record an attempt at the current time and promote the word if mastered.
    pub fn record(&self, word: &mut Word, correct: bool) -> Result<bool> {
        progress::record_and_promote(word, correct, self.clock.now())
    }
}
