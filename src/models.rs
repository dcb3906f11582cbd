//! Data models for words, their learning progress, and vocabularies.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ProgressError, Result};
use crate::progress;
use crate::schedule;

/// Whether a word is still being practised or has been mastered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WordStatus {
    #[default]
    Learning,
    Done,
}

impl WordStatus {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Learning => "learning",
            Self::Done => "done",
        }
    }
}

impl std::fmt::Display for WordStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for WordStatus {
    type Err = ProgressError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "learning" => Ok(Self::Learning),
            "done" => Ok(Self::Done),
            other => Err(ProgressError::InvalidArgument(format!(
                "unknown word status '{}', expected 'learning' or 'done'",
                other
            ))),
        }
    }
}

/// Human-readable stage of a word on its way to mastery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProgressStage {
    JustStarted,
    GettingAcquainted,
    MemorizingWell,
    NeedsRepetition,
    ReadyToGraduate,
    AlmostLearned,
}

impl ProgressStage {
    pub fn message(&self) -> &'static str {
        match self {
            Self::JustStarted => "Just started",
            Self::GettingAcquainted => "Getting acquainted",
            Self::MemorizingWell => "Memorizing well",
            Self::NeedsRepetition => "Needs more repetition",
            Self::ReadyToGraduate => "Ready to graduate",
            Self::AlmostLearned => "Almost learned",
        }
    }
}

/// Recall statistics for a single word.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordProgress {
    pub recall_count: u32,
    pub correct_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_recall_date: Option<DateTime<Local>>,
    pub created_at: DateTime<Local>,
}

impl WordProgress {
    pub fn new(created_at: DateTime<Local>) -> Self {
        Self {
            recall_count: 0,
            correct_count: 0,
            last_recall_date: None,
            created_at,
        }
    }

    /// Count one exercise presentation of the word.
    pub fn record_attempt(&mut self, correct: bool, at: DateTime<Local>) {
        self.recall_count = self.recall_count.saturating_add(1);
        if correct {
            self.correct_count = self.correct_count.saturating_add(1);
        }
        self.last_recall_date = Some(at);
    }

    /// Share of correct answers, or `None` if the word was never presented.
    pub fn success_rate(&self) -> Option<f64> {
        if self.recall_count == 0 {
            None
        } else {
            Some(f64::from(self.correct_count) / f64::from(self.recall_count))
        }
    }

    pub fn is_new(&self) -> bool {
        self.recall_count == 0
    }

    /// Check the counter invariants.
    pub fn validate(&self) -> Result<()> {
        if self.correct_count > self.recall_count {
            return Err(ProgressError::InvalidState(format!(
                "correct_count {} exceeds recall_count {}",
                self.correct_count, self.recall_count
            )));
        }
        if self.recall_count == 0 && self.last_recall_date.is_some() {
            return Err(ProgressError::InvalidState(
                "last_recall_date set on a word that was never recalled".to_string(),
            ));
        }
        Ok(())
    }
}

/// A vocabulary entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Word {
    pub id: String,
    pub english: String,
    pub translation: String,
    #[serde(default)]
    pub examples: Vec<String>,
    #[serde(default)]
    pub status: WordStatus,
    pub progress: WordProgress,
}

impl Word {
    pub fn new(english: &str, translation: &str, created_at: DateTime<Local>) -> Self {
        Self {
            id: Uuid::new_v4().to_string()[..8].to_string(),
            english: normalize(english),
            translation: translation.trim().to_string(),
            examples: Vec::new(),
            status: WordStatus::Learning,
            progress: WordProgress::new(created_at),
        }
    }

    pub fn is_done(&self) -> bool {
        self.status == WordStatus::Done
    }

    /// Manual status override, the only way back from `Done` to `Learning`.
    pub fn set_status(&mut self, status: WordStatus) {
        self.status = status;
    }

    pub fn matches(&self, key: &str) -> bool {
        self.id == key || self.english == normalize(key)
    }
}

/// Result of checking one answer.
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerOutcome {
    pub word_id: String,
    pub english: String,
    pub correct: bool,
    pub expected: String,
    pub promoted: bool,
}

/// Statistics for a vocabulary.
#[derive(Debug, Default, PartialEq)]
pub struct VocabularyStats {
    pub total: usize,
    pub learning: usize,
    pub done: usize,
    pub due: usize,
    pub total_recalls: u64,
    pub total_correct: u64,
    pub accuracy: f64,
}

/// A learner's collection of words.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vocabulary {
    pub id: String,
    pub name: String,
    pub words: Vec<Word>,
    pub created_at: DateTime<Local>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_practiced: Option<DateTime<Local>>,
}

impl Vocabulary {
    pub fn new(name: String, created_at: DateTime<Local>) -> Self {
        Self {
            id: Uuid::new_v4().to_string()[..8].to_string(),
            name,
            words: Vec::new(),
            created_at,
            last_practiced: None,
        }
    }

    pub fn add_word(
        &mut self,
        english: &str,
        translation: &str,
        now: DateTime<Local>,
    ) -> Result<&mut Word> {
        let english_norm = normalize(english);
        if english_norm.is_empty() || translation.trim().is_empty() {
            return Err(ProgressError::InvalidArgument(
                "word and translation must not be empty".to_string(),
            ));
        }
        if self.words.iter().any(|w| w.english == english_norm) {
            return Err(ProgressError::InvalidArgument(format!(
                "'{}' is already in the vocabulary",
                english_norm
            )));
        }

        self.words.push(Word::new(&english_norm, translation, now));
        let idx = self.words.len() - 1;
        Ok(&mut self.words[idx])
    }

    pub fn find(&self, key: &str) -> Option<&Word> {
        self.words.iter().find(|w| w.matches(key))
    }

    pub fn find_mut(&mut self, key: &str) -> Option<&mut Word> {
        self.words.iter_mut().find(|w| w.matches(key))
    }

    pub fn remove_word(&mut self, key: &str) -> Option<Word> {
        let idx = self.words.iter().position(|w| w.matches(key))?;
        Some(self.words.remove(idx))
    }

    /// Check an answer against the stored translation and update progress.
    pub fn record_answer(
        &mut self,
        key: &str,
        answer: &str,
        now: DateTime<Local>,
    ) -> Result<AnswerOutcome> {
        let word = self.find_mut(key).ok_or_else(|| {
            ProgressError::InvalidArgument(format!("no word '{}' in the vocabulary", key))
        })?;

        let correct = normalize(answer) == normalize(&word.translation);
        let promoted = progress::record_and_promote(word, correct, now)?;
        let outcome = AnswerOutcome {
            word_id: word.id.clone(),
            english: word.english.clone(),
            correct,
            expected: word.translation.clone(),
            promoted,
        };

        self.last_practiced = Some(now);
        Ok(outcome)
    }

    /// Words still in learning whose review date has come, most overdue first.
    pub fn review_batch(&self, now: DateTime<Local>, limit: usize) -> Result<Vec<&Word>> {
        let mut due = Vec::new();
        for word in self.words.iter().filter(|w| !w.is_done()) {
            let due_at = schedule::next_review_after(&word.progress)?;
            if due_at <= now {
                due.push((due_at, word));
            }
        }

        due.sort_by(|(a_due, a), (b_due, b)| {
            a_due
                .cmp(b_due)
                .then(a.progress.recall_count.cmp(&b.progress.recall_count))
        });
        Ok(due.into_iter().take(limit).map(|(_, w)| w).collect())
    }

    pub fn get_stats(&self, now: DateTime<Local>) -> VocabularyStats {
        let mut stats = VocabularyStats {
            total: self.words.len(),
            ..Default::default()
        };

        for word in &self.words {
            match word.status {
                WordStatus::Learning => {
                    stats.learning += 1;
                    if matches!(schedule::next_review_after(&word.progress), Ok(due) if due <= now)
                    {
                        stats.due += 1;
                    }
                }
                WordStatus::Done => stats.done += 1,
            }
            stats.total_recalls += u64::from(word.progress.recall_count);
            stats.total_correct += u64::from(word.progress.correct_count);
        }

        if stats.total_recalls > 0 {
            stats.accuracy = stats.total_correct as f64 / stats.total_recalls as f64 * 100.0;
        }

        stats
    }
}

/// Trim and lowercase user-entered text for comparison and storage.
pub fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(day: u32, hour: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 5, day, hour, 0, 0).unwrap()
    }

    #[test]
    fn record_attempt_keeps_invariants() {
        let mut progress = WordProgress::new(at(1, 9));
        assert!(progress.is_new());
        assert_eq!(progress.success_rate(), None);
        progress.validate().unwrap();

        progress.record_attempt(true, at(1, 10));
        progress.record_attempt(false, at(2, 10));

        assert_eq!(progress.recall_count, 2);
        assert_eq!(progress.correct_count, 1);
        assert_eq!(progress.last_recall_date, Some(at(2, 10)));
        assert_eq!(progress.success_rate(), Some(0.5));
        progress.validate().unwrap();
    }

    #[test]
    fn validate_rejects_malformed_records() {
        let mut progress = WordProgress::new(at(1, 9));
        progress.recall_count = 2;
        progress.correct_count = 3;
        assert!(matches!(
            progress.validate(),
            Err(ProgressError::InvalidState(_))
        ));

        let mut progress = WordProgress::new(at(1, 9));
        progress.last_recall_date = Some(at(2, 9));
        assert!(matches!(
            progress.validate(),
            Err(ProgressError::InvalidState(_))
        ));
    }

    #[test]
    fn status_parses_and_serializes_lowercase() {
        assert_eq!("Done".parse::<WordStatus>().unwrap(), WordStatus::Done);
        assert_eq!(" learning ".parse::<WordStatus>().unwrap(), WordStatus::Learning);
        assert!("mastered".parse::<WordStatus>().is_err());

        let json = serde_json::to_string(&WordStatus::Done).unwrap();
        assert_eq!(json, "\"done\"");
    }

    #[test]
    fn add_word_normalizes_and_rejects_duplicates() {
        let mut vocab = Vocabulary::new("Test".to_string(), at(1, 9));
        let word = vocab.add_word("  Hello ", "привет", at(1, 9)).unwrap();
        assert_eq!(word.english, "hello");
        assert_eq!(word.id.len(), 8);

        assert!(vocab.add_word("HELLO", "здравствуй", at(1, 9)).is_err());
        assert!(vocab.add_word("   ", "пусто", at(1, 9)).is_err());
        assert_eq!(vocab.words.len(), 1);
        assert!(vocab.find("Hello").is_some());
    }

    #[test]
    fn record_answer_compares_normalized_translation() {
        let mut vocab = Vocabulary::new("Test".to_string(), at(1, 9));
        vocab.add_word("water", "Вода", at(1, 9)).unwrap();

        let outcome = vocab.record_answer("water", " вода ", at(1, 10)).unwrap();
        assert!(outcome.correct);
        assert!(!outcome.promoted);
        assert_eq!(outcome.expected, "Вода");

        let outcome = vocab.record_answer("water", "огонь", at(1, 11)).unwrap();
        assert!(!outcome.correct);

        let word = vocab.find("water").unwrap();
        assert_eq!(word.progress.recall_count, 2);
        assert_eq!(word.progress.correct_count, 1);
        assert_eq!(vocab.last_practiced, Some(at(1, 11)));

        assert!(vocab.record_answer("fire", "огонь", at(1, 12)).is_err());
    }

    #[test]
    fn record_answer_by_id_reports_english_text() {
        let mut vocab = Vocabulary::new("Test".to_string(), at(1, 9));
        let id = vocab.add_word("Island", "остров", at(1, 9)).unwrap().id.clone();

        let outcome = vocab.record_answer(&id, "остров", at(1, 10)).unwrap();
        assert_eq!(outcome.word_id, id);
        assert_eq!(outcome.english, "island");
    }

    #[test]
    fn review_batch_skips_done_and_not_yet_due() {
        let mut vocab = Vocabulary::new("Test".to_string(), at(1, 9));
        vocab.add_word("new", "новый", at(1, 9)).unwrap();
        vocab.add_word("seen", "виденный", at(1, 9)).unwrap();
        vocab.add_word("fresh", "свежий", at(1, 9)).unwrap();
        vocab.add_word("known", "известный", at(1, 9)).unwrap();

        // one recall -> due a day after the recall
        vocab.find_mut("seen").unwrap().progress.record_attempt(true, at(1, 10));
        // three recalls -> due a week after the last one
        let fresh = vocab.find_mut("fresh").unwrap();
        for _ in 0..3 {
            fresh.progress.record_attempt(true, at(2, 10));
        }
        vocab.find_mut("known").unwrap().set_status(WordStatus::Done);

        let now = at(3, 12);
        let batch: Vec<_> = vocab
            .review_batch(now, 5)
            .unwrap()
            .iter()
            .map(|w| w.english.as_str())
            .collect();
        assert_eq!(batch, vec!["new", "seen"]);

        let limited = vocab.review_batch(now, 1).unwrap();
        assert_eq!(limited.len(), 1);
        assert_eq!(limited[0].english, "new");
    }

    #[test]
    fn stats_count_statuses_and_accuracy() {
        let mut vocab = Vocabulary::new("Test".to_string(), at(1, 9));
        vocab.add_word("one", "один", at(1, 9)).unwrap();
        vocab.add_word("two", "два", at(1, 9)).unwrap();
        vocab.record_answer("one", "один", at(1, 10)).unwrap();
        vocab.record_answer("one", "три", at(1, 11)).unwrap();
        vocab.record_answer("two", "два", at(1, 12)).unwrap();
        vocab.record_answer("two", "два", at(1, 13)).unwrap();
        vocab.find_mut("two").unwrap().set_status(WordStatus::Done);

        let stats = vocab.get_stats(at(1, 13) + Duration::days(4));
        assert_eq!(stats.total, 2);
        assert_eq!(stats.learning, 1);
        assert_eq!(stats.done, 1);
        assert_eq!(stats.due, 1);
        assert_eq!(stats.total_recalls, 4);
        assert_eq!(stats.total_correct, 3);
        assert!((stats.accuracy - 75.0).abs() < 1e-9);

        let empty = Vocabulary::new("Empty".to_string(), at(1, 9)).get_stats(at(2, 9));
        assert_eq!(empty, VocabularyStats::default());
    }
}
