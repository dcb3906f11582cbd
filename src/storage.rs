//! Storage module for saving and loading vocabularies.

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::models::Vocabulary;

/// Handles vocabulary persistence, one JSON file per vocabulary.
pub struct VocabularyStorage {
    data_dir: PathBuf,
}

impl VocabularyStorage {
    pub fn new(data_dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data directory: {:?}", data_dir))?;

        Ok(Self { data_dir })
    }

    /// Get default storage location.
    pub fn default_path() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("vocab-progress")
            .join("vocabularies")
    }

    fn vocabulary_path(&self, id: &str) -> PathBuf {
        self.data_dir.join(format!("{}.json", id))
    }

    /// Save a vocabulary to disk.
    pub fn save_vocabulary(&self, vocabulary: &Vocabulary) -> Result<PathBuf> {
        let path = self.vocabulary_path(&vocabulary.id);
        let json = serde_json::to_string_pretty(vocabulary)?;
        fs::write(&path, json)
            .with_context(|| format!("Failed to write vocabulary file: {:?}", path))?;
        debug!(path = ?path, words = vocabulary.words.len(), "saved vocabulary");
        Ok(path)
    }

    /// Load a vocabulary from disk.
    pub fn load_vocabulary(&self, id: &str) -> Result<Option<Vocabulary>> {
        let path = self.vocabulary_path(id);
        if !path.exists() {
            return Ok(None);
        }

        let json = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read vocabulary file: {:?}", path))?;
        let vocabulary: Vocabulary = serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse vocabulary file: {:?}", path))?;
        Ok(Some(vocabulary))
    }

    /// Load the vocabulary with the given name, creating an empty one if none exists.
    pub fn load_or_create(&self, name: &str, now: DateTime<Local>) -> Result<Vocabulary> {
        let existing = self
            .list_vocabularies()?
            .into_iter()
            .find(|v| v.name.to_lowercase() == name.to_lowercase());

        if let Some(info) = existing {
            if let Some(vocabulary) = self.load_vocabulary(&info.id)? {
                return Ok(vocabulary);
            }
        }

        info!(vocabulary = name, "creating new vocabulary");
        Ok(Vocabulary::new(name.to_string(), now))
    }

    /// Delete a vocabulary file.
    pub fn delete_vocabulary(&self, id: &str) -> Result<bool> {
        let path = self.vocabulary_path(id);
        if path.exists() {
            fs::remove_file(&path)?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// List all available vocabularies.
    pub fn list_vocabularies(&self) -> Result<Vec<VocabularyInfo>> {
        let mut vocabularies = Vec::new();

        for entry in fs::read_dir(&self.data_dir)? {
            let entry = entry?;
            let path = entry.path();

            if path.extension().map_or(false, |e| e == "json") {
                let parsed = fs::read_to_string(&path)
                    .map_err(anyhow::Error::from)
                    .and_then(|json| Ok(serde_json::from_str::<Vocabulary>(&json)?));
                match parsed {
                    Ok(vocabulary) => vocabularies.push(VocabularyInfo {
                        id: vocabulary.id,
                        name: vocabulary.name,
                        word_count: vocabulary.words.len(),
                    }),
                    Err(e) => warn!(path = ?path, error = %e, "skipping unreadable vocabulary"),
                }
            }
        }

        vocabularies.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(vocabularies)
    }

    /// Import words from a CSV file into a vocabulary.
    ///
    /// Each line is `english,translation[,example;example...]`. A header line
    /// naming the `english` column is skipped. Returns (imported, skipped).
    pub fn import_csv(
        &self,
        csv_path: &Path,
        vocabulary: &mut Vocabulary,
        now: DateTime<Local>,
    ) -> Result<(usize, usize)> {
        let content = fs::read_to_string(csv_path)
            .with_context(|| format!("Failed to read CSV file: {:?}", csv_path))?;

        let mut imported = 0;
        let mut skipped = 0;

        for (i, line) in content.lines().enumerate() {
            // Skip header
            if i == 0 && line.to_lowercase().contains("english") {
                continue;
            }

            let parts: Vec<&str> = line.splitn(3, ',').collect();
            if parts.len() < 2 {
                if !line.trim().is_empty() {
                    skipped += 1;
                }
                continue;
            }

            match vocabulary.add_word(parts[0], parts[1], now) {
                Ok(word) => {
                    if let Some(examples) = parts.get(2) {
                        word.examples = examples
                            .split(';')
                            .map(str::trim)
                            .filter(|e| !e.is_empty())
                            .map(String::from)
                            .collect();
                    }
                    imported += 1;
                }
                Err(e) => {
                    debug!(line = i + 1, error = %e, "skipping CSV line");
                    skipped += 1;
                }
            }
        }

        info!(path = ?csv_path, imported, skipped, "imported CSV");
        Ok((imported, skipped))
    }
}

/// Summary info for a vocabulary.
#[derive(Debug, Clone)]
pub struct VocabularyInfo {
    pub id: String,
    pub name: String,
    pub word_count: usize,
}

/// Backup format containing all vocabularies.
#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct Backup {
    pub version: u32,
    pub created_at: DateTime<Local>,
    pub vocabularies: Vec<Vocabulary>,
}

impl VocabularyStorage {
    /// Export all vocabularies to a backup file.
    pub fn export_backup(&self, path: &Path, now: DateTime<Local>) -> Result<usize> {
        let mut vocabularies = Vec::new();

        for info in &self.list_vocabularies()? {
            if let Some(vocabulary) = self.load_vocabulary(&info.id)? {
                vocabularies.push(vocabulary);
            }
        }

        let backup = Backup {
            version: 1,
            created_at: now,
            vocabularies,
        };

        let json = serde_json::to_string_pretty(&backup)?;
        fs::write(path, json)
            .with_context(|| format!("Failed to write backup file: {:?}", path))?;

        Ok(backup.vocabularies.len())
    }

    /// Import vocabularies from a backup file.
    /// Returns (imported_count, skipped_count).
    pub fn import_backup(&self, path: &Path) -> Result<(usize, usize)> {
        let json = fs::read_to_string(path)
            .with_context(|| format!("Failed to read backup file: {:?}", path))?;
        let backup: Backup = serde_json::from_str(&json)
            .with_context(|| "Failed to parse backup file")?;

        let existing_ids: HashSet<String> = self
            .list_vocabularies()?
            .into_iter()
            .map(|v| v.id)
            .collect();

        let mut imported = 0;
        let mut skipped = 0;

        for vocabulary in backup.vocabularies {
            if existing_ids.contains(&vocabulary.id) {
                skipped += 1;
            } else {
                self.save_vocabulary(&vocabulary)?;
                imported += 1;
            }
        }

        Ok((imported, skipped))
    }

    /// Get default backup path.
    pub fn default_backup_path(now: DateTime<Local>) -> PathBuf {
        let timestamp = now.format("%Y%m%d_%H%M%S");
        dirs::document_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join(format!("vocab_backup_{}.json", timestamp))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 9, 1, 10, 0, 0).unwrap()
    }

    fn storage() -> (TempDir, VocabularyStorage) {
        let dir = TempDir::new().unwrap();
        let storage = VocabularyStorage::new(dir.path().join("vocabularies")).unwrap();
        (dir, storage)
    }

    #[test]
    fn save_and_load_round_trip() {
        let (_dir, storage) = storage();
        let mut vocab = Vocabulary::new("Travel".to_string(), now());
        vocab.add_word("passport", "паспорт", now()).unwrap();
        vocab.record_answer("passport", "паспорт", now()).unwrap();

        storage.save_vocabulary(&vocab).unwrap();
        let loaded = storage.load_vocabulary(&vocab.id).unwrap().unwrap();

        assert_eq!(loaded.name, "Travel");
        assert_eq!(loaded.words.len(), 1);
        assert_eq!(loaded.words[0].progress, vocab.words[0].progress);
        assert!(storage.load_vocabulary("missing").unwrap().is_none());
    }

    #[test]
    fn list_is_sorted_and_skips_garbage() {
        let (_dir, storage) = storage();
        storage
            .save_vocabulary(&Vocabulary::new("Work".to_string(), now()))
            .unwrap();
        storage
            .save_vocabulary(&Vocabulary::new("Animals".to_string(), now()))
            .unwrap();
        fs::write(storage.data_dir.join("broken.json"), "{ not json").unwrap();

        let names: Vec<_> = storage
            .list_vocabularies()
            .unwrap()
            .into_iter()
            .map(|v| v.name)
            .collect();
        assert_eq!(names, vec!["Animals", "Work"]);
    }

    #[test]
    fn load_or_create_matches_name_case_insensitively() {
        let (_dir, storage) = storage();
        let vocab = Vocabulary::new("My Words".to_string(), now());
        storage.save_vocabulary(&vocab).unwrap();

        let found = storage.load_or_create("my words", now()).unwrap();
        assert_eq!(found.id, vocab.id);

        let fresh = storage.load_or_create("Other", now()).unwrap();
        assert_ne!(fresh.id, vocab.id);
        assert!(fresh.words.is_empty());
    }

    #[test]
    fn delete_removes_file() {
        let (_dir, storage) = storage();
        let vocab = Vocabulary::new("Temp".to_string(), now());
        storage.save_vocabulary(&vocab).unwrap();

        assert!(storage.delete_vocabulary(&vocab.id).unwrap());
        assert!(!storage.delete_vocabulary(&vocab.id).unwrap());
    }

    #[test]
    fn import_csv_reads_words_and_examples() {
        let (dir, storage) = storage();
        let csv = dir.path().join("words.csv");
        fs::write(
            &csv,
            "english,translation,examples\n\
             Flight,рейс,My flight is late.;The flight was long.\n\
             gate,выход\n\
             flight,полёт\n\
             lonely-line\n\
             \n",
        )
        .unwrap();

        let mut vocab = Vocabulary::new("Airport".to_string(), now());
        let (imported, skipped) = storage.import_csv(&csv, &mut vocab, now()).unwrap();

        assert_eq!((imported, skipped), (2, 2));
        let flight = vocab.find("flight").unwrap();
        assert_eq!(flight.translation, "рейс");
        assert_eq!(flight.examples.len(), 2);
        assert!(vocab.find("gate").unwrap().examples.is_empty());
    }

    #[test]
    fn backup_import_skips_existing() {
        let (dir, storage) = storage();
        let first = Vocabulary::new("First".to_string(), now());
        let second = Vocabulary::new("Second".to_string(), now());
        storage.save_vocabulary(&first).unwrap();
        storage.save_vocabulary(&second).unwrap();

        let backup_path = dir.path().join("backup.json");
        assert_eq!(storage.export_backup(&backup_path, now()).unwrap(), 2);

        storage.delete_vocabulary(&second.id).unwrap();
        assert_eq!(storage.import_backup(&backup_path).unwrap(), (1, 1));
        assert_eq!(storage.list_vocabularies().unwrap().len(), 2);
    }
}
