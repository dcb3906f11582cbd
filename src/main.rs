//! vocab - spaced repetition progress tracking for English vocabulary
//!
//! Add words, answer exercises, and watch words graduate from learning to done.

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Local};
use clap::{ArgAction, Parser, Subcommand};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;
use unicode_width::UnicodeWidthStr;

use vocab_progress::config::Config;
use vocab_progress::storage::VocabularyStorage;
use vocab_progress::{Scheduler, Vocabulary, Word, WordStatus};

// ══════════════════════════════════════════════════════════════════════════
// CLI Arguments
// ══════════════════════════════════════════════════════════════════════════

#[derive(Parser, Debug)]
#[command(name = "vocab")]
#[command(author, version, about = "Spaced repetition progress tracking for vocabulary", long_about = None)]
struct Args {
    /// Directory containing vocabulary files
    #[arg(short, long, global = true)]
    data_dir: Option<PathBuf>,

    /// Vocabulary to work with (defaults to the configured one)
    #[arg(long, global = true)]
    vocabulary: Option<String>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Add a word with its translation
    Add {
        english: String,
        translation: String,
        /// Usage example, may be repeated
        #[arg(short, long = "example")]
        examples: Vec<String>,
    },
    /// Import words from a CSV file (english,translation[,example;example])
    Import { csv: PathBuf },
    /// List words with their progress
    List {
        /// Only show words with this status
        #[arg(long)]
        status: Option<WordStatus>,
    },
    /// Show one word in detail
    Show { word: String },
    /// Check an answer for a word and record the attempt
    Answer { word: String, answer: String },
    /// Record an attempt without checking an answer
    Mark {
        word: String,
        /// Record the attempt as wrong
        #[arg(long)]
        wrong: bool,
    },
    /// Show the words due for review
    Due {
        /// Maximum number of words (defaults to the configured batch size)
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Set a word's status by hand
    SetStatus { word: String, status: WordStatus },
    /// Remove a word
    Remove { word: String },
    /// Show vocabulary statistics
    Stats,
    /// List all vocabularies
    Vocabularies,
    /// Export all vocabularies to a backup file
    Export { path: Option<PathBuf> },
    /// Restore vocabularies from a backup file
    Restore { path: PathBuf },
}

// ══════════════════════════════════════════════════════════════════════════
// Main Entry Point
// ══════════════════════════════════════════════════════════════════════════

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = Config::load().unwrap_or_default();
    if !Config::default_path().exists() {
        // Write the defaults out so there is a file to edit
        if let Err(e) = config.save() {
            warn!(error = %e, "could not write default config");
        }
    }
    let data_dir = args
        .data_dir
        .clone()
        .or_else(|| config.data_dir.clone())
        .unwrap_or_else(VocabularyStorage::default_path);
    debug!(data_dir = ?data_dir, "using data directory");

    let storage = VocabularyStorage::new(data_dir)?;
    let scheduler = Scheduler::new();
    let name = args
        .vocabulary
        .clone()
        .unwrap_or_else(|| config.default_vocabulary.clone());

    run(args.command, &storage, &scheduler, &config, &name)
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(
    command: Command,
    storage: &VocabularyStorage,
    scheduler: &Scheduler,
    config: &Config,
    name: &str,
) -> Result<()> {
    let now = scheduler.now();

    match command {
        Command::Vocabularies => {
            let vocabularies = storage.list_vocabularies()?;
            if vocabularies.is_empty() {
                println!("No vocabularies yet.");
            }
            for info in vocabularies {
                println!("{}  {} ({} words)", info.id, info.name, info.word_count);
            }
        }
        Command::Export { path } => {
            let path = path.unwrap_or_else(|| VocabularyStorage::default_backup_path(now));
            let count = storage.export_backup(&path, now)?;
            println!("✓ Exported {} vocabularies to {}", count, path.display());
        }
        Command::Restore { path } => {
            let (imported, skipped) = storage.import_backup(&path)?;
            println!("✓ Restored {} vocabularies ({} already present)", imported, skipped);
        }
        command => {
            let mut vocabulary = storage.load_or_create(name, now)?;
            run_on_vocabulary(command, &mut vocabulary, storage, scheduler, config)?;
        }
    }

    Ok(())
}

fn run_on_vocabulary(
    command: Command,
    vocabulary: &mut Vocabulary,
    storage: &VocabularyStorage,
    scheduler: &Scheduler,
    config: &Config,
) -> Result<()> {
    let now = scheduler.now();

    match command {
        Command::Add {
            english,
            translation,
            examples,
        } => {
            let word = vocabulary.add_word(&english, &translation, now)?;
            word.examples = examples;
            println!("✓ Added '{}' ({})", word.english, word.id);
            storage.save_vocabulary(vocabulary)?;
        }
        Command::Import { csv } => {
            let (imported, skipped) = storage.import_csv(&csv, vocabulary, now)?;
            storage.save_vocabulary(vocabulary)?;
            println!(
                "✓ Imported {} words into '{}' ({} skipped)",
                imported, vocabulary.name, skipped
            );
        }
        Command::List { status } => {
            let words: Vec<&Word> = vocabulary
                .words
                .iter()
                .filter(|w| status.map_or(true, |s| w.status == s))
                .collect();
            print_word_table(&words, scheduler)?;
        }
        Command::Show { word } => {
            let word = find(vocabulary, &word)?;
            print_word_details(word, scheduler)?;
        }
        Command::Answer { word, answer } => {
            let outcome = vocabulary.record_answer(&word, &answer, now)?;
            if outcome.correct {
                println!("✓ Correct");
            } else {
                println!("✗ Wrong, expected '{}'", outcome.expected);
            }
            if outcome.promoted {
                println!("★ '{}' is now learned", outcome.english);
            }
            storage.save_vocabulary(vocabulary)?;
        }
        Command::Mark { word, wrong } => {
            let entry = find_mut(vocabulary, &word)?;
            let promoted = scheduler.record(entry, !wrong)?;
            println!(
                "✓ Recorded {} attempt for '{}': {}",
                if wrong { "a wrong" } else { "a correct" },
                entry.english,
                scheduler.progress_message(entry)
            );
            if promoted {
                println!("★ '{}' is now learned", entry.english);
            }
            vocabulary.last_practiced = Some(now);
            storage.save_vocabulary(vocabulary)?;
        }
        Command::Due { limit } => {
            let limit = limit.unwrap_or(config.batch_size);
            let batch = vocabulary.review_batch(now, limit)?;
            if batch.is_empty() {
                println!("Nothing to review right now.");
            } else {
                print_word_table(&batch, scheduler)?;
            }
        }
        Command::SetStatus { word, status } => {
            let entry = find_mut(vocabulary, &word)?;
            entry.set_status(status);
            info!(word = %entry.english, %status, "status set by hand");
            println!("✓ '{}' is now {}", entry.english, status);
            storage.save_vocabulary(vocabulary)?;
        }
        Command::Remove { word } => {
            let removed = vocabulary
                .remove_word(&word)
                .ok_or_else(|| anyhow!("No word '{}' in '{}'", word, vocabulary.name))?;
            println!("✓ Removed '{}'", removed.english);
            storage.save_vocabulary(vocabulary)?;
        }
        Command::Stats => print_stats(vocabulary, now),
        Command::Vocabularies | Command::Export { .. } | Command::Restore { .. } => {}
    }

    Ok(())
}

// ══════════════════════════════════════════════════════════════════════════
// Output
// ══════════════════════════════════════════════════════════════════════════

fn find<'a>(vocabulary: &'a Vocabulary, key: &str) -> Result<&'a Word> {
    vocabulary
        .find(key)
        .ok_or_else(|| anyhow!("No word '{}' in '{}'", key, vocabulary.name))
}

fn find_mut<'a>(vocabulary: &'a mut Vocabulary, key: &str) -> Result<&'a mut Word> {
    let name = vocabulary.name.clone();
    vocabulary
        .find_mut(key)
        .ok_or_else(|| anyhow!("No word '{}' in '{}'", key, name))
}

fn print_word_table(words: &[&Word], scheduler: &Scheduler) -> Result<()> {
    if words.is_empty() {
        println!("No words.");
        return Ok(());
    }

    let english_width = column_width(words.iter().map(|w| w.english.as_str()), "WORD");
    let translation_width =
        column_width(words.iter().map(|w| w.translation.as_str()), "TRANSLATION");

    println!(
        "{}  {}  {:<8}  {:>7}  {:<10}  PROGRESS",
        pad("WORD", english_width),
        pad("TRANSLATION", translation_width),
        "STATUS",
        "CORRECT",
        "NEXT"
    );

    for word in words {
        let due = scheduler
            .due_date(word)
            .with_context(|| format!("Failed to schedule '{}'", word.english))?;
        println!(
            "{}  {}  {:<8}  {:>7}  {:<10}  {}",
            pad(&word.english, english_width),
            pad(&word.translation, translation_width),
            word.status,
            format!("{}/{}", word.progress.correct_count, word.progress.recall_count),
            if word.is_done() { "-".to_string() } else { format_date(due) },
            scheduler.progress_message(word)
        );
    }

    Ok(())
}

fn print_word_details(word: &Word, scheduler: &Scheduler) -> Result<()> {
    let progress = &word.progress;

    println!("{} - {}", word.english, word.translation);
    println!("  id:          {}", word.id);
    println!("  status:      {}", word.status);
    println!("  progress:    {}", scheduler.progress_message(word));
    println!(
        "  answers:     {} correct of {}",
        progress.correct_count, progress.recall_count
    );
    println!("  added:       {}", format_date(progress.created_at));
    if progress.is_new() {
        println!("  last recall: never");
    } else if let Some(last) = progress.last_recall_date {
        println!("  last recall: {}", format_date(last));
    }
    if !word.is_done() {
        println!("  next review: {}", format_date(scheduler.due_date(word)?));
    }

    if !word.examples.is_empty() {
        println!("  examples:");
        for example in &word.examples {
            for (i, line) in textwrap::wrap(example, 70).iter().enumerate() {
                let bullet = if i == 0 { "-" } else { " " };
                println!("    {} {}", bullet, line);
            }
        }
    }

    Ok(())
}

fn print_stats(vocabulary: &Vocabulary, now: DateTime<Local>) {
    let stats = vocabulary.get_stats(now);

    println!("{}", vocabulary.name);
    println!("  words:     {}", stats.total);
    println!("  learning:  {}", stats.learning);
    println!("  done:      {}", stats.done);
    println!("  due now:   {}", stats.due);
    println!(
        "  answers:   {} correct of {} ({:.0}%)",
        stats.total_correct, stats.total_recalls, stats.accuracy
    );
    if let Some(last) = vocabulary.last_practiced {
        println!("  practised: {}", format_date(last));
    }
}

fn column_width<'a>(values: impl Iterator<Item = &'a str>, header: &str) -> usize {
    values
        .map(UnicodeWidthStr::width)
        .chain(std::iter::once(header.width()))
        .max()
        .unwrap_or(0)
}

/// Left-align by display width, which differs from `{:<n}` for wide characters.
fn pad(text: &str, width: usize) -> String {
    let fill = width.saturating_sub(text.width());
    format!("{}{}", text, " ".repeat(fill))
}

fn format_date(date: DateTime<Local>) -> String {
    date.format("%Y-%m-%d").to_string()
}
