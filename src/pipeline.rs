//! Batch narration pipeline.
//!
//! Walks the data directory for `.txt` sources that do not yet have a
//! narrated audio sibling, cleans each text, and runs one synthesis job
//! per file. Quota denials skip the file; a corrupt ledger aborts the
//! whole batch since admission can no longer be evaluated.

use std::fs;
use std::path::{Path, PathBuf};

use indicatif::{ProgressBar, ProgressStyle};
use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::{NarrateError, NarrateResult};
use crate::generator::{Outcome, SpeechGenerator};
use crate::ledger::UsageStore;
use crate::synth::Synthesizer;

/// Text files in `data_dir` without a narrated sibling, sorted by name.
pub fn pending_sources(data_dir: &Path, audio_extension: &str) -> NarrateResult<Vec<PathBuf>> {
    let entries = fs::read_dir(data_dir).map_err(|e| NarrateError::Io {
        path: data_dir.to_path_buf(),
        source: e,
    })?;

    let mut sources = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| NarrateError::Io {
            path: data_dir.to_path_buf(),
            source: e,
        })?;
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("txt") {
            continue;
        }
        if path.with_extension(audio_extension).exists() {
            continue;
        }
        sources.push(path);
    }

    sources.sort();
    Ok(sources)
}

/// Drop blank lines, trim the rest, rejoin with newlines.
fn clean_text(raw: &str) -> String {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchSummary {
    pub narrated: usize,
    pub skipped: usize,
    pub failed: usize,
    pub empty: usize,
}

pub struct BatchPipeline<S, U> {
    generator: SpeechGenerator<S, U>,
    data_dir: PathBuf,
    audio_extension: &'static str,
}

impl<S: Synthesizer, U: UsageStore> BatchPipeline<S, U> {
    pub fn new(generator: SpeechGenerator<S, U>, config: &Config) -> Self {
        Self {
            generator,
            data_dir: config.data_dir.clone(),
            audio_extension: config.audio.encoding.extension(),
        }
    }

    /// Narrate every pending source file, one job at a time.
    pub async fn run(&self) -> NarrateResult<BatchSummary> {
        let sources = pending_sources(&self.data_dir, self.audio_extension)?;
        let mut summary = BatchSummary::default();

        if sources.is_empty() {
            info!("Nothing to narrate in {}", self.data_dir.display());
            return Ok(summary);
        }

        info!("{} file(s) to narrate", sources.len());
        let bar = ProgressBar::new(sources.len() as u64);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{msg:<24} [{wide_bar}] {pos}/{len}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );

        for source in sources {
            let name = source
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            bar.set_message(name);

            let text = match fs::read_to_string(&source) {
                Ok(raw) => clean_text(&raw),
                Err(e) => {
                    error!("Failed to read {}: {e}", source.display());
                    summary.failed += 1;
                    bar.inc(1);
                    continue;
                }
            };
            let output = source.with_extension(self.audio_extension);

            match self.generator.generate(&text, &output).await {
                Ok(Outcome::Narrated { chunks }) => {
                    info!(
                        "Narrated {} from {chunks} chunk(s)",
                        output.display()
                    );
                    summary.narrated += 1;
                }
                Ok(Outcome::NothingToDo) => {
                    warn!("{} has no narratable text", source.display());
                    summary.empty += 1;
                }
                Err(e @ NarrateError::AdmissionDenied { .. }) => {
                    warn!("Skipping {}: {e}", source.display());
                    summary.skipped += 1;
                }
                Err(e @ NarrateError::CorruptLedger { .. }) => {
                    bar.abandon();
                    return Err(e);
                }
                Err(e) => {
                    error!("Narration failed for {}: {e}", source.display());
                    summary.failed += 1;
                }
            }
            bar.inc(1);
        }

        bar.finish_and_clear();
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cleaning_drops_blanks_and_trims() {
        let raw = "  first line \n\n\tsecond\t\n   \nthird\n";
        assert_eq!(clean_text(raw), "first line\nsecond\nthird");
    }

    #[test]
    fn cleaning_empty_input_is_empty() {
        assert_eq!(clean_text(""), "");
        assert_eq!(clean_text("\n \n\t\n"), "");
    }

    #[test]
    fn pending_skips_sources_with_narrated_siblings() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("done.txt"), "x").unwrap();
        fs::write(dir.path().join("done.mp3"), "x").unwrap();
        fs::write(dir.path().join("todo.txt"), "x").unwrap();
        fs::write(dir.path().join("notes.md"), "x").unwrap();

        let pending = pending_sources(dir.path(), "mp3").unwrap();
        assert_eq!(pending, vec![dir.path().join("todo.txt")]);
    }

    #[test]
    fn pending_respects_the_audio_extension() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("story.txt"), "x").unwrap();
        fs::write(dir.path().join("story.mp3"), "x").unwrap();

        // The mp3 sibling does not satisfy a wav-encoded run
        let pending = pending_sources(dir.path(), "wav").unwrap();
        assert_eq!(pending, vec![dir.path().join("story.txt")]);
    }

    #[test]
    fn missing_data_dir_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(matches!(
            pending_sources(&missing, "mp3"),
            Err(NarrateError::Io { .. })
        ));
    }
}
