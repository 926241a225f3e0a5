//! Narration job orchestration.
//!
//! One job per source text:
//! 1. Quota admission against the monthly ledger
//! 2. Chunk loop: synthesize → write a per-chunk temp artifact → record
//!    the chunk's character count in the ledger
//! 3. Reassembly: merge the temp artifacts into the final output (a lone
//!    chunk is renamed in place) and remove them
//!
//! A synthesis failure removes the temps already written; a merge failure
//! leaves them on disk so the job can be finished by hand.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::audio;
use crate::chunker;
use crate::config::{AudioOutputConfig, Config, QuotaConfig, VoiceConfig};
use crate::error::{NarrateError, NarrateResult};
use crate::ledger::{UsageLedger, UsageStore};
use crate::synth::Synthesizer;

/// How a successful job ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Final artifact written from this many synthesized chunks.
    Narrated { chunks: usize },
    /// Cleaned text was empty: nothing synthesized, no artifact written.
    NothingToDo,
}

pub struct SpeechGenerator<S, U> {
    synthesizer: S,
    ledger: UsageLedger<U>,
    voice: VoiceConfig,
    audio: AudioOutputConfig,
    quota: QuotaConfig,
}

impl<S: Synthesizer, U: UsageStore> SpeechGenerator<S, U> {
    pub fn new(synthesizer: S, ledger: UsageLedger<U>, config: &Config) -> Self {
        Self {
            synthesizer,
            ledger,
            voice: config.voice.clone(),
            audio: config.audio.clone(),
            quota: config.quota.clone(),
        }
    }

    /// Narrate `text` into the audio file at `output`.
    ///
    /// Chunks are synthesized and persisted strictly in order; the final
    /// artifact appears only after every chunk succeeded.
    pub async fn generate(&self, text: &str, output: &Path) -> NarrateResult<Outcome> {
        let requested = text.chars().count() as u64;
        if !self
            .ledger
            .is_admissible(requested, self.quota.month_char_limit)?
        {
            return Err(NarrateError::AdmissionDenied {
                used: self.ledger.used_this_month()?,
                requested,
                limit: self.quota.month_char_limit,
            });
        }

        let mut temps = TempArtifacts::new();
        for (i, chunk) in chunker::chunks(text, self.quota.request_char_limit).enumerate() {
            let bytes = self
                .synthesizer
                .synthesize(&chunk, &self.voice, &self.audio)
                .await
                .map_err(|e| NarrateError::Synthesis { chunk: i, source: e })?;

            let temp = chunk_path(output, i);
            fs::write(&temp, &bytes).map_err(|e| NarrateError::Io {
                path: temp.clone(),
                source: e,
            })?;
            temps.push(temp);
            debug!("Chunk {i} of {}: {} audio bytes", output.display(), bytes.len());

            // Proportional accounting: each chunk pays for its own length.
            self.ledger.record(chunk.chars().count() as u64)?;
        }

        // From here on the temps belong to the merge step; a failure keeps
        // them on disk for manual recovery.
        let clips = temps.release();
        match clips.len() {
            0 => {
                info!("No narratable text for {}", output.display());
                Ok(Outcome::NothingToDo)
            }
            1 => {
                fs::rename(&clips[0], output).map_err(|e| NarrateError::Merge {
                    output: output.to_path_buf(),
                    source: audio::MergeError::Io(e),
                })?;
                Ok(Outcome::Narrated { chunks: 1 })
            }
            n => {
                audio::concatenate(&clips, output).map_err(|e| NarrateError::Merge {
                    output: output.to_path_buf(),
                    source: e,
                })?;
                for clip in &clips {
                    if let Err(e) = fs::remove_file(clip) {
                        warn!("Failed to remove temp artifact {}: {e}", clip.display());
                    }
                }
                Ok(Outcome::Narrated { chunks: n })
            }
        }
    }
}

/// `<output stem>_<index>.<output extension>`, next to the final artifact.
fn chunk_path(output: &Path, index: usize) -> PathBuf {
    let stem = output
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("chunk");
    let extension = output
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default();
    if extension.is_empty() {
        output.with_file_name(format!("{stem}_{index}"))
    } else {
        output.with_file_name(format!("{stem}_{index}.{extension}"))
    }
}

/// Per-chunk temp files, removed on drop unless released to the merge step.
struct TempArtifacts {
    paths: Vec<PathBuf>,
}

impl TempArtifacts {
    fn new() -> Self {
        Self { paths: Vec::new() }
    }

    fn push(&mut self, path: PathBuf) {
        self.paths.push(path);
    }

    fn release(mut self) -> Vec<PathBuf> {
        std::mem::take(&mut self.paths)
    }
}

impl Drop for TempArtifacts {
    fn drop(&mut self) {
        for path in &self.paths {
            if let Err(e) = fs::remove_file(path) {
                warn!("Failed to remove temp artifact {}: {e}", path.display());
            }
        }
    }
}
