//! Error taxonomy for narration jobs.
//!
//! Every failure is terminal for the current job; the batch loop decides
//! which ones abort the whole run (only a corrupt ledger does).

use std::path::PathBuf;

use thiserror::Error;

use crate::audio::MergeError;
use crate::synth::SynthesisError;

#[derive(Error, Debug)]
pub enum NarrateError {
    #[error("monthly quota reached: {used} chars used + {requested} requested >= {limit}")]
    AdmissionDenied {
        used: u64,
        requested: u64,
        limit: u64,
    },

    #[error("synthesis failed on chunk {chunk}: {source}")]
    Synthesis {
        chunk: usize,
        source: SynthesisError,
    },

    #[error("failed to assemble {}: {source}", output.display())]
    Merge {
        output: PathBuf,
        source: MergeError,
    },

    #[error("usage ledger {} is corrupt: {source}", path.display())]
    CorruptLedger {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

pub type NarrateResult<T> = Result<T, NarrateError>;
