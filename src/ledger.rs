//! Monthly character-usage ledger.
//!
//! The cloud service meters usage in characters per calendar month, so the
//! ledger keeps one counter per UTC `year.month` bucket and answers
//! admission queries against the configured monthly budget. State lives in
//! a small JSON file behind the [`UsageStore`] seam; the read-modify-write
//! cycle is not atomic and assumes a single process at a time.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Datelike, Utc};

use crate::error::{NarrateError, NarrateResult};

/// Accumulated character counts keyed by period, e.g. `"2026.8" -> 15230`.
pub type UsageRecord = BTreeMap<String, u64>;

/// Persistence seam for the ledger. `load` returns `None` when no record
/// has ever been written, which callers treat as zero usage.
pub trait UsageStore {
    fn load(&self) -> NarrateResult<Option<UsageRecord>>;
    fn save(&self, record: &UsageRecord) -> NarrateResult<()>;
}

/// Production store: one JSON object in a flat file, created on first save.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl UsageStore for JsonFileStore {
    fn load(&self) -> NarrateResult<Option<UsageRecord>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&self.path).map_err(|e| NarrateError::Io {
            path: self.path.clone(),
            source: e,
        })?;
        let record = serde_json::from_str(&contents).map_err(|e| NarrateError::CorruptLedger {
            path: self.path.clone(),
            source: e,
        })?;
        Ok(Some(record))
    }

    fn save(&self, record: &UsageRecord) -> NarrateResult<()> {
        serde_json::to_string(record)
            .map_err(std::io::Error::other)
            .and_then(|json| fs::write(&self.path, json))
            .map_err(|e| NarrateError::Io {
                path: self.path.clone(),
                source: e,
            })
    }
}

/// Period key for the month of `now`, e.g. `"2026.8"` (month not padded).
fn period_key(now: DateTime<Utc>) -> String {
    format!("{}.{}", now.year(), now.month())
}

pub struct UsageLedger<S> {
    store: S,
}

impl<S: UsageStore> UsageLedger<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Whether `proposed` more characters fit under `limit` this month.
    ///
    /// A ledger that has never been written admits anything; otherwise the
    /// month's accumulated count plus the proposal must stay strictly
    /// below the limit.
    pub fn is_admissible(&self, proposed: u64, limit: u64) -> NarrateResult<bool> {
        let Some(record) = self.store.load()? else {
            return Ok(true);
        };
        let used = record.get(&period_key(Utc::now())).copied().unwrap_or(0);
        Ok(used + proposed < limit)
    }

    /// Characters already spent in the current month.
    pub fn used_this_month(&self) -> NarrateResult<u64> {
        let record = self.store.load()?.unwrap_or_default();
        Ok(record.get(&period_key(Utc::now())).copied().unwrap_or(0))
    }

    /// Add `chars` to the current month's counter and persist the record.
    pub fn record(&self, chars: u64) -> NarrateResult<()> {
        if chars == 0 {
            return Ok(());
        }
        let mut record = self.store.load()?.unwrap_or_default();
        *record.entry(period_key(Utc::now())).or_insert(0) += chars;
        self.store.save(&record)
    }
}
