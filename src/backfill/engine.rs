//! The generic backfill loop.
//!
//! Every backfill in this tool is the same shape: select titles missing a
//! field, enrich each one through an external call, persist the result, and
//! count what happened. The engine owns that loop; call sites differ only in
//! the enrich closure, the persist closure, and the pacing delay.

use crate::store::{FieldValue, Title};
use anyhow::Result;
use std::time::Duration;
use tracing::{info, warn};

/// Terminal classification of one record's processing within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// A valid value was obtained and persisted (or would have been, on a
    /// dry run).
    Updated,
    /// The external call succeeded but produced no usable data.
    UpstreamEmpty,
    /// The external call failed (network, HTTP status, malformed response).
    UpstreamError,
    /// The store update failed.
    PersistError,
}

/// Per-outcome counters for one engine run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStats {
    pub total: usize,
    pub updated: usize,
    pub upstream_empty: usize,
    pub upstream_error: usize,
    pub persist_error: usize,
}

impl RunStats {
    fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Updated => self.updated += 1,
            Outcome::UpstreamEmpty => self.upstream_empty += 1,
            Outcome::UpstreamError => self.upstream_error += 1,
            Outcome::PersistError => self.persist_error += 1,
        }
    }

    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.updated as f64 / self.total as f64 * 100.0
    }
}

/// Drives the fetch→validate→persist loop over one batch.
///
/// Strictly sequential; the pacing delay is slept after every record
/// regardless of outcome, so a run never exceeds the external API's rate
/// ceiling. Per-record failures are counted and skipped, never propagated.
pub struct BackfillEngine {
    pacing: Duration,
    dry_run: bool,
}

impl BackfillEngine {
    pub fn new(pacing: Duration, dry_run: bool) -> Self {
        Self { pacing, dry_run }
    }

    pub fn run<E, P>(&self, batch: &[Title], mut enrich: E, mut persist: P) -> RunStats
    where
        E: FnMut(&Title) -> Result<Option<FieldValue>>,
        P: FnMut(i64, &FieldValue) -> bool,
    {
        let mut stats = RunStats {
            total: batch.len(),
            ..Default::default()
        };

        for (i, title) in batch.iter().enumerate() {
            info!(
                "[{}/{}] {} ({}) [id {}, pop {:.1}]",
                i + 1,
                batch.len(),
                title.name,
                title.kind,
                title.id,
                title.popularity
            );

            let outcome = self.process(title, &mut enrich, &mut persist);
            stats.record(outcome);

            std::thread::sleep(self.pacing);
        }

        stats
    }

    fn process<E, P>(&self, title: &Title, enrich: &mut E, persist: &mut P) -> Outcome
    where
        E: FnMut(&Title) -> Result<Option<FieldValue>>,
        P: FnMut(i64, &FieldValue) -> bool,
    {
        let value = match enrich(title) {
            Err(e) => {
                warn!("  upstream error for title {}: {}", title.id, e);
                return Outcome::UpstreamError;
            }
            Ok(None) => {
                info!("  no data upstream for title {}", title.id);
                return Outcome::UpstreamEmpty;
            }
            Ok(Some(value)) if value.is_empty() => {
                info!("  no usable data for title {}", title.id);
                return Outcome::UpstreamEmpty;
            }
            Ok(Some(value)) => value,
        };

        info!("  found {}", value.preview());

        if self.dry_run {
            info!("  dry run, skipping update for title {}", title.id);
            return Outcome::Updated;
        }

        if persist(title.id, &value) {
            info!("  updated title {}", title.id);
            Outcome::Updated
        } else {
            Outcome::PersistError
        }
    }
}

const MIN_TAG_LEN: usize = 2;
const MAX_TAG_LEN: usize = 50;
const MAX_TAGS: usize = 5;

/// Validate a raw comma-separated model response into a tag list.
///
/// Candidates are trimmed and kept only when strictly between 2 and 50
/// characters long; at most 5 survive.
pub fn validate_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| t.len() > MIN_TAG_LEN && t.len() < MAX_TAG_LEN)
        .map(str::to_string)
        .take(MAX_TAGS)
        .collect()
}
