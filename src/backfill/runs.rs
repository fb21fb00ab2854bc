//! The three concrete backfills, each a closure pair plugged into the engine.

use super::engine::{validate_tags, BackfillEngine, RunStats};
use crate::claude::ClaudeClient;
use crate::store::{EnrichmentField, FieldValue, TitleStore};
use crate::tmdb::TmdbClient;
use anyhow::Result;
use std::time::Duration;
use tracing::info;

/// Pacing between TMDB-backed records (4 req/sec).
pub const TMDB_PACING: Duration = Duration::from_millis(250);
/// Pacing between Claude-backed records, more conservative.
pub const CLAUDE_PACING: Duration = Duration::from_secs(1);

/// Backfill missing keyword lists from TMDB.
pub fn backfill_keywords(
    store: &dyn TitleStore,
    tmdb: &TmdbClient,
    limit: Option<usize>,
    dry_run: bool,
) -> Result<RunStats> {
    let batch = store.select_missing(EnrichmentField::Keywords, limit)?;
    info!("Selected {} titles missing keywords", batch.len());

    let engine = BackfillEngine::new(TMDB_PACING, dry_run);
    Ok(engine.run(
        &batch,
        |title| {
            tmdb.fetch_keywords(title.id, title.kind)
                .map(|opt| opt.map(FieldValue::Tags))
        },
        |id, value| store.update_field(id, EnrichmentField::Keywords, value),
    ))
}

/// Backfill missing overview text from TMDB.
pub fn backfill_overviews(
    store: &dyn TitleStore,
    tmdb: &TmdbClient,
    limit: Option<usize>,
    dry_run: bool,
) -> Result<RunStats> {
    let batch = store.select_missing(EnrichmentField::Overview, limit)?;
    info!("Selected {} titles missing an overview", batch.len());

    let engine = BackfillEngine::new(TMDB_PACING, dry_run);
    Ok(engine.run(
        &batch,
        |title| {
            tmdb.fetch_overview(title.id, title.kind)
                .map(|opt| opt.map(FieldValue::Text))
        },
        |id, value| store.update_field(id, EnrichmentField::Overview, value),
    ))
}

/// Generate missing theme tags with Claude from existing overviews.
///
/// Titles with no overview cannot be prompted and are counted as
/// upstream-empty; a later overview backfill makes them eligible again.
pub fn backfill_themes(
    store: &dyn TitleStore,
    claude: &ClaudeClient,
    limit: Option<usize>,
    dry_run: bool,
) -> Result<RunStats> {
    let batch = store.select_missing(EnrichmentField::Themes, limit)?;
    info!("Selected {} titles missing themes", batch.len());

    let engine = BackfillEngine::new(CLAUDE_PACING, dry_run);
    Ok(engine.run(
        &batch,
        |title| {
            let Some(overview) = title.overview.as_deref().filter(|o| !o.trim().is_empty())
            else {
                return Ok(None);
            };
            let raw = claude.generate_themes(&title.name, overview, &title.genres)?;
            Ok(raw.map(|text| FieldValue::Tags(validate_tags(&text))))
        },
        |id, value| store.update_field(id, EnrichmentField::Themes, value),
    ))
}
