//! Incremental backfill: select titles missing a field, enrich each through
//! an external call, persist per record, and report run statistics.

mod engine;
mod runs;

pub use engine::{validate_tags, BackfillEngine, Outcome, RunStats};
pub use runs::{
    backfill_keywords, backfill_overviews, backfill_themes, CLAUDE_PACING, TMDB_PACING,
};
