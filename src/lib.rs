//! Title Backfill Library
//!
//! This library exposes the internal modules for testing and potential reuse.

pub mod backfill;
pub mod claude;
pub mod cli_style;
pub mod config;
pub mod menu;
pub mod store;
pub mod tmdb;

// Re-export commonly used types for convenience
pub use backfill::{BackfillEngine, Outcome, RunStats};
pub use store::{EnrichmentField, FieldValue, SqliteTitleStore, Title, TitleKind, TitleStore};
