//! Title storage abstraction.
//!
//! The backfill tools only ever touch the store through two operations:
//! selecting titles whose enrichment field is still NULL, and writing a
//! single field back by title id. The trait keeps that seam narrow so tests
//! can substitute a mock without a real database.

mod sqlite;

pub use sqlite::SqliteTitleStore;

use anyhow::Result;

/// Which catalog a title belongs to on the metadata API side.
///
/// The two kinds map to distinct endpoint path segments and, for keywords,
/// to different response envelope keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TitleKind {
    Movie,
    Tv,
}

impl TitleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TitleKind::Movie => "movie",
            TitleKind::Tv => "tv",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "movie" => Some(TitleKind::Movie),
            "tv" => Some(TitleKind::Tv),
            _ => None,
        }
    }
}

impl std::fmt::Display for TitleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The enrichment columns a backfill run can target.
///
/// Each column is independently nullable; NULL doubles as the "not yet
/// enriched" marker, so there is no separate status flag anywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrichmentField {
    Keywords,
    Overview,
    Themes,
}

impl EnrichmentField {
    pub fn column(&self) -> &'static str {
        match self {
            EnrichmentField::Keywords => "keywords",
            EnrichmentField::Overview => "overview",
            EnrichmentField::Themes => "themes",
        }
    }
}

impl std::fmt::Display for EnrichmentField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.column())
    }
}

/// A value destined for one enrichment column.
///
/// Overviews are plain text; keywords and themes are stored as JSON arrays.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Tags(Vec<String>),
}

impl FieldValue {
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Text(s) => s.trim().is_empty(),
            FieldValue::Tags(tags) => tags.is_empty(),
        }
    }

    /// Short operator-facing description, previewing at most five tags.
    pub fn preview(&self) -> String {
        match self {
            FieldValue::Text(s) => format!("overview ({} chars)", s.len()),
            FieldValue::Tags(tags) => {
                let shown = tags.iter().take(5).cloned().collect::<Vec<_>>().join(", ");
                if tags.len() > 5 {
                    format!("{} tags: {} ...", tags.len(), shown)
                } else {
                    format!("{} tags: {}", tags.len(), shown)
                }
            }
        }
    }
}

/// A media title under enrichment.
#[derive(Debug, Clone, PartialEq)]
pub struct Title {
    /// TMDB id, also the primary key used for updates.
    pub id: i64,
    pub name: String,
    pub kind: TitleKind,
    pub overview: Option<String>,
    pub genres: Vec<String>,
    /// Popularity score; batches are processed most popular first.
    pub popularity: f64,
}

/// Trait for title storage backends.
#[cfg_attr(feature = "mock", mockall::automock)]
pub trait TitleStore: Send + Sync {
    /// Select titles whose `field` column is NULL, most popular first,
    /// optionally capped at `limit` rows.
    fn select_missing(&self, field: EnrichmentField, limit: Option<usize>) -> Result<Vec<Title>>;

    /// Point update of one enrichment column by title id.
    ///
    /// Returns false instead of raising on store-level errors: a single
    /// failed persist must never halt a batch.
    fn update_field(&self, id: i64, field: EnrichmentField, value: &FieldValue) -> bool;

    /// Insert a title row. Used by importers and test fixtures.
    fn insert_title(&self, title: &Title) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_round_trip() {
        assert_eq!(TitleKind::parse("movie"), Some(TitleKind::Movie));
        assert_eq!(TitleKind::parse("tv"), Some(TitleKind::Tv));
        assert_eq!(TitleKind::parse("series"), None);
        assert_eq!(TitleKind::Movie.as_str(), "movie");
        assert_eq!(TitleKind::Tv.as_str(), "tv");
    }

    #[test]
    fn test_field_value_emptiness() {
        assert!(FieldValue::Text("   ".to_string()).is_empty());
        assert!(FieldValue::Tags(vec![]).is_empty());
        assert!(!FieldValue::Text("a plot".to_string()).is_empty());
        assert!(!FieldValue::Tags(vec!["noir".to_string()]).is_empty());
    }

    #[test]
    fn test_field_value_preview_truncates() {
        let tags: Vec<String> = (0..7).map(|i| format!("tag{}", i)).collect();
        let preview = FieldValue::Tags(tags).preview();
        assert!(preview.starts_with("7 tags:"));
        assert!(preview.ends_with("..."));
        assert!(!preview.contains("tag5"));
    }
}
