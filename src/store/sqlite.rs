use super::{EnrichmentField, FieldValue, Title, TitleKind, TitleStore};
use anyhow::{Context, Result};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{error, info};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS titles (
    id INTEGER PRIMARY KEY,
    title TEXT NOT NULL,
    kind TEXT NOT NULL CHECK (kind IN ('movie', 'tv')),
    overview TEXT,
    genres TEXT,
    keywords TEXT,
    themes TEXT,
    popularity REAL NOT NULL DEFAULT 0
);
CREATE INDEX IF NOT EXISTS idx_titles_popularity ON titles (popularity DESC);
";

/// SQLite-backed title store.
pub struct SqliteTitleStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteTitleStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let path = db_path.as_ref();
        let is_new_db = !path.exists();

        let conn = Connection::open(path).context("Failed to open titles database")?;
        conn.execute("PRAGMA foreign_keys = ON;", [])?;

        if is_new_db {
            info!("Creating new titles database at {:?}", path);
        }
        conn.execute_batch(SCHEMA)
            .context("Failed to initialize titles schema")?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn row_to_title(row: &rusqlite::Row) -> rusqlite::Result<Title> {
        let kind_str: String = row.get("kind")?;
        let kind = TitleKind::parse(&kind_str).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                2,
                rusqlite::types::Type::Text,
                format!("unknown title kind {:?}", kind_str).into(),
            )
        })?;

        let genres_json: Option<String> = row.get("genres")?;
        let genres = genres_json
            .and_then(|s| serde_json::from_str(&s).ok())
            .unwrap_or_default();

        Ok(Title {
            id: row.get("id")?,
            name: row.get("title")?,
            kind,
            overview: row.get("overview")?,
            genres,
            popularity: row.get("popularity")?,
        })
    }

    fn encode_value(value: &FieldValue) -> Result<String> {
        match value {
            FieldValue::Text(s) => Ok(s.clone()),
            FieldValue::Tags(tags) => {
                serde_json::to_string(tags).context("Failed to encode tag list")
            }
        }
    }
}

impl TitleStore for SqliteTitleStore {
    fn select_missing(&self, field: EnrichmentField, limit: Option<usize>) -> Result<Vec<Title>> {
        let conn = self.conn.lock().unwrap();

        // Column names come from the EnrichmentField enum, never from input.
        let mut sql = format!(
            "SELECT id, title, kind, overview, genres, popularity \
             FROM titles WHERE {} IS NULL ORDER BY popularity DESC",
            field.column()
        );
        if let Some(n) = limit {
            sql.push_str(&format!(" LIMIT {}", n));
        }

        let mut stmt = conn.prepare(&sql)?;
        let titles = stmt
            .query_map([], Self::row_to_title)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .with_context(|| format!("Failed to select titles missing {}", field))?;

        Ok(titles)
    }

    fn update_field(&self, id: i64, field: EnrichmentField, value: &FieldValue) -> bool {
        let encoded = match Self::encode_value(value) {
            Ok(encoded) => encoded,
            Err(e) => {
                error!("Failed to encode {} for title {}: {}", field, id, e);
                return false;
            }
        };

        let conn = self.conn.lock().unwrap();
        let sql = format!("UPDATE titles SET {} = ?1 WHERE id = ?2", field.column());
        match conn.execute(&sql, params![encoded, id]) {
            Ok(1) => true,
            Ok(n) => {
                error!("Update of {} for title {} touched {} rows", field, id, n);
                false
            }
            Err(e) => {
                error!("Failed to update {} for title {}: {}", field, id, e);
                false
            }
        }
    }

    fn insert_title(&self, title: &Title) -> Result<()> {
        let genres = serde_json::to_string(&title.genres)?;
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO titles (id, title, kind, overview, genres, popularity) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                title.id,
                title.name,
                title.kind.as_str(),
                title.overview,
                genres,
                title.popularity
            ],
        )
        .with_context(|| format!("Failed to insert title {}", title.id))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn make_title(id: i64, name: &str, popularity: f64) -> Title {
        Title {
            id,
            name: name.to_string(),
            kind: TitleKind::Movie,
            overview: None,
            genres: vec![],
            popularity,
        }
    }

    fn create_tmp_store() -> (SqliteTitleStore, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let store = SqliteTitleStore::new(dir.path().join("titles.db")).unwrap();
        (store, dir)
    }

    #[test]
    fn test_create_new_database() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("titles.db");

        let store = SqliteTitleStore::new(&db_path).unwrap();
        assert!(db_path.exists());

        let conn = store.conn.lock().unwrap();
        let count: i32 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='titles'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_select_missing_orders_by_popularity_desc() {
        let (store, _dir) = create_tmp_store();
        store.insert_title(&make_title(1, "low", 10.0)).unwrap();
        store.insert_title(&make_title(2, "high", 50.0)).unwrap();
        store.insert_title(&make_title(3, "lowest", 5.0)).unwrap();

        let batch = store
            .select_missing(EnrichmentField::Keywords, None)
            .unwrap();
        let popularity: Vec<f64> = batch.iter().map(|t| t.popularity).collect();
        assert_eq!(popularity, vec![50.0, 10.0, 5.0]);
    }

    #[test]
    fn test_select_missing_respects_limit() {
        let (store, _dir) = create_tmp_store();
        for i in 0..10 {
            store
                .insert_title(&make_title(i, &format!("t{}", i), i as f64))
                .unwrap();
        }

        let batch = store
            .select_missing(EnrichmentField::Themes, Some(3))
            .unwrap();
        assert_eq!(batch.len(), 3);
        assert_eq!(batch[0].popularity, 9.0);
    }

    #[test]
    fn test_select_missing_excludes_populated_rows() {
        let (store, _dir) = create_tmp_store();
        store.insert_title(&make_title(1, "done", 90.0)).unwrap();
        store.insert_title(&make_title(2, "todo", 10.0)).unwrap();

        assert!(store.update_field(
            1,
            EnrichmentField::Keywords,
            &FieldValue::Tags(vec!["noir".to_string()])
        ));

        let batch = store
            .select_missing(EnrichmentField::Keywords, None)
            .unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].id, 2);
    }

    #[test]
    fn test_update_field_leaves_other_columns_alone() {
        let (store, _dir) = create_tmp_store();
        store.insert_title(&make_title(1, "a", 1.0)).unwrap();

        assert!(store.update_field(
            1,
            EnrichmentField::Keywords,
            &FieldValue::Tags(vec!["heist".to_string()])
        ));
        assert!(store.update_field(
            1,
            EnrichmentField::Overview,
            &FieldValue::Text("a plot".to_string())
        ));

        let conn = store.conn.lock().unwrap();
        let (keywords, overview, themes): (Option<String>, Option<String>, Option<String>) = conn
            .query_row(
                "SELECT keywords, overview, themes FROM titles WHERE id = 1",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .unwrap();

        assert_eq!(keywords.as_deref(), Some("[\"heist\"]"));
        assert_eq!(overview.as_deref(), Some("a plot"));
        assert_eq!(themes, None);
    }

    #[test]
    fn test_update_field_unknown_id_reports_false() {
        let (store, _dir) = create_tmp_store();
        assert!(!store.update_field(
            42,
            EnrichmentField::Themes,
            &FieldValue::Tags(vec!["revenge".to_string()])
        ));
    }

    #[test]
    fn test_genres_round_trip() {
        let (store, _dir) = create_tmp_store();
        let mut title = make_title(7, "genre test", 1.0);
        title.genres = vec!["Drama".to_string(), "Crime".to_string()];
        title.overview = Some("an overview".to_string());
        store.insert_title(&title).unwrap();

        let batch = store
            .select_missing(EnrichmentField::Themes, None)
            .unwrap();
        assert_eq!(batch[0].genres, vec!["Drama", "Crime"]);
        assert_eq!(batch[0].overview.as_deref(), Some("an overview"));
    }
}
