//! TMDB API client for fetching title keywords and overviews.
//!
//! Rate limited to 4 requests per second, well under TMDB's ~40/sec ceiling.

use crate::store::TitleKind;
use anyhow::Result;
use reqwest::blocking::Client;
use serde::Deserialize;
use std::sync::Mutex;
use std::time::{Duration, Instant};

const TMDB_API_BASE: &str = "https://api.themoviedb.org/3";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const RATE_LIMIT_INTERVAL: Duration = Duration::from_millis(250); // 4 req/sec

pub struct TmdbClient {
    client: Client,
    api_key: String,
    last_request: Mutex<Instant>,
}

#[derive(Deserialize)]
struct KeywordsResponse {
    /// Envelope key for movie responses.
    keywords: Option<Vec<KeywordEntry>>,
    /// Envelope key for tv responses.
    results: Option<Vec<KeywordEntry>>,
}

#[derive(Deserialize)]
struct KeywordEntry {
    name: Option<String>,
}

#[derive(Deserialize)]
struct DetailsResponse {
    overview: Option<String>,
}

impl TmdbClient {
    pub fn new(api_key: &str) -> Result<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            client,
            api_key: api_key.to_string(),
            last_request: Mutex::new(Instant::now() - RATE_LIMIT_INTERVAL),
        })
    }

    fn rate_limit(&self) {
        let mut last = self.last_request.lock().unwrap();
        let elapsed = last.elapsed();
        if elapsed < RATE_LIMIT_INTERVAL {
            std::thread::sleep(RATE_LIMIT_INTERVAL - elapsed);
        }
        *last = Instant::now();
    }

    fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T> {
        self.rate_limit();

        let response = self
            .client
            .get(url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("accept", "application/json")
            .send()?;

        if !response.status().is_success() {
            anyhow::bail!("TMDB API failed with status {}", response.status());
        }

        Ok(response.json()?)
    }

    /// Fetch the keyword list for a title.
    ///
    /// Movie responses nest keywords under `keywords`, tv responses under
    /// `results`. A missing envelope key or an empty list is `Ok(None)`;
    /// transport and HTTP failures are `Err`.
    pub fn fetch_keywords(&self, tmdb_id: i64, kind: TitleKind) -> Result<Option<Vec<String>>> {
        let url = format!("{}/{}/{}/keywords", TMDB_API_BASE, kind.as_str(), tmdb_id);
        let body: KeywordsResponse = self.get_json(&url)?;
        Ok(extract_keywords(kind, body))
    }

    /// Fetch the overview text for a title, trimmed. Empty or missing is
    /// `Ok(None)`.
    pub fn fetch_overview(&self, tmdb_id: i64, kind: TitleKind) -> Result<Option<String>> {
        let url = format!("{}/{}/{}", TMDB_API_BASE, kind.as_str(), tmdb_id);
        let body: DetailsResponse = self.get_json(&url)?;
        Ok(extract_overview(body))
    }
}

fn extract_keywords(kind: TitleKind, body: KeywordsResponse) -> Option<Vec<String>> {
    let entries = match kind {
        TitleKind::Movie => body.keywords,
        TitleKind::Tv => body.results,
    }?;

    let keywords: Vec<String> = entries.into_iter().filter_map(|e| e.name).collect();
    if keywords.is_empty() {
        None
    } else {
        Some(keywords)
    }
}

fn extract_overview(body: DetailsResponse) -> Option<String> {
    body.overview
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
