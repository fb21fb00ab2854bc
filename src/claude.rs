//! Anthropic messages API client for deriving thematic tags from overviews.
//!
//! Single-turn prompt completion; the raw comma-separated response is
//! validated by the backfill engine, not here.

use anyhow::Result;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use std::time::{Duration, Instant};

const ANTHROPIC_API_BASE: &str = "https://api.anthropic.com/v1";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const MODEL: &str = "claude-3-5-haiku-20241022";
const MAX_TOKENS: u32 = 100;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const RATE_LIMIT_INTERVAL: Duration = Duration::from_secs(1);

pub struct ClaudeClient {
    client: Client,
    api_key: String,
    last_request: Mutex<Instant>,
}

#[derive(Serialize)]
struct MessagesRequest {
    model: &'static str,
    max_tokens: u32,
    messages: Vec<RequestMessage>,
}

#[derive(Serialize)]
struct RequestMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    text: Option<String>,
}

impl ClaudeClient {
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

    /// Ask the model for a comma-separated list of thematic tags.
    ///
    /// Returns the first content block's text, trimmed; an empty response is
    /// `Ok(None)`. Transport and HTTP failures are `Err`.
    pub fn generate_themes(
        &self,
        title: &str,
        overview: &str,
        genres: &[String],
    ) -> Result<Option<String>> {
        self.rate_limit();

        let request = MessagesRequest {
            model: MODEL,
            max_tokens: MAX_TOKENS,
            messages: vec![RequestMessage {
                role: "user",
                content: build_theme_prompt(title, overview, genres),
            }],
        };

        let response = self
            .client
            .post(format!("{}/messages", ANTHROPIC_API_BASE))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()?;

        if !response.status().is_success() {
            anyhow::bail!("Anthropic API failed with status {}", response.status());
        }

        let body: MessagesResponse = response.json()?;
        let text = body
            .content
            .into_iter()
            .next()
            .and_then(|block| block.text)
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());

        Ok(text)
    }
}

fn build_theme_prompt(title: &str, overview: &str, genres: &[String]) -> String {
    format!(
        "Analyze this {} title and extract 3-5 core thematic tags.\n\
         \n\
         Title: {}\n\
         Overview: {}\n\
         \n\
         Return ONLY a comma-separated list of thematic tags \
         (e.g., \"revenge, redemption, family, identity, power\").\n\
         \n\
         Focus on universal human themes like:\n\
         - Emotions: love, fear, hope, despair, grief\n\
         - Relationships: family, friendship, betrayal, loyalty\n\
         - Concepts: identity, justice, freedom, sacrifice, survival\n\
         - Social: inequality, corruption, prejudice, tradition\n\
         - Existential: mortality, purpose, memory, truth\n\
         \n\
         Themes (comma-separated):",
        genres.join("/"),
        title,
        overview
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_prompt_embeds_title_overview_and_genres() {
        let prompt = build_theme_prompt(
            "Heat",
            "A crew of thieves is pursued by a detective.",
            &["Crime".to_string(), "Drama".to_string()],
        );
        assert!(prompt.contains("this Crime/Drama title"));
        assert!(prompt.contains("Title: Heat"));
        assert!(prompt.contains("Overview: A crew of thieves is pursued by a detective."));
        assert!(prompt.contains("comma-separated"));
        assert!(prompt.contains("Existential"));
    }

    #[test]
    fn test_prompt_with_no_genres() {
        let prompt = build_theme_prompt("Heat", "A plot.", &[]);
        assert!(prompt.starts_with("Analyze this  title"));
    }

    #[test]
    fn test_response_text_extraction() {
        let body: MessagesResponse = serde_json::from_value(json!({
            "content": [{"type": "text", "text": "  revenge, loyalty  "}]
        }))
        .unwrap();
        let text = body
            .content
            .into_iter()
            .next()
            .and_then(|b| b.text)
            .map(|t| t.trim().to_string());
        assert_eq!(text.as_deref(), Some("revenge, loyalty"));
    }

    #[test]
    fn test_request_serialization_shape() {
        let request = MessagesRequest {
            model: MODEL,
            max_tokens: MAX_TOKENS,
            messages: vec![RequestMessage {
                role: "user",
                content: "hi".to_string(),
            }],
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["model"], "claude-3-5-haiku-20241022");
        assert_eq!(value["max_tokens"], 100);
        assert_eq!(value["messages"][0]["role"], "user");
    }
}
