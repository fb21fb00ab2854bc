//! Environment-sourced credentials.
//!
//! Missing required credentials are fatal before any batch work starts; the
//! error message names the variable and how to set it.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} not found in environment. {hint}")]
    MissingKey { var: &'static str, hint: &'static str },
}

#[derive(Debug, Clone)]
pub struct EnvConfig {
    /// TMDB read access token, sent as a bearer header.
    pub tmdb_api_key: String,
    /// Anthropic API key; only required for the themes backfill.
    pub anthropic_api_key: Option<String>,
}

fn non_empty_var(var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|v| !v.trim().is_empty())
}

impl EnvConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let tmdb_api_key = non_empty_var("TMDB_API_KEY").ok_or(ConfigError::MissingKey {
            var: "TMDB_API_KEY",
            hint: "Set it with: export TMDB_API_KEY=<your TMDB read access token>",
        })?;

        Ok(Self {
            tmdb_api_key,
            anthropic_api_key: non_empty_var("ANTHROPIC_API_KEY"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_key_message_names_variable_and_remedy() {
        let err = ConfigError::MissingKey {
            var: "TMDB_API_KEY",
            hint: "Set it with: export TMDB_API_KEY=<your TMDB read access token>",
        };
        let msg = err.to_string();
        assert!(msg.contains("TMDB_API_KEY not found"));
        assert!(msg.contains("export TMDB_API_KEY="));
    }
}
