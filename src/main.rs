use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use title_backfill::claude::ClaudeClient;
use title_backfill::cli_style::get_styles;
use title_backfill::config::EnvConfig;
use title_backfill::menu;
use title_backfill::store::SqliteTitleStore;
use title_backfill::tmdb::TmdbClient;

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(msg).with_context(|| format!("Error resolving path: {}", s));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
#[command(styles = get_styles(), version, about = "Backfill enrichment fields on a titles database")]
struct CliArgs {
    /// Path to the SQLite titles database file.
    #[clap(value_parser = parse_path)]
    pub titles_db: PathBuf,

    #[command(subcommand)]
    pub tool: Tool,
}

#[derive(Subcommand, Debug)]
enum Tool {
    /// Backfill missing keyword lists from TMDB.
    Keywords,
    /// Backfill missing overviews from TMDB and generate themes with Claude.
    Enrich,
}

fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .unwrap();

    info!(
        "title-backfill {}-{}",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH")
    );

    // Credentials are checked before any batch work starts.
    let config = EnvConfig::from_env()?;

    let store = SqliteTitleStore::new(&cli_args.titles_db)
        .with_context(|| format!("Failed to open titles database {:?}", cli_args.titles_db))?;

    let tmdb = TmdbClient::new(&config.tmdb_api_key)?;
    let claude = config
        .anthropic_api_key
        .as_deref()
        .map(ClaudeClient::new)
        .transpose()?;

    match cli_args.tool {
        Tool::Keywords => menu::run_keywords_tool(&store, &tmdb),
        Tool::Enrich => menu::run_enrich_tool(&store, &tmdb, claude.as_ref()),
    }
}
