//! Operator console front end.
//!
//! Planning is pure: a parsed menu choice maps to a `RunPlan` with no console
//! I/O involved, so the core never depends on an interactive terminal. The
//! rustyline prompt loop below is a thin adapter around those functions.

use crate::backfill::{backfill_keywords, backfill_overviews, backfill_themes, RunStats};
use crate::claude::ClaudeClient;
use crate::store::TitleStore;
use crate::tmdb::TmdbClient;
use anyhow::Result;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

const SEPARATOR: &str =
    "============================================================";

/// What one engine run should do, derived from an operator choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunPlan {
    pub limit: Option<usize>,
    pub dry_run: bool,
    /// Unbounded runs ask for a confirmation before starting.
    pub needs_confirmation: bool,
}

/// Menu entries of the keywords backfill tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeywordsChoice {
    DryRunTop10,
    Top50,
    Top100,
    All,
}

impl KeywordsChoice {
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim() {
            "1" => Some(KeywordsChoice::DryRunTop10),
            "2" => Some(KeywordsChoice::Top50),
            "3" => Some(KeywordsChoice::Top100),
            "4" => Some(KeywordsChoice::All),
            _ => None,
        }
    }

    pub fn plan(&self) -> RunPlan {
        match self {
            KeywordsChoice::DryRunTop10 => RunPlan {
                limit: Some(10),
                dry_run: true,
                needs_confirmation: false,
            },
            KeywordsChoice::Top50 => RunPlan {
                limit: Some(50),
                dry_run: false,
                needs_confirmation: false,
            },
            KeywordsChoice::Top100 => RunPlan {
                limit: Some(100),
                dry_run: false,
                needs_confirmation: false,
            },
            KeywordsChoice::All => RunPlan {
                limit: None,
                dry_run: false,
                needs_confirmation: true,
            },
        }
    }
}

/// Menu entries of the overview & themes enrichment tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrichChoice {
    Overviews,
    Themes,
    Both,
}

impl EnrichChoice {
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim() {
            "1" => Some(EnrichChoice::Overviews),
            "2" => Some(EnrichChoice::Themes),
            "3" => Some(EnrichChoice::Both),
            _ => None,
        }
    }

    pub fn wants_overviews(&self) -> bool {
        matches!(self, EnrichChoice::Overviews | EnrichChoice::Both)
    }

    pub fn wants_themes(&self) -> bool {
        matches!(self, EnrichChoice::Themes | EnrichChoice::Both)
    }
}

pub fn parse_yes_no(input: &str) -> bool {
    input.trim().eq_ignore_ascii_case("y")
}

/// Render the final statistics block for one run.
pub fn render_stats(stats: &RunStats, operation: &str) -> String {
    let mut out = String::new();
    out.push_str(SEPARATOR);
    out.push_str(&format!("\n{} STATISTICS\n", operation.to_uppercase()));
    out.push_str(SEPARATOR);
    out.push_str(&format!("\nTotal titles processed: {}", stats.total));
    out.push_str(&format!("\nSuccessfully updated:   {}", stats.updated));
    out.push_str(&format!("\nNo data upstream:       {}", stats.upstream_empty));
    out.push_str(&format!("\nAPI errors:             {}", stats.upstream_error));
    out.push_str(&format!("\nDatabase errors:        {}", stats.persist_error));
    out.push_str(&format!("\n\nSuccess rate: {:.1}%\n", stats.success_rate()));
    out.push_str(SEPARATOR);
    out
}

fn print_stats(stats: &RunStats, operation: &str) {
    println!("\n{}\n", render_stats(stats, operation));
}

fn read_line(rl: &mut DefaultEditor, prompt: &str) -> Result<Option<String>> {
    match rl.readline(prompt) {
        Ok(line) => Ok(Some(line)),
        Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn remind_about_embeddings(stats: &RunStats, dry_run: bool) {
    if stats.updated > 0 && !dry_run {
        println!("Remember to regenerate embeddings for the updated titles.");
    }
}

/// Interactive keywords backfill tool.
pub fn run_keywords_tool(store: &dyn TitleStore, tmdb: &TmdbClient) -> Result<()> {
    println!("{}", SEPARATOR);
    println!("TMDB KEYWORDS BACKFILL");
    println!("{}\n", SEPARATOR);

    println!("Options:");
    println!("1. Dry run (top 10 titles) - fetch without updating the database");
    println!("2. Backfill top 50 popular titles");
    println!("3. Backfill top 100 popular titles");
    println!("4. Backfill ALL titles missing keywords");

    let mut rl = DefaultEditor::new()?;
    let Some(line) = read_line(&mut rl, "\nEnter your choice (1-4): ")? else {
        println!("Cancelled.");
        return Ok(());
    };

    let Some(choice) = KeywordsChoice::parse(&line) else {
        println!("Invalid choice. Exiting.");
        return Ok(());
    };

    let plan = choice.plan();
    if plan.needs_confirmation {
        let Some(answer) =
            read_line(&mut rl, "\nThis will process ALL missing titles. Continue? (y/n): ")?
        else {
            println!("Cancelled.");
            return Ok(());
        };
        if !parse_yes_no(&answer) {
            println!("Cancelled.");
            return Ok(());
        }
    }

    if plan.dry_run {
        println!("\nDRY RUN MODE - no database updates will be made");
    }

    println!("\nFetching titles from the database...");
    let stats = backfill_keywords(store, tmdb, plan.limit, plan.dry_run)?;
    if stats.total == 0 {
        println!("No titles missing keywords. Database is clean.");
        return Ok(());
    }

    print_stats(&stats, "Keywords Backfill");
    remind_about_embeddings(&stats, plan.dry_run);
    Ok(())
}

/// Interactive overview & themes enrichment tool.
pub fn run_enrich_tool(
    store: &dyn TitleStore,
    tmdb: &TmdbClient,
    claude: Option<&ClaudeClient>,
) -> Result<()> {
    println!("{}", SEPARATOR);
    println!("TMDB OVERVIEW & THEME BACKFILL");
    println!("{}\n", SEPARATOR);

    println!("What would you like to backfill?");
    println!("1. Overviews");
    println!("2. Themes (requires ANTHROPIC_API_KEY)");
    println!("3. Both");

    let mut rl = DefaultEditor::new()?;
    let Some(line) = read_line(&mut rl, "\nEnter your choice (1-3): ")? else {
        println!("Cancelled.");
        return Ok(());
    };

    let Some(choice) = EnrichChoice::parse(&line) else {
        println!("Invalid choice. Exiting.");
        return Ok(());
    };

    if choice.wants_themes() && claude.is_none() {
        println!("ANTHROPIC_API_KEY not found in environment.");
        println!("Get an API key from https://console.anthropic.com/ and export it.");
        if !choice.wants_overviews() {
            return Ok(());
        }
    }

    let Some(answer) = read_line(&mut rl, "Dry run? (y/n): ")? else {
        println!("Cancelled.");
        return Ok(());
    };
    let dry_run = parse_yes_no(&answer);
    if dry_run {
        println!("\nDRY RUN MODE - no database updates will be made");
    }

    let mut any_updates = false;

    if choice.wants_overviews() {
        println!("\nBackfilling overviews...");
        let stats = backfill_overviews(store, tmdb, None, dry_run)?;
        if stats.total == 0 {
            println!("No titles missing an overview.");
        } else {
            print_stats(&stats, "Overview Backfill");
            any_updates |= stats.updated > 0;
        }
    }

    if choice.wants_themes() {
        if let Some(claude) = claude {
            println!("\nGenerating themes...");
            let stats = backfill_themes(store, claude, None, dry_run)?;
            if stats.total == 0 {
                println!("No titles missing themes.");
            } else {
                print_stats(&stats, "Theme Generation");
                any_updates |= stats.updated > 0;
            }
        }
    }

    if any_updates && !dry_run {
        println!("Remember to regenerate embeddings for the updated titles.");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keywords_choices_parse() {
        assert_eq!(KeywordsChoice::parse(" 1 "), Some(KeywordsChoice::DryRunTop10));
        assert_eq!(KeywordsChoice::parse("4"), Some(KeywordsChoice::All));
        assert_eq!(KeywordsChoice::parse("5"), None);
        assert_eq!(KeywordsChoice::parse(""), None);
    }

    #[test]
    fn test_keywords_plans() {
        let plan = KeywordsChoice::DryRunTop10.plan();
        assert_eq!(plan.limit, Some(10));
        assert!(plan.dry_run);
        assert!(!plan.needs_confirmation);

        let plan = KeywordsChoice::Top50.plan();
        assert_eq!(plan.limit, Some(50));
        assert!(!plan.dry_run);

        let plan = KeywordsChoice::All.plan();
        assert_eq!(plan.limit, None);
        assert!(plan.needs_confirmation);
    }

    #[test]
    fn test_enrich_choices() {
        assert_eq!(EnrichChoice::parse("1"), Some(EnrichChoice::Overviews));
        assert_eq!(EnrichChoice::parse("3"), Some(EnrichChoice::Both));
        assert_eq!(EnrichChoice::parse("x"), None);

        assert!(EnrichChoice::Both.wants_overviews());
        assert!(EnrichChoice::Both.wants_themes());
        assert!(!EnrichChoice::Overviews.wants_themes());
        assert!(!EnrichChoice::Themes.wants_overviews());
    }

    #[test]
    fn test_yes_no_parsing() {
        assert!(parse_yes_no("y"));
        assert!(parse_yes_no(" Y "));
        assert!(!parse_yes_no("n"));
        assert!(!parse_yes_no("yes please"));
    }

    #[test]
    fn test_stats_rendering() {
        let stats = RunStats {
            total: 3,
            updated: 1,
            upstream_empty: 1,
            upstream_error: 1,
            persist_error: 0,
        };
        let block = render_stats(&stats, "Keywords Backfill");
        assert!(block.contains("KEYWORDS BACKFILL STATISTICS"));
        assert!(block.contains("Total titles processed: 3"));
        assert!(block.contains("Success rate: 33.3%"));
    }
}
