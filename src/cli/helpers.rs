//! Shared helper functions for CLI commands
//!
//! Project and catalog opening, argument resolution and small formatting
//! helpers used across command modules.

use miette::{IntoDiagnostic, Result};
use serde::Serialize;

use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::catalog::Catalog;
use crate::core::config::Config;
use crate::core::identity::EntityId;
use crate::core::project::Project;
use crate::core::rollup::{RollupOutcome, RollupSettings};
use crate::core::store::SqliteStore;

/// An opened project with its configuration and catalog
pub struct Session {
    pub project: Project,
    pub config: Config,
    pub catalog: Catalog<SqliteStore>,
}

/// Locate the project named by `--project`, or the one around the cwd
pub fn find_project(global: &GlobalOpts) -> Result<Project> {
    let found = match &global.project {
        Some(path) => Project::discover_from(path),
        None => Project::discover(),
    };
    found.map_err(|e| miette::miette!("{}", e))
}

/// Open the project, its layered config and its catalog database
pub fn open_session(global: &GlobalOpts) -> Result<Session> {
    let project = find_project(global)?;
    let config = Config::load_for(Some(&project));
    let store = SqliteStore::for_project(&project).into_diagnostic()?;
    let catalog = Catalog::new(store, RollupSettings::from_config(&config));
    Ok(Session {
        project,
        config,
        catalog,
    })
}

/// The effective output format: flag, then config, then the command's default
pub fn output_format(global: &GlobalOpts, config: &Config, fallback: OutputFormat) -> OutputFormat {
    let configured = config
        .default_format
        .as_deref()
        .and_then(|f| f.parse::<OutputFormat>().ok())
        .unwrap_or(OutputFormat::Auto);
    global.format.or(configured).or(fallback)
}

/// Print any serializable value as JSON or YAML
pub fn print_structured<T: Serialize>(value: &T, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Yaml => {
            print!("{}", serde_yml::to_string(value).into_diagnostic()?);
        }
        _ => {
            println!("{}", serde_json::to_string_pretty(value).into_diagnostic()?);
        }
    }
    Ok(())
}

/// Two-decimal money display
pub fn format_cost(value: f64) -> String {
    format!("{:.2}", value)
}

/// Compact quantity display: integers without decimals
pub fn format_qty(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

/// Format an EntityId for display, truncating if too long
///
/// IDs longer than 16 characters are truncated to 13 chars with "..." suffix.
pub fn format_short_id(id: &EntityId) -> String {
    let s = id.to_string();
    if s.len() > 16 {
        format!("{}...", &s[..13])
    } else {
        s
    }
}

/// Truncate a string to max_len, adding "..." if truncated
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Escape a string for CSV output
///
/// Handles commas, quotes, and newlines according to RFC 4180.
pub fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

/// One-line summary of what a rollup touched
pub fn print_rollup_summary(outcome: &RollupOutcome, global: &GlobalOpts) {
    if global.quiet || outcome.roots.is_empty() {
        return;
    }
    println!(
        "{} Recomputed {} node(s) under {} root(s)",
        console::style("↻").cyan(),
        outcome.recomputed,
        outcome.roots.len()
    );
    for root in &outcome.roots {
        println!(
            "   {} {}",
            console::style(root.id.to_string()).cyan(),
            format_cost(root.total_cost)
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::identity::EntityPrefix;

    fn global(format: OutputFormat) -> GlobalOpts {
        GlobalOpts {
            format,
            quiet: false,
            verbose: false,
            project: None,
        }
    }

    #[test]
    fn test_format_short_id() {
        let id = EntityId::new(EntityPrefix::Nom);
        let formatted = format_short_id(&id);
        // ULID IDs are 30 chars (3 prefix + 1 dash + 26 ULID), so should truncate
        assert!(formatted.len() <= 16);
        assert!(formatted.ends_with("..."));
    }

    #[test]
    fn test_truncate_str() {
        assert_eq!(truncate_str("hello", 10), "hello");
        assert_eq!(truncate_str("hello world", 8), "hello...");
        assert_eq!(truncate_str("hi", 2), "hi");
        assert_eq!(truncate_str("Болт М8 оцинк", 7), "Болт...");
    }

    #[test]
    fn test_escape_csv() {
        assert_eq!(escape_csv("simple"), "simple");
        assert_eq!(escape_csv("with,comma"), "\"with,comma\"");
        assert_eq!(escape_csv("with\"quote"), "\"with\"\"quote\"");
    }

    #[test]
    fn test_number_formatting() {
        assert_eq!(format_cost(17.0), "17.00");
        assert_eq!(format_cost(0.126), "0.13");
        assert_eq!(format_qty(4.0), "4");
        assert_eq!(format_qty(2.5), "2.5");
    }

    #[test]
    fn test_output_format_precedence() {
        let config = Config {
            default_format: Some("json".into()),
            ..Default::default()
        };
        assert_eq!(
            output_format(&global(OutputFormat::Auto), &config, OutputFormat::Tsv),
            OutputFormat::Json
        );
        assert_eq!(
            output_format(&global(OutputFormat::Csv), &config, OutputFormat::Tsv),
            OutputFormat::Csv
        );
        assert_eq!(
            output_format(&global(OutputFormat::Auto), &Config::default(), OutputFormat::Tsv),
            OutputFormat::Tsv
        );
    }
}
