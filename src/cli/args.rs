//! CLI argument definitions using clap derive

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::cli::commands::{
    bom::BomCommands, cat::CatCommands, check::CheckArgs, completions::CompletionsArgs,
    fam::FamCommands, init::InitArgs, nom::NomCommands, param::ParamCommands,
    report::ReportArgs, rollup::RollupArgs, roots::RootsArgs, uom::UomCommands,
    where_used::WhereUsedArgs,
};

#[derive(Parser)]
#[command(name = "bomcost")]
#[command(author, version, about = "Hierarchical BOM cost rollup")]
#[command(long_about = "Keeps the material and total cost of every assembly in a multi-level bill of materials up to date as part prices and BOM lines change.")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOpts,
}

#[derive(clap::Args, Clone, Debug)]
pub struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "auto")]
    pub format: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Enable verbose output (debug logging)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Project root (default: auto-detect by finding .bomcost/)
    #[arg(long, global = true)]
    pub project: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new bomcost project
    Init(InitArgs),

    /// Category management
    #[command(subcommand)]
    Cat(CatCommands),

    /// Unit of measure management
    #[command(subcommand)]
    Uom(UomCommands),

    /// Component family management
    #[command(subcommand)]
    Fam(FamCommands),

    /// Nomenclature (parts and assemblies) management
    #[command(subcommand)]
    Nom(NomCommands),

    /// Technical parameters of parts and assemblies
    #[command(subcommand)]
    Param(ParamCommands),

    /// BOM line management
    #[command(subcommand)]
    Bom(BomCommands),

    /// Show the assemblies that use a part
    WhereUsed(WhereUsedArgs),

    /// Show the top-level assemblies above parts
    Roots(RootsArgs),

    /// Recompute derived costs
    Rollup(RollupArgs),

    /// Verify stored costs against their inputs
    Check(CheckArgs),

    /// Cost breakdown of an assembly
    Report(ReportArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Automatically detect based on context (yaml for show, tsv for list)
    #[default]
    Auto,
    /// YAML format (full fidelity)
    Yaml,
    /// Tab-separated values (for piping)
    Tsv,
    /// JSON format (for programming)
    Json,
    /// CSV format (for spreadsheets)
    Csv,
    /// Markdown tables
    Md,
    /// Just IDs, one per line
    Id,
}

impl OutputFormat {
    /// Replace `Auto` with the command's preferred format
    pub fn or(self, fallback: OutputFormat) -> OutputFormat {
        match self {
            OutputFormat::Auto => fallback,
            f => f,
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        <OutputFormat as ValueEnum>::from_str(s, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["bomcost", "nom", "list", "--format", "json", "-v"]).unwrap();
        assert_eq!(cli.global.format, OutputFormat::Json);
        assert!(cli.global.verbose);
    }

    #[test]
    fn test_auto_format_fallback() {
        assert_eq!(OutputFormat::Auto.or(OutputFormat::Tsv), OutputFormat::Tsv);
        assert_eq!(OutputFormat::Csv.or(OutputFormat::Tsv), OutputFormat::Csv);
        assert_eq!("MD".parse::<OutputFormat>().unwrap(), OutputFormat::Md);
    }
}
