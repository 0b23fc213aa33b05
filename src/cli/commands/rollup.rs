//! `bomcost rollup` command - Recompute derived costs

use console::style;
use miette::Result;

use crate::cli::helpers::{open_session, output_format, print_rollup_summary, print_structured};
use crate::cli::{GlobalOpts, OutputFormat};

#[derive(clap::Args, Debug)]
pub struct RollupArgs {
    /// Recompute the roots above these items (IDs or codes)
    #[arg(required_unless_present = "all")]
    pub ids: Vec<String>,

    /// Recompute every root in the catalog
    #[arg(long, conflicts_with = "ids")]
    pub all: bool,
}

pub fn run(args: RollupArgs, global: &GlobalOpts) -> Result<()> {
    let mut session = open_session(global)?;

    let outcome = if args.all {
        session.catalog.recompute_all()?
    } else {
        let mut ids = Vec::with_capacity(args.ids.len());
        for key in &args.ids {
            ids.push(session.catalog.resolve_nomenclature(key)?.id);
        }
        session.catalog.recompute(&ids)?
    };

    match output_format(global, &session.config, OutputFormat::Tsv) {
        format @ (OutputFormat::Json | OutputFormat::Yaml) => print_structured(&outcome, format)?,
        _ if outcome.roots.is_empty() && !global.quiet => {
            println!("{} Nothing to recompute", style("✓").green());
        }
        _ => print_rollup_summary(&outcome, global),
    }
    Ok(())
}
