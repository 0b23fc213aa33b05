//! `bomcost check` command - Verify stored costs against their inputs

use console::style;
use miette::Result;

use crate::cli::helpers::{open_session, output_format, print_structured};
use crate::cli::{GlobalOpts, OutputFormat};

#[derive(clap::Args, Debug)]
pub struct CheckArgs {
    /// Recompute every root first, then verify
    #[arg(long)]
    pub fix: bool,
}

pub fn run(args: CheckArgs, global: &GlobalOpts) -> Result<()> {
    let mut session = open_session(global)?;

    if args.fix {
        let outcome = session.catalog.recompute_all()?;
        tracing::info!(roots = outcome.roots.len(), "recomputed before check");
    }
    let violations = session.catalog.check()?;
    let errors = violations.iter().filter(|v| v.is_cost_error()).count();

    match output_format(global, &session.config, OutputFormat::Tsv) {
        format @ (OutputFormat::Json | OutputFormat::Yaml) => print_structured(&violations, format)?,
        _ => {
            for violation in &violations {
                let marker = if violation.is_cost_error() {
                    style("✗").red()
                } else {
                    style("!").yellow()
                };
                println!("{} {}", marker, violation);
            }
            if violations.is_empty() && !global.quiet {
                println!("{} All stored costs are consistent", style("✓").green());
            }
        }
    }

    if errors > 0 {
        return Err(miette::miette!(
            help = "run `bomcost check --fix` to recompute every assembly",
            "{} stored cost value(s) disagree with their inputs",
            errors
        ));
    }
    Ok(())
}
