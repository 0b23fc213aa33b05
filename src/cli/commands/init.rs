//! `bomcost init` command - Initialize a new bomcost project

use console::style;
use miette::{IntoDiagnostic, Result};

use crate::cli::GlobalOpts;
use crate::core::project::{Project, ProjectError};
use crate::core::store::SqliteStore;

#[derive(clap::Args, Debug)]
pub struct InitArgs {
    /// Directory to initialize (default: current directory)
    #[arg(default_value = ".")]
    pub path: std::path::PathBuf,

    /// Rewrite the default config even if .bomcost/ already exists
    #[arg(long)]
    pub force: bool,
}

pub fn run(args: InitArgs, global: &GlobalOpts) -> Result<()> {
    let path = if args.path.as_os_str() == "." {
        std::env::current_dir().into_diagnostic()?
    } else {
        args.path.clone()
    };

    if !path.exists() {
        std::fs::create_dir_all(&path).into_diagnostic()?;
        if !global.quiet {
            println!(
                "{} Created directory {}",
                style("✓").green(),
                style(path.display()).cyan()
            );
        }
    }

    let project = if args.force {
        Project::init_force(&path)
    } else {
        Project::init(&path)
    };

    match project {
        Ok(project) => {
            // Opening the store creates the catalog schema
            SqliteStore::for_project(&project).into_diagnostic()?;

            if global.quiet {
                return Ok(());
            }
            println!(
                "{} Initialized bomcost project at {}",
                style("✓").green(),
                style(project.root().display()).cyan()
            );
            println!();
            println!("Created:");
            println!("  {}", style(".bomcost/config.yaml").dim());
            println!("  {}", style(".bomcost/catalog.db").dim());
            println!();
            println!("Next steps:");
            println!(
                "  {} Register a component family",
                style("bomcost fam new <NAME>").yellow()
            );
            println!(
                "  {} Add a part with its purchase cost",
                style("bomcost nom new --family <NAME> --cost <COST>").yellow()
            );
            Ok(())
        }
        Err(ProjectError::AlreadyExists(path)) => {
            println!(
                "{} bomcost project already exists at {}",
                style("!").yellow(),
                style(path.display()).cyan()
            );
            println!();
            println!(
                "Use {} to reinitialize",
                style("bomcost init --force").yellow()
            );
            Ok(())
        }
        Err(e) => Err(miette::miette!("{}", e)),
    }
}
