use clap::Parser;
use miette::Result;
use tracing_subscriber::EnvFilter;

use bomcost::cli::commands;
use bomcost::cli::{Cli, Commands, GlobalOpts};
use bomcost::core::{Config, Project};

fn main() -> Result<()> {
    // Reset SIGPIPE to default behavior (terminate silently) for proper Unix piping.
    // Without this, piping to `head`, `grep -q`, etc. causes a panic on broken pipe.
    #[cfg(unix)]
    {
        unsafe {
            libc::signal(libc::SIGPIPE, libc::SIG_DFL);
        }
    }
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    let global = cli.global;
    init_logging(&global);

    match cli.command {
        Commands::Init(args) => commands::init::run(args, &global),
        Commands::Cat(cmd) => commands::cat::run(cmd, &global),
        Commands::Uom(cmd) => commands::uom::run(cmd, &global),
        Commands::Fam(cmd) => commands::fam::run(cmd, &global),
        Commands::Nom(cmd) => commands::nom::run(cmd, &global),
        Commands::Param(cmd) => commands::param::run(cmd, &global),
        Commands::Bom(cmd) => commands::bom::run(cmd, &global),
        Commands::WhereUsed(args) => commands::where_used::run(args, &global),
        Commands::Roots(args) => commands::roots::run(args, &global),
        Commands::Rollup(args) => commands::rollup::run(args, &global),
        Commands::Check(args) => commands::check::run(args, &global),
        Commands::Report(args) => commands::report::run(args, &global),
        Commands::Completions(args) => commands::completions::run(args),
    }
}

/// Log to stderr: BOMCOST_LOG, then the configured filter, then the verbosity default
fn init_logging(global: &GlobalOpts) {
    let project = match &global.project {
        Some(path) => Project::discover_from(path).ok(),
        None => Project::discover().ok(),
    };
    let default = if global.verbose { "debug" } else { "warn" };
    let filter = Config::load_for(project.as_ref())
        .log_filter
        .unwrap_or_else(|| default.to_string());

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&filter).unwrap_or_else(|_| EnvFilter::new(default)))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
