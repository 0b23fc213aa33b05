//! `bomcost bom` command - BOM line management

use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};

use crate::cli::helpers::{
    format_cost, format_qty, format_short_id, open_session, output_format, print_rollup_summary,
    print_structured,
};
use crate::cli::table::{CellValue, ColumnDef, TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::catalog::Catalog;
use crate::core::entity::Entity;
use crate::core::identity::EntityId;
use crate::core::store::Store;
use crate::entities::{BomLine, BomLinePatch};

#[derive(Subcommand, Debug)]
pub enum BomCommands {
    /// Add a line to an assembly's BOM
    Add(AddArgs),

    /// List the lines of an assembly's BOM
    List(ListArgs),

    /// Edit a BOM line
    Set(SetArgs),

    /// Remove a BOM line
    Rm(RmArgs),
}

#[derive(clap::Args, Debug)]
pub struct AddArgs {
    /// Parent assembly (ID or code)
    pub parent: String,

    /// Interchangeable analogs (IDs or codes, comma-separated)
    #[arg(long, short = 'a', value_delimiter = ',')]
    pub analogs: Vec<String>,

    /// Quantity per parent
    #[arg(long)]
    pub qty: f64,

    /// Line family (ID or name; default: the first analog's family)
    #[arg(long, short = 'F')]
    pub family: Option<String>,

    /// Display order within the BOM
    #[arg(long, short = 's')]
    pub sequence: Option<i32>,
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Parent assembly (ID or code)
    pub parent: String,
}

#[derive(clap::Args, Debug)]
pub struct SetArgs {
    /// BOM line ID
    pub line: String,

    /// New quantity
    #[arg(long)]
    pub qty: Option<f64>,

    /// Replace the analog set (IDs or codes, comma-separated)
    #[arg(long, short = 'a', value_delimiter = ',', conflicts_with = "clear_analogs")]
    pub analogs: Option<Vec<String>>,

    /// Empty the analog set
    #[arg(long)]
    pub clear_analogs: bool,

    /// Move the line to another parent (ID or code)
    #[arg(long)]
    pub parent: Option<String>,

    /// New line family (ID or name)
    #[arg(long, short = 'F')]
    pub family: Option<String>,

    /// New display order
    #[arg(long, short = 's')]
    pub sequence: Option<i32>,
}

#[derive(clap::Args, Debug)]
pub struct RmArgs {
    /// BOM line ID
    pub line: String,
}

const LINE_COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("id", "ID", 17),
    ColumnDef::new("seq", "SEQ", 4),
    ColumnDef::new("family", "FAMILY", 20),
    ColumnDef::new("qty", "QTY", 8),
    ColumnDef::new("analogs", "ANALOGS", 36),
    ColumnDef::new("cost", "UNIT COST", 12),
    ColumnDef::new("total", "LINE TOTAL", 12),
];

pub fn run(cmd: BomCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        BomCommands::Add(args) => run_add(args, global),
        BomCommands::List(args) => run_list(args, global),
        BomCommands::Set(args) => run_set(args, global),
        BomCommands::Rm(args) => run_rm(args, global),
    }
}

fn run_add(args: AddArgs, global: &GlobalOpts) -> Result<()> {
    let mut session = open_session(global)?;
    let catalog = &mut session.catalog;

    let parent = catalog.resolve_nomenclature(&args.parent)?;
    let analogs = resolve_analogs(catalog, &args.analogs)?;
    let family = match &args.family {
        Some(key) => catalog.resolve_family(key)?.id,
        None => match analogs.first() {
            Some(first) => first.1.clone(),
            None => return Err(miette::miette!("a line without analogs needs --family")),
        },
    };

    let mut line = BomLine::new(parent.id, family, args.qty)
        .with_analogs(analogs.into_iter().map(|(id, _)| id));
    if let Some(sequence) = args.sequence {
        line = line.with_sequence(sequence);
    }
    let (line, outcome) = catalog.add_bom_line(line)?;

    match output_format(global, &session.config, OutputFormat::Tsv) {
        OutputFormat::Id => println!("{}", line.id),
        format @ (OutputFormat::Json | OutputFormat::Yaml) => print_structured(&line, format)?,
        _ => {
            if !global.quiet {
                println!(
                    "{} Added line {} ({} x {})",
                    style("✓").green(),
                    style(format_short_id(&line.id)).cyan(),
                    format_qty(line.quantity),
                    format_cost(line.cost)
                );
            }
            print_rollup_summary(&outcome, global);
        }
    }
    Ok(())
}

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let session = open_session(global)?;
    let catalog = &session.catalog;

    let parent = catalog.resolve_nomenclature(&args.parent)?;
    let lines = catalog.bom_of(&parent.id)?;

    let format = output_format(global, &session.config, OutputFormat::Tsv);
    if matches!(format, OutputFormat::Json | OutputFormat::Yaml) {
        return print_structured(&lines, format);
    }

    let mut rows = Vec::with_capacity(lines.len());
    for line in lines {
        let family = catalog
            .store()
            .family(&line.family)
            .into_diagnostic()?
            .map(|f| f.name);
        let mut labels = Vec::with_capacity(line.analogs.len());
        for analog in &line.analogs {
            let label = catalog
                .store()
                .nomenclature(analog)
                .into_diagnostic()?
                .map(|n| n.code.clone().unwrap_or_else(|| catalog.fullname(&n)))
                .unwrap_or_else(|| analog.to_string());
            labels.push(label);
        }

        rows.push(
            TableRow::for_entity(&line)
                .cell("seq", CellValue::Text(line.sequence.to_string()))
                .cell("family", CellValue::opt_text(family.as_deref()))
                .cell("qty", CellValue::Qty(line.quantity))
                .cell("analogs", CellValue::Text(labels.join(", ")))
                .cell("cost", CellValue::Cost(line.cost))
                .cell("total", CellValue::Cost(line.line_total)),
        );
    }

    TableFormatter::new(LINE_COLUMNS, "line")
        .with_summary(!global.quiet)
        .output(&rows, format);
    Ok(())
}

fn run_set(args: SetArgs, global: &GlobalOpts) -> Result<()> {
    let mut session = open_session(global)?;
    let catalog = &mut session.catalog;
    let id = parse_line_id(&args.line)?;

    let mut patch = BomLinePatch {
        quantity: args.qty,
        sequence: args.sequence,
        ..Default::default()
    };
    if args.clear_analogs {
        patch.analogs = Some(Vec::new());
    } else if let Some(keys) = &args.analogs {
        let analogs = resolve_analogs(catalog, keys)?;
        patch.analogs = Some(analogs.into_iter().map(|(id, _)| id).collect());
    }
    if let Some(key) = &args.parent {
        patch.parent = Some(catalog.resolve_nomenclature(key)?.id);
    }
    if let Some(key) = &args.family {
        patch.family = Some(catalog.resolve_family(key)?.id);
    }
    if patch.is_empty() {
        return Err(miette::miette!("nothing to change; pass at least one option"));
    }

    let (line, outcome) = catalog.update_bom_line(&id, &patch)?;

    match output_format(global, &session.config, OutputFormat::Tsv) {
        format @ (OutputFormat::Json | OutputFormat::Yaml) => print_structured(&line, format)?,
        _ => {
            if !global.quiet {
                println!(
                    "{} Updated line {}",
                    style("✓").green(),
                    style(format_short_id(&line.id)).cyan()
                );
            }
            if let Some(outcome) = &outcome {
                print_rollup_summary(outcome, global);
            }
        }
    }
    Ok(())
}

fn run_rm(args: RmArgs, global: &GlobalOpts) -> Result<()> {
    let mut session = open_session(global)?;
    let id = parse_line_id(&args.line)?;
    let outcome = session.catalog.remove_bom_line(&id)?;

    if !global.quiet {
        println!(
            "{} Removed line {}",
            style("✓").green(),
            style(format_short_id(&id)).cyan()
        );
    }
    print_rollup_summary(&outcome, global);
    Ok(())
}

fn parse_line_id(key: &str) -> Result<EntityId> {
    EntityId::parse_as(key, BomLine::PREFIX).into_diagnostic()
}

/// Resolve analog references to (id, family) pairs
fn resolve_analogs<S: Store>(
    catalog: &Catalog<S>,
    keys: &[String],
) -> Result<Vec<(EntityId, EntityId)>> {
    let mut analogs = Vec::with_capacity(keys.len());
    for key in keys.iter().map(|k| k.trim()).filter(|k| !k.is_empty()) {
        let node = catalog.resolve_nomenclature(key)?;
        analogs.push((node.id, node.family));
    }
    Ok(analogs)
}
