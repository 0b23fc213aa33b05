//! `bomcost uom` command - Unit of measure management

use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};

use crate::cli::helpers::{format_short_id, open_session, output_format, print_structured};
use crate::cli::table::{CellValue, ColumnDef, TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::catalog::Catalog;
use crate::core::entity::Entity;
use crate::core::store::Store;
use crate::entities::UnitOfMeasure;

#[derive(Subcommand, Debug)]
pub enum UomCommands {
    /// Create a new unit of measure
    New(NewArgs),

    /// List units of measure
    List,
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    /// Unit name (e.g., pcs, m, kg)
    pub name: String,

    /// Rounding precision for quantities in this unit
    #[arg(long, short = 'r', default_value_t = 0.01)]
    pub rounding: f64,
}

const UOM_COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("id", "ID", 17),
    ColumnDef::new("name", "NAME", 20),
    ColumnDef::new("rounding", "ROUNDING", 10),
];

pub fn run(cmd: UomCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        UomCommands::New(args) => run_new(args, global),
        UomCommands::List => run_list(global),
    }
}

fn run_new(args: NewArgs, global: &GlobalOpts) -> Result<()> {
    let mut session = open_session(global)?;
    let uom = session
        .catalog
        .create_uom(UnitOfMeasure::new(args.name).with_rounding(args.rounding))?;

    match output_format(global, &session.config, OutputFormat::Tsv) {
        OutputFormat::Id => println!("{}", uom.id),
        format @ (OutputFormat::Json | OutputFormat::Yaml) => print_structured(&uom, format)?,
        _ if global.quiet => {}
        _ => println!(
            "{} Created unit {} ({})",
            style("✓").green(),
            style(uom.label()).yellow(),
            style(format_short_id(&uom.id)).cyan()
        ),
    }
    Ok(())
}

fn run_list(global: &GlobalOpts) -> Result<()> {
    let session = open_session(global)?;
    let mut uoms = session.catalog.store().uoms().into_diagnostic()?;
    uoms.sort_by(|a, b| a.name.cmp(&b.name));

    let format = output_format(global, &session.config, OutputFormat::Tsv);
    if matches!(format, OutputFormat::Json | OutputFormat::Yaml) {
        return print_structured(&uoms, format);
    }

    let rows: Vec<TableRow> = uoms
        .into_iter()
        .map(|u| {
            TableRow::for_entity(&u)
                .cell("name", CellValue::Text(u.name))
                .cell("rounding", CellValue::Qty(u.rounding))
        })
        .collect();

    TableFormatter::new(UOM_COLUMNS, "unit")
        .with_summary(!global.quiet)
        .output(&rows, format);
    Ok(())
}

/// Accept a unit reference as an id or a name
pub(crate) fn resolve_uom<S: Store>(catalog: &Catalog<S>, key: &str) -> Result<UnitOfMeasure> {
    if let Some(id) = UnitOfMeasure::parse_id(key) {
        return catalog
            .store()
            .uom(&id)
            .into_diagnostic()?
            .ok_or_else(|| miette::miette!("unit {} not found", id));
    }
    catalog
        .store()
        .uoms()
        .into_diagnostic()?
        .into_iter()
        .find(|u| u.name == key)
        .ok_or_else(|| miette::miette!("unit '{}' not found", key))
}
