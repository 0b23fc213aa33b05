//! `bomcost param` command - Technical parameters of a part or assembly

use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};

use crate::cli::commands::uom::resolve_uom;
use crate::cli::helpers::{format_short_id, open_session, output_format, print_structured};
use crate::cli::table::{CellValue, ColumnDef, TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::entity::Entity;
use crate::core::identity::EntityId;
use crate::core::store::Store;
use crate::entities::Parameter;

#[derive(Subcommand, Debug)]
pub enum ParamCommands {
    /// Set a named value on a part or assembly
    Add(AddArgs),

    /// List the parameters of a part or assembly
    List(ListArgs),

    /// Remove a parameter
    Rm(RmArgs),
}

#[derive(clap::Args, Debug)]
pub struct AddArgs {
    /// Nomenclature ID or code
    pub id: String,

    /// Parameter name (e.g., "Length")
    pub name: String,

    /// Numeric value
    #[arg(allow_negative_numbers = true)]
    pub value: f64,

    /// Unit of the value (ID or name)
    #[arg(long, short = 'u')]
    pub uom: Option<String>,

    /// Display order among the node's parameters
    #[arg(long, short = 's')]
    pub sequence: Option<i32>,
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Nomenclature ID or code
    pub id: String,
}

#[derive(clap::Args, Debug)]
pub struct RmArgs {
    /// Parameter ID
    pub param: String,
}

const PARAM_COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("id", "ID", 17),
    ColumnDef::new("seq", "SEQ", 4),
    ColumnDef::new("name", "NAME", 24),
    ColumnDef::new("value", "VALUE", 12),
    ColumnDef::new("uom", "UOM", 8),
];

pub fn run(cmd: ParamCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        ParamCommands::Add(args) => run_add(args, global),
        ParamCommands::List(args) => run_list(args, global),
        ParamCommands::Rm(args) => run_rm(args, global),
    }
}

fn run_add(args: AddArgs, global: &GlobalOpts) -> Result<()> {
    let mut session = open_session(global)?;
    let node = session.catalog.resolve_nomenclature(&args.id)?;

    let mut parameter = Parameter::new(node.id.clone(), args.name, args.value);
    if let Some(uom) = &args.uom {
        parameter = parameter.with_uom(resolve_uom(&session.catalog, uom)?.id);
    }
    if let Some(sequence) = args.sequence {
        parameter = parameter.with_sequence(sequence);
    }
    let parameter = session.catalog.add_parameter(parameter)?;

    match output_format(global, &session.config, OutputFormat::Tsv) {
        OutputFormat::Id => println!("{}", parameter.id),
        format @ (OutputFormat::Json | OutputFormat::Yaml) => {
            print_structured(&parameter, format)?
        }
        _ if global.quiet => {}
        _ => println!(
            "{} Set {} = {} on {}",
            style("✓").green(),
            style(parameter.label()).yellow(),
            parameter.value,
            style(session.catalog.fullname(&node)).cyan()
        ),
    }
    Ok(())
}

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let session = open_session(global)?;
    let catalog = &session.catalog;
    let node = catalog.resolve_nomenclature(&args.id)?;
    let params = catalog.parameters_of(&node.id)?;

    let format = output_format(global, &session.config, OutputFormat::Tsv);
    if matches!(format, OutputFormat::Json | OutputFormat::Yaml) {
        return print_structured(&params, format);
    }

    let mut rows = Vec::with_capacity(params.len());
    for param in params {
        let uom = match &param.uom {
            Some(id) => catalog.store().uom(id).into_diagnostic()?.map(|u| u.name),
            None => None,
        };
        rows.push(
            TableRow::for_entity(&param)
                .cell("seq", CellValue::Text(param.sequence.to_string()))
                .cell("name", CellValue::Text(param.name))
                .cell("value", CellValue::Text(param.value.to_string()))
                .cell("uom", CellValue::opt_text(uom.as_deref())),
        );
    }

    TableFormatter::new(PARAM_COLUMNS, "parameter")
        .with_summary(!global.quiet)
        .output(&rows, format);
    Ok(())
}

fn run_rm(args: RmArgs, global: &GlobalOpts) -> Result<()> {
    let mut session = open_session(global)?;
    let id = EntityId::parse_as(&args.param, Parameter::PREFIX).into_diagnostic()?;
    session.catalog.remove_parameter(&id)?;

    if !global.quiet {
        println!(
            "{} Removed parameter {}",
            style("✓").green(),
            style(format_short_id(&id)).cyan()
        );
    }
    Ok(())
}
