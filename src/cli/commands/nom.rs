//! `bomcost nom` command - Nomenclature (parts and assemblies) management

use clap::Subcommand;
use console::style;
use csv::ReaderBuilder;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::PathBuf;

use crate::cli::helpers::{
    format_cost, format_short_id, open_session, output_format, print_rollup_summary,
    print_structured,
};
use crate::cli::table::{CellValue, ColumnDef, TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::catalog::PriceUpdate;
use crate::core::entity::Entity;
use crate::core::store::Store;
use crate::entities::{Nomenclature, Parameter};

#[derive(Subcommand, Debug)]
pub enum NomCommands {
    /// Register a new part or assembly
    New(NewArgs),

    /// List nomenclature with derived costs
    List(ListArgs),

    /// Show a part or assembly
    Show(ShowArgs),

    /// Change a purchase cost and roll it up
    SetCost(SetCostArgs),

    /// Delete a part or assembly together with its own BOM
    Rm(RmArgs),

    /// Set purchase costs from a CSV file with `code,purchase_cost` columns
    ImportPrices(ImportPricesArgs),
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    /// Component family (ID or name)
    #[arg(long, short = 'F')]
    pub family: String,

    /// Create the family if no family has this name
    #[arg(long)]
    pub create_family: bool,

    /// Execution name within the family (e.g., "M8x40")
    #[arg(long, short = 'n')]
    pub name: Option<String>,

    /// Unique item code
    #[arg(long, short = 'c')]
    pub code: Option<String>,

    /// Own purchase cost
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub cost: f64,

    /// Currency label (default: from config)
    #[arg(long)]
    pub currency: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Only nodes no BOM line uses
    #[arg(long)]
    pub top_level: bool,

    /// Filter by family (ID or name)
    #[arg(long, short = 'F')]
    pub family: Option<String>,

    /// Show only count
    #[arg(long)]
    pub count: bool,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Nomenclature ID or code
    pub id: String,
}

#[derive(clap::Args, Debug)]
pub struct SetCostArgs {
    /// Nomenclature ID or code
    pub id: String,

    /// New purchase cost
    #[arg(allow_negative_numbers = true)]
    pub cost: f64,
}

#[derive(clap::Args, Debug)]
pub struct RmArgs {
    /// Nomenclature ID or code
    pub id: String,
}

#[derive(clap::Args, Debug)]
pub struct ImportPricesArgs {
    /// CSV file to read (`-` for stdin)
    pub file: PathBuf,
}

const NOM_COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("id", "ID", 17),
    ColumnDef::new("code", "CODE", 16),
    ColumnDef::new("name", "NAME", 30),
    ColumnDef::new("purchase", "PURCHASE", 12),
    ColumnDef::new("material", "MATERIAL", 12),
    ColumnDef::new("total", "TOTAL", 12),
    ColumnDef::new("used_in", "USED IN", 7),
];

/// A node as shown by `nom show`
#[derive(Serialize)]
struct NomenclatureView {
    #[serde(flatten)]
    nomenclature: Nomenclature,
    fullname: String,
    used_in: usize,
    bom_lines: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    parameters: Vec<Parameter>,
}

pub fn run(cmd: NomCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        NomCommands::New(args) => run_new(args, global),
        NomCommands::List(args) => run_list(args, global),
        NomCommands::Show(args) => run_show(args, global),
        NomCommands::SetCost(args) => run_set_cost(args, global),
        NomCommands::Rm(args) => run_rm(args, global),
        NomCommands::ImportPrices(args) => run_import_prices(args, global),
    }
}

fn run_new(args: NewArgs, global: &GlobalOpts) -> Result<()> {
    let mut session = open_session(global)?;

    let family = if args.create_family {
        session.catalog.find_or_create_family(&args.family)?
    } else {
        session.catalog.resolve_family(&args.family)?
    };
    let currency = args.currency.unwrap_or_else(|| session.config.currency());

    let mut nomenclature = Nomenclature::new(family.id, currency).with_purchase_cost(args.cost);
    if let Some(name) = args.name {
        nomenclature = nomenclature.with_name(name);
    }
    if let Some(code) = args.code {
        nomenclature = nomenclature.with_code(code);
    }
    let nomenclature = session.catalog.create_nomenclature(nomenclature)?;

    match output_format(global, &session.config, OutputFormat::Tsv) {
        OutputFormat::Id => println!("{}", nomenclature.id),
        format @ (OutputFormat::Json | OutputFormat::Yaml) => {
            print_structured(&nomenclature, format)?
        }
        _ if global.quiet => {}
        _ => {
            println!(
                "{} Created {} {}",
                style("✓").green(),
                style(session.catalog.fullname(&nomenclature)).yellow(),
                style(format_short_id(&nomenclature.id)).cyan()
            );
            println!(
                "   Purchase cost: {} {}",
                format_cost(nomenclature.purchase_cost),
                nomenclature.currency
            );
        }
    }
    Ok(())
}

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let session = open_session(global)?;
    let catalog = &session.catalog;

    let family = match &args.family {
        Some(key) => Some(catalog.resolve_family(key)?.id),
        None => None,
    };

    let mut nodes = Vec::new();
    for node in catalog.store().nomenclatures().into_diagnostic()? {
        if family.as_ref().is_some_and(|f| *f != node.family) {
            continue;
        }
        let used_in = catalog.used_in_count(&node.id)?;
        if args.top_level && used_in > 0 {
            continue;
        }
        nodes.push((node, used_in));
    }

    if args.count {
        println!("{}", nodes.len());
        return Ok(());
    }

    let format = output_format(global, &session.config, OutputFormat::Tsv);
    if matches!(format, OutputFormat::Json | OutputFormat::Yaml) {
        let records: Vec<&Nomenclature> = nodes.iter().map(|(n, _)| n).collect();
        return print_structured(&records, format);
    }

    let rows: Vec<TableRow> = nodes
        .into_iter()
        .map(|(node, used_in)| {
            TableRow::for_entity(&node)
                .cell("code", CellValue::opt_text(node.code.as_deref()))
                .cell("name", CellValue::Text(catalog.fullname(&node)))
                .cell("purchase", CellValue::Cost(node.purchase_cost))
                .cell("material", CellValue::Cost(node.material_cost))
                .cell("total", CellValue::Cost(node.total_cost))
                .cell("used_in", CellValue::Count(used_in))
        })
        .collect();

    TableFormatter::new(NOM_COLUMNS, "item")
        .with_summary(!global.quiet)
        .output(&rows, format);
    Ok(())
}

fn run_show(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let session = open_session(global)?;
    let catalog = &session.catalog;

    let nomenclature = catalog.resolve_nomenclature(&args.id)?;
    let view = NomenclatureView {
        fullname: catalog.fullname(&nomenclature),
        used_in: catalog.used_in_count(&nomenclature.id)?,
        bom_lines: catalog.bom_of(&nomenclature.id)?.len(),
        parameters: catalog.parameters_of(&nomenclature.id)?,
        nomenclature,
    };

    match output_format(global, &session.config, OutputFormat::Yaml) {
        OutputFormat::Id => println!("{}", view.nomenclature.id),
        format @ OutputFormat::Json => print_structured(&view, format)?,
        _ => print_structured(&view, OutputFormat::Yaml)?,
    }
    Ok(())
}

fn run_set_cost(args: SetCostArgs, global: &GlobalOpts) -> Result<()> {
    let mut session = open_session(global)?;
    let nomenclature = session.catalog.resolve_nomenclature(&args.id)?;
    let outcome = session
        .catalog
        .set_purchase_cost(&nomenclature.id, args.cost)?;

    match output_format(global, &session.config, OutputFormat::Tsv) {
        format @ (OutputFormat::Json | OutputFormat::Yaml) => print_structured(&outcome, format)?,
        _ => {
            if !global.quiet {
                println!(
                    "{} Purchase cost of {} set to {}",
                    style("✓").green(),
                    style(session.catalog.fullname(&nomenclature)).yellow(),
                    format_cost(args.cost)
                );
            }
            print_rollup_summary(&outcome, global);
        }
    }
    Ok(())
}

fn run_rm(args: RmArgs, global: &GlobalOpts) -> Result<()> {
    let mut session = open_session(global)?;
    let nomenclature = session.catalog.resolve_nomenclature(&args.id)?;
    session.catalog.delete_nomenclature(&nomenclature.id)?;

    if !global.quiet {
        println!(
            "{} Deleted {} ({})",
            style("✓").green(),
            style(nomenclature.label()).yellow(),
            style(format_short_id(&nomenclature.id)).cyan()
        );
    }
    Ok(())
}

fn run_import_prices(args: ImportPricesArgs, global: &GlobalOpts) -> Result<()> {
    let rows = if args.file.as_os_str() == "-" {
        read_prices(io::stdin().lock())?
    } else {
        let file = File::open(&args.file).into_diagnostic()?;
        read_prices(BufReader::new(file))?
    };

    let mut session = open_session(global)?;
    let summary = session.catalog.import_prices(&rows)?;

    match output_format(global, &session.config, OutputFormat::Tsv) {
        format @ (OutputFormat::Json | OutputFormat::Yaml) => print_structured(&summary, format)?,
        _ => {
            if !global.quiet {
                println!(
                    "{} Imported prices: {} updated, {} unchanged",
                    style("✓").green(),
                    style(summary.updated).cyan(),
                    summary.unchanged
                );
                for code in &summary.unknown {
                    println!("   {} unknown code {}", style("!").yellow(), style(code).dim());
                }
            }
            print_rollup_summary(&summary.rollup, global);
        }
    }
    Ok(())
}

/// Parse `code,purchase_cost` rows; other columns are ignored
fn read_prices<R: Read>(reader: R) -> Result<Vec<PriceUpdate>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers().into_diagnostic()?.clone();
    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case(name))
            .ok_or_else(|| miette::miette!("price file has no '{}' column", name))
    };
    let code_idx = column("code")?;
    let cost_idx = column("purchase_cost")?;

    let mut rows = Vec::new();
    for (row_idx, result) in rdr.records().enumerate() {
        let row_num = row_idx + 2; // +2 for 1-indexed and header row
        let record =
            result.map_err(|e| miette::miette!("price file row {}: {}", row_num, e))?;

        let code = record.get(code_idx).unwrap_or_default();
        if code.is_empty() {
            continue;
        }
        let cost = record.get(cost_idx).unwrap_or_default();
        let purchase_cost = cost.parse::<f64>().map_err(|_| {
            miette::miette!("price file row {}: '{}' is not a cost", row_num, cost)
        })?;
        rows.push(PriceUpdate {
            code: code.to_string(),
            purchase_cost,
        });
    }
    Ok(rows)
}
