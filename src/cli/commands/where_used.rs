//! `bomcost where-used` command - Find the assemblies that use a part

use console::style;
use miette::{IntoDiagnostic, Result};

use crate::cli::helpers::{open_session, output_format, print_structured};
use crate::cli::table::{CellValue, ColumnDef, TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::store::Store;

#[derive(clap::Args, Debug)]
pub struct WhereUsedArgs {
    /// Nomenclature ID or code
    pub id: String,
}

const USE_COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("line", "LINE", 17),
    ColumnDef::new("parent", "PARENT", 30),
    ColumnDef::new("qty", "QTY", 8),
    ColumnDef::new("analogs", "ANALOGS", 7),
    ColumnDef::new("total", "LINE TOTAL", 12),
];

pub fn run(args: WhereUsedArgs, global: &GlobalOpts) -> Result<()> {
    let session = open_session(global)?;
    let catalog = &session.catalog;

    let node = catalog.resolve_nomenclature(&args.id)?;
    let lines = catalog.where_used(&node.id)?;

    let format = output_format(global, &session.config, OutputFormat::Tsv);
    if matches!(format, OutputFormat::Json | OutputFormat::Yaml) {
        return print_structured(&lines, format);
    }

    if lines.is_empty() {
        if !global.quiet {
            println!(
                "{} is not used by any BOM line.",
                style(catalog.fullname(&node)).yellow()
            );
        }
        return Ok(());
    }

    let mut rows = Vec::with_capacity(lines.len());
    for line in lines {
        let parent = catalog
            .store()
            .nomenclature(&line.parent)
            .into_diagnostic()?
            .map(|p| catalog.fullname(&p))
            .unwrap_or_else(|| line.parent.to_string());
        rows.push(
            TableRow::new(line.id.clone())
                .cell("line", CellValue::Id(line.id.clone()))
                .cell("parent", CellValue::Text(parent))
                .cell("qty", CellValue::Qty(line.quantity))
                .cell("analogs", CellValue::Count(line.analogs.len()))
                .cell("total", CellValue::Cost(line.line_total)),
        );
    }

    if !global.quiet && format == OutputFormat::Tsv {
        println!(
            "{} {} ({} assemblies)\n",
            style("Used by:").bold(),
            style(catalog.fullname(&node)).yellow(),
            catalog.used_in_count(&node.id)?
        );
    }
    TableFormatter::new(USE_COLUMNS, "line")
        .with_summary(!global.quiet)
        .output(&rows, format);
    Ok(())
}
