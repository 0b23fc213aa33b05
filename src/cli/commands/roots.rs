//! `bomcost roots` command - Top-level assemblies above parts

use miette::{IntoDiagnostic, Result};

use crate::cli::helpers::{open_session, output_format, print_structured};
use crate::cli::table::{CellValue, ColumnDef, TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::store::Store;
use crate::entities::Nomenclature;

#[derive(clap::Args, Debug)]
pub struct RootsArgs {
    /// Parts to start from (IDs or codes); omit to list every top-level item
    pub ids: Vec<String>,
}

const ROOT_COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("id", "ID", 17),
    ColumnDef::new("code", "CODE", 16),
    ColumnDef::new("name", "NAME", 30),
    ColumnDef::new("total", "TOTAL", 12),
];

pub fn run(args: RootsArgs, global: &GlobalOpts) -> Result<()> {
    let session = open_session(global)?;
    let catalog = &session.catalog;

    let roots: Vec<Nomenclature> = if args.ids.is_empty() {
        catalog.top_level()?
    } else {
        let mut seeds = Vec::with_capacity(args.ids.len());
        for key in &args.ids {
            seeds.push(catalog.resolve_nomenclature(key)?.id);
        }
        let mut roots = Vec::new();
        for id in catalog.roots_of(&seeds)? {
            if let Some(node) = catalog.store().nomenclature(&id).into_diagnostic()? {
                roots.push(node);
            }
        }
        roots
    };

    let format = output_format(global, &session.config, OutputFormat::Tsv);
    if matches!(format, OutputFormat::Json | OutputFormat::Yaml) {
        return print_structured(&roots, format);
    }

    let rows: Vec<TableRow> = roots
        .into_iter()
        .map(|node| {
            TableRow::for_entity(&node)
                .cell("code", CellValue::opt_text(node.code.as_deref()))
                .cell("name", CellValue::Text(catalog.fullname(&node)))
                .cell("total", CellValue::Cost(node.total_cost))
        })
        .collect();

    TableFormatter::new(ROOT_COLUMNS, "root")
        .with_summary(!global.quiet)
        .output(&rows, format);
    Ok(())
}
