//! `bomcost fam` command - Component family management

use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};
use std::collections::HashMap;

use crate::cli::commands::{cat::resolve_category, uom::resolve_uom};
use crate::cli::helpers::{format_short_id, open_session, output_format, print_structured};
use crate::cli::table::{CellValue, ColumnDef, TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::entity::Entity;
use crate::core::identity::EntityId;
use crate::core::store::Store;
use crate::entities::ComponentFamily;

#[derive(Subcommand, Debug)]
pub enum FamCommands {
    /// Create a new component family
    New(NewArgs),

    /// List component families
    List,
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    /// Family name (unique)
    pub name: String,

    /// Unit of measure (ID or name)
    #[arg(long, short = 'u')]
    pub uom: Option<String>,

    /// Category (ID or name)
    #[arg(long, short = 'c')]
    pub category: Option<String>,
}

const FAM_COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("id", "ID", 17),
    ColumnDef::new("name", "NAME", 24),
    ColumnDef::new("uom", "UOM", 8),
    ColumnDef::new("category", "CATEGORY", 30),
    ColumnDef::new("parts", "PARTS", 6),
];

pub fn run(cmd: FamCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        FamCommands::New(args) => run_new(args, global),
        FamCommands::List => run_list(global),
    }
}

fn run_new(args: NewArgs, global: &GlobalOpts) -> Result<()> {
    let mut session = open_session(global)?;

    let mut family = ComponentFamily::new(args.name);
    if let Some(uom) = &args.uom {
        family = family.with_uom(resolve_uom(&session.catalog, uom)?.id);
    }
    if let Some(category) = &args.category {
        family = family.with_category(resolve_category(&session.catalog, category)?.id);
    }
    let family = session.catalog.create_family(family)?;

    match output_format(global, &session.config, OutputFormat::Tsv) {
        OutputFormat::Id => println!("{}", family.id),
        format @ (OutputFormat::Json | OutputFormat::Yaml) => print_structured(&family, format)?,
        _ if global.quiet => {}
        _ => println!(
            "{} Created family {} ({})",
            style("✓").green(),
            style(family.label()).yellow(),
            style(format_short_id(&family.id)).cyan()
        ),
    }
    Ok(())
}

fn run_list(global: &GlobalOpts) -> Result<()> {
    let session = open_session(global)?;
    let store = session.catalog.store();

    let mut families = store.families().into_diagnostic()?;
    families.sort_by(|a, b| a.name.cmp(&b.name));

    let format = output_format(global, &session.config, OutputFormat::Tsv);
    if matches!(format, OutputFormat::Json | OutputFormat::Yaml) {
        return print_structured(&families, format);
    }

    let mut part_counts: HashMap<EntityId, usize> = HashMap::new();
    for node in store.nomenclatures().into_diagnostic()? {
        *part_counts.entry(node.family).or_default() += 1;
    }

    let mut rows = Vec::with_capacity(families.len());
    for family in families {
        let uom = match &family.uom {
            Some(id) => store.uom(id).into_diagnostic()?.map(|u| u.name),
            None => None,
        };
        let category = match &family.category {
            Some(id) => store
                .category(id)
                .into_diagnostic()?
                .map(|c| session.catalog.category_path(&c)),
            None => None,
        };
        let parts = part_counts.get(&family.id).copied().unwrap_or(0);

        rows.push(
            TableRow::for_entity(&family)
                .cell("name", CellValue::Text(family.name))
                .cell("uom", CellValue::opt_text(uom.as_deref()))
                .cell("category", CellValue::opt_text(category.as_deref()))
                .cell("parts", CellValue::Count(parts)),
        );
    }

    TableFormatter::new(FAM_COLUMNS, "family")
        .with_summary(!global.quiet)
        .output(&rows, format);
    Ok(())
}
