//! `bomcost cat` command - Family category management

use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};

use crate::cli::helpers::{format_short_id, open_session, output_format, print_structured};
use crate::cli::table::{CellValue, ColumnDef, TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::catalog::Catalog;
use crate::core::entity::Entity;
use crate::core::store::Store;
use crate::entities::{Category, OriginType};

#[derive(Subcommand, Debug)]
pub enum CatCommands {
    /// Create a new category
    New(NewArgs),

    /// List categories with their full paths
    List,
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    /// Category name
    pub name: String,

    /// Parent category (ID or name)
    #[arg(long, short = 'p')]
    pub parent: Option<String>,

    /// How items in this category are obtained
    #[arg(long, short = 'o', default_value = "purchase")]
    pub origin: OriginType,

    /// Hide the specification column for items in this category
    #[arg(long)]
    pub hide_specification: bool,
}

const CAT_COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("id", "ID", 17),
    ColumnDef::new("path", "PATH", 40),
    ColumnDef::new("origin", "ORIGIN", 12),
    ColumnDef::new("hidden", "HIDE SPEC", 9),
];

pub fn run(cmd: CatCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        CatCommands::New(args) => run_new(args, global),
        CatCommands::List => run_list(global),
    }
}

fn run_new(args: NewArgs, global: &GlobalOpts) -> Result<()> {
    let mut session = open_session(global)?;

    let mut category = Category::new(args.name).with_origin(args.origin);
    category.hide_specification = args.hide_specification;
    if let Some(parent) = &args.parent {
        category = category.with_parent(resolve_category(&session.catalog, parent)?.id);
    }

    let category = session.catalog.create_category(category)?;
    let path = session.catalog.category_path(&category);

    match output_format(global, &session.config, OutputFormat::Tsv) {
        OutputFormat::Id => println!("{}", category.id),
        format @ (OutputFormat::Json | OutputFormat::Yaml) => print_structured(&category, format)?,
        _ if global.quiet => {}
        _ => {
            println!(
                "{} Created category {}",
                style("✓").green(),
                style(format_short_id(&category.id)).cyan()
            );
            println!("   Path: {}", style(path).yellow());
        }
    }
    Ok(())
}

fn run_list(global: &GlobalOpts) -> Result<()> {
    let session = open_session(global)?;
    let catalog = &session.catalog;

    let mut categories = catalog.store().categories().into_diagnostic()?;
    let mut paths: Vec<(String, Category)> = categories
        .drain(..)
        .map(|c| (catalog.category_path(&c), c))
        .collect();
    paths.sort_by(|a, b| a.0.cmp(&b.0));

    let format = output_format(global, &session.config, OutputFormat::Tsv);
    if matches!(format, OutputFormat::Json | OutputFormat::Yaml) {
        let records: Vec<Category> = paths.into_iter().map(|(_, c)| c).collect();
        return print_structured(&records, format);
    }

    let rows: Vec<TableRow> = paths
        .into_iter()
        .map(|(path, c)| {
            TableRow::for_entity(&c)
                .cell("path", CellValue::Text(path))
                .cell("origin", CellValue::Text(c.origin_type.to_string()))
                .cell("hidden", CellValue::Flag(c.hide_specification))
        })
        .collect();

    TableFormatter::new(CAT_COLUMNS, "category")
        .with_summary(!global.quiet)
        .output(&rows, format);
    Ok(())
}

/// Accept a category reference as an id or a name
pub(crate) fn resolve_category<S: Store>(catalog: &Catalog<S>, key: &str) -> Result<Category> {
    if let Some(id) = Category::parse_id(key) {
        return catalog
            .store()
            .category(&id)
            .into_diagnostic()?
            .ok_or_else(|| miette::miette!("category {} not found", id));
    }

    let mut matches: Vec<Category> = catalog
        .store()
        .categories()
        .into_diagnostic()?
        .into_iter()
        .filter(|c| c.name == key)
        .collect();
    match matches.len() {
        0 => Err(miette::miette!("category '{}' not found", key)),
        1 => Ok(matches.remove(0)),
        n => Err(miette::miette!(
            "{} categories are named '{}'; use the category ID",
            n,
            key
        )),
    }
}
