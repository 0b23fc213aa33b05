//! Table formatting utilities for CLI list commands
//!
//! List commands describe their columns once and hand over typed rows; the
//! formatter renders them as aligned TSV, CSV, a Markdown table or bare ids.

use console::style;
use tabled::{builder::Builder, settings::Style};

use crate::cli::helpers::{escape_csv, format_cost, format_qty, format_short_id, truncate_str};
use crate::cli::OutputFormat;
use crate::core::entity::Entity;
use crate::core::identity::EntityId;

/// A typed cell value with semantic meaning for formatting
#[derive(Debug, Clone)]
pub enum CellValue {
    /// Entity ID (cyan, truncated in TSV)
    Id(EntityId),
    /// Plain text, truncated to the column width in TSV
    Text(String),
    /// Money amount with two decimals, right aligned
    Cost(f64),
    /// Quantity, right aligned
    Qty(f64),
    /// Count, right aligned
    Count(usize),
    /// Yes/no flag
    Flag(bool),
    /// Empty/placeholder
    Empty,
}

impl CellValue {
    /// Optional text, `-` when absent
    pub fn opt_text(value: Option<&str>) -> Self {
        match value {
            Some(s) if !s.is_empty() => CellValue::Text(s.to_string()),
            _ => CellValue::Empty,
        }
    }

    /// Format for TSV output (with colors if terminal)
    pub fn format_tsv(&self, width: usize) -> String {
        match self {
            CellValue::Id(id) => {
                format!("{:<width$}", style(format_short_id(id)).cyan(), width = width)
            }
            CellValue::Text(s) => {
                format!("{:<width$}", truncate_str(s, width), width = width)
            }
            CellValue::Cost(_) | CellValue::Qty(_) | CellValue::Count(_) => {
                format!("{:>width$}", self.raw(), width = width)
            }
            CellValue::Flag(true) => format!("{:<width$}", style("yes").yellow(), width = width),
            CellValue::Flag(false) => format!("{:<width$}", style("no").dim(), width = width),
            CellValue::Empty => format!("{:<width$}", style("-").dim(), width = width),
        }
    }

    /// Format for CSV output (RFC 4180, no colors)
    pub fn format_csv(&self) -> String {
        match self {
            CellValue::Text(s) => escape_csv(s),
            other => other.raw(),
        }
    }

    /// Format for Markdown output (escaped pipes)
    pub fn format_md(&self) -> String {
        match self {
            CellValue::Empty => "-".to_string(),
            other => other.raw().replace('|', "\\|"),
        }
    }

    /// Get raw string value (no formatting)
    pub fn raw(&self) -> String {
        match self {
            CellValue::Id(id) => id.to_string(),
            CellValue::Text(s) => s.clone(),
            CellValue::Cost(v) => format_cost(*v),
            CellValue::Qty(v) => format_qty(*v),
            CellValue::Count(n) => n.to_string(),
            CellValue::Flag(b) => if *b { "yes" } else { "no" }.to_string(),
            CellValue::Empty => String::new(),
        }
    }

    /// Display width of the TSV rendering (for dynamic column sizing)
    fn display_width(&self) -> usize {
        match self {
            CellValue::Id(id) => format_short_id(id).len(),
            CellValue::Empty => 1,
            other => other.raw().chars().count(),
        }
    }
}

/// Column definition with header label and maximum width
#[derive(Debug, Clone)]
pub struct ColumnDef {
    pub key: &'static str,
    pub header: &'static str,
    pub width: usize,
}

impl ColumnDef {
    pub const fn new(key: &'static str, header: &'static str, width: usize) -> Self {
        Self { key, header, width }
    }
}

/// A row of cell values for table output
pub struct TableRow {
    pub id: EntityId,
    pub cells: Vec<(&'static str, CellValue)>,
}

impl TableRow {
    pub fn new(id: EntityId) -> Self {
        Self {
            id,
            cells: Vec::new(),
        }
    }

    /// Row keyed by a record, with its "id" cell filled in
    pub fn for_entity<E: Entity>(entity: &E) -> Self {
        Self::new(entity.id().clone()).cell("id", CellValue::Id(entity.id().clone()))
    }

    pub fn cell(mut self, key: &'static str, value: CellValue) -> Self {
        self.cells.push((key, value));
        self
    }

    pub fn get(&self, key: &str) -> Option<&CellValue> {
        self.cells.iter().find(|(k, _)| *k == key).map(|(_, v)| v)
    }
}

/// Table formatter that outputs rows in various formats
pub struct TableFormatter<'a> {
    columns: &'a [ColumnDef],
    entity_name: &'static str,
    show_summary: bool,
}

impl<'a> TableFormatter<'a> {
    pub fn new(columns: &'a [ColumnDef], entity_name: &'static str) -> Self {
        Self {
            columns,
            entity_name,
            show_summary: true,
        }
    }

    /// Toggle the trailing "N found" line (off for --quiet)
    pub fn with_summary(mut self, show: bool) -> Self {
        self.show_summary = show;
        self
    }

    /// Print rows in the specified format
    pub fn output(&self, rows: &[TableRow], format: OutputFormat) {
        print!("{}", self.render(rows, format));
    }

    pub fn render(&self, rows: &[TableRow], format: OutputFormat) -> String {
        match format {
            OutputFormat::Csv => self.render_csv(rows),
            OutputFormat::Md => self.render_md(rows),
            OutputFormat::Id => rows.iter().map(|r| format!("{}\n", r.id)).collect(),
            _ => self.render_tsv(rows),
        }
    }

    /// Column widths from content, capped at each column's maximum
    fn widths(&self, rows: &[TableRow]) -> Vec<usize> {
        self.columns
            .iter()
            .map(|col| {
                let content = rows
                    .iter()
                    .filter_map(|r| r.get(col.key))
                    .map(|v| v.display_width())
                    .max()
                    .unwrap_or(0);
                col.header.len().max(content).min(col.width)
            })
            .collect()
    }

    fn render_tsv(&self, rows: &[TableRow]) -> String {
        let widths = self.widths(rows);
        let mut out = String::new();

        let header: Vec<String> = self
            .columns
            .iter()
            .zip(&widths)
            .map(|(col, w)| format!("{:<width$}", style(col.header).bold(), width = *w))
            .collect();
        out.push_str(header.join(" ").trim_end());
        out.push('\n');

        let total_width: usize = widths.iter().sum::<usize>() + widths.len().saturating_sub(1);
        out.push_str(&"-".repeat(total_width));
        out.push('\n');

        for row in rows {
            let cells: Vec<String> = self
                .columns
                .iter()
                .zip(&widths)
                .map(|(col, w)| match row.get(col.key) {
                    Some(value) => value.format_tsv(*w),
                    None => CellValue::Empty.format_tsv(*w),
                })
                .collect();
            out.push_str(cells.join(" ").trim_end());
            out.push('\n');
        }

        if self.show_summary {
            out.push('\n');
            out.push_str(&format!(
                "{} {}(s) found.\n",
                style(rows.len()).cyan(),
                self.entity_name
            ));
        }
        out
    }

    fn render_csv(&self, rows: &[TableRow]) -> String {
        let mut out = String::new();
        let keys: Vec<&str> = self.columns.iter().map(|c| c.key).collect();
        out.push_str(&keys.join(","));
        out.push('\n');

        for row in rows {
            let values: Vec<String> = self
                .columns
                .iter()
                .map(|col| row.get(col.key).map(|v| v.format_csv()).unwrap_or_default())
                .collect();
            out.push_str(&values.join(","));
            out.push('\n');
        }
        out
    }

    fn render_md(&self, rows: &[TableRow]) -> String {
        let mut builder = Builder::default();
        builder.push_record(self.columns.iter().map(|c| c.header.to_string()));
        for row in rows {
            builder.push_record(self.columns.iter().map(|col| {
                row.get(col.key)
                    .map(|v| v.format_md())
                    .unwrap_or_else(|| "-".to_string())
            }));
        }
        format!("{}\n", builder.build().with(Style::markdown()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::identity::EntityPrefix;
    use crate::entities::UnitOfMeasure;

    const COLUMNS: &[ColumnDef] = &[
        ColumnDef::new("id", "ID", 17),
        ColumnDef::new("name", "NAME", 20),
        ColumnDef::new("total", "TOTAL", 12),
    ];

    fn rows() -> Vec<TableRow> {
        vec![
            TableRow::new(EntityId::new(EntityPrefix::Nom))
                .cell("name", CellValue::Text("Bolt, M8".into()))
                .cell("total", CellValue::Cost(2.0)),
            TableRow::new(EntityId::new(EntityPrefix::Nom))
                .cell("name", CellValue::Empty)
                .cell("total", CellValue::Cost(13.0)),
        ]
    }

    #[test]
    fn test_csv_escapes_text() {
        let out = TableFormatter::new(COLUMNS, "part").render(&rows(), OutputFormat::Csv);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "id,name,total");
        assert_eq!(lines[1], ",\"Bolt, M8\",2.00");
        assert_eq!(lines[2], ",,13.00");
    }

    #[test]
    fn test_id_format_lists_row_ids() {
        let rows = rows();
        let out = TableFormatter::new(COLUMNS, "part").render(&rows, OutputFormat::Id);
        assert_eq!(out, format!("{}\n{}\n", rows[0].id, rows[1].id));
    }

    #[test]
    fn test_markdown_table() {
        let out = TableFormatter::new(COLUMNS, "part").render(&rows(), OutputFormat::Md);
        assert!(out.contains("| ID"));
        assert!(out.contains("13.00"));
        assert!(out.contains("| -"));
    }

    #[test]
    fn test_entity_row_carries_id() {
        let uom = UnitOfMeasure::new("pcs");
        let out = TableFormatter::new(&[ColumnDef::new("id", "ID", 17)], "unit")
            .render(&[TableRow::for_entity(&uom)], OutputFormat::Csv);
        assert_eq!(out, format!("id\n{}\n", uom.id));
    }

    #[test]
    fn test_tsv_summary_toggle() {
        let with = TableFormatter::new(COLUMNS, "part").render(&rows(), OutputFormat::Tsv);
        assert!(with.contains("part(s) found."));
        let without = TableFormatter::new(COLUMNS, "part")
            .with_summary(false)
            .render(&rows(), OutputFormat::Tsv);
        assert!(!without.contains("found."));
        assert!(without.contains("13.00"));
    }
}
