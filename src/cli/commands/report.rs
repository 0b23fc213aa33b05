//! `bomcost report` command - Cost breakdown of an assembly

use miette::{IntoDiagnostic, Result};
use std::path::PathBuf;
use tabled::{builder::Builder, settings::Style};

use crate::cli::helpers::{format_cost, format_qty, open_session, output_format, print_structured};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::catalog::{CostTree, CostTreeLine};

#[derive(clap::Args, Debug)]
pub struct ReportArgs {
    /// Assembly (ID or code)
    pub id: String,

    /// Output to file instead of stdout
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

pub fn run(args: ReportArgs, global: &GlobalOpts) -> Result<()> {
    let session = open_session(global)?;
    let root = session.catalog.resolve_nomenclature(&args.id)?;
    let tree = session.catalog.cost_tree(&root.id)?;

    match output_format(global, &session.config, OutputFormat::Md) {
        format @ (OutputFormat::Json | OutputFormat::Yaml) => print_structured(&tree, format),
        _ => {
            let text = render(&tree);
            match &args.output {
                Some(path) => std::fs::write(path, text).into_diagnostic(),
                None => {
                    print!("{}", text);
                    Ok(())
                }
            }
        }
    }
}

/// Markdown document: indented tree plus a per-line summary table
pub(crate) fn render(tree: &CostTree) -> String {
    let mut output = String::new();
    output.push_str(&format!("# Cost Breakdown: {}\n\n", tree.name));
    output.push_str(&format!("ID: {}\n", tree.id));
    output.push_str(&format!(
        "Total: {} {} (purchase {} + material {})\n\n",
        format_cost(tree.total_cost),
        tree.currency,
        format_cost(tree.purchase_cost),
        format_cost(tree.material_cost)
    ));

    output.push_str("```\n");
    output.push_str(&format!("{}  {}\n", tree.name, format_cost(tree.total_cost)));
    push_lines(&mut output, &tree.lines, "");
    output.push_str("```\n");

    if tree.lines.is_empty() {
        return output;
    }

    let mut table = Builder::default();
    table.push_record(["Family", "Qty", "Analogs", "Unit Cost", "Line Total", "Share"]);
    for line in &tree.lines {
        let share = if tree.material_cost != 0.0 {
            format!("{:.1}%", line.line_total / tree.material_cost * 100.0)
        } else {
            "-".to_string()
        };
        table.push_record([
            line.family.clone(),
            format_qty(line.quantity),
            line.analogs.len().to_string(),
            format_cost(line.cost),
            format_cost(line.line_total),
            share,
        ]);
    }
    output.push_str("\n## Lines\n\n");
    output.push_str(&table.build().with(Style::markdown()).to_string());
    output.push('\n');
    output
}

fn push_lines(output: &mut String, lines: &[CostTreeLine], prefix: &str) {
    for (i, line) in lines.iter().enumerate() {
        let is_last = i + 1 == lines.len();
        let branch = if is_last { "└─ " } else { "├─ " };
        output.push_str(&format!(
            "{}{}{} x {} @ {} = {}\n",
            prefix,
            branch,
            line.family,
            format_qty(line.quantity),
            format_cost(line.cost),
            format_cost(line.line_total)
        ));

        let child_prefix = format!("{}{}", prefix, if is_last { "   " } else { "│  " });
        for (j, analog) in line.analogs.iter().enumerate() {
            let analog_last = j + 1 == line.analogs.len();
            output.push_str(&format!(
                "{}{}{}  {}\n",
                child_prefix,
                if analog_last { "└─ " } else { "├─ " },
                analog.name,
                format_cost(analog.total_cost)
            ));
            let nested = format!("{}{}", child_prefix, if analog_last { "   " } else { "│  " });
            push_lines(output, &analog.lines, &nested);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::identity::{EntityId, EntityPrefix};

    fn leaf(name: &str, total: f64) -> CostTree {
        CostTree {
            id: EntityId::new(EntityPrefix::Nom),
            name: name.to_string(),
            currency: "USD".to_string(),
            purchase_cost: total,
            material_cost: 0.0,
            total_cost: total,
            lines: Vec::new(),
        }
    }

    #[test]
    fn test_render_tree_and_table() {
        let tree = CostTree {
            lines: vec![CostTreeLine {
                id: EntityId::new(EntityPrefix::Bom),
                family: "Bolt".to_string(),
                quantity: 4.0,
                cost: 3.0,
                line_total: 12.0,
                analogs: vec![leaf("Bolt M8", 3.0)],
            }],
            purchase_cost: 5.0,
            material_cost: 12.0,
            total_cost: 17.0,
            ..leaf("Bracket A", 17.0)
        };

        let text = render(&tree);
        assert!(text.contains("# Cost Breakdown: Bracket A"));
        assert!(text.contains("Total: 17.00 USD (purchase 5.00 + material 12.00)"));
        assert!(text.contains("└─ Bolt x 4 @ 3.00 = 12.00"));
        assert!(text.contains("   └─ Bolt M8  3.00"));
        assert!(text.contains("100.0%"));
    }

    #[test]
    fn test_render_leaf_has_no_table() {
        let text = render(&leaf("Washer", 0.1));
        assert!(text.contains("Washer  0.10"));
        assert!(!text.contains("## Lines"));
    }
}
