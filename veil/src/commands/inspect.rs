// veil/src/commands/inspect.rs
//
// USE CASE: Print a design as a table, or in its compact one-line-per-entry form.

use comfy_table::{Table, presets::UTF8_FULL};
use std::path::PathBuf;

use veil_core::application::load_design;
use veil_core::domain::onion::{OnionSet, PolicyTarget};

use super::Project;

pub fn execute(
    project_dir: PathBuf,
    design: Option<PathBuf>,
    complete: bool,
    compact: bool,
) -> anyhow::Result<()> {
    let project = Project::open(project_dir)?;
    let design_path = project.design_path(design);
    let schema_path = project.schema_path();

    let design = load_design(
        &project.store,
        &design_path,
        complete.then_some(schema_path.as_path()),
    )?;

    if compact {
        println!("{}", design.compact_to_string());
        return Ok(());
    }

    println!("🔍 Design: {}", project.describe(&design_path));
    println!("{}", render_table(&design));
    println!("   {} entries", design.len());
    Ok(())
}

fn render_table(design: &OnionSet) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Relation", "Target", "Name", "Onions", "Packed"]);

    for (key, entry) in design.entries() {
        let packed = match &key.target {
            PolicyTarget::Expr(expr) => design
                .lookup_packed_hom(&key.relation, expr.as_expr())
                .iter()
                .map(|(group, pos)| format!("#{}.{}", group, pos))
                .collect::<Vec<_>>()
                .join(" "),
            PolicyTarget::Column(_) => String::new(),
        };
        table.add_row(vec![
            key.relation.clone(),
            key.target.to_string(),
            entry.name.clone(),
            entry.mask.to_string(),
            packed,
        ]);
    }
    table
}
