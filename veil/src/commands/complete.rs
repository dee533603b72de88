// veil/src/commands/complete.rs
//
// USE CASE: Write the design completed against the project schema.

use std::path::PathBuf;

use veil_core::application::load_design;
use veil_core::ports::DesignStore;

use super::Project;

pub fn execute(
    project_dir: PathBuf,
    design: Option<PathBuf>,
    output: PathBuf,
) -> anyhow::Result<()> {
    let project = Project::open(project_dir)?;
    let design_path = project.design_path(design);
    let schema_path = project.schema_path();

    println!("🧩 Completing {}", project.describe(&design_path));
    let before = project.store.load_design(&design_path)?.len();
    let completed = load_design(&project.store, &design_path, Some(&schema_path))?;

    project.store.save_design(&output, &completed)?;
    println!(
        "✨ {} entries ({} added) written to {}",
        completed.len(),
        completed.len().saturating_sub(before),
        output.display()
    );
    Ok(())
}
