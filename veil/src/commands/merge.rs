// veil/src/commands/merge.rs
//
// USE CASE: Union several designs and write the result.

use std::path::PathBuf;

use veil_core::application::{merge_designs, with_global_names};
use veil_core::ports::DesignStore;

use super::Project;

pub fn execute(
    project_dir: PathBuf,
    designs: Vec<PathBuf>,
    output: PathBuf,
    global_names: bool,
) -> anyhow::Result<()> {
    let project = Project::open(project_dir)?;

    println!("🔗 Merging {} designs...", designs.len());
    let mut merged = merge_designs(&project.store, &designs)?;
    if global_names {
        merged = with_global_names(&merged)?;
    }

    project.store.save_design(&output, &merged)?;
    println!("✨ {} entries written to {}", merged.len(), output.display());
    Ok(())
}
