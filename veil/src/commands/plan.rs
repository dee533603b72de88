// veil/src/commands/plan.rs
//
// USE CASE: Choose the cheapest plan for one query and print it.

use std::path::PathBuf;

use veil_core::application::{load_design, plan_query};
use veil_core::domain::planner::TableStatistics;
use veil_core::ports::DesignStore;

use super::Project;
use crate::cli::OutputFormat;

pub fn execute(
    project_dir: PathBuf,
    query: PathBuf,
    design: Option<PathBuf>,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let project = Project::open(project_dir)?;
    let design_path = project.design_path(design);
    let schema_path = project.schema_path();

    // Completed against the schema whenever the project has one.
    let design = load_design(
        &project.store,
        &design_path,
        schema_path.exists().then_some(schema_path.as_path()),
    )?;
    let statistics = match project.statistics_path() {
        Some(path) => project.store.load_statistics(&path)?,
        None => TableStatistics::default(),
    };
    let query = project.store.load_query(&query)?;

    let report = plan_query(&project.config.planner, &design, &statistics, &query)?;

    match format {
        OutputFormat::Json => println!("{}", report.to_json()?),
        OutputFormat::Text => {
            if let Some(name) = &report.query {
                println!("⚡ Plan for '{}'", name);
            }
            println!("{}", report.plan());
            println!(
                "   cost {:.2}, ~{} rows, {} client-side step(s), {} candidate(s)",
                report.cost, report.rows, report.client_side_steps, report.candidates
            );
        }
    }
    Ok(())
}
