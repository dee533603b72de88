// veil/src/main.rs

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so `plan --format json` stays parseable.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(if cli.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::WARN
        })
        .init();

    match cli.command {
        Commands::Inspect {
            project_dir,
            design,
            complete,
            compact,
        } => commands::inspect::execute(project_dir, design, complete, compact),

        Commands::Complete {
            project_dir,
            design,
            output,
        } => commands::complete::execute(project_dir, design, output),

        Commands::Merge {
            project_dir,
            designs,
            output,
            global_names,
        } => commands::merge::execute(project_dir, designs, output, global_names),

        Commands::Plan {
            project_dir,
            query,
            design,
            format,
        } => commands::plan::execute(project_dir, query, design, format),
    }
}
