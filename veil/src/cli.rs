// veil/src/cli.rs
//
// Single source of truth for all CLI definitions (Clap structs).

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "veil")]
#[command(about = "Onion encryption policies and plan selection for encrypted databases", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Log debug events to stderr
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 🔍 Shows the onions each column and precomputed expression may use
    Inspect {
        /// Project directory (holds veil.yaml)
        #[arg(long, default_value = ".")]
        project_dir: PathBuf,

        /// Design file, instead of the project's design-path
        #[arg(long)]
        design: Option<PathBuf>,

        /// Complete against the project schema before printing
        #[arg(long)]
        complete: bool,

        /// One line per non-default entry instead of a table
        #[arg(long)]
        compact: bool,
    },

    /// 🧩 Gives DET to every schema column without an equality or order onion
    Complete {
        #[arg(long, default_value = ".")]
        project_dir: PathBuf,

        #[arg(long)]
        design: Option<PathBuf>,

        /// Where to write the completed design
        #[arg(long, short, default_value = "design.completed.yaml")]
        output: PathBuf,
    },

    /// 🔗 Unions several designs into one
    Merge {
        #[arg(long, default_value = ".")]
        project_dir: PathBuf,

        /// Designs to merge, in order; the first one's names win
        #[arg(required = true, num_args = 1..)]
        designs: Vec<PathBuf>,

        #[arg(long, short, default_value = "design.merged.yaml")]
        output: PathBuf,

        /// Rename precomputed expressions to their global names
        #[arg(long)]
        global_names: bool,
    },

    /// ⚡ Picks the cheapest plan the design admits for a query
    Plan {
        #[arg(long, default_value = ".")]
        project_dir: PathBuf,

        /// Query requirements file
        query: PathBuf,

        #[arg(long)]
        design: Option<PathBuf>,

        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}
