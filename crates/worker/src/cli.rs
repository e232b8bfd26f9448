use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Run script tasks (Ruby, Malloy CLI, shell) locally or in containers.
#[derive(Parser, Debug)]
#[command(name = "scriptrun", version, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the task defined in a JSON file and print its result
    Run {
        /// Path to the JSON task definition
        file: PathBuf,

        /// Render variable, repeatable (`--var region=eu`)
        #[arg(long = "var", value_name = "KEY=VALUE")]
        vars: Vec<String>,

        /// Run in this directory instead of a fresh scratch directory
        #[arg(long)]
        work_dir: Option<PathBuf>,

        /// Exit 0 even when the script exits non-zero
        #[arg(long)]
        allow_failure: bool,
    },

    /// Print the documented schema of one task type, or of all of them
    Schema {
        /// Task type, e.g. `scripts.ruby.Commands`
        #[arg(value_name = "TYPE")]
        type_name: Option<String>,
    },

    /// List task types and their default images
    Kinds,
}
