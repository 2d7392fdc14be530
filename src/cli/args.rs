//! CLI argument definitions

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// resourcery: schema-driven resource-exposition engine
#[derive(Debug, Parser)]
#[command(name = "resourcery", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Load schema definitions and serve the generated REST surface
    Serve {
        /// Directory of schema definition JSON files
        #[arg(long)]
        schema_dir: PathBuf,

        /// Port to listen on
        #[arg(long, default_value_t = 8080)]
        port: u16,
    },

    /// Validate a schema definition directory and exit
    Check {
        /// Directory of schema definition JSON files
        #[arg(long)]
        schema_dir: PathBuf,
    },
}
