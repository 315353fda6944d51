//! Command-line interface

pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "curbside", version, about = "Configure recurring garbage/recycling collection schedules")]
pub struct Cli {
    /// Store file (defaults to the platform data directory)
    #[arg(long, env = "CURBSIDE_FILE", global = true)]
    pub file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a new schedule through the interactive wizard
    New,
    /// Edit a stored schedule
    Edit {
        /// Schedule id, as shown by `curbside list`
        id: String,
    },
    /// Provision a schedule non-interactively from a flat YAML field map
    Import {
        /// YAML file with the flat field map
        path: PathBuf,
    },
    /// List stored schedules
    List,
}
