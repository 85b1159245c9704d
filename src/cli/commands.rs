//! CLI command definitions.
//!
//! This module defines all CLI commands and their arguments using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Halldyll plan - offline planner for declarative resource schemas.
#[derive(Parser, Debug)]
#[command(name = "halldyll-plan")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the schema file.
    #[arg(short, long, global = true, env = "HALLDYLL_SCHEMA")]
    pub schema: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json).
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate the schema document.
    Validate {
        /// Show all warnings, not just errors.
        #[arg(short, long)]
        warnings: bool,
    },

    /// Compute the planned state of one resource.
    Plan {
        /// JSON file holding the resource configuration.
        #[arg(long)]
        config: PathBuf,

        /// JSON file holding the prior state (omit when creating).
        #[arg(long)]
        prior_state: Option<PathBuf>,

        /// JSON file holding the proposed new state (omit when destroying).
        #[arg(long)]
        proposed: Option<PathBuf>,
    },

    /// Describe the attributes of the schema.
    Describe,
}

/// Output format options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}

impl Cli {
    /// Parses CLI arguments from the command line.
    #[must_use]
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
