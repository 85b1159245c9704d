//! CLI module for the halldyll-plan tool.
//!
//! This module provides the command-line interface for validating schema
//! documents and computing plans offline.

mod commands;
mod output;

pub use commands::{Cli, Commands, OutputFormat};
pub use output::OutputFormatter;
