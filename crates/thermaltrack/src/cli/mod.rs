//! Command-line interface for thermaltrack.
//!
//! This module provides the CLI structure for the `thermtrk` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    AnnotateCommand, ConfigCommand, CreateInspectionCommand, ImageCommand, ImageTypeArg,
    InspectionCommand, RecordCommand, SeverityArg, StatusCommand, TransformerCommand,
    TransformerFields, TransformerTypeArg, UploadCommand,
};

/// thermtrk - Transformer inspection records
///
/// Register transformers, upload baseline and thermal images, record
/// inspections paired with the best matching baseline, mark hotspots and
/// print maintenance records.
#[derive(Debug, Parser)]
#[command(name = "thermtrk")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage transformers
    #[command(subcommand)]
    Transformer(TransformerCommand),

    /// Manage baseline and thermal images
    #[command(subcommand)]
    Image(ImageCommand),

    /// Manage inspections
    #[command(subcommand)]
    Inspection(InspectionCommand),

    /// Print the maintenance record of an inspection
    Record(RecordCommand),

    /// Show stored collection sizes
    Status(StatusCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        if self.quiet {
            crate::logging::Verbosity::Quiet
        } else {
            match self.verbose {
                0 => crate::logging::Verbosity::Normal,
                1 => crate::logging::Verbosity::Verbose,
                _ => crate::logging::Verbosity::Trace,
            }
        }
    }
}
