//! Command-line interface for cropyield.
//!
//! This module provides the CLI structure for the `cropyield` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{ConfigCommand, HistoryCommand, ModelCommand, PredictCommand, ServeCommand};

use crate::logging::Verbosity;

/// cropyield - Estimate crop yield from farm conditions
///
/// Serves a web form that scores farm conditions with a pre-trained
/// regression model, and offers the same prediction from the terminal.
#[derive(Debug, Parser)]
#[command(name = "cropyield")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
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
    /// Serve the prediction form over HTTP
    Serve(ServeCommand),

    /// Predict yield for one set of conditions
    Predict(PredictCommand),

    /// Inspect the configured model
    #[command(subcommand)]
    Model(ModelCommand),

    /// Show recent predictions
    History(HistoryCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> Verbosity {
        if self.quiet {
            Verbosity::Quiet
        } else {
            match self.verbose {
                0 => Verbosity::Normal,
                1 => Verbosity::Verbose,
                _ => Verbosity::Trace,
            }
        }
    }
}
