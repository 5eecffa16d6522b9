// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

use crate::types::SessionMode;

/// Command-line arguments for `cotask`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "cotask",
    version,
    about = "Coordinate a shared human/robot task sequence: group, reorder, rebalance.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Cotask.toml` in the current working directory.
    #[arg(long, value_name = "PATH", default_value = "Cotask.toml")]
    pub config: String,

    /// Exit once every assigned task has finished.
    #[arg(long)]
    pub once: bool,

    /// Participant id to record against (e.g. "P4").
    ///
    /// If omitted, the config value is used; if that is also missing, the id
    /// is derived from the collaborator's participant count.
    #[arg(long, value_name = "ID")]
    pub participant: Option<String>,

    /// Session mode override (record or replay).
    #[arg(long, value_enum, value_name = "MODE")]
    pub mode: Option<ModeArg>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `COTASK_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print the session setup, but don't contact the
    /// collaborator or start the console.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Session mode as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum ModeArg {
    Record,
    Replay,
}

impl From<ModeArg> for SessionMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Record => SessionMode::Record,
            ModeArg::Replay => SessionMode::Replay,
        }
    }
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
