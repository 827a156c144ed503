// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, Subcommand, ValueEnum};

/// Command-line arguments for `sluice`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "sluice",
    version,
    about = "Run asset-pipeline tasks in dependency order, with file watching.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Sluice.toml` in the current working directory.
    #[arg(long, value_name = "PATH", default_value = "Sluice.toml", global = true)]
    pub config: String,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `SLUICE_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL", global = true)]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Run a task and its prerequisites, then exit.
    ///
    /// Exits non-zero if any task in the run failed.
    Run {
        /// Name of the task to run.
        #[arg(value_name = "TASK")]
        task: String,

        /// Restrict the named task's file set to this single file.
        ///
        /// Prerequisite tasks keep their configured selectors.
        #[arg(long, value_name = "PATH")]
        file: Option<String>,
    },

    /// Watch configured file sets and re-run their bound tasks on change.
    Watch,

    /// Print tasks, prerequisites and stages without executing anything.
    List,
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

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
