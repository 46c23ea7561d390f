// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::config::DEFAULT_CONFIG_FILE;
use crate::types::TaskId;

/// Command-line arguments for `sitepipe`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "sitepipe",
    version,
    about = "Build, watch and serve the assets of a static site.",
    long_about = None
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Path to the config file (TOML).
    ///
    /// If the default `Sitepipe.toml` does not exist, built-in defaults are
    /// used. The directory holding the file is the project root.
    #[arg(long, global = true, value_name = "PATH", default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `SITEPIPE_LOG` or a default level will be used.
    #[arg(long, global = true, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Validate the config and print the build plan and watch bindings
    /// without running anything.
    #[arg(long, global = true)]
    pub dry_run: bool,
}

impl CliArgs {
    /// The subcommand to run; `dev` when none is given.
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Dev)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Full build, then watch sources and serve the output with live reload.
    Dev,
    /// Full build only.
    Build,
    /// Run a single task in isolation.
    Run {
        #[arg(value_enum)]
        task: TaskId,
    },
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
