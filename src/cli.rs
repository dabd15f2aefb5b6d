// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Command-line arguments for `funcdag`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "funcdag",
    version,
    about = "Submit the functional MRI pipeline of one subject to a batch queue.",
    long_about = None
)]
pub struct CliArgs {
    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `FUNCDAG_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL", global = true)]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Submit postprocessing, field-map, resting-state and task jobs.
    Run(RunArgs),
    /// Submit the imaging-derived phenotype job.
    Idp(IdpArgs),
}

/// Arguments shared by every subcommand that acts on a subject.
#[derive(Debug, Clone, Args)]
pub struct SubjectArgs {
    /// Subject directory, relative to the working directory.
    #[arg(value_name = "SUBJECT")]
    pub subject: String,

    /// Job identifiers the first job must wait for, comma separated.
    /// `-1` means no dependency.
    #[arg(long, value_name = "TOKEN", default_value = "-1", allow_hyphen_values = true)]
    pub hold: String,

    /// Pipeline settings (TOML). Built-in defaults are used if omitted.
    #[arg(long, value_name = "PATH")]
    pub settings: Option<PathBuf>,
}

#[derive(Debug, Clone, Args)]
pub struct RunArgs {
    #[command(flatten)]
    pub subject: SubjectArgs,

    /// Build and print the job plan without submitting anything.
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Debug, Clone, Args)]
pub struct IdpArgs {
    #[command(flatten)]
    pub subject: SubjectArgs,
}

impl CliArgs {
    pub fn subject_args(&self) -> &SubjectArgs {
        match &self.command {
            Command::Run(run) => &run.subject,
            Command::Idp(idp) => &idp.subject,
        }
    }
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
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
