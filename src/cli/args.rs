//! CLI argument definitions.
//!
//! Only huv's own surface is described here. The `venv` and `pip`
//! argument lists are captured raw and split by [`crate::uv::args`], since
//! most of them belong to uv.

use clap::{Args, Parser, Subcommand};
use std::ffi::OsString;
use std::path::PathBuf;

/// huv - hierarchical virtual environments on top of uv.
#[derive(Debug, Parser)]
#[command(name = "huv")]
#[command(author, version, about, long_about = None)]
#[command(disable_help_subcommand = true)]
pub struct Cli {
    /// Path to a huv config file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Show verbose output (also passed to uv)
    #[arg(short, long)]
    pub verbose: bool,

    /// Minimal output (also passed to uv)
    #[arg(short, long)]
    pub quiet: bool,

    /// Disable colored output (also passed to uv)
    #[arg(long)]
    pub no_color: bool,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Global options forwarded to every uv invocation.
    pub fn uv_global_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if self.verbose {
            args.push("--verbose".to_string());
        }
        if self.quiet {
            args.push("--quiet".to_string());
        }
        if self.no_color {
            args.push("--no-color".to_string());
        }
        args
    }
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Create a virtual environment, optionally inheriting from a parent
    #[command(disable_help_flag = true)]
    Venv(RawArgs),

    /// Hierarchy-aware `uv pip`
    Pip(PipArgs),

    /// Any other uv command, passed through unchanged
    #[command(external_subcommand)]
    External(Vec<OsString>),
}

/// Arguments captured verbatim.
#[derive(Debug, Clone, Default, Args)]
pub struct RawArgs {
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, num_args = 0..)]
    pub args: Vec<String>,
}

/// Arguments for the `pip` command.
#[derive(Debug, Clone, Args)]
pub struct PipArgs {
    #[command(subcommand)]
    pub command: Option<PipCommands>,
}

/// `huv pip` subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum PipCommands {
    /// Install packages not already provided by parent environments
    #[command(disable_help_flag = true)]
    Install(RawArgs),

    /// Uninstall packages from the active environment
    #[command(disable_help_flag = true)]
    Uninstall(RawArgs),

    /// Any other `uv pip` command, passed through unchanged
    #[command(external_subcommand)]
    Other(Vec<OsString>),
}
