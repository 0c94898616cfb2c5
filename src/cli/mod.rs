//! Command-line interface for huv.
//!
//! - [`args`] - Argument definitions using clap derive macros
//! - [`commands`] - Command implementations

pub mod args;
pub mod commands;

pub use args::{Cli, Commands, PipArgs, PipCommands, RawArgs};
pub use commands::{Command, CommandDispatcher, CommandResult};
