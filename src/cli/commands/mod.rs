//! CLI command implementations.
//!
//! Each command implements the [`Command`] trait, which provides a uniform
//! interface for executing commands and reporting results.
//!
//! # Architecture
//!
//! Commands are dispatched via [`CommandDispatcher`], which routes CLI
//! subcommands to their implementations. `venv`, `pip install` and
//! `pip uninstall` are handled here; everything else goes to uv unchanged.

pub mod dispatcher;
pub mod passthrough;
pub mod pip;
pub mod venv;

pub use dispatcher::{Command, CommandDispatcher, CommandResult};
