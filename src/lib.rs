//! huv - hierarchical virtual environments on top of uv.
//!
//! A child environment created with `huv venv --parent <env>` sees every
//! package of its ancestors, and `huv pip install` only installs what the
//! ancestors do not already provide. Everything else is handed to `uv`.
//!
//! # Modules
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`config`] - Optional YAML configuration
//! - [`error`] - Error types and result aliases
//! - [`packages`] - Package versions, inventories and install planning
//! - [`shell`] - External process execution
//! - [`ui`] - Spinners and terminal output
//! - [`uv`] - Locating and driving the `uv` executable
//! - [`venv`] - Environment layout, parent chains and activation patching
//!
//! # Example
//!
//! ```
//! use huv::packages::Requirement;
//!
//! let req = Requirement::parse("numpy>=1.24").unwrap();
//! assert!(req.is_satisfied_by("1.26.4"));
//! assert!(!req.is_satisfied_by("1.23.0"));
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod packages;
pub mod shell;
pub mod ui;
pub mod uv;
pub mod venv;

pub use error::{HuvError, Result};
