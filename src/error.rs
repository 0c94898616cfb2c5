//! Error types for huv operations.
//!
//! This module defines [`HuvError`], the primary error type used throughout
//! the application, and a [`Result`] type alias for convenience.
//!
//! # Error Handling Strategy
//!
//! - Use `HuvError` for domain-specific errors that need distinct handling
//! - Use `anyhow::Error` (via `HuvError::Other`) for unexpected errors
//! - All errors should provide actionable messages for users

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for huv operations.
#[derive(Debug, Error)]
pub enum HuvError {
    /// The `uv` executable could not be located.
    #[error(
        "'uv' not found in PATH. Please install uv first.\n\
         Install with: curl -LsSf https://astral.sh/uv/install.sh | sh"
    )]
    UvNotFound,

    /// Command-line arguments huv could not make sense of.
    #[error("{message}")]
    InvalidArguments { message: String },

    /// A command that needs an activated environment ran without one.
    #[error("No active virtual environment. Please activate one first.")]
    NoActiveEnvironment,

    /// `pip install` / `pip uninstall` invoked without packages.
    #[error("No packages specified for {action}.")]
    NoPackages { action: String },

    /// Target of `huv venv` is already an environment.
    #[error("Virtual environment already exists at '{}'", path.display())]
    EnvironmentExists { path: PathBuf },

    /// Target of `huv venv` is a directory with content.
    #[error("Directory '{}' exists and is not empty", path.display())]
    DirectoryNotEmpty { path: PathBuf },

    /// The `--parent` path does not exist.
    #[error("Parent environment '{}' does not exist.", path.display())]
    ParentNotFound { path: PathBuf },

    /// The `--parent` path has no `pyvenv.cfg`.
    #[error("'{}' is not a valid virtual environment.", path.display())]
    InvalidEnvironment { path: PathBuf },

    /// The parent environment has no activation script.
    #[error("Parent environment '{}' is missing activate script.", path.display())]
    MissingActivateScript { path: PathBuf },

    /// `uv venv` succeeded but left no activation script behind.
    #[error("Virtual environment created but activate script not found at '{}'", path.display())]
    NoActivateScript { path: PathBuf },

    /// Requested interpreter differs from the parent's.
    #[error(
        "Python version mismatch: parent environment uses Python {parent}, \
         but {requested} was requested. Child environments must match their parent."
    )]
    PythonVersionMismatch { parent: String, requested: String },

    /// An external command exited unsuccessfully.
    #[error("Command failed with exit code {code:?}: {command}")]
    CommandFailed { command: String, code: Option<i32> },

    /// Activation artifacts could not be rewritten.
    #[error("Failed to set up hierarchy: {message}")]
    HierarchySetup { message: String },

    /// Failed to parse a configuration file.
    #[error("Failed to parse config at {}: {message}", path.display())]
    ConfigParseError { path: PathBuf, message: String },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error wrapper.
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl HuvError {
    /// Exit code to report for this error.
    ///
    /// Subprocess failures forward the child's code so `huv` behaves like
    /// `uv` from a script's point of view.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::CommandFailed {
                code: Some(code), ..
            } if *code != 0 => *code,
            _ => 1,
        }
    }
}

/// Result type alias for huv operations.
pub type Result<T> = std::result::Result<T, HuvError>;
