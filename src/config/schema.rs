//! Configuration schema definitions for huv.
//!
//! This module contains the struct definitions that map to the YAML
//! configuration file format.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure for `config.yml` / `huv.yml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HuvConfig {
    /// Explicit path to the `uv` executable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uv_path: Option<PathBuf>,

    /// Run `uv pip install --dry-run` to discover the full dependency tree.
    pub analyze_dependencies: bool,

    /// Pass `--no-deps` when some packages were skipped in favour of a parent.
    pub no_deps_on_skip: bool,

    /// Write a `.pth` file listing ancestor site-packages into child environments.
    pub write_pth: bool,

    /// Output mode used when no `--verbose`/`--quiet` flag is given.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_output: Option<OutputMode>,
}

impl Default for HuvConfig {
    fn default() -> Self {
        Self {
            uv_path: None,
            analyze_dependencies: true,
            no_deps_on_skip: true,
            write_pth: true,
            default_output: None,
        }
    }
}

/// Output verbosity as written in config files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    Verbose,
    Normal,
    Quiet,
    Silent,
}
