//! Finding the `uv` executable.

use std::path::{Path, PathBuf};

use crate::error::{HuvError, Result};

/// File name of the uv binary on this platform.
pub fn uv_binary_name() -> &'static str {
    if cfg!(windows) {
        "uv.exe"
    } else {
        "uv"
    }
}

/// Check whether a file has executable permission bits set.
#[cfg(unix)]
pub fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

/// On Windows, executability is determined by file extension, not permission bits.
#[cfg(not(unix))]
pub fn is_executable(_path: &Path) -> bool {
    true
}

/// First executable `tool` found in `path_entries`.
pub fn resolve_tool_path(tool: &str, path_entries: &[PathBuf]) -> Option<PathBuf> {
    path_entries
        .iter()
        .map(|dir| dir.join(tool))
        .find(|candidate| candidate.is_file() && is_executable(candidate))
}

/// Parse the system PATH environment variable into a list of directories.
pub fn parse_system_path() -> Vec<PathBuf> {
    std::env::var_os("PATH")
        .map(|path| std::env::split_paths(&path).collect())
        .unwrap_or_default()
}

/// Locate uv: an explicit path (config `uv_path` / `HUV_UV`) wins,
/// otherwise the first `uv` on `PATH`.
pub fn locate_uv(explicit: Option<&Path>) -> Result<PathBuf> {
    locate_uv_in(explicit, &parse_system_path())
}

/// [`locate_uv`] against a given list of search directories.
pub fn locate_uv_in(explicit: Option<&Path>, path_entries: &[PathBuf]) -> Result<PathBuf> {
    if let Some(path) = explicit {
        if path.is_file() {
            tracing::debug!("Using uv from configuration: {}", path.display());
            return Ok(path.to_path_buf());
        }
        // A bare name such as `uv-nightly` is looked up on PATH.
        if path.components().count() == 1 {
            if let Some(found) = resolve_tool_path(&path.to_string_lossy(), path_entries) {
                return Ok(found);
            }
        }
        tracing::warn!(
            "Configured uv executable {} not found, searching PATH",
            path.display()
        );
    }

    let found = resolve_tool_path(uv_binary_name(), path_entries).ok_or(HuvError::UvNotFound)?;
    tracing::debug!("Found uv at {}", found.display());
    Ok(found)
}
