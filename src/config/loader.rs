//! Configuration file discovery and loading.
//!
//! This module handles finding and loading configuration files from
//! various locations in the correct priority order, then applying
//! environment variable overrides on top.

use crate::config::merger::merge_configs;
use crate::config::schema::HuvConfig;
use crate::error::{HuvError, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "HUV_CONFIG";

/// Environment variable overriding the `uv` executable.
pub const UV_ENV: &str = "HUV_UV";

/// Environment variable disabling the dependency dry run.
pub const NO_ANALYSIS_ENV: &str = "HUV_NO_ANALYSIS";

/// Paths to configuration files in priority order (later overrides earlier).
///
/// Merge order:
/// 1. User global config (`$XDG_CONFIG_HOME/huv/config.yml`)
/// 2. Project config (`huv.yml` in the working directory)
/// 3. Explicit config (`--config` or `HUV_CONFIG`)
#[derive(Debug, Clone, Default)]
pub struct ConfigPaths {
    /// User's global config.
    pub user_global: Option<PathBuf>,

    /// Project config: ./huv.yml
    pub project: Option<PathBuf>,

    /// Explicitly requested config file.
    pub explicit: Option<PathBuf>,
}

impl ConfigPaths {
    /// Discover config files for the given working directory.
    ///
    /// `explicit` must exist when given; the discovered ones are optional.
    pub fn discover(cwd: &Path, explicit: Option<&Path>) -> Self {
        Self::discover_with_env(cwd, explicit, |key| std::env::var(key))
    }

    /// Discover config files with a custom env var lookup function.
    pub fn discover_with_env<F>(cwd: &Path, explicit: Option<&Path>, env_fn: F) -> Self
    where
        F: Fn(&str) -> std::result::Result<String, std::env::VarError>,
    {
        let explicit = explicit
            .map(Path::to_path_buf)
            .or_else(|| env_fn(CONFIG_ENV).ok().map(PathBuf::from));

        Self {
            user_global: Self::find_user_global(&env_fn),
            project: Self::find_project_config(cwd),
            explicit,
        }
    }

    fn find_user_global<F>(env_fn: &F) -> Option<PathBuf>
    where
        F: Fn(&str) -> std::result::Result<String, std::env::VarError>,
    {
        let base = env_fn("XDG_CONFIG_HOME")
            .ok()
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .or_else(|| {
                env_fn("HOME")
                    .or_else(|_| env_fn("USERPROFILE"))
                    .ok()
                    .map(|home| PathBuf::from(home).join(".config"))
            })?;

        let path = base.join("huv").join("config.yml");
        path.exists().then_some(path)
    }

    fn find_project_config(cwd: &Path) -> Option<PathBuf> {
        let path = cwd.join("huv.yml");
        path.exists().then_some(path)
    }

    /// Returns all config paths in merge order.
    pub fn all(&self) -> Vec<&PathBuf> {
        [&self.user_global, &self.project, &self.explicit]
            .into_iter()
            .flatten()
            .collect()
    }
}

/// Load a config file as a raw YAML value (for merging).
pub fn load_config_value(path: &Path) -> Result<serde_yaml::Value> {
    let content = fs::read_to_string(path)?;

    serde_yaml::from_str(&content).map_err(|e| HuvError::ConfigParseError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Load and merge all discovered config files, then apply env overrides.
pub fn load_config(cwd: &Path, explicit: Option<&Path>) -> Result<HuvConfig> {
    let paths = ConfigPaths::discover(cwd, explicit);
    let config = load_from_paths(&paths)?;
    Ok(apply_env_overrides(config, |key| std::env::var(key)))
}

/// Load and merge the files named by `paths`.
pub fn load_from_paths(paths: &ConfigPaths) -> Result<HuvConfig> {
    let mut values = Vec::new();
    for path in paths.all() {
        tracing::debug!("Loading config from {}", path.display());
        values.push(load_config_value(path)?);
    }

    if values.is_empty() {
        return Ok(HuvConfig::default());
    }

    let merged = merge_configs(&values);
    let source = paths.all().last().map(|p| p.to_path_buf()).unwrap_or_default();

    serde_yaml::from_value(merged).map_err(|e| HuvError::ConfigParseError {
        path: source,
        message: e.to_string(),
    })
}

/// Apply `HUV_*` environment variable overrides.
pub fn apply_env_overrides<F>(mut config: HuvConfig, env_fn: F) -> HuvConfig
where
    F: Fn(&str) -> std::result::Result<String, std::env::VarError>,
{
    if let Ok(uv) = env_fn(UV_ENV) {
        if !uv.is_empty() {
            config.uv_path = Some(PathBuf::from(uv));
        }
    }

    if let Ok(value) = env_fn(NO_ANALYSIS_ENV) {
        if is_truthy(&value) {
            config.analyze_dependencies = false;
        }
    }

    config
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
