//! Configuration loading.
//!
//! huv works without any configuration. Optional YAML files tune how the
//! wrapped `uv` is located and how much analysis `pip install` performs:
//!
//! - [`schema`] - The [`HuvConfig`] structure
//! - [`loader`] - File discovery, merging and `HUV_*` env overrides
//! - [`merger`] - Layered YAML merge rules

pub mod loader;
pub mod merger;
pub mod schema;

pub use loader::{apply_env_overrides, load_config, load_from_paths, ConfigPaths};
pub use merger::{deep_merge, merge_configs};
pub use schema::HuvConfig;
