//! What is installed where.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use super::name::normalize_name;
use crate::error::Result;
use crate::uv::PackageManager;
use crate::venv::VenvLayout;

/// Normalised distribution name to version.
pub type PackageMap = BTreeMap<String, String>;

#[derive(Debug, Deserialize)]
struct ListedPackage {
    name: String,
    version: String,
}

/// Parse `pip list --format=json` output.
pub fn parse_pip_list_json(output: &str) -> serde_json::Result<PackageMap> {
    let listed: Vec<ListedPackage> = serde_json::from_str(output.trim())?;
    Ok(listed
        .into_iter()
        .map(|pkg| (normalize_name(&pkg.name), pkg.version))
        .collect())
}

/// Packages installed in `env`.
///
/// Empty when the environment or its interpreter is missing. Asks the
/// package manager first and falls back to reading `*.dist-info` metadata.
pub fn installed_packages(pm: &dyn PackageManager, env: &Path) -> Result<PackageMap> {
    let layout = VenvLayout::new(env);
    if !env.is_dir() || !layout.python().exists() {
        tracing::debug!("No interpreter in {}, treating as empty", env.display());
        return Ok(PackageMap::new());
    }

    match pm.list_installed(env)? {
        Some(packages) => Ok(packages),
        None => {
            tracing::debug!(
                "Package listing failed for {}, scanning site-packages",
                env.display()
            );
            Ok(scan_site_packages(&layout))
        }
    }
}

/// Union of the packages of every environment in `chain`.
///
/// `chain` is nearest first; a package present in several ancestors keeps
/// the nearest one's version.
pub fn ancestor_packages(pm: &dyn PackageManager, chain: &[PathBuf]) -> Result<PackageMap> {
    let mut merged = PackageMap::new();
    for ancestor in chain {
        for (name, version) in installed_packages(pm, ancestor)? {
            merged.entry(name).or_insert(version);
        }
    }
    Ok(merged)
}

/// Read installed distributions straight from `*.dist-info` directories.
pub fn scan_site_packages(layout: &VenvLayout) -> PackageMap {
    let mut packages = PackageMap::new();

    for site_packages in layout.site_packages_dirs() {
        let Ok(entries) = fs::read_dir(&site_packages) else {
            continue;
        };
        for entry in entries.filter_map(|e| e.ok()) {
            let file_name = entry.file_name().to_string_lossy().to_string();
            let Some(stem) = file_name.strip_suffix(".dist-info") else {
                continue;
            };

            let from_metadata = fs::read_to_string(entry.path().join("METADATA"))
                .ok()
                .and_then(|text| metadata_name_version(&text));
            let found = from_metadata.or_else(|| {
                stem.split_once('-')
                    .map(|(name, version)| (name.to_string(), version.to_string()))
            });

            if let Some((name, version)) = found {
                packages.insert(normalize_name(&name), version);
            }
        }
    }

    packages
}

/// `Name:` and `Version:` from a core-metadata header block.
fn metadata_name_version(metadata: &str) -> Option<(String, String)> {
    let mut name = None;
    let mut version = None;

    for line in metadata.lines() {
        if line.trim().is_empty() {
            break;
        }
        if let Some(value) = line.strip_prefix("Name:") {
            name = Some(value.trim().to_string());
        } else if let Some(value) = line.strip_prefix("Version:") {
            version = Some(value.trim().to_string());
        }
    }

    Some((name?, version?))
}
