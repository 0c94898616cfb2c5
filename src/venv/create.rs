//! Checks performed before `uv venv` runs.

use std::fs;
use std::path::{Path, PathBuf};

use super::layout::VenvLayout;
use super::pyvenv_cfg::PyvenvCfg;
use crate::error::{HuvError, Result};

fn canonical(path: &Path) -> Result<PathBuf> {
    if cfg!(windows) {
        // canonicalize() yields verbatim `\\?\` paths there, which activation
        // scripts cannot use.
        Ok(std::path::absolute(path)?)
    } else {
        Ok(path.canonicalize()?)
    }
}

/// Absolute form of `path`, resolving symlinks where the path exists.
///
/// For a path that does not exist yet its parent directory is resolved
/// instead and the final component appended.
pub fn resolve_path(path: &Path) -> Result<PathBuf> {
    if path.exists() {
        return canonical(path);
    }

    let absolute = std::path::absolute(path)?;
    match (absolute.parent(), absolute.file_name()) {
        (Some(parent), Some(name)) if parent.exists() => Ok(canonical(parent)?.join(name)),
        _ => Ok(absolute),
    }
}

/// Refuse to create over an existing environment or a non-empty directory.
pub fn validate_target(path: &Path) -> Result<()> {
    if VenvLayout::new(path).is_valid() {
        return Err(HuvError::EnvironmentExists {
            path: path.to_path_buf(),
        });
    }
    if path.is_dir() && fs::read_dir(path)?.next().is_some() {
        return Err(HuvError::DirectoryNotEmpty {
            path: path.to_path_buf(),
        });
    }
    Ok(())
}

/// Check that `parent` is a usable environment.
pub fn validate_parent(parent: &Path) -> Result<VenvLayout> {
    if !parent.exists() {
        return Err(HuvError::ParentNotFound {
            path: parent.to_path_buf(),
        });
    }

    let layout = VenvLayout::new(parent);
    if !layout.is_valid() {
        return Err(HuvError::InvalidEnvironment {
            path: parent.to_path_buf(),
        });
    }
    if !layout.activation_script().is_file() {
        return Err(HuvError::MissingActivateScript {
            path: parent.to_path_buf(),
        });
    }
    Ok(layout)
}

/// `MAJOR.MINOR` of the parent's interpreter.
pub fn parent_python_version(parent: &VenvLayout) -> Option<String> {
    PyvenvCfg::load(&parent.pyvenv_cfg())
        .ok()
        .and_then(|cfg| cfg.python_version())
}

/// How a child's interpreter request relates to its parent's interpreter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PythonChoice {
    /// No request: use the parent's `MAJOR.MINOR`.
    Inherit(String),
    /// The request names the parent's version.
    Compatible,
    /// The request is a path or implementation name; cannot compare.
    Unverified(String),
    /// Nothing to compare against.
    Unconstrained,
}

/// Version components of a plain request like `3.12`, `python3.12.1` or
/// `cpython-3.11`.
fn plain_version(request: &str) -> Option<Vec<&str>> {
    let trimmed = request.trim();
    let stripped = ["cpython", "python"]
        .iter()
        .find_map(|prefix| trimmed.strip_prefix(prefix))
        .map(|rest| rest.strip_prefix('-').unwrap_or(rest))
        .unwrap_or(trimmed);

    let parts: Vec<&str> = stripped.split('.').collect();
    let numeric = parts
        .iter()
        .all(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit()));
    (numeric && (1..=3).contains(&parts.len())).then_some(parts)
}

/// Decide how to pick the child's interpreter.
///
/// A plain version request that names a different `MAJOR.MINOR` than the
/// parent is an error: site-packages are specific to one interpreter
/// version. A major-only request (`3`) only has to match the major.
pub fn choose_python(parent_version: Option<&str>, requested: Option<&str>) -> Result<PythonChoice> {
    let Some(parent_version) = parent_version else {
        return Ok(PythonChoice::Unconstrained);
    };
    let Some(requested) = requested else {
        return Ok(PythonChoice::Inherit(parent_version.to_string()));
    };
    let Some(parts) = plain_version(requested) else {
        return Ok(PythonChoice::Unverified(requested.to_string()));
    };

    let parent_parts: Vec<&str> = parent_version.split('.').collect();
    let compared = parts.len().min(2);
    if parts[..compared] == parent_parts[..compared.min(parent_parts.len())] {
        Ok(PythonChoice::Compatible)
    } else {
        Err(HuvError::PythonVersionMismatch {
            parent: parent_version.to_string(),
            requested: requested.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn resolve_existing_and_new_paths() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().canonicalize().unwrap();

        assert_eq!(resolve_path(temp.path()).unwrap(), root);
        assert_eq!(
            resolve_path(&temp.path().join("child")).unwrap(),
            root.join("child")
        );
    }

    #[test]
    fn empty_directory_is_an_acceptable_target() {
        let temp = TempDir::new().unwrap();
        assert!(validate_target(temp.path()).is_ok());
        assert!(validate_target(&temp.path().join("missing")).is_ok());
    }

    #[test]
    fn existing_environment_is_rejected() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("pyvenv.cfg"), "home = /usr/bin\n").unwrap();

        assert!(matches!(
            validate_target(temp.path()),
            Err(HuvError::EnvironmentExists { .. })
        ));
    }

    #[test]
    fn non_empty_directory_is_rejected() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("notes.txt"), "hi").unwrap();

        assert!(matches!(
            validate_target(temp.path()),
            Err(HuvError::DirectoryNotEmpty { .. })
        ));
    }

    #[test]
    fn parent_validation_errors() {
        let temp = TempDir::new().unwrap();
        let parent = temp.path().join("parent");

        assert!(matches!(
            validate_parent(&parent),
            Err(HuvError::ParentNotFound { .. })
        ));

        fs::create_dir_all(&parent).unwrap();
        assert!(matches!(
            validate_parent(&parent),
            Err(HuvError::InvalidEnvironment { .. })
        ));

        fs::write(parent.join("pyvenv.cfg"), "version_info = 3.12.4\n").unwrap();
        assert!(matches!(
            validate_parent(&parent),
            Err(HuvError::MissingActivateScript { .. })
        ));

        let layout = VenvLayout::new(&parent);
        fs::create_dir_all(layout.bin_dir()).unwrap();
        fs::write(layout.activation_script(), "").unwrap();
        let validated = validate_parent(&parent).unwrap();
        assert_eq!(parent_python_version(&validated), Some("3.12".to_string()));
    }

    #[test]
    fn python_is_inherited_without_request() {
        assert_eq!(
            choose_python(Some("3.12"), None).unwrap(),
            PythonChoice::Inherit("3.12".into())
        );
        assert_eq!(
            choose_python(None, Some("3.11")).unwrap(),
            PythonChoice::Unconstrained
        );
    }

    #[test]
    fn matching_requests_are_compatible() {
        for request in ["3.12", "3.12.1", "python3.12", "cpython-3.12", "3"] {
            assert_eq!(
                choose_python(Some("3.12"), Some(request)).unwrap(),
                PythonChoice::Compatible,
                "{request}"
            );
        }
    }

    #[test]
    fn mismatching_request_is_an_error() {
        let err = choose_python(Some("3.12"), Some("3.11")).unwrap_err();
        assert!(matches!(err, HuvError::PythonVersionMismatch { .. }));
        assert!(choose_python(Some("3.12"), Some("python2")).is_err());
    }

    #[test]
    fn paths_and_names_are_unverified() {
        assert_eq!(
            choose_python(Some("3.12"), Some("/usr/bin/python3")).unwrap(),
            PythonChoice::Unverified("/usr/bin/python3".into())
        );
        assert_eq!(
            choose_python(Some("3.12"), Some("pypy")).unwrap(),
            PythonChoice::Unverified("pypy".into())
        );
    }
}
