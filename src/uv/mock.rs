//! In-memory [`PackageManager`] for tests.
//!
//! `MockPackageManager` records every call and serves configured package
//! lists and dry-run results. `create_venv` lays out a minimal environment
//! on disk so hierarchy setup can run against it.

use std::cell::RefCell;
use std::collections::HashMap;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use super::PackageManager;
use crate::error::{HuvError, Result};
use crate::packages::dry_run::DependencyTree;
use crate::packages::inventory::PackageMap;
use crate::venv::VenvLayout;

/// A call made against [`MockPackageManager`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    CreateVenv { path: PathBuf, args: Vec<String> },
    ListInstalled { env: PathBuf },
    DryRun { packages: Vec<String>, args: Vec<String> },
    Install { args: Vec<String> },
    Uninstall { args: Vec<String> },
    Passthrough { args: Vec<OsString> },
}

#[derive(Debug)]
pub struct MockPackageManager {
    installed: HashMap<PathBuf, PackageMap>,
    dry_run: DependencyTree,
    scaffold_python: Option<String>,
    install_exit: Option<i32>,
    calls: RefCell<Vec<MockCall>>,
}

impl Default for MockPackageManager {
    fn default() -> Self {
        Self::new()
    }
}

impl MockPackageManager {
    /// A manager whose environments report no packages and whose
    /// `create_venv` scaffolds a Python 3.12 environment.
    pub fn new() -> Self {
        Self {
            installed: HashMap::new(),
            dry_run: DependencyTree::default(),
            scaffold_python: Some("3.12.1".to_string()),
            install_exit: None,
            calls: RefCell::new(Vec::new()),
        }
    }

    /// Report `packages` as installed in `env`.
    pub fn with_installed(mut self, env: &Path, packages: &[(&str, &str)]) -> Self {
        self.installed.insert(
            env.to_path_buf(),
            packages
                .iter()
                .map(|(name, version)| (name.to_string(), version.to_string()))
                .collect(),
        );
        self
    }

    /// Dry-run result for every install request.
    pub fn with_dry_run(mut self, tree: DependencyTree) -> Self {
        self.dry_run = tree;
        self
    }

    /// Make `create_venv` succeed without writing anything.
    pub fn without_scaffold(mut self) -> Self {
        self.scaffold_python = None;
        self
    }

    /// Make `install` and `uninstall` fail with `code`.
    pub fn failing_with(mut self, code: i32) -> Self {
        self.install_exit = Some(code);
        self
    }

    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.borrow().clone()
    }

    /// Arguments of every `install` call.
    pub fn installs(&self) -> Vec<Vec<String>> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                MockCall::Install { args } => Some(args),
                _ => None,
            })
            .collect()
    }

    /// Arguments of every `uninstall` call.
    pub fn uninstalls(&self) -> Vec<Vec<String>> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                MockCall::Uninstall { args } => Some(args),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: MockCall) {
        self.calls.borrow_mut().push(call);
    }

    fn check_exit(&self, command: &str) -> Result<()> {
        match self.install_exit {
            Some(code) => Err(HuvError::CommandFailed {
                command: command.to_string(),
                code: Some(code),
            }),
            None => Ok(()),
        }
    }

    fn scaffold(path: &Path, version_info: &str) -> Result<()> {
        let layout = VenvLayout::new(path);
        let minor = version_info.split('.').take(2).collect::<Vec<_>>().join(".");

        fs::create_dir_all(layout.bin_dir())?;
        let site_packages = if layout.is_windows() {
            path.join("Lib").join("site-packages")
        } else {
            path.join("lib")
                .join(format!("python{minor}"))
                .join("site-packages")
        };
        fs::create_dir_all(site_packages)?;

        fs::write(
            layout.pyvenv_cfg(),
            format!("home = /usr/bin\nimplementation = CPython\nversion_info = {version_info}\n"),
        )?;
        fs::write(layout.python(), "")?;
        fs::write(
            layout.shell_activate(),
            "deactivate () {\n    if ! [ -z \"${_OLD_VIRTUAL_PYTHONHOME+_}\" ] ; then\n        PYTHONHOME=\"$_OLD_VIRTUAL_PYTHONHOME\"\n        export PYTHONHOME\n        unset _OLD_VIRTUAL_PYTHONHOME\n    fi\n}\n\nhash -r 2>/dev/null || true\n",
        )?;
        fs::write(
            layout.activate_this(),
            "import os\nimport site\nimport sys\n\n# add the virtual environments libraries to the host python import mechanism\nprev_length = len(sys.path)\nsys.path[:] = sys.path[prev_length:] + sys.path[0:prev_length]\n",
        )?;
        Ok(())
    }
}

/// `--python` value from a `uv venv` argument list, when it is a plain version.
fn requested_version(args: &[String]) -> Option<String> {
    let index = args.iter().position(|a| a == "--python")?;
    let value = args.get(index + 1)?;
    let plain = value.split('.').all(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit()));
    match (plain, value.matches('.').count()) {
        (true, 1) => Some(format!("{value}.0")),
        (true, _) => Some(value.clone()),
        _ => None,
    }
}

impl PackageManager for MockPackageManager {
    fn create_venv(&self, path: &Path, args: &[String]) -> Result<()> {
        self.record(MockCall::CreateVenv {
            path: path.to_path_buf(),
            args: args.to_vec(),
        });

        if let Some(default) = &self.scaffold_python {
            let version = requested_version(args).unwrap_or_else(|| default.clone());
            Self::scaffold(path, &version)?;
        }
        Ok(())
    }

    fn list_installed(&self, env: &Path) -> Result<Option<PackageMap>> {
        self.record(MockCall::ListInstalled {
            env: env.to_path_buf(),
        });
        Ok(Some(self.installed.get(env).cloned().unwrap_or_default()))
    }

    fn dry_run_install(&self, _env: &Path, packages: &[String], args: &[String]) -> DependencyTree {
        self.record(MockCall::DryRun {
            packages: packages.to_vec(),
            args: args.to_vec(),
        });
        self.dry_run.clone()
    }

    fn install(&self, _env: &Path, args: &[String]) -> Result<()> {
        self.record(MockCall::Install {
            args: args.to_vec(),
        });
        self.check_exit("uv pip install")
    }

    fn uninstall(&self, _env: &Path, args: &[String]) -> Result<()> {
        self.record(MockCall::Uninstall {
            args: args.to_vec(),
        });
        self.check_exit("uv pip uninstall")
    }

    fn passthrough(&self, args: &[OsString]) -> Result<i32> {
        self.record(MockCall::Passthrough {
            args: args.to_vec(),
        });
        Ok(self.install_exit.unwrap_or(0))
    }
}
