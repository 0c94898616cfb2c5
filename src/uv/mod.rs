//! The external package manager huv drives.
//!
//! Everything huv asks of uv goes through [`PackageManager`], so the command
//! handlers can be tested against [`MockPackageManager`].

pub mod args;
pub mod locate;
pub mod mock;

pub use args::{split_pip_args, split_venv_args, PipInvocation, VenvInvocation};
pub use locate::locate_uv;
pub use mock::MockPackageManager;

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::packages::dry_run::{parse_dry_run, DependencyTree};
use crate::packages::inventory::{parse_pip_list_json, PackageMap};
use crate::shell::{display_command, execute, execute_checked, CommandOptions};
use crate::venv::VenvLayout;

/// Operations huv needs from the environment manager.
pub trait PackageManager {
    /// `uv venv <path> <args>`.
    fn create_venv(&self, path: &Path, args: &[String]) -> Result<()>;

    /// Installed distributions of `env`, or `None` when no lister worked.
    fn list_installed(&self, env: &Path) -> Result<Option<PackageMap>>;

    /// Everything uv would install for `packages` into `env`.
    ///
    /// Empty when the dry run fails or reports nothing.
    fn dry_run_install(&self, env: &Path, packages: &[String], args: &[String]) -> DependencyTree;

    /// `uv pip install <args>` into `env`.
    fn install(&self, env: &Path, args: &[String]) -> Result<()>;

    /// `uv pip uninstall <args>` from `env`.
    fn uninstall(&self, env: &Path, args: &[String]) -> Result<()>;

    /// Hand the command line to uv unchanged and return its exit code.
    fn passthrough(&self, args: &[OsString]) -> Result<i32>;
}

/// The real `uv` binary.
#[derive(Debug, Clone)]
pub struct Uv {
    executable: PathBuf,
    global_args: Vec<String>,
}

impl Uv {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            global_args: Vec::new(),
        }
    }

    /// Options placed before every subcommand (`--quiet`, `--verbose`, `--no-color`).
    pub fn with_global_args(mut self, args: Vec<String>) -> Self {
        self.global_args = args;
        self
    }


    fn argv<I, S>(&self, rest: I) -> Vec<OsString>
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.global_args
            .iter()
            .map(OsString::from)
            .chain(rest.into_iter().map(Into::into))
            .collect()
    }

    fn env_options(env: &Path, captured: bool) -> CommandOptions {
        let base = if captured {
            CommandOptions::captured()
        } else {
            CommandOptions::default()
        };
        base.with_env("VIRTUAL_ENV", env.as_os_str())
            .without_env("PYTHONPATH")
    }

    fn list_with_uv(&self, env: &Path) -> Option<PackageMap> {
        // Global args are not forwarded: `--verbose` would pollute the JSON.
        let args: Vec<OsString> = ["pip", "list", "--format=json"]
            .into_iter()
            .map(OsString::from)
            .collect();
        let result = execute(&self.executable, &args, &Self::env_options(env, true)).ok()?;
        if !result.success {
            tracing::debug!("uv pip list failed for {}: {}", env.display(), result.stderr.trim());
            return None;
        }
        parse_pip_list_json(&result.stdout)
            .map_err(|e| tracing::debug!("Unparseable uv pip list output: {}", e))
            .ok()
    }

    fn list_with_pip(env: &Path) -> Option<PackageMap> {
        let python = VenvLayout::new(env).python();
        let args: Vec<OsString> = ["-m", "pip", "list", "--format=json"]
            .into_iter()
            .map(OsString::from)
            .collect();
        let result = execute(&python, &args, &Self::env_options(env, true)).ok()?;
        if !result.success {
            return None;
        }
        parse_pip_list_json(&result.stdout).ok()
    }
}

impl PackageManager for Uv {
    fn create_venv(&self, path: &Path, args: &[String]) -> Result<()> {
        let argv = self.argv(
            [OsString::from("venv"), path.as_os_str().to_os_string()]
                .into_iter()
                .chain(args.iter().map(OsString::from)),
        );
        execute_checked(&self.executable, &argv, &CommandOptions::default())?;
        Ok(())
    }

    fn list_installed(&self, env: &Path) -> Result<Option<PackageMap>> {
        Ok(self.list_with_uv(env).or_else(|| Self::list_with_pip(env)))
    }

    fn dry_run_install(&self, env: &Path, packages: &[String], args: &[String]) -> DependencyTree {
        let argv: Vec<OsString> = ["pip", "install", "--dry-run"]
            .into_iter()
            .map(String::from)
            .chain(packages.iter().cloned())
            .chain(args.iter().cloned())
            .map(OsString::from)
            .collect();

        match execute(&self.executable, &argv, &Self::env_options(env, true)) {
            Ok(result) if result.success => {
                parse_dry_run(&format!("{}\n{}", result.stdout, result.stderr))
            }
            Ok(result) => {
                tracing::debug!(
                    "Dry run exited with {:?}: {}",
                    result.exit_code,
                    result.stderr.trim()
                );
                DependencyTree::default()
            }
            Err(e) => {
                tracing::debug!("Dry run could not start: {}", e);
                DependencyTree::default()
            }
        }
    }

    fn install(&self, env: &Path, args: &[String]) -> Result<()> {
        let argv = self.argv(
            ["pip", "install"]
                .into_iter()
                .map(String::from)
                .chain(args.iter().cloned()),
        );
        execute_checked(&self.executable, &argv, &Self::env_options(env, false))?;
        Ok(())
    }

    fn uninstall(&self, env: &Path, args: &[String]) -> Result<()> {
        let argv = self.argv(
            ["pip", "uninstall"]
                .into_iter()
                .map(String::from)
                .chain(args.iter().cloned()),
        );
        execute_checked(&self.executable, &argv, &Self::env_options(env, false))?;
        Ok(())
    }

    fn passthrough(&self, args: &[OsString]) -> Result<i32> {
        let argv = self.argv(args.iter().cloned());
        tracing::debug!("Passing through: {}", display_command(&self.executable, &argv));

        let mut cmd = std::process::Command::new(&self.executable);
        cmd.args(&argv);
        hand_over(cmd)
    }
}

/// Replace the current process with `cmd`; only returns on failure.
#[cfg(unix)]
fn hand_over(mut cmd: std::process::Command) -> Result<i32> {
    use std::os::unix::process::CommandExt;
    Err(crate::error::HuvError::Io(cmd.exec()))
}

/// Run `cmd` to completion and report its exit code.
#[cfg(not(unix))]
fn hand_over(mut cmd: std::process::Command) -> Result<i32> {
    let status = cmd.status()?;
    Ok(status.code().unwrap_or(1))
}
