//! The `pip install` and `pip uninstall` command implementations.

use std::path::{Path, PathBuf};

use super::dispatcher::{Command, CommandResult};
use super::passthrough::PassthroughCommand;
use crate::config::HuvConfig;
use crate::error::{HuvError, Result};
use crate::packages::{
    ancestor_packages, installed_packages, plan_install, plan_uninstall, DependencyTree,
    InstallPlan,
};
use crate::ui::UserInterface;
use crate::uv::{split_pip_args, PackageManager, PipInvocation};
use crate::venv::parent_chain;

fn active_env(env: &Option<PathBuf>) -> Result<&Path> {
    env.as_deref().ok_or(HuvError::NoActiveEnvironment)
}

fn plural(count: usize, one: &str, many: &str) -> String {
    format!("{} {}", count, if count == 1 { one } else { many })
}

/// Installs only what the parent chain does not already provide.
pub struct PipInstallCommand<'a> {
    pm: &'a dyn PackageManager,
    config: &'a HuvConfig,
    active_env: Option<PathBuf>,
    args: Vec<String>,
}

impl<'a> PipInstallCommand<'a> {
    pub fn new(
        pm: &'a dyn PackageManager,
        config: &'a HuvConfig,
        active_env: Option<PathBuf>,
        args: Vec<String>,
    ) -> Self {
        Self {
            pm,
            config,
            active_env,
            args,
        }
    }

    fn analyze(
        &self,
        env: &Path,
        invocation: &PipInvocation,
        ui: &mut dyn UserInterface,
    ) -> DependencyTree {
        if !self.config.analyze_dependencies {
            tracing::debug!("Dependency analysis disabled by configuration");
            return DependencyTree::default();
        }

        let mut spinner = ui.start_spinner("Analyzing dependencies...");
        let tree = self
            .pm
            .dry_run_install(env, &invocation.packages, &invocation.pip_args);

        if tree.is_empty() {
            spinner.finish_and_clear();
            ui.warning("Could not analyze dependencies, using basic package checking");
        } else {
            spinner.finish_success(&format!(
                "Resolved {}",
                plural(tree.len(), "package", "packages")
            ));
        }
        tree
    }

    fn report_plan(&self, plan: &InstallPlan, ui: &mut dyn UserInterface) {
        for skipped in plan.explicit_skips() {
            ui.message(&format!(
                "Skipping '{}' (v{} from parent satisfies {})",
                skipped.name, skipped.version, skipped.constraint
            ));
        }

        let from_parents: Vec<_> = plan.dependency_skips().collect();
        if !from_parents.is_empty() {
            ui.message(&format!(
                "Using {} from parent environments",
                plural(from_parents.len(), "dependency", "dependencies")
            ));
            for skipped in from_parents {
                ui.detail(&format!("  {} v{}", skipped.name, skipped.version));
            }
        }

        if !plan.conflicts.is_empty() {
            ui.warning("Version conflicts with parent environments:");
            for conflict in &plan.conflicts {
                ui.warning(&format!(
                    "{}: parent v{} vs required {}",
                    conflict.name, conflict.parent_version, conflict.required
                ));
            }
        }
    }
}

impl Command for PipInstallCommand<'_> {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let invocation = split_pip_args(&self.args);
        if invocation.help {
            return PassthroughCommand::from_strs(self.pm, &["pip", "install", "--help"])
                .execute(ui);
        }

        let env = active_env(&self.active_env)?;

        if invocation.packages.is_empty() {
            if !invocation.is_options_only() {
                return Err(HuvError::NoPackages {
                    action: "installation".to_string(),
                });
            }
            ui.message("No explicit packages given, passing the request to uv unchanged");
            self.pm.install(env, &invocation.pip_args)?;
            return Ok(CommandResult::success());
        }

        let chain = parent_chain(env);
        if chain.is_empty() {
            tracing::debug!("{} has no parent environments", env.display());
            self.pm.install(env, &invocation.to_uv_args())?;
            ui.success(&format!(
                "Installed {}",
                plural(invocation.packages.len(), "package", "packages")
            ));
            return Ok(CommandResult::success());
        }

        ui.message(&format!(
            "Checking {}",
            plural(chain.len(), "parent environment", "parent environments")
        ));
        let ancestors = ancestor_packages(self.pm, &chain)?;
        let tree = self.analyze(env, &invocation, ui);

        let plan = plan_install(
            &invocation.packages,
            &ancestors,
            &tree,
            self.config.no_deps_on_skip,
        );
        self.report_plan(&plan, ui);

        if plan.is_empty() {
            ui.success(
                "All requested packages and dependencies are already available from parent environments.",
            );
            return Ok(CommandResult::success());
        }

        ui.message(&format!(
            "Installing {} ({} available from parents)",
            plural(plan.to_install.len(), "package", "packages"),
            plan.skipped.len()
        ));
        for request in &plan.to_install {
            ui.detail(&format!("  {}", request));
        }

        self.pm.install(env, &plan.install_args(&invocation.pip_args))?;

        ui.success(&format!(
            "Installed {}, reused {} from parent environments",
            plural(plan.to_install.len(), "package", "packages"),
            plan.skipped.len()
        ));
        Ok(CommandResult::success())
    }
}

/// Uninstalls from the active environment only.
pub struct PipUninstallCommand<'a> {
    pm: &'a dyn PackageManager,
    active_env: Option<PathBuf>,
    args: Vec<String>,
}

impl<'a> PipUninstallCommand<'a> {
    pub fn new(pm: &'a dyn PackageManager, active_env: Option<PathBuf>, args: Vec<String>) -> Self {
        Self {
            pm,
            active_env,
            args,
        }
    }
}

impl Command for PipUninstallCommand<'_> {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let invocation = split_pip_args(&self.args);
        if invocation.help {
            return PassthroughCommand::from_strs(self.pm, &["pip", "uninstall", "--help"])
                .execute(ui);
        }

        let env = active_env(&self.active_env)?;

        if invocation.packages.is_empty() {
            if !invocation.is_options_only() {
                return Err(HuvError::NoPackages {
                    action: "uninstallation".to_string(),
                });
            }
            self.pm.uninstall(env, &invocation.pip_args)?;
            return Ok(CommandResult::success());
        }

        let local = installed_packages(self.pm, env)?;
        let ancestors = ancestor_packages(self.pm, &parent_chain(env))?;
        let plan = plan_uninstall(&invocation.packages, &local, &ancestors);

        for missing in &plan.not_found {
            ui.warning(&format!(
                "'{}' is not installed in the active environment",
                missing
            ));
        }

        if plan.is_empty() {
            ui.message("Nothing to uninstall.");
            return Ok(CommandResult::success());
        }

        let mut args = plan.remove.clone();
        args.extend(invocation.pip_args.iter().cloned());
        self.pm.uninstall(env, &args)?;

        ui.success(&format!(
            "Uninstalled {}",
            plural(plan.remove.len(), "package", "packages")
        ));
        for (name, version) in &plan.still_available {
            ui.message(&format!(
                "'{}' v{} is still available from parent environment",
                name, version
            ));
        }
        Ok(CommandResult::success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packages::parse_dry_run;
    use crate::ui::{MockUI, OutputMode};
    use crate::uv::mock::MockCall;
    use crate::uv::MockPackageManager;
    use crate::venv::{PyvenvCfg, VenvLayout};
    use std::fs;
    use tempfile::TempDir;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    /// `base` <- `child`, both with interpreters so inventories are consulted.
    fn family(temp: &TempDir) -> (PathBuf, PathBuf) {
        let make = |name: &str, parent: Option<&Path>| {
            let env = temp.path().join(name);
            let layout = VenvLayout::new(&env);
            fs::create_dir_all(layout.bin_dir()).unwrap();
            fs::write(layout.python(), "").unwrap();
            let mut cfg = PyvenvCfg::parse("version_info = 3.12.4\n");
            if let Some(parent) = parent {
                cfg.set_parent(parent);
            }
            cfg.save(&layout.pyvenv_cfg()).unwrap();
            env
        };
        let base = make("base", None);
        let child = make("child", Some(&base));
        (base, child)
    }

    fn install(
        pm: &MockPackageManager,
        config: &HuvConfig,
        env: Option<PathBuf>,
        list: &[&str],
    ) -> (Result<CommandResult>, MockUI) {
        let mut ui = MockUI::with_mode(OutputMode::Verbose);
        let result = PipInstallCommand::new(pm, config, env, args(list)).execute(&mut ui);
        (result, ui)
    }

    #[test]
    fn everything_from_parent_installs_nothing() {
        let temp = TempDir::new().unwrap();
        let (base, child) = family(&temp);
        let pm = MockPackageManager::new()
            .with_installed(&base, &[("requests", "2.31.0"), ("idna", "3.7")])
            .with_dry_run(parse_dry_run(" + requests==2.31.0\n + idna==3.7\n"));

        let (result, ui) = install(&pm, &HuvConfig::default(), Some(child), &["requests"]);

        assert!(result.unwrap().success);
        assert!(pm.installs().is_empty());
        assert!(ui.has_message("Skipping 'requests' (v2.31.0 from parent satisfies any version)"));
        assert!(ui.has_success("already available from parent environments"));
    }

    #[test]
    fn missing_dependencies_are_pinned_with_no_deps() {
        let temp = TempDir::new().unwrap();
        let (base, child) = family(&temp);
        let pm = MockPackageManager::new()
            .with_installed(&base, &[("markupsafe", "2.1.5")])
            .with_dry_run(parse_dry_run(
                " + flask==3.0.3\n + jinja2==3.1.4\n + markupsafe==2.1.5\n",
            ));

        let (result, ui) = install(&pm, &HuvConfig::default(), Some(child), &["flask", "-U"]);

        assert!(result.unwrap().success);
        assert_eq!(
            pm.installs(),
            vec![args(&["flask", "jinja2==3.1.4", "--no-deps", "-U"])]
        );
        assert!(ui.has_message("Using 1 dependency from parent environments"));
        assert!(ui.has_message("  markupsafe v2.1.5"));
        assert_eq!(ui.spinner_results(), vec!["Resolved 3 packages".to_string()]);
    }

    #[test]
    fn editable_project_is_installed_once() {
        let temp = TempDir::new().unwrap();
        let (base, child) = family(&temp);
        let pm = MockPackageManager::new()
            .with_installed(&base, &[("click", "8.1.7")])
            .with_dry_run(parse_dry_run(
                " + proj==0.1.0 (from file:///work/proj)\n + click==8.1.7\n + httpx==0.27.0\n",
            ));

        let (result, _) = install(
            &pm,
            &HuvConfig::default(),
            Some(child),
            &["-e", "./proj", "httpx"],
        );

        assert!(result.unwrap().success);
        assert_eq!(
            pm.installs(),
            vec![args(&["httpx", "--no-deps", "-e", "./proj"])]
        );
    }

    #[test]
    fn conflicts_are_reported_and_installed() {
        let temp = TempDir::new().unwrap();
        let (base, child) = family(&temp);
        let pm = MockPackageManager::new()
            .with_installed(&base, &[("numpy", "1.24.0")])
            .with_dry_run(parse_dry_run(" + numpy==2.0.0\n"));

        let (result, ui) = install(&pm, &HuvConfig::default(), Some(child), &["numpy>=2"]);

        assert!(result.unwrap().success);
        assert!(ui.has_warning("numpy: parent v1.24.0 vs required >=2"));
        assert_eq!(pm.installs(), vec![args(&["numpy>=2"])]);
    }

    #[test]
    fn failed_analysis_falls_back_to_basic_checks() {
        let temp = TempDir::new().unwrap();
        let (base, child) = family(&temp);
        let pm = MockPackageManager::new().with_installed(&base, &[("rich", "13.7.1")]);

        let (result, ui) = install(&pm, &HuvConfig::default(), Some(child), &["rich", "typer"]);

        assert!(result.unwrap().success);
        assert!(ui.has_warning("Could not analyze dependencies"));
        assert_eq!(pm.installs(), vec![args(&["typer"])]);
    }

    #[test]
    fn analysis_can_be_disabled() {
        let temp = TempDir::new().unwrap();
        let (_, child) = family(&temp);
        let pm = MockPackageManager::new();
        let config = HuvConfig {
            analyze_dependencies: false,
            ..HuvConfig::default()
        };

        let (result, ui) = install(&pm, &config, Some(child), &["typer"]);

        assert!(result.unwrap().success);
        assert!(!pm
            .calls()
            .iter()
            .any(|call| matches!(call, MockCall::DryRun { .. })));
        assert!(ui.warnings().is_empty());
    }

    #[test]
    fn environment_without_parents_installs_directly() {
        let temp = TempDir::new().unwrap();
        let (base, _) = family(&temp);
        let pm = MockPackageManager::new();

        let (result, _) = install(&pm, &HuvConfig::default(), Some(base), &["flask", "--upgrade"]);

        assert!(result.unwrap().success);
        assert_eq!(pm.installs(), vec![args(&["flask", "--upgrade"])]);
    }

    #[test]
    fn requirement_files_pass_through() {
        let temp = TempDir::new().unwrap();
        let (_, child) = family(&temp);
        let pm = MockPackageManager::new();

        let (result, _) = install(&pm, &HuvConfig::default(), Some(child), &["-r", "req.txt"]);

        assert!(result.unwrap().success);
        assert_eq!(pm.installs(), vec![args(&["-r", "req.txt"])]);
    }

    #[test]
    fn install_without_packages_is_an_error() {
        let temp = TempDir::new().unwrap();
        let (_, child) = family(&temp);
        let pm = MockPackageManager::new();

        let (result, _) = install(&pm, &HuvConfig::default(), Some(child), &[]);
        assert!(matches!(result, Err(HuvError::NoPackages { .. })));
    }

    #[test]
    fn install_failure_carries_uv_exit_code() {
        let temp = TempDir::new().unwrap();
        let (_, child) = family(&temp);
        let pm = MockPackageManager::new().failing_with(2);

        let (result, _) = install(&pm, &HuvConfig::default(), Some(child), &["flask"]);
        assert_eq!(result.unwrap_err().exit_code(), 2);
    }

    #[test]
    fn uninstall_removes_local_packages_only() {
        let temp = TempDir::new().unwrap();
        let (base, child) = family(&temp);
        let pm = MockPackageManager::new()
            .with_installed(&child, &[("requests", "2.32.0")])
            .with_installed(&base, &[("requests", "2.31.0"), ("numpy", "1.26.4")]);
        let mut ui = MockUI::new();

        let result = PipUninstallCommand::new(&pm, Some(child), args(&["requests", "numpy", "-y"]))
            .execute(&mut ui)
            .unwrap();

        assert!(result.success);
        assert_eq!(pm.uninstalls(), vec![args(&["requests", "-y"])]);
        assert!(ui.has_warning("'numpy' is not installed in the active environment"));
        assert!(ui.has_message("still available from parent"));
    }

    #[test]
    fn uninstall_of_parent_only_packages_does_nothing() {
        let temp = TempDir::new().unwrap();
        let (base, child) = family(&temp);
        let pm = MockPackageManager::new().with_installed(&base, &[("numpy", "1.26.4")]);
        let mut ui = MockUI::new();

        PipUninstallCommand::new(&pm, Some(child), args(&["numpy"]))
            .execute(&mut ui)
            .unwrap();

        assert!(pm.uninstalls().is_empty());
        assert!(ui.has_message("Nothing to uninstall."));
    }

    #[test]
    fn uninstall_requires_active_env() {
        let pm = MockPackageManager::new();
        let err = PipUninstallCommand::new(&pm, None, args(&["flask"]))
            .execute(&mut MockUI::new())
            .unwrap_err();
        assert!(matches!(err, HuvError::NoActiveEnvironment));
    }
}
