//! The `venv` command implementation.

use std::path::{Path, PathBuf};

use super::dispatcher::{Command, CommandResult};
use super::passthrough::PassthroughCommand;
use crate::config::HuvConfig;
use crate::error::{HuvError, Result};
use crate::ui::UserInterface;
use crate::uv::{split_venv_args, PackageManager};
use crate::venv::create::parent_python_version;
use crate::venv::{
    choose_python, parent_chain, resolve_path, setup_hierarchy, validate_parent, validate_target,
    HierarchySpec, PythonChoice, VenvLayout,
};

/// Creates an environment through `uv venv` and links it to its parent.
pub struct VenvCommand<'a> {
    pm: &'a dyn PackageManager,
    config: &'a HuvConfig,
    args: Vec<String>,
}

impl<'a> VenvCommand<'a> {
    pub fn new(pm: &'a dyn PackageManager, config: &'a HuvConfig, args: Vec<String>) -> Self {
        Self { pm, config, args }
    }

    /// Work out the `--python` value for uv, checking it against the parent.
    fn python_for(
        &self,
        parent: Option<&VenvLayout>,
        requested: Option<&str>,
        ui: &mut dyn UserInterface,
    ) -> Result<Option<String>> {
        let Some(parent) = parent else {
            return Ok(requested.map(String::from));
        };

        let parent_version = parent_python_version(parent);
        match choose_python(parent_version.as_deref(), requested)? {
            PythonChoice::Inherit(version) => {
                ui.message(&format!("Using parent's Python version: {}", version));
                Ok(Some(version))
            }
            PythonChoice::Compatible => Ok(requested.map(String::from)),
            PythonChoice::Unverified(request) => {
                ui.warning(&format!(
                    "Could not verify that Python '{}' matches the parent's Python {}",
                    request,
                    parent_version.unwrap_or_default()
                ));
                Ok(Some(request))
            }
            PythonChoice::Unconstrained => {
                ui.warning(&format!(
                    "Could not determine the Python version of {}",
                    parent.root().display()
                ));
                Ok(requested.map(String::from))
            }
        }
    }

    fn link_to_parent(
        &self,
        child: &VenvLayout,
        parent: &Path,
        ui: &mut dyn UserInterface,
    ) -> bool {
        let mut chain = vec![parent.to_path_buf()];
        chain.extend(parent_chain(parent));

        let spec = HierarchySpec {
            chain,
            write_pth: self.config.write_pth,
        };

        match setup_hierarchy(child, &spec) {
            Ok(report) => {
                for warning in &report.warnings {
                    ui.warning(warning);
                }
                tracing::debug!("Hierarchy setup touched {} files", report.patched.len());
                true
            }
            Err(e) => {
                ui.error(&e.to_string());
                false
            }
        }
    }
}

impl Command for VenvCommand<'_> {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let invocation = split_venv_args(&self.args)?;

        if invocation.help {
            return PassthroughCommand::from_strs(self.pm, &["venv", "--help"]).execute(ui);
        }

        let path = resolve_path(Path::new(&invocation.path))?;
        validate_target(&path)?;

        let parent: Option<PathBuf> = invocation
            .parent
            .as_deref()
            .map(|p| resolve_path(Path::new(p)))
            .transpose()?;
        let parent_layout = parent.as_deref().map(validate_parent).transpose()?;

        let python = self.python_for(parent_layout.as_ref(), invocation.python.as_deref(), ui)?;

        let mut uv_args = Vec::new();
        if let Some(python) = python {
            uv_args.push("--python".to_string());
            uv_args.push(python);
        }
        uv_args.extend(invocation.uv_args.iter().cloned());

        ui.message(&format!("Creating virtual environment: {}", path.display()));
        if let Some(parent) = &parent {
            ui.message(&format!("Parent environment: {}", parent.display()));
        }

        self.pm.create_venv(&path, &uv_args)?;

        let layout = VenvLayout::new(&path);
        if !layout.activation_script().is_file() {
            return Err(HuvError::NoActivateScript {
                path: layout.activation_script(),
            });
        }

        if let Some(parent) = &parent {
            if !self.link_to_parent(&layout, parent, ui) {
                ui.error("Virtual environment created but hierarchy setup failed.");
                return Ok(CommandResult::failure(1));
            }
        }

        ui.success(&format!(
            "Virtual environment created successfully at: {}",
            path.display()
        ));
        if let Some(parent) = &parent {
            ui.success(&format!(
                "Hierarchy configured with parent: {}",
                parent.display()
            ));
            ui.message(&format!("Use: {}", layout.activation_hint()));
        }

        Ok(CommandResult::success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::MockUI;
    use crate::uv::mock::MockCall;
    use crate::uv::MockPackageManager;
    use crate::venv::PyvenvCfg;
    use std::fs;
    use tempfile::TempDir;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn run(
        pm: &MockPackageManager,
        config: &HuvConfig,
        list: &[&str],
    ) -> (Result<CommandResult>, MockUI) {
        let mut ui = MockUI::new();
        let result = VenvCommand::new(pm, config, args(list)).execute(&mut ui);
        (result, ui)
    }

    fn created_args(pm: &MockPackageManager) -> Vec<String> {
        pm.calls()
            .into_iter()
            .find_map(|call| match call {
                MockCall::CreateVenv { args, .. } => Some(args),
                _ => None,
            })
            .unwrap()
    }

    #[test]
    fn creates_standalone_environment() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("plain");
        let pm = MockPackageManager::new();
        let config = HuvConfig::default();

        let (result, ui) = run(&pm, &config, &[target.to_str().unwrap(), "--seed"]);

        assert!(result.unwrap().success);
        assert_eq!(created_args(&pm), args(&["--seed"]));
        assert!(ui.has_message("Creating virtual environment:"));
        assert!(ui.has_success("Virtual environment created successfully at:"));
        assert!(PyvenvCfg::load(&target.join("pyvenv.cfg")).unwrap().parent().is_none());
    }

    #[test]
    fn child_inherits_parent_python_and_gets_linked() {
        let temp = TempDir::new().unwrap();
        let base = temp.path().join("base");
        let child = temp.path().join("child");
        let pm = MockPackageManager::new();
        let config = HuvConfig::default();

        run(&pm, &config, &[base.to_str().unwrap(), "--python", "3.11"]).0.unwrap();
        let (result, ui) = run(
            &pm,
            &config,
            &[child.to_str().unwrap(), "--parent", base.to_str().unwrap()],
        );

        assert!(result.unwrap().success);
        assert!(ui.has_message("Using parent's Python version: 3.11"));
        assert!(ui.has_success("Hierarchy configured with parent:"));
        assert!(ui.has_message("Use: "));

        let child_args = pm
            .calls()
            .into_iter()
            .filter_map(|call| match call {
                MockCall::CreateVenv { args, .. } => Some(args),
                _ => None,
            })
            .last()
            .unwrap();
        assert_eq!(child_args, args(&["--python", "3.11"]));

        let cfg = PyvenvCfg::load(&child.join("pyvenv.cfg")).unwrap();
        assert_eq!(cfg.parent(), Some(base.canonicalize().unwrap()));
        let activate = fs::read_to_string(VenvLayout::new(&child).shell_activate()).unwrap();
        assert!(activate.contains("PARENT_VENV_PATH="));
    }

    #[test]
    fn grandchild_links_whole_chain() {
        let temp = TempDir::new().unwrap();
        let base = temp.path().join("base");
        let mid = temp.path().join("mid");
        let leaf = temp.path().join("leaf");
        let pm = MockPackageManager::new();
        let config = HuvConfig::default();

        run(&pm, &config, &[base.to_str().unwrap()]).0.unwrap();
        run(&pm, &config, &[mid.to_str().unwrap(), "--parent", base.to_str().unwrap()])
            .0
            .unwrap();
        run(&pm, &config, &[leaf.to_str().unwrap(), "--parent", mid.to_str().unwrap()])
            .0
            .unwrap();

        let chain = parent_chain(&leaf);
        assert_eq!(
            chain,
            vec![mid.canonicalize().unwrap(), base.canonicalize().unwrap()]
        );
    }

    #[test]
    fn mismatched_python_is_rejected() {
        let temp = TempDir::new().unwrap();
        let base = temp.path().join("base");
        let child = temp.path().join("child");
        let pm = MockPackageManager::new();
        let config = HuvConfig::default();

        run(&pm, &config, &[base.to_str().unwrap()]).0.unwrap();
        let (result, _) = run(
            &pm,
            &config,
            &[
                child.to_str().unwrap(),
                "--parent",
                base.to_str().unwrap(),
                "-p",
                "3.10",
            ],
        );

        assert!(matches!(result, Err(HuvError::PythonVersionMismatch { .. })));
        assert!(!child.exists());
    }

    #[test]
    fn unverifiable_python_warns() {
        let temp = TempDir::new().unwrap();
        let base = temp.path().join("base");
        let child = temp.path().join("child");
        let pm = MockPackageManager::new();
        let config = HuvConfig::default();

        run(&pm, &config, &[base.to_str().unwrap()]).0.unwrap();
        let (result, ui) = run(
            &pm,
            &config,
            &[
                child.to_str().unwrap(),
                "--parent",
                base.to_str().unwrap(),
                "--python",
                "pypy",
            ],
        );

        assert!(result.unwrap().success);
        assert!(ui.has_warning("Could not verify"));
    }

    #[test]
    fn existing_environment_is_an_error() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("env");
        let pm = MockPackageManager::new();
        let config = HuvConfig::default();

        run(&pm, &config, &[target.to_str().unwrap()]).0.unwrap();
        let (result, _) = run(&pm, &config, &[target.to_str().unwrap()]);

        assert!(matches!(result, Err(HuvError::EnvironmentExists { .. })));
    }

    #[test]
    fn missing_parent_is_an_error() {
        let temp = TempDir::new().unwrap();
        let pm = MockPackageManager::new();
        let config = HuvConfig::default();
        let missing = temp.path().join("missing");

        let (result, _) = run(
            &pm,
            &config,
            &[
                temp.path().join("child").to_str().unwrap(),
                "--parent",
                missing.to_str().unwrap(),
            ],
        );

        assert!(matches!(result, Err(HuvError::ParentNotFound { .. })));
        assert!(pm.calls().is_empty());
    }

    #[test]
    fn pth_file_can_be_disabled() {
        let temp = TempDir::new().unwrap();
        let base = temp.path().join("base");
        let child = temp.path().join("child");
        let pm = MockPackageManager::new();
        let config = HuvConfig {
            write_pth: false,
            ..HuvConfig::default()
        };

        run(&pm, &config, &[base.to_str().unwrap()]).0.unwrap();
        run(&pm, &config, &[child.to_str().unwrap(), "--parent", base.to_str().unwrap()])
            .0
            .unwrap();

        let site = &VenvLayout::new(&child).site_packages_dirs()[0];
        assert!(!site.join(crate::venv::patch::PTH_FILE).exists());
    }

    #[test]
    fn uv_without_activation_script_fails() {
        let temp = TempDir::new().unwrap();
        let pm = MockPackageManager::new().without_scaffold();
        let config = HuvConfig::default();

        let (result, _) = run(&pm, &config, &[temp.path().join("env").to_str().unwrap()]);
        assert!(matches!(result, Err(HuvError::NoActivateScript { .. })));
    }

    #[test]
    fn help_goes_to_uv() {
        let pm = MockPackageManager::new();
        let config = HuvConfig::default();

        run(&pm, &config, &["--help"]).0.unwrap();

        assert!(matches!(
            pm.calls().as_slice(),
            [MockCall::Passthrough { args }] if args.len() == 2
        ));
    }
}
