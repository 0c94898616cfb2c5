//! Command dispatching.
//!
//! This module provides the core command infrastructure:
//! - [`Command`] trait for implementing commands
//! - [`CommandResult`] for uniform result reporting
//! - [`CommandDispatcher`] for routing CLI subcommands

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::cli::args::{Cli, Commands, PipArgs, PipCommands};
use crate::config::HuvConfig;
use crate::error::Result;
use crate::ui::UserInterface;
use crate::uv::PackageManager;

use super::passthrough::PassthroughCommand;
use super::pip::{PipInstallCommand, PipUninstallCommand};
use super::venv::VenvCommand;

/// Trait for command implementations.
///
/// Each CLI subcommand implements this trait to provide its execution logic.
pub trait Command {
    /// Execute the command.
    ///
    /// # Arguments
    ///
    /// * `ui` - User interface for displaying output
    ///
    /// # Returns
    ///
    /// A [`CommandResult`] indicating success/failure and exit code.
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult>;
}

/// Result of command execution.
#[derive(Debug)]
pub struct CommandResult {
    /// Whether the command succeeded.
    pub success: bool,

    /// Exit code to use (0 for success, non-zero for failure).
    pub exit_code: i32,
}

impl CommandResult {
    /// Create a successful result.
    pub fn success() -> Self {
        Self {
            success: true,
            exit_code: 0,
        }
    }

    /// Create a failure result.
    pub fn failure(exit_code: i32) -> Self {
        Self {
            success: false,
            exit_code,
        }
    }

    /// Result mirroring a child process's exit code.
    pub fn from_exit_code(exit_code: i32) -> Self {
        Self {
            success: exit_code == 0,
            exit_code,
        }
    }
}

/// Dispatches CLI commands to their implementations.
pub struct CommandDispatcher<'a> {
    pm: &'a dyn PackageManager,
    config: HuvConfig,
    active_env: Option<PathBuf>,
}

impl<'a> CommandDispatcher<'a> {
    pub fn new(pm: &'a dyn PackageManager, config: HuvConfig) -> Self {
        Self {
            pm,
            config,
            active_env: None,
        }
    }

    /// Environment named by `VIRTUAL_ENV`, if any.
    pub fn with_active_env(mut self, env: Option<PathBuf>) -> Self {
        self.active_env = env;
        self
    }

    pub fn active_env(&self) -> Option<&Path> {
        self.active_env.as_deref()
    }

    /// Dispatch and execute a command.
    pub fn dispatch(&self, cli: &Cli, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        match &cli.command {
            Some(Commands::Venv(raw)) => {
                let cmd = VenvCommand::new(self.pm, &self.config, raw.args.clone());
                cmd.execute(ui)
            }
            Some(Commands::Pip(PipArgs { command })) => self.dispatch_pip(command.as_ref(), ui),
            Some(Commands::External(raw)) => {
                let cmd = PassthroughCommand::new(self.pm, raw.clone());
                cmd.execute(ui)
            }
            None => {
                let cmd = PassthroughCommand::new(self.pm, vec![OsString::from("--help")]);
                cmd.execute(ui)
            }
        }
    }

    fn dispatch_pip(
        &self,
        command: Option<&PipCommands>,
        ui: &mut dyn UserInterface,
    ) -> Result<CommandResult> {
        match command {
            Some(PipCommands::Install(raw)) => {
                let cmd = PipInstallCommand::new(
                    self.pm,
                    &self.config,
                    self.active_env.clone(),
                    raw.args.clone(),
                );
                cmd.execute(ui)
            }
            Some(PipCommands::Uninstall(raw)) => {
                let cmd =
                    PipUninstallCommand::new(self.pm, self.active_env.clone(), raw.args.clone());
                cmd.execute(ui)
            }
            Some(PipCommands::Other(raw)) => {
                let args = std::iter::once(OsString::from("pip"))
                    .chain(raw.iter().cloned())
                    .collect();
                PassthroughCommand::new(self.pm, args).execute(ui)
            }
            None => PassthroughCommand::new(self.pm, vec![OsString::from("pip")]).execute(ui),
        }
    }
}
