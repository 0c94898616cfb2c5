//! Commands huv does not handle itself.

use std::ffi::OsString;

use super::dispatcher::{Command, CommandResult};
use crate::error::Result;
use crate::ui::UserInterface;
use crate::uv::PackageManager;

/// Hands a command line to uv unchanged.
pub struct PassthroughCommand<'a> {
    pm: &'a dyn PackageManager,
    args: Vec<OsString>,
}

impl<'a> PassthroughCommand<'a> {
    pub fn new(pm: &'a dyn PackageManager, args: Vec<OsString>) -> Self {
        Self { pm, args }
    }

    /// Convenience for string arguments.
    pub fn from_strs(pm: &'a dyn PackageManager, args: &[&str]) -> Self {
        Self::new(pm, args.iter().map(OsString::from).collect())
    }
}

impl Command for PassthroughCommand<'_> {
    fn execute(&self, _ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let code = self.pm.passthrough(&self.args)?;
        Ok(CommandResult::from_exit_code(code))
    }
}
