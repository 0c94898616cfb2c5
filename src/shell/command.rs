//! External process execution.

use crate::error::{HuvError, Result};
use std::collections::HashMap;
use std::ffi::OsString;
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

/// Result of executing an external command.
#[derive(Debug, Clone)]
pub struct CommandResult {
    /// Exit code (None if killed by signal).
    pub exit_code: Option<i32>,

    /// Standard output.
    pub stdout: String,

    /// Standard error.
    pub stderr: String,

    /// Execution duration.
    pub duration: Duration,

    /// Whether command succeeded (exit code 0).
    pub success: bool,
}

impl CommandResult {
    /// Create a success result.
    pub fn success(stdout: String, stderr: String, duration: Duration) -> Self {
        Self {
            exit_code: Some(0),
            stdout,
            stderr,
            duration,
            success: true,
        }
    }

    /// Create a failure result.
    pub fn failure(
        exit_code: Option<i32>,
        stdout: String,
        stderr: String,
        duration: Duration,
    ) -> Self {
        Self {
            exit_code,
            stdout,
            stderr,
            duration,
            success: false,
        }
    }
}

/// Options for command execution.
#[derive(Debug, Clone, Default)]
pub struct CommandOptions {
    /// Environment variables (merged with system env).
    pub env: HashMap<String, OsString>,

    /// Environment variables removed from the inherited env.
    pub env_remove: Vec<String>,

    /// Capture stdout (if false, inherits from parent).
    pub capture_stdout: bool,

    /// Capture stderr (if false, inherits from parent).
    pub capture_stderr: bool,
}

impl CommandOptions {
    /// Options that capture both output streams.
    pub fn captured() -> Self {
        Self {
            capture_stdout: true,
            capture_stderr: true,
            ..Default::default()
        }
    }

    /// Set an environment variable for the child.
    pub fn with_env(mut self, key: &str, value: impl Into<OsString>) -> Self {
        self.env.insert(key.to_string(), value.into());
        self
    }

    /// Remove an inherited environment variable from the child.
    pub fn without_env(mut self, key: &str) -> Self {
        self.env_remove.push(key.to_string());
        self
    }
}

/// Render a program and its arguments for logs and error messages.
pub fn display_command(program: &Path, args: &[OsString]) -> String {
    let mut rendered = program.display().to_string();
    for arg in args {
        rendered.push(' ');
        rendered.push_str(&arg.to_string_lossy());
    }
    rendered
}

/// Build a [`Command`] from a program, arguments and options.
pub fn build(program: &Path, args: &[OsString], options: &CommandOptions) -> Command {
    let mut cmd = Command::new(program);
    cmd.args(args);

    for key in &options.env_remove {
        cmd.env_remove(key);
    }

    for (key, value) in &options.env {
        cmd.env(key, value);
    }

    cmd
}

/// Execute a program with arguments.
///
/// A non-zero exit is reported through [`CommandResult::success`], not as an
/// error. Only a failure to spawn the process is an error.
pub fn execute(program: &Path, args: &[OsString], options: &CommandOptions) -> Result<CommandResult> {
    let start = Instant::now();
    let rendered = display_command(program, args);
    tracing::debug!("Running: {}", rendered);

    let mut cmd = build(program, args, options);

    if options.capture_stdout {
        cmd.stdout(Stdio::piped());
    } else {
        cmd.stdout(Stdio::inherit());
    }

    if options.capture_stderr {
        cmd.stderr(Stdio::piped());
    } else {
        cmd.stderr(Stdio::inherit());
    }

    let output = cmd.output().map_err(|e| {
        tracing::debug!("Failed to spawn {}: {}", rendered, e);
        HuvError::CommandFailed {
            command: rendered.clone(),
            code: None,
        }
    })?;

    let duration = start.elapsed();

    let stdout = if options.capture_stdout {
        String::from_utf8_lossy(&output.stdout).to_string()
    } else {
        String::new()
    };

    let stderr = if options.capture_stderr {
        String::from_utf8_lossy(&output.stderr).to_string()
    } else {
        String::new()
    };

    tracing::debug!(
        "Finished in {:?} with status {:?}: {}",
        duration,
        output.status.code(),
        rendered
    );

    if output.status.success() {
        Ok(CommandResult::success(stdout, stderr, duration))
    } else {
        Ok(CommandResult::failure(
            output.status.code(),
            stdout,
            stderr,
            duration,
        ))
    }
}

/// Execute a program and turn a non-zero exit into [`HuvError::CommandFailed`].
pub fn execute_checked(
    program: &Path,
    args: &[OsString],
    options: &CommandOptions,
) -> Result<CommandResult> {
    let result = execute(program, args, options)?;
    if result.success {
        Ok(result)
    } else {
        Err(HuvError::CommandFailed {
            command: display_command(program, args),
            code: result.exit_code,
        })
    }
}
