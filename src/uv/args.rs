//! Splitting raw `venv` / `pip` argument lists into the parts huv acts on
//! and the parts forwarded to uv untouched.

use crate::error::{HuvError, Result};

/// Default environment directory for `huv venv`.
pub const DEFAULT_VENV_PATH: &str = ".venv";

/// `uv venv` options whose value is a separate token.
const VENV_VALUE_OPTIONS: &[&str] = &[
    "--python",
    "-p",
    "--prompt",
    "--index-url",
    "-i",
    "--extra-index-url",
    "--find-links",
    "-f",
    "--index-strategy",
    "--keyring-provider",
    "--link-mode",
    "--exclude-newer",
    "--cache-dir",
    "--config-file",
    "--directory",
    "--project",
    "--color",
    "--python-preference",
    "--index",
    "--default-index",
];

/// `uv pip install` / `uv pip uninstall` options whose value is a separate token.
const PIP_VALUE_OPTIONS: &[&str] = &[
    "--requirement",
    "-r",
    "--constraint",
    "-c",
    "--override",
    "--editable",
    "-e",
    "--index-url",
    "-i",
    "--extra-index-url",
    "--find-links",
    "-f",
    "--python",
    "-p",
    "--target",
    "--prefix",
    "--upgrade-package",
    "-P",
    "--reinstall-package",
    "--resolution",
    "--prerelease",
    "--python-version",
    "--python-platform",
    "--config-setting",
    "-C",
    "--exclude-newer",
    "--link-mode",
    "--index-strategy",
    "--keyring-provider",
    "--cache-dir",
    "--config-file",
    "--index",
    "--default-index",
    "--no-binary",
    "--only-binary",
    "--color",
];

fn is_help(arg: &str) -> bool {
    arg == "-h" || arg == "--help"
}

/// Value of `--name=value` or, for a short option, `-nvalue`.
fn inline_value<'a>(arg: &'a str, names: &[&str]) -> Option<&'a str> {
    names.iter().find_map(|name| {
        if name.starts_with("--") {
            arg.strip_prefix(name)?.strip_prefix('=')
        } else {
            arg.strip_prefix(name).filter(|rest| !rest.is_empty())
        }
    })
}

/// Whether `arg` is a value-taking option written without its value.
fn takes_value(arg: &str, table: &[&str]) -> bool {
    table.contains(&arg)
}

/// A parsed `huv venv` command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VenvInvocation {
    /// Target directory; [`DEFAULT_VENV_PATH`] when omitted.
    pub path: String,
    /// Value of `--parent`.
    pub parent: Option<String>,
    /// Value of `--python` / `-p`.
    pub python: Option<String>,
    /// Everything else, in order, for `uv venv`.
    pub uv_args: Vec<String>,
    /// `-h` / `--help` was requested.
    pub help: bool,
}

/// Split `huv venv` arguments.
pub fn split_venv_args(args: &[String]) -> Result<VenvInvocation> {
    let mut invocation = VenvInvocation::default();
    let mut path = None;
    let mut iter = args.iter();
    let mut positional_only = false;

    let missing = |option: &str| HuvError::InvalidArguments {
        message: format!("Option '{option}' requires a value"),
    };

    while let Some(arg) = iter.next() {
        if positional_only || !arg.starts_with('-') || arg == "-" {
            if path.is_none() {
                path = Some(arg.clone());
            } else {
                invocation.uv_args.push(arg.clone());
            }
            continue;
        }

        if arg == "--" {
            positional_only = true;
            continue;
        }

        if is_help(arg) {
            invocation.help = true;
            continue;
        }

        if arg == "--parent" {
            let value = iter.next().ok_or_else(|| missing("--parent"))?;
            invocation.parent = Some(value.clone());
            continue;
        }
        if let Some(value) = inline_value(arg, &["--parent"]) {
            invocation.parent = Some(value.to_string());
            continue;
        }

        if arg == "--python" || arg == "-p" {
            let value = iter.next().ok_or_else(|| missing(arg))?;
            invocation.python = Some(value.clone());
            continue;
        }
        if let Some(value) = inline_value(arg, &["--python", "-p"]) {
            invocation.python = Some(value.to_string());
            continue;
        }

        invocation.uv_args.push(arg.clone());
        if takes_value(arg, VENV_VALUE_OPTIONS) {
            if let Some(value) = iter.next() {
                invocation.uv_args.push(value.clone());
            }
        }
    }

    invocation.path = path.unwrap_or_else(|| DEFAULT_VENV_PATH.to_string());
    Ok(invocation)
}

/// A parsed `huv pip install` / `huv pip uninstall` command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipInvocation {
    /// Positional package requests.
    pub packages: Vec<String>,
    /// Options and their values, in order, for uv.
    pub pip_args: Vec<String>,
    /// `-h` / `--help` was requested.
    pub help: bool,
}

impl PipInvocation {
    /// Options were given but no explicit package (e.g. `-r requirements.txt`).
    pub fn is_options_only(&self) -> bool {
        self.packages.is_empty() && !self.pip_args.is_empty()
    }

    /// The line as uv receives it: packages first, then options.
    pub fn to_uv_args(&self) -> Vec<String> {
        self.packages
            .iter()
            .chain(self.pip_args.iter())
            .cloned()
            .collect()
    }
}

/// Split `huv pip install` / `huv pip uninstall` arguments.
pub fn split_pip_args(args: &[String]) -> PipInvocation {
    let mut invocation = PipInvocation::default();
    let mut iter = args.iter();
    let mut positional_only = false;

    while let Some(arg) = iter.next() {
        if positional_only || !arg.starts_with('-') || arg == "-" {
            invocation.packages.push(arg.clone());
            continue;
        }

        if arg == "--" {
            positional_only = true;
            continue;
        }

        if is_help(arg) {
            invocation.help = true;
            continue;
        }

        invocation.pip_args.push(arg.clone());
        if takes_value(arg, PIP_VALUE_OPTIONS) {
            if let Some(value) = iter.next() {
                invocation.pip_args.push(value.clone());
            }
        }
    }

    invocation
}
