//! Parent-chain resolution.
//!
//! The parent of an environment is read from `huv_parent` in its
//! `pyvenv.cfg`, falling back to the `PARENT_VENV_PATH` line of its
//! activation script (environments created by older huv releases only carry
//! the latter).

use regex::Regex;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use super::layout::VenvLayout;
use super::pyvenv_cfg::PyvenvCfg;

/// Upper bound on chain length.
pub const MAX_DEPTH: usize = 64;

static PARENT_LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"PARENT_VENV_PATH="([^"]*)""#).expect("parent line regex is valid")
});

/// Parent recorded for `env`, if it still exists on disk.
pub fn find_parent(env: &Path) -> Option<PathBuf> {
    let layout = VenvLayout::new(env);

    let recorded = PyvenvCfg::load(&layout.pyvenv_cfg())
        .ok()
        .and_then(|cfg| cfg.parent())
        .or_else(|| parent_from_activate(&layout.shell_activate()));

    match recorded {
        Some(parent) if parent.exists() => Some(parent),
        Some(parent) => {
            tracing::debug!(
                "Parent {} of {} no longer exists",
                parent.display(),
                env.display()
            );
            None
        }
        None => None,
    }
}

fn parent_from_activate(script: &Path) -> Option<PathBuf> {
    let content = fs::read_to_string(script).ok()?;
    parse_parent_line(&content)
}

/// Extract `PARENT_VENV_PATH="..."` from an activation script.
pub fn parse_parent_line(content: &str) -> Option<PathBuf> {
    PARENT_LINE_RE
        .captures(content)
        .map(|caps| caps[1].to_string())
        .filter(|p| !p.is_empty())
        .map(PathBuf::from)
}

fn identity(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

/// Ancestors of `env`, nearest first.
///
/// Stops at the first missing parent, on a cycle, or after [`MAX_DEPTH`]
/// ancestors.
pub fn parent_chain(env: &Path) -> Vec<PathBuf> {
    let mut chain = Vec::new();
    let mut seen = HashSet::from([identity(env)]);
    let mut current = env.to_path_buf();

    while let Some(parent) = find_parent(&current) {
        if !seen.insert(identity(&parent)) {
            tracing::warn!(
                "Environment hierarchy loops back to {}; ignoring further ancestors",
                parent.display()
            );
            break;
        }
        if chain.len() == MAX_DEPTH {
            tracing::warn!(
                "Environment hierarchy deeper than {} levels; ignoring further ancestors",
                MAX_DEPTH
            );
            break;
        }
        chain.push(parent.clone());
        current = parent;
    }

    chain
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn make_env(root: &Path, name: &str, parent: Option<&Path>) -> PathBuf {
        let env = root.join(name);
        fs::create_dir_all(&env).unwrap();
        let mut cfg = PyvenvCfg::parse("home = /usr/bin\nversion_info = 3.12.4\n");
        if let Some(parent) = parent {
            cfg.set_parent(parent);
        }
        cfg.save(&env.join("pyvenv.cfg")).unwrap();
        env
    }

    #[test]
    fn standalone_env_has_no_parent() {
        let temp = TempDir::new().unwrap();
        let env = make_env(temp.path(), "solo", None);
        assert_eq!(find_parent(&env), None);
        assert!(parent_chain(&env).is_empty());
    }

    #[test]
    fn chain_is_nearest_first() {
        let temp = TempDir::new().unwrap();
        let base = make_env(temp.path(), "base", None);
        let mid = make_env(temp.path(), "mid", Some(&base));
        let leaf = make_env(temp.path(), "leaf", Some(&mid));

        assert_eq!(parent_chain(&leaf), vec![mid, base]);
    }

    #[test]
    fn missing_parent_ends_chain() {
        let temp = TempDir::new().unwrap();
        let leaf = make_env(temp.path(), "leaf", Some(&temp.path().join("gone")));
        assert!(parent_chain(&leaf).is_empty());
    }

    #[test]
    fn falls_back_to_activate_script() {
        let temp = TempDir::new().unwrap();
        let base = make_env(temp.path(), "base", None);
        let leaf = make_env(temp.path(), "leaf", None);
        let bin = VenvLayout::new(&leaf).bin_dir();
        fs::create_dir_all(&bin).unwrap();
        fs::write(
            bin.join("activate"),
            format!("PARENT_VENV_PATH=\"{}\"\n", base.display()),
        )
        .unwrap();

        assert_eq!(find_parent(&leaf), Some(base));
    }

    #[test]
    fn cycles_are_cut() {
        let temp = TempDir::new().unwrap();
        let a = temp.path().join("a");
        let b = make_env(temp.path(), "b", Some(&a));
        make_env(temp.path(), "a", Some(&b));

        let chain = parent_chain(&a);
        assert_eq!(chain, vec![b]);
    }

    #[test]
    fn deep_chains_stop_at_max_depth() {
        let temp = TempDir::new().unwrap();
        let mut envs = vec![make_env(temp.path(), "env0", None)];
        for level in 1..=MAX_DEPTH + 1 {
            let parent = envs[level - 1].clone();
            envs.push(make_env(temp.path(), &format!("env{level}"), Some(&parent)));
        }
        let leaf = &envs[MAX_DEPTH + 1];

        let chain = parent_chain(leaf);

        assert_eq!(chain.len(), MAX_DEPTH);
        assert_eq!(chain[0], envs[MAX_DEPTH]);
        assert_eq!(chain[MAX_DEPTH - 1], envs[1]);
    }

    #[test]
    fn parse_parent_line_ignores_empty_value() {
        assert_eq!(parse_parent_line("PARENT_VENV_PATH=\"\""), None);
        assert_eq!(
            parse_parent_line("x\nPARENT_VENV_PATH=\"/envs/p\"\ny"),
            Some(PathBuf::from("/envs/p"))
        );
    }
}
