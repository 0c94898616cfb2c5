//! Reading and updating `pyvenv.cfg`.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Key under which the parent environment is recorded.
pub const PARENT_KEY: &str = "huv_parent";

/// A `pyvenv.cfg` file, kept line by line so rewrites preserve the rest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PyvenvCfg {
    lines: Vec<String>,
}

impl PyvenvCfg {
    pub fn parse(content: &str) -> Self {
        Self {
            lines: content.lines().map(String::from).collect(),
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        Ok(Self::parse(&fs::read_to_string(path)?))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, self.render())?;
        Ok(())
    }

    pub fn render(&self) -> String {
        let mut out = self.lines.join("\n");
        out.push('\n');
        out
    }

    fn split_line(line: &str) -> Option<(&str, &str)> {
        let (key, value) = line.split_once('=')?;
        Some((key.trim(), value.trim()))
    }

    /// Value of the first line with `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.lines
            .iter()
            .filter_map(|line| Self::split_line(line))
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v)
    }

    /// Set `key`, replacing an existing line or appending a new one.
    pub fn set(&mut self, key: &str, value: &str) {
        let rendered = format!("{key} = {value}");
        let existing = self
            .lines
            .iter()
            .position(|line| Self::split_line(line).is_some_and(|(k, _)| k == key));

        match existing {
            Some(index) => self.lines[index] = rendered,
            None => self.lines.push(rendered),
        }
    }

    /// `MAJOR.MINOR` of the environment's interpreter.
    ///
    /// uv and virtualenv write `version_info`; the stdlib `venv` module
    /// writes `version`.
    pub fn python_version(&self) -> Option<String> {
        let raw = self.get("version_info").or_else(|| self.get("version"))?;
        let mut parts = raw.split('.');
        let major = parts.next()?.trim();
        let minor = parts.next()?.trim();

        let is_number = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit());
        if is_number(major) && is_number(minor) {
            Some(format!("{major}.{minor}"))
        } else {
            None
        }
    }

    /// Recorded parent environment.
    pub fn parent(&self) -> Option<PathBuf> {
        self.get(PARENT_KEY)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
    }

    pub fn set_parent(&mut self, parent: &Path) {
        self.set(PARENT_KEY, &super::layout::script_path(parent));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const UV_CFG: &str = "home = /usr/local/bin\nimplementation = CPython\nuv = 0.4.0\nversion_info = 3.12.4\ninclude-system-site-packages = false\n";

    #[test]
    fn reads_keys() {
        let cfg = PyvenvCfg::parse(UV_CFG);
        assert_eq!(cfg.get("home"), Some("/usr/local/bin"));
        assert_eq!(cfg.get("include-system-site-packages"), Some("false"));
        assert_eq!(cfg.get("missing"), None);
    }

    #[test]
    fn python_version_from_version_info() {
        assert_eq!(
            PyvenvCfg::parse(UV_CFG).python_version(),
            Some("3.12".to_string())
        );
    }

    #[test]
    fn python_version_from_stdlib_version_key() {
        let cfg = PyvenvCfg::parse("home = /usr/bin\nversion = 3.11.9\n");
        assert_eq!(cfg.python_version(), Some("3.11".to_string()));
    }

    #[test]
    fn python_version_from_virtualenv_format() {
        let cfg = PyvenvCfg::parse("version_info = 3.10.14.final.0\n");
        assert_eq!(cfg.python_version(), Some("3.10".to_string()));
    }

    #[test]
    fn python_version_missing() {
        assert_eq!(PyvenvCfg::parse("home = /usr/bin\n").python_version(), None);
        assert_eq!(PyvenvCfg::parse("version = three\n").python_version(), None);
    }

    #[test]
    fn set_appends_new_key_and_preserves_others() {
        let mut cfg = PyvenvCfg::parse(UV_CFG);
        cfg.set_parent(Path::new("/envs/base"));

        let rendered = cfg.render();
        assert!(rendered.starts_with("home = /usr/local/bin\n"));
        assert!(rendered.ends_with("huv_parent = /envs/base\n"));
        assert_eq!(cfg.parent(), Some(PathBuf::from("/envs/base")));
    }

    #[test]
    fn set_replaces_existing_key() {
        let mut cfg = PyvenvCfg::parse("huv_parent = /old\nhome = /usr/bin\n");
        cfg.set(PARENT_KEY, "/new");

        assert_eq!(cfg.render(), "huv_parent = /new\nhome = /usr/bin\n");
    }

    #[test]
    fn save_and_load() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("pyvenv.cfg");
        let mut cfg = PyvenvCfg::parse(UV_CFG);
        cfg.set_parent(Path::new("/envs/base"));
        cfg.save(&path).unwrap();

        let loaded = PyvenvCfg::load(&path).unwrap();
        assert_eq!(loaded.parent(), Some(PathBuf::from("/envs/base")));
        assert_eq!(loaded.python_version(), Some("3.12".to_string()));
    }
}
