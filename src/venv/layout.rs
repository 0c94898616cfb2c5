//! On-disk layout of a virtual environment.

use std::fs;
use std::path::{Path, PathBuf};

use crate::shell::is_windows;

/// Paths inside a virtual environment.
///
/// Unix environments keep scripts in `bin/` and packages in
/// `lib/pythonX.Y/site-packages`; Windows ones use `Scripts\` and
/// `Lib\site-packages`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VenvLayout {
    root: PathBuf,
    windows: bool,
}

impl VenvLayout {
    /// Layout for the current platform.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_platform(root, is_windows())
    }

    /// Layout with an explicit platform convention.
    pub fn with_platform(root: impl Into<PathBuf>, windows: bool) -> Self {
        Self {
            root: root.into(),
            windows,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn is_windows(&self) -> bool {
        self.windows
    }

    pub fn pyvenv_cfg(&self) -> PathBuf {
        self.root.join("pyvenv.cfg")
    }

    /// Directory holding executables and activation scripts.
    pub fn bin_dir(&self) -> PathBuf {
        if self.windows {
            self.root.join("Scripts")
        } else {
            self.root.join("bin")
        }
    }

    pub fn python(&self) -> PathBuf {
        if self.windows {
            self.bin_dir().join("python.exe")
        } else {
            self.bin_dir().join("python")
        }
    }

    /// The platform's primary activation script.
    pub fn activation_script(&self) -> PathBuf {
        if self.windows {
            self.bin_dir().join("activate.bat")
        } else {
            self.shell_activate()
        }
    }

    /// POSIX shell activation script (present on every platform with uv).
    pub fn shell_activate(&self) -> PathBuf {
        self.bin_dir().join("activate")
    }

    pub fn activate_this(&self) -> PathBuf {
        self.bin_dir().join("activate_this.py")
    }

    pub fn activate_bat(&self) -> PathBuf {
        self.bin_dir().join("activate.bat")
    }

    pub fn deactivate_bat(&self) -> PathBuf {
        self.bin_dir().join("deactivate.bat")
    }

    /// An environment is valid when it carries a `pyvenv.cfg`.
    pub fn is_valid(&self) -> bool {
        self.pyvenv_cfg().is_file()
    }

    /// Glob (relative to the root) matching site-packages directories,
    /// as written into activation scripts.
    pub fn site_packages_glob(&self) -> &'static str {
        if self.windows {
            "Lib/site-packages"
        } else {
            "lib/python*/site-packages"
        }
    }

    /// Existing site-packages directories, sorted.
    pub fn site_packages_dirs(&self) -> Vec<PathBuf> {
        if self.windows {
            let dir = self.root.join("Lib").join("site-packages");
            return if dir.is_dir() { vec![dir] } else { Vec::new() };
        }

        let Ok(entries) = fs::read_dir(self.root.join("lib")) else {
            return Vec::new();
        };

        let mut dirs: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_name().to_string_lossy().starts_with("python"))
            .map(|entry| entry.path().join("site-packages"))
            .filter(|path| path.is_dir())
            .collect();
        dirs.sort();
        dirs
    }

    /// Command the user runs to activate the environment.
    pub fn activation_hint(&self) -> String {
        if self.windows {
            format!("{}", self.activate_bat().display())
        } else {
            format!("source {}", self.shell_activate().display())
        }
    }
}

/// Render a path for embedding in scripts: always forward slashes.
pub fn script_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn unix_paths() {
        let layout = VenvLayout::with_platform("/envs/app", false);
        assert_eq!(layout.python(), PathBuf::from("/envs/app/bin/python"));
        assert_eq!(
            layout.activation_script(),
            PathBuf::from("/envs/app/bin/activate")
        );
        assert_eq!(layout.site_packages_glob(), "lib/python*/site-packages");
        assert_eq!(layout.activation_hint(), "source /envs/app/bin/activate");
    }

    #[test]
    fn windows_paths() {
        let layout = VenvLayout::with_platform("C:/envs/app", true);
        assert!(layout.python().ends_with("Scripts/python.exe"));
        assert!(layout.activation_script().ends_with("Scripts/activate.bat"));
        assert_eq!(layout.site_packages_glob(), "Lib/site-packages");
        assert!(layout.activation_hint().contains("activate.bat"));
    }

    #[test]
    fn valid_only_with_pyvenv_cfg() {
        let temp = TempDir::new().unwrap();
        let layout = VenvLayout::with_platform(temp.path(), false);
        assert!(!layout.is_valid());

        fs::write(temp.path().join("pyvenv.cfg"), "home = /usr/bin\n").unwrap();
        assert!(layout.is_valid());
    }

    #[test]
    fn finds_unix_site_packages_sorted() {
        let temp = TempDir::new().unwrap();
        for version in ["python3.12", "python3.11"] {
            fs::create_dir_all(temp.path().join("lib").join(version).join("site-packages"))
                .unwrap();
        }
        fs::create_dir_all(temp.path().join("lib").join("other")).unwrap();

        let dirs = VenvLayout::with_platform(temp.path(), false).site_packages_dirs();
        assert_eq!(dirs.len(), 2);
        assert!(dirs[0].to_string_lossy().contains("python3.11"));
        assert!(dirs[1].to_string_lossy().contains("python3.12"));
    }

    #[test]
    fn finds_windows_site_packages() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("Lib").join("site-packages")).unwrap();

        let dirs = VenvLayout::with_platform(temp.path(), true).site_packages_dirs();
        assert_eq!(dirs, vec![temp.path().join("Lib").join("site-packages")]);
    }

    #[test]
    fn missing_lib_dir_has_no_site_packages() {
        let temp = TempDir::new().unwrap();
        assert!(VenvLayout::with_platform(temp.path(), false)
            .site_packages_dirs()
            .is_empty());
    }

    #[test]
    fn script_path_uses_forward_slashes() {
        assert_eq!(
            script_path(Path::new(r"C:\envs\parent")),
            "C:/envs/parent"
        );
    }
}
