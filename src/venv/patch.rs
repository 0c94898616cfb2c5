//! Rewriting activation artifacts to expose ancestor site-packages.
//!
//! Every block huv writes is wrapped in begin/end marker comments so that
//! patching an already patched file replaces the block instead of adding a
//! second one.

use regex::{NoExpand, Regex};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use super::layout::{script_path, VenvLayout};
use super::pyvenv_cfg::PyvenvCfg;
use crate::error::{HuvError, Result};

const SH_BEGIN: &str = "# Hierarchical environment support - include parent libraries";
const SH_END: &str = "# End hierarchical environment support";
const SH_RESTORE_MARKER: &str = "PYTHONPATH=\"$_OLD_VIRTUAL_PYTHONPATH\"";
const HASH_LINE: &str = "hash -r 2>/dev/null || true";

const PY_BEGIN: &str = "# huv: begin hierarchy";
const PY_END: &str = "# huv: end hierarchy";

const BAT_BEGIN: &str = "@REM huv: begin hierarchy";
const BAT_END: &str = "@REM huv: end hierarchy";

/// Name of the link file written into child site-packages.
pub const PTH_FILE: &str = "_huv_parents.pth";

static PY_SYSPATH_SECTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)# add the virtual environments libraries.*?sys\.path\[:\] = [^\n]*\n?")
        .expect("activate_this regex is valid")
});

static PYTHONHOME_RESTORE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*unset _OLD_VIRTUAL_PYTHONHOME[ \t]*\r?\n[ \t]*fi[ \t]*\r?\n")
        .expect("PYTHONHOME restore regex is valid")
});

static DEACTIVATE_FN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^deactivate\s*\(\)\s*\{[ \t]*\r?\n").expect("deactivate regex is valid")
});

static BAT_END_LABEL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?mi)^:END\b").expect("batch label regex is valid"));

/// What to write for one child environment.
#[derive(Debug, Clone)]
pub struct HierarchySpec {
    /// Ancestors, nearest first. The first entry is the direct parent.
    pub chain: Vec<PathBuf>,
    /// Also write a `.pth` link file into the child's site-packages.
    pub write_pth: bool,
}

impl HierarchySpec {
    pub fn parent(&self) -> Option<&Path> {
        self.chain.first().map(PathBuf::as_path)
    }
}

/// Outcome of [`setup_hierarchy`].
#[derive(Debug, Clone, Default)]
pub struct HierarchyReport {
    /// Files that were rewritten or created.
    pub patched: Vec<PathBuf>,
    /// Non-fatal problems worth telling the user about.
    pub warnings: Vec<String>,
}

/// Record the hierarchy in `child` and patch every activation artifact.
pub fn setup_hierarchy(child: &VenvLayout, spec: &HierarchySpec) -> Result<HierarchyReport> {
    let parent = spec.parent().ok_or_else(|| HuvError::HierarchySetup {
        message: "no parent environment given".to_string(),
    })?;

    let mut report = HierarchyReport::default();

    let cfg_path = child.pyvenv_cfg();
    let mut cfg = PyvenvCfg::load(&cfg_path).map_err(|e| HuvError::HierarchySetup {
        message: format!("cannot read {}: {}", cfg_path.display(), e),
    })?;
    cfg.set_parent(parent);
    cfg.save(&cfg_path)?;
    report.patched.push(cfg_path);

    let activate = child.shell_activate();
    if activate.is_file() {
        rewrite(&activate, |content| patch_shell_activate(content, child, &spec.chain))?;
        report.patched.push(activate);
    } else if !child.is_windows() {
        report
            .warnings
            .push(format!("Activate script not found at {}", activate.display()));
    }

    let activate_this = child.activate_this();
    if activate_this.is_file() {
        rewrite(&activate_this, |content| {
            patch_activate_this(content, child, &spec.chain)
        })?;
        report.patched.push(activate_this);
    } else {
        report.warnings.push(format!(
            "activate_this.py not found at {}",
            activate_this.display()
        ));
    }

    let activate_bat = child.activate_bat();
    if activate_bat.is_file() {
        rewrite(&activate_bat, |content| patch_activate_bat(content, &spec.chain))?;
        report.patched.push(activate_bat);
    }

    let deactivate_bat = child.deactivate_bat();
    if deactivate_bat.is_file() {
        rewrite(&deactivate_bat, patch_deactivate_bat)?;
        report.patched.push(deactivate_bat);
    }

    if spec.write_pth {
        let contents = pth_contents(&spec.chain, child.is_windows());
        for site_packages in child.site_packages_dirs() {
            let pth = site_packages.join(PTH_FILE);
            fs::write(&pth, &contents)?;
            report.patched.push(pth);
        }
    }

    for path in &report.patched {
        tracing::debug!("Patched {}", path.display());
    }

    Ok(report)
}

fn rewrite<F>(path: &Path, patch: F) -> Result<()>
where
    F: FnOnce(&str) -> String,
{
    let content = fs::read_to_string(path)?;
    let patched = patch(&content);
    if patched != content {
        fs::write(path, patched)?;
    }
    Ok(())
}

/// Replace the region between `begin` and `end` (inclusive, with the end
/// line's newline) by `block`. `None` when the markers are absent.
fn replace_marked_block(content: &str, begin: &str, end: &str, block: &str) -> Option<String> {
    let start = content.find(begin)?;
    let end_at = start + content[start..].find(end)?;
    let mut stop = end_at + end.len();
    if content[stop..].starts_with("\r\n") {
        stop += 2;
    } else if content[stop..].starts_with('\n') {
        stop += 1;
    }

    let mut out = String::with_capacity(content.len() + block.len());
    out.push_str(&content[..start]);
    out.push_str(block);
    out.push_str(&content[stop..]);
    Some(out)
}

fn shell_quote(path: &Path) -> String {
    format!("\"{}\"", script_path(path).replace('"', "\\\""))
}

fn shell_restore_block() -> String {
    [
        "    if ! [ -z \"${_OLD_VIRTUAL_PYTHONPATH+_}\" ] ; then",
        "        PYTHONPATH=\"$_OLD_VIRTUAL_PYTHONPATH\"",
        "        export PYTHONPATH",
        "        unset _OLD_VIRTUAL_PYTHONPATH",
        "    elif ! [ -z \"${_HUV_PYTHONPATH_SET+_}\" ] ; then",
        "        unset PYTHONPATH",
        "    fi",
        "    unset _HUV_PYTHONPATH_SET",
        "",
    ]
    .join("\n")
}

fn shell_hierarchy_block(child: &VenvLayout, chain: &[PathBuf]) -> String {
    let glob = child.site_packages_glob();
    let separator = if child.is_windows() { ";" } else { ":" };
    let parent = chain.first().map(|p| script_path(p)).unwrap_or_default();

    let mut sources = vec![format!("\"$PARENT_VENV_PATH\"/{glob}")];
    sources.extend(
        chain
            .iter()
            .skip(1)
            .map(|ancestor| format!("{}/{glob}", shell_quote(ancestor))),
    );

    format!(
        r#"{SH_BEGIN}
PARENT_VENV_PATH="{parent}"
if [ -d "$PARENT_VENV_PATH" ]; then
    # Store old PYTHONPATH
    if ! [ -z "${{PYTHONPATH+_}}" ] ; then
        _OLD_VIRTUAL_PYTHONPATH="$PYTHONPATH"
    fi

    # Append ancestor site-packages to PYTHONPATH, nearest ancestor first
    for parent_site in {sources}; do
        if [ -d "$parent_site" ]; then
            if [ -z "${{PYTHONPATH:-}}" ]; then
                PYTHONPATH="$parent_site"
            else
                PYTHONPATH="$PYTHONPATH{separator}$parent_site"
            fi
            _HUV_PYTHONPATH_SET=1
        fi
    done
    if [ ! -z "${{PYTHONPATH+_}}" ]; then
        export PYTHONPATH
    fi
fi
{SH_END}
"#,
        sources = sources.join(" "),
    )
}

/// Patch the POSIX `activate` script.
pub fn patch_shell_activate(content: &str, child: &VenvLayout, chain: &[PathBuf]) -> String {
    let mut content = content.to_string();

    if !content.contains(SH_RESTORE_MARKER) {
        let restore = shell_restore_block();
        if let Some(m) = PYTHONHOME_RESTORE_RE.find(&content) {
            content.insert_str(m.end(), &restore);
        } else if let Some(m) = DEACTIVATE_FN_RE.find(&content) {
            content.insert_str(m.end(), &restore);
        }
    }

    let block = shell_hierarchy_block(child, chain);
    if let Some(replaced) = replace_marked_block(&content, SH_BEGIN, SH_END, &block) {
        return replaced;
    }

    match content.rfind(HASH_LINE) {
        Some(at) => {
            let mut out = content[..at].to_string();
            out.push('\n');
            out.push_str(&block);
            out.push('\n');
            out.push_str(&content[at..]);
            out
        }
        None => {
            if !content.ends_with('\n') && !content.is_empty() {
                content.push('\n');
            }
            content.push('\n');
            content.push_str(&block);
            content
        }
    }
}

fn py_quote(path: &Path) -> String {
    format!(
        "\"{}\"",
        script_path(path).replace('\\', "\\\\").replace('"', "\\\"")
    )
}

fn python_block(child: &VenvLayout, chain: &[PathBuf]) -> String {
    let pattern_parts = if child.is_windows() {
        r#""Lib", "site-packages""#
    } else {
        r#""lib", "python*", "site-packages""#
    };
    let parent = chain.first().map(|p| py_quote(p)).unwrap_or_else(|| "\"\"".into());
    let ancestors: Vec<String> = chain.iter().skip(1).map(|p| py_quote(p)).collect();
    let ancestor_list = std::iter::once("parent_venv_path".to_string())
        .chain(ancestors)
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        r#"{PY_BEGIN}
# add the virtual environments libraries to the host python import mechanism
import glob
prev_length = len(sys.path)

# Add child environment libraries first (highest precedence)
child_lib_pattern = os.path.join(bin_dir, "..", {pattern_parts})
for child_site_packages in glob.glob(child_lib_pattern):
    if os.path.exists(child_site_packages):
        site.addsitedir(os.path.realpath(child_site_packages))

# Add ancestor environment libraries (lower precedence), nearest first
parent_venv_path = {parent}
for ancestor_venv_path in [{ancestor_list}]:
    if os.path.exists(ancestor_venv_path):
        parent_lib_pattern = os.path.join(ancestor_venv_path, {pattern_parts})
        for parent_site_packages in glob.glob(parent_lib_pattern):
            site.addsitedir(parent_site_packages)

# Move new paths to front for proper precedence (child first, then parents)
new_paths = sys.path[prev_length:]
sys.path[prev_length:] = []
sys.path[:0] = new_paths
{PY_END}
"#
    )
}

/// Patch `activate_this.py`.
pub fn patch_activate_this(content: &str, child: &VenvLayout, chain: &[PathBuf]) -> String {
    let block = python_block(child, chain);

    if let Some(replaced) = replace_marked_block(content, PY_BEGIN, PY_END, &block) {
        return replaced;
    }

    if PY_SYSPATH_SECTION_RE.is_match(content) {
        return PY_SYSPATH_SECTION_RE
            .replace(content, NoExpand(&block))
            .into_owned();
    }

    let mut out = content.to_string();
    if !out.ends_with('\n') && !out.is_empty() {
        out.push('\n');
    }
    out.push('\n');
    out.push_str(&block);
    out
}

fn bat_block(chain: &[PathBuf]) -> String {
    let parent = chain.first().map(|p| script_path(p)).unwrap_or_default();
    let mut lines = vec![
        BAT_BEGIN.to_string(),
        format!("@set \"PARENT_VENV_PATH={parent}\""),
        "@if defined PYTHONPATH @set \"_OLD_VIRTUAL_PYTHONPATH=%PYTHONPATH%\"".to_string(),
    ];
    for ancestor in chain {
        let site = format!("{}/Lib/site-packages", script_path(ancestor));
        lines.push(format!(
            "@if exist \"{site}\" @if defined PYTHONPATH (@set \"PYTHONPATH=%PYTHONPATH%;{site}\") else (@set \"PYTHONPATH={site}\")"
        ));
    }
    lines.push(BAT_END.to_string());
    lines.push(String::new());
    lines.join("\r\n")
}

/// Patch `activate.bat`.
pub fn patch_activate_bat(content: &str, chain: &[PathBuf]) -> String {
    let block = bat_block(chain);

    if let Some(replaced) = replace_marked_block(content, BAT_BEGIN, BAT_END, &block) {
        return replaced;
    }

    if let Some(m) = BAT_END_LABEL_RE.find(content) {
        let mut out = content[..m.start()].to_string();
        out.push_str(&block);
        out.push_str(&content[m.start()..]);
        return out;
    }

    let mut out = content.to_string();
    if !out.ends_with('\n') && !out.is_empty() {
        out.push_str("\r\n");
    }
    out.push_str(&block);
    out
}

/// Patch `deactivate.bat` to restore the saved `PYTHONPATH`.
pub fn patch_deactivate_bat(content: &str) -> String {
    let block = [
        BAT_BEGIN,
        "@if defined _OLD_VIRTUAL_PYTHONPATH (@set \"PYTHONPATH=%_OLD_VIRTUAL_PYTHONPATH%\") else (@set PYTHONPATH=)",
        "@set _OLD_VIRTUAL_PYTHONPATH=",
        BAT_END,
        "",
    ]
    .join("\r\n");

    if let Some(replaced) = replace_marked_block(content, BAT_BEGIN, BAT_END, &block) {
        return replaced;
    }

    format!("{block}{content}")
}

/// Contents of the `.pth` link file: one existing ancestor site-packages
/// directory per line, nearest ancestor first.
pub fn pth_contents(chain: &[PathBuf], windows: bool) -> String {
    chain
        .iter()
        .flat_map(|ancestor| VenvLayout::with_platform(ancestor, windows).site_packages_dirs())
        .map(|dir| format!("{}\n", script_path(&dir)))
        .collect()
}
