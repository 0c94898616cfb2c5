//! Requirement strings as typed on the command line.

use regex::Regex;
use std::sync::LazyLock;

use super::name::normalize_name;
use super::version::SpecifierSet;

static REQUIREMENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z0-9](?:[A-Za-z0-9._-]*[A-Za-z0-9])?)\s*(?:\[([^\]]*)\])?\s*(.*)$")
        .expect("requirement regex is valid")
});

/// A named requirement such as `requests[socks]>=2.31 ; python_version >= "3.8"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    /// The text exactly as given.
    pub raw: String,
    /// Normalised distribution name.
    pub name: String,
    /// Constraint text with whitespace removed (`""` for none).
    pub constraint: String,
    /// Parsed constraint.
    pub specifiers: SpecifierSet,
}

impl Requirement {
    /// Parse a requirement.
    ///
    /// Returns `None` for things that cannot be compared against an
    /// installed version: direct references (`name @ url`), URLs, archives
    /// and local paths, or text that does not parse.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || is_direct_reference(trimmed) {
            return None;
        }

        // Environment markers do not affect what is installed here.
        let without_markers = trimmed.split(';').next().unwrap_or_default().trim();

        let caps = REQUIREMENT_RE.captures(without_markers)?;
        let name = normalize_name(&caps[1]);
        let constraint: String = caps
            .get(3)
            .map(|m| m.as_str())
            .unwrap_or_default()
            .trim()
            .trim_start_matches('(')
            .trim_end_matches(')')
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();

        let specifiers = constraint.parse().ok()?;

        Some(Self {
            raw: raw.to_string(),
            name,
            constraint,
            specifiers,
        })
    }

    /// Whether an installed `version` satisfies this requirement.
    pub fn is_satisfied_by(&self, version: &str) -> bool {
        self.specifiers.contains(version)
    }

    /// The constraint for display: the text, or `any version`.
    pub fn constraint_display(&self) -> &str {
        if self.constraint.is_empty() {
            "any version"
        } else {
            &self.constraint
        }
    }
}

fn is_direct_reference(spec: &str) -> bool {
    const ARCHIVE_SUFFIXES: [&str; 5] = [".whl", ".tar.gz", ".zip", ".tar.bz2", ".tgz"];

    spec.contains('@')
        || spec.contains("://")
        || spec.starts_with('.')
        || spec.starts_with('/')
        || spec.starts_with('~')
        || spec.contains('\\')
        || ARCHIVE_SUFFIXES.iter().any(|suffix| spec.ends_with(suffix))
}

/// Name used to match a request against installed packages.
///
/// `name @ url` yields `name`. Falls back to normalising the whole text for
/// requests that do not parse, e.g. `huv pip uninstall` arguments with
/// unusual spelling.
pub fn request_name(raw: &str) -> String {
    if let Some(req) = Requirement::parse(raw) {
        return req.name;
    }
    if let Some((name, _)) = raw.split_once('@') {
        if let Some(caps) = REQUIREMENT_RE.captures(name.trim()) {
            if caps.get(3).is_none_or(|m| m.as_str().trim().is_empty()) {
                return normalize_name(&caps[1]);
            }
        }
    }
    normalize_name(raw)
}
