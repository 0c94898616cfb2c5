//! Reading `uv pip install --dry-run` output.

use super::name::normalize_name;

/// One package a dry run would install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyEntry {
    /// Normalised distribution name.
    pub name: String,
    pub version: String,
    /// URL or path the distribution comes from, for `(from ...)` entries.
    pub source: Option<String>,
}

impl DependencyEntry {
    /// Built from a URL or local path rather than resolved from an index.
    pub fn is_direct(&self) -> bool {
        self.source.is_some()
    }
}

/// Packages a dry run would install, in the order uv reported them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyTree {
    entries: Vec<DependencyEntry>,
}

impl DependencyTree {
    /// Add `name==version` unless `name` is already present.
    pub fn push(&mut self, name: &str, version: &str) {
        self.push_entry(name, version, None);
    }

    /// Add an entry with an optional direct-reference source.
    pub fn push_entry(&mut self, name: &str, version: &str, source: Option<&str>) {
        let name = normalize_name(name);
        if !self.contains(&name) {
            self.entries.push(DependencyEntry {
                name,
                version: version.to_string(),
                source: source.map(str::to_string),
            });
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|e| e.name == name)
    }

    pub fn version(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.version.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = &DependencyEntry> {
        self.entries.iter()
    }

    /// `(name, version)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|e| (e.name.as_str(), e.version.as_str()))
    }
}

impl<'a> FromIterator<(&'a str, &'a str)> for DependencyTree {
    fn from_iter<I: IntoIterator<Item = (&'a str, &'a str)>>(iter: I) -> Self {
        let mut tree = Self::default();
        for (name, version) in iter {
            tree.push(name, version);
        }
        tree
    }
}

/// Split `0.1.0 (from file:///src/pkg)` into version and source.
fn split_source(text: &str) -> (&str, Option<&str>) {
    match text.split_once(char::is_whitespace) {
        Some((version, rest)) => {
            let source = rest
                .trim()
                .strip_prefix("(from")
                .map(|s| s.trim().trim_end_matches(')').trim())
                .filter(|s| !s.is_empty());
            (version, source)
        }
        None => (text, None),
    }
}

/// Collect every ` + name==version` line, keeping the `(from ...)` source
/// of packages built from a URL or path.
pub fn parse_dry_run(output: &str) -> DependencyTree {
    let mut tree = DependencyTree::default();

    for line in output.lines() {
        let Some(rest) = line.trim().strip_prefix('+') else {
            continue;
        };
        let Some((name, version)) = rest.trim().split_once("==") else {
            continue;
        };
        let (version, source) = split_source(version.trim());
        let name = name.trim();
        if !name.is_empty() && !version.is_empty() {
            tree.push_entry(name, version, source);
        }
    }

    tree
}

#[cfg(test)]
mod tests {
    use super::*;

    const UV_OUTPUT: &str = "Resolved 5 packages in 12ms
Would download 3 packages
Would install 3 packages
 + blinker==1.8.2
 + Flask==3.0.3
 + itsdangerous==2.2.0
 - werkzeug==2.0.0
";

    #[test]
    fn reads_added_packages_only() {
        let tree = parse_dry_run(UV_OUTPUT);

        assert_eq!(tree.len(), 3);
        assert_eq!(tree.version("flask"), Some("3.0.3"));
        assert!(!tree.contains("werkzeug"));
    }

    #[test]
    fn keeps_report_order_and_dedupes() {
        let tree = parse_dry_run(" + b==1\n + a==2\n + B==9\n");
        let names: Vec<&str> = tree.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["b", "a"]);
        assert_eq!(tree.version("b"), Some("1"));
    }

    #[test]
    fn direct_references_keep_their_source() {
        let tree = parse_dry_run(
            " + mypkg==0.1.0 (from file:///tmp/mypkg)\n + six==1.16.0\n + pkg==1.0 (from https://example.com/pkg-1.0.tar.gz)\n",
        );

        let entries: Vec<&DependencyEntry> = tree.entries().collect();
        assert_eq!(entries[0].version, "0.1.0");
        assert_eq!(entries[0].source.as_deref(), Some("file:///tmp/mypkg"));
        assert!(!entries[1].is_direct());
        assert_eq!(tree.version("pkg"), Some("1.0"));
        assert_eq!(
            entries[2].source.as_deref(),
            Some("https://example.com/pkg-1.0.tar.gz")
        );
    }

    #[test]
    fn ignores_noise() {
        assert!(parse_dry_run("error: no solution\n+ broken\n+ ==1.0\n").is_empty());
        assert!(parse_dry_run("").is_empty());
    }
}
