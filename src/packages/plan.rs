//! Deciding what actually reaches uv.

use super::dry_run::DependencyTree;
use super::inventory::PackageMap;
use super::requirement::{request_name, Requirement};

/// A package left out because an ancestor already provides it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skipped {
    pub name: String,
    /// Version found in the ancestor.
    pub version: String,
    /// Constraint the version was checked against, for display.
    pub constraint: String,
    /// Named on the command line (as opposed to pulled in as a dependency).
    pub explicit: bool,
}

/// An explicit request the ancestor's version does not satisfy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
    pub name: String,
    pub parent_version: String,
    pub required: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallPlan {
    /// Requests passed to uv, explicit ones as written, dependencies pinned.
    pub to_install: Vec<String>,
    pub skipped: Vec<Skipped>,
    pub conflicts: Vec<Conflict>,
    /// Planned without a dependency tree.
    pub basic: bool,
    /// `--no-deps` must be passed.
    pub no_deps: bool,
}

impl InstallPlan {
    pub fn is_empty(&self) -> bool {
        self.to_install.is_empty()
    }

    /// Arguments for `uv pip install`.
    pub fn install_args(&self, pip_args: &[String]) -> Vec<String> {
        let mut args = self.to_install.clone();
        if self.no_deps && !pip_args.iter().any(|a| a == "--no-deps") {
            args.push("--no-deps".to_string());
        }
        args.extend(pip_args.iter().cloned());
        args
    }

    pub fn explicit_skips(&self) -> impl Iterator<Item = &Skipped> {
        self.skipped.iter().filter(|s| s.explicit)
    }

    pub fn dependency_skips(&self) -> impl Iterator<Item = &Skipped> {
        self.skipped.iter().filter(|s| !s.explicit)
    }
}

/// Outcome of checking one explicit request against the ancestors.
enum Check {
    Provided(Skipped),
    Conflicting(Conflict),
    Missing,
}

fn check_request(raw: &str, ancestors: &PackageMap) -> Check {
    let Some(req) = Requirement::parse(raw) else {
        return Check::Missing;
    };
    let Some(version) = ancestors.get(&req.name) else {
        return Check::Missing;
    };

    if req.is_satisfied_by(version) {
        Check::Provided(Skipped {
            name: req.name.clone(),
            version: version.clone(),
            constraint: req.constraint_display().to_string(),
            explicit: true,
        })
    } else {
        Check::Conflicting(Conflict {
            name: req.name.clone(),
            parent_version: version.clone(),
            required: req.constraint_display().to_string(),
        })
    }
}

/// Plan `huv pip install <requests>` given what ancestors provide and what
/// uv would install.
///
/// An empty `tree` means the dependency analysis was unavailable: only the
/// explicit requests are checked and `--no-deps` is never used.
pub fn plan_install(
    requests: &[String],
    ancestors: &PackageMap,
    tree: &DependencyTree,
    no_deps_on_skip: bool,
) -> InstallPlan {
    let mut plan = InstallPlan {
        basic: tree.is_empty(),
        ..Default::default()
    };

    for raw in requests {
        match check_request(raw, ancestors) {
            Check::Provided(skipped) => plan.skipped.push(skipped),
            Check::Conflicting(conflict) => {
                plan.conflicts.push(conflict);
                plan.to_install.push(raw.clone());
            }
            Check::Missing => plan.to_install.push(raw.clone()),
        }
    }

    if plan.basic {
        return plan;
    }

    let explicit: Vec<String> = requests.iter().map(|r| request_name(r)).collect();
    for entry in tree.entries() {
        // URL and path builds are installed by the request that names them,
        // whether on the package list or through `-e`/`-r` options.
        if entry.is_direct() || explicit.contains(&entry.name) {
            continue;
        }
        match ancestors.get(&entry.name) {
            Some(parent_version) => plan.skipped.push(Skipped {
                name: entry.name.clone(),
                version: parent_version.clone(),
                constraint: "any version".to_string(),
                explicit: false,
            }),
            None => plan
                .to_install
                .push(format!("{}=={}", entry.name, entry.version)),
        }
    }

    plan.no_deps = no_deps_on_skip && !plan.skipped.is_empty();
    plan
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UninstallPlan {
    /// Requests passed to uv.
    pub remove: Vec<String>,
    /// Requests not installed in the active environment.
    pub not_found: Vec<String>,
    /// Removed packages an ancestor still provides, with its version.
    pub still_available: Vec<(String, String)>,
}

impl UninstallPlan {
    pub fn is_empty(&self) -> bool {
        self.remove.is_empty()
    }
}

/// Plan `huv pip uninstall <requests>`.
pub fn plan_uninstall(requests: &[String], local: &PackageMap, ancestors: &PackageMap) -> UninstallPlan {
    let mut plan = UninstallPlan::default();

    for raw in requests {
        let name = request_name(raw);
        if !local.contains_key(&name) {
            plan.not_found.push(raw.clone());
            continue;
        }
        if let Some(version) = ancestors.get(&name) {
            plan.still_available.push((name.clone(), version.clone()));
        }
        plan.remove.push(raw.clone());
    }

    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packages::dry_run::parse_dry_run;

    fn map(entries: &[(&str, &str)]) -> PackageMap {
        entries
            .iter()
            .map(|(n, v)| (n.to_string(), v.to_string()))
            .collect()
    }

    fn reqs(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn satisfied_explicit_package_is_skipped() {
        let ancestors = map(&[("numpy", "1.26.4")]);
        let tree: DependencyTree = [("numpy", "1.26.4")].into_iter().collect();

        let plan = plan_install(&reqs(&["numpy>=1.24"]), &ancestors, &tree, true);

        assert!(plan.is_empty());
        assert_eq!(plan.skipped.len(), 1);
        assert_eq!(plan.skipped[0].constraint, ">=1.24");
        assert!(plan.no_deps);
    }

    #[test]
    fn unsatisfied_explicit_package_is_a_conflict() {
        let ancestors = map(&[("numpy", "1.24.0")]);
        let tree: DependencyTree = [("numpy", "2.0.0")].into_iter().collect();

        let plan = plan_install(&reqs(&["numpy>=2"]), &ancestors, &tree, true);

        assert_eq!(plan.to_install, reqs(&["numpy>=2"]));
        assert_eq!(
            plan.conflicts,
            vec![Conflict {
                name: "numpy".into(),
                parent_version: "1.24.0".into(),
                required: ">=2".into(),
            }]
        );
        assert!(!plan.no_deps);
    }

    #[test]
    fn dependencies_from_parent_are_skipped_and_others_pinned() {
        let ancestors = map(&[("markupsafe", "2.1.5"), ("click", "8.1.7")]);
        let tree: DependencyTree = [
            ("flask", "3.0.3"),
            ("click", "8.1.7"),
            ("jinja2", "3.1.4"),
            ("markupsafe", "2.1.5"),
        ]
        .into_iter()
        .collect();

        let plan = plan_install(&reqs(&["Flask"]), &ancestors, &tree, true);

        assert_eq!(plan.to_install, reqs(&["Flask", "jinja2==3.1.4"]));
        assert_eq!(plan.dependency_skips().count(), 2);
        assert_eq!(plan.explicit_skips().count(), 0);
        assert!(plan.no_deps);
        assert_eq!(
            plan.install_args(&reqs(&["--upgrade"])),
            reqs(&["Flask", "jinja2==3.1.4", "--no-deps", "--upgrade"])
        );
    }

    #[test]
    fn no_deps_can_be_disabled() {
        let ancestors = map(&[("six", "1.16.0")]);
        let tree: DependencyTree = [("pkg", "1.0"), ("six", "1.16.0")].into_iter().collect();

        let plan = plan_install(&reqs(&["pkg"]), &ancestors, &tree, false);
        assert!(!plan.no_deps);
        assert_eq!(plan.install_args(&[]), reqs(&["pkg"]));
    }

    #[test]
    fn no_deps_is_not_duplicated() {
        let ancestors = map(&[("six", "1.16.0")]);
        let tree: DependencyTree = [("pkg", "1.0"), ("six", "1.16.0")].into_iter().collect();

        let plan = plan_install(&reqs(&["pkg"]), &ancestors, &tree, true);
        assert_eq!(
            plan.install_args(&reqs(&["--no-deps"])),
            reqs(&["pkg", "--no-deps"])
        );
    }

    #[test]
    fn basic_mode_checks_explicit_packages_only() {
        let ancestors = map(&[("requests", "2.31.0"), ("numpy", "1.24.0")]);

        let plan = plan_install(
            &reqs(&["requests", "numpy>=2", "rich"]),
            &ancestors,
            &DependencyTree::default(),
            true,
        );

        assert!(plan.basic);
        assert_eq!(plan.to_install, reqs(&["numpy>=2", "rich"]));
        assert_eq!(plan.skipped.len(), 1);
        assert_eq!(plan.skipped[0].constraint, "any version");
        assert_eq!(plan.conflicts.len(), 1);
        assert!(!plan.no_deps);
    }

    #[test]
    fn direct_references_are_always_installed() {
        let ancestors = map(&[("pkg", "1.0")]);
        let plan = plan_install(
            &reqs(&["pkg @ https://example.com/pkg-1.0.tar.gz"]),
            &ancestors,
            &DependencyTree::default(),
            true,
        );
        assert_eq!(plan.to_install.len(), 1);
        assert!(plan.skipped.is_empty());
    }

    #[test]
    fn local_path_request_is_not_pinned_again() {
        let ancestors = map(&[("six", "1.16.0")]);
        let tree = parse_dry_run(" + mypkg==0.1.0 (from file:///tmp/mypkg)\n + six==1.16.0\n");

        let plan = plan_install(&reqs(&["./mypkg"]), &ancestors, &tree, true);

        assert_eq!(plan.install_args(&[]), reqs(&["./mypkg", "--no-deps"]));
        assert_eq!(plan.dependency_skips().count(), 1);
    }

    #[test]
    fn named_direct_reference_is_requested_once() {
        let tree = parse_dry_run(
            " + pkg==1.0 (from https://example.com/pkg-1.0.tar.gz)\n + attrs==23.2.0\n",
        );

        let plan = plan_install(
            &reqs(&["pkg @ https://example.com/pkg-1.0.tar.gz"]),
            &PackageMap::new(),
            &tree,
            true,
        );

        assert_eq!(
            plan.to_install,
            reqs(&["pkg @ https://example.com/pkg-1.0.tar.gz", "attrs==23.2.0"])
        );
        assert!(!plan.no_deps);
    }

    #[test]
    fn editable_option_entries_are_left_to_uv() {
        let ancestors = map(&[("requests", "2.31.0")]);
        let tree = parse_dry_run(
            " + proj==0.1.0 (from file:///work/proj)\n + requests==2.31.0\n + rich==13.7.1\n",
        );

        let plan = plan_install(&reqs(&["rich"]), &ancestors, &tree, true);

        assert_eq!(
            plan.install_args(&reqs(&["-e", "./proj"])),
            reqs(&["rich", "--no-deps", "-e", "./proj"])
        );
    }

    #[test]
    fn uninstall_plan_sorts_requests() {
        let local = map(&[("requests", "2.32.0"), ("rich", "13.7.1")]);
        let ancestors = map(&[("requests", "2.31.0")]);

        let plan = plan_uninstall(&reqs(&["Requests", "rich", "numpy"]), &local, &ancestors);

        assert_eq!(plan.remove, reqs(&["Requests", "rich"]));
        assert_eq!(plan.not_found, reqs(&["numpy"]));
        assert_eq!(
            plan.still_available,
            vec![("requests".to_string(), "2.31.0".to_string())]
        );
    }

    #[test]
    fn uninstall_of_parent_only_package_removes_nothing() {
        let plan = plan_uninstall(&reqs(&["numpy"]), &PackageMap::new(), &map(&[("numpy", "1.0")]));
        assert!(plan.is_empty());
        assert_eq!(plan.not_found, reqs(&["numpy"]));
    }
}
