//! Package names, versions, inventories and install planning.

pub mod dry_run;
pub mod inventory;
pub mod name;
pub mod plan;
pub mod requirement;
pub mod version;

pub use dry_run::{parse_dry_run, DependencyEntry, DependencyTree};
pub use inventory::{ancestor_packages, installed_packages, PackageMap};
pub use name::normalize_name;
pub use plan::{plan_install, plan_uninstall, InstallPlan, UninstallPlan};
pub use requirement::Requirement;
pub use version::{SpecifierSet, Version};
