//! Virtual environments: layout, `pyvenv.cfg`, parent chains and the
//! activation artifacts that expose ancestors.

pub mod create;
pub mod hierarchy;
pub mod layout;
pub mod patch;
pub mod pyvenv_cfg;

pub use create::{choose_python, resolve_path, validate_parent, validate_target, PythonChoice};
pub use hierarchy::{find_parent, parent_chain};
pub use layout::VenvLayout;
pub use patch::{setup_hierarchy, HierarchyReport, HierarchySpec};
pub use pyvenv_cfg::PyvenvCfg;
