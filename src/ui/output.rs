//! Output verbosity.

/// Output verbosity mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Everything, including per-package details.
    Verbose,
    /// Progress and status messages.
    #[default]
    Normal,
    /// Results, warnings and errors only.
    Quiet,
    /// Errors only.
    Silent,
}

impl From<crate::config::schema::OutputMode> for OutputMode {
    fn from(config_mode: crate::config::schema::OutputMode) -> Self {
        match config_mode {
            crate::config::schema::OutputMode::Verbose => Self::Verbose,
            crate::config::schema::OutputMode::Normal => Self::Normal,
            crate::config::schema::OutputMode::Quiet => Self::Quiet,
            crate::config::schema::OutputMode::Silent => Self::Silent,
        }
    }
}

impl OutputMode {
    /// Per-item detail lines (each skipped dependency, each pinned package).
    pub fn shows_details(&self) -> bool {
        matches!(self, Self::Verbose)
    }

    /// Informational progress messages.
    pub fn shows_messages(&self) -> bool {
        matches!(self, Self::Verbose | Self::Normal)
    }

    /// Check if this mode shows progress spinners.
    pub fn shows_spinners(&self) -> bool {
        matches!(self, Self::Verbose | Self::Normal)
    }

    /// Successes and warnings.
    pub fn shows_status(&self) -> bool {
        !matches!(self, Self::Silent)
    }
}
