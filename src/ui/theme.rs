//! Visual theme and styling.

use console::Style;

/// huv's visual theme.
#[derive(Debug, Clone)]
pub struct HuvTheme {
    /// Style for success messages (green).
    pub success: Style,
    /// Style for warning messages (yellow).
    pub warning: Style,
    /// Style for error messages (red bold).
    pub error: Style,
    /// Style for informational elements (cyan).
    pub info: Style,
    /// Style for dim/secondary text.
    pub dim: Style,
    /// Style for paths and package names (bold).
    pub highlight: Style,
}

impl Default for HuvTheme {
    fn default() -> Self {
        Self::new()
    }
}

impl HuvTheme {
    pub fn new() -> Self {
        Self {
            success: Style::new().green(),
            warning: Style::new().yellow(),
            error: Style::new().red().bold(),
            info: Style::new().cyan(),
            dim: Style::new().dim(),
            highlight: Style::new().bold(),
        }
    }

    /// Create a theme without colors (for non-TTY or --no-color).
    pub fn plain() -> Self {
        Self {
            success: Style::new(),
            warning: Style::new(),
            error: Style::new(),
            info: Style::new(),
            dim: Style::new(),
            highlight: Style::new(),
        }
    }

    /// Pick [`HuvTheme::new`] or [`HuvTheme::plain`].
    pub fn for_colors(colors: bool) -> Self {
        if colors {
            Self::new()
        } else {
            Self::plain()
        }
    }

    pub fn format_success(&self, msg: &str) -> String {
        format!("{}", self.success.apply_to(format!("✓ {}", msg)))
    }

    pub fn format_warning(&self, msg: &str) -> String {
        format!("{}", self.warning.apply_to(format!("⚠ {}", msg)))
    }

    pub fn format_error(&self, msg: &str) -> String {
        format!("{}", self.error.apply_to(format!("Error: {}", msg)))
    }
}

/// Check if colors should be enabled.
pub fn should_use_colors(no_color_flag: bool) -> bool {
    if no_color_flag {
        return false;
    }

    // Check NO_COLOR env var (https://no-color.org/)
    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }

    console::Term::stdout().is_term()
}
