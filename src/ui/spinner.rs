//! Progress spinners.

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use super::theme::HuvTheme;
use super::SpinnerHandle;

/// An animated spinner for long-running operations, drawn on stderr.
pub struct ProgressSpinner {
    bar: ProgressBar,
    theme: HuvTheme,
}

impl ProgressSpinner {
    /// Create a new spinner with a message.
    pub fn new(message: &str, theme: HuvTheme) -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::default_spinner()
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ")
                .template("{spinner:.cyan} {msg}")
                .expect("spinner template is valid"),
        );
        bar.set_message(message.to_string());
        bar.enable_steady_tick(Duration::from_millis(80));

        Self { bar, theme }
    }

    /// Create a spinner that doesn't show (for quiet and silent modes).
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
            theme: HuvTheme::plain(),
        }
    }

    fn finish_with(&mut self, rendered: String) {
        self.bar.set_style(
            ProgressStyle::default_spinner()
                .template("{msg}")
                .expect("finish template is valid"),
        );
        self.bar.finish_with_message(rendered);
    }
}

impl SpinnerHandle for ProgressSpinner {
    fn set_message(&mut self, msg: &str) {
        self.bar.set_message(msg.to_string());
    }

    fn finish_success(&mut self, msg: &str) {
        let rendered = self.theme.format_success(msg);
        self.finish_with(rendered);
    }

    fn finish_warning(&mut self, msg: &str) {
        let rendered = self.theme.format_warning(msg);
        self.finish_with(rendered);
    }

    fn finish_and_clear(&mut self) {
        self.bar.finish_and_clear();
    }
}

/// Spinner stand-in for non-interactive output: no animation, finishing
/// messages printed as plain lines.
pub struct LineSpinner {
    show: bool,
}

impl LineSpinner {
    pub fn new(show: bool) -> Self {
        Self { show }
    }
}

impl SpinnerHandle for LineSpinner {
    fn set_message(&mut self, _msg: &str) {}

    fn finish_success(&mut self, msg: &str) {
        if self.show {
            println!("✓ {}", msg);
        }
    }

    fn finish_warning(&mut self, msg: &str) {
        if self.show {
            eprintln!("⚠ {}", msg);
        }
    }

    fn finish_and_clear(&mut self) {}
}
