//! Non-interactive UI for CI/headless environments.

use super::spinner::LineSpinner;
use super::{OutputMode, SpinnerHandle, UserInterface};

/// Plain-text UI without colors or animation.
///
/// Results go to stdout; warnings and errors to stderr.
pub struct NonInteractiveUI {
    mode: OutputMode,
}

impl NonInteractiveUI {
    pub fn new(mode: OutputMode) -> Self {
        Self { mode }
    }
}

impl UserInterface for NonInteractiveUI {
    fn output_mode(&self) -> OutputMode {
        self.mode
    }

    fn message(&mut self, msg: &str) {
        if self.mode.shows_messages() {
            println!("{}", msg);
        }
    }

    fn success(&mut self, msg: &str) {
        if self.mode.shows_status() {
            println!("✓ {}", msg);
        }
    }

    fn warning(&mut self, msg: &str) {
        if self.mode.shows_status() {
            eprintln!("⚠ {}", msg);
        }
    }

    fn error(&mut self, msg: &str) {
        eprintln!("Error: {}", msg);
    }

    fn start_spinner(&mut self, message: &str) -> Box<dyn SpinnerHandle> {
        if self.mode.shows_spinners() && !crate::shell::is_ci() {
            println!("{}", message);
        }
        Box::new(LineSpinner::new(self.mode.shows_status()))
    }

    fn is_interactive(&self) -> bool {
        false
    }
}
