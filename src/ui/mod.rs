//! User-facing output.
//!
//! This module provides:
//! - [`UserInterface`] trait for UI abstraction
//! - [`TerminalUI`] for interactive terminal usage
//! - [`NonInteractiveUI`] for CI/headless environments
//! - [`MockUI`] for tests
//!
//! # Example
//!
//! ```
//! use huv::ui::{create_ui, OutputMode};
//!
//! let mut ui = create_ui(false, OutputMode::Quiet, true);
//! ui.success("Virtual environment created");
//! ```

pub mod mock;
pub mod non_interactive;
pub mod output;
pub mod spinner;
pub mod terminal;
pub mod theme;

pub use mock::{MockSpinner, MockUI};
pub use non_interactive::NonInteractiveUI;
pub use output::OutputMode;
pub use spinner::{LineSpinner, ProgressSpinner};
pub use terminal::{create_ui, TerminalUI};
pub use theme::{should_use_colors, HuvTheme};

/// Trait for user interface interactions.
///
/// This trait allows mocking the UI in tests.
pub trait UserInterface {
    /// Get the current output mode.
    fn output_mode(&self) -> OutputMode;

    /// Display an informational message.
    fn message(&mut self, msg: &str);

    /// Display a success message.
    fn success(&mut self, msg: &str);

    /// Display a warning message.
    fn warning(&mut self, msg: &str);

    /// Display an error message.
    fn error(&mut self, msg: &str);

    /// Start a spinner for an operation.
    fn start_spinner(&mut self, message: &str) -> Box<dyn SpinnerHandle>;

    /// Check if running in interactive mode.
    fn is_interactive(&self) -> bool;

    /// Display a line only in verbose mode.
    fn detail(&mut self, msg: &str) {
        if self.output_mode().shows_details() {
            self.message(msg);
        }
    }
}

/// Handle for controlling a spinner.
pub trait SpinnerHandle {
    /// Update the spinner message.
    fn set_message(&mut self, msg: &str);

    /// Mark the operation as successful.
    fn finish_success(&mut self, msg: &str);

    /// Mark the operation as finished with a caveat.
    fn finish_warning(&mut self, msg: &str);

    /// Remove the spinner without a final message.
    fn finish_and_clear(&mut self);
}
