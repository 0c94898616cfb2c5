//! Mock UI implementation for testing.
//!
//! `MockUI` implements the `UserInterface` trait and captures all
//! interactions for later assertion.
//!
//! # Example
//!
//! ```
//! use huv::ui::{MockUI, UserInterface};
//!
//! let mut ui = MockUI::new();
//! ui.message("Creating virtual environment: .venv");
//! ui.success("Done!");
//!
//! assert!(ui.has_message("Creating virtual environment"));
//! assert!(ui.successes().contains(&"Done!".to_string()));
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use super::{OutputMode, SpinnerHandle, UserInterface};

/// Mock UI implementation for testing.
#[derive(Debug, Default)]
pub struct MockUI {
    mode: OutputMode,
    interactive: bool,
    messages: Vec<String>,
    successes: Vec<String>,
    warnings: Vec<String>,
    errors: Vec<String>,
    spinners: Vec<String>,
    spinner_results: Rc<RefCell<Vec<String>>>,
}

impl MockUI {
    /// Create a new MockUI with Normal output mode.
    pub fn new() -> Self {
        Self {
            mode: OutputMode::Normal,
            ..Default::default()
        }
    }

    /// Create a new MockUI with a specific output mode.
    pub fn with_mode(mode: OutputMode) -> Self {
        Self {
            mode,
            ..Default::default()
        }
    }

    pub fn set_interactive(&mut self, interactive: bool) {
        self.interactive = interactive;
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    pub fn successes(&self) -> &[String] {
        &self.successes
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Messages spinners were started with.
    pub fn spinners(&self) -> &[String] {
        &self.spinners
    }

    /// Messages spinners finished with.
    pub fn spinner_results(&self) -> Vec<String> {
        self.spinner_results.borrow().clone()
    }

    /// Any message containing `needle`.
    pub fn has_message(&self, needle: &str) -> bool {
        self.messages.iter().any(|m| m.contains(needle))
    }

    pub fn has_success(&self, needle: &str) -> bool {
        self.successes.iter().any(|m| m.contains(needle))
    }

    pub fn has_warning(&self, needle: &str) -> bool {
        self.warnings.iter().any(|m| m.contains(needle))
    }

    pub fn has_error(&self, needle: &str) -> bool {
        self.errors.iter().any(|m| m.contains(needle))
    }
}

impl UserInterface for MockUI {
    fn output_mode(&self) -> OutputMode {
        self.mode
    }

    fn message(&mut self, msg: &str) {
        self.messages.push(msg.to_string());
    }

    fn success(&mut self, msg: &str) {
        self.successes.push(msg.to_string());
    }

    fn warning(&mut self, msg: &str) {
        self.warnings.push(msg.to_string());
    }

    fn error(&mut self, msg: &str) {
        self.errors.push(msg.to_string());
    }

    fn start_spinner(&mut self, message: &str) -> Box<dyn SpinnerHandle> {
        self.spinners.push(message.to_string());
        Box::new(MockSpinner {
            results: Rc::clone(&self.spinner_results),
        })
    }

    fn is_interactive(&self) -> bool {
        self.interactive
    }
}

/// Spinner handed out by [`MockUI`]; finishing messages land in
/// [`MockUI::spinner_results`].
#[derive(Debug)]
pub struct MockSpinner {
    results: Rc<RefCell<Vec<String>>>,
}

impl SpinnerHandle for MockSpinner {
    fn set_message(&mut self, _msg: &str) {}

    fn finish_success(&mut self, msg: &str) {
        self.results.borrow_mut().push(msg.to_string());
    }

    fn finish_warning(&mut self, msg: &str) {
        self.results.borrow_mut().push(msg.to_string());
    }

    fn finish_and_clear(&mut self) {}
}
