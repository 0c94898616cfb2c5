//! Interactive terminal UI.

use console::Term;
use std::io::Write;

use super::{
    should_use_colors, HuvTheme, NonInteractiveUI, OutputMode, ProgressSpinner, SpinnerHandle,
    UserInterface,
};

/// Terminal UI: results on stdout, warnings and errors on stderr.
pub struct TerminalUI {
    out: Term,
    err: Term,
    theme: HuvTheme,
    mode: OutputMode,
}

impl TerminalUI {
    /// Create a new terminal UI.
    pub fn new(mode: OutputMode, no_color: bool) -> Self {
        Self {
            out: Term::stdout(),
            err: Term::stderr(),
            theme: HuvTheme::for_colors(should_use_colors(no_color)),
            mode,
        }
    }
}

impl UserInterface for TerminalUI {
    fn output_mode(&self) -> OutputMode {
        self.mode
    }

    fn message(&mut self, msg: &str) {
        if self.mode.shows_messages() {
            writeln!(self.out, "{}", msg).ok();
        }
    }

    fn success(&mut self, msg: &str) {
        if self.mode.shows_status() {
            writeln!(self.out, "{}", self.theme.format_success(msg)).ok();
        }
    }

    fn warning(&mut self, msg: &str) {
        if self.mode.shows_status() {
            writeln!(self.err, "{}", self.theme.format_warning(msg)).ok();
        }
    }

    fn error(&mut self, msg: &str) {
        writeln!(self.err, "{}", self.theme.format_error(msg)).ok();
    }

    fn start_spinner(&mut self, message: &str) -> Box<dyn SpinnerHandle> {
        if self.mode.shows_spinners() {
            Box::new(ProgressSpinner::new(message, self.theme.clone()))
        } else {
            Box::new(ProgressSpinner::hidden())
        }
    }

    fn is_interactive(&self) -> bool {
        self.out.is_term()
    }
}

/// Create the appropriate UI for the current environment.
pub fn create_ui(interactive: bool, mode: OutputMode, no_color: bool) -> Box<dyn UserInterface> {
    if interactive {
        Box::new(TerminalUI::new(mode, no_color))
    } else {
        Box::new(NonInteractiveUI::new(mode))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_ui_non_interactive() {
        let ui = create_ui(false, OutputMode::Quiet, true);
        assert!(!ui.is_interactive());
        assert_eq!(ui.output_mode(), OutputMode::Quiet);
    }

    #[test]
    fn terminal_ui_keeps_mode() {
        let ui = TerminalUI::new(OutputMode::Verbose, true);
        assert_eq!(ui.output_mode(), OutputMode::Verbose);
    }
}
