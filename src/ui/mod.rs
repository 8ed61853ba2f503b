//! Terminal user interface.
//!
//! This module provides:
//! - [`UserInterface`] trait so commands and steps never print directly
//! - [`TerminalUI`] for interactive terminal usage
//! - [`NonInteractiveUI`] for containers, CI and piped output
//! - [`MockUI`] capturing everything for tests
//!
//! # Example
//!
//! ```
//! use hskc::ui::{create_ui, OutputMode};
//!
//! let mut ui = create_ui(false, OutputMode::Quiet, false);
//! ui.show_header("hskc");
//! ui.success("Plugin installed");
//! ```

pub mod format;
pub mod mock;
pub mod non_interactive;
pub mod output;
pub mod prompts;
pub mod spinner;
pub mod terminal;
pub mod theme;

pub use format::{format_duration, format_relative_time};
pub use mock::{MockUI, SpinnerStatus};
pub use non_interactive::NonInteractiveUI;
pub use output::OutputMode;
pub use prompts::prompt_confirm;
pub use spinner::ProgressSpinner;
pub use terminal::{create_ui, TerminalUI};
pub use theme::{should_use_colors, HskcTheme};

use crate::error::Result;

/// Trait for user interface interactions.
///
/// This trait allows mocking the UI in tests.
pub trait UserInterface {
    fn output_mode(&self) -> OutputMode;

    /// Display a message to the user.
    fn message(&mut self, msg: &str);

    fn success(&mut self, msg: &str);

    fn warning(&mut self, msg: &str);

    /// Display an error message. Shown in every output mode.
    fn error(&mut self, msg: &str);

    /// Ask a yes/no question.
    fn confirm(&mut self, prompt: &Prompt) -> Result<bool>;

    /// Start a spinner for an operation.
    fn start_spinner(&mut self, message: &str) -> Box<dyn SpinnerHandle>;

    /// Show a header/banner.
    fn show_header(&mut self, title: &str);

    /// Announce an install step.
    fn show_step(&mut self, name: &str, description: &str);

    /// Check if running in interactive mode.
    fn is_interactive(&self) -> bool;
}

/// Handle for controlling a spinner.
pub trait SpinnerHandle {
    fn set_message(&mut self, msg: &str);

    fn finish_success(&mut self, msg: &str);

    fn finish_error(&mut self, msg: &str);

    fn finish_skipped(&mut self, msg: &str);
}

/// A yes/no question.
#[derive(Debug, Clone)]
pub struct Prompt {
    /// Unique key, used for `HSKC_PROMPT_<KEY>` overrides.
    pub key: String,
    pub question: String,
    /// Answer used when the user just presses enter, or when nobody can be
    /// asked.
    pub default: bool,
}

impl Prompt {
    pub fn confirm(key: &str, question: impl Into<String>, default: bool) -> Self {
        Self {
            key: key.to_string(),
            question: question.into(),
            default,
        }
    }
}

/// Parse a yes/no answer. Anything unrecognised is `None`.
pub fn parse_bool_answer(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "y" | "yes" | "true" | "1" => Some(true),
        "n" | "no" | "false" | "0" => Some(false),
        _ => None,
    }
}
