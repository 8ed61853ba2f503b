//! Non-interactive UI for containers and CI.

use std::collections::HashMap;

use crate::error::{HskcError, Result};

use super::theme::HskcTheme;
use super::{parse_bool_answer, OutputMode, Prompt, SpinnerHandle, UserInterface};

const PROMPT_ENV_PREFIX: &str = "HSKC_PROMPT_";

/// UI implementation for non-interactive mode.
///
/// Prompts are answered from `HSKC_PROMPT_<KEY>` environment variables,
/// falling back to the prompt's default. Output is plain text so container
/// logs stay readable.
pub struct NonInteractiveUI {
    mode: OutputMode,
    env_overrides: HashMap<String, String>,
}

impl NonInteractiveUI {
    pub fn new(mode: OutputMode) -> Self {
        let env_overrides: HashMap<String, String> = std::env::vars()
            .filter(|(k, _)| k.starts_with(PROMPT_ENV_PREFIX))
            .collect();

        Self {
            mode,
            env_overrides,
        }
    }

    /// Create with explicit overrides (for testing).
    pub fn with_overrides(mode: OutputMode, overrides: HashMap<String, String>) -> Self {
        Self {
            mode,
            env_overrides: overrides,
        }
    }
}

impl UserInterface for NonInteractiveUI {
    fn output_mode(&self) -> OutputMode {
        self.mode
    }

    fn message(&mut self, msg: &str) {
        if self.mode.shows_status() {
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
        eprintln!("✗ {}", msg);
    }

    fn confirm(&mut self, prompt: &Prompt) -> Result<bool> {
        let env_key = format!("{}{}", PROMPT_ENV_PREFIX, prompt.key.to_uppercase());
        match self.env_overrides.get(&env_key) {
            None => Ok(prompt.default),
            Some(value) => parse_bool_answer(value).ok_or_else(|| HskcError::InvalidEnvVar {
                name: env_key.clone(),
                message: format!("expected yes or no, got '{}'", value),
            }),
        }
    }

    fn start_spinner(&mut self, message: &str) -> Box<dyn SpinnerHandle> {
        if self.mode.shows_status() {
            println!("  {}", message);
        }
        Box::new(PlainSpinner {
            visible: self.mode.shows_status(),
        })
    }

    fn show_header(&mut self, title: &str) {
        if self.mode.shows_status() {
            println!("\n{}\n", title);
        }
    }

    fn show_step(&mut self, name: &str, description: &str) {
        if self.mode.shows_status() {
            println!("◆ {} {}", name, description);
        }
    }

    fn is_interactive(&self) -> bool {
        false
    }
}

/// Spinner that prints only its final line.
struct PlainSpinner {
    visible: bool,
}

impl SpinnerHandle for PlainSpinner {
    fn set_message(&mut self, _msg: &str) {}

    fn finish_success(&mut self, msg: &str) {
        if self.visible {
            println!("{}", HskcTheme::plain().format_success(msg));
        }
    }

    fn finish_error(&mut self, msg: &str) {
        eprintln!("{}", HskcTheme::plain().format_error(msg));
    }

    fn finish_skipped(&mut self, msg: &str) {
        if self.visible {
            println!("{}", HskcTheme::plain().format_skipped(msg));
        }
    }
}
