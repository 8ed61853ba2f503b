//! Reset command implementation.
//!
//! `hskc reset STEP` or `hskc reset --all` removes step markers so the next
//! install runs those steps again.

use std::path::PathBuf;

use crate::cli::args::ResetArgs;
use crate::config::EnvSource;
use crate::error::Result;
use crate::steps::{validate_step_names, StepMarkers};
use crate::ui::{Prompt, UserInterface};

use super::dispatcher::{resolve_state_dir, Command, CommandResult};

/// The reset command implementation.
pub struct ResetCommand {
    env: EnvSource,
    state_dir: Option<PathBuf>,
    args: ResetArgs,
}

impl ResetCommand {
    /// Create a new reset command.
    pub fn new(env: EnvSource, state_dir: Option<PathBuf>, args: ResetArgs) -> Self {
        Self {
            env,
            state_dir,
            args,
        }
    }
}

impl Command for ResetCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let markers = StepMarkers::new(resolve_state_dir(&self.env, self.state_dir.as_deref())?);

        if let Some(step) = &self.args.step {
            validate_step_names(std::slice::from_ref(step))?;
            if markers.clear(step)? {
                ui.success(&format!("Reset {}", step));
            } else {
                ui.message(&format!("{} was not marked complete", step));
            }
            return Ok(CommandResult::success());
        }

        let count = markers.list()?.len();
        if count == 0 {
            ui.message("No step markers to remove");
            return Ok(CommandResult::success());
        }

        // Without a terminal the answer comes from HSKC_PROMPT_RESET_ALL,
        // defaulting to yes.
        if !self.args.yes {
            let prompt = Prompt::confirm(
                "reset_all",
                format!(
                    "Remove {} step markers from {}?",
                    count,
                    markers.dir().display()
                ),
                !ui.is_interactive(),
            );
            if !ui.confirm(&prompt)? {
                ui.message("Cancelled");
                return Ok(CommandResult::success());
            }
        }

        let removed = markers.clear_all()?;
        ui.success(&format!("Removed {} step markers", removed));
        Ok(CommandResult::success())
    }
}
