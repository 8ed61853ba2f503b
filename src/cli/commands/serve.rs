//! Serve command implementation.
//!
//! `hskc serve` starts an already installed Keycloak and stays attached to
//! it, skipping every install step.

use std::path::PathBuf;

use crate::config::EnvSource;
use crate::error::Result;
use crate::keycloak::KeycloakHandle;
use crate::steps::start_keycloak;
use crate::ui::UserInterface;

use super::dispatcher::{load_settings, Command, CommandResult};

/// Block on the server process until it exits.
pub(super) fn run_in_foreground(
    keycloak: &mut KeycloakHandle,
    ui: &mut dyn UserInterface,
) -> Result<CommandResult> {
    start_keycloak(keycloak, ui)?;
    ui.message("Keycloak is running in the foreground");

    match keycloak.wait()? {
        Some(0) | None => Ok(CommandResult::success()),
        Some(code) => {
            ui.warning(&format!("Keycloak exited with code {}", code));
            Ok(CommandResult::failure(1))
        }
    }
}

/// The serve command implementation.
pub struct ServeCommand {
    env: EnvSource,
    state_dir: Option<PathBuf>,
}

impl ServeCommand {
    /// Create a new serve command.
    pub fn new(env: EnvSource, state_dir: Option<PathBuf>) -> Self {
        Self { env, state_dir }
    }
}

impl Command for ServeCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let settings = load_settings(&self.env, self.state_dir.as_deref())?;
        let mut keycloak = KeycloakHandle::new(&settings);

        keycloak.kill();
        start_keycloak(&mut keycloak, ui)?;
        keycloak.login()?;
        run_in_foreground(&mut keycloak, ui)
    }
}
