//! Env-check command implementation.

use crate::config::{check_env, EnvSource, REQUIRED_ENV};
use crate::error::Result;
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult};

/// Validates the mandatory environment and nothing else.
pub struct EnvCheckCommand {
    env: EnvSource,
}

impl EnvCheckCommand {
    pub fn new(env: EnvSource) -> Self {
        Self { env }
    }
}

impl Command for EnvCheckCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        check_env(&self.env, REQUIRED_ENV)?;
        ui.success(&format!(
            "All {} mandatory environment variables are set",
            REQUIRED_ENV.len()
        ));
        Ok(CommandResult::success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::MockUI;
    use std::collections::HashMap;

    fn full_env() -> HashMap<String, String> {
        REQUIRED_ENV
            .iter()
            .map(|name| (name.to_string(), "set".to_string()))
            .collect()
    }

    #[test]
    fn complete_environment_passes() {
        let mut ui = MockUI::new();
        let result = EnvCheckCommand::new(EnvSource::from_map(full_env()))
            .execute(&mut ui)
            .unwrap();
        assert!(result.success);
        assert!(ui.has_success("mandatory environment variables are set"));
    }

    #[test]
    fn empty_variable_names_the_culprit() {
        let mut vars = full_env();
        vars.insert("AUTH_FLOW_NAME".to_string(), String::new());

        let err = EnvCheckCommand::new(EnvSource::from_map(vars))
            .execute(&mut MockUI::new())
            .unwrap_err();

        assert_eq!(err.to_string(), "EnVar AUTH_FLOW_NAME is empty");
    }
}
