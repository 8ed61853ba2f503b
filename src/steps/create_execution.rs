//! Attach the authenticator to the flow.

use crate::error::Result;

use super::{InstallContext, InstallStep};

/// Add the HyperSign authenticator as a REQUIRED execution of the flow.
pub struct CreateExecution;

impl InstallStep for CreateExecution {
    fn name(&self) -> &'static str {
        "create-execution"
    }

    fn description(&self) -> &'static str {
        "Add the HyperSign authenticator to the flow"
    }

    fn run(&self, ctx: &mut InstallContext<'_>) -> Result<()> {
        let settings = ctx.settings;
        let flow_name = &settings.flow_name;
        let execution_name = &settings.execution_name;

        ctx.start_keycloak()?;
        ctx.keycloak.ensure_logged_in()?;

        ctx.ui.message("Checking if HyperSign Execution is present...");
        let names = ctx
            .keycloak
            .list_execution_names(&settings.realm, flow_name)?;
        tracing::debug!("Found executions in {}: {:?}", flow_name, names);
        if names.iter().any(|n| n == execution_name) {
            ctx.ui.message(&format!(
                "Execution {} is already configured with \"{}\" Auth Flow.",
                execution_name, flow_name
            ));
            return Ok(());
        }

        ctx.ui
            .message(&format!("Creating execution: {}", execution_name));
        ctx.keycloak.create_execution(
            &settings.realm,
            flow_name,
            &settings.plugin.provider_id,
        )?;
        ctx.ui.success(&format!(
            "Creation of execution {} successful!",
            execution_name
        ));
        Ok(())
    }
}
