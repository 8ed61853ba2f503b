//! Make sure the authentication flow exists.

use crate::error::Result;
use crate::keycloak::FlowSpec;

use super::{InstallContext, InstallStep};

/// Create the HyperSign authentication flow if the realm lacks it.
pub struct EnsureFlow;

impl InstallStep for EnsureFlow {
    fn name(&self) -> &'static str {
        "ensure-flow"
    }

    fn description(&self) -> &'static str {
        "Create the HyperSign authentication flow"
    }

    fn run(&self, ctx: &mut InstallContext<'_>) -> Result<()> {
        let settings = ctx.settings;
        let flow_name = &settings.flow_name;

        ctx.start_keycloak()?;
        ctx.keycloak.ensure_logged_in()?;

        ctx.ui.message("Checking if HyperSign flow is present...");
        let aliases = ctx.keycloak.list_flow_aliases(&settings.realm)?;
        tracing::debug!("Found flows: {:?}", aliases);
        if ctx.ui.output_mode().shows_command_output() {
            ctx.ui.message(&format!("  realm flows: {}", aliases.join(", ")));
        }
        if aliases.iter().any(|a| a == flow_name) {
            ctx.ui.message(&format!(
                "Skipping flow creation since flow \"{}\" was found",
                flow_name
            ));
            return Ok(());
        }

        ctx.ui.message(&format!("Creating flow \"{}\"", flow_name));
        let id = ctx
            .keycloak
            .create_flow(&settings.realm, &FlowSpec::basic(flow_name.as_str()))?;
        match id {
            Some(id) => ctx.ui.success(&format!(
                "Created HyperSign Flow \"{}\" with Flow ID \"{}\"",
                flow_name, id
            )),
            None => ctx
                .ui
                .success(&format!("Created HyperSign Flow \"{}\"", flow_name)),
        }

        ctx.restart_keycloak()
    }
}
