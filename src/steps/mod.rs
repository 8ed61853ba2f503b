//! Install steps and the marker-backed runner that makes them idempotent.
//!
//! - [`StepMarkers`] - `<state_dir>/<step>.done` files
//! - [`StepRunner`] - Skips completed steps, marks successful ones
//! - [`DownloadInstall`], [`EnsureFlow`], [`CreateExecution`] - The steps,
//!   in the order [`all_steps`] returns them
//!
//! Steps never decide on their own whether they already ran: a step that is
//! executed does its whole job, checking the server for existing state where
//! that is cheap (flows, executions, registered modules).

pub mod create_execution;
pub mod download_install;
pub mod ensure_flow;
pub mod marker;

pub use create_execution::CreateExecution;
pub use download_install::DownloadInstall;
pub use ensure_flow::EnsureFlow;
pub use marker::{StepMarker, StepMarkers};

use std::collections::HashSet;
use std::time::{Duration, Instant};

use crate::config::Settings;
use crate::download::HttpFetcher;
use crate::error::{HskcError, Result};
use crate::keycloak::KeycloakHandle;
use crate::ui::{format_duration, UserInterface};

/// Everything a step may touch.
pub struct InstallContext<'a> {
    pub settings: &'a Settings,
    pub keycloak: &'a mut KeycloakHandle,
    pub fetcher: &'a HttpFetcher,
    pub ui: &'a mut dyn UserInterface,
}

/// Start Keycloak behind a spinner. Does nothing if it is already up.
pub fn start_keycloak(keycloak: &mut KeycloakHandle, ui: &mut dyn UserInterface) -> Result<()> {
    if keycloak.is_running() {
        return Ok(());
    }
    let mut spinner = ui.start_spinner("Starting Keycloak...");
    match keycloak.start() {
        Ok(()) => {
            spinner.finish_success("Keycloak is running");
            Ok(())
        }
        Err(err) => {
            spinner.finish_error("Keycloak did not become ready");
            Err(err)
        }
    }
}

impl InstallContext<'_> {
    /// Start Keycloak behind a spinner. Does nothing if it is already up.
    pub fn start_keycloak(&mut self) -> Result<()> {
        start_keycloak(self.keycloak, self.ui)
    }

    /// Stop Keycloak behind a spinner.
    pub fn stop_keycloak(&mut self) -> Result<()> {
        let mut spinner = self.ui.start_spinner("Stopping Keycloak...");
        if self.keycloak.stop()? {
            spinner.finish_success("Keycloak stopped");
        } else {
            spinner.finish_skipped("Keycloak was not running");
        }
        Ok(())
    }

    /// Stop and start Keycloak so it picks up configuration changes.
    pub fn restart_keycloak(&mut self) -> Result<()> {
        self.stop_keycloak()?;
        self.start_keycloak()
    }
}

/// One unit of installation work.
pub trait InstallStep {
    /// Marker name, also accepted by `--only`, `--force` and `reset`.
    fn name(&self) -> &'static str;

    /// One-line summary for progress output.
    fn description(&self) -> &'static str;

    fn run(&self, ctx: &mut InstallContext<'_>) -> Result<()>;
}

/// What happened to a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// The step ran and its marker was written.
    Completed { duration: Duration },
    /// A marker was already present.
    Skipped,
}

/// Every install step, in execution order.
pub fn all_steps() -> Vec<Box<dyn InstallStep>> {
    vec![
        Box::new(DownloadInstall),
        Box::new(EnsureFlow),
        Box::new(CreateExecution),
    ]
}

pub fn step_names() -> Vec<&'static str> {
    all_steps().iter().map(|s| s.name()).collect()
}

/// Fail on the first name that is not a known step.
pub fn validate_step_names(names: &[String]) -> Result<()> {
    let known = step_names();
    for name in names {
        if !known.contains(&name.as_str()) {
            return Err(HskcError::UnknownStep {
                name: name.clone(),
                known: known.join(", "),
            });
        }
    }
    Ok(())
}

/// The steps to run: all of them, or only those named, still in execution
/// order.
pub fn select_steps(only: &[String]) -> Result<Vec<Box<dyn InstallStep>>> {
    validate_step_names(only)?;
    Ok(all_steps()
        .into_iter()
        .filter(|s| only.is_empty() || only.iter().any(|n| n == s.name()))
        .collect())
}

/// Runs steps, skipping any whose marker exists.
pub struct StepRunner {
    markers: StepMarkers,
    forced: HashSet<String>,
}

impl StepRunner {
    pub fn new(markers: StepMarkers) -> Self {
        Self {
            markers,
            forced: HashSet::new(),
        }
    }

    /// Re-run these steps even if they are marked complete.
    pub fn with_forced(mut self, steps: impl IntoIterator<Item = String>) -> Self {
        self.forced.extend(steps);
        self
    }

    pub fn markers(&self) -> &StepMarkers {
        &self.markers
    }

    /// Run `step` unless it is already complete.
    ///
    /// The marker is written only after the step succeeds, so a failed step
    /// runs again next time.
    pub fn run(&self, step: &dyn InstallStep, ctx: &mut InstallContext<'_>) -> Result<StepOutcome> {
        let name = step.name();
        ctx.ui.show_step(name, step.description());

        if self.forced.contains(name) && self.markers.clear(name)? {
            tracing::info!("Cleared marker for {} (forced)", name);
        }

        if self.markers.is_complete(name) {
            tracing::info!("Step {} already completed, skipping", name);
            ctx.ui.message(&format!("  {} already completed, skipping", name));
            return Ok(StepOutcome::Skipped);
        }

        let start = Instant::now();
        if let Err(err) = step.run(ctx) {
            tracing::error!("Step {} failed: {}", name, err);
            return Err(HskcError::StepFailed {
                step: name.to_string(),
                source: Box::new(err),
            });
        }
        self.markers.mark_complete(name)?;

        let duration = start.elapsed();
        ctx.ui
            .success(&format!("{} ({})", name, format_duration(duration)));
        Ok(StepOutcome::Completed { duration })
    }

    /// Run steps in order, stopping at the first failure.
    pub fn run_all(
        &self,
        steps: &[Box<dyn InstallStep>],
        ctx: &mut InstallContext<'_>,
    ) -> Result<Vec<(&'static str, StepOutcome)>> {
        let mut outcomes = Vec::with_capacity(steps.len());
        for step in steps {
            let outcome = self.run(step.as_ref(), ctx)?;
            outcomes.push((step.name(), outcome));
        }
        Ok(outcomes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steps_run_in_install_order() {
        assert_eq!(
            step_names(),
            vec!["download-install", "ensure-flow", "create-execution"]
        );
    }

    #[test]
    fn select_keeps_execution_order() {
        let only = vec!["create-execution".to_string(), "ensure-flow".to_string()];
        let names: Vec<_> = select_steps(&only)
            .unwrap()
            .iter()
            .map(|s| s.name())
            .collect();
        assert_eq!(names, vec!["ensure-flow", "create-execution"]);
        assert_eq!(select_steps(&[]).unwrap().len(), 3);
    }

    #[test]
    fn unknown_step_is_rejected() {
        let err = validate_step_names(&["deploy".to_string()]).unwrap_err();
        match err {
            HskcError::UnknownStep { name, known } => {
                assert_eq!(name, "deploy");
                assert!(known.contains("ensure-flow"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
