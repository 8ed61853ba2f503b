//! Status command implementation.
//!
//! The `hskc status` command shows which install steps have completed.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::cli::args::StatusArgs;
use crate::config::EnvSource;
use crate::error::{HskcError, Result};
use crate::steps::{all_steps, step_names, StepMarkers};
use crate::ui::{format_relative_time, UserInterface};

use super::dispatcher::{resolve_state_dir, Command, CommandResult};

/// One step as reported by `status`.
#[derive(Debug, Clone, Serialize)]
pub struct StepStatus {
    pub name: &'static str,
    pub description: &'static str,
    pub complete: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

#[derive(Debug, Serialize)]
struct StatusReport {
    state_dir: PathBuf,
    steps: Vec<StepStatus>,
}

/// Marker state of every install step, in execution order.
pub fn collect_status(markers: &StepMarkers) -> Vec<StepStatus> {
    all_steps()
        .iter()
        .map(|step| {
            let marker = markers.read(step.name());
            StepStatus {
                name: step.name(),
                description: step.description(),
                complete: markers.is_complete(step.name()),
                completed_at: marker.as_ref().map(|m| m.completed_at),
                version: marker.map(|m| m.version),
            }
        })
        .collect()
}

/// The status command implementation.
pub struct StatusCommand {
    env: EnvSource,
    state_dir: Option<PathBuf>,
    args: StatusArgs,
}

impl StatusCommand {
    /// Create a new status command.
    pub fn new(env: EnvSource, state_dir: Option<PathBuf>, args: StatusArgs) -> Self {
        Self {
            env,
            state_dir,
            args,
        }
    }
}

impl Command for StatusCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let state_dir = resolve_state_dir(&self.env, self.state_dir.as_deref())?;
        let markers = StepMarkers::new(&state_dir);
        let steps = collect_status(&markers);

        if self.args.json {
            let report = StatusReport { state_dir, steps };
            let json = serde_json::to_string_pretty(&report)
                .map_err(|e| HskcError::Other(e.into()))?;
            println!("{}", json);
            return Ok(CommandResult::success());
        }

        ui.show_header("hskc - Status");
        ui.message(&format!("Markers: {}", state_dir.display()));
        ui.message("");

        for step in &steps {
            match step.completed_at {
                Some(at) => ui.success(&format!(
                    "{:<18} completed {}",
                    step.name,
                    format_relative_time(at)
                )),
                // A marker that no longer parses still counts as done.
                None if step.complete => {
                    ui.success(&format!("{:<18} completed", step.name))
                }
                None => ui.message(&format!("○ {:<18} pending", step.name)),
            }
        }

        let known = step_names();
        for stray in markers.list()?.iter().filter(|m| !known.contains(&m.as_str())) {
            ui.warning(&format!("Unknown marker '{}' in {}", stray, state_dir.display()));
        }

        Ok(CommandResult::success())
    }
}
