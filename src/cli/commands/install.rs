//! Install command implementation.
//!
//! The `hskc install` command runs the install steps and then keeps
//! Keycloak in the foreground, which is what a container entrypoint wants.

use std::path::PathBuf;

use crate::cli::args::InstallArgs;
use crate::config::EnvSource;
use crate::download::HttpFetcher;
use crate::error::Result;
use crate::keycloak::KeycloakHandle;
use crate::steps::{
    select_steps, validate_step_names, InstallContext, StepMarkers, StepOutcome, StepRunner,
};
use crate::ui::UserInterface;

use super::dispatcher::{load_settings, Command, CommandResult};
use super::serve::run_in_foreground;

/// The install command implementation.
pub struct InstallCommand {
    env: EnvSource,
    state_dir: Option<PathBuf>,
    args: InstallArgs,
}

impl InstallCommand {
    /// Create a new install command.
    pub fn new(env: EnvSource, state_dir: Option<PathBuf>, args: InstallArgs) -> Self {
        Self {
            env,
            state_dir,
            args,
        }
    }
}

impl Command for InstallCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let settings = load_settings(&self.env, self.state_dir.as_deref())?;
        validate_step_names(&self.args.force)?;
        let steps = select_steps(&self.args.only)?;

        ui.show_header("HyperSign Keycloak installer");
        tracing::debug!("Markers in {}", settings.state_dir.display());

        let mut keycloak = KeycloakHandle::new(&settings);
        if self.args.kill_existing {
            keycloak.kill();
        }

        let fetcher = HttpFetcher::new()?;
        let runner = StepRunner::new(StepMarkers::new(&settings.state_dir))
            .with_forced(self.args.force.iter().cloned());

        let outcomes = {
            let mut ctx = InstallContext {
                settings: &settings,
                keycloak: &mut keycloak,
                fetcher: &fetcher,
                ui: &mut *ui,
            };
            runner.run_all(&steps, &mut ctx)?
        };

        let skipped = outcomes
            .iter()
            .filter(|(_, outcome)| *outcome == StepOutcome::Skipped)
            .count();
        ui.success(&format!(
            "Install complete ({} ran, {} already done)",
            outcomes.len() - skipped,
            skipped
        ));

        if self.args.no_serve {
            keycloak.stop()?;
            return Ok(CommandResult::success());
        }
        run_in_foreground(&mut keycloak, ui)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::keycloak::testing::{fake_kcbase, ready_jboss_cli, write_script};
    use crate::steps::testing::STATEFUL_KCADM;
    use crate::ui::MockUI;
    use std::collections::HashMap;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn install_env(root: &Path) -> EnvSource {
        let kcbase = fake_kcbase(root);
        ready_jboss_cli(&kcbase);
        write_script(&kcbase.join("bin/kcadm.sh"), STATEFUL_KCADM);

        let mut vars: HashMap<String, String> = crate::config::REQUIRED_ENV
            .iter()
            .map(|name| (name.to_string(), "x".to_string()))
            .collect();
        for (key, value) in [
            ("KCBASE", kcbase.to_string_lossy().to_string()),
            ("KC_EXECUTION_STRATEGY", "custom".to_string()),
            ("KC_START_COMMAND", "sleep 30".to_string()),
            ("KC_BASEURL", "http://localhost:8080/auth".to_string()),
            ("AUTH_FLOW_NAME", "hs-auth-flow".to_string()),
            ("HYPERSIGN_EXECUTION_NAME", "HyperSign QRCode".to_string()),
            ("HYPERSIGN_WORKDIR", root.join("work").to_string_lossy().to_string()),
            ("KC_RUN_AS_UID", String::new()),
            ("HSKC_STARTUP_RETRIES", "3".to_string()),
            ("HSKC_STARTUP_INTERVAL_SECS", "0".to_string()),
        ] {
            vars.insert(key.to_string(), value);
        }
        EnvSource::from_map(vars)
    }

    fn args(only: &[&str], force: &[&str]) -> InstallArgs {
        InstallArgs {
            only: only.iter().map(|s| s.to_string()).collect(),
            force: force.iter().map(|s| s.to_string()).collect(),
            no_serve: true,
            kill_existing: false,
        }
    }

    #[test]
    fn runs_selected_steps_and_marks_them() {
        let temp = TempDir::new().unwrap();
        let env = install_env(temp.path());
        let state = temp.path().join("state");
        let mut ui = MockUI::new();

        let cmd = InstallCommand::new(
            env,
            Some(state.clone()),
            args(&["ensure-flow", "create-execution"], &[]),
        );
        let result = cmd.execute(&mut ui).unwrap();

        assert!(result.success);
        assert!(state.join("ensure-flow.done").is_file());
        assert!(state.join("create-execution.done").is_file());
        assert!(!state.join("download-install.done").exists());
        assert_eq!(ui.steps(), ["ensure-flow", "create-execution"]);
        assert!(ui.has_success("2 ran, 0 already done"));
    }

    #[test]
    fn second_install_skips_completed_steps() {
        let temp = TempDir::new().unwrap();
        let env = install_env(temp.path());
        let state = temp.path().join("state");
        let only = ["ensure-flow", "create-execution"];

        InstallCommand::new(env.clone(), Some(state.clone()), args(&only, &[]))
            .execute(&mut MockUI::new())
            .unwrap();
        let mut ui = MockUI::new();
        InstallCommand::new(env.clone(), Some(state), args(&only, &[]))
            .execute(&mut ui)
            .unwrap();

        assert!(ui.has_success("0 ran, 2 already done"));
        let kcbase = PathBuf::from(env.get("KCBASE").unwrap());
        let log = fs::read_to_string(kcbase.join("bin/kcadm.sh.log")).unwrap();
        assert_eq!(log.matches("create authentication/flows -s").count(), 1);
    }

    #[test]
    fn unknown_step_fails_before_anything_runs() {
        let temp = TempDir::new().unwrap();
        let env = install_env(temp.path());
        let mut ui = MockUI::new();

        let err = InstallCommand::new(env, None, args(&[], &["deploy"]))
            .execute(&mut ui)
            .unwrap_err();

        assert!(err.to_string().contains("Unknown step 'deploy'"));
        assert!(ui.headers().is_empty());
    }

    #[test]
    fn missing_env_var_fails() {
        let mut ui = MockUI::new();
        let err = InstallCommand::new(EnvSource::from_map(HashMap::new()), None, args(&[], &[]))
            .execute(&mut ui)
            .unwrap_err();
        assert_eq!(err.to_string(), "EnVar DB_VENDOR is empty");
    }
}
