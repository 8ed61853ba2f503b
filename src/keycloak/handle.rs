//! Keycloak process lifecycle.

use std::path::{Path, PathBuf};
use std::process::Child;
use std::thread;

use crate::config::{KeycloakMode, Settings, StartupPolicy};
use crate::error::{HskcError, Result};
use crate::secrets::OutputMasker;
use crate::shell::{self, cli_suffix, is_elevated, CommandOptions};

use super::json_from_output;

/// Handle to one Keycloak installation and, once started, its process.
pub struct KeycloakHandle {
    pub(super) kcbase: PathBuf,
    pub(super) mode: KeycloakMode,
    pub(super) start_command: Vec<String>,
    pub(super) admin_user: String,
    pub(super) admin_password: String,
    pub(super) server_url: String,
    pub(super) run_as_uid: Option<u32>,
    pub(super) startup: StartupPolicy,
    pub(super) jboss_cli: PathBuf,
    pub(super) kcadm_cli: PathBuf,
    pub(super) masker: OutputMasker,
    pub(super) logged_in: bool,
    child: Option<Child>,
}

impl KeycloakHandle {
    /// Build a handle from resolved settings. Nothing is started.
    pub fn new(settings: &Settings) -> Self {
        let bin = settings.kcbase.join("bin");
        let mut masker = OutputMasker::new();
        masker.add_secret(settings.admin_password.clone());

        Self {
            kcbase: settings.kcbase.clone(),
            mode: settings.mode,
            start_command: settings.strategy.start_command(&settings.kcbase),
            admin_user: settings.admin_user.clone(),
            admin_password: settings.admin_password.clone(),
            server_url: settings.base_url.clone(),
            run_as_uid: settings.run_as_uid,
            startup: settings.startup,
            jboss_cli: bin.join(format!("jboss-cli.{}", cli_suffix())),
            kcadm_cli: bin.join(format!("kcadm.{}", cli_suffix())),
            masker,
            logged_in: false,
            child: None,
        }
    }

    /// The Keycloak installation directory.
    pub fn kcbase(&self) -> &Path {
        &self.kcbase
    }

    /// Whether this handle owns a running server process.
    pub fn is_running(&self) -> bool {
        self.child.is_some()
    }

    /// Start the server and wait until it reports ready.
    ///
    /// Does nothing if this handle already started it. When hskc runs as
    /// root the server drops to `run_as_uid`.
    pub fn start(&mut self) -> Result<()> {
        if self.is_running() {
            return Ok(());
        }

        tracing::info!("Starting KeyCloak...");
        let mut options = CommandOptions::default();
        if is_elevated() {
            options.run_as_uid = self.run_as_uid;
        }
        self.child = Some(shell::spawn(&self.start_command, &options)?);

        if let Err(err) = self.wait_ready() {
            self.stop()?;
            return Err(err);
        }

        tracing::info!("...Started KeyCloak!");
        Ok(())
    }

    /// Ask the management interface whether the server is running.
    ///
    /// Ready means: the CLI exited 0, printed JSON, and that JSON says
    /// `"outcome": "success"` with `"result": "running"`.
    pub fn is_ready(&self) -> bool {
        let result = match self.jboss_cli("is-kc-up", "connect\n:read-attribute(name=server-state)")
        {
            Ok(result) => result,
            Err(err) => {
                tracing::debug!("Keycloak is_ready check could not run: {}", err);
                return false;
            }
        };

        tracing::debug!(
            "Keycloak is_ready check. exitcode: {}. output:\n{}",
            result.code(),
            result.combined_output()
        );

        if !result.success {
            return false;
        }

        json_from_output(&result.stdout).is_some_and(|json| {
            json.get("outcome").and_then(|v| v.as_str()) == Some("success")
                && json.get("result").and_then(|v| v.as_str()) == Some("running")
        })
    }

    /// Poll [`is_ready`](Self::is_ready) at most `startup.retries` times.
    ///
    /// Fails early if the process this handle started has already exited.
    pub fn wait_ready(&mut self) -> Result<()> {
        tracing::info!("Waiting for keycloak to start....");
        let StartupPolicy { retries, interval } = self.startup;

        for attempt in 1..=retries {
            tracing::debug!("Checking if keycloak has started. Iteration #{}", attempt);

            if let Some(child) = self.child.as_mut() {
                if let Some(status) = child.try_wait()? {
                    self.child = None;
                    return Err(HskcError::CommandFailed {
                        command: self.start_command.join(" "),
                        code: status.code(),
                    });
                }
            }

            if self.is_ready() {
                tracing::info!("Keycloak startup wait took {} checks", attempt);
                return Ok(());
            }

            if attempt < retries {
                tracing::debug!("Going to sleep now for {:?}", interval);
                thread::sleep(interval);
            }
        }

        let seconds = self.startup.max_wait().as_secs();
        tracing::error!("Max wait time of {} seconds exceeded!", seconds);
        Err(HskcError::WaitTimeExceeded { seconds })
    }

    /// Stop the server this handle started.
    ///
    /// Returns `false` if it was not running.
    pub fn stop(&mut self) -> Result<bool> {
        let Some(mut child) = self.child.take() else {
            return Ok(false);
        };

        tracing::info!("Stopping KeyCloak...");
        if let Err(err) = shell::terminate(&mut child) {
            tracing::debug!("terminate failed ({}), killing", err);
            child.kill().ok();
        }
        child.wait()?;
        self.logged_in = false;
        tracing::info!("...Stopped KeyCloak!");
        Ok(true)
    }

    /// Stop (if running) and start again.
    pub fn restart(&mut self) -> Result<()> {
        tracing::info!("Restarting KeyCloak...");
        self.stop()?;
        self.start()?;
        tracing::info!("...Restarted KeyCloak!");
        Ok(())
    }

    /// Shut down any Keycloak listening on the local management port,
    /// including ones this handle did not start. Failures are ignored.
    pub fn kill(&self) {
        tracing::info!("Attempting to kill Keycloak...");
        match self.jboss_cli("shutdown", "connect\nshutdown") {
            Ok(result) => tracing::debug!("{}", result.combined_output()),
            Err(err) => tracing::debug!("shutdown failed: {}", err),
        }
        tracing::info!("...Done attempting to kill Keycloak!");
    }

    /// Block until the server process exits, returning its exit code.
    ///
    /// Returns `None` when this handle owns no process.
    pub fn wait(&mut self) -> Result<Option<i32>> {
        let Some(mut child) = self.child.take() else {
            return Ok(None);
        };
        let status = child.wait()?;
        self.logged_in = false;
        Ok(Some(status.code().unwrap_or(1)))
    }
}

impl Drop for KeycloakHandle {
    fn drop(&mut self) {
        if self.is_running() {
            tracing::warn!("Premature destruction of running keycloak handle! Calling stop.");
            if let Err(err) = self.stop() {
                tracing::warn!("Failed to stop keycloak: {}", err);
            }
        }
    }
}
