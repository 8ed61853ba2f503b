//! Command dispatching.
//!
//! This module provides the core command infrastructure:
//! - [`Command`] trait for implementing commands
//! - [`CommandResult`] for uniform result reporting
//! - [`CommandDispatcher`] for routing CLI subcommands

use std::path::{Path, PathBuf};

use crate::cli::args::{Cli, Commands, InstallArgs};
use crate::config::{EnvSource, Settings};
use crate::error::{HskcError, Result};
use crate::ui::UserInterface;

/// Trait for command implementations.
///
/// Each CLI subcommand implements this trait to provide its execution logic.
pub trait Command {
    /// Execute the command.
    ///
    /// # Arguments
    ///
    /// * `ui` - User interface for displaying output and prompts
    ///
    /// # Returns
    ///
    /// A [`CommandResult`] indicating success/failure and exit code.
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult>;
}

/// Result of command execution.
#[derive(Debug)]
pub struct CommandResult {
    /// Whether the command succeeded.
    pub success: bool,

    /// Exit code to use (0 for success, non-zero for failure).
    pub exit_code: i32,
}

impl CommandResult {
    /// Create a successful result.
    pub fn success() -> Self {
        Self {
            success: true,
            exit_code: 0,
        }
    }

    /// Create a failure result.
    pub fn failure(exit_code: i32) -> Self {
        Self {
            success: false,
            exit_code,
        }
    }
}

/// Resolve settings, honouring a `--state-dir` override.
pub(crate) fn load_settings(env: &EnvSource, state_dir: Option<&Path>) -> Result<Settings> {
    let settings = Settings::from_env(env)?;
    Ok(match state_dir {
        Some(dir) => settings.with_state_dir(dir),
        None => settings,
    })
}

/// Find the marker directory without requiring the full environment.
///
/// `--state-dir`, then `HSKC_STATE_DIR`, then `$KCBASE/.hskc`.
pub(crate) fn resolve_state_dir(env: &EnvSource, state_dir: Option<&Path>) -> Result<PathBuf> {
    if let Some(dir) = state_dir {
        return Ok(dir.to_path_buf());
    }
    if let Some(dir) = env.get_non_empty("HSKC_STATE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    match env.get_non_empty("KCBASE") {
        Some(kcbase) => Ok(PathBuf::from(kcbase).join(".hskc")),
        None => Err(HskcError::MissingEnvVar {
            name: "KCBASE".to_string(),
        }),
    }
}

/// Dispatches CLI commands to their implementations.
pub struct CommandDispatcher {
    env: EnvSource,
    state_dir: Option<PathBuf>,
}

impl CommandDispatcher {
    /// Create a dispatcher reading configuration from `env`.
    pub fn new(env: EnvSource, state_dir: Option<PathBuf>) -> Self {
        Self { env, state_dir }
    }

    /// The configuration source commands read from.
    pub fn env(&self) -> &EnvSource {
        &self.env
    }

    /// Dispatch and execute a command.
    ///
    /// Routes the CLI subcommand to the appropriate command implementation
    /// and executes it.
    pub fn dispatch(&self, cli: &Cli, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let state_dir = self.state_dir.clone();
        match &cli.command {
            Some(Commands::Install(args)) => {
                let cmd =
                    super::install::InstallCommand::new(self.env.clone(), state_dir, args.clone());
                cmd.execute(ui)
            }
            Some(Commands::Status(args)) => {
                let cmd =
                    super::status::StatusCommand::new(self.env.clone(), state_dir, args.clone());
                cmd.execute(ui)
            }
            Some(Commands::Reset(args)) => {
                let cmd =
                    super::reset::ResetCommand::new(self.env.clone(), state_dir, args.clone());
                cmd.execute(ui)
            }
            Some(Commands::Checksum(args)) => {
                let cmd = super::checksum::ChecksumCommand::new(args.clone());
                cmd.execute(ui)
            }
            Some(Commands::EnvCheck) => {
                let cmd = super::env_check::EnvCheckCommand::new(self.env.clone());
                cmd.execute(ui)
            }
            Some(Commands::Serve) => {
                let cmd = super::serve::ServeCommand::new(self.env.clone(), state_dir);
                cmd.execute(ui)
            }
            Some(Commands::Completions(args)) => {
                let cmd = super::completions::CompletionsCommand::new(args.clone());
                cmd.execute(ui)
            }
            None => {
                // Default to install with default args
                let cmd = super::install::InstallCommand::new(
                    self.env.clone(),
                    state_dir,
                    InstallArgs::default(),
                );
                cmd.execute(ui)
            }
        }
    }
}
