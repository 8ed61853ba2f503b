//! CLI argument definitions.
//!
//! This module defines all CLI arguments using clap's derive macros.
//! The main entry point is the [`Cli`] struct.

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// hskc - Install the HyperSign authenticator into Keycloak.
#[derive(Debug, Parser)]
#[command(name = "hskc")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Load KEY=value defaults from this file (process environment wins)
    #[arg(long, global = true, env = "HSKC_ENV_FILE", value_name = "FILE")]
    pub env_file: Option<PathBuf>,

    /// Directory holding step markers (default: $KCBASE/.hskc)
    #[arg(long, global = true, env = "HSKC_STATE_DIR", value_name = "DIR")]
    pub state_dir: Option<PathBuf>,

    /// Show verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Minimal output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Install the plugin and keep Keycloak running (default if no command specified)
    Install(InstallArgs),

    /// Show which install steps have completed
    Status(StatusArgs),

    /// Remove step markers so steps run again
    Reset(ResetArgs),

    /// Print the SHA-512 of a file
    Checksum(ChecksumArgs),

    /// Check that every mandatory environment variable is set
    EnvCheck,

    /// Start Keycloak in the foreground without running install steps
    Serve,

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Arguments for the `install` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct InstallArgs {
    /// Run only specified steps (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub only: Vec<String>,

    /// Force re-run of specified steps (comma-separated)
    #[arg(short, long, value_delimiter = ',')]
    pub force: Vec<String>,

    /// Stop Keycloak once the steps finish instead of staying in the foreground
    #[arg(long)]
    pub no_serve: bool,

    /// Shut down any Keycloak already listening locally before starting
    #[arg(long)]
    pub kill_existing: bool,
}

/// Arguments for the `status` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct StatusArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `reset` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct ResetArgs {
    /// Step whose marker to remove
    #[arg(required_unless_present = "all", conflicts_with = "all")]
    pub step: Option<String>,

    /// Remove every marker
    #[arg(long)]
    pub all: bool,

    /// Don't prompt for confirmation
    #[arg(short, long)]
    pub yes: bool,
}

/// Arguments for the `checksum` command.
#[derive(Debug, Clone, clap::Args)]
pub struct ChecksumArgs {
    /// File to hash
    pub file: PathBuf,

    /// Expected SHA-512 (hex); exit 1 when it differs
    #[arg(long, value_name = "HEX")]
    pub expect: Option<String>,
}

/// Arguments for the `completions` command.
#[derive(Debug, Clone, clap::Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn no_subcommand_means_install() {
        let cli = Cli::try_parse_from(["hskc"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn install_lists_are_comma_separated() {
        let cli = Cli::try_parse_from([
            "hskc",
            "install",
            "--only",
            "ensure-flow,create-execution",
            "--force",
            "ensure-flow",
            "--no-serve",
        ])
        .unwrap();

        match cli.command {
            Some(Commands::Install(args)) => {
                assert_eq!(args.only, vec!["ensure-flow", "create-execution"]);
                assert_eq!(args.force, vec!["ensure-flow"]);
                assert!(args.no_serve);
                assert!(!args.kill_existing);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn global_flags_work_after_subcommand() {
        let cli =
            Cli::try_parse_from(["hskc", "status", "--state-dir", "/tmp/m", "--json", "-q"])
                .unwrap();
        assert_eq!(cli.state_dir, Some(PathBuf::from("/tmp/m")));
        assert!(cli.quiet);
        assert!(matches!(cli.command, Some(Commands::Status(StatusArgs { json: true }))));
    }

    #[test]
    fn reset_needs_step_or_all() {
        assert!(Cli::try_parse_from(["hskc", "reset"]).is_err());
        assert!(Cli::try_parse_from(["hskc", "reset", "ensure-flow", "--all"]).is_err());
        assert!(Cli::try_parse_from(["hskc", "reset", "--all", "--yes"]).is_ok());
    }

    #[test]
    fn verbose_and_quiet_conflict() {
        assert!(Cli::try_parse_from(["hskc", "-v", "-q", "env-check"]).is_err());
    }
}
