//! hskc CLI entry point.

use std::process::ExitCode;

use clap::Parser;
use hskc::cli::{Cli, CommandDispatcher};
use hskc::config::EnvSource;
use hskc::shell::is_ci;
use hskc::ui::{create_ui, OutputMode};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the tracing subscriber for logging.
///
/// Log level is controlled by:
/// 1. `--debug` flag sets level to DEBUG
/// 2. `RUST_LOG` environment variable (if set)
/// 3. Default is INFO
fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("hskc=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("hskc=info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    tracing::debug!("hskc starting with args: {:?}", cli);

    let output_mode = OutputMode::from_flags(cli.verbose, cli.quiet);
    let mut ui = create_ui(!is_ci(), output_mode, cli.no_color);

    let env = match &cli.env_file {
        Some(path) => match EnvSource::with_env_file(path) {
            Ok(env) => env,
            Err(e) => {
                ui.error(&format!("Error: {}", e));
                return ExitCode::from(1);
            }
        },
        None => EnvSource::process(),
    };

    let dispatcher = CommandDispatcher::new(env, cli.state_dir.clone());

    match dispatcher.dispatch(&cli, ui.as_mut()) {
        Ok(result) => ExitCode::from(result.exit_code.clamp(0, 255) as u8),
        Err(e) => {
            ui.error(&format!("Error: {}", e));
            ExitCode::from(1)
        }
    }
}
