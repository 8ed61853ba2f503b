//! Subprocess execution.
//!
//! Vendor CLIs are invoked with an explicit argv, never through a shell,
//! so values such as flow names with spaces pass through untouched.

use crate::error::{HskcError, Result};
use crate::secrets::OutputMasker;
use std::ffi::OsStr;
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

/// Result of executing a command.
#[derive(Debug, Clone)]
pub struct CommandResult {
    /// Exit code (None if killed by signal).
    pub exit_code: Option<i32>,

    /// Standard output.
    pub stdout: String,

    /// Standard error.
    pub stderr: String,

    /// Execution duration.
    pub duration: Duration,

    /// Whether command succeeded (exit code 0).
    pub success: bool,
}

impl CommandResult {
    /// Exit code, with `-1` standing in for death by signal.
    pub fn code(&self) -> i32 {
        self.exit_code.unwrap_or(-1)
    }

    /// Stdout followed by stderr, trailing newline stripped.
    pub fn combined_output(&self) -> String {
        let mut out = self.stdout.clone();
        if !self.stderr.is_empty() {
            if !out.is_empty() && !out.ends_with('\n') {
                out.push('\n');
            }
            out.push_str(&self.stderr);
        }
        out.trim_end_matches('\n').to_string()
    }
}

/// Options for command execution.
#[derive(Debug, Clone, Default)]
pub struct CommandOptions {
    /// Capture stdout and stderr (if false, inherits from parent).
    pub capture: bool,

    /// Uid to switch to before exec (unix only).
    pub run_as_uid: Option<u32>,

    /// Masks secrets in the command line when it is logged or reported.
    pub masker: Option<OutputMasker>,
}

impl CommandOptions {
    /// Options that capture all output.
    pub fn captured() -> Self {
        Self {
            capture: true,
            ..Default::default()
        }
    }

    /// Mask secrets in the command line with `masker`.
    pub fn with_masker(mut self, masker: OutputMasker) -> Self {
        self.masker = Some(masker);
        self
    }

    fn shown<S: AsRef<OsStr>>(&self, program: impl AsRef<OsStr>, args: &[S]) -> String {
        let shown = display_command(program, args);
        match &self.masker {
            Some(masker) => masker.mask(&shown),
            None => shown,
        }
    }
}

/// Render a program and its arguments for messages.
pub fn display_command<S: AsRef<OsStr>>(program: impl AsRef<OsStr>, args: &[S]) -> String {
    std::iter::once(program.as_ref())
        .chain(args.iter().map(AsRef::as_ref))
        .map(|s| s.to_string_lossy().to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

fn build<S: AsRef<OsStr>>(
    program: impl AsRef<OsStr>,
    args: &[S],
    options: &CommandOptions,
) -> Command {
    let mut cmd = Command::new(program);
    cmd.args(args);

    #[cfg(unix)]
    if let Some(uid) = options.run_as_uid {
        use std::os::unix::process::CommandExt;
        cmd.uid(uid);
    }

    cmd
}

/// Execute a program and wait for it.
///
/// A non-zero exit is reported through [`CommandResult::success`], not as an
/// error; only a failure to spawn is an `Err`.
pub fn execute<S: AsRef<OsStr>>(
    program: impl AsRef<OsStr>,
    args: &[S],
    options: &CommandOptions,
) -> Result<CommandResult> {
    let start = Instant::now();
    let shown = options.shown(program.as_ref(), args);
    tracing::debug!("Executing: {}", shown);

    let mut cmd = build(program, args, options);
    if options.capture {
        cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
    } else {
        cmd.stdout(Stdio::inherit()).stderr(Stdio::inherit());
    }

    let output = cmd.output().map_err(|e| {
        tracing::debug!("Failed to spawn {}: {}", shown, e);
        HskcError::CommandFailed {
            command: shown.clone(),
            code: None,
        }
    })?;

    let result = CommandResult {
        exit_code: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        duration: start.elapsed(),
        success: output.status.success(),
    };
    tracing::debug!(
        "Finished {} with {:?} in {:?}",
        shown,
        result.exit_code,
        result.duration
    );

    Ok(result)
}

/// Spawn a long-running process with inherited stdio.
pub fn spawn(argv: &[String], options: &CommandOptions) -> Result<Child> {
    let (program, args) = argv.split_first().ok_or_else(|| HskcError::CommandFailed {
        command: String::new(),
        code: None,
    })?;
    let shown = options.shown(program, args);
    tracing::debug!("Spawning: {}", shown);

    build(program, args, options)
        .stdin(Stdio::null())
        .spawn()
        .map_err(|e| {
            tracing::debug!("Failed to spawn {}: {}", shown, e);
            HskcError::CommandFailed {
                command: shown,
                code: None,
            }
        })
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn captures_stdout() {
        let result = execute("echo", &["hello"], &CommandOptions::captured()).unwrap();
        assert!(result.success);
        assert_eq!(result.stdout.trim(), "hello");
    }

    #[test]
    fn reports_exit_code_without_erroring() {
        let result = execute("sh", &["-c", "exit 3"], &CommandOptions::captured()).unwrap();
        assert!(!result.success);
        assert_eq!(result.code(), 3);
    }

    #[test]
    fn combined_output_joins_streams() {
        let result = execute(
            "sh",
            &["-c", "echo out; echo err >&2"],
            &CommandOptions::captured(),
        )
        .unwrap();
        assert_eq!(result.combined_output(), "out\nerr");
    }

    #[test]
    fn arguments_are_not_split_by_a_shell() {
        let result = execute("printf", &["%s|", "a b"], &CommandOptions::captured()).unwrap();
        assert_eq!(result.stdout, "a b|");
    }

    #[test]
    fn missing_program_is_command_failed() {
        let err = execute(
            "/nonexistent/hskc-test-binary",
            &["x"],
            &CommandOptions::captured(),
        )
        .unwrap_err();
        assert!(matches!(err, HskcError::CommandFailed { code: None, .. }));
    }

    #[test]
    fn failed_command_line_is_masked() {
        let mut masker = OutputMasker::new();
        masker.add_secret("hunter2");
        let options = CommandOptions::captured().with_masker(masker);

        let err = execute("/nonexistent/kcadm.sh", &["--password", "hunter2"], &options)
            .unwrap_err()
            .to_string();
        assert!(err.contains("--password [REDACTED]"));
        assert!(!err.contains("hunter2"));
    }

    #[test]
    fn spawn_rejects_empty_argv() {
        let err = spawn(&[], &CommandOptions::default()).unwrap_err();
        assert!(matches!(err, HskcError::CommandFailed { .. }));
    }

    #[test]
    fn display_command_joins_args() {
        assert_eq!(display_command("kcadm.sh", &["get", "realms"]), "kcadm.sh get realms");
    }
}
