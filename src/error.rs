//! Error types for hskc operations.
//!
//! This module defines [`HskcError`], the primary error type used throughout
//! the installer, and a [`Result`] type alias for convenience.
//!
//! # Error Handling Strategy
//!
//! - Use `HskcError` for failures that need distinct handling or messages
//! - Use `anyhow::Error` (via `HskcError::Other`) for unexpected errors
//! - Vendor CLI failures carry the command and its full output
//! - Nothing here retries; callers decide whether a failure is fatal

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for hskc operations.
#[derive(Debug, Error)]
pub enum HskcError {
    /// A mandatory environment variable is unset or empty.
    #[error("EnVar {name} is empty")]
    MissingEnvVar { name: String },

    /// An environment variable holds a value that cannot be used.
    #[error("Invalid value for {name}: {message}")]
    InvalidEnvVar { name: String, message: String },

    /// Downloaded artifact does not match its expected checksum.
    #[error(
        "Checksum Mismatch.\nFile: {}\nExpected Checksum: {expected}\nActual Checksum: {actual}\nPlease delete {} and try again!",
        path.display(),
        path.display()
    )]
    ChecksumMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    /// Fetching an artifact over HTTP failed.
    #[error("Download of {url} failed: {message}")]
    Download { url: String, message: String },

    /// Reading or unpacking an archive failed.
    #[error("Archive {}: {message}", path.display())]
    Archive { path: PathBuf, message: String },

    /// The JBoss CLI exited non-zero.
    #[error("Error invoking jboss_cli.\nCommand Name: {name}\nExit Code: {code}\nCommands:\n{commands}\nOutput:\n{output}")]
    JbossCli {
        name: String,
        code: i32,
        commands: String,
        output: String,
    },

    /// The Keycloak admin CLI exited non-zero.
    #[error("Error invoking kcadm_cli.\nExit Code: {code}\nCLI Args:\n{args}\nOutput:\n{output}")]
    KcadmCli {
        code: i32,
        args: String,
        output: String,
    },

    /// A subprocess could not be spawned.
    #[error("Command failed with exit code {code:?}: {command}")]
    CommandFailed { command: String, code: Option<i32> },

    /// Readiness polling ran out of retries.
    #[error("Startup exceeds max wait time of {seconds} seconds")]
    WaitTimeExceeded { seconds: u64 },

    /// No way to start the server was configured.
    #[error("If execution_strategy is not docker or kcdist, provide a custom start command!")]
    UnknownStartCommand,

    /// The server mode is not one Keycloak understands.
    #[error("Keycloak Mode be one of standalone, standalone-ha or domain (got '{mode}')")]
    InvalidMode { mode: String },

    /// The server configuration file could not be read or updated.
    #[error("Server configuration {}: {message}", path.display())]
    ServerConfig { path: PathBuf, message: String },

    /// A step name given on the command line is not one hskc knows.
    #[error("Unknown step '{name}' (expected one of: {known})")]
    UnknownStep { name: String, known: String },

    /// An install step failed.
    #[error("Step '{step}' failed: {source}")]
    StepFailed {
        step: String,
        #[source]
        source: Box<HskcError>,
    },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for hskc operations.
pub type Result<T> = std::result::Result<T, HskcError>;
