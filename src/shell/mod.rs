//! Subprocess execution and platform helpers.

pub mod command;
pub mod platform;

pub use command::{display_command, execute, spawn, CommandOptions, CommandResult};
pub use platform::{cli_suffix, is_ci, is_elevated, terminate};
