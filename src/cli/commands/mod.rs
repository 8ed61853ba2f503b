//! CLI command implementations.
//!
//! Each command implements the [`Command`] trait, which provides a uniform
//! interface for executing commands and reporting results.
//!
//! # Architecture
//!
//! Commands are dispatched via [`CommandDispatcher`], which routes CLI
//! subcommands to their implementations. This allows:
//! - Single binary with subcommands (`hskc install`, `hskc status`)
//! - Shared initialization logic
//! - Consistent global flag handling

pub mod checksum;
pub mod completions;
pub mod dispatcher;
pub mod env_check;
pub mod install;
pub mod reset;
pub mod serve;
pub mod status;

pub use dispatcher::{Command, CommandDispatcher, CommandResult};
