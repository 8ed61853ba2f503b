//! Installer configuration.
//!
//! hskc is configured through environment variables, the way a container
//! entrypoint is. An optional `KEY=value` file can supply defaults beneath
//! the process environment.
//!
//! - [`env_file`] - `.env` style file parsing
//! - [`env`] - Layered environment lookup and the mandatory variable check
//! - [`settings`] - Typed settings resolved from the environment
//!
//! # Example
//!
//! ```
//! use hskc::config::{EnvFileParser, EnvSource};
//!
//! let vars = EnvFileParser::parse("KCBASE=/opt/jboss/keycloak\n").unwrap();
//! let source = EnvSource::from_map(vars);
//! assert_eq!(source.get("KCBASE").as_deref(), Some("/opt/jboss/keycloak"));
//! ```

pub mod env;
pub mod env_file;
pub mod settings;

pub use env::{check_env, EnvSource};
pub use env_file::EnvFileParser;
pub use settings::{
    ExecutionStrategy, KeycloakMode, PluginSettings, Settings, StartupPolicy, OPTIONAL_ENV,
    REQUIRED_ENV,
};
