//! hskc - Install the HyperSign authenticator plugin into Keycloak.
//!
//! hskc is meant to run as a container entrypoint. It downloads and
//! verifies the plugin, installs its theme, configuration and JBoss module,
//! creates the authentication flow and execution through the Keycloak admin
//! CLI, and then keeps Keycloak in the foreground. Each step records a
//! marker when it succeeds so a restarted container does not repeat it.
//!
//! # Modules
//!
//! - [`archive`] - Gzipped tarball inspection and extraction
//! - [`cli`] - Command-line interface and argument parsing
//! - [`config`] - Environment-driven settings
//! - [`download`] - HTTP download with SHA-512 verification
//! - [`error`] - Error types and result aliases
//! - [`keycloak`] - Server lifecycle, `jboss-cli`, `kcadm` and `standalone.xml`
//! - [`secrets`] - Secret detection and output masking
//! - [`shell`] - Subprocess execution
//! - [`steps`] - Install steps and idempotency markers
//! - [`ui`] - Spinners, prompts, and terminal output
//!
//! # Example
//!
//! ```
//! use hskc::keycloak::server_config::{add_provider, read_providers};
//!
//! let xml = r#"<subsystem xmlns="urn:jboss:domain:keycloak-server:1.1"><providers></providers></subsystem>"#;
//! let updated = add_provider(xml, "module:hs-plugin-keycloak-ejb").unwrap();
//! assert_eq!(
//!     read_providers(&updated).unwrap(),
//!     vec!["module:hs-plugin-keycloak-ejb"]
//! );
//! ```

pub mod archive;
pub mod cli;
pub mod config;
pub mod download;
pub mod error;
pub mod keycloak;
pub mod secrets;
pub mod shell;
pub mod steps;
pub mod ui;

pub use error::{HskcError, Result};
