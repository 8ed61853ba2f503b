//! Typed installer settings.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{HskcError, Result};
use crate::shell::cli_suffix;

use super::env::{check_env, EnvSource};

/// Variables that must be set and non-empty before anything runs.
///
/// The `DB_*` values are consumed by the Keycloak container entrypoint
/// itself; they are checked here so a misconfigured container fails fast.
pub const REQUIRED_ENV: &[&str] = &[
    "DB_VENDOR",
    "DB_ADDR",
    "DB_DATABASE",
    "DB_USER",
    "DB_SCHEMA",
    "DB_PASSWORD",
    "KEYCLOAK_USER",
    "KEYCLOAK_PASSWORD",
    "KCBASE",
    "HS_REDIRECT_URI",
    "HS_CLIENT_ALIAS",
    "AUTHENTICATOR_BUILD_URL",
    "AUTHENTICATOR_CHECKSUM",
    "AUTH_FLOW_NAME",
    "HYPERSIGN_EXECUTION_NAME",
    "HS_AUTH_SERVER_ENDPOINT",
    "KC_EXECUTION_STRATEGY",
    "KC_BASEURL",
];

/// Optional variables, with their defaults where one exists.
pub const OPTIONAL_ENV: &[(&str, Option<&str>)] = &[
    ("KEYCLOAK_MODE", Some("standalone")),
    ("KC_START_COMMAND", None),
    ("KC_REALM", Some("master")),
    ("KC_RUN_AS_UID", Some("1000")),
    ("HYPERSIGN_WORKDIR", None),
    ("HSKC_STATE_DIR", None),
    ("HSKC_STARTUP_RETRIES", Some("20")),
    ("HSKC_STARTUP_INTERVAL_SECS", Some("5")),
    (
        "HS_AUTHENTICATOR_PROVIDER_ID",
        Some("hyerpsign-qrocde-authenticator"),
    ),
    ("HS_MODULE_NAME", Some("hs-plugin-keycloak-ejb")),
];

/// How Keycloak's server configuration is laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeycloakMode {
    #[default]
    Standalone,
    StandaloneHa,
    Domain,
}

impl KeycloakMode {
    /// Name used for the `<mode>.xml` configuration file.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Standalone => "standalone",
            Self::StandaloneHa => "standalone-ha",
            Self::Domain => "domain",
        }
    }
}

impl FromStr for KeycloakMode {
    type Err = HskcError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "standalone" => Ok(Self::Standalone),
            "standalone-ha" => Ok(Self::StandaloneHa),
            "domain" => Ok(Self::Domain),
            other => Err(HskcError::InvalidMode {
                mode: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for KeycloakMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the Keycloak process is launched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionStrategy {
    /// The official `jboss/keycloak` container image.
    Docker,
    /// The distribution bundle from keycloak.org.
    KcDist,
    /// Anything else; the argv comes from `KC_START_COMMAND`.
    Custom(Vec<String>),
}

impl ExecutionStrategy {
    /// Resolve a strategy name plus an optional custom command.
    pub fn resolve(name: &str, custom_command: Option<&str>) -> Result<Self> {
        match name {
            "docker" => Ok(Self::Docker),
            "kcdist" => Ok(Self::KcDist),
            _ => {
                let argv: Vec<String> = custom_command
                    .unwrap_or_default()
                    .split_whitespace()
                    .map(String::from)
                    .collect();
                if argv.is_empty() {
                    Err(HskcError::UnknownStartCommand)
                } else {
                    Ok(Self::Custom(argv))
                }
            }
        }
    }

    /// The argv used to start the server.
    pub fn start_command(&self, kcbase: &std::path::Path) -> Vec<String> {
        match self {
            Self::Docker => vec![
                "/opt/jboss/tools/docker-entrypoint.sh".to_string(),
                "-b".to_string(),
                "0.0.0.0".to_string(),
            ],
            Self::KcDist => vec![kcbase
                .join("bin")
                .join(format!("standalone.{}", cli_suffix()))
                .to_string_lossy()
                .to_string()],
            Self::Custom(argv) => argv.clone(),
        }
    }
}

/// Bounded-retry readiness polling parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartupPolicy {
    /// Maximum number of readiness checks.
    pub retries: u32,
    /// Sleep between failed checks.
    pub interval: Duration,
}

impl StartupPolicy {
    /// Upper bound on time spent sleeping while waiting.
    pub fn max_wait(&self) -> Duration {
        self.interval
            .checked_mul(self.retries)
            .unwrap_or(Duration::MAX)
    }
}

impl Default for StartupPolicy {
    fn default() -> Self {
        Self {
            retries: 20,
            interval: Duration::from_secs(5),
        }
    }
}

/// Where the plugin comes from and how it is wired into Keycloak.
#[derive(Debug, Clone)]
pub struct PluginSettings {
    /// URL of the plugin tarball.
    pub build_url: String,
    /// Expected SHA-512 of the tarball (hex).
    pub checksum: String,
    /// Written into `hypersign.properties` as `auth-server-endpoint`.
    pub auth_server_endpoint: String,
    /// JBoss module name the jar is registered under.
    pub module_name: String,
    /// Authenticator provider id used when creating the execution.
    pub provider_id: String,
}

/// Fully resolved installer settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub kcbase: PathBuf,
    pub mode: KeycloakMode,
    pub strategy: ExecutionStrategy,
    pub admin_user: String,
    pub admin_password: String,
    /// Server URL handed to `kcadm config credentials`.
    pub base_url: String,
    pub realm: String,
    /// Uid the server drops to when the installer runs as root.
    pub run_as_uid: Option<u32>,
    pub plugin: PluginSettings,
    pub flow_name: String,
    pub execution_name: String,
    /// Downloads and extracted archives live here.
    pub workdir: PathBuf,
    /// Step markers live here.
    pub state_dir: PathBuf,
    pub startup: StartupPolicy,
}

impl Settings {
    /// Resolve settings, failing on the first missing mandatory variable.
    pub fn from_env(source: &EnvSource) -> Result<Self> {
        check_env(source, REQUIRED_ENV)?;

        let kcbase = PathBuf::from(source.require("KCBASE")?);
        let mode = source
            .get_non_empty("KEYCLOAK_MODE")
            .unwrap_or_else(|| "standalone".to_string())
            .parse()?;
        let strategy = ExecutionStrategy::resolve(
            &source.require("KC_EXECUTION_STRATEGY")?,
            source.get_non_empty("KC_START_COMMAND").as_deref(),
        )?;

        let workdir = match source.get_non_empty("HYPERSIGN_WORKDIR") {
            Some(dir) => PathBuf::from(dir),
            None => std::env::current_dir()?,
        };
        let state_dir = source
            .get_non_empty("HSKC_STATE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| kcbase.join(".hskc"));

        let run_as_uid = match source.get("KC_RUN_AS_UID") {
            Some(v) if v.is_empty() => None,
            Some(v) => Some(parse_number("KC_RUN_AS_UID", &v)?),
            None => Some(1000),
        };

        let defaults = StartupPolicy::default();
        let startup = StartupPolicy {
            retries: match source.get_non_empty("HSKC_STARTUP_RETRIES") {
                Some(v) => parse_number("HSKC_STARTUP_RETRIES", &v)?,
                None => defaults.retries,
            },
            interval: match source.get_non_empty("HSKC_STARTUP_INTERVAL_SECS") {
                Some(v) => Duration::from_secs(parse_number("HSKC_STARTUP_INTERVAL_SECS", &v)?),
                None => defaults.interval,
            },
        };

        Ok(Self {
            mode,
            strategy,
            admin_user: source.require("KEYCLOAK_USER")?,
            admin_password: source.require("KEYCLOAK_PASSWORD")?,
            base_url: source.require("KC_BASEURL")?,
            realm: source
                .get_non_empty("KC_REALM")
                .unwrap_or_else(|| "master".to_string()),
            run_as_uid,
            plugin: PluginSettings {
                build_url: source.require("AUTHENTICATOR_BUILD_URL")?,
                checksum: source.require("AUTHENTICATOR_CHECKSUM")?,
                auth_server_endpoint: source.require("HS_AUTH_SERVER_ENDPOINT")?,
                module_name: source
                    .get_non_empty("HS_MODULE_NAME")
                    .unwrap_or_else(|| "hs-plugin-keycloak-ejb".to_string()),
                provider_id: source
                    .get_non_empty("HS_AUTHENTICATOR_PROVIDER_ID")
                    .unwrap_or_else(|| "hyerpsign-qrocde-authenticator".to_string()),
            },
            flow_name: source.require("AUTH_FLOW_NAME")?,
            execution_name: source.require("HYPERSIGN_EXECUTION_NAME")?,
            workdir,
            state_dir,
            startup,
            kcbase,
        })
    }

    /// Override the marker directory (from `--state-dir`).
    pub fn with_state_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.state_dir = dir.into();
        self
    }
}

fn parse_number<T: FromStr>(name: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| HskcError::InvalidEnvVar {
        name: name.to_string(),
        message: format!("'{}' is not a valid number", value),
    })
}
