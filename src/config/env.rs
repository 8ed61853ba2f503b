//! Layered environment lookup.

use std::collections::HashMap;
use std::path::Path;

use crate::error::{HskcError, Result};
use crate::secrets::{SecretMatcher, MASK};

use super::env_file::EnvFileParser;

/// Where configuration values come from.
///
/// The process environment (when enabled) always wins over values loaded
/// from an env file.
#[derive(Debug, Clone, Default)]
pub struct EnvSource {
    vars: HashMap<String, String>,
    use_process_env: bool,
}

impl EnvSource {
    /// The process environment only.
    pub fn process() -> Self {
        Self {
            vars: HashMap::new(),
            use_process_env: true,
        }
    }

    /// The process environment layered over an env file.
    pub fn with_env_file(path: &Path) -> Result<Self> {
        let vars = EnvFileParser::load(path)?;
        tracing::debug!("Loaded {} variables from {}", vars.len(), path.display());
        Ok(Self {
            vars,
            use_process_env: true,
        })
    }

    /// A fixed set of variables, ignoring the process environment.
    pub fn from_map(vars: HashMap<String, String>) -> Self {
        Self {
            vars,
            use_process_env: false,
        }
    }

    /// Look up a variable.
    pub fn get(&self, key: &str) -> Option<String> {
        if self.use_process_env {
            if let Ok(value) = std::env::var(key) {
                return Some(value);
            }
        }
        self.vars.get(key).cloned()
    }

    /// Look up a variable, treating empty values as unset.
    pub fn get_non_empty(&self, key: &str) -> Option<String> {
        self.get(key).filter(|v| !v.is_empty())
    }

    /// Look up a mandatory variable.
    pub fn require(&self, key: &str) -> Result<String> {
        self.get_non_empty(key).ok_or_else(|| HskcError::MissingEnvVar {
            name: key.to_string(),
        })
    }
}

/// Check that every variable in `names` is set and non-empty.
///
/// Each variable is logged as `NAME = value` with secrets masked. Fails on
/// the first missing variable.
pub fn check_env(source: &EnvSource, names: &[&str]) -> Result<()> {
    tracing::info!("Performing Mandatory Environment Variable Check...");
    let matcher = SecretMatcher::with_builtins();

    for name in names {
        let value = source.get(name);
        let shown = match &value {
            Some(v) if matcher.is_secret(name) && !v.is_empty() => MASK.to_string(),
            Some(v) => v.clone(),
            None => "<unset>".to_string(),
        };
        tracing::info!("{} = {}", name, shown);

        if value.as_deref().is_none_or(str::is_empty) {
            tracing::error!("Exiting because {} is empty", name);
            return Err(HskcError::MissingEnvVar {
                name: name.to_string(),
            });
        }
    }

    tracing::info!("...Mandatory Environment Variable Check Completed!");
    Ok(())
}
