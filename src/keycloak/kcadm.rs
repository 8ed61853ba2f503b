//! Keycloak admin CLI (`kcadm`).

use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{HskcError, Result};
use crate::shell::{self, CommandOptions, CommandResult};

use super::{json_from_output, KeycloakHandle};

/// Realm the admin user authenticates against.
pub const ADMIN_REALM: &str = "master";

/// An authentication flow to create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowSpec {
    pub alias: String,
    pub provider_id: String,
    pub description: String,
    pub top_level: bool,
    pub built_in: bool,
}

impl FlowSpec {
    /// A top-level, non-built-in `basic-flow` described by its alias.
    pub fn basic(alias: impl Into<String>) -> Self {
        let alias = alias.into();
        Self {
            description: alias.clone(),
            alias,
            provider_id: "basic-flow".to_string(),
            top_level: true,
            built_in: false,
        }
    }
}

#[derive(Debug, Deserialize)]
struct FlowRow {
    alias: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExecutionRow {
    display_name: Option<String>,
}

/// Pull the id out of `Created new flow with id '<id>'`.
pub fn parse_created_id(output: &str) -> Option<String> {
    let re = Regex::new(r"Created new \w+ with id '([^']+)'").ok()?;
    re.captures(output)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

impl KeycloakHandle {
    /// Run kcadm with `args`. A non-zero exit is not an error.
    pub fn kcadm<S: AsRef<str>>(&self, args: &[S]) -> Result<CommandResult> {
        let args: Vec<&str> = args.iter().map(|a| a.as_ref()).collect();
        let options = CommandOptions::captured().with_masker(self.masker.clone());
        shell::execute(&self.kcadm_cli, args.as_slice(), &options)
    }

    /// Run kcadm, failing on a non-zero exit. Returns the combined output.
    pub fn kcadm_checked<S: AsRef<str>>(&self, args: &[S]) -> Result<String> {
        let result = self.kcadm(args)?;
        if !result.success {
            return Err(self.kcadm_error(args, result.code(), &result.combined_output()));
        }
        Ok(result.combined_output())
    }

    /// Run kcadm and parse its stdout as JSON.
    ///
    /// Returns `None` when the command succeeded but printed no JSON.
    pub fn kcadm_json<S: AsRef<str>>(&self, args: &[S]) -> Result<Option<Value>> {
        let result = self.kcadm(args)?;
        if !result.success {
            return Err(self.kcadm_error(args, result.code(), &result.combined_output()));
        }
        Ok(json_from_output(&result.stdout))
    }

    fn kcadm_error<S: AsRef<str>>(&self, args: &[S], code: i32, output: &str) -> HskcError {
        let joined = args
            .iter()
            .map(|a| a.as_ref())
            .collect::<Vec<&str>>()
            .join(" ");
        HskcError::KcadmCli {
            code,
            args: self.masker.mask(&joined),
            output: self.masker.mask(output),
        }
    }

    /// Store admin credentials for subsequent kcadm calls.
    pub fn login(&mut self) -> Result<()> {
        tracing::info!("Logging into KeyCloak...");
        self.kcadm_checked(&[
            "config",
            "credentials",
            "--server",
            self.server_url.as_str(),
            "--realm",
            ADMIN_REALM,
            "--user",
            self.admin_user.as_str(),
            "--password",
            self.admin_password.as_str(),
        ])?;
        self.logged_in = true;
        tracing::info!("...Successfully logged into KeyCloak!");
        Ok(())
    }

    /// Log in unless this handle already did since the server last started.
    pub fn ensure_logged_in(&mut self) -> Result<()> {
        if self.logged_in {
            return Ok(());
        }
        self.login()
    }

    /// Aliases of every authentication flow in `realm`.
    pub fn list_flow_aliases(&self, realm: &str) -> Result<Vec<String>> {
        let args = [
            "get",
            "authentication/flows",
            "--fields",
            "alias",
            "--format",
            "json",
            "--noquotes",
            "-r",
            realm,
        ];
        let rows: Vec<FlowRow> = self.kcadm_rows(&args)?;
        Ok(rows.into_iter().filter_map(|r| r.alias).collect())
    }

    /// Create an authentication flow, returning its id when kcadm reports one.
    pub fn create_flow(&self, realm: &str, flow: &FlowSpec) -> Result<Option<String>> {
        let output = self.kcadm_checked(&[
            "create".to_string(),
            "authentication/flows".to_string(),
            "-s".to_string(),
            format!("alias={}", flow.alias),
            "-s".to_string(),
            format!("providerId={}", flow.provider_id),
            "-s".to_string(),
            format!("description={}", flow.description),
            "-s".to_string(),
            format!("topLevel={}", flow.top_level),
            "-s".to_string(),
            format!("builtIn={}", flow.built_in),
            "-r".to_string(),
            realm.to_string(),
        ])?;
        Ok(parse_created_id(&output))
    }

    /// Display names of the executions inside `flow`.
    pub fn list_execution_names(&self, realm: &str, flow: &str) -> Result<Vec<String>> {
        let path = format!("authentication/flows/{}/executions", flow);
        let args = [
            "get",
            path.as_str(),
            "--fields",
            "displayName",
            "--format",
            "json",
            "-r",
            realm,
        ];
        let rows: Vec<ExecutionRow> = self.kcadm_rows(&args)?;
        Ok(rows.into_iter().filter_map(|r| r.display_name).collect())
    }

    /// Add an execution for `provider` to `flow`, marked REQUIRED.
    pub fn create_execution(&self, realm: &str, flow: &str, provider: &str) -> Result<()> {
        let path = format!("authentication/flows/{}/executions/execution", flow);
        let provider = format!("provider={}", provider);
        self.kcadm_checked(&[
            "create",
            path.as_str(),
            "-r",
            realm,
            "-s",
            provider.as_str(),
            "-s",
            "requirement=REQUIRED",
        ])?;
        Ok(())
    }

    fn kcadm_rows<T: for<'de> Deserialize<'de>>(&self, args: &[&str]) -> Result<Vec<T>> {
        let json = self.kcadm_json(args)?.ok_or_else(|| HskcError::KcadmCli {
            code: 0,
            args: args.join(" "),
            output: "expected a JSON array".to_string(),
        })?;
        serde_json::from_value(json).map_err(|e| HskcError::KcadmCli {
            code: 0,
            args: args.join(" "),
            output: format!("unexpected JSON shape: {}", e),
        })
    }
}
