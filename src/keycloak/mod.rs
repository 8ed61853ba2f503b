//! The managed Keycloak server.
//!
//! [`KeycloakHandle`] owns everything hskc knows about one Keycloak
//! installation: where it lives, how to start it, the running child process
//! and the two vendor CLIs under `${KCBASE}/bin`. It is built from
//! [`Settings`](crate::config::Settings) and passed explicitly to every step.
//!
//! - [`handle`] - Process lifecycle and readiness polling
//! - [`jboss`] - `jboss-cli` scripts and JBoss modules
//! - [`kcadm`] - `kcadm` login, flows and executions
//! - [`server_config`] - The `<providers>` list in `<mode>.xml`
//! - [`files`] - Theme and configuration files

pub mod files;
pub mod handle;
pub mod jboss;
pub mod kcadm;
pub mod server_config;

pub use handle::KeycloakHandle;
pub use kcadm::{FlowSpec, ADMIN_REALM};

use serde_json::Value;

/// Parse the JSON document in a vendor CLI's output.
///
/// `jboss-cli --echo-command` prints the echoed commands before the JSON
/// result, so the whole output is tried first and then each line that opens
/// an object or array, first one first. A candidate that parses through to
/// the end of the output wins; otherwise the first one that parses at all.
pub fn json_from_output(output: &str) -> Option<Value> {
    if let Ok(value) = serde_json::from_str(output.trim()) {
        return Some(value);
    }

    let candidates: Vec<&str> = std::iter::once(0)
        .chain(output.match_indices('\n').map(|(i, _)| i + 1))
        .map(|i| &output[i..])
        .filter(|rest| rest.trim_start_matches([' ', '\t']).starts_with(['{', '[']))
        .collect();

    candidates
        .iter()
        .find_map(|rest| serde_json::from_str::<Value>(rest).ok())
        .or_else(|| {
            candidates.iter().find_map(|rest| {
                serde_json::Deserializer::from_str(rest)
                    .into_iter::<Value>()
                    .next()
                    .and_then(|r| r.ok())
            })
        })
}
