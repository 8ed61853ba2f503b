//! JBoss CLI scripts and module management.
//!
//! Every invocation writes its commands to `${KCBASE}/<name>.hskc.jboss.cli`
//! and runs `jboss-cli --echo-command --output-json --file=<script>`. The
//! script is left on disk so it can be re-run by hand when debugging.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{HskcError, Result};
use crate::shell::{self, CommandOptions, CommandResult};

use super::KeycloakHandle;

impl KeycloakHandle {
    /// Path of the script file for a named jboss-cli invocation.
    pub fn jboss_script_path(&self, name: &str) -> PathBuf {
        self.kcbase.join(format!("{}.hskc.jboss.cli", name))
    }

    /// Run `commands` through jboss-cli. A non-zero exit is not an error.
    pub fn jboss_cli(&self, name: &str, commands: &str) -> Result<CommandResult> {
        let script = self.jboss_script_path(name);
        fs::write(&script, commands)?;

        let file_arg = format!("--file={}", script.display());
        shell::execute(
            &self.jboss_cli,
            &["--echo-command", "--output-json", file_arg.as_str()],
            &CommandOptions::captured(),
        )
    }

    /// Run `commands` through jboss-cli, failing on a non-zero exit.
    pub fn jboss_cli_checked(&self, name: &str, commands: &str) -> Result<String> {
        let result = self.jboss_cli(name, commands)?;
        if !result.success {
            return Err(HskcError::JbossCli {
                name: name.to_string(),
                code: result.code(),
                commands: self.masker.mask(commands),
                output: self.masker.mask(&result.combined_output()),
            });
        }
        Ok(result.combined_output())
    }

    /// Directory of a JBoss module under `${KCBASE}/modules`.
    pub fn module_dir(&self, module_name: &str) -> PathBuf {
        self.kcbase.join("modules").join(module_name)
    }

    /// Remove a module's directory. Returns `false` if it did not exist.
    pub fn delete_module(&self, module_name: &str) -> Result<bool> {
        let dir = self.module_dir(module_name);
        if !dir.exists() {
            return Ok(false);
        }
        tracing::info!("Removing directory {}", dir.display());
        fs::remove_dir_all(&dir)?;
        Ok(true)
    }

    /// Package `jar` as a JBoss module with the given dependencies.
    ///
    /// See Keycloak's server development guide, "Register a provider using
    /// modules".
    pub fn add_module(&self, module_name: &str, jar: &Path, dependencies: &[&str]) -> Result<()> {
        let commands = format!(
            "module add --name={} --resources={} --dependencies={}",
            module_name,
            jar.display(),
            dependencies.join(",")
        );
        self.jboss_cli_checked(&format!("add_module_{}", module_name), &commands)?;
        Ok(())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::super::testing::*;
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn add_module_writes_script_and_invokes_cli() {
        let temp = TempDir::new().unwrap();
        let kcbase = fake_kcbase(temp.path());
        ready_jboss_cli(&kcbase);
        let kc = KeycloakHandle::new(&settings_for(&kcbase, "sleep 30"));

        kc.add_module("hs-plugin", Path::new("/w/hs.jar"), &["a.b", "c.d"])
            .unwrap();

        let expected = "module add --name=hs-plugin --resources=/w/hs.jar --dependencies=a.b,c.d";
        let script = fs::read_to_string(kc.jboss_script_path("add_module_hs-plugin")).unwrap();
        assert_eq!(script, expected);
        let log = fs::read_to_string(kcbase.join("bin/jboss-cli.sh.log")).unwrap();
        assert!(log.contains(expected));
    }

    #[test]
    fn failing_cli_surfaces_command_and_output() {
        let temp = TempDir::new().unwrap();
        let kcbase = fake_kcbase(temp.path());
        write_script(
            &kcbase.join("bin/jboss-cli.sh"),
            "echo 'WFLYPRT0053: Could not connect' >&2\nexit 1",
        );
        let kc = KeycloakHandle::new(&settings_for(&kcbase, "sleep 30"));

        let err = kc.jboss_cli_checked("probe", "connect").unwrap_err();
        match err {
            HskcError::JbossCli {
                name,
                code,
                commands,
                output,
            } => {
                assert_eq!(name, "probe");
                assert_eq!(code, 1);
                assert_eq!(commands, "connect");
                assert!(output.contains("WFLYPRT0053"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn delete_module_reports_presence() {
        let temp = TempDir::new().unwrap();
        let kcbase = fake_kcbase(temp.path());
        let kc = KeycloakHandle::new(&settings_for(&kcbase, "sleep 30"));

        assert!(!kc.delete_module("hs-plugin").unwrap());

        let dir = kc.module_dir("hs-plugin").join("main");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("module.xml"), "<module/>").unwrap();

        assert!(kc.delete_module("hs-plugin").unwrap());
        assert!(!kc.module_dir("hs-plugin").exists());
    }
}
