//! Integration tests for the hskc binary.
// The cargo_bin function is marked deprecated in favor of cargo_bin! macro,
// but both work correctly. Suppressing until assert_cmd stabilizes the new API.
#![allow(deprecated)]

use assert_cmd::cargo::cargo_bin;
use assert_cmd::Command;
use hskc::config::REQUIRED_ENV;
use hskc::steps::StepMarkers;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const ABC_SHA512: &str = "ddaf35a193617abacc417349ae20413112e6fa4e89a97ea20a9eeee64b55d39a2192992a274fc1a836ba3c23a3feebbd454d4423643ce80e2a9ac94fa54ca49f";

/// A command with none of the installer's variables inherited.
fn hskc() -> Command {
    let mut cmd = Command::new(cargo_bin("hskc"));
    cmd.env_clear();
    if let Ok(path) = std::env::var("PATH") {
        cmd.env("PATH", path);
    }
    cmd
}

/// An env file setting every mandatory variable.
fn write_env_file(dir: &Path) -> std::path::PathBuf {
    let mut content = String::from("# installer settings\n");
    for name in REQUIRED_ENV {
        let value = match *name {
            "KC_EXECUTION_STRATEGY" => "kcdist".to_string(),
            "KCBASE" => dir.join("keycloak").to_string_lossy().to_string(),
            other => format!("{}-value", other.to_lowercase()),
        };
        content.push_str(&format!("{}={}\n", name, value));
    }
    let path = dir.join("hskc.env");
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn cli_shows_help() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = hskc();
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("HyperSign"))
        .stdout(predicate::str::contains("env-check"));
    Ok(())
}

#[test]
fn cli_shows_version() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = hskc();
    cmd.arg("--version");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
    Ok(())
}

#[test]
fn cli_rejects_unknown_subcommand() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = hskc();
    cmd.arg("deploy");
    cmd.assert().failure();
    Ok(())
}

#[test]
fn checksum_prints_sha512sum_line() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    let file = temp.path().join("abc.txt");
    fs::write(&file, "abc")?;

    let mut cmd = hskc();
    cmd.arg("checksum").arg(&file);
    cmd.assert()
        .success()
        .stdout(predicate::str::starts_with(format!("{}  ", ABC_SHA512)));
    Ok(())
}

#[test]
fn checksum_match_exits_zero() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    let file = temp.path().join("abc.txt");
    fs::write(&file, "abc")?;

    let mut cmd = hskc();
    cmd.arg("checksum")
        .arg(&file)
        .args(["--expect", &ABC_SHA512.to_uppercase()]);
    cmd.assert().success();
    Ok(())
}

#[test]
fn checksum_mismatch_exits_one() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    let file = temp.path().join("abc.txt");
    fs::write(&file, "abd")?;

    let mut cmd = hskc();
    cmd.arg("checksum").arg(&file).args(["--expect", ABC_SHA512]);
    cmd.assert()
        .code(1)
        .stderr(predicate::str::contains("Checksum Mismatch"))
        .stderr(predicate::str::contains("Please delete"));
    Ok(())
}

#[test]
fn env_check_fails_on_first_missing_variable() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = hskc();
    cmd.arg("env-check");
    cmd.assert()
        .code(1)
        .stderr(predicate::str::contains("EnVar DB_VENDOR is empty"));
    Ok(())
}

#[test]
fn env_check_treats_empty_as_missing() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    let env_file = write_env_file(temp.path());

    let mut cmd = hskc();
    cmd.arg("--env-file")
        .arg(&env_file)
        .arg("env-check")
        .env("KC_BASEURL", "");
    cmd.assert()
        .code(1)
        .stderr(predicate::str::contains("EnVar KC_BASEURL is empty"));
    Ok(())
}

#[test]
fn env_check_passes_with_env_file() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    let env_file = write_env_file(temp.path());

    let mut cmd = hskc();
    cmd.arg("env-check").env("HSKC_ENV_FILE", &env_file);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("mandatory environment variables are set"));
    Ok(())
}

#[test]
fn env_check_never_logs_passwords() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    let env_file = write_env_file(temp.path());

    let mut cmd = hskc();
    cmd.arg("--env-file").arg(&env_file).arg("env-check");
    cmd.assert()
        .success()
        .stderr(predicate::str::contains("KEYCLOAK_USER = keycloak_user-value"))
        .stderr(predicate::str::contains("keycloak_password-value").not())
        .stderr(predicate::str::contains("db_password-value").not());
    Ok(())
}

#[test]
fn missing_env_file_exits_one() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;

    let mut cmd = hskc();
    cmd.arg("--env-file")
        .arg(temp.path().join("absent.env"))
        .arg("env-check");
    cmd.assert().code(1);
    Ok(())
}

#[test]
fn install_rejects_unknown_step() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    let env_file = write_env_file(temp.path());

    let mut cmd = hskc();
    cmd.arg("--env-file")
        .arg(&env_file)
        .args(["install", "--only", "deploy", "--no-serve"]);
    cmd.assert()
        .code(1)
        .stderr(predicate::str::contains("Unknown step 'deploy'"));
    Ok(())
}

#[test]
fn install_without_environment_exits_one() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = hskc();
    cmd.args(["install", "--no-serve"]);
    cmd.assert()
        .code(1)
        .stderr(predicate::str::contains("EnVar DB_VENDOR is empty"));
    Ok(())
}

#[test]
fn status_json_reports_markers() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    StepMarkers::new(temp.path()).mark_complete("ensure-flow")?;

    let mut cmd = hskc();
    cmd.arg("status").arg("--json").arg("--state-dir").arg(temp.path());
    let output = cmd.assert().success().get_output().stdout.clone();

    let json: serde_json::Value = serde_json::from_slice(&output)?;
    let steps = json["steps"].as_array().unwrap();
    assert_eq!(steps.len(), 3);
    assert_eq!(steps[0]["name"], "download-install");
    assert_eq!(steps[0]["complete"], false);
    assert_eq!(steps[1]["name"], "ensure-flow");
    assert_eq!(steps[1]["complete"], true);
    assert!(steps[1]["completed_at"].is_string());
    Ok(())
}

#[test]
fn status_uses_kcbase_for_default_state_dir() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    StepMarkers::new(temp.path().join(".hskc")).mark_complete("download-install")?;

    let mut cmd = hskc();
    cmd.arg("status").env("KCBASE", temp.path());
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("download-install"))
        .stdout(predicate::str::contains("pending"));
    Ok(())
}

#[test]
fn reset_removes_one_marker() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    let markers = StepMarkers::new(temp.path());
    markers.mark_complete("ensure-flow")?;
    markers.mark_complete("create-execution")?;

    let mut cmd = hskc();
    cmd.args(["reset", "ensure-flow"])
        .env("HSKC_STATE_DIR", temp.path());
    cmd.assert().success();

    assert!(!markers.is_complete("ensure-flow"));
    assert!(markers.is_complete("create-execution"));
    Ok(())
}

#[test]
fn reset_all_with_yes() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    let markers = StepMarkers::new(temp.path());
    markers.mark_complete("download-install")?;
    markers.mark_complete("ensure-flow")?;

    let mut cmd = hskc();
    cmd.args(["reset", "--all", "--yes", "--state-dir"])
        .arg(temp.path());
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Removed 2 step markers"));

    assert!(markers.list()?.is_empty());
    Ok(())
}

#[test]
fn reset_all_honors_prompt_answer_from_env() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    let markers = StepMarkers::new(temp.path());
    markers.mark_complete("download-install")?;

    let mut cmd = hskc();
    cmd.args(["reset", "--all", "--state-dir"])
        .arg(temp.path())
        .env("HSKC_PROMPT_RESET_ALL", "no");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Cancelled"));
    assert!(markers.is_complete("download-install"));

    let mut cmd = hskc();
    cmd.args(["reset", "--all", "--state-dir"]).arg(temp.path());
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Removed 1 step markers"));
    assert!(markers.list()?.is_empty());
    Ok(())
}

#[test]
fn reset_unknown_step_exits_one() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;

    let mut cmd = hskc();
    cmd.args(["reset", "deploy", "--state-dir"]).arg(temp.path());
    cmd.assert()
        .code(1)
        .stderr(predicate::str::contains("Unknown step"));
    Ok(())
}

#[test]
fn completions_generate_for_bash() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = hskc();
    cmd.args(["completions", "bash"]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("hskc"));
    Ok(())
}

#[test]
fn quiet_mode_suppresses_status_output() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    let markers = StepMarkers::new(temp.path());
    markers.mark_complete("ensure-flow")?;

    let mut cmd = hskc();
    cmd.args(["-q", "reset", "ensure-flow", "--state-dir"])
        .arg(temp.path());
    cmd.assert().success().stdout(predicate::str::is_empty());
    Ok(())
}
