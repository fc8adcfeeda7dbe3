//! CLI integration tests for the `regel` binary.
//!
//! Uses `assert_cmd` to spawn the binary and verify exit codes, stdout
//! content, and stderr content.

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn regel() -> Command {
    let mut cmd = cargo_bin_cmd!("regel");
    cmd.env_remove("REGEL_LOG");
    cmd
}

// ──────────────────────────────────────────────
// 1. Help and version
// ──────────────────────────────────────────────

#[test]
fn help_exits_0_with_description() {
    regel()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Periodized rule runs"));
}

#[test]
fn version_exits_0() {
    regel()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("regel"));
}

// ──────────────────────────────────────────────
// 2. run
// ──────────────────────────────────────────────

#[test]
fn run_prints_one_line_per_sub_period() {
    regel()
        .arg("run")
        .arg(fixture("grunnlag.json"))
        .args(["--from", "2024-01-01", "--to", "2025-01-01"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "[2024-01-01, 2024-07-01)  TILBAKEKREVING  differanse 1500",
        ))
        .stdout(predicate::str::contains(
            "[2024-07-01, 2025-01-01)  ETTERBETALING  differanse -500",
        ))
        .stdout(predicate::str::contains("engine regel-engine/"));
}

#[test]
fn run_json_is_parseable() {
    let output = regel()
        .args(["--output", "json", "run"])
        .arg(fixture("grunnlag.json"))
        .args(["--from", "2024-01-01", "--to", "2025-01-01"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["status"], "success");
    let results = value["results"].as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[1]["outcome"], "ETTERBETALING");
    assert_eq!(results[1]["period"]["from"], "2024-07-01");
    assert!(value["engine_version"]
        .as_str()
        .unwrap()
        .contains("+sha256:"));
}

#[test]
fn open_ended_run_ends_open() {
    regel()
        .arg("run")
        .arg(fixture("grunnlag.json"))
        .args(["--from", "2024-07-01"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[2025-01-01, ...)"));
}

#[test]
fn run_before_first_rettsgebyr_exits_2() {
    regel()
        .arg("run")
        .arg(fixture("grunnlag.json"))
        .args(["--from", "2022-06-01", "--to", "2023-06-01"])
        .assert()
        .code(2)
        .stdout(predicate::str::contains("RETTSGEBYR@2024.1"))
        .stdout(predicate::str::contains("[2022-06-01, 2023-01-01)"))
        .stdout(predicate::str::contains("TILBAKEKREVING").not());
}

#[test]
fn invalid_run_json_lists_offending_rules() {
    let output = regel()
        .args(["--output", "json", "run"])
        .arg(fixture("grunnlag.json"))
        .args(["--from", "2022-06-01", "--to", "2023-06-01"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["status"], "invalid_for_period");
    assert_eq!(value["offending_rules"][0]["rule"]["id"], "RETTSGEBYR");
    assert_eq!(value["offending_rules"][0]["reason"], "no_valid_variant");
    assert_eq!(value["offending_rules"][0]["periods"][0]["to"], "2023-01-01");
}

#[test]
fn quiet_suppresses_output_but_keeps_exit_code() {
    regel()
        .args(["--quiet", "run"])
        .arg(fixture("grunnlag.json"))
        .args(["--from", "2022-06-01", "--to", "2023-06-01"])
        .assert()
        .code(2)
        .stdout(predicate::str::is_empty());
}

// ──────────────────────────────────────────────
// 3. explain
// ──────────────────────────────────────────────

#[test]
fn explain_shows_rules_and_fact_sources() {
    regel()
        .arg("explain")
        .arg(fixture("grunnlag.json"))
        .args(["--from", "2023-06-01", "--to", "2024-03-01"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[2023-06-01, 2024-01-01)"))
        .stdout(predicate::str::contains("Resultat av etteroppgjør"))
        .stdout(predicate::str::contains("RETTSGEBYR-2023@2024.1"))
        .stdout(predicate::str::contains("RETTSGEBYR-2024@2024.1"))
        .stdout(predicate::str::contains("from skatteoppgjør 2024"));
}

#[test]
fn explain_json_nests_children() {
    let output = regel()
        .args(["--output", "json", "explain"])
        .arg(fixture("grunnlag.json"))
        .args(["--from", "2024-01-01", "--to", "2024-02-01"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let root = &value["results"][0]["explanation"];
    assert_eq!(root["rule"]["id"], "ETTEROPPGJOER-RESULTAT");
    assert_eq!(root["children"].as_array().unwrap().len(), 3);
}

// ──────────────────────────────────────────────
// 4. rules
// ──────────────────────────────────────────────

#[test]
fn rules_lists_every_reference() {
    regel()
        .arg("rules")
        .assert()
        .success()
        .stdout(predicate::str::contains("ETTEROPPGJOER-RESULTAT@2024.1"))
        .stdout(predicate::str::contains("RETTSGEBYR-2025@2024.1"))
        .stdout(predicate::str::contains("TERSKEL-ETTERBETALING@2024.1"));
}

#[test]
fn rules_engine_version_matches_run() {
    let rules = regel().args(["--output", "json", "rules"]).output().unwrap();
    let run = regel()
        .args(["--output", "json", "run"])
        .arg(fixture("grunnlag.json"))
        .args(["--from", "2024-01-01"])
        .output()
        .unwrap();
    let rules: serde_json::Value = serde_json::from_slice(&rules.stdout).unwrap();
    let run: serde_json::Value = serde_json::from_slice(&run.stdout).unwrap();
    assert_eq!(rules["engine_version"], run["engine_version"]);
}

#[test]
fn log_filter_from_env_writes_to_stderr_only() {
    let output = regel()
        .env("REGEL_LOG", "regel_engine=debug")
        .args(["--output", "json", "run"])
        .arg(fixture("grunnlag.json"))
        .args(["--from", "2024-01-01"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let _: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("rule run succeeded"));
    assert!(!stderr.contains("logging disabled"));
}

// ──────────────────────────────────────────────
// 5. Input errors
// ──────────────────────────────────────────────

#[test]
fn missing_file_exits_1() {
    regel()
        .args(["run", "does-not-exist.json", "--from", "2024-01-01"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("cannot read"));
}

#[test]
fn empty_period_exits_1() {
    regel()
        .arg("run")
        .arg(fixture("grunnlag.json"))
        .args(["--from", "2024-01-01", "--to", "2024-01-01"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("empty period"));
}

#[test]
fn period_before_first_recorded_amount_exits_1() {
    regel()
        .arg("run")
        .arg(fixture("grunnlag.json"))
        .args(["--from", "2021-06-01", "--to", "2022-06-01"])
        .assert()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains(
            "period starts 2021-06-01, before the first 'brutto' entry (2022-01-01)",
        ));
}

#[test]
fn malformed_date_argument_is_rejected() {
    regel()
        .arg("run")
        .arg(fixture("grunnlag.json"))
        .args(["--from", "01.01.2024"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid date"));
}

#[test]
fn invalid_json_reports_error_as_json() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.json");
    fs::write(&path, "{ not json").unwrap();

    let output = regel()
        .args(["--output", "json", "run"])
        .arg(&path)
        .args(["--from", "2024-01-01"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    let value: serde_json::Value = serde_json::from_slice(&output.stderr).unwrap();
    assert!(value["error"].as_str().unwrap().contains("invalid JSON"));
}

#[test]
fn empty_schedule_is_an_input_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("empty.json");
    fs::write(
        &path,
        r#"{ "brutto": [], "utbetalt": [], "avkorting": { "beloep": "0", "kilde": "x" } }"#,
    )
    .unwrap();

    regel()
        .arg("run")
        .arg(&path)
        .args(["--from", "2024-01-01"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("'brutto' must have at least one entry"));
}
