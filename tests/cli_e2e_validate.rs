//! End-to-end tests for the `validate` command.
//!
//! These tests invoke the actual CLI binary and validate the behavior of the
//! `validate` subcommand from a user's perspective.

mod common;
use common::prelude::*;

#[test]
fn test_validate_valid_document() {
    let fixture = TestFixture::new().with_config(documents::PACKAGES);

    fixture
        .command()
        .arg("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("[OK]"))
        .stdout(predicate::str::contains("is valid (1 documents loaded)"));
}

#[test]
fn test_validate_reports_every_error() {
    let fixture = TestFixture::new().with_config(documents::THREE_ERRORS);

    fixture
        .command()
        .arg("validate")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("error: missing version field"))
        .stderr(predicate::str::contains("error: source file not found"))
        .stderr(predicate::str::contains("error: invalid dconf path"))
        .stderr(predicate::str::contains(
            "validation failed: 3 errors, 0 warnings",
        ))
        .stderr(predicate::str::contains("quick fixes:"));
}

#[test]
fn test_validate_locates_findings() {
    let fixture = TestFixture::new().with_config(documents::THREE_ERRORS);

    fixture
        .command()
        .arg("validate")
        .assert()
        .failure()
        .stderr(predicate::str::is_match(r"machine\.yaml:\d+:\d+").unwrap())
        .stderr(predicate::str::contains("= field: files.vimrc.source"));
}

#[test]
fn test_validate_warnings_do_not_fail() {
    let fixture = TestFixture::new().with_config(documents::WARNINGS_ONLY);

    fixture
        .command()
        .arg("validate")
        .assert()
        .success()
        .stderr(predicate::str::contains("warning:"))
        .stderr(predicate::str::contains("validation passed: 0 errors, 1 warning"));
}

#[test]
fn test_validate_strict_fails_on_warnings() {
    let fixture = TestFixture::new().with_config(documents::WARNINGS_ONLY);

    fixture
        .command()
        .args(["validate", "--strict"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("strict mode"));
}

#[test]
fn test_validate_json_output() {
    let fixture = TestFixture::new().with_config(documents::THREE_ERRORS);

    let output = fixture
        .command()
        .args(["validate", "--format", "json"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["valid"], false);
    let titles: Vec<&str> = report["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["title"].as_str().unwrap())
        .collect();
    assert_eq!(
        titles,
        [
            "missing version field",
            "source file not found",
            "invalid dconf path"
        ]
    );
    assert!(report["warnings"].as_array().unwrap().is_empty());
}

#[test]
fn test_validate_invalid_yaml() {
    let fixture = TestFixture::new().with_config(documents::INVALID_YAML);

    fixture
        .command()
        .arg("validate")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Failed to parse"));
}

#[test]
fn test_validate_follows_includes() {
    let fixture = TestFixture::new()
        .with_config(
            r#"version: "1.0"
includes:
  - path: hosts/
    description: per-host fragments
"#,
        )
        .with_file("hosts/default.yaml", "packages:\n  snap: [Bad_Name]\n");

    fixture
        .command()
        .arg("validate")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("error: invalid package name"))
        .stderr(predicate::str::contains("packages.snap[0]"))
        .stderr(predicate::str::is_match(r"hosts/default\.yaml:\d+:\d+").unwrap());
}

#[test]
fn test_validate_explicit_config_and_base_dir() {
    let fixture = TestFixture::new().with_file("cfg/laptop.yaml", documents::MINIMAL);

    fixture
        .command()
        .args(["validate", "--base-dir", "cfg", "--config", "laptop.yaml"])
        .assert()
        .success();
}

#[test]
fn test_validate_config_from_environment() {
    let fixture = TestFixture::new().with_file("elsewhere.yaml", documents::MINIMAL);

    fixture
        .command()
        .env("MACHINECFG_CONFIG", fixture.path().join("elsewhere.yaml"))
        .arg("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("elsewhere.yaml"));
}

#[test]
fn test_validate_circular_include() {
    let fixture = TestFixture::new()
        .with_config("includes:\n  - path: a.yaml\n")
        .with_file("a.yaml", "includes:\n  - path: machine.yaml\n");

    fixture
        .command()
        .arg("validate")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Circular include detected"))
        .stderr(predicate::str::contains("hint:"));
}
