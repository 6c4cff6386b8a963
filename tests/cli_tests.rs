//! Integration tests for the reportdeps CLI
//!
//! These tests run the actual binary against catalogs written to a temp dir.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Get the binary to test
fn reportdeps_cmd() -> Command {
    let mut cmd = Command::cargo_bin("reportdeps").unwrap();
    cmd.env("NO_COLOR", "1").env_remove("REPORTDEPS_MAX_DEPTH");
    cmd
}

fn write_catalog(dir: &TempDir, yaml: &str) -> PathBuf {
    let path = dir.path().join("catalog.yaml");
    fs::write(&path, yaml).unwrap();
    path
}

const READY: &str = r#"
namespace: metering
queries:
  - name: pod-cpu
    spec:
      reportQueries: [node-cpu]
      dynamicReportQueries: [raw-usage]
      dataSources: [pod-usage]
      inputs:
        - name: ReportingStart
          type: time
          required: true
        - name: limit
          type: int
  - name: node-cpu
    status: { viewName: hive.node_cpu }
  - name: raw-usage
    spec: { view: { disabled: true } }
dataSources:
  - name: pod-usage
    status: { tableName: hive.pod_usage }
"#;

const WAITING: &str = r#"
namespace: metering
queries:
  - name: pod-cpu
    spec:
      reportQueries: [node-cpu]
      dataSources: [pod-usage]
  - name: node-cpu
dataSources:
  - name: pod-usage
"#;

#[test]
fn test_help_flag() {
    reportdeps_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("generation query dependencies"));
}

// ============================================================================
// deps
// ============================================================================

#[test]
fn test_deps_text_lists_every_section() {
    let dir = TempDir::new().unwrap();
    let catalog = write_catalog(&dir, READY);

    reportdeps_cmd()
        .args(["deps", catalog.to_str().unwrap(), "pod-cpu", "-n", "metering"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Static queries (1)"))
        .stdout(predicate::str::contains("node-cpu"))
        .stdout(predicate::str::contains("Dynamic queries (1)"))
        .stdout(predicate::str::contains("pod-usage"));
}

#[test]
fn test_deps_json() {
    let dir = TempDir::new().unwrap();
    let catalog = write_catalog(&dir, READY);

    let output = reportdeps_cmd()
        .args(["deps", catalog.to_str().unwrap(), "pod-cpu", "-n", "metering", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["staticQueries"][0]["name"], "node-cpu");
    assert_eq!(json["dynamicQueries"][0]["name"], "raw-usage");
    assert_eq!(json["dataSources"][0]["status"]["tableName"], "hive.pod_usage");
    assert_eq!(json["reports"].as_array().unwrap().len(), 0);
}

#[test]
fn test_deps_unknown_query() {
    let dir = TempDir::new().unwrap();
    let catalog = write_catalog(&dir, READY);

    reportdeps_cmd()
        .args(["deps", catalog.to_str().unwrap(), "nope", "-n", "metering"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("RDEP-010"))
        .stderr(predicate::str::contains("Fix:"));
}

#[test]
fn test_deps_cycle_with_max_depth() {
    let dir = TempDir::new().unwrap();
    let catalog = write_catalog(
        &dir,
        "queries:\n  - name: a\n    spec: { reportQueries: [b] }\n  - name: b\n    spec: { reportQueries: [a] }\n",
    );

    reportdeps_cmd()
        .args(["deps", catalog.to_str().unwrap(), "a", "--max-depth", "5"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("detected a cycle at depth 5"));
}

// ============================================================================
// check
// ============================================================================

#[test]
fn test_check_ready() {
    let dir = TempDir::new().unwrap();
    let catalog = write_catalog(&dir, READY);

    reportdeps_cmd()
        .args(["check", catalog.to_str().unwrap(), "pod-cpu", "-n", "metering"])
        .assert()
        .success()
        .stdout(predicate::str::contains("is ready"));
}

#[test]
fn test_check_waiting() {
    let dir = TempDir::new().unwrap();
    let catalog = write_catalog(&dir, WAITING);

    reportdeps_cmd()
        .args(["check", catalog.to_str().unwrap(), "pod-cpu", "-n", "metering"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("waiting on query node-cpu"))
        .stdout(predicate::str::contains("waiting on data source pod-usage"))
        .stderr(predicate::str::contains("RDEP-020"));
}

#[test]
fn test_check_catalog_directory() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("queries.yaml"),
        "queries:\n  - name: root\n    spec: { dataSources: [src] }\n",
    )
    .unwrap();
    fs::write(
        dir.path().join("sources.yml"),
        "dataSources:\n  - name: src\n    status: { tableName: t }\n",
    )
    .unwrap();

    reportdeps_cmd()
        .args(["check", dir.path().to_str().unwrap(), "root"])
        .assert()
        .success();
}

#[test]
fn test_check_invalid_catalog() {
    let dir = TempDir::new().unwrap();
    let catalog = write_catalog(&dir, "queries:\n  - name: Not_Valid\n");

    reportdeps_cmd()
        .args(["check", catalog.to_str().unwrap(), "x"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("RDEP-042"));
}

// ============================================================================
// inputs
// ============================================================================

#[test]
fn test_inputs_coerced() {
    let dir = TempDir::new().unwrap();
    let catalog = write_catalog(&dir, READY);

    reportdeps_cmd()
        .args([
            "inputs",
            catalog.to_str().unwrap(),
            "pod-cpu",
            "-n",
            "metering",
            "-i",
            "ReportingStart=2020-01-01T00:00:00Z",
            "-i",
            "limit=25",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"ReportingStart\": \"2020-01-01T00:00:00Z\""))
        .stdout(predicate::str::contains("\"limit\": 25"));
}

#[test]
fn test_inputs_missing_required() {
    let dir = TempDir::new().unwrap();
    let catalog = write_catalog(&dir, READY);

    reportdeps_cmd()
        .args(["inputs", catalog.to_str().unwrap(), "pod-cpu", "-n", "metering", "-i", "limit=3"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "requires ReportingStart,limit as inputs, got limit",
        ));
}

#[test]
fn test_inputs_type_mismatch() {
    let dir = TempDir::new().unwrap();
    let catalog = write_catalog(&dir, READY);

    reportdeps_cmd()
        .args([
            "inputs",
            catalog.to_str().unwrap(),
            "pod-cpu",
            "-n",
            "metering",
            "-i",
            "ReportingStart=2020-01-01T00:00:00Z",
            "-i",
            "limit=lots",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("input 'limit' is not a valid int"));
}
