// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stagegraph contributors

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const PIPELINE: &str = r#"
apiVersion: v0.1
agent:
  image: some-image
stages:
  - name: Build
    steps:
      - command: make
  - name: Checks
    parallel:
      - name: Lint
        steps:
          - command: lint
      - name: Test
        steps:
          - command: test
"#;

fn stagegraph(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("stagegraph").unwrap();
    cmd.env("NO_COLOR", "1").arg("-C").arg(dir.path());
    cmd
}

fn project(pipeline: &str) -> TempDir {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("Jenkinsfile.yaml"), pipeline).unwrap();
    dir
}

#[test]
fn init_then_validate() {
    let dir = TempDir::new().unwrap();

    stagegraph(&dir).arg("init").assert().success();
    assert!(dir.path().join("Jenkinsfile.yaml").exists());
    assert!(dir.path().join(".stagegraph.yaml").exists());

    stagegraph(&dir)
        .arg("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("Pipeline is valid!"));
}

#[test]
fn init_refuses_to_overwrite_without_force() {
    let dir = project("# keep me\n");

    stagegraph(&dir)
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
    assert_eq!(
        std::fs::read_to_string(dir.path().join("Jenkinsfile.yaml")).unwrap(),
        "# keep me\n"
    );

    stagegraph(&dir).args(["init", "--force"]).assert().success();
    assert!(std::fs::read_to_string(dir.path().join("Jenkinsfile.yaml"))
        .unwrap()
        .contains("apiVersion: v0.1"));
}

#[test]
fn validate_reports_field_paths() {
    let dir = project(
        r#"
apiVersion: v0.1
stages:
  - name: No Agent
    steps:
      - command: make
"#,
    );

    stagegraph(&dir)
        .arg("validate")
        .assert()
        .failure()
        .stdout(predicate::str::contains(
            "stages[0].agent: No agent specified for stage or for its parent(s)",
        ));
}

#[test]
fn validate_warns_about_unsupported_settings() {
    let dir = project(
        r#"
apiVersion: v0.1
agent:
  image: some-image
stages:
  - name: Build
    options:
      retry: 2
    steps:
      - command: make
"#,
    );

    stagegraph(&dir)
        .arg("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("Retry on stage not yet supported"))
        .stdout(predicate::str::contains("cannot be compiled yet"));
}

#[test]
fn validate_missing_file() {
    let dir = TempDir::new().unwrap();

    stagegraph(&dir)
        .arg("validate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Pipeline file not found"));
}

#[test]
fn compile_yaml_to_stdout() {
    let dir = project(PIPELINE);

    stagegraph(&dir)
        .args(["compile", "--pipeline", "app", "--build", "7", "--suffix", "abcd"])
        .assert()
        .success()
        .stdout(predicate::str::contains("name: app-build-7-abcd"))
        .stdout(predicate::str::contains("name: app-build-7-stage-build-abcd"))
        .stdout(predicate::str::contains("kind: Task"))
        .stdout(predicate::str::contains("targetPath: workspace"));
}

#[test]
fn compile_json_to_file() {
    let dir = project(PIPELINE);
    let output = dir.path().join("out.json");

    stagegraph(&dir)
        .args(["compile", "--format", "json", "--suffix", "abcd", "--output"])
        .arg(&output)
        .assert()
        .success();

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(json["pipeline"]["metadata"]["name"], "pipeline-build-1-abcd");
    assert_eq!(json["tasks"].as_array().unwrap().len(), 3);
}

#[test]
fn compile_uses_project_config() {
    let dir = project(PIPELINE);
    std::fs::write(
        dir.path().join(".stagegraph.yaml"),
        "pipeline: configured\nnamespace: ci\n",
    )
    .unwrap();

    stagegraph(&dir)
        .args(["compile", "--suffix", "abcd", "--build", "9"])
        .assert()
        .success()
        .stdout(predicate::str::contains("name: configured-build-9-abcd"))
        .stdout(predicate::str::contains("namespace: ci"));
}

#[test]
fn compile_rejects_unsupported_feature() {
    let dir = project(
        r#"
apiVersion: v0.1
agent:
  image: some-image
stages:
  - name: Slow
    options:
      timeout:
        time: 5
        unit: minutes
    steps:
      - command: make
"#,
    );

    stagegraph(&dir)
        .args(["compile", "--suffix", "abcd"])
        .assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("Timeout on stage not yet supported"));
}

#[test]
fn graph_formats() {
    let dir = project(PIPELINE);

    stagegraph(&dir)
        .args(["graph", "--format", "mermaid"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("graph TD"));

    stagegraph(&dir)
        .args(["graph", "--format", "dot"])
        .assert()
        .success()
        .stdout(predicate::str::contains("digraph pipeline"));

    stagegraph(&dir)
        .arg("graph")
        .assert()
        .success()
        .stdout(predicate::str::contains("1. pipeline-build-1-stage-build-graph"));
}

#[test]
fn compile_rejects_invalid_suffix() {
    let dir = project(PIPELINE);

    stagegraph(&dir)
        .args(["compile", "--suffix", "ABC_1"])
        .assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("Invalid suffix 'ABC_1'"));
}

#[test]
fn validate_reports_colliding_names() {
    let dir = project(
        r#"
apiVersion: v0.1
agent:
  image: some-image
stages:
  - name: Build
    steps:
      - command: make
  - name: build
    steps:
      - command: make
"#,
    );

    stagegraph(&dir)
        .arg("validate")
        .assert()
        .failure()
        .stdout(predicate::str::contains("stages[0].name"))
        .stdout(predicate::str::contains("stages[1].name"));
}

#[test]
fn graph_verbose_reports_task_count() {
    let dir = project(PIPELINE);

    stagegraph(&dir)
        .args(["-v", "graph"])
        .assert()
        .success()
        .stderr(predicate::str::contains("3 task(s) in pipeline-build-1-graph"));
}
