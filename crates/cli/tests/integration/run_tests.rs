//! Run command integration tests.
//!
//! These drive real shell commands as the compiler and doc generator, so
//! they only run on Unix.

use predicates::prelude::*;

use super::common::{TestEnv, archive_entries, config_with_tools, list_files};

#[test]
fn run_without_compiled_output_fails_and_skips_archive() {
  let env = TestEnv::new("[project]\nname = \"robots\"");

  env
    .sandpack_cmd()
    .arg("run")
    .assert()
    .failure()
    .stdout(predicate::str::contains("missing artifact"))
    .stdout(predicate::str::contains(
      "assemble-archive skipped: dependency stage-compiled-output failed",
    ))
    .stderr(predicate::str::contains("build failed"));

  assert!(!env.path("build/libs/robots.tar.gz").exists());
}

#[test]
fn run_with_prebuilt_output_succeeds() {
  let env = TestEnv::new("[project]\nname = \"robots\"\n[archive]\nsources = false");
  env.write_file("build/classes/sample/A.class", "prebuilt");

  env.sandpack_cmd().arg("run").assert().success();

  assert!(env.path(".sandbox/sample/A.class").exists());
  assert!(env.path("build/libs/robots.tar.gz").exists());
}

#[cfg(unix)]
#[test]
fn run_builds_sandbox_and_archives() {
  let env = TestEnv::new(&config_with_tools(false));

  env
    .sandpack_cmd()
    .arg("run")
    .assert()
    .success()
    .stdout(predicate::str::contains("assemble-archive"))
    .stdout(predicate::str::contains("sources-archive"));

  assert_eq!(
    list_files(&env.path(".sandbox")),
    vec![
      "A.class",
      "B.class",
      "sample/A.java",
      "sample/B.java",
      "sample/B.properties"
    ]
  );

  assert_eq!(
    archive_entries(&env.path("build/libs/robots-1.0.tar.gz")),
    vec![
      "A.class",
      "B.class",
      "sample/A.java",
      "sample/B.java",
      "sample/B.properties",
      "sample/A.java",
      "sample/B.java",
      "sample/B.properties",
    ]
  );
  assert_eq!(
    archive_entries(&env.path("build/libs/robots-1.0-sources.tar.gz")),
    vec!["sample/A.java", "sample/B.java", "sample/B.properties"]
  );
}

#[cfg(unix)]
#[test]
fn run_with_docs_merges_docs_into_archive() {
  let env = TestEnv::new(&config_with_tools(true));

  env.sandpack_cmd().arg("run").assert().success();

  let main = archive_entries(&env.path("build/libs/robots-1.0.tar.gz"));
  assert_eq!(main.last().map(String::as_str), Some("docs/index.txt"));
  assert_eq!(
    archive_entries(&env.path("build/libs/robots-1.0-docs.tar.gz")),
    vec!["index.txt"]
  );
  let index = std::fs::read_to_string(env.path("build/docs/index.txt")).unwrap();
  assert_eq!(index.lines().count(), 2);
}

#[cfg(unix)]
#[test]
fn run_selected_target_only() {
  let env = TestEnv::new(&config_with_tools(false));

  env
    .sandpack_cmd()
    .args(["run", "stage-compiled-output"])
    .assert()
    .success();

  assert_eq!(list_files(&env.path(".sandbox")), vec!["A.class", "B.class"]);
  assert!(!env.path("build/libs").exists());
}

#[cfg(unix)]
#[test]
fn failing_compiler_reports_tool_error() {
  let env = TestEnv::new("[compiler]\ncommand = \"echo 'A.java:1: error' >&2; exit 2\"");

  env
    .sandpack_cmd()
    .args(["run", "--output", "json"])
    .assert()
    .failure()
    .stdout(predicate::str::contains("\"success\": false"))
    .stdout(predicate::str::contains("compile exited with status 2: A.java:1: error"))
    .stdout(predicate::str::contains("\"cause\": \"compile\""));
}

#[cfg(unix)]
#[test]
fn run_json_reports_every_task() {
  let env = TestEnv::new(&config_with_tools(false));

  let output = env.sandpack_cmd().args(["run", "--output", "json"]).output().unwrap();

  assert!(output.status.success());
  let summary: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(summary["success"], true);
  let states: Vec<&str> = summary["tasks"]
    .as_array()
    .unwrap()
    .iter()
    .map(|t| t["state"].as_str().unwrap())
    .collect();
  assert_eq!(states, vec!["succeeded"; 5]);
}

#[cfg(unix)]
#[test]
fn sandbox_flag_overrides_config() {
  let env = TestEnv::new(&config_with_tools(false));
  let elsewhere = env.root().join("robots-sandbox");

  env
    .sandpack_cmd()
    .arg("--sandbox")
    .arg(&elsewhere)
    .args(["run", "stage-content"])
    .assert()
    .success();

  assert!(elsewhere.join("sample/A.java").exists());
  assert!(!env.path(".sandbox").exists());
}

#[cfg(unix)]
#[test]
fn sandbox_env_overrides_config() {
  let env = TestEnv::new(&config_with_tools(false));
  let elsewhere = env.root().join("env-sandbox");

  env
    .sandpack_cmd()
    .env("SANDPACK_SANDBOX", &elsewhere)
    .args(["run", "stage-content"])
    .assert()
    .success();

  assert!(elsewhere.join("sample/B.properties").exists());
}

#[cfg(unix)]
#[test]
fn rerun_is_stable() {
  let env = TestEnv::new(&config_with_tools(false));

  env.sandpack_cmd().arg("run").assert().success();
  let first = std::fs::read(env.path("build/libs/robots-1.0.tar.gz")).unwrap();
  env.sandpack_cmd().arg("run").assert().success();
  let second = std::fs::read(env.path("build/libs/robots-1.0.tar.gz")).unwrap();

  assert_eq!(first, second);
}
