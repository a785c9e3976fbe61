//! Clean command integration tests.

use predicates::prelude::*;

use super::common::TestEnv;

#[test]
fn clean_removes_sandbox_and_archives() {
  let env = TestEnv::new("");
  env.write_file(".sandbox/sample/A.java", "class A {}");
  env.write_file("build/libs/robots.tar.gz", "");

  env
    .sandpack_cmd()
    .arg("clean")
    .assert()
    .success()
    .stdout(predicate::str::contains("Removed"));

  assert!(!env.path(".sandbox").exists());
  assert!(!env.path("build/libs").exists());
  assert!(env.path("src/main/java/sample/A.java").exists());
}

#[test]
fn clean_keeps_prebuilt_compiler_output() {
  let env = TestEnv::new("");
  env.write_file("build/classes/A.class", "prebuilt");

  env
    .sandpack_cmd()
    .arg("clean")
    .assert()
    .success()
    .stdout(predicate::str::contains("Nothing to clean"));

  assert!(env.path("build/classes/A.class").exists());
}
