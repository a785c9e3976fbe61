use std::sync::Arc;

use sandpack_lib::execute::TaskState;
use sandpack_lib::graph::TaskId;
use sandpack_lib::util::hash::hash_file;
use sandpack_lib::pipeline::{ASSEMBLE_ARCHIVE, COMPILE, DOCS_ARCHIVE, GENERATE_DOCS, SOURCES_ARCHIVE, Tools};

use super::common::{FakeCompiler, FakeDocs, Fixture, archive_entries, archive_entry, list_files};

const PLAIN: &str = r#"
[project]
name = "robots"

[archive]
compression = "none"
sources = false
"#;

#[tokio::test]
async fn sandbox_holds_sources_resources_and_classes() {
  let fixture = Fixture::new(PLAIN);
  let tools = fixture.tools(FakeCompiler::new(&fixture.project.compiler.output));

  let report = fixture.run(tools, &[]).await;

  assert!(report.is_success(), "failed: {:?}", report.failed);
  assert_eq!(report.output(&TaskId::from(COMPILE)).map(|o| o.files), Some(2));
  assert_eq!(
    list_files(&fixture.project.sandbox),
    vec!["A.class", "A.src", "B.class", "B.res", "B.src"]
  );
}

#[tokio::test]
async fn archive_contains_sandbox_then_raw_inputs() {
  let fixture = Fixture::new(PLAIN);
  let tools = fixture.tools(FakeCompiler::new(&fixture.project.compiler.output));

  let report = fixture.run(tools, &[]).await;
  assert!(report.is_success());

  let archive = fixture.project.archive_path(None);
  assert!(archive.ends_with("build/libs/robots.tar"));
  assert_eq!(
    archive_entries(&archive),
    vec![
      // sandbox
      "A.class", "A.src", "B.class", "B.res", "B.src",
      // sources
      "A.src", "B.src",
      // resources
      "B.res",
    ]
  );
  assert_eq!(archive_entry(&archive, "A.class").as_deref(), Some("bytecode A"));

  let output = report.output(&TaskId::from(ASSEMBLE_ARCHIVE)).unwrap();
  assert_eq!(output.files, 8);
  assert_eq!(output.location.as_deref(), Some(archive.as_path()));
  assert_eq!(output.sha256, Some(hash_file(&archive).unwrap()));
  assert_eq!(output.detail.as_deref(), Some("3 duplicate entries"));
}

#[tokio::test]
async fn docs_are_merged_under_prefix_and_archived_separately() {
  let fixture = Fixture::new(
    r#"
      [project]
      name = "robots"
      version = "1.0"

      [archive]
      compression = "none"
      sources = false
    "#,
  );
  let docs_out = fixture.root().join("build/docs");
  let tools = Tools {
    compiler: Arc::new(FakeCompiler::new(&fixture.project.compiler.output)),
    docs: Some(Arc::new(FakeDocs { output: docs_out })),
  };

  let report = fixture.run(tools, &[]).await;

  assert!(report.is_success(), "failed: {:?}", report.failed);
  assert_eq!(report.state(&TaskId::from(GENERATE_DOCS)), Some(TaskState::Succeeded));

  let main = archive_entries(&fixture.project.archive_path(None));
  assert_eq!(main.last().map(String::as_str), Some("docs/index.html"));

  let docs = fixture.project.archive_path(Some("docs"));
  assert!(docs.ends_with("robots-1.0-docs.tar"));
  assert_eq!(archive_entries(&docs), vec!["index.html"]);
  assert!(report.state(&TaskId::from(DOCS_ARCHIVE)).is_some());
}

#[tokio::test]
async fn sources_archive_needs_no_compile() {
  let fixture = Fixture::new("[archive]\ncompression = \"none\"");
  let compiler = FakeCompiler::new(&fixture.project.compiler.output);
  let runs = compiler.runs.clone();

  let report = fixture.run(fixture.tools(compiler), &[SOURCES_ARCHIVE]).await;

  assert!(report.is_success());
  assert_eq!(report.selected, vec![TaskId::from(SOURCES_ARCHIVE)]);
  assert_eq!(runs.load(std::sync::atomic::Ordering::SeqCst), 0);
  assert_eq!(
    archive_entries(&fixture.project.archive_path(Some("sources"))),
    vec!["A.src", "B.src", "B.res"]
  );
}

#[tokio::test]
async fn compiled_output_from_outside_is_collected() {
  let fixture = Fixture::new(PLAIN);
  super::common::write_file(&fixture.project.compiler.output, "sample/Robot.class", "prebuilt");
  let tools = Tools::from_project(&fixture.project);

  let report = fixture.run(tools, &[]).await;

  assert!(report.is_success(), "failed: {:?}", report.failed);
  assert!(fixture.project.sandbox.join("sample/Robot.class").exists());
}
