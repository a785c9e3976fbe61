use sandpack_lib::execute::{SkipReason, TaskError, TaskState};
use sandpack_lib::graph::{GraphError, Task, TaskGraph, TaskId};
use sandpack_lib::pipeline::{ASSEMBLE_ARCHIVE, COMPILE, STAGE_COMPILED_OUTPUT, STAGE_CONTENT, Tools};
use sandpack_lib::tools::ToolError;

use super::common::{FakeCompiler, Fixture, list_files};

const PLAIN: &str = "[archive]\ncompression = \"none\"\nsources = false";

fn id(name: &str) -> TaskId {
  TaskId::from(name)
}

#[tokio::test]
async fn missing_compiled_output_stops_the_archive() {
  let fixture = Fixture::new(PLAIN);
  // No compiler command and nothing in build/classes.
  let tools = Tools::from_project(&fixture.project);

  let report = fixture.run(tools, &[]).await;

  assert!(!report.is_success());
  assert_eq!(report.state(&id(COMPILE)), Some(TaskState::Succeeded));
  assert_eq!(report.state(&id(STAGE_CONTENT)), Some(TaskState::Succeeded));
  assert!(matches!(
    report.error(&id(STAGE_COMPILED_OUTPUT)),
    Some(TaskError::MissingArtifact { .. })
  ));
  assert_eq!(
    report.skipped.get(&id(ASSEMBLE_ARCHIVE)),
    Some(&SkipReason::DependencyFailed(id(STAGE_COMPILED_OUTPUT)))
  );
  assert!(!fixture.project.archive_path(None).exists());
}

#[tokio::test]
async fn compiler_failure_skips_downstream_but_not_staging() {
  let fixture = Fixture::new(PLAIN);
  let tools = fixture.tools(FakeCompiler::failing(&fixture.project.compiler.output));

  let report = fixture.run(tools, &[]).await;

  assert!(matches!(
    report.error(&id(COMPILE)),
    Some(TaskError::Tool(ToolError::Exited { code: Some(1), .. }))
  ));
  assert_eq!(
    report.skipped.get(&id(STAGE_COMPILED_OUTPUT)),
    Some(&SkipReason::DependencyFailed(id(COMPILE)))
  );
  assert_eq!(
    report.skipped.get(&id(ASSEMBLE_ARCHIVE)),
    Some(&SkipReason::DependencyFailed(id(COMPILE)))
  );
  assert_eq!(report.state(&id(STAGE_CONTENT)), Some(TaskState::Succeeded));
  assert_eq!(list_files(&fixture.project.sandbox), vec!["A.src", "B.res", "B.src"]);
}

#[tokio::test]
async fn missing_sources_fail_staging() {
  let fixture = Fixture::new(PLAIN);
  std::fs::remove_dir_all(fixture.root().join("src/main/resources")).unwrap();
  let tools = fixture.tools(FakeCompiler::new(&fixture.project.compiler.output));

  let report = fixture.run(tools, &[]).await;

  assert!(matches!(
    report.error(&id(STAGE_CONTENT)),
    Some(TaskError::MissingSource { .. })
  ));
  assert_eq!(report.state(&id(ASSEMBLE_ARCHIVE)), Some(TaskState::Skipped));
}

#[test]
fn cycle_is_rejected_before_anything_runs() {
  let ran = std::sync::Arc::new(std::sync::atomic::AtomicBool::new(false));
  let flag = ran.clone();
  let action = sandpack_lib::execute::action_fn(move |_ctx| {
    let flag = flag.clone();
    async move {
      flag.store(true, std::sync::atomic::Ordering::SeqCst);
      Ok(sandpack_lib::execute::TaskOutput::default())
    }
  });
  let action: std::sync::Arc<dyn sandpack_lib::execute::TaskAction> = std::sync::Arc::new(action);

  let result = TaskGraph::builder()
    .with(Task::from_action(COMPILE, action.clone()).depends_on([ASSEMBLE_ARCHIVE]))
    .with(Task::from_action(STAGE_COMPILED_OUTPUT, action.clone()).depends_on([COMPILE]))
    .with(Task::from_action(ASSEMBLE_ARCHIVE, action).depends_on([STAGE_COMPILED_OUTPUT]))
    .build();

  assert!(matches!(result, Err(GraphError::Cycle(_))));
  assert!(!ran.load(std::sync::atomic::Ordering::SeqCst));
}
