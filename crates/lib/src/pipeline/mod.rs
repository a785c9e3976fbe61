//! The build pipeline.
//!
//! Wires a resolved [`Project`] into a [`TaskGraph`]:
//!
//! ```text
//! compile ──> stage-compiled-output ──┐
//! stage-content ──────────────────────┼──> assemble-archive
//! generate-docs ──────────────────────┘
//!       └──> docs-archive
//! sources-archive
//! ```
//!
//! `generate-docs` and `docs-archive` exist only when a documentation
//! generator is configured; `sources-archive` and `docs-archive` can be
//! switched off in `[archive]`.

mod tasks;

use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{info, warn};

use crate::config::Project;
use crate::consts::DOCS_ARCHIVE_PREFIX;
use crate::fileset::FileSet;
use crate::graph::{GraphError, Task, TaskGraph};
use crate::tools::{CommandTool, ExternalTool, PrebuiltOutput};

pub use tasks::{ArchiveTask, CollectTask, InputSource, StageTask, ToolTask};

pub const COMPILE: &str = "compile";
pub const STAGE_CONTENT: &str = "stage-content";
pub const STAGE_COMPILED_OUTPUT: &str = "stage-compiled-output";
pub const GENERATE_DOCS: &str = "generate-docs";
pub const ASSEMBLE_ARCHIVE: &str = "assemble-archive";
pub const SOURCES_ARCHIVE: &str = "sources-archive";
pub const DOCS_ARCHIVE: &str = "docs-archive";

/// The external tools a pipeline invokes.
#[derive(Clone)]
pub struct Tools {
  pub compiler: Arc<dyn ExternalTool>,
  pub docs: Option<Arc<dyn ExternalTool>>,
}

impl Tools {
  /// Shell command tools for whatever the project configures.
  ///
  /// Without a compiler command the compile step only reports the configured
  /// output directory. Without a documentation command there is no docs tool.
  pub fn from_project(project: &Project) -> Self {
    let compiler: Arc<dyn ExternalTool> = match &project.compiler.command {
      Some(command) => Arc::new(
        CommandTool::new(COMPILE, command.clone(), project.compiler.output.clone())
          .in_dir(&project.root)
          .with_shell(project.compiler.shell.clone()),
      ),
      None => Arc::new(PrebuiltOutput::new(COMPILE, project.compiler.output.clone())),
    };

    let docs = project.doc_generator().and_then(|settings| {
      let command = settings.command.clone()?;
      let tool: Arc<dyn ExternalTool> = Arc::new(
        CommandTool::new(GENERATE_DOCS, command, settings.output.clone())
          .in_dir(&project.root)
          .with_shell(settings.shell.clone()),
      );
      Some(tool)
    });

    Self { compiler, docs }
  }
}

/// Build the task graph for a project.
pub fn build_pipeline(project: &Project, tools: Tools) -> Result<TaskGraph, GraphError> {
  let mut builder = TaskGraph::builder();

  builder.register(
    Task::new(
      COMPILE,
      ToolTask::new(tools.compiler.clone(), project.compiler.sources.clone()),
    )
    .describe("Compile sources into the runtime output directory"),
  );

  builder.register(
    Task::new(
      STAGE_CONTENT,
      StageTask::new(
        vec![project.resources.clone(), project.sources.clone()],
        project.sandbox.clone(),
      ),
    )
    .describe("Copy sources and resources into the sandbox"),
  );

  builder.register(
    Task::new(STAGE_COMPILED_OUTPUT, CollectTask::new(COMPILE, project.sandbox.clone()))
      .depends_on([COMPILE])
      .describe("Copy compiled output into the sandbox"),
  );

  if let Some(docs_tool) = &tools.docs {
    let sources = project
      .docs
      .as_ref()
      .map(|d| d.sources.clone())
      .unwrap_or_else(|| project.sources.clone());
    builder.register(
      Task::new(GENERATE_DOCS, ToolTask::new(docs_tool.clone(), sources))
        .describe("Generate documentation from sources"),
    );
  }
  let has_docs = tools.docs.is_some();

  let mut main = ArchiveTask::new(
    project.archive_path(None),
    project.archive.duplicates,
    project.archive.compression,
  )
  .files(FileSet::all(&project.sandbox))
  .files(project.sources.clone())
  .files(project.resources.clone());
  let mut main_deps = vec![STAGE_CONTENT, STAGE_COMPILED_OUTPUT];
  if has_docs {
    main = main.upstream(GENERATE_DOCS, Some(DOCS_ARCHIVE_PREFIX));
    main_deps.push(GENERATE_DOCS);
  }
  builder.register(
    Task::new(ASSEMBLE_ARCHIVE, main)
      .depends_on(main_deps)
      .describe("Assemble the distributable archive"),
  );

  if project.archive.sources {
    let sources = ArchiveTask::new(
      project.archive_path(Some("sources")),
      project.archive.duplicates,
      project.archive.compression,
    )
    .files(project.sources.clone())
    .files(project.resources.clone());
    builder.register(Task::new(SOURCES_ARCHIVE, sources).describe("Archive sources and resources"));
  }

  if has_docs && project.archive.docs {
    let docs = ArchiveTask::new(
      project.archive_path(Some("docs")),
      project.archive.duplicates,
      project.archive.compression,
    )
    .upstream(GENERATE_DOCS, None);
    builder.register(
      Task::new(DOCS_ARCHIVE, docs)
        .depends_on([GENERATE_DOCS])
        .describe("Archive generated documentation"),
    );
  }

  builder.build()
}

/// Remove everything the pipeline produces.
///
/// Deletes the sandbox, the archive directory, and the output directories of
/// configured tools. Externally produced compiler output is left alone, as is
/// any directory that contains the project root. Returns the paths removed.
pub fn clean(project: &Project) -> io::Result<Vec<PathBuf>> {
  let mut targets = vec![project.sandbox.clone(), project.archive.dir.clone()];
  if project.compiler.command.is_some() {
    targets.push(project.compiler.output.clone());
  }
  if let Some(docs) = project.doc_generator() {
    targets.push(docs.output.clone());
  }

  let mut removed = Vec::new();
  for path in targets {
    if project.root.starts_with(&path) {
      warn!(path = %path.display(), "refusing to remove a directory containing the project");
      continue;
    }
    if !path.exists() {
      continue;
    }
    if path.is_dir() {
      fs::remove_dir_all(&path)?;
    } else {
      fs::remove_file(&path)?;
    }
    info!(path = %path.display(), "removed");
    removed.push(path);
  }
  Ok(removed)
}
