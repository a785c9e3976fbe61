//! Task actions the pipeline is built from.
//!
//! Filesystem work runs on the blocking pool; tool invocations stay on the
//! async runtime.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::archive::{ArchiveInput, ArchiveSpec, Compression, DuplicatesStrategy, assemble};
use crate::execute::{TaskAction, TaskContext, TaskError, TaskOutput};
use crate::fileset::FileSet;
use crate::graph::TaskId;
use crate::stage::{collect_compiled_output, stage_filesets};
use crate::tools::{ExternalTool, SourceSet};

async fn blocking<T, F>(f: F) -> Result<T, TaskError>
where
  F: FnOnce() -> Result<T, TaskError> + Send + 'static,
  T: Send + 'static,
{
  tokio::task::spawn_blocking(f)
    .await
    .map_err(|e| TaskError::Panicked(e.to_string()))?
}

/// Runs an external tool over a source set.
pub struct ToolTask {
  tool: Arc<dyn ExternalTool>,
  sources: FileSet,
}

impl ToolTask {
  pub fn new(tool: Arc<dyn ExternalTool>, sources: FileSet) -> Self {
    Self { tool, sources }
  }
}

#[async_trait]
impl TaskAction for ToolTask {
  async fn run(&self, _ctx: &TaskContext) -> Result<TaskOutput, TaskError> {
    let sources = if self.tool.reads_sources() {
      let set = self.sources.clone();
      blocking(move || SourceSet::resolve(&set)).await?
    } else {
      SourceSet {
        root: self.sources.root.clone(),
        files: Vec::new(),
      }
    };

    let count = sources.len();
    let location = self.tool.run(&sources).await?;
    debug!(tool = %self.tool.name(), output = %location.dir.display(), "tool finished");

    Ok(
      TaskOutput::at(location.dir)
        .with_files(count)
        .with_detail(format!("{} over {} sources", self.tool.name(), count)),
    )
  }
}

/// Copies file sets into the staging directory.
pub struct StageTask {
  sets: Vec<FileSet>,
  dest: PathBuf,
}

impl StageTask {
  pub fn new(sets: Vec<FileSet>, dest: PathBuf) -> Self {
    Self { sets, dest }
  }
}

#[async_trait]
impl TaskAction for StageTask {
  async fn run(&self, _ctx: &TaskContext) -> Result<TaskOutput, TaskError> {
    let sets = self.sets.clone();
    let dest = self.dest.clone();
    let report = blocking(move || stage_filesets(&sets, &dest)).await?;
    Ok(TaskOutput::at(&self.dest).with_files(report.copied.len()))
  }
}

/// Copies the output a predecessor reported into the staging directory.
pub struct CollectTask {
  from: TaskId,
  dest: PathBuf,
}

impl CollectTask {
  pub fn new(from: impl Into<TaskId>, dest: PathBuf) -> Self {
    Self {
      from: from.into(),
      dest,
    }
  }
}

#[async_trait]
impl TaskAction for CollectTask {
  async fn run(&self, ctx: &TaskContext) -> Result<TaskOutput, TaskError> {
    let output_dir = ctx.upstream_location(&self.from)?.to_path_buf();
    let dest = self.dest.clone();
    let report = blocking(move || collect_compiled_output(&output_dir, &dest)).await?;
    Ok(TaskOutput::at(&self.dest).with_files(report.copied.len()))
  }
}

/// Where an archive input comes from.
#[derive(Debug, Clone)]
pub enum InputSource {
  /// A fixed file set.
  Files(FileSet),
  /// Everything under the location a predecessor reported.
  Upstream(TaskId),
}

/// Writes an archive from fixed and upstream inputs.
pub struct ArchiveTask {
  path: PathBuf,
  inputs: Vec<(InputSource, Option<String>)>,
  duplicates: DuplicatesStrategy,
  compression: Compression,
}

impl ArchiveTask {
  pub fn new(path: PathBuf, duplicates: DuplicatesStrategy, compression: Compression) -> Self {
    Self {
      path,
      inputs: Vec::new(),
      duplicates,
      compression,
    }
  }

  pub fn files(mut self, set: FileSet) -> Self {
    self.inputs.push((InputSource::Files(set), None));
    self
  }

  pub fn upstream(mut self, task: impl Into<TaskId>, prefix: Option<&str>) -> Self {
    self
      .inputs
      .push((InputSource::Upstream(task.into()), prefix.map(str::to_string)));
    self
  }

  fn spec(&self, ctx: &TaskContext) -> Result<ArchiveSpec, TaskError> {
    let mut inputs = Vec::with_capacity(self.inputs.len());
    for (source, prefix) in &self.inputs {
      let files = match source {
        InputSource::Files(set) => set.clone(),
        InputSource::Upstream(task) => FileSet::all(ctx.upstream_location(task)?),
      };
      inputs.push(ArchiveInput {
        files,
        prefix: prefix.clone(),
      });
    }
    Ok(ArchiveSpec {
      path: self.path.clone(),
      inputs,
      duplicates: self.duplicates,
      compression: self.compression,
    })
  }
}

#[async_trait]
impl TaskAction for ArchiveTask {
  async fn run(&self, ctx: &TaskContext) -> Result<TaskOutput, TaskError> {
    let spec = self.spec(ctx)?;
    let report = blocking(move || assemble(&spec)).await?;
    let mut output = TaskOutput::at(report.path)
      .with_files(report.entries)
      .with_sha256(report.sha256);
    if !report.duplicates.is_empty() {
      output = output.with_detail(format!("{} duplicate entries", report.duplicates.len()));
    }
    Ok(output)
  }
}
