//! Types for task execution.
//!
//! This module defines the error types, outcome types, and configuration
//! for executing a task graph.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use crate::graph::{GraphError, TaskId};
use crate::tools::ToolError;
use crate::util::hash::ContentHash;

/// Lifecycle of a task within one build invocation.
///
/// Transitions are `Pending -> Running -> {Succeeded, Failed}` or
/// `Pending -> Skipped`. A terminal state is never left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskState {
  Pending,
  Running,
  Succeeded,
  Failed,
  Skipped,
}

impl TaskState {
  /// Whether moving from `self` to `next` is a legal lifecycle step.
  pub fn can_transition_to(self, next: TaskState) -> bool {
    matches!(
      (self, next),
      (TaskState::Pending, TaskState::Running)
        | (TaskState::Pending, TaskState::Skipped)
        | (TaskState::Running, TaskState::Succeeded)
        | (TaskState::Running, TaskState::Failed)
    )
  }

  pub fn as_str(self) -> &'static str {
    match self {
      TaskState::Pending => "pending",
      TaskState::Running => "running",
      TaskState::Succeeded => "succeeded",
      TaskState::Failed => "failed",
      TaskState::Skipped => "skipped",
    }
  }
}

impl fmt::Display for TaskState {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Why a task never ran.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
  /// A task this one (transitively) depends on failed or was skipped.
  DependencyFailed(TaskId),
  /// Fail-fast mode stopped scheduling after another task failed.
  Aborted(TaskId),
}

impl SkipReason {
  /// The failed task that caused the skip.
  pub fn cause(&self) -> &TaskId {
    match self {
      SkipReason::DependencyFailed(id) | SkipReason::Aborted(id) => id,
    }
  }
}

impl fmt::Display for SkipReason {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      SkipReason::DependencyFailed(id) => write!(f, "dependency {} failed", id),
      SkipReason::Aborted(id) => write!(f, "build aborted after {} failed", id),
    }
  }
}

/// Errors a single task can fail with.
///
/// Every variant is fatal to the task and to everything downstream of it.
#[derive(Debug, Error)]
pub enum TaskError {
  /// A declared input root does not exist.
  #[error("missing source directory: {}", path.display())]
  MissingSource { path: PathBuf },

  /// An output an upstream task should have produced does not exist.
  #[error("missing artifact: {}", path.display())]
  MissingArtifact { path: PathBuf },

  /// The compiler or doc generator failed.
  #[error(transparent)]
  Tool(#[from] ToolError),

  /// Two archive inputs contributed the same path under the `fail` policy.
  #[error("duplicate archive entry: {path}")]
  DuplicateEntry { path: String },

  /// An include pattern could not be parsed.
  #[error("invalid include pattern {pattern:?}: {message}")]
  InvalidPattern { pattern: String, message: String },

  /// A predecessor succeeded without reporting the output this task reads.
  #[error("task {0} did not report an output location")]
  MissingUpstream(TaskId),

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  #[error("failed to walk directory: {0}")]
  Walk(#[from] walkdir::Error),

  /// The task's action panicked.
  #[error("task panicked: {0}")]
  Panicked(String),
}

/// Errors that stop a build before any task runs.
#[derive(Debug, Error)]
pub enum ExecuteError {
  #[error(transparent)]
  Graph(#[from] GraphError),

  #[error("parallelism must be at least 1")]
  ZeroParallelism,
}

/// What a succeeded task reports to its dependents and to the build report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TaskOutput {
  /// Directory or file the task produced, if any.
  pub location: Option<PathBuf>,

  /// Number of files the task wrote.
  pub files: usize,

  /// SHA-256 of the file at `location`, for tasks that write a single file.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub sha256: Option<ContentHash>,

  /// One-line human readable summary.
  pub detail: Option<String>,
}

impl TaskOutput {
  pub fn at(location: impl Into<PathBuf>) -> Self {
    Self {
      location: Some(location.into()),
      ..Self::default()
    }
  }

  pub fn with_files(mut self, files: usize) -> Self {
    self.files = files;
    self
  }

  pub fn with_sha256(mut self, sha256: ContentHash) -> Self {
    self.sha256 = Some(sha256);
    self
  }

  pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
    self.detail = Some(detail.into());
    self
  }
}

/// Outcome of one task that ran.
#[derive(Debug)]
pub struct TaskRun<T> {
  pub id: TaskId,
  pub result: T,
  pub duration: Duration,
}

/// Result of executing a task graph.
#[derive(Debug, Default)]
pub struct BuildReport {
  /// Every selected task, in topological order.
  pub selected: Vec<TaskId>,

  /// Tasks that succeeded, in completion order.
  pub succeeded: Vec<TaskRun<TaskOutput>>,

  /// Tasks that failed, in completion order.
  pub failed: Vec<TaskRun<TaskError>>,

  /// Tasks that never ran, with the reason.
  pub skipped: HashMap<TaskId, SkipReason>,
}

impl BuildReport {
  /// Returns true if every selected task succeeded.
  pub fn is_success(&self) -> bool {
    self.failed.is_empty() && self.skipped.is_empty() && self.succeeded.len() == self.selected.len()
  }

  /// Final lifecycle state of a selected task.
  pub fn state(&self, id: &TaskId) -> Option<TaskState> {
    if self.succeeded.iter().any(|r| &r.id == id) {
      Some(TaskState::Succeeded)
    } else if self.failed.iter().any(|r| &r.id == id) {
      Some(TaskState::Failed)
    } else if self.skipped.contains_key(id) {
      Some(TaskState::Skipped)
    } else if self.selected.contains(id) {
      Some(TaskState::Pending)
    } else {
      None
    }
  }

  pub fn output(&self, id: &TaskId) -> Option<&TaskOutput> {
    self.succeeded.iter().find(|r| &r.id == id).map(|r| &r.result)
  }

  pub fn error(&self, id: &TaskId) -> Option<&TaskError> {
    self.failed.iter().find(|r| &r.id == id).map(|r| &r.result)
  }

  /// Returns the number of tasks that reached a terminal state.
  pub fn total(&self) -> usize {
    self.succeeded.len() + self.failed.len() + self.skipped.len()
  }
}

/// Configuration for task execution.
#[derive(Debug, Clone)]
pub struct ExecuteConfig {
  /// Maximum number of tasks running at once.
  pub parallelism: usize,

  /// Stop starting new tasks as soon as any task fails.
  pub fail_fast: bool,
}

impl Default for ExecuteConfig {
  fn default() -> Self {
    Self {
      parallelism: num_cpus(),
      fail_fast: false,
    }
  }
}

/// Get the number of CPUs for default parallelism.
pub(crate) fn num_cpus() -> usize {
  std::thread::available_parallelism().map(|p| p.get()).unwrap_or(4)
}
