//! Task identity, task declarations and graph construction errors.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::execute::TaskAction;

/// Unique name of a task within a graph, e.g. `stage-content`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub String);

impl TaskId {
  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for TaskId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl From<&str> for TaskId {
  fn from(value: &str) -> Self {
    TaskId(value.to_string())
  }
}

impl From<String> for TaskId {
  fn from(value: String) -> Self {
    TaskId(value)
  }
}

impl From<&TaskId> for TaskId {
  fn from(value: &TaskId) -> Self {
    value.clone()
  }
}

/// A named build step: its predecessors and the action it performs.
#[derive(Clone)]
pub struct Task {
  pub id: TaskId,

  /// Tasks that must succeed before this one starts, in declaration order.
  pub depends_on: Vec<TaskId>,

  /// Shown by `sandpack tasks`.
  pub description: Option<String>,

  pub action: Arc<dyn TaskAction>,
}

impl Task {
  pub fn new(id: impl Into<TaskId>, action: impl TaskAction + 'static) -> Self {
    Self::from_action(id, Arc::new(action))
  }

  pub fn from_action(id: impl Into<TaskId>, action: Arc<dyn TaskAction>) -> Self {
    Self {
      id: id.into(),
      depends_on: Vec::new(),
      description: None,
      action,
    }
  }

  /// Add predecessors. Repeated names collapse into one edge.
  pub fn depends_on<I, S>(mut self, deps: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<TaskId>,
  {
    for dep in deps {
      let dep = dep.into();
      if !self.depends_on.contains(&dep) {
        self.depends_on.push(dep);
      }
    }
    self
  }

  pub fn describe(mut self, description: impl Into<String>) -> Self {
    self.description = Some(description.into());
    self
  }
}

impl fmt::Debug for Task {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Task")
      .field("id", &self.id)
      .field("depends_on", &self.depends_on)
      .field("description", &self.description)
      .finish_non_exhaustive()
  }
}

/// Errors detected while building or querying a task graph.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GraphError {
  #[error("task declared twice: {0}")]
  DuplicateTask(TaskId),

  #[error("task {task} depends on unknown task {dependency}")]
  UnknownDependency { task: TaskId, dependency: TaskId },

  #[error("task {0} depends on itself")]
  SelfDependency(TaskId),

  /// Each task in the list depends on the next; the last depends on the first.
  #[error("dependency cycle detected: {}", format_cycle(.0))]
  Cycle(Vec<TaskId>),

  #[error("unknown task: {0}")]
  UnknownTask(TaskId),
}

fn format_cycle(cycle: &[TaskId]) -> String {
  let mut names: Vec<&str> = cycle.iter().map(TaskId::as_str).collect();
  if let Some(first) = cycle.first() {
    names.push(first.as_str());
  }
  names.join(" -> ")
}
