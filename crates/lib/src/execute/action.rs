//! The task action capability and the context handed to it.

use std::collections::HashMap;
use std::future::Future;
use std::path::Path;

use async_trait::async_trait;

use crate::graph::TaskId;

use super::types::{TaskError, TaskOutput};

/// The side-effecting work a task performs.
///
/// Actions run on the tokio runtime. Blocking filesystem work belongs in
/// `tokio::task::spawn_blocking`.
#[async_trait]
pub trait TaskAction: Send + Sync {
  async fn run(&self, ctx: &TaskContext) -> Result<TaskOutput, TaskError>;
}

/// What a running task can see: its own name and the outputs of its direct
/// predecessors, all of which have succeeded.
#[derive(Debug, Clone)]
pub struct TaskContext {
  pub task: TaskId,
  upstream: HashMap<TaskId, TaskOutput>,
}

impl TaskContext {
  pub fn new(task: TaskId, upstream: HashMap<TaskId, TaskOutput>) -> Self {
    Self { task, upstream }
  }

  pub fn upstream(&self, id: &TaskId) -> Option<&TaskOutput> {
    self.upstream.get(id)
  }

  /// Output location reported by a predecessor.
  ///
  /// Fails with `MissingUpstream` if the predecessor is not a direct dependency
  /// or reported no location.
  pub fn upstream_location(&self, id: &TaskId) -> Result<&Path, TaskError> {
    self
      .upstream
      .get(id)
      .and_then(|out| out.location.as_deref())
      .ok_or_else(|| TaskError::MissingUpstream(id.clone()))
  }
}

/// Adapts an async closure into a [`TaskAction`].
pub struct FnAction<F>(F);

/// Build an action from a closure taking an owned [`TaskContext`].
pub fn action_fn<F, Fut>(f: F) -> FnAction<F>
where
  F: Fn(TaskContext) -> Fut + Send + Sync,
  Fut: Future<Output = Result<TaskOutput, TaskError>> + Send,
{
  FnAction(f)
}

#[async_trait]
impl<F, Fut> TaskAction for FnAction<F>
where
  F: Fn(TaskContext) -> Fut + Send + Sync,
  Fut: Future<Output = Result<TaskOutput, TaskError>> + Send,
{
  async fn run(&self, ctx: &TaskContext) -> Result<TaskOutput, TaskError> {
    (self.0)(ctx.clone()).await
  }
}
