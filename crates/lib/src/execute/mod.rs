//! Task graph execution.
//!
//! This module runs a [`TaskGraph`]:
//! - Each selected task runs exactly once, after all its predecessors succeeded
//! - Independent tasks run concurrently, up to `parallelism` at a time
//! - A failure skips every transitive dependent; other branches keep going
//! - With `fail_fast`, a failure stops any further task from starting

mod action;
pub mod types;

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};
use std::time::Instant;

use petgraph::graph::NodeIndex;
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, error, info, warn};

use crate::graph::{TaskGraph, TaskId};

pub use action::{FnAction, TaskAction, TaskContext, action_fn};
pub use types::{BuildReport, ExecuteConfig, ExecuteError, SkipReason, TaskError, TaskOutput, TaskRun, TaskState};

/// Tasks on the join set, keyed by tokio task id.
type Running = HashMap<tokio::task::Id, (NodeIndex, Instant)>;

/// Execute every task in the graph.
pub async fn execute(graph: &TaskGraph, config: &ExecuteConfig) -> Result<BuildReport, ExecuteError> {
  execute_targets(graph, &[], config).await
}

/// Execute the given targets and everything they depend on.
///
/// An empty target list selects the whole graph.
///
/// # Errors
///
/// Fails before running anything if a target is unknown or `parallelism` is 0.
/// Task failures are not errors here; they are recorded in the returned
/// [`BuildReport`].
pub async fn execute_targets(
  graph: &TaskGraph,
  targets: &[TaskId],
  config: &ExecuteConfig,
) -> Result<BuildReport, ExecuteError> {
  if config.parallelism == 0 {
    return Err(ExecuteError::ZeroParallelism);
  }

  let selected = graph.select(targets)?;
  let in_selection: HashSet<NodeIndex> = selected.iter().copied().collect();

  info!(
    tasks = selected.len(),
    parallelism = config.parallelism,
    fail_fast = config.fail_fast,
    "starting build"
  );

  let mut report = BuildReport {
    selected: selected.iter().map(|&idx| graph.task_at(idx).id.clone()).collect(),
    ..BuildReport::default()
  };

  let mut states: HashMap<NodeIndex, TaskState> = selected.iter().map(|&idx| (idx, TaskState::Pending)).collect();
  let mut waiting: HashMap<NodeIndex, usize> = HashMap::new();
  let mut ready: BinaryHeap<Reverse<NodeIndex>> = BinaryHeap::new();

  for &idx in &selected {
    let deps = graph.predecessors(idx).filter(|dep| in_selection.contains(dep)).count();
    if deps == 0 {
      ready.push(Reverse(idx));
    } else {
      waiting.insert(idx, deps);
    }
  }

  let mut outputs: HashMap<NodeIndex, TaskOutput> = HashMap::new();
  let mut join_set: JoinSet<Result<TaskOutput, TaskError>> = JoinSet::new();
  let mut running: Running = HashMap::new();
  let mut aborted_by: Option<TaskId> = None;

  loop {
    // Start as many ready tasks as the parallelism budget allows
    while aborted_by.is_none() && running.len() < config.parallelism {
      let Some(Reverse(idx)) = ready.pop() else {
        break;
      };
      transition(&mut states, idx, TaskState::Running);
      spawn_task(graph, idx, &outputs, &mut join_set, &mut running);
    }

    let Some(joined) = join_set.join_next_with_id().await else {
      break;
    };

    let (task_id, result) = match joined {
      Ok((task_id, result)) => (task_id, result),
      Err(e) => (e.id(), Err(panicked(e))),
    };
    let Some((idx, started)) = running.remove(&task_id) else {
      error!(task_id = %task_id, "finished task was never scheduled");
      continue;
    };
    let duration = started.elapsed();
    let id = graph.task_at(idx).id.clone();

    match result {
      Ok(output) => {
        info!(task = %id, elapsed_ms = duration.as_millis() as u64, "task succeeded");
        transition(&mut states, idx, TaskState::Succeeded);
        outputs.insert(idx, output.clone());
        report.succeeded.push(TaskRun {
          id,
          result: output,
          duration,
        });

        for next in graph.successors(idx).filter(|n| in_selection.contains(n)) {
          if let Some(count) = waiting.get_mut(&next) {
            *count = count.saturating_sub(1);
            if *count == 0 && states.get(&next) == Some(&TaskState::Pending) {
              waiting.remove(&next);
              ready.push(Reverse(next));
            }
          }
        }
      }
      Err(err) => {
        error!(task = %id, error = %err, "task failed");
        transition(&mut states, idx, TaskState::Failed);
        skip_dependents(graph, idx, &in_selection, &mut states, &mut report);
        if config.fail_fast && aborted_by.is_none() {
          warn!(task = %id, "fail-fast: no further tasks will start");
          aborted_by = Some(id.clone());
        }
        report.failed.push(TaskRun {
          id,
          result: err,
          duration,
        });
      }
    }
  }

  // Anything still pending never got the chance to start
  if let Some(cause) = aborted_by {
    for &idx in &selected {
      if states.get(&idx) == Some(&TaskState::Pending) {
        transition(&mut states, idx, TaskState::Skipped);
        let id = graph.task_at(idx).id.clone();
        warn!(task = %id, cause = %cause, "task not started");
        report.skipped.insert(id, SkipReason::Aborted(cause.clone()));
      }
    }
  }

  info!(
    succeeded = report.succeeded.len(),
    failed = report.failed.len(),
    skipped = report.skipped.len(),
    "build complete"
  );

  Ok(report)
}

/// Spawn one task on the join set and remember which node it runs.
///
/// A panic or cancellation comes back as a `JoinError` carrying the same
/// tokio task id, so the node can still be marked failed.
fn spawn_task(
  graph: &TaskGraph,
  idx: NodeIndex,
  outputs: &HashMap<NodeIndex, TaskOutput>,
  join_set: &mut JoinSet<Result<TaskOutput, TaskError>>,
  running: &mut Running,
) {
  let task = graph.task_at(idx);

  let upstream = graph
    .predecessors(idx)
    .filter_map(|dep| outputs.get(&dep).map(|out| (graph.task_at(dep).id.clone(), out.clone())))
    .collect();
  let ctx = TaskContext::new(task.id.clone(), upstream);
  let action = task.action.clone();

  debug!(task = %task.id, "starting task");

  let handle = join_set.spawn(async move { action.run(&ctx).await });
  running.insert(handle.id(), (idx, Instant::now()));
}

fn panicked(err: JoinError) -> TaskError {
  if !err.is_panic() {
    return TaskError::Panicked(err.to_string());
  }
  let payload = err.into_panic();
  let message = payload
    .downcast_ref::<&str>()
    .map(|s| s.to_string())
    .or_else(|| payload.downcast_ref::<String>().cloned())
    .unwrap_or_else(|| "unknown panic payload".to_string());
  TaskError::Panicked(message)
}

/// Mark every pending transitive dependent of a failed task as skipped.
fn skip_dependents(
  graph: &TaskGraph,
  failed: NodeIndex,
  in_selection: &HashSet<NodeIndex>,
  states: &mut HashMap<NodeIndex, TaskState>,
  report: &mut BuildReport,
) {
  let cause = graph.task_at(failed).id.clone();
  let mut stack: Vec<NodeIndex> = graph.successors(failed).collect();

  while let Some(idx) = stack.pop() {
    if !in_selection.contains(&idx) || states.get(&idx) != Some(&TaskState::Pending) {
      continue;
    }
    transition(states, idx, TaskState::Skipped);
    let id = graph.task_at(idx).id.clone();
    warn!(task = %id, failed_dep = %cause, "skipping task due to failed dependency");
    report.skipped.insert(id, SkipReason::DependencyFailed(cause.clone()));
    stack.extend(graph.successors(idx));
  }
}

fn transition(states: &mut HashMap<NodeIndex, TaskState>, idx: NodeIndex, next: TaskState) {
  if let Some(state) = states.get_mut(&idx) {
    debug_assert!(state.can_transition_to(next), "illegal transition {state} -> {next}");
    *state = next;
  }
}
