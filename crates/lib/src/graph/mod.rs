//! Task dependency graph.
//!
//! Tasks are registered with a [`TaskGraphBuilder`] and validated once in
//! [`TaskGraphBuilder::build`]: duplicate names, unknown or self dependencies and
//! cycles are all rejected there, before anything can execute. The resulting
//! [`TaskGraph`] stores a topological order computed with Kahn's algorithm, ties
//! broken by declaration order so repeated builds schedule identically.

mod types;

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};

use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::Serialize;

pub use types::{GraphError, Task, TaskId};

/// Collects task declarations and turns them into a validated [`TaskGraph`].
#[derive(Debug, Default)]
pub struct TaskGraphBuilder {
  tasks: Vec<Task>,
}

impl TaskGraphBuilder {
  pub fn new() -> Self {
    Self::default()
  }

  /// Declare a task. Validation is deferred to [`build`](Self::build).
  pub fn register(&mut self, task: Task) -> &mut Self {
    self.tasks.push(task);
    self
  }

  pub fn with(mut self, task: Task) -> Self {
    self.tasks.push(task);
    self
  }

  /// Validate the declarations and compute the execution order.
  ///
  /// # Errors
  ///
  /// - `DuplicateTask` if two tasks share a name
  /// - `SelfDependency` if a task lists itself as a predecessor
  /// - `UnknownDependency` if a predecessor was never declared
  /// - `Cycle` if the dependency edges form a cycle
  pub fn build(self) -> Result<TaskGraph, GraphError> {
    let mut graph = DiGraph::new();
    let mut nodes = HashMap::new();

    // First pass: one node per task, node index == declaration index
    for task in &self.tasks {
      if nodes.contains_key(&task.id) {
        return Err(GraphError::DuplicateTask(task.id.clone()));
      }
      let idx = graph.add_node(task.id.clone());
      nodes.insert(task.id.clone(), idx);
    }

    // Second pass: edges from dependency to dependent
    for task in &self.tasks {
      let dependent = nodes[&task.id];
      for dep in &task.depends_on {
        if dep == &task.id {
          return Err(GraphError::SelfDependency(task.id.clone()));
        }
        let Some(&dep_idx) = nodes.get(dep) else {
          return Err(GraphError::UnknownDependency {
            task: task.id.clone(),
            dependency: dep.clone(),
          });
        };
        graph.update_edge(dep_idx, dependent, ());
      }
    }

    let order = topological_sort(&graph)?;

    Ok(TaskGraph {
      graph,
      nodes,
      tasks: self.tasks,
      order,
    })
  }
}

/// A validated, acyclic set of tasks.
pub struct TaskGraph {
  graph: DiGraph<TaskId, ()>,
  nodes: HashMap<TaskId, NodeIndex>,
  /// Indexed by `NodeIndex::index()`.
  tasks: Vec<Task>,
  order: Vec<NodeIndex>,
}

/// Order and parallel waves for a selection of tasks, without running anything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionPlan {
  pub order: Vec<TaskId>,
  pub waves: Vec<Vec<TaskId>>,
}

impl TaskGraph {
  pub fn builder() -> TaskGraphBuilder {
    TaskGraphBuilder::new()
  }

  pub fn len(&self) -> usize {
    self.tasks.len()
  }

  pub fn is_empty(&self) -> bool {
    self.tasks.is_empty()
  }

  pub fn contains(&self, id: &TaskId) -> bool {
    self.nodes.contains_key(id)
  }

  pub fn get(&self, id: &TaskId) -> Option<&Task> {
    self.nodes.get(id).map(|idx| &self.tasks[idx.index()])
  }

  /// All tasks in declaration order.
  pub fn tasks(&self) -> impl Iterator<Item = &Task> {
    self.tasks.iter()
  }

  /// All task names in topological order.
  pub fn topological_order(&self) -> Vec<&TaskId> {
    self.order.iter().map(|&idx| &self.graph[idx]).collect()
  }

  /// Direct predecessors of a task, in declaration order.
  pub fn dependencies(&self, id: &TaskId) -> Vec<&TaskId> {
    let Some(&idx) = self.nodes.get(id) else {
      return Vec::new();
    };
    self.sorted_neighbors(idx, Direction::Incoming).map(|n| &self.graph[n]).collect()
  }

  /// Direct dependents of a task, in declaration order.
  pub fn dependents(&self, id: &TaskId) -> Vec<&TaskId> {
    let Some(&idx) = self.nodes.get(id) else {
      return Vec::new();
    };
    self.sorted_neighbors(idx, Direction::Outgoing).map(|n| &self.graph[n]).collect()
  }

  /// The targets plus everything they transitively depend on, in topological order.
  pub fn closure(&self, targets: &[TaskId]) -> Result<Vec<TaskId>, GraphError> {
    let selected = self.select(targets)?;
    Ok(selected.into_iter().map(|idx| self.graph[idx].clone()).collect())
  }

  /// Topological order plus parallel waves for the given targets.
  ///
  /// Each wave contains tasks whose predecessors all sit in earlier waves. An
  /// empty target list selects the whole graph.
  pub fn plan(&self, targets: &[TaskId]) -> Result<ExecutionPlan, GraphError> {
    let selected = self.select(targets)?;
    let in_selection: HashSet<NodeIndex> = selected.iter().copied().collect();

    let mut level: HashMap<NodeIndex, usize> = HashMap::new();
    for &idx in &selected {
      let lvl = self
        .graph
        .neighbors_directed(idx, Direction::Incoming)
        .filter(|dep| in_selection.contains(dep))
        .filter_map(|dep| level.get(&dep).map(|l| l + 1))
        .max()
        .unwrap_or(0);
      level.insert(idx, lvl);
    }

    let wave_count = level.values().copied().max().map(|m| m + 1).unwrap_or(0);
    let mut waves: Vec<Vec<NodeIndex>> = vec![Vec::new(); wave_count];
    for &idx in &selected {
      waves[level[&idx]].push(idx);
    }

    Ok(ExecutionPlan {
      order: selected.iter().map(|&idx| self.graph[idx].clone()).collect(),
      waves: waves
        .into_iter()
        .map(|mut wave| {
          wave.sort();
          wave.into_iter().map(|idx| self.graph[idx].clone()).collect()
        })
        .collect(),
    })
  }

  /// Node indices for the targets and their transitive predecessors, in
  /// topological order. Empty targets select every task.
  pub(crate) fn select(&self, targets: &[TaskId]) -> Result<Vec<NodeIndex>, GraphError> {
    if targets.is_empty() {
      return Ok(self.order.clone());
    }

    let mut seen: HashSet<NodeIndex> = HashSet::new();
    let mut stack = Vec::new();
    for target in targets {
      let idx = self
        .nodes
        .get(target)
        .copied()
        .ok_or_else(|| GraphError::UnknownTask(target.clone()))?;
      stack.push(idx);
    }

    while let Some(idx) = stack.pop() {
      if seen.insert(idx) {
        stack.extend(self.graph.neighbors_directed(idx, Direction::Incoming));
      }
    }

    Ok(self.order.iter().copied().filter(|idx| seen.contains(idx)).collect())
  }

  pub(crate) fn task_at(&self, idx: NodeIndex) -> &Task {
    &self.tasks[idx.index()]
  }

  pub(crate) fn predecessors(&self, idx: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
    self.sorted_neighbors(idx, Direction::Incoming)
  }

  pub(crate) fn successors(&self, idx: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
    self.sorted_neighbors(idx, Direction::Outgoing)
  }

  fn sorted_neighbors(&self, idx: NodeIndex, dir: Direction) -> impl Iterator<Item = NodeIndex> + '_ {
    let mut neighbors: Vec<NodeIndex> = self.graph.neighbors_directed(idx, dir).collect();
    neighbors.sort();
    neighbors.into_iter()
  }
}

impl std::fmt::Debug for TaskGraph {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("TaskGraph")
      .field("order", &self.topological_order())
      .finish()
  }
}

/// Kahn's algorithm with a min-heap on declaration index.
fn topological_sort(graph: &DiGraph<TaskId, ()>) -> Result<Vec<NodeIndex>, GraphError> {
  let mut in_degree: Vec<usize> = graph
    .node_indices()
    .map(|idx| graph.neighbors_directed(idx, Direction::Incoming).count())
    .collect();

  let mut ready: BinaryHeap<Reverse<NodeIndex>> = graph
    .node_indices()
    .filter(|idx| in_degree[idx.index()] == 0)
    .map(Reverse)
    .collect();

  let mut order = Vec::with_capacity(graph.node_count());
  while let Some(Reverse(idx)) = ready.pop() {
    order.push(idx);
    for next in graph.neighbors_directed(idx, Direction::Outgoing) {
      let deg = &mut in_degree[next.index()];
      *deg = deg.saturating_sub(1);
      if *deg == 0 {
        ready.push(Reverse(next));
      }
    }
  }

  if order.len() < graph.node_count() {
    let remaining: HashSet<NodeIndex> = graph.node_indices().filter(|idx| in_degree[idx.index()] > 0).collect();
    return Err(GraphError::Cycle(find_cycle(graph, &remaining)));
  }

  Ok(order)
}

/// Recover one cycle from the nodes Kahn's algorithm could not order.
///
/// Every leftover node has a leftover predecessor, so walking predecessors from
/// any leftover node must revisit a node. The walk goes from a task to the task
/// it depends on.
fn find_cycle(graph: &DiGraph<TaskId, ()>, remaining: &HashSet<NodeIndex>) -> Vec<TaskId> {
  let Some(&start) = remaining.iter().min() else {
    return Vec::new();
  };

  let mut path: Vec<NodeIndex> = vec![start];
  let mut current = start;
  loop {
    let Some(dep) = graph
      .neighbors_directed(current, Direction::Incoming)
      .filter(|n| remaining.contains(n))
      .min()
    else {
      break;
    };
    if let Some(pos) = path.iter().position(|&n| n == dep) {
      return path[pos..].iter().map(|&n| graph[n].clone()).collect();
    }
    path.push(dep);
    current = dep;
  }

  path.into_iter().map(|n| graph[n].clone()).collect()
}
