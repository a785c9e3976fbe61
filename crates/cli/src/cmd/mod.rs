mod clean;
mod init;
mod plan;
mod run;
mod tasks;

use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

use sandpack_lib::config::{Overrides, Project};
use sandpack_lib::graph::{TaskGraph, TaskId};
use sandpack_lib::pipeline::{Tools, build_pipeline};

pub use clean::cmd_clean;
pub use init::cmd_init;
pub use plan::cmd_plan;
pub use run::cmd_run;
pub use tasks::cmd_tasks;

/// Load the project file and resolve it with command-line overrides.
fn load_project(config: &Path, overrides: &Overrides) -> Result<Project> {
  Project::load(config, overrides).with_context(|| format!("Failed to load config: {}", config.display()))
}

/// Load the project and build its task graph.
fn load_graph(config: &Path, overrides: &Overrides) -> Result<(Project, TaskGraph)> {
  let project = load_project(config, overrides)?;
  let graph = build_pipeline(&project, Tools::from_project(&project)).context("Invalid task graph")?;
  debug!(tasks = graph.len(), root = %project.root.display(), "built task graph");
  Ok((project, graph))
}

fn targets(names: &[String]) -> Vec<TaskId> {
  names.iter().map(|n| TaskId::from(n.as_str())).collect()
}
