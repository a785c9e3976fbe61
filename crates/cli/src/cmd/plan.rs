//! Implementation of the `sandpack plan` command.
//!
//! Prints the order the selected tasks would run in, grouped into waves of
//! tasks that may run concurrently. Nothing is executed.

use std::path::Path;

use anyhow::{Context, Result};

use sandpack_lib::config::Overrides;

use super::{load_graph, targets};
use crate::output::{OutputFormat, print_info, print_json};

pub fn cmd_plan(config: &Path, overrides: &Overrides, tasks: &[String], format: OutputFormat) -> Result<()> {
  let (project, graph) = load_graph(config, overrides)?;
  let plan = graph.plan(&targets(tasks)).context("Failed to plan tasks")?;

  if format.is_json() {
    return print_json(&plan);
  }

  print_info(&format!(
    "{} task(s), parallelism {}",
    plan.order.len(),
    project.execution.parallelism
  ));
  println!();
  println!("Order:");
  for (i, id) in plan.order.iter().enumerate() {
    println!("  {}. {}", i + 1, id);
  }
  println!();
  println!("Waves:");
  for (i, wave) in plan.waves.iter().enumerate() {
    let names: Vec<&str> = wave.iter().map(|id| id.as_str()).collect();
    println!("  {}: {}", i + 1, names.join(", "));
  }

  Ok(())
}
