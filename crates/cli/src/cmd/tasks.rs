//! Implementation of the `sandpack tasks` command.

use std::path::Path;

use anyhow::Result;
use owo_colors::{OwoColorize, Stream};
use serde::Serialize;

use sandpack_lib::config::Overrides;
use sandpack_lib::graph::TaskId;

use super::load_graph;
use crate::output::{OutputFormat, print_json};

#[derive(Debug, Serialize)]
struct TaskInfo<'a> {
  name: &'a TaskId,
  depends_on: Vec<&'a TaskId>,
  #[serde(skip_serializing_if = "Option::is_none")]
  description: Option<&'a str>,
}

pub fn cmd_tasks(config: &Path, overrides: &Overrides, format: OutputFormat) -> Result<()> {
  let (_, graph) = load_graph(config, overrides)?;

  let infos: Vec<TaskInfo<'_>> = graph
    .tasks()
    .map(|task| TaskInfo {
      name: &task.id,
      depends_on: graph.dependencies(&task.id),
      description: task.description.as_deref(),
    })
    .collect();

  if format.is_json() {
    return print_json(&infos);
  }

  for info in &infos {
    println!(
      "{}",
      info.name.as_str().if_supports_color(Stream::Stdout, |s| s.bold())
    );
    if let Some(description) = info.description {
      println!("    {}", description);
    }
    if !info.depends_on.is_empty() {
      let deps: Vec<&str> = info.depends_on.iter().map(|d| d.as_str()).collect();
      println!(
        "    {} {}",
        "depends on:".if_supports_color(Stream::Stdout, |s| s.dimmed()),
        deps.join(", ")
      );
    }
  }

  Ok(())
}
