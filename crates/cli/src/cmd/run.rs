//! Implementation of the `sandpack run` command.
//!
//! Builds the project's task graph, runs the selected tasks, and prints one
//! line per task. Fails if any selected task failed or was skipped.

use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::Serialize;

use sandpack_lib::config::Overrides;
use sandpack_lib::execute::{BuildReport, TaskState, execute_targets};
use sandpack_lib::graph::TaskId;

use super::{load_graph, targets};
use crate::output::{
  OutputFormat, format_duration, print_failure, print_json, print_skipped, print_stat, print_success, symbols,
  truncate_hash,
};

#[derive(Debug, Serialize)]
struct RunSummary {
  success: bool,
  tasks: Vec<TaskSummary>,
}

#[derive(Debug, Serialize)]
struct TaskSummary {
  name: TaskId,
  state: TaskState,
  #[serde(skip_serializing_if = "Option::is_none")]
  duration_ms: Option<u64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  output: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  files: Option<usize>,
  #[serde(skip_serializing_if = "Option::is_none")]
  sha256: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  error: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  cause: Option<TaskId>,
}

/// Summarize a report in topological order.
fn summarize(report: &BuildReport) -> RunSummary {
  let tasks = report
    .selected
    .iter()
    .map(|id| {
      let mut summary = TaskSummary {
        name: id.clone(),
        state: report.state(id).unwrap_or(TaskState::Pending),
        duration_ms: None,
        output: None,
        files: None,
        sha256: None,
        error: None,
        cause: None,
      };
      if let Some(run) = report.succeeded.iter().find(|r| &r.id == id) {
        summary.duration_ms = Some(run.duration.as_millis() as u64);
        summary.output = run.result.location.as_ref().map(|p| p.display().to_string());
        summary.files = Some(run.result.files);
        summary.sha256 = run.result.sha256.as_ref().map(|h| h.to_string());
      } else if let Some(run) = report.failed.iter().find(|r| &r.id == id) {
        summary.duration_ms = Some(run.duration.as_millis() as u64);
        summary.error = Some(run.result.to_string());
      } else if let Some(reason) = report.skipped.get(id) {
        summary.cause = Some(reason.cause().clone());
      }
      summary
    })
    .collect();

  RunSummary {
    success: report.is_success(),
    tasks,
  }
}

fn print_report(report: &BuildReport) {
  for id in &report.selected {
    if let Some(run) = report.succeeded.iter().find(|r| &r.id == id) {
      let mut line = format!("{} ({})", id, format_duration(run.duration));
      if let Some(location) = &run.result.location {
        line.push_str(&format!(" {} {}", symbols::ARROW, location.display()));
      }
      print_success(&line);
      if let Some(sha256) = &run.result.sha256 {
        print_stat("sha256", truncate_hash(&sha256.0));
      }
      if let Some(detail) = &run.result.detail {
        print_stat("detail", detail);
      }
    } else if let Some(run) = report.failed.iter().find(|r| &r.id == id) {
      print_failure(&format!("{} ({}): {}", id, format_duration(run.duration), run.result));
    } else if let Some(reason) = report.skipped.get(id) {
      print_skipped(&format!("{} skipped: {}", id, reason));
    }
  }

  println!();
  print_stat("succeeded", &report.succeeded.len().to_string());
  print_stat("failed", &report.failed.len().to_string());
  print_stat("skipped", &report.skipped.len().to_string());
}

pub fn cmd_run(config: &Path, overrides: &Overrides, tasks: &[String], format: OutputFormat) -> Result<()> {
  let (project, graph) = load_graph(config, overrides)?;

  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let report = rt
    .block_on(execute_targets(&graph, &targets(tasks), &project.execution))
    .context("Build could not start")?;

  if format.is_json() {
    print_json(&summarize(&report))?;
  } else {
    print_report(&report);
  }

  if !report.is_success() {
    bail!(
      "build failed: {} task(s) failed, {} skipped",
      report.failed.len(),
      report.skipped.len()
    );
  }
  Ok(())
}
