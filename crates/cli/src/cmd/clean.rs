//! Implementation of the `sandpack clean` command.

use std::path::Path;

use anyhow::{Context, Result};

use sandpack_lib::config::Overrides;
use sandpack_lib::pipeline::clean;

use super::load_project;
use crate::output::{OutputFormat, print_info, print_json, print_success};

pub fn cmd_clean(config: &Path, overrides: &Overrides, format: OutputFormat) -> Result<()> {
  let project = load_project(config, overrides)?;
  let removed = clean(&project).context("Failed to clean build outputs")?;

  if format.is_json() {
    return print_json(&serde_json::json!({ "removed": removed }));
  }

  if removed.is_empty() {
    print_info("Nothing to clean");
  }
  for path in &removed {
    print_success(&format!("Removed {}", path.display()));
  }
  Ok(())
}
