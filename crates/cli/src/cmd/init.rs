//! Implementation of the `sandpack init` command.
//!
//! Writes a default `sandpack.toml` and creates the default source and
//! resource directories.

use std::path::Path;

use anyhow::{Context, Result};
use owo_colors::OwoColorize;

use sandpack_lib::init::init;

use crate::output::{OutputFormat, print_json, symbols};

pub fn cmd_init(dir: &Path, format: OutputFormat) -> Result<()> {
  let result = init(dir).context("Failed to initialize project")?;

  if format.is_json() {
    return print_json(&serde_json::json!({
      "project_dir": result.project_dir,
      "config_file": result.config_file,
    }));
  }

  println!(
    "{} {}",
    symbols::SUCCESS.green(),
    "Initialized sandpack project!".green().bold()
  );
  println!();
  println!("  {} Project:   {}", symbols::INFO.cyan(), result.project_dir.display());
  println!("  {} Config:    {}", symbols::INFO.cyan(), result.config_file.display());
  println!("  {} Sources:   {}", symbols::INFO.cyan(), result.sources_dir.display());
  println!("  {} Resources: {}", symbols::INFO.cyan(), result.resources_dir.display());
  println!();
  println!("{}", "Next steps:".bold());
  println!(
    "  1. Set a compiler command in {}",
    result.config_file.display().to_string().cyan()
  );
  println!("  2. Run: {}", "sandpack run".cyan());

  Ok(())
}
