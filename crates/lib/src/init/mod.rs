//! Scaffold a new project.
//!
//! Writes a default `sandpack.toml` and creates the default source and
//! resource directories so the first `sandpack run` has something to stage.

mod templates;

use std::fs;
use std::path::PathBuf;

use thiserror::Error;
use tracing::info;

use crate::consts::{CONFIG_FILE, DEFAULT_RESOURCES_DIR, DEFAULT_SOURCES_DIR};

pub use templates::CONFIG_TEMPLATE;

#[derive(Debug, Error)]
pub enum InitError {
  #[error("file already exists: {}", path.display())]
  PathExists { path: PathBuf },

  #[error("failed to create directory {}: {source}", path.display())]
  CreateDir { path: PathBuf, source: std::io::Error },

  #[error("failed to write file {}: {source}", path.display())]
  WriteFile { path: PathBuf, source: std::io::Error },

  #[error("failed to canonicalize path {}: {source}", path.display())]
  Canonicalize { path: PathBuf, source: std::io::Error },
}

/// Result of a successful initialization.
#[derive(Debug)]
pub struct InitResult {
  /// The project directory (canonicalized)
  pub project_dir: PathBuf,
  pub config_file: PathBuf,
  pub sources_dir: PathBuf,
  pub resources_dir: PathBuf,
}

/// Initialize a project in `dir`, creating it if needed.
///
/// # Errors
///
/// Returns an error if `sandpack.toml` already exists or the filesystem
/// refuses a write.
pub fn init(dir: impl Into<PathBuf>) -> Result<InitResult, InitError> {
  let dir = dir.into();

  fs::create_dir_all(&dir).map_err(|e| InitError::CreateDir {
    path: dir.clone(),
    source: e,
  })?;

  let project_dir = dunce::canonicalize(&dir).map_err(|e| InitError::Canonicalize {
    path: dir.clone(),
    source: e,
  })?;

  let config_file = project_dir.join(CONFIG_FILE);
  if config_file.exists() {
    return Err(InitError::PathExists { path: config_file });
  }

  let sources_dir = project_dir.join(DEFAULT_SOURCES_DIR);
  let resources_dir = project_dir.join(DEFAULT_RESOURCES_DIR);
  for path in [&sources_dir, &resources_dir] {
    fs::create_dir_all(path).map_err(|e| InitError::CreateDir {
      path: path.clone(),
      source: e,
    })?;
  }

  fs::write(&config_file, CONFIG_TEMPLATE).map_err(|e| InitError::WriteFile {
    path: config_file.clone(),
    source: e,
  })?;

  info!(path = %config_file.display(), "initialized project");

  Ok(InitResult {
    project_dir,
    config_file,
    sources_dir,
    resources_dir,
  })
}
