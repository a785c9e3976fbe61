//! External tool capabilities.
//!
//! The pipeline never compiles or renders documentation itself. It hands a
//! resolved [`SourceSet`] to an [`ExternalTool`] and gets back the directory the
//! tool produced. [`CommandTool`] runs a shell command; [`PrebuiltOutput`]
//! stands in for a tool that runs outside the pipeline.

mod cmd;

use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;

pub use cmd::CommandTool;

use crate::execute::TaskError;
use crate::fileset::FileSet;

/// Failure of an external tool invocation.
#[derive(Debug, Error)]
pub enum ToolError {
  #[error("{tool} exited with {}: {stderr}", describe_code(*code))]
  Exited {
    tool: String,
    code: Option<i32>,
    stderr: String,
  },

  #[error("failed to start {tool}: {source}")]
  Spawn {
    tool: String,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to prepare {tool}: {source}")]
  Prepare {
    tool: String,
    #[source]
    source: std::io::Error,
  },
}

fn describe_code(code: Option<i32>) -> String {
  match code {
    Some(code) => format!("status {}", code),
    None => "no status (terminated by signal)".to_string(),
  }
}

/// The concrete files an external tool operates on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSet {
  pub root: PathBuf,
  pub files: Vec<PathBuf>,
}

impl SourceSet {
  /// Resolve a file set into the files it currently selects.
  pub fn resolve(set: &FileSet) -> Result<Self, TaskError> {
    let files = set.files()?.into_iter().map(|f| f.source).collect();
    Ok(Self {
      root: set.root.clone(),
      files,
    })
  }

  pub fn len(&self) -> usize {
    self.files.len()
  }

  pub fn is_empty(&self) -> bool {
    self.files.is_empty()
  }
}

/// Where a tool left its output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLocation {
  pub dir: PathBuf,
}

impl OutputLocation {
  pub fn new(dir: impl Into<PathBuf>) -> Self {
    Self { dir: dir.into() }
  }
}

/// A compiler, documentation generator, or anything else that turns a source
/// set into an output directory.
#[async_trait]
pub trait ExternalTool: Send + Sync {
  fn name(&self) -> &str;

  /// Whether the tool needs its source set resolved before running.
  fn reads_sources(&self) -> bool {
    true
  }

  /// Run to completion. Any non-zero exit is an error; partial output is
  /// never interpreted.
  async fn run(&self, sources: &SourceSet) -> Result<OutputLocation, ToolError>;
}

/// A tool whose output is produced outside the pipeline.
///
/// Reports the configured directory without checking it; consumers fail with
/// `MissingArtifact` if nothing is there.
#[derive(Debug, Clone)]
pub struct PrebuiltOutput {
  name: String,
  dir: PathBuf,
}

impl PrebuiltOutput {
  pub fn new(name: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
    Self {
      name: name.into(),
      dir: dir.into(),
    }
  }
}

#[async_trait]
impl ExternalTool for PrebuiltOutput {
  fn name(&self) -> &str {
    &self.name
  }

  fn reads_sources(&self) -> bool {
    false
  }

  async fn run(&self, _sources: &SourceSet) -> Result<OutputLocation, ToolError> {
    Ok(OutputLocation::new(&self.dir))
  }
}
