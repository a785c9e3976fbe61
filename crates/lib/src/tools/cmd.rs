//! Shell command tools.
//!
//! A [`CommandTool`] runs one shell command with the caller's environment plus
//! a small set of variables describing the source set and output directory:
//!
//! - `SANDPACK_SOURCE_ROOT`: root of the source set
//! - `SANDPACK_SOURCE_LIST`: file listing every source, one absolute path per line
//! - `SANDPACK_OUTPUT` and `out`: the output directory, created before the run

use std::io::Write;
use std::path::PathBuf;

use async_trait::async_trait;
use tempfile::NamedTempFile;
use tokio::process::Command;
use tracing::{debug, info};

use super::{ExternalTool, OutputLocation, SourceSet, ToolError};
use crate::consts::{ENV_OUTPUT, ENV_SOURCE_LIST, ENV_SOURCE_ROOT, SOURCE_DATE_EPOCH};

/// An external tool invoked through a shell.
#[derive(Debug, Clone)]
pub struct CommandTool {
  name: String,
  command: String,
  output: PathBuf,
  cwd: Option<PathBuf>,
  shell: Option<String>,
}

impl CommandTool {
  pub fn new(name: impl Into<String>, command: impl Into<String>, output: impl Into<PathBuf>) -> Self {
    Self {
      name: name.into(),
      command: command.into(),
      output: output.into(),
      cwd: None,
      shell: None,
    }
  }

  /// Run the command from `dir` instead of the output directory.
  pub fn in_dir(mut self, dir: impl Into<PathBuf>) -> Self {
    self.cwd = Some(dir.into());
    self
  }

  /// Use a specific shell instead of the platform default.
  pub fn with_shell(mut self, shell: Option<String>) -> Self {
    self.shell = shell;
    self
  }

  fn prepare_error(&self, source: std::io::Error) -> ToolError {
    ToolError::Prepare {
      tool: self.name.clone(),
      source,
    }
  }

  fn write_source_list(&self, sources: &SourceSet) -> Result<NamedTempFile, ToolError> {
    let mut list = NamedTempFile::new().map_err(|e| self.prepare_error(e))?;
    for file in &sources.files {
      writeln!(list, "{}", file.display()).map_err(|e| self.prepare_error(e))?;
    }
    list.flush().map_err(|e| self.prepare_error(e))?;
    Ok(list)
  }
}

#[async_trait]
impl ExternalTool for CommandTool {
  fn name(&self) -> &str {
    &self.name
  }

  async fn run(&self, sources: &SourceSet) -> Result<OutputLocation, ToolError> {
    info!(tool = %self.name, cmd = %self.command, sources = sources.len(), "running external tool");

    tokio::fs::create_dir_all(&self.output)
      .await
      .map_err(|e| self.prepare_error(e))?;

    // Kept alive until the process exits.
    let list = self.write_source_list(sources)?;

    let (shell_cmd, shell_args) = get_shell(self.shell.as_deref());
    let working_dir = self.cwd.as_deref().unwrap_or(&self.output);

    let mut command = Command::new(&shell_cmd);
    command
      .args(&shell_args)
      .arg(&self.command)
      .current_dir(working_dir)
      .env(ENV_SOURCE_ROOT, &sources.root)
      .env(ENV_SOURCE_LIST, list.path())
      .env(ENV_OUTPUT, &self.output)
      .env("out", &self.output)
      .env("SOURCE_DATE_EPOCH", SOURCE_DATE_EPOCH.to_string());

    debug!(shell = %shell_cmd, working_dir = ?working_dir, "spawning process");

    let output = command.output().await.map_err(|source| ToolError::Spawn {
      tool: self.name.clone(),
      source,
    })?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    if !stdout.trim().is_empty() {
      debug!(tool = %self.name, stdout = %stdout.trim(), "command stdout");
    }
    if !stderr.trim().is_empty() {
      debug!(tool = %self.name, stderr = %stderr.trim(), "command stderr");
    }

    if !output.status.success() {
      return Err(ToolError::Exited {
        tool: self.name.clone(),
        code: output.status.code(),
        stderr: stderr.trim().to_string(),
      });
    }

    Ok(OutputLocation::new(&self.output))
  }
}

/// Shell program and the arguments that precede the command string.
///
/// Defaults to `/bin/sh` rather than `$SHELL`, so user profiles are not sourced.
fn get_shell(override_shell: Option<&str>) -> (String, Vec<String>) {
  if let Some(shell) = override_shell {
    let args = if shell.contains("powershell") || shell.contains("pwsh") {
      vec!["-NoProfile".to_string(), "-Command".to_string()]
    } else if shell.contains("cmd") {
      vec!["/C".to_string()]
    } else {
      vec!["-c".to_string()]
    };
    return (shell.to_string(), args);
  }

  #[cfg(unix)]
  {
    ("/bin/sh".to_string(), vec!["-c".to_string()])
  }

  #[cfg(windows)]
  {
    (
      "powershell.exe".to_string(),
      vec![
        "-NoProfile".to_string(),
        "-ExecutionPolicy".to_string(),
        "Bypass".to_string(),
        "-Command".to_string(),
      ],
    )
  }
}
