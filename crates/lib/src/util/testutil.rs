//! Test utilities for sandpack-lib.
//!
//! Ready-made task actions and cross-platform shell snippets for tests that
//! drive the scheduler or external tools.

use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::execute::{TaskAction, TaskContext, TaskError, TaskOutput, action_fn};
use crate::tools::ToolError;

/// An action that succeeds without doing anything.
pub fn noop() -> impl TaskAction {
  action_fn(|_ctx: TaskContext| async { Ok(TaskOutput::default()) })
}

/// An action that fails as if an external tool exited with status 1.
pub fn fail(message: &str) -> impl TaskAction {
  let message = message.to_string();
  action_fn(move |ctx: TaskContext| {
    let message = message.clone();
    async move {
      Err(TaskError::Tool(ToolError::Exited {
        tool: ctx.task.0,
        code: Some(1),
        stderr: message,
      }))
    }
  })
}

/// Records the order in which actions ran.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
  events: Arc<Mutex<Vec<String>>>,
}

impl Recorder {
  /// An action that appends `name` to the recorder when it runs.
  pub fn action(&self, name: &str) -> impl TaskAction + use<> {
    let events = self.events.clone();
    let name = name.to_string();
    action_fn(move |_ctx: TaskContext| {
      let events = events.clone();
      let name = name.clone();
      async move {
        events.lock().unwrap().push(name);
        Ok(TaskOutput::default())
      }
    })
  }

  pub fn events(&self) -> Vec<String> {
    self.events.lock().unwrap().clone()
  }
}

/// Write `content` to `root/relative`, creating parent directories.
pub fn write_file(root: &Path, relative: &str, content: &str) {
  let path = root.join(relative);
  if let Some(parent) = path.parent() {
    std::fs::create_dir_all(parent).unwrap();
  }
  std::fs::write(path, content).unwrap();
}

/// Relative paths of every file under `root`, sorted, `/`-separated.
pub fn list_files(root: &Path) -> Vec<String> {
  let mut files: Vec<String> = walkdir::WalkDir::new(root)
    .into_iter()
    .filter_map(Result::ok)
    .filter(|e| e.file_type().is_file())
    .map(|e| {
      e.path()
        .strip_prefix(root)
        .unwrap()
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
    })
    .collect();
  files.sort();
  files
}

/// Returns a shell command that writes `content` into `$SANDPACK_OUTPUT/<name>`.
#[cfg(unix)]
pub fn write_output_cmd(name: &str, content: &str) -> String {
  format!("printf '%s' '{}' > \"$SANDPACK_OUTPUT/{}\"", content, name)
}

#[cfg(windows)]
pub fn write_output_cmd(name: &str, content: &str) -> String {
  format!("Set-Content -NoNewline -Path (Join-Path $env:SANDPACK_OUTPUT '{}') -Value '{}'", name, content)
}

/// Returns a shell command that exits with the given status.
pub fn exit_cmd(code: i32) -> String {
  format!("exit {}", code)
}
