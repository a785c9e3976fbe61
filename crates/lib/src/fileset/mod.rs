//! Declarative file selections.
//!
//! A [`FileSet`] is a root directory plus ordered inclusion globs. It only
//! describes what to pick; staging and archiving walk it with [`FileSet::files`].
//! Patterns match against the `/`-separated path relative to the root, so
//! `**/*` selects every file and `**/*.*` every file whose name has an extension.

use std::path::{Path, PathBuf};

use glob::{MatchOptions, Pattern};
use serde::{Deserialize, Serialize};
use tracing::debug;
use walkdir::WalkDir;

use crate::consts::PATTERN_ALL;
use crate::execute::TaskError;

const MATCH_OPTIONS: MatchOptions = MatchOptions {
  case_sensitive: true,
  require_literal_separator: true,
  require_literal_leading_dot: false,
};

/// A root directory and the inclusion patterns selecting files below it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSet {
  pub root: PathBuf,
  pub include: Vec<String>,
}

/// A file selected by a [`FileSet`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedFile {
  /// Absolute (or root-joined) path on disk.
  pub source: PathBuf,
  /// Path relative to the set's root, always `/`-separated.
  pub relative: String,
}

impl FileSet {
  pub fn new<I, S>(root: impl Into<PathBuf>, include: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    Self {
      root: root.into(),
      include: include.into_iter().map(Into::into).collect(),
    }
  }

  /// Every file under `root`.
  pub fn all(root: impl Into<PathBuf>) -> Self {
    Self::new(root, [PATTERN_ALL])
  }

  fn patterns(&self) -> Result<Vec<Pattern>, TaskError> {
    self
      .include
      .iter()
      .map(|p| {
        Pattern::new(p).map_err(|e| TaskError::InvalidPattern {
          pattern: p.clone(),
          message: e.msg.to_string(),
        })
      })
      .collect()
  }

  /// All selected files, sorted by relative path.
  ///
  /// # Errors
  ///
  /// `MissingSource` if the root does not exist, `InvalidPattern` for a
  /// malformed glob.
  pub fn files(&self) -> Result<Vec<MatchedFile>, TaskError> {
    if !self.root.is_dir() {
      return Err(TaskError::MissingSource {
        path: self.root.clone(),
      });
    }

    let patterns = self.patterns()?;
    let mut matched = Vec::new();

    for entry in WalkDir::new(&self.root).sort_by_file_name().follow_links(true) {
      let entry = entry?;
      if !entry.file_type().is_file() {
        continue;
      }
      let Some(relative) = relative_path(&self.root, entry.path()) else {
        continue;
      };
      if patterns.iter().any(|p| p.matches_with(&relative, MATCH_OPTIONS)) {
        matched.push(MatchedFile {
          source: entry.path().to_path_buf(),
          relative,
        });
      }
    }

    matched.sort_by(|a, b| a.relative.cmp(&b.relative));
    debug!(root = %self.root.display(), files = matched.len(), "resolved file set");
    Ok(matched)
  }
}

/// `path` relative to `root` with `/` separators, or `None` for the root itself.
fn relative_path(root: &Path, path: &Path) -> Option<String> {
  let rel = path.strip_prefix(root).ok()?;
  if rel.as_os_str().is_empty() {
    return None;
  }
  let parts: Vec<String> = rel
    .components()
    .map(|c| c.as_os_str().to_string_lossy().into_owned())
    .collect();
  Some(parts.join("/"))
}
