//! Staging files into the shared sandbox directory.
//!
//! Staging copies matched files to `dest/<relative path>` with overwrite
//! semantics, so repeating a stage with the same inputs reproduces the same
//! tree. Files already in the destination that no input selects are left alone.
//!
//! Each file is written to a temporary file beside its target and renamed over
//! it. Stages running at the same time may target the same relative path; the
//! last rename wins and the result is always one whole input file.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::execute::TaskError;
use crate::fileset::{FileSet, MatchedFile};

/// What a staging operation wrote.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageReport {
  pub destination: PathBuf,
  /// Relative paths written, in copy order.
  pub copied: Vec<String>,
}

impl StageReport {
  fn new(destination: &Path) -> Self {
    Self {
      destination: destination.to_path_buf(),
      copied: Vec::new(),
    }
  }

  fn extend(&mut self, other: StageReport) {
    self.copied.extend(other.copied);
  }
}

/// Copy every file a set selects into `dest`, preserving relative paths.
///
/// # Errors
///
/// `MissingSource` if the set's root does not exist; I/O errors otherwise.
pub fn stage_fileset(set: &FileSet, dest: &Path) -> Result<StageReport, TaskError> {
  let files = set.files()?;
  let report = copy_files(&files, dest)?;
  info!(
    from = %set.root.display(),
    to = %dest.display(),
    files = report.copied.len(),
    "staged file set"
  );
  Ok(report)
}

/// Stage several sets into the same destination, in order.
///
/// Later sets overwrite earlier ones at the same relative path.
pub fn stage_filesets(sets: &[FileSet], dest: &Path) -> Result<StageReport, TaskError> {
  let mut report = StageReport::new(dest);
  for set in sets {
    report.extend(stage_fileset(set, dest)?);
  }
  Ok(report)
}

/// Copy a compiler's whole output tree into `dest`.
///
/// # Errors
///
/// `MissingArtifact` if `output_dir` does not exist: the upstream compile
/// reported success but left nothing to collect.
pub fn collect_compiled_output(output_dir: &Path, dest: &Path) -> Result<StageReport, TaskError> {
  if !output_dir.is_dir() {
    return Err(TaskError::MissingArtifact {
      path: output_dir.to_path_buf(),
    });
  }

  let files = FileSet::all(output_dir).files()?;
  let report = copy_files(&files, dest)?;
  info!(
    from = %output_dir.display(),
    to = %dest.display(),
    files = report.copied.len(),
    "collected compiled output"
  );
  Ok(report)
}

fn copy_files(files: &[MatchedFile], dest: &Path) -> Result<StageReport, TaskError> {
  fs::create_dir_all(dest)?;

  let mut report = StageReport::new(dest);
  for file in files {
    let target = dest.join(&file.relative);
    replace_file(&file.source, &target)?;
    debug!(file = %file.relative, "copied");
    report.copied.push(file.relative.clone());
  }
  Ok(report)
}

fn replace_file(source: &Path, target: &Path) -> io::Result<()> {
  let parent = match target.parent() {
    Some(p) if !p.as_os_str().is_empty() => p,
    _ => Path::new("."),
  };
  fs::create_dir_all(parent)?;

  let mut input = File::open(source)?;
  let mut tmp = NamedTempFile::new_in(parent)?;
  io::copy(&mut input, tmp.as_file_mut())?;
  tmp.as_file().set_permissions(input.metadata()?.permissions())?;
  tmp.persist(target).map_err(|e| e.error)?;
  Ok(())
}
