//! Archive assembly.
//!
//! Merges an ordered list of file sets into one tar archive, optionally
//! gzip-compressed. Inputs are written in declaration order and files within
//! an input in sorted relative-path order. When two inputs supply the same
//! entry path, the [`DuplicatesStrategy`] decides what happens; the default
//! appends both entries.
//!
//! The archive is written to a temporary file next to its destination and
//! renamed into place, so readers never observe a partial archive.

use std::collections::{HashMap, HashSet};
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use flate2::Compression as GzLevel;
use flate2::write::GzEncoder;
use serde::{Deserialize, Serialize};
use tar::{Builder, EntryType, Header};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::consts::{ARCHIVE_MODE, SOURCE_DATE_EPOCH};
use crate::execute::TaskError;
use crate::fileset::{FileSet, MatchedFile};
use crate::util::hash::{ContentHash, hash_file};

/// What to do when an entry path is written more than once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatesStrategy {
  /// Append every entry, duplicates included.
  #[default]
  Include,
  /// Keep the first entry for a path and drop later ones.
  Exclude,
  /// Like `Include`, but log each duplicate.
  Warn,
  /// Fail the assembly on the first duplicate.
  Fail,
  /// Drop an entry whose content matches one already written at that path.
  Dedupe,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
  None,
  #[default]
  Gzip,
}

impl Compression {
  /// File extension for archives written with this compression.
  pub fn extension(self) -> &'static str {
    match self {
      Compression::None => "tar",
      Compression::Gzip => "tar.gz",
    }
  }
}

/// One source of archive entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveInput {
  pub files: FileSet,
  /// Directory inside the archive the files land under.
  pub prefix: Option<String>,
}

impl ArchiveInput {
  pub fn new(files: FileSet) -> Self {
    Self { files, prefix: None }
  }

  pub fn under(mut self, prefix: impl Into<String>) -> Self {
    self.prefix = Some(prefix.into());
    self
  }

  fn entry_name(&self, relative: &str) -> String {
    match &self.prefix {
      Some(prefix) if !prefix.trim_matches('/').is_empty() => {
        format!("{}/{}", prefix.trim_matches('/'), relative)
      }
      _ => relative.to_string(),
    }
  }
}

/// Everything needed to write one archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveSpec {
  pub path: PathBuf,
  pub inputs: Vec<ArchiveInput>,
  pub duplicates: DuplicatesStrategy,
  pub compression: Compression,
}

/// Result of a successful assembly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArchiveReport {
  pub path: PathBuf,
  /// Entries written, duplicates included.
  pub entries: usize,
  /// Entry paths that were offered more than once, once per extra occurrence.
  pub duplicates: Vec<String>,
  /// Entries dropped by `Exclude` or `Dedupe`.
  pub skipped: usize,
  pub sha256: ContentHash,
}

#[derive(Default)]
struct Stats {
  entries: usize,
  duplicates: Vec<String>,
  skipped: usize,
}

/// Write the archive described by `spec`.
///
/// # Errors
///
/// `MissingSource` if an input root is absent, `DuplicateEntry` under
/// [`DuplicatesStrategy::Fail`], I/O errors otherwise. On error the
/// destination is left untouched.
pub fn assemble(spec: &ArchiveSpec) -> Result<ArchiveReport, TaskError> {
  // Resolve every input before touching the filesystem.
  let mut resolved = Vec::with_capacity(spec.inputs.len());
  for input in &spec.inputs {
    resolved.push((input, input.files.files()?));
  }

  let parent = match spec.path.parent() {
    Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
    _ => PathBuf::from("."),
  };
  fs::create_dir_all(&parent)?;

  let mut tmp = NamedTempFile::new_in(&parent)?;
  let stats = {
    let writer = BufWriter::new(tmp.as_file_mut());
    match spec.compression {
      Compression::None => {
        let mut builder = Builder::new(writer);
        let stats = write_entries(&mut builder, &resolved, spec.duplicates)?;
        builder.into_inner()?.flush()?;
        stats
      }
      Compression::Gzip => {
        let mut builder = Builder::new(GzEncoder::new(writer, GzLevel::default()));
        let stats = write_entries(&mut builder, &resolved, spec.duplicates)?;
        builder.into_inner()?.finish()?.flush()?;
        stats
      }
    }
  };
  set_archive_permissions(tmp.as_file())?;
  tmp.as_file().sync_all()?;
  tmp.persist(&spec.path).map_err(|e| e.error)?;

  let sha256 = hash_file(&spec.path)?;
  info!(
    path = %spec.path.display(),
    entries = stats.entries,
    duplicates = stats.duplicates.len(),
    skipped = stats.skipped,
    "assembled archive"
  );

  Ok(ArchiveReport {
    path: spec.path.clone(),
    entries: stats.entries,
    duplicates: stats.duplicates,
    skipped: stats.skipped,
    sha256,
  })
}

fn write_entries<W: Write>(
  builder: &mut Builder<W>,
  inputs: &[(&ArchiveInput, Vec<MatchedFile>)],
  strategy: DuplicatesStrategy,
) -> Result<Stats, TaskError> {
  let mut stats = Stats::default();
  let mut written: HashSet<String> = HashSet::new();
  let mut contents: HashMap<String, Vec<ContentHash>> = HashMap::new();

  for (input, files) in inputs {
    for file in files {
      let name = input.entry_name(&file.relative);

      if written.contains(&name) {
        stats.duplicates.push(name.clone());
        match strategy {
          DuplicatesStrategy::Include => {}
          DuplicatesStrategy::Warn => {
            warn!(entry = %name, source = %file.source.display(), "duplicate archive entry");
          }
          DuplicatesStrategy::Exclude => {
            debug!(entry = %name, "excluding duplicate entry");
            stats.skipped += 1;
            continue;
          }
          DuplicatesStrategy::Fail => {
            return Err(TaskError::DuplicateEntry { path: name });
          }
          DuplicatesStrategy::Dedupe => {
            let hash = hash_file(&file.source)?;
            let seen = contents.entry(name.clone()).or_default();
            if seen.contains(&hash) {
              debug!(entry = %name, "skipping identical duplicate entry");
              stats.skipped += 1;
              continue;
            }
            seen.push(hash);
          }
        }
      } else if strategy == DuplicatesStrategy::Dedupe {
        contents.insert(name.clone(), vec![hash_file(&file.source)?]);
      }

      append_file(builder, &name, &file.source)?;
      written.insert(name);
      stats.entries += 1;
    }
  }

  Ok(stats)
}

fn append_file<W: Write>(builder: &mut Builder<W>, name: &str, source: &Path) -> io::Result<()> {
  let file = File::open(source)?;
  let metadata = file.metadata()?;

  let mut header = Header::new_gnu();
  header.set_entry_type(EntryType::Regular);
  header.set_size(metadata.len());
  header.set_mode(file_mode(&metadata));
  header.set_mtime(SOURCE_DATE_EPOCH);
  header.set_uid(0);
  header.set_gid(0);

  builder.append_data(&mut header, name, file)
}

/// Temporary files are created owner-only; archives are meant to be shared.
#[cfg(unix)]
fn set_archive_permissions(file: &File) -> io::Result<()> {
  use std::os::unix::fs::PermissionsExt;
  file.set_permissions(fs::Permissions::from_mode(ARCHIVE_MODE))
}

#[cfg(not(unix))]
fn set_archive_permissions(_file: &File) -> io::Result<()> {
  Ok(())
}

#[cfg(unix)]
fn file_mode(metadata: &fs::Metadata) -> u32 {
  use std::os::unix::fs::PermissionsExt;
  metadata.permissions().mode() & 0o7777
}

#[cfg(not(unix))]
fn file_mode(metadata: &fs::Metadata) -> u32 {
  if metadata.permissions().readonly() { 0o444 } else { 0o644 }
}
