//! Content hashing for archive checksums and duplicate detection.
//!
//! This module provides:
//! - `ContentHash`: a full 64-character SHA-256 hex digest
//! - `hash_file()` / `hash_reader()`: streaming file hashing
//! - `hash_tree()`: deterministic digest of a directory tree

use std::fs;
use std::io::{self, Read};
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use walkdir::WalkDir;

/// A full 64-character SHA-256 hash, lowercase hex.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash(pub String);

impl std::fmt::Display for ContentHash {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.0)
  }
}

/// Hash everything a reader yields.
pub fn hash_reader(mut reader: impl Read) -> io::Result<ContentHash> {
  let mut hasher = Sha256::new();
  let mut buffer = [0u8; 8192];

  loop {
    let read = reader.read(&mut buffer)?;
    if read == 0 {
      break;
    }
    hasher.update(&buffer[..read]);
  }

  Ok(ContentHash(hex::encode(hasher.finalize())))
}

/// Hash a file's contents.
pub fn hash_file(path: &Path) -> io::Result<ContentHash> {
  hash_reader(fs::File::open(path)?)
}

/// Compute a deterministic digest of a directory tree.
///
/// The digest covers relative paths and file contents, not timestamps or
/// permissions, so two trees with the same files hash identically. Entries
/// named in `exclude` are skipped along with everything below them.
pub fn hash_tree(root: &Path, exclude: &[&str]) -> io::Result<ContentHash> {
  let walker = WalkDir::new(root).sort_by_file_name().into_iter().filter_entry(|e| {
    e.file_name()
      .to_str()
      .map(|name| !exclude.contains(&name))
      .unwrap_or(true)
  });

  let mut hasher = Sha256::new();
  for entry in walker {
    let entry = entry.map_err(io::Error::other)?;
    let Ok(rel) = entry.path().strip_prefix(root) else {
      continue;
    };
    if rel.as_os_str().is_empty() {
      continue;
    }

    let rel = rel.to_string_lossy().replace('\\', "/");
    if entry.file_type().is_dir() {
      hasher.update(format!("D:{}\n", rel).as_bytes());
    } else if entry.file_type().is_file() {
      let content = hash_file(entry.path())?;
      hasher.update(format!("F:{}:{}\n", rel, content.0).as_bytes());
    }
  }

  Ok(ContentHash(hex::encode(hasher.finalize())))
}
