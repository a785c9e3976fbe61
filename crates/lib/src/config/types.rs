//! On-disk shape of `sandpack.toml`.
//!
//! Every section and field is optional; missing values take the defaults
//! below. Paths are kept as written and resolved later against the project root.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::archive::{Compression, DuplicatesStrategy};
use crate::consts::{
  DEFAULT_ARCHIVE_DIR, DEFAULT_CLASSES_DIR, DEFAULT_DOCS_DIR, DEFAULT_RESOURCES_DIR, DEFAULT_SANDBOX_DIR,
  DEFAULT_SOURCES_DIR, PATTERN_ALL, PATTERN_JAVA, PATTERN_WITH_EXTENSION,
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
  pub project: ProjectSection,
  pub sources: SourcesSection,
  pub resources: ResourcesSection,
  pub sandbox: SandboxSection,
  pub compiler: CompilerSection,
  pub docs: DocsSection,
  pub archive: ArchiveSection,
  pub execution: ExecutionSection,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProjectSection {
  /// Archive base name. Defaults to the project directory's name.
  pub name: Option<String>,
  pub version: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SourcesSection {
  pub dir: PathBuf,
  pub include: Vec<String>,
}

impl Default for SourcesSection {
  fn default() -> Self {
    Self {
      dir: PathBuf::from(DEFAULT_SOURCES_DIR),
      include: vec![PATTERN_ALL.to_string()],
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResourcesSection {
  pub dir: PathBuf,
  pub include: Vec<String>,
}

impl Default for ResourcesSection {
  fn default() -> Self {
    Self {
      dir: PathBuf::from(DEFAULT_RESOURCES_DIR),
      include: vec![PATTERN_WITH_EXTENSION.to_string()],
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SandboxSection {
  pub dir: PathBuf,
}

impl Default for SandboxSection {
  fn default() -> Self {
    Self {
      dir: PathBuf::from(DEFAULT_SANDBOX_DIR),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompilerSection {
  /// Shell command that compiles the sources. Without one, the output
  /// directory is expected to be filled by something outside the pipeline.
  pub command: Option<String>,
  pub output: PathBuf,
  pub include: Vec<String>,
  pub shell: Option<String>,
}

impl Default for CompilerSection {
  fn default() -> Self {
    Self {
      command: None,
      output: PathBuf::from(DEFAULT_CLASSES_DIR),
      include: vec![PATTERN_JAVA.to_string()],
      shell: None,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DocsSection {
  pub enabled: bool,
  pub command: Option<String>,
  pub output: PathBuf,
  pub include: Vec<String>,
  pub shell: Option<String>,
}

impl Default for DocsSection {
  fn default() -> Self {
    Self {
      enabled: true,
      command: None,
      output: PathBuf::from(DEFAULT_DOCS_DIR),
      include: vec![PATTERN_JAVA.to_string()],
      shell: None,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ArchiveSection {
  pub dir: PathBuf,
  pub duplicates: DuplicatesStrategy,
  pub compression: Compression,
  /// Also write a sources-only archive.
  pub sources: bool,
  /// Also write a documentation-only archive.
  pub docs: bool,
}

impl Default for ArchiveSection {
  fn default() -> Self {
    Self {
      dir: PathBuf::from(DEFAULT_ARCHIVE_DIR),
      duplicates: DuplicatesStrategy::default(),
      compression: Compression::default(),
      sources: true,
      docs: true,
    }
  }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExecutionSection {
  /// Defaults to the number of CPUs.
  pub parallelism: Option<usize>,
  pub fail_fast: bool,
}
