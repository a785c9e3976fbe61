//! Project configuration.
//!
//! Loads `sandpack.toml`, resolves every path against the directory holding
//! it, and layers overrides on top. Precedence, lowest first: file values,
//! environment (`SANDPACK_SANDBOX`, `SANDPACK_JOBS`), command-line flags.

mod types;

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::archive::{Compression, DuplicatesStrategy};
use crate::consts::{APP_NAME, CONFIG_FILE, ENV_JOBS, ENV_SANDBOX};
use crate::execute::ExecuteConfig;
use crate::execute::types::num_cpus;
use crate::fileset::FileSet;

pub use types::{
  ArchiveSection, CompilerSection, ConfigFile, DocsSection, ExecutionSection, ProjectSection, ResourcesSection,
  SandboxSection, SourcesSection,
};

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("config file not found: {} (run `sandpack init` to create one)", path.display())]
  NotFound { path: PathBuf },

  #[error("failed to read {}: {source}", path.display())]
  Read { path: PathBuf, source: std::io::Error },

  #[error("invalid config {}: {source}", path.display())]
  Parse {
    path: PathBuf,
    #[source]
    source: Box<toml::de::Error>,
  },

  #[error("invalid value {value:?} for {var}: {message}")]
  InvalidEnv {
    var: &'static str,
    value: String,
    message: String,
  },

  #[error("invalid setting {key}: {message}")]
  Invalid { key: &'static str, message: String },

  #[error("failed to resolve path {}: {source}", path.display())]
  Resolve { path: PathBuf, source: std::io::Error },
}

/// Values supplied on the command line. `None` keeps the lower layer.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
  pub sandbox: Option<PathBuf>,
  pub jobs: Option<usize>,
  pub fail_fast: Option<bool>,
}

/// Settings for an external tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolSettings {
  pub command: Option<String>,
  pub output: PathBuf,
  pub sources: FileSet,
  pub shell: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveSettings {
  pub dir: PathBuf,
  pub duplicates: DuplicatesStrategy,
  pub compression: Compression,
  pub sources: bool,
  pub docs: bool,
}

/// A fully resolved project: absolute paths, overrides applied.
#[derive(Debug, Clone)]
pub struct Project {
  /// Directory containing the config file.
  pub root: PathBuf,
  pub name: String,
  pub version: Option<String>,
  pub sources: FileSet,
  pub resources: FileSet,
  pub sandbox: PathBuf,
  pub compiler: ToolSettings,
  /// `None` when documentation is disabled.
  pub docs: Option<ToolSettings>,
  pub archive: ArchiveSettings,
  pub execution: ExecuteConfig,
}

impl Project {
  /// Load and resolve the config file at `path`.
  pub fn load(path: &Path, overrides: &Overrides) -> Result<Self, ConfigError> {
    if !path.is_file() {
      return Err(ConfigError::NotFound {
        path: path.to_path_buf(),
      });
    }

    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
      path: path.to_path_buf(),
      source,
    })?;
    let file: ConfigFile = toml::from_str(&content).map_err(|e| ConfigError::Parse {
      path: path.to_path_buf(),
      source: Box::new(e),
    })?;

    let parent = match path.parent() {
      Some(p) if !p.as_os_str().is_empty() => p,
      _ => Path::new("."),
    };
    let root = dunce::canonicalize(parent).map_err(|source| ConfigError::Resolve {
      path: parent.to_path_buf(),
      source,
    })?;

    debug!(path = %path.display(), root = %root.display(), "loaded config");
    Self::resolve(file, root, overrides)
  }

  /// Load `sandpack.toml` from `dir`.
  pub fn load_dir(dir: &Path, overrides: &Overrides) -> Result<Self, ConfigError> {
    Self::load(&dir.join(CONFIG_FILE), overrides)
  }

  /// Resolve a parsed config against `root`.
  pub fn resolve(file: ConfigFile, root: PathBuf, overrides: &Overrides) -> Result<Self, ConfigError> {
    let name = match file.project.name {
      Some(name) if !name.trim().is_empty() => name,
      Some(_) => {
        return Err(ConfigError::Invalid {
          key: "project.name",
          message: "must not be empty".to_string(),
        });
      }
      None => root
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| APP_NAME.to_string()),
    };

    let sources = FileSet::new(root.join(&file.sources.dir), file.sources.include);
    let resources = FileSet::new(root.join(&file.resources.dir), file.resources.include);

    let sandbox = match overrides.sandbox.clone().or(env_sandbox()) {
      Some(dir) => absolute(&dir)?,
      None => root.join(&file.sandbox.dir),
    };

    let compiler = ToolSettings {
      command: non_empty(file.compiler.command),
      output: root.join(&file.compiler.output),
      sources: FileSet::new(sources.root.clone(), file.compiler.include),
      shell: file.compiler.shell,
    };

    let docs = file.docs.enabled.then(|| ToolSettings {
      command: non_empty(file.docs.command),
      output: root.join(&file.docs.output),
      sources: FileSet::new(sources.root.clone(), file.docs.include),
      shell: file.docs.shell,
    });

    let archive = ArchiveSettings {
      dir: root.join(&file.archive.dir),
      duplicates: file.archive.duplicates,
      compression: file.archive.compression,
      sources: file.archive.sources,
      docs: file.archive.docs,
    };

    let parallelism = match overrides.jobs {
      Some(jobs) => Some(jobs),
      None => env_jobs()?.or(file.execution.parallelism),
    };
    if parallelism == Some(0) {
      return Err(ConfigError::Invalid {
        key: "execution.parallelism",
        message: "must be at least 1".to_string(),
      });
    }
    let execution = ExecuteConfig {
      parallelism: parallelism.unwrap_or_else(num_cpus),
      fail_fast: overrides.fail_fast.unwrap_or(file.execution.fail_fast),
    };

    Ok(Self {
      root,
      name,
      version: non_empty(file.project.version),
      sources,
      resources,
      sandbox,
      compiler,
      docs,
      archive,
      execution,
    })
  }

  /// Archive file path: `<dir>/<name>[-<version>][-<classifier>].<ext>`.
  pub fn archive_path(&self, classifier: Option<&str>) -> PathBuf {
    let mut file = self.name.clone();
    if let Some(version) = &self.version {
      file.push('-');
      file.push_str(version);
    }
    if let Some(classifier) = classifier {
      file.push('-');
      file.push_str(classifier);
    }
    file.push('.');
    file.push_str(self.archive.compression.extension());
    self.archive.dir.join(file)
  }

  /// Documentation settings when docs are enabled and a generator is configured.
  pub fn doc_generator(&self) -> Option<&ToolSettings> {
    self.docs.as_ref().filter(|d| d.command.is_some())
  }
}

fn non_empty(value: Option<String>) -> Option<String> {
  value.filter(|v| !v.trim().is_empty())
}

fn env_sandbox() -> Option<PathBuf> {
  std::env::var_os(ENV_SANDBOX)
    .filter(|v| !v.is_empty())
    .map(PathBuf::from)
}

fn env_jobs() -> Result<Option<usize>, ConfigError> {
  let Ok(value) = std::env::var(ENV_JOBS) else {
    return Ok(None);
  };
  if value.trim().is_empty() {
    return Ok(None);
  }
  value
    .trim()
    .parse::<usize>()
    .map(Some)
    .map_err(|e| ConfigError::InvalidEnv {
      var: ENV_JOBS,
      value: value.clone(),
      message: e.to_string(),
    })
}

/// Relative override paths are taken from the current directory.
fn absolute(path: &Path) -> Result<PathBuf, ConfigError> {
  std::path::absolute(path).map_err(|source| ConfigError::Resolve {
    path: path.to_path_buf(),
    source,
  })
}
