use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tempfile::TempDir;

use sandpack_lib::config::{ConfigFile, Overrides, Project};
use sandpack_lib::execute::{BuildReport, execute_targets};
use sandpack_lib::graph::TaskId;
use sandpack_lib::pipeline::{Tools, build_pipeline};
use sandpack_lib::tools::{ExternalTool, OutputLocation, SourceSet, ToolError};

/// Pattern the fake compiler's source set uses.
pub const SOURCE_PATTERN: &str = "**/*.src";

/// A project directory with the sample layout: two sources, one resource.
pub struct Fixture {
  _temp: TempDir,
  pub project: Project,
}

impl Fixture {
  pub fn new(config: &str) -> Self {
    let temp = TempDir::new().unwrap();
    let root = dunce::canonicalize(temp.path()).unwrap();

    write_file(&root, "src/main/java/A.src", "class A {}");
    write_file(&root, "src/main/java/B.src", "class B {}");
    write_file(&root, "src/main/resources/B.res", "resource for B");

    // The sample sources use the `.src` extension.
    let mut file: ConfigFile = toml::from_str(config).unwrap();
    file.compiler.include = vec![SOURCE_PATTERN.to_string()];
    let overrides = Overrides {
      sandbox: Some(root.join(".sandbox")),
      jobs: Some(4),
      fail_fast: None,
    };
    let project = Project::resolve(file, root, &overrides).unwrap();
    Self { _temp: temp, project }
  }

  pub fn root(&self) -> &Path {
    &self.project.root
  }

  pub async fn run(&self, tools: Tools, targets: &[&str]) -> BuildReport {
    let graph = build_pipeline(&self.project, tools).unwrap();
    let targets: Vec<TaskId> = targets.iter().copied().map(TaskId::from).collect();
    execute_targets(&graph, &targets, &self.project.execution).await.unwrap()
  }

  /// Tools with the fake compiler writing into the configured output dir.
  pub fn tools(&self, compiler: FakeCompiler) -> Tools {
    Tools {
      compiler: Arc::new(compiler),
      docs: None,
    }
  }
}

/// Writes one `.class` file per source, named after the source's stem.
pub struct FakeCompiler {
  pub output: PathBuf,
  pub runs: Arc<AtomicUsize>,
  pub fail: bool,
}

impl FakeCompiler {
  pub fn new(output: impl Into<PathBuf>) -> Self {
    Self {
      output: output.into(),
      runs: Arc::new(AtomicUsize::new(0)),
      fail: false,
    }
  }

  pub fn failing(output: impl Into<PathBuf>) -> Self {
    Self {
      fail: true,
      ..Self::new(output)
    }
  }
}

#[async_trait]
impl ExternalTool for FakeCompiler {
  fn name(&self) -> &str {
    "compile"
  }

  async fn run(&self, sources: &SourceSet) -> Result<OutputLocation, ToolError> {
    self.runs.fetch_add(1, Ordering::SeqCst);
    if self.fail {
      return Err(ToolError::Exited {
        tool: "compile".to_string(),
        code: Some(1),
        stderr: "syntax error".to_string(),
      });
    }
    fs::create_dir_all(&self.output).unwrap();
    for file in &sources.files {
      let stem = file.file_stem().unwrap().to_string_lossy();
      fs::write(self.output.join(format!("{stem}.class")), format!("bytecode {stem}")).unwrap();
    }
    Ok(OutputLocation::new(&self.output))
  }
}

/// Writes a fixed `index.html` into the documentation output dir.
pub struct FakeDocs {
  pub output: PathBuf,
}

#[async_trait]
impl ExternalTool for FakeDocs {
  fn name(&self) -> &str {
    "generate-docs"
  }

  async fn run(&self, sources: &SourceSet) -> Result<OutputLocation, ToolError> {
    fs::create_dir_all(&self.output).unwrap();
    fs::write(self.output.join("index.html"), format!("{} sources", sources.len())).unwrap();
    Ok(OutputLocation::new(&self.output))
  }
}

pub fn write_file(root: &Path, relative: &str, content: &str) {
  let path = root.join(relative);
  fs::create_dir_all(path.parent().unwrap()).unwrap();
  fs::write(path, content).unwrap();
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
        .to_string_lossy()
        .replace('\\', "/")
    })
    .collect();
  files.sort();
  files
}

/// Entry names of an uncompressed tar archive, in archive order.
pub fn archive_entries(path: &Path) -> Vec<String> {
  let mut archive = tar::Archive::new(fs::File::open(path).unwrap());
  archive
    .entries()
    .unwrap()
    .map(|e| e.unwrap().path().unwrap().to_string_lossy().replace('\\', "/"))
    .collect()
}

/// Content of one entry of an uncompressed tar archive.
pub fn archive_entry(path: &Path, name: &str) -> Option<String> {
  let mut archive = tar::Archive::new(fs::File::open(path).unwrap());
  for entry in archive.entries().unwrap() {
    let mut entry = entry.unwrap();
    if entry.path().unwrap().to_string_lossy().replace('\\', "/") == name {
      let mut content = String::new();
      entry.read_to_string(&mut content).unwrap();
      return Some(content);
    }
  }
  None
}
