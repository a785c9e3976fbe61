//! Shared test helpers for CLI integration tests.

use std::fs::File;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use flate2::read::GzDecoder;
use tempfile::TempDir;

/// Compiler command that writes one `<stem>.class` per listed source.
pub const COMPILE_CMD: &str = r#"while read -r f; do n=$(basename "$f" .java); printf "bytecode $n" > "$out/$n.class"; done < "$SANDPACK_SOURCE_LIST""#;

/// Doc generator command that writes an index listing the sources.
pub const DOCS_CMD: &str = r#"cp "$SANDPACK_SOURCE_LIST" "$out/index.txt""#;

/// Isolated project directory.
///
/// Holds the sample layout: `A.java`, `B.java` under the source dir and
/// `B.properties` under the resource dir.
pub struct TestEnv {
  pub temp: TempDir,
}

impl TestEnv {
  pub fn new(config: &str) -> Self {
    let temp = TempDir::new().unwrap();
    let env = Self { temp };
    env.write_file("sandpack.toml", config);
    env.write_file("src/main/java/sample/A.java", "class A {}");
    env.write_file("src/main/java/sample/B.java", "class B {}");
    env.write_file("src/main/resources/sample/B.properties", "name=B");
    env
  }

  /// Write a file relative to the project directory.
  pub fn write_file(&self, relative_path: &str, content: &str) {
    let path = self.temp.path().join(relative_path);
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
  }

  pub fn root(&self) -> PathBuf {
    dunce::canonicalize(self.temp.path()).unwrap()
  }

  pub fn path(&self, relative: &str) -> PathBuf {
    self.root().join(relative)
  }

  /// A Command for the sandpack binary running inside the project.
  pub fn sandpack_cmd(&self) -> Command {
    let mut cmd: Command = cargo_bin_cmd!("sandpack");
    cmd.current_dir(self.temp.path());
    cmd.env_remove("SANDPACK_SANDBOX");
    cmd.env_remove("SANDPACK_JOBS");
    cmd.env_remove("RUST_LOG");
    cmd
  }
}

/// Relative paths of every file under `root`, sorted, `/`-separated.
pub fn list_files(root: &Path) -> Vec<String> {
  let mut files = Vec::new();
  collect(root, root, &mut files);
  files.sort();
  files
}

fn collect(root: &Path, dir: &Path, files: &mut Vec<String>) {
  for entry in std::fs::read_dir(dir).unwrap() {
    let path = entry.unwrap().path();
    if path.is_dir() {
      collect(root, &path, files);
    } else {
      files.push(path.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/"));
    }
  }
}

/// Entry names of a gzip-compressed tar archive, in archive order.
pub fn archive_entries(path: &Path) -> Vec<String> {
  let mut archive = tar::Archive::new(GzDecoder::new(File::open(path).unwrap()));
  archive
    .entries()
    .unwrap()
    .map(|e| e.unwrap().path().unwrap().to_string_lossy().replace('\\', "/"))
    .collect()
}

/// TOML config with the sample compiler and an optional doc generator.
pub fn config_with_tools(docs: bool) -> String {
  let mut config = format!(
    "[project]\nname = \"robots\"\nversion = \"1.0\"\n\n[compiler]\ncommand = '''{}'''\n",
    COMPILE_CMD
  );
  if docs {
    config.push_str(&format!("\n[docs]\ncommand = '''{}'''\n", DOCS_CMD));
  }
  config
}
