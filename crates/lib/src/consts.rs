pub const APP_NAME: &str = "sandpack";

/// Default project file name, looked up in the working directory.
pub const CONFIG_FILE: &str = "sandpack.toml";

/// Environment variable overriding the staging directory.
pub const ENV_SANDBOX: &str = "SANDPACK_SANDBOX";

/// Environment variable overriding task parallelism.
pub const ENV_JOBS: &str = "SANDPACK_JOBS";

/// Fixed mtime for archive entries: 1980-01-01 00:00:00 UTC (ZIP epoch).
pub const SOURCE_DATE_EPOCH: u64 = 315532800;

pub const DEFAULT_SOURCES_DIR: &str = "src/main/java";
pub const DEFAULT_RESOURCES_DIR: &str = "src/main/resources";
pub const DEFAULT_SANDBOX_DIR: &str = ".sandbox";
pub const DEFAULT_CLASSES_DIR: &str = "build/classes";
pub const DEFAULT_DOCS_DIR: &str = "build/docs";
pub const DEFAULT_ARCHIVE_DIR: &str = "build/libs";

/// Permission bits of written archives.
pub const ARCHIVE_MODE: u32 = 0o644;

/// Matches every file at any depth.
pub const PATTERN_ALL: &str = "**/*";

/// Matches every file whose name carries an extension.
pub const PATTERN_WITH_EXTENSION: &str = "**/*.*";

/// Default source filter for the compiler and the doc generator.
pub const PATTERN_JAVA: &str = "**/*.java";

/// Prefix under which documentation lands inside the main archive.
pub const DOCS_ARCHIVE_PREFIX: &str = "docs";

/// Environment variable naming the source set's root directory for external tools.
pub const ENV_SOURCE_ROOT: &str = "SANDPACK_SOURCE_ROOT";

/// Environment variable naming the file that lists the source set, one path per line.
pub const ENV_SOURCE_LIST: &str = "SANDPACK_SOURCE_LIST";

/// Environment variable naming the directory an external tool writes into.
pub const ENV_OUTPUT: &str = "SANDPACK_OUTPUT";
