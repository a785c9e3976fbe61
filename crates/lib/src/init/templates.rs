//! Template content for `sandpack init`.

/// Default `sandpack.toml`. Every value shown is the built-in default.
pub const CONFIG_TEMPLATE: &str = r#"# sandpack project file. Every setting is optional.

[project]
# name = "robots"
# version = "1.0.0"

[sources]
dir = "src/main/java"
include = ["**/*"]

[resources]
dir = "src/main/resources"
include = ["**/*.*"]

[sandbox]
dir = ".sandbox"

[compiler]
# Runs with $SANDPACK_SOURCE_LIST (one source per line) and $out (output dir).
# command = "javac -d \"$out\" @\"$SANDPACK_SOURCE_LIST\""
output = "build/classes"
include = ["**/*.java"]

[docs]
enabled = true
# command = "javadoc -d \"$out\" @\"$SANDPACK_SOURCE_LIST\""
output = "build/docs"
include = ["**/*.java"]

[archive]
dir = "build/libs"
# include | exclude | warn | fail | dedupe
duplicates = "include"
# gzip | none
compression = "gzip"
sources = true
docs = true

[execution]
# parallelism = 4
fail_fast = false
"#;
