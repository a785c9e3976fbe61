mod cmd;
mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use sandpack_lib::config::Overrides;
use sandpack_lib::consts::CONFIG_FILE;

use crate::output::OutputFormat;

/// Stage sources into a sandbox and assemble distributable archives
#[derive(Parser)]
#[command(name = "sandpack")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Path to the project file
  #[arg(short, long, global = true, default_value = CONFIG_FILE)]
  config: PathBuf,

  /// Enable debug logging
  #[arg(short, long, global = true)]
  verbose: bool,

  /// Output format
  #[arg(long, global = true, value_enum, default_value_t)]
  output: OutputFormat,

  /// Staging directory (overrides config and SANDPACK_SANDBOX)
  #[arg(long, global = true)]
  sandbox: Option<PathBuf>,

  /// Maximum number of tasks running at once (overrides config and SANDPACK_JOBS)
  #[arg(short, long, global = true)]
  jobs: Option<usize>,

  /// Stop starting new tasks after the first failure
  #[arg(long, global = true)]
  fail_fast: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Run tasks and everything they depend on (default: all tasks)
  Run {
    /// Tasks to run
    tasks: Vec<String>,
  },

  /// Show execution order and parallel waves without running anything
  Plan {
    /// Tasks to plan
    tasks: Vec<String>,
  },

  /// List tasks with their dependencies
  Tasks,

  /// Remove the sandbox and build outputs
  Clean,

  /// Create a new project with a default sandpack.toml
  Init {
    /// Project directory
    #[arg(default_value = ".")]
    dir: PathBuf,
  },
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  let filter = if cli.verbose {
    EnvFilter::new("debug")
  } else {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
  };
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  let overrides = Overrides {
    sandbox: cli.sandbox,
    jobs: cli.jobs,
    fail_fast: cli.fail_fast.then_some(true),
  };

  match cli.command {
    Commands::Run { tasks } => cmd::cmd_run(&cli.config, &overrides, &tasks, cli.output),
    Commands::Plan { tasks } => cmd::cmd_plan(&cli.config, &overrides, &tasks, cli.output),
    Commands::Tasks => cmd::cmd_tasks(&cli.config, &overrides, cli.output),
    Commands::Clean => cmd::cmd_clean(&cli.config, &overrides, cli.output),
    Commands::Init { dir } => cmd::cmd_init(&dir, cli.output),
  }
}
