//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

/// Drydock - build a wrapped CMake project in several configurations and
/// package the results
#[derive(Parser)]
#[command(name = "drydock")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every command.
#[derive(Args, Clone, Debug)]
pub struct GlobalArgs {
    /// Path to Drydock.toml (searched upward from the current directory by default)
    #[arg(long, global = true, value_name = "PATH")]
    pub recipe: Option<PathBuf>,

    /// Work directory (defaults to .drydock beside the recipe)
    #[arg(long, global = true, value_name = "DIR")]
    pub work_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch, patch, build every configuration and assemble the package
    Build(BuildArgs),

    /// Fetch and patch the source tree only
    Source(SourceArgs),

    /// Show the per-configuration settings and write the toolchain file
    Generate(GenerateArgs),

    /// Remove build outputs
    Clean(CleanArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Dependency locations and option overrides.
#[derive(Args, Clone, Debug, Default)]
pub struct ConfigureArgs {
    /// TOML file mapping dependency names to install roots
    #[arg(long, value_name = "FILE")]
    pub deps: Option<PathBuf>,

    /// Dependency location as NAME=ROOT (repeatable)
    #[arg(short = 'd', long = "dep", value_name = "NAME=ROOT")]
    pub dep: Vec<String>,

    /// Option override as KEY=VALUE (repeatable)
    #[arg(short = 'o', long = "option", value_name = "KEY=VALUE")]
    pub option: Vec<String>,

    /// Platform family to build for (windows, macos, linux, other)
    #[arg(long)]
    pub platform: Option<String>,

    /// CMake generator, overriding the recipe and platform default
    #[arg(short = 'G', long)]
    pub generator: Option<String>,
}

#[derive(Args)]
pub struct BuildArgs {
    #[command(flatten)]
    pub configure: ConfigureArgs,

    /// Use the existing source tree without fetching
    #[arg(long)]
    pub offline: bool,

    /// Number of parallel jobs
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Output format for the run summary
    #[arg(long, value_enum, default_value_t = MessageFormat::Human)]
    pub message_format: MessageFormat,
}

#[derive(Args)]
pub struct SourceArgs {
    /// Use the existing source tree without fetching
    #[arg(long)]
    pub offline: bool,
}

#[derive(Args)]
pub struct GenerateArgs {
    #[command(flatten)]
    pub configure: ConfigureArgs,
}

#[derive(Args)]
pub struct CleanArgs {
    /// Also remove the source checkout
    #[arg(long)]
    pub source: bool,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum MessageFormat {
    Human,
    Json,
}
