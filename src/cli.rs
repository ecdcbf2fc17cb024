use autodrome_config::Loader;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Prepare the extracted game archive cache for autodrome.
#[derive(Debug, Parser)]
#[command(name = "autodrome", version, about)]
pub struct Cli {
    /// Configuration file (TOML, YAML or JSON).
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,
    /// Increase log verbosity (-v for debug, -vv for trace). `RUST_LOG` takes precedence.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Extract missing archives into the cache and print where everything is.
    Prepare(PrepareArgs),
    /// Print the resolved configuration.
    Config,
}

#[derive(Debug, Args)]
pub struct PrepareArgs {
    /// Re-extract archives even if they are already cached.
    #[arg(long)]
    pub overwrite: bool,
    /// Archive to extract, without the `.scs` extension. Repeatable; replaces
    /// the configured list.
    #[arg(short, long = "archive", value_name = "ID")]
    pub archives: Vec<String>,
    /// Game install folder containing the `.scs` archives.
    #[arg(long, value_name = "DIR")]
    pub root: Option<PathBuf>,
    /// Mod directory in which the cache is created.
    #[arg(long, value_name = "DIR")]
    pub mod_dir: Option<PathBuf>,
    /// Bundled extractor executable.
    #[arg(long, value_name = "FILE")]
    pub extractor: Option<PathBuf>,
    /// Show what would be extracted, and how, without running anything.
    #[arg(long)]
    pub dry_run: bool,
}

impl PrepareArgs {
    /// Layer the command-line flags over the other configuration sources.
    pub fn apply(&self, mut loader: Loader) -> Loader {
        if self.overwrite {
            loader = loader.set("overwrite", true);
        }
        if !self.archives.is_empty() {
            loader = loader.set("archives", &self.archives);
        }
        if let Some(root) = &self.root {
            loader = loader.set("simulator.root", root);
        }
        if let Some(mod_dir) = &self.mod_dir {
            loader = loader.set("simulator.mod_dir", mod_dir);
        }
        if let Some(extractor) = &self.extractor {
            loader = loader.set("extractor.source", extractor);
        }
        loader
    }
}
