mod cli;
mod error;
mod prepare;

use crate::cli::{Cli, Command};
use crate::error::{ErrorKind, Result};
use autodrome_config::Loader;
use clap::Parser;
use exn::ResultExt;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::FAILURE
        },
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).with_target(false).init();
}

fn run(cli: Cli) -> Result<()> {
    let mut loader = Loader::new();
    if let Some(path) = &cli.config {
        loader = loader.file(path).or_raise(|| ErrorKind::Config)?;
    }
    let loader = loader.env();
    match cli.command {
        Command::Prepare(args) => {
            let config = args.apply(loader).load().or_raise(|| ErrorKind::Config)?;
            prepare::run(&config, args.dry_run)
        },
        Command::Config => {
            let config = loader.load().or_raise(|| ErrorKind::Config)?;
            println!("{config}");
            Ok(())
        },
    }
}
