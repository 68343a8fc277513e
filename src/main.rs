//! CLI entry point for the 3D wave function collapse solver

use clap::Parser;
use collapse3d::io::cli::{Cli, Runner};

fn main() -> collapse3d::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.quiet { "error" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let mut runner = Runner::new(cli);
    runner.process().map(|_| ())
}
