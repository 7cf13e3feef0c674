//! `sindex` entry point.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use sindex::cli::{Cli, Command};
use sindex::commands;
use sindex::config::Config;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let subcommand_name = match &cli.command {
        Command::Add { .. } => "add",
        Command::Rm { .. } => "rm",
        Command::Search { .. } => "search",
    };

    if let Err(err) = run(cli) {
        eprintln!("sindex: {subcommand_name}: {err}");
        for cause in err.chain().skip(1) {
            eprintln!("  caused by: {cause}");
        }
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let mut filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if verbose {
        // Push a debug directive onto whatever filter is already in
        // effect; a `RUST_LOG` the user set is augmented, not replaced.
        filter = filter.add_directive("debug".parse().expect("valid directive"));
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::resolve(cli.database, cli.verbose)?;

    match cli.command {
        Command::Add { include_local_syms, files } => {
            commands::add::run(&config, include_local_syms, &files)
        }
        Command::Rm { patterns } => commands::rm::run(&config, &patterns),
        Command::Search { format, path, mode, kind, explain, usage, query } => {
            commands::search::run(&config, format, path, mode, kind, explain, usage, query)
        }
    }
}
