mod checks;
mod cli;
mod config;
mod exec;
mod parse;
mod probe;
mod progress;
mod report;
mod runner;
mod types;

use clap::Parser;
use cli::Cli;
use config::Config;
use probe::HostProbe;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// `--verbose` forces debug logs; otherwise `RUST_LOG`, defaulting to warn.
/// Logs go to stderr so stdout carries only the report.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("wsl_podman_doctor=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("wsl_podman_doctor=warn"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = Config::from_cli(&cli);
    tracing::debug!("Resolved config: {:?}", config);

    let probe = HostProbe::new(config.command_timeout);
    let report = runner::run(&probe, &config);
    print!("{}", report::render(&report));

    if report.aborted.is_some() {
        std::process::exit(1);
    }
}
