mod api;
mod app;
mod cli;
mod config;
mod consts;
mod core;
mod error;
mod loader;
mod output;
mod utils;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt};

use cli::Cli;
use config::Config;

/// Logs go to stderr so stdout carries only the report. `RUST_LOG`
/// overrides the level chosen by `--debug`.
fn init_logging(debug: bool) {
    let level = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,normandy_stats={level}")));
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let config = Config::load();
    let cli = Cli::parse().with_config(&config);
    init_logging(cli.debug);

    if let Err(e) = app::run(&cli) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
