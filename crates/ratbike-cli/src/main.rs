//! RatBike - keep track of bikes and bike parts from the command line.
//!
//! Every command goes through the bike repository, which serves reads from
//! its cache, the local JSON store or the simulated remote, and writes
//! changes through to all of them.

mod app;
mod command;
mod render;
mod utils;

use std::io;
use std::process::ExitCode;

use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use app::App;
use command::Cli;

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    init_tracing();

    // Usage errors exit with status 2 from inside clap
    let cli = Cli::parse();

    info!("RatBike starting");
    let result = match App::new().await {
        Ok(app) => app.run(cli.command).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(output) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
