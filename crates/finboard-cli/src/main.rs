//! finboard - command-line personal finance dashboard.
//!
//! Signs in against the finboard backend, keeps the session between runs,
//! and prints balances, statements, transactions, investments and notes.

mod app;
mod cli;

use std::io;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use finboard_core::Config;
use tracing::{debug, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use app::App;
use cli::Cli;

/// Log file prefix inside the cache directory
const LOG_FILE_PREFIX: &str = "finboard.log";

/// Initialize the tracing subscriber for logging.
///
/// Console output follows `RUST_LOG` (default `warn`). When a cache
/// directory is available a daily log file is written there as well; the
/// returned guard must be held until exit so buffered lines are flushed.
fn init_tracing(config: &Config) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let file = config
        .cache_dir()
        .ok()
        .filter(|dir| std::fs::create_dir_all(dir).is_ok())
        .map(|dir| {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            tracing_appender::non_blocking(appender)
        });

    match file {
        Some((writer, guard)) => {
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(io::stderr))
                .with(fmt::layer().with_ansi(false).with_writer(writer))
                .with(filter)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(io::stderr))
                .with(filter)
                .init();
            None
        }
    }
}

async fn run(cli: Cli, config: Config) -> Result<()> {
    let mut app = App::new(config, cli.api_url)?;
    app.run(cli.command).await
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Warning: could not load config ({}), using defaults", e);
            Config::default()
        }
    };

    let _guard = init_tracing(&config);
    info!(version = env!("CARGO_PKG_VERSION"), "finboard starting");

    match run(cli, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            debug!(error = ?e, "Command failed");
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
