//! photo-chrono - rename photos by their original capture time
//!
//! Runs the batch pipeline once, then optionally keeps serving the
//! destination directory over HTTP.

use anyhow::{Context, Result};
use clap::Parser;
use photo_chrono::{Cli, Config, Processor, ServeConfig, serve};
use std::path::Path;
use tracing::{Level, error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Held until exit so buffered log lines reach the file
    let _guard = setup_logging(&cli)?;

    info!(version = env!("CARGO_PKG_VERSION"), "photo-chrono starting");

    let config = cli.to_config();
    if config.verbose {
        info!(?config, "Configuration loaded");
    }

    if let Err(e) = run_pipeline(config) {
        error!(error = %e, "Processing failed");
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }

    if let Some(serve_config) = cli.to_serve_config() {
        run_server(serve_config)?;
    }

    Ok(())
}

/// Run the batch pipeline; the processor logs the summary line
fn run_pipeline(config: Config) -> Result<()> {
    config.validate()?;

    let dry_run = config.dry_run;
    Processor::new(config).run()?;

    if dry_run {
        info!("Dry run: no files were copied or removed");
    }

    Ok(())
}

/// Serve the destination directory on a multi-threaded runtime
fn run_server(config: ServeConfig) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    runtime
        .block_on(serve::serve(config))
        .context("file server stopped")?;
    Ok(())
}

/// Setup logging (console, plus an optional log file)
fn setup_logging(cli: &Cli) -> Result<Option<WorkerGuard>> {
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let env_filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    let (file_writer, guard) = match &cli.log_file {
        Some(log_path) => {
            let (writer, guard) = tracing_appender::non_blocking(open_log_file(log_path)?);
            (Some(writer), Some(guard))
        }
        None => (None, None),
    };

    let subscriber = tracing_subscriber::registry().with(env_filter);

    if cli.json_log {
        subscriber
            .with(file_writer.map(|w| fmt::layer().json().with_ansi(false).with_writer(w)))
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        subscriber
            .with(file_writer.map(|w| fmt::layer().with_ansi(false).with_writer(w)))
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    Ok(guard)
}

fn open_log_file(log_path: &Path) -> Result<std::fs::File> {
    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .with_context(|| format!("failed to open log file {}", log_path.display()))
}
