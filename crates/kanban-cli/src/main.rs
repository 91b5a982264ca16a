//! Kanban Live server
//!
//! Board API with real-time event streams.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;

use commands::{Cli, Commands};

/// Initialize tracing with optional file logging.
///
/// The returned guard flushes the file writer and must live until exit.
fn init_tracing(log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "kanban=info,kanban_web=debug,kanban_realtime=debug,tower_http=info".into());

    let Some(path) = log_file else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
        return Ok(None);
    };

    let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
    let file_name = path
        .file_name()
        .context("Log file path has no file name")?
        .to_string_lossy()
        .into_owned();
    std::fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name)
        .build(dir)
        .context("Failed to open log file")?;
    let (writer, guard) = tracing_appender::non_blocking(appender);

    // Log to both stdout and file when --log is used
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::fmt::layer().with_writer(writer).with_ansi(false))
        .init();
    Ok(Some(guard))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_file = match &cli.command {
        Commands::Serve(args) if args.log => Some(args.log_file.clone().unwrap_or_else(commands::serve::default_log_file)),
        _ => None,
    };
    let _guard = init_tracing(log_file.as_deref())?;

    cli.execute().await
}
