//! Certkeeper - Main entry point
//!
//! A resilient certbot orchestration service: re-reads a CSV of
//! domains on a fixed cycle and drives the external issuance tool for
//! each one, surviving missing files, subprocess failures and anything
//! else short of a termination signal.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::fmt::writer::MakeWriterExt;

use certkeeper::config::{Config, DEFAULT_SECRETS_DIR};
use certkeeper::jobs::CycleScheduler;
use certkeeper::shutdown;

/// Certkeeper - Automated TLS certificate lifecycle for fleets of domains
#[derive(Parser, Debug)]
#[command(name = "certkeeper")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the CSV job file (columns: fqdn, dns_provider, email)
    #[arg(long = "csv", env = "CERTKEEPER_CSV")]
    csv: PathBuf,

    /// Executable run by the issuance tool after each successful issuance
    #[arg(long = "hook")]
    hook: Option<PathBuf>,

    /// Minutes between processing cycles
    #[arg(long = "frequency", default_value_t = 60)]
    frequency: u64,

    /// Directory holding per-provider credential files (<provider>.ini)
    #[arg(
        long = "secrets-dir",
        env = "CERTKEEPER_SECRETS_DIR",
        default_value = DEFAULT_SECRETS_DIR
    )]
    secrets_dir: PathBuf,

    /// Issuance tool binary
    #[arg(long = "certbot", default_value = "certbot")]
    certbot: PathBuf,

    /// Upper bound in seconds on a single tool invocation
    #[arg(long = "timeout-secs")]
    timeout_secs: Option<u64>,

    /// Enable verbose logging (debug level)
    #[arg(long = "verbose")]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbose flag; warnings and errors go
    // to stderr, informational lines to stdout
    let log_level = if cli.verbose { "debug" } else { "info" };
    let writer = std::io::stderr
        .with_max_level(tracing::Level::WARN)
        .or_else(std::io::stdout);
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_writer(writer)
        .init();

    let config = Config::new(
        cli.csv,
        cli.hook,
        cli.frequency,
        cli.secrets_dir,
        cli.certbot,
        cli.timeout_secs,
    );

    info!(
        csv = %config.csv_path.display(),
        secrets_dir = %config.secrets_dir.display(),
        "Certkeeper starting"
    );

    let shutdown = shutdown::install()?;
    CycleScheduler::new(&config, shutdown).run().await;

    info!("Service terminated");
    Ok(())
}
