use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use symbiosis_client::{ClientConfig, SymbiosisApi, SymbiosisClient};
use symbiosis_core::{Backoff, Convergence, Wait};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod apply;
mod manifest;

use apply::Applier;
use manifest::Manifest;

/// Converge Symbiosis infrastructure to a YAML manifest
#[derive(Parser, Debug)]
#[command(name = "symbiosis-apply", version)]
struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, env = "SYMBIOSIS_LOG_JSON")]
    json_logs: bool,

    /// Return once the API accepts each request instead of waiting for convergence
    #[arg(long)]
    no_wait: bool,

    /// Convergence deadline per create or delete
    #[arg(long, env = "SYMBIOSIS_WAIT_TIMEOUT_SECS", default_value_t = 600)]
    wait_timeout_secs: u64,

    /// Upper bound for the delay between two polls
    #[arg(long, default_value_t = 10)]
    max_poll_interval_secs: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Verify the API key and endpoint
    Check,
    /// Create or update everything in the manifest
    Apply { manifest: PathBuf },
    /// Delete everything in the manifest
    Destroy { manifest: PathBuf },
}

impl Cli {
    fn convergence(&self) -> Convergence {
        if self.no_wait {
            return Convergence::none();
        }
        let backoff = Backoff::exponential(
            Duration::from_secs(1),
            Duration::from_secs(self.max_poll_interval_secs.max(1)),
        )
        .with_jitter();
        Convergence::both(Wait::new(Duration::from_secs(self.wait_timeout_secs)).with_backoff(backoff))
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    let config = ClientConfig::from_env()?;
    let client = SymbiosisClient::connect(&config).await?;

    match &cli.command {
        Command::Check => {
            let clusters = client.list_clusters().await?;
            info!(
                "Connected to {}, {} clusters visible",
                client.base_url(),
                clusters.total_elements.unwrap_or(clusters.content.len() as u64)
            );
        }
        Command::Apply { manifest } => {
            let manifest = Manifest::load(manifest)?;
            let applier = Applier::new(Arc::new(client), cli.convergence());
            let summary = applier.apply(&manifest).await?;
            info!("Apply finished: {}", summary);
        }
        Command::Destroy { manifest } => {
            let manifest = Manifest::load(manifest)?;
            let applier = Applier::new(Arc::new(client), cli.convergence());
            let summary = applier.destroy(&manifest).await?;
            info!("Destroy finished: {}", summary);
        }
    }

    Ok(())
}
