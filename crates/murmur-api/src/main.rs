//! murmur transcription service binary.
//!
//! Loads configuration from the environment, applies CLI overrides,
//! prefetches the configured model checkpoints, then serves HTTP.

#![deny(unsafe_code)]

use std::path::PathBuf;

use clap::Parser;
use murmur_server::{MurmurServer, ServerConfig};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Word-timestamped speech transcription over HTTP.
#[derive(Debug, Parser)]
#[command(name = "murmur-api", version, about)]
struct Cli {
    /// Host to bind.
    #[arg(long)]
    host: Option<String>,

    /// Port to bind.
    #[arg(long)]
    port: Option<u16>,

    /// Directory holding server-side audio files.
    #[arg(long)]
    upload_dir: Option<PathBuf>,

    /// Root directory for model checkpoints.
    #[arg(long)]
    models_dir: Option<PathBuf>,

    /// Skip the startup model prefetch.
    #[arg(long)]
    no_prefetch: bool,
}

impl Cli {
    fn apply(&self, config: &mut ServerConfig) {
        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(dir) = &self.upload_dir {
            config.upload_dir = dir.clone();
        }
        if let Some(dir) = &self.models_dir {
            config.models_dir = dir.clone();
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = ServerConfig::from_env();
    cli.apply(&mut config);
    config.validate()?;

    std::fs::create_dir_all(&config.upload_dir)?;
    std::fs::create_dir_all(&config.models_dir)?;

    if !cli.no_prefetch {
        prefetch_models(&config).await;
    }

    info!(
        host = %config.host,
        port = config.port,
        "starting murmur"
    );
    let server = MurmurServer::new(config);
    server.serve().await?;
    Ok(())
}

/// Download the configured model checkpoints before accepting traffic.
///
/// A failed download is logged and skipped; the engine retries it on the
/// first request for that model.
async fn prefetch_models(config: &ServerConfig) {
    for size in &config.preload_models {
        match murmur_engine::model::ensure_model(
            &config.models_dir,
            size,
            config.hf_token.as_deref(),
        )
        .await
        {
            Ok(()) => info!("model {size} ready"),
            Err(e) => warn!("prefetch of model {size} failed: {e}"),
        }
    }
}
