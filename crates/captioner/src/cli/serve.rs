//! The `captioner serve` command.

use std::sync::Arc;

use clap::Args;
use tokio::net::TcpListener;

use captioner_core::server::{self, AppState};
use captioner_core::{Captioner, Config};

/// Arguments for the `serve` command.
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Interface to bind (overrides server.host)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind (overrides server.port)
    #[arg(short, long)]
    pub port: Option<u16>,
}

/// Execute the serve command.
pub async fn execute(args: ServeArgs, config: Config) -> anyhow::Result<()> {
    let host = args.host.unwrap_or_else(|| config.server.host.clone());
    let port = args.port.unwrap_or(config.server.port);

    // Artifacts are large; keep the load off the async workers.
    let load_config = config.clone();
    let captioner = tokio::task::spawn_blocking(move || Captioner::load(&load_config)).await??;
    tracing::info!(
        "Serving captions for {} images (max_length {}, sequence width {})",
        captioner.features().len(),
        captioner.decoder().max_length(),
        captioner.decoder().sequence_width()
    );

    let state = AppState::new(Arc::new(captioner))
        .with_legacy_not_found_caption(config.server.legacy_not_found_caption);

    let listener = TcpListener::bind((host.as_str(), port)).await?;
    server::serve(listener, state, shutdown_signal()).await?;

    tracing::info!("Caption server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
