//! emvue-simd - standalone simulator server.
//!
//! Serves the default simulated home on `PORT` (default 3000) so client
//! code can be exercised without cloud credentials.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tracing::info;
use tracing_subscriber::EnvFilter;

use emvue_sim::{default_home, router};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(3000);

    let listener = TcpListener::bind(("0.0.0.0", port))
        .await
        .with_context(|| format!("failed to bind port {port}"))?;

    info!("simulator running on http://localhost:{port}");

    let state = Arc::new(RwLock::new(default_home()));
    axum::serve(listener, router(state))
        .await
        .context("simulator server failed")?;

    Ok(())
}
