//! Server binary: loads configuration, opens the analytics database and
//! serves the HTTP API until Ctrl+C.

use tracing_subscriber::EnvFilter;

use qr_service::app::SharedState;
use qr_service::server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    tracing::info!("Starting QR service");

    let (db, config) = qr_service::init_foundation()?;
    let state = SharedState::new(db, config)?;

    let server_state = state.clone();
    let server_handle = tokio::spawn(async move {
        if let Err(e) = server::start_server(server_state).await {
            tracing::error!("Server failed: {e}");
        }
    });

    tracing::info!(
        port = state.server_port(),
        "QR service running. Press Ctrl+C to stop."
    );

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down...");

    state.shutdown_token().cancel();
    server_handle.await?;
    Ok(())
}
