//! Server runner.

use std::sync::Arc;

use agora_shared::time::SystemClock;
use tokio::net::TcpListener;

use crate::{config::ServerConfig, infrastructure::realtime::spawn_ticker};

use super::{router::build_router, signal::shutdown_signal, state::AppState};

/// Run the server until Ctrl-C / SIGTERM.
///
/// On shutdown, live WebSocket connections are closed first so the server can
/// drain, then the presence ticker is stopped.
pub async fn run(config: ServerConfig) -> std::io::Result<()> {
    let state = Arc::new(AppState::in_memory(&config, Arc::new(SystemClock)));
    let ticker = spawn_ticker(state.hub.clone(), config.tick_interval());

    let listener = TcpListener::bind(config.addr()).await?;
    tracing::info!("Listening on {}", listener.local_addr()?);
    tracing::info!(
        "Online threshold {:?}, presence tick {:?}, send buffer {}, retention {}",
        config.online_threshold(),
        config.tick_interval(),
        config.send_buffer(),
        config.message_retention()
    );

    let hub = state.hub.clone();
    let result = axum::serve(listener, build_router(state))
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            hub.close_all().await;
        })
        .await;

    ticker.shutdown().await;
    tracing::info!("Server stopped");
    result
}
