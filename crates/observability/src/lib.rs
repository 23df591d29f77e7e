//! # opus-observability
//!
//! Observability-Crate fuer Opus:
//! - Health-Check-Endpunkte (`/health`, `/health/streams`)
//! - Structured Logging via tracing-subscriber

pub mod health;
pub mod logging;

pub use health::{health_router, HealthQuelle, HealthResponse, HealthStatus};
pub use logging::logging_initialisieren;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Startet den Observability-HTTP-Server und laeuft bis `shutdown` endet
pub async fn observability_server_starten(
    bind_addr: SocketAddr,
    quelle: Arc<dyn HealthQuelle>,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let app = health_router(quelle).layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    tracing::info!(addr = %bind_addr, "Observability-Server gestartet");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}
