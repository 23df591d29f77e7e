//! Health-Check-Endpunkte fuer Opus
//!
//! - `GET /health`         – Gesamtstatus: Version, Uptime, DB und Stream-Daemon
//! - `GET /health/streams` – Online-Status je Stream (503 wenn der Daemon fehlt)

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde::{Deserialize, Serialize};

/// Status des Health-Checks
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

/// Antwort des Health-Check-Endpunkts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub version: String,
    pub uptime_seconds: u64,
    pub db_connected: bool,
    pub daemon_erreichbar: bool,
    pub streams_online: usize,
    pub streams_gesamt: usize,
}

/// Liefert die Messwerte fuer den Health-Check
#[async_trait]
pub trait HealthQuelle: Send + Sync {
    async fn db_verbunden(&self) -> bool;

    /// Online-Status je Stream, `None` wenn der Daemon nicht erreichbar ist
    async fn stream_status(&self) -> Option<BTreeMap<String, bool>>;
}

/// Geteilter Zustand fuer die Health-Handler
#[derive(Clone)]
pub struct HealthState {
    start_time: Arc<Instant>,
    quelle: Arc<dyn HealthQuelle>,
}

impl HealthState {
    pub fn neu(quelle: Arc<dyn HealthQuelle>) -> Self {
        Self {
            start_time: Arc::new(Instant::now()),
            quelle,
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

/// Axum-Router fuer die Health-Endpunkte
pub fn health_router(quelle: Arc<dyn HealthQuelle>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/health/streams", get(streams_handler))
        .with_state(HealthState::neu(quelle))
}

fn status_bestimmen(db_connected: bool, daemon_erreichbar: bool) -> HealthStatus {
    match (db_connected, daemon_erreichbar) {
        (false, _) => HealthStatus::Unhealthy,
        (true, false) => HealthStatus::Degraded,
        (true, true) => HealthStatus::Healthy,
    }
}

async fn health_handler(State(state): State<HealthState>) -> impl IntoResponse {
    let db_connected = state.quelle.db_verbunden().await;
    let streams = state.quelle.stream_status().await;
    let daemon_erreichbar = streams.is_some();
    let streams = streams.unwrap_or_default();

    let status = status_bestimmen(db_connected, daemon_erreichbar);
    let http_status = match status {
        // 200 auch bei degraded: ohne Daemon laeuft die Verwaltung weiter
        HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    let response = HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.uptime_seconds(),
        db_connected,
        daemon_erreichbar,
        streams_online: streams.values().filter(|online| **online).count(),
        streams_gesamt: streams.len(),
    };

    (http_status, Json(response))
}

async fn streams_handler(State(state): State<HealthState>) -> impl IntoResponse {
    match state.quelle.stream_status().await {
        Some(streams) => (StatusCode::OK, Json(serde_json::json!(streams))),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({ "error": "Stream-Daemon nicht erreichbar" })),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    struct TestQuelle {
        db: bool,
        streams: Option<BTreeMap<String, bool>>,
    }

    #[async_trait]
    impl HealthQuelle for TestQuelle {
        async fn db_verbunden(&self) -> bool {
            self.db
        }

        async fn stream_status(&self) -> Option<BTreeMap<String, bool>> {
            self.streams.clone()
        }
    }

    fn zwei_streams() -> Option<BTreeMap<String, bool>> {
        Some(BTreeMap::from([
            ("dock-ch1-main".to_string(), true),
            ("dock-ch1-sub".to_string(), false),
        ]))
    }

    async fn abrufen(quelle: TestQuelle, pfad: &str) -> (StatusCode, serde_json::Value) {
        let app = health_router(Arc::new(quelle));
        let resp = app
            .oneshot(Request::get(pfad).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn status_matrix() {
        assert_eq!(status_bestimmen(true, true), HealthStatus::Healthy);
        assert_eq!(status_bestimmen(true, false), HealthStatus::Degraded);
        assert_eq!(status_bestimmen(false, true), HealthStatus::Unhealthy);
    }

    #[tokio::test]
    async fn gesund_mit_stream_zaehlung() {
        let (status, json) = abrufen(
            TestQuelle {
                db: true,
                streams: zwei_streams(),
            },
            "/health",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["streams_online"], 1);
        assert_eq!(json["streams_gesamt"], 2);
        assert_eq!(json["daemon_erreichbar"], true);
    }

    #[tokio::test]
    async fn daemon_weg_ist_degraded_mit_200() {
        let (status, json) = abrufen(
            TestQuelle {
                db: true,
                streams: None,
            },
            "/health",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "degraded");
        assert_eq!(json["daemon_erreichbar"], false);
        assert_eq!(json["streams_gesamt"], 0);
    }

    #[tokio::test]
    async fn db_weg_ist_unhealthy() {
        let (status, json) = abrufen(
            TestQuelle {
                db: false,
                streams: zwei_streams(),
            },
            "/health",
        )
        .await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(json["status"], "unhealthy");
    }

    #[tokio::test]
    async fn streams_endpunkt() {
        let (status, json) = abrufen(
            TestQuelle {
                db: true,
                streams: zwei_streams(),
            },
            "/health/streams",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["dock-ch1-main"], true);
        assert_eq!(json["dock-ch1-sub"], false);

        let (status, _) = abrufen(
            TestQuelle {
                db: true,
                streams: None,
            },
            "/health/streams",
        )
        .await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn health_response_deserialisierung() {
        let json = r#"{"status":"degraded","version":"0.1.0","uptime_seconds":100,"db_connected":true,"daemon_erreichbar":false,"streams_online":0,"streams_gesamt":0}"#;
        let response: HealthResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.status, HealthStatus::Degraded);
        assert!(!response.daemon_erreichbar);
    }
}
