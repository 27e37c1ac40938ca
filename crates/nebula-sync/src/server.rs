//! Health endpoint and its probe.
//!
//! `GET /health` answers 200 when the most recent run succeeded and 500
//! otherwise (including before the first run completed). The hidden
//! `healthcheck` subcommand probes it for container health checks.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{Json, Router, extract::State, http::StatusCode, routing::get};
use serde::Serialize;
use tokio::net::TcpListener;
use tracing::{error, info};

use nebula_core::{Outcome, SyncState};

use crate::error::CliError;

const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Serialize)]
struct HealthResponse {
    healthy: bool,
    outcomes: Vec<Outcome>,
}

async fn health(State(state): State<Arc<SyncState>>) -> (StatusCode, Json<HealthResponse>) {
    let healthy = state.healthy();
    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (
        status,
        Json(HealthResponse {
            healthy,
            outcomes: state.outcomes(),
        }),
    )
}

pub fn router(state: Arc<SyncState>) -> Router {
    Router::new().route("/health", get(health)).with_state(state)
}

/// Bind on all interfaces and serve in the background.
pub async fn spawn(port: u16, state: Arc<SyncState>) -> Result<(), CliError> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| CliError::Server {
            addr: addr.to_string(),
            source,
        })?;

    info!(%addr, "health endpoint listening");
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router(state)).await {
            error!(error = %e, "health endpoint stopped");
        }
    });
    Ok(())
}

/// Succeeds only on a 200 from the local health endpoint.
pub async fn probe(port: u16) -> Result<(), CliError> {
    let url = format!("http://127.0.0.1:{port}/health");
    let unhealthy = |reason: String| CliError::Unhealthy {
        url: url.clone(),
        reason,
    };

    let client = reqwest::Client::builder()
        .timeout(PROBE_TIMEOUT)
        .build()
        .map_err(|e| unhealthy(e.to_string()))?;
    let resp = client
        .get(&url)
        .send()
        .await
        .map_err(|e| unhealthy(e.to_string()))?;

    if resp.status() == reqwest::StatusCode::OK {
        Ok(())
    } else {
        Err(unhealthy(format!("status {}", resp.status())))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    use super::*;

    async fn get_health(state: Arc<SyncState>) -> (StatusCode, serde_json::Value) {
        let request = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let response = router(state).oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn unhealthy_before_first_run() {
        let (status, body) = get_health(Arc::new(SyncState::new())).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["healthy"], false);
        assert_eq!(body["outcomes"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn healthy_after_successful_run() {
        let state = Arc::new(SyncState::new());
        state.record(Outcome::now(false));
        state.record(Outcome::now(true));

        let (status, body) = get_health(state).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["healthy"], true);
        assert_eq!(body["outcomes"][0]["success"], true);
        assert_eq!(body["outcomes"][1]["success"], false);
    }

    #[tokio::test]
    async fn unhealthy_after_failed_run() {
        let state = Arc::new(SyncState::new());
        state.record(Outcome::now(true));
        state.record(Outcome::now(false));

        let (status, _) = get_health(state).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn unknown_route_is_not_found() {
        let request = Request::builder()
            .uri("/metrics")
            .body(Body::empty())
            .unwrap();
        let response = router(Arc::new(SyncState::new()))
            .oneshot(request)
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn probe_follows_served_health() {
        let state = Arc::new(SyncState::new());
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let app = router(Arc::clone(&state));
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        assert!(matches!(probe(port).await, Err(CliError::Unhealthy { .. })));

        state.record(Outcome::now(true));
        assert!(probe(port).await.is_ok());
    }
}
