//! Pub/Sub push endpoint
//!
//! Pub/Sub delivers each message as a JSON envelope whose `message.data`
//! field holds the base64 payload. Any 2xx answer acknowledges the message,
//! so every processed event is acknowledged whatever its outcome; only
//! payloads that cannot be decoded are refused.

use crate::orchestration::Orchestrator;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

#[derive(Debug, Deserialize)]
pub struct PushEnvelope {
    pub message: PushMessage,
    #[serde(default)]
    pub subscription: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushMessage {
    /// Base64 payload, passed to the codec untouched
    #[serde(default)]
    pub data: String,
    #[serde(default)]
    pub message_id: Option<String>,
    #[serde(default)]
    pub publish_time: Option<String>,
    #[serde(default)]
    pub attributes: HashMap<String, String>,
}

pub fn router(orchestrator: Arc<Orchestrator>) -> Router {
    Router::new()
        .route("/", post(receive_push))
        .route("/healthz", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(orchestrator)
}

/// Serve the push endpoint until Ctrl-C or SIGTERM
pub async fn serve(orchestrator: Arc<Orchestrator>, addr: SocketAddr) -> crate::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "Listening for push deliveries");

    axum::serve(listener, router(orchestrator))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn receive_push(
    State(orchestrator): State<Arc<Orchestrator>>,
    Json(envelope): Json<PushEnvelope>,
) -> StatusCode {
    let message = envelope.message;
    let message_id = message.message_id.as_deref().unwrap_or("-");
    tracing::debug!(
        message_id,
        subscription = envelope.subscription.as_deref().unwrap_or("-"),
        publish_time = message.publish_time.as_deref().unwrap_or("-"),
        event_type = message.attributes.get("eventType").map(String::as_str).unwrap_or("-"),
        "Received push message"
    );

    match orchestrator.handle_event(message.data.as_bytes()).await {
        Ok(outcome) => {
            tracing::debug!(message_id, outcome = outcome.as_str(), "Push message handled");
            StatusCode::NO_CONTENT
        }
        Err(e) => {
            tracing::error!(message_id, error = %e, "Refusing undecodable push message");
            StatusCode::BAD_REQUEST
        }
    }
}

async fn health() -> &'static str {
    "ok"
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutting down push endpoint");
}
