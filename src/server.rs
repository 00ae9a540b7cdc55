//! HTTP surface: `POST /api/chat` plus a health check.

use crate::error::{RelayError, MESSAGE_REQUIRED};
use crate::relay::{ChatReply, ChatRequest, Relay};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

pub fn router(relay: Arc<Relay>, cors_origins: Option<&str>) -> Router {
    Router::new()
        .route("/api/chat", post(chat))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(cors_origins))
        .with_state(relay)
}

/// Any origin unless a comma-separated allow list is configured.
pub fn cors_layer(origins: Option<&str>) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .unwrap_or_default()
        .split(',')
        .filter_map(|s| s.trim().parse().ok())
        .collect();

    let cors = CorsLayer::new().allow_headers(Any).allow_methods(Any);
    if allowed.is_empty() {
        cors.allow_origin(Any)
    } else {
        cors.allow_origin(allowed)
    }
}

async fn chat(
    State(relay): State<Arc<Relay>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<ChatReply>, RelayError> {
    // A body that isn't JSON carries no readable message at all.
    let body = match payload {
        Ok(Json(body)) => body,
        Err(e) => {
            debug!(rejection = %e.body_text(), "unreadable chat body");
            return Err(RelayError::Validation(MESSAGE_REQUIRED.to_string()));
        }
    };
    let request = ChatRequest::from_json(body)?;
    relay.handle_chat(request).await.map(Json)
}

async fn health(State(relay): State<Arc<Relay>>) -> Json<Value> {
    Json(json!({ "status": "ok", "provider": relay.provider_name() }))
}

pub async fn serve(app: Router, addr: SocketAddr) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("chat-relay stopped");
    Ok(())
}

/// Resolves when SIGINT (Ctrl-C) or SIGTERM is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to install CTRL+C signal handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => warn!(error = %e, "failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    info!("shutdown signal received");
}
