//! Relay service - republishes the upstream behavioral health document.

use crate::config::RelayConfig;
use anyhow::{Context, Result};
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde_json::{Value, json};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info};

/// Browser-like headers; the upstream CDN rejects bare clients.
const BROWSER_HEADERS: [(&str, &str); 5] = [
    ("User-Agent", "Mozilla/5.0"),
    ("Accept", "application/json"),
    ("Accept-Language", "en-US,en;q=0.9"),
    ("Referer", "https://www.bcbsnc.com"),
    ("Origin", "https://www.bcbsnc.com"),
];

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("upstream request failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("upstream returned {status} for {url}")]
    Status { status: u16, url: String },
    #[error("upstream body is not JSON: {0}")]
    Body(#[source] reqwest::Error),
}

impl IntoResponse for UpstreamError {
    fn into_response(self) -> Response {
        (
            StatusCode::BAD_GATEWAY,
            Json(json!({ "detail": self.to_string() })),
        )
            .into_response()
    }
}

#[derive(Clone)]
struct RelayState {
    client: reqwest::Client,
    source_url: Arc<str>,
}

/// Fetch the source document and normalize it to a JSON array.
pub async fn fetch_source(client: &reqwest::Client, url: &str) -> Result<Vec<Value>, UpstreamError> {
    let mut request = client.get(url);
    for (name, value) in BROWSER_HEADERS {
        request = request.header(name, value);
    }

    let response = request.send().await.map_err(UpstreamError::Transport)?;
    let status = response.status();
    if !status.is_success() {
        return Err(UpstreamError::Status {
            status: status.as_u16(),
            url: url.to_string(),
        });
    }

    let data: Value = response.json().await.map_err(UpstreamError::Body)?;
    Ok(into_list(data))
}

/// Arrays pass through; any other value becomes a one-element array.
pub fn into_list(data: Value) -> Vec<Value> {
    match data {
        Value::Array(items) => items,
        other => vec![other],
    }
}

/// Router exposing the relay route at `config.path`.
pub fn router(config: &RelayConfig) -> Router {
    let state = RelayState {
        client: reqwest::Client::new(),
        source_url: Arc::from(config.source_url.as_str()),
    };
    Router::new()
        .route(&config.path, get(relay_handler))
        .with_state(state)
}

async fn relay_handler(State(state): State<RelayState>) -> Result<Json<Vec<Value>>, UpstreamError> {
    debug!(url = %state.source_url, "Fetching upstream document");
    match fetch_source(&state.client, &state.source_url).await {
        Ok(items) => {
            info!(items = items.len(), "Relayed upstream document");
            Ok(Json(items))
        }
        Err(e) => {
            error!(error = %e, "Upstream fetch failed");
            Err(e)
        }
    }
}

/// Bind and serve until the process is stopped.
pub async fn serve(config: &RelayConfig) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind relay on {}", config.bind))?;
    info!(addr = %config.bind, path = %config.path, "Relay listening");
    axum::serve(listener, router(config))
        .await
        .context("Relay server error")
}
