//! Fake Anthropic Messages endpoint shared by the test binaries.

use axum::{Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::post};
use bhrouter::config::LlmConfig;
use bhrouter::llm::LlmClient;
use serde_json::{Value, json};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

pub type Seen = Arc<Mutex<Vec<Value>>>;

/// Replies with `reply` and records each request body. `None` answers 401.
#[derive(Clone)]
struct Fake {
    reply: Option<&'static str>,
    seen: Seen,
}

async fn messages(State(fake): State<Fake>, Json(body): Json<Value>) -> axum::response::Response {
    fake.seen.lock().unwrap().push(body);
    match fake.reply {
        Some(text) => Json(json!({
            "content": [{"type": "text", "text": text}],
            "stop_reason": "end_turn"
        }))
        .into_response(),
        None => (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": {"type": "authentication_error", "message": "invalid x-api-key"}})),
        )
            .into_response(),
    }
}

pub async fn fake_llm(reply: Option<&'static str>) -> (LlmClient, Seen) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let app = Router::new()
        .route("/v1/messages", post(messages))
        .with_state(Fake {
            reply,
            seen: Arc::clone(&seen),
        });
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

    let config = LlmConfig {
        base_url: format!("http://{addr}/v1"),
        ..LlmConfig::default()
    };
    (LlmClient::new("test-key", config), seen)
}
