//! Minimal MCP peer for integration testing.
//! Speaks JSON-RPC over HTTP POST on an ephemeral port and prints the
//! bound address as its first stdout line.

use axum::{Json, Router, response::IntoResponse, routing::post};
use bhrouter::mcp::{RequestId, Response};
use serde_json::{Value, json};
use std::io::Write;

fn tool_payload() -> Value {
    json!([
        {
            "title": "Behavioral Health",
            "summary": "Resources for members and their families",
            "Docs": [
                {
                    "name": "Substance Use Treatment",
                    "description": "Find in-network treatment",
                    "onEnglishAction": "https://example.test/sud-treatment"
                },
                {
                    "name": "Alcohol Recovery Program",
                    "description": "Support for alcohol use",
                    "onEnglishEmailSave": "mailto:recovery@example.test"
                },
                {
                    "name": "Vision Plan",
                    "description": "Eye exams and glasses"
                },
                {
                    "name": "Mental Health Navigator",
                    "description": "Find a therapist for stress or mood concerns",
                    "onEnglishVideoAction": "https://example.test/navigator.mp4"
                }
            ]
        },
        {
            "title": "Wellness",
            "summary": "Everything else",
            "Docs": [{"name": "Gym Discount", "description": "Fitness"}]
        }
    ])
}

fn curated(context: &str) -> Option<Value> {
    let docs = match context {
        "sud" => json!([
            {"name": "Substance Use Treatment", "onEnglishAction": "https://example.test/sud"},
            {"name": "Crisis Line", "onEnglishAction": "tel:988"}
        ]),
        "anxiety" | "depression" => json!([
            {"name": "Mental Health Navigator", "onEnglishAction": "https://example.test/mh"}
        ]),
        "youth-bh" => json!([{"name": "Youth Behavioral Health"}]),
        _ => return None,
    };
    Some(json!({"context": context, "docs": docs}))
}

async fn handle(Json(msg): Json<Value>) -> axum::response::Response {
    let id = match serde_json::from_value::<RequestId>(msg["id"].clone()) {
        Ok(id) => id,
        Err(_) => return Json(json!({"detail": "missing id"})).into_response(),
    };
    let method = msg["method"].as_str().unwrap_or("");
    let params = &msg["params"];

    let response = match method {
        "tools/list" => Response::success(
            id,
            json!({
                "tools": [
                    {
                        "name": "employerassestfastapi-local",
                        "description": "Behavioral health documents",
                        "inputSchema": {"type": "object", "properties": {}},
                        "outputSchema": {"type": "array"}
                    },
                    {
                        "name": "fail",
                        "description": "Always fails",
                        "inputSchema": {"type": "object"}
                    }
                ]
            }),
        ),
        "tools/call" => match params["name"].as_str().unwrap_or("") {
            "employerassestfastapi-local" => Response::success(
                id,
                json!({
                    "content": [{"type": "text", "text": tool_payload().to_string()}],
                    "isError": false
                }),
            ),
            "fail" => Response::success(
                id,
                json!({
                    "content": [{"type": "text", "text": "intentional failure"}],
                    "isError": true
                }),
            ),
            "plain" => Response::success(
                id,
                json!({"content": [{"type": "text", "text": "not a category list"}]}),
            ),
            other => Response::error(id, -32602, format!("Unknown tool: {other}")),
        },
        "prompts/get" => match params["name"].as_str().unwrap_or("") {
            "empty-prompt" => Response::success(id, json!({"messages": []})),
            "missing-prompt" => Response::error(id, -32602, "Unknown prompt: missing-prompt"),
            _ => {
                let query = params["arguments"]["member_query"].as_str().unwrap_or("");
                let context = params["arguments"]["context"].as_str().unwrap_or("");
                Response::success(
                    id,
                    json!({
                        "messages": [{
                            "role": "user",
                            "content": {
                                "type": "text",
                                "text": format!("Member asked: {query}. Context: {context}.")
                            }
                        }]
                    }),
                )
            }
        },
        "resources/read" => {
            let uri = params["uri"].as_str().unwrap_or("");
            let context = uri.strip_prefix("resource://bcbsnc/").unwrap_or("");
            match curated(context) {
                Some(block) => Response::success(
                    id,
                    json!({
                        "contents": [{
                            "uri": uri,
                            "mimeType": "application/json",
                            "text": block.to_string()
                        }]
                    }),
                ),
                None => Response::error(id, -32002, format!("Resource not found: {uri}")),
            }
        }
        "echo/id" => Response::success(id.clone(), json!({"id": id})),
        "raw/detail" => return Json(json!({"detail": "gateway says no"})).into_response(),
        "raw/text" => return "plain text body".into_response(),
        _ => Response::error(id, -32601, "Method not found"),
    };

    Json(response).into_response()
}

#[tokio::main]
async fn main() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let mut out = std::io::stdout();
    writeln!(out, "{addr}").unwrap();
    out.flush().unwrap();

    let app = Router::new().route("/mcp", post(handle));
    axum::serve(listener, app).await.unwrap();
}
