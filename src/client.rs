//! MCP client - JSON-RPC over HTTP POST to a single peer.

use crate::mcp::{
    CallToolParams, CallToolResult, Envelope, GetPromptParams, GetPromptResult, ListToolsResult,
    ReadResourceParams, ReadResourceResult, Reply, Request, RpcError, Tool,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;
use tracing::debug;

/// Longest body prefix written to the debug log.
const LOG_BODY_LIMIT: usize = 300;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request to MCP peer failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("MCP peer returned non-JSON body (status {status}): {source}")]
    InvalidJson {
        status: u16,
        #[source]
        source: serde_json::Error,
    },
    #[error("{0}")]
    Rpc(RpcError),
    #[error("unexpected response shape for {method}: {detail}")]
    UnexpectedShape { method: String, detail: String },
}

pub type Result<T> = std::result::Result<T, ClientError>;

pub struct McpClient {
    client: reqwest::Client,
    url: String,
}

impl McpClient {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Make a JSON-RPC call. Any JSON body comes back; only a non-JSON body is an error.
    pub async fn call(&self, method: &str, params: Option<Value>) -> Result<Envelope> {
        let request = Request::new(method, params);
        debug!(id = ?request.id, method, url = %self.url, "Sending request");

        let response = self
            .client
            .post(&self.url)
            .header("Accept", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        debug!(
            method,
            status = status.as_u16(),
            body = %truncate(&body, LOG_BODY_LIMIT),
            "Received response"
        );

        let value: Value = serde_json::from_str(&body).map_err(|source| ClientError::InvalidJson {
            status: status.as_u16(),
            source,
        })?;

        Ok(Envelope::from_value(value))
    }

    /// Call and decode the `result` member into `T`.
    pub async fn call_typed<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Option<Value>,
    ) -> Result<T> {
        let response = match self.call(method, params).await? {
            Envelope::Parsed(response) => response,
            Envelope::Raw(value) => {
                let raw = value.to_string();
                return Err(ClientError::UnexpectedShape {
                    method: method.to_string(),
                    detail: format!(
                        "not a JSON-RPC response: {}",
                        truncate(&raw, LOG_BODY_LIMIT)
                    ),
                });
            }
        };

        match response.reply() {
            Reply::Failure(err) => Err(ClientError::Rpc(err)),
            Reply::Success(result) => {
                serde_json::from_value(result).map_err(|e| ClientError::UnexpectedShape {
                    method: method.to_string(),
                    detail: e.to_string(),
                })
            }
        }
    }

    /// List tools exposed by the peer
    pub async fn list_tools(&self) -> Result<Vec<Tool>> {
        let result: ListToolsResult = self.call_typed("tools/list", None).await?;
        Ok(result.tools)
    }

    /// Call a tool
    pub async fn call_tool(&self, name: &str, arguments: Value) -> Result<CallToolResult> {
        let params = CallToolParams {
            name: name.to_string(),
            arguments,
        };
        self.call_typed("tools/call", Some(to_params(params)?))
            .await
    }

    /// Read a resource
    pub async fn read_resource(&self, uri: &str) -> Result<ReadResourceResult> {
        let params = ReadResourceParams {
            uri: uri.to_string(),
        };
        self.call_typed("resources/read", Some(to_params(params)?))
            .await
    }

    /// Get a prompt
    pub async fn get_prompt(
        &self,
        name: &str,
        arguments: HashMap<String, String>,
    ) -> Result<GetPromptResult> {
        let params = GetPromptParams {
            name: name.to_string(),
            arguments,
        };
        self.call_typed("prompts/get", Some(to_params(params)?))
            .await
    }
}

fn to_params(params: impl serde::Serialize) -> Result<Value> {
    serde_json::to_value(params).map_err(|e| ClientError::UnexpectedShape {
        method: "params".to_string(),
        detail: e.to_string(),
    })
}

/// Cut at a char boundary at or below `limit` bytes.
fn truncate(s: &str, limit: usize) -> &str {
    if s.len() <= limit {
        return s;
    }
    let mut end = limit;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
