//! Anthropic Messages API client used for classification and summaries.

use crate::config::LlmConfig;
use crate::context::ContextTag;
use crate::docs::Document;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Anthropic API version header value
const ANTHROPIC_VERSION: &str = "2023-06-01";

const CLASSIFY_SYSTEM: &str = "You are a behavioral health context classifier.
Given a member query, return ONLY one of these exact values:
- anxiety
- depression
- sud
- youth-bh
- general

Return just the single word/phrase, nothing else.";

const SUMMARIZE_SYSTEM: &str = "You are a compassionate BCBSNC benefits advisor helping members
find behavioral health resources. Given the member's concern and a list of
available resources, provide a warm, helpful response that:
1. Acknowledges their concern briefly
2. Lists the most relevant 2-3 resources with their links
3. Encourages them to reach out for help";

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("ANTHROPIC_API_KEY environment variable not set")]
    MissingApiKey,
    #[error("failed to reach LLM endpoint: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("LLM API error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("failed to encode resources: {0}")]
    Encode(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, LlmError>;

/// Client for a single model.
pub struct LlmClient {
    client: reqwest::Client,
    api_key: String,
    config: LlmConfig,
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    #[serde(rename = "type")]
    error_type: String,
    message: String,
}

impl LlmClient {
    pub fn new(api_key: impl Into<String>, config: LlmConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            config,
        }
    }

    /// Reads the key from `ANTHROPIC_API_KEY`.
    pub fn from_env(config: LlmConfig) -> Result<Self> {
        let api_key = std::env::var("ANTHROPIC_API_KEY").map_err(|_| LlmError::MissingApiKey)?;
        Ok(Self::new(api_key, config))
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Send one user message and return the joined text blocks.
    pub async fn complete(&self, system: &str, user: &str, max_tokens: u32) -> Result<String> {
        let request = MessagesRequest {
            model: &self.config.model,
            max_tokens,
            system,
            messages: vec![ChatMessage {
                role: "user",
                content: user,
            }],
        };

        let url = format!("{}/messages", self.config.base_url.trim_end_matches('/'));
        debug!(%url, model = %self.config.model, max_tokens, "Sending completion request");

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            let message = match serde_json::from_str::<ApiErrorBody>(&text) {
                Ok(body) => format!("{}: {}", body.error.error_type, body.error.message),
                Err(_) => text,
            };
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: MessagesResponse = response.json().await?;
        Ok(body
            .content
            .iter()
            .filter(|c| c.block_type == "text")
            .filter_map(|c| c.text.as_deref())
            .collect::<Vec<_>>()
            .join(""))
    }

    /// Raw classifier reply; the caller maps it onto a tag.
    pub async fn classify(&self, query: &str) -> Result<String> {
        self.complete(CLASSIFY_SYSTEM, query, self.config.classify_max_tokens)
            .await
    }

    /// Member-facing summary of the merged documents.
    pub async fn summarize(
        &self,
        query: &str,
        context: ContextTag,
        docs: &[Document],
        prompt_text: Option<&str>,
    ) -> Result<String> {
        let user = summary_request(query, context, docs, prompt_text)?;
        self.complete(SUMMARIZE_SYSTEM, &user, self.config.summarize_max_tokens)
            .await
    }
}

/// The prompt template, when present, replaces the default framing.
fn summary_request(
    query: &str,
    context: ContextTag,
    docs: &[Document],
    prompt_text: Option<&str>,
) -> Result<String> {
    let docs_text = serde_json::to_string_pretty(docs)?;
    Ok(match prompt_text.filter(|p| !p.is_empty()) {
        Some(prompt) => format!("{prompt}\n\nAvailable resources:\n{docs_text}"),
        None => format!(
            "Member query: {query}\nContext: {context}\nAvailable resources: {docs_text}\n\n\
             Please provide a helpful response for this member."
        ),
    })
}
