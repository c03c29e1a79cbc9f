//! Context routing - classify, gather documents from the MCP peer, merge, summarize.

use crate::client::McpClient;
use crate::config::Config;
use crate::context::{Classifier, ContextTag};
use crate::docs::{self, Document, Merged};
use crate::llm::LlmClient;
use crate::mcp::PromptMessage;
use serde_json::json;
use std::collections::HashMap;
use tracing::{info, warn};

/// Everything one routing run produced.
#[derive(Debug, Clone, Default)]
pub struct RouteReport {
    pub query: String,
    pub context: ContextTag,
    pub prompt_messages: Vec<PromptMessage>,
    pub prompt_text: Option<String>,
    pub curated: Vec<Document>,
    pub tool_docs: Vec<Document>,
    pub filtered: Vec<Document>,
    pub merged: Merged,
    pub summary: Option<String>,
}

pub struct ContextRouter<'a> {
    config: &'a Config,
    client: &'a McpClient,
    classifier: Classifier,
    summarizer: Option<&'a LlmClient>,
}

impl<'a> ContextRouter<'a> {
    pub fn new(config: &'a Config, client: &'a McpClient, classifier: Classifier) -> Self {
        Self {
            config,
            client,
            classifier,
            summarizer: None,
        }
    }

    pub fn with_summarizer(mut self, llm: &'a LlmClient) -> Self {
        self.summarizer = Some(llm);
        self
    }

    /// Run every step in order. Step failures are logged and replaced by empty defaults.
    pub async fn run(&self, query: &str) -> RouteReport {
        let mut report = RouteReport {
            query: query.to_string(),
            ..Default::default()
        };

        let context = self.classifier.classify(query).await;
        report.context = context;

        let (messages, prompt_text) = self.fetch_prompt(query, context).await;
        report.prompt_messages = messages;
        report.prompt_text = prompt_text;

        report.curated = self.fetch_curated(context).await;
        report.tool_docs = self.fetch_dynamic().await;
        report.filtered = docs::filter_by_context(&report.tool_docs, context);
        info!(
            context = %context,
            total = report.tool_docs.len(),
            kept = report.filtered.len(),
            "Filtered tool documents"
        );

        report.merged = docs::merge(&report.curated, &report.filtered);
        info!(
            merged = report.merged.docs.len(),
            curated = report.merged.curated,
            additional = report.merged.additional,
            "Merged documents"
        );

        if let Some(llm) = self.summarizer {
            report.summary = match llm
                .summarize(
                    query,
                    context,
                    &report.merged.docs,
                    report.prompt_text.as_deref(),
                )
                .await
            {
                Ok(text) => Some(text),
                Err(e) => {
                    warn!(error = %e, "Summary generation failed");
                    None
                }
            };
        }

        report
    }

    async fn fetch_prompt(
        &self,
        query: &str,
        context: ContextTag,
    ) -> (Vec<PromptMessage>, Option<String>) {
        let arguments = HashMap::from([
            ("member_query".to_string(), query.to_string()),
            ("context".to_string(), context.to_string()),
        ]);
        match self.client.get_prompt(&self.config.prompt_name, arguments).await {
            Ok(result) => {
                if result.messages.is_empty() {
                    warn!(prompt = %self.config.prompt_name, "Prompt returned no messages");
                }
                let text = result.first_text().map(str::to_string);
                info!(messages = result.messages.len(), "Prompt fetched");
                (result.messages, text)
            }
            Err(e) => {
                warn!(prompt = %self.config.prompt_name, error = %e, "Prompt fetch failed");
                (Vec::new(), None)
            }
        }
    }

    async fn fetch_curated(&self, context: ContextTag) -> Vec<Document> {
        let uri = self.config.resource_uri(context);
        match self.client.read_resource(&uri).await {
            Ok(result) => {
                let docs = docs::docs_from_resource(&result);
                info!(%uri, docs = docs.len(), "Curated documents read");
                docs
            }
            Err(e) => {
                warn!(%uri, error = %e, "Resource read failed");
                Vec::new()
            }
        }
    }

    async fn fetch_dynamic(&self) -> Vec<Document> {
        let tool = &self.config.tool_name;
        match self.client.call_tool(tool, json!({})).await {
            Ok(result) if result.is_error => {
                let reason = result.texts().collect::<Vec<_>>().join("; ");
                warn!(%tool, %reason, "Tool reported an error");
                Vec::new()
            }
            Ok(result) => docs::dynamic_docs(&result),
            Err(e) => {
                warn!(%tool, error = %e, "Tool call failed");
                Vec::new()
            }
        }
    }
}
