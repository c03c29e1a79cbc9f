//! Console rendering of routing runs and peer listings.

use crate::docs::{Category, Document};
use crate::mcp::{PromptContent, Tool};
use crate::pipeline::RouteReport;
use serde_json::Value;
use std::fmt;

const RULE_WIDTH: usize = 60;
const PREVIEW_CHARS: usize = 200;

fn rule() -> String {
    "=".repeat(RULE_WIDTH)
}

fn banner(f: &mut fmt::Formatter<'_>, title: &str) -> fmt::Result {
    writeln!(f, "{}\n{}\n{}", rule(), title, rule())
}

fn preview(text: &str, max_chars: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

fn doc_lines(f: &mut fmt::Formatter<'_>, docs: &[Document]) -> fmt::Result {
    for doc in docs {
        writeln!(f, "  - {}", doc.name)?;
        writeln!(f, "    {}", doc.link().unwrap_or("N/A"))?;
    }
    Ok(())
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

/// Step-by-step view of a routing run followed by the summary block.
pub struct RouteView<'a>(pub &'a RouteReport);

impl fmt::Display for RouteView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.0;

        banner(f, "Context")?;
        writeln!(f, "Member query: {}", report.query)?;
        writeln!(f, "Detected context: '{}'", report.context)?;

        banner(f, "Prompt")?;
        writeln!(f, "{} message(s)", report.prompt_messages.len())?;
        for msg in &report.prompt_messages {
            let text = match &msg.content {
                PromptContent::Text { text } => text.as_str(),
                PromptContent::Other => "",
            };
            writeln!(f, "  Role    : {}", msg.role)?;
            writeln!(f, "  Content : {}", preview(text, PREVIEW_CHARS))?;
        }

        banner(f, "Curated resource documents")?;
        doc_lines(f, &report.curated)?;

        banner(f, &format!("Tool documents filtered by '{}'", report.context))?;
        doc_lines(f, &report.filtered)?;

        banner(f, "Merged documents")?;
        writeln!(
            f,
            "{} ({} curated + {} additional)",
            report.merged.docs.len(),
            report.merged.curated,
            report.merged.additional
        )?;
        doc_lines(f, &report.merged.docs)?;

        if let Some(summary) = &report.summary {
            banner(f, "Response to member")?;
            writeln!(f, "{summary}")?;
        }

        writeln!(f)?;
        banner(f, "SUMMARY")?;
        writeln!(f, "  Member Query    : {}", report.query)?;
        writeln!(f, "  Context         : {}", report.context)?;
        writeln!(f, "  Tool docs total : {}", report.tool_docs.len())?;
        writeln!(f, "  Filtered docs   : {}", report.filtered.len())?;
        writeln!(f, "  Resource docs   : {}", report.curated.len())?;
        writeln!(f, "  Final merged    : {}", report.merged.docs.len())?;
        writeln!(f, "  Prompt messages : {}", report.prompt_messages.len())?;
        writeln!(f, "{}", rule())
    }
}

/// Tool names with their input and output schemas.
pub struct ToolsView<'a>(pub &'a [Tool]);

impl fmt::Display for ToolsView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total tools found: {}\n", self.0.len())?;
        for tool in self.0 {
            writeln!(f, "Tool: {}", tool.name)?;
            writeln!(
                f,
                "  Description: {}",
                tool.description.as_deref().unwrap_or("N/A")
            )?;
            writeln!(f, "  Input Schema:  {}", pretty(&tool.input_schema))?;
            let output = tool
                .output_schema
                .as_ref()
                .map(pretty)
                .unwrap_or_else(|| "NOT DEFINED".to_string());
            writeln!(f, "  Output Schema: {output}\n")?;
        }
        Ok(())
    }
}

/// Categories of the document tool with their document names.
pub struct CategoriesView<'a>(pub &'a [Category]);

impl fmt::Display for CategoriesView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Parsed {} category/categories:\n", self.0.len())?;
        for category in self.0 {
            writeln!(f, "  Title:   {}", category.title.as_deref().unwrap_or(""))?;
            writeln!(
                f,
                "  Summary: {}",
                preview(category.summary.as_deref().unwrap_or(""), 80)
            )?;
            writeln!(f, "  Docs:    {} documents", category.docs.len())?;
            for doc in &category.docs {
                writeln!(f, "    - {}", doc.name)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
