//! Command-line interface for bhrouter.

use crate::client::McpClient;
use crate::config::Config;
use crate::context::Classifier;
use crate::docs;
use crate::llm::LlmClient;
use crate::pipeline::ContextRouter;
use crate::{relay, report};
use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use serde_json::json;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "bhrouter")]
#[command(about = "Route member queries to behavioral health resources from an MCP peer")]
#[command(version)]
pub struct Cli {
    /// Config file (defaults to ~/.config/bhrouter/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the MCP peer URL
    #[arg(long, global = true)]
    mcp_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the upstream behavioral health document over HTTP
    Relay {
        /// Address to listen on
        #[arg(long)]
        bind: Option<std::net::SocketAddr>,
    },

    /// Classify a member query and gather matching documents
    Route {
        /// Member query (defaults to the configured sample query)
        query: Option<String>,
        /// Classify with the LLM instead of keywords
        #[arg(long)]
        llm: bool,
        /// Ask the LLM for a member-facing summary
        #[arg(long)]
        summarize: bool,
    },

    /// List the peer's tools with their schemas
    Tools,

    /// Call the document tool and show its categories
    Docs,
}

impl Cli {
    fn load_config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => {
                if !path.exists() {
                    bail!("Config file not found: {}", path.display());
                }
                Config::load_from(path)?
            }
            None => Config::load()?,
        };
        if let Some(url) = &self.mcp_url {
            config.mcp_url = url.clone();
        }
        Ok(config)
    }

    pub async fn run(self) -> Result<()> {
        let mut config = self.load_config()?;

        match self.command {
            Commands::Relay { bind } => {
                if let Some(bind) = bind {
                    config.relay.bind = bind;
                }
                relay::serve(&config.relay).await
            }

            Commands::Route {
                query,
                llm,
                summarize,
            } => {
                let query = query.unwrap_or_else(|| config.member_query.clone());
                let client = McpClient::new(&config.mcp_url);

                let classifier = if llm {
                    Classifier::Llm(
                        LlmClient::from_env(config.llm.clone())
                            .context("LLM classification needs an API key")?,
                    )
                } else {
                    Classifier::Keywords
                };
                let summarizer = if summarize {
                    Some(
                        LlmClient::from_env(config.llm.clone())
                            .context("Summaries need an API key")?,
                    )
                } else {
                    None
                };

                let model = match (&classifier, &summarizer) {
                    (Classifier::Llm(remote), _) => Some(remote.model()),
                    (_, Some(remote)) => Some(remote.model()),
                    _ => None,
                };
                info!(
                    url = %client.url(),
                    model = model.unwrap_or("-"),
                    llm,
                    summarize,
                    "Routing member query"
                );
                let mut router = ContextRouter::new(&config, &client, classifier);
                if let Some(llm) = &summarizer {
                    router = router.with_summarizer(llm);
                }
                let result = router.run(&query).await;
                print!("{}", report::RouteView(&result));
                Ok(())
            }

            Commands::Tools => {
                let client = McpClient::new(&config.mcp_url);
                let tools = client
                    .list_tools()
                    .await
                    .context("Could not list tools")?;
                print!("{}", report::ToolsView(&tools));
                Ok(())
            }

            Commands::Docs => {
                let client = McpClient::new(&config.mcp_url);
                let result = client
                    .call_tool(&config.tool_name, json!({}))
                    .await
                    .with_context(|| format!("Could not call tool '{}'", config.tool_name))?;

                if result.is_error {
                    println!("Tool call failed!");
                    for text in result.texts() {
                        println!("   Error: {}", text);
                    }
                    return Ok(());
                }

                match docs::categories_from_tool_result(&result) {
                    Ok(categories) => print!("{}", report::CategoriesView(&categories)),
                    Err(_) => {
                        println!("Response is plain text (not JSON):");
                        for text in result.texts() {
                            println!("{}", text);
                        }
                    }
                }
                Ok(())
            }
        }
    }
}
