pub mod cli;
pub mod client;
pub mod config;
pub mod context;
pub mod docs;
pub mod llm;
pub mod mcp;
pub mod pipeline;
pub mod relay;
pub mod report;
