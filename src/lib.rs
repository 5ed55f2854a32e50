//! Financial Research Agent
//!
//! A financial research service that:
//! - Forwards questions to a hosted LLM agent team (stock data + web search)
//! - Extracts pipe-delimited markdown tables from the agent's answer
//! - Renders each table as a grid and exports it as CSV
//! - Keeps an append-only chat log per session
//!
//! RESEARCH FLOW:
//! QUERY → AGENT → MARKDOWN → EXTRACT TABLES → RENDER / EXPORT

pub mod agent;
pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod research;
pub mod session;
pub mod store;
pub mod tables;

pub use error::Result;

// Re-export common types
pub use models::*;
pub use tables::{extract_tables, Table, TableCollection};
