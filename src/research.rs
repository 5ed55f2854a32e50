//! Research and chatbot flows
//!
//! Research: QUERY → AGENT TEAM → MARKDOWN → TABLES → REPORT
//! Chatbot:  PROMPT → LOG USER TURN → AGENT → LOG ASSISTANT TURN

use crate::agent::{AgentKind, ResearchAgent};
use crate::error::ResearchError;
use crate::models::{ChatRole, ChatTurn, ExampleQuery, ResearchReport};
use crate::session::{ActiveTab, SessionContext};
use crate::tables::{render_collection, ExtractOptions, TableExtractor};
use crate::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use uuid::Uuid;

pub const NO_CHAT_RESPONSE: &str =
    "I couldn't generate a response. Please try again with a different question.";

pub const EXAMPLE_QUERIES: &[ExampleQuery] = &[
    ExampleQuery {
        title: "Compare Apple & Microsoft",
        help: "Deep dive into both companies' financials",
        query: "Compare Apple and Microsoft financials",
    },
    ExampleQuery {
        title: "Tesla Latest News",
        help: "Get the most recent Tesla developments",
        query: "What are the latest news and developments about Tesla?",
    },
    ExampleQuery {
        title: "S&P 500 Analysis",
        help: "Comprehensive market overview",
        query: "Analyze current S&P 500 trends with key statistics",
    },
    ExampleQuery {
        title: "Banking Sector Trends",
        help: "Analyze the banking industry",
        query: "Analyze current banking sector trends and top performing bank stocks",
    },
    ExampleQuery {
        title: "EV Industry",
        help: "Electric vehicle market analysis",
        query: "Analyze the electric vehicle industry including major automakers and battery companies",
    },
    ExampleQuery {
        title: "Real Estate Stocks",
        help: "REITs and real estate analysis",
        query: "Analyze top performing REITs",
    },
];

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ResearchOptions {
    #[serde(default)]
    pub show_raw_response: bool,
    #[serde(default = "default_true")]
    pub show_tables_separately: bool,
    #[serde(default)]
    pub extract: ExtractOptions,
}

fn default_true() -> bool {
    true
}

impl Default for ResearchOptions {
    fn default() -> Self {
        Self {
            show_raw_response: false,
            show_tables_separately: true,
            extract: ExtractOptions::default(),
        }
    }
}

/// Pick the first non-blank key.
pub fn resolve_api_key<'a>(candidates: &[Option<&'a str>]) -> Option<&'a str> {
    candidates
        .iter()
        .flatten()
        .copied()
        .map(str::trim)
        .find(|k| !k.is_empty())
}

/// Run one research query through the agent team and post-process its
/// answer.
pub async fn run_research(
    agent: &dyn ResearchAgent,
    api_key: Option<&str>,
    query: &str,
    options: &ResearchOptions,
) -> Result<ResearchReport> {
    let query = query.trim();
    if query.is_empty() {
        return Err(ResearchError::EmptyQuery);
    }
    let api_key = resolve_api_key(&[api_key]).ok_or(ResearchError::MissingApiKey)?;

    info!("Running research query: {}", query);

    let response = agent.run(AgentKind::ResearchTeam, query, api_key).await.map_err(|e| {
        error!("Research agent failed: {}", e);
        e
    })?;

    if response.content.trim().is_empty() {
        warn!("Research agent returned no content");
        return Err(ResearchError::Upstream(
            "No response received from the agent. Please try again with a different query."
                .to_string(),
        ));
    }

    let (tables, warnings) = if options.show_tables_separately {
        let extraction = TableExtractor::new(options.extract).extract(&response.content);
        (render_collection(&extraction.tables)?, extraction.warnings)
    } else {
        (None, Vec::new())
    };

    info!(
        tables = tables.as_ref().map(|v| v.sections.len()).unwrap_or(0),
        warnings = warnings.len(),
        "Analysis complete"
    );

    Ok(ResearchReport {
        report_id: Uuid::new_v4(),
        query: query.to_string(),
        raw_response: options.show_raw_response.then(|| response.content.clone()),
        content: response.content,
        tables,
        warnings,
        created_at: Utc::now(),
    })
}

/// One chatbot exchange. The user turn is logged before the agent runs and
/// an assistant turn is always logged after it, carrying the error text if
/// the call failed.
pub async fn chat(
    agent: &dyn ResearchAgent,
    session: &mut SessionContext,
    prompt: &str,
) -> Result<ChatTurn> {
    let prompt = prompt.trim();
    if prompt.is_empty() {
        return Err(ResearchError::EmptyQuery);
    }
    let api_key = session
        .api_key
        .clone()
        .ok_or(ResearchError::MissingApiKey)?;

    session.active_tab = ActiveTab::Chatbot;
    session.push_turn(ChatRole::User, prompt);

    let reply = match agent.run(AgentKind::Chatbot, prompt, &api_key).await {
        Ok(response) if !response.content.trim().is_empty() => response.content,
        Ok(_) => NO_CHAT_RESPONSE.to_string(),
        Err(e) => {
            error!("Chatbot agent failed: {}", e);
            format!("An error occurred: {}", e)
        }
    };

    Ok(session.push_turn(ChatRole::Assistant, reply).clone())
}
