//! Agent collaborator
//!
//! The hosted LLM agent is opaque: given a query and credentials it returns
//! markdown text or fails. Everything downstream consumes only
//! [`AgentResponse::content`].

use crate::error::ResearchError;
use crate::models::AgentResponse;
use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Mutex;

pub mod groq;
pub mod profiles;

pub use groq::GroqAgent;
pub use profiles::{AgentProfile, ToolKind};

/// Which configured agent to run
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    /// Financial analyst + market researcher team
    ResearchTeam,
    /// Conversational assistant with both tools
    Chatbot,
}

/// Trait for the hosted agent (LLM controlled)
#[async_trait]
pub trait ResearchAgent: Send + Sync {
    async fn run(&self, kind: AgentKind, query: &str, api_key: &str) -> Result<AgentResponse>;
}

/// Scripted agent for development & testing.
/// Replays queued answers in order, then fails.
#[derive(Default)]
pub struct ScriptedAgent {
    answers: Mutex<VecDeque<Result<String>>>,
}

impl ScriptedAgent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_answer(self, content: impl Into<String>) -> Self {
        self.push(Ok(content.into()));
        self
    }

    pub fn with_failure(self, message: impl Into<String>) -> Self {
        self.push(Err(ResearchError::Upstream(message.into())));
        self
    }

    fn push(&self, answer: Result<String>) {
        if let Ok(mut answers) = self.answers.lock() {
            answers.push_back(answer);
        }
    }
}

#[async_trait]
impl ResearchAgent for ScriptedAgent {
    async fn run(&self, _kind: AgentKind, _query: &str, _api_key: &str) -> Result<AgentResponse> {
        let next = self
            .answers
            .lock()
            .map_err(|_| ResearchError::Upstream("scripted agent poisoned".to_string()))?
            .pop_front();

        match next {
            Some(answer) => answer.map(|content| AgentResponse {
                content,
                model: Some("scripted".to_string()),
            }),
            None => Err(ResearchError::Upstream("no scripted answer left".to_string())),
        }
    }
}
