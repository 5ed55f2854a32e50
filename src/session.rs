//! Session context
//!
//! Explicit per-user state handed to each handler: chat log, credentials,
//! active tab and the pending research query. The chat log is append-only.

use crate::models::{ChatRole, ChatTurn};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ActiveTab {
    #[default]
    Research,
    Chatbot,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionContext {
    pub session_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub active_tab: ActiveTab,
    /// Last research query, e.g. filled from an example button
    pub query: String,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    messages: Vec<ChatTurn>,
}

impl SessionContext {
    pub fn new(session_id: Uuid) -> Self {
        Self {
            session_id,
            created_at: Utc::now(),
            active_tab: ActiveTab::default(),
            query: String::new(),
            api_key: None,
            messages: Vec::new(),
        }
    }

    pub fn push_turn(&mut self, role: ChatRole, content: impl Into<String>) -> &ChatTurn {
        self.messages.push(ChatTurn::new(role, content));
        &self.messages[self.messages.len() - 1]
    }

    pub fn messages(&self) -> &[ChatTurn] {
        &self.messages
    }

    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    /// Remember a key for later calls; blank keys are ignored.
    pub fn set_api_key(&mut self, key: &str) {
        let key = key.trim();
        if !key.is_empty() {
            self.api_key = Some(key.to_string());
        }
    }
}
