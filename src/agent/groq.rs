//! Groq chat-completions client
//!
//! Runs an agent profile against Groq's OpenAI-compatible endpoint.
//! Uses a long-lived reqwest::Client for connection pooling.

use crate::agent::{AgentKind, AgentProfile, ResearchAgent};
use crate::config::Config;
use crate::error::ResearchError;
use crate::models::AgentResponse;
use crate::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{error, info};

/// Reusable Groq client (connection-pooled)
pub struct GroqAgent {
    client: Client,
    model: String,
    base_url: String,
}

impl GroqAgent {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(8)
            .timeout(config.agent_timeout)
            .build()?;

        Ok(Self {
            client,
            model: config.model.clone(),
            base_url: config.base_url.clone(),
        })
    }

    fn build_request(&self, profile: &AgentProfile, query: &str) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![
                Message {
                    role: "system".to_string(),
                    content: profile.system_prompt(),
                },
                Message {
                    role: "user".to_string(),
                    content: query.to_string(),
                },
            ],
            temperature: 0.3,
            max_tokens: 4096,
        }
    }
}

#[async_trait]
impl ResearchAgent for GroqAgent {
    async fn run(&self, kind: AgentKind, query: &str, api_key: &str) -> Result<AgentResponse> {
        if api_key.trim().is_empty() {
            return Err(ResearchError::MissingApiKey);
        }

        let profile = AgentProfile::for_kind(kind);
        let request = self.build_request(profile, query);

        info!(agent = profile.name, model = %self.model, "Calling Groq API");

        let response = self
            .client
            .post(&self.base_url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!("Groq API request failed: {}", e);
                ResearchError::Upstream(format!("Groq API error: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            error!("Groq API error response ({}): {}", status, error_text);
            return Err(ResearchError::Upstream(format!(
                "Groq API returned {}: {}",
                status, error_text
            )));
        }

        let completion: ChatCompletionResponse = response.json().await.map_err(|e| {
            error!("Failed to parse Groq response: {}", e);
            ResearchError::Upstream(format!("Groq parse error: {}", e))
        })?;

        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();

        info!(
            agent = profile.name,
            chars = content.len(),
            tokens = completion.usage.map(|u| u.total_tokens).unwrap_or(0),
            "Groq response received"
        );

        Ok(AgentResponse {
            content,
            model: completion.model,
        })
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<Message>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    model: Option<String>,
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    total_tokens: u32,
}
