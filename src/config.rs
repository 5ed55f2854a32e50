//! Environment configuration

use crate::error::ResearchError;
use crate::Result;
use std::collections::HashMap;
use std::env;
use std::time::Duration;

pub const DEFAULT_MODEL: &str = "meta-llama/llama-4-scout-17b-16e-instruct";
pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1/chat/completions";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_AGENT_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_MAX_STORED_REPORTS: usize = 256;

#[derive(Debug, Clone)]
pub struct Config {
    /// Server-side fallback key; requests may bring their own
    pub groq_api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub port: u16,
    pub agent_timeout: Duration,
    pub flush_trailing_tables: bool,
    /// Reports whose CSV exports stay downloadable; oldest evicted first
    pub max_stored_reports: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            groq_api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            port: DEFAULT_PORT,
            agent_timeout: Duration::from_secs(DEFAULT_AGENT_TIMEOUT_SECS),
            flush_trailing_tables: false,
            max_stored_reports: DEFAULT_MAX_STORED_REPORTS,
        }
    }
}

impl Config {
    /// Load `.env` (if present) and read the process environment.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_vars(env::vars().collect())
    }

    pub fn from_vars(vars: HashMap<String, String>) -> Result<Self> {
        let get = |key: &str| {
            vars.get(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let defaults = Self::default();

        let port = match get("PORT").or_else(|| get("API_PORT")) {
            Some(raw) => raw
                .parse()
                .map_err(|_| ResearchError::Config(format!("invalid PORT: {}", raw)))?,
            None => defaults.port,
        };

        let agent_timeout = match get("AGENT_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(raw.parse().map_err(|_| {
                ResearchError::Config(format!("invalid AGENT_TIMEOUT_SECS: {}", raw))
            })?),
            None => defaults.agent_timeout,
        };

        let flush_trailing_tables = match get("FLUSH_TRAILING_TABLES") {
            Some(raw) => parse_bool(&raw).ok_or_else(|| {
                ResearchError::Config(format!("invalid FLUSH_TRAILING_TABLES: {}", raw))
            })?,
            None => defaults.flush_trailing_tables,
        };

        let max_stored_reports = match get("MAX_STORED_REPORTS") {
            Some(raw) => raw
                .parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| ResearchError::Config(format!("invalid MAX_STORED_REPORTS: {}", raw)))?,
            None => defaults.max_stored_reports,
        };

        Ok(Self {
            groq_api_key: get("GROQ_API_KEY"),
            model: get("GROQ_MODEL").unwrap_or(defaults.model),
            base_url: get("GROQ_BASE_URL").unwrap_or(defaults.base_url),
            port,
            agent_timeout,
            flush_trailing_tables,
            max_stored_reports,
        })
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
