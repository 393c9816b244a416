use serde::Deserialize;
use std::time::Duration;

use crate::services::escalator::EscalationPolicy;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Gemini API key. Requests are refused with a configuration error when absent.
    #[serde(default)]
    pub gemini_api_key: Option<String>,

    /// Gemini API base URL
    #[serde(default = "default_gemini_api_url")]
    pub gemini_api_url: String,

    /// Gemini model name
    #[serde(default = "default_gemini_model")]
    pub gemini_model: String,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Upper bound on a single generation call
    #[serde(default = "default_attempt_timeout_secs")]
    pub attempt_timeout_secs: u64,

    /// Output token budget per generation call
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,

    /// Whether a final "reformat this" attempt is made after two weak attempts
    #[serde(default = "default_repair_attempt")]
    pub repair_attempt: bool,
}

fn default_gemini_api_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_gemini_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_attempt_timeout_secs() -> u64 {
    20
}

fn default_max_output_tokens() -> u32 {
    1000
}

fn default_repair_attempt() -> bool {
    true
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    /// The credential, if one was supplied and is not blank
    pub fn api_key(&self) -> Option<&str> {
        self.gemini_api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }

    /// Escalation parameters derived from this configuration
    pub fn escalation_policy(&self) -> EscalationPolicy {
        EscalationPolicy {
            max_output_tokens: self.max_output_tokens,
            attempt_timeout: Duration::from_secs(self.attempt_timeout_secs),
            repair_enabled: self.repair_attempt,
            ..EscalationPolicy::default()
        }
    }
}
