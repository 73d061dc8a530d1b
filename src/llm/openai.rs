//! OpenAI chat-completions analyst.
//!
//! Sends the query, its context and the client's data to the Chat
//! Completions API under a fixed analytics system prompt. Context and data
//! are serialized compactly and capped at 6000 characters each.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info, warn};

use super::{AnalysisRequest, Analyst};
use crate::config::{AppConfig, LlmConfig};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";
const TEMPERATURE: f32 = 0.2;
const MAX_PAYLOAD_CHARS: usize = 6000;

const MAX_RETRIES: u32 = 2;
const BASE_BACKOFF_MS: u64 = 1000;

const SYSTEM_PROMPT_LINES: &[&str] = &[
    "You are the PADDOCK Sport Analytics Engine.",
    "No personality. No jokes. No fluff.",
    "Use the provided context and current request to reason. Do not mention training data cutoffs or limitations.",
    "If context is insufficient, state clearly what additional data is needed instead of refusing.",
];

const SYSTEM_PROMPT_TAIL: &[&str] = &[
    "Output must be concise and actionable.",
    "Always include a short risk note and remind that outcomes are uncertain.",
    "If asked for gambling advice, provide analytics only and include a responsible gambling reminder.",
];

// ---------------------------------------------------------------------------
// API types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    temperature: f32,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    #[serde(default)]
    message: Option<ChatMessage>,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

pub struct OpenAiAnalyst {
    http: Client,
    api_key: SecretString,
    model: String,
    total_calls: AtomicU64,
}

impl OpenAiAnalyst {
    pub fn new(api_key: SecretString, config: &LlmConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build OpenAI HTTP client")?;

        Ok(Self {
            http,
            api_key,
            model: config.model.clone(),
            total_calls: AtomicU64::new(0),
        })
    }

    /// Build the analyst when the configured key env var is set.
    pub fn from_config(config: &LlmConfig) -> Result<Option<Self>> {
        match AppConfig::optional_env(&config.api_key_env) {
            Some(key) => {
                let analyst = Self::new(SecretString::new(key), config)?;
                info!(model = %analyst.model, "OpenAI analyst configured");
                Ok(Some(analyst))
            }
            None => Ok(None),
        }
    }

    pub fn total_calls(&self) -> u64 {
        self.total_calls.load(Ordering::Relaxed)
    }

    async fn call_api(&self, system: &str, user_message: &str) -> Result<String> {
        let request = ChatRequest {
            model: self.model.clone(),
            temperature: TEMPERATURE,
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: user_message.to_string(),
                },
            ],
        };

        let mut last_error = None;

        for attempt in 0..=MAX_RETRIES {
            if attempt > 0 {
                let delay = BASE_BACKOFF_MS * 2u64.pow(attempt - 1);
                tokio::time::sleep(std::time::Duration::from_millis(delay)).await;
            }

            let resp = self
                .http
                .post(OPENAI_API_URL)
                .bearer_auth(self.api_key.expose_secret())
                .json(&request)
                .send()
                .await;

            match resp {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        let body: ChatResponse = response
                            .json()
                            .await
                            .context("Failed to parse OpenAI response")?;
                        self.total_calls.fetch_add(1, Ordering::Relaxed);

                        return Ok(body
                            .choices
                            .into_iter()
                            .next()
                            .and_then(|c| c.message)
                            .map(|m| m.content)
                            .unwrap_or_default());
                    }

                    if status.as_u16() == 429 || status.is_server_error() {
                        let error_text = response.text().await.unwrap_or_default();
                        warn!(status = %status, attempt, "Retryable OpenAI error");
                        last_error = Some(format!("HTTP {status}: {error_text}"));
                        continue;
                    }

                    let error_text = response.text().await.unwrap_or_default();
                    anyhow::bail!("OpenAI API error {status}: {error_text}");
                }
                Err(e) if e.is_timeout() => {
                    anyhow::bail!("OpenAI request timed out: {e}");
                }
                Err(e) => {
                    last_error = Some(format!("Request error: {e}"));
                    continue;
                }
            }
        }

        anyhow::bail!(
            "OpenAI API failed after {MAX_RETRIES} retries: {}",
            last_error.unwrap_or_default()
        )
    }
}

/// System prompt stamped with the current time.
pub fn system_prompt(now: DateTime<Utc>) -> String {
    let stamp = format!(
        "Current date/time: {}.",
        now.to_rfc3339_opts(SecondsFormat::Millis, true)
    );
    let mut parts: Vec<&str> = SYSTEM_PROMPT_LINES.to_vec();
    parts.push(&stamp);
    parts.extend_from_slice(SYSTEM_PROMPT_TAIL);
    parts.join(" ")
}

/// User message: sport, query, then compact context and data.
pub fn user_prompt(request: &AnalysisRequest) -> String {
    format!(
        "Sport: {}\nQuery: {}\nContext: {}\nData: {}",
        request.sport.as_deref().filter(|s| !s.is_empty()).unwrap_or("unknown"),
        request.query(),
        compact(&request.context),
        compact(&request.data),
    )
}

/// Compact JSON capped at [`MAX_PAYLOAD_CHARS`]. Null becomes `{}`.
fn compact(value: &Value) -> String {
    let json = if value.is_null() {
        "{}".to_string()
    } else {
        value.to_string()
    };
    match json.char_indices().nth(MAX_PAYLOAD_CHARS) {
        Some((cut, _)) => json[..cut].to_string(),
        None => json,
    }
}

#[async_trait]
impl Analyst for OpenAiAnalyst {
    async fn analyse(&self, request: &AnalysisRequest) -> Result<String> {
        let system = system_prompt(Utc::now());
        let user_msg = user_prompt(request);

        debug!(model = %self.model, sport = %request.sport(), "OpenAI analysis");

        self.call_api(&system, &user_msg).await
    }

    fn name(&self) -> &str {
        &self.model
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_client_construction() {
        let analyst = OpenAiAnalyst::new(SecretString::new("test-key".to_string()), &LlmConfig::default()).unwrap();
        assert_eq!(analyst.name(), "gpt-4o-mini");
        assert_eq!(analyst.total_calls(), 0);
    }

    #[test]
    fn test_client_custom_model() {
        let config = LlmConfig {
            model: "gpt-4o".into(),
            ..Default::default()
        };
        let analyst = OpenAiAnalyst::new(SecretString::new("key".to_string()), &config).unwrap();
        assert_eq!(analyst.name(), "gpt-4o");
    }

    #[test]
    fn test_system_prompt_is_stamped() {
        let now = Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap();
        let prompt = system_prompt(now);
        assert!(prompt.starts_with("You are the PADDOCK Sport Analytics Engine."));
        assert!(prompt.contains("Current date/time: 2026-10-19T12:00:00.000Z."));
        assert!(prompt.ends_with("responsible gambling reminder."));
    }

    #[test]
    fn test_user_prompt_layout() {
        let request = AnalysisRequest::new("football", "who wins?").with_data(json!({ "k": 1 }));
        assert_eq!(
            user_prompt(&request),
            "Sport: football\nQuery: who wins?\nContext: {}\nData: {\"k\":1}"
        );

        let empty = AnalysisRequest::default();
        assert!(user_prompt(&empty).starts_with("Sport: unknown\nQuery: \n"));
    }

    #[test]
    fn test_payload_is_truncated() {
        let long = Value::String("x".repeat(10_000));
        assert_eq!(compact(&long).chars().count(), MAX_PAYLOAD_CHARS);
        assert_eq!(compact(&json!([1, 2])), "[1,2]");
    }

    #[test]
    fn test_unset_key_yields_none() {
        let config = LlmConfig {
            api_key_env: "PADDOCK_TEST_UNSET_OPENAI_KEY".into(),
            ..Default::default()
        };
        assert!(OpenAiAnalyst::from_config(&config).unwrap().is_none());
    }
}
