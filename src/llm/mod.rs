//! Analysts that answer free-text sport queries.
//!
//! Defines the `Analyst` trait and provides two implementations: the
//! built-in heuristic engine and an OpenAI chat-completions client. The
//! server picks OpenAI when its API key is configured and falls back to
//! the heuristic engine otherwise.

pub mod heuristic;
pub mod openai;

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::data::races_from_payload;
use crate::types::{Race, Sport};

/// Body of an analysis request.
///
/// `context` and `data` are free-form JSON from the client. For horse
/// racing, `data` carries the races in context, either as an array or
/// under a `races` key.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalysisRequest {
    #[serde(default)]
    pub sport: Option<String>,
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub context: Value,
    #[serde(default)]
    pub data: Value,
}

impl AnalysisRequest {
    pub fn new(sport: &str, query: &str) -> Self {
        Self {
            sport: Some(sport.to_string()),
            query: Some(query.to_string()),
            ..Default::default()
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = data;
        self
    }

    pub fn sport(&self) -> Sport {
        // FromStr for Sport is infallible.
        self.sport.as_deref().unwrap_or_default().parse().unwrap_or(Sport::Other("unknown".into()))
    }

    pub fn query(&self) -> &str {
        self.query.as_deref().unwrap_or_default()
    }

    /// Races carried in `data`, undecodable entries dropped.
    pub fn races(&self) -> Vec<Race> {
        races_from_payload(&self.data)
    }
}

/// Abstraction over query answerers.
#[async_trait]
pub trait Analyst: Send + Sync {
    /// Produce a natural-language answer for the request.
    async fn analyse(&self, request: &AnalysisRequest) -> Result<String>;

    /// Identifier for logs and the health endpoint.
    fn name(&self) -> &str;
}
