//! Configuration loading from TOML with environment variable resolution.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs. Every
//! section has defaults, so a missing file yields a working development
//! setup. Secrets (provider tokens, LLM keys) are referenced by env-var name
//! in the config and resolved at runtime via `std::env::var`. Access-tier
//! key lists can be overridden from the environment.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::info;

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub access: AccessConfig,
    pub racing: RacingConfig,
    pub llm: LlmConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: 3000 }
    }
}

/// Credential allow-lists, one per tier. `legacy_keys` are treated as
/// low tier. No non-blank key in any list means open (development) mode;
/// the tier gate decides that after trimming.
#[derive(Debug, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct AccessConfig {
    pub top_keys: Vec<String>,
    pub mid_keys: Vec<String>,
    pub low_keys: Vec<String>,
    pub legacy_keys: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RacingConfig {
    /// Env var holding the provider base URL. Unset means no provider.
    pub base_url_env: String,
    /// Overrides the default `/v1/racecards/basic?...` path when set.
    pub upcoming_path: Option<String>,
    pub region_codes: String,
    pub limit: Option<u32>,
    pub bearer_token_env: String,
    pub username_env: String,
    pub password_env: String,
    pub timeout_secs: u64,
    /// Serve clearly labelled synthetic racecards when no provider is set.
    pub synthetic_when_unconfigured: bool,
}

impl Default for RacingConfig {
    fn default() -> Self {
        Self {
            base_url_env: "RACING_BASE_URL".to_string(),
            upcoming_path: None,
            region_codes: "gb,ire".to_string(),
            limit: None,
            bearer_token_env: "RACING_BEARER_TOKEN".to_string(),
            username_env: "RACING_USERNAME".to_string(),
            password_env: "RACING_PASSWORD".to_string(),
            timeout_secs: 15,
            synthetic_when_unconfigured: false,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LlmConfig {
    pub api_key_env: String,
    pub model: String,
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key_env: "OPENAI_API_KEY".to_string(),
            model: "gpt-4o-mini".to_string(),
            timeout_secs: 30,
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        let config: AppConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {path}"))?;
        Ok(config)
    }

    /// Load from `path` if it exists, otherwise fall back to defaults.
    /// Environment overrides are applied in both cases.
    pub fn load_or_default(path: &str) -> Result<Self> {
        let config = if Path::new(path).exists() {
            Self::load(path)?
        } else {
            info!(path, "No config file found, using defaults");
            Self::default()
        };
        Ok(config.with_env_overrides(|name| std::env::var(name).ok()))
    }

    /// Apply `PORT`, `TIER_*_KEYS`, `CLIENT_KEYS`, `RACING_*` and
    /// `OPENAI_MODEL` overrides using the given lookup. Blank or
    /// unparseable values leave the configured setting alone.
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup("PORT").and_then(|p| p.trim().parse().ok()) {
            self.server.port = port;
        }
        if let Some(keys) = lookup("TIER_TOP_KEYS") {
            self.access.top_keys = split_keys(&keys);
        }
        if let Some(keys) = lookup("TIER_MID_KEYS") {
            self.access.mid_keys = split_keys(&keys);
        }
        if let Some(keys) = lookup("TIER_LOW_KEYS") {
            self.access.low_keys = split_keys(&keys);
        }
        if let Some(keys) = lookup("CLIENT_KEYS") {
            self.access.legacy_keys = split_keys(&keys);
        }
        if let Some(path) = non_blank(lookup("RACING_UPCOMING_PATH")) {
            self.racing.upcoming_path = Some(path);
        }
        if let Some(regions) = non_blank(lookup("RACING_REGION_CODES")) {
            self.racing.region_codes = regions;
        }
        if let Some(limit) = non_blank(lookup("RACING_LIMIT")).and_then(|l| l.parse().ok()) {
            self.racing.limit = Some(limit);
        }
        if let Some(model) = non_blank(lookup("OPENAI_MODEL")) {
            self.llm.model = model;
        }
        self
    }

    /// Resolve an environment variable name to its value, treating unset
    /// and blank as absent. Used for secrets referenced in the config.
    pub fn optional_env(env_name: &str) -> Option<String> {
        non_blank(std::env::var(env_name).ok())
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Split a comma-separated key list, dropping blanks.
pub fn split_keys(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(String::from)
        .collect()
}
