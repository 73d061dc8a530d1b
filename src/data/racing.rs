//! Racing data provider.
//!
//! Fetches upcoming racecards from a configurable HTTP racing API. By
//! default the request targets `/v1/racecards/basic` with region codes,
//! an optional date and an optional limit; a custom path can replace it.
//! Single racecards come from `/v1/racecards/{race_id}/standard`.
//!
//! Auth: bearer token or HTTP basic auth, both optional. Basic auth wins
//! when both are configured.
//!
//! Some provider plans reject the `limit` query parameter. When the error
//! body says so, the request is retried once without it.

use anyhow::{Context, Result};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::{Client, RequestBuilder, Url};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::{debug, info, warn};

use super::{races_from_payload, RacecardSource};
use crate::config::{AppConfig, RacingConfig};
use crate::types::{FeedSource, Race, RaceDetail, RaceFeed};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

const DEFAULT_UPCOMING_PATH: &str = "/v1/racecards/basic";

static LIMIT_REJECTED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)unrecogni[sz]ed\s+query\s+parameter,?\s*limit").expect("valid regex")
});

enum ProviderAuth {
    None,
    Bearer(SecretString),
    Basic {
        username: String,
        password: SecretString,
    },
}

impl ProviderAuth {
    fn apply(&self, request: RequestBuilder) -> RequestBuilder {
        match self {
            ProviderAuth::None => request,
            ProviderAuth::Bearer(token) => request.bearer_auth(token.expose_secret()),
            ProviderAuth::Basic { username, password } => {
                request.basic_auth(username, Some(password.expose_secret()))
            }
        }
    }

    fn label(&self) -> &'static str {
        match self {
            ProviderAuth::None => "none",
            ProviderAuth::Bearer(_) => "bearer",
            ProviderAuth::Basic { .. } => "basic",
        }
    }
}

// ---------------------------------------------------------------------------
// Provider
// ---------------------------------------------------------------------------

pub struct RacingApiProvider {
    http: Client,
    base_url: String,
    upcoming_path: Option<String>,
    region_codes: String,
    limit: Option<u32>,
    auth: ProviderAuth,
}

impl RacingApiProvider {
    pub fn new(base_url: &str, config: &RacingConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("PADDOCK/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build racing HTTP client")?;

        Ok(Self {
            http,
            base_url: base_url.trim().trim_end_matches('/').to_string(),
            upcoming_path: config
                .upcoming_path
                .as_deref()
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(String::from),
            region_codes: config.region_codes.trim().to_string(),
            limit: config.limit,
            auth: ProviderAuth::None,
        })
    }

    /// Build a provider from config, or `None` when the base URL env var
    /// is unset.
    pub fn from_config(config: &RacingConfig) -> Result<Option<Self>> {
        let Some(base_url) = AppConfig::optional_env(&config.base_url_env) else {
            return Ok(None);
        };

        let mut provider = Self::new(&base_url, config)?;
        let username = AppConfig::optional_env(&config.username_env);
        let password = AppConfig::optional_env(&config.password_env);
        let token = AppConfig::optional_env(&config.bearer_token_env);

        provider.auth = match (username, password, token) {
            (Some(username), Some(password), _) => ProviderAuth::Basic {
                username,
                password: SecretString::new(password),
            },
            (_, _, Some(token)) => ProviderAuth::Bearer(SecretString::new(token)),
            _ => ProviderAuth::None,
        };

        info!(
            base_url = %provider.base_url,
            auth = provider.auth.label(),
            custom_path = provider.upcoming_path.is_some(),
            "Racing provider configured"
        );
        Ok(Some(provider))
    }

    /// Full URL for the upcoming-races request.
    fn upcoming_url(&self, date: Option<&str>) -> String {
        let path = match &self.upcoming_path {
            Some(path) => path.clone(),
            None => {
                let mut params = Vec::new();
                if !self.region_codes.is_empty() {
                    params.push(format!("region_codes={}", urlencoding::encode(&self.region_codes)));
                }
                if let Some(date) = date.map(str::trim).filter(|d| !d.is_empty()) {
                    params.push(format!("date={}", urlencoding::encode(date)));
                }
                if let Some(limit) = self.limit {
                    params.push(format!("limit={limit}"));
                }
                if params.is_empty() {
                    DEFAULT_UPCOMING_PATH.to_string()
                } else {
                    format!("{DEFAULT_UPCOMING_PATH}?{}", params.join("&"))
                }
            }
        };
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Full URL for one racecard's standard detail.
    fn race_url(&self, race_id: &str) -> String {
        format!(
            "{}/v1/racecards/{}/standard",
            self.base_url,
            urlencoding::encode(race_id.trim())
        )
    }

    async fn get_json(&self, url: &str) -> Result<std::result::Result<Value, String>> {
        let response = self
            .auth
            .apply(self.http.get(url))
            .send()
            .await
            .context("Racing provider request failed")?;

        let status = response.status();
        if status.is_success() {
            let body: Value = response
                .json()
                .await
                .context("Failed to parse racing provider response")?;
            return Ok(Ok(body));
        }

        let error_text = response.text().await.unwrap_or_default();
        Ok(Err(format!("HTTP {status}: {error_text}")))
    }
}

/// Drop the `limit` query parameter, keeping everything else.
fn without_limit(url: &str) -> Result<String> {
    let mut parsed = Url::parse(url).with_context(|| format!("Invalid provider URL: {url}"))?;
    let kept: Vec<(String, String)> = parsed
        .query_pairs()
        .filter(|(key, _)| key != "limit")
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    if kept.is_empty() {
        parsed.set_query(None);
    } else {
        parsed.query_pairs_mut().clear().extend_pairs(kept);
    }
    Ok(parsed.to_string())
}

fn rejects_limit(error: &str) -> bool {
    LIMIT_REJECTED.is_match(error)
}

#[async_trait]
impl RacecardSource for RacingApiProvider {
    fn name(&self) -> &str {
        "provider"
    }

    async fn fetch_upcoming(&self, date: Option<String>) -> Result<RaceFeed> {
        let url = self.upcoming_url(date.as_deref());
        debug!(url = %url, "Fetching upcoming racecards");

        let payload = match self.get_json(&url).await? {
            Ok(payload) => payload,
            Err(error) if rejects_limit(&error) => {
                warn!("Provider rejected limit parameter, retrying without it");
                let retry_url = without_limit(&url)?;
                match self.get_json(&retry_url).await? {
                    Ok(payload) => payload,
                    Err(error) => anyhow::bail!("Racing provider error: {error}"),
                }
            }
            Err(error) => anyhow::bail!("Racing provider error: {error}"),
        };

        let races = races_from_payload(&payload);
        info!(count = races.len(), "Fetched upcoming races from provider");

        Ok(RaceFeed {
            source: FeedSource::Provider,
            races,
        })
    }

    async fn fetch_race(&self, race_id: String) -> Result<Option<RaceDetail>> {
        let url = self.race_url(&race_id);
        debug!(url = %url, "Fetching racecard detail");

        let payload = match self.get_json(&url).await? {
            Ok(payload) => payload,
            Err(error) => anyhow::bail!("Racing provider error: {error}"),
        };

        let mut race: Race = serde_json::from_value(payload)
            .context("Racing provider returned a racecard that is not an object")?;
        if race.id.is_empty() {
            race.id = race_id;
        }
        info!(race_id = %race.id, runners = race.runners.len(), "Fetched racecard detail");

        Ok(Some(RaceDetail {
            source: FeedSource::Provider,
            race,
        }))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(config: RacingConfig) -> RacingApiProvider {
        RacingApiProvider::new("https://api.example.com/", &config).unwrap()
    }

    #[test]
    fn test_default_upcoming_url() {
        let p = provider(RacingConfig::default());
        assert_eq!(
            p.upcoming_url(None),
            "https://api.example.com/v1/racecards/basic?region_codes=gb%2Cire"
        );
    }

    #[test]
    fn test_upcoming_url_with_date_and_limit() {
        let p = provider(RacingConfig {
            limit: Some(20),
            ..Default::default()
        });
        assert_eq!(
            p.upcoming_url(Some("2026-10-19")),
            "https://api.example.com/v1/racecards/basic?region_codes=gb%2Cire&date=2026-10-19&limit=20"
        );
    }

    #[test]
    fn test_custom_path_replaces_default() {
        let p = provider(RacingConfig {
            upcoming_path: Some("racecards/free?day=today".into()),
            ..Default::default()
        });
        assert_eq!(p.upcoming_url(Some("2026-10-19")), "https://api.example.com/racecards/free?day=today");
    }

    #[test]
    fn test_empty_region_codes() {
        let p = provider(RacingConfig {
            region_codes: "  ".into(),
            ..Default::default()
        });
        assert_eq!(p.upcoming_url(None), "https://api.example.com/v1/racecards/basic");
    }

    #[test]
    fn test_race_url_encodes_id() {
        let p = provider(RacingConfig::default());
        assert_eq!(p.race_url("rac_123"), "https://api.example.com/v1/racecards/rac_123/standard");
        assert_eq!(p.race_url("a/b c"), "https://api.example.com/v1/racecards/a%2Fb%20c/standard");
    }

    #[test]
    fn test_without_limit() {
        let url = "https://api.example.com/v1/racecards/basic?region_codes=gb%2Cire&limit=20";
        let stripped = without_limit(url).unwrap();
        assert!(!stripped.contains("limit"));
        assert!(stripped.contains("region_codes=gb%2Cire"));

        let only_limit = without_limit("https://api.example.com/x?limit=5").unwrap();
        assert_eq!(only_limit, "https://api.example.com/x");
    }

    #[test]
    fn test_rejects_limit() {
        assert!(rejects_limit(
            r#"HTTP 422 Unprocessable Entity: {"detail":"Unrecognised query parameter, limit"}"#
        ));
        assert!(rejects_limit("unrecognized query parameter limit"));
        assert!(!rejects_limit("HTTP 401 Unauthorized"));
    }

    #[test]
    fn test_auth_labels() {
        assert_eq!(provider(RacingConfig::default()).auth.label(), "none");
        assert_eq!(ProviderAuth::Bearer(SecretString::new("t".into())).label(), "bearer");
    }

    #[test]
    fn test_unset_base_url_yields_none() {
        let config = RacingConfig {
            base_url_env: "PADDOCK_TEST_UNSET_RACING_URL".into(),
            ..Default::default()
        };
        assert!(RacingApiProvider::from_config(&config).unwrap().is_none());
    }
}
