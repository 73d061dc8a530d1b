//! API route handlers.
//!
//! All endpoints return JSON. State is shared via `Arc<ServerState>`. The
//! caller's tier is resolved from the `x-client-key` header by the
//! [`Caller`] extractor before any handler body runs.

use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Path, Query, State},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::access::{AccessError, Feature, KeyCounts, TierGate};
use crate::data::synthetic::{PastResults, SearchHit, SearchKind, SubjectAnalysis, SyntheticFeed};
use crate::data::RacecardSource;
use crate::engine::enricher;
use crate::llm::{AnalysisRequest, Analyst};
use crate::types::{FeedSource, RaceDetail, RaceFeed, Tier};

/// Header carrying the caller's credential.
pub const CLIENT_KEY_HEADER: &str = "x-client-key";

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

/// Shared state accessible by all route handlers. Read-only after startup.
pub struct ServerState {
    pub gate: TierGate,
    pub source: Arc<dyn RacecardSource>,
    pub analyst: Arc<dyn Analyst>,
    pub synthetic: SyntheticFeed,
    pub racing_configured: bool,
    pub llm_configured: bool,
}

pub type AppState = Arc<ServerState>;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Everything a handler can fail with, mapped onto HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Access(#[from] AccessError),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    /// A racing provider or LLM call failed.
    #[error(transparent)]
    Upstream(#[from] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ApiError::Access(AccessError::Unrecognised) => {
                (StatusCode::UNAUTHORIZED, json!({ "error": "PAYWALL_LOCKED" }))
            }
            ApiError::Access(AccessError::Locked { tier, required, .. }) => (
                StatusCode::FORBIDDEN,
                json!({
                    "error": self.to_string(),
                    "locked": true,
                    "tier": tier,
                    "required": required,
                }),
            ),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, json!({ "error": msg })),
            ApiError::Upstream(e) => {
                error!(error = %format!("{e:#}"), "Upstream call failed");
                (StatusCode::BAD_GATEWAY, json!({ "error": format!("{e:#}") }))
            }
        };
        (status, Json(body)).into_response()
    }
}

// ---------------------------------------------------------------------------
// Caller extraction
// ---------------------------------------------------------------------------

/// The authenticated caller of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub tier: Tier,
}

impl Caller {
    /// Reject the request unless the caller's tier unlocks `feature`.
    pub fn require(&self, feature: Feature) -> Result<(), ApiError> {
        TierGate::require(self.tier, feature).map_err(|e| {
            debug!(tier = %self.tier, feature = ?feature, "Feature locked for caller");
            ApiError::from(e)
        })
    }
}

#[async_trait]
impl FromRequestParts<AppState> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let credential = parts
            .headers
            .get(CLIENT_KEY_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .unwrap_or_default();

        match state.gate.authorize(credential) {
            Ok(tier) => Ok(Caller { tier }),
            Err(e) => {
                warn!(path = %parts.uri.path(), "Rejected unrecognised client key");
                Err(e.into())
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
pub struct UpcomingParams {
    pub date: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub service: &'static str,
    pub version: &'static str,
    pub auth_enabled: bool,
    pub keys: KeyCounts,
    pub racing_configured: bool,
    pub openai_configured: bool,
    pub racecard_source: String,
    pub analyst: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    pub source: FeedSource,
    pub results: Vec<SearchHit>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BrainResponse {
    pub ok: bool,
    pub answer: String,
    pub analyst: String,
}

// ---------------------------------------------------------------------------
// Route handlers
// ---------------------------------------------------------------------------

/// GET /api/health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        ok: true,
        service: "paddock",
        version: env!("CARGO_PKG_VERSION"),
        auth_enabled: !state.gate.is_open(),
        keys: state.gate.key_counts(),
        racing_configured: state.racing_configured,
        openai_configured: state.llm_configured,
        racecard_source: state.source.name().to_string(),
        analyst: state.analyst.name().to_string(),
    })
}

/// GET /api/racing/upcoming?date=YYYY-MM-DD
pub async fn upcoming(
    State(state): State<AppState>,
    caller: Caller,
    Query(params): Query<UpcomingParams>,
) -> Result<Json<RaceFeed>, ApiError> {
    caller.require(Feature::Racecards)?;

    let date = params.date.map(|d| d.trim().to_string()).filter(|d| !d.is_empty());
    if let Some(date) = &date {
        NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .map_err(|_| ApiError::BadRequest(format!("Invalid date '{date}', expected YYYY-MM-DD")))?;
    }

    let mut feed = state.source.fetch_upcoming(date).await?;
    enricher::enrich_in_place(&mut feed.races);
    Ok(Json(feed))
}

/// GET /api/racing/race/:race_id/standard
///
/// A provider failure degrades to a stand-in card labelled `fallback`.
pub async fn race_detail(
    State(state): State<AppState>,
    caller: Caller,
    Path(race_id): Path<String>,
) -> Result<Json<RaceDetail>, ApiError> {
    caller.require(Feature::Racecards)?;

    let mut detail = match state.source.fetch_race(race_id.clone()).await {
        Ok(Some(detail)) => detail,
        Ok(None) => return Err(ApiError::NotFound("No racing data available".to_string())),
        Err(e) => {
            warn!(race_id = %race_id, error = %format!("{e:#}"), "Racecard detail failed, serving fallback card");
            state.synthetic.fallback_card(&race_id)
        }
    };
    enricher::enrich_race(&mut detail.race);
    Ok(Json(detail))
}

/// GET /api/racing/results
pub async fn results(State(state): State<AppState>, caller: Caller) -> Result<Json<PastResults>, ApiError> {
    caller.require(Feature::Results)?;

    let today = Utc::now().date_naive();
    let yesterday = today.pred_opt().unwrap_or(today);
    let mut results = state.synthetic.results(yesterday);
    enricher::enrich_in_place(&mut results.races);
    Ok(Json(results))
}

/// GET /api/racing/search?q=...&type=all|horse|jockey|trainer
pub async fn search(
    State(state): State<AppState>,
    caller: Caller,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, ApiError> {
    caller.require(Feature::Search)?;

    let kind = SearchKind::parse(params.kind.as_deref());
    Ok(Json(SearchResponse {
        source: FeedSource::Synthetic,
        results: state.synthetic.search(&params.q, kind),
    }))
}

/// GET /api/racing/analysis/:kind/:id
pub async fn analysis(
    State(state): State<AppState>,
    caller: Caller,
    Path((kind, id)): Path<(String, String)>,
) -> Result<Json<SubjectAnalysis>, ApiError> {
    caller.require(Feature::Analysis)?;
    Ok(Json(state.synthetic.analysis(&kind, &id)))
}

/// POST /api/brain/analyse
pub async fn brain(
    State(state): State<AppState>,
    caller: Caller,
    Json(request): Json<AnalysisRequest>,
) -> Result<Json<BrainResponse>, ApiError> {
    caller.require(Feature::Brain)?;

    let answer = state.analyst.analyse(&request).await?;
    Ok(Json(BrainResponse {
        ok: true,
        answer,
        analyst: state.analyst.name().to_string(),
    }))
}

/// Fallback for unknown paths.
pub async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "NOT_FOUND" })))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
