//! HTTP API end to end: tier gate, racecard source and analyst wired the
//! way the binary wires them.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

use paddock::access::TierGate;
use paddock::api::build_router;
use paddock::api::routes::{ServerState, CLIENT_KEY_HEADER};
use paddock::config::AppConfig;
use paddock::data::synthetic::SyntheticFeed;
use paddock::data::RacecardSource;
use paddock::llm::heuristic::HeuristicAnalyst;

use crate::static_source::{ascot_card, StaticSource};

fn app_with(source: Arc<dyn RacecardSource>) -> axum::Router {
    let env = [
        ("TIER_TOP_KEYS", "plat-1"),
        ("TIER_MID_KEYS", "gold-1"),
        ("CLIENT_KEYS", "legacy-1"),
    ];
    let cfg = AppConfig::default().with_env_overrides(|name| {
        env.iter().find(|(k, _)| *k == name).map(|(_, v)| v.to_string())
    });

    build_router(Arc::new(ServerState {
        gate: TierGate::new(&cfg.access),
        source,
        analyst: Arc::new(HeuristicAnalyst),
        synthetic: SyntheticFeed,
        racing_configured: true,
        llm_configured: false,
    }))
}

async fn send(app: axum::Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let body = axum::body::to_bytes(resp.into_body(), 200_000).await.unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

fn get(uri: &str, key: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(CLIENT_KEY_HEADER, key)
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn test_legacy_key_reads_enriched_racecards() {
    let source = StaticSource::new(ascot_card());
    let dates = source.requested_dates();
    let app = app_with(Arc::new(source));

    let (status, json) = send(app, get("/api/racing/upcoming?date=2026-10-19", "legacy-1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["source"], "provider");

    let runners = json["races"][0]["runners"].as_array().unwrap();
    assert_eq!(runners.len(), 3);
    assert_eq!(runners[0]["analysis_stats"]["win_percentage"], "33.3%");
    assert!(runners.iter().all(|r| r["weather_pref"].is_string()));

    assert_eq!(*dates.lock().unwrap(), vec![Some("2026-10-19".to_string())]);
}

#[tokio::test]
async fn test_legacy_key_is_low_tier() {
    let app = app_with(Arc::new(StaticSource::new(ascot_card())));
    let (status, json) = send(app, get("/api/racing/results", "legacy-1")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["required"], "mid");
}

#[tokio::test]
async fn test_tier_ladder() {
    let cases = [
        ("/api/racing/results", "gold-1", StatusCode::OK),
        ("/api/racing/search?q=star", "gold-1", StatusCode::FORBIDDEN),
        ("/api/racing/search?q=star", "plat-1", StatusCode::OK),
        ("/api/racing/analysis/jockey/j1", "gold-1", StatusCode::FORBIDDEN),
        ("/api/racing/analysis/jockey/j1", "pro-user-7", StatusCode::OK),
        ("/api/racing/upcoming", "stranger", StatusCode::UNAUTHORIZED),
    ];
    for (uri, key, expected) in cases {
        let app = app_with(Arc::new(StaticSource::new(ascot_card())));
        let (status, _) = send(app, get(uri, key)).await;
        assert_eq!(status, expected, "{uri} with {key}");
    }
}

#[tokio::test]
async fn test_failing_provider_surfaces_as_bad_gateway() {
    let app = app_with(Arc::new(StaticSource::failing("provider timed out")));
    let (status, json) = send(app, get("/api/racing/upcoming", "plat-1")).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(json["error"].as_str().unwrap().contains("provider timed out"));
}

#[tokio::test]
async fn test_race_detail_by_id() {
    let app = || app_with(Arc::new(StaticSource::new(ascot_card())));

    let (status, json) = send(app(), get("/api/racing/race/asc-2/standard", "legacy-1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["source"], "provider");
    assert_eq!(json["race"]["time"], "15:05");
    assert!(json["race"]["runners"][2]["analysis_stats"]["ae_index"].is_number());

    let (status, json) = send(app(), get("/api/racing/race/nope/standard", "legacy-1")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "No racing data available");

    let failing = app_with(Arc::new(StaticSource::failing("provider timed out")));
    let (status, json) = send(failing, get("/api/racing/race/asc-1/standard", "plat-1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["source"], "fallback");
}

#[tokio::test]
async fn test_brain_tips_from_fetched_card() {
    let races = serde_json::to_value(ascot_card()).unwrap();
    let body = serde_json::json!({
        "sport": "horse-racing",
        "query": "each way tip for 14:30",
        "data": { "races": races }
    });
    let req = Request::builder()
        .method("POST")
        .uri("/api/brain/analyse")
        .header(header::CONTENT_TYPE, "application/json")
        .header(CLIENT_KEY_HEADER, "legacy-1")
        .body(Body::from(body.to_string()))
        .unwrap();

    let (status, json) = send(app_with(Arc::new(StaticSource::new(Vec::new()))), req).await;
    assert_eq!(status, StatusCode::OK);
    let answer = json["answer"].as_str().unwrap();
    assert!(answer.contains("Comet"));
    assert!(answer.ends_with("🤖"));
}

#[tokio::test]
async fn test_health_reports_wiring() {
    let app = app_with(Arc::new(StaticSource::new(Vec::new())));
    let req = Request::builder().uri("/api/health").body(Body::empty()).unwrap();
    let (status, json) = send(app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["auth_enabled"], true);
    assert_eq!(json["racing_configured"], true);
    assert_eq!(json["openai_configured"], false);
    assert_eq!(json["racecard_source"], "static");
    assert_eq!(json["keys"]["legacy"], 1);
}
