//! Racecard sources.
//!
//! Defines the `RacecardSource` trait and its implementations: a real
//! racing data provider, a labelled synthetic feed, and the offline feed
//! used when neither is configured.

pub mod racing;
pub mod synthetic;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::types::{Race, RaceDetail, RaceFeed};

/// Abstraction over where upcoming racecards come from.
///
/// Implementors return races as the provider sent them. Enrichment happens
/// downstream so every source is treated the same.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RacecardSource: Send + Sync {
    /// Short identifier for logs and the health endpoint.
    fn name(&self) -> &str;

    /// Fetch upcoming races, optionally for a specific `YYYY-MM-DD` date.
    async fn fetch_upcoming(&self, date: Option<String>) -> Result<RaceFeed>;

    /// Fetch one racecard in full. `Ok(None)` means this source has no
    /// card for the id.
    async fn fetch_race(&self, race_id: String) -> Result<Option<RaceDetail>>;
}

/// Source used when no provider is configured and synthetic mode is off.
pub struct OfflineFeed;

#[async_trait]
impl RacecardSource for OfflineFeed {
    fn name(&self) -> &str {
        "offline"
    }

    async fn fetch_upcoming(&self, _date: Option<String>) -> Result<RaceFeed> {
        debug!("No racing provider configured, returning empty feed");
        Ok(RaceFeed::offline())
    }

    async fn fetch_race(&self, race_id: String) -> Result<Option<RaceDetail>> {
        debug!(race_id = %race_id, "No racing provider configured, no racecard detail");
        Ok(None)
    }
}

/// Keys providers use for the race array, in lookup order.
const RACE_ARRAY_KEYS: &[&str] = &["races", "racecards", "race_cards"];

/// Pull races out of a loosely-shaped JSON payload.
///
/// Accepts a bare array or an object carrying one of `races`, `racecards`
/// or `race_cards`. Field decoding is lenient, so only entries that are not
/// JSON objects are skipped.
pub fn races_from_payload(payload: &Value) -> Vec<Race> {
    let entries = match payload {
        Value::Array(items) => items.as_slice(),
        Value::Object(map) => RACE_ARRAY_KEYS
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_array))
            .map(Vec::as_slice)
            .unwrap_or_default(),
        _ => &[],
    };

    entries
        .iter()
        .filter_map(|entry| match serde_json::from_value::<Race>(entry.clone()) {
            Ok(race) => Some(race),
            Err(e) => {
                debug!(error = %e, "Skipping undecodable race entry");
                None
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
