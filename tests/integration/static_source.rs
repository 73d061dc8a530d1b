//! Static racecard source for integration testing.
//!
//! Provides a deterministic `RacecardSource` that returns a fixed set of
//! races (or a forced error) and records the dates it was asked for, all
//! in-memory with no network access.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use paddock::data::RacecardSource;
use paddock::types::{FeedSource, Race, RaceDetail, RaceFeed, Runner};

pub struct StaticSource {
    races: Vec<Race>,
    requested_dates: Arc<Mutex<Vec<Option<String>>>>,
    /// If set, every fetch fails with this message.
    force_error: Option<String>,
}

impl StaticSource {
    pub fn new(races: Vec<Race>) -> Self {
        Self {
            races,
            requested_dates: Arc::new(Mutex::new(Vec::new())),
            force_error: None,
        }
    }

    pub fn failing(msg: &str) -> Self {
        Self {
            force_error: Some(msg.to_string()),
            ..Self::new(Vec::new())
        }
    }

    /// Handle for inspecting requested dates after the source is moved.
    pub fn requested_dates(&self) -> Arc<Mutex<Vec<Option<String>>>> {
        Arc::clone(&self.requested_dates)
    }
}

#[async_trait]
impl RacecardSource for StaticSource {
    fn name(&self) -> &str {
        "static"
    }

    async fn fetch_upcoming(&self, date: Option<String>) -> Result<RaceFeed> {
        self.requested_dates.lock().unwrap().push(date);
        if let Some(msg) = &self.force_error {
            return Err(anyhow!("{msg}"));
        }
        Ok(RaceFeed {
            source: FeedSource::Provider,
            races: self.races.clone(),
        })
    }

    async fn fetch_race(&self, race_id: String) -> Result<Option<RaceDetail>> {
        if let Some(msg) = &self.force_error {
            return Err(anyhow!("{msg}"));
        }
        Ok(self
            .races
            .iter()
            .find(|race| race.id == race_id)
            .cloned()
            .map(|race| RaceDetail {
                source: FeedSource::Provider,
                race,
            }))
    }
}

/// The Ascot card used across tests: Star 2/1, Nova 5/1, Comet 10/1.
pub fn ascot_card() -> Vec<Race> {
    vec![
        Race::new("asc-1", "Ascot", "14:30").with_runners(vec![
            Runner::new("Star", Some("2/1")),
            Runner::new("Nova", Some("5/1")),
            Runner::new("Comet", Some("10/1")),
        ]),
        Race::new("asc-2", "Ascot", "15:05").with_runners(vec![
            Runner::new("Quill", Some("Evs")),
            Runner::new("Harbour", Some("7/2")),
            Runner::new("Drift", None),
        ]),
    ]
}
