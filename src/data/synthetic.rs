//! Synthetic racing data.
//!
//! Illustrative racecards, past results, subject analysis and search hits
//! for development and demo deployments. Everything here is a pure
//! function of its inputs, and every synthetic payload is labelled with
//! [`FeedSource::Synthetic`] so it is never mistaken for provider data.

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

use super::RacecardSource;
use crate::types::{AnalysisStats, FeedSource, Race, RaceDetail, RaceFeed, Runner};

/// Prefix carried by every synthetic upcoming race id.
pub const SYNTHETIC_ID_PREFIX: &str = "live-event-";

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

const CARD_COURSES: &[&str] = &["Wolverhampton", "Lingfield", "Newcastle"];
const RESULT_COURSES: &[&str] = &["Kempton", "Ludlow", "Southwell"];

const HORSES: &[&str] = &[
    "Golden Ember",
    "Silent Harbour",
    "Copper Kettle",
    "Northern Lights",
    "Velvet Thunder",
    "Blue Lagoon",
    "Midnight Mariner",
    "Frosty Morning",
    "Iron Duke",
    "Saffron Sky",
    "Harbour Master",
    "Wild Orchid",
];

const JOCKEYS: &[&str] = &[
    "R. Moore",
    "O. Murphy",
    "H. Doyle",
    "T. Marquand",
    "W. Buick",
    "C. Fallon",
];

const ODDS_LADDER: &[&str] = &["2/1", "5/2", "7/2", "9/2", "6/1", "8/1", "12/1", "20/1"];

const UPCOMING_RACES: usize = 6;
const RESULT_RACES: usize = 5;

// ---------------------------------------------------------------------------
// Payload types
// ---------------------------------------------------------------------------

/// A day of finished races.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PastResults {
    pub date: String,
    pub source: FeedSource,
    pub races: Vec<Race>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubjectStats {
    pub win_percentage: String,
    pub ae_index: String,
    pub profit_loss: String,
    pub runs: u32,
    pub wins: u32,
}

/// Performance summary for a horse, jockey or trainer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubjectAnalysis {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub stats: SubjectStats,
    /// Most recent first; 0 means unplaced.
    pub recent_form: Vec<u8>,
    pub source: FeedSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchKind {
    All,
    Horse,
    Jockey,
    Trainer,
}

impl SearchKind {
    /// `None` for kinds the search doesn't know, which match nothing.
    pub fn parse(raw: Option<&str>) -> Option<Self> {
        match raw.map(|s| s.trim().to_lowercase()).as_deref() {
            None | Some("") | Some("all") => Some(SearchKind::All),
            Some("horse") => Some(SearchKind::Horse),
            Some("jockey") => Some(SearchKind::Jockey),
            Some("trainer") => Some(SearchKind::Trainer),
            Some(_) => None,
        }
    }

    fn includes(&self, other: SearchKind) -> bool {
        *self == SearchKind::All || *self == other
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchHit {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub name: String,
    pub id: &'static str,
    pub description: &'static str,
}

// ---------------------------------------------------------------------------
// Feed
// ---------------------------------------------------------------------------

/// Deterministic generator for all synthetic racing data.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyntheticFeed;

impl SyntheticFeed {
    /// Today's illustrative cards. Ids are `live-event-N`.
    pub fn upcoming(&self) -> Vec<Race> {
        (0..UPCOMING_RACES)
            .map(|i| {
                let minutes = 13 * 60 + 30 + 35 * i;
                let mut race = Race::new(
                    format!("{SYNTHETIC_ID_PREFIX}{}", i + 1),
                    CARD_COURSES[i % CARD_COURSES.len()],
                    format!("{:02}:{:02}", minutes / 60, minutes % 60),
                )
                .with_runners(card_runners(i));
                race.going = Some(if i % 2 == 0 { "Standard" } else { "Good to Soft" }.to_string());
                race.status = Some("Scheduled".to_string());
                race
            })
            .collect()
    }

    /// Five finished races at Kempton, Ludlow and Southwell from 13:00,
    /// with finishing positions in price order.
    pub fn results(&self, date: NaiveDate) -> PastResults {
        let races = (0..RESULT_RACES)
            .map(|i| {
                let field = 6 + (i * 7 + 3) % 4;
                let runners = (0..field)
                    .map(|j| Runner {
                        name: format!("Runner {}", (b'A' + j as u8) as char),
                        jockey: Some("J. Doe".to_string()),
                        odds: Some(format!("{}/1", j + 2)),
                        position: Some(j as u32 + 1),
                        ..Default::default()
                    })
                    .collect();

                let mut race = Race::new(
                    format!("res-{i}"),
                    RESULT_COURSES[i % RESULT_COURSES.len()],
                    format!("{}:00", 13 + i),
                )
                .with_runners(runners);
                race.status = Some("Finished".to_string());
                race
            })
            .collect();

        PastResults {
            date: date.format("%Y-%m-%d").to_string(),
            source: FeedSource::Synthetic,
            races,
        }
    }

    /// Stats for a subject, stable for a given `(kind, id)`.
    pub fn analysis(&self, kind: &str, id: &str) -> SubjectAnalysis {
        let h = fnv1a(&format!("{kind}:{id}"));

        let win = 10.0 + (h % 200) as f64 / 10.0;
        let ae = 0.75 + ((h >> 8) % 50) as f64 / 100.0;
        let pl = ((h >> 16) % 400) as f64 / 10.0 - 15.0;
        let runs = 5 + ((h >> 24) % 50) as u32;
        let wins = (1 + ((h >> 32) % 10) as u32).min(runs);
        let recent_form = (0..6).map(|k| ((h >> (40 + 4 * k)) % 10) as u8).collect();

        SubjectAnalysis {
            id: id.to_string(),
            kind: kind.to_string(),
            stats: SubjectStats {
                win_percentage: format!("{win:.1}%"),
                ae_index: format!("{ae:.2}"),
                profit_loss: format!("{pl:.2}"),
                runs,
                wins,
            },
            recent_form,
            source: FeedSource::Synthetic,
        }
    }

    /// Stand-in card for a race the provider couldn't serve. Labelled
    /// [`FeedSource::Fallback`].
    pub fn fallback_card(&self, race_id: &str) -> RaceDetail {
        let runners = vec![
            Runner {
                jockey: Some("J. Smith".to_string()),
                form: Some("111-1".to_string()),
                analysis_stats: Some(AnalysisStats::new("33%", 1.2, 10.0)),
                ..Runner::new("System Restore", Some("Evs"))
            },
            Runner {
                jockey: Some("A. Jones".to_string()),
                form: Some("22-2".to_string()),
                analysis_stats: Some(AnalysisStats::new("10%", 0.9, -5.0)),
                ..Runner::new("Backup Plan", Some("5/1"))
            },
        ];
        RaceDetail {
            source: FeedSource::Fallback,
            race: Race::new(race_id, "Fallback Course", "").with_runners(runners),
        }
    }

    /// Name matches for a free-text query. Queries of one character or
    /// fewer return nothing.
    pub fn search(&self, query: &str, kind: Option<SearchKind>) -> Vec<SearchHit> {
        let q = query.trim().to_lowercase();
        let Some(kind) = kind else {
            return Vec::new();
        };
        if q.chars().count() <= 1 {
            return Vec::new();
        }

        let name = capitalize(&q);
        let mut hits = Vec::new();
        if kind.includes(SearchKind::Horse) {
            hits.push(SearchHit {
                kind: "horse",
                name: format!("{name} Star"),
                id: "h1",
                description: "Active - 5yo Bay Gelding",
            });
            hits.push(SearchHit {
                kind: "horse",
                name: format!("Royal {name}"),
                id: "h2",
                description: "Active - 3yo Chestnut Colt",
            });
        }
        if kind.includes(SearchKind::Jockey) {
            hits.push(SearchHit {
                kind: "jockey",
                name: format!("T. {name}son"),
                id: "j1",
                description: "Professional Jockey",
            });
        }
        if kind.includes(SearchKind::Trainer) {
            hits.push(SearchHit {
                kind: "trainer",
                name: format!("P. {name}er"),
                id: "t1",
                description: "Licensed Trainer",
            });
        }
        hits
    }
}

#[async_trait]
impl RacecardSource for SyntheticFeed {
    fn name(&self) -> &str {
        "synthetic"
    }

    async fn fetch_upcoming(&self, date: Option<String>) -> Result<RaceFeed> {
        debug!(date = ?date, "Serving synthetic racecards");
        Ok(RaceFeed {
            source: FeedSource::Synthetic,
            races: self.upcoming(),
        })
    }

    async fn fetch_race(&self, race_id: String) -> Result<Option<RaceDetail>> {
        let race = self.upcoming().into_iter().find(|race| race.id == race_id);
        debug!(race_id = %race_id, found = race.is_some(), "Serving synthetic racecard detail");
        Ok(race.map(|race| RaceDetail {
            source: FeedSource::Synthetic,
            race,
        }))
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn card_runners(race_index: usize) -> Vec<Runner> {
    let field = 5 + race_index % 4;
    (0..field)
        .map(|j| {
            let mut runner = Runner::new(
                HORSES[(race_index * 5 + j) % HORSES.len()],
                Some(ODDS_LADDER[(j + race_index) % ODDS_LADDER.len()]),
            );
            runner.jockey = Some(JOCKEYS[(race_index + j) % JOCKEYS.len()].to_string());
            // Last runner in odd-numbered races is unpriced.
            if race_index % 2 == 1 && j == field - 1 {
                runner.odds = None;
            }
            runner
        })
        .collect()
}

/// 64-bit FNV-1a.
fn fnv1a(input: &str) -> u64 {
    input.bytes().fold(0xcbf2_9ce4_8422_2325_u64, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(0x0100_0000_01b3)
    })
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upcoming_shape() {
        let races = SyntheticFeed.upcoming();
        assert_eq!(races.len(), UPCOMING_RACES);
        assert_eq!(races[0].id, "live-event-1");
        assert_eq!(races[0].time, "13:30");
        assert_eq!(races[1].time, "14:05");
        assert!(races.iter().all(|r| r.id.starts_with(SYNTHETIC_ID_PREFIX)));
        assert!(races.iter().all(|r| (5..=8).contains(&r.runners.len())));
        // Odd races carry one unpriced runner.
        assert!(races[1].runners.last().unwrap().odds.is_none());
        assert!(races[0].runners.iter().all(|r| r.odds.is_some()));
    }

    #[test]
    fn test_upcoming_is_deterministic() {
        assert_eq!(SyntheticFeed.upcoming(), SyntheticFeed.upcoming());
    }

    #[test]
    fn test_results_shape() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
        let results = SyntheticFeed.results(date);
        assert_eq!(results.date, "2026-10-18");
        assert_eq!(results.source, FeedSource::Synthetic);
        assert_eq!(results.races.len(), 5);

        let ids: Vec<_> = results.races.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["res-0", "res-1", "res-2", "res-3", "res-4"]);
        let courses: Vec<_> = results.races.iter().map(|r| r.course.as_str()).collect();
        assert_eq!(courses, vec!["Kempton", "Ludlow", "Southwell", "Kempton", "Ludlow"]);
        assert_eq!(results.races[4].time, "17:00");

        for race in &results.races {
            assert!((6..=9).contains(&race.runners.len()));
            assert_eq!(race.status.as_deref(), Some("Finished"));
            let first = &race.runners[0];
            assert_eq!(first.name, "Runner A");
            assert_eq!(first.odds.as_deref(), Some("2/1"));
            assert_eq!(first.position, Some(1));
            assert_eq!(first.jockey.as_deref(), Some("J. Doe"));
        }
    }

    #[test]
    fn test_analysis_is_stable_and_bounded() {
        let a = SyntheticFeed.analysis("horse", "h1");
        assert_eq!(a, SyntheticFeed.analysis("horse", "h1"));
        assert_ne!(a.stats, SyntheticFeed.analysis("jockey", "h1").stats);
        assert_eq!(a.kind, "horse");
        assert_eq!(a.recent_form.len(), 6);
        assert!(a.recent_form.iter().all(|p| *p <= 9));
        assert!(a.stats.wins >= 1 && a.stats.wins <= a.stats.runs);
        assert!((5..55).contains(&a.stats.runs));

        let win: f64 = a.stats.win_percentage.trim_end_matches('%').parse().unwrap();
        assert!((10.0..30.0).contains(&win));
        let ae: f64 = a.stats.ae_index.parse().unwrap();
        assert!((0.75..1.25).contains(&ae));
        let pl: f64 = a.stats.profit_loss.parse().unwrap();
        assert!((-15.0..25.0).contains(&pl));
    }

    #[test]
    fn test_search_all() {
        let hits = SyntheticFeed.search("Frankel", SearchKind::parse(None));
        let names: Vec<_> = hits.iter().map(|h| h.name.as_str()).collect();
        assert_eq!(names, vec!["Frankel Star", "Royal Frankel", "T. Frankelson", "P. Frankeler"]);
    }

    #[test]
    fn test_search_filters_by_kind() {
        let hits = SyntheticFeed.search("moore", SearchKind::parse(Some("jockey")));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].kind, "jockey");
        assert_eq!(hits[0].name, "T. Mooreson");
    }

    #[test]
    fn test_search_short_or_unknown() {
        assert!(SyntheticFeed.search("a", Some(SearchKind::All)).is_empty());
        assert!(SyntheticFeed.search("  ", Some(SearchKind::All)).is_empty());
        assert!(SyntheticFeed.search("frankel", SearchKind::parse(Some("owner"))).is_empty());
    }

    #[tokio::test]
    async fn test_fetch_upcoming_is_labelled() {
        let feed = SyntheticFeed.fetch_upcoming(None).await.unwrap();
        assert_eq!(feed.source, FeedSource::Synthetic);
        assert_eq!(feed.races.len(), UPCOMING_RACES);
    }

    #[tokio::test]
    async fn test_fetch_race_by_id() {
        let detail = SyntheticFeed.fetch_race("live-event-2".into()).await.unwrap().unwrap();
        assert_eq!(detail.source, FeedSource::Synthetic);
        assert_eq!(detail.race.time, "14:05");
        assert!(SyntheticFeed.fetch_race("rac_999".into()).await.unwrap().is_none());
    }

    #[test]
    fn test_fallback_card_is_labelled() {
        let detail = SyntheticFeed.fallback_card("rac_1");
        assert_eq!(detail.source, FeedSource::Fallback);
        assert_eq!(detail.race.id, "rac_1");
        assert_eq!(detail.race.course, "Fallback Course");
        let names: Vec<_> = detail.race.runners.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["System Restore", "Backup Plan"]);
    }
}
