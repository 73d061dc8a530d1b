//! Shared types for PADDOCK.
//!
//! These types form the data model used across all modules. Runner and
//! race records mirror the racecard JSON shape that providers send, with
//! every optional provider field modelled as an explicit `Option`.

use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;

// ---------------------------------------------------------------------------
// Runner
// ---------------------------------------------------------------------------

/// Win%, A/E and P/L figures attached to a runner.
///
/// Providers sometimes send only some of the three; missing figures stay
/// `None` until the enricher completes them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisStats {
    /// Percent string, e.g. "33.3%".
    #[serde(
        default,
        alias = "winPercentage",
        deserialize_with = "lenient_opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub win_percentage: Option<String>,
    /// Actual/Expected ratio. >1 means the runner beats its price.
    #[serde(
        default,
        alias = "aeIndex",
        deserialize_with = "lenient_opt_f64",
        skip_serializing_if = "Option::is_none"
    )]
    pub ae_index: Option<f64>,
    #[serde(
        default,
        alias = "profitLoss",
        deserialize_with = "lenient_opt_f64",
        skip_serializing_if = "Option::is_none"
    )]
    pub profit_loss: Option<f64>,
}

impl AnalysisStats {
    pub fn new(win_percentage: impl Into<String>, ae_index: f64, profit_loss: f64) -> Self {
        AnalysisStats {
            win_percentage: Some(win_percentage.into()),
            ae_index: Some(ae_index),
            profit_loss: Some(profit_loss),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.win_percentage.is_some() && self.ae_index.is_some() && self.profit_loss.is_some()
    }

    /// Take each missing figure from `fallback`, keeping the ones present.
    pub fn complete_from(&mut self, fallback: AnalysisStats) {
        if self.win_percentage.is_none() {
            self.win_percentage = fallback.win_percentage;
        }
        if self.ae_index.is_none() {
            self.ae_index = fallback.ae_index;
        }
        if self.profit_loss.is_none() {
            self.profit_loss = fallback.profit_loss;
        }
    }
}

impl fmt::Display for AnalysisStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "win={}", self.win_percentage.as_deref().unwrap_or("-"))?;
        match self.ae_index {
            Some(ae) => write!(f, " A/E={ae:.2}")?,
            None => write!(f, " A/E=-")?,
        }
        match self.profit_loss {
            Some(pl) => write!(f, " P/L={pl:+.2}"),
            None => write!(f, " P/L=-"),
        }
    }
}

/// A single runner on a racecard.
///
/// `name` is the identity key. Everything else may be absent; the
/// enricher fills gaps without touching fields the provider supplied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Runner {
    #[serde(default, alias = "horse", deserialize_with = "lenient_text")]
    pub name: String,
    #[serde(
        default,
        deserialize_with = "lenient_opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub jockey: Option<String>,
    /// Fractional ("5/2"), decimal ("3.5") or a sentinel ("Evs", "SP").
    #[serde(
        default,
        deserialize_with = "lenient_opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub odds: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub form: Option<String>,
    /// Finishing position, only present on results.
    #[serde(
        default,
        deserialize_with = "lenient_opt_u32",
        skip_serializing_if = "Option::is_none"
    )]
    pub position: Option<u32>,
    #[serde(
        default,
        alias = "analysisStats",
        deserialize_with = "lenient_stats",
        skip_serializing_if = "Option::is_none"
    )]
    pub analysis_stats: Option<AnalysisStats>,
    #[serde(
        default,
        alias = "trackStat",
        deserialize_with = "lenient_opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub track_stat: Option<String>,
    #[serde(
        default,
        alias = "conditionsPref",
        deserialize_with = "lenient_opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub conditions_pref: Option<String>,
    #[serde(
        default,
        alias = "jockeyStat",
        deserialize_with = "lenient_opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub jockey_stat: Option<String>,
    #[serde(
        default,
        alias = "weatherPref",
        deserialize_with = "lenient_opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub weather_pref: Option<String>,
    #[serde(
        default,
        alias = "lastRuns",
        deserialize_with = "lenient_opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_runs: Option<String>,
    /// Provider fields with no typed counterpart (trainer, draw, ...),
    /// passed through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Runner {
    /// Shorthand for a runner with just a name and a price.
    pub fn new(name: impl Into<String>, odds: Option<&str>) -> Self {
        Runner {
            name: name.into(),
            odds: odds.map(String::from),
            ..Default::default()
        }
    }

    /// Price as shown to users ("SP" when no price is known).
    pub fn odds_label(&self) -> &str {
        self.odds.as_deref().unwrap_or("SP")
    }

    /// A/E index, if analysis stats are attached.
    pub fn ae_index(&self) -> Option<f64> {
        self.analysis_stats.as_ref().and_then(|s| s.ae_index)
    }
}

impl fmt::Display for Runner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.odds_label())?;
        if let Some(jockey) = &self.jockey {
            write!(f, " [{jockey}]")?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Race
// ---------------------------------------------------------------------------

/// A race with its runners in declared (racecard) order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Race {
    #[serde(default, alias = "race_id", deserialize_with = "lenient_text")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub course: String,
    /// Off time, "HH:MM".
    #[serde(default, alias = "off_time", deserialize_with = "lenient_text")]
    pub time: String,
    #[serde(
        default,
        deserialize_with = "lenient_opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub going: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub surface: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub weather: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub status: Option<String>,
    #[serde(default, alias = "runner_details", deserialize_with = "lenient_runners")]
    pub runners: Vec<Runner>,
    /// Provider fields with no typed counterpart (race_name, distance, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Race {
    pub fn new(id: impl Into<String>, course: impl Into<String>, time: impl Into<String>) -> Self {
        Race {
            id: id.into(),
            course: course.into(),
            time: time.into(),
            ..Default::default()
        }
    }

    pub fn with_runners(mut self, runners: Vec<Runner>) -> Self {
        self.runners = runners;
        self
    }

    /// Course name, or a neutral placeholder when the feed left it blank.
    pub fn course_label(&self) -> &str {
        if self.course.is_empty() {
            "the track"
        } else {
            &self.course
        }
    }
}

impl fmt::Display for Race {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} ({} runners)",
            self.time,
            self.course_label(),
            self.runners.len(),
        )
    }
}

/// Where a batch of races came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedSource {
    /// A configured racing data provider.
    Provider,
    /// Locally generated illustrative cards.
    Synthetic,
    /// No provider configured and synthetic mode off.
    Offline,
    /// Stand-in card served when the provider failed a detail request.
    Fallback,
}

impl fmt::Display for FeedSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedSource::Provider => write!(f, "provider"),
            FeedSource::Synthetic => write!(f, "synthetic"),
            FeedSource::Offline => write!(f, "offline"),
            FeedSource::Fallback => write!(f, "fallback"),
        }
    }
}

/// A set of races plus the provenance label callers need to tell real
/// cards from simulated ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceFeed {
    pub source: FeedSource,
    pub races: Vec<Race>,
}

impl RaceFeed {
    pub fn offline() -> Self {
        RaceFeed {
            source: FeedSource::Offline,
            races: Vec::new(),
        }
    }
}

/// One racecard in full, with its provenance label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceDetail {
    pub source: FeedSource,
    pub race: Race,
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Subscription tier. Ordering follows access level: `Low < Mid < Top`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Low,
    Mid,
    Top,
}

impl Tier {
    /// Marketing name shown in upgrade prompts.
    pub fn plan_name(&self) -> &'static str {
        match self {
            Tier::Top => "Platinum",
            Tier::Mid => "Gold",
            Tier::Low => "Silver",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tier::Top => write!(f, "top"),
            Tier::Mid => write!(f, "mid"),
            Tier::Low => write!(f, "low"),
        }
    }
}

/// What a free-text racing query is asking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Intent {
    Schedule,
    WinTip,
    PlaceTip,
    JockeyInfo,
    Greeting,
    Generic,
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Intent::Schedule => write!(f, "schedule"),
            Intent::WinTip => write!(f, "win-tip"),
            Intent::PlaceTip => write!(f, "place-tip"),
            Intent::JockeyInfo => write!(f, "jockey-info"),
            Intent::Greeting => write!(f, "greeting"),
            Intent::Generic => write!(f, "generic"),
        }
    }
}

/// Sport named on an analysis request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Sport {
    HorseRacing,
    Football,
    Other(String),
}

impl fmt::Display for Sport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sport::HorseRacing => write!(f, "horse-racing"),
            Sport::Football => write!(f, "football"),
            Sport::Other(name) => write!(f, "{name}"),
        }
    }
}

/// Case-insensitive; unknown names are kept verbatim as `Sport::Other`.
impl std::str::FromStr for Sport {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_lowercase().as_str() {
            "horse-racing" | "horse racing" | "racing" | "horses" => Sport::HorseRacing,
            "football" | "soccer" => Sport::Football,
            "" => Sport::Other("unknown".to_string()),
            _ => Sport::Other(s.trim().to_string()),
        })
    }
}

// ---------------------------------------------------------------------------
// Lenient field decoding
// ---------------------------------------------------------------------------

// Every field decoder here degrades instead of failing: a value of the
// wrong shape becomes absent (or empty) rather than rejecting the race.

/// Providers are inconsistent about quoting numbers; accept either form.
#[derive(Deserialize)]
#[serde(untagged)]
enum Loose {
    Number(serde_json::Number),
    Text(String),
    Other(IgnoredAny),
}

impl Loose {
    fn into_text(self) -> Option<String> {
        match self {
            Loose::Number(n) => Some(n.to_string()),
            Loose::Text(s) => Some(s),
            Loose::Other(_) => None,
        }
    }

    fn into_f64(self) -> Option<f64> {
        match self {
            Loose::Number(n) => n.as_f64(),
            Loose::Text(s) => s
                .trim()
                .trim_start_matches('+')
                .trim_end_matches('%')
                .parse()
                .ok(),
            Loose::Other(_) => None,
        }
    }
}

fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Loose::deserialize(deserializer)?.into_text().unwrap_or_default())
}

fn lenient_opt_text<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    Ok(Loose::deserialize(deserializer)?.into_text())
}

fn lenient_opt_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    Ok(Loose::deserialize(deserializer)?.into_f64())
}

fn lenient_opt_u32<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
    Ok(Loose::deserialize(deserializer)?
        .into_f64()
        .filter(|n| n.fract() == 0.0 && (0.0..=u32::MAX as f64).contains(n))
        .map(|n| n as u32))
}

/// Partial stats are kept for the enricher to complete; an empty or
/// malformed block counts as absent.
fn lenient_stats<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<AnalysisStats>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value::<AnalysisStats>(value)
        .ok()
        .filter(|stats| *stats != AnalysisStats::default()))
}

/// Keeps every runner entry that is an object, whatever its field shapes.
fn lenient_runners<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Runner>, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Array(items) => Ok(items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect()),
        _ => Ok(Vec::new()),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
