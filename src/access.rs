//! Tier gate.
//!
//! Maps a caller's credential to a subscription [`Tier`] and decides which
//! features that tier may use. The allow-lists are loaded once at startup
//! into an immutable [`TierGate`] and shared read-only across requests.
//!
//! Feature matrix:
//!
//! | Feature    | Required tier |
//! |------------|---------------|
//! | Search     | top           |
//! | Analysis   | top           |
//! | Results    | mid           |
//! | Racecards  | low           |
//! | Brain      | low           |

use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use tracing::{info, warn};

use crate::config::AccessConfig;
use crate::types::Tier;

/// Credentials with this prefix are always top tier.
pub const PRO_PREFIX: &str = "pro-user-";

// ---------------------------------------------------------------------------
// Features
// ---------------------------------------------------------------------------

/// A gated capability of the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Feature {
    Racecards,
    Results,
    Search,
    Analysis,
    Brain,
}

impl Feature {
    pub fn required_tier(&self) -> Tier {
        match self {
            Feature::Search | Feature::Analysis => Tier::Top,
            Feature::Results => Tier::Mid,
            Feature::Racecards | Feature::Brain => Tier::Low,
        }
    }

    /// How the feature is named in upgrade prompts.
    pub fn label(&self) -> &'static str {
        match self {
            Feature::Racecards => "Racecards",
            Feature::Results => "Past Results",
            Feature::Search => "Search features",
            Feature::Analysis => "AI Analysis",
            Feature::Brain => "the Analytics Engine",
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Plans that unlock a feature requiring `required`, e.g. "Gold/Platinum".
fn plans_from(required: &Tier) -> String {
    [Tier::Low, Tier::Mid, Tier::Top]
        .iter()
        .filter(|t| *t >= required)
        .map(|t| t.plan_name())
        .collect::<Vec<_>>()
        .join("/")
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Why a caller was turned away.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccessError {
    /// The credential is on no list.
    #[error("PAYWALL_LOCKED")]
    Unrecognised,

    /// The caller is known but their tier is too low for the feature.
    #[error("Upgrade to {} for {}", plans_from(.required), .feature.label())]
    Locked {
        feature: Feature,
        tier: Tier,
        required: Tier,
    },
}

// ---------------------------------------------------------------------------
// Gate
// ---------------------------------------------------------------------------

/// Key counts per list, for startup logs and the health endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct KeyCounts {
    pub top: usize,
    pub mid: usize,
    pub low: usize,
    pub legacy: usize,
}

/// Immutable credential → tier lookup.
#[derive(Debug, Clone)]
pub struct TierGate {
    top: HashSet<String>,
    mid: HashSet<String>,
    low: HashSet<String>,
    legacy: HashSet<String>,
}

impl TierGate {
    pub fn new(config: &AccessConfig) -> Self {
        let collect = |keys: &[String]| -> HashSet<String> {
            keys.iter()
                .map(|k| k.trim())
                .filter(|k| !k.is_empty())
                .map(String::from)
                .collect()
        };
        let gate = Self {
            top: collect(&config.top_keys),
            mid: collect(&config.mid_keys),
            low: collect(&config.low_keys),
            legacy: collect(&config.legacy_keys),
        };

        if gate.is_open() {
            warn!("No access keys configured, running in open mode (every caller gets top tier)");
        } else {
            let counts = gate.key_counts();
            info!(
                top = counts.top,
                mid = counts.mid,
                low = counts.low,
                legacy = counts.legacy,
                "Tier gate enabled"
            );
        }
        gate
    }

    /// True when no allow-list is configured (development mode).
    pub fn is_open(&self) -> bool {
        self.top.is_empty() && self.mid.is_empty() && self.low.is_empty() && self.legacy.is_empty()
    }

    pub fn key_counts(&self) -> KeyCounts {
        KeyCounts {
            top: self.top.len(),
            mid: self.mid.len(),
            low: self.low.len(),
            legacy: self.legacy.len(),
        }
    }

    /// Resolve a credential to its tier. Highest matching tier wins.
    pub fn authorize(&self, credential: &str) -> Result<Tier, AccessError> {
        if self.is_open() {
            return Ok(Tier::Top);
        }
        if credential.starts_with(PRO_PREFIX) || self.top.contains(credential) {
            return Ok(Tier::Top);
        }
        if self.mid.contains(credential) {
            return Ok(Tier::Mid);
        }
        if self.low.contains(credential) || self.legacy.contains(credential) {
            return Ok(Tier::Low);
        }
        Err(AccessError::Unrecognised)
    }

    /// Check an already-resolved tier against a feature.
    pub fn require(tier: Tier, feature: Feature) -> Result<(), AccessError> {
        let required = feature.required_tier();
        if tier >= required {
            Ok(())
        } else {
            Err(AccessError::Locked {
                feature,
                tier,
                required,
            })
        }
    }

    /// Resolve a credential and check it against a feature in one step.
    pub fn authorize_feature(&self, credential: &str, feature: Feature) -> Result<Tier, AccessError> {
        let tier = self.authorize(credential)?;
        Self::require(tier, feature)?;
        Ok(tier)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
