//! Query intent classification.
//!
//! A fixed, ordered rule table maps a lower-cased query to an [`Intent`].
//! The first rule that matches wins. Keywords are anchored at a word start,
//! so "tips" matches `tip` and "times" matches `time`, while two-letter
//! keywords (`hi`, `ew`) must stand alone so "this" or "news" do not fire.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::types::Intent;

// ---------------------------------------------------------------------------
// Rule table
// ---------------------------------------------------------------------------

struct IntentRule {
    intent: Intent,
    pattern: &'static str,
}

/// Evaluated top to bottom. Place keywords sit above the win keywords so a
/// query mentioning both ("best each way bet") is a place tip.
const INTENT_RULES: &[IntentRule] = &[
    IntentRule {
        intent: Intent::Schedule,
        pattern: r"\b(?:schedule|time|race ?card|races)",
    },
    IntentRule {
        intent: Intent::PlaceTip,
        pattern: r"\b(?:place|podium|each[- ]?way|ew\b|e/w\b)",
    },
    IntentRule {
        intent: Intent::WinTip,
        pattern: r"\b(?:tip|predict|bet|win|best)|\b\d{1,2}:\d{2}\b",
    },
    IntentRule {
        intent: Intent::JockeyInfo,
        pattern: r"\b(?:jockey|trainer|rider)",
    },
    IntentRule {
        intent: Intent::Greeting,
        pattern: r"\b(?:hello|hi\b|hey\b|stupid|smart)",
    },
];

static COMPILED_RULES: Lazy<Vec<(Intent, Regex)>> = Lazy::new(|| {
    INTENT_RULES
        .iter()
        .map(|rule| {
            let re = Regex::new(rule.pattern).expect("intent rule pattern is valid");
            (rule.intent, re)
        })
        .collect()
});

static TIME_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{1,2}:\d{2})\b").expect("time pattern is valid"));

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Intent of a query plus the race time it named, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub intent: Intent,
    /// First `H:MM` / `HH:MM` token in the query.
    pub time: Option<String>,
}

/// Classify a free-text racing query. Always produces an answer; anything
/// unrecognised is `Intent::Generic`.
pub fn classify(query: &str) -> Classification {
    let q = query.to_lowercase();

    let intent = COMPILED_RULES
        .iter()
        .find(|(_, re)| re.is_match(&q))
        .map(|(intent, _)| *intent)
        .unwrap_or(Intent::Generic);

    Classification {
        intent,
        time: extract_time(&q),
    }
}

/// Pull the first race time out of a query.
pub fn extract_time(query: &str) -> Option<String> {
    TIME_TOKEN
        .captures(query)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

// ---------------------------------------------------------------------------
// Football topics
// ---------------------------------------------------------------------------

/// Coarse topic of a football query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FootballTopic {
    Scores,
    Prediction,
    General,
}

static FOOTBALL_SCORES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:score|winning)").expect("football pattern is valid"));
static FOOTBALL_PREDICTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:predict|bet)").expect("football pattern is valid"));

pub fn classify_football(query: &str) -> FootballTopic {
    let q = query.to_lowercase();
    if FOOTBALL_SCORES.is_match(&q) {
        FootballTopic::Scores
    } else if FOOTBALL_PREDICTION.is_match(&q) {
        FootballTopic::Prediction
    } else {
        FootballTopic::General
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
