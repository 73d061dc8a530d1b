//! Heuristic analytics engine: enrich, rank, classify, generate.
//!
//! Everything in here is synchronous and pure: no I/O, no clocks, no
//! shared state. Callers can run as many pipelines in parallel as they
//! like.

pub mod odds;
pub mod enricher;
pub mod ranking;
pub mod intent;
pub mod generator;

use tracing::debug;

use crate::types::Race;

/// Answer a racing query against the races in context.
///
/// The races are enriched first so tips always have stats to quote,
/// whether they came from a provider or the synthetic feed.
pub fn recommend(query: &str, races: Vec<Race>) -> String {
    let races = enricher::enrich(races);
    let classification = intent::classify(query);
    let subject = generator::select_subject(&races, classification.time.as_deref());

    debug!(
        intent = %classification.intent,
        time = ?classification.time,
        races = races.len(),
        "Racing query classified"
    );

    generator::generate(&classification, &subject, &races)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Runner;

    #[test]
    fn test_recommend_enriches_before_tipping() {
        let race = Race::new("r1", "Ascot", "14:30").with_runners(vec![
            Runner::new("Star", Some("2/1")),
            Runner::new("Nova", Some("5/1")),
        ]);
        let text = recommend("best bet for the 14:30", vec![race]);
        // Win Rate commentary only appears when stats exist.
        assert!(text.contains("33.3% Win Rate"));
    }

    #[test]
    fn test_recommend_is_deterministic() {
        let races = || {
            vec![Race::new("r1", "Ludlow", "13:00").with_runners(vec![
                Runner::new("Alpha", None),
                Runner::new("Bravo", None),
                Runner::new("Charlie", Some("4/1")),
            ])]
        };
        assert_eq!(recommend("each way tip", races()), recommend("each way tip", races()));
    }
}
