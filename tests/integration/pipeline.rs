//! End-to-end analytics pipeline: enrich, rank, classify and generate
//! over realistic racecards.

use paddock::engine::generator::ILLUSTRATIVE_MARKER;
use paddock::engine::{enricher, intent, ranking, recommend};
use paddock::llm::heuristic::{HeuristicAnalyst, SIGNATURE};
use paddock::llm::AnalysisRequest;
use paddock::types::{AnalysisStats, Intent};
use serde_json::json;

use crate::static_source::ascot_card;

#[test]
fn test_ascot_card_is_fully_enriched_and_ranked() {
    let races = enricher::enrich(ascot_card());
    assert!(races
        .iter()
        .flat_map(|r| &r.runners)
        .all(|r| r.analysis_stats.is_some() && r.track_stat.is_some() && r.last_runs.is_some()));

    let ranking = ranking::rank(&races[0].runners);
    assert_eq!(ranking.favorite.map(|r| r.name.as_str()), Some("Star"));
    assert_eq!(ranking.place.map(|r| r.name.as_str()), Some("Nova"));
    assert_eq!(ranking.each_way.map(|r| r.name.as_str()), Some("Comet"));
}

#[test]
fn test_enrichment_is_stable_across_calls() {
    assert_eq!(enricher::enrich(ascot_card()), enricher::enrich(ascot_card()));
}

#[test]
fn test_provider_stats_survive_enrichment() {
    let mut card = ascot_card();
    let supplied = AnalysisStats::new("41%", 1.4, 12.5);
    card[0].runners[1].analysis_stats = Some(supplied.clone());

    let races = enricher::enrich(card);
    assert_eq!(races[0].runners[1].analysis_stats.as_ref(), Some(&supplied));
}

#[test]
fn test_classification_examples() {
    assert_eq!(intent::classify("what's the schedule today?").intent, Intent::Schedule);

    let win = intent::classify("best bet for the 3:30");
    assert_eq!(win.intent, Intent::WinTip);
    assert_eq!(win.time.as_deref(), Some("3:30"));

    let place = intent::classify("each way tip for 14:00");
    assert_eq!(place.intent, Intent::PlaceTip);
    assert_eq!(place.time.as_deref(), Some("14:00"));
}

#[test]
fn test_place_tip_for_named_race() {
    let text = recommend("each way tip for 14:30", ascot_card());
    assert!(text.contains("Ascot"));
    assert!(text.contains("Safe Place Bet"));
    assert!(text.contains("Nova"));
    assert!(text.contains("Comet"));
    assert!(!text.contains(ILLUSTRATIVE_MARKER));
}

#[test]
fn test_twelve_hour_time_finds_afternoon_race() {
    let text = recommend("best bet for the 3:05", ascot_card());
    assert!(text.contains("15:05"));
    assert!(text.contains("Quill"));
}

#[test]
fn test_unknown_time_is_marked_illustrative() {
    let text = recommend("best bet for the 18:00", ascot_card());
    assert!(text.contains(ILLUSTRATIVE_MARKER));
    assert!(text.contains("18:00"));
}

#[test]
fn test_schedule_lists_off_times() {
    let text = recommend("show me the race card", ascot_card());
    assert!(text.contains("Ascot"));
    assert!(text.contains("14:30, 15:05"));
}

#[test]
fn test_heuristic_analyst_reads_provider_shaped_payload() {
    let request = AnalysisRequest::new("horse-racing", "who will win the 14:30?").with_data(json!({
        "racecards": [{
            "race_id": "rac_9",
            "course": "Ascot",
            "off_time": "14:30",
            "runner_details": [
                { "horse": "Star", "odds": "2/1" },
                { "horse": "Nova", "odds": 6.0 }
            ]
        }]
    }));
    let answer = HeuristicAnalyst.answer(&request);
    assert!(answer.contains("Star"));
    assert!(answer.ends_with(SIGNATURE));
}
