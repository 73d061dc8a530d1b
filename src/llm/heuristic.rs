//! Heuristic analyst.
//!
//! Answers queries with the local analytics engine: racing queries go
//! through the full enrich/rank/generate pipeline, football and other
//! sports get fixed remarks. Used whenever no LLM key is configured.

use anyhow::Result;
use async_trait::async_trait;
use tracing::debug;

use super::{AnalysisRequest, Analyst};
use crate::engine::{self, generator, intent};
use crate::types::Sport;

/// Appended to every heuristic answer so users can tell it from an LLM one.
pub const SIGNATURE: &str = " 🤖";

#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicAnalyst;

impl HeuristicAnalyst {
    /// Synchronous core, shared with callers that don't need the trait.
    pub fn answer(&self, request: &AnalysisRequest) -> String {
        let sport = request.sport();
        let query = request.query();

        let body = match &sport {
            Sport::HorseRacing => engine::recommend(query, request.races()),
            Sport::Football => generator::football(intent::classify_football(query)),
            Sport::Other(name) => generator::other_sport(name),
        };

        debug!(sport = %sport, "Heuristic answer generated");
        format!("{body}{SIGNATURE}")
    }
}

#[async_trait]
impl Analyst for HeuristicAnalyst {
    async fn analyse(&self, request: &AnalysisRequest) -> Result<String> {
        Ok(self.answer(request))
    }

    fn name(&self) -> &str {
        "heuristic"
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn racing(query: &str) -> AnalysisRequest {
        AnalysisRequest::new("horse-racing", query).with_data(json!({
            "races": [{
                "id": "r1",
                "course": "Ascot",
                "time": "14:30",
                "runners": [
                    { "name": "Star", "odds": "2/1" },
                    { "name": "Nova", "odds": "5/1" },
                    { "name": "Longshot", "odds": "12/1" }
                ]
            }]
        }))
    }

    #[test]
    fn test_racing_answer_is_signed() {
        let answer = tokio_test::block_on(HeuristicAnalyst.analyse(&racing("best bet for 14:30"))).unwrap();
        assert!(answer.ends_with(SIGNATURE));
        assert!(answer.contains("Star"));
    }

    #[test]
    fn test_schedule_names_course() {
        let answer = HeuristicAnalyst.answer(&racing("what's the schedule"));
        assert!(answer.contains("Ascot"));
        assert!(answer.contains("14:30"));
    }

    #[test]
    fn test_football_answers() {
        let scores = HeuristicAnalyst.answer(&AnalysisRequest::new("football", "who is winning"));
        let predict = HeuristicAnalyst.answer(&AnalysisRequest::new("football", "predict the match"));
        let general = HeuristicAnalyst.answer(&AnalysisRequest::new("football", "hello"));
        assert_ne!(scores, predict);
        assert_ne!(predict, general);
        assert!(general.ends_with(SIGNATURE));
    }

    #[test]
    fn test_other_sport_is_named() {
        let answer = HeuristicAnalyst.answer(&AnalysisRequest::new("cricket", "anything"));
        assert!(answer.contains("cricket"));
        assert!(answer.ends_with(SIGNATURE));
    }

    #[test]
    fn test_name() {
        assert_eq!(HeuristicAnalyst.name(), "heuristic");
    }
}
