//! Ranking and selection.
//!
//! Orders a race's runners by price (favourite first) and picks the
//! candidates the recommendation text talks about. The picks are house
//! policy for illustrative tips:
//!
//! - **favourite**: shortest price.
//! - **value**: first runner in price order with A/E above 1.05, else the
//!   third favourite, else the second.
//! - **place**: second favourite.
//! - **each-way**: first runner priced beyond 6/1, else the fourth
//!   favourite, else the third.

use crate::engine::odds;
use crate::types::Runner;

/// A/E index a runner must beat to count as a value pick.
pub const VALUE_AE_THRESHOLD: f64 = 1.05;

/// Runners in price order plus the selected candidates.
///
/// Borrows from the runner list it was built from; ranking never mutates
/// the race.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ranking<'a> {
    pub ordered: Vec<&'a Runner>,
    pub favorite: Option<&'a Runner>,
    pub value: Option<&'a Runner>,
    pub place: Option<&'a Runner>,
    pub each_way: Option<&'a Runner>,
}

impl<'a> Ranking<'a> {
    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    /// Value pick, but only when it is a different horse from the favourite.
    pub fn distinct_value(&self) -> Option<&'a Runner> {
        match (self.value, self.favorite) {
            (Some(value), Some(fav)) if value.name == fav.name => None,
            (value, _) => value,
        }
    }
}

/// Rank runners by ascending odds strength. Equal strengths keep their
/// declared order.
pub fn rank(runners: &[Runner]) -> Ranking<'_> {
    let mut priced: Vec<(Option<f64>, &Runner)> = runners
        .iter()
        .map(|r| (odds::parse(r.odds.as_deref()), r))
        .collect();
    // `sort_by` is stable, which is what keeps ties in card order.
    priced.sort_by(|(a, _), (b, _)| {
        a.unwrap_or(odds::LONGSHOT_STRENGTH)
            .total_cmp(&b.unwrap_or(odds::LONGSHOT_STRENGTH))
    });

    let ordered: Vec<&Runner> = priced.iter().map(|(_, r)| *r).collect();

    let value = ordered
        .iter()
        .find(|r| r.ae_index().is_some_and(|ae| ae > VALUE_AE_THRESHOLD))
        .or_else(|| ordered.get(2))
        .or_else(|| ordered.get(1))
        .copied();

    let each_way = priced
        .iter()
        .find(|(price, _)| price.is_some_and(|p| p > odds::EACH_WAY_THRESHOLD))
        .map(|(_, r)| *r)
        .or_else(|| ordered.get(3).copied())
        .or_else(|| ordered.get(2).copied());

    Ranking {
        favorite: ordered.first().copied(),
        place: ordered.get(1).copied(),
        value,
        each_way,
        ordered,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
