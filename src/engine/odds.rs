//! Odds normalisation.
//!
//! Turns the odds strings providers send ("5/2", "3.5", "Evs", "SP") into a
//! single comparable strength value where lower means a shorter price.
//! Fractional odds map to N/D, decimal strings are taken as-is, and
//! anything unparseable becomes `LONGSHOT_STRENGTH` so it sorts last.

/// Strength given to runners with no usable price.
pub const LONGSHOT_STRENGTH: f64 = 100.0;

/// Strength above which a runner is considered an each-way price (6/1).
pub const EACH_WAY_THRESHOLD: f64 = 6.0;

/// Parse an odds string into a strength, if it is a real price.
///
/// Returns `None` for absent, SP, malformed, negative or non-finite input.
pub fn parse(odds: Option<&str>) -> Option<f64> {
    let raw = odds?.trim();
    if raw.is_empty() {
        return None;
    }

    if raw.eq_ignore_ascii_case("evs") || raw.eq_ignore_ascii_case("evens") {
        return Some(1.0);
    }

    let value = match raw.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.trim().parse().ok()?;
            let den: f64 = den.trim().parse().ok()?;
            if den == 0.0 {
                return None;
            }
            num / den
        }
        None => raw.parse::<f64>().ok()?,
    };

    (value.is_finite() && value >= 0.0).then_some(value)
}

/// Strength of a price; never fails.
pub fn strength(odds: Option<&str>) -> f64 {
    parse(odds).unwrap_or(LONGSHOT_STRENGTH)
}

/// Implied win chance in percent: `100 / (strength + 1)`.
pub fn implied_win_percentage(strength: f64) -> f64 {
    100.0 / (strength + 1.0)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
