//! Recommendation text.
//!
//! Turns a classified query plus the ranked runners of the race it refers
//! to into the answer shown to the user. When a query names a time that no
//! race in context runs at, the answer uses placeholder horses and says so
//! explicitly, so simulated tips can never pass for real ones.

use crate::engine::intent::{Classification, FootballTopic};
use crate::engine::ranking::{rank, Ranking};
use crate::types::{AnalysisStats, Intent, Race, Runner};

/// Maximum number of off times listed in a schedule answer.
const SCHEDULE_LIMIT: usize = 5;

/// Marker carried by every answer built from placeholder runners.
pub const ILLUSTRATIVE_MARKER: &str = "Illustrative only";

// ---------------------------------------------------------------------------
// Fixed remarks
// ---------------------------------------------------------------------------

const SCHEDULE_LOADING: &str = "I'm checking the live feed... The schedule is loading now. \
    We usually see action starting around 1:30 PM.";

const NO_CONTEXT_TIP: &str = "I'm analysing the form now. The favourite in the next race \
    looks solid, but watch the market for late drifts.";

const NO_RUNNERS: &str = "My models are processing the live odds now. \
    Look for market movers in the next 5 minutes.";

const WIN_CONFIDENCE: &str = "*Confidence: High. Track conditions suit the favourite.*";

const JOCKEY_REMARK: &str = "Top jockeys are booking strong rides today. I'm tracking \
    significant money for mounts ridden by R. Moore and L. Dettori in the feature races.";

const GREETING_REMARK: &str = "I'm fully online and processing real-time data from the course. \
    Ask me for a race schedule, a prediction, or specific horse form.";

const GENERIC_REMARK: &str = "I'm monitoring the live feed. I can give you the race schedule, \
    analyse the next winner, or check jockey form. What do you need?";

// ---------------------------------------------------------------------------
// Subject selection
// ---------------------------------------------------------------------------

/// The race a tip is about.
#[derive(Debug, Clone, PartialEq)]
pub enum Subject<'a> {
    /// A race from the supplied context, ranked.
    Race { race: &'a Race, ranking: Ranking<'a> },
    /// A time was requested but no race in context runs at it.
    Unmatched { time: String },
    /// No races in context and no time requested.
    Unknown,
}

/// Parse "H:MM" / "HH:MM" into (hour, minute).
fn clock(time: &str) -> Option<(u32, u32)> {
    let (h, m) = time.trim().split_once(':')?;
    Some((h.parse().ok()?, m.parse().ok()?))
}

/// Find the race running at `time`: exact match first, then the same
/// clock time read 12-hour style ("3:30" is the 15:30).
fn race_at<'a>(races: &'a [Race], time: &str) -> Option<&'a Race> {
    if let Some(race) = races.iter().find(|r| r.time == time) {
        return Some(race);
    }
    let (hour, minute) = clock(time)?;
    races.iter().find(|r| {
        clock(&r.time).is_some_and(|(h, m)| m == minute && h % 12 == hour % 12)
    })
}

/// Pick the race a query refers to.
///
/// A requested time must match a race in context; without a time the
/// first race is used.
pub fn select_subject<'a>(races: &'a [Race], time: Option<&str>) -> Subject<'a> {
    let race = match time {
        Some(t) => match race_at(races, t) {
            Some(race) => race,
            None => return Subject::Unmatched { time: t.to_string() },
        },
        None => match races.first() {
            Some(race) => race,
            None => return Subject::Unknown,
        },
    };
    Subject::Race {
        race,
        ranking: rank(&race.runners),
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Render the answer for a classified racing query.
///
/// `context` is only consulted for schedule answers; tips work from the
/// selected `subject`.
pub fn generate(classification: &Classification, subject: &Subject<'_>, context: &[Race]) -> String {
    match classification.intent {
        Intent::Schedule => schedule(context),
        Intent::WinTip | Intent::PlaceTip => {
            let place = classification.intent == Intent::PlaceTip;
            match subject {
                Subject::Race { race, ranking } => tip(race, ranking, place),
                Subject::Unmatched { time } => illustrative_tip(time, place),
                Subject::Unknown => NO_CONTEXT_TIP.to_string(),
            }
        }
        Intent::JockeyInfo => JOCKEY_REMARK.to_string(),
        Intent::Greeting => GREETING_REMARK.to_string(),
        Intent::Generic => GENERIC_REMARK.to_string(),
    }
}

fn schedule(context: &[Race]) -> String {
    let Some(first) = context.first() else {
        return SCHEDULE_LOADING.to_string();
    };
    let times = context
        .iter()
        .take(SCHEDULE_LIMIT)
        .map(|r| r.time.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    let going = match &first.going {
        Some(going) => format!("The going is reported as {going}."),
        None => "The going reports are good.".to_string(),
    };
    format!(
        "I've pulled the official card for {} today. We have post times at: {times}. {going}",
        first.course_label(),
    )
}

fn tip(race: &Race, ranking: &Ranking<'_>, place: bool) -> String {
    let Some(fav) = ranking.favorite else {
        return NO_RUNNERS.to_string();
    };

    let mut answer = format!(
        "🏁 **Analysis for the {} at {}**\n\n",
        race.time,
        race.course_label()
    );
    if place {
        answer.push_str(&place_body(fav, ranking));
    } else {
        answer.push_str(&win_body(fav, ranking));
    }
    answer
}

fn win_body(fav: &Runner, ranking: &Ranking<'_>) -> String {
    let mut body = format!("**Top Pick:** 🐎 **{}** ({})\n", fav.name, fav.odds_label());
    body.push_str("The statistical favourite. ");
    if let Some(AnalysisStats {
        win_percentage: Some(win),
        ae_index: Some(ae),
        ..
    }) = &fav.analysis_stats
    {
        body.push_str(&format!(
            "Shows a strong {win} Win Rate and an A/E of {ae:.2}, indicating solid form. "
        ));
    }

    if let Some(value) = ranking.distinct_value() {
        body.push_str(&format!(
            "\n\n**Value Play:** ⚠ **{}** ({})\n",
            value.name,
            value.odds_label()
        ));
        match value.ae_index() {
            Some(ae) => body.push_str(&format!("Overpriced based on my model (A/E {ae:.2}). ")),
            None => body.push_str("Dangerous outsider with hidden form. "),
        }
    }

    body.push_str("\n\n");
    body.push_str(WIN_CONFIDENCE);
    body
}

fn place_body(fav: &Runner, ranking: &Ranking<'_>) -> String {
    let safe = ranking.place.unwrap_or(fav);
    let mut body = format!("**Safe Place Bet:** 🛡️ **{}**\n", safe.name);
    body.push_str(&format!(
        "Solid consistency. Currently trading at {}.\n\n",
        safe.odds_label()
    ));

    match ranking.each_way {
        Some(ew) => {
            body.push_str(&format!(
                "**Each-Way Value:** 💎 **{}** ({})\n",
                ew.name,
                ew.odds_label()
            ));
            body.push_str("Looks overpriced for a podium finish. ");
            if let Some(ae) = ew.ae_index() {
                body.push_str(&format!("A/E Index of {ae:.2} suggests hidden value."));
            }
        }
        None => body.push_str("**Each-Way Value:** 💎 **No strong EW** (-)\n"),
    }

    body.push_str(&format!(
        "\n\n*Strategy: The favourite ({}) is strong, but short odds. \
         Look to the place markets for value.*",
        fav.name
    ));
    body
}

fn illustrative_tip(time: &str, place: bool) -> String {
    let body = if place {
        format!(
            "🏁 **Place Prediction for {time}**\n\n\
             **Safe Place:** 🛡️ **Royal Decree** (Evens to place)\n\
             **Each-Way Shout:** 💎 **Diamond Dust** (12/1)\n\n\
             Diamond Dust has hit the frame in 3 of last 4 starts."
        )
    } else {
        format!(
            "🏁 **Prediction for {time}**\n\n\
             I've analysed the field. \n\
             **Winner:** 🐎 **Mystic River** (3/1)\n\
             **Danger:** ⚠ **Royal Decree** (7/1)\n\n\
             Data suggests Mystic River has the best speed rating for this ground."
        )
    };
    format!(
        "{body}\n\n_{ILLUSTRATIVE_MARKER}: no race at {time} in the current feed, \
         runner names are placeholders._"
    )
}

// ---------------------------------------------------------------------------
// Other sports
// ---------------------------------------------------------------------------

pub fn football(topic: FootballTopic) -> String {
    match topic {
        FootballTopic::Scores => "The matches are tight today. Home teams are dominating \
            possession across the board. Check the live scores above for real-time updates."
            .to_string(),
        FootballTopic::Prediction => "My xG (Expected Goals) model suggests a high-scoring \
            second half. Over 2.5 goals looks like the value play here."
            .to_string(),
        FootballTopic::General => "I'm tracking player movements and tactical shifts. \
            Ask me about match predictions or live scores."
            .to_string(),
    }
}

pub fn other_sport(sport: &str) -> String {
    format!("I'm analysing the live data for {sport}. Ask me for a schedule or a performance prediction.")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
