//! Score and rationale extraction from free-form model replies.
//!
//! Both extractors are total: malformed or empty replies resolve to the
//! range minimum and the raw reply respectively.

use std::num::IntErrorKind;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use tracing::{debug, warn};

use crate::models::{DimensionResult, ScoreRange};

static SCORE_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)score:([^\n]*)").unwrap());
static DIGIT_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-?\d+").unwrap());
static LEADING_DIGIT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*(\d)").unwrap());

static RATIONALE_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)rationale:\s*(.*)").unwrap());
static EVALUATION_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)evaluation:\s*(.*)").unwrap());
// Group 1 holds a bare leading digit, which only counts as a score token
// when it lies inside the configured range. A marked score may carry a
// `/ 5` or `out of 5` denominator.
static AFTER_SCORE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)^\s*(?:score:?\s*-?\d+(?:\s*(?:/|out\s+of)\s*\d+)?|(\d)\b)[.):]?\s*\n+(.*)")
        .unwrap()
});
static AFTER_SCORE_INLINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)^\s*(?:score:?\s*-?\d+(?:\s*(?:/|out\s+of)\s*\d+)?|(\d)\b)[.):]?\s*(.*)")
        .unwrap()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreSource {
    /// Digits following a `score:` marker.
    Marker,
    /// A single digit at the very start of the reply.
    Leading,
    /// Nothing found; the range minimum.
    Default,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreExtraction {
    pub score: i64,
    pub raw: Option<i64>,
    pub source: ScoreSource,
    pub clamped: bool,
}

pub fn extract_score(response: &str, range: ScoreRange) -> ScoreExtraction {
    let (raw, source) = match score_after_marker(response) {
        Some(value) => (Some(value), ScoreSource::Marker),
        None => match leading_digit(response) {
            Some(value) => (Some(value), ScoreSource::Leading),
            None => (None, ScoreSource::Default),
        },
    };

    let unclamped = raw.unwrap_or_else(|| range.default_score());
    let score = range.clamp(unclamped);
    let clamped = score != unclamped;
    if clamped {
        warn!(
            raw = unclamped,
            score,
            min = range.min(),
            max = range.max(),
            "Score adjusted to stay within valid range"
        );
    }
    debug!(score, ?source, "Parsed score");

    ScoreExtraction {
        score,
        raw,
        source,
        clamped,
    }
}

fn score_after_marker(response: &str) -> Option<i64> {
    let line = SCORE_MARKER.captures(response)?.get(1)?.as_str();
    let digits = DIGIT_RUN.find(line)?.as_str();
    match digits.parse::<i64>() {
        Ok(value) => Some(value),
        // Saturate so the clamp still lands on the nearest bound.
        Err(e) if *e.kind() == IntErrorKind::PosOverflow => {
            warn!(digits, "Score after marker overflows, saturating");
            Some(i64::MAX)
        }
        Err(e) if *e.kind() == IntErrorKind::NegOverflow => {
            warn!(digits, "Score after marker overflows, saturating");
            Some(i64::MIN)
        }
        Err(e) => {
            warn!(digits, error = %e, "Failed to parse score after marker");
            None
        }
    }
}

fn leading_digit(response: &str) -> Option<i64> {
    LEADING_DIGIT
        .captures(response)?
        .get(1)?
        .as_str()
        .parse()
        .ok()
}

/// Strip the score declaration from a reply, keeping the prose as written.
///
/// Falls back to the unmodified reply when no known layout matches.
pub fn extract_rationale(response: &str, range: ScoreRange) -> String {
    let labelled = [
        ("rationale label", &*RATIONALE_LABEL),
        ("evaluation label", &*EVALUATION_LABEL),
    ];
    for (pattern, regex) in labelled {
        if let Some(text) = regex.captures(response).and_then(|c| c.get(1)) {
            debug!(pattern, "Extracted rationale");
            return text.as_str().trim().to_string();
        }
    }

    let after_score = [
        ("score then line break", &*AFTER_SCORE_LINE),
        ("score inline", &*AFTER_SCORE_INLINE),
    ];
    for (pattern, regex) in after_score {
        if let Some(text) = regex
            .captures(response)
            .filter(|c| leading_token_in_range(c, range))
            .and_then(|c| c.get(2))
        {
            debug!(pattern, "Extracted rationale");
            return text.as_str().trim().to_string();
        }
    }

    warn!("No rationale pattern matched, using full response as rationale");
    response.to_string()
}

fn leading_token_in_range(captures: &Captures<'_>, range: ScoreRange) -> bool {
    match captures.get(1) {
        Some(digit) => digit
            .as_str()
            .parse()
            .is_ok_and(|value| range.contains(value)),
        None => true,
    }
}

/// Score and rationale for one model reply.
pub fn parse_response(response: &str, range: ScoreRange) -> DimensionResult {
    let extraction = extract_score(response, range);
    if extraction.source == ScoreSource::Default {
        warn!(score = extraction.score, "No score found in response, using minimum");
    }
    debug!(raw = ?extraction.raw, clamped = extraction.clamped, "Score extraction");

    let rationale = extract_rationale(response, range);
    DimensionResult::new(extraction.score, rationale)
}
