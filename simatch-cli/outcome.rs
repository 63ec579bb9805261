use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use simatch_score::MatchResult;

/// Which operand of a comparison a message refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    First,
    Second,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::First => write!(f, "first"),
            Side::Second => write!(f, "second"),
        }
    }
}

/// Complete comparison outcome handed back to callers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comparison {
    pub success: bool,
    #[serde(flatten)]
    pub result: MatchResult,
    /// Feature counts of the compared sets
    pub first_features: usize,
    pub second_features: usize,
    /// Present on degenerate outcomes; says why the result is zero
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Seconds since the Unix epoch when the comparison finished
    pub timestamp: u64,
    /// Matching and scoring wall time
    pub elapsed_ms: f64,
}

impl Comparison {
    /// Wrap a scored result
    pub fn scored(
        result: MatchResult,
        first_features: usize,
        second_features: usize,
        elapsed_ms: f64,
    ) -> Self {
        Self {
            success: true,
            result,
            first_features,
            second_features,
            note: None,
            timestamp: unix_now(),
            elapsed_ms,
        }
    }

    /// The one zero-valued outcome every degenerate comparison produces,
    /// annotated with the reason
    pub fn degenerate(
        note: String,
        first_features: usize,
        second_features: usize,
        elapsed_ms: f64,
    ) -> Self {
        Self {
            success: true,
            result: MatchResult::zero(),
            first_features,
            second_features,
            note: Some(note),
            timestamp: unix_now(),
            elapsed_ms,
        }
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
