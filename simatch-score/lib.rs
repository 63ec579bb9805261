//! Similarity scoring: raw match statistics in, bounded score and a
//! discrete confidence tier out.

use serde::{Deserialize, Serialize};

/// Coarse reliability classification of a comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

/// Public comparison outcome
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub good_matches: usize,
    pub total_matches: usize,
    /// Accepted matches over the larger side's feature count, 4 decimals
    pub match_ratio: f64,
    /// 0 to 100, 2 decimals
    pub similarity_score: f64,
    pub confidence: Confidence,
}

impl MatchResult {
    /// The one zero outcome every degenerate path shares
    pub fn zero() -> Self {
        Self {
            good_matches: 0,
            total_matches: 0,
            match_ratio: 0.0,
            similarity_score: 0.0,
            confidence: Confidence::Low,
        }
    }
}

#[derive(Debug, Clone)]
pub enum ScoreError {
    InvalidScale(f64),
    InvertedCuts { medium_cut: usize, high_cut: usize },
}

impl std::fmt::Display for ScoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScoreError::InvalidScale(scale) => {
                write!(f, "Invalid score scale: {} (must be positive)", scale)
            }
            ScoreError::InvertedCuts { medium_cut, high_cut } => {
                write!(f, "Confidence cuts are inverted: medium {} above high {}", medium_cut, high_cut)
            }
        }
    }
}

impl std::error::Error for ScoreError {}

pub type ScoreResult<T> = Result<T, ScoreError>;

/// Scoring policy: score scale plus the confidence cut points.
///
/// Both presets mirror a deployed tuning; neither is more correct than the
/// other, so the choice stays with the caller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringProfile {
    /// Multiplier applied to the match ratio before clamping to 0..=100
    pub scale: f64,
    /// Fewer good matches than this is low confidence
    pub medium_cut: usize,
    /// At least this many good matches is high confidence
    pub high_cut: usize,
}

impl Default for ScoringProfile {
    fn default() -> Self {
        Self::conservative()
    }
}

impl ScoringProfile {
    /// Scores top out at 80; confidence rises after 5 and 15 good matches
    pub fn conservative() -> Self {
        Self { scale: 80.0, medium_cut: 5, high_cut: 15 }
    }

    /// Full 0 to 100 range with stricter cuts at 10 and 30
    pub fn standard() -> Self {
        Self { scale: 100.0, medium_cut: 10, high_cut: 30 }
    }

    pub fn validate(&self) -> ScoreResult<()> {
        if !(self.scale > 0.0) {
            return Err(ScoreError::InvalidScale(self.scale));
        }
        if self.medium_cut > self.high_cut {
            return Err(ScoreError::InvertedCuts {
                medium_cut: self.medium_cut,
                high_cut: self.high_cut,
            });
        }
        Ok(())
    }

    pub fn confidence(&self, good_matches: usize) -> Confidence {
        if good_matches < self.medium_cut {
            Confidence::Low
        } else if good_matches < self.high_cut {
            Confidence::Medium
        } else {
            Confidence::High
        }
    }

    /// Fold raw match statistics into the public result.
    ///
    /// `good_matches` is the accepted-candidate count; `query_count` and
    /// `candidate_count` are the per-side feature counts. The ratio divides
    /// by the larger side (at least one, so empty sides cannot divide by
    /// zero) and the score scales then clamps it. `total_matches` reports
    /// the number of query descriptors that took part, which is what the
    /// nearest-neighbor pass evaluates one decision per.
    pub fn score(
        &self,
        good_matches: usize,
        query_count: usize,
        candidate_count: usize,
    ) -> MatchResult {
        let denominator = query_count.max(candidate_count).max(1);
        let match_ratio = good_matches as f64 / denominator as f64;
        let similarity_score = (match_ratio * self.scale).clamp(0.0, 100.0);
        MatchResult {
            good_matches,
            total_matches: query_count,
            match_ratio: round_to(match_ratio, 4),
            similarity_score: round_to(similarity_score, 2),
            confidence: self.confidence(good_matches),
        }
    }
}

/// Round half away from zero at a fixed number of decimals
fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
