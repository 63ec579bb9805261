//! High-level image comparison pipeline and its configuration.
//!
//! Ties the stage crates together: decode and extract with a caller-supplied
//! detector, match the two feature sets, score the accepted matches and hand
//! back one self-contained [`Comparison`] record.

pub mod config;
pub mod outcome;

use std::time::Instant;

use log::{debug, warn};
use simatch_core::{CoreError, FeatureSet, FeatureSetRecord};
use simatch_features::{BuildError, Detector, FeatureSetBuilder};
use simatch_matcher::MatchError;
use simatch_score::ScoreError;

pub use config::CompareConfig;
pub use outcome::{Comparison, Side};
pub use simatch_core::{Descriptors, Keypoint};
pub use simatch_features::{Detection, DetectorOptions, ExtractionOptions};
pub use simatch_matcher::{
    MatchPolicy, Matcher, SearchStrategy, DEFAULT_CHECKS, DEFAULT_DISTANCE_GATE, DEFAULT_RATIO,
};
pub use simatch_score::{Confidence, MatchResult, ScoringProfile};

#[derive(Debug)]
pub enum CompareError {
    Build(BuildError),
    Match(MatchError),
    Score(ScoreError),
    Record { side: Side, source: CoreError },
    Config(&'static str),
}

impl std::fmt::Display for CompareError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompareError::Build(e) => write!(f, "Feature extraction error: {}", e),
            CompareError::Match(e) => write!(f, "Matching error: {}", e),
            CompareError::Score(e) => write!(f, "Scoring error: {}", e),
            CompareError::Record { side, source } => {
                write!(f, "Invalid {} feature record: {}", side, source)
            }
            CompareError::Config(msg) => write!(f, "Invalid configuration: {}", msg),
        }
    }
}

impl std::error::Error for CompareError {}

impl From<BuildError> for CompareError {
    fn from(err: BuildError) -> Self {
        CompareError::Build(err)
    }
}

impl From<MatchError> for CompareError {
    fn from(err: MatchError) -> Self {
        CompareError::Match(err)
    }
}

impl From<ScoreError> for CompareError {
    fn from(err: ScoreError) -> Self {
        CompareError::Score(err)
    }
}

pub type CompareResult<T> = Result<T, CompareError>;

/// Compare two already-extracted feature sets.
///
/// Sets with fewer than two features and sets with incomparable descriptor
/// schemes both yield the annotated zero outcome instead of an error, so a
/// caller can treat every produced [`Comparison`] uniformly.
pub fn compare_feature_sets(
    first: &FeatureSet,
    second: &FeatureSet,
    config: &CompareConfig,
) -> CompareResult<Comparison> {
    config.validate()?;
    let started = Instant::now();

    if first.len() < 2 || second.len() < 2 {
        let note = sparse_note(first.len(), second.len());
        debug!("degenerate comparison: {}", note);
        return Ok(Comparison::degenerate(
            note,
            first.len(),
            second.len(),
            elapsed_ms(started),
        ));
    }

    match config.matcher().match_sets(first, second) {
        Ok(accepted) => {
            let result = config
                .scoring
                .score(accepted.len(), first.len(), second.len());
            debug!(
                "{} of {} matches accepted, similarity {:.2}",
                result.good_matches, result.total_matches, result.similarity_score
            );
            Ok(Comparison::scored(
                result,
                first.len(),
                second.len(),
                elapsed_ms(started),
            ))
        }
        Err(e @ MatchError::IncompatibleDescriptors { .. }) => {
            warn!("{}", e);
            Ok(Comparison::degenerate(
                e.to_string(),
                first.len(),
                second.len(),
                elapsed_ms(started),
            ))
        }
        Err(e) => Err(e.into()),
    }
}

/// Compare two transport records, decoding each side first.
///
/// Decode failures carry the offending side so callers can report which
/// operand was corrupt.
pub fn compare_records(
    first: &FeatureSetRecord,
    second: &FeatureSetRecord,
    config: &CompareConfig,
) -> CompareResult<Comparison> {
    let first = first
        .to_feature_set()
        .map_err(|source| CompareError::Record { side: Side::First, source })?;
    let second = second
        .to_feature_set()
        .map_err(|source| CompareError::Record { side: Side::Second, source })?;
    compare_feature_sets(&first, &second, config)
}

fn sparse_note(first: usize, second: usize) -> String {
    match (first, second) {
        (0, 0) => "no detectable features in either image".to_string(),
        (0, _) => "no detectable features in first image".to_string(),
        (_, 0) => "no detectable features in second image".to_string(),
        (1, 1) => "not enough features to match in either image".to_string(),
        (1, _) => "not enough features to match in first image".to_string(),
        _ => "not enough features to match in second image".to_string(),
    }
}

fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}

/// High-level comparison pipeline over a caller-supplied detector
pub struct ImageComparer<D: Detector> {
    detector: D,
    builder: FeatureSetBuilder,
    config: CompareConfig,
}

impl<D: Detector> ImageComparer<D> {
    /// Create a new comparer with the given detector and configuration
    pub fn new(detector: D, config: CompareConfig) -> CompareResult<Self> {
        config.validate()?;
        let builder = FeatureSetBuilder::new(config.extraction)?;
        Ok(Self { detector, builder, config })
    }

    /// Extract a feature set from encoded image bytes
    pub fn extract(&self, image_bytes: &[u8]) -> CompareResult<FeatureSet> {
        Ok(self.builder.build(image_bytes, &self.detector)?)
    }

    /// Extract a transport record ready for storage or transmission
    pub fn extract_record(&self, image_bytes: &[u8]) -> CompareResult<FeatureSetRecord> {
        Ok(FeatureSetRecord::from_set(&self.extract(image_bytes)?))
    }

    /// Extract from both images and compare in one step
    pub fn compare(&self, first_bytes: &[u8], second_bytes: &[u8]) -> CompareResult<Comparison> {
        let first = self.extract(first_bytes)?;
        let second = self.extract(second_bytes)?;
        compare_feature_sets(&first, &second, &self.config)
    }

    /// Get comparer configuration
    pub fn config(&self) -> &CompareConfig {
        &self.config
    }
}
