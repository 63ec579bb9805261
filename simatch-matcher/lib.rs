//! Descriptor matching between two feature sets.
//!
//! For every query descriptor in the first set the matcher finds nearest
//! neighbors in the second set (Hamming for binary descriptors, L2 for
//! float ones) and applies an acceptance policy: Lowe's ratio test over the
//! two nearest candidates, or a mutual-nearest cross-check. Search runs
//! either exactly (brute force) or through a budgeted vantage-point tree.

pub mod error;
mod metric;
mod search;
mod vptree;

pub use error::{MatchError, MatcherResult};

use log::debug;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use simatch_core::{DescriptorMatrix, Descriptors, FeatureSet};

use crate::metric::DescriptorElement;
use crate::search::{scan_two_nearest, TwoNearest};
use crate::vptree::VpTree;

/// Default Lowe ratio threshold
pub const DEFAULT_RATIO: f64 = 0.7;
/// Default per-query check budget for indexed search
pub const DEFAULT_CHECKS: usize = 50;
/// Default absolute distance gate for the cross-check policy
pub const DEFAULT_DISTANCE_GATE: f64 = 50.0;

/// One accepted correspondence between two descriptor sets
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchCandidate {
    pub query_index: usize,
    pub neighbor_index: usize,
    pub distance: f64,
}

/// Candidate search backend
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SearchStrategy {
    /// Scan every candidate for every query
    Exact,
    /// Vantage-point tree spending at most `checks` distance evaluations
    /// per query; trades a little recall for speed on large sets
    Indexed { checks: usize },
}

impl Default for SearchStrategy {
    fn default() -> Self {
        SearchStrategy::Exact
    }
}

/// Acceptance policy applied to raw neighbor candidates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MatchPolicy {
    /// Lowe's ratio test: accept the nearest neighbor only when it is
    /// decisively closer than the second-nearest
    RatioTest { ratio: f64 },
    /// Accept only pairs that are each other's nearest neighbor, optionally
    /// discarding pairs at `max_distance` or beyond
    CrossCheck {
        #[serde(skip_serializing_if = "Option::is_none")]
        max_distance: Option<f64>,
    },
}

impl Default for MatchPolicy {
    fn default() -> Self {
        MatchPolicy::RatioTest { ratio: DEFAULT_RATIO }
    }
}

/// Two-set descriptor matcher
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Matcher {
    strategy: SearchStrategy,
    policy: MatchPolicy,
}

impl Matcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_strategy(mut self, strategy: SearchStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_policy(mut self, policy: MatchPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn strategy(&self) -> SearchStrategy {
        self.strategy
    }

    pub fn policy(&self) -> MatchPolicy {
        self.policy
    }

    pub fn validate(&self) -> MatcherResult<()> {
        if let MatchPolicy::RatioTest { ratio } = self.policy {
            if !(ratio > 0.0 && ratio < 1.0) {
                return Err(MatchError::InvalidRatio(ratio));
            }
        }
        if let MatchPolicy::CrossCheck { max_distance: Some(gate) } = self.policy {
            if gate <= 0.0 {
                return Err(MatchError::InvalidDistanceGate(gate));
            }
        }
        if let SearchStrategy::Indexed { checks: 0 } = self.strategy {
            return Err(MatchError::InvalidCheckBudget);
        }
        Ok(())
    }

    /// Match `first`'s descriptors against `second`'s.
    ///
    /// Either side with fewer than two features matches nothing; that is a
    /// valid outcome, not a failure, and is decided before any shape
    /// checking so sparse sets never error. Non-sparse sets must agree on
    /// descriptor element type and width. Output is ordered by query index.
    pub fn match_sets(
        &self,
        first: &FeatureSet,
        second: &FeatureSet,
    ) -> MatcherResult<Vec<MatchCandidate>> {
        self.validate()?;
        if first.len() < 2 || second.len() < 2 {
            debug!("sparse match: {} vs {} features, nothing to do", first.len(), second.len());
            return Ok(Vec::new());
        }
        match (first.descriptors(), second.descriptors()) {
            (Descriptors::Binary(a), Descriptors::Binary(b)) if a.cols() == b.cols() => {
                Ok(self.run(a, b))
            }
            (Descriptors::Float(a), Descriptors::Float(b)) if a.cols() == b.cols() => {
                Ok(self.run(a, b))
            }
            _ => Err(MatchError::IncompatibleDescriptors {
                first_shape: first.descriptors().shape(),
                first_type: first.descriptors().element_type(),
                second_shape: second.descriptors().shape(),
                second_type: second.descriptors().element_type(),
            }),
        }
    }

    fn run<T: DescriptorElement>(
        &self,
        queries: &DescriptorMatrix<T>,
        candidates: &DescriptorMatrix<T>,
    ) -> Vec<MatchCandidate> {
        let accepted = match self.policy {
            MatchPolicy::RatioTest { ratio } => self.ratio_matches(queries, candidates, ratio),
            MatchPolicy::CrossCheck { max_distance } => {
                self.mutual_matches(queries, candidates, max_distance)
            }
        };
        debug!("accepted {} of {} query descriptors", accepted.len(), queries.rows());
        accepted
    }

    /// Two nearest neighbors in `candidates` for every query row
    fn all_two_nearest<T: DescriptorElement>(
        &self,
        queries: &DescriptorMatrix<T>,
        candidates: &DescriptorMatrix<T>,
    ) -> Vec<TwoNearest> {
        match self.strategy {
            SearchStrategy::Exact => (0..queries.rows())
                .into_par_iter()
                .map(|q| scan_two_nearest(queries.row(q), candidates))
                .collect(),
            SearchStrategy::Indexed { checks } => {
                let tree = VpTree::build(candidates);
                (0..queries.rows())
                    .into_par_iter()
                    .map(|q| tree.search(queries.row(q), checks))
                    .collect()
            }
        }
    }

    fn ratio_matches<T: DescriptorElement>(
        &self,
        queries: &DescriptorMatrix<T>,
        candidates: &DescriptorMatrix<T>,
        ratio: f64,
    ) -> Vec<MatchCandidate> {
        self.all_two_nearest(queries, candidates)
            .into_iter()
            .enumerate()
            .filter_map(|(query_index, found)| {
                let (distance, neighbor_index) = found.best()?;
                let (second_distance, _) = found.second()?;
                (distance < ratio * second_distance)
                    .then_some(MatchCandidate { query_index, neighbor_index, distance })
            })
            .collect()
    }

    fn mutual_matches<T: DescriptorElement>(
        &self,
        queries: &DescriptorMatrix<T>,
        candidates: &DescriptorMatrix<T>,
        max_distance: Option<f64>,
    ) -> Vec<MatchCandidate> {
        let forward = self.all_two_nearest(queries, candidates);
        let reverse = self.all_two_nearest(candidates, queries);
        forward
            .into_iter()
            .enumerate()
            .filter_map(|(query_index, found)| {
                let (distance, neighbor_index) = found.best()?;
                let (_, mirror) = reverse[neighbor_index].best()?;
                if mirror != query_index {
                    return None;
                }
                if let Some(gate) = max_distance {
                    if distance >= gate {
                        return None;
                    }
                }
                Some(MatchCandidate { query_index, neighbor_index, distance })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use simatch_core::Keypoint;

    fn make_keypoints(n: usize) -> Vec<Keypoint> {
        (0..n)
            .map(|i| Keypoint { x: i as f64, y: 0.0, size: 2.0, angle: 0.0 })
            .collect()
    }

    fn float_set(rows: Vec<Vec<f32>>) -> FeatureSet {
        let n = rows.len();
        let cols = rows.first().map_or(1, Vec::len);
        let data = rows.into_iter().flatten().collect();
        let descriptors =
            Descriptors::Float(DescriptorMatrix::new(data, n, cols).unwrap());
        FeatureSet::new(make_keypoints(n), descriptors, (100, 100)).unwrap()
    }

    fn binary_set(rows: Vec<Vec<u8>>) -> FeatureSet {
        let n = rows.len();
        let cols = rows.first().map_or(1, Vec::len);
        let data = rows.into_iter().flatten().collect();
        let descriptors =
            Descriptors::Binary(DescriptorMatrix::new(data, n, cols).unwrap());
        FeatureSet::new(make_keypoints(n), descriptors, (100, 100)).unwrap()
    }

    /// Well-separated float rows: one hot coordinate per row
    fn spread_rows(n: usize, cols: usize) -> Vec<Vec<f32>> {
        (0..n)
            .map(|i| {
                let mut row = vec![0.0f32; cols];
                row[i % cols] = 100.0 + i as f32;
                row
            })
            .collect()
    }

    fn pseudo_random_rows(seed: u64, n: usize, cols: usize) -> Vec<Vec<f32>> {
        let mut state = seed | 1;
        (0..n)
            .map(|_| {
                (0..cols)
                    .map(|_| {
                        state ^= state << 13;
                        state ^= state >> 7;
                        state ^= state << 17;
                        (state % 2000) as f32 / 10.0
                    })
                    .collect()
            })
            .collect()
    }

    #[test]
    fn sparse_sets_match_nothing() {
        let full = float_set(spread_rows(10, 8));
        for n in 0..2 {
            let sparse = float_set(spread_rows(n, 8));
            assert!(Matcher::new().match_sets(&sparse, &full).unwrap().is_empty());
            assert!(Matcher::new().match_sets(&full, &sparse).unwrap().is_empty());
        }
    }

    #[test]
    fn sparse_sets_skip_the_compatibility_check() {
        // An empty float set against a binary set is degenerate, not an error
        let empty = float_set(Vec::new());
        let binary = binary_set(vec![vec![1, 2], vec![3, 4], vec![5, 6]]);
        assert_eq!(Matcher::new().match_sets(&empty, &binary).unwrap(), Vec::new());
    }

    #[test]
    fn width_mismatch_is_rejected() {
        let narrow = float_set(spread_rows(4, 8));
        let wide = float_set(spread_rows(4, 16));
        let result = Matcher::new().match_sets(&narrow, &wide);
        assert!(matches!(
            result,
            Err(MatchError::IncompatibleDescriptors {
                first_shape: (4, 8),
                second_shape: (4, 16),
                ..
            })
        ));
    }

    #[test]
    fn element_type_mismatch_is_rejected() {
        let float = float_set(spread_rows(4, 8));
        let binary = binary_set(vec![vec![0u8; 8]; 4]);
        assert!(matches!(
            Matcher::new().match_sets(&float, &binary),
            Err(MatchError::IncompatibleDescriptors { .. })
        ));
    }

    #[test]
    fn unique_duplicates_pass_any_ratio() {
        let queries = float_set(spread_rows(6, 6));
        let candidates = float_set(spread_rows(6, 6));
        for ratio in [0.05, 0.3, 0.5, 0.7, 0.95] {
            let matches = Matcher::new()
                .with_policy(MatchPolicy::RatioTest { ratio })
                .match_sets(&queries, &candidates)
                .unwrap();
            assert_eq!(matches.len(), 6, "ratio {} lost matches", ratio);
            for m in &matches {
                assert_eq!(m.query_index, m.neighbor_index);
                assert_eq!(m.distance, 0.0);
            }
        }
    }

    #[test]
    fn ambiguous_neighbors_are_rejected() {
        // Both candidates sit at the same distance from the query
        let queries = float_set(vec![vec![0.0, 0.0], vec![50.0, 50.0]]);
        let candidates = float_set(vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
        let matches = Matcher::new()
            .with_policy(MatchPolicy::RatioTest { ratio: 0.8 })
            .match_sets(&queries, &candidates)
            .unwrap();
        assert!(matches.is_empty());
    }

    #[test]
    fn results_are_ordered_by_query_index() {
        let queries = float_set(spread_rows(12, 4));
        let candidates = float_set(spread_rows(12, 4));
        let matches = Matcher::new().match_sets(&queries, &candidates).unwrap();
        let indices: Vec<usize> = matches.iter().map(|m| m.query_index).collect();
        let mut sorted = indices.clone();
        sorted.sort_unstable();
        assert_eq!(indices, sorted);
    }

    #[test]
    fn equal_distances_resolve_to_lowest_index_under_both_strategies() {
        // Query 0 ties between candidates 0 and 2; the lower index wins
        let queries = binary_set(vec![vec![0b0000_0000], vec![0b1111_0000]]);
        let candidates =
            binary_set(vec![vec![0b0000_0001], vec![0b1111_0001], vec![0b0000_0010]]);
        let policy = MatchPolicy::CrossCheck { max_distance: None };

        for strategy in [SearchStrategy::Exact, SearchStrategy::Indexed { checks: usize::MAX }] {
            let matches = Matcher::new()
                .with_strategy(strategy)
                .with_policy(policy)
                .match_sets(&queries, &candidates)
                .unwrap();
            assert_eq!(
                matches,
                vec![
                    MatchCandidate { query_index: 0, neighbor_index: 0, distance: 1.0 },
                    MatchCandidate { query_index: 1, neighbor_index: 1, distance: 1.0 },
                ]
            );
        }
    }

    #[test]
    fn unbudgeted_indexed_equals_exact() {
        let queries = float_set(pseudo_random_rows(11, 60, 16));
        let candidates = float_set(pseudo_random_rows(23, 60, 16));
        let exact = Matcher::new().match_sets(&queries, &candidates).unwrap();
        let indexed = Matcher::new()
            .with_strategy(SearchStrategy::Indexed { checks: usize::MAX })
            .match_sets(&queries, &candidates)
            .unwrap();
        assert_eq!(exact, indexed);
    }

    #[test]
    fn budgeted_indexed_recall_is_bounded() {
        // Planted exact duplicates: brute force accepts every query
        let rows = spread_rows(120, 32);
        let queries = float_set(rows.clone());
        let candidates = float_set(rows);
        let exact = Matcher::new().match_sets(&queries, &candidates).unwrap();
        assert_eq!(exact.len(), 120);

        let indexed = Matcher::new()
            .with_strategy(SearchStrategy::Indexed { checks: DEFAULT_CHECKS })
            .match_sets(&queries, &candidates)
            .unwrap();
        assert!(
            indexed.len() >= exact.len() - 12,
            "indexed recall dropped too far: {} of {}",
            indexed.len(),
            exact.len()
        );
    }

    #[test]
    fn cross_check_keeps_only_mutual_pairs() {
        // Candidate 0 prefers query 1, so query 0 stays unmatched
        let queries = binary_set(vec![vec![0x03], vec![0x01]]);
        let candidates = binary_set(vec![vec![0x00], vec![0xFF]]);
        let matches = Matcher::new()
            .with_policy(MatchPolicy::CrossCheck { max_distance: None })
            .match_sets(&queries, &candidates)
            .unwrap();
        assert_eq!(
            matches,
            vec![MatchCandidate { query_index: 1, neighbor_index: 0, distance: 1.0 }]
        );
    }

    #[test]
    fn cross_check_distance_gate_filters_far_pairs() {
        let queries = binary_set(vec![vec![0x00, 0x00], vec![0xFF, 0xFF]]);
        let candidates = binary_set(vec![vec![0x00, 0x01], vec![0xFF, 0x0F]]);
        let lenient = Matcher::new()
            .with_policy(MatchPolicy::CrossCheck { max_distance: Some(16.0) })
            .match_sets(&queries, &candidates)
            .unwrap();
        assert_eq!(lenient.len(), 2);

        // Pair (1, 1) sits at distance 4 and falls to the gate
        let strict = Matcher::new()
            .with_policy(MatchPolicy::CrossCheck { max_distance: Some(2.0) })
            .match_sets(&queries, &candidates)
            .unwrap();
        assert_eq!(strict.len(), 1);
        assert_eq!(strict[0].query_index, 0);
    }

    #[test]
    fn default_gate_drops_pairs_at_the_boundary() {
        // Mutual pairs at Hamming distance 49 and 50; the default gate keeps only the first
        let mut near = vec![0xFFu8; 6];
        near.push(0x01);
        near.resize(32, 0x00);
        let mut far = vec![0x00u8; 6];
        far.push(0xFC);
        far.resize(32, 0xFF);

        let queries = binary_set(vec![vec![0x00; 32], vec![0xFF; 32]]);
        let candidates = binary_set(vec![near, far]);
        let matches = Matcher::new()
            .with_policy(MatchPolicy::CrossCheck { max_distance: Some(DEFAULT_DISTANCE_GATE) })
            .match_sets(&queries, &candidates)
            .unwrap();
        assert_eq!(
            matches,
            vec![MatchCandidate { query_index: 0, neighbor_index: 0, distance: 49.0 }]
        );
    }

    #[test]
    fn configuration_is_validated() {
        let sets = (float_set(spread_rows(3, 4)), float_set(spread_rows(3, 4)));

        let bad_ratio = Matcher::new().with_policy(MatchPolicy::RatioTest { ratio: 1.0 });
        assert!(matches!(bad_ratio.match_sets(&sets.0, &sets.1), Err(MatchError::InvalidRatio(_))));

        let bad_gate =
            Matcher::new().with_policy(MatchPolicy::CrossCheck { max_distance: Some(-3.0) });
        assert!(matches!(
            bad_gate.match_sets(&sets.0, &sets.1),
            Err(MatchError::InvalidDistanceGate(_))
        ));

        let bad_budget = Matcher::new().with_strategy(SearchStrategy::Indexed { checks: 0 });
        assert!(matches!(
            bad_budget.match_sets(&sets.0, &sets.1),
            Err(MatchError::InvalidCheckBudget)
        ));
    }

    fn any_matrix() -> impl Strategy<Value = (Vec<Vec<f32>>, Vec<Vec<f32>>)> {
        (2usize..24, 1usize..8).prop_flat_map(|(rows, cols)| {
            let cell = -100.0f32..100.0;
            let row = proptest::collection::vec(cell, cols);
            (
                proptest::collection::vec(row.clone(), rows),
                proptest::collection::vec(row, rows),
            )
        })
    }

    proptest! {
        #[test]
        fn indexed_with_unbounded_budget_matches_exact((a, b) in any_matrix()) {
            let queries = float_set(a);
            let candidates = float_set(b);
            let exact = Matcher::new().match_sets(&queries, &candidates).unwrap();
            let indexed = Matcher::new()
                .with_strategy(SearchStrategy::Indexed { checks: usize::MAX })
                .match_sets(&queries, &candidates)
                .unwrap();
            prop_assert_eq!(exact, indexed);
        }
    }
}
