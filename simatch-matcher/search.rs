//! Brute-force candidate scan and the two-nearest accumulator shared by
//! both search strategies.

use simatch_core::DescriptorMatrix;

use crate::metric::DescriptorElement;

/// `(distance, index)` ordering: distance first, lowest index on ties
fn precedes(a: (f64, usize), b: (f64, usize)) -> bool {
    a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)).is_lt()
}

/// Running best and second-best candidate for one query.
///
/// Ties resolve to the lowest candidate index, so exact and indexed search
/// reach identical accept/reject decisions on equal distances no matter in
/// which order candidates arrive.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TwoNearest {
    best: Option<(f64, usize)>,
    second: Option<(f64, usize)>,
}

impl TwoNearest {
    pub fn new() -> Self {
        Self { best: None, second: None }
    }

    pub fn offer(&mut self, distance: f64, index: usize) {
        let candidate = (distance, index);
        match self.best {
            None => self.best = Some(candidate),
            Some(best) if precedes(candidate, best) => {
                self.second = Some(best);
                self.best = Some(candidate);
            }
            Some(_) => match self.second {
                None => self.second = Some(candidate),
                Some(second) if precedes(candidate, second) => self.second = Some(candidate),
                Some(_) => {}
            },
        }
    }

    pub fn best(&self) -> Option<(f64, usize)> {
        self.best
    }

    pub fn second(&self) -> Option<(f64, usize)> {
        self.second
    }

    /// Largest distance that could still displace the second-best candidate
    pub fn bound(&self) -> f64 {
        match self.second {
            Some((distance, _)) => distance,
            None => f64::INFINITY,
        }
    }
}

/// Exact two-nearest search: scan every candidate row
pub(crate) fn scan_two_nearest<T: DescriptorElement>(
    query: &[T],
    candidates: &DescriptorMatrix<T>,
) -> TwoNearest {
    let mut acc = TwoNearest::new();
    for index in 0..candidates.rows() {
        acc.offer(T::distance(query, candidates.row(index)), index);
    }
    acc
}
