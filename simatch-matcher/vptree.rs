//! Vantage-point tree for budgeted two-nearest-neighbor search.
//!
//! One metric-agnostic index serves both descriptor families. Construction
//! is deterministic (first row of each partition as vantage, median-distance
//! split) and search walks the near side first, crossing a split boundary
//! only while the far side can still improve the second-nearest candidate.
//! The per-query check budget caps distance evaluations, trading a small
//! amount of recall for speed on large candidate sets.

use simatch_core::DescriptorMatrix;

use crate::metric::DescriptorElement;
use crate::search::TwoNearest;

const LEAF_SIZE: usize = 8;

enum Node {
    Leaf(Vec<usize>),
    Split { vantage: usize, radius: f64, near: Box<Node>, far: Box<Node> },
}

pub(crate) struct VpTree<'a, T> {
    matrix: &'a DescriptorMatrix<T>,
    root: Option<Node>,
}

impl<'a, T: DescriptorElement> VpTree<'a, T> {
    pub fn build(matrix: &'a DescriptorMatrix<T>) -> Self {
        let indices: Vec<usize> = (0..matrix.rows()).collect();
        let root = if indices.is_empty() { None } else { Some(Self::split(matrix, indices)) };
        Self { matrix, root }
    }

    fn split(matrix: &DescriptorMatrix<T>, mut indices: Vec<usize>) -> Node {
        if indices.len() <= LEAF_SIZE {
            return Node::Leaf(indices);
        }
        // First index as vantage keeps construction deterministic
        let vantage = indices.remove(0);
        let mut scored: Vec<(f64, usize)> = indices
            .into_iter()
            .map(|index| (T::distance(matrix.row(vantage), matrix.row(index)), index))
            .collect();
        let mid = scored.len() / 2;
        scored.select_nth_unstable_by(mid, |a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        let radius = scored[mid].0;

        let (near, far): (Vec<_>, Vec<_>) = scored.into_iter().partition(|(d, _)| *d < radius);
        if near.is_empty() || far.is_empty() {
            // All candidates equidistant from the vantage; a split cannot
            // separate them
            let mut all = vec![vantage];
            all.extend(near.into_iter().chain(far).map(|(_, index)| index));
            return Node::Leaf(all);
        }
        Node::Split {
            vantage,
            radius,
            near: Box::new(Self::split(matrix, near.into_iter().map(|(_, i)| i).collect())),
            far: Box::new(Self::split(matrix, far.into_iter().map(|(_, i)| i).collect())),
        }
    }

    /// Two nearest candidates for `query`, spending at most `checks`
    /// distance evaluations.
    pub fn search(&self, query: &[T], checks: usize) -> TwoNearest {
        let mut acc = TwoNearest::new();
        let mut budget = checks;
        if let Some(root) = &self.root {
            self.visit(root, query, &mut acc, &mut budget);
        }
        acc
    }

    fn visit(&self, node: &Node, query: &[T], acc: &mut TwoNearest, budget: &mut usize) {
        match node {
            Node::Leaf(indices) => {
                for &index in indices {
                    if *budget == 0 {
                        return;
                    }
                    *budget -= 1;
                    acc.offer(T::distance(query, self.matrix.row(index)), index);
                }
            }
            Node::Split { vantage, radius, near, far } => {
                if *budget == 0 {
                    return;
                }
                *budget -= 1;
                let to_vantage = T::distance(query, self.matrix.row(*vantage));
                acc.offer(to_vantage, *vantage);

                let (first, second) = if to_vantage < *radius { (near, far) } else { (far, near) };
                self.visit(first, query, acc, budget);
                // The far side only holds candidates at distance of at least
                // |d(q, vantage) - radius|
                if (to_vantage - *radius).abs() <= acc.bound() {
                    self.visit(second, query, acc, budget);
                }
            }
        }
    }
}
