//! The query result reduction contract (§4.8, §5 "Ordering guarantees"):
//! each worker thread accumulates its own [`QueryResult`] and the engine
//! merges them pairwise via [`QueryResult::merge`], grounded in `coupe`'s
//! rayon fold/reduce idiom (`analysis.rs`'s parallel weight reductions).

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::filter::Relation;

/// How a query's matches should be reduced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultMode {
    /// Only count matches; cheapest, used when the caller only needs a
    /// cardinality (e.g. a selectivity estimate).
    Count,
    /// Collect every match.
    Collect,
    /// Keep only the `k` closest matches, ordered by ascending distance
    /// (kNN queries).
    Heap(usize),
}

/// A single matched pair, produced by a predicate join or relation query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairMatch {
    pub r: usize,
    pub s: usize,
    pub relation: Relation,
}

/// A single kNN hit: a candidate index and its distance to the query point.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Neighbor {
    index: usize,
    distance: f64,
}

impl Eq for Neighbor {}

impl Ord for Neighbor {
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance.partial_cmp(&other.distance).unwrap_or(Ordering::Equal)
    }
}

impl PartialOrd for Neighbor {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// The accumulated outcome of a query, reduced according to its
/// [`ResultMode`]. One instance lives per worker thread during a parallel
/// query and is folded into the final result via [`QueryResult::merge`].
#[derive(Debug, Clone)]
pub enum QueryResult {
    Count(u64),
    Pairs(Vec<PairMatch>),
    /// A bounded max-heap of the `k` nearest neighbors seen so far, sorted
    /// out (ascending by distance) only at the very end.
    Heap { k: usize, heap: BinaryHeap<Neighbor>, indices: Vec<(usize, f64)> },
}

impl QueryResult {
    pub fn new(mode: ResultMode) -> Self {
        match mode {
            ResultMode::Count => QueryResult::Count(0),
            ResultMode::Collect => QueryResult::Pairs(Vec::new()),
            ResultMode::Heap(k) => QueryResult::Heap { k, heap: BinaryHeap::new(), indices: Vec::new() },
        }
    }

    pub fn push_pair(&mut self, pair: PairMatch) {
        match self {
            QueryResult::Count(n) => *n += 1,
            QueryResult::Pairs(v) => v.push(pair),
            QueryResult::Heap { .. } => {
                panic!("push_pair called on a Heap-mode result; use push_neighbor instead")
            }
        }
    }

    pub fn push_neighbor(&mut self, index: usize, distance: f64) {
        match self {
            QueryResult::Heap { k, heap, .. } => {
                if heap.len() < *k {
                    heap.push(Neighbor { index, distance });
                } else if let Some(worst) = heap.peek() {
                    if distance < worst.distance {
                        heap.pop();
                        heap.push(Neighbor { index, distance });
                    }
                }
            }
            QueryResult::Count(n) => *n += 1,
            QueryResult::Pairs(_) => panic!("push_neighbor called on a Collect-mode result"),
        }
    }

    /// Merge another worker's partial result into this one, preserving the
    /// `k`-nearest invariant for heap-mode results (§5 "merge contract").
    pub fn merge(self, other: QueryResult) -> QueryResult {
        match (self, other) {
            (QueryResult::Count(a), QueryResult::Count(b)) => QueryResult::Count(a + b),
            (QueryResult::Pairs(mut a), QueryResult::Pairs(b)) => {
                a.extend(b);
                QueryResult::Pairs(a)
            }
            (QueryResult::Heap { k, mut heap, indices }, QueryResult::Heap { heap: other_heap, .. }) => {
                for n in other_heap.into_iter() {
                    if heap.len() < k {
                        heap.push(n);
                    } else if let Some(worst) = heap.peek() {
                        if n.distance < worst.distance {
                            heap.pop();
                            heap.push(n);
                        }
                    }
                }
                QueryResult::Heap { k, heap, indices }
            }
            (a, _) => a,
        }
    }

    /// Consume a `Count` result.
    pub fn into_count(self) -> u64 {
        match self {
            QueryResult::Count(n) => n,
            _ => panic!("into_count called on a non-Count result"),
        }
    }

    /// Consume a `Collect` result.
    pub fn into_pairs(self) -> Vec<PairMatch> {
        match self {
            QueryResult::Pairs(v) => v,
            _ => panic!("into_pairs called on a non-Collect result"),
        }
    }

    /// Consume a `Heap` result, sorted ascending by distance.
    pub fn into_sorted_neighbors(self) -> Vec<(usize, f64)> {
        match self {
            QueryResult::Heap { heap, .. } => {
                let mut v: Vec<(usize, f64)> = heap.into_iter().map(|n| (n.index, n.distance)).collect();
                v.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap());
                v
            }
            _ => panic!("into_sorted_neighbors called on a non-Heap result"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_merges_by_addition() {
        let a = QueryResult::Count(3);
        let b = QueryResult::Count(4);
        assert_eq!(a.merge(b).into_count(), 7);
    }

    #[test]
    fn pairs_merge_by_concatenation() {
        let mut a = QueryResult::new(ResultMode::Collect);
        a.push_pair(PairMatch { r: 0, s: 1, relation: Relation::Intersects });
        let mut b = QueryResult::new(ResultMode::Collect);
        b.push_pair(PairMatch { r: 2, s: 3, relation: Relation::Meets });
        assert_eq!(a.merge(b).into_pairs().len(), 2);
    }

    #[test]
    fn heap_keeps_only_the_k_closest_across_a_merge() {
        let mut a = QueryResult::new(ResultMode::Heap(2));
        a.push_neighbor(0, 5.0);
        a.push_neighbor(1, 1.0);
        let mut b = QueryResult::new(ResultMode::Heap(2));
        b.push_neighbor(2, 3.0);
        b.push_neighbor(3, 0.5);
        let merged = a.merge(b).into_sorted_neighbors();
        assert_eq!(merged, vec![(3, 0.5), (1, 1.0)]);
    }
}
