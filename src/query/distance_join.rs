//! ε-distance joins (§4.8): all pairs `(r, s)` from two datasets within
//! `epsilon` of each other, found by expanding each `R` geometry's MBR by
//! `epsilon` and scanning the fine cells it now overlaps in `S`.
//!
//! A true distributed join also exchanges the geometries within `epsilon`
//! of a worker's border with its neighbors; that exchange sits behind the
//! `Transport` seam in [`crate::worker`] (Design Notes §9) and is out of
//! scope for the local, single-process path implemented here.

use rayon::prelude::*;
use tracing::instrument;

use crate::dataset::Dataset;
use crate::geometry::Mbr2D;
use crate::query::result::{PairMatch, QueryResult, ResultMode};

/// Run an ε-distance join between `r` and `s`: every pair whose exact
/// Euclidean distance is at most `epsilon`. Both datasets must share a
/// congruent grid (§5 "Invariants across datasets").
#[instrument(skip(r, s), fields(r_len = r.len(), s_len = s.len()))]
pub fn distance_join(r: &Dataset, s: &Dataset, epsilon: f64, mode: ResultMode) -> QueryResult {
    if !r.grid().is_congruent_with(s.grid()) {
        return QueryResult::new(mode);
    }

    (0..r.len())
        .into_par_iter()
        .map(|r_index| {
            let mut local = QueryResult::new(mode);
            let r_mbr = r.shape(r_index).mbr;
            let window = Mbr2D::new(
                r_mbr.x_min - epsilon,
                r_mbr.y_min - epsilon,
                r_mbr.x_max + epsilon,
                r_mbr.y_max + epsilon,
            );
            for cell_id in s.grid().fine_cells_in(&window) {
                let Some(container) = s.store().get(cell_id) else {
                    continue;
                };
                for s_index in container.all_ids() {
                    if r_mbr.distance_to_mbr(&s.shape(s_index).mbr) > epsilon {
                        continue;
                    }
                    let distance = r.shape(r_index).distance(s.shape(s_index));
                    if distance <= epsilon {
                        match &mut local {
                            QueryResult::Count(n) => *n += 1,
                            QueryResult::Pairs(v) => v.push(PairMatch {
                                r: r_index,
                                s: s_index,
                                relation: crate::filter::Relation::Intersects,
                            }),
                            QueryResult::Heap { .. } => unreachable!("distance joins never use Heap mode"),
                        }
                    }
                }
            }
            local
        })
        .reduce(|| QueryResult::new(mode), QueryResult::merge)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::geometry::{Point2D, Shape, SpatialType};

    fn point_shape(x: f64, y: f64) -> Shape {
        Shape::new(SpatialType::Point, vec![Point2D::new(x, y)]).unwrap()
    }

    #[test]
    fn distance_join_finds_close_pairs_and_skips_far_ones() {
        let config = EngineConfig::builder()
            .dataspace(Mbr2D::new(0., 0., 100., 100.))
            .distribution_order(2)
            .partitioning_order(4)
            .worker_count(1)
            .build()
            .unwrap();
        let r = Dataset::build(vec![point_shape(0., 0.)], &config).unwrap();
        let s = Dataset::build(vec![point_shape(1., 0.), point_shape(50., 50.)], &config).unwrap();

        let result = distance_join(&r, &s, 2.0, ResultMode::Collect);
        let pairs = result.into_pairs();
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].s, 0);
    }
}
