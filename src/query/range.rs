//! Range queries (§4.8): every geometry of a dataset intersecting a window,
//! using the fine grid to skip whole cells outside the window before
//! touching any geometry.
//!
//! Grounded in `coupe`'s rayon fold/reduce idiom for parallel accumulation
//! (e.g. `analysis.rs`'s weight sums), generalized from a numeric fold to
//! the [`QueryResult`] merge contract.

use rayon::prelude::*;
use tracing::instrument;

use crate::dataset::Dataset;
use crate::geometry::Mbr2D;
use crate::query::result::{QueryResult, ResultMode};

/// Run a range query against `dataset`: every geometry whose MBR intersects
/// `window`, refined against the exact geometry to drop MBR-only hits.
#[instrument(skip(dataset), fields(len = dataset.len()))]
pub fn range_query(dataset: &Dataset, window: &Mbr2D, mode: ResultMode) -> QueryResult {
    let grid = dataset.grid();
    let cell_ids = grid.fine_cells_in(window);

    cell_ids
        .par_iter()
        .map(|&cell_id| {
            let mut local = QueryResult::new(mode);
            let Some(container) = dataset.store().get(cell_id) else {
                return local;
            };
            for index in container.all_ids() {
                let shape = dataset.shape(index);
                if !shape.mbr.intersects(window) {
                    continue;
                }
                if shape.intersects_rect(window) {
                    match &mut local {
                        QueryResult::Count(n) => *n += 1,
                        QueryResult::Pairs(v) => v.push(crate::query::result::PairMatch {
                            r: index,
                            s: index,
                            relation: crate::filter::Relation::Intersects,
                        }),
                        QueryResult::Heap { .. } => unreachable!("range queries never use Heap mode"),
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

    fn square(x0: f64, y0: f64, x1: f64, y1: f64) -> Shape {
        Shape::new(
            SpatialType::Polygon,
            vec![
                Point2D::new(x0, y0),
                Point2D::new(x1, y0),
                Point2D::new(x1, y1),
                Point2D::new(x0, y1),
            ],
        )
        .unwrap()
    }

    #[test]
    fn range_query_finds_only_intersecting_geometries() {
        let config = EngineConfig::builder()
            .dataspace(Mbr2D::new(0., 0., 100., 100.))
            .distribution_order(2)
            .partitioning_order(4)
            .worker_count(1)
            .build()
            .unwrap();
        let dataset = Dataset::build(
            vec![square(1., 1., 5., 5.), square(90., 90., 95., 95.)],
            &config,
        )
        .unwrap();

        let result = range_query(&dataset, &Mbr2D::new(0., 0., 10., 10.), ResultMode::Count);
        assert_eq!(result.into_count(), 1);
    }
}
