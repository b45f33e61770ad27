//! k-nearest-neighbor queries (§4.8): expand outward ring-by-ring over fine
//! cells around the query point until `k` candidates have been seen and no
//! closer cell remains, then refine by exact distance.
//!
//! Grounded in the same Hilbert/Z-curve locality argument `coupe`'s
//! `hilbert_curve.rs`/`z_curve.rs` partitioners rely on: geometries near
//! each other on the fine grid are near each other in the dataspace, so a
//! ring search over grid cells bounds how much of the dataset must be
//! touched.

use tracing::instrument;

use crate::dataset::Dataset;
use crate::geometry::Point2D;
use crate::query::result::{QueryResult, ResultMode};

/// Run a kNN query: the `k` geometries closest to `point`, by exact
/// Euclidean distance.
#[instrument(skip(dataset), fields(len = dataset.len()))]
pub fn knn_query(dataset: &Dataset, point: &Point2D, k: usize) -> QueryResult {
    let mut result = QueryResult::new(ResultMode::Heap(k));
    if k == 0 || dataset.is_empty() {
        return result;
    }

    let grid = dataset.grid();
    let fine_dim = grid.fine_dim();
    let mut ring = 0u64;
    let mut seen = std::collections::HashSet::new();

    loop {
        let window = ring_window(grid, point, ring);
        let cell_ids = grid.fine_cells_in(&window);
        let mut new_cells = false;
        for cell_id in cell_ids {
            if cell_id >= fine_dim * fine_dim || !seen.insert(cell_id) {
                continue;
            }
            new_cells = true;
            if let Some(container) = dataset.store().get(cell_id) {
                for index in container.all_ids() {
                    let distance = dataset.shape(index).mbr.distance_to_point(point);
                    result.push_neighbor(index, distance);
                }
            }
        }

        let covers_whole_dataspace = window.contains(&grid.dataspace) || !new_cells && ring > 0;
        let have_enough = matches!(&result, QueryResult::Heap { heap, k, .. } if heap.len() >= *k);
        if covers_whole_dataspace || (have_enough && ring > 1) {
            break;
        }
        ring += 1;
        if ring > fine_dim * 2 {
            break;
        }
    }

    result
}

fn ring_window(grid: &crate::partition::TwoGrid, point: &Point2D, ring: u64) -> crate::geometry::Mbr2D {
    let cell_span = (grid.dataspace.x_extent() / grid.fine_dim().max(1) as f64)
        .max(grid.dataspace.y_extent() / grid.fine_dim().max(1) as f64);
    let radius = cell_span * (ring as f64 + 1.0);
    crate::geometry::Mbr2D::new(
        point.x - radius,
        point.y - radius,
        point.x + radius,
        point.y + radius,
    )
}
