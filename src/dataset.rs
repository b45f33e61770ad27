//! The dataset arena (Design Notes §9, "ownership cycles"): geometries and
//! their APRIL rasters own their data here; every other structure
//! (`PartitionStore`, sweep candidates, pipeline results) holds only a
//! `usize` index into this arena, never a second copy of the geometry.
//!
//! Grounded in the arena-of-indices pattern `coupe`'s algorithms use for
//! point/weight slices (points and weights are always passed as parallel
//! slices indexed by the same id, never bundled per-point).

use tracing::{debug, instrument};

use crate::april::{self, AprilData};
use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::geometry::{Mbr2D, Shape};
use crate::partition::store::{GeometryRef, PartitionStore};
use crate::partition::{CellAssignment, TwoGrid};
use crate::persist::{self, PartitionRecord};
use crate::pipeline::GeometrySource;

/// A handle identifying one loaded dataset within an [`crate::EngineConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DatasetId(pub u32);

/// One dataset's geometries, APRIL rasters, and partition index, all keyed
/// by the same arena index.
#[derive(Debug, Clone)]
pub struct Dataset {
    shapes: Vec<Shape>,
    april: Vec<AprilData>,
    assignments: Vec<Vec<CellAssignment>>,
    grid: TwoGrid,
    store: PartitionStore,
}

impl Dataset {
    /// Build a dataset from a set of already-parsed shapes: compute each
    /// geometry's APRIL raster, assign it to its Two-Layer cells, and
    /// finalize the partition store (§4.2, §4.5).
    ///
    /// Loading from disk or parsing a wire format is an out-of-scope
    /// collaborator concern; callers hand in already-materialized [`Shape`]s.
    #[instrument(skip(shapes, config), fields(shape_count = shapes.len()))]
    pub fn build(shapes: Vec<Shape>, config: &EngineConfig) -> EngineResult<Self> {
        let grid = config.two_grid();
        let mut april = Vec::with_capacity(shapes.len());
        let mut assignments = Vec::with_capacity(shapes.len());
        let mut store = PartitionStore::new();

        for (index, shape) in shapes.iter().enumerate() {
            let data = april::generate_april(shape, &grid.dataspace, config.april_order(), index as u32)?;
            let cells = grid.assign(&shape.mbr);
            for assignment in &cells {
                store.insert(assignment.fine_cell_id, assignment.class, GeometryRef { index, mbr: shape.mbr });
            }
            april.push(data);
            assignments.push(cells);
        }
        store.finalize();
        debug!(cells = store.len(), "partitioned dataset");

        Ok(Self { shapes, april, assignments, grid, store })
    }

    /// Serialize every geometry and its fine-cell assignments into the
    /// partition-file record shape (§6), keyed by its arena index.
    pub fn to_partition_records(&self) -> Vec<PartitionRecord> {
        let ids: Vec<u64> = (0..self.shapes.len() as u64).collect();
        persist::shapes_to_records(&ids, &self.shapes, &self.assignments)
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    pub fn grid(&self) -> &TwoGrid {
        &self.grid
    }

    pub fn store(&self) -> &PartitionStore {
        &self.store
    }

    pub fn mbr(&self, index: usize) -> EngineResult<Mbr2D> {
        self.shapes
            .get(index)
            .map(|s| s.mbr)
            .ok_or_else(|| EngineError::InvalidParameter(format!("no geometry at index {index}")))
    }
}

impl GeometrySource for Dataset {
    fn shape(&self, index: usize) -> &Shape {
        &self.shapes[index]
    }

    fn april(&self, index: usize) -> &AprilData {
        &self.april[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Point2D, SpatialType};

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
    fn build_partitions_every_geometry_into_the_store() {
        let config = EngineConfig::builder()
            .dataspace(Mbr2D::new(0., 0., 100., 100.))
            .distribution_order(2)
            .partitioning_order(4)
            .worker_count(1)
            .build()
            .unwrap();
        let dataset = Dataset::build(vec![square(1., 1., 5., 5.), square(50., 50., 60., 60.)], &config).unwrap();
        assert_eq!(dataset.len(), 2);
        assert!(!dataset.store().is_empty());
    }

    #[test]
    fn partition_records_carry_every_geometrys_cell_assignments() {
        let config = EngineConfig::builder()
            .dataspace(Mbr2D::new(0., 0., 100., 100.))
            .distribution_order(2)
            .partitioning_order(4)
            .worker_count(1)
            .build()
            .unwrap();
        let dataset = Dataset::build(vec![square(1., 1., 5., 5.), square(50., 50., 60., 60.)], &config).unwrap();
        let records = dataset.to_partition_records();
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| !r.assignments.is_empty()));
        assert_eq!(records[0].rec_id, 0);
        assert_eq!(records[1].rec_id, 1);
    }

    #[test]
    fn mbr_lookup_rejects_out_of_range_index() {
        let config = EngineConfig::builder()
            .dataspace(Mbr2D::new(0., 0., 10., 10.))
            .build()
            .unwrap();
        let dataset = Dataset::build(vec![square(0., 0., 1., 1.)], &config).unwrap();
        assert!(dataset.mbr(5).is_err());
    }
}
