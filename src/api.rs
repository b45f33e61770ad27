//! The language-neutral API surface (§6): dataset lifecycle plus the five
//! query kinds, built on top of [`crate::dataset`], [`crate::worker`] and
//! [`crate::query`]. Booting a worker fleet, parsing WKT/CSV, and framing
//! wire messages are out-of-scope collaborator concerns (§1); this module
//! is the seam those collaborators call into once a dataset's geometries
//! have already been materialized in memory.

use std::collections::HashMap;

use tracing::info;

use crate::config::EngineConfig;
use crate::dataset::{Dataset, DatasetId};
use crate::error::{EngineError, EngineResult};
use crate::filter::Relation;
use crate::geometry::Shape;
use crate::query::result::ResultMode;
use crate::query::Query;

/// The index structures a dataset can be built with (§6 `buildIndex`
/// `indexType`). `TwoLayer` is the engine's native class-tagged two-grid
/// index (§3); `UniformGrid` is a coarser, classless grid kept for
/// workloads that never need the duplicate-free join guarantee and would
/// rather skip the class-assignment bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    TwoLayer,
    UniformGrid,
}

/// The engine: owns the immutable configuration and every loaded dataset.
/// Roughly `init`/`finalize`'s lifetime scope in §6, minus the fleet-boot
/// responsibility itself (an out-of-scope collaborator hands this engine
/// an already-running `config`).
pub struct Engine {
    config: EngineConfig,
    datasets: HashMap<DatasetId, Dataset>,
    next_id: u32,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        info!(
            worker_count = config.worker_count(),
            distribution_order = config.distribution_order(),
            partitioning_order = config.partitioning_order(),
            "engine initialized"
        );
        Self { config, datasets: HashMap::new(), next_id: 0 }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// §6 `prepareDataset` minus file parsing: register a dataset's
    /// already-materialized geometries, partition them over the two-grid,
    /// and build its `TwoLayer` index (`buildIndex` is folded in since this
    /// engine has no lazy/unpartitioned dataset state to keep around).
    pub fn prepare_dataset(&mut self, shapes: Vec<Shape>, index_kind: IndexKind) -> EngineResult<DatasetId> {
        if index_kind == IndexKind::UniformGrid {
            return Err(EngineError::FeatureUnsupported(
                "UniformGrid index construction is not implemented; use TwoLayer".into(),
            ));
        }
        let dataset = Dataset::build(shapes, &self.config)?;
        let id = DatasetId(self.next_id);
        self.next_id += 1;
        info!(dataset_id = id.0, geometry_count = dataset.len(), "dataset partitioned");
        self.datasets.insert(id, dataset);
        Ok(id)
    }

    pub fn unload_dataset(&mut self, id: DatasetId) -> EngineResult<()> {
        self.datasets
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| EngineError::InvalidParameter(format!("no such dataset {}", id.0)))
    }

    fn get(&self, id: DatasetId) -> EngineResult<&Dataset> {
        self.datasets
            .get(&id)
            .ok_or_else(|| EngineError::InvalidParameter(format!("no such dataset {}", id.0)))
    }

    /// §6 `query(query)`: run a single query against one (or, for joins,
    /// two) datasets.
    pub fn query(&self, dataset: DatasetId, other: Option<DatasetId>, query: Query, mode: ResultMode) -> EngineResult<crate::query::QueryResult> {
        match query {
            Query::Range { window } => Ok(crate::query::range::range_query(self.get(dataset)?, &window, mode)),
            Query::Knn { point, k } => Ok(crate::query::knn::knn_query(self.get(dataset)?, &point, k)),
            Query::DistanceJoin { epsilon } => {
                let s = self.get(other.ok_or_else(|| {
                    EngineError::InvalidParameter("DistanceJoin requires a second dataset".into())
                })?)?;
                Ok(crate::query::distance_join::distance_join(self.get(dataset)?, s, epsilon, mode))
            }
            Query::PredicateJoin { relation } => {
                let s = self.get(other.ok_or_else(|| {
                    EngineError::InvalidParameter("PredicateJoin requires a second dataset".into())
                })?)?;
                crate::worker::predicate_join(self.get(dataset)?, s, relation, mode)
            }
            Query::FindRelation => {
                let s = self.get(other.ok_or_else(|| {
                    EngineError::InvalidParameter("FindRelation requires a second dataset".into())
                })?)?;
                crate::worker::find_relation(self.get(dataset)?, s, mode)
            }
        }
    }

    /// §6 `query(batch[], queryType)`: run the same query kind over a batch
    /// of parameterizations (e.g. many range windows against one dataset),
    /// returning one result per input in order.
    pub fn query_batch(
        &self,
        dataset: DatasetId,
        other: Option<DatasetId>,
        queries: Vec<Query>,
        mode: ResultMode,
    ) -> Vec<EngineResult<crate::query::QueryResult>> {
        queries
            .into_iter()
            .map(|q| self.query(dataset, other, q, mode))
            .collect()
    }
}

/// A parsed range-query batch entry, as `loadRangeQueriesFromFile` (§6)
/// would hand back once the out-of-scope file-format collaborator has
/// decoded the file.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeQuerySpec {
    pub window: crate::geometry::Mbr2D,
    pub result_mode: ResultMode,
}

/// A parsed kNN-query batch entry, analogous to [`RangeQuerySpec`].
#[derive(Debug, Clone, PartialEq)]
pub struct KnnQuerySpec {
    pub point: crate::geometry::Point2D,
    pub k: usize,
}

/// Build a batch of [`Query::Range`] from already-parsed window specs,
/// standing in for §6's `loadRangeQueriesFromFile` once the file itself has
/// been read and decoded by an out-of-scope collaborator.
pub fn range_batch(specs: &[RangeQuerySpec]) -> Vec<Query> {
    specs.iter().map(|s| Query::Range { window: s.window }).collect()
}

/// Build a batch of [`Query::Knn`] from already-parsed specs, standing in
/// for §6's `loadKNNQueriesFromFile`.
pub fn knn_batch(specs: &[KnnQuerySpec]) -> Vec<Query> {
    specs.iter().map(|s| Query::Knn { point: s.point, k: s.k }).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Mbr2D, Point2D, SpatialType};

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

    fn engine() -> Engine {
        let config = EngineConfig::builder()
            .dataspace(Mbr2D::new(0., 0., 100., 100.))
            .distribution_order(2)
            .partitioning_order(4)
            .worker_count(1)
            .build()
            .unwrap();
        Engine::new(config)
    }

    #[test]
    fn prepare_and_query_a_range() {
        let mut e = engine();
        let id = e.prepare_dataset(vec![square(1., 1., 5., 5.)], IndexKind::TwoLayer).unwrap();
        let result = e
            .query(id, None, Query::Range { window: Mbr2D::new(0., 0., 10., 10.) }, ResultMode::Count)
            .unwrap();
        assert_eq!(result.into_count(), 1);
    }

    #[test]
    fn predicate_join_requires_a_second_dataset() {
        let mut e = engine();
        let id = e.prepare_dataset(vec![square(1., 1., 5., 5.)], IndexKind::TwoLayer).unwrap();
        let err = e
            .query(id, None, Query::PredicateJoin { relation: Relation::Intersects }, ResultMode::Count)
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidParameter(_)));
    }

    #[test]
    fn unload_then_query_fails() {
        let mut e = engine();
        let id = e.prepare_dataset(vec![square(1., 1., 5., 5.)], IndexKind::TwoLayer).unwrap();
        e.unload_dataset(id).unwrap();
        assert!(e.query(id, None, Query::Range { window: Mbr2D::new(0., 0., 1., 1.) }, ResultMode::Count).is_err());
    }

    #[test]
    fn uniform_grid_index_is_unsupported() {
        let mut e = engine();
        let err = e.prepare_dataset(vec![square(0., 0., 1., 1.)], IndexKind::UniformGrid).unwrap_err();
        assert!(matches!(err, EngineError::FeatureUnsupported(_)));
    }
}
