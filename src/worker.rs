//! Partition-level parallelism (C9): one rayon task per fine cell shared by
//! two datasets, each running the join matrix (§4.5) and the pair pipeline
//! (§4.7), folding into a thread-local [`QueryResult`] that is merged back
//! via [`QueryResult::merge`] (§5).
//!
//! Grounded in `coupe`'s `rayon::join`/`par_iter` fan-out used throughout
//! `algorithms/` (e.g. the recursive bisection's left/right `rayon::join`),
//! generalized from a recursive binary split to a flat per-cell fan-out
//! since fine cells have no nesting relationship worth exploiting here.
//!
//! A distributed deployment also needs to exchange, across worker
//! boundaries, the geometries that fall within a border region (e.g. for
//! ε-distance joins whose search radius crosses into a neighbor's
//! partition). [`Transport`] is the seam a concrete MPI-like transport
//! plugs into (Design Notes §9); no such transport ships in this crate.

use std::sync::atomic::{AtomicBool, Ordering};

use rayon::prelude::*;
use tracing::{instrument, warn};

use crate::dataset::Dataset;
use crate::error::{EngineError, EngineResult, Severity};
use crate::filter::Relation;
use crate::partition::JOIN_ORDER;
use crate::pipeline::{self, PairResult};
use crate::query::result::{PairMatch, QueryResult, ResultMode};
use crate::sweep;

/// The narrow interface a distributed deployment's border-exchange
/// transport must implement. The engine never depends on a concrete
/// transport (MPI, TCP, shared memory) directly, only on this trait.
pub trait Transport: Send + Sync {
    /// Send this worker's border geometries (as opaque bytes, already
    /// serialized by [`crate::persist`]) to `to_worker`.
    fn send_border(&self, to_worker: u32, payload: &[u8]) -> EngineResult<()>;

    /// Block until a border payload from any peer arrives.
    fn recv_border(&self) -> EngineResult<Vec<u8>>;
}

/// Run a predicate join between `r` and `s`: every pair the join matrix
/// produces whose resolved relation equals `relation`, reduced under
/// `mode`.
#[instrument(skip(r, s), fields(r_len = r.len(), s_len = s.len()))]
pub fn predicate_join(r: &Dataset, s: &Dataset, relation: Relation, mode: ResultMode) -> EngineResult<QueryResult> {
    run_join(r, s, mode, move |rel| rel == relation)
}

/// Run a `FindRelation` query: every pair the join matrix produces, tagged
/// with whichever relation it resolves to (including `Disjoint`, which a
/// predicate join would never surface since the sweep already excludes
/// MBR-disjoint pairs from most cells).
#[instrument(skip(r, s), fields(r_len = r.len(), s_len = s.len()))]
pub fn find_relation(r: &Dataset, s: &Dataset, mode: ResultMode) -> EngineResult<QueryResult> {
    run_join(r, s, mode, |_| true)
}

fn run_join(
    r: &Dataset,
    s: &Dataset,
    mode: ResultMode,
    keep: impl Fn(Relation) -> bool + Sync,
) -> EngineResult<QueryResult> {
    if !r.grid().is_congruent_with(s.grid()) {
        return Err(EngineError::InvalidParameter(
            "predicate joins require congruent two-grids on both datasets".into(),
        ));
    }

    let cancelled = AtomicBool::new(false);
    let shared_cells: Vec<u64> = r
        .store()
        .cell_ids()
        .filter(|id| s.store().get(*id).is_some())
        .collect();

    let result = shared_cells
        .par_iter()
        .map(|&cell_id| {
            if cancelled.load(Ordering::Relaxed) {
                return QueryResult::new(mode);
            }
            match run_cell(r, s, cell_id, mode, &keep) {
                Ok(local) => local,
                Err(err) => {
                    warn!(%err, cell_id, "pair pipeline failed for cell");
                    if err.severity() != Severity::Recoverable {
                        cancelled.store(true, Ordering::Relaxed);
                    }
                    QueryResult::new(mode)
                }
            }
        })
        .reduce(|| QueryResult::new(mode), QueryResult::merge);

    if cancelled.load(Ordering::Relaxed) {
        return Err(EngineError::InvalidQueryType(
            "query cancelled: a thread-fatal error occurred in at least one partition".into(),
        ));
    }
    Ok(result)
}

fn run_cell(
    r: &Dataset,
    s: &Dataset,
    cell_id: u64,
    mode: ResultMode,
    keep: impl Fn(Relation) -> bool,
) -> EngineResult<QueryResult> {
    let r_container = r.store().get(cell_id).ok_or_else(|| {
        EngineError::InvalidQueryType(format!("cell {cell_id} missing from R's partition store"))
    })?;
    let s_container = s.store().get(cell_id).ok_or_else(|| {
        EngineError::InvalidQueryType(format!("cell {cell_id} missing from S's partition store"))
    })?;

    let mut local = QueryResult::new(mode);
    for &(cr, cs) in JOIN_ORDER.iter() {
        let candidates = sweep::sweep_roll_y(r_container.bucket(cr), cr, s_container.bucket(cs), cs);
        let resolved: Vec<PairResult> = pipeline::resolve_candidates(&candidates, r, s, &keep);
        for PairResult { r: r_idx, s: s_idx, relation } in resolved {
            match &mut local {
                QueryResult::Count(n) => *n += 1,
                QueryResult::Pairs(v) => v.push(PairMatch { r: r_idx, s: s_idx, relation }),
                QueryResult::Heap { .. } => {
                    return Err(EngineError::InvalidQueryType(
                        "predicate/relation queries never use Heap result mode".into(),
                    ))
                }
            }
        }
    }
    Ok(local)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::geometry::{Mbr2D, Point2D, Shape, SpatialType};

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
    fn predicate_join_finds_intersecting_pair_across_datasets() {
        let config = EngineConfig::builder()
            .dataspace(Mbr2D::new(0., 0., 100., 100.))
            .distribution_order(2)
            .partitioning_order(4)
            .worker_count(1)
            .build()
            .unwrap();
        let r = Dataset::build(vec![square(1., 1., 10., 10.)], &config).unwrap();
        let s = Dataset::build(vec![square(5., 5., 15., 15.)], &config).unwrap();

        let result = predicate_join(&r, &s, Relation::Intersects, ResultMode::Count).unwrap();
        assert_eq!(result.into_count(), 1);
    }

    #[test]
    fn predicate_join_rejects_incongruent_grids() {
        let a = EngineConfig::builder()
            .dataspace(Mbr2D::new(0., 0., 100., 100.))
            .build()
            .unwrap();
        let b = EngineConfig::builder()
            .dataspace(Mbr2D::new(0., 0., 50., 50.))
            .build()
            .unwrap();
        let r = Dataset::build(vec![square(1., 1., 2., 2.)], &a).unwrap();
        let s = Dataset::build(vec![square(1., 1., 2., 2.)], &b).unwrap();
        assert!(predicate_join(&r, &s, Relation::Intersects, ResultMode::Count).is_err());
    }
}
