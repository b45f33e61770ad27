//! The pair pipeline (§4.7): classify the MBR case, run the APRIL
//! intermediate filter, and fall back to the exact refiner only for the
//! candidates the filter could not decide on its own.
//!
//! Grounded in `Hecatoncheir/src/TwoLayer/intersection_join_filter.cpp`'s
//! `forwardPair` plus `Hecatoncheir/src/refinement/topology.cpp`'s
//! refinement dispatch, composed here into one function instead of the
//! original's callback-threaded control flow.

use crate::april::AprilData;
use crate::filter::{self, AprilPair, Relation, Verdict};
use crate::geometry::Shape;
use crate::sweep::Candidate;

/// Read-only access to a dataset's geometries and their APRIL rasters,
/// indexed the same way [`crate::partition::store::GeometryRef::index`] is.
/// Implemented by [`crate::dataset::Dataset`]; kept as a trait here so the
/// pipeline has no dependency on how geometries are stored.
pub trait GeometrySource {
    fn shape(&self, index: usize) -> &Shape;
    fn april(&self, index: usize) -> &AprilData;
}

/// The fully resolved outcome of running one candidate pair through the
/// pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PairResult {
    pub r: usize,
    pub s: usize,
    pub relation: Relation,
}

/// Run the three-stage filter-refine pipeline on a single candidate pair
/// (§4.7): MBR case, then APRIL filter, then exact refinement only if the
/// filter left a [`Verdict::Refine`].
pub fn resolve_pair(candidate: Candidate, r_source: &dyn GeometrySource, s_source: &dyn GeometrySource) -> PairResult {
    let r_shape = r_source.shape(candidate.r);
    let s_shape = s_source.shape(candidate.s);
    let case = r_shape.mbr.case(&s_shape.mbr);

    let r_april = r_source.april(candidate.r);
    let s_april = s_source.april(candidate.s);
    let verdict = filter::apply(
        case,
        AprilPair { all: &r_april.all, full: &r_april.full },
        AprilPair { all: &s_april.all, full: &s_april.full },
    );

    let relation = match verdict {
        Verdict::Final(rel) => rel,
        Verdict::Refine(tag) => crate::relate::refine(tag, r_shape, s_shape),
    };

    PairResult { r: candidate.r, s: candidate.s, relation }
}

/// Run the pipeline over every candidate the sweep produced for one fine
/// cell, keeping only pairs that satisfy `keep` (the query's predicate,
/// e.g. `Relation::Intersects` for a predicate join, or "anything but
/// Disjoint" for `FindRelation`).
pub fn resolve_candidates(
    candidates: &[Candidate],
    r_source: &dyn GeometrySource,
    s_source: &dyn GeometrySource,
    keep: impl Fn(Relation) -> bool,
) -> Vec<PairResult> {
    candidates
        .iter()
        .map(|&c| resolve_pair(c, r_source, s_source))
        .filter(|result| keep(result.relation))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Point2D, SpatialType};

    struct FixedSource {
        shapes: Vec<Shape>,
        aprils: Vec<AprilData>,
    }

    impl GeometrySource for FixedSource {
        fn shape(&self, index: usize) -> &Shape {
            &self.shapes[index]
        }
        fn april(&self, index: usize) -> &AprilData {
            &self.aprils[index]
        }
    }

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
    fn disjoint_shapes_resolve_without_touching_exact_geometry() {
        let r = square(0., 0., 1., 1.);
        let s = square(100., 100., 101., 101.);
        let source = FixedSource {
            shapes: vec![r, s],
            aprils: vec![
                AprilData { all: vec![(0, 5)], full: vec![], section_id: 0 },
                AprilData { all: vec![(50, 55)], full: vec![], section_id: 0 },
            ],
        };
        let result = resolve_pair(Candidate { r: 0, s: 1 }, &source, &source);
        assert_eq!(result.relation, Relation::Disjoint);
    }

    #[test]
    fn full_overlap_resolves_to_intersects_without_refinement() {
        let r = square(0., 0., 10., 10.);
        let s = square(5., 5., 15., 15.);
        let source = FixedSource {
            shapes: vec![r, s],
            aprils: vec![
                AprilData { all: vec![(0, 10)], full: vec![(2, 8)], section_id: 0 },
                AprilData { all: vec![(5, 15)], full: vec![], section_id: 0 },
            ],
        };
        let result = resolve_pair(Candidate { r: 0, s: 1 }, &source, &source);
        assert_eq!(result.relation, Relation::Intersects);
    }

    #[test]
    fn refine_path_reaches_exact_geometry_for_ambiguous_aprils() {
        // r's MBR sits inside s's MBR, matching the RInS case below.
        let r = square(2., 2., 8., 8.);
        let s = square(0., 0., 10., 10.);
        let source = FixedSource {
            shapes: vec![r, s],
            aprils: vec![
                AprilData { all: vec![(2, 8)], full: vec![(2, 8)], section_id: 0 },
                AprilData { all: vec![(0, 10)], full: vec![(1, 3)], section_id: 0 },
            ],
        };
        let result = resolve_pair(Candidate { r: 0, s: 1 }, &source, &source);
        assert_eq!(result.relation, Relation::Inside);
    }
}
