//! The APRIL intermediate filter (§4.4): composes the interval-list joiners
//! over `(ALL, FULL)` pairs to turn an MBR-intersection case into either a
//! final relation, a true negative, or a narrowed refinement tag.
//!
//! Grounded in `Hecatoncheir/src/APRIL/filter.cpp`'s per-case dispatch
//! (`specializedTopologyRinSContainment`, `...SinRContainment`,
//! `...Equal`, and the generic intersect path), reshaped into a single
//! `Verdict` enum instead of an `int` status code plus an out-parameter.

use crate::geometry::MbrCase;
use crate::intervals::{self, Hybrid, Symmetric};

/// A final, already-decided topological relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    Disjoint,
    Meets,
    Equals,
    Inside,
    Covers,
    CoveredBy,
    Contains,
    Intersects,
}

/// A narrowed set of candidate relations the exact refiner must
/// discriminate between. Each variant names exactly the subset the filter's
/// guarantee promises: eliminated relations are never produced here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refinement {
    InsideCoveredByIntersect,
    DisjointInsideCoveredByMeetIntersect,
    ContainsCoversIntersect,
    DisjointContainsCoversMeetIntersect,
    EqualCoversCoveredByIntersect,
    CoveredByIntersect,
    CoversIntersect,
    MeetsIntersect,
    Full,
}

/// The outcome of the APRIL intermediate filter for one candidate pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Final(Relation),
    Refine(Refinement),
}

/// A geometry's APRIL interval lists, as seen by the filter.
pub struct AprilPair<'a> {
    pub all: &'a [(u32, u32)],
    pub full: &'a [(u32, u32)],
}

/// Apply the APRIL intermediate filter to a candidate pair given which MBR
/// case the sweep routed it through (§4.4).
pub fn apply(case: MbrCase, r: AprilPair, s: AprilPair) -> Verdict {
    match case {
        MbrCase::Intersect => generic_intersect(r, s),
        MbrCase::RInS => r_in_s(r, s),
        MbrCase::SInR => s_in_r(r, s),
        MbrCase::Equal => equal(r, s),
    }
}

fn generic_intersect(r: AprilPair, s: AprilPair) -> Verdict {
    if !intervals::intersect(r.all, s.all) {
        return Verdict::Final(Relation::Disjoint);
    }
    if intervals::intersect(r.all, s.full) || intervals::intersect(r.full, s.all) {
        return Verdict::Final(Relation::Intersects);
    }
    Verdict::Refine(Refinement::Full)
}

fn r_in_s(r: AprilPair, s: AprilPair) -> Verdict {
    match intervals::hybrid(r.all, s.all) {
        Hybrid::Disjoint => Verdict::Final(Relation::Disjoint),
        Hybrid::RInS => match intervals::hybrid(r.all, s.full) {
            Hybrid::RInS => Verdict::Final(Relation::Inside),
            Hybrid::Intersect => Verdict::Refine(Refinement::InsideCoveredByIntersect),
            Hybrid::Disjoint => Verdict::Refine(Refinement::DisjointInsideCoveredByMeetIntersect),
        },
        Hybrid::Intersect => {
            if intervals::intersect(r.all, s.full) || intervals::intersect(r.full, s.all) {
                Verdict::Final(Relation::Intersects)
            } else {
                Verdict::Refine(Refinement::DisjointInsideCoveredByMeetIntersect)
            }
        }
    }
}

fn s_in_r(r: AprilPair, s: AprilPair) -> Verdict {
    // mirror of r_in_s with R and S swapped, relabeled back to R's frame.
    match intervals::hybrid(s.all, r.all) {
        Hybrid::Disjoint => Verdict::Final(Relation::Disjoint),
        Hybrid::RInS => match intervals::hybrid(s.all, r.full) {
            Hybrid::RInS => Verdict::Final(Relation::Contains),
            Hybrid::Intersect => Verdict::Refine(Refinement::ContainsCoversIntersect),
            Hybrid::Disjoint => {
                Verdict::Refine(Refinement::DisjointContainsCoversMeetIntersect)
            }
        },
        Hybrid::Intersect => {
            if intervals::intersect(r.all, s.full) || intervals::intersect(r.full, s.all) {
                Verdict::Final(Relation::Intersects)
            } else {
                Verdict::Refine(Refinement::DisjointContainsCoversMeetIntersect)
            }
        }
    }
}

fn equal(r: AprilPair, s: AprilPair) -> Verdict {
    match intervals::symmetric(r.all, s.all) {
        Symmetric::Match => Verdict::Refine(Refinement::EqualCoversCoveredByIntersect),
        Symmetric::RInS => match intervals::hybrid(r.all, s.full) {
            Hybrid::RInS => Verdict::Final(Relation::Inside),
            _ => Verdict::Refine(Refinement::CoveredByIntersect),
        },
        Symmetric::SInR => match intervals::hybrid(s.all, r.full) {
            Hybrid::RInS => Verdict::Final(Relation::Contains),
            _ => Verdict::Refine(Refinement::CoversIntersect),
        },
        Symmetric::Disjoint => Verdict::Final(Relation::Disjoint),
        // §4.4: box-equal with neither ALL list containing the other never
        // needs the full Covers/CoveredBy ambiguity — a single exact `meets`
        // check decides between the two relations reachable here.
        Symmetric::Intersect => Verdict::Refine(Refinement::MeetsIntersect),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disjoint_all_lists_short_circuit_to_disjoint() {
        let r = AprilPair { all: &[(0, 5)], full: &[] };
        let s = AprilPair { all: &[(10, 15)], full: &[] };
        assert_eq!(apply(MbrCase::Intersect, r, s), Verdict::Final(Relation::Disjoint));
    }

    #[test]
    fn full_overlap_is_a_true_intersect_hit() {
        let r = AprilPair { all: &[(0, 10)], full: &[(2, 8)] };
        let s = AprilPair { all: &[(5, 15)], full: &[] };
        assert_eq!(apply(MbrCase::Intersect, r, s), Verdict::Final(Relation::Intersects));
    }

    #[test]
    fn r_in_s_full_containment_is_inside() {
        let r = AprilPair { all: &[(2, 4)], full: &[(2, 4)] };
        let s = AprilPair { all: &[(0, 10)], full: &[(1, 9)] };
        assert_eq!(apply(MbrCase::RInS, r, s), Verdict::Final(Relation::Inside));
    }

    #[test]
    fn equal_case_with_overlapping_all_lists_refines_to_meets_or_intersect() {
        let r = AprilPair { all: &[(0, 10)], full: &[(1, 9)] };
        let s = AprilPair { all: &[(5, 15)], full: &[(6, 14)] };
        assert_eq!(apply(MbrCase::Equal, r, s), Verdict::Refine(Refinement::MeetsIntersect));
    }

    #[test]
    fn equal_all_lists_refine_to_equal_family() {
        let r = AprilPair { all: &[(0, 10)], full: &[(1, 9)] };
        let s = AprilPair { all: &[(0, 10)], full: &[(1, 9)] };
        assert_eq!(
            apply(MbrCase::Equal, r, s),
            Verdict::Refine(Refinement::EqualCoversCoveredByIntersect)
        );
    }
}
