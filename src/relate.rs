//! DE-9IM mask matching (§6) and the exact refiner that resolves a
//! [`crate::filter::Refinement`] tag down to a single [`crate::filter::Relation`].
//!
//! The canonical masks are the ones enumerated in §6; `Shape::relate_matrix`
//! (geometry module) produces the matrix string via `geo::Relate`, playing
//! the role the original's boost-style `relate()` call does in
//! `Hecatoncheir/src/refinement/topology.cpp`.

use crate::filter::{Refinement, Relation};
use crate::geometry::Shape;

/// Pattern match rule: `T` matches `0`/`1`/`2`, `F` matches `F`, `*` matches
/// anything.
fn mask_matches(matrix: &str, mask: &str) -> bool {
    if matrix.len() != 9 || mask.len() != 9 {
        return false;
    }
    matrix.bytes().zip(mask.bytes()).all(|(m, p)| match p {
        b'*' => true,
        b'F' => m == b'F',
        b'T' => m != b'F',
        _ => false,
    })
}

fn any_mask(matrix: &str, masks: &[&str]) -> bool {
    masks.iter().any(|m| mask_matches(matrix, m))
}

const INSIDE: &[&str] = &["T*F**F***"];
const CONTAINS: &[&str] = &["T*****FF*"];
const COVERS: &[&str] = &["T*****FF*", "*T****FF*", "***T**FF*", "****T*FF*"];
const COVERED_BY: &[&str] = &["T*F**F***", "*TF**F***", "**FT*F***", "**F*TF***"];
const EQUALS: &[&str] = &["T*F**FFF*"];
const MEETS: &[&str] = &["FT*******", "F**T*****", "F***T****"];
const DISJOINT: &[&str] = &["FF*FF****"];
const INTERSECTS: &[&str] = &["T********", "*T*******", "***T*****", "****T****"];

/// The full topology relation of `r` with respect to `s`, tried in order
/// from most to least specific. Used when no APRIL narrowing applies.
pub fn full_relate(r: &Shape, s: &Shape) -> Relation {
    let matrix = r.relate_matrix(s);
    classify(&matrix, &[
        Relation::Disjoint,
        Relation::Equals,
        Relation::Inside,
        Relation::Contains,
        Relation::Covers,
        Relation::CoveredBy,
        Relation::Meets,
        Relation::Intersects,
    ])
}

fn masks_for(relation: Relation) -> &'static [&'static str] {
    match relation {
        Relation::Disjoint => DISJOINT,
        Relation::Meets => MEETS,
        Relation::Equals => EQUALS,
        Relation::Inside => INSIDE,
        Relation::Covers => COVERS,
        Relation::CoveredBy => COVERED_BY,
        Relation::Contains => CONTAINS,
        Relation::Intersects => INTERSECTS,
    }
}

fn classify(matrix: &str, candidates: &[Relation]) -> Relation {
    for &c in candidates {
        if any_mask(matrix, masks_for(c)) {
            return c;
        }
    }
    Relation::Intersects
}

/// Resolve a narrowed [`Refinement`] tag to a final [`Relation`] using the
/// exact geometries, masking the DE-9IM matrix against only the patterns
/// the tag admits (§4.7 step 4 / §6).
pub fn refine(tag: Refinement, r: &Shape, s: &Shape) -> Relation {
    let matrix = r.relate_matrix(s);
    if tag == Refinement::MeetsIntersect {
        // §4.4's box-equal/ALL-intersect case: a direct two-way decision,
        // never touching Covers/CoveredBy.
        return if any_mask(&matrix, MEETS) { Relation::Meets } else { Relation::Intersects };
    }
    let candidates: &[Relation] = match tag {
        Refinement::InsideCoveredByIntersect => {
            &[Relation::Inside, Relation::CoveredBy, Relation::Intersects]
        }
        Refinement::DisjointInsideCoveredByMeetIntersect => &[
            Relation::Disjoint,
            Relation::Inside,
            Relation::CoveredBy,
            Relation::Meets,
            Relation::Intersects,
        ],
        Refinement::ContainsCoversIntersect => {
            &[Relation::Contains, Relation::Covers, Relation::Intersects]
        }
        Refinement::DisjointContainsCoversMeetIntersect => &[
            Relation::Disjoint,
            Relation::Contains,
            Relation::Covers,
            Relation::Meets,
            Relation::Intersects,
        ],
        Refinement::EqualCoversCoveredByIntersect => &[
            Relation::Equals,
            Relation::Covers,
            Relation::CoveredBy,
            Relation::Intersects,
        ],
        Refinement::CoveredByIntersect => &[Relation::CoveredBy, Relation::Intersects],
        Refinement::CoversIntersect => &[Relation::Covers, Relation::Intersects],
        Refinement::MeetsIntersect => unreachable!("handled directly above"),
        Refinement::Full => &[
            Relation::Disjoint,
            Relation::Meets,
            Relation::Intersects,
        ],
    };
    classify(&matrix, candidates)
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
    fn identical_squares_are_equal() {
        let a = square(0., 0., 10., 10.);
        let b = square(0., 0., 10., 10.);
        assert_eq!(full_relate(&a, &b), Relation::Equals);
    }

    #[test]
    fn edge_sharing_squares_meet() {
        let a = square(0., 0., 5., 5.);
        let b = square(5., 0., 10., 5.);
        assert_eq!(full_relate(&a, &b), Relation::Meets);
    }

    #[test]
    fn disjoint_squares_are_disjoint() {
        let a = square(0., 0., 5., 5.);
        let b = square(100., 100., 110., 110.);
        assert_eq!(full_relate(&a, &b), Relation::Disjoint);
    }

    #[test]
    fn nested_square_is_inside_and_contains() {
        let outer = square(0., 0., 10., 10.);
        let inner = square(2., 2., 8., 8.);
        assert_eq!(full_relate(&inner, &outer), Relation::Inside);
        assert_eq!(full_relate(&outer, &inner), Relation::Contains);
    }

    #[test]
    fn meets_intersect_refinement_never_yields_covers_or_covered_by() {
        let touching_a = square(0., 0., 5., 5.);
        let touching_b = square(5., 0., 10., 5.);
        assert_eq!(refine(Refinement::MeetsIntersect, &touching_a, &touching_b), Relation::Meets);

        let overlap_a = square(0., 0., 10., 10.);
        let overlap_b = square(5., 5., 15., 15.);
        assert_eq!(refine(Refinement::MeetsIntersect, &overlap_a, &overlap_b), Relation::Intersects);
    }

    #[test]
    fn mask_matching_respects_wildcards() {
        assert!(mask_matches("212101212", "T********"));
        assert!(mask_matches("FF2FF1212", "FF*FF****"));
        assert!(!mask_matches("212101212", "FF*FF****"));
    }
}
