//! The `sweepRollY` plane sweep and the nine-entry Two-Layer join matrix
//! (§4.5, §4.6), grounded in
//! `Hecatoncheir/src/TwoLayer/intersection_join_filter.cpp`'s
//! `sweepRollY_*`/`internal_sweepRollY_*` family: advance whichever of the
//! two class buckets has the smaller `yMin` front, and for each object
//! passed over, scan forward through the other bucket while its `yMin`
//! stays within the advancing object's `yMax`.
//!
//! The five `SRY*` variants in the original differ only in which single
//! x-axis half-plane check they apply to avoid re-counting a pair the
//! matrix already routes through a different class combination. That
//! reduces, once restated per-class rather than per-named-variant, to: a
//! bucket of class `C` only needs to reject candidates strictly to its
//! right, a bucket of class `D` only needs to reject candidates strictly
//! to its left, and any other combination needs the full two-sided MBR
//! check (§4.5 "Variants differ only in which of the four MBR half-plane
//! checks are required").

use crate::partition::store::{GeometryRef, PartitionContainer};
use crate::partition::{ClassTag, JOIN_ORDER};

/// A candidate pair surviving the plane sweep, with both class tags kept
/// around for diagnostics/testing (§5 ordering guarantees reference them).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub r: usize,
    pub s: usize,
}

fn x_overlaps_for(class_r: ClassTag, class_s: ClassTag, r: &GeometryRef, s: &GeometryRef) -> bool {
    if class_r == ClassTag::C {
        r.mbr.x_min <= s.mbr.x_max
    } else if class_s == ClassTag::C {
        s.mbr.x_min <= r.mbr.x_max
    } else if class_r == ClassTag::D {
        r.mbr.x_max >= s.mbr.x_min
    } else if class_s == ClassTag::D {
        s.mbr.x_max >= r.mbr.x_min
    } else {
        r.mbr.x_min <= s.mbr.x_max && s.mbr.x_min <= r.mbr.x_max
    }
}

/// `sweepRollY` (§4.6): sweep two class buckets, already sorted ascending
/// by `yMin`, emitting every candidate pair whose MBRs intersect on the y
/// axis and pass the variant-appropriate x check.
pub fn sweep_roll_y(
    bucket_r: &[GeometryRef],
    class_r: ClassTag,
    bucket_s: &[GeometryRef],
    class_s: ClassTag,
) -> Vec<Candidate> {
    let mut out = Vec::new();
    let (mut i, mut j) = (0, 0);
    while i < bucket_r.len() && j < bucket_s.len() {
        if bucket_r[i].mbr.y_min < bucket_s[j].mbr.y_min {
            let r = &bucket_r[i];
            let mut k = j;
            while k < bucket_s.len() && bucket_s[k].mbr.y_min <= r.mbr.y_max {
                if x_overlaps_for(class_r, class_s, r, &bucket_s[k]) {
                    out.push(Candidate { r: r.index, s: bucket_s[k].index });
                }
                k += 1;
            }
            i += 1;
        } else {
            let s = &bucket_s[j];
            let mut k = i;
            while k < bucket_r.len() && bucket_r[k].mbr.y_min <= s.mbr.y_max {
                if x_overlaps_for(class_r, class_s, &bucket_r[k], s) {
                    out.push(Candidate { r: bucket_r[k].index, s: s.index });
                }
                k += 1;
            }
            j += 1;
        }
    }
    out
}

/// Run the full nine-entry join matrix over a single fine cell's
/// containers for datasets `R` and `S`, in the fixed order §5 mandates
/// (`A×A, A×B, A×C, A×D, B×A, B×C, C×A, C×B, D×A`).
///
/// By the duplicate-avoidance invariant (§3, §8 property 6), each true
/// pair is produced by exactly one of these nine combinations.
pub fn join_matrix(r: &PartitionContainer, s: &PartitionContainer) -> Vec<Candidate> {
    let mut out = Vec::new();
    for &(cr, cs) in JOIN_ORDER.iter() {
        out.extend(sweep_roll_y(r.bucket(cr), cr, s.bucket(cs), cs));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Mbr2D;

    fn geo(index: usize, x_min: f64, y_min: f64, x_max: f64, y_max: f64) -> GeometryRef {
        GeometryRef {
            index,
            mbr: Mbr2D::new(x_min, y_min, x_max, y_max),
        }
    }

    #[test]
    fn sweep_finds_overlapping_pairs_and_skips_disjoint_ones() {
        let r = vec![geo(0, 0., 0., 5., 5.), geo(1, 0., 20., 5., 25.)];
        let s = vec![geo(2, 2., 2., 8., 8.)];
        let candidates = sweep_roll_y(&r, ClassTag::A, &s, ClassTag::A);
        assert_eq!(candidates, vec![Candidate { r: 0, s: 2 }]);
    }

    #[test]
    fn join_matrix_is_empty_when_either_side_has_no_buckets() {
        let r = PartitionContainer::default();
        let s = PartitionContainer::default();
        assert!(join_matrix(&r, &s).is_empty());
    }

    #[test]
    fn join_matrix_finds_a_a_pair() {
        let mut r = PartitionContainer::default();
        let mut s = PartitionContainer::default();
        r.a.push(geo(0, 0., 0., 5., 5.));
        s.a.push(geo(1, 2., 2., 8., 8.));
        let candidates = join_matrix(&r, &s);
        assert!(candidates.contains(&Candidate { r: 0, s: 1 }));
    }
}
