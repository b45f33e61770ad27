//! The two-grid partitioner (C5): a coarse distribution grid spreading
//! geometries across workers, and a fine partitioning grid within each
//! worker, with a Two-Layer class tag enabling a duplicate-free plane
//! sweep between partitions (§3, §4.5).
//!
//! Grounded in `TwoLayerFilter/src/partitioning.cpp` (`original_source/`)
//! for the class-assignment rules, generalized into a pure function over
//! an MBR rather than the original's in-place object mutation.

pub mod store;

use crate::geometry::Mbr2D;

/// The Two-Layer class tag of a (geometry, fine-cell) assignment (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassTag {
    /// The cell contains the MBR's lower-left corner.
    A,
    /// The cell holds a point on the bottom edge, but not the corner.
    B,
    /// The cell holds a point on the left edge, but not the corner.
    C,
    /// The cell is interior to the MBR.
    D,
}

/// A fine-cell id plus the class the geometry takes in that cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellAssignment {
    pub fine_cell_id: u64,
    pub class: ClassTag,
}

/// The grid geometry shared by every dataset partitioned together: the
/// dataspace, the coarse `D × D` distribution grid, and the fine `P × P`
/// partitioning grid nested in each distribution cell (§3 "Two-grid").
///
/// Two datasets can only be joined if their grids are congruent (§5,
/// "Invariants across datasets") — enforced by [`TwoGrid::is_congruent_with`].
#[derive(Debug, Clone, PartialEq)]
pub struct TwoGrid {
    pub dataspace: Mbr2D,
    pub distribution_order: u32, // D
    pub partitioning_order: u32, // P
    pub worker_count: u32,
}

impl TwoGrid {
    pub fn new(dataspace: Mbr2D, distribution_order: u32, partitioning_order: u32, worker_count: u32) -> Self {
        Self {
            dataspace,
            distribution_order,
            partitioning_order,
            worker_count,
        }
    }

    pub fn is_congruent_with(&self, other: &TwoGrid) -> bool {
        self.distribution_order == other.distribution_order
            && self.partitioning_order == other.partitioning_order
            && self.dataspace.equals(&other.dataspace)
    }

    fn coarse_extent(&self) -> (f64, f64) {
        (
            self.dataspace.x_extent() / self.distribution_order as f64,
            self.dataspace.y_extent() / self.distribution_order as f64,
        )
    }

    fn fine_extent(&self) -> (f64, f64) {
        let (ex, ey) = self.coarse_extent();
        (ex / self.partitioning_order as f64, ey / self.partitioning_order as f64)
    }

    /// The side length, in fine-grid cells, of the whole dataspace: `D * P`.
    pub fn fine_dim(&self) -> u64 {
        self.distribution_order as u64 * self.partitioning_order as u64
    }

    fn floor_index(v: f64, origin: f64, extent: f64, max_index: u64) -> u64 {
        if extent <= 0.0 {
            return 0;
        }
        let idx = ((v - origin) / extent).floor();
        if idx < 0.0 {
            0
        } else {
            (idx as u64).min(max_index.saturating_sub(1))
        }
    }

    /// §4.5 step 1-2: the coarse cell a geometry's MBR lower-left corner
    /// falls in, and the worker that owns it.
    pub fn coarse_owner(&self, mbr: &Mbr2D) -> u32 {
        let (ex, ey) = self.coarse_extent();
        let ci = Self::floor_index(mbr.x_min, self.dataspace.x_min, ex, self.distribution_order as u64);
        let cj = Self::floor_index(mbr.y_min, self.dataspace.y_min, ey, self.distribution_order as u64);
        let coarse_id = ci + cj * self.distribution_order as u64;
        owner(coarse_id, self.worker_count)
    }

    /// §4.5 steps 3-5: every fine cell the MBR intersects, each tagged with
    /// its Two-Layer class.
    pub fn assign(&self, mbr: &Mbr2D) -> Vec<CellAssignment> {
        let (fx, fy) = self.fine_extent();
        let dim = self.fine_dim();

        let i_min = Self::floor_index(mbr.x_min, self.dataspace.x_min, fx, dim);
        let i_max = Self::floor_index(mbr.x_max, self.dataspace.x_min, fx, dim);
        let j_min = Self::floor_index(mbr.y_min, self.dataspace.y_min, fy, dim);
        let j_max = Self::floor_index(mbr.y_max, self.dataspace.y_min, fy, dim);

        let mut out = Vec::with_capacity(((i_max - i_min + 1) * (j_max - j_min + 1)) as usize);
        for j in j_min..=j_max {
            for i in i_min..=i_max {
                // §4.5 step 4: A = corner cell; C = same row as the corner
                // but a later column; B = same column as the corner but a
                // later row; D = interior to the MBR on both axes.
                let class = if i == i_min && j == j_min {
                    ClassTag::A
                } else if j == j_min && i > i_min {
                    ClassTag::C
                } else if i == i_min && j > j_min {
                    ClassTag::B
                } else {
                    ClassTag::D
                };
                out.push(CellAssignment {
                    fine_cell_id: i + j * dim,
                    class,
                });
            }
        }
        out
    }

    /// The `(i, j)` coordinates of a fine cell id.
    pub fn fine_cell_coords(&self, fine_cell_id: u64) -> (u64, u64) {
        let dim = self.fine_dim();
        (fine_cell_id % dim, fine_cell_id / dim)
    }

    /// The MBR of a fine cell, used by range queries and kNN pruning.
    pub fn fine_cell_bounds(&self, fine_cell_id: u64) -> Mbr2D {
        let (fx, fy) = self.fine_extent();
        let (i, j) = self.fine_cell_coords(fine_cell_id);
        Mbr2D::new(
            self.dataspace.x_min + i as f64 * fx,
            self.dataspace.y_min + j as f64 * fy,
            self.dataspace.x_min + (i + 1) as f64 * fx,
            self.dataspace.y_min + (j + 1) as f64 * fy,
        )
    }

    /// Every fine cell whose bounds intersect `window`, used by range
    /// queries (§4.8) and the distance-join cell radius.
    pub fn fine_cells_in(&self, window: &Mbr2D) -> Vec<u64> {
        let (fx, fy) = self.fine_extent();
        let dim = self.fine_dim();
        let i_min = Self::floor_index(window.x_min, self.dataspace.x_min, fx, dim);
        let i_max = Self::floor_index(window.x_max, self.dataspace.x_min, fx, dim);
        let j_min = Self::floor_index(window.y_min, self.dataspace.y_min, fy, dim);
        let j_max = Self::floor_index(window.y_max, self.dataspace.y_min, fy, dim);
        let mut out = Vec::new();
        for j in j_min..=j_max {
            for i in i_min..=i_max {
                out.push(i + j * dim);
            }
        }
        out
    }
}

/// `owner(id) = id mod W` (§3 "Two-grid").
pub fn owner(distribution_cell_id: u64, worker_count: u32) -> u32 {
    (distribution_cell_id % worker_count.max(1) as u64) as u32
}

/// The fixed class-pair evaluation order within one fine cell (§5
/// "Ordering guarantees").
pub const JOIN_ORDER: [(ClassTag, ClassTag); 9] = {
    use ClassTag::*;
    [
        (A, A),
        (A, B),
        (A, C),
        (A, D),
        (B, A),
        (B, C),
        (C, A),
        (C, B),
        (D, A),
    ]
};

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> TwoGrid {
        TwoGrid::new(Mbr2D::new(0., 0., 100., 100.), 2, 5, 2)
    }

    #[test]
    fn lower_left_corner_cell_is_class_a() {
        let g = grid();
        let mbr = Mbr2D::new(5., 5., 5., 5.);
        let assigns = g.assign(&mbr);
        assert_eq!(assigns.len(), 1);
        assert_eq!(assigns[0].class, ClassTag::A);
    }

    #[test]
    fn wide_mbr_spanning_multiple_cells_has_one_a_and_rest_bcd() {
        let g = grid();
        // spans 3 fine cells horizontally, 2 vertically
        let mbr = Mbr2D::new(0., 0., 25., 15.);
        let assigns = g.assign(&mbr);
        let a_count = assigns.iter().filter(|c| c.class == ClassTag::A).count();
        assert_eq!(a_count, 1);
        assert!(assigns.iter().any(|c| c.class == ClassTag::C));
        assert!(assigns.iter().any(|c| c.class == ClassTag::B));
    }

    #[test]
    fn owner_wraps_around_worker_count() {
        assert_eq!(owner(0, 4), 0);
        assert_eq!(owner(5, 4), 1);
        assert_eq!(owner(7, 4), 3);
    }

    #[test]
    fn congruent_grids_share_dimensions_and_origin() {
        let a = grid();
        let b = grid();
        assert!(a.is_congruent_with(&b));
        let c = TwoGrid::new(Mbr2D::new(0., 0., 50., 50.), 2, 5, 2);
        assert!(!a.is_congruent_with(&c));
    }
}
