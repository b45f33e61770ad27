//! The APRIL raster approximation layer (C3): converts each geometry into
//! two interval lists over a Hilbert-ordered grid so that most candidate
//! pairs can be resolved without touching the exact geometry.
//!
//! Grounded in `Hecatoncheir/src/APRIL/generate.cpp` (`original_source/`),
//! reshaped into idiomatic Rust: the C++ uses a raw `uint32_t**` matrix and
//! out-parameters, this uses a `Vec<Vec<CellState>>` scratch buffer and
//! returns a `Result`.

mod generator;

use crate::error::EngineResult;
use crate::geometry::Shape;

pub use generator::generate;

/// Grid order (`N` in the spec), yielding a `2^N × 2^N` grid. Default 16.
pub const DEFAULT_ORDER: u32 = 16;

/// The two interval lists approximating a geometry's closure (`ALL`) and
/// strict interior (`FULL`) over a Hilbert-ordered grid (§3 "APRIL data").
///
/// Invariants: `FULL` is a subset of `ALL` as point sets; both are
/// ascending, non-overlapping, non-adjacent `[start, end)` interval lists.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AprilData {
    pub all: Vec<(u32, u32)>,
    pub full: Vec<(u32, u32)>,
    /// Which rasterization section (grid placement/order) this data was
    /// generated under. Two objects can only be compared through the APRIL
    /// intermediate filter if they share a section (see SPEC_FULL.md §C).
    pub section_id: u32,
}

impl AprilData {
    pub fn is_empty(&self) -> bool {
        self.all.is_empty()
    }
}

/// Generate `(ALL, FULL)` for `shape` on a `2^order × 2^order` grid spanning
/// `dataspace`, tagging the result with `section_id`.
pub fn generate_april(
    shape: &Shape,
    dataspace: &crate::geometry::Mbr2D,
    order: u32,
    section_id: u32,
) -> EngineResult<AprilData> {
    generator::generate(shape, dataspace, order, section_id)
}
