//! The rasterization algorithm behind [`super::generate_april`] (§4.2).
//!
//! Reshaped from `Hecatoncheir/src/APRIL/generate.cpp`'s boost-geometry
//! intersection dance into a standard Amanatides–Woo grid-traversal DDA:
//! the original computes the same thing (which grid cells a line segment
//! passes through) by intersecting the segment against the nearest
//! vertical/horizontal grid lines; this walks cell-to-cell directly using
//! the per-axis step and "distance to next grid line" parametrization the
//! spec names explicitly in step 2.

use std::collections::BTreeMap;

use itertools::Itertools;

use crate::error::{EngineError, EngineResult};
use crate::geometry::{Mbr2D, Shape, SpatialType};
use crate::hilbert;

use super::AprilData;

const NEIGHBOR_OFFSETS: [(i64, i64); 8] = [
    (1, -1),
    (1, 0),
    (1, 1),
    (0, -1),
    (0, 1),
    (-1, -1),
    (-1, 0),
    (-1, 1),
];

pub fn generate(
    shape: &Shape,
    dataspace: &Mbr2D,
    order: u32,
    section_id: u32,
) -> EngineResult<AprilData> {
    let n = hilbert::cells_per_dim(order);

    let map_x = mapping(dataspace.x_min, dataspace.x_max, n);
    let map_y = mapping(dataspace.y_min, dataspace.y_max, n);

    let grid_vertices: Vec<(f64, f64)> = shape
        .vertices
        .iter()
        .map(|p| (map_x(p.x), map_y(p.y)))
        .collect();

    let mut partial_cells: std::collections::BTreeSet<u64> = std::collections::BTreeSet::new();

    if grid_vertices.len() == 1 || shape.spatial_type == SpatialType::Point {
        let (x, y) = grid_vertices[0];
        partial_cells.insert(hilbert::encode(order, x as u64, y as u64));
    } else {
        for ((x0, y0), (x1, y1)) in grid_vertices.iter().copied().tuple_windows() {
            walk_edge(x0, y0, x1, y1, n, &mut |cx, cy| {
                partial_cells.insert(hilbert::encode(order, cx, cy));
            });
        }
    }

    if partial_cells.is_empty() {
        return Err(EngineError::AprilCreate {
            rec_id: 0,
            reason: "rasterization produced no partial cells".into(),
        });
    }

    let partial: Vec<u64> = partial_cells.into_iter().collect();

    if !shape.is_areal() {
        let all = coalesce(&partial);
        return Ok(AprilData {
            all: downcast(&all),
            full: Vec::new(),
            section_id,
        });
    }

    let (all, full) = synthesize_all_full(shape, dataspace, order, &partial)?;

    if all.is_empty() {
        return Err(EngineError::AprilCreate {
            rec_id: 0,
            reason: "ALL interval list is empty for an areal geometry".into(),
        });
    }

    Ok(AprilData {
        all: downcast(&all),
        full: downcast(&full),
        section_id,
    })
}

fn downcast(v: &[(u64, u64)]) -> Vec<(u32, u32)> {
    v.iter().map(|&(a, b)| (a as u32, b as u32)).collect()
}

/// Merge a sorted, deduplicated cell-id list into ascending, non-adjacent
/// half-open intervals (§4.2 step 3 invariant).
fn coalesce(cells: &[u64]) -> Vec<(u64, u64)> {
    let mut out = Vec::new();
    let mut start = cells[0];
    let mut prev = cells[0];
    for &c in &cells[1..] {
        if c > prev + 1 {
            out.push((start, prev + 1));
            start = c;
        }
        prev = c;
    }
    out.push((start, prev + 1));
    out
}

/// Walk every grid cell a half-open rational affine mapping of `[a_min,
/// a_max]` maps into `[0, n)` clamped to the grid.
fn mapping(min: f64, max: f64, n: u64) -> impl Fn(f64) -> f64 {
    let span = max - min;
    move |v| {
        let mapped = if span > 0.0 {
            (v - min) / span * (n as f64 - 1.0)
        } else {
            0.0
        };
        mapped.clamp(0.0, n as f64 - 1.0)
    }
}

/// Amanatides–Woo supercover traversal: every grid cell the segment
/// `(x0,y0)-(x1,y1)` passes through, including both endpoints.
fn walk_edge(x0: f64, y0: f64, x1: f64, y1: f64, n: u64, mark: &mut impl FnMut(u64, u64)) {
    let clampi = |v: f64| -> i64 { v.floor().clamp(0.0, n as f64 - 1.0) as i64 };
    let mut cx = clampi(x0);
    let mut cy = clampi(y0);
    let end_x = clampi(x1);
    let end_y = clampi(y1);

    mark(cx as u64, cy as u64);
    if cx == end_x && cy == end_y {
        return;
    }

    let dx = x1 - x0;
    let dy = y1 - y0;
    let step_x: i64 = if dx > 0.0 {
        1
    } else if dx < 0.0 {
        -1
    } else {
        0
    };
    let step_y: i64 = if dy > 0.0 {
        1
    } else if dy < 0.0 {
        -1
    } else {
        0
    };

    let t_delta_x = if dx != 0.0 { (1.0 / dx).abs() } else { f64::INFINITY };
    let t_delta_y = if dy != 0.0 { (1.0 / dy).abs() } else { f64::INFINITY };

    let next_x_boundary = if step_x > 0 { (cx + 1) as f64 } else { cx as f64 };
    let next_y_boundary = if step_y > 0 { (cy + 1) as f64 } else { cy as f64 };

    let mut t_max_x = if dx != 0.0 {
        (next_x_boundary - x0) / dx
    } else {
        f64::INFINITY
    };
    let mut t_max_y = if dy != 0.0 {
        (next_y_boundary - y0) / dy
    } else {
        f64::INFINITY
    };

    // bound the walk: the segment can cross at most n cells per axis.
    let max_steps = 2 * (n as usize) + 4;
    for _ in 0..max_steps {
        if t_max_x < t_max_y {
            cx = (cx + step_x).clamp(0, n as i64 - 1);
            t_max_x += t_delta_x;
        } else {
            cy = (cy + step_y).clamp(0, n as i64 - 1);
            t_max_y += t_delta_y;
        }
        mark(cx as u64, cy as u64);
        if cx == end_x && cy == end_y {
            break;
        }
    }
}

/// §4.2 step 4: walk the sorted partial-cell list, filling the gaps between
/// consecutive partial cells with either a `FULL` run (interior) or a break
/// in the `ALL` run (exterior), deciding via already-classified neighbors
/// first and a point-in-polygon test only when neighbors are uninformative.
fn synthesize_all_full(
    shape: &Shape,
    dataspace: &Mbr2D,
    order: u32,
    partial: &[u64],
) -> EngineResult<(Vec<(u64, u64)>, Vec<(u64, u64)>)> {
    let partial_set: std::collections::BTreeSet<u64> = partial.iter().copied().collect();
    let mut classified: BTreeMap<u64, bool> = BTreeMap::new(); // true = FULL, false = EMPTY

    let mut all_runs = Vec::new();
    let mut full_runs = Vec::new();

    let mut all_start = partial[0];

    for pair in partial.windows(2) {
        let (p_i, p_next) = (pair[0], pair[1]);
        if p_next <= p_i + 1 {
            continue; // no gap between consecutive partial cells
        }
        let gap_start = p_i + 1;
        let gap_end = p_next; // exclusive
        let (gx, gy) = hilbert::decode(order, gap_start);

        let is_full =
            classify_gap(shape, dataspace, order, gap_start, gx, gy, &partial_set, &classified)?;

        for cell in gap_start..gap_end {
            classified.insert(cell, is_full);
        }

        if is_full {
            full_runs.push((gap_start, gap_end));
            // the ALL run continues uninterrupted through a FULL gap
        } else {
            all_runs.push((all_start, gap_start));
            all_start = p_next;
        }
    }
    all_runs.push((all_start, *partial.last().unwrap() + 1));

    Ok((merge_adjacent(all_runs), merge_adjacent(full_runs)))
}

fn classify_gap(
    shape: &Shape,
    dataspace: &Mbr2D,
    order: u32,
    current_id: u64,
    x: u64,
    y: u64,
    partial_set: &std::collections::BTreeSet<u64>,
    classified: &BTreeMap<u64, bool>,
) -> EngineResult<bool> {
    let n = hilbert::cells_per_dim(order);
    for &(ox, oy) in NEIGHBOR_OFFSETS.iter() {
        let nx = x as i64 + ox;
        let ny = y as i64 + oy;
        if nx < 0 || ny < 0 || nx as u64 >= n || ny as u64 >= n {
            continue;
        }
        let d = hilbert::encode(order, nx as u64, ny as u64);
        if d >= current_id {
            continue; // only causally-prior neighbors inform the decision
        }
        if partial_set.contains(&d) {
            continue;
        }
        if let Some(&full) = classified.get(&d) {
            return Ok(full);
        }
    }
    // uncertain: fall back to an exact point-in-polygon test at the cell
    // center, mapped back into dataspace coordinates via the same affine
    // transform the forward rasterization used.
    Ok(shape.contains_point(&grid_cell_center(dataspace, order, x, y)))
}

/// Invert [`mapping`]: a grid cell index back to a dataspace coordinate,
/// the same affine frame `generate`'s forward pass maps into.
fn inverse_mapping(min: f64, max: f64, n: u64) -> impl Fn(f64) -> f64 {
    let span = max - min;
    move |cell: f64| {
        if n <= 1 {
            min
        } else {
            min + cell / (n as f64 - 1.0) * span
        }
    }
}

/// Map a grid cell's center back into dataspace coordinates, inverting the
/// same `mapping()` affine transform `generate`'s forward pass used — not
/// the geometry's own MBR, which only coincides with the dataspace when the
/// shape spans it entirely.
fn grid_cell_center(dataspace: &Mbr2D, order: u32, x: u64, y: u64) -> crate::geometry::Point2D {
    let n = hilbert::cells_per_dim(order);
    let inv_x = inverse_mapping(dataspace.x_min, dataspace.x_max, n);
    let inv_y = inverse_mapping(dataspace.y_min, dataspace.y_max, n);
    crate::geometry::Point2D::new(inv_x(x as f64 + 0.5), inv_y(y as f64 + 0.5))
}

fn merge_adjacent(mut runs: Vec<(u64, u64)>) -> Vec<(u64, u64)> {
    if runs.is_empty() {
        return runs;
    }
    runs.sort_unstable();
    let mut out = Vec::with_capacity(runs.len());
    let mut cur = runs[0];
    for &(s, e) in &runs[1..] {
        if s <= cur.1 {
            cur.1 = cur.1.max(e);
        } else {
            out.push(cur);
            cur = (s, e);
        }
    }
    out.push(cur);
    out
}
