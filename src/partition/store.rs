//! The partition/index store (C6): per-fine-cell buckets keyed by
//! Two-Layer class, classes `A` and `C` sorted by MBR `yMin` ascending to
//! feed `sweepRollY` (§3 "Partition container", §4.6).
//!
//! Geometries are held in an arena on the [`crate::dataset::Dataset`]; this
//! store holds only indices into that arena, never owning the geometry
//! data itself (Design Notes §9, "ownership cycles").

use std::collections::HashMap;

use crate::geometry::Mbr2D;
use crate::partition::ClassTag;

/// A non-owning reference to a geometry: its index in the dataset arena and
/// its MBR, cached here so the sweep never has to dereference the arena on
/// its hot path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeometryRef {
    pub index: usize,
    pub mbr: Mbr2D,
}

/// One fine cell's four class buckets.
#[derive(Debug, Clone, Default)]
pub struct PartitionContainer {
    pub a: Vec<GeometryRef>,
    pub b: Vec<GeometryRef>,
    pub c: Vec<GeometryRef>,
    pub d: Vec<GeometryRef>,
}

impl PartitionContainer {
    pub fn bucket(&self, class: ClassTag) -> &[GeometryRef] {
        match class {
            ClassTag::A => &self.a,
            ClassTag::B => &self.b,
            ClassTag::C => &self.c,
            ClassTag::D => &self.d,
        }
    }

    fn bucket_mut(&mut self, class: ClassTag) -> &mut Vec<GeometryRef> {
        match class {
            ClassTag::A => &mut self.a,
            ClassTag::B => &mut self.b,
            ClassTag::C => &mut self.c,
            ClassTag::D => &mut self.d,
        }
    }

    /// All class-A objects: by the Two-Layer invariant their MBRs lie
    /// strictly inside the cell, used by the range query's interior-cell
    /// fast path (§4.8).
    pub fn all_ids(&self) -> impl Iterator<Item = usize> + '_ {
        self.a
            .iter()
            .chain(self.b.iter())
            .chain(self.c.iter())
            .chain(self.d.iter())
            .map(|r| r.index)
    }

    fn sort_by_y_min(&mut self) {
        self.a.sort_by(|x, y| x.mbr.y_min.partial_cmp(&y.mbr.y_min).unwrap());
        self.c.sort_by(|x, y| x.mbr.y_min.partial_cmp(&y.mbr.y_min).unwrap());
        // B and D are not load-bearing for any sweep variant in the join
        // matrix (§4.5), but are kept sorted too for predictable iteration
        // order under the deterministic-per-thread guarantee of §5.
        self.b.sort_by(|x, y| x.mbr.y_min.partial_cmp(&y.mbr.y_min).unwrap());
        self.d.sort_by(|x, y| x.mbr.y_min.partial_cmp(&y.mbr.y_min).unwrap());
    }
}

/// The full per-dataset partition index, built once by [`crate::partition::TwoGrid`]
/// and rebuilt whenever the dataset is repartitioned (§3 lifecycle).
#[derive(Debug, Clone, Default)]
pub struct PartitionStore {
    cells: HashMap<u64, PartitionContainer>,
}

impl PartitionStore {
    pub fn new() -> Self {
        Self { cells: HashMap::new() }
    }

    pub fn insert(&mut self, fine_cell_id: u64, class: ClassTag, geometry_ref: GeometryRef) {
        self.cells
            .entry(fine_cell_id)
            .or_default()
            .bucket_mut(class)
            .push(geometry_ref);
    }

    /// Finalize the store after all insertions: sort the sweep-bearing
    /// buckets by `yMin`.
    pub fn finalize(&mut self) {
        for container in self.cells.values_mut() {
            container.sort_by_y_min();
        }
    }

    pub fn get(&self, fine_cell_id: u64) -> Option<&PartitionContainer> {
        self.cells.get(&fine_cell_id)
    }

    pub fn cell_ids(&self) -> impl Iterator<Item = u64> + '_ {
        self.cells.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geom(index: usize, y_min: f64) -> GeometryRef {
        GeometryRef {
            index,
            mbr: Mbr2D::new(0., y_min, 1., y_min + 1.),
        }
    }

    #[test]
    fn class_a_and_c_are_sorted_by_y_min_after_finalize() {
        let mut store = PartitionStore::new();
        store.insert(0, ClassTag::A, geom(2, 5.0));
        store.insert(0, ClassTag::A, geom(1, 1.0));
        store.insert(0, ClassTag::A, geom(3, 9.0));
        store.finalize();

        let bucket = store.get(0).unwrap().bucket(ClassTag::A);
        let ys: Vec<f64> = bucket.iter().map(|r| r.mbr.y_min).collect();
        assert_eq!(ys, vec![1.0, 5.0, 9.0]);
    }

    #[test]
    fn all_ids_covers_every_class() {
        let mut store = PartitionStore::new();
        store.insert(0, ClassTag::A, geom(1, 0.));
        store.insert(0, ClassTag::B, geom(2, 0.));
        store.insert(0, ClassTag::C, geom(3, 0.));
        store.insert(0, ClassTag::D, geom(4, 0.));
        let mut ids: Vec<usize> = store.get(0).unwrap().all_ids().collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![1, 2, 3, 4]);
    }
}
