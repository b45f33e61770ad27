//! Binary persistence (§6): the exact little-endian layouts for a
//! partition file and an APRIL file. File-format layout is named in §1's
//! out-of-scope list alongside dataset parsing and directory management,
//! but §6 pins the layout down to the byte and §8 requires a round trip —
//! so the serialization logic itself lives here; *triggering* a load from a
//! path on disk is left to the out-of-scope collaborator that owns file
//! I/O and directory management.

use std::io::{self, Read, Write};

use crate::april::AprilData;
use crate::error::{EngineError, EngineResult};
use crate::geometry::{Mbr2D, Point2D, Shape, SpatialType};
use crate::partition::{CellAssignment, ClassTag};

fn spatial_type_tag(t: SpatialType) -> u8 {
    match t {
        SpatialType::Point => 0,
        SpatialType::LineString => 1,
        SpatialType::Rectangle => 2,
        SpatialType::Polygon => 3,
    }
}

fn spatial_type_from_tag(tag: u8) -> EngineResult<SpatialType> {
    match tag {
        0 => Ok(SpatialType::Point),
        1 => Ok(SpatialType::LineString),
        2 => Ok(SpatialType::Rectangle),
        3 => Ok(SpatialType::Polygon),
        other => Err(EngineError::DiskRead(format!("unknown spatialType tag {other}"))),
    }
}

fn class_tag(c: ClassTag) -> u8 {
    match c {
        ClassTag::A => 0,
        ClassTag::B => 1,
        ClassTag::C => 2,
        ClassTag::D => 3,
    }
}

fn class_from_tag(tag: u8) -> EngineResult<ClassTag> {
    match tag {
        0 => Ok(ClassTag::A),
        1 => Ok(ClassTag::B),
        2 => Ok(ClassTag::C),
        3 => Ok(ClassTag::D),
        other => Err(EngineError::DiskRead(format!("unknown partition class tag {other}"))),
    }
}

fn io_err(context: &str, e: io::Error) -> EngineError {
    EngineError::DiskRead(format!("{context}: {e}"))
}

/// One record of a persisted partition file: a geometry plus the fine-cell
/// assignments the two-grid partitioner produced for it.
#[derive(Debug, Clone, PartialEq)]
pub struct PartitionRecord {
    pub rec_id: u64,
    pub spatial_type: SpatialType,
    pub assignments: Vec<CellAssignment>,
    pub vertices: Vec<Point2D>,
}

/// Write the dataset header `[totalObjects, spatialType, dataspaceMBR]`
/// followed by every record's bytes, in the exact layout of §6.
pub fn write_partition_file<W: Write>(
    mut out: W,
    spatial_type: SpatialType,
    dataspace: Mbr2D,
    records: &[PartitionRecord],
) -> EngineResult<()> {
    out.write_all(&(records.len() as u64).to_le_bytes())
        .map_err(|e| io_err("writing totalObjects", e))?;
    out.write_all(&[spatial_type_tag(spatial_type)])
        .map_err(|e| io_err("writing dataset spatialType", e))?;
    for v in [dataspace.x_min, dataspace.y_min, dataspace.x_max, dataspace.y_max] {
        out.write_all(&v.to_le_bytes()).map_err(|e| io_err("writing dataspaceMBR", e))?;
    }

    for record in records {
        out.write_all(&record.rec_id.to_le_bytes()).map_err(|e| io_err("writing recID", e))?;
        out.write_all(&[spatial_type_tag(record.spatial_type)])
            .map_err(|e| io_err("writing record spatialType", e))?;
        out.write_all(&(record.assignments.len() as u32).to_le_bytes())
            .map_err(|e| io_err("writing partitionCount", e))?;
        for a in &record.assignments {
            out.write_all(&a.fine_cell_id.to_le_bytes())
                .map_err(|e| io_err("writing partition id", e))?;
            out.write_all(&[class_tag(a.class)])
                .map_err(|e| io_err("writing partition class", e))?;
        }
        out.write_all(&(record.vertices.len() as u32).to_le_bytes())
            .map_err(|e| io_err("writing vertexCount", e))?;
        for p in &record.vertices {
            out.write_all(&p.x.to_le_bytes()).map_err(|e| io_err("writing vertex x", e))?;
            out.write_all(&p.y.to_le_bytes()).map_err(|e| io_err("writing vertex y", e))?;
        }
    }
    Ok(())
}

struct Reader<R: Read> {
    inner: R,
}

impl<R: Read> Reader<R> {
    fn u64(&mut self) -> EngineResult<u64> {
        let mut buf = [0u8; 8];
        self.inner.read_exact(&mut buf).map_err(|e| io_err("reading u64", e))?;
        Ok(u64::from_le_bytes(buf))
    }

    fn u32(&mut self) -> EngineResult<u32> {
        let mut buf = [0u8; 4];
        self.inner.read_exact(&mut buf).map_err(|e| io_err("reading u32", e))?;
        Ok(u32::from_le_bytes(buf))
    }

    fn u8(&mut self) -> EngineResult<u8> {
        let mut buf = [0u8; 1];
        self.inner.read_exact(&mut buf).map_err(|e| io_err("reading u8", e))?;
        Ok(buf[0])
    }

    fn f64(&mut self) -> EngineResult<f64> {
        let mut buf = [0u8; 8];
        self.inner.read_exact(&mut buf).map_err(|e| io_err("reading f64", e))?;
        Ok(f64::from_le_bytes(buf))
    }
}

/// The dataset header plus every record read back from a partition file.
pub struct PartitionFile {
    pub spatial_type: SpatialType,
    pub dataspace: Mbr2D,
    pub records: Vec<PartitionRecord>,
}

pub fn read_partition_file<R: Read>(inner: R) -> EngineResult<PartitionFile> {
    let mut r = Reader { inner };
    let total_objects = r.u64()?;
    let spatial_type = spatial_type_from_tag(r.u8()?)?;
    let dataspace = Mbr2D::new(r.f64()?, r.f64()?, r.f64()?, r.f64()?);

    let mut records = Vec::with_capacity(total_objects as usize);
    for _ in 0..total_objects {
        let rec_id = r.u64()?;
        let record_spatial_type = spatial_type_from_tag(r.u8()?)?;
        let partition_count = r.u32()?;
        let mut assignments = Vec::with_capacity(partition_count as usize);
        for _ in 0..partition_count {
            let fine_cell_id = r.u64()?;
            let class = class_from_tag(r.u8()?)?;
            assignments.push(CellAssignment { fine_cell_id, class });
        }
        let vertex_count = r.u32()?;
        let mut vertices = Vec::with_capacity(vertex_count as usize);
        for _ in 0..vertex_count {
            vertices.push(Point2D::new(r.f64()?, r.f64()?));
        }
        records.push(PartitionRecord {
            rec_id,
            spatial_type: record_spatial_type,
            assignments,
            vertices,
        });
    }

    Ok(PartitionFile { spatial_type, dataspace, records })
}

/// Write the APRIL file header `[totalObjects]` followed by each object's
/// `[recID, sectionID, numALL, numFULL, intervals...]` (§6).
pub fn write_april_file<W: Write>(mut out: W, rec_ids: &[u64], aprils: &[AprilData]) -> EngineResult<()> {
    if rec_ids.len() != aprils.len() {
        return Err(EngineError::InvalidParameter(
            "rec_ids and aprils must have the same length".into(),
        ));
    }
    out.write_all(&(aprils.len() as u64).to_le_bytes())
        .map_err(|e| io_err("writing APRIL totalObjects", e))?;
    for (rec_id, data) in rec_ids.iter().zip(aprils) {
        out.write_all(&rec_id.to_le_bytes()).map_err(|e| io_err("writing recID", e))?;
        out.write_all(&data.section_id.to_le_bytes()).map_err(|e| io_err("writing sectionID", e))?;
        out.write_all(&(data.all.len() as u32).to_le_bytes()).map_err(|e| io_err("writing numALL", e))?;
        out.write_all(&(data.full.len() as u32).to_le_bytes()).map_err(|e| io_err("writing numFULL", e))?;
        for (start, end) in &data.all {
            out.write_all(&start.to_le_bytes()).map_err(|e| io_err("writing ALL start", e))?;
            out.write_all(&end.to_le_bytes()).map_err(|e| io_err("writing ALL end", e))?;
        }
        for (start, end) in &data.full {
            out.write_all(&start.to_le_bytes()).map_err(|e| io_err("writing FULL start", e))?;
            out.write_all(&end.to_le_bytes()).map_err(|e| io_err("writing FULL end", e))?;
        }
    }
    Ok(())
}

pub fn read_april_file<R: Read>(inner: R) -> EngineResult<Vec<(u64, AprilData)>> {
    let mut r = Reader { inner };
    let total_objects = r.u64()?;
    let mut out = Vec::with_capacity(total_objects as usize);
    for _ in 0..total_objects {
        let rec_id = r.u64()?;
        let section_id = r.u32()?;
        let num_all = r.u32()?;
        let num_full = r.u32()?;
        let mut all = Vec::with_capacity(num_all as usize);
        for _ in 0..num_all {
            all.push((r.u32()?, r.u32()?));
        }
        let mut full = Vec::with_capacity(num_full as usize);
        for _ in 0..num_full {
            full.push((r.u32()?, r.u32()?));
        }
        out.push((rec_id, AprilData { all, full, section_id }));
    }
    Ok(out)
}

/// Pair up already-partitioned shapes with their fine-cell assignments into
/// persistable records; used by [`crate::dataset::Dataset::to_partition_records`].
pub(crate) fn shapes_to_records(
    ids: &[u64],
    shapes: &[Shape],
    assignments: &[Vec<CellAssignment>],
) -> Vec<PartitionRecord> {
    ids.iter()
        .zip(shapes)
        .zip(assignments)
        .map(|((&rec_id, shape), assigns)| PartitionRecord {
            rec_id,
            spatial_type: shape.spatial_type,
            assignments: assigns.clone(),
            vertices: shape.vertices.clone(),
        })
        .collect()
}
