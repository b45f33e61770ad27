//! Geometry primitives: points, axis-aligned bounding rectangles, and the
//! tagged `Shape` type carrying the four spatial types the engine indexes.
//!
//! Exact predicates (intersects, contains, touches, relate, distance) are
//! dispatched through `geo`'s own generic trait implementations rather than
//! a hand-rolled 4x4 table: `geo::Relate` already performs the DE-9IM
//! computation the refiner needs, and a tagged enum converting into
//! `geo_types::Geometry` gets the same dispatch for free.

use crate::error::{EngineError, EngineResult};
use geo::algorithm::{Contains, EuclideanDistance, Intersects, Relate};
use geo_types::{Coord, Geometry as GeoGeometry, LineString as GeoLineString, Polygon as GeoPolygon};

pub type Point2D = nalgebra::Point2<f64>;

/// Closed axis-aligned bounding rectangle `[xMin,xMax] × [yMin,yMax]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mbr2D {
    pub x_min: f64,
    pub y_min: f64,
    pub x_max: f64,
    pub y_max: f64,
}

impl Mbr2D {
    pub fn new(x_min: f64, y_min: f64, x_max: f64, y_max: f64) -> Self {
        Self {
            x_min,
            y_min,
            x_max,
            y_max,
        }
    }

    /// The tight bounding box of a non-empty vertex sequence.
    pub fn from_points<'a>(points: impl Iterator<Item = &'a Point2D>) -> EngineResult<Self> {
        let mut it = points.peekable();
        if it.peek().is_none() {
            return Err(EngineError::InvalidGeometry(
                "cannot compute an MBR of an empty point set".into(),
            ));
        }
        let (mut x_min, mut y_min) = (f64::INFINITY, f64::INFINITY);
        let (mut x_max, mut y_max) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
        for p in it {
            x_min = x_min.min(p.x);
            x_max = x_max.max(p.x);
            y_min = y_min.min(p.y);
            y_max = y_max.max(p.y);
        }
        Ok(Self::new(x_min, y_min, x_max, y_max))
    }

    pub fn x_extent(&self) -> f64 {
        self.x_max - self.x_min
    }

    pub fn y_extent(&self) -> f64 {
        self.y_max - self.y_min
    }

    /// `a` and `b` intersect iff neither is wholly to one side of the other
    /// on either axis (§3).
    pub fn intersects(&self, other: &Mbr2D) -> bool {
        self.x_min <= other.x_max
            && other.x_min <= self.x_max
            && self.y_min <= other.y_max
            && other.y_min <= self.y_max
    }

    /// `self` fully contains `other` (closed intervals on both axes).
    pub fn contains(&self, other: &Mbr2D) -> bool {
        self.x_min <= other.x_min
            && other.x_max <= self.x_max
            && self.y_min <= other.y_min
            && other.y_max <= self.y_max
    }

    pub fn contains_point(&self, p: &Point2D) -> bool {
        self.x_min <= p.x && p.x <= self.x_max && self.y_min <= p.y && p.y <= self.y_max
    }

    pub fn equals(&self, other: &Mbr2D) -> bool {
        self.x_min == other.x_min
            && self.y_min == other.y_min
            && self.x_max == other.x_max
            && self.y_max == other.y_max
    }

    /// Which of the four MBR cases two bounding boxes are in, feeding §4.4's
    /// case dispatch (the sweep already guarantees `self.intersects(other)`).
    pub fn case(&self, other: &Mbr2D) -> MbrCase {
        let r_in_s = other.contains(self);
        let s_in_r = self.contains(other);
        match (r_in_s, s_in_r) {
            (true, true) => MbrCase::Equal,
            (true, false) => MbrCase::RInS,
            (false, true) => MbrCase::SInR,
            (false, false) => MbrCase::Intersect,
        }
    }

    /// Euclidean distance from a point to the (possibly degenerate) box.
    pub fn distance_to_point(&self, p: &Point2D) -> f64 {
        let dx = (self.x_min - p.x).max(0.0).max(p.x - self.x_max);
        let dy = (self.y_min - p.y).max(0.0).max(p.y - self.y_max);
        (dx * dx + dy * dy).sqrt()
    }

    /// Lower-bound Euclidean distance between two boxes: zero if they
    /// overlap, otherwise the gap between their nearest edges. Used to
    /// prune distance-join candidates before the exact geometry check.
    pub fn distance_to_mbr(&self, other: &Mbr2D) -> f64 {
        let dx = (self.x_min - other.x_max).max(0.0).max(other.x_min - self.x_max);
        let dy = (self.y_min - other.y_max).max(0.0).max(other.y_min - self.y_max);
        (dx * dx + dy * dy).sqrt()
    }
}

/// How two intersecting MBRs relate, chosen by the sweep to route the APRIL
/// filter (§4.4 / GLOSSARY "MBR case").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MbrCase {
    Intersect,
    RInS,
    SInR,
    Equal,
}

/// The spatial-type tag of a geometry (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpatialType {
    Point,
    LineString,
    Rectangle,
    Polygon,
}

/// A geometry: spatial type tag plus its vertex sequence and tight MBR.
///
/// Invariant: `mbr` is always the tight bounding box of `vertices` after
/// [`Shape::correct`] has run (ring closing, orientation) — §3.
#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    pub spatial_type: SpatialType,
    pub vertices: Vec<Point2D>,
    pub mbr: Mbr2D,
}

impl Shape {
    pub fn new(spatial_type: SpatialType, vertices: Vec<Point2D>) -> EngineResult<Self> {
        if vertices.is_empty() {
            return Err(EngineError::InvalidGeometry(
                "geometry has an empty vertex list".into(),
            ));
        }
        let mut shape = Self {
            spatial_type,
            vertices,
            mbr: Mbr2D::new(0., 0., 0., 0.),
        };
        shape.correct()?;
        Ok(shape)
    }

    /// Closes an unclosed polygon ring and recomputes the tight MBR. A
    /// linestring/point/rectangle is left as-is beyond MBR recomputation.
    pub fn correct(&mut self) -> EngineResult<()> {
        if self.spatial_type == SpatialType::Polygon {
            let first = self.vertices[0];
            let last = *self.vertices.last().unwrap();
            if (first.x - last.x).abs() > f64::EPSILON || (first.y - last.y).abs() > f64::EPSILON
            {
                self.vertices.push(first);
            }
            if self.vertices.len() < 4 {
                return Err(EngineError::InvalidGeometry(
                    "polygon ring has fewer than 3 distinct vertices".into(),
                ));
            }
        }
        self.mbr = Mbr2D::from_points(self.vertices.iter())?;
        Ok(())
    }

    pub fn is_areal(&self) -> bool {
        matches!(self.spatial_type, SpatialType::Polygon | SpatialType::Rectangle)
    }

    fn to_geo(&self) -> GeoGeometry<f64> {
        match self.spatial_type {
            SpatialType::Point => {
                let p = self.vertices[0];
                GeoGeometry::Point(geo_types::Point::new(p.x, p.y))
            }
            SpatialType::LineString => {
                let coords: Vec<Coord<f64>> =
                    self.vertices.iter().map(|p| Coord { x: p.x, y: p.y }).collect();
                GeoGeometry::LineString(GeoLineString::new(coords))
            }
            SpatialType::Rectangle | SpatialType::Polygon => {
                let coords: Vec<Coord<f64>> =
                    self.vertices.iter().map(|p| Coord { x: p.x, y: p.y }).collect();
                GeoGeometry::Polygon(GeoPolygon::new(GeoLineString::new(coords), vec![]))
            }
        }
    }

    pub fn intersects(&self, other: &Shape) -> bool {
        self.to_geo().intersects(&other.to_geo())
    }

    pub fn contains(&self, other: &Shape) -> bool {
        self.to_geo().contains(&other.to_geo())
    }

    pub fn distance(&self, other: &Shape) -> f64 {
        self.to_geo().euclidean_distance(&other.to_geo())
    }

    /// Exact intersection against an axis-aligned window, used by range
    /// queries (§4.8) once the fine grid has pruned whole cells.
    pub fn intersects_rect(&self, window: &Mbr2D) -> bool {
        let rect = geo_types::Rect::new(
            Coord { x: window.x_min, y: window.y_min },
            Coord { x: window.x_max, y: window.y_max },
        );
        self.to_geo().intersects(&rect)
    }

    /// The DE-9IM intersection matrix string, e.g. `"212101212"`, for use
    /// against the canonical masks in §6.
    pub fn relate_matrix(&self, other: &Shape) -> String {
        self.to_geo().relate(&other.to_geo()).matrix_string()
    }

    /// Point-in-polygon test used by the APRIL generator (§4.2 step 4).
    pub fn contains_point(&self, p: &Point2D) -> bool {
        self.to_geo()
            .contains(&geo_types::Point::new(p.x, p.y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn mbr_extent_matches_the_difference_of_its_bounds() {
        let mbr = Mbr2D::new(1.5, -2.0, 4.5, 6.0);
        assert_relative_eq!(mbr.x_extent(), 3.0);
        assert_relative_eq!(mbr.y_extent(), 8.0);
    }

    #[test]
    fn mbr_intersects_is_symmetric_and_closed() {
        let a = Mbr2D::new(0., 0., 10., 10.);
        let b = Mbr2D::new(10., 10., 20., 20.);
        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
    }

    #[test]
    fn mbr_case_detects_containment_and_equality() {
        let r = Mbr2D::new(0., 0., 10., 10.);
        let s = Mbr2D::new(2., 2., 8., 8.);
        assert_eq!(r.case(&s), MbrCase::SInR);
        assert_eq!(s.case(&r), MbrCase::RInS);
        assert_eq!(r.case(&r), MbrCase::Equal);

        let t = Mbr2D::new(5., 5., 15., 15.);
        assert_eq!(r.case(&t), MbrCase::Intersect);
    }

    #[test]
    fn polygon_ring_is_closed_on_correction() {
        let pts = vec![
            Point2D::new(0., 0.),
            Point2D::new(10., 0.),
            Point2D::new(10., 10.),
            Point2D::new(0., 10.),
        ];
        let shape = Shape::new(SpatialType::Polygon, pts).unwrap();
        assert_eq!(shape.vertices.len(), 5);
        assert_eq!(shape.vertices[0], shape.vertices[4]);
        assert_eq!(shape.mbr, Mbr2D::new(0., 0., 10., 10.));
    }

    #[test]
    fn empty_vertex_list_is_rejected() {
        assert!(Shape::new(SpatialType::Point, vec![]).is_err());
    }
}
