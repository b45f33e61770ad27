//! Query types and drivers (§4.8): range queries, kNN, ε-distance joins,
//! predicate joins, and full topological-relation discovery, each reducible
//! under one of the three result modes in [`result::ResultMode`].

pub mod distance_join;
pub mod knn;
pub mod range;
pub mod result;

use crate::filter::Relation;
use crate::geometry::Mbr2D;

pub use result::{PairMatch, QueryResult, ResultMode};

/// The kind of spatial query to run, and its parameters (§4.8).
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    /// All geometries of a dataset intersecting a window.
    Range { window: Mbr2D },
    /// The `k` nearest geometries to a point.
    Knn { point: crate::geometry::Point2D, k: usize },
    /// All pairs `(r, s)` within `epsilon` of each other.
    DistanceJoin { epsilon: f64 },
    /// All pairs `(r, s)` satisfying `relation`.
    PredicateJoin { relation: Relation },
    /// The exact relation of every candidate pair the sweep produces,
    /// regardless of which relation it turns out to be.
    FindRelation,
}
