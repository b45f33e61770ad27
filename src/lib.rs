//! A distributed spatial query engine core.
//!
//! Geometries are spread across workers by a two-grid partitioner (a coarse
//! distribution grid plus a fine partitioning grid nested inside it, see
//! [`partition`]), each assigned a Two-Layer class that lets two partitions
//! be joined by a single duplicate-free plane sweep ([`sweep`]). Most
//! candidate pairs the sweep produces are resolved without ever touching
//! exact geometry, through a raster approximation of each shape on a
//! Hilbert-ordered grid ([`april`], [`hilbert`], [`intervals`]) composed
//! into an intermediate filter ([`filter`]); only the pairs the filter
//! cannot decide fall through to an exact DE-9IM refinement ([`relate`]).
//! [`pipeline`] ties those three stages together per pair, [`worker`] fans
//! that work out across fine cells, and [`query`] reduces the results of a
//! range query, a kNN search, an ε-distance join, a predicate join, or a
//! full relation discovery into one of three result shapes.
//!
//! [`api`] is the language-neutral surface described in the external
//! interfaces section: dataset lifecycle plus the five query kinds, built
//! on an immutable [`config::EngineConfig`].

pub mod api;
pub mod april;
pub mod config;
pub mod dataset;
pub mod error;
pub mod filter;
pub mod geometry;
pub mod hilbert;
pub mod intervals;
pub mod partition;
pub mod persist;
pub mod pipeline;
pub mod query;
pub mod relate;
pub mod sweep;
pub mod worker;

pub use api::{Engine, IndexKind};
pub use config::EngineConfig;
pub use dataset::{Dataset, DatasetId};
pub use error::{EngineError, EngineResult};
pub use filter::Relation;
pub use geometry::{Mbr2D, Point2D, Shape, SpatialType};
pub use query::{Query, QueryResult, ResultMode};
