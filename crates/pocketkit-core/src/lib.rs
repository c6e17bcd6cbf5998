//! # pocketkit core
//!
//! Planar geometry shared by the pocketing strategies:
//!
//! - [`Point`], [`Rotation`] and [`BoundingBox`] value types
//! - [`Curve`] loops built from line and arc [`Vertex`] entries
//! - the [`RegionAlgebra`] trait and its `cavalier_contours`-backed [`Region`]
//! - a cooperative [`CancellationToken`]

pub mod cancel;
pub mod curve;
pub mod error;
pub mod geometry;
pub mod region;

pub use cancel::CancellationToken;
pub use curve::{Curve, Span, Vertex, VertexKind};
pub use error::{CoreError, CoreResult, GeometryError, GeometryResult};
pub use geometry::{circle_through_points, BoundingBox, Point, Rotation, POINT_TOLERANCE};
pub use region::{OffsetTopology, Region, RegionAlgebra, AREA_TOLERANCE};
