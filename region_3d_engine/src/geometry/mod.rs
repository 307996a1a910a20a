//! Convex geometry primitives: bounding boxes, planes, hulls, regions.
//!
//! Everything here is plain value math on `glam::DVec3`. The spatial
//! index and registry build on these types but never mutate them.

pub mod aabb;
pub mod hull;
pub mod plane;
pub mod region;

pub use aabb::Aabb;
pub use hull::{Face, Hull, HullBuilder};
pub use plane::Plane;
pub use region::{Region, RegionId, RegionKey};

/// Tolerance for geometric predicates (on-plane tests, visibility,
/// point dedup). Boundary points within EPSILON of a face count as
/// contained.
pub const EPSILON: f64 = 1e-7;
