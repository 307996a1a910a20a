//! Spatial acceleration structures for region queries.

pub mod rtree_index;
pub mod spatial_index;

pub use rtree_index::RTreeIndex;
pub use spatial_index::SpatialIndex;
