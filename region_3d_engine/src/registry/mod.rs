//! Region lifecycle ownership.

pub mod region_registry;

pub use region_registry::{RegionRegistry, SharedRegionRegistry};
