/*!
# Region 3D Engine

Spatial core for trigger volumes in a game world: convex hulls built
from point sets, indexed by a dynamic R-tree, queried exactly.

A hosting game layer feeds region definitions in as plain point
sequences and calls `replace` once per tick for anything that moved;
everything else (events, persistence, networking) stays outside.

## Architecture

- **HullBuilder**: point cloud in, minimal convex hull out; inputs that
  span fewer than three dimensions collapse to tagged degenerate shapes
  instead of failing
- **Region**: an immutable built hull plus its cached bounding box,
  with exact containment and intersection tests
- **SpatialIndex / RTreeIndex**: broad-phase bounding-volume index over
  region AABBs (arena nodes, quadratic split)
- **QueryEngine**: broad-phase candidates narrowed by exact geometry;
  AABB overlap alone is never reported
- **RegionRegistry**: the owning id-to-region map driving region and
  index lifecycles together

Queries flow index-first: `SpatialIndex` prunes by AABB, `Region`
confirms exactly, `RegionRegistry` glues both behind one API.
*/

// Internal modules
mod error;
pub mod geometry;
pub mod index;
pub mod log;
pub mod query;
pub mod registry;

// Main region3d namespace module
pub mod region3d {
    // Error types
    pub use crate::error::{Region3dError, Region3dResult};

    // Geometry
    pub use crate::geometry::{
        Aabb, Face, Hull, HullBuilder, Plane, Region, RegionId, RegionKey, EPSILON,
    };

    // Spatial index
    pub use crate::index::{RTreeIndex, SpatialIndex};

    // Queries
    pub use crate::query::{QueryEngine, RegionTransition, TransitionKind, TransitionMask};

    // Registry
    pub use crate::registry::{RegionRegistry, SharedRegionRegistry};

    // Logging sub-module (types only, NOT macros)
    pub mod log {
        pub use crate::log::{DefaultLogger, LogEntry, LogSeverity, Logger};
    }
}

// Re-export math library at crate root
pub use glam;
