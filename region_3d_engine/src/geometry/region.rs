/// Region types for the registry and query systems.
///
/// A Region is a built hull frozen behind a caller-supplied identifier,
/// with its broad-phase AABB precomputed. Regions never mutate; moving
/// one means building a replacement and swapping the registry entry.

use glam::DVec3;
use rdst::RadixKey;
use slotmap::new_key_type;

use super::{Aabb, Hull, EPSILON};

// ===== IDENTIFIERS =====

/// Caller-supplied region identifier.
///
/// The engine never allocates these; the hosting game layer derives
/// them from whatever it keys triggers by (entity ids, config hashes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RegionId(pub u64);

/// Least-significant-byte radix key, so query results sort with the
/// registry's deterministic-ordering helper.
impl RadixKey for RegionId {
    const LEVELS: usize = 8;

    #[inline]
    fn get_level(&self, level: usize) -> u8 {
        (self.0 >> (level * 8)) as u8
    }
}

new_key_type! {
    /// Stable internal key for a Region within a registry.
    ///
    /// The spatial index stores these instead of region ids so its
    /// entries stay a projection of registry state, never an owner.
    pub struct RegionKey;
}

// ===== REGION =====

/// An immutable geometric volume: a built hull plus its cached AABB.
///
/// The AABB is inflated by EPSILON so the broad phase stays a strict
/// superset of the boundary-inclusive narrow phase.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    /// Caller-supplied identifier
    id: RegionId,
    /// The convex shape
    hull: Hull,
    /// Precomputed broad-phase box
    bounding_box: Aabb,
}

impl Region {
    /// Wrap a built hull as a queryable region.
    pub fn new(id: RegionId, hull: Hull) -> Self {
        let bounding_box = hull.bounding_box().inflated(EPSILON);
        Self {
            id,
            hull,
            bounding_box,
        }
    }

    /// Get the region identifier
    pub fn id(&self) -> RegionId {
        self.id
    }

    /// Get the underlying hull
    pub fn hull(&self) -> &Hull {
        &self.hull
    }

    /// Get the precomputed bounding box
    pub fn bounding_box(&self) -> &Aabb {
        &self.bounding_box
    }

    /// Number of hull facets (the registry totals these across regions)
    pub fn face_count(&self) -> usize {
        self.hull.face_count()
    }

    /// Exact containment test, boundary inclusive within EPSILON.
    ///
    /// Degenerate regions (polygon, segment, point) test incidence with
    /// the lower-dimensional shape, not volumetric inclusion.
    pub fn contains(&self, p: &DVec3) -> bool {
        self.hull.contains(p)
    }

    /// True if any of the given points is contained.
    ///
    /// This is the hitbox test: callers pass an entity's corner points
    /// and the region counts as occupied when any corner is inside.
    pub fn contains_any(&self, points: &[DVec3]) -> bool {
        points.iter().any(|p| self.contains(p))
    }

    /// Exact region-box intersection.
    ///
    /// Rejects via the cached AABB first; only overlapping boxes pay
    /// for the separating-axis test.
    pub fn intersects_aabb(&self, aabb: &Aabb) -> bool {
        if !self.bounding_box.intersects(aabb) {
            return false;
        }
        self.hull.intersects_aabb(aabb)
    }

    /// Exact region-region intersection (separating-axis over both
    /// hulls). AABB overlap alone is never enough to return true.
    pub fn intersects_region(&self, other: &Region) -> bool {
        if !self.bounding_box.intersects(&other.bounding_box) {
            return false;
        }
        self.hull.intersects_hull(&other.hull)
    }
}

#[cfg(test)]
#[path = "region_tests.rs"]
mod tests;
