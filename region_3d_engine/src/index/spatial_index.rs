/// Trait for spatial indexing of regions by their world-space AABB.
///
/// An index is the broad phase only: it answers which entries MIGHT
/// match a point or box, never whether the underlying region actually
/// does. The registry owns the index and keeps it in lockstep with the
/// region map; exact tests live on Region.

use glam::DVec3;

use crate::error::Region3dResult;
use crate::geometry::{Aabb, RegionKey};

/// Dynamic bounding-volume index over region AABBs.
///
/// Implementations must keep queries sub-linear under insert/remove
/// churn. The registry owns the index; standalone use is possible but
/// the caller then owns key bookkeeping.
pub trait SpatialIndex: Send + Sync {
    /// Insert an entry with its world-space AABB.
    ///
    /// # Errors
    ///
    /// * `InvariantViolation` - the key is already present (the
    ///   registry guards against this; hitting it is a bug)
    fn insert(&mut self, key: RegionKey, aabb: &Aabb) -> Region3dResult<()>;

    /// Remove an entry from the index.
    ///
    /// # Errors
    ///
    /// * `KeyNotFound` - no entry with this key
    fn remove(&mut self, key: RegionKey) -> Region3dResult<()>;

    /// Replace an entry's AABB (e.g. after the region moved).
    ///
    /// Implementations may shortcut when the new box still fits the
    /// entry's current neighborhood, avoiding restructuring for small
    /// per-tick moves.
    ///
    /// # Errors
    ///
    /// * `KeyNotFound` - no entry with this key
    fn update(&mut self, key: RegionKey, aabb: &Aabb) -> Region3dResult<()>;

    /// Collect all entries whose AABB contains the point.
    /// Results are appended to `results` in no guaranteed order.
    fn query_point(&self, point: &DVec3, results: &mut Vec<RegionKey>);

    /// Collect all entries whose AABB overlaps the given box.
    /// Results are appended to `results` in no guaranteed order.
    fn query_aabb(&self, aabb: &Aabb, results: &mut Vec<RegionKey>);

    /// Remove all entries from the index.
    fn clear(&mut self);

    /// Number of entries currently indexed.
    fn len(&self) -> usize;

    /// Whether the index holds no entries.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Audit the internal structure.
    ///
    /// # Errors
    ///
    /// * `InvariantViolation` - a structural invariant failed; treat as
    ///   fatal (index corruption), do not recover
    fn validate(&self) -> Region3dResult<()>;
}
