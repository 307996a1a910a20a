/// Two-phase region queries.
///
/// The index only ever narrows the candidate set by AABB; every result
/// reported here has passed the exact geometric test on the Region.
/// Reporting from AABB overlap alone is not an optimization, it is a
/// correctness bug.
///
/// Ownership mirrors the registry: the caller holds the region map and
/// the index and passes both in; the engine keeps no state.

use glam::DVec3;
use rdst::RadixSort;
use slotmap::SlotMap;

use crate::error::{Region3dError, Region3dResult};
use crate::geometry::{Region, RegionId, RegionKey};
use crate::index::SpatialIndex;

/// Stateless query strategies over a region map and its index.
pub struct QueryEngine;

impl QueryEngine {
    /// All regions whose geometry contains the point, boundary
    /// inclusive within EPSILON. No ordering guarantee; see
    /// [`QueryEngine::sort_ids`].
    pub fn regions_containing(
        regions: &SlotMap<RegionKey, Region>,
        index: &dyn SpatialIndex,
        point: &DVec3,
    ) -> Vec<RegionId> {
        let mut candidates = Vec::new();
        index.query_point(point, &mut candidates);

        candidates
            .into_iter()
            .filter_map(|key| regions.get(key))
            .filter(|region| region.contains(point))
            .map(|region| region.id())
            .collect()
    }

    /// All regions whose geometry intersects the target region's,
    /// excluding the target itself. No ordering guarantee.
    ///
    /// # Errors
    ///
    /// * `InvariantViolation` - the key has no region behind it (the
    ///   registry map and index went out of sync)
    pub fn regions_overlapping(
        regions: &SlotMap<RegionKey, Region>,
        index: &dyn SpatialIndex,
        target: RegionKey,
    ) -> Region3dResult<Vec<RegionId>> {
        let target_region = regions.get(target).ok_or_else(|| {
            Region3dError::InvariantViolation(format!(
                "query key {:?} has no region in the map",
                target
            ))
        })?;

        let mut candidates = Vec::new();
        index.query_aabb(target_region.bounding_box(), &mut candidates);

        Ok(candidates
            .into_iter()
            .filter(|&key| key != target)
            .filter_map(|key| regions.get(key))
            .filter(|region| target_region.intersects_region(region))
            .map(|region| region.id())
            .collect())
    }

    /// Radix-sort region ids ascending, for callers that need
    /// deterministic result ordering.
    pub fn sort_ids(ids: &mut [RegionId]) {
        ids.radix_sort_unstable();
    }
}

#[cfg(test)]
#[path = "query_engine_tests.rs"]
mod tests;
