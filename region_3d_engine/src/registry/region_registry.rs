/// RegionRegistry: the owning map from region ids to built regions.
///
/// One registry per world. It is an explicit, constructed object the
/// host passes around, never a process global: init it at world
/// startup, drop it at shutdown. The registry drives the region map
/// and the spatial index together, so from the caller's perspective a
/// region and its index entry appear and disappear atomically.
///
/// Mutations belong on one scheduling context (the world tick loop).
/// For cross-thread readers, wrap it via `into_shared()`: readers take
/// the read lock, the ticking writer takes the write lock.

use std::sync::{Arc, RwLock};
use std::time::Instant;

use glam::DVec3;
use rustc_hash::FxHashMap;
use slotmap::SlotMap;

use crate::error::{Region3dError, Region3dResult};
use crate::geometry::{HullBuilder, Region, RegionId, RegionKey};
use crate::index::{RTreeIndex, SpatialIndex};
use crate::query::{transition, QueryEngine, RegionTransition, TransitionMask};
use crate::{region_debug, region_warn};

/// Registry behind a read-write lock: concurrent readers, exclusive
/// writer, per the engine's single-owner-thread mutation model.
pub type SharedRegionRegistry = Arc<RwLock<RegionRegistry>>;

/// Owning collection of all regions in a world plus their spatial index.
pub struct RegionRegistry {
    /// Region storage with stable internal keys
    regions: SlotMap<RegionKey, Region>,
    /// Public identifier to internal key
    ids: FxHashMap<RegionId, RegionKey>,
    /// Broad-phase index over region AABBs
    index: Box<dyn SpatialIndex>,
    /// Running total of hull facets across all regions
    total_faces: usize,
}

impl RegionRegistry {
    /// Create a registry backed by the default R-tree index.
    pub fn new() -> Self {
        Self::with_index(Box::new(RTreeIndex::new()))
    }

    /// Create a registry backed by a caller-supplied index
    /// implementation (tests swap in instrumented ones).
    pub fn with_index(index: Box<dyn SpatialIndex>) -> Self {
        Self {
            regions: SlotMap::with_key(),
            ids: FxHashMap::default(),
            index,
            total_faces: 0,
        }
    }

    /// Wrap this registry for the concurrent-reader discipline.
    pub fn into_shared(self) -> SharedRegionRegistry {
        Arc::new(RwLock::new(self))
    }

    // ===== LIFECYCLE =====

    /// Build a region from a point set and register it.
    ///
    /// # Errors
    ///
    /// * `DuplicateId` - a region with this id exists (state unchanged)
    /// * `EmptyInput` - the point set is empty (state unchanged)
    pub fn create(&mut self, id: RegionId, points: &[DVec3]) -> Region3dResult<&Region> {
        if self.ids.contains_key(&id) {
            return Err(Region3dError::DuplicateId(id));
        }

        let region = build_region(id, points)?;
        let face_count = region.face_count();
        let key = self.regions.insert(region);
        if let Err(err) = self.index.insert(key, self.regions[key].bounding_box()) {
            // Keep the no-partial-state guarantee even on an index bug.
            self.regions.remove(key);
            return Err(err);
        }
        self.ids.insert(id, key);
        self.total_faces += face_count;

        Ok(&self.regions[key])
    }

    /// Rebuild a region from a new point set, replacing the old one.
    ///
    /// This is the per-tick update hook for moving regions. The new
    /// hull is built before anything is touched: when construction
    /// fails the old region stays installed, index entry included.
    ///
    /// # Errors
    ///
    /// * `NotFound` - no region with this id
    /// * `EmptyInput` - the point set is empty (old region retained)
    pub fn replace(&mut self, id: RegionId, points: &[DVec3]) -> Region3dResult<()> {
        let key = *self.ids.get(&id).ok_or(Region3dError::NotFound(id))?;

        let region = build_region(id, points)?;
        self.index.update(key, region.bounding_box())?;
        if let Some(slot) = self.regions.get_mut(key) {
            self.total_faces = self.total_faces - slot.face_count() + region.face_count();
            *slot = region;
        }
        Ok(())
    }

    /// Remove a region and its index entry.
    ///
    /// # Errors
    ///
    /// * `NotFound` - no region with this id
    pub fn destroy(&mut self, id: RegionId) -> Region3dResult<()> {
        let key = *self.ids.get(&id).ok_or(Region3dError::NotFound(id))?;
        self.index.remove(key)?;
        self.ids.remove(&id);
        if let Some(region) = self.regions.remove(key) {
            self.total_faces -= region.face_count();
        }
        region_debug!("region3d::Registry", "destroyed region {}", id.0);
        Ok(())
    }

    /// Remove all regions and reset the index.
    pub fn clear(&mut self) {
        self.regions.clear();
        self.ids.clear();
        self.index.clear();
        self.total_faces = 0;
    }

    // ===== ACCESSORS =====

    /// Get a region by id
    pub fn region(&self, id: RegionId) -> Option<&Region> {
        self.ids.get(&id).and_then(|&key| self.regions.get(key))
    }

    /// Whether a region with this id is registered
    pub fn contains_id(&self, id: RegionId) -> bool {
        self.ids.contains_key(&id)
    }

    /// Number of registered regions
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    /// Whether no regions are registered
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Iterate over all registered regions
    pub fn iter(&self) -> impl Iterator<Item = &Region> {
        self.regions.values()
    }

    /// Combined hull facet count across all registered regions
    pub fn total_face_count(&self) -> usize {
        self.total_faces
    }

    /// The underlying spatial index (read-only)
    pub fn index(&self) -> &dyn SpatialIndex {
        self.index.as_ref()
    }

    // ===== QUERIES =====

    /// All regions containing the point (exact, boundary inclusive).
    pub fn regions_containing(&self, point: &DVec3) -> Vec<RegionId> {
        QueryEngine::regions_containing(&self.regions, self.index.as_ref(), point)
    }

    /// All regions geometrically intersecting the given region,
    /// excluding itself.
    ///
    /// # Errors
    ///
    /// * `NotFound` - no region with this id
    pub fn regions_overlapping(&self, id: RegionId) -> Region3dResult<Vec<RegionId>> {
        let key = *self.ids.get(&id).ok_or(Region3dError::NotFound(id))?;
        QueryEngine::regions_overlapping(&self.regions, self.index.as_ref(), key)
    }

    /// Sweep an entity's hitbox move against nearby regions.
    pub fn sweep_transitions(
        &self,
        previous: &[DVec3],
        current: &[DVec3],
        mask: TransitionMask,
    ) -> Vec<RegionTransition> {
        transition::sweep(&self.regions, self.index.as_ref(), previous, current, mask)
    }

    // ===== VALIDATION =====

    /// Audit registry/index consistency and the index structure.
    ///
    /// # Errors
    ///
    /// * `InvariantViolation` - counts disagree or the index tree is
    ///   corrupt; fatal, do not recover
    pub fn validate(&self) -> Region3dResult<()> {
        if self.ids.len() != self.regions.len() {
            return Err(Region3dError::InvariantViolation(format!(
                "id map holds {} rows but region map holds {}",
                self.ids.len(),
                self.regions.len()
            )));
        }
        if self.index.len() != self.regions.len() {
            return Err(Region3dError::InvariantViolation(format!(
                "index holds {} entries but region map holds {}",
                self.index.len(),
                self.regions.len()
            )));
        }
        self.index.validate()
    }
}

impl Default for RegionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Build and log one region hull.
fn build_region(id: RegionId, points: &[DVec3]) -> Region3dResult<Region> {
    let started = Instant::now();
    let hull = HullBuilder::build(points)?;
    let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;

    if hull.is_degenerate() {
        region_warn!(
            "region3d::Registry",
            "region {} collapsed to a degenerate {} hull; containment tests incidence, not volume",
            id.0,
            hull.kind_name()
        );
    }
    region_debug!(
        "region3d::Registry",
        "hull for region {} computed in {:.3} ms ({} vertices, {} faces)",
        id.0,
        elapsed_ms,
        hull.vertices().len(),
        hull.face_count()
    );

    Ok(Region::new(id, hull))
}

#[cfg(test)]
#[path = "region_registry_tests.rs"]
mod tests;
