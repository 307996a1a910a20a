/// Per-tick transition sweep for moving entities.
///
/// The external scheduler samples an entity's hitbox points before and
/// after a move and hands both sets here; the sweep reports which
/// regions were entered, exited, or merely still occupied. A spawn is
/// the same call with an empty previous set.

use bitflags::bitflags;
use glam::DVec3;
use slotmap::SlotMap;

use crate::geometry::{Aabb, Region, RegionId, RegionKey};
use crate::index::SpatialIndex;

bitflags! {
    /// Which transition kinds a sweep should report.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct TransitionMask: u8 {
        /// Entity was outside last tick and is inside now
        const ENTERED = 1 << 0;
        /// Entity was inside last tick and is outside now
        const EXITED = 1 << 1;
        /// Entity is inside this tick (fires every tick while inside)
        const TICK = 1 << 2;
    }
}

/// A single region/entity transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionKind {
    /// Crossed from outside to inside
    Entered,
    /// Crossed from inside to outside
    Exited,
    /// Inside this tick
    Tick,
}

/// A transition of one entity relative to one region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionTransition {
    /// The region involved
    pub id: RegionId,
    /// What happened
    pub kind: TransitionKind,
}

/// Sweep an entity's move against all regions near its path.
///
/// Broad phase: one AABB query over the union box of both point sets.
/// Narrow phase: `contains_any` on the previous and current hitbox
/// points of each candidate. Per region, `Tick` is reported before
/// `Entered`; `Exited` excludes ticks by definition.
pub fn sweep(
    regions: &SlotMap<RegionKey, Region>,
    index: &dyn SpatialIndex,
    previous: &[DVec3],
    current: &[DVec3],
    mask: TransitionMask,
) -> Vec<RegionTransition> {
    if mask.is_empty() || (previous.is_empty() && current.is_empty()) {
        return Vec::new();
    }

    let query_box = Aabb::from_points(previous.iter().chain(current.iter()).copied());
    let mut candidates = Vec::new();
    index.query_aabb(&query_box, &mut candidates);

    let mut transitions = Vec::new();
    for key in candidates {
        let region = match regions.get(key) {
            Some(region) => region,
            None => continue,
        };
        let was_inside = region.contains_any(previous);
        let is_inside = region.contains_any(current);

        if is_inside && mask.contains(TransitionMask::TICK) {
            transitions.push(RegionTransition {
                id: region.id(),
                kind: TransitionKind::Tick,
            });
        }
        if !was_inside && is_inside && mask.contains(TransitionMask::ENTERED) {
            transitions.push(RegionTransition {
                id: region.id(),
                kind: TransitionKind::Entered,
            });
        } else if was_inside && !is_inside && mask.contains(TransitionMask::EXITED) {
            transitions.push(RegionTransition {
                id: region.id(),
                kind: TransitionKind::Exited,
            });
        }
    }
    transitions
}

#[cfg(test)]
#[path = "transition_tests.rs"]
mod tests;
