//! Unit tests for region_registry.rs
//!
//! Lifecycle atomicity is the focus: create/replace/destroy keep the
//! region map and the spatial index in lockstep, and a failed replace
//! leaves the old region fully installed.

use super::*;
use crate::error::Region3dError;
use crate::query::{TransitionKind, TransitionMask};
use glam::DVec3;

fn v(x: f64, y: f64, z: f64) -> DVec3 {
    DVec3::new(x, y, z)
}

fn tetra(origin: DVec3, size: f64) -> Vec<DVec3> {
    vec![
        origin,
        origin + v(size, 0.0, 0.0),
        origin + v(0.0, size, 0.0),
        origin + v(0.0, 0.0, size),
    ]
}

fn cube(origin: DVec3, size: f64) -> Vec<DVec3> {
    let mut pts = Vec::new();
    for x in [0.0, size] {
        for y in [0.0, size] {
            for z in [0.0, size] {
                pts.push(origin + v(x, y, z));
            }
        }
    }
    pts
}

// ============================================================================
// CREATE
// ============================================================================

#[test]
fn test_create_registers_region_and_index_entry() {
    let mut registry = RegionRegistry::new();
    let region = registry.create(RegionId(1), &tetra(DVec3::ZERO, 10.0)).unwrap();
    assert_eq!(region.id(), RegionId(1));

    assert_eq!(registry.len(), 1);
    assert!(registry.contains_id(RegionId(1)));
    assert_eq!(registry.index().len(), 1);
    assert!(registry.validate().is_ok());
}

#[test]
fn test_create_duplicate_id_fails_with_state_unchanged() {
    let mut registry = RegionRegistry::new();
    registry.create(RegionId(1), &tetra(DVec3::ZERO, 10.0)).unwrap();
    let before = registry.region(RegionId(1)).cloned();

    let err = registry.create(RegionId(1), &cube(v(50.0, 0.0, 0.0), 5.0));
    assert_eq!(err.unwrap_err(), Region3dError::DuplicateId(RegionId(1)));

    assert_eq!(registry.len(), 1);
    assert_eq!(registry.region(RegionId(1)).cloned(), before);
    assert!(registry.validate().is_ok());
}

#[test]
fn test_create_empty_points_fails_cleanly() {
    let mut registry = RegionRegistry::new();
    assert_eq!(
        registry.create(RegionId(1), &[]).unwrap_err(),
        Region3dError::EmptyInput
    );
    assert!(registry.is_empty());
    assert!(registry.validate().is_ok());
}

#[test]
fn test_create_degenerate_region_succeeds() {
    let mut registry = RegionRegistry::new();
    registry
        .create(
            RegionId(1),
            &[
                v(0.0, 0.0, 5.0),
                v(10.0, 0.0, 5.0),
                v(10.0, 10.0, 5.0),
                v(0.0, 10.0, 5.0),
            ],
        )
        .unwrap();
    assert_eq!(registry.regions_containing(&v(5.0, 5.0, 5.0)), vec![RegionId(1)]);
    assert!(registry.regions_containing(&v(5.0, 5.0, 6.0)).is_empty());
}

#[test]
fn test_total_face_count_tracks_regions() {
    let mut registry = RegionRegistry::new();
    registry.create(RegionId(1), &tetra(DVec3::ZERO, 10.0)).unwrap(); // 4 faces
    registry
        .create(
            RegionId(2),
            &[
                v(20.0, 0.0, 0.0),
                v(30.0, 0.0, 0.0),
                v(30.0, 10.0, 0.0),
                v(20.0, 10.0, 0.0),
            ],
        )
        .unwrap(); // 1 polygon face
    assert_eq!(registry.total_face_count(), 5);

    registry.destroy(RegionId(1)).unwrap();
    assert_eq!(registry.total_face_count(), 1);
}

// ============================================================================
// REPLACE
// ============================================================================

#[test]
fn test_replace_moves_region() {
    let mut registry = RegionRegistry::new();
    registry.create(RegionId(1), &cube(DVec3::ZERO, 10.0)).unwrap();

    registry.replace(RegionId(1), &cube(v(20.0, 0.0, 0.0), 10.0)).unwrap();

    assert!(registry.regions_containing(&v(5.0, 5.0, 5.0)).is_empty());
    assert_eq!(
        registry.regions_containing(&v(25.0, 5.0, 5.0)),
        vec![RegionId(1)]
    );
    assert_eq!(registry.len(), 1);
    assert!(registry.validate().is_ok());
}

#[test]
fn test_replace_unknown_id_fails() {
    let mut registry = RegionRegistry::new();
    assert_eq!(
        registry
            .replace(RegionId(9), &tetra(DVec3::ZERO, 1.0))
            .unwrap_err(),
        Region3dError::NotFound(RegionId(9))
    );
}

#[test]
fn test_replace_failure_retains_old_region() {
    let mut registry = RegionRegistry::new();
    registry.create(RegionId(1), &cube(DVec3::ZERO, 10.0)).unwrap();
    let before = registry.region(RegionId(1)).cloned();

    assert_eq!(
        registry.replace(RegionId(1), &[]).unwrap_err(),
        Region3dError::EmptyInput
    );

    // Old region fully installed: same geometry, still queryable
    assert_eq!(registry.region(RegionId(1)).cloned(), before);
    assert_eq!(
        registry.regions_containing(&v(5.0, 5.0, 5.0)),
        vec![RegionId(1)]
    );
    assert!(registry.validate().is_ok());
}

#[test]
fn test_replace_with_same_points_is_idempotent() {
    let pts = tetra(v(3.0, 3.0, 3.0), 8.0);
    let mut registry = RegionRegistry::new();
    registry.create(RegionId(1), &pts).unwrap();
    let first = registry.region(RegionId(1)).cloned().unwrap();

    registry.replace(RegionId(1), &pts).unwrap();
    let second = registry.region(RegionId(1)).cloned().unwrap();
    registry.replace(RegionId(1), &pts).unwrap();
    let third = registry.region(RegionId(1)).cloned().unwrap();

    // Identical geometry and identical index AABB every time
    assert_eq!(first, second);
    assert_eq!(second, third);
    assert!(registry.validate().is_ok());
}

#[test]
fn test_replace_small_move_per_tick() {
    // The per-tick update hook: a hitbox drifting one unit per tick
    let mut registry = RegionRegistry::new();
    registry.create(RegionId(1), &cube(DVec3::ZERO, 2.0)).unwrap();

    for tick in 1..=30 {
        let origin = v(tick as f64 * 0.5, 0.0, 0.0);
        registry.replace(RegionId(1), &cube(origin, 2.0)).unwrap();
        assert!(registry.validate().is_ok());
        assert_eq!(
            registry.regions_containing(&(origin + DVec3::splat(1.0))),
            vec![RegionId(1)]
        );
    }
}

// ============================================================================
// DESTROY
// ============================================================================

#[test]
fn test_destroy_removes_region_and_entry() {
    let mut registry = RegionRegistry::new();
    registry.create(RegionId(1), &tetra(DVec3::ZERO, 10.0)).unwrap();
    registry.create(RegionId(2), &cube(v(20.0, 0.0, 0.0), 5.0)).unwrap();

    registry.destroy(RegionId(1)).unwrap();
    assert_eq!(registry.len(), 1);
    assert!(!registry.contains_id(RegionId(1)));
    assert!(registry.regions_containing(&v(2.0, 2.0, 2.0)).is_empty());
    assert!(registry.validate().is_ok());
}

#[test]
fn test_destroy_unknown_id_fails() {
    let mut registry = RegionRegistry::new();
    assert_eq!(
        registry.destroy(RegionId(1)).unwrap_err(),
        Region3dError::NotFound(RegionId(1))
    );

    registry.create(RegionId(1), &tetra(DVec3::ZERO, 1.0)).unwrap();
    registry.destroy(RegionId(1)).unwrap();
    // Stale second destroy is ordinary control flow for callers
    assert_eq!(
        registry.destroy(RegionId(1)).unwrap_err(),
        Region3dError::NotFound(RegionId(1))
    );
}

// ============================================================================
// QUERIES THROUGH THE REGISTRY
// ============================================================================

#[test]
fn test_regions_overlapping_through_registry() {
    let mut registry = RegionRegistry::new();
    registry.create(RegionId(1), &tetra(DVec3::ZERO, 10.0)).unwrap();
    registry.create(RegionId(2), &cube(DVec3::ZERO, 10.0)).unwrap();
    registry.create(RegionId(3), &cube(v(50.0, 0.0, 0.0), 5.0)).unwrap();

    let ids = registry.regions_overlapping(RegionId(1)).unwrap();
    assert_eq!(ids, vec![RegionId(2)]);

    assert_eq!(
        registry.regions_overlapping(RegionId(42)).unwrap_err(),
        Region3dError::NotFound(RegionId(42))
    );
}

#[test]
fn test_sweep_through_registry() {
    let mut registry = RegionRegistry::new();
    registry.create(RegionId(1), &cube(DVec3::ZERO, 10.0)).unwrap();

    let prev = [v(15.0, 5.0, 5.0)];
    let curr = [v(5.0, 5.0, 5.0)];
    let transitions = registry.sweep_transitions(&prev, &curr, TransitionMask::ENTERED);
    assert_eq!(transitions.len(), 1);
    assert_eq!(transitions[0].kind, TransitionKind::Entered);
    assert_eq!(transitions[0].id, RegionId(1));
}

// ============================================================================
// LIFECYCLE CHURN
// ============================================================================

#[test]
fn test_churn_keeps_registry_and_index_consistent() {
    let mut registry = RegionRegistry::new();

    for i in 0..24u64 {
        let origin = v((i % 6) as f64 * 12.0, (i / 6) as f64 * 12.0, 0.0);
        registry.create(RegionId(i), &cube(origin, 8.0)).unwrap();
    }
    for i in (0..24u64).step_by(3) {
        registry.destroy(RegionId(i)).unwrap();
    }
    for i in (1..24u64).step_by(3) {
        let origin = v(100.0 + i as f64, 0.0, 0.0);
        registry.replace(RegionId(i), &cube(origin, 4.0)).unwrap();
    }

    assert!(registry.validate().is_ok());
    assert_eq!(registry.len(), 16);
    assert_eq!(registry.iter().count(), 16);

    // Survivors answer queries at their current position
    assert_eq!(
        registry.regions_containing(&v(102.0, 1.0, 1.0)),
        vec![RegionId(1)]
    );
}

#[test]
fn test_clear() {
    let mut registry = RegionRegistry::new();
    registry.create(RegionId(1), &cube(DVec3::ZERO, 10.0)).unwrap();
    registry.clear();
    assert!(registry.is_empty());
    assert_eq!(registry.total_face_count(), 0);
    assert!(registry.validate().is_ok());
    assert!(registry.regions_containing(&v(5.0, 5.0, 5.0)).is_empty());
}
