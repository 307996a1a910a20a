//! Unit tests for plane.rs

use super::*;
use glam::DVec3;

// ============================================================================
// CONSTRUCTION
// ============================================================================

#[test]
fn test_from_points_xy_plane() {
    let plane = Plane::from_points(
        DVec3::new(0.0, 0.0, 0.0),
        DVec3::new(1.0, 0.0, 0.0),
        DVec3::new(0.0, 1.0, 0.0),
    )
    .unwrap();
    assert!((plane.normal - DVec3::Z).length() < 1e-12);
    assert!(plane.offset.abs() < 1e-12);
}

#[test]
fn test_from_points_offset_plane() {
    let plane = Plane::from_points(
        DVec3::new(0.0, 0.0, 5.0),
        DVec3::new(1.0, 0.0, 5.0),
        DVec3::new(0.0, 1.0, 5.0),
    )
    .unwrap();
    assert!((plane.offset - 5.0).abs() < 1e-12);
}

#[test]
fn test_from_collinear_points_is_none() {
    let plane = Plane::from_points(
        DVec3::new(0.0, 0.0, 0.0),
        DVec3::new(1.0, 1.0, 1.0),
        DVec3::new(2.0, 2.0, 2.0),
    );
    assert!(plane.is_none());
}

// ============================================================================
// SIGNED DISTANCE
// ============================================================================

#[test]
fn test_signed_distance_signs() {
    let plane = Plane::new(DVec3::Z, 5.0);
    assert!((plane.signed_distance(&DVec3::new(0.0, 0.0, 8.0)) - 3.0).abs() < 1e-12);
    assert!((plane.signed_distance(&DVec3::new(0.0, 0.0, 2.0)) + 3.0).abs() < 1e-12);
    assert!(plane.signed_distance(&DVec3::new(7.0, -3.0, 5.0)).abs() < 1e-12);
}

#[test]
fn test_flipped_negates_distance() {
    let plane = Plane::new(DVec3::Y, 2.0);
    let p = DVec3::new(0.0, 7.0, 0.0);
    assert!((plane.signed_distance(&p) + plane.flipped().signed_distance(&p)).abs() < 1e-12);
}
