//! Unit tests for rtree_index.rs
//!
//! Structure is audited with validate() after every mutation pattern:
//! splits on overflow, condensing on underflow, the small-move update
//! shortcut, and randomized churn.

use super::*;
use crate::error::Region3dError;
use crate::geometry::{Aabb, RegionKey};
use glam::DVec3;
use slotmap::SlotMap;

fn v(x: f64, y: f64, z: f64) -> DVec3 {
    DVec3::new(x, y, z)
}

fn unit_box(at: DVec3) -> Aabb {
    Aabb::new(at, at + DVec3::splat(1.0))
}

/// Mint stable keys the same way a registry would.
fn make_keys(n: usize) -> Vec<RegionKey> {
    let mut sm: SlotMap<RegionKey, ()> = SlotMap::with_key();
    (0..n).map(|_| sm.insert(())).collect()
}

fn sorted(mut keys: Vec<RegionKey>) -> Vec<RegionKey> {
    keys.sort();
    keys
}

// ============================================================================
// EMPTY INDEX
// ============================================================================

#[test]
fn test_new_index_is_empty() {
    let index = RTreeIndex::new();
    assert_eq!(index.len(), 0);
    assert!(index.is_empty());
    assert!(index.validate().is_ok());

    let mut results = Vec::new();
    index.query_point(&v(0.0, 0.0, 0.0), &mut results);
    assert!(results.is_empty());
}

#[test]
fn test_remove_unknown_key_fails() {
    let mut index = RTreeIndex::new();
    let keys = make_keys(1);
    assert_eq!(index.remove(keys[0]), Err(Region3dError::KeyNotFound));
}

#[test]
fn test_update_unknown_key_fails() {
    let mut index = RTreeIndex::new();
    let keys = make_keys(1);
    assert_eq!(
        index.update(keys[0], &unit_box(DVec3::ZERO)),
        Err(Region3dError::KeyNotFound)
    );
}

#[test]
fn test_duplicate_insert_fails() {
    let mut index = RTreeIndex::new();
    let keys = make_keys(1);
    index.insert(keys[0], &unit_box(DVec3::ZERO)).unwrap();
    assert!(matches!(
        index.insert(keys[0], &unit_box(DVec3::ZERO)),
        Err(Region3dError::InvariantViolation(_))
    ));
    assert_eq!(index.len(), 1);
}

// ============================================================================
// INSERT AND QUERY
// ============================================================================

#[test]
fn test_insert_and_query_point() {
    let mut index = RTreeIndex::new();
    let keys = make_keys(1);
    index.insert(keys[0], &unit_box(v(4.0, 4.0, 4.0))).unwrap();

    let mut results = Vec::new();
    index.query_point(&v(4.5, 4.5, 4.5), &mut results);
    assert_eq!(results, vec![keys[0]]);

    results.clear();
    index.query_point(&v(6.0, 6.0, 6.0), &mut results);
    assert!(results.is_empty());
}

#[test]
fn test_query_point_on_boundary_hits() {
    let mut index = RTreeIndex::new();
    let keys = make_keys(1);
    index.insert(keys[0], &unit_box(DVec3::ZERO)).unwrap();

    let mut results = Vec::new();
    index.query_point(&v(1.0, 1.0, 1.0), &mut results);
    assert_eq!(results, vec![keys[0]]);
}

#[test]
fn test_grid_insert_splits_and_stays_consistent() {
    let mut index = RTreeIndex::new();
    let keys = make_keys(36);
    let mut k = 0;
    for i in 0..6 {
        for j in 0..6 {
            let at = v(i as f64 * 4.0, j as f64 * 4.0, 0.0);
            index.insert(keys[k], &unit_box(at)).unwrap();
            k += 1;
        }
    }
    assert_eq!(index.len(), 36);
    assert!(index.validate().is_ok());

    // Window over the 2x2 lower corner of the grid
    let mut results = Vec::new();
    index.query_aabb(&Aabb::new(v(-1.0, -1.0, -1.0), v(5.5, 5.5, 2.0)), &mut results);
    let expected = vec![keys[0], keys[1], keys[6], keys[7]];
    assert_eq!(sorted(results), sorted(expected));
}

#[test]
fn test_round_trip_every_entry_found_by_its_own_box() {
    let mut index = RTreeIndex::new();
    let keys = make_keys(25);
    let mut boxes = Vec::new();
    for (i, &key) in keys.iter().enumerate() {
        let at = v((i % 5) as f64 * 3.0, (i / 5) as f64 * 3.0, (i % 3) as f64);
        let aabb = unit_box(at);
        index.insert(key, &aabb).unwrap();
        boxes.push(aabb);
    }

    for (i, &key) in keys.iter().enumerate() {
        let mut results = Vec::new();
        index.query_aabb(&boxes[i], &mut results);
        assert!(results.contains(&key), "entry {} lost", i);
    }
}

// ============================================================================
// REMOVE
// ============================================================================

#[test]
fn test_remove_then_query_misses() {
    let mut index = RTreeIndex::new();
    let keys = make_keys(2);
    index.insert(keys[0], &unit_box(DVec3::ZERO)).unwrap();
    index.insert(keys[1], &unit_box(v(10.0, 0.0, 0.0))).unwrap();

    index.remove(keys[0]).unwrap();
    assert_eq!(index.len(), 1);

    let mut results = Vec::new();
    index.query_point(&v(0.5, 0.5, 0.5), &mut results);
    assert!(results.is_empty());

    results.clear();
    index.query_point(&v(10.5, 0.5, 0.5), &mut results);
    assert_eq!(results, vec![keys[1]]);
}

#[test]
fn test_remove_down_to_empty() {
    let mut index = RTreeIndex::new();
    let keys = make_keys(20);
    for (i, &key) in keys.iter().enumerate() {
        index.insert(key, &unit_box(v(i as f64 * 2.0, 0.0, 0.0))).unwrap();
    }
    for &key in &keys {
        index.remove(key).unwrap();
        assert!(index.validate().is_ok());
    }
    assert!(index.is_empty());
}

#[test]
fn test_underflow_condense_keeps_survivors_queryable() {
    let mut index = RTreeIndex::new();
    let keys = make_keys(30);
    for (i, &key) in keys.iter().enumerate() {
        let at = v((i % 6) as f64 * 5.0, (i / 6) as f64 * 5.0, 0.0);
        index.insert(key, &unit_box(at)).unwrap();
    }

    // Remove every other entry, forcing leaf underflows
    for (i, &key) in keys.iter().enumerate() {
        if i % 2 == 0 {
            index.remove(key).unwrap();
        }
    }
    assert_eq!(index.len(), 15);
    assert!(index.validate().is_ok());

    for (i, &key) in keys.iter().enumerate() {
        let at = v((i % 6) as f64 * 5.0, (i / 6) as f64 * 5.0, 0.0);
        let mut results = Vec::new();
        index.query_point(&(at + DVec3::splat(0.5)), &mut results);
        assert_eq!(results.contains(&key), i % 2 != 0);
    }
}

// ============================================================================
// UPDATE
// ============================================================================

#[test]
fn test_update_small_move() {
    let mut index = RTreeIndex::new();
    let keys = make_keys(10);
    for (i, &key) in keys.iter().enumerate() {
        index.insert(key, &unit_box(v(i as f64 * 3.0, 0.0, 0.0))).unwrap();
    }

    // Nudge an entry inside its neighborhood
    index.update(keys[4], &unit_box(v(12.2, 0.2, 0.0))).unwrap();
    assert!(index.validate().is_ok());

    let mut results = Vec::new();
    index.query_point(&v(12.7, 0.7, 0.5), &mut results);
    assert!(results.contains(&keys[4]));
    assert_eq!(index.len(), 10);
}

#[test]
fn test_update_large_move_relocates_entry() {
    let mut index = RTreeIndex::new();
    let keys = make_keys(12);
    for (i, &key) in keys.iter().enumerate() {
        index.insert(key, &unit_box(v(i as f64 * 2.0, 0.0, 0.0))).unwrap();
    }

    index.update(keys[0], &unit_box(v(100.0, 100.0, 100.0))).unwrap();
    assert!(index.validate().is_ok());
    assert_eq!(index.len(), 12);

    let mut results = Vec::new();
    index.query_point(&v(0.5, 0.5, 0.5), &mut results);
    assert!(!results.contains(&keys[0]));

    results.clear();
    index.query_point(&v(100.5, 100.5, 100.5), &mut results);
    assert_eq!(results, vec![keys[0]]);
}

// ============================================================================
// CLEAR AND CHURN
// ============================================================================

#[test]
fn test_clear() {
    let mut index = RTreeIndex::new();
    let keys = make_keys(10);
    for (i, &key) in keys.iter().enumerate() {
        index.insert(key, &unit_box(v(i as f64, 0.0, 0.0))).unwrap();
    }
    index.clear();
    assert!(index.is_empty());
    assert!(index.validate().is_ok());

    let mut results = Vec::new();
    index.query_aabb(&Aabb::new(v(-100.0, -100.0, -100.0), v(100.0, 100.0, 100.0)), &mut results);
    assert!(results.is_empty());
}

#[test]
fn test_randomized_churn_preserves_invariants() {
    // Deterministic LCG; no external randomness in tests
    let mut state: u64 = 0x2545F4914F6CDD1D;
    let mut next = move || {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        state >> 33
    };

    let mut index = RTreeIndex::new();
    let keys = make_keys(64);
    let mut live: Vec<Option<Aabb>> = vec![None; keys.len()];

    for _ in 0..400 {
        let slot = (next() % keys.len() as u64) as usize;
        match live[slot] {
            None => {
                let at = v(
                    (next() % 100) as f64,
                    (next() % 100) as f64,
                    (next() % 100) as f64,
                );
                let aabb = Aabb::new(at, at + DVec3::splat(1.0 + (next() % 5) as f64));
                index.insert(keys[slot], &aabb).unwrap();
                live[slot] = Some(aabb);
            }
            Some(_) => {
                index.remove(keys[slot]).unwrap();
                live[slot] = None;
            }
        }
    }

    assert!(index.validate().is_ok());
    assert_eq!(index.len(), live.iter().flatten().count());

    // Every surviving entry is still found by its own box
    for (slot, aabb) in live.iter().enumerate() {
        if let Some(aabb) = aabb {
            let mut results = Vec::new();
            index.query_aabb(aabb, &mut results);
            assert!(results.contains(&keys[slot]));
        }
    }
}
