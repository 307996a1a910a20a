//! Minimal world loop driving the region engine.
//!
//! Builds a few trigger zones, walks a player hitbox through them for a
//! handful of ticks, and logs every enter/exit the sweep reports. This
//! is the external-scheduler role: the engine itself never ticks.

use glam::DVec3;
use region_3d_engine::region3d::{
    QueryEngine, RegionId, RegionRegistry, TransitionKind, TransitionMask,
};
use region_3d_engine::region_info;

fn v(x: f64, y: f64, z: f64) -> DVec3 {
    DVec3::new(x, y, z)
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

/// Player hitbox corners at a given foot position.
fn hitbox(feet: DVec3) -> Vec<DVec3> {
    let mut pts = Vec::new();
    for x in [-0.4, 0.4] {
        for y in [0.0, 1.8] {
            for z in [-0.4, 0.4] {
                pts.push(feet + v(x, y, z));
            }
        }
    }
    pts
}

fn main() {
    let mut registry = RegionRegistry::new();

    // A spawn-protection zone, a lava trap, and a moving platform zone
    registry
        .create(RegionId(1), &cube(v(-5.0, 0.0, -5.0), 10.0))
        .expect("spawn zone");
    registry
        .create(
            RegionId(2),
            &[
                v(20.0, 0.0, -3.0),
                v(26.0, 0.0, -3.0),
                v(26.0, 0.0, 3.0),
                v(20.0, 0.0, 3.0),
                v(23.0, 4.0, 0.0),
            ],
        )
        .expect("trap pyramid");
    registry
        .create(RegionId(3), &cube(v(40.0, 0.0, -2.0), 4.0))
        .expect("platform zone");

    region_info!(
        "region3d_demo",
        "world ready: {} regions, {} hull faces",
        registry.len(),
        registry.total_face_count()
    );

    // Walk the player east while the platform drifts west
    let mut previous = hitbox(v(0.0, 0.0, 0.0));
    for tick in 1..=50 {
        let platform_origin = v(40.0 - tick as f64 * 0.5, 0.0, -2.0);
        registry
            .replace(RegionId(3), &cube(platform_origin, 4.0))
            .expect("platform move");

        let current = hitbox(v(tick as f64, 0.0, 0.0));
        for transition in registry.sweep_transitions(&previous, &current, TransitionMask::all()) {
            match transition.kind {
                TransitionKind::Entered => {
                    region_info!(
                        "region3d_demo",
                        "tick {}: entered region {}",
                        tick,
                        transition.id.0
                    );
                }
                TransitionKind::Exited => {
                    region_info!(
                        "region3d_demo",
                        "tick {}: exited region {}",
                        tick,
                        transition.id.0
                    );
                }
                TransitionKind::Tick => {}
            }
        }
        previous = current;
    }

    let mut occupied = registry.regions_containing(&v(23.0, 1.0, 0.0));
    QueryEngine::sort_ids(&mut occupied);
    region_info!(
        "region3d_demo",
        "regions over the trap center: {:?}",
        occupied.iter().map(|id| id.0).collect::<Vec<_>>()
    );
}
