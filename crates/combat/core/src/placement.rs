//! Bounded sampling of navigable, unobstructed points.
//!
//! Spawning, retreating, teleporting and airborne repositioning all pick a
//! destination the same way: generate a candidate, snap it to the navigation
//! surface, check caller-specific constraints, then make sure nothing blocks
//! it. The first candidate that passes wins.
use glam::Vec3;

use crate::env::{CombatEnv, SimRng};
use crate::error::PlacementError;

/// Limits shared by every sampling site.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlacementLimits {
    pub attempts: u32,
    /// Maximum snap distance onto the navigation surface.
    pub nav_sample_distance: f32,
    /// Half extent of the box that must be free of blocking geometry.
    pub clearance: f32,
}

/// Samples up to `limits.attempts` candidates.
///
/// `candidate` draws a raw point; `accept` filters the snapped point before
/// the obstruction check.
pub fn sample_point(
    env: &CombatEnv<'_>,
    rng: &mut SimRng,
    limits: PlacementLimits,
    mut candidate: impl FnMut(&mut SimRng) -> Vec3,
    mut accept: impl FnMut(Vec3) -> bool,
) -> Result<Vec3, PlacementError> {
    for _ in 0..limits.attempts {
        let raw = candidate(rng);
        let Some(point) = env
            .navigator()
            .sample_position(raw, limits.nav_sample_distance)
        else {
            continue;
        };
        if !accept(point) {
            continue;
        }
        if env.spatial().is_obstructed(point, limits.clearance) {
            continue;
        }
        return Ok(point);
    }
    Err(PlacementError::NoValidPoint {
        attempts: limits.attempts,
    })
}

/// Distance on the horizontal plane, ignoring elevation.
pub fn flat_distance(a: Vec3, b: Vec3) -> f32 {
    Vec3::new(a.x - b.x, 0.0, a.z - b.z).length()
}

/// Unit vector from `from` towards `to` on the horizontal plane.
pub fn flat_direction(from: Vec3, to: Vec3) -> Option<Vec3> {
    Vec3::new(to.x - from.x, 0.0, to.z - from.z).try_normalize()
}
