//! Chase destinations and facing.
use glam::{Quat, Vec3};

use super::archetype::Pursuit;
use super::machine::Target;
use crate::actor::ActorId;
use crate::env::CombatEnv;

/// Yaw-only rotation looking from `from` toward `to`.
pub fn yaw_towards(from: Vec3, to: Vec3) -> Option<Quat> {
    let dir = Vec3::new(to.x - from.x, 0.0, to.z - from.z);
    if dir.length_squared() < 1e-6 {
        return None;
    }
    Some(Quat::from_rotation_y(dir.x.atan2(dir.z)))
}

/// Turns `actor` toward `point` at `rate` per second.
pub fn face_towards(env: &CombatEnv<'_>, actor: ActorId, point: Vec3, rate: f32, dt: f32) {
    let scene = env.scene();
    let Some(position) = scene.position(actor) else {
        return;
    };
    let Some(desired) = yaw_towards(position, point) else {
        return;
    };
    let t = (rate * dt).clamp(0.0, 1.0);
    scene.set_rotation(actor, scene.rotation(actor).slerp(desired, t));
}

/// Snaps `actor` to face `point`.
pub fn look_at(env: &CombatEnv<'_>, actor: ActorId, point: Vec3) {
    let scene = env.scene();
    if let Some(desired) = scene
        .position(actor)
        .and_then(|position| yaw_towards(position, point))
    {
        scene.set_rotation(actor, desired);
    }
}

/// Chase destination for an actor at `from` moving at `speed`.
pub fn destination(pursuit: Pursuit, intercepting: bool, from: Vec3, speed: f32, target: &Target) -> Vec3 {
    let Pursuit::Intercept {
        prediction_secs,
        alignment,
        ..
    } = pursuit
    else {
        return target.position;
    };
    if !intercepting {
        return target.position;
    }

    let time_to_target = (from.distance(target.position) / speed.max(0.1)).min(prediction_secs);
    let predicted = target.position + target.velocity * time_to_target;

    let to_target = (target.position - from).normalize_or_zero();
    let to_predicted = (predicted - from).normalize_or_zero();
    if to_target.dot(to_predicted) < alignment {
        target.position
    } else {
        predicted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(position: Vec3, velocity: Vec3) -> Target {
        Target {
            id: ActorId::PLAYER,
            position,
            velocity,
        }
    }

    const INTERCEPT: Pursuit = Pursuit::Intercept {
        chance: 1.0,
        prediction_secs: 1.0,
        alignment: 0.0,
    };

    #[test]
    fn yaw_points_local_forward_at_target() {
        let rotation = yaw_towards(Vec3::ZERO, Vec3::new(5.0, 3.0, 0.0)).unwrap();
        let forward = rotation * Vec3::Z;
        assert!((forward - Vec3::X).length() < 1e-5);
        assert!(yaw_towards(Vec3::ONE, Vec3::ONE).is_none());
    }

    #[test]
    fn direct_pursuit_heads_for_target() {
        let t = target(Vec3::new(10.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 3.0));
        assert_eq!(destination(Pursuit::Direct, true, Vec3::ZERO, 5.0, &t), t.position);
        assert_eq!(destination(INTERCEPT, false, Vec3::ZERO, 5.0, &t), t.position);
    }

    #[test]
    fn interception_leads_target_up_to_prediction_window() {
        // 10 units away at speed 5: two seconds out, clamped to one.
        let t = target(Vec3::new(10.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 3.0));
        let dest = destination(INTERCEPT, true, Vec3::ZERO, 5.0, &t);
        assert!((dest - Vec3::new(10.0, 0.0, 3.0)).length() < 1e-5);
    }

    #[test]
    fn interception_drops_prediction_pointing_away() {
        // Target runs straight past us; prediction lands behind the chaser.
        let t = target(Vec3::new(1.0, 0.0, 0.0), Vec3::new(-10.0, 0.0, 0.0));
        let dest = destination(INTERCEPT, true, Vec3::ZERO, 5.0, &t);
        assert_eq!(dest, t.position);
    }
}
