//! Kinematic bodies, projectiles and static geometry of the open arena.
use glam::{Quat, Vec3};

use combat_core::{ActorId, ActorTag, TagMask};

/// Axis-aligned blocking box. Only the XZ footprint matters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Obstacle {
    pub center: Vec3,
    pub half_extents: Vec3,
}

impl Obstacle {
    pub fn new(center: Vec3, half_extents: Vec3) -> Self {
        Self {
            center,
            half_extents,
        }
    }

    /// Whether a square footprint of `half_extent` at `point` touches the box.
    pub fn overlaps(&self, point: Vec3, half_extent: f32) -> bool {
        (point.x - self.center.x).abs() <= self.half_extents.x + half_extent
            && (point.z - self.center.z).abs() <= self.half_extents.z + half_extent
    }
}

#[derive(Clone, Debug)]
pub(crate) struct Body {
    pub tag: ActorTag,
    /// Ground position; `elevation` is added on read.
    pub position: Vec3,
    pub rotation: Quat,
    pub destination: Option<Vec3>,
    pub speed: f32,
    /// Navigation velocity.
    pub velocity: Vec3,
    /// Physical velocity from impulses, decays under drag.
    pub push: Vec3,
    pub elevation: f32,
    pub collision: bool,
}

impl Body {
    pub fn new(tag: ActorTag, position: Vec3, speed: f32) -> Self {
        Self {
            tag,
            position: Vec3::new(position.x, 0.0, position.z),
            rotation: Quat::IDENTITY,
            destination: None,
            speed,
            velocity: Vec3::ZERO,
            push: Vec3::ZERO,
            elevation: 0.0,
            collision: true,
        }
    }

    pub fn world_position(&self) -> Vec3 {
        self.position + Vec3::Y * self.elevation
    }

    pub fn is_pushed(&self) -> bool {
        self.push != Vec3::ZERO
    }
}

#[derive(Clone, Debug)]
pub(crate) struct Projectile {
    pub owner: ActorId,
    pub position: Vec3,
    pub direction: Vec3,
    pub speed: f32,
    pub damage: f32,
    pub affects: TagMask,
    pub travelled: f32,
}

/// A projectile that reached a body this step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProjectileHit {
    pub owner: ActorId,
    pub target: ActorId,
    pub damage: f32,
}

/// A pushed body ran into geometry (`other == None`) or another body.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Collision {
    pub actor: ActorId,
    pub other: Option<ActorId>,
}

/// Contacts produced by one physics step, to be reported into the world.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PhysicsReport {
    pub projectile_hits: Vec<ProjectileHit>,
    pub collisions: Vec<Collision>,
}

impl PhysicsReport {
    pub fn is_empty(&self) -> bool {
        self.projectile_hits.is_empty() && self.collisions.is_empty()
    }
}
