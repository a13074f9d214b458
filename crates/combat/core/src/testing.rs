//! In-memory collaborators for unit tests.
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

use glam::{Quat, Vec3};

use crate::actor::{ActorId, ActorTag, TagMask};
use crate::env::{
    CombatEnv, Cue, CueSink, Navigator, ProjectileLaunch, Region, SceneGraph, SpatialQuery,
    SpawnRequest, StatusIcon, StatusSink,
};

#[derive(Clone, Debug)]
pub struct Body {
    pub tag: ActorTag,
    pub position: Vec3,
    pub rotation: Quat,
    pub destination: Option<Vec3>,
    pub speed: f32,
    pub velocity: Vec3,
    pub elevation: f32,
    pub collision: bool,
}

/// Flat, open plane. Every point is navigable unless `navigable` is cleared;
/// obstruction is either global or a list of blocked points.
#[derive(Default)]
pub struct ScriptedEnv {
    pub bodies: RefCell<BTreeMap<ActorId, Body>>,
    pub blocked_everywhere: Cell<bool>,
    pub blocked_points: RefCell<Vec<Vec3>>,
    pub not_navigable: Cell<bool>,
    pub cues: RefCell<Vec<(ActorId, &'static str)>>,
    pub icons: RefCell<Vec<(ActorId, StatusIcon, bool)>>,
    pub projectiles: RefCell<Vec<ProjectileLaunch>>,
    pub impulses: RefCell<Vec<(ActorId, Vec3)>>,
    pub halted: RefCell<Vec<ActorId>>,
    pub despawned: RefCell<Vec<ActorId>>,
    pub obstruction_checks: Cell<u32>,
}

impl ScriptedEnv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn env(&self) -> CombatEnv<'_> {
        CombatEnv::new(self, self, self, self, self)
    }

    pub fn place(&self, id: ActorId, tag: ActorTag, position: Vec3) {
        self.bodies.borrow_mut().insert(
            id,
            Body {
                tag,
                position,
                rotation: Quat::IDENTITY,
                destination: None,
                speed: 4.0,
                velocity: Vec3::ZERO,
                elevation: 0.0,
                collision: true,
            },
        );
    }

    pub fn position_of(&self, id: ActorId) -> Vec3 {
        self.bodies
            .borrow()
            .get(&id)
            .map(|body| body.position)
            .unwrap_or(Vec3::NAN)
    }

    pub fn body(&self, id: ActorId) -> Option<Body> {
        self.bodies.borrow().get(&id).cloned()
    }

    pub fn move_to(&self, id: ActorId, position: Vec3) {
        if let Some(body) = self.bodies.borrow_mut().get_mut(&id) {
            body.position = position;
        }
    }

    pub fn cue_count(&self, id: ActorId, name: &str) -> usize {
        self.cues
            .borrow()
            .iter()
            .filter(|(actor, cue)| *actor == id && *cue == name)
            .count()
    }
}

impl SpatialQuery for ScriptedEnv {
    fn overlap(&self, region: &Region, mask: TagMask) -> Vec<ActorId> {
        self.bodies
            .borrow()
            .iter()
            .filter(|(_, body)| mask.matches(body.tag) && region.contains(body.position))
            .map(|(id, _)| *id)
            .collect()
    }

    fn is_obstructed(&self, point: Vec3, half_extent: f32) -> bool {
        self.obstruction_checks.set(self.obstruction_checks.get() + 1);
        self.blocked_everywhere.get()
            || self.blocked_points.borrow().iter().any(|blocked| {
                (blocked.x - point.x).abs() <= half_extent && (blocked.z - point.z).abs() <= half_extent
            })
    }
}

impl Navigator for ScriptedEnv {
    fn set_destination(&self, actor: ActorId, point: Vec3) {
        if let Some(body) = self.bodies.borrow_mut().get_mut(&actor) {
            body.destination = Some(point);
        }
    }

    fn stop(&self, actor: ActorId) {
        if let Some(body) = self.bodies.borrow_mut().get_mut(&actor) {
            body.destination = None;
            body.velocity = Vec3::ZERO;
        }
    }

    fn warp(&self, actor: ActorId, point: Vec3) {
        if let Some(body) = self.bodies.borrow_mut().get_mut(&actor) {
            body.position = point;
            body.destination = None;
        }
    }

    fn remaining_distance(&self, actor: ActorId) -> f32 {
        self.bodies
            .borrow()
            .get(&actor)
            .and_then(|body| body.destination.map(|dest| dest.distance(body.position)))
            .unwrap_or(0.0)
    }

    fn velocity(&self, actor: ActorId) -> Vec3 {
        self.bodies
            .borrow()
            .get(&actor)
            .map(|body| body.velocity)
            .unwrap_or(Vec3::ZERO)
    }

    fn speed(&self, actor: ActorId) -> f32 {
        self.bodies
            .borrow()
            .get(&actor)
            .map(|body| body.speed)
            .unwrap_or(0.0)
    }

    fn sample_position(&self, point: Vec3, _max_distance: f32) -> Option<Vec3> {
        (!self.not_navigable.get()).then(|| Vec3::new(point.x, 0.0, point.z))
    }
}

impl SceneGraph for ScriptedEnv {
    fn position(&self, actor: ActorId) -> Option<Vec3> {
        self.bodies.borrow().get(&actor).map(|body| body.position)
    }

    fn rotation(&self, actor: ActorId) -> Quat {
        self.bodies
            .borrow()
            .get(&actor)
            .map(|body| body.rotation)
            .unwrap_or(Quat::IDENTITY)
    }

    fn set_rotation(&self, actor: ActorId, rotation: Quat) {
        if let Some(body) = self.bodies.borrow_mut().get_mut(&actor) {
            body.rotation = rotation;
        }
    }

    fn set_elevation(&self, actor: ActorId, height: f32) {
        if let Some(body) = self.bodies.borrow_mut().get_mut(&actor) {
            body.elevation = height;
        }
    }

    fn set_collision_enabled(&self, actor: ActorId, enabled: bool) {
        if let Some(body) = self.bodies.borrow_mut().get_mut(&actor) {
            body.collision = enabled;
        }
    }

    fn apply_impulse(&self, actor: ActorId, impulse: Vec3) {
        self.impulses.borrow_mut().push((actor, impulse));
    }

    fn halt(&self, actor: ActorId) {
        self.halted.borrow_mut().push(actor);
    }

    fn instantiate(&self, request: &SpawnRequest) {
        self.place(request.id, request.tag, request.position);
        if let Some(body) = self.bodies.borrow_mut().get_mut(&request.id) {
            body.speed = request.move_speed;
        }
    }

    fn despawn(&self, actor: ActorId) {
        self.bodies.borrow_mut().remove(&actor);
        self.despawned.borrow_mut().push(actor);
    }

    fn launch_projectile(&self, launch: &ProjectileLaunch) {
        self.projectiles.borrow_mut().push(launch.clone());
    }
}

impl CueSink for ScriptedEnv {
    fn cue(&self, actor: ActorId, cue: Cue) {
        self.cues.borrow_mut().push((actor, cue.name()));
    }
}

impl StatusSink for ScriptedEnv {
    fn set_status_icon(&self, actor: ActorId, icon: StatusIcon, active: bool) {
        self.icons.borrow_mut().push((actor, icon, active));
    }

    fn set_health_bar(&self, _actor: ActorId, _current: f32, _max: f32) {}
}
