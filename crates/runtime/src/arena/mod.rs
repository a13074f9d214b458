//! Reference implementation of the combat collaborators.
//!
//! [`OpenArena`] is a flat circular floor with optional box obstacles. Agents
//! move in straight lines toward their destination at their own speed, pushed
//! bodies slide under drag until they stop or hit something, and projectiles
//! fly until they reach a body, leave the floor or run out of range. Contacts
//! are collected by [`OpenArena::advance`] and reported back into the world by
//! the simulation worker.
//!
//! Presentation sinks (cues, status icons, health bars) only log.
mod bodies;

pub use bodies::{Collision, Obstacle, PhysicsReport, ProjectileHit};

use std::cell::RefCell;
use std::collections::BTreeMap;

use glam::{Quat, Vec3};
use tracing::{debug, trace};

use bodies::{Body, Projectile};
use combat_core::{
    ActorId, ActorTag, CombatEnv, Cue, CueSink, Navigator, ProjectileLaunch, Region, SceneGraph,
    SpatialQuery, SpawnRequest, StatusIcon, StatusSink, TagMask,
};

/// Geometry and physics tuning for [`OpenArena`].
#[derive(Debug, Clone)]
pub struct ArenaConfig {
    /// Radius of the walkable floor around the origin.
    pub radius: f32,
    pub obstacles: Vec<Obstacle>,
    /// Footprint half extent of every body.
    pub body_radius: f32,
    pub body_height: f32,
    pub projectile_radius: f32,
    pub projectile_range: f32,
    /// Fraction of push velocity lost per second.
    pub drag: f32,
    /// Pushes slower than this come to rest.
    pub rest_speed: f32,
    pub player_start: Vec3,
    pub player_speed: f32,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            radius: 40.0,
            obstacles: Vec::new(),
            body_radius: 0.5,
            body_height: 2.0,
            projectile_radius: 0.25,
            projectile_range: 40.0,
            drag: 4.0,
            rest_speed: 0.5,
            player_start: Vec3::ZERO,
            player_speed: 6.0,
        }
    }
}

pub struct OpenArena {
    config: ArenaConfig,
    bodies: RefCell<BTreeMap<ActorId, Body>>,
    projectiles: RefCell<Vec<Projectile>>,
}

impl OpenArena {
    /// Creates the arena with the player's body already placed.
    pub fn new(config: ArenaConfig) -> Self {
        let mut bodies = BTreeMap::new();
        bodies.insert(
            ActorId::PLAYER,
            Body::new(ActorTag::Player, config.player_start, config.player_speed),
        );
        Self {
            config,
            bodies: RefCell::new(bodies),
            projectiles: RefCell::new(Vec::new()),
        }
    }

    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }

    /// Borrows the arena as the collaborator bundle for one world call.
    pub fn env(&self) -> CombatEnv<'_> {
        CombatEnv::new(self, self, self, self, self)
    }

    pub fn body_count(&self) -> usize {
        self.bodies.borrow().len()
    }

    pub fn projectile_count(&self) -> usize {
        self.projectiles.borrow().len()
    }

    /// The body of `tag` closest to `point` on the floor.
    pub fn nearest(&self, point: Vec3, tag: ActorTag) -> Option<(ActorId, Vec3)> {
        self.bodies
            .borrow()
            .iter()
            .filter(|(_, body)| body.tag == tag)
            .map(|(id, body)| (*id, body.world_position()))
            .min_by(|(_, a), (_, b)| {
                flat_distance(*a, point).total_cmp(&flat_distance(*b, point))
            })
    }

    /// Moves every body and projectile forward by `dt` seconds.
    pub fn advance(&mut self, dt: f32) -> PhysicsReport {
        let config = &self.config;
        let bodies = self.bodies.get_mut();
        let mut report = PhysicsReport::default();

        let ids: Vec<ActorId> = bodies.keys().copied().collect();
        for id in ids {
            let Some((pushed, walking)) = bodies
                .get(&id)
                .map(|body| (body.is_pushed(), body.destination.is_some()))
            else {
                continue;
            };
            if pushed {
                if let Some(collision) = slide(config, bodies, id, dt) {
                    report.collisions.push(collision);
                }
            } else if walking {
                walk(config, bodies, id, dt);
            }
        }

        let projectiles = self.projectiles.get_mut();
        projectiles.retain_mut(|projectile| {
            let step = projectile.direction * projectile.speed * dt;
            projectile.position += step;
            projectile.travelled += step.length();

            let struck = bodies.iter().find(|(id, body)| {
                **id != projectile.owner
                    && body.collision
                    && projectile.affects.matches(body.tag)
                    && flat_distance(body.position, projectile.position)
                        <= config.body_radius + config.projectile_radius
                    && (body.world_position().y - projectile.position.y).abs() <= config.body_height
            });
            if let Some((target, _)) = struck {
                report.projectile_hits.push(ProjectileHit {
                    owner: projectile.owner,
                    target: *target,
                    damage: projectile.damage,
                });
                return false;
            }
            !blocked(config, projectile.position, 0.0) && projectile.travelled < config.projectile_range
        });

        if !report.is_empty() {
            trace!(
                hits = report.projectile_hits.len(),
                collisions = report.collisions.len(),
                "physics contacts"
            );
        }
        report
    }
}

fn flat(v: Vec3) -> Vec3 {
    Vec3::new(v.x, 0.0, v.z)
}

fn flat_distance(a: Vec3, b: Vec3) -> f32 {
    flat(a - b).length()
}

const EPSILON: f32 = 1e-4;

/// Outside the floor or inside an obstacle.
fn blocked(config: &ArenaConfig, point: Vec3, half_extent: f32) -> bool {
    flat(point).length() + half_extent > config.radius + EPSILON
        || config
            .obstacles
            .iter()
            .any(|obstacle| obstacle.overlaps(point, half_extent))
}

fn slide(
    config: &ArenaConfig,
    bodies: &mut BTreeMap<ActorId, Body>,
    id: ActorId,
    dt: f32,
) -> Option<Collision> {
    let body = bodies.get(&id)?;
    let from = body.position;
    let next = from + flat(body.push) * dt;

    let contact = if body.collision {
        bodies
            .iter()
            .filter(|(other, other_body)| **other != id && other_body.collision)
            .find(|(_, other_body)| {
                let before = flat_distance(from, other_body.position);
                let after = flat_distance(next, other_body.position);
                after < config.body_radius * 2.0 && after < before
            })
            .map(|(other, _)| *other)
    } else {
        None
    };
    let walled = blocked(config, next, config.body_radius);

    let body = bodies.get_mut(&id)?;
    if walled || contact.is_some() {
        body.push = Vec3::ZERO;
        return Some(Collision { actor: id, other: contact });
    }

    body.position = next;
    body.push *= (1.0 - config.drag * dt).max(0.0);
    if body.push.length() < config.rest_speed {
        body.push = Vec3::ZERO;
    }
    None
}

fn walk(config: &ArenaConfig, bodies: &mut BTreeMap<ActorId, Body>, id: ActorId, dt: f32) {
    let Some(body) = bodies.get_mut(&id) else {
        return;
    };
    let Some(destination) = body.destination else {
        return;
    };
    let offset = flat(destination - body.position);
    let distance = offset.length();
    let step = body.speed * dt;

    if distance <= step {
        body.position = flat(destination);
        body.destination = None;
        body.velocity = Vec3::ZERO;
        return;
    }

    let direction = offset / distance;
    let next = body.position + direction * step;
    if blocked(config, next, config.body_radius) {
        body.destination = None;
        body.velocity = Vec3::ZERO;
    } else {
        body.position = next;
        body.velocity = direction * body.speed;
    }
}

impl SpatialQuery for OpenArena {
    fn overlap(&self, region: &Region, mask: TagMask) -> Vec<ActorId> {
        self.bodies
            .borrow()
            .iter()
            .filter(|(_, body)| {
                body.collision && mask.matches(body.tag) && region.contains(body.world_position())
            })
            .map(|(id, _)| *id)
            .collect()
    }

    fn is_obstructed(&self, point: Vec3, half_extent: f32) -> bool {
        blocked(&self.config, point, half_extent)
    }
}

impl Navigator for OpenArena {
    fn set_destination(&self, actor: ActorId, point: Vec3) {
        if let Some(body) = self.bodies.borrow_mut().get_mut(&actor) {
            body.destination = Some(flat(point));
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
            body.position = flat(point);
            body.destination = None;
            body.velocity = Vec3::ZERO;
        }
    }

    fn remaining_distance(&self, actor: ActorId) -> f32 {
        self.bodies
            .borrow()
            .get(&actor)
            .and_then(|body| {
                body.destination
                    .map(|destination| flat_distance(destination, body.position))
            })
            .unwrap_or(0.0)
    }

    fn velocity(&self, actor: ActorId) -> Vec3 {
        self.bodies
            .borrow()
            .get(&actor)
            .map_or(Vec3::ZERO, |body| body.velocity)
    }

    fn speed(&self, actor: ActorId) -> f32 {
        self.bodies
            .borrow()
            .get(&actor)
            .map_or(0.0, |body| body.speed)
    }

    fn sample_position(&self, point: Vec3, max_distance: f32) -> Option<Vec3> {
        let point = flat(point);
        let limit = (self.config.radius - self.config.body_radius).max(0.0);
        let candidate = if point.length() > limit {
            point.normalize_or_zero() * limit
        } else {
            point
        };
        if candidate.distance(point) > max_distance
            || blocked(&self.config, candidate, self.config.body_radius)
        {
            return None;
        }
        Some(candidate)
    }
}

impl SceneGraph for OpenArena {
    fn position(&self, actor: ActorId) -> Option<Vec3> {
        self.bodies.borrow().get(&actor).map(Body::world_position)
    }

    fn rotation(&self, actor: ActorId) -> Quat {
        self.bodies
            .borrow()
            .get(&actor)
            .map_or(Quat::IDENTITY, |body| body.rotation)
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
        if let Some(body) = self.bodies.borrow_mut().get_mut(&actor) {
            body.push += flat(impulse);
            body.destination = None;
            body.velocity = Vec3::ZERO;
        }
    }

    fn halt(&self, actor: ActorId) {
        if let Some(body) = self.bodies.borrow_mut().get_mut(&actor) {
            body.push = Vec3::ZERO;
        }
    }

    fn instantiate(&self, request: &SpawnRequest) {
        debug!(
            actor = %request.id,
            archetype = %request.archetype,
            x = request.position.x,
            z = request.position.z,
            "body placed"
        );
        self.bodies.borrow_mut().insert(
            request.id,
            Body::new(request.tag, request.position, request.move_speed),
        );
    }

    fn despawn(&self, actor: ActorId) {
        self.bodies.borrow_mut().remove(&actor);
    }

    fn launch_projectile(&self, launch: &ProjectileLaunch) {
        let Some(direction) = launch.direction.try_normalize() else {
            return;
        };
        self.projectiles.borrow_mut().push(Projectile {
            owner: launch.owner,
            position: launch.origin,
            direction,
            speed: launch.speed,
            damage: launch.damage,
            affects: launch.affects,
            travelled: 0.0,
        });
    }
}

impl CueSink for OpenArena {
    fn cue(&self, actor: ActorId, cue: Cue) {
        match &cue {
            Cue::Attack { name } => debug!(%actor, attack = %name, "cue"),
            other => debug!(%actor, cue = other.name(), "cue"),
        }
    }
}

impl StatusSink for OpenArena {
    fn set_status_icon(&self, actor: ActorId, icon: StatusIcon, active: bool) {
        let icon: &'static str = icon.into();
        trace!(%actor, icon, active, "status icon");
    }

    fn set_health_bar(&self, actor: ActorId, current: f32, max: f32) {
        trace!(%actor, current, max, "health bar");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 0.1;

    fn spawn(arena: &OpenArena, id: u32, tag: ActorTag, position: Vec3) -> ActorId {
        let id = ActorId(id);
        arena.instantiate(&SpawnRequest {
            id,
            tag,
            archetype: "dummy".into(),
            position,
            move_speed: 2.0,
        });
        id
    }

    #[test]
    fn agents_walk_straight_to_their_destination() {
        let mut arena = OpenArena::new(ArenaConfig::default());
        let enemy = spawn(&arena, 1, ActorTag::Enemy, Vec3::new(0.0, 0.0, 5.0));
        arena.set_destination(enemy, Vec3::new(0.0, 0.0, 8.0));

        arena.advance(DT);
        assert!(arena.velocity(enemy).abs_diff_eq(Vec3::new(0.0, 0.0, 2.0), 1e-5));
        assert!((arena.remaining_distance(enemy) - 2.8).abs() < 1e-4);

        for _ in 0..20 {
            arena.advance(DT);
        }
        assert_eq!(arena.position(enemy), Some(Vec3::new(0.0, 0.0, 8.0)));
        assert_eq!(arena.remaining_distance(enemy), 0.0);
        assert_eq!(arena.velocity(enemy), Vec3::ZERO);
    }

    #[test]
    fn obstacles_and_the_rim_block_sampling() {
        let config = ArenaConfig {
            radius: 10.0,
            obstacles: vec![Obstacle::new(Vec3::new(5.0, 0.0, 0.0), Vec3::splat(1.0))],
            ..ArenaConfig::default()
        };
        let arena = OpenArena::new(config);

        assert!(arena.is_obstructed(Vec3::new(5.5, 0.0, 0.0), 0.1));
        assert!(arena.is_obstructed(Vec3::new(0.0, 0.0, 9.9), 0.5));
        assert!(!arena.is_obstructed(Vec3::new(-5.0, 0.0, 0.0), 0.5));

        assert_eq!(arena.sample_position(Vec3::new(5.0, 0.0, 0.0), 3.0), None);
        let clamped = arena.sample_position(Vec3::new(0.0, 0.0, 10.5), 2.0);
        assert!(clamped.is_some_and(|p| p.abs_diff_eq(Vec3::new(0.0, 0.0, 9.5), 1e-4)));
        assert_eq!(arena.sample_position(Vec3::new(0.0, 0.0, 20.0), 2.0), None);
    }

    #[test]
    fn overlap_skips_bodies_without_collision() {
        let arena = OpenArena::new(ArenaConfig::default());
        let near = spawn(&arena, 1, ActorTag::Enemy, Vec3::new(1.0, 0.0, 0.0));
        let ghost = spawn(&arena, 2, ActorTag::Enemy, Vec3::new(0.0, 0.0, 1.0));
        spawn(&arena, 3, ActorTag::Enemy, Vec3::new(9.0, 0.0, 0.0));
        arena.set_collision_enabled(ghost, false);

        let region = Region::sphere(Vec3::ZERO, 2.0);
        assert_eq!(arena.overlap(&region, TagMask::ENEMY), vec![near]);
        assert_eq!(
            arena.overlap(&region, TagMask::ALL),
            vec![ActorId::PLAYER, near]
        );
    }

    #[test]
    fn projectile_hits_the_first_matching_body() {
        let mut arena = OpenArena::new(ArenaConfig::default());
        let imp = spawn(&arena, 1, ActorTag::Enemy, Vec3::new(0.0, 0.0, 6.0));
        arena.launch_projectile(&ProjectileLaunch {
            owner: imp,
            origin: Vec3::new(0.0, 1.0, 6.0),
            direction: Vec3::new(0.0, 0.0, -1.0),
            speed: 10.0,
            damage: 8.0,
            affects: TagMask::PLAYER,
        });

        let mut hits = Vec::new();
        for _ in 0..10 {
            hits.extend(arena.advance(DT).projectile_hits);
        }
        assert_eq!(
            hits,
            vec![ProjectileHit {
                owner: imp,
                target: ActorId::PLAYER,
                damage: 8.0,
            }]
        );
        assert_eq!(arena.projectile_count(), 0);
    }

    #[test]
    fn pushed_body_reports_walls_and_bodies() {
        let config = ArenaConfig {
            radius: 10.0,
            ..ArenaConfig::default()
        };
        let mut arena = OpenArena::new(config);
        let struck = spawn(&arena, 1, ActorTag::Enemy, Vec3::new(0.0, 0.0, 3.0));
        let bystander = spawn(&arena, 2, ActorTag::Enemy, Vec3::new(0.0, 0.0, 5.0));

        arena.apply_impulse(struck, Vec3::new(0.0, 0.0, 20.0));
        let report = arena.advance(DT);
        assert_eq!(
            report.collisions,
            vec![Collision {
                actor: struck,
                other: Some(bystander),
            }]
        );

        arena.apply_impulse(bystander, Vec3::new(0.0, 0.0, 50.0));
        let mut collisions = Vec::new();
        for _ in 0..10 {
            collisions.extend(arena.advance(DT).collisions);
        }
        assert_eq!(
            collisions,
            vec![Collision {
                actor: bystander,
                other: None,
            }]
        );
        let resting = arena.position(bystander).unwrap_or(Vec3::NAN);
        assert!(resting.z <= 9.5);
    }

    #[test]
    fn drag_brings_pushes_to_rest() {
        let mut arena = OpenArena::new(ArenaConfig::default());
        let enemy = spawn(&arena, 1, ActorTag::Enemy, Vec3::new(-5.0, 0.0, 0.0));
        arena.apply_impulse(enemy, Vec3::new(-4.0, 0.0, 0.0));
        for _ in 0..20 {
            assert!(arena.advance(DT).collisions.is_empty());
        }
        let rested = arena.position(enemy).unwrap_or(Vec3::NAN);
        let after = {
            arena.advance(DT);
            arena.position(enemy).unwrap_or(Vec3::NAN)
        };
        assert!(rested.x < -5.0);
        assert_eq!(rested, after);
    }
}
