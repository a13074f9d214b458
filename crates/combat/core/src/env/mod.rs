//! Narrow interfaces to the collaborators the simulation drives but does not own.
//!
//! Spatial queries, navigation, transforms and physics bodies, presentation
//! cues and the status UI are implemented by the host. The [`CombatEnv`]
//! aggregate bundles them so the world can hand a single borrowed context to
//! every subsystem on each tick.
mod rng;

pub use rng::{SimRng, compute_seed};

use glam::{Quat, Vec3};

use crate::actor::{ActorId, ActorTag, TagMask};

/// Hit-volume or query shape.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum HitShape {
    Box { half_extents: Vec3 },
    Sphere { radius: f32 },
}

/// A placed query volume.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Region {
    pub shape: HitShape,
    pub center: Vec3,
    pub rotation: Quat,
}

impl Region {
    pub fn sphere(center: Vec3, radius: f32) -> Self {
        Self {
            shape: HitShape::Sphere { radius },
            center,
            rotation: Quat::IDENTITY,
        }
    }

    /// Whether `point` lies inside the region.
    pub fn contains(&self, point: Vec3) -> bool {
        let local = self.rotation.inverse() * (point - self.center);
        match self.shape {
            HitShape::Sphere { radius } => local.length_squared() <= radius * radius,
            HitShape::Box { half_extents } => {
                local.x.abs() <= half_extents.x
                    && local.y.abs() <= half_extents.y
                    && local.z.abs() <= half_extents.z
            }
        }
    }
}

/// Overlap and obstruction queries against the physics scene.
pub trait SpatialQuery {
    /// Actors whose colliders intersect `region` and whose tag is in `mask`.
    fn overlap(&self, region: &Region, mask: TagMask) -> Vec<ActorId>;

    /// Whether blocking geometry intersects a box of `half_extent` at `point`.
    fn is_obstructed(&self, point: Vec3, half_extent: f32) -> bool;
}

/// Pathfinding agent control. Paths are computed by the host.
pub trait Navigator {
    fn set_destination(&self, actor: ActorId, point: Vec3);
    fn stop(&self, actor: ActorId);
    /// Moves the agent instantly, without pathing.
    fn warp(&self, actor: ActorId, point: Vec3);
    /// Distance left on the current path, 0 when idle.
    fn remaining_distance(&self, actor: ActorId) -> f32;
    fn velocity(&self, actor: ActorId) -> Vec3;
    fn speed(&self, actor: ActorId) -> f32;
    /// Nearest navigable point within `max_distance` of `point`.
    fn sample_position(&self, point: Vec3, max_distance: f32) -> Option<Vec3>;
}

/// Request to create an actor's body in the scene.
#[derive(Clone, Debug, PartialEq)]
pub struct SpawnRequest {
    pub id: ActorId,
    pub tag: ActorTag,
    pub archetype: String,
    pub position: Vec3,
    pub move_speed: f32,
}

/// A projectile handed to physics; impacts come back through the world.
#[derive(Clone, Debug, PartialEq)]
pub struct ProjectileLaunch {
    pub owner: ActorId,
    pub origin: Vec3,
    pub direction: Vec3,
    pub speed: f32,
    pub damage: f32,
    pub affects: TagMask,
}

/// Transforms, physics bodies and object lifecycle.
pub trait SceneGraph {
    fn position(&self, actor: ActorId) -> Option<Vec3>;
    fn rotation(&self, actor: ActorId) -> Quat;
    fn set_rotation(&self, actor: ActorId, rotation: Quat);
    /// Height of the body above the navigation surface.
    fn set_elevation(&self, actor: ActorId, height: f32);
    fn set_collision_enabled(&self, actor: ActorId, enabled: bool);
    fn apply_impulse(&self, actor: ActorId, impulse: Vec3);
    /// Zeroes the body's physical velocity.
    fn halt(&self, actor: ActorId);
    fn instantiate(&self, request: &SpawnRequest);
    fn despawn(&self, actor: ActorId);
    fn launch_projectile(&self, launch: &ProjectileLaunch);
}

/// Fire-and-forget animation and audio triggers.
#[derive(Clone, Debug, PartialEq, strum::IntoStaticStr)]
pub enum Cue {
    Attack { name: String },
    Stagger,
    Death,
    Explosion,
    Teleport,
    Ascend,
    Descend,
    Projectile,
}

impl Cue {
    pub fn name(&self) -> &'static str {
        self.into()
    }
}

pub trait CueSink {
    fn cue(&self, actor: ActorId, cue: Cue);
}

/// Status icon slots shown above an actor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::IntoStaticStr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StatusIcon {
    Bleed,
    Curse,
    Knockback,
    Mark,
}

impl StatusIcon {
    pub const fn slot(self) -> usize {
        match self {
            Self::Bleed => 0,
            Self::Curse => 1,
            Self::Knockback => 2,
            Self::Mark => 3,
        }
    }
}

/// One-way status UI notifications.
pub trait StatusSink {
    fn set_status_icon(&self, actor: ActorId, icon: StatusIcon, active: bool);
    fn set_health_bar(&self, actor: ActorId, current: f32, max: f32);
}

/// Borrowed bundle of every collaborator, passed into each tick.
#[derive(Clone, Copy)]
pub struct CombatEnv<'a> {
    spatial: &'a dyn SpatialQuery,
    navigator: &'a dyn Navigator,
    scene: &'a dyn SceneGraph,
    cues: &'a dyn CueSink,
    status: &'a dyn StatusSink,
}

impl<'a> CombatEnv<'a> {
    pub fn new(
        spatial: &'a dyn SpatialQuery,
        navigator: &'a dyn Navigator,
        scene: &'a dyn SceneGraph,
        cues: &'a dyn CueSink,
        status: &'a dyn StatusSink,
    ) -> Self {
        Self {
            spatial,
            navigator,
            scene,
            cues,
            status,
        }
    }

    pub fn spatial(&self) -> &'a dyn SpatialQuery {
        self.spatial
    }

    pub fn navigator(&self) -> &'a dyn Navigator {
        self.navigator
    }

    pub fn scene(&self) -> &'a dyn SceneGraph {
        self.scene
    }

    pub fn cues(&self) -> &'a dyn CueSink {
        self.cues
    }

    pub fn status(&self) -> &'a dyn StatusSink {
        self.status
    }
}

impl std::fmt::Debug for CombatEnv<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CombatEnv").finish_non_exhaustive()
    }
}
