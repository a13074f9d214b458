//! Positioning strategies run between attacks: retreat, fly toggle, teleport.
use std::fmt;

use glam::Vec3;

use super::archetype::SpecialBehavior;
use super::machine::BehaviorContext;
use super::pursuit::{face_towards, look_at};
use crate::env::{Cue, SimRng};
use crate::placement::{PlacementLimits, flat_distance, sample_point};
use crate::time::Tick;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::IntoStaticStr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SpecialKind {
    Retreat,
    FlyToggle,
    Teleport,
}

/// Why the state machine is handing control to the strategy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpecialEntry {
    /// The strategy asked for control while chasing.
    Chase,
    /// An attack flagged `then_special` finished recovering.
    AfterAttack,
}

/// Whether the strategy keeps control.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpecialStep {
    Continue,
    Done,
}

/// Strategy interface behind [`SpecialBehavior`].
pub trait SpecialStrategy: fmt::Debug + Send + Sync {
    fn kind(&self) -> SpecialKind;

    /// Whether grounded-only attacks are unavailable.
    fn airborne(&self) -> bool {
        false
    }

    /// Added to every attack's range.
    fn range_bonus(&self) -> f32 {
        0.0
    }

    /// Polled once per chasing tick; `true` hands control to the strategy.
    fn wants_control(&mut self, _ctx: &BehaviorContext<'_, '_>) -> bool {
        false
    }

    fn enter(
        &mut self,
        ctx: &BehaviorContext<'_, '_>,
        rng: &mut SimRng,
        entry: SpecialEntry,
    ) -> SpecialStep;

    fn tick(&mut self, ctx: &BehaviorContext<'_, '_>, rng: &mut SimRng) -> SpecialStep;

    fn on_stagger(&mut self, _ctx: &BehaviorContext<'_, '_>) -> SpecialStep {
        SpecialStep::Continue
    }
}

impl SpecialBehavior {
    /// Builds the strategy for this behavior, if any.
    pub fn strategy(&self, rotation_speed: f32) -> Option<Box<dyn SpecialStrategy>> {
        match *self {
            SpecialBehavior::None => None,
            SpecialBehavior::Retreat(params) => Some(Box::new(Retreat::new(params, rotation_speed))),
            SpecialBehavior::FlyToggle(params) => {
                Some(Box::new(FlyToggle::new(params, rotation_speed)))
            }
            SpecialBehavior::Teleport(params) => Some(Box::new(Teleport::new(params))),
        }
    }
}

/// Turning in place toward the target for a fixed time.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Reorient {
    remaining: f32,
}

impl Reorient {
    /// Returns true once the reorientation is over.
    fn tick(&mut self, ctx: &BehaviorContext<'_, '_>, rotation_speed: f32) -> bool {
        if let Some(target) = ctx.target {
            face_towards(ctx.env, ctx.me, target.position, rotation_speed, ctx.dt());
        }
        self.remaining -= ctx.dt();
        self.remaining <= 0.0
    }
}

// ---------------------------------------------------------------------------
// Retreat
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RetreatParams {
    /// Only retreat when the target is at least this close.
    pub safe_distance: f32,
    pub distance: f32,
    pub attempts: u32,
    /// Random spread added to the flee direction.
    pub jitter: f32,
    pub clearance: f32,
    pub arrive_distance: f32,
    pub reorient_secs: f32,
}

impl Default for RetreatParams {
    fn default() -> Self {
        Self {
            safe_distance: 8.0,
            distance: 10.0,
            attempts: 10,
            jitter: 0.3,
            clearance: 1.0,
            arrive_distance: 0.1,
            reorient_secs: 1.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum RetreatPhase {
    Idle,
    Moving,
    Reorienting(Reorient),
}

#[derive(Debug)]
pub struct Retreat {
    params: RetreatParams,
    rotation_speed: f32,
    phase: RetreatPhase,
}

impl Retreat {
    pub fn new(params: RetreatParams, rotation_speed: f32) -> Self {
        Self {
            params,
            rotation_speed,
            phase: RetreatPhase::Idle,
        }
    }

    fn reorient(&mut self, ctx: &BehaviorContext<'_, '_>) -> SpecialStep {
        ctx.env.navigator().stop(ctx.me);
        self.phase = RetreatPhase::Reorienting(Reorient {
            remaining: self.params.reorient_secs,
        });
        SpecialStep::Continue
    }
}

impl SpecialStrategy for Retreat {
    fn kind(&self) -> SpecialKind {
        SpecialKind::Retreat
    }

    fn enter(
        &mut self,
        ctx: &BehaviorContext<'_, '_>,
        rng: &mut SimRng,
        _entry: SpecialEntry,
    ) -> SpecialStep {
        let (Some(target), Some(me)) = (ctx.target, ctx.position()) else {
            return SpecialStep::Done;
        };
        if flat_distance(me, target.position) > self.params.safe_distance {
            return SpecialStep::Done;
        }

        let away = Vec3::new(me.x - target.position.x, 0.0, me.z - target.position.z)
            .normalize_or_zero();
        let params = self.params;
        let limits = PlacementLimits {
            attempts: params.attempts,
            nav_sample_distance: params.distance,
            clearance: params.clearance,
        };
        let picked = sample_point(
            ctx.env,
            rng,
            limits,
            |rng| {
                let base = if away == Vec3::ZERO {
                    rng.horizontal_dir()
                } else {
                    away
                };
                let jittered = base + rng.inside_unit_sphere() * params.jitter;
                let dir = Vec3::new(jittered.x, 0.0, jittered.z).normalize_or(base);
                me + dir * params.distance
            },
            |point| flat_distance(point, target.position) > params.safe_distance,
        );
        match picked {
            Ok(point) => {
                tracing::debug!(actor = %ctx.me, ?point, "retreating");
                ctx.env.navigator().set_destination(ctx.me, point);
                self.phase = RetreatPhase::Moving;
                SpecialStep::Continue
            }
            Err(error) => {
                tracing::debug!(actor = %ctx.me, %error, "no retreat point");
                self.reorient(ctx)
            }
        }
    }

    fn tick(&mut self, ctx: &BehaviorContext<'_, '_>, _rng: &mut SimRng) -> SpecialStep {
        match &mut self.phase {
            RetreatPhase::Idle => SpecialStep::Done,
            RetreatPhase::Moving => {
                if ctx.env.navigator().remaining_distance(ctx.me) <= self.params.arrive_distance {
                    self.reorient(ctx)
                } else {
                    SpecialStep::Continue
                }
            }
            RetreatPhase::Reorienting(reorient) => {
                if reorient.tick(ctx, self.rotation_speed) {
                    self.phase = RetreatPhase::Idle;
                    SpecialStep::Done
                } else {
                    SpecialStep::Continue
                }
            }
        }
    }

    fn on_stagger(&mut self, ctx: &BehaviorContext<'_, '_>) -> SpecialStep {
        if self.phase == RetreatPhase::Moving {
            tracing::debug!(actor = %ctx.me, "retreat cancelled by stagger");
            return self.reorient(ctx);
        }
        SpecialStep::Continue
    }
}

// ---------------------------------------------------------------------------
// Fly toggle
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FlyParams {
    /// Chasing seconds spent in one profile before switching.
    pub max_state_secs: f32,
    pub range_boost: f32,
    pub altitude: f32,
    pub transition_secs: f32,
    pub reposition_attempts: u32,
    /// Airborne repositions stay within this distance of the target.
    pub reposition_range: f32,
    pub min_reposition_distance: f32,
    pub clearance: f32,
    pub arrive_distance: f32,
    pub reorient_secs: f32,
}

impl Default for FlyParams {
    fn default() -> Self {
        Self {
            max_state_secs: 12.0,
            range_boost: 6.0,
            altitude: 6.0,
            transition_secs: 1.5,
            reposition_attempts: 10,
            reposition_range: 14.0,
            min_reposition_distance: 5.0,
            clearance: 5.0,
            arrive_distance: 0.1,
            reorient_secs: 1.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum FlyPhase {
    Idle,
    Ascending { elapsed: f32 },
    Descending { elapsed: f32 },
    Repositioning,
    Reorienting(Reorient),
}

#[derive(Debug)]
pub struct FlyToggle {
    params: FlyParams,
    rotation_speed: f32,
    airborne: bool,
    state_secs: f32,
    phase: FlyPhase,
}

impl FlyToggle {
    pub fn new(params: FlyParams, rotation_speed: f32) -> Self {
        Self {
            params,
            rotation_speed,
            airborne: false,
            state_secs: 0.0,
            phase: FlyPhase::Idle,
        }
    }

    pub fn is_airborne(&self) -> bool {
        self.airborne
    }

    fn begin_transition(&mut self, ctx: &BehaviorContext<'_, '_>) -> SpecialStep {
        ctx.env.navigator().stop(ctx.me);
        if self.airborne {
            tracing::debug!(actor = %ctx.me, "descending");
            ctx.env.cues().cue(ctx.me, Cue::Descend);
            self.phase = FlyPhase::Descending { elapsed: 0.0 };
        } else {
            tracing::debug!(actor = %ctx.me, "ascending");
            ctx.env.cues().cue(ctx.me, Cue::Ascend);
            ctx.env.scene().set_collision_enabled(ctx.me, false);
            self.phase = FlyPhase::Ascending { elapsed: 0.0 };
        }
        SpecialStep::Continue
    }

    fn reposition(&mut self, ctx: &BehaviorContext<'_, '_>, rng: &mut SimRng) -> SpecialStep {
        let (Some(target), Some(me)) = (ctx.target, ctx.position()) else {
            return SpecialStep::Done;
        };
        let params = self.params;
        let limits = PlacementLimits {
            attempts: params.reposition_attempts,
            nav_sample_distance: params.reposition_range,
            clearance: params.clearance,
        };
        let picked = sample_point(
            ctx.env,
            rng,
            limits,
            |rng| me + rng.horizontal_dir() * params.reposition_range,
            |point| {
                flat_distance(point, target.position) <= params.reposition_range
                    && flat_distance(point, me) >= params.min_reposition_distance
            },
        );
        match picked {
            Ok(point) => {
                ctx.env.navigator().set_destination(ctx.me, point);
                self.phase = FlyPhase::Repositioning;
                SpecialStep::Continue
            }
            Err(error) => {
                tracing::debug!(actor = %ctx.me, %error, "no reposition point");
                self.phase = FlyPhase::Idle;
                SpecialStep::Done
            }
        }
    }
}

impl SpecialStrategy for FlyToggle {
    fn kind(&self) -> SpecialKind {
        SpecialKind::FlyToggle
    }

    fn airborne(&self) -> bool {
        self.airborne
    }

    fn range_bonus(&self) -> f32 {
        if self.airborne {
            self.params.range_boost
        } else {
            0.0
        }
    }

    fn wants_control(&mut self, ctx: &BehaviorContext<'_, '_>) -> bool {
        self.state_secs += ctx.dt();
        self.state_secs >= self.params.max_state_secs
    }

    fn enter(
        &mut self,
        ctx: &BehaviorContext<'_, '_>,
        rng: &mut SimRng,
        entry: SpecialEntry,
    ) -> SpecialStep {
        match entry {
            SpecialEntry::Chase => self.begin_transition(ctx),
            SpecialEntry::AfterAttack if self.airborne => self.reposition(ctx, rng),
            SpecialEntry::AfterAttack => SpecialStep::Done,
        }
    }

    fn tick(&mut self, ctx: &BehaviorContext<'_, '_>, _rng: &mut SimRng) -> SpecialStep {
        let dt = ctx.dt();
        let transition = self.params.transition_secs.max(dt);
        match &mut self.phase {
            FlyPhase::Idle => SpecialStep::Done,
            FlyPhase::Ascending { elapsed } => {
                *elapsed += dt;
                let progress = (*elapsed / transition).min(1.0);
                ctx.env
                    .scene()
                    .set_elevation(ctx.me, self.params.altitude * progress);
                if progress >= 1.0 {
                    self.airborne = true;
                    self.state_secs = 0.0;
                    self.phase = FlyPhase::Idle;
                    SpecialStep::Done
                } else {
                    SpecialStep::Continue
                }
            }
            FlyPhase::Descending { elapsed } => {
                *elapsed += dt;
                let progress = (*elapsed / transition).min(1.0);
                // Range bonus is lost as soon as the descent starts.
                self.airborne = false;
                ctx.env
                    .scene()
                    .set_elevation(ctx.me, self.params.altitude * (1.0 - progress));
                if progress >= 1.0 {
                    ctx.env.scene().set_collision_enabled(ctx.me, true);
                    self.state_secs = 0.0;
                    self.phase = FlyPhase::Reorienting(Reorient {
                        remaining: self.params.reorient_secs,
                    });
                }
                SpecialStep::Continue
            }
            FlyPhase::Repositioning => {
                if ctx.env.navigator().remaining_distance(ctx.me) > self.params.arrive_distance {
                    return SpecialStep::Continue;
                }
                if self.state_secs >= self.params.max_state_secs {
                    self.begin_transition(ctx)
                } else {
                    self.phase = FlyPhase::Reorienting(Reorient {
                        remaining: self.params.reorient_secs,
                    });
                    SpecialStep::Continue
                }
            }
            FlyPhase::Reorienting(reorient) => {
                if reorient.tick(ctx, self.rotation_speed) {
                    self.phase = FlyPhase::Idle;
                    SpecialStep::Done
                } else {
                    SpecialStep::Continue
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Teleport
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TeleportParams {
    pub distance: f32,
    pub min_distance: f32,
    pub attempts: u32,
    pub clearance: f32,
    pub cooldown: f32,
}

impl Default for TeleportParams {
    fn default() -> Self {
        Self {
            distance: 12.0,
            min_distance: 6.0,
            attempts: 50,
            clearance: 1.0,
            cooldown: 6.0,
        }
    }
}

#[derive(Debug)]
pub struct Teleport {
    params: TeleportParams,
    ready_at: Tick,
}

impl Teleport {
    pub fn new(params: TeleportParams) -> Self {
        Self {
            params,
            ready_at: Tick::ZERO,
        }
    }
}

impl SpecialStrategy for Teleport {
    fn kind(&self) -> SpecialKind {
        SpecialKind::Teleport
    }

    fn enter(
        &mut self,
        ctx: &BehaviorContext<'_, '_>,
        rng: &mut SimRng,
        _entry: SpecialEntry,
    ) -> SpecialStep {
        if ctx.now < self.ready_at {
            return SpecialStep::Done;
        }
        let Some(me) = ctx.position() else {
            return SpecialStep::Done;
        };
        let params = self.params;
        let limits = PlacementLimits {
            attempts: params.attempts,
            nav_sample_distance: params.distance,
            clearance: params.clearance,
        };
        let picked = sample_point(
            ctx.env,
            rng,
            limits,
            |rng| me + rng.horizontal_dir() * params.distance,
            |point| flat_distance(point, me) >= params.min_distance,
        );
        match picked {
            Ok(point) => {
                tracing::debug!(actor = %ctx.me, ?point, "teleporting");
                ctx.env.cues().cue(ctx.me, Cue::Teleport);
                ctx.env.navigator().warp(ctx.me, point);
                if let Some(target) = ctx.target {
                    look_at(ctx.env, ctx.me, target.position);
                }
                self.ready_at = ctx.now + ctx.rate.ticks(params.cooldown);
            }
            Err(error) => {
                tracing::debug!(actor = %ctx.me, %error, "teleport failed");
            }
        }
        SpecialStep::Done
    }

    fn tick(&mut self, _ctx: &BehaviorContext<'_, '_>, _rng: &mut SimRng) -> SpecialStep {
        SpecialStep::Done
    }
}
