//! The shared enemy state machine.
//!
//! One [`BehaviorStateMachine`] drives every archetype. The archetype record
//! supplies attacks, selection policy, hold policy, pursuit style and special
//! behavior; the machine supplies the canonical flow:
//!
//! ```text
//! Idle ──► Chasing ◄──► Holding
//!             │
//!             ▼ (attack in range and ready)
//!          Charging ──stagger──► Recovering
//!             │                     ▲
//!             ▼                     │
//!          Attacking ───────────────┘
//!                                   │ then_special
//!                                   ▼
//!                                Special ──► Chasing
//! ```
//!
//! Every delay is a scheduled timer. Cooldowns run per attack and keep running
//! whatever state the actor is in.
use std::collections::BTreeSet;
use std::sync::Arc;

use arrayvec::ArrayVec;
use glam::{Quat, Vec3};

use super::archetype::{Archetype, HoldPolicy, Pursuit};
use super::attack::{AttackDelivery, AttackSelection, HitSuppression, SecondaryEffect, select_attack};
use super::pursuit::{destination, face_towards};
use super::special::{SpecialEntry, SpecialKind, SpecialStep, SpecialStrategy};
use crate::actor::ActorId;
use crate::config::CombatConfig;
use crate::env::{CombatEnv, Cue, ProjectileLaunch, Region, SimRng};
use crate::placement::flat_distance;
use crate::time::{Tick, TickRate, TimerHandle, Timers};

/// The actor being hunted, as observed this tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Target {
    pub id: ActorId,
    pub position: Vec3,
    pub velocity: Vec3,
}

/// Per-tick inputs for one actor.
#[derive(Clone, Copy, Debug)]
pub struct BehaviorContext<'a, 'e> {
    pub me: ActorId,
    pub now: Tick,
    pub rate: TickRate,
    pub env: &'a CombatEnv<'e>,
    /// `None` once the target is dead or gone.
    pub target: Option<Target>,
}

impl BehaviorContext<'_, '_> {
    pub fn dt(&self) -> f32 {
        self.rate.delta()
    }

    pub fn position(&self) -> Option<Vec3> {
        self.env.scene().position(self.me)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::IntoStaticStr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BehaviorState {
    Idle,
    Chasing,
    /// Turning in place while attacks cool down.
    Holding,
    Charging,
    Attacking,
    Recovering,
    Special(SpecialKind),
    Dead,
}

/// What the machine asks the world to do or record.
#[derive(Clone, Debug, PartialEq)]
pub enum BehaviorOutput {
    Telegraphed {
        attack: String,
    },
    Hit {
        target: ActorId,
        damage: f32,
        secondary: Option<SecondaryEffect>,
    },
    StateChanged {
        from: BehaviorState,
        to: BehaviorState,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum BehaviorTimer {
    Activate,
    ChargeComplete,
    Strike,
    AttackComplete,
    RecoveryComplete,
    CooldownComplete(usize),
    Repath,
}

#[derive(Debug)]
pub struct BehaviorStateMachine {
    me: ActorId,
    archetype: Arc<Archetype>,
    state: BehaviorState,
    active: bool,
    timers: Timers<BehaviorTimer>,
    cooldowns: ArrayVec<Option<TimerHandle>, { CombatConfig::MAX_ATTACKS }>,
    current: Option<usize>,
    planned: Option<usize>,
    interrupted: bool,
    cursor: usize,
    charge: Option<TimerHandle>,
    recovery: Option<TimerHandle>,
    repath: Option<TimerHandle>,
    struck: BTreeSet<ActorId>,
    intercepting: bool,
    special: Option<Box<dyn SpecialStrategy>>,
    rng: SimRng,
    outputs: Vec<BehaviorOutput>,
}

impl BehaviorStateMachine {
    pub fn new(me: ActorId, archetype: Arc<Archetype>, mut rng: SimRng, now: Tick, rate: TickRate) -> Self {
        let intercepting = match archetype.pursuit {
            Pursuit::Direct => false,
            Pursuit::Intercept { chance, .. } => rng.chance(chance),
        };
        let special = archetype.special.strategy(archetype.rotation_speed);
        let mut timers = Timers::new();
        let delay = rate.ticks(archetype.activation_delay);
        let active = delay == 0;
        if !active {
            timers.schedule(now, delay, BehaviorTimer::Activate);
        }

        let mut machine = Self {
            me,
            cooldowns: archetype.attacks.iter().map(|_| None).collect(),
            archetype,
            state: BehaviorState::Idle,
            active,
            timers,
            current: None,
            planned: None,
            interrupted: false,
            cursor: 0,
            charge: None,
            recovery: None,
            repath: None,
            struck: BTreeSet::new(),
            intercepting,
            special,
            rng,
            outputs: Vec::new(),
        };
        machine.roll_planned(false);
        machine
    }

    pub fn state(&self) -> BehaviorState {
        self.state
    }

    pub fn archetype(&self) -> &Arc<Archetype> {
        &self.archetype
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_intercepting(&self) -> bool {
        self.intercepting
    }

    /// Whether attack `index` is off cooldown.
    pub fn is_ready(&self, index: usize) -> bool {
        self.cooldowns.get(index).is_some_and(|slot| slot.is_none())
    }

    pub fn current_attack(&self) -> Option<usize> {
        self.current
    }

    pub fn planned_attack(&self) -> Option<usize> {
        self.planned
    }

    pub fn special_kind(&self) -> Option<SpecialKind> {
        self.special.as_ref().map(|special| special.kind())
    }

    pub fn is_airborne(&self) -> bool {
        self.special.as_ref().is_some_and(|special| special.airborne())
    }

    pub fn drain_outputs(&mut self) -> Vec<BehaviorOutput> {
        std::mem::take(&mut self.outputs)
    }

    /// Advances timers and runs the current state for one tick.
    pub fn tick(&mut self, ctx: &BehaviorContext<'_, '_>) {
        if self.state == BehaviorState::Dead {
            return;
        }
        for (handle, timer) in self.timers.advance(ctx.now) {
            self.on_timer(handle, timer, ctx);
        }

        match self.state {
            BehaviorState::Idle => {
                if self.active && ctx.target.is_some() {
                    self.update_chase(ctx);
                }
            }
            BehaviorState::Chasing | BehaviorState::Holding => self.update_chase(ctx),
            BehaviorState::Charging => {
                if let Some(target) = ctx.target {
                    let rate = self.archetype.rotation_speed * self.archetype.charge_tracking;
                    face_towards(ctx.env, self.me, target.position, rate, ctx.dt());
                }
            }
            BehaviorState::Recovering => {
                if let Some(target) = ctx.target {
                    face_towards(
                        ctx.env,
                        self.me,
                        target.position,
                        self.archetype.rotation_speed,
                        ctx.dt(),
                    );
                }
            }
            BehaviorState::Special(_) => {
                let step = match self.special.as_mut() {
                    Some(special) => special.tick(ctx, &mut self.rng),
                    None => SpecialStep::Done,
                };
                if step == SpecialStep::Done {
                    self.enter_chase();
                }
            }
            BehaviorState::Attacking | BehaviorState::Dead => {}
        }
    }

    /// Reacts to a stagger raised by this actor's status engine.
    ///
    /// Only a telegraph can be interrupted; a stagger during the active or
    /// recovery window has no effect beyond the cue.
    pub fn on_staggered(&mut self, ctx: &BehaviorContext<'_, '_>) {
        match self.state {
            BehaviorState::Dead => return,
            BehaviorState::Charging => {
                self.timers.cancel_slot(&mut self.charge);
                if let Some(index) = self.current {
                    tracing::debug!(
                        actor = %self.me,
                        attack = %self.archetype.attacks[index].name,
                        "telegraph interrupted"
                    );
                    self.start_cooldown(index, ctx);
                    self.interrupted = true;
                    self.set_state(BehaviorState::Recovering);
                    let delay = ctx.rate.ticks(self.archetype.attacks[index].active_duration);
                    self.recovery =
                        Some(self.timers.schedule(ctx.now, delay, BehaviorTimer::RecoveryComplete));
                } else {
                    self.enter_chase();
                }
            }
            BehaviorState::Idle | BehaviorState::Chasing | BehaviorState::Holding => {
                ctx.env.navigator().stop(self.me);
                self.timers.cancel_slot(&mut self.repath);
                for index in 0..self.cooldowns.len() {
                    self.start_cooldown(index, ctx);
                }
            }
            BehaviorState::Attacking | BehaviorState::Recovering => {}
            BehaviorState::Special(_) => {
                let step = match self.special.as_mut() {
                    Some(special) => special.on_stagger(ctx),
                    None => SpecialStep::Done,
                };
                if step == SpecialStep::Done {
                    self.enter_chase();
                }
            }
        }
        ctx.env.cues().cue(self.me, Cue::Stagger);
    }

    /// Stops everything. Idempotent.
    pub fn on_died(&mut self, ctx: &BehaviorContext<'_, '_>) {
        if self.state == BehaviorState::Dead {
            return;
        }
        self.timers.clear();
        self.cooldowns.iter_mut().for_each(|slot| *slot = None);
        self.charge = None;
        self.recovery = None;
        self.repath = None;
        self.current = None;
        ctx.env.navigator().stop(self.me);
        ctx.env.cues().cue(self.me, Cue::Death);
        self.set_state(BehaviorState::Dead);
    }

    fn on_timer(&mut self, handle: TimerHandle, timer: BehaviorTimer, ctx: &BehaviorContext<'_, '_>) {
        match timer {
            BehaviorTimer::Activate => {
                tracing::trace!(actor = %self.me, "activated");
                self.active = true;
            }
            BehaviorTimer::ChargeComplete => {
                if self.charge == Some(handle) {
                    self.charge = None;
                    self.begin_attack(ctx);
                }
            }
            BehaviorTimer::Strike => {
                if self.state == BehaviorState::Attacking {
                    self.strike(ctx);
                }
            }
            BehaviorTimer::AttackComplete => {
                if self.state == BehaviorState::Attacking {
                    self.finish_attack(ctx);
                }
            }
            BehaviorTimer::RecoveryComplete => {
                if self.recovery == Some(handle) {
                    self.recovery = None;
                    self.after_recovery(ctx);
                }
            }
            BehaviorTimer::CooldownComplete(index) => {
                if let Some(slot) = self.cooldowns.get_mut(index)
                    && *slot == Some(handle)
                {
                    *slot = None;
                }
            }
            BehaviorTimer::Repath => {
                if self.repath == Some(handle) {
                    self.repath = None;
                }
            }
        }
    }

    fn update_chase(&mut self, ctx: &BehaviorContext<'_, '_>) {
        let Some(target) = ctx.target else {
            if self.state != BehaviorState::Idle {
                ctx.env.navigator().stop(self.me);
                self.timers.cancel_slot(&mut self.repath);
                self.set_state(BehaviorState::Idle);
            }
            return;
        };
        let Some(me) = ctx.position() else {
            return;
        };
        if let Some(special) = self.special.as_mut()
            && special.wants_control(ctx)
        {
            self.enter_special(ctx, SpecialEntry::Chase);
            return;
        }

        let (airborne, bonus) = self
            .special
            .as_ref()
            .map(|special| (special.airborne(), special.range_bonus()))
            .unwrap_or((false, 0.0));
        if self.archetype.selection == AttackSelection::PreRolled {
            self.roll_planned_if_unusable(airborne);
        }

        let distance = flat_distance(me, target.position);
        let archetype = Arc::clone(&self.archetype);
        let candidates: ArrayVec<usize, { CombatConfig::MAX_ATTACKS }> = archetype
            .attacks
            .iter()
            .enumerate()
            .filter(|(index, attack)| {
                attack.mode.allows(airborne)
                    && (archetype.selection != AttackSelection::PreRolled
                        || self.planned == Some(*index))
            })
            .map(|(index, _)| index)
            .collect();
        let in_range = |index: usize| distance <= archetype.attacks[index].range + bonus;
        let available: ArrayVec<usize, { CombatConfig::MAX_ATTACKS }> = candidates
            .iter()
            .copied()
            .filter(|&index| self.is_ready(index) && in_range(index))
            .collect();

        if let Some(choice) = select_attack(
            archetype.selection,
            &archetype.attacks,
            &available,
            &mut self.cursor,
            &mut self.rng,
        ) {
            self.begin_charge(choice, ctx);
            return;
        }

        let hold = match archetype.hold {
            HoldPolicy::Never => false,
            HoldPolicy::InRange => candidates
                .iter()
                .any(|&index| !self.is_ready(index) && in_range(index)),
            HoldPolicy::WhileCooling => (0..self.cooldowns.len()).any(|index| !self.is_ready(index)),
        };
        if hold {
            if self.state != BehaviorState::Holding {
                ctx.env.navigator().stop(self.me);
                self.timers.cancel_slot(&mut self.repath);
                self.set_state(BehaviorState::Holding);
            }
            face_towards(
                ctx.env,
                self.me,
                target.position,
                archetype.rotation_speed,
                ctx.dt(),
            );
            return;
        }

        if self.state != BehaviorState::Chasing {
            self.set_state(BehaviorState::Chasing);
        }
        if self.repath.is_none() {
            let speed = ctx.env.navigator().speed(self.me);
            let point = destination(archetype.pursuit, self.intercepting, me, speed, &target);
            ctx.env.navigator().set_destination(self.me, point);
            let delay = ctx.rate.ticks(archetype.repath_interval).max(1);
            self.repath = Some(self.timers.schedule(ctx.now, delay, BehaviorTimer::Repath));
        }
    }

    fn begin_charge(&mut self, index: usize, ctx: &BehaviorContext<'_, '_>) {
        let attack = &self.archetype.attacks[index];
        let name = attack.name.clone();
        let charge_ticks = ctx.rate.ticks(attack.charge_time);

        ctx.env.navigator().stop(self.me);
        self.timers.cancel_slot(&mut self.repath);
        self.current = Some(index);
        self.interrupted = false;
        self.struck.clear();
        if self.archetype.selection == AttackSelection::PreRolled {
            self.planned = None;
        }

        tracing::debug!(actor = %self.me, attack = %name, "telegraphing");
        ctx.env.cues().cue(self.me, Cue::Attack { name: name.clone() });
        self.outputs.push(BehaviorOutput::Telegraphed { attack: name });
        self.set_state(BehaviorState::Charging);
        self.charge = Some(
            self.timers
                .schedule(ctx.now, charge_ticks, BehaviorTimer::ChargeComplete),
        );
    }

    fn begin_attack(&mut self, ctx: &BehaviorContext<'_, '_>) {
        let Some(index) = self.current else {
            self.enter_chase();
            return;
        };
        let attack = &self.archetype.attacks[index];
        let strikes = attack.strikes.max(1);
        let interval = attack.strike_interval;
        let active = ctx
            .rate
            .ticks(attack.active_duration.max(attack.strike_span()))
            .max(1);

        self.set_state(BehaviorState::Attacking);
        self.strike(ctx);
        for strike in 1..strikes {
            let delay = ctx.rate.ticks(interval * strike as f32);
            self.timers.schedule(ctx.now, delay, BehaviorTimer::Strike);
        }
        self.timers
            .schedule(ctx.now, active, BehaviorTimer::AttackComplete);
    }

    fn strike(&mut self, ctx: &BehaviorContext<'_, '_>) {
        let Some(index) = self.current else {
            return;
        };
        let Some(position) = ctx.position() else {
            return;
        };
        let archetype = Arc::clone(&self.archetype);
        let attack = &archetype.attacks[index];
        let rotation = ctx.env.scene().rotation(self.me);

        match attack.delivery {
            AttackDelivery::Melee { shape, offset } => {
                let region = Region {
                    shape,
                    center: position + rotation * offset,
                    rotation,
                };
                if attack.suppression == HitSuppression::PerStrike {
                    self.struck.clear();
                }
                for target in ctx.env.spatial().overlap(&region, attack.affects) {
                    if target == self.me || !self.struck.insert(target) {
                        continue;
                    }
                    self.outputs.push(BehaviorOutput::Hit {
                        target,
                        damage: attack.damage,
                        secondary: attack.secondary,
                    });
                }
            }
            AttackDelivery::Projectile {
                speed,
                count,
                spread_degrees,
            } => {
                let origin = position + Vec3::Y;
                let forward = rotation * Vec3::Z;
                let aim = ctx
                    .target
                    .map(|target| (target.position - origin).normalize_or(forward))
                    .unwrap_or(forward);
                let count = count.max(1);
                let middle = (count - 1) as f32 / 2.0;
                for shot in 0..count {
                    let yaw = ((shot as f32 - middle) * spread_degrees).to_radians();
                    ctx.env.scene().launch_projectile(&ProjectileLaunch {
                        owner: self.me,
                        origin,
                        direction: Quat::from_rotation_y(yaw) * aim,
                        speed,
                        damage: attack.damage,
                        affects: attack.affects,
                    });
                }
                ctx.env.cues().cue(self.me, Cue::Projectile);
            }
        }
    }

    fn finish_attack(&mut self, ctx: &BehaviorContext<'_, '_>) {
        let Some(index) = self.current else {
            self.enter_chase();
            return;
        };
        self.timers
            .cancel_where(|timer| matches!(timer, BehaviorTimer::Strike));
        self.set_state(BehaviorState::Recovering);
        self.start_cooldown(index, ctx);
        let delay = ctx.rate.ticks(self.archetype.attacks[index].recovery);
        self.recovery = Some(
            self.timers
                .schedule(ctx.now, delay, BehaviorTimer::RecoveryComplete),
        );
    }

    fn after_recovery(&mut self, ctx: &BehaviorContext<'_, '_>) {
        let finished = self.current.take();
        let interrupted = std::mem::take(&mut self.interrupted);
        let airborne = self.is_airborne();
        self.roll_planned(airborne);

        let wants_special = finished
            .is_some_and(|index| self.archetype.attacks[index].then_special)
            && !interrupted
            && self.special.is_some();
        if wants_special {
            self.enter_special(ctx, SpecialEntry::AfterAttack);
        } else {
            self.enter_chase();
        }
    }

    fn enter_special(&mut self, ctx: &BehaviorContext<'_, '_>, entry: SpecialEntry) {
        let Some(kind) = self.special_kind() else {
            self.enter_chase();
            return;
        };
        self.timers.cancel_slot(&mut self.repath);
        self.set_state(BehaviorState::Special(kind));
        let step = match self.special.as_mut() {
            Some(special) => special.enter(ctx, &mut self.rng, entry),
            None => SpecialStep::Done,
        };
        if step == SpecialStep::Done {
            self.enter_chase();
        }
    }

    fn enter_chase(&mut self) {
        self.timers.cancel_slot(&mut self.repath);
        self.set_state(BehaviorState::Chasing);
    }

    fn start_cooldown(&mut self, index: usize, ctx: &BehaviorContext<'_, '_>) {
        let Some(slot) = self.cooldowns.get_mut(index) else {
            return;
        };
        if let Some(previous) = slot.take() {
            self.timers.cancel(previous);
        }
        let ticks = ctx.rate.ticks(self.archetype.attacks[index].cooldown);
        if ticks > 0 {
            let handle = self
                .timers
                .schedule(ctx.now, ticks, BehaviorTimer::CooldownComplete(index));
            self.cooldowns[index] = Some(handle);
        }
    }

    /// Rolls the next attack for pre-rolled selection.
    fn roll_planned(&mut self, airborne: bool) {
        if self.archetype.selection != AttackSelection::PreRolled {
            return;
        }
        let usable: ArrayVec<usize, { CombatConfig::MAX_ATTACKS }> = self
            .archetype
            .attacks
            .iter()
            .enumerate()
            .filter(|(_, attack)| attack.mode.allows(airborne))
            .map(|(index, _)| index)
            .collect();
        self.planned = (!usable.is_empty()).then(|| usable[self.rng.index(usable.len())]);
    }

    fn roll_planned_if_unusable(&mut self, airborne: bool) {
        let usable = self
            .planned
            .is_some_and(|index| self.archetype.attacks[index].mode.allows(airborne));
        if !usable {
            self.roll_planned(airborne);
        }
    }

    fn set_state(&mut self, to: BehaviorState) {
        let from = self.state;
        if from == to {
            return;
        }
        tracing::debug!(actor = %self.me, %from, %to, "state");
        self.state = to;
        self.outputs.push(BehaviorOutput::StateChanged { from, to });
    }
}

#[cfg(test)]
#[path = "machine_tests.rs"]
mod tests;
