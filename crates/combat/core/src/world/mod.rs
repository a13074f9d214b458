//! The combat world: every actor plus the encounter director, advanced one
//! fixed tick at a time.
//!
//! Within a tick the order is fixed:
//!
//! 1. status clocks (bleeds, knockback windows, regeneration)
//! 2. enemy behavior, in ascending id order
//! 3. director pacing, which may spawn one enemy
//! 4. world timers (despawns, mark expiry)
//!
//! Status events raised at any step are drained immediately, so a stagger or
//! death is reflected in behavior before the next actor runs.
mod events;
mod marks;
mod player;

pub use events::{ActorSnapshot, CombatEvent, PlayerSnapshot, WorldSnapshot};
pub use marks::{MarkEntry, MarkLedger};
pub use player::{PlayerCombat, Stance};

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use arrayvec::ArrayVec;
use glam::Vec3;

use crate::actor::{Actor, ActorId, ActorTag, TagMask};
use crate::behavior::{
    Archetype, BehaviorContext, BehaviorOutput, BehaviorStateMachine, Explosion, SecondaryEffect,
    Target,
};
use crate::config::CombatConfig;
use crate::director::{ArchetypeCatalog, EncounterDirector, SpawnOrder};
use crate::env::{CombatEnv, Cue, Region, SimRng, SpawnRequest};
use crate::error::PlayerActionError;
use crate::placement::flat_direction;
use crate::status::{BleedSpec, DamageOutcome, StatusEngine, StatusEvent};
use crate::time::{Tick, TickRate, Timers};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum WorldTimer {
    /// Remove a dead enemy once its death animation is over.
    Despawn(ActorId),
    /// Lift every mark applied by this source.
    MarksExpired(ActorId),
}

type SpecialTargets = ArrayVec<ActorId, { CombatConfig::MAX_SPECIAL_TARGETS }>;

#[derive(Debug)]
pub struct CombatWorld {
    config: CombatConfig,
    rate: TickRate,
    now: Tick,
    actors: BTreeMap<ActorId, Actor>,
    next_id: u32,
    player: PlayerCombat,
    director: EncounterDirector,
    /// Enemies handed out by the director; only these count as defeats.
    directed: BTreeSet<ActorId>,
    dying: BTreeSet<ActorId>,
    timers: Timers<WorldTimer>,
    marks: MarkLedger,
    rng: SimRng,
    events: Vec<CombatEvent>,
}

impl CombatWorld {
    /// Creates a world holding only the player. The host owns the player's
    /// body in the scene; the world only tracks its combat state.
    pub fn new(config: CombatConfig, catalog: ArchetypeCatalog, seed: u64) -> Self {
        let rate = config.tick_rate();
        let player = &config.player;
        let status = StatusEngine::new(
            ActorId::PLAYER,
            player.max_health,
            player.stagger_threshold,
            config.status.clone(),
            rate,
        )
        .with_regeneration(player.regen_spec());
        let director =
            EncounterDirector::new(config.director.clone(), catalog, Vec3::ZERO, rate);

        let mut actors = BTreeMap::new();
        actors.insert(ActorId::PLAYER, Actor::player(status));

        Self {
            config,
            rate,
            now: Tick::ZERO,
            actors,
            next_id: 1,
            player: PlayerCombat::default(),
            director,
            directed: BTreeSet::new(),
            dying: BTreeSet::new(),
            timers: Timers::new(),
            marks: MarkLedger::new(),
            rng: SimRng::new(seed),
            events: Vec::new(),
        }
    }

    /// Centre of the spawn disc used by the director.
    pub fn with_spawn_anchor(mut self, anchor: Vec3) -> Self {
        self.director.set_anchor(anchor);
        self
    }

    /// Starts wave generation. Calling it twice has no further effect.
    pub fn start(&mut self, env: &CombatEnv<'_>) {
        if let Some(player) = self.actors.get(&ActorId::PLAYER) {
            env.status().set_health_bar(
                ActorId::PLAYER,
                player.status.health(),
                player.status.max_health(),
            );
        }
        self.director.start(self.now, &mut self.rng);
        self.forward_director_events();
        tracing::info!(tick = %self.now, wave = self.director.wave(), "encounter started");
    }

    // ===== accessors =====

    pub fn now(&self) -> Tick {
        self.now
    }

    pub fn tick_rate(&self) -> TickRate {
        self.rate
    }

    pub fn config(&self) -> &CombatConfig {
        &self.config
    }

    pub fn actor(&self, id: ActorId) -> Option<&Actor> {
        self.actors.get(&id)
    }

    /// Direct access for hosts that toggle status flags (cheats, cutscenes).
    pub fn actor_mut(&mut self, id: ActorId) -> Option<&mut Actor> {
        self.actors.get_mut(&id)
    }

    pub fn actors(&self) -> impl Iterator<Item = &Actor> {
        self.actors.values()
    }

    pub fn living_enemies(&self) -> usize {
        self.actors
            .values()
            .filter(|actor| actor.tag == ActorTag::Enemy && actor.is_alive())
            .count()
    }

    pub fn player(&self) -> &PlayerCombat {
        &self.player
    }

    pub fn player_status(&self) -> Option<&StatusEngine> {
        self.actors.get(&ActorId::PLAYER).map(|actor| &actor.status)
    }

    pub fn is_player_alive(&self) -> bool {
        self.is_alive(ActorId::PLAYER)
    }

    pub fn director(&self) -> &EncounterDirector {
        &self.director
    }

    pub fn marks(&self) -> &MarkLedger {
        &self.marks
    }

    pub fn drain_events(&mut self) -> Vec<CombatEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn snapshot(&self) -> WorldSnapshot {
        let player = self.player_status().map(|status| PlayerSnapshot {
            health: status.health(),
            max_health: status.max_health(),
            alive: status.is_alive(),
            invulnerable: status.is_invulnerable(),
            stance: self.player.stance(),
            souls: self.player.souls(),
            charges: self.player.charges(&self.config.player),
        });
        WorldSnapshot {
            tick: self.now,
            wave: self.director.wave(),
            enemies_spawned: self.director.enemies_spawned(),
            enemies_defeated: self.director.enemies_defeated(),
            pending_spawns: self.director.pending(),
            player: player.unwrap_or(PlayerSnapshot {
                health: 0.0,
                max_health: self.config.player.max_health,
                alive: false,
                invulnerable: false,
                stance: self.player.stance(),
                souls: self.player.souls(),
                charges: 0,
            }),
            enemies: self
                .actors
                .values()
                .filter(|actor| actor.tag == ActorTag::Enemy)
                .map(|actor| ActorSnapshot {
                    id: actor.id,
                    name: actor.name().to_owned(),
                    health: actor.status.health(),
                    max_health: actor.status.max_health(),
                    alive: actor.is_alive(),
                    state: actor.behavior.as_ref().map(BehaviorStateMachine::state),
                })
                .collect(),
        }
    }

    // ===== simulation =====

    /// Advances the whole encounter by one tick.
    pub fn tick(&mut self, env: &CombatEnv<'_>) {
        self.now = self.now + 1;
        let now = self.now;
        let _span = tracing::trace_span!("tick", tick = now.0).entered();

        for actor in self.actors.values_mut() {
            actor.status.advance(now, env.status());
        }
        self.pump_status(env);

        let enemies: Vec<ActorId> = self
            .actors
            .iter()
            .filter(|(_, actor)| actor.behavior.is_some())
            .map(|(id, _)| *id)
            .collect();
        for id in enemies {
            let target = self.target(env);
            let outputs = {
                let Some(behavior) = self.actors.get_mut(&id).and_then(|a| a.behavior.as_mut())
                else {
                    continue;
                };
                let ctx = BehaviorContext {
                    me: id,
                    now,
                    rate: self.rate,
                    env,
                    target,
                };
                behavior.tick(&ctx);
                behavior.drain_outputs()
            };
            self.apply_outputs(id, outputs, env);
            self.pump_status(env);
        }

        if self.is_player_alive() {
            let player_position = self.target(env).map(|target| target.position);
            if let Some(order) = self.director.tick(now, env, &mut self.rng, player_position) {
                let id = self.instantiate(order, env);
                self.directed.insert(id);
            }
        }
        self.forward_director_events();

        for (_, timer) in self.timers.advance(now) {
            match timer {
                WorldTimer::Despawn(id) => self.despawn(id, env),
                WorldTimer::MarksExpired(source) => self.lift_marks(source, env),
            }
        }
        self.pump_status(env);
    }

    /// Spawns an enemy outside director control. It never counts towards
    /// wave accounting.
    pub fn spawn(
        &mut self,
        archetype: Arc<Archetype>,
        position: Vec3,
        env: &CombatEnv<'_>,
    ) -> ActorId {
        self.instantiate(
            SpawnOrder {
                archetype,
                position,
            },
            env,
        )
    }

    /// Damage from a source outside the combat loop (hazards, scripted hits).
    pub fn apply_damage(
        &mut self,
        source: ActorId,
        target: ActorId,
        amount: f32,
        env: &CombatEnv<'_>,
    ) -> Option<DamageOutcome> {
        let outcome = self.damage_actor(source, target, amount, env);
        self.pump_status(env);
        outcome
    }

    /// A projectile launched by `owner` reached `target`.
    pub fn report_projectile_hit(
        &mut self,
        owner: ActorId,
        target: ActorId,
        damage: f32,
        env: &CombatEnv<'_>,
    ) -> Option<DamageOutcome> {
        let outcome = self.apply_hit(owner, target, damage, None, 1, env);
        self.pump_status(env);
        outcome
    }

    /// A knocked-back actor hit something solid.
    ///
    /// While the knockback window is armed the stored damage is dealt to the
    /// actor and, as collateral, to `other` when it is a living enemy. Returns
    /// the damage dealt, or `None` if the window was not armed.
    pub fn report_knockback_collision(
        &mut self,
        actor: ActorId,
        other: Option<ActorId>,
        env: &CombatEnv<'_>,
    ) -> Option<f32> {
        let damage = self
            .actors
            .get_mut(&actor)?
            .status
            .knockback_collision(env.status())?;

        let collateral = other.filter(|other| {
            *other != actor
                && self
                    .actors
                    .get(other)
                    .is_some_and(|a| a.tag == ActorTag::Enemy && a.is_alive())
        });
        if let Some(other) = collateral {
            self.damage_actor(actor, other, damage, env);
        }
        tracing::debug!(%actor, ?collateral, damage, "knockback collision");
        self.pump_status(env);
        Some(damage)
    }

    // ===== player actions =====

    /// Swings at everything in front of the player.
    ///
    /// The stance effect lands before the damage. Each enemy hit earns souls.
    pub fn player_attack(&mut self, env: &CombatEnv<'_>) -> Result<Vec<ActorId>, PlayerActionError> {
        self.ensure_player_alive()?;
        let scene = env.scene();
        let Some(position) = scene.position(ActorId::PLAYER) else {
            return Ok(Vec::new());
        };
        let cfg = &self.config.player;
        let center = position + scene.rotation(ActorId::PLAYER) * Vec3::new(0.0, 0.0, cfg.attack_reach);
        let (damage, radius) = (cfg.attack_damage, cfg.attack_radius);
        let effect = self.player.stance().attack_effect(cfg);

        env.cues().cue(
            ActorId::PLAYER,
            Cue::Attack {
                name: "player_attack".into(),
            },
        );
        let hits: Vec<ActorId> = env
            .spatial()
            .overlap(&Region::sphere(center, radius), TagMask::ENEMY)
            .into_iter()
            .filter(|id| self.is_alive(*id))
            .collect();

        for &target in &hits {
            self.apply_hit(ActorId::PLAYER, target, damage, effect, 1, env);
            self.player
                .gain_souls(self.config.player.souls_per_hit, &self.config.player);
        }
        if !hits.is_empty() {
            self.push_souls();
        }
        tracing::debug!(stance = %self.player.stance(), hits = hits.len(), "player attack");
        self.pump_status(env);
        Ok(hits)
    }

    /// Spends every soul on the current stance's area special.
    pub fn player_special(
        &mut self,
        env: &CombatEnv<'_>,
    ) -> Result<Vec<ActorId>, PlayerActionError> {
        self.ensure_player_alive()?;
        let charges = self.player.charges(&self.config.player);
        if charges == 0 {
            return Err(PlayerActionError::NoCharges {
                souls: self.player.souls(),
            });
        }
        let Some(position) = env.scene().position(ActorId::PLAYER) else {
            return Ok(Vec::new());
        };

        let region = Region::sphere(position, self.config.player.special_radius);
        let targets: SpecialTargets = env
            .spatial()
            .overlap(&region, TagMask::ENEMY)
            .into_iter()
            .filter(|id| self.is_alive(*id))
            .take(CombatConfig::MAX_SPECIAL_TARGETS)
            .collect();

        let stance = self.player.stance();
        let charges = self.player.spend_all(&self.config.player);
        let cfg = self.config.player.clone();
        let ui = env.status();

        match stance {
            Stance::Vampire => {
                let spec = cfg.special_bleed(charges).healing(ActorId::PLAYER);
                for id in &targets {
                    if let Some(actor) = self.actors.get_mut(id) {
                        actor.status.bleed(spec, ui);
                    }
                }
            }
            Stance::Orc => {
                let effect = SecondaryEffect::Knockback {
                    damage: cfg.knockback_damage,
                    force: cfg.knockback_force,
                };
                for &id in &targets {
                    self.apply_effect(ActorId::PLAYER, id, effect, charges, env);
                }
            }
            Stance::Ghost => {
                for id in &targets {
                    if let Some(actor) = self.actors.get_mut(id) {
                        actor.status.mark(cfg.mark_increase, ui);
                    }
                }
                self.record_marks(
                    ActorId::PLAYER,
                    targets.iter().copied().collect(),
                    cfg.mark_duration,
                    env,
                );
            }
        }

        tracing::info!(%stance, charges, targets = targets.len(), "player special");
        self.events.push(CombatEvent::SpecialUsed {
            stance,
            charges,
            targets: targets.to_vec(),
        });
        self.push_souls();
        self.pump_status(env);
        Ok(targets.to_vec())
    }

    /// Brief invulnerability on a cooldown. Returns the tick it ends.
    pub fn dodge(&mut self) -> Result<Tick, PlayerActionError> {
        self.ensure_player_alive()?;
        let ready_at = self.player.dodge_ready_at();
        if self.now < ready_at {
            return Err(PlayerActionError::DodgeCooling {
                remaining_ticks: ready_at.since(self.now),
            });
        }
        let cfg = &self.config.player;
        let until = self.now + self.rate.ticks(cfg.dodge_secs);
        let ready_at = self.now + self.rate.ticks(cfg.dodge_cooldown);
        let dodge_secs = cfg.dodge_secs;

        if let Some(player) = self.actors.get_mut(&ActorId::PLAYER) {
            player.status.grant_invulnerability(dodge_secs);
        }
        self.player.set_dodge_ready_at(ready_at);
        self.events.push(CombatEvent::Dodged { until });
        Ok(until)
    }

    pub fn set_stance(&mut self, stance: Stance) {
        if self.player.stance() == stance {
            return;
        }
        self.player.set_stance(stance);
        tracing::debug!(%stance, "stance changed");
        self.events.push(CombatEvent::StanceChanged { stance });
    }

    /// Steps to the next (or previous) stance and returns it.
    pub fn cycle_stance(&mut self, forward: bool) -> Stance {
        let current = self.player.stance();
        let stance = if forward {
            current.next()
        } else {
            current.previous()
        };
        self.set_stance(stance);
        stance
    }

    // ===== internals =====

    fn is_alive(&self, id: ActorId) -> bool {
        self.actors.get(&id).is_some_and(Actor::is_alive)
    }

    fn ensure_player_alive(&self) -> Result<(), PlayerActionError> {
        if self.is_player_alive() {
            Ok(())
        } else {
            Err(PlayerActionError::PlayerDead)
        }
    }

    fn push_souls(&mut self) {
        self.events.push(CombatEvent::SoulsChanged {
            souls: self.player.souls(),
            charges: self.player.charges(&self.config.player),
        });
    }

    /// The player as seen by enemy behavior, `None` once dead or unplaced.
    fn target(&self, env: &CombatEnv<'_>) -> Option<Target> {
        if !self.is_player_alive() {
            return None;
        }
        let position = env.scene().position(ActorId::PLAYER)?;
        Some(Target {
            id: ActorId::PLAYER,
            position,
            velocity: env.navigator().velocity(ActorId::PLAYER),
        })
    }

    fn instantiate(&mut self, order: SpawnOrder, env: &CombatEnv<'_>) -> ActorId {
        let SpawnOrder {
            archetype,
            position,
        } = order;
        let id = ActorId(self.next_id);
        self.next_id += 1;

        let ui = env.status();
        let mut status = StatusEngine::new(
            id,
            archetype.max_health,
            archetype.stagger_threshold(),
            self.config.status.clone(),
            self.rate,
        );
        status.advance(self.now, ui);
        let behavior = BehaviorStateMachine::new(
            id,
            Arc::clone(&archetype),
            self.rng.fork(id, 0),
            self.now,
            self.rate,
        );

        env.scene().instantiate(&SpawnRequest {
            id,
            tag: ActorTag::Enemy,
            archetype: archetype.name.clone(),
            position,
            move_speed: archetype.move_speed,
        });
        ui.set_health_bar(id, status.health(), status.max_health());

        tracing::info!(actor = %id, archetype = %archetype.name, ?position, "enemy spawned");
        self.events.push(CombatEvent::Spawned {
            actor: id,
            archetype: archetype.name.clone(),
            position,
        });
        self.actors
            .insert(id, Actor::enemy(id, archetype, status, behavior));
        id
    }

    fn forward_director_events(&mut self) {
        self.events.extend(
            self.director
                .drain_events()
                .into_iter()
                .map(CombatEvent::Director),
        );
    }

    /// Drains status events until every engine is quiet.
    ///
    /// Handlers can raise new status events (lifesteal heals, collateral
    /// deaths), hence the loop.
    fn pump_status(&mut self, env: &CombatEnv<'_>) {
        loop {
            let batch: Vec<(ActorId, StatusEvent)> = self
                .actors
                .iter_mut()
                .flat_map(|(id, actor)| {
                    let id = *id;
                    actor
                        .status
                        .drain_events()
                        .into_iter()
                        .map(move |event| (id, event))
                })
                .collect();
            if batch.is_empty() {
                return;
            }
            for (actor, event) in batch {
                self.on_status_event(actor, event, env);
            }
        }
    }

    fn on_status_event(&mut self, actor: ActorId, event: StatusEvent, env: &CombatEnv<'_>) {
        self.events.push(CombatEvent::Status {
            actor,
            event: event.clone(),
        });
        match event {
            StatusEvent::Staggered { .. } => self.on_staggered(actor, env),
            StatusEvent::Died => self.on_died(actor, env),
            StatusEvent::Lifesteal { target, amount } => {
                if let Some(healed) = self.actors.get_mut(&target) {
                    healed.status.heal(amount, env.status());
                }
            }
            StatusEvent::KnockbackEnded => env.scene().halt(actor),
            _ => {}
        }
    }

    fn on_staggered(&mut self, id: ActorId, env: &CombatEnv<'_>) {
        if id.is_player() {
            env.cues().cue(id, Cue::Stagger);
            return;
        }
        let target = self.target(env);
        let now = self.now;
        let rate = self.rate;
        let outputs = {
            let Some(behavior) = self.actors.get_mut(&id).and_then(|a| a.behavior.as_mut()) else {
                return;
            };
            behavior.on_staggered(&BehaviorContext {
                me: id,
                now,
                rate,
                env,
                target,
            });
            behavior.drain_outputs()
        };
        self.apply_outputs(id, outputs, env);
    }

    /// Death pipeline. Runs at most once per actor.
    fn on_died(&mut self, id: ActorId, env: &CombatEnv<'_>) {
        if id.is_player() {
            tracing::info!(tick = %self.now, "player died");
            env.cues().cue(id, Cue::Death);
            self.events.push(CombatEvent::PlayerDied);
            return;
        }
        if !self.dying.insert(id) {
            return;
        }

        let target = self.target(env);
        let now = self.now;
        let rate = self.rate;
        let Some(actor) = self.actors.get_mut(&id) else {
            return;
        };
        let delay = actor
            .archetype
            .as_ref()
            .map_or(0.0, |archetype| archetype.death_delay);
        let outputs = match actor.behavior.as_mut() {
            Some(behavior) => {
                behavior.on_died(&BehaviorContext {
                    me: id,
                    now,
                    rate,
                    env,
                    target,
                });
                behavior.drain_outputs()
            }
            None => Vec::new(),
        };
        let name = actor.name().to_owned();

        self.apply_outputs(id, outputs, env);
        self.marks.forget(id);
        let handle = self
            .timers
            .schedule(now, self.rate.ticks(delay), WorldTimer::Despawn(id));
        tracing::info!(actor = %id, %name, despawn_at = %handle.due(), "enemy died");
    }

    fn despawn(&mut self, id: ActorId, env: &CombatEnv<'_>) {
        let Some(actor) = self.actors.remove(&id) else {
            return;
        };
        self.dying.remove(&id);

        if let Some(explosion) = actor.archetype.as_ref().and_then(|a| a.explosive) {
            self.explode(id, explosion, env);
        }
        if self.directed.remove(&id) {
            // Over-counting is logged and clamped inside the director.
            if let Err(error) = self.director.record_defeat() {
                tracing::debug!(actor = %id, %error, "defeat count clamped");
            }
        }
        env.scene().despawn(id);
        tracing::debug!(actor = %id, "despawned");
        self.events.push(CombatEvent::Despawned { actor: id });
    }

    fn explode(&mut self, id: ActorId, explosion: Explosion, env: &CombatEnv<'_>) {
        let Some(position) = env.scene().position(id) else {
            tracing::warn!(actor = %id, "exploding actor has no position");
            return;
        };
        env.cues().cue(id, Cue::Explosion);

        let region = Region::sphere(position, explosion.radius);
        let mut victims = Vec::new();
        for victim in env.spatial().overlap(&region, explosion.affects) {
            if victim == id || !self.is_alive(victim) {
                continue;
            }
            self.damage_actor(id, victim, explosion.damage, env);
            victims.push(victim);
        }
        tracing::debug!(actor = %id, victims = victims.len(), "explosion");
        self.events.push(CombatEvent::Exploded {
            actor: id,
            position,
            victims,
        });
    }

    fn apply_outputs(&mut self, source: ActorId, outputs: Vec<BehaviorOutput>, env: &CombatEnv<'_>) {
        for output in outputs {
            match output {
                BehaviorOutput::Telegraphed { attack } => {
                    self.events.push(CombatEvent::Telegraphed {
                        actor: source,
                        attack,
                    });
                }
                BehaviorOutput::StateChanged { from, to } => {
                    self.events.push(CombatEvent::BehaviorChanged {
                        actor: source,
                        from,
                        to,
                    });
                }
                BehaviorOutput::Hit {
                    target,
                    damage,
                    secondary,
                } => {
                    self.apply_hit(source, target, damage, secondary, 1, env);
                }
            }
        }
    }

    /// Secondary effect first, then damage.
    fn apply_hit(
        &mut self,
        source: ActorId,
        target: ActorId,
        damage: f32,
        secondary: Option<SecondaryEffect>,
        charges: u32,
        env: &CombatEnv<'_>,
    ) -> Option<DamageOutcome> {
        if !self.is_alive(target) {
            return None;
        }
        if let Some(effect) = secondary {
            self.apply_effect(source, target, effect, charges, env);
        }
        self.damage_actor(source, target, damage, env)
    }

    fn damage_actor(
        &mut self,
        source: ActorId,
        target: ActorId,
        amount: f32,
        env: &CombatEnv<'_>,
    ) -> Option<DamageOutcome> {
        let actor = self.actors.get_mut(&target)?;
        if !actor.is_alive() {
            return None;
        }
        let outcome = actor.status.damage(amount, env.status());
        if outcome.applied > 0.0 {
            self.events.push(CombatEvent::Hit {
                source,
                target,
                damage: outcome.applied,
            });
        }
        Some(outcome)
    }

    fn apply_effect(
        &mut self,
        source: ActorId,
        target: ActorId,
        effect: SecondaryEffect,
        charges: u32,
        env: &CombatEnv<'_>,
    ) {
        let ui = env.status();
        let Some(actor) = self.actors.get_mut(&target) else {
            return;
        };
        match effect {
            SecondaryEffect::Bleed {
                damage_per_tick,
                ticks,
                interval,
            } => {
                let spec = BleedSpec::regular(damage_per_tick, ticks, interval).healing(source);
                actor.status.bleed(spec, ui);
            }
            SecondaryEffect::Knockback { damage, force } => {
                let Some(force) = actor.status.knockback(damage, force, charges, ui) else {
                    return;
                };
                let scene = env.scene();
                if let (Some(from), Some(to)) = (scene.position(source), scene.position(target)) {
                    let direction = flat_direction(from, to).unwrap_or(Vec3::Z);
                    scene.apply_impulse(target, direction * force);
                }
            }
            SecondaryEffect::Mark { increase, duration } => {
                actor.status.mark(increase, ui);
                self.record_marks(source, BTreeSet::from([target]), duration, env);
            }
        }
    }

    /// Replaces `source`'s mark batch, lifting marks it no longer covers
    /// unless another source still marks the same actor.
    fn record_marks(
        &mut self,
        source: ActorId,
        targets: BTreeSet<ActorId>,
        duration: f32,
        env: &CombatEnv<'_>,
    ) {
        if let Some(previous) = self.marks.take(source) {
            self.timers.cancel(previous.expiry);
            for stale in previous.targets.difference(&targets) {
                self.unmark(*stale, env);
            }
        }
        if targets.is_empty() {
            return;
        }
        let expiry = self.timers.schedule(
            self.now,
            self.rate.ticks(duration),
            WorldTimer::MarksExpired(source),
        );
        self.marks.record(source, targets, expiry);
    }

    fn lift_marks(&mut self, source: ActorId, env: &CombatEnv<'_>) {
        let Some(entry) = self.marks.take(source) else {
            return;
        };
        for target in entry.targets {
            self.unmark(target, env);
        }
    }

    /// Clears `target`'s multiplier once no ledger entry covers it.
    fn unmark(&mut self, target: ActorId, env: &CombatEnv<'_>) {
        if self.marks.is_marked(target) {
            return;
        }
        if let Some(actor) = self.actors.get_mut(&target) {
            actor.status.remove_mark(env.status());
        }
    }
}

#[cfg(test)]
mod tests;
