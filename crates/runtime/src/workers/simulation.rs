//! Simulation worker that owns the authoritative [`CombatWorld`].
//!
//! Receives commands from [`RuntimeHandle`](crate::RuntimeHandle), advances
//! the world against its [`OpenArena`], and publishes drained world events to
//! the EventBus.

use std::time::Duration;

use combat_core::behavior::look_at;
use combat_core::placement::{flat_direction, flat_distance};
use combat_core::{ActorId, ActorTag, CombatWorld, Stance, Tick, WorldSnapshot};
use glam::Vec3;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{Interval, MissedTickBehavior};
use tracing::{debug, info};

use crate::api::{Result, RuntimeError};
use crate::arena::OpenArena;
use crate::events::{Event, EventBus};

/// Commands that can be sent to the simulation worker
pub enum Command {
    /// Start wave generation.
    Start {
        reply: oneshot::Sender<WorldSnapshot>,
    },
    /// Advance the world by `ticks` fixed steps.
    Step {
        ticks: u32,
        reply: oneshot::Sender<WorldSnapshot>,
    },
    PlayerAttack {
        reply: oneshot::Sender<Result<Vec<ActorId>>>,
    },
    PlayerSpecial {
        reply: oneshot::Sender<Result<Vec<ActorId>>>,
    },
    SetStance {
        stance: Stance,
        reply: oneshot::Sender<()>,
    },
    CycleStance {
        forward: bool,
        reply: oneshot::Sender<Stance>,
    },
    Dodge {
        reply: oneshot::Sender<Result<Tick>>,
    },
    MovePlayer {
        destination: Vec3,
        reply: oneshot::Sender<()>,
    },
    /// Face the nearest living enemy, optionally walking into swing range.
    Engage {
        approach: bool,
        reply: oneshot::Sender<Option<ActorId>>,
    },
    /// Query the current encounter (read-only).
    Snapshot {
        reply: oneshot::Sender<WorldSnapshot>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

/// Background task that processes encounter commands.
///
/// In realtime mode the worker also advances the world on its own, one tick
/// per tick period, once the encounter has been started.
pub struct SimulationWorker {
    world: CombatWorld,
    arena: OpenArena,
    command_rx: mpsc::Receiver<Command>,
    event_bus: EventBus,
    realtime: bool,
    started: bool,
}

impl SimulationWorker {
    /// Creates a new simulation worker.
    pub fn new(
        world: CombatWorld,
        arena: OpenArena,
        command_rx: mpsc::Receiver<Command>,
        event_bus: EventBus,
        realtime: bool,
    ) -> Self {
        info!(
            tick_rate = world.tick_rate().0,
            realtime,
            arena_radius = arena.config().radius,
            "SimulationWorker initialized"
        );

        Self {
            world,
            arena,
            command_rx,
            event_bus,
            realtime,
            started: false,
        }
    }

    /// Main worker loop.
    pub async fn run(mut self) {
        let mut ticker = self.realtime.then(|| {
            let period = Duration::from_secs_f32(self.world.tick_rate().delta());
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            interval
        });

        loop {
            let ticking = self.started && ticker.is_some();
            tokio::select! {
                Some(cmd) = self.command_rx.recv() => {
                    if !self.handle_command(cmd) {
                        break;
                    }
                }
                _ = next_tick(&mut ticker), if ticking => {
                    self.step();
                }
                else => break,
            }
        }
        debug!(tick = %self.world.now(), "SimulationWorker stopped");
    }

    /// Returns `false` once the worker should stop.
    fn handle_command(&mut self, cmd: Command) -> bool {
        match cmd {
            Command::Start { reply } => {
                self.start();
                if reply.send(self.world.snapshot()).is_err() {
                    debug!("Start reply channel closed (caller dropped)");
                }
            }
            Command::Step { ticks, reply } => {
                for _ in 0..ticks {
                    self.step();
                }
                if reply.send(self.world.snapshot()).is_err() {
                    debug!("Step reply channel closed (caller dropped)");
                }
            }
            Command::PlayerAttack { reply } => {
                let result = self
                    .world
                    .player_attack(&self.arena.env())
                    .map_err(RuntimeError::from);
                self.publish_events();
                if reply.send(result).is_err() {
                    debug!("PlayerAttack reply channel closed (caller dropped)");
                }
            }
            Command::PlayerSpecial { reply } => {
                let result = self
                    .world
                    .player_special(&self.arena.env())
                    .map_err(RuntimeError::from);
                self.publish_events();
                if reply.send(result).is_err() {
                    debug!("PlayerSpecial reply channel closed (caller dropped)");
                }
            }
            Command::SetStance { stance, reply } => {
                self.world.set_stance(stance);
                self.publish_events();
                if reply.send(()).is_err() {
                    debug!("SetStance reply channel closed (caller dropped)");
                }
            }
            Command::CycleStance { forward, reply } => {
                let stance = self.world.cycle_stance(forward);
                self.publish_events();
                if reply.send(stance).is_err() {
                    debug!("CycleStance reply channel closed (caller dropped)");
                }
            }
            Command::Dodge { reply } => {
                let result = self.world.dodge().map_err(RuntimeError::from);
                self.publish_events();
                if reply.send(result).is_err() {
                    debug!("Dodge reply channel closed (caller dropped)");
                }
            }
            Command::MovePlayer { destination, reply } => {
                if self.world.is_player_alive() {
                    let env = self.arena.env();
                    env.navigator().set_destination(ActorId::PLAYER, destination);
                }
                if reply.send(()).is_err() {
                    debug!("MovePlayer reply channel closed (caller dropped)");
                }
            }
            Command::Engage { approach, reply } => {
                let target = self.engage(approach);
                if reply.send(target).is_err() {
                    debug!("Engage reply channel closed (caller dropped)");
                }
            }
            Command::Snapshot { reply } => {
                if reply.send(self.world.snapshot()).is_err() {
                    debug!("Snapshot reply channel closed (caller dropped)");
                }
            }
            Command::Shutdown { reply } => {
                if reply.send(()).is_err() {
                    debug!("Shutdown reply channel closed (caller dropped)");
                }
                return false;
            }
        }
        true
    }

    fn start(&mut self) {
        if self.started {
            return;
        }
        self.started = true;
        self.world.start(&self.arena.env());
        self.publish_events();
    }

    /// One fixed step: physics first, contacts reported, then the world tick.
    fn step(&mut self) {
        let report = self.arena.advance(self.world.tick_rate().delta());
        {
            let env = self.arena.env();
            for hit in report.projectile_hits {
                self.world
                    .report_projectile_hit(hit.owner, hit.target, hit.damage, &env);
            }
            for collision in report.collisions {
                self.world
                    .report_knockback_collision(collision.actor, collision.other, &env);
            }
            self.world.tick(&env);
        }
        self.publish_events();
    }

    fn engage(&self, approach: bool) -> Option<ActorId> {
        if !self.world.is_player_alive() {
            return None;
        }
        let env = self.arena.env();
        let scene = env.scene();
        let player = scene.position(ActorId::PLAYER)?;
        let (enemy, position) = self
            .world
            .actors()
            .filter(|actor| actor.tag == ActorTag::Enemy && actor.is_alive())
            .filter_map(|actor| scene.position(actor.id).map(|position| (actor.id, position)))
            .min_by(|(_, a), (_, b)| {
                flat_distance(*a, player).total_cmp(&flat_distance(*b, player))
            })?;

        look_at(&env, ActorId::PLAYER, position);
        if approach {
            let reach = self.world.config().player.attack_reach;
            let distance = flat_distance(player, position);
            match flat_direction(player, position) {
                Some(direction) if distance > reach => env
                    .navigator()
                    .set_destination(ActorId::PLAYER, player + direction * (distance - reach)),
                _ => env.navigator().stop(ActorId::PLAYER),
            }
        }
        Some(enemy)
    }

    fn publish_events(&mut self) {
        let tick = self.world.now();
        for event in self.world.drain_events() {
            self.event_bus.publish(Event::from_combat(tick, event));
        }
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}
