//! High-level runtime orchestrator.
//!
//! The runtime owns the simulation worker, wires up command/event channels,
//! and exposes a builder-based API for clients to drive the encounter.

use combat_core::{ArchetypeCatalog, CombatConfig, CombatWorld, WorldSnapshot};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::api::{PlayerController, PlayerIntent, Result, RuntimeError, RuntimeHandle};
use crate::arena::{ArenaConfig, OpenArena};
use crate::events::EventBus;
use crate::workers::{Command, SimulationWorker};

/// Runtime configuration shared across the orchestrator and workers.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub combat: CombatConfig,
    pub arena: ArenaConfig,
    /// Root seed for every random roll in the encounter.
    pub seed: u64,
    /// Advance the world on a wall-clock interval instead of only on `step`.
    pub realtime: bool,
    pub event_buffer_size: usize,
    pub command_buffer_size: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            combat: CombatConfig::default(),
            arena: ArenaConfig::default(),
            seed: 0,
            realtime: false,
            event_buffer_size: 100,
            command_buffer_size: 32,
        }
    }
}

/// Main runtime that orchestrates the encounter
///
/// Design: Runtime owns the worker and the optional player controller.
/// [`RuntimeHandle`] provides a cloneable façade for clients.
pub struct Runtime {
    handle: RuntimeHandle,
    player_controller: Option<Box<dyn PlayerController>>,
    sim_worker_handle: JoinHandle<()>,
}

impl Runtime {
    /// Create a new runtime builder
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Get a cloneable handle to this runtime
    ///
    /// The handle can be shared across clients and async tasks.
    pub fn handle(&self) -> RuntimeHandle {
        self.handle.clone()
    }

    /// Start wave generation.
    pub async fn start(&self) -> Result<WorldSnapshot> {
        self.handle.start().await
    }

    /// Let the player controller act, then advance `ticks` fixed steps.
    ///
    /// Refused actions (no charges, dodge cooling down) are skipped.
    pub async fn step(&mut self, ticks: u32) -> Result<WorldSnapshot> {
        if let Some(controller) = self.player_controller.as_ref() {
            let snapshot = self.handle.snapshot().await?;
            for intent in controller.decide(&snapshot).await? {
                match apply_intent(&self.handle, &intent).await {
                    Err(error) if error.is_refused_action() => {
                        debug!(?intent, %error, "player intent refused");
                    }
                    other => other?,
                }
            }
        }
        self.handle.step(ticks).await
    }

    /// Step until the player dies or `max_ticks` have elapsed.
    pub async fn run(&mut self, ticks_per_step: u32, max_ticks: u64) -> Result<WorldSnapshot> {
        let ticks_per_step = ticks_per_step.max(1);
        let mut snapshot = self.handle.snapshot().await?;
        let deadline = snapshot.tick.0.saturating_add(max_ticks);
        while snapshot.player.alive && snapshot.tick.0 < deadline {
            let remaining = deadline - snapshot.tick.0;
            let ticks = u32::try_from(remaining).map_or(ticks_per_step, |r| r.min(ticks_per_step));
            snapshot = self.step(ticks).await?;
        }
        Ok(snapshot)
    }

    /// Set the player controller
    pub fn set_player_controller(&mut self, controller: impl PlayerController + 'static) {
        self.player_controller = Some(Box::new(controller));
    }

    /// Shutdown the runtime gracefully
    pub async fn shutdown(self) -> Result<()> {
        match self.handle.shutdown().await {
            Ok(()) | Err(RuntimeError::CommandChannelClosed) => {}
            Err(error) => return Err(error),
        }
        drop(self.handle);

        self.sim_worker_handle
            .await
            .map_err(RuntimeError::WorkerJoin)?;
        info!("runtime shut down");
        Ok(())
    }
}

async fn apply_intent(handle: &RuntimeHandle, intent: &PlayerIntent) -> Result<()> {
    match intent {
        PlayerIntent::Attack => handle.player_attack().await.map(drop),
        PlayerIntent::Special => handle.player_special().await.map(drop),
        PlayerIntent::Dodge => handle.dodge().await.map(drop),
        PlayerIntent::SetStance(stance) => handle.set_stance(*stance).await,
        PlayerIntent::CycleStance { forward } => handle.cycle_stance(*forward).await.map(drop),
        PlayerIntent::MoveTo(destination) => handle.move_player(*destination).await,
        PlayerIntent::Engage { approach } => handle.engage(*approach).await.map(drop),
    }
}

/// Builder for [`Runtime`] with flexible configuration.
pub struct RuntimeBuilder {
    config: RuntimeConfig,
    catalog: Option<ArchetypeCatalog>,
    player_controller: Option<Box<dyn PlayerController>>,
}

impl RuntimeBuilder {
    fn new() -> Self {
        Self {
            config: RuntimeConfig::default(),
            catalog: None,
            player_controller: None,
        }
    }

    /// Override runtime configuration
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Override combat tuning only
    pub fn combat_config(mut self, combat: CombatConfig) -> Self {
        self.config.combat = combat;
        self
    }

    pub fn arena(mut self, arena: ArenaConfig) -> Self {
        self.config.arena = arena;
        self
    }

    /// Archetypes the director may draw from. Defaults to the standard roster.
    pub fn catalog(mut self, catalog: ArchetypeCatalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = seed;
        self
    }

    pub fn realtime(mut self, realtime: bool) -> Self {
        self.config.realtime = realtime;
        self
    }

    /// Set player controller (optional)
    pub fn player_controller(mut self, controller: impl PlayerController + 'static) -> Self {
        self.player_controller = Some(Box::new(controller));
        self
    }

    /// Build the runtime and spawn its worker
    ///
    /// Must be called from within a tokio runtime.
    pub async fn build(self) -> Result<Runtime> {
        if self.config.event_buffer_size == 0 {
            return Err(RuntimeError::InvalidConfig("event_buffer_size must be positive"));
        }
        if self.config.command_buffer_size == 0 {
            return Err(RuntimeError::InvalidConfig("command_buffer_size must be positive"));
        }

        let catalog = self.catalog.unwrap_or_else(ArchetypeCatalog::standard);
        let arena = OpenArena::new(self.config.arena.clone());
        let world = CombatWorld::new(self.config.combat.clone(), catalog, self.config.seed)
            .with_spawn_anchor(self.config.arena.player_start);

        let (command_tx, command_rx) = mpsc::channel::<Command>(self.config.command_buffer_size);
        let event_bus = EventBus::with_capacity(self.config.event_buffer_size);

        let handle = RuntimeHandle::new(command_tx, event_bus.clone());

        let sim_worker = SimulationWorker::new(
            world,
            arena,
            command_rx,
            event_bus,
            self.config.realtime,
        );

        let sim_worker_handle = tokio::spawn(async move {
            sim_worker.run().await;
        });

        Ok(Runtime {
            handle,
            player_controller: self.player_controller,
            sim_worker_handle,
        })
    }
}
