//! Encounter director: wave composition, spawn pacing and population accounting.
//!
//! The director does not create actors itself. Each tick it may hand the
//! world one [`SpawnOrder`]; the world instantiates the enemy and later
//! reports its removal through [`EncounterDirector::record_defeat`].
//!
//! A new wave is rolled only when the queue is empty, the wave timer has run
//! out and every spawned enemy of the current wave has been defeated
//! (`enemies_spawned == enemies_defeated`, exact equality).
mod catalog;
mod wave;

pub use catalog::{ArchetypeCatalog, CatalogEntry};
pub use wave::{WavePlan, plan_wave};

use std::collections::VecDeque;
use std::sync::Arc;

use glam::Vec3;

use crate::behavior::Archetype;
use crate::config::DirectorConfig;
use crate::env::{CombatEnv, SimRng};
use crate::error::{CombatError, DirectorError, PlacementError};
use crate::placement::{PlacementLimits, flat_distance, sample_point};
use crate::time::{Tick, TickRate};

/// An enemy the world should instantiate this tick.
#[derive(Clone, Debug, PartialEq)]
pub struct SpawnOrder {
    pub archetype: Arc<Archetype>,
    pub position: Vec3,
}

/// Notable director transitions, drained by the world.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DirectorEvent {
    WaveStarted {
        wave: u32,
        budget: u32,
        population: usize,
        leftover: u32,
    },
    /// The wave rolled nothing; the director moves on to the next one.
    WaveSkipped { wave: u32, budget: u32 },
    /// Placement ran out of attempts; the spawn is retried next tick.
    PlacementFailed { archetype: String, attempts: u32 },
}

#[derive(Debug)]
pub struct EncounterDirector {
    config: DirectorConfig,
    catalog: ArchetypeCatalog,
    rate: TickRate,
    anchor: Vec3,
    active: bool,
    wave: u32,
    pending: VecDeque<Arc<Archetype>>,
    spawn_interval: u64,
    next_spawn_at: Tick,
    wave_ends_at: Tick,
    enemies_spawned: u32,
    enemies_defeated: u32,
    total_defeated: u32,
    placement_failures: u32,
    events: Vec<DirectorEvent>,
}

impl EncounterDirector {
    /// Creates an idle director. Nothing spawns until [`start`](Self::start).
    pub fn new(config: DirectorConfig, catalog: ArchetypeCatalog, anchor: Vec3, rate: TickRate) -> Self {
        Self {
            config,
            catalog,
            rate,
            anchor,
            active: false,
            wave: 0,
            pending: VecDeque::new(),
            spawn_interval: 0,
            next_spawn_at: Tick::ZERO,
            wave_ends_at: Tick::ZERO,
            enemies_spawned: 0,
            enemies_defeated: 0,
            total_defeated: 0,
            placement_failures: 0,
            events: Vec::new(),
        }
    }

    /// Activates the director and rolls the first wave.
    pub fn start(&mut self, now: Tick, rng: &mut SimRng) {
        if self.active {
            return;
        }
        self.active = true;
        self.advance_wave(now, rng);
    }

    /// Moves the centre of the spawn disc.
    pub fn set_anchor(&mut self, anchor: Vec3) {
        self.anchor = anchor;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Current wave index, starting at 1 once started.
    pub fn wave(&self) -> u32 {
        self.wave
    }

    pub fn enemies_spawned(&self) -> u32 {
        self.enemies_spawned
    }

    /// Defeated enemies of the current wave (the HUD counter).
    pub fn enemies_defeated(&self) -> u32 {
        self.enemies_defeated
    }

    pub fn total_defeated(&self) -> u32 {
        self.total_defeated
    }

    /// Enemies spawned this wave and not yet defeated.
    pub fn outstanding(&self) -> u32 {
        self.enemies_spawned.saturating_sub(self.enemies_defeated)
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn catalog(&self) -> &ArchetypeCatalog {
        &self.catalog
    }

    /// Seconds over which the current wave is introduced.
    pub fn wave_duration(&self) -> f32 {
        self.config.wave_duration + self.config.wave_duration_increment * self.wave as f32
    }

    pub fn is_wave_cleared(&self) -> bool {
        self.pending.is_empty() && self.enemies_spawned == self.enemies_defeated
    }

    pub fn drain_events(&mut self) -> Vec<DirectorEvent> {
        std::mem::take(&mut self.events)
    }

    /// Counts one removed enemy.
    ///
    /// A defeat beyond the spawned count is an accounting bug somewhere else;
    /// the counter is clamped so the wave gate can still open.
    pub fn record_defeat(&mut self) -> Result<(), DirectorError> {
        self.enemies_defeated += 1;
        self.total_defeated += 1;
        if self.enemies_defeated > self.enemies_spawned {
            let error = DirectorError::StarvedWaveGeneration {
                spawned: self.enemies_spawned,
                defeated: self.enemies_defeated,
            };
            tracing::warn!(code = error.error_code(), %error, "clamping defeated count");
            self.enemies_defeated = self.enemies_spawned;
            self.total_defeated -= 1;
            return Err(error);
        }
        Ok(())
    }

    /// Runs spawn pacing for one tick.
    ///
    /// Returns at most one enemy to instantiate. When placement fails the
    /// archetype stays at the head of the queue and is retried next tick.
    pub fn tick(
        &mut self,
        now: Tick,
        env: &CombatEnv<'_>,
        rng: &mut SimRng,
        player: Option<Vec3>,
    ) -> Option<SpawnOrder> {
        if !self.active || now < self.next_spawn_at {
            return None;
        }

        let Some(archetype) = self.pending.front().cloned() else {
            if now >= self.wave_ends_at && self.enemies_spawned == self.enemies_defeated {
                self.advance_wave(now, rng);
            }
            return None;
        };

        match self.place(env, rng, player) {
            Ok(position) => {
                self.pending.pop_front();
                self.enemies_spawned += 1;
                self.placement_failures = 0;
                self.next_spawn_at = now + self.spawn_interval;
                tracing::debug!(
                    wave = self.wave,
                    archetype = %archetype.name,
                    ?position,
                    remaining = self.pending.len(),
                    "spawning"
                );
                Some(SpawnOrder {
                    archetype,
                    position,
                })
            }
            Err(error) => {
                self.placement_failures += 1;
                if self.placement_failures == 1 {
                    tracing::warn!(
                        code = error.error_code(),
                        archetype = %archetype.name,
                        %error,
                        "spawn placement failed, retrying"
                    );
                    let PlacementError::NoValidPoint { attempts } = error else {
                        return None;
                    };
                    self.events.push(DirectorEvent::PlacementFailed {
                        archetype: archetype.name.clone(),
                        attempts,
                    });
                } else {
                    tracing::trace!(failures = self.placement_failures, "spawn placement still failing");
                }
                None
            }
        }
    }

    /// Rolls the next wave and resets the per-wave counters.
    pub fn generate_wave(&mut self, now: Tick, rng: &mut SimRng) -> Result<WavePlan, DirectorError> {
        self.wave += 1;
        self.enemies_spawned = 0;
        self.enemies_defeated = 0;
        self.placement_failures = 0;

        let budget = self.config.budget_for(self.wave);
        let plan = plan_wave(
            &self.catalog,
            self.wave,
            budget,
            self.config.max_population,
            rng,
        );
        if plan.is_empty() {
            self.pending.clear();
            self.wave_ends_at = now;
            return Err(DirectorError::EmptyWave {
                wave: self.wave,
                budget,
            });
        }

        let duration = self.wave_duration();
        self.spawn_interval = self
            .rate
            .ticks(duration / plan.population() as f32)
            .max(1);
        self.wave_ends_at = now + self.rate.ticks(duration);
        self.pending = plan.spawns.iter().cloned().collect();
        Ok(plan)
    }

    fn advance_wave(&mut self, now: Tick, rng: &mut SimRng) {
        match self.generate_wave(now, rng) {
            Ok(plan) => {
                tracing::info!(
                    wave = self.wave,
                    population = plan.population(),
                    spent = plan.spent,
                    leftover = plan.leftover,
                    "wave generated"
                );
                self.events.push(DirectorEvent::WaveStarted {
                    wave: self.wave,
                    budget: plan.spent + plan.leftover,
                    population: plan.population(),
                    leftover: plan.leftover,
                });
            }
            Err(error) => {
                tracing::warn!(code = error.error_code(), %error, "skipping wave");
                if let DirectorError::EmptyWave { wave, budget } = error {
                    self.events.push(DirectorEvent::WaveSkipped { wave, budget });
                }
            }
        }
    }

    fn place(
        &self,
        env: &CombatEnv<'_>,
        rng: &mut SimRng,
        player: Option<Vec3>,
    ) -> Result<Vec3, PlacementError> {
        let limits = PlacementLimits {
            attempts: self.config.placement_attempts,
            nav_sample_distance: self.config.nav_sample_distance,
            clearance: self.config.spawn_clearance,
        };
        let anchor = self.anchor;
        let radius = self.config.spawn_radius;
        let min_distance = self.config.min_player_distance;
        sample_point(
            env,
            rng,
            limits,
            |rng| anchor + rng.point_in_disc(radius),
            |point| player.is_none_or(|player| flat_distance(point, player) >= min_distance),
        )
    }
}
