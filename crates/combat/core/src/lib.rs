//! Deterministic real-time combat encounter logic.
//!
//! `combat-core` owns the rules of a wave-based melee encounter: per-actor
//! health and status effects, enemy behavior state machines, wave pacing and
//! the player's stance kit. It performs no I/O. Hosts drive
//! [`world::CombatWorld`] one fixed tick at a time and hand it the scene
//! collaborators (navigation, physics queries, cues, UI) through
//! [`env::CombatEnv`].
pub mod actor;
pub mod behavior;
pub mod config;
pub mod director;
pub mod env;
pub mod error;
pub mod placement;
pub mod status;
pub mod time;
pub mod world;

#[cfg(test)]
mod testing;

pub use actor::{Actor, ActorId, ActorTag, TagMask};
pub use behavior::{
    Archetype, AttackDelivery, AttackMode, AttackProfile, AttackSelection, BehaviorContext,
    BehaviorOutput, BehaviorState, BehaviorStateMachine, Explosion, HitSuppression, HoldPolicy,
    Pursuit, SecondaryEffect, SpecialBehavior, SpecialKind, Target,
};
pub use config::{CombatConfig, DirectorConfig, PlayerConfig, StatusConfig};
pub use director::{
    ArchetypeCatalog, CatalogEntry, DirectorEvent, EncounterDirector, SpawnOrder, WavePlan,
    plan_wave,
};
pub use env::{
    CombatEnv, Cue, CueSink, HitShape, Navigator, ProjectileLaunch, Region, SceneGraph, SimRng,
    SpatialQuery, SpawnRequest, StatusIcon, StatusSink, compute_seed,
};
pub use error::{
    CatalogError, CombatError, DirectorError, ErrorSeverity, PlacementError, PlayerActionError,
};
pub use status::{BleedSpec, DamageOutcome, RegenSpec, StatusEngine, StatusEvent};
pub use time::{Tick, TickRate, TimerHandle, Timers};
pub use world::{
    ActorSnapshot, CombatEvent, CombatWorld, MarkLedger, PlayerCombat, PlayerSnapshot, Stance,
    WorldSnapshot,
};
