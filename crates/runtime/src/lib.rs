//! Async host for the combat encounter.
//!
//! This crate wires a [`combat_core::CombatWorld`] to a reference arena, a
//! background worker and a topic-based event bus. Consumers embed [`Runtime`]
//! to step the encounter, plug in a player controller, and subscribe to
//! events through [`RuntimeHandle`].
//!
//! Modules are organized by responsibility:
//! - [`runtime`] hosts the orchestrator and builder
//! - [`api`] exposes the types downstream clients interact with
//! - [`events`] provides topic-based event bus for flexible event routing
//! - [`arena`] implements the collaborator traits over a flat open floor
//! - `workers` keeps background tasks internal to the crate
pub mod api;
pub mod arena;
pub mod events;
pub mod runtime;

mod workers;

pub use api::{
    BrawlerController, IdleController, PlayerController, PlayerIntent, Result, RuntimeError,
    RuntimeHandle,
};
pub use arena::{ArenaConfig, Obstacle, OpenArena, PhysicsReport};
pub use events::{Event, EventBus, TickedEvent, Topic};
pub use runtime::{Runtime, RuntimeBuilder, RuntimeConfig};
