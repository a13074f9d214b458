//! Payloads carried on the bus.
use combat_core::{CombatEvent, Tick};
use serde::{Deserialize, Serialize};

/// A world event stamped with the tick it was drained on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickedEvent {
    pub tick: Tick,
    pub event: CombatEvent,
}
