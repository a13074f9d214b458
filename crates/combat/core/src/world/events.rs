//! Events and read-only views published by the world.
use glam::Vec3;

use super::player::Stance;
use crate::actor::ActorId;
use crate::behavior::BehaviorState;
use crate::director::DirectorEvent;
use crate::status::StatusEvent;
use crate::time::Tick;

/// Everything observable that happened during a tick or player action.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CombatEvent {
    Status {
        actor: ActorId,
        event: StatusEvent,
    },
    Telegraphed {
        actor: ActorId,
        attack: String,
    },
    BehaviorChanged {
        actor: ActorId,
        from: BehaviorState,
        to: BehaviorState,
    },
    /// Direct damage landed on `target`, after its mark multiplier.
    Hit {
        source: ActorId,
        target: ActorId,
        damage: f32,
    },
    Spawned {
        actor: ActorId,
        archetype: String,
        position: Vec3,
    },
    Exploded {
        actor: ActorId,
        position: Vec3,
        victims: Vec<ActorId>,
    },
    Despawned {
        actor: ActorId,
    },
    PlayerDied,
    StanceChanged {
        stance: Stance,
    },
    SoulsChanged {
        souls: u32,
        charges: u32,
    },
    SpecialUsed {
        stance: Stance,
        charges: u32,
        targets: Vec<ActorId>,
    },
    Dodged {
        until: Tick,
    },
    Director(DirectorEvent),
}

impl CombatEvent {
    /// Whether the event belongs to wave pacing rather than moment-to-moment combat.
    pub fn is_encounter(&self) -> bool {
        matches!(
            self,
            Self::Director(_) | Self::Spawned { .. } | Self::Despawned { .. } | Self::PlayerDied
        )
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActorSnapshot {
    pub id: ActorId,
    pub name: String,
    pub health: f32,
    pub max_health: f32,
    pub alive: bool,
    /// `None` for the player.
    pub state: Option<BehaviorState>,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PlayerSnapshot {
    pub health: f32,
    pub max_health: f32,
    pub alive: bool,
    pub invulnerable: bool,
    pub stance: Stance,
    pub souls: u32,
    pub charges: u32,
}

/// Point-in-time view of the whole encounter.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WorldSnapshot {
    pub tick: Tick,
    pub wave: u32,
    pub enemies_spawned: u32,
    pub enemies_defeated: u32,
    pub pending_spawns: usize,
    pub player: PlayerSnapshot,
    /// Enemies in ascending id order.
    pub enemies: Vec<ActorSnapshot>,
}
