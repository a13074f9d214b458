//! Actor identity, targeting tags and the per-actor record held by the world.
use std::fmt;
use std::sync::Arc;

use bitflags::bitflags;

use crate::behavior::{Archetype, BehaviorStateMachine};
use crate::status::StatusEngine;

/// Unique identifier for any combat participant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActorId(pub u32);

impl ActorId {
    /// Reserved identifier for the player character.
    pub const PLAYER: Self = Self(0);

    #[inline]
    pub const fn is_player(self) -> bool {
        self.0 == Self::PLAYER.0
    }
}

impl Default for ActorId {
    fn default() -> Self {
        Self::PLAYER
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Targeting tag carried by every actor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::IntoStaticStr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ActorTag {
    Player,
    Enemy,
}

impl ActorTag {
    pub fn mask(self) -> TagMask {
        match self {
            Self::Player => TagMask::PLAYER,
            Self::Enemy => TagMask::ENEMY,
        }
    }
}

bitflags! {
    /// Set of tags an overlap query or area effect applies to.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct TagMask: u8 {
        const PLAYER = 1 << 0;
        const ENEMY = 1 << 1;
        const ALL = Self::PLAYER.bits() | Self::ENEMY.bits();
    }
}

impl TagMask {
    pub fn matches(self, tag: ActorTag) -> bool {
        self.contains(tag.mask())
    }
}

impl Default for TagMask {
    fn default() -> Self {
        Self::PLAYER
    }
}

/// A combat participant: identity, tag, health and (for enemies) behavior.
///
/// Position and orientation live in the scene collaborator and are looked up
/// by id, never stored here.
#[derive(Debug)]
pub struct Actor {
    pub id: ActorId,
    pub tag: ActorTag,
    pub status: StatusEngine,
    pub archetype: Option<Arc<Archetype>>,
    pub behavior: Option<BehaviorStateMachine>,
}

impl Actor {
    pub fn player(status: StatusEngine) -> Self {
        Self {
            id: ActorId::PLAYER,
            tag: ActorTag::Player,
            status,
            archetype: None,
            behavior: None,
        }
    }

    pub fn enemy(
        id: ActorId,
        archetype: Arc<Archetype>,
        status: StatusEngine,
        behavior: BehaviorStateMachine,
    ) -> Self {
        Self {
            id,
            tag: ActorTag::Enemy,
            status,
            archetype: Some(archetype),
            behavior: Some(behavior),
        }
    }

    pub fn is_alive(&self) -> bool {
        self.status.is_alive()
    }

    pub fn name(&self) -> &str {
        self.archetype
            .as_deref()
            .map(|archetype| archetype.name.as_str())
            .unwrap_or("player")
    }
}
