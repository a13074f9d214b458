//! Asynchronous abstraction for sourcing player intent.
//!
//! Runtime users plug in [`PlayerController`] implementations so the encounter
//! can run with human input, scripted fixtures, or simple bots.
use async_trait::async_trait;
use combat_core::{BehaviorState, Stance, WorldSnapshot};
use glam::Vec3;

use super::errors::Result;

/// One thing the player wants to do before the next step.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerIntent {
    Attack,
    Special,
    Dodge,
    SetStance(Stance),
    CycleStance { forward: bool },
    MoveTo(Vec3),
    /// Face the nearest enemy, optionally walking into swing range.
    Engage { approach: bool },
}

/// Trait for deciding player intents from the current encounter snapshot.
///
/// Different implementations can handle:
/// - Player input (from UI/CLI)
/// - Scripted/replayed inputs
/// - Bots for headless runs and tests
#[async_trait]
pub trait PlayerController: Send + Sync {
    /// Intents to apply, in order, before the runtime steps the world.
    async fn decide(&self, snapshot: &WorldSnapshot) -> Result<Vec<PlayerIntent>>;
}

/// A controller that never acts.
pub struct IdleController;

#[async_trait]
impl PlayerController for IdleController {
    async fn decide(&self, _snapshot: &WorldSnapshot) -> Result<Vec<PlayerIntent>> {
        Ok(Vec::new())
    }
}

/// Bot that closes in on the nearest enemy and keeps swinging.
///
/// It spends charges as soon as it has one and then rotates to the next
/// stance. While hurt it dodges whenever an enemy winds up.
#[derive(Debug, Clone)]
pub struct BrawlerController {
    /// Health fraction below which the bot starts dodging.
    pub caution: f32,
}

impl Default for BrawlerController {
    fn default() -> Self {
        Self { caution: 0.5 }
    }
}

#[async_trait]
impl PlayerController for BrawlerController {
    async fn decide(&self, snapshot: &WorldSnapshot) -> Result<Vec<PlayerIntent>> {
        let player = &snapshot.player;
        let alive_enemies = snapshot.enemies.iter().filter(|enemy| enemy.alive).count();
        if !player.alive || alive_enemies == 0 {
            return Ok(Vec::new());
        }

        let mut intents = vec![PlayerIntent::Engage { approach: true }];
        let hurt = player.health < player.max_health * self.caution;
        let threatened = snapshot
            .enemies
            .iter()
            .any(|enemy| enemy.state == Some(BehaviorState::Charging));
        if hurt && threatened {
            intents.push(PlayerIntent::Dodge);
        }

        if player.charges > 0 {
            intents.push(PlayerIntent::Special);
            intents.push(PlayerIntent::CycleStance { forward: true });
        } else {
            intents.push(PlayerIntent::Attack);
        }
        Ok(intents)
    }
}
