//! Cloneable façade for issuing commands to the runtime.
//!
//! [`RuntimeHandle`] hides channel plumbing and offers async helpers for
//! stepping the encounter, driving the player or streaming events from
//! specific topics.
use std::collections::HashMap;

use combat_core::{ActorId, Stance, Tick, WorldSnapshot};
use glam::Vec3;
use tokio::sync::{broadcast, mpsc, oneshot};

use super::errors::{Result, RuntimeError};
use crate::events::{Event, EventBus, Topic};
use crate::workers::Command;

/// Client-facing handle to interact with the runtime
#[derive(Clone)]
pub struct RuntimeHandle {
    command_tx: mpsc::Sender<Command>,
    event_bus: EventBus,
}

impl RuntimeHandle {
    pub(crate) fn new(command_tx: mpsc::Sender<Command>, event_bus: EventBus) -> Self {
        Self {
            command_tx,
            event_bus,
        }
    }

    async fn request<T>(&self, command: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.command_tx
            .send(command(reply_tx))
            .await
            .map_err(|_| RuntimeError::CommandChannelClosed)?;

        reply_rx.await.map_err(RuntimeError::ReplyChannelClosed)
    }

    /// Starts wave generation. Starting twice has no further effect.
    pub async fn start(&self) -> Result<WorldSnapshot> {
        self.request(|reply| Command::Start { reply }).await
    }

    /// Advance the encounter by `ticks` fixed steps and return the resulting snapshot
    pub async fn step(&self, ticks: u32) -> Result<WorldSnapshot> {
        self.request(|reply| Command::Step { ticks, reply }).await
    }

    /// Swing in the player's facing direction; returns the enemies hit
    pub async fn player_attack(&self) -> Result<Vec<ActorId>> {
        self.request(|reply| Command::PlayerAttack { reply }).await?
    }

    /// Spend every banked charge on the current stance's special
    pub async fn player_special(&self) -> Result<Vec<ActorId>> {
        self.request(|reply| Command::PlayerSpecial { reply }).await?
    }

    pub async fn set_stance(&self, stance: Stance) -> Result<()> {
        self.request(|reply| Command::SetStance { stance, reply }).await
    }

    pub async fn cycle_stance(&self, forward: bool) -> Result<Stance> {
        self.request(|reply| Command::CycleStance { forward, reply }).await
    }

    /// Dodge; returns the tick the invulnerability window closes
    pub async fn dodge(&self) -> Result<Tick> {
        self.request(|reply| Command::Dodge { reply }).await?
    }

    /// Walk the player toward `destination`
    pub async fn move_player(&self, destination: Vec3) -> Result<()> {
        self.request(|reply| Command::MovePlayer { destination, reply }).await
    }

    /// Turn the player to the nearest living enemy, optionally walking into
    /// swing range. Returns the enemy, if any.
    pub async fn engage(&self, approach: bool) -> Result<Option<ActorId>> {
        self.request(|reply| Command::Engage { approach, reply }).await
    }

    /// Query the current encounter (read-only snapshot)
    pub async fn snapshot(&self) -> Result<WorldSnapshot> {
        self.request(|reply| Command::Snapshot { reply }).await
    }

    /// Ask the worker to stop. Later requests fail with
    /// [`RuntimeError::CommandChannelClosed`].
    pub async fn shutdown(&self) -> Result<()> {
        self.request(|reply| Command::Shutdown { reply }).await
    }

    /// Subscribe to events from a specific topic
    ///
    /// # Topics
    ///
    /// - `Topic::Combat` - Hits, statuses, behavior transitions, player actions
    /// - `Topic::Encounter` - Waves, spawns, despawns and player death
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// use runtime::Topic;
    ///
    /// // Only follow wave pacing
    /// let mut waves = handle.subscribe(Topic::Encounter);
    /// while let Ok(event) = waves.recv().await {
    ///     // Handle encounter events
    /// }
    /// ```
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.event_bus.subscribe(topic)
    }

    /// Subscribe to multiple topics at once
    ///
    /// Returns a map of topic to receiver for each requested topic.
    pub fn subscribe_multiple(
        &self,
        topics: &[Topic],
    ) -> HashMap<Topic, broadcast::Receiver<Event>> {
        self.event_bus.subscribe_multiple(topics)
    }

    /// Get a reference to the event bus for advanced usage
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }
}
