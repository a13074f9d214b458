//! Topic-based event bus implementation.

use std::collections::HashMap;

use combat_core::{CombatEvent, Tick};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use super::types::TickedEvent;

/// Topics for event routing
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum Topic {
    /// Hits, statuses, behavior transitions and player actions
    Combat,
    /// Wave pacing, spawns, despawns and player death
    Encounter,
}

/// Event wrapper that carries the topic and typed event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    Combat(TickedEvent),
    Encounter(TickedEvent),
}

impl Event {
    /// Routes a world event to its topic.
    pub fn from_combat(tick: Tick, event: CombatEvent) -> Self {
        let encounter = event.is_encounter();
        let ticked = TickedEvent { tick, event };
        if encounter {
            Event::Encounter(ticked)
        } else {
            Event::Combat(ticked)
        }
    }

    pub fn topic(&self) -> Topic {
        match self {
            Event::Combat(_) => Topic::Combat,
            Event::Encounter(_) => Topic::Encounter,
        }
    }

    pub fn ticked(&self) -> &TickedEvent {
        match self {
            Event::Combat(ticked) | Event::Encounter(ticked) => ticked,
        }
    }

    pub fn tick(&self) -> Tick {
        self.ticked().tick
    }

    pub fn combat_event(&self) -> &CombatEvent {
        &self.ticked().event
    }

    /// Single-line JSON form, for logs and tooling.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Topic-based event bus
///
/// Allows consumers to subscribe to specific topics and only receive
/// events they care about. Channels are created up front, one per topic.
#[derive(Clone)]
pub struct EventBus {
    combat: broadcast::Sender<Event>,
    encounter: broadcast::Sender<Event>,
}

impl EventBus {
    /// Creates a new event bus with default capacity for each topic
    pub fn new() -> Self {
        Self::with_capacity(100)
    }

    /// Creates a new event bus with specified capacity per topic
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            combat: broadcast::channel(capacity).0,
            encounter: broadcast::channel(capacity).0,
        }
    }

    fn sender(&self, topic: Topic) -> &broadcast::Sender<Event> {
        match topic {
            Topic::Combat => &self.combat,
            Topic::Encounter => &self.encounter,
        }
    }

    /// Publish an event to its corresponding topic
    pub fn publish(&self, event: Event) {
        let topic = event.topic();
        if self.sender(topic).send(event).is_err() {
            // No subscribers for this topic - this is normal, not an error
            tracing::trace!("No subscribers for topic {:?}", topic);
        }
    }

    /// Subscribe to a specific topic
    ///
    /// Returns a receiver that will only receive events for that topic.
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.sender(topic).subscribe()
    }

    /// Subscribe to multiple topics
    ///
    /// Returns receivers for each requested topic.
    pub fn subscribe_multiple(
        &self,
        topics: &[Topic],
    ) -> HashMap<Topic, broadcast::Receiver<Event>> {
        topics
            .iter()
            .map(|&topic| (topic, self.subscribe(topic)))
            .collect()
    }

    pub fn subscriber_count(&self, topic: Topic) -> usize {
        self.sender(topic).receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
