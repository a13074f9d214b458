//! Topic-based event bus for runtime events.
//!
//! World events are split by topic so a HUD can follow combat while a pacing
//! monitor only listens to wave progress.

mod bus;
mod types;

pub use bus::{Event, EventBus, Topic};
pub use types::TickedEvent;
