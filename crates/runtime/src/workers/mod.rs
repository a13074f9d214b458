//! Worker tasks that back the runtime orchestration.
//!
//! The simulation worker owns the encounter and executes commands; other
//! background duties would live alongside it.

mod simulation;

pub use simulation::{Command, SimulationWorker};
