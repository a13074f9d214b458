//! Data-driven enemy behavior.
//!
//! Archetypes are plain records; a single state machine interprets them.
mod archetype;
mod attack;
mod machine;
mod pursuit;
mod special;

pub use archetype::{Archetype, Explosion, HoldPolicy, Pursuit, SpecialBehavior};
pub use attack::{
    AttackDelivery, AttackMode, AttackProfile, AttackSelection, HitSuppression, SecondaryEffect,
};
pub use machine::{BehaviorContext, BehaviorOutput, BehaviorState, BehaviorStateMachine, Target};
pub use pursuit::{face_towards, look_at, yaw_towards};
pub use special::{
    FlyParams, RetreatParams, SpecialEntry, SpecialKind, SpecialStep, SpecialStrategy,
    TeleportParams,
};
