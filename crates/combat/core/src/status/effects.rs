//! Timed status effect records.
use crate::actor::ActorId;
use crate::time::TimerHandle;

/// Parameters for starting a bleed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BleedSpec {
    pub damage_per_tick: f32,
    pub ticks: u32,
    /// Seconds between ticks; the first tick lands one interval after the start.
    pub interval: f32,
    /// Special (cursed) bleeds block regular ones until they finish.
    pub special: bool,
    /// Actor healed by each tick's damage.
    pub heal_target: Option<ActorId>,
}

impl BleedSpec {
    pub fn regular(damage_per_tick: f32, ticks: u32, interval: f32) -> Self {
        Self {
            damage_per_tick,
            ticks,
            interval,
            special: false,
            heal_target: None,
        }
    }

    pub fn special(damage_per_tick: f32, ticks: u32, interval: f32) -> Self {
        Self {
            special: true,
            ..Self::regular(damage_per_tick, ticks, interval)
        }
    }

    pub fn healing(mut self, target: ActorId) -> Self {
        self.heal_target = Some(target);
        self
    }
}

/// The running bleed, at most one per actor.
#[derive(Clone, Debug)]
pub(super) struct ActiveBleed {
    pub spec: BleedSpec,
    pub remaining: u32,
    pub interval_ticks: u64,
    pub lifesteal_ratio: f32,
    pub timer: TimerHandle,
}

/// Armed knockback window.
#[derive(Clone, Debug)]
pub(super) struct KnockbackWindow {
    pub damage: f32,
    /// Cleared once a collision has dealt the stored damage.
    pub armed: bool,
    pub timer: TimerHandle,
}

/// Passive regeneration below a health threshold.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RegenSpec {
    /// Seconds without damage before healing starts.
    pub delay: f32,
    /// Fraction of max health at or below which healing runs.
    pub threshold: f32,
    pub amount: f32,
    pub interval: f32,
}

#[derive(Clone, Debug)]
pub(super) struct Regeneration {
    pub spec: RegenSpec,
    pub timer: Option<TimerHandle>,
}

/// Observable outcomes of status operations, drained by the world each tick.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StatusEvent {
    Damaged { amount: f32, health: f32 },
    Healed { amount: f32, health: f32 },
    Staggered { amount: f32 },
    Died,
    /// A bleed tick wants `target` healed by `amount`.
    Lifesteal { target: ActorId, amount: f32 },
    BleedStarted { special: bool },
    BleedEnded { special: bool },
    KnockbackEnded,
    Marked { multiplier: f32 },
    MarkCleared,
}

/// Result of a single damage call.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct DamageOutcome {
    /// Damage after the mark multiplier.
    pub applied: f32,
    pub staggered: bool,
    pub died: bool,
}

impl DamageOutcome {
    pub const IGNORED: Self = Self {
        applied: 0.0,
        staggered: false,
        died: false,
    };
}
