//! Player-side combat state: stance, souls and dodge cooldown.
use crate::behavior::SecondaryEffect;
use crate::config::PlayerConfig;
use crate::status::{BleedSpec, RegenSpec};
use crate::time::Tick;

/// Combat mode selecting the status effect that rides along with damage.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumIter,
    strum::EnumString,
    strum::IntoStaticStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum Stance {
    /// Bleeds targets and heals the player from the damage.
    #[default]
    Vampire,
    /// Knocks targets back.
    Orc,
    /// Marks targets for extra damage (special only).
    Ghost,
}

impl Stance {
    pub fn next(self) -> Self {
        match self {
            Self::Vampire => Self::Orc,
            Self::Orc => Self::Ghost,
            Self::Ghost => Self::Vampire,
        }
    }

    pub fn previous(self) -> Self {
        match self {
            Self::Vampire => Self::Ghost,
            Self::Orc => Self::Vampire,
            Self::Ghost => Self::Orc,
        }
    }

    /// Effect applied before the damage of a regular attack.
    pub fn attack_effect(self, config: &PlayerConfig) -> Option<SecondaryEffect> {
        match self {
            Self::Vampire => Some(SecondaryEffect::Bleed {
                damage_per_tick: config.bleed_damage,
                ticks: config.bleed_ticks,
                interval: config.bleed_interval,
            }),
            Self::Orc => Some(SecondaryEffect::Knockback {
                damage: config.knockback_damage,
                force: config.knockback_force,
            }),
            Self::Ghost => None,
        }
    }
}

/// Souls, stance and dodge state for the player actor.
#[derive(Clone, Debug, PartialEq)]
pub struct PlayerCombat {
    stance: Stance,
    souls: u32,
    dodge_ready_at: Tick,
}

impl PlayerCombat {
    pub fn new(stance: Stance) -> Self {
        Self {
            stance,
            souls: 0,
            dodge_ready_at: Tick::ZERO,
        }
    }

    pub fn stance(&self) -> Stance {
        self.stance
    }

    pub fn set_stance(&mut self, stance: Stance) {
        self.stance = stance;
    }

    pub fn souls(&self) -> u32 {
        self.souls
    }

    /// Whole charges available for a special.
    pub fn charges(&self, config: &PlayerConfig) -> u32 {
        self.souls / config.souls_per_charge.max(1)
    }

    /// Adds souls up to `max_souls`. Returns the new total.
    pub fn gain_souls(&mut self, amount: u32, config: &PlayerConfig) -> u32 {
        self.souls = self.souls.saturating_add(amount).min(config.max_souls);
        self.souls
    }

    /// Empties the soul pool, returning how many charges it held.
    pub fn spend_all(&mut self, config: &PlayerConfig) -> u32 {
        let charges = self.charges(config);
        self.souls = 0;
        charges
    }

    pub fn dodge_ready_at(&self) -> Tick {
        self.dodge_ready_at
    }

    pub(crate) fn set_dodge_ready_at(&mut self, at: Tick) {
        self.dodge_ready_at = at;
    }
}

impl Default for PlayerCombat {
    fn default() -> Self {
        Self::new(Stance::default())
    }
}

impl PlayerConfig {
    pub fn regen_spec(&self) -> RegenSpec {
        RegenSpec {
            delay: self.regen_delay,
            threshold: self.regen_threshold,
            amount: self.regen_amount,
            interval: self.regen_interval,
        }
    }

    /// Special bleed with one tick per charge.
    pub fn special_bleed(&self, charges: u32) -> BleedSpec {
        BleedSpec::special(self.bleed_damage, charges, self.bleed_interval)
    }
}
