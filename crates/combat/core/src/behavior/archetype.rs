//! Per-archetype data records driving the shared behavior engine.
use arrayvec::ArrayVec;
use glam::Vec3;

use super::attack::{
    AttackMode, AttackProfile, AttackSelection, HitSuppression, SecondaryEffect,
};
use super::special::{FlyParams, RetreatParams, TeleportParams};
use crate::actor::TagMask;
use crate::config::CombatConfig;
use crate::error::CatalogError;

/// A named enemy template: health, movement, attacks and special behavior.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Archetype {
    pub name: String,
    pub max_health: f32,
    /// `None` for archetypes that never stagger.
    pub stagger_threshold: Option<f32>,
    pub move_speed: f32,
    /// Slerp rate toward the target facing, per second.
    pub rotation_speed: f32,
    /// Rotation speed multiplier while telegraphing.
    #[cfg_attr(feature = "serde", serde(default = "default_tracking"))]
    pub charge_tracking: f32,
    pub attacks: ArrayVec<AttackProfile, { CombatConfig::MAX_ATTACKS }>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub selection: AttackSelection,
    #[cfg_attr(feature = "serde", serde(default))]
    pub hold: HoldPolicy,
    #[cfg_attr(feature = "serde", serde(default))]
    pub pursuit: Pursuit,
    #[cfg_attr(feature = "serde", serde(default = "default_repath"))]
    pub repath_interval: f32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub activation_delay: f32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub special: SpecialBehavior,
    pub death_delay: f32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub explosive: Option<Explosion>,
}

#[cfg(feature = "serde")]
fn default_tracking() -> f32 {
    1.0
}

#[cfg(feature = "serde")]
fn default_repath() -> f32 {
    Archetype::DEFAULT_REPATH_INTERVAL
}

/// Whether an actor stops and turns in place instead of chasing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum HoldPolicy {
    /// Always chase when no attack can start.
    #[default]
    Never,
    /// Hold while an in-range attack is cooling down.
    InRange,
    /// Hold while any attack is cooling down.
    WhileCooling,
}

/// How chase destinations are chosen.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Pursuit {
    #[default]
    Direct,
    /// Leads the target along its velocity. Rolled once per actor with
    /// probability `chance`; the prediction is dropped when it points away
    /// from the target by more than `alignment` (dot product).
    Intercept {
        chance: f32,
        prediction_secs: f32,
        alignment: f32,
    },
}

/// Positioning behavior run between attacks. At most one per archetype.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SpecialBehavior {
    #[default]
    None,
    Retreat(RetreatParams),
    FlyToggle(FlyParams),
    Teleport(TeleportParams),
}

/// Area damage applied once when the actor is removed after death.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Explosion {
    pub radius: f32,
    pub damage: f32,
    pub affects: TagMask,
}

impl Archetype {
    pub const DEFAULT_REPATH_INTERVAL: f32 = 0.15;

    pub fn stagger_threshold(&self) -> f32 {
        self.stagger_threshold.unwrap_or(f32::INFINITY)
    }

    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.attacks.is_empty() {
            return Err(CatalogError::NoAttacks(self.name.clone()));
        }
        let positive = |field: &'static str, value: f32| {
            if value > 0.0 && value.is_finite() {
                Ok(())
            } else {
                Err(CatalogError::NonPositive {
                    name: self.name.clone(),
                    field,
                    value,
                })
            }
        };
        positive("max_health", self.max_health)?;
        positive("move_speed", self.move_speed)?;
        positive("rotation_speed", self.rotation_speed)?;
        for attack in &self.attacks {
            positive("range", attack.range)?;
            positive("active_duration", attack.active_duration)?;
            if attack.cooldown < 0.0 || attack.charge_time < 0.0 {
                return Err(CatalogError::NonPositive {
                    name: self.name.clone(),
                    field: "timing",
                    value: attack.cooldown.min(attack.charge_time),
                });
            }
        }
        Ok(())
    }

    fn base(name: &str, max_health: f32, move_speed: f32) -> Self {
        Self {
            name: name.to_string(),
            max_health,
            stagger_threshold: Some(max_health * 0.25),
            move_speed,
            rotation_speed: 6.0,
            charge_tracking: 1.0,
            attacks: ArrayVec::new(),
            selection: AttackSelection::UniformRandom,
            hold: HoldPolicy::Never,
            pursuit: Pursuit::Direct,
            repath_interval: Self::DEFAULT_REPATH_INTERVAL,
            activation_delay: 0.0,
            special: SpecialBehavior::None,
            death_delay: 1.5,
            explosive: None,
        }
    }

    fn with_attacks(mut self, attacks: impl IntoIterator<Item = AttackProfile>) -> Self {
        self.attacks.extend(attacks);
        self
    }

    /// Slow melee grunt with a single telegraphed swing.
    pub fn skeleton() -> Self {
        Self {
            charge_tracking: 2.0,
            hold: HoldPolicy::WhileCooling,
            ..Self::base("skeleton", 40.0, 3.5)
        }
        .with_attacks([AttackProfile::melee("slash", 12.0, 2.0, Vec3::new(1.0, 1.0, 1.0))
            .timing(0.8, 0.3, 2.5)])
    }

    /// Heavy bruiser with three melee attacks, one pre-rolled at a time.
    pub fn orc() -> Self {
        Self {
            selection: AttackSelection::PreRolled,
            hold: HoldPolicy::WhileCooling,
            activation_delay: 1.0,
            pursuit: Pursuit::Intercept {
                chance: 0.5,
                prediction_secs: 1.0,
                alignment: 0.0,
            },
            ..Self::base("orc", 120.0, 3.0)
        }
        .with_attacks([
            AttackProfile::melee("slash", 18.0, 2.5, Vec3::new(1.5, 1.0, 1.25)).timing(0.9, 0.4, 3.0),
            AttackProfile::melee("double_slash", 12.0, 2.5, Vec3::new(1.25, 1.0, 1.25))
                .timing(0.7, 0.8, 3.5)
                .strikes(2, 0.35, HitSuppression::PerStrike),
            AttackProfile::melee("spin", 15.0, 2.0, Vec3::ONE)
                .sphere(2.5, Vec3::ZERO)
                .timing(1.1, 0.6, 5.0)
                .secondary(SecondaryEffect::Knockback {
                    damage: 10.0,
                    force: 12.0,
                }),
        ])
    }

    /// Fast skirmisher: a lunge or a four-strike flurry.
    pub fn spider() -> Self {
        Self {
            selection: AttackSelection::PreRolled,
            hold: HoldPolicy::WhileCooling,
            pursuit: Pursuit::Intercept {
                chance: 0.5,
                prediction_secs: 0.75,
                alignment: 0.25,
            },
            ..Self::base("spider", 30.0, 5.5)
        }
        .with_attacks([
            AttackProfile::melee("lunge", 10.0, 3.5, Vec3::new(0.75, 0.75, 1.75)).timing(0.5, 0.3, 2.0),
            AttackProfile::melee("flurry", 4.0, 1.75, Vec3::new(1.0, 0.75, 1.0))
                .timing(0.4, 1.2, 3.0)
                .strikes(4, 0.3, HitSuppression::PerStrike)
                .secondary(SecondaryEffect::Bleed {
                    damage_per_tick: 1.0,
                    ticks: 3,
                    interval: 0.5,
                }),
        ])
    }

    /// Ranged caster that retreats after every shot and explodes on death.
    pub fn imp() -> Self {
        Self {
            hold: HoldPolicy::InRange,
            special: SpecialBehavior::Retreat(RetreatParams::default()),
            death_delay: 0.75,
            explosive: Some(Explosion {
                radius: 3.0,
                damage: 20.0,
                affects: TagMask::ALL,
            }),
            ..Self::base("imp", 25.0, 4.5)
        }
        .with_attacks([AttackProfile::projectile("firebolt", 8.0, 12.0, 14.0)
            .timing(0.6, 0.2, 2.0)
            .then_special()])
    }

    /// Boss that alternates between grounded melee and airborne fire.
    pub fn dragon() -> Self {
        Self {
            stagger_threshold: None,
            selection: AttackSelection::Priority,
            special: SpecialBehavior::FlyToggle(FlyParams::default()),
            death_delay: 3.0,
            ..Self::base("dragon", 400.0, 4.0)
        }
        .with_attacks([
            AttackProfile::melee("bite", 30.0, 4.0, Vec3::new(1.5, 1.5, 2.0))
                .timing(0.8, 0.4, 3.0)
                .mode(AttackMode::Grounded),
            AttackProfile::melee("tail", 22.0, 5.0, Vec3::ONE)
                .sphere(4.0, Vec3::new(0.0, 0.0, -2.0))
                .timing(1.0, 0.5, 4.0)
                .mode(AttackMode::Grounded),
            AttackProfile::projectile("fire", 15.0, 14.0, 18.0)
                .volley(3, 12.0)
                .timing(1.2, 0.6, 4.0)
                .then_special(),
        ])
    }

    /// Caster that teleports away after meleeing and fights with spells.
    pub fn necromancer() -> Self {
        Self {
            selection: AttackSelection::Priority,
            hold: HoldPolicy::InRange,
            special: SpecialBehavior::Teleport(TeleportParams::default()),
            ..Self::base("necromancer", 90.0, 3.5)
        }
        .with_attacks([
            AttackProfile::melee("staff", 14.0, 2.0, Vec3::ONE)
                .timing(0.6, 0.3, 2.0)
                .secondary(SecondaryEffect::Mark {
                    increase: 0.25,
                    duration: 3.0,
                })
                .then_special(),
            AttackProfile::projectile("multi_spell", 9.0, 10.0, 12.0)
                .volley(3, 15.0)
                .timing(1.0, 0.4, 4.0),
            AttackProfile::projectile("tracking_spell", 12.0, 14.0, 9.0).timing(1.4, 0.4, 6.0),
        ])
    }

    /// Every built-in archetype.
    pub fn presets() -> Vec<Self> {
        vec![
            Self::skeleton(),
            Self::orc(),
            Self::spider(),
            Self::imp(),
            Self::dragon(),
            Self::necromancer(),
        ]
    }
}
