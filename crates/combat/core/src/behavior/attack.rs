//! Attack records and attack selection.
use glam::Vec3;

use crate::actor::TagMask;
use crate::env::{HitShape, SimRng};

/// One attack an archetype can telegraph and execute.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AttackProfile {
    pub name: String,
    pub damage: f32,
    pub range: f32,
    /// Telegraph length; a stagger inside this window cancels the attack.
    pub charge_time: f32,
    pub active_duration: f32,
    pub cooldown: f32,
    pub delivery: AttackDelivery,
    #[cfg_attr(feature = "serde", serde(default))]
    pub recovery: f32,
    #[cfg_attr(feature = "serde", serde(default = "default_strikes"))]
    pub strikes: u32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub strike_interval: f32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub suppression: HitSuppression,
    #[cfg_attr(feature = "serde", serde(default))]
    pub secondary: Option<SecondaryEffect>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub mode: AttackMode,
    #[cfg_attr(feature = "serde", serde(default = "default_weight"))]
    pub weight: u32,
    /// Hand control to the archetype's special behavior after recovering.
    #[cfg_attr(feature = "serde", serde(default))]
    pub then_special: bool,
    #[cfg_attr(feature = "serde", serde(default = "default_affects"))]
    pub affects: TagMask,
}

#[cfg(feature = "serde")]
fn default_strikes() -> u32 {
    1
}

#[cfg(feature = "serde")]
fn default_weight() -> u32 {
    1
}

#[cfg(feature = "serde")]
fn default_affects() -> TagMask {
    TagMask::PLAYER
}

impl AttackProfile {
    /// Single-strike melee attack with a box hit volume in front of the actor.
    pub fn melee(name: &str, damage: f32, range: f32, half_extents: Vec3) -> Self {
        Self {
            name: name.to_string(),
            damage,
            range,
            charge_time: 0.5,
            active_duration: 0.3,
            cooldown: 2.0,
            delivery: AttackDelivery::Melee {
                shape: HitShape::Box { half_extents },
                offset: Vec3::new(0.0, 0.0, range * 0.5),
            },
            recovery: 0.0,
            strikes: 1,
            strike_interval: 0.0,
            suppression: HitSuppression::PerActivation,
            secondary: None,
            mode: AttackMode::Any,
            weight: 1,
            then_special: false,
            affects: TagMask::PLAYER,
        }
    }

    pub fn projectile(name: &str, damage: f32, range: f32, speed: f32) -> Self {
        Self {
            delivery: AttackDelivery::Projectile {
                speed,
                count: 1,
                spread_degrees: 0.0,
            },
            ..Self::melee(name, damage, range, Vec3::ONE)
        }
    }

    pub fn timing(mut self, charge_time: f32, active_duration: f32, cooldown: f32) -> Self {
        self.charge_time = charge_time;
        self.active_duration = active_duration;
        self.cooldown = cooldown;
        self
    }

    pub fn strikes(mut self, strikes: u32, interval: f32, suppression: HitSuppression) -> Self {
        self.strikes = strikes.max(1);
        self.strike_interval = interval;
        self.suppression = suppression;
        self
    }

    pub fn sphere(mut self, radius: f32, offset: Vec3) -> Self {
        self.delivery = AttackDelivery::Melee {
            shape: HitShape::Sphere { radius },
            offset,
        };
        self
    }

    pub fn volley(mut self, count: u32, spread_degrees: f32) -> Self {
        if let AttackDelivery::Projectile {
            count: c,
            spread_degrees: s,
            ..
        } = &mut self.delivery
        {
            *c = count.max(1);
            *s = spread_degrees;
        }
        self
    }

    /// Status effect applied to each target just before the strike's damage.
    pub fn secondary(mut self, effect: SecondaryEffect) -> Self {
        self.secondary = Some(effect);
        self
    }

    pub fn mode(mut self, mode: AttackMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn then_special(mut self) -> Self {
        self.then_special = true;
        self
    }

    /// Time from the first strike to the end of the last one.
    pub fn strike_span(&self) -> f32 {
        self.strike_interval * self.strikes.saturating_sub(1) as f32
    }
}

/// How an attack reaches its targets.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AttackDelivery {
    /// Overlap query at `offset` in the actor's local frame.
    Melee { shape: HitShape, offset: Vec3 },
    /// Projectiles aimed at the target; physics reports impacts back.
    Projectile {
        speed: f32,
        count: u32,
        spread_degrees: f32,
    },
}

/// Whether a multi-strike attack may hit the same target more than once.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum HitSuppression {
    /// Each target takes damage at most once per activation.
    #[default]
    PerActivation,
    /// Each strike may hit every target again.
    PerStrike,
}

/// Status effect applied alongside base damage.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SecondaryEffect {
    Bleed {
        damage_per_tick: f32,
        ticks: u32,
        interval: f32,
    },
    Knockback {
        damage: f32,
        force: f32,
    },
    Mark {
        increase: f32,
        duration: f32,
    },
}

/// Movement profile an attack is usable in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AttackMode {
    #[default]
    Any,
    Grounded,
    Airborne,
}

impl AttackMode {
    pub fn allows(self, airborne: bool) -> bool {
        match self {
            Self::Any => true,
            Self::Grounded => !airborne,
            Self::Airborne => airborne,
        }
    }
}

/// Policy for choosing among attacks that are in range and off cooldown.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AttackSelection {
    /// Uniform over available attacks.
    #[default]
    UniformRandom,
    /// Weighted by each attack's `weight`.
    WeightedRandom,
    /// Declaration order, continuing after the last attack used.
    Cycle,
    /// First available attack in declaration order.
    Priority,
    /// The next attack is rolled up front; the actor closes in until that
    /// attack is in range.
    PreRolled,
}

/// Picks one of `available` (indices into `attacks`, ascending).
pub(crate) fn select_attack(
    selection: AttackSelection,
    attacks: &[AttackProfile],
    available: &[usize],
    cursor: &mut usize,
    rng: &mut SimRng,
) -> Option<usize> {
    if available.is_empty() {
        return None;
    }
    let choice = match selection {
        AttackSelection::UniformRandom | AttackSelection::PreRolled => {
            available[rng.index(available.len())]
        }
        AttackSelection::Priority => available[0],
        AttackSelection::Cycle => available
            .iter()
            .copied()
            .find(|&index| index >= *cursor)
            .unwrap_or(available[0]),
        AttackSelection::WeightedRandom => {
            let total: u32 = available.iter().map(|&i| attacks[i].weight).sum();
            if total == 0 {
                available[rng.index(available.len())]
            } else {
                let mut roll = rng.next_u32() % total;
                let mut picked = available[available.len() - 1];
                for &index in available {
                    let weight = attacks[index].weight;
                    if roll < weight {
                        picked = index;
                        break;
                    }
                    roll -= weight;
                }
                picked
            }
        }
    };
    *cursor = choice + 1;
    Some(choice)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attacks(n: usize) -> Vec<AttackProfile> {
        (0..n)
            .map(|i| AttackProfile::melee(&format!("a{i}"), 1.0, 2.0, Vec3::ONE))
            .collect()
    }

    #[test]
    fn cycle_walks_declaration_order() {
        let attacks = attacks(3);
        let mut rng = SimRng::new(0);
        let mut cursor = 0;
        let all = [0, 1, 2];
        let picks: Vec<_> = (0..4)
            .map(|_| {
                select_attack(AttackSelection::Cycle, &attacks, &all, &mut cursor, &mut rng)
            })
            .collect();
        assert_eq!(picks, vec![Some(0), Some(1), Some(2), Some(0)]);

        // Skips attacks that are cooling down.
        cursor = 1;
        let pick = select_attack(AttackSelection::Cycle, &attacks, &[0, 2], &mut cursor, &mut rng);
        assert_eq!(pick, Some(2));
    }

    #[test]
    fn priority_takes_first_available() {
        let attacks = attacks(3);
        let mut rng = SimRng::new(0);
        let mut cursor = 0;
        let pick = select_attack(AttackSelection::Priority, &attacks, &[1, 2], &mut cursor, &mut rng);
        assert_eq!(pick, Some(1));
    }

    #[test]
    fn weighted_never_picks_zero_weight() {
        let mut attacks = attacks(2);
        attacks[0].weight = 0;
        attacks[1].weight = 3;
        let mut rng = SimRng::new(9);
        let mut cursor = 0;
        for _ in 0..100 {
            let pick = select_attack(
                AttackSelection::WeightedRandom,
                &attacks,
                &[0, 1],
                &mut cursor,
                &mut rng,
            );
            assert_eq!(pick, Some(1));
        }
    }

    #[test]
    fn uniform_covers_every_available_attack() {
        let attacks = attacks(3);
        let mut rng = SimRng::new(5);
        let mut cursor = 0;
        let mut seen = [false; 3];
        for _ in 0..200 {
            let pick = select_attack(
                AttackSelection::UniformRandom,
                &attacks,
                &[0, 2],
                &mut cursor,
                &mut rng,
            )
            .unwrap();
            seen[pick] = true;
        }
        assert_eq!(seen, [true, false, true]);
        assert_eq!(
            select_attack(AttackSelection::UniformRandom, &attacks, &[], &mut cursor, &mut rng),
            None
        );
    }
}
