use crate::time::TickRate;

/// Combat tuning shared by the status engine, player kit and encounter director.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CombatConfig {
    /// Fixed update rate in ticks per second.
    pub tick_rate: u32,
    pub status: StatusConfig,
    pub director: DirectorConfig,
    pub player: PlayerConfig,
}

impl CombatConfig {
    // ===== compile-time constants used as type parameters =====
    /// Maximum attack records per archetype.
    pub const MAX_ATTACKS: usize = 4;
    /// Maximum enemies a single player special can affect.
    pub const MAX_SPECIAL_TARGETS: usize = 32;

    // ===== runtime-tunable defaults =====
    pub const DEFAULT_TICK_RATE: u32 = 50;

    pub fn new() -> Self {
        Self {
            tick_rate: Self::DEFAULT_TICK_RATE,
            status: StatusConfig::default(),
            director: DirectorConfig::default(),
            player: PlayerConfig::default(),
        }
    }

    pub fn tick_rate(&self) -> TickRate {
        TickRate(self.tick_rate.max(1))
    }
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Status effect tuning.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct StatusConfig {
    /// Seconds the knockback window stays armed, per charge.
    pub knockback_duration: f32,
    /// Force lost for every charge beyond the first.
    pub knockback_force_step: f32,
    /// Floor for the decayed knockback force.
    pub knockback_min_force: f32,
    /// Fraction of regular bleed damage returned to the bleed's heal target.
    pub regular_lifesteal_ratio: f32,
    /// Fraction of special bleed damage returned to the bleed's heal target.
    pub special_lifesteal_ratio: f32,
}

impl StatusConfig {
    pub const DEFAULT_KNOCKBACK_DURATION: f32 = 0.5;
    pub const DEFAULT_KNOCKBACK_FORCE_STEP: f32 = 8.0;
    pub const DEFAULT_KNOCKBACK_MIN_FORCE: f32 = 1.0;
    pub const DEFAULT_LIFESTEAL_RATIO: f32 = 1.0;

    /// Knockback force after diminishing returns for `charges`.
    pub fn knockback_force(&self, force: f32, charges: u32) -> f32 {
        let penalty = charges.saturating_sub(1) as f32 * self.knockback_force_step;
        (force - penalty).max(self.knockback_min_force)
    }
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            knockback_duration: Self::DEFAULT_KNOCKBACK_DURATION,
            knockback_force_step: Self::DEFAULT_KNOCKBACK_FORCE_STEP,
            knockback_min_force: Self::DEFAULT_KNOCKBACK_MIN_FORCE,
            regular_lifesteal_ratio: Self::DEFAULT_LIFESTEAL_RATIO,
            special_lifesteal_ratio: Self::DEFAULT_LIFESTEAL_RATIO,
        }
    }
}

/// Wave composition and spawn pacing.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DirectorConfig {
    pub base_budget: u32,
    pub budget_per_wave: u32,
    /// Seconds over which the first wave is introduced.
    pub wave_duration: f32,
    /// Added to the wave duration every time a wave is generated.
    pub wave_duration_increment: f32,
    pub spawn_radius: f32,
    pub min_player_distance: f32,
    /// Half extent of the obstruction box a spawn point must keep clear.
    pub spawn_clearance: f32,
    pub placement_attempts: u32,
    /// Maximum distance a sampled point may snap to reach navigable ground.
    pub nav_sample_distance: f32,
    /// Hard cap on enemies rolled for one wave.
    pub max_population: u32,
}

impl DirectorConfig {
    pub const DEFAULT_BASE_BUDGET: u32 = 0;
    pub const DEFAULT_BUDGET_PER_WAVE: u32 = 10;
    pub const DEFAULT_WAVE_DURATION: f32 = 20.0;
    pub const DEFAULT_WAVE_DURATION_INCREMENT: f32 = 2.0;
    pub const DEFAULT_SPAWN_RADIUS: f32 = 30.0;
    pub const DEFAULT_MIN_PLAYER_DISTANCE: f32 = 10.0;
    pub const DEFAULT_SPAWN_CLEARANCE: f32 = 5.0;
    pub const DEFAULT_PLACEMENT_ATTEMPTS: u32 = 30;
    pub const DEFAULT_NAV_SAMPLE_DISTANCE: f32 = 2.0;
    pub const DEFAULT_MAX_POPULATION: u32 = 64;

    pub fn budget_for(&self, wave: u32) -> u32 {
        self.base_budget
            .saturating_add(wave.saturating_mul(self.budget_per_wave))
    }
}

impl Default for DirectorConfig {
    fn default() -> Self {
        Self {
            base_budget: Self::DEFAULT_BASE_BUDGET,
            budget_per_wave: Self::DEFAULT_BUDGET_PER_WAVE,
            wave_duration: Self::DEFAULT_WAVE_DURATION,
            wave_duration_increment: Self::DEFAULT_WAVE_DURATION_INCREMENT,
            spawn_radius: Self::DEFAULT_SPAWN_RADIUS,
            min_player_distance: Self::DEFAULT_MIN_PLAYER_DISTANCE,
            spawn_clearance: Self::DEFAULT_SPAWN_CLEARANCE,
            placement_attempts: Self::DEFAULT_PLACEMENT_ATTEMPTS,
            nav_sample_distance: Self::DEFAULT_NAV_SAMPLE_DISTANCE,
            max_population: Self::DEFAULT_MAX_POPULATION,
        }
    }
}

/// Player health, stance kit, souls and dodge tuning.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PlayerConfig {
    pub max_health: f32,
    pub stagger_threshold: f32,

    pub attack_damage: f32,
    pub attack_radius: f32,
    /// Distance in front of the player where the attack sphere is centred.
    pub attack_reach: f32,
    pub special_radius: f32,

    pub bleed_damage: f32,
    pub bleed_ticks: u32,
    pub bleed_interval: f32,
    pub knockback_damage: f32,
    pub knockback_force: f32,
    pub mark_increase: f32,
    pub mark_duration: f32,

    pub souls_per_hit: u32,
    pub souls_per_charge: u32,
    pub max_souls: u32,

    pub dodge_secs: f32,
    pub dodge_cooldown: f32,

    pub regen_delay: f32,
    /// Fraction of max health at or below which regeneration runs.
    pub regen_threshold: f32,
    pub regen_amount: f32,
    pub regen_interval: f32,
}

impl PlayerConfig {
    pub const DEFAULT_SOULS_PER_CHARGE: u32 = 20;
    pub const DEFAULT_MAX_SOULS: u32 = 100;
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            max_health: 100.0,
            stagger_threshold: 50.0,
            attack_damage: 10.0,
            attack_radius: 2.0,
            attack_reach: 1.5,
            special_radius: 8.0,
            bleed_damage: 2.0,
            bleed_ticks: 3,
            bleed_interval: 0.5,
            knockback_damage: 15.0,
            knockback_force: 24.0,
            mark_increase: 0.5,
            mark_duration: 5.0,
            souls_per_hit: 5,
            souls_per_charge: Self::DEFAULT_SOULS_PER_CHARGE,
            max_souls: Self::DEFAULT_MAX_SOULS,
            dodge_secs: 0.4,
            dodge_cooldown: 1.0,
            regen_delay: 3.0,
            regen_threshold: 0.3,
            regen_amount: 1.0,
            regen_interval: 0.1,
        }
    }
}
