//! Common error infrastructure for combat-core.
//!
//! Most combat operations are total: bad numeric input is clamped and repeated
//! death is a no-op. The errors here cover the conditions that callers may
//! want to observe, retry, or log.

use thiserror::Error;

use crate::actor::ActorId;

/// Severity level of an error, used for categorization and recovery strategies.
///
/// - **Recoverable**: the operation may succeed on a later tick
/// - **Validation**: rejected input, retrying without changes is pointless
/// - **Internal**: accounting or state drift that indicates a bug
/// - **Fatal**: the simulation cannot continue
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    Recoverable,
    Validation,
    Internal,
    Fatal,
}

impl ErrorSeverity {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Recoverable => "recoverable",
            Self::Validation => "validation",
            Self::Internal => "internal",
            Self::Fatal => "fatal",
        }
    }

    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Recoverable)
    }

    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal | Self::Fatal)
    }
}

/// Common trait for all combat-core errors.
pub trait CombatError: core::fmt::Display + core::fmt::Debug {
    fn severity(&self) -> ErrorSeverity;

    /// Stable identifier for logs and metrics.
    fn error_code(&self) -> &'static str;
}

/// Sampling a point for a spawn, retreat, teleport or reposition failed.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum PlacementError {
    #[error("no valid point found after {attempts} attempts")]
    NoValidPoint { attempts: u32 },

    #[error("actor {0} has no transform")]
    MissingTransform(ActorId),
}

impl CombatError for PlacementError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::NoValidPoint { .. } => ErrorSeverity::Recoverable,
            Self::MissingTransform(_) => ErrorSeverity::Internal,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::NoValidPoint { .. } => "PLACEMENT_NO_VALID_POINT",
            Self::MissingTransform(_) => "PLACEMENT_MISSING_TRANSFORM",
        }
    }
}

/// Population accounting problems detected by the encounter director.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum DirectorError {
    #[error("defeated count {defeated} exceeds spawned count {spawned}")]
    StarvedWaveGeneration { spawned: u32, defeated: u32 },

    #[error("wave {wave} rolled no affordable archetype with budget {budget}")]
    EmptyWave { wave: u32, budget: u32 },
}

impl CombatError for DirectorError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::StarvedWaveGeneration { .. } => ErrorSeverity::Internal,
            Self::EmptyWave { .. } => ErrorSeverity::Recoverable,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::StarvedWaveGeneration { .. } => "DIRECTOR_STARVED_WAVE",
            Self::EmptyWave { .. } => "DIRECTOR_EMPTY_WAVE",
        }
    }
}

/// Archetype catalog validation failures.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum CatalogError {
    #[error("catalog is empty")]
    Empty,

    #[error("archetype `{0}` appears more than once")]
    DuplicateArchetype(String),

    #[error("archetype `{0}` has zero cost")]
    ZeroCost(String),

    #[error("archetype `{0}` defines no attacks")]
    NoAttacks(String),

    #[error("archetype `{name}` defines {count} attacks, at most {max} are supported")]
    TooManyAttacks {
        name: String,
        count: usize,
        max: usize,
    },

    #[error("archetype `{name}`: {field} must be positive (got {value})")]
    NonPositive {
        name: String,
        field: &'static str,
        value: f32,
    },
}

impl CombatError for CatalogError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::Empty => "CATALOG_EMPTY",
            Self::DuplicateArchetype(_) => "CATALOG_DUPLICATE",
            Self::ZeroCost(_) => "CATALOG_ZERO_COST",
            Self::NoAttacks(_) => "CATALOG_NO_ATTACKS",
            Self::TooManyAttacks { .. } => "CATALOG_TOO_MANY_ATTACKS",
            Self::NonPositive { .. } => "CATALOG_NON_POSITIVE",
        }
    }
}

/// A player action was refused. The world state is unchanged.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum PlayerActionError {
    #[error("the player is dead")]
    PlayerDead,

    #[error("special needs at least one charge ({souls} souls banked)")]
    NoCharges { souls: u32 },

    #[error("dodge is cooling down for {remaining_ticks} more ticks")]
    DodgeCooling { remaining_ticks: u64 },
}

impl CombatError for PlayerActionError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::PlayerDead => ErrorSeverity::Validation,
            Self::NoCharges { .. } | Self::DodgeCooling { .. } => ErrorSeverity::Recoverable,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::PlayerDead => "PLAYER_DEAD",
            Self::NoCharges { .. } => "PLAYER_NO_CHARGES",
            Self::DodgeCooling { .. } => "PLAYER_DODGE_COOLING",
        }
    }
}
