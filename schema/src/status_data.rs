use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

pub const DEFAULT_BURN_DURATION: u32 = 2;
pub const DEFAULT_BLEED_DURATION: u32 = 3;
pub const DEFAULT_POISON_DURATION: u32 = 3;
pub const DEFAULT_SLOW_DURATION: u32 = 2;
pub const DEFAULT_STUN_DURATION: u32 = 1;
pub const STUN_IMMUNITY_DURATION: u32 = 1;

/// Status effect kinds without payload. Two effects are "the same effect"
/// when their kinds match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display, EnumIter)]
pub enum StatusKind {
    Burn,
    Bleed,
    Poison,
    Slow,
    Stun,
    #[strum(to_string = "Stun Immunity")]
    StunImmunity,
    Shield,
}

impl StatusKind {
    /// Maximum stack count. Kinds with a cap of 1 do not stack.
    pub fn stack_cap(&self) -> u8 {
        match self {
            StatusKind::Bleed => 3,
            _ => 1,
        }
    }

    pub fn is_stacking(&self) -> bool {
        self.stack_cap() > 1
    }
}

/// How a shield's absorption pool is sized.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ShieldPool {
    Flat(u32),
    /// round(caster INT × multiplier)
    IntelligenceScaled(f64),
}

/// A status effect as authored on a skill. Durations are in owner turns.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum StatusTemplate {
    Burn { duration: u32 },
    Bleed { duration: u32 },
    Poison { duration: u32 },
    Slow { duration: u32 },
    Stun { duration: u32 },
    /// A duration of 0 keeps the shield until its pool is depleted.
    Shield { pool: ShieldPool, duration: u32 },
}

impl StatusTemplate {
    pub fn burn() -> Self {
        StatusTemplate::Burn { duration: DEFAULT_BURN_DURATION }
    }

    pub fn bleed() -> Self {
        StatusTemplate::Bleed { duration: DEFAULT_BLEED_DURATION }
    }

    pub fn poison() -> Self {
        StatusTemplate::Poison { duration: DEFAULT_POISON_DURATION }
    }

    pub fn slow() -> Self {
        StatusTemplate::Slow { duration: DEFAULT_SLOW_DURATION }
    }

    pub fn stun() -> Self {
        StatusTemplate::Stun { duration: DEFAULT_STUN_DURATION }
    }

    pub fn shield(pool: ShieldPool) -> Self {
        StatusTemplate::Shield { pool, duration: 0 }
    }

    pub fn kind(&self) -> StatusKind {
        match self {
            StatusTemplate::Burn { .. } => StatusKind::Burn,
            StatusTemplate::Bleed { .. } => StatusKind::Bleed,
            StatusTemplate::Poison { .. } => StatusKind::Poison,
            StatusTemplate::Slow { .. } => StatusKind::Slow,
            StatusTemplate::Stun { .. } => StatusKind::Stun,
            StatusTemplate::Shield { .. } => StatusKind::Shield,
        }
    }

    pub fn duration(&self) -> u32 {
        match self {
            StatusTemplate::Burn { duration }
            | StatusTemplate::Bleed { duration }
            | StatusTemplate::Poison { duration }
            | StatusTemplate::Slow { duration }
            | StatusTemplate::Stun { duration }
            | StatusTemplate::Shield { duration, .. } => *duration,
        }
    }
}
