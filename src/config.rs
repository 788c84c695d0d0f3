//! Formula constants and runner configuration.

use serde::{Deserialize, Serialize};

/// Numeric constants of the combat formulas. Changing any of these breaks
/// parity with recorded balance data.
pub struct CombatConfig;

impl CombatConfig {
    /// Each level above 1 adds 10% to every template stat.
    pub const LEVEL_SCALING_PERCENT: u32 = 10;
    pub const HEALTH_PER_VITALITY: u32 = 10;
    pub const DEFAULT_CRIT_MULTIPLIER: f64 = schema::DEFAULT_CRIT_MULTIPLIER;
    /// Floor for any damage instance from a skill or a damage-over-time tick.
    pub const MIN_DAMAGE: u32 = 1;

    pub const BURN_INT_RATIO: f64 = 0.25;
    pub const BLEED_AGI_RATIO: f64 = 0.20;
    pub const POISON_AGI_RATIO: f64 = 0.15;
    pub const POISON_HEAL_REDUCTION: f64 = 0.25;
    pub const SLOW_AGI_RATIO: f64 = 0.10;
    pub const SHIELD_MIN_POOL: u32 = 5;

    pub const BURN_DURATION: u32 = schema::DEFAULT_BURN_DURATION;
    pub const BLEED_DURATION: u32 = schema::DEFAULT_BLEED_DURATION;
    pub const POISON_DURATION: u32 = schema::DEFAULT_POISON_DURATION;
    pub const SLOW_DURATION: u32 = schema::DEFAULT_SLOW_DURATION;
    pub const STUN_DURATION: u32 = schema::DEFAULT_STUN_DURATION;
    pub const STUN_IMMUNITY_DURATION: u32 = schema::STUN_IMMUNITY_DURATION;
}

/// Settings for driving a whole encounter with a decision policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Seed for tie-breaks and critical hits. `None` draws from entropy.
    pub seed: Option<u64>,
    /// Turns after which a simulation is abandoned as a stalemate.
    pub max_turns: u32,
    /// Emit every event as a JSON line instead of formatted text.
    pub json_events: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            seed: None,
            max_turns: 200,
            json_events: false,
        }
    }
}

impl RunnerConfig {
    pub fn from_ron_str(source: &str) -> Result<Self, ron::error::SpannedError> {
        ron::from_str(source)
    }
}
