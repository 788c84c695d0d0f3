use crate::combatant::{round_to_u32, Combatant, CombatantId};
use crate::config::CombatConfig;
use schema::{ShieldPool, StatType, StatusKind, StatusTemplate};
use serde::{Deserialize, Serialize};

/// Kind-specific payload of a live status effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EffectKind {
    Burn,
    Bleed { stacks: u8 },
    Poison,
    /// `agility_penalty` is what was actually taken from the owner and is given back on removal.
    Slow { agility_penalty: u32 },
    Stun,
    StunImmunity,
    Shield { pool: u32 },
}

impl EffectKind {
    pub fn status_kind(&self) -> StatusKind {
        match self {
            EffectKind::Burn => StatusKind::Burn,
            EffectKind::Bleed { .. } => StatusKind::Bleed,
            EffectKind::Poison => StatusKind::Poison,
            EffectKind::Slow { .. } => StatusKind::Slow,
            EffectKind::Stun => StatusKind::Stun,
            EffectKind::StunImmunity => StatusKind::StunImmunity,
            EffectKind::Shield { .. } => StatusKind::Shield,
        }
    }
}

/// A status effect attached to one combatant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatusEffect {
    pub kind: EffectKind,
    pub caster: Option<CombatantId>,
    /// The caster's scaling stat captured when the effect was created.
    pub source_power: u32,
    pub duration: u32,
    pub remaining_duration: u32,
}

impl StatusEffect {
    pub fn new(kind: EffectKind, duration: u32) -> Self {
        Self {
            kind,
            caster: None,
            source_power: 0,
            duration,
            remaining_duration: duration,
        }
    }

    pub fn with_caster(mut self, caster: CombatantId, source_power: u32) -> Self {
        self.caster = Some(caster);
        self.source_power = source_power;
        self
    }

    pub fn burn(caster: CombatantId, intelligence: u32) -> Self {
        Self::new(EffectKind::Burn, CombatConfig::BURN_DURATION).with_caster(caster, intelligence)
    }

    pub fn bleed(caster: CombatantId, agility: u32) -> Self {
        Self::new(EffectKind::Bleed { stacks: 1 }, CombatConfig::BLEED_DURATION).with_caster(caster, agility)
    }

    pub fn poison(caster: CombatantId, agility: u32) -> Self {
        Self::new(EffectKind::Poison, CombatConfig::POISON_DURATION).with_caster(caster, agility)
    }

    pub fn slow() -> Self {
        Self::new(EffectKind::Slow { agility_penalty: 0 }, CombatConfig::SLOW_DURATION)
    }

    pub fn stun() -> Self {
        Self::new(EffectKind::Stun, CombatConfig::STUN_DURATION)
    }

    pub fn stun_immunity() -> Self {
        Self::new(EffectKind::StunImmunity, CombatConfig::STUN_IMMUNITY_DURATION)
    }

    /// A shield lasting until depleted. The pool is raised to the minimum if smaller.
    pub fn shield(pool: u32) -> Self {
        Self::new(
            EffectKind::Shield {
                pool: pool.max(CombatConfig::SHIELD_MIN_POOL),
            },
            0,
        )
    }

    /// Instantiates an authored template, snapshotting the caster's stats.
    pub fn from_template(template: &StatusTemplate, caster: Option<(CombatantId, &Combatant)>) -> Self {
        let stat = |stat: StatType| caster.map(|(_, c)| c.stat(stat)).unwrap_or(0);
        let duration = template.duration();

        let (kind, source_power) = match template {
            StatusTemplate::Burn { .. } => (EffectKind::Burn, stat(StatType::Intelligence)),
            StatusTemplate::Bleed { .. } => (EffectKind::Bleed { stacks: 1 }, stat(StatType::Agility)),
            StatusTemplate::Poison { .. } => (EffectKind::Poison, stat(StatType::Agility)),
            StatusTemplate::Slow { .. } => (EffectKind::Slow { agility_penalty: 0 }, 0),
            StatusTemplate::Stun { .. } => (EffectKind::Stun, 0),
            StatusTemplate::Shield { pool, .. } => {
                let pool = match pool {
                    ShieldPool::Flat(amount) => *amount,
                    ShieldPool::IntelligenceScaled(multiplier) => {
                        round_to_u32(stat(StatType::Intelligence) as f64 * multiplier)
                    }
                };
                (
                    EffectKind::Shield {
                        pool: pool.max(CombatConfig::SHIELD_MIN_POOL),
                    },
                    0,
                )
            }
        };

        Self {
            kind,
            caster: caster.map(|(id, _)| id),
            source_power,
            duration,
            remaining_duration: duration,
        }
    }

    pub fn status_kind(&self) -> StatusKind {
        self.kind.status_kind()
    }

    pub fn stacks(&self) -> u8 {
        match self.kind {
            EffectKind::Bleed { stacks } => stacks,
            _ => 1,
        }
    }

    pub fn shield_pool(&self) -> Option<u32> {
        match self.kind {
            EffectKind::Shield { pool } => Some(pool),
            _ => None,
        }
    }

    /// Shields with no duration only expire by depletion.
    pub fn is_expired(&self) -> bool {
        match self.kind {
            EffectKind::Shield { pool } => pool == 0 || (self.duration > 0 && self.remaining_duration == 0),
            _ => self.remaining_duration == 0,
        }
    }

    /// Whether turn-end reductions apply to this effect.
    pub fn is_timed(&self) -> bool {
        !matches!(self.kind, EffectKind::Shield { .. }) || self.duration > 0
    }

    /// Damage dealt at the owner's turn start, if this is a damage-over-time effect.
    pub fn tick_damage(&self) -> Option<u32> {
        let power = self.source_power as f64;
        let damage = match self.kind {
            EffectKind::Burn => round_to_u32(power * CombatConfig::BURN_INT_RATIO),
            EffectKind::Bleed { stacks } => round_to_u32(power * CombatConfig::BLEED_AGI_RATIO * stacks as f64),
            EffectKind::Poison => round_to_u32(power * CombatConfig::POISON_AGI_RATIO),
            _ => return None,
        };
        Some(damage.max(CombatConfig::MIN_DAMAGE))
    }

    /// Fraction removed from incoming heals while this effect is active.
    pub fn heal_reduction(&self) -> f64 {
        match self.kind {
            EffectKind::Poison => CombatConfig::POISON_HEAL_REDUCTION,
            _ => 0.0,
        }
    }
}
