use crate::class_data::StatType;
use crate::status_data::StatusTemplate;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

pub const DEFAULT_CRIT_MULTIPLIER: f64 = 1.5;

/// Scope and faction constraint a skill places on its targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter)]
pub enum TargetType {
    SingleEnemy,
    SingleAlly,
    AllEnemies,
    AllAllies,
    /// The caster only.
    Caster,
    AnySingle,
    AnyAll,
}

impl TargetType {
    /// Area types resolve to every qualifying combatant.
    pub fn is_area(&self) -> bool {
        matches!(self, TargetType::AllEnemies | TargetType::AllAllies | TargetType::AnyAll)
    }
}

/// Physical damage is reduced by Defense, magical damage is not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum DamageKind {
    Physical,
    Magical,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DamageSpec {
    pub kind: DamageKind,
    pub base_damage: u32,
    pub scaling_stat: StatType,
    pub scaling: f64,
    /// Probability in [0, 1].
    pub crit_chance: f64,
    pub crit_multiplier: f64,
}

impl DamageSpec {
    pub fn physical(base_damage: u32, scaling_stat: StatType, scaling: f64) -> Self {
        Self {
            kind: DamageKind::Physical,
            base_damage,
            scaling_stat,
            scaling,
            crit_chance: 0.0,
            crit_multiplier: DEFAULT_CRIT_MULTIPLIER,
        }
    }

    /// Magical damage always scales on Intelligence.
    pub fn magical(base_damage: u32, scaling: f64) -> Self {
        Self {
            kind: DamageKind::Magical,
            base_damage,
            scaling_stat: StatType::Intelligence,
            scaling,
            crit_chance: 0.0,
            crit_multiplier: DEFAULT_CRIT_MULTIPLIER,
        }
    }

    pub fn with_crit_chance(mut self, crit_chance: f64) -> Self {
        self.crit_chance = crit_chance;
        self
    }

    pub fn with_crit_multiplier(mut self, crit_multiplier: f64) -> Self {
        self.crit_multiplier = crit_multiplier;
        self
    }
}

/// heal = caster INT × scaling + base_healing
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HealSpec {
    pub base_healing: u32,
    pub scaling: f64,
}

impl HealSpec {
    pub fn new(base_healing: u32, scaling: f64) -> Self {
        Self { base_healing, scaling }
    }
}

/// Who a heal or status descriptor lands on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EffectTarget {
    /// The caster, regardless of the resolved targets.
    User,
    /// Each resolved target.
    Targets,
}

/// One step of a skill, applied in declaration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EffectDescriptor {
    Damage(DamageSpec),
    Heal { spec: HealSpec, target: EffectTarget },
    ApplyStatus { status: StatusTemplate, target: EffectTarget },
}

/// Immutable skill definition. The per-combatant cooldown counter lives on
/// the combatant, not here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillDefinition {
    pub name: String,
    pub cooldown: u32,
    pub target_type: TargetType,
    pub effects: Vec<EffectDescriptor>,
}

impl SkillDefinition {
    pub fn new(name: impl Into<String>, cooldown: u32, target_type: TargetType) -> Self {
        Self {
            name: name.into(),
            cooldown,
            target_type,
            effects: Vec::new(),
        }
    }

    pub fn with_effect(mut self, effect: EffectDescriptor) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn with_damage(self, spec: DamageSpec) -> Self {
        self.with_effect(EffectDescriptor::Damage(spec))
    }

    pub fn with_heal(self, spec: HealSpec, target: EffectTarget) -> Self {
        self.with_effect(EffectDescriptor::Heal { spec, target })
    }

    pub fn with_status(self, status: StatusTemplate, target: EffectTarget) -> Self {
        self.with_effect(EffectDescriptor::ApplyStatus { status, target })
    }

    /// True if any descriptor deals damage.
    pub fn is_offensive(&self) -> bool {
        self.effects
            .iter()
            .any(|effect| matches!(effect, EffectDescriptor::Damage(_)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status_data::StatusKind;

    #[test]
    fn test_builder_keeps_declaration_order() {
        let skill = SkillDefinition::new("Searing Strike", 2, TargetType::SingleEnemy)
            .with_damage(DamageSpec::physical(10, StatType::Strength, 0.5))
            .with_status(StatusTemplate::burn(), EffectTarget::Targets);

        assert_eq!(skill.effects.len(), 2);
        assert!(matches!(skill.effects[0], EffectDescriptor::Damage(_)));
        assert!(matches!(
            skill.effects[1],
            EffectDescriptor::ApplyStatus { status, .. } if status.kind() == StatusKind::Burn
        ));
        assert!(skill.is_offensive());
    }

    #[test]
    fn test_damage_spec_defaults() {
        let spec = DamageSpec::magical(5, 1.2);
        assert_eq!(spec.scaling_stat, StatType::Intelligence);
        assert_eq!(spec.crit_chance, 0.0);
        assert_eq!(spec.crit_multiplier, DEFAULT_CRIT_MULTIPLIER);
    }

    #[test]
    fn test_area_target_types() {
        assert!(TargetType::AllEnemies.is_area());
        assert!(TargetType::AnyAll.is_area());
        assert!(!TargetType::Caster.is_area());
        assert!(!TargetType::AnySingle.is_area());
    }
}
