use crate::battle::commands::CombatCommand;
use crate::battle::conditions::StatusEffect;
use crate::battle::state::{CombatEvent, CombatRng, CombatState};
use crate::combatant::{round_half_up, round_to_u32, Combatant, CombatantId};
use crate::config::CombatConfig;
use schema::{DamageKind, DamageSpec, EffectDescriptor, EffectTarget, HealSpec, StatType};

/// Result of one damage calculation against one target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DamageRoll {
    pub amount: u32,
    pub critical: bool,
}

/// Defense subtracted from physical damage: round(DEF × defense_modifier).
pub fn effective_defense(target: &Combatant) -> i64 {
    round_half_up(target.stat(StatType::Defense) as f64 * target.modifiers.defense_modifier)
}

/// round(stat × scaling) + base − defense, before modifiers and crits.
/// May be zero or negative; the floor is applied at the end.
pub fn base_damage(caster: &Combatant, target: &Combatant, spec: &DamageSpec) -> i64 {
    let scaled = round_half_up(caster.stat(spec.scaling_stat) as f64 * spec.scaling);
    let defense = match spec.kind {
        DamageKind::Physical => effective_defense(target),
        DamageKind::Magical => 0,
    };
    scaled + spec.base_damage as i64 - defense
}

/// The skill's crit chance plus the caster's crit modifier, clamped to [0, 1].
pub fn crit_chance(caster: &Combatant, spec: &DamageSpec) -> f64 {
    (spec.crit_chance + caster.modifiers.crit_modifier).clamp(0.0, 1.0)
}

/// Full damage formula. Rolls the rng only when a crit is possible.
pub fn calculate_damage(
    caster: &Combatant,
    target: &Combatant,
    spec: &DamageSpec,
    rng: &mut CombatRng,
) -> DamageRoll {
    let mut damage = base_damage(caster, target, spec) as f64 * caster.modifiers.damage_modifier;

    let chance = crit_chance(caster, spec);
    let critical = chance > 0.0 && rng.roll_percent("critical hit") as f64 <= chance * 100.0;
    if critical {
        damage *= spec.crit_multiplier;
    }

    let amount = round_half_up(damage).clamp(CombatConfig::MIN_DAMAGE as i64, u32::MAX as i64) as u32;
    DamageRoll { amount, critical }
}

/// round(INT × scaling + base_healing). Healing reduction is applied on receipt.
pub fn calculate_heal(caster: &Combatant, spec: &HealSpec) -> u32 {
    round_to_u32(caster.stat(StatType::Intelligence) as f64 * spec.scaling + spec.base_healing as f64)
}

/// Translates one effect descriptor into the commands that carry it out
/// against the current state. Dead recipients are skipped.
pub fn calculate_effect_commands(
    state: &CombatState,
    caster_id: CombatantId,
    effect: &EffectDescriptor,
    targets: &[CombatantId],
    rng: &mut CombatRng,
) -> Vec<CombatCommand> {
    let mut commands = Vec::new();
    let Some(caster) = state.combatant(caster_id) else {
        return commands;
    };

    let recipients = |target: &EffectTarget| -> Vec<CombatantId> {
        match target {
            EffectTarget::User => vec![caster_id],
            EffectTarget::Targets => targets.to_vec(),
        }
    };

    match effect {
        EffectDescriptor::Damage(spec) => {
            for &target_id in targets {
                let Some(target) = state.combatant(target_id).filter(|c| c.is_alive()) else {
                    continue;
                };
                let roll = calculate_damage(caster, target, spec, rng);
                if roll.critical {
                    commands.push(CombatCommand::EmitEvent(CombatEvent::CriticalHit {
                        caster: caster_id,
                        target: target_id,
                    }));
                }
                commands.push(CombatCommand::DealDamage {
                    target: target_id,
                    amount: roll.amount,
                });
            }
        }
        EffectDescriptor::Heal { spec, target } => {
            let amount = calculate_heal(caster, spec);
            for target_id in recipients(target) {
                if state.is_alive(target_id) {
                    commands.push(CombatCommand::Heal {
                        target: target_id,
                        amount,
                    });
                }
            }
        }
        EffectDescriptor::ApplyStatus { status, target } => {
            let effect = StatusEffect::from_template(status, Some((caster_id, caster)));
            for target_id in recipients(target) {
                if state.is_alive(target_id) {
                    commands.push(CombatCommand::ApplyStatus {
                        target: target_id,
                        effect,
                    });
                }
            }
        }
    }

    commands
}
