use crate::battle::conditions::StatusEffect;
use crate::battle::state::{CombatEvent, CombatState, EventBus};
use crate::combatant::CombatantId;
use crate::errors::{ActionError, CombatError};
use tracing::warn;

/// Atomic commands representing final state changes
#[derive(Debug, Clone, PartialEq)]
pub enum CombatCommand {
    // Combatant modifications
    DealDamage {
        target: CombatantId,
        amount: u32,
    },
    Heal {
        target: CombatantId,
        amount: u32,
    },
    ApplyStatus {
        target: CombatantId,
        effect: StatusEffect,
    },
    StartCooldown {
        caster: CombatantId,
        slot: usize,
    },

    // Combat flow
    EmitEvent(CombatEvent),
}

/// Execute a single command against the combat state.
///
/// Damage and healing are routed through the status effect engine so that
/// shields and healing reduction apply.
pub fn execute_command(command: CombatCommand, state: &mut CombatState, bus: &mut EventBus) -> Result<(), CombatError> {
    match command {
        CombatCommand::DealDamage { target, amount } => {
            state
                .effects
                .damage_through_shields(&mut state.combatants, target, amount, bus);
        }
        CombatCommand::Heal { target, amount } => {
            state
                .effects
                .heal_through_effects(&mut state.combatants, target, amount, bus);
        }
        CombatCommand::ApplyStatus { target, effect } => {
            // A rejected application is not a failure of the command.
            state
                .effects
                .apply_effect(&mut state.combatants, target, effect, bus)?;
        }
        CombatCommand::StartCooldown { caster, slot } => {
            let combatant = state
                .combatant_mut(caster)
                .ok_or(ActionError::UnknownCombatant(caster))?;
            match combatant.skill_mut(slot) {
                Some(instance) => instance.start_cooldown(),
                None => {
                    warn!(combatant = %caster, slot, "cooldown for missing skill slot");
                    return Err(ActionError::UnknownSkill { caster, slot }.into());
                }
            }
        }
        CombatCommand::EmitEvent(event) => bus.push(event),
    }
    Ok(())
}

/// Execute a batch of commands in order, stopping at the first failure.
pub fn execute_command_batch(
    commands: Vec<CombatCommand>,
    state: &mut CombatState,
    bus: &mut EventBus,
) -> Result<(), CombatError> {
    for command in commands {
        execute_command(command, state, bus)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combatant::CombatantBuilder;
    use pretty_assertions::assert_eq;
    use schema::{ClassTemplate, SkillDefinition, StatBlock, StatusKind, TargetType};

    fn state() -> (CombatState, CombatantId) {
        let template = ClassTemplate::new("Dummy", StatBlock::new(5, 5, 5, 5, 5), 50);
        let mut state = CombatState::new();
        let id = state.add_combatant(
            CombatantBuilder::new("Dummy", &template)
                .skill(SkillDefinition::new("Bash", 2, TargetType::SingleEnemy))
                .build(),
        );
        (state, id)
    }

    #[test]
    fn test_batch_applies_in_order() {
        let (mut state, id) = state();
        let mut bus = EventBus::new();
        let commands = vec![
            CombatCommand::ApplyStatus {
                target: id,
                effect: StatusEffect::shield(10),
            },
            CombatCommand::DealDamage { target: id, amount: 15 },
            CombatCommand::Heal { target: id, amount: 2 },
            CombatCommand::StartCooldown { caster: id, slot: 0 },
        ];
        execute_command_batch(commands, &mut state, &mut bus).unwrap();

        let dummy = state.combatant(id).unwrap();
        assert_eq!(dummy.current_health(), 100 - 5 + 2);
        assert_eq!(dummy.skill(0).unwrap().current_cooldown, 2);
        assert!(!state.effects.has_effect(id, StatusKind::Shield));
    }

    #[test]
    fn test_cooldown_on_missing_slot_fails() {
        let (mut state, id) = state();
        let mut bus = EventBus::new();
        let result = execute_command(CombatCommand::StartCooldown { caster: id, slot: 4 }, &mut state, &mut bus);
        assert_eq!(result, Err(ActionError::UnknownSkill { caster: id, slot: 4 }.into()));
    }
}
