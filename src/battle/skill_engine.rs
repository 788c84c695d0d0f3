use crate::battle::calculators::calculate_effect_commands;
use crate::battle::commands::{execute_command, execute_command_batch, CombatCommand};
use crate::battle::state::{CombatEvent, CombatRng, CombatState, EventBus};
use crate::battle::targeting::resolve_targets;
use crate::combatant::CombatantId;
use crate::errors::{ActionError, CombatResult};
use schema::StatusKind;
use tracing::{debug, warn};

/// Summary of one skill execution, derived from the events it produced.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SkillOutcome {
    pub skill: String,
    pub targets: Vec<CombatantId>,
    pub damage_dealt: u32,
    pub healing_done: u32,
    pub critical_hits: u32,
    pub deaths: Vec<CombatantId>,
}

impl SkillOutcome {
    fn from_events(skill: String, targets: Vec<CombatantId>, events: &[CombatEvent]) -> Self {
        let mut outcome = SkillOutcome {
            skill,
            targets,
            ..Default::default()
        };
        for event in events {
            match event {
                CombatEvent::DamageDealt { amount, .. } => outcome.damage_dealt += amount,
                CombatEvent::Healed { amount, .. } => outcome.healing_done += amount,
                CombatEvent::CriticalHit { .. } => outcome.critical_hits += 1,
                CombatEvent::CombatantDied { combatant } => outcome.deaths.push(*combatant),
                _ => {}
            }
        }
        outcome
    }
}

/// Checks that `caster` may use the skill in `slot` right now.
pub fn check_usable(state: &CombatState, caster: CombatantId, slot: usize) -> Result<(), ActionError> {
    let combatant = state
        .combatant(caster)
        .ok_or(ActionError::UnknownCombatant(caster))?;
    if combatant.is_dead() {
        return Err(ActionError::CasterDead(caster));
    }
    if state.effects.has_effect(caster, StatusKind::Stun) {
        return Err(ActionError::TurnSkipped(caster));
    }
    let instance = combatant
        .skill(slot)
        .ok_or(ActionError::UnknownSkill { caster, slot })?;
    if !instance.is_ready() {
        return Err(ActionError::OnCooldown {
            skill: instance.skill.name.clone(),
            remaining: instance.current_cooldown,
        });
    }
    Ok(())
}

/// Uses the skill in `slot` of `caster` against `requested` targets.
///
/// Descriptors are applied in declaration order, each against the state left
/// by the previous one; targets killed part-way are skipped by later
/// descriptors. The skill then goes on cooldown unless the caster is in
/// overdrive. A rejected request changes nothing.
pub fn execute_skill(
    state: &mut CombatState,
    rng: &mut CombatRng,
    bus: &mut EventBus,
    caster: CombatantId,
    slot: usize,
    requested: &[CombatantId],
) -> CombatResult<SkillOutcome> {
    let prepared = check_usable(state, caster, slot).and_then(|()| {
        let skill = state.combatants[caster.0].skills[slot].skill.clone();
        let targets = resolve_targets(state, caster, &skill, requested)?;
        Ok((skill, targets))
    });
    let (skill, targets) = match prepared {
        Ok(prepared) => prepared,
        Err(error) => {
            warn!(combatant = %caster, slot, %error, "skill rejected");
            return Err(error.into());
        }
    };

    debug!(combatant = %caster, skill = %skill.name, ?targets, "executing skill");
    let start = bus.len();
    bus.push(CombatEvent::SkillUsed {
        caster,
        skill: skill.name.clone(),
        targets: targets.clone(),
    });

    for descriptor in &skill.effects {
        let commands = calculate_effect_commands(state, caster, descriptor, &targets, rng);
        execute_command_batch(commands, state, bus)?;
    }

    if !state.combatants[caster.0].modifiers.overdrive {
        execute_command(CombatCommand::StartCooldown { caster, slot }, state, bus)?;
    }

    Ok(SkillOutcome::from_events(skill.name, targets, &bus.events()[start..]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combatant::{CombatantBuilder, Faction};
    use crate::errors::{CombatError, ErrorKind};
    use pretty_assertions::assert_eq;
    use schema::{ClassTemplate, DamageSpec, SkillDefinition, StatBlock, StatType, TargetType};

    fn setup() -> (CombatState, CombatantId, CombatantId) {
        let warrior = ClassTemplate::new("Warrior", StatBlock::new(15, 10, 5, 8, 12), 50);
        let dummy = ClassTemplate::new("Dummy", StatBlock::new(5, 5, 5, 5, 5), 50);
        let strike = SkillDefinition::new("Strike", 2, TargetType::SingleEnemy)
            .with_damage(DamageSpec::physical(20, StatType::Strength, 0.6));

        let mut state = CombatState::new();
        let hero = state.add_combatant(CombatantBuilder::new("Brom", &warrior).skill(strike).build());
        let foe = state.add_combatant(CombatantBuilder::new("Dummy", &dummy).faction(Faction::ENEMY).build());
        (state, hero, foe)
    }

    #[test]
    fn test_execute_deals_damage_and_starts_cooldown() {
        let (mut state, hero, foe) = setup();
        let mut rng = CombatRng::new_for_test(vec![]);
        let mut bus = EventBus::new();

        let outcome = execute_skill(&mut state, &mut rng, &mut bus, hero, 0, &[foe]).unwrap();
        assert_eq!(outcome.damage_dealt, 24);
        assert_eq!(outcome.targets, vec![foe]);
        assert_eq!(state.combatant(foe).unwrap().current_health(), 100 - 24);
        assert_eq!(state.combatant(hero).unwrap().skill(0).unwrap().current_cooldown, 2);
    }

    #[test]
    fn test_cooldown_rejection_leaves_state_unchanged() {
        let (mut state, hero, foe) = setup();
        let mut rng = CombatRng::new_for_test(vec![]);
        let mut bus = EventBus::new();
        execute_skill(&mut state, &mut rng, &mut bus, hero, 0, &[foe]).unwrap();
        let events_before = bus.len();

        let err = execute_skill(&mut state, &mut rng, &mut bus, hero, 0, &[foe]).unwrap_err();
        assert_eq!(
            err,
            CombatError::Action(ActionError::OnCooldown {
                skill: "Strike".to_string(),
                remaining: 2,
            })
        );
        assert_eq!(err.kind(), ErrorKind::UnusableAction);
        assert_eq!(bus.len(), events_before);
        assert_eq!(state.combatant(foe).unwrap().current_health(), 76);
    }

    #[test]
    fn test_overdrive_skips_cooldown() {
        let (mut state, hero, foe) = setup();
        state.combatant_mut(hero).unwrap().set_overdrive(true);
        let mut rng = CombatRng::new_for_test(vec![]);
        let mut bus = EventBus::new();
        execute_skill(&mut state, &mut rng, &mut bus, hero, 0, &[foe]).unwrap();
        execute_skill(&mut state, &mut rng, &mut bus, hero, 0, &[foe]).unwrap();
        assert_eq!(state.combatant(foe).unwrap().current_health(), 100 - 48);
        assert!(state.combatant(hero).unwrap().skill(0).unwrap().is_ready());
    }

    #[test]
    fn test_dead_caster_and_missing_slot() {
        let (mut state, hero, foe) = setup();
        let mut rng = CombatRng::new_for_test(vec![]);
        let mut bus = EventBus::new();

        let err = execute_skill(&mut state, &mut rng, &mut bus, hero, 3, &[foe]).unwrap_err();
        assert_eq!(err, CombatError::Action(ActionError::UnknownSkill { caster: hero, slot: 3 }));

        state.combatant_mut(hero).unwrap().take_damage(10_000);
        let err = execute_skill(&mut state, &mut rng, &mut bus, hero, 0, &[foe]).unwrap_err();
        assert_eq!(err, CombatError::Action(ActionError::CasterDead(hero)));
        assert!(bus.is_empty());
    }
}
