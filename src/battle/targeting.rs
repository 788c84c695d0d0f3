use crate::battle::state::CombatState;
use crate::combatant::CombatantId;
use crate::errors::ActionError;
use schema::{SkillDefinition, TargetType};

/// True if `other` is outside `caster`'s faction.
pub fn is_enemy(state: &CombatState, caster: CombatantId, other: CombatantId) -> bool {
    match (state.combatant(caster), state.combatant(other)) {
        (Some(a), Some(b)) => a.faction != b.faction,
        _ => false,
    }
}

/// Every living combatant `caster` may target with `target_type`, in roster order.
/// Allies include the caster.
pub fn valid_targets(state: &CombatState, caster: CombatantId, target_type: TargetType) -> Vec<CombatantId> {
    if !state.is_alive(caster) {
        return Vec::new();
    }
    state
        .living_ids()
        .into_iter()
        .filter(|&id| match target_type {
            TargetType::SingleEnemy | TargetType::AllEnemies => is_enemy(state, caster, id),
            TargetType::SingleAlly | TargetType::AllAllies => !is_enemy(state, caster, id),
            TargetType::Caster => id == caster,
            TargetType::AnySingle | TargetType::AnyAll => true,
        })
        .collect()
}

/// Validates the requested targets for `skill` and expands them.
///
/// Every requested target must be legal. Area skills hit every legal
/// target; single-target skills hit the first requested one.
pub fn resolve_targets(
    state: &CombatState,
    caster: CombatantId,
    skill: &SkillDefinition,
    requested: &[CombatantId],
) -> Result<Vec<CombatantId>, ActionError> {
    let candidates = valid_targets(state, caster, skill.target_type);
    let Some(&first) = requested.first() else {
        return Err(ActionError::NoTargets);
    };
    if candidates.is_empty() {
        return Err(ActionError::NoTargets);
    }
    if let Some(&invalid) = requested.iter().find(|id| !candidates.contains(id)) {
        return Err(ActionError::InvalidTarget {
            skill: skill.name.clone(),
            target: invalid,
        });
    }

    if skill.target_type.is_area() {
        Ok(candidates)
    } else {
        Ok(vec![first])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combatant::{CombatantBuilder, Faction};
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use schema::{ClassTemplate, StatBlock};

    /// Two heroes (0, 1), two goblins (2, 3), goblin 3 dead.
    fn state() -> CombatState {
        let template = ClassTemplate::new("Dummy", StatBlock::new(5, 5, 5, 5, 5), 50);
        let mut state = CombatState::new();
        for (name, faction) in [
            ("Hero", Faction::PLAYER),
            ("Squire", Faction::PLAYER),
            ("Goblin", Faction::ENEMY),
            ("Goblin Corpse", Faction::ENEMY),
        ] {
            state.add_combatant(CombatantBuilder::new(name, &template).faction(faction).build());
        }
        state.combatant_mut(CombatantId(3)).unwrap().take_damage(10_000);
        state
    }

    #[rstest]
    #[case(TargetType::SingleEnemy, vec![2])]
    #[case(TargetType::AllEnemies, vec![2])]
    #[case(TargetType::SingleAlly, vec![0, 1])]
    #[case(TargetType::AllAllies, vec![0, 1])]
    #[case(TargetType::Caster, vec![0])]
    #[case(TargetType::AnySingle, vec![0, 1, 2])]
    #[case(TargetType::AnyAll, vec![0, 1, 2])]
    fn test_valid_targets(#[case] target_type: TargetType, #[case] expected: Vec<usize>) {
        let expected: Vec<CombatantId> = expected.into_iter().map(CombatantId).collect();
        assert_eq!(valid_targets(&state(), CombatantId(0), target_type), expected);
    }

    #[test]
    fn test_dead_caster_has_no_targets() {
        assert!(valid_targets(&state(), CombatantId(3), TargetType::AnyAll).is_empty());
    }

    #[test]
    fn test_resolve_area_expands_to_all_candidates() {
        let skill = SkillDefinition::new("Rally", 0, TargetType::AllAllies);
        let resolved = resolve_targets(&state(), CombatantId(0), &skill, &[CombatantId(1)]);
        assert_eq!(resolved, Ok(vec![CombatantId(0), CombatantId(1)]));
    }

    #[test]
    fn test_resolve_single_uses_first_request() {
        let skill = SkillDefinition::new("Mend", 0, TargetType::AnySingle);
        let resolved = resolve_targets(&state(), CombatantId(0), &skill, &[CombatantId(2), CombatantId(1)]);
        assert_eq!(resolved, Ok(vec![CombatantId(2)]));
    }

    #[test]
    fn test_resolve_rejects_illegal_and_empty_requests() {
        let skill = SkillDefinition::new("Stab", 0, TargetType::SingleEnemy);
        assert_eq!(
            resolve_targets(&state(), CombatantId(0), &skill, &[]),
            Err(ActionError::NoTargets)
        );
        assert_eq!(
            resolve_targets(&state(), CombatantId(0), &skill, &[CombatantId(1)]),
            Err(ActionError::InvalidTarget {
                skill: "Stab".to_string(),
                target: CombatantId(1),
            })
        );
        assert_eq!(
            resolve_targets(&state(), CombatantId(0), &skill, &[CombatantId(3)]),
            Err(ActionError::InvalidTarget {
                skill: "Stab".to_string(),
                target: CombatantId(3),
            })
        );
    }
}
