//! Decision policies that pick a skill and targets for the active combatant.

use crate::battle::skill_engine::check_usable;
use crate::battle::state::CombatState;
use crate::battle::targeting::valid_targets;
use crate::combatant::CombatantId;
use ordered_float::OrderedFloat;
use schema::{EffectDescriptor, EffectTarget, SkillDefinition};

/// A chosen skill slot and the targets requested for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub skill_slot: usize,
    pub targets: Vec<CombatantId>,
}

/// A trait for any system that can decide on a combat action.
/// Input layers and AI strategies both sit behind it.
pub trait DecisionPolicy {
    /// Inspects the combat state and picks an action for `actor`, or `None`
    /// if nothing is worth doing (the turn is passed).
    fn decide(&mut self, state: &CombatState, actor: CombatantId) -> Option<Decision>;
}

/// Uses the first usable skill that has something to do, aimed at the
/// legal target with the lowest health fraction.
#[derive(Debug, Clone, Copy, Default)]
pub struct LowestHealthPolicy;

impl LowestHealthPolicy {
    pub fn new() -> Self {
        Self
    }

    fn is_heal_only(skill: &SkillDefinition) -> bool {
        !skill.effects.is_empty()
            && skill
                .effects
                .iter()
                .all(|effect| matches!(effect, EffectDescriptor::Heal { .. }))
    }

    /// Status-only skills are wasted if every recipient already has the statuses.
    fn is_redundant_status(state: &CombatState, actor: CombatantId, skill: &SkillDefinition, target: CombatantId) -> bool {
        skill.effects.iter().all(|effect| match effect {
            EffectDescriptor::ApplyStatus { status, target: recipient } => {
                let owner = match recipient {
                    EffectTarget::User => actor,
                    EffectTarget::Targets => target,
                };
                state.effects.has_effect(owner, status.kind())
            }
            _ => false,
        })
    }
}

impl DecisionPolicy for LowestHealthPolicy {
    fn decide(&mut self, state: &CombatState, actor: CombatantId) -> Option<Decision> {
        let combatant = state.combatant(actor)?;

        for (slot, instance) in combatant.skills.iter().enumerate() {
            if check_usable(state, actor, slot).is_err() {
                continue;
            }
            let skill = &instance.skill;
            let mut candidates = valid_targets(state, actor, skill.target_type);

            if Self::is_heal_only(skill) {
                candidates.retain(|&id| state.combatant(id).is_some_and(|c| c.health_fraction() < 1.0));
            }

            let target = candidates
                .into_iter()
                .filter(|&id| !Self::is_redundant_status(state, actor, skill, id))
                .min_by_key(|&id| OrderedFloat(state.combatant(id).map_or(1.0, |c| c.health_fraction())));

            if let Some(target) = target {
                return Some(Decision {
                    skill_slot: slot,
                    targets: vec![target],
                });
            }
        }
        None
    }
}
