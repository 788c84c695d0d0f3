use crate::battle::conditions::{EffectKind, StatusEffect};
use crate::battle::state::{CombatEvent, EventBus, RemovalReason};
use crate::combatant::{round_to_u32, Combatant, CombatantId, DamageTaken};
use crate::config::CombatConfig;
use crate::errors::StatusError;
use schema::{StatType, StatusKind};
use std::collections::BTreeMap;
use tracing::warn;

/// What happened when a combatant's effects ticked at turn start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickOutcome {
    /// A Stun was active; the owner loses this turn.
    pub skip_turn: bool,
    pub damage_taken: u32,
    pub died: bool,
}

/// Per-combatant status effect collections.
///
/// The engine owns effect bookkeeping only. Health and stats live on the
/// combatants and are changed through `take_damage`, `heal`, `reduce_stat`
/// and `restore_stat`, so every method that touches them takes the roster.
#[derive(Debug, Clone, Default)]
pub struct StatusEffectEngine {
    collections: BTreeMap<CombatantId, Vec<StatusEffect>>,
}

impl StatusEffectEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_combatant(&mut self, id: CombatantId) {
        self.collections.entry(id).or_default();
    }

    /// Detaches the collection without running removal hooks.
    pub fn unregister_combatant(&mut self, id: CombatantId) -> bool {
        self.collections.remove(&id).is_some()
    }

    pub fn is_registered(&self, id: CombatantId) -> bool {
        self.collections.contains_key(&id)
    }

    pub fn effects(&self, id: CombatantId) -> Option<&[StatusEffect]> {
        self.collections.get(&id).map(Vec::as_slice)
    }

    pub fn get_effect(&self, id: CombatantId, kind: StatusKind) -> Option<&StatusEffect> {
        self.collections
            .get(&id)?
            .iter()
            .find(|effect| effect.status_kind() == kind)
    }

    pub fn has_effect(&self, id: CombatantId, kind: StatusKind) -> bool {
        self.get_effect(id, kind).is_some()
    }

    fn collection_mut(&mut self, id: CombatantId) -> Result<&mut Vec<StatusEffect>, StatusError> {
        self.collections.get_mut(&id).ok_or_else(|| {
            warn!(combatant = %id, "status operation on unregistered combatant");
            StatusError::NotRegistered(id)
        })
    }

    fn check_target(&self, roster: &[Combatant], id: CombatantId) -> Result<(), StatusError> {
        if roster.get(id.0).is_none() {
            warn!(combatant = %id, "status operation on unknown combatant");
            return Err(StatusError::UnknownCombatant(id));
        }
        if !self.is_registered(id) {
            warn!(combatant = %id, "status operation on unregistered combatant");
            return Err(StatusError::NotRegistered(id));
        }
        Ok(())
    }

    /// Attaches `effect` to `target`.
    ///
    /// Returns `Ok(false)` when the application is rejected: a non-stacking
    /// kind already present, a weaker or equal shield, a stun against an
    /// immune target, or a dead target.
    pub fn apply_effect(
        &mut self,
        roster: &mut [Combatant],
        target: CombatantId,
        mut effect: StatusEffect,
        bus: &mut EventBus,
    ) -> Result<bool, StatusError> {
        self.check_target(roster, target)?;
        let owner = &mut roster[target.0];
        if owner.is_dead() {
            warn!(combatant = %target, kind = %effect.status_kind(), "cannot apply effect to a dead combatant");
            return Ok(false);
        }
        let kind = effect.status_kind();

        if kind == StatusKind::Stun && self.has_effect(target, StatusKind::StunImmunity) {
            warn!(combatant = %target, "stun rejected by stun immunity");
            return Ok(false);
        }

        if let Some(existing) = self.get_effect(target, kind).copied() {
            match (existing.kind, effect.kind) {
                (EffectKind::Bleed { stacks }, _) => {
                    let stacks = (stacks + 1).min(kind.stack_cap());
                    let collection = self.collection_mut(target)?;
                    if let Some(slot) = collection.iter_mut().find(|e| e.status_kind() == kind) {
                        slot.kind = EffectKind::Bleed { stacks };
                        slot.duration = effect.duration;
                        slot.remaining_duration = effect.duration;
                        if let Some(caster) = effect.caster {
                            slot.caster = Some(caster);
                            slot.source_power = effect.source_power;
                        }
                    }
                    bus.push(CombatEvent::EffectRefreshed {
                        target,
                        kind,
                        stacks,
                        duration: effect.duration,
                    });
                    return Ok(true);
                }
                (EffectKind::Shield { pool: old }, EffectKind::Shield { pool: new }) if new > old => {
                    self.remove(roster, target, kind, RemovalReason::Replaced, bus)?;
                }
                _ => {
                    warn!(combatant = %target, %kind, "effect already present");
                    return Ok(false);
                }
            }
        }

        // On-apply hooks
        let owner = &mut roster[target.0];
        if let EffectKind::Slow { .. } = effect.kind {
            let penalty = round_to_u32(owner.base_stat(StatType::Agility) as f64 * CombatConfig::SLOW_AGI_RATIO);
            let applied = owner.reduce_stat(StatType::Agility, penalty);
            effect.kind = EffectKind::Slow {
                agility_penalty: applied,
            };
        }

        self.collection_mut(target)?.push(effect);
        bus.push(CombatEvent::EffectApplied {
            target,
            kind,
            stacks: effect.stacks(),
            duration: effect.duration,
        });
        Ok(true)
    }

    /// Runs every effect's periodic behaviour at the start of `target`'s turn.
    ///
    /// Damage-over-time goes through shields. Ticking stops early if the
    /// owner dies. Anything expired is purged before and after.
    pub fn tick_all_effects(
        &mut self,
        roster: &mut [Combatant],
        target: CombatantId,
        bus: &mut EventBus,
    ) -> Result<TickOutcome, StatusError> {
        self.check_target(roster, target)?;
        let mut outcome = TickOutcome::default();
        if roster[target.0].is_dead() {
            return Ok(outcome);
        }

        self.purge_expired(roster, target, bus)?;

        let ticking: Vec<StatusEffect> = self.effects(target).unwrap_or_default().to_vec();
        for effect in ticking {
            if effect.kind == EffectKind::Stun {
                outcome.skip_turn = true;
            }
            let Some(damage) = effect.tick_damage() else {
                continue;
            };
            bus.push(CombatEvent::EffectTicked {
                target,
                kind: effect.status_kind(),
                damage,
            });
            let taken = self.damage_through_shields(roster, target, damage, bus);
            outcome.damage_taken += taken.dealt;
            if taken.died {
                outcome.died = true;
                break;
            }
        }

        self.purge_expired(roster, target, bus)?;
        Ok(outcome)
    }

    /// Decrements every timed effect on `target` by one turn and removes
    /// what reached zero.
    pub fn reduce_all_effect_durations(
        &mut self,
        roster: &mut [Combatant],
        target: CombatantId,
        bus: &mut EventBus,
    ) -> Result<(), StatusError> {
        self.check_target(roster, target)?;
        for effect in self.collection_mut(target)?.iter_mut() {
            if effect.is_timed() {
                effect.remaining_duration = effect.remaining_duration.saturating_sub(1);
            }
        }
        self.purge_expired(roster, target, bus)
    }

    /// Dispels one effect. Returns false if it was not present.
    pub fn remove_effect(
        &mut self,
        roster: &mut [Combatant],
        target: CombatantId,
        kind: StatusKind,
        bus: &mut EventBus,
    ) -> Result<bool, StatusError> {
        self.check_target(roster, target)?;
        self.remove(roster, target, kind, RemovalReason::Dispelled, bus)
    }

    /// Removes every effect on `target`. Stat changes are reverted but no
    /// stun immunity is granted.
    pub fn clear_all_effects(
        &mut self,
        roster: &mut [Combatant],
        target: CombatantId,
        bus: &mut EventBus,
    ) -> Result<(), StatusError> {
        self.check_target(roster, target)?;
        let kinds: Vec<StatusKind> = self.effects(target).unwrap_or_default().iter().map(StatusEffect::status_kind).collect();
        for kind in kinds {
            self.remove(roster, target, kind, RemovalReason::Cleared, bus)?;
        }
        Ok(())
    }

    /// Routes an incoming damage instance through any shield on `target`
    /// before applying the remainder to health.
    pub fn damage_through_shields(
        &mut self,
        roster: &mut [Combatant],
        target: CombatantId,
        amount: u32,
        bus: &mut EventBus,
    ) -> DamageTaken {
        let Some(owner) = roster.get(target.0) else {
            warn!(combatant = %target, "damage against unknown combatant");
            return DamageTaken::default();
        };
        if owner.is_dead() {
            return DamageTaken::default();
        }

        let mut remaining = amount;
        if let Some(collection) = self.collections.get_mut(&target) {
            if let Some(index) = collection.iter().position(|e| e.status_kind() == StatusKind::Shield) {
                if let EffectKind::Shield { pool } = &mut collection[index].kind {
                    let absorbed = remaining.min(*pool);
                    *pool -= absorbed;
                    remaining -= absorbed;
                    bus.push(CombatEvent::DamageAbsorbed {
                        target,
                        absorbed,
                        remaining_pool: *pool,
                    });
                }
                // Shields have no on-remove hook.
                if collection[index].shield_pool() == Some(0) {
                    collection.remove(index);
                    bus.push(CombatEvent::EffectRemoved {
                        target,
                        kind: StatusKind::Shield,
                        reason: RemovalReason::Depleted,
                    });
                }
            }
        }

        if remaining == 0 {
            return DamageTaken::default();
        }

        let owner = &mut roster[target.0];
        let taken = owner.take_damage(remaining);
        bus.push(CombatEvent::DamageDealt {
            target,
            amount: taken.dealt,
            remaining_health: owner.current_health(),
        });
        if taken.died {
            bus.push(CombatEvent::CombatantDied { combatant: target });
        }
        taken
    }

    /// Applies healing to `target` after healing-reduction effects. Returns
    /// the health actually restored.
    pub fn heal_through_effects(
        &mut self,
        roster: &mut [Combatant],
        target: CombatantId,
        amount: u32,
        bus: &mut EventBus,
    ) -> u32 {
        let Some(owner) = roster.get_mut(target.0) else {
            warn!(combatant = %target, "heal on unknown combatant");
            return 0;
        };
        if owner.is_dead() {
            return 0;
        }

        let reduction: f64 = self
            .effects(target)
            .unwrap_or_default()
            .iter()
            .map(StatusEffect::heal_reduction)
            .fold(0.0, f64::max);
        let amount = if reduction > 0.0 {
            round_to_u32(amount as f64 * (1.0 - reduction))
        } else {
            amount
        };

        let restored = owner.heal(amount);
        if restored > 0 {
            bus.push(CombatEvent::Healed {
                target,
                amount: restored,
                new_health: owner.current_health(),
            });
        }
        restored
    }

    fn purge_expired(
        &mut self,
        roster: &mut [Combatant],
        target: CombatantId,
        bus: &mut EventBus,
    ) -> Result<(), StatusError> {
        let expired: Vec<(StatusKind, RemovalReason)> = self
            .effects(target)
            .unwrap_or_default()
            .iter()
            .filter(|effect| effect.is_expired())
            .map(|effect| {
                let reason = match effect.kind {
                    EffectKind::Shield { pool: 0 } => RemovalReason::Depleted,
                    _ => RemovalReason::Expired,
                };
                (effect.status_kind(), reason)
            })
            .collect();
        for (kind, reason) in expired {
            self.remove(roster, target, kind, reason, bus)?;
        }
        Ok(())
    }

    /// Removes one effect and runs its on-remove hook.
    fn remove(
        &mut self,
        roster: &mut [Combatant],
        target: CombatantId,
        kind: StatusKind,
        reason: RemovalReason,
        bus: &mut EventBus,
    ) -> Result<bool, StatusError> {
        let collection = self.collection_mut(target)?;
        let Some(index) = collection.iter().position(|e| e.status_kind() == kind) else {
            return Ok(false);
        };
        let effect = collection.remove(index);
        bus.push(CombatEvent::EffectRemoved { target, kind, reason });

        match effect.kind {
            EffectKind::Slow { agility_penalty } => {
                if let Some(owner) = roster.get_mut(target.0) {
                    owner.restore_stat(StatType::Agility, agility_penalty);
                }
            }
            EffectKind::Stun if reason != RemovalReason::Cleared => {
                let immunity = StatusEffect::stun_immunity();
                let alive = roster.get(target.0).is_some_and(Combatant::is_alive);
                if alive && !self.has_effect(target, StatusKind::StunImmunity) {
                    self.collection_mut(target)?.push(immunity);
                    bus.push(CombatEvent::EffectApplied {
                        target,
                        kind: StatusKind::StunImmunity,
                        stacks: 1,
                        duration: immunity.duration,
                    });
                }
            }
            _ => {}
        }
        Ok(true)
    }
}
