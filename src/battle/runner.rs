use crate::battle::ai::{Decision, DecisionPolicy};
use crate::battle::conditions::StatusEffect;
use crate::battle::scheduler::TurnScheduler;
use crate::battle::skill_engine::{execute_skill, SkillOutcome};
use crate::battle::state::{CombatEvent, CombatRng, CombatState, EventBus, ObserverId};
use crate::combatant::{Combatant, CombatantId, Faction};
use crate::config::RunnerConfig;
use crate::errors::{ActionError, CombatResult, SchedulerError};
use schema::StatusKind;
use serde::Serialize;
use tracing::{info, warn};

/// Owns one encounter: the roster, the systems that act on it, the event
/// bus and the random source.
///
/// All calls are synchronous. Pacing between actions belongs to whoever
/// drives the encounter.
#[derive(Debug)]
pub struct Encounter {
    pub id: String,
    state: CombatState,
    scheduler: TurnScheduler,
    bus: EventBus,
    rng: CombatRng,
}

/// Result of driving an encounter with [`Encounter::run`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EncounterOutcome {
    pub winner: Option<Faction>,
    pub survivors: Vec<CombatantId>,
    pub turns: u32,
    pub rounds: u32,
    /// False if the turn limit was reached before a side won.
    pub completed: bool,
}

/// Snapshot of the encounter for display and queries
#[derive(Debug, Clone, Serialize)]
pub struct EncounterInfo {
    pub encounter_id: String,
    pub round: u32,
    pub turn_number: u32,
    pub combat_active: bool,
    pub active_combatant: Option<CombatantId>,
    pub combatants: Vec<CombatantInfo>,
}

/// Information about a combatant for API queries
#[derive(Debug, Clone, Serialize)]
pub struct CombatantInfo {
    pub id: CombatantId,
    pub name: String,
    pub class_name: String,
    pub faction: Faction,
    pub current_health: u32,
    pub max_health: u32,
    pub is_alive: bool,
    pub effects: Vec<StatusKind>,
    /// (skill name, turns until ready)
    pub cooldowns: Vec<(String, u32)>,
}

impl Encounter {
    pub fn new(id: impl Into<String>, rng: CombatRng) -> Self {
        Self {
            id: id.into(),
            state: CombatState::new(),
            scheduler: TurnScheduler::new(),
            bus: EventBus::new(),
            rng,
        }
    }

    pub fn from_config(id: impl Into<String>, config: &RunnerConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => CombatRng::seeded(seed),
            None => CombatRng::from_entropy(),
        };
        Self::new(id, rng)
    }

    /// Adds a combatant to the roster and registers it for status effects.
    /// The roster is fixed once combat starts.
    pub fn add_combatant(&mut self, combatant: Combatant) -> CombatResult<CombatantId> {
        if self.scheduler.is_combat_active() {
            warn!(name = %combatant.name, "cannot add combatants during combat");
            return Err(SchedulerError::AlreadyActive.into());
        }
        Ok(self.state.add_combatant(combatant))
    }

    pub fn state(&self) -> &CombatState {
        &self.state
    }

    pub fn combatant(&self, id: CombatantId) -> Option<&Combatant> {
        self.state.combatant(id)
    }

    /// Mutable access for modifier collaborators (traits, equipment).
    pub fn combatant_mut(&mut self, id: CombatantId) -> Option<&mut Combatant> {
        self.state.combatant_mut(id)
    }

    pub fn scheduler(&self) -> &TurnScheduler {
        &self.scheduler
    }

    pub fn events(&self) -> &EventBus {
        &self.bus
    }

    pub fn drain_events(&mut self) -> Vec<CombatEvent> {
        self.bus.drain()
    }

    pub fn subscribe(&mut self, observer: impl FnMut(&CombatEvent) + 'static) -> ObserverId {
        self.bus.subscribe(observer)
    }

    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        self.bus.unsubscribe(id)
    }

    pub fn is_combat_active(&self) -> bool {
        self.scheduler.is_combat_active()
    }

    pub fn active_combatant(&self) -> Option<CombatantId> {
        self.scheduler.active_combatant()
    }

    pub fn start_combat(&mut self) -> CombatResult<()> {
        let roster: Vec<CombatantId> = self.state.ids().collect();
        info!(encounter = %self.id, combatants = roster.len(), "starting encounter");
        self.scheduler
            .start_combat(&roster, &mut self.state, &mut self.rng, &mut self.bus)?;
        self.sync_roster();
        Ok(())
    }

    /// Executes a decision for the active combatant.
    pub fn act(&mut self, decision: &Decision) -> CombatResult<SkillOutcome> {
        let active = self.scheduler.active_combatant().ok_or_else(|| {
            warn!("act called with no active combatant");
            SchedulerError::NotActive
        })?;
        self.use_skill(active, decision.skill_slot, &decision.targets)
    }

    /// Executes a skill for `caster`, who must be the active combatant.
    pub fn use_skill(
        &mut self,
        caster: CombatantId,
        slot: usize,
        targets: &[CombatantId],
    ) -> CombatResult<SkillOutcome> {
        if !self.scheduler.is_combat_active() {
            warn!("use_skill called with no active combat");
            return Err(SchedulerError::NotActive.into());
        }
        if self.scheduler.active_combatant() != Some(caster) {
            warn!(combatant = %caster, "use_skill called out of turn");
            return Err(ActionError::NotActiveCombatant(caster).into());
        }
        if self.scheduler.is_skipping() {
            warn!(combatant = %caster, "use_skill called during a skipped turn");
            return Err(ActionError::TurnSkipped(caster).into());
        }

        let outcome = execute_skill(&mut self.state, &mut self.rng, &mut self.bus, caster, slot, targets)?;
        self.sync_roster();
        Ok(outcome)
    }

    pub fn end_current_turn(&mut self) -> CombatResult<()> {
        self.scheduler
            .end_current_turn(&mut self.state, &mut self.rng, &mut self.bus)?;
        self.sync_roster();
        Ok(())
    }

    pub fn end_combat(&mut self) -> CombatResult<()> {
        self.scheduler.end_combat(&self.state, &mut self.bus)?;
        self.finish_combat();
        Ok(())
    }

    /// Attaches an effect from outside a skill (traits, scripted encounters).
    pub fn apply_effect(&mut self, target: CombatantId, effect: StatusEffect) -> CombatResult<bool> {
        let applied = self
            .state
            .effects
            .apply_effect(&mut self.state.combatants, target, effect, &mut self.bus)?;
        Ok(applied)
    }

    pub fn remove_effect(&mut self, target: CombatantId, kind: StatusKind) -> CombatResult<bool> {
        let removed = self
            .state
            .effects
            .remove_effect(&mut self.state.combatants, target, kind, &mut self.bus)?;
        Ok(removed)
    }

    /// Drives the encounter with `policy` until one side wins or `max_turns`
    /// turns have started. Stunned turns and turns the policy passes on are
    /// ended without acting; rejected decisions also pass the turn.
    pub fn run<P: DecisionPolicy>(&mut self, policy: &mut P, max_turns: u32) -> CombatResult<EncounterOutcome> {
        if !self.scheduler.is_combat_active() {
            self.start_combat()?;
        }

        while self.scheduler.is_combat_active() {
            let Some(actor) = self.scheduler.active_combatant() else {
                break;
            };
            if !self.scheduler.is_skipping() {
                if let Some(decision) = policy.decide(&self.state, actor) {
                    if let Err(error) = self.act(&decision) {
                        warn!(combatant = %actor, %error, "decision rejected; passing the turn");
                    }
                }
            }
            if !self.scheduler.is_combat_active() {
                break;
            }
            if self.scheduler.turn_number() >= max_turns {
                warn!(encounter = %self.id, max_turns, "turn limit reached");
                self.end_combat()?;
                break;
            }
            self.end_current_turn()?;
        }

        let survivors = self.state.living_ids();
        let completed = self.state.is_decided();
        let outcome = EncounterOutcome {
            winner: if completed { self.state.winning_faction(&survivors) } else { None },
            survivors,
            turns: self.scheduler.turn_number(),
            rounds: self.scheduler.round(),
            completed,
        };
        info!(encounter = %self.id, ?outcome, "encounter finished");
        Ok(outcome)
    }

    pub fn info(&self) -> EncounterInfo {
        let combatants = self
            .state
            .ids()
            .filter_map(|id| self.state.combatant(id).map(|c| (id, c)))
            .map(|(id, c)| CombatantInfo {
                id,
                name: c.name.clone(),
                class_name: c.class_name.clone(),
                faction: c.faction,
                current_health: c.current_health(),
                max_health: c.max_health(),
                is_alive: c.is_alive(),
                effects: self
                    .state
                    .effects
                    .effects(id)
                    .unwrap_or_default()
                    .iter()
                    .map(StatusEffect::status_kind)
                    .collect(),
                cooldowns: c
                    .skills
                    .iter()
                    .map(|s| (s.skill.name.clone(), s.current_cooldown))
                    .collect(),
            })
            .collect();

        EncounterInfo {
            encounter_id: self.id.clone(),
            round: self.scheduler.round(),
            turn_number: self.scheduler.turn_number(),
            combat_active: self.scheduler.is_combat_active(),
            active_combatant: self.scheduler.active_combatant(),
            combatants,
        }
    }

    /// Drops the dead from scheduling and tidies up if combat just ended.
    fn sync_roster(&mut self) {
        let fallen: Vec<CombatantId> = self
            .scheduler
            .participants()
            .iter()
            .copied()
            .filter(|&id| !self.state.is_alive(id))
            .collect();
        for id in fallen {
            // Cannot fail: `id` was just read from the participants.
            let _ = self.scheduler.remove_combatant(id);
        }

        if !self.scheduler.is_combat_active() {
            self.finish_combat();
        }
    }

    /// Effects and modifiers do not outlive the encounter.
    fn finish_combat(&mut self) {
        let ids: Vec<CombatantId> = self.state.ids().collect();
        for id in ids {
            if let Err(error) = self
                .state
                .effects
                .clear_all_effects(&mut self.state.combatants, id, &mut self.bus)
            {
                warn!(combatant = %id, %error, "could not clear effects");
            }
            if let Some(combatant) = self.state.combatant_mut(id) {
                combatant.reset_modifiers();
            }
        }
    }
}
