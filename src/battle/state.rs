use crate::battle::scheduler::{TurnHooks, TurnStart};
use crate::battle::status_engine::StatusEffectEngine;
use crate::combatant::{Combatant, CombatantId, Faction};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use schema::StatusKind;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, trace, warn};

/// Why an effect left its owner.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalReason {
    /// Remaining duration reached zero.
    Expired,
    /// Shield pool reached zero.
    Depleted,
    /// Removed on request (dispel).
    Dispelled,
    /// A stronger instance took its place.
    Replaced,
    /// Bulk removal at combat end.
    Cleared,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum CombatEvent {
    // Combat & Turn Management
    CombatStarted {
        order: Vec<CombatantId>,
    },
    RoundStarted {
        round: u32,
        order: Vec<CombatantId>,
    },
    TurnChanged {
        previous: Option<CombatantId>,
        current: CombatantId,
    },
    TurnStarted {
        combatant: CombatantId,
        turn_number: u32,
    },
    TurnSkipped {
        combatant: CombatantId,
    },
    TurnEnded {
        combatant: CombatantId,
    },
    CombatEnded {
        survivors: Vec<CombatantId>,
        winner: Option<Faction>,
    },

    // Skills
    SkillUsed {
        caster: CombatantId,
        skill: String,
        targets: Vec<CombatantId>,
    },
    SkillReady {
        combatant: CombatantId,
        skill: String,
    },
    CriticalHit {
        caster: CombatantId,
        target: CombatantId,
    },

    // Health
    DamageDealt {
        target: CombatantId,
        amount: u32,
        remaining_health: u32,
    },
    DamageAbsorbed {
        target: CombatantId,
        absorbed: u32,
        remaining_pool: u32,
    },
    Healed {
        target: CombatantId,
        amount: u32,
        new_health: u32,
    },
    CombatantDied {
        combatant: CombatantId,
    },

    // Status Effects
    EffectApplied {
        target: CombatantId,
        kind: StatusKind,
        stacks: u8,
        duration: u32,
    },
    EffectRefreshed {
        target: CombatantId,
        kind: StatusKind,
        stacks: u8,
        duration: u32,
    },
    EffectTicked {
        target: CombatantId,
        kind: StatusKind,
        damage: u32,
    },
    EffectRemoved {
        target: CombatantId,
        kind: StatusKind,
        reason: RemovalReason,
    },
}

impl CombatEvent {
    /// Formats the event into a human-readable line using the combat roster.
    /// Returns None for silent events that should not produce user-visible text.
    pub fn format(&self, state: &CombatState) -> Option<String> {
        let name = |id: &CombatantId| state.display_name(*id);
        match self {
            // === Combat & Turn Events ===
            CombatEvent::CombatStarted { order } => {
                let names: Vec<String> = order.iter().map(name).collect();
                Some(format!("Combat begins! Turn order: {}", names.join(", ")))
            }
            CombatEvent::RoundStarted { round, .. } => Some(format!("=== Round {} ===", round)),
            CombatEvent::TurnChanged { .. } => None,
            CombatEvent::TurnStarted { combatant, .. } => {
                Some(format!("It is {}'s turn.", name(combatant)))
            }
            CombatEvent::TurnSkipped { combatant } => {
                Some(format!("{} is stunned and loses the turn!", name(combatant)))
            }
            CombatEvent::TurnEnded { .. } => None,
            CombatEvent::CombatEnded { survivors, winner } => match winner {
                Some(faction) => Some(format!("Combat is over. {} side wins!", faction)),
                None if survivors.is_empty() => Some("Combat is over. Nobody is left standing.".to_string()),
                None => Some("Combat is over.".to_string()),
            },

            // === Skill Events ===
            CombatEvent::SkillUsed { caster, skill, targets } => {
                let names: Vec<String> = targets.iter().map(name).collect();
                Some(format!("{} uses {} on {}!", name(caster), skill, names.join(", ")))
            }
            CombatEvent::SkillReady { combatant, skill } => {
                Some(format!("{}'s {} is ready again.", name(combatant), skill))
            }
            CombatEvent::CriticalHit { .. } => Some("A critical hit!".to_string()),

            // === Health Events ===
            CombatEvent::DamageDealt { target, amount, remaining_health } => Some(format!(
                "{} takes {} damage ({} HP left).",
                name(target),
                amount,
                remaining_health
            )),
            CombatEvent::DamageAbsorbed { target, absorbed, .. } => {
                Some(format!("{}'s shield absorbs {} damage.", name(target), absorbed))
            }
            CombatEvent::Healed { target, amount, .. } => {
                Some(format!("{} recovers {} HP.", name(target), amount))
            }
            CombatEvent::CombatantDied { combatant } => Some(format!("{} falls!", name(combatant))),

            // === Status Effect Events ===
            CombatEvent::EffectApplied { target, kind, .. } => {
                Some(format!("{} is afflicted by {}.", name(target), kind))
            }
            CombatEvent::EffectRefreshed { target, kind, stacks, .. } => Some(format!(
                "{}'s {} intensifies (x{}).",
                name(target),
                kind,
                stacks
            )),
            CombatEvent::EffectTicked { target, kind, damage } => Some(format!(
                "{} is hurt by {}! ({} damage)",
                name(target),
                kind,
                damage
            )),
            CombatEvent::EffectRemoved { target, kind, reason } => match reason {
                RemovalReason::Replaced | RemovalReason::Cleared => None,
                RemovalReason::Depleted => Some(format!("{}'s {} breaks.", name(target), kind)),
                _ => Some(format!("{}'s {} wore off.", name(target), kind)),
            },
        }
    }
}

pub type Observer = Box<dyn FnMut(&CombatEvent)>;

/// Handle returned by [`EventBus::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(usize);

/// Event bus for recording combat events and notifying observers.
///
/// Observers are invoked synchronously, in subscription order, from inside
/// the call that produced the event.
///
/// ```rust,ignore
/// let id = bus.subscribe(|event| println!("{:?}", event));
/// // ... drive combat ...
/// bus.unsubscribe(id);
/// ```
pub struct EventBus {
    events: Vec<CombatEvent>,
    observers: Vec<(ObserverId, Observer)>,
    next_observer: usize,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
            observers: Vec::new(),
            next_observer: 0,
        }
    }

    pub fn subscribe(&mut self, observer: impl FnMut(&CombatEvent) + 'static) -> ObserverId {
        let id = ObserverId(self.next_observer);
        self.next_observer += 1;
        self.observers.push((id, Box::new(observer)));
        id
    }

    /// Returns true if the observer was registered.
    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(observer_id, _)| *observer_id != id);
        self.observers.len() != before
    }

    pub fn push(&mut self, event: CombatEvent) {
        debug!(?event, "combat event");
        for (_, observer) in self.observers.iter_mut() {
            observer(&event);
        }
        self.events.push(event);
    }

    pub fn events(&self) -> &[CombatEvent] {
        &self.events
    }

    /// Takes the recorded events, leaving observers in place.
    pub fn drain(&mut self) -> Vec<CombatEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Return true if the event bus contains no events.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Return the number of events in the bus.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Formatted log lines for every non-silent event.
    pub fn formatted(&self, state: &CombatState) -> Vec<String> {
        self.events.iter().filter_map(|event| event.format(state)).collect()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("events", &self.events)
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl fmt::Display for EventBus {
    /// Format the EventBus for printing. Shows debug format of all events.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for event in &self.events {
            writeln!(f, "  {:?}", event)?;
        }
        Ok(())
    }
}

/// Random source for tie-breaks and critical hits.
///
/// Production code uses a seeded generator so a whole encounter can be
/// replayed. Tests can script exact percentile outcomes instead.
#[derive(Debug, Clone)]
pub enum CombatRng {
    Seeded(StdRng),
    Scripted { outcomes: Vec<u8>, index: usize },
}

impl CombatRng {
    pub fn seeded(seed: u64) -> Self {
        CombatRng::Seeded(StdRng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> Self {
        CombatRng::Seeded(StdRng::from_os_rng())
    }

    /// Scripted outcomes in 1..=100, consumed in order.
    pub fn new_for_test(outcomes: Vec<u8>) -> Self {
        CombatRng::Scripted { outcomes, index: 0 }
    }

    /// A percentile roll in 1..=100.
    pub fn roll_percent(&mut self, reason: &str) -> u8 {
        let outcome = match self {
            CombatRng::Seeded(rng) => rng.random_range(1..=100u8),
            CombatRng::Scripted { .. } => self.next_scripted(reason),
        };
        trace!(outcome, reason, "rng consumed");
        outcome
    }

    /// A uniform index in `0..bound`. Bounds of 0 or 1 consume nothing.
    pub fn index_below(&mut self, bound: usize, reason: &str) -> usize {
        if bound <= 1 {
            return 0;
        }
        let index = match self {
            CombatRng::Seeded(rng) => rng.random_range(0..bound),
            CombatRng::Scripted { .. } => self.next_scripted(reason) as usize % bound,
        };
        trace!(index, bound, reason, "rng consumed");
        index
    }

    fn next_scripted(&mut self, reason: &str) -> u8 {
        let CombatRng::Scripted { outcomes, index } = self else {
            unreachable!("next_scripted called on a seeded rng");
        };
        if *index >= outcomes.len() {
            // Add the reason to the panic message for better debugging!
            panic!(
                "CombatRng exhausted! Tried to get a value for: '{}'. Need more random values.",
                reason
            );
        }
        let outcome = outcomes[*index];
        *index += 1;
        outcome
    }
}

/// The encounter-owned roster context the combat systems operate on.
#[derive(Debug, Clone, Default)]
pub struct CombatState {
    pub combatants: Vec<Combatant>,
    pub effects: StatusEffectEngine,
}

impl CombatState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a combatant and registers it with the status effect engine.
    pub fn add_combatant(&mut self, combatant: Combatant) -> CombatantId {
        let id = CombatantId(self.combatants.len());
        self.combatants.push(combatant);
        self.effects.register_combatant(id);
        id
    }

    pub fn combatant(&self, id: CombatantId) -> Option<&Combatant> {
        self.combatants.get(id.0)
    }

    pub fn combatant_mut(&mut self, id: CombatantId) -> Option<&mut Combatant> {
        self.combatants.get_mut(id.0)
    }

    pub fn ids(&self) -> impl Iterator<Item = CombatantId> + '_ {
        (0..self.combatants.len()).map(CombatantId)
    }

    pub fn living_ids(&self) -> Vec<CombatantId> {
        self.ids().filter(|id| self.is_alive(*id)).collect()
    }

    pub fn is_alive(&self, id: CombatantId) -> bool {
        self.combatant(id).is_some_and(Combatant::is_alive)
    }

    pub fn display_name(&self, id: CombatantId) -> String {
        self.combatant(id)
            .map(|c| c.name.clone())
            .unwrap_or_else(|| format!("Unknown {}", id))
    }

    /// The single faction shared by every listed survivor, if there is one.
    pub fn winning_faction(&self, survivors: &[CombatantId]) -> Option<Faction> {
        let mut factions = survivors
            .iter()
            .filter_map(|id| self.combatant(*id))
            .map(|c| c.faction);
        let first = factions.next()?;
        factions.all(|f| f == first).then_some(first)
    }

    /// True when at most one faction still has living members.
    pub fn is_decided(&self) -> bool {
        let living = self.living_ids();
        living.is_empty() || self.winning_faction(&living).is_some()
    }
}

impl TurnHooks for CombatState {
    fn is_alive(&self, id: CombatantId) -> bool {
        CombatState::is_alive(self, id)
    }

    fn agility(&self, id: CombatantId) -> u32 {
        self.combatant(id).map_or(0, Combatant::agility)
    }

    fn acts_last(&self, id: CombatantId) -> bool {
        self.combatant(id).is_some_and(|c| c.modifiers.always_acts_last)
    }

    fn is_decided(&self, living: &[CombatantId]) -> bool {
        living.is_empty() || self.winning_faction(living).is_some()
    }

    fn winning_faction(&self, survivors: &[CombatantId]) -> Option<Faction> {
        CombatState::winning_faction(self, survivors)
    }

    /// Ticks the owner's status effects.
    fn on_turn_start(&mut self, id: CombatantId, bus: &mut EventBus) -> TurnStart {
        match self.effects.tick_all_effects(&mut self.combatants, id, bus) {
            Ok(outcome) => TurnStart {
                skip_turn: outcome.skip_turn,
            },
            Err(error) => {
                warn!(combatant = %id, %error, "could not tick effects");
                TurnStart::default()
            }
        }
    }

    /// Counts down effect durations and skill cooldowns.
    fn on_turn_end(&mut self, id: CombatantId, bus: &mut EventBus) {
        if let Err(error) = self.effects.reduce_all_effect_durations(&mut self.combatants, id, bus) {
            warn!(combatant = %id, %error, "could not reduce effect durations");
        }
        let Some(combatant) = self.combatants.get_mut(id.0) else {
            return;
        };
        for slot in combatant.reduce_cooldowns() {
            bus.push(CombatEvent::SkillReady {
                combatant: id,
                skill: combatant.skills[slot].skill.name.clone(),
            });
        }
    }
}
