use crate::battle::state::{CombatEvent, CombatRng, EventBus};
use crate::combatant::{CombatantId, Faction};
use crate::errors::SchedulerError;
use std::collections::VecDeque;
use tracing::{info, warn};

/// What the start-of-turn hook reports back to the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TurnStart {
    pub skip_turn: bool,
}

/// The narrow view the scheduler has of the roster and the systems that
/// react to turn boundaries.
pub trait TurnHooks {
    fn is_alive(&self, id: CombatantId) -> bool;
    fn agility(&self, id: CombatantId) -> u32;

    fn acts_last(&self, _id: CombatantId) -> bool {
        false
    }

    /// Whether combat is over given the living participants.
    fn is_decided(&self, living: &[CombatantId]) -> bool {
        living.len() <= 1
    }

    fn winning_faction(&self, _survivors: &[CombatantId]) -> Option<Faction> {
        None
    }

    fn on_turn_start(&mut self, id: CombatantId, bus: &mut EventBus) -> TurnStart;
    fn on_turn_end(&mut self, id: CombatantId, bus: &mut EventBus);
}

/// Orders combatants by Agility, drives turn boundaries and detects the end
/// of combat.
///
/// Each round's queue is built from the living participants when the
/// previous queue runs out. Participants that die are dropped from the
/// queue, so nobody acts twice or is skipped within a round.
#[derive(Debug, Clone, Default)]
pub struct TurnScheduler {
    participants: Vec<CombatantId>,
    queue: VecDeque<CombatantId>,
    active: Option<CombatantId>,
    skipping: bool,
    combat_active: bool,
    round: u32,
    turn_number: u32,
}

impl TurnScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_combat_active(&self) -> bool {
        self.combat_active
    }

    pub fn active_combatant(&self) -> Option<CombatantId> {
        self.active
    }

    /// True while the active combatant's turn is vetoed (stunned).
    pub fn is_skipping(&self) -> bool {
        self.skipping
    }

    /// Rounds started in the current or most recent combat.
    pub fn round(&self) -> u32 {
        self.round
    }

    /// Turns started in the current or most recent combat.
    pub fn turn_number(&self) -> u32 {
        self.turn_number
    }

    pub fn participants(&self) -> &[CombatantId] {
        &self.participants
    }

    /// Combatants still waiting for their turn this round.
    pub fn queue(&self) -> Vec<CombatantId> {
        self.queue.iter().copied().collect()
    }

    pub fn start_combat<H: TurnHooks>(
        &mut self,
        combatants: &[CombatantId],
        hooks: &mut H,
        rng: &mut CombatRng,
        bus: &mut EventBus,
    ) -> Result<(), SchedulerError> {
        if self.combat_active {
            warn!("start_combat called while combat is already active");
            return Err(SchedulerError::AlreadyActive);
        }
        if combatants.is_empty() {
            warn!("start_combat called with an empty roster");
            return Err(SchedulerError::EmptyRoster);
        }
        let living: Vec<CombatantId> = combatants.iter().copied().filter(|&id| hooks.is_alive(id)).collect();
        if living.is_empty() {
            warn!("start_combat called with no living combatants");
            return Err(SchedulerError::NoLivingCombatants);
        }

        *self = Self {
            participants: combatants.to_vec(),
            combat_active: true,
            ..Self::default()
        };

        let order = build_turn_order(&living, hooks, rng);
        info!(?order, "combat started");
        bus.push(CombatEvent::CombatStarted { order: order.clone() });
        self.begin_round(order, bus);
        self.advance(hooks, rng, bus);
        Ok(())
    }

    /// Ends the active combatant's turn and starts the next one.
    pub fn end_current_turn<H: TurnHooks>(
        &mut self,
        hooks: &mut H,
        rng: &mut CombatRng,
        bus: &mut EventBus,
    ) -> Result<(), SchedulerError> {
        if !self.combat_active {
            warn!("end_current_turn called with no active combat");
            return Err(SchedulerError::NotActive);
        }
        if let Some(id) = self.active {
            if hooks.is_alive(id) {
                hooks.on_turn_end(id, bus);
            }
            bus.push(CombatEvent::TurnEnded { combatant: id });
        }
        self.skipping = false;
        self.advance(hooks, rng, bus);
        Ok(())
    }

    /// Clears the roster and queue and announces the survivors. Round and
    /// turn counters are kept for reporting.
    pub fn end_combat<H: TurnHooks>(&mut self, hooks: &H, bus: &mut EventBus) -> Result<(), SchedulerError> {
        if !self.combat_active {
            warn!("end_combat called with no active combat");
            return Err(SchedulerError::NotActive);
        }
        let survivors: Vec<CombatantId> = self
            .participants
            .iter()
            .copied()
            .filter(|&id| hooks.is_alive(id))
            .collect();
        let winner = hooks.winning_faction(&survivors);
        info!(?survivors, ?winner, rounds = self.round, turns = self.turn_number, "combat ended");

        self.participants.clear();
        self.queue.clear();
        self.active = None;
        self.skipping = false;
        self.combat_active = false;
        bus.push(CombatEvent::CombatEnded { survivors, winner });
        Ok(())
    }

    /// Drops a combatant from future ordering. The rest of the current
    /// round keeps its order.
    pub fn remove_combatant(&mut self, id: CombatantId) -> Result<(), SchedulerError> {
        if !self.participants.contains(&id) {
            warn!(combatant = %id, "remove_combatant on a non-participant");
            return Err(SchedulerError::UnknownCombatant(id));
        }
        self.participants.retain(|&p| p != id);
        self.queue.retain(|&q| q != id);
        Ok(())
    }

    fn begin_round(&mut self, order: Vec<CombatantId>, bus: &mut EventBus) {
        self.round += 1;
        bus.push(CombatEvent::RoundStarted {
            round: self.round,
            order: order.clone(),
        });
        self.queue = order.into();
    }

    fn living<H: TurnHooks>(&self, hooks: &H) -> Vec<CombatantId> {
        self.participants
            .iter()
            .copied()
            .filter(|&id| hooks.is_alive(id))
            .collect()
    }

    fn advance<H: TurnHooks>(&mut self, hooks: &mut H, rng: &mut CombatRng, bus: &mut EventBus) {
        loop {
            let living = self.living(hooks);
            if hooks.is_decided(&living) {
                // Cannot fail: combat is active here.
                let _ = self.end_combat(hooks, bus);
                return;
            }

            if self.queue.is_empty() {
                let order = build_turn_order(&living, hooks, rng);
                self.begin_round(order, bus);
            }
            let Some(next) = self.queue.pop_front() else {
                continue;
            };
            if !hooks.is_alive(next) {
                continue;
            }

            let previous = self.active.replace(next);
            self.turn_number += 1;
            bus.push(CombatEvent::TurnChanged {
                previous,
                current: next,
            });
            bus.push(CombatEvent::TurnStarted {
                combatant: next,
                turn_number: self.turn_number,
            });

            let start = hooks.on_turn_start(next, bus);
            if !hooks.is_alive(next) {
                // Killed by its own damage-over-time.
                bus.push(CombatEvent::TurnEnded { combatant: next });
                continue;
            }
            if start.skip_turn {
                self.skipping = true;
                bus.push(CombatEvent::TurnSkipped { combatant: next });
            }
            return;
        }
    }
}

/// Orders `combatants` by Agility, highest first, shuffling each tied group
/// with Fisher–Yates. Combatants flagged to act last follow everyone else,
/// ordered among themselves by the same rule.
pub fn build_turn_order<H: TurnHooks>(combatants: &[CombatantId], hooks: &H, rng: &mut CombatRng) -> Vec<CombatantId> {
    let (last, normal): (Vec<CombatantId>, Vec<CombatantId>) =
        combatants.iter().copied().partition(|&id| hooks.acts_last(id));

    let mut order = order_by_agility(normal, hooks, rng);
    order.extend(order_by_agility(last, hooks, rng));
    order
}

fn order_by_agility<H: TurnHooks>(mut ids: Vec<CombatantId>, hooks: &H, rng: &mut CombatRng) -> Vec<CombatantId> {
    ids.sort_by_key(|&id| std::cmp::Reverse(hooks.agility(id)));

    let mut start = 0;
    while start < ids.len() {
        let agility = hooks.agility(ids[start]);
        let end = ids[start..]
            .iter()
            .position(|&id| hooks.agility(id) != agility)
            .map_or(ids.len(), |offset| start + offset);

        let group = &mut ids[start..end];
        for i in (1..group.len()).rev() {
            let j = rng.index_below(i + 1, "turn order tie-break");
            group.swap(i, j);
        }
        start = end;
    }
    ids
}
