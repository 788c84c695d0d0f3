use crate::battle::runner::Encounter;
use crate::battle::state::{CombatEvent, CombatRng, EventBus};
use crate::combatant::{Combatant, CombatantBuilder, CombatantId, Faction};
use crate::errors::CombatResult;
use schema::{ClassTemplate, SkillDefinition, StatBlock};

/// A builder for test combatants with flat, easy-to-reason-about stats.
///
/// Defaults: every stat 10, base health 50 (so 150 max health), level 1,
/// player faction, no skills.
///
/// # Example
/// ```ignore
/// let goblin = TestCombatantBuilder::new("Goblin")
///     .enemy()
///     .with_agility(14)
///     .with_skills(vec![stab])
///     .build();
/// ```
pub struct TestCombatantBuilder {
    name: String,
    stats: StatBlock,
    base_health: u32,
    faction: Faction,
    skills: Vec<SkillDefinition>,
    health: Option<u32>,
}

impl TestCombatantBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            stats: StatBlock::new(10, 10, 10, 10, 10),
            base_health: 50,
            faction: Faction::PLAYER,
            skills: Vec::new(),
            health: None,
        }
    }

    pub fn enemy(mut self) -> Self {
        self.faction = Faction::ENEMY;
        self
    }

    pub fn with_stats(mut self, stats: StatBlock) -> Self {
        self.stats = stats;
        self
    }

    pub fn with_agility(mut self, agility: u32) -> Self {
        self.stats.agility = agility;
        self
    }

    /// Sets base health and Vitality so that max health is exactly `max_health`.
    pub fn with_max_health(mut self, max_health: u32) -> Self {
        self.stats.vitality = 0;
        self.base_health = max_health;
        self
    }

    pub fn with_skills(mut self, skills: Vec<SkillDefinition>) -> Self {
        self.skills = skills;
        self
    }

    /// Sets the current HP. If not set, HP will be max.
    pub fn with_hp(mut self, hp: u32) -> Self {
        self.health = Some(hp);
        self
    }

    pub fn build(self) -> Combatant {
        let template = ClassTemplate::new("Test", self.stats, self.base_health);
        let mut builder = CombatantBuilder::new(self.name, &template)
            .faction(self.faction)
            .skills(self.skills);
        if let Some(hp) = self.health {
            builder = builder.health(hp);
        }
        builder.build()
    }
}

/// Creates a `CombatRng` with a long list of high rolls (100), so any
/// non-certain critical hit misses. Tie-breaks with it are deterministic.
pub fn predictable_rng() -> CombatRng {
    CombatRng::new_for_test(vec![100; 200])
}

/// Creates an encounter with the given combatants, using `rng`.
pub fn create_test_encounter(combatants: Vec<Combatant>, rng: CombatRng) -> Encounter {
    let mut encounter = Encounter::new("test_encounter", rng);
    for combatant in combatants {
        assert_ok(encounter.add_combatant(combatant));
    }
    encounter
}

/// Counts the events on `bus` matching `predicate`.
pub fn count_events(bus: &EventBus, predicate: impl Fn(&CombatEvent) -> bool) -> usize {
    bus.events().iter().filter(|event| predicate(event)).count()
}

/// The order announced by the first `CombatStarted` event.
pub fn starting_order(bus: &EventBus) -> Vec<CombatantId> {
    bus.events()
        .iter()
        .find_map(|event| match event {
            CombatEvent::CombatStarted { order } => Some(order.clone()),
            _ => None,
        })
        .unwrap_or_default()
}

/// Helper function to assert that a Result is Ok and return the value.
/// Provides clear error messages in tests when functions unexpectedly fail.
pub fn assert_ok<T>(result: CombatResult<T>) -> T {
    match result {
        Ok(value) => value,
        Err(err) => panic!("Expected Ok but got error: {}", err),
    }
}
