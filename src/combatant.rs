use crate::config::CombatConfig;
use schema::{ClassTemplate, SkillDefinition, StatBlock, StatType};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Index of a combatant in the encounter roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CombatantId(pub usize);

impl fmt::Display for CombatantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Faction membership is carried by the roster. Anyone outside the caster's
/// faction is an enemy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Faction(pub u8);

impl Faction {
    pub const PLAYER: Faction = Faction(0);
    pub const ENEMY: Faction = Faction(1);
}

impl fmt::Display for Faction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Faction::PLAYER => write!(f, "Player"),
            Faction::ENEMY => write!(f, "Enemy"),
            Faction(other) => write!(f, "Faction {}", other),
        }
    }
}

/// Decimal places a formula result is normalised to before rounding.
/// Products such as 45 × 0.7 land a few ulps below their exact .5 value.
const ROUNDING_SCALE: f64 = 1e9;

/// Round-half-up on the real-valued formula result.
pub fn round_half_up(value: f64) -> i64 {
    let normalised = (value * ROUNDING_SCALE).round() / ROUNDING_SCALE;
    (normalised + 0.5).floor() as i64
}

/// Same as [`round_half_up`], clamped to the `u32` range.
pub fn round_to_u32(value: f64) -> u32 {
    round_half_up(value).clamp(0, u32::MAX as i64) as u32
}

/// round(stat × (1 + 0.1 × (level − 1))) in integer arithmetic.
pub fn scale_for_level(stat: u32, level: u32) -> u32 {
    let percent = 100 + CombatConfig::LEVEL_SCALING_PERCENT as u64 * (level.max(1) - 1) as u64;
    let scaled = (stat as u64 * percent * 2 + 100) / 200;
    scaled.min(u32::MAX as u64) as u32
}

/// Transient combat modifiers, set by effect and trait collaborators.
/// They are reset between encounters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Modifiers {
    /// Multiplies Defense before it is subtracted from physical damage.
    pub defense_modifier: f64,
    /// Multiplies outgoing skill damage before the critical roll.
    pub damage_modifier: f64,
    /// Added to a damage descriptor's critical chance.
    pub crit_modifier: f64,
    pub always_acts_last: bool,
    /// While set, used skills do not go on cooldown.
    pub overdrive: bool,
}

impl Default for Modifiers {
    fn default() -> Self {
        Self {
            defense_modifier: 1.0,
            damage_modifier: 1.0,
            crit_modifier: 0.0,
            always_acts_last: false,
            overdrive: false,
        }
    }
}

/// A skill paired with this combatant's cooldown counter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillInstance {
    pub skill: SkillDefinition,
    pub current_cooldown: u32,
}

impl SkillInstance {
    pub fn new(skill: SkillDefinition) -> Self {
        Self {
            skill,
            current_cooldown: 0,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.current_cooldown == 0
    }

    pub fn start_cooldown(&mut self) {
        self.current_cooldown = self.skill.cooldown;
    }

    /// Decrements the cooldown, clamped at 0. Returns true when this call made the skill ready.
    pub fn tick_cooldown(&mut self) -> bool {
        if self.current_cooldown == 0 {
            return false;
        }
        self.current_cooldown -= 1;
        self.current_cooldown == 0
    }
}

/// Result of a single `take_damage` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DamageTaken {
    pub dealt: u32,
    /// True only on the call that brought health to zero.
    pub died: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Combatant {
    pub name: String,
    pub class_name: String,
    pub level: u32,
    pub faction: Faction,
    /// Level-scaled stats before any debuff.
    base_stats: StatBlock,
    /// Stats as currently modified by status effects.
    stats: StatBlock,
    max_health: u32,
    current_health: u32,
    pub modifiers: Modifiers,
    pub skills: Vec<SkillInstance>,
}

impl Combatant {
    pub fn new(name: impl Into<String>, faction: Faction, template: &ClassTemplate, level: u32) -> Self {
        let mut combatant = Self {
            name: name.into(),
            class_name: template.name.clone(),
            level: 1,
            faction,
            base_stats: StatBlock::default(),
            stats: StatBlock::default(),
            max_health: 0,
            current_health: 0,
            modifiers: Modifiers::default(),
            skills: Vec::new(),
        };
        combatant.load_base_stats(template, level);
        combatant
    }

    /// Scales the template to `level`, recomputes max health and restores
    /// the combatant to full health.
    pub fn load_base_stats(&mut self, template: &ClassTemplate, level: u32) {
        let level = level.max(1);

        self.level = level;
        self.class_name = template.name.clone();
        self.base_stats = template
            .base_stats
            .map(|_, value| scale_for_level(value, level));
        self.stats = self.base_stats;
        self.max_health = template.base_health + self.base_stats.vitality * CombatConfig::HEALTH_PER_VITALITY;
        self.current_health = self.max_health;
    }

    // --- Health ---

    pub fn current_health(&self) -> u32 {
        self.current_health
    }

    pub fn max_health(&self) -> u32 {
        self.max_health
    }

    pub fn is_alive(&self) -> bool {
        self.current_health > 0
    }

    pub fn is_dead(&self) -> bool {
        !self.is_alive()
    }

    pub fn health_fraction(&self) -> f64 {
        if self.max_health == 0 {
            return 0.0;
        }
        self.current_health as f64 / self.max_health as f64
    }

    /// Removes health, clamped at zero. Dead combatants take no damage, so
    /// `died` is reported exactly once.
    pub fn take_damage(&mut self, amount: u32) -> DamageTaken {
        if self.is_dead() {
            return DamageTaken::default();
        }
        let dealt = amount.min(self.current_health);
        self.current_health -= dealt;
        DamageTaken {
            dealt,
            died: self.current_health == 0,
        }
    }

    /// Restores health up to the maximum. Returns the amount actually restored.
    pub fn heal(&mut self, amount: u32) -> u32 {
        if self.is_dead() {
            return 0;
        }
        let restored = amount.min(self.max_health - self.current_health);
        self.current_health += restored;
        restored
    }

    /// Sets health directly, clamped to `[0, max_health]`. Used for encounter setup.
    pub fn set_health(&mut self, health: u32) {
        self.current_health = health.min(self.max_health);
    }

    // --- Stats ---

    pub fn stat(&self, stat: StatType) -> u32 {
        self.stats.get(stat)
    }

    pub fn base_stat(&self, stat: StatType) -> u32 {
        self.base_stats.get(stat)
    }

    pub fn stats(&self) -> &StatBlock {
        &self.stats
    }

    pub fn base_stats(&self) -> &StatBlock {
        &self.base_stats
    }

    pub fn agility(&self) -> u32 {
        self.stats.agility
    }

    /// Lowers a stat by up to `amount`. Returns how much was actually removed,
    /// which is what `restore_stat` should later give back.
    pub fn reduce_stat(&mut self, stat: StatType, amount: u32) -> u32 {
        let current = self.stats.get(stat);
        let applied = amount.min(current);
        self.stats.set(stat, current - applied);
        applied
    }

    pub fn restore_stat(&mut self, stat: StatType, amount: u32) {
        let current = self.stats.get(stat);
        self.stats.set(stat, current + amount);
    }

    // --- Modifiers ---

    pub fn set_defense_modifier(&mut self, value: f64) {
        self.modifiers.defense_modifier = value;
    }

    pub fn set_damage_modifier(&mut self, value: f64) {
        self.modifiers.damage_modifier = value;
    }

    pub fn set_crit_modifier(&mut self, value: f64) {
        self.modifiers.crit_modifier = value;
    }

    pub fn set_always_acts_last(&mut self, value: bool) {
        self.modifiers.always_acts_last = value;
    }

    pub fn set_overdrive(&mut self, value: bool) {
        self.modifiers.overdrive = value;
    }

    pub fn reset_modifiers(&mut self) {
        self.modifiers = Modifiers::default();
    }

    // --- Skills ---

    pub fn skill(&self, slot: usize) -> Option<&SkillInstance> {
        self.skills.get(slot)
    }

    pub fn skill_mut(&mut self, slot: usize) -> Option<&mut SkillInstance> {
        self.skills.get_mut(slot)
    }

    /// Decrements every cooldown by one. Returns the slots that became ready.
    pub fn reduce_cooldowns(&mut self) -> Vec<usize> {
        self.skills
            .iter_mut()
            .enumerate()
            .filter_map(|(slot, instance)| instance.tick_cooldown().then_some(slot))
            .collect()
    }
}

/// Builder for combatants, used by encounter setup and tests.
///
/// # Example
/// ```ignore
/// let warrior = CombatantBuilder::new("Brom", &warrior_template)
///     .level(3)
///     .faction(Faction::PLAYER)
///     .skill(cleave)
///     .build();
/// ```
pub struct CombatantBuilder {
    name: String,
    template: ClassTemplate,
    level: u32,
    faction: Faction,
    skills: Vec<SkillDefinition>,
    health: Option<u32>,
    modifiers: Modifiers,
}

impl CombatantBuilder {
    pub fn new(name: impl Into<String>, template: &ClassTemplate) -> Self {
        Self {
            name: name.into(),
            template: template.clone(),
            level: 1,
            faction: Faction::PLAYER,
            skills: Vec::new(),
            health: None,
            modifiers: Modifiers::default(),
        }
    }

    pub fn level(mut self, level: u32) -> Self {
        self.level = level;
        self
    }

    pub fn faction(mut self, faction: Faction) -> Self {
        self.faction = faction;
        self
    }

    pub fn skill(mut self, skill: SkillDefinition) -> Self {
        self.skills.push(skill);
        self
    }

    pub fn skills(mut self, skills: impl IntoIterator<Item = SkillDefinition>) -> Self {
        self.skills.extend(skills);
        self
    }

    /// Starting health. If not set, the combatant starts at max health.
    pub fn health(mut self, health: u32) -> Self {
        self.health = Some(health);
        self
    }

    pub fn modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn build(self) -> Combatant {
        let mut combatant = Combatant::new(self.name, self.faction, &self.template, self.level);
        combatant.skills = self.skills.into_iter().map(SkillInstance::new).collect();
        combatant.modifiers = self.modifiers;
        if let Some(health) = self.health {
            combatant.set_health(health);
        }
        combatant
    }
}
