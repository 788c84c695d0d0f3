use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

/// The five primary stats every combatant carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter)]
pub enum StatType {
    Strength,
    Agility,
    Intelligence,
    Defense,
    Vitality,
}

/// A block of primary stat values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatBlock {
    pub strength: u32,
    pub agility: u32,
    pub intelligence: u32,
    pub defense: u32,
    pub vitality: u32,
}

impl StatBlock {
    pub const fn new(strength: u32, agility: u32, intelligence: u32, defense: u32, vitality: u32) -> Self {
        Self {
            strength,
            agility,
            intelligence,
            defense,
            vitality,
        }
    }

    pub fn get(&self, stat: StatType) -> u32 {
        match stat {
            StatType::Strength => self.strength,
            StatType::Agility => self.agility,
            StatType::Intelligence => self.intelligence,
            StatType::Defense => self.defense,
            StatType::Vitality => self.vitality,
        }
    }

    pub fn set(&mut self, stat: StatType, value: u32) {
        match stat {
            StatType::Strength => self.strength = value,
            StatType::Agility => self.agility = value,
            StatType::Intelligence => self.intelligence = value,
            StatType::Defense => self.defense = value,
            StatType::Vitality => self.vitality = value,
        }
    }

    /// Returns a copy with every stat transformed by `f`.
    pub fn map(&self, mut f: impl FnMut(StatType, u32) -> u32) -> Self {
        let mut out = *self;
        for stat in [
            StatType::Strength,
            StatType::Agility,
            StatType::Intelligence,
            StatType::Defense,
            StatType::Vitality,
        ] {
            out.set(stat, f(stat, self.get(stat)));
        }
        out
    }
}

/// Class stat template: the level-1 stats a combatant is scaled from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassTemplate {
    pub name: String,
    pub base_stats: StatBlock,
    /// Health before the Vitality bonus is added.
    pub base_health: u32,
}

impl ClassTemplate {
    pub fn new(name: impl Into<String>, base_stats: StatBlock, base_health: u32) -> Self {
        Self {
            name: name.into(),
            base_stats,
            base_health,
        }
    }
}
