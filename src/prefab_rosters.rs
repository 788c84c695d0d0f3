use crate::combatant::{Combatant, CombatantBuilder, Faction};
use schema::{
    ClassTemplate, DamageSpec, EffectTarget, HealSpec, ShieldPool, SkillDefinition, StatBlock, StatType,
    StatusTemplate, TargetType,
};
use serde::{Deserialize, Serialize};

/// A predefined group of combatants for demos and quick encounters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrefabRoster {
    pub id: String,
    pub name: String,
    pub description: String,
    pub members: Vec<PrefabMember>,
}

/// A predefined combatant configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrefabMember {
    pub name: String,
    pub class: ClassTemplate,
    pub level: u32,
    pub skills: Vec<SkillDefinition>,
}

impl PrefabMember {
    fn new(name: &str, class: ClassTemplate, level: u32, skills: Vec<SkillDefinition>) -> Self {
        Self {
            name: name.to_string(),
            class,
            level,
            skills,
        }
    }

    pub fn build(&self, faction: Faction) -> Combatant {
        CombatantBuilder::new(self.name.clone(), &self.class)
            .level(self.level)
            .faction(faction)
            .skills(self.skills.iter().cloned())
            .build()
    }
}

impl PrefabRoster {
    /// Instantiates every member on `faction`, in roster order.
    pub fn build(&self, faction: Faction) -> Vec<Combatant> {
        self.members.iter().map(|member| member.build(faction)).collect()
    }
}

// --- Class templates ---

pub fn warrior() -> ClassTemplate {
    ClassTemplate::new("Warrior", StatBlock::new(15, 10, 5, 8, 12), 50)
}

pub fn mage() -> ClassTemplate {
    ClassTemplate::new("Mage", StatBlock::new(4, 12, 20, 3, 6), 40)
}

pub fn rogue() -> ClassTemplate {
    ClassTemplate::new("Rogue", StatBlock::new(10, 18, 6, 5, 8), 45)
}

pub fn cleric() -> ClassTemplate {
    ClassTemplate::new("Cleric", StatBlock::new(6, 9, 16, 7, 10), 50)
}

pub fn goblin() -> ClassTemplate {
    ClassTemplate::new("Goblin", StatBlock::new(8, 14, 3, 4, 6), 30)
}

pub fn ogre() -> ClassTemplate {
    ClassTemplate::new("Ogre", StatBlock::new(20, 6, 2, 10, 16), 60)
}

// --- Skill kits ---
// Listed in the order a simple policy should consider them.

pub fn warrior_skills() -> Vec<SkillDefinition> {
    vec![
        SkillDefinition::new("Shield Wall", 4, TargetType::Caster)
            .with_status(StatusTemplate::shield(ShieldPool::Flat(30)), EffectTarget::User),
        SkillDefinition::new("Cleave", 2, TargetType::AllEnemies)
            .with_damage(DamageSpec::physical(8, StatType::Strength, 0.4)),
        SkillDefinition::new("Strike", 0, TargetType::SingleEnemy)
            .with_damage(DamageSpec::physical(20, StatType::Strength, 0.6).with_crit_chance(0.05)),
    ]
}

pub fn mage_skills() -> Vec<SkillDefinition> {
    vec![
        SkillDefinition::new("Arcane Barrier", 4, TargetType::SingleAlly).with_status(
            StatusTemplate::shield(ShieldPool::IntelligenceScaled(1.5)),
            EffectTarget::Targets,
        ),
        SkillDefinition::new("Frost Nova", 3, TargetType::AllEnemies)
            .with_damage(DamageSpec::magical(4, 0.5))
            .with_status(StatusTemplate::slow(), EffectTarget::Targets),
        SkillDefinition::new("Firebolt", 0, TargetType::SingleEnemy)
            .with_damage(DamageSpec::magical(6, 0.8))
            .with_status(StatusTemplate::burn(), EffectTarget::Targets),
    ]
}

pub fn rogue_skills() -> Vec<SkillDefinition> {
    vec![
        SkillDefinition::new("Envenom", 3, TargetType::SingleEnemy)
            .with_damage(DamageSpec::physical(3, StatType::Agility, 0.3))
            .with_status(StatusTemplate::poison(), EffectTarget::Targets),
        SkillDefinition::new("Lacerate", 1, TargetType::SingleEnemy)
            .with_damage(DamageSpec::physical(4, StatType::Agility, 0.3))
            .with_status(StatusTemplate::bleed(), EffectTarget::Targets),
        SkillDefinition::new("Stab", 0, TargetType::SingleEnemy)
            .with_damage(DamageSpec::physical(6, StatType::Agility, 0.7).with_crit_chance(0.2)),
    ]
}

pub fn cleric_skills() -> Vec<SkillDefinition> {
    vec![
        SkillDefinition::new("Mend", 1, TargetType::SingleAlly).with_heal(HealSpec::new(12, 1.0), EffectTarget::Targets),
        SkillDefinition::new("Concussive Blow", 3, TargetType::SingleEnemy)
            .with_damage(DamageSpec::physical(4, StatType::Strength, 0.5))
            .with_status(StatusTemplate::stun(), EffectTarget::Targets),
        SkillDefinition::new("Smite", 0, TargetType::SingleEnemy).with_damage(DamageSpec::magical(5, 0.6)),
    ]
}

pub fn goblin_skills() -> Vec<SkillDefinition> {
    vec![
        SkillDefinition::new("Dirty Trick", 3, TargetType::SingleEnemy)
            .with_damage(DamageSpec::physical(2, StatType::Agility, 0.2))
            .with_status(StatusTemplate::poison(), EffectTarget::Targets),
        SkillDefinition::new("Rusty Knife", 0, TargetType::SingleEnemy)
            .with_damage(DamageSpec::physical(6, StatType::Agility, 0.5)),
    ]
}

pub fn ogre_skills() -> Vec<SkillDefinition> {
    vec![
        SkillDefinition::new("Ground Slam", 3, TargetType::AllEnemies)
            .with_damage(DamageSpec::physical(6, StatType::Strength, 0.4)),
        SkillDefinition::new("Club", 0, TargetType::SingleEnemy)
            .with_damage(DamageSpec::physical(12, StatType::Strength, 0.7)),
    ]
}

/// Get all available prefab rosters
pub fn get_prefab_rosters() -> Vec<PrefabRoster> {
    vec![
        PrefabRoster {
            id: "adventurers".to_string(),
            name: "Adventurers".to_string(),
            description: "A balanced party: a warrior up front, a mage, a rogue and a cleric".to_string(),
            members: vec![
                PrefabMember::new("Brom", warrior(), 3, warrior_skills()),
                PrefabMember::new("Ilsa", mage(), 3, mage_skills()),
                PrefabMember::new("Vex", rogue(), 3, rogue_skills()),
                PrefabMember::new("Maren", cleric(), 3, cleric_skills()),
            ],
        },
        PrefabRoster {
            id: "goblin_raiders".to_string(),
            name: "Goblin Raiders".to_string(),
            description: "Three quick goblins led by a slow, heavy ogre".to_string(),
            members: vec![
                PrefabMember::new("Snag", goblin(), 3, goblin_skills()),
                PrefabMember::new("Grit", goblin(), 3, goblin_skills()),
                PrefabMember::new("Nib", goblin(), 2, goblin_skills()),
                PrefabMember::new("Gorm", ogre(), 4, ogre_skills()),
            ],
        },
        PrefabRoster {
            id: "duelists".to_string(),
            name: "Duelists".to_string(),
            description: "A single warrior, for one-on-one tests".to_string(),
            members: vec![PrefabMember::new("Kael", warrior(), 1, warrior_skills())],
        },
    ]
}

/// Get a specific prefab roster by ID
pub fn get_prefab_roster(roster_id: &str) -> Option<PrefabRoster> {
    get_prefab_rosters().into_iter().find(|roster| roster.id == roster_id)
}

/// Validate that all prefab rosters are properly configured
pub fn validate_prefab_rosters() -> Result<(), String> {
    let rosters = get_prefab_rosters();

    if rosters.is_empty() {
        return Err("No prefab rosters defined".to_string());
    }

    for roster in &rosters {
        if roster.members.is_empty() {
            return Err(format!("Roster '{}' has no members", roster.id));
        }

        for member in &roster.members {
            if member.level == 0 {
                return Err(format!("Roster '{}' member {} has level 0", roster.id, member.name));
            }
            if member.skills.is_empty() {
                return Err(format!("Roster '{}' member {} has no skills", roster.id, member.name));
            }
            if !member.skills.iter().any(|skill| skill.cooldown == 0 && skill.is_offensive()) {
                return Err(format!(
                    "Roster '{}' member {} has no attack without a cooldown",
                    roster.id, member.name
                ));
            }
        }
    }

    Ok(())
}
