//! Skirmish Combat Core
//!
//! A deterministic turn-based combat core: agility-ordered turn scheduling,
//! status effects with stacking and expiry, skills with cooldowns and
//! targeting, and level-scaled combatant stats. Every decision comes from
//! the caller or a [`DecisionPolicy`]; every outcome is reported as a
//! [`CombatEvent`].

// --- MODULE DECLARATIONS ---
pub mod battle;
pub mod combatant;
pub mod config;
pub mod errors;
pub mod prefab_rosters;

// --- PUBLIC API RE-EXPORTS ---

// --- From the `schema` crate ---
// Authored data: classes, skills and status templates.
pub use schema::{
    // Stats & Classes
    ClassTemplate,
    StatBlock,
    StatType,
    // Skills
    DamageKind,
    DamageSpec,
    EffectDescriptor,
    EffectTarget,
    HealSpec,
    SkillDefinition,
    TargetType,
    // Status Effects
    ShieldPool,
    StatusKind,
    StatusTemplate,
};

// --- From this crate's modules (`src/`) ---

// Encounter driving and decisions.
pub use battle::ai::{Decision, DecisionPolicy, LowestHealthPolicy};
pub use battle::runner::{Encounter, EncounterInfo, EncounterOutcome};

// Systems and state.
pub use battle::conditions::{EffectKind, StatusEffect};
pub use battle::scheduler::{TurnHooks, TurnScheduler};
pub use battle::skill_engine::{execute_skill, SkillOutcome};
pub use battle::state::{CombatEvent, CombatRng, CombatState, EventBus, RemovalReason};
pub use battle::status_engine::StatusEffectEngine;

// Runtime types.
pub use combatant::{Combatant, CombatantBuilder, CombatantId, Faction};
pub use config::RunnerConfig;
pub use errors::{CombatError, CombatResult};
