use crate::combatant::CombatantId;
use thiserror::Error;

/// Main error type for the combat core.
///
/// Nothing in the core is fatal: every failure path hands one of these back
/// to the caller (and logs a warning) while leaving state unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CombatError {
    /// Error raised by the turn scheduler
    #[error("Scheduler error: {0}")]
    Scheduler(#[from] SchedulerError),
    /// A requested action cannot be performed right now
    #[error("Action error: {0}")]
    Action(#[from] ActionError),
    /// Error raised by the status effect engine
    #[error("Status error: {0}")]
    Status(#[from] StatusError),
}

/// Errors related to turn scheduling
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchedulerError {
    #[error("cannot start combat with an empty roster")]
    EmptyRoster,
    #[error("combat is already active")]
    AlreadyActive,
    #[error("no combat is active")]
    NotActive,
    #[error("no living combatants remain")]
    NoLivingCombatants,
    #[error("unknown combatant {0}")]
    UnknownCombatant(CombatantId),
}

/// Errors related to executing a skill. The decision policy must choose differently.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    #[error("{0} is dead and cannot act")]
    CasterDead(CombatantId),
    #[error("no valid targets")]
    NoTargets,
    #[error("skill '{skill}' is on cooldown for {remaining} more turn(s)")]
    OnCooldown { skill: String, remaining: u32 },
    #[error("{0} is skipping this turn")]
    TurnSkipped(CombatantId),
    #[error("{caster} has no skill in slot {slot}")]
    UnknownSkill { caster: CombatantId, slot: usize },
    #[error("{target} is not a legal target for '{skill}'")]
    InvalidTarget { skill: String, target: CombatantId },
    #[error("{0} is not the active combatant")]
    NotActiveCombatant(CombatantId),
    #[error("unknown combatant {0}")]
    UnknownCombatant(CombatantId),
}

/// Errors related to status effect bookkeeping
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StatusError {
    #[error("{0} is not registered with the status effect engine")]
    NotRegistered(CombatantId),
    #[error("unknown combatant {0}")]
    UnknownCombatant(CombatantId),
}

/// Coarse classification of a failure, used by callers to decide how to react.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Operation invoked in an inconsistent state; ignored.
    InvalidCall,
    /// The action is not legal right now; choose another.
    UnusableAction,
    /// Operated on a combatant the status engine does not track.
    MissingRegistration,
}

impl CombatError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CombatError::Scheduler(_) => ErrorKind::InvalidCall,
            CombatError::Action(ActionError::NotActiveCombatant(_) | ActionError::UnknownCombatant(_)) => {
                ErrorKind::InvalidCall
            }
            CombatError::Action(_) => ErrorKind::UnusableAction,
            CombatError::Status(StatusError::NotRegistered(_)) => ErrorKind::MissingRegistration,
            CombatError::Status(StatusError::UnknownCombatant(_)) => ErrorKind::InvalidCall,
        }
    }
}

/// Type alias for Results using CombatError
pub type CombatResult<T> = Result<T, CombatError>;
