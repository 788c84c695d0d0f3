// Skirmish Schema - Shared content definitions
// This crate contains the immutable data a content loader hands to the
// combat core: class stat templates, skill definitions and the effect
// descriptors they carry. Nothing in here mutates during combat.

// Re-export the main types
pub use class_data::*;
pub use skill_data::*;
pub use status_data::*;

pub mod class_data;
pub mod skill_data;
pub mod status_data;
