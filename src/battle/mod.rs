pub mod ai;
pub mod calculators;
pub mod commands;
pub mod conditions;
pub mod runner;
pub mod scheduler;
pub mod skill_engine;
pub mod state;
pub mod status_engine;
pub mod targeting;

#[cfg(test)]
mod tests;
