//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Seeded RNG only
//! - State lives in a caller-provided [`GameRecord`]
//! - No rendering, role or platform dependencies

pub mod state;
pub mod tick;

pub use state::{Direction, GamePhase, GameRecord, Point};
pub use tick::{Command, Resume, Simulation, TickOutcome, move_interval_ms};
