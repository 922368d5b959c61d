//! Handoff Snake - a terminal snake shared by two processes
//!
//! Core modules:
//! - `sim`: Deterministic simulation (movement, collisions, food, score)
//! - `shm`: Fixed-layout shared region and its memory-mapped store
//! - `heartbeat`: Liveness predicate and heartbeat pacing
//! - `role`: Active/Watching arbitration and handoff
//! - `session`: Per-instance control loop wiring it all together
//! - `platform`: Terminal input/output and signal handling

pub mod cli;
pub mod error;
pub mod heartbeat;
pub mod platform;
pub mod role;
pub mod session;
pub mod settings;
pub mod shm;
pub mod sim;
pub mod snapshot;

pub use error::{Error, Result};
pub use role::{ClaimReason, Role, RoleArbiter, RoleChange};
pub use session::Session;
pub use settings::Settings;
pub use shm::{RegionStatus, SharedState, SharedStateStore};

/// Game configuration constants
pub mod consts {
    /// Board dimensions in cells
    pub const BOARD_WIDTH: i32 = 78;
    pub const BOARD_HEIGHT: i32 = 18;

    /// Snake capacity; growth beyond this is silently capped
    pub const MAX_BODY_LEN: usize = 1000;
    pub const INITIAL_BODY_LEN: usize = 3;

    /// Points per food
    pub const FOOD_SCORE: u32 = 10;

    /// Move interval: starts at BASE, loses SPEEDUP_MS every
    /// SPEEDUP_SCORE_STEP points, never below MIN
    pub const BASE_MOVE_INTERVAL_MS: u64 = 200;
    pub const MIN_MOVE_INTERVAL_MS: u64 = 50;
    pub const SPEEDUP_SCORE_STEP: u32 = 50;
    pub const SPEEDUP_MS: u64 = 10;
}
