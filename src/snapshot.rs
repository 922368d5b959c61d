//! Read-only views of the shared region
//!
//! The renderer only ever sees a [`Snapshot`]; `--status` prints a
//! [`StatusReport`].

use serde::Serialize;

use crate::role::Role;
use crate::shm::{NO_OWNER, SharedState};
use crate::sim::{Direction, GamePhase, Point};

/// Everything a frame needs, copied out of the region
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    /// Role of the instance taking the snapshot
    #[serde(skip)]
    pub role: Role,
    pub phase: GamePhase,
    pub score: u32,
    pub high_score: u32,
    pub direction: Direction,
    pub food: Point,
    /// Head first
    pub body: Vec<Point>,
    pub games_played: u32,
    pub food_eaten: u32,
    pub max_length: u32,
}

impl Snapshot {
    pub fn capture(state: &SharedState, role: Role) -> Self {
        let game = &state.game;
        Self {
            role,
            phase: game.phase(),
            score: game.score,
            high_score: game.high_score,
            direction: game.direction(),
            food: game.food,
            body: game.body().to_vec(),
            games_played: game.games_played,
            food_eaten: game.food_eaten,
            max_length: game.max_length,
        }
    }

    pub fn length(&self) -> usize {
        self.body.len()
    }
}

/// Control fields plus the game, for inspection without joining
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub initialized: bool,
    pub heartbeat: u64,
    pub active_owner: Option<u32>,
    pub transfer_request: bool,
    pub game: Snapshot,
}

impl StatusReport {
    pub fn capture(state: &SharedState) -> Self {
        Self {
            initialized: state.is_initialized(),
            heartbeat: state.heartbeat,
            active_owner: (state.active_owner != NO_OWNER).then_some(state.active_owner),
            transfer_request: state.transfer_request != 0,
            game: Snapshot::capture(state, Role::Watching),
        }
    }
}
