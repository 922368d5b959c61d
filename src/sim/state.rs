//! Game state and core simulation types
//!
//! Everything that must survive a handoff lives in [`GameRecord`], a plain
//! `#[repr(C)]` block that sits inside the shared region. Enumerations are
//! stored as raw `u32` so any bit pattern another process leaves behind is
//! still a valid record.

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Current phase of gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Snake is moving
    Running,
    /// Game is paused
    Paused,
    /// Snake hit a wall or itself
    GameOver,
}

impl GamePhase {
    pub fn to_raw(self) -> u32 {
        match self {
            GamePhase::Running => 0,
            GamePhase::Paused => 1,
            GamePhase::GameOver => 2,
        }
    }

    /// Unknown values read back as `GameOver` so a garbled record restarts
    /// instead of resuming.
    pub fn from_raw(raw: u32) -> Self {
        match raw {
            0 => GamePhase::Running,
            1 => GamePhase::Paused,
            _ => GamePhase::GameOver,
        }
    }
}

/// Heading of the snake
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub fn to_raw(self) -> u32 {
        match self {
            Direction::Up => 0,
            Direction::Down => 1,
            Direction::Left => 2,
            Direction::Right => 3,
        }
    }

    pub fn from_raw(raw: u32) -> Self {
        match raw {
            0 => Direction::Up,
            1 => Direction::Down,
            2 => Direction::Left,
            _ => Direction::Right,
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    /// Unit step in board coordinates (y grows downward)
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }
}

/// A board cell
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Pod, Zeroable, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn step(self, dir: Direction) -> Self {
        let (dx, dy) = dir.delta();
        Self::new(self.x + dx, self.y + dy)
    }

    pub fn in_bounds(self) -> bool {
        self.x >= 0 && self.x < BOARD_WIDTH && self.y >= 0 && self.y < BOARD_HEIGHT
    }
}

/// Simulation snapshot as stored in the shared region
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct GameRecord {
    pub game_state: u32,
    pub score: u32,
    pub high_score: u32,
    /// Number of valid entries at the front of `body`
    pub body_len: u32,
    pub direction: u32,
    pub food: Point,
    /// Completed games (incremented on game over)
    pub games_played: u32,
    /// Food eaten across all games
    pub food_eaten: u32,
    /// Longest snake ever reached
    pub max_length: u32,
    /// Head first
    pub body: [Point; MAX_BODY_LEN],
}

impl GameRecord {
    pub fn phase(&self) -> GamePhase {
        GamePhase::from_raw(self.game_state)
    }

    pub fn set_phase(&mut self, phase: GamePhase) {
        self.game_state = phase.to_raw();
    }

    pub fn direction(&self) -> Direction {
        Direction::from_raw(self.direction)
    }

    pub fn set_direction(&mut self, dir: Direction) {
        self.direction = dir.to_raw();
    }

    /// Body length clamped to capacity, whatever is stored
    pub fn len(&self) -> usize {
        (self.body_len as usize).min(MAX_BODY_LEN)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Valid body cells, head first
    pub fn body(&self) -> &[Point] {
        &self.body[..self.len()]
    }

    pub fn head(&self) -> Option<Point> {
        self.body().first().copied()
    }

    pub fn occupies(&self, cell: Point) -> bool {
        self.body().contains(&cell)
    }

    /// Raise high score if the current score beats it
    pub fn record_high_score(&mut self) {
        self.high_score = self.high_score.max(self.score);
    }
}

impl Default for GameRecord {
    fn default() -> Self {
        Zeroable::zeroed()
    }
}
