//! Fixed-interval simulation tick
//!
//! Advances the snake one cell per call. Only the instance holding the
//! Active role drives this; the record it mutates lives in the shared region.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::state::{Direction, GamePhase, GameRecord, Point};
use crate::consts::*;

/// Discrete gameplay commands (role and quit keys are handled elsewhere)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Turn(Direction),
    TogglePause,
    Restart,
}

/// What a single tick did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Not running, nothing moved
    Idle,
    Moved,
    /// Moved onto the food
    Ate,
    /// Wall or self hit; game is over
    Crashed,
}

/// How a freshly claimed Active instance treats the stored game
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resume {
    /// Start a new game only if nothing was ever stored
    IfEmpty,
    /// Start a new game if nothing is stored or the stored game ended
    IfEmptyOrOver,
}

/// Time between moves for a given score (speeds up, clamped to a floor)
pub fn move_interval_ms(score: u32) -> u64 {
    let step = u64::from(score / SPEEDUP_SCORE_STEP) * SPEEDUP_MS;
    BASE_MOVE_INTERVAL_MS
        .saturating_sub(step)
        .max(MIN_MOVE_INTERVAL_MS)
}

/// Snake engine: owns the RNG, borrows the record per call
#[derive(Debug, Clone)]
pub struct Simulation {
    rng: Pcg32,
}

impl Simulation {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    /// Reset the actor and score; high score and lifetime counters persist
    pub fn new_game(&mut self, record: &mut GameRecord) {
        record.set_phase(GamePhase::Running);
        record.score = 0;
        record.set_direction(Direction::Right);

        let start = Point::new(BOARD_WIDTH / 2, BOARD_HEIGHT / 2);
        for (i, cell) in record.body.iter_mut().take(INITIAL_BODY_LEN).enumerate() {
            *cell = Point::new(start.x - i as i32, start.y);
        }
        record.body_len = INITIAL_BODY_LEN as u32;
        record.max_length = record.max_length.max(record.body_len);

        self.spawn_food(record);
        log::info!("New game started (high score {})", record.high_score);
    }

    /// Prepare the stored game after this instance became Active.
    /// Returns true if a new game was started.
    pub fn resume(&mut self, record: &mut GameRecord, policy: Resume) -> bool {
        let restart = match policy {
            Resume::IfEmpty => record.is_empty(),
            Resume::IfEmptyOrOver => record.is_empty() || record.phase() == GamePhase::GameOver,
        };
        if restart {
            self.new_game(record);
        } else {
            log::info!(
                "Resuming stored game: score {}, length {}, {:?}",
                record.score,
                record.len(),
                record.phase()
            );
        }
        restart
    }

    /// Apply a gameplay command. Returns true if the record changed.
    pub fn apply(&mut self, record: &mut GameRecord, command: Command) -> bool {
        match command {
            Command::Turn(dir) => {
                let current = record.direction();
                if record.phase() != GamePhase::Running || dir == current || dir == current.opposite() {
                    return false;
                }
                record.set_direction(dir);
                true
            }
            Command::TogglePause => match record.phase() {
                GamePhase::Running => {
                    record.set_phase(GamePhase::Paused);
                    true
                }
                GamePhase::Paused => {
                    record.set_phase(GamePhase::Running);
                    true
                }
                GamePhase::GameOver => false,
            },
            Command::Restart => {
                if record.phase() != GamePhase::GameOver {
                    return false;
                }
                self.new_game(record);
                true
            }
        }
    }

    /// Advance the snake by one cell
    pub fn tick(&mut self, record: &mut GameRecord) -> TickOutcome {
        if record.phase() != GamePhase::Running {
            return TickOutcome::Idle;
        }
        let Some(head) = record.head() else {
            return TickOutcome::Idle;
        };

        let new_head = head.step(record.direction());
        let eats = new_head == record.food;
        let len = record.len();
        let grows = eats && len < MAX_BODY_LEN;

        // Tail cell moves out of the way unless the snake grows into it
        let blocking = if grows { len } else { len - 1 };
        if !new_head.in_bounds() || record.body[..blocking].contains(&new_head) {
            self.end_game(record);
            return TickOutcome::Crashed;
        }

        let new_len = if grows { len + 1 } else { len };
        record.body.copy_within(0..new_len - 1, 1);
        record.body[0] = new_head;
        record.body_len = new_len as u32;

        if !eats {
            return TickOutcome::Moved;
        }

        record.score = record.score.saturating_add(FOOD_SCORE);
        record.food_eaten = record.food_eaten.saturating_add(1);
        record.max_length = record.max_length.max(record.body_len);
        self.spawn_food(record);
        log::debug!("Food eaten: score {}, length {}", record.score, new_len);
        TickOutcome::Ate
    }

    /// Place food on a uniformly chosen free cell
    pub fn spawn_food(&mut self, record: &mut GameRecord) {
        debug_assert!(record.len() < (BOARD_WIDTH * BOARD_HEIGHT) as usize);
        loop {
            let cell = Point::new(
                self.rng.random_range(0..BOARD_WIDTH),
                self.rng.random_range(0..BOARD_HEIGHT),
            );
            if !record.occupies(cell) {
                record.food = cell;
                return;
            }
        }
    }

    fn end_game(&mut self, record: &mut GameRecord) {
        record.set_phase(GamePhase::GameOver);
        record.record_high_score();
        record.games_played = record.games_played.saturating_add(1);
        log::info!(
            "Game over: score {}, high score {}",
            record.score,
            record.high_score
        );
    }
}
