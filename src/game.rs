//! Game state: locked cells, current/next piece, timed descent, scoring and speed.

use crate::board::{BoardSize, Grid, LockedCells, clear_rows, lock_piece};
use crate::input::Action;
use crate::piece::Piece;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::time::Duration;
use tracing::debug;

/// Seconds per row before the first point is scored.
pub const BASE_FALL_SPEED: f64 = 0.3;
/// Speed gained per completed bucket of ten points.
const FALL_SPEED_STEP: f64 = 0.02;
/// Points per speed bucket.
const POINTS_PER_LEVEL: u32 = 10;
/// Fall speed never drops below this.
pub const MIN_FALL_SPEED: f64 = 0.05;

/// Seconds per row of automatic descent at `score`.
pub fn fall_speed(score: u32) -> f64 {
    if score == 0 {
        return BASE_FALL_SPEED;
    }
    let bucket = f64::from(score / POINTS_PER_LEVEL);
    (BASE_FALL_SPEED - bucket * FALL_SPEED_STEP).max(MIN_FALL_SPEED)
}

/// Speed bucket shown as the level.
pub fn level(score: u32) -> u32 {
    score / POINTS_PER_LEVEL
}

/// Options for a new game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GameConfig {
    pub board: BoardSize,
    /// Fixed RNG seed; `None` seeds from OS entropy.
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Running,
    GameOver,
}

/// What happened during one [`GameState::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickOutcome {
    /// The falling piece settled into the locked cells.
    pub settled: bool,
    pub rows_cleared: usize,
    /// Set when the score beat the previous high score; carries the new record.
    pub new_high_score: Option<u32>,
    /// This tick ended the game.
    pub game_over: bool,
}

#[derive(Debug)]
pub struct GameState {
    size: BoardSize,
    locked: LockedCells,
    grid: Grid,
    pub current: Piece,
    pub next: Piece,
    pub score: u32,
    pub high_score: u32,
    pub fall_speed: f64,
    fall_timer: Duration,
    pub status: Status,
    rng: StdRng,
}

impl GameState {
    /// Fresh game on an empty board. `high_score` is the record loaded by the caller.
    pub fn new(config: GameConfig, high_score: u32) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::with_rng(config.board, high_score, rng)
    }

    fn with_rng(size: BoardSize, high_score: u32, mut rng: StdRng) -> Self {
        let current = Piece::random(&mut rng, size.columns);
        let next = Piece::random(&mut rng, size.columns);
        let locked = LockedCells::new();
        Self {
            size,
            grid: Grid::from_locked(size, &locked),
            locked,
            current,
            next,
            score: 0,
            high_score,
            fall_speed: BASE_FALL_SPEED,
            fall_timer: Duration::ZERO,
            status: Status::Running,
            rng,
        }
    }

    pub fn size(&self) -> BoardSize {
        self.size
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn is_over(&self) -> bool {
        self.status == Status::GameOver
    }

    /// Advance one frame: rebuild the grid, run timed descent, apply `actions`
    /// in order, then clear rows, score and rescale the speed.
    pub fn tick(&mut self, elapsed: Duration, actions: &[Action]) -> TickOutcome {
        let mut outcome = TickOutcome::default();
        if self.is_over() {
            return outcome;
        }
        self.rebuild_grid();

        self.fall_timer += elapsed;
        if self.fall_timer.as_secs_f64() >= self.fall_speed {
            self.fall_timer = Duration::ZERO;
            if !self.try_move(0, 1) {
                self.settle();
                outcome.settled = true;
                if self.grid.collides(&self.current) {
                    self.status = Status::GameOver;
                    outcome.game_over = true;
                    return outcome;
                }
            }
        }

        for action in actions {
            self.apply(*action);
        }

        let level_before = level(self.score);
        let cleared = clear_rows(&self.grid, &mut self.locked);
        if cleared > 0 {
            self.rebuild_grid();
            self.score += cleared as u32;
            outcome.rows_cleared = cleared;
        }

        if self.score > self.high_score {
            self.high_score = self.score;
            outcome.new_high_score = Some(self.score);
        }

        let speed = fall_speed(self.score);
        if level(self.score) != level_before {
            debug!(from = self.fall_speed, to = speed, level = level(self.score), "fall speed changed");
        }
        self.fall_speed = speed;
        outcome
    }

    /// Player input. Rejected moves are rolled back silently; moving down never locks.
    fn apply(&mut self, action: Action) {
        match action {
            Action::MoveLeft => {
                self.try_move(-1, 0);
            }
            Action::MoveRight => {
                self.try_move(1, 0);
            }
            Action::MoveDown => {
                self.try_move(0, 1);
            }
            Action::Rotate => self.try_rotate(),
            Action::Quit | Action::Restart | Action::None => {}
        }
    }

    /// Shift the current piece; on collision restore it. Returns whether it moved.
    fn try_move(&mut self, dx: i32, dy: i32) -> bool {
        self.current.x += dx;
        self.current.y += dy;
        if self.grid.collides(&self.current) {
            self.current.x -= dx;
            self.current.y -= dy;
            return false;
        }
        true
    }

    fn try_rotate(&mut self) {
        let before = self.current.shape.clone();
        self.current.rotate();
        if self.grid.collides(&self.current) {
            self.current.shape = before;
        }
    }

    /// Lock the current piece, promote the next one and draw a new next.
    fn settle(&mut self) {
        lock_piece(&self.current, &mut self.locked);
        debug!(kind = ?self.current.kind, x = self.current.x, y = self.current.y, "piece settled");
        let fresh = Piece::random(&mut self.rng, self.size.columns);
        self.current = std::mem::replace(&mut self.next, fresh);
        self.rebuild_grid();
    }

    fn rebuild_grid(&mut self) {
        self.grid = Grid::from_locked(self.size, &self.locked);
    }
}
