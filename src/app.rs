//! App: terminal init, main loop, event drain and high-score persistence.

use crate::game::{GameConfig, GameState, TickOutcome};
use crate::highscores::HighScoreFile;
use crate::input::{Action, key_to_action};
use crate::theme::Theme;
use anyhow::Result;
use crossterm::event::{self, Event};
use ratatui::DefaultTerminal;
use std::time::{Duration, Instant};
use tachyonfx::Effect;
use tracing::{debug, info, warn};

/// Frame budget (~60 FPS); input is polled for at most this long per iteration.
const FRAME: Duration = Duration::from_millis(16);

pub struct App {
    config: GameConfig,
    theme: Theme,
    store: HighScoreFile,
    state: GameState,
    last_frame: Instant,
    /// Fade for the game-over overlay (created on first game-over frame).
    game_over_effect: Option<Effect>,
    /// Last time the effect was processed (for delta).
    effect_time: Option<Instant>,
}

impl App {
    pub fn new(config: GameConfig, theme: Theme, store: HighScoreFile) -> Self {
        let high_score = store.load();
        info!(
            columns = config.board.columns,
            rows = config.board.rows,
            high_score,
            path = %store.path().display(),
            "starting"
        );
        Self {
            state: GameState::new(config, high_score),
            config,
            theme,
            store,
            last_frame: Instant::now(),
            game_over_effect: None,
            effect_time: None,
        }
    }

    fn restart(&mut self) {
        info!(best = self.state.high_score, "new game");
        self.state = GameState::new(self.config, self.state.high_score);
        self.game_over_effect = None;
        self.effect_time = None;
        self.last_frame = Instant::now();
    }

    pub fn run(&mut self) -> Result<()> {
        use crossterm::{
            execute,
            terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
        };

        enable_raw_mode()?;
        let mut stdout = std::io::stdout();
        if let Err(e) = execute!(stdout, EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(e.into());
        }

        let result = ratatui::DefaultTerminal::new(ratatui::backend::CrosstermBackend::new(stdout))
            .map_err(anyhow::Error::from)
            .and_then(|mut terminal| {
                terminal.hide_cursor()?;
                self.run_loop(&mut terminal)
            });

        // Restore
        execute!(std::io::stdout(), LeaveAlternateScreen)?;
        disable_raw_mode()?;
        execute!(std::io::stdout(), crossterm::cursor::Show)?;

        result
    }

    fn run_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        self.last_frame = Instant::now();
        loop {
            let now = Instant::now();
            let elapsed = now.duration_since(self.last_frame);
            self.last_frame = now;

            let actions = drain_actions()?;
            match next_step(&actions, self.state.is_over()) {
                Step::Quit => return Ok(()),
                Step::Restart => self.restart(),
                Step::Tick => {
                    let outcome = self.state.tick(elapsed, &actions);
                    self.record(outcome);
                }
                Step::Wait => {}
            }

            terminal.draw(|f| {
                crate::ui::draw(
                    f,
                    &self.state,
                    &self.theme,
                    &mut self.game_over_effect,
                    &mut self.effect_time,
                    now,
                );
            })?;

            // Sleep out the rest of the frame, waking early on input.
            let timeout = FRAME.saturating_sub(now.elapsed());
            event::poll(timeout)?;
        }
    }

    /// Log the tick and persist a new record. A failed write is logged and play continues.
    fn record(&self, outcome: TickOutcome) {
        if outcome.settled {
            debug!(next = ?self.state.next.kind, "spawned");
        }
        if outcome.rows_cleared > 0 {
            debug!(rows = outcome.rows_cleared, score = self.state.score, "rows cleared");
        }
        if outcome.game_over {
            info!(score = self.state.score, best = self.state.high_score, "game over");
        }
        if let Some(score) = outcome.new_high_score {
            match self.store.save(score) {
                Ok(()) => info!(score, "new high score saved"),
                Err(e) => warn!(error = %e, "could not save high score"),
            }
        }
    }
}

/// What the loop does with one frame's drained actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Quit,
    Restart,
    Tick,
    /// Game over with no restart requested; keep showing the final board.
    Wait,
}

/// Quit wins over everything else queued in the same frame. After game over
/// only a restart is honoured; otherwise the game advances.
fn next_step(actions: &[Action], game_over: bool) -> Step {
    if actions.contains(&Action::Quit) {
        Step::Quit
    } else if !game_over {
        Step::Tick
    } else if actions.contains(&Action::Restart) {
        Step::Restart
    } else {
        Step::Wait
    }
}

/// Every pending key action, in arrival order, without blocking.
fn drain_actions() -> Result<Vec<Action>> {
    let mut events = Vec::new();
    while event::poll(Duration::ZERO)? {
        events.push(event::read()?);
    }
    Ok(actions_from_events(events))
}

/// Key events mapped to actions in order; other events and unbound keys are dropped.
fn actions_from_events(events: impl IntoIterator<Item = Event>) -> Vec<Action> {
    events
        .into_iter()
        .filter_map(|ev| match ev {
            Event::Key(key) => Some(key_to_action(key)),
            _ => None,
        })
        .filter(|action| *action != Action::None)
        .collect()
}
