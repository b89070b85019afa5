//! Blocktui — classic falling-block puzzle game in the terminal.

mod app;
mod board;
mod game;
mod highscores;
mod input;
mod piece;
mod theme;
mod ui;

use anyhow::{Context, Result};
use app::App;
use board::BoardSize;
use clap::Parser;
use game::GameConfig;
use highscores::HighScoreFile;
use std::path::PathBuf;
use theme::Theme;
use tracing::{Level, warn};

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args)?;

    let board = BoardSize::from_pixels(args.board_width, args.board_height, args.cell_size)
        .context("invalid board geometry")?;
    let theme = Theme::load(args.theme.as_deref()).unwrap_or_else(|e| {
        warn!(error = %e, "theme not loaded, using defaults");
        Theme::default()
    });
    let store = HighScoreFile::new(
        args.high_score_file
            .clone()
            .unwrap_or_else(highscores::default_path),
    );
    let config = GameConfig {
        board,
        seed: args.seed,
    };
    let mut app = App::new(config, theme, store);
    app.run()?;
    Ok(())
}

/// Logs only go to a file; the terminal belongs to the game.
fn init_logging(args: &Args) -> Result<()> {
    let Some(path) = &args.log_file else {
        return Ok(());
    };
    let file = std::fs::File::create(path)
        .with_context(|| format!("creating log file {}", path.display()))?;
    let level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    tracing_subscriber::fmt()
        .with_writer(std::sync::Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .with_max_level(level)
        .init();
    Ok(())
}

/// Classic falling-block puzzle game in the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "blocktui",
    version,
    about = "Classic falling-block puzzle in the terminal. Fill rows to clear them; the game speeds up every 10 rows.",
    long_about = "Blocktui is a terminal take on the classic falling-block puzzle.\n\n\
        Steer the falling piece, complete rows to clear them and score one point per row. \
        Every ten points the pieces fall faster. The game ends when a new piece has no room.\n\n\
        CONTROLS:\n  Left/h  Move left    Right/l  Move right   Down/j  Move down\n  \
        Up/k/Space  Rotate   q/Esc  Quit   r  Restart after game over"
)]
pub struct Args {
    /// Board width in pixels; columns = width / cell size.
    #[arg(long, default_value = "300", value_name = "PX")]
    pub board_width: u32,

    /// Board height in pixels; rows = height / cell size.
    #[arg(long, default_value = "600", value_name = "PX")]
    pub board_height: u32,

    /// Cell size in pixels. Width and height must be multiples of it.
    #[arg(long, default_value = "30", value_name = "PX")]
    pub cell_size: u32,

    /// High score file. Defaults to $XDG_CONFIG_HOME/blocktui/highscore.
    #[arg(long, value_name = "FILE")]
    pub high_score_file: Option<PathBuf>,

    /// Path to theme file (`theme[key]="#RRGGBB"` lines).
    #[arg(short, long, value_name = "FILE")]
    pub theme: Option<PathBuf>,

    /// Seed the piece generator for a replayable sequence.
    #[arg(long, value_name = "N")]
    pub seed: Option<u64>,

    /// Write logs to this file.
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Log at debug level (settles, clears, speed changes).
    #[arg(short, long)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_args_give_classic_board() {
        let args = Args::parse_from(["blocktui"]);
        let board =
            BoardSize::from_pixels(args.board_width, args.board_height, args.cell_size).unwrap();
        assert_eq!((board.columns, board.rows), (10, 20));
        assert!(args.seed.is_none());
        assert!(!args.verbose);
    }

    #[test]
    fn test_geometry_flags() {
        let args = Args::parse_from([
            "blocktui",
            "--board-width",
            "240",
            "--board-height",
            "480",
            "--cell-size",
            "24",
            "--seed",
            "3",
        ]);
        let board =
            BoardSize::from_pixels(args.board_width, args.board_height, args.cell_size).unwrap();
        assert_eq!((board.columns, board.rows), (10, 20));
        assert_eq!(args.seed, Some(3));
    }

    #[test]
    fn test_cli_is_well_formed() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }
}
