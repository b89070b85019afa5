//! Layout and drawing: board, falling piece, score panel, next preview, game over.

use crate::board::Cell;
use crate::game::{GameState, level};
use crate::piece::Piece;
use crate::theme::Theme;
use ratatui::Frame;
use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Widget};
use std::time::Instant;
use tachyonfx::{Duration as TfxDuration, Effect, EffectRenderer, Interpolation, fx};

/// Terminal columns per board cell; two make cells roughly square.
const CELL_WIDTH: u16 = 2;
const SIDEBAR_WIDTH: u16 = 24;
/// Preview box in board cells (fits every shape in any orientation).
const PREVIEW_CELLS: u16 = 4;
const GAME_OVER_FADE_MS: u32 = 600;

/// Board plus border, in terminal cells.
fn board_outer_size(state: &GameState) -> (u16, u16) {
    let size = state.size();
    let columns = u16::try_from(size.columns).unwrap_or(u16::MAX);
    let rows = u16::try_from(size.rows).unwrap_or(u16::MAX);
    (
        columns.saturating_mul(CELL_WIDTH).saturating_add(2),
        rows.saturating_add(2),
    )
}

/// Draw one frame. `game_over_effect` / `effect_time` carry the game-over fade between frames.
pub fn draw(
    frame: &mut Frame,
    state: &GameState,
    theme: &Theme,
    game_over_effect: &mut Option<Effect>,
    effect_time: &mut Option<Instant>,
    now: Instant,
) {
    let (board_area, sidebar_area) = split_screen(frame.area(), state);
    draw_board(frame.buffer_mut(), state, theme, board_area);
    draw_sidebar(frame, state, theme, sidebar_area);

    if state.is_over() {
        let popup = draw_game_over(frame, state, theme, board_area);
        let delta = effect_time
            .map(|t| now.saturating_duration_since(t))
            .unwrap_or_default();
        *effect_time = Some(now);
        let effect = game_over_effect.get_or_insert_with(|| {
            fx::fade_from(
                theme.background,
                theme.background,
                (GAME_OVER_FADE_MS, Interpolation::Linear),
            )
        });
        let delta_ms = delta.as_millis().min(u128::from(u32::MAX)) as u32;
        frame.render_effect(effect, popup, TfxDuration::from_millis(delta_ms));
    }
}

/// Centre board + sidebar on screen; returns (board incl. border, sidebar).
fn split_screen(area: Rect, state: &GameState) -> (Rect, Rect) {
    let (bw, bh) = board_outer_size(state);
    let horiz = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(bw),
            Constraint::Length(SIDEBAR_WIDTH),
            Constraint::Fill(1),
        ])
        .split(area);
    let vert = |r: Rect| {
        Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Fill(1),
                Constraint::Length(bh),
                Constraint::Fill(1),
            ])
            .split(r)[1]
    };
    (vert(horiz[1]), vert(horiz[2]))
}

fn set_cell(buf: &mut Buffer, x: u16, y: u16, symbol: &str, style: Style) {
    if let Some(cell) = buf.cell_mut((x, y)) {
        cell.set_symbol(symbol).set_style(style);
    }
}

/// Paint one board cell (CELL_WIDTH terminal columns) at terminal position (x, y).
fn paint_block(buf: &mut Buffer, x: u16, y: u16, color: Color) {
    let style = Style::default().fg(color).bg(color);
    for dx in 0..CELL_WIDTH {
        set_cell(buf, x + dx, y, "█", style);
    }
}

fn draw_board(buf: &mut Buffer, state: &GameState, theme: &Theme, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.grid).bg(theme.background));
    let inner = block.inner(area);
    block.render(area, buf);

    let size = state.size();
    let grid = state.grid();
    let empty = Style::default().fg(theme.grid).bg(theme.background);
    for y in 0..size.rows {
        for x in 0..size.columns {
            let (tx, ty) = (inner.x + x as u16 * CELL_WIDTH, inner.y + y as u16);
            if tx >= inner.right() || ty >= inner.bottom() {
                continue;
            }
            match grid.get(x, y) {
                Some(Cell::Block(color)) => paint_block(buf, tx, ty, theme.block(color)),
                _ => {
                    set_cell(buf, tx, ty, " ", empty);
                    set_cell(buf, tx + 1, ty, "·", empty);
                }
            }
        }
    }

    // The falling piece is drawn over the grid; cells above the board are skipped.
    if !state.is_over() {
        let color = theme.block(state.current.color());
        for (x, y) in state.current.cells() {
            if x < 0 || y < 0 {
                continue;
            }
            let (tx, ty) = (inner.x + x as u16 * CELL_WIDTH, inner.y + y as u16);
            if tx < inner.right() && ty < inner.bottom() {
                paint_block(buf, tx, ty, color);
            }
        }
    }
}

fn draw_sidebar(frame: &mut Frame, state: &GameState, theme: &Theme, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(7), // scores
            Constraint::Length(PREVIEW_CELLS + 3), // next shape
            Constraint::Length(7), // controls
            Constraint::Fill(1),
        ])
        .split(area);

    let label = Style::default()
        .fg(theme.text)
        .bg(theme.panel)
        .add_modifier(Modifier::BOLD);
    let value = Style::default().fg(Color::Black).bg(theme.panel);
    let row = |name: &'static str, v: String| {
        Line::from(vec![Span::styled(name, label), Span::styled(v, value)])
    };
    let stats = vec![
        row("HI-SCORE: ", state.high_score.to_string()),
        row("   SCORE: ", state.score.to_string()),
        row("   LEVEL: ", level(state.score).to_string()),
        row("   SPEED: ", format!("{:.2}s", state.fall_speed)),
    ];
    Paragraph::new(stats)
        .style(Style::default().bg(theme.panel))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.text).bg(theme.panel)),
        )
        .render(chunks[0], frame.buffer_mut());

    let next_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.text).bg(theme.preview))
        .style(Style::default().bg(theme.preview))
        .title(Span::styled(" NEXT SHAPE ", label));
    let next_inner = next_block.inner(chunks[1]);
    next_block.render(chunks[1], frame.buffer_mut());
    draw_preview(frame.buffer_mut(), &state.next, theme, next_inner);

    let controls = vec![
        Line::from(" ←/h →/l   Move"),
        Line::from(" ↑/k/Space Rotate"),
        Line::from(" ↓/j       Down"),
        Line::from(" q/Esc     Quit"),
    ];
    Paragraph::new(controls)
        .style(Style::default().fg(theme.grid).bg(theme.background))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.grid).bg(theme.background)),
        )
        .render(chunks[2], frame.buffer_mut());
}

/// Next piece centred in its box, in its spawn orientation.
fn draw_preview(buf: &mut Buffer, piece: &Piece, theme: &Theme, area: Rect) {
    let (w, h) = (piece.shape.width() as u16, piece.shape.height() as u16);
    let off_x = area.width.saturating_sub(w * CELL_WIDTH) / 2;
    let off_y = area.height.saturating_sub(h) / 2;
    let color = theme.block(piece.color());
    for (dx, dy) in piece.shape.filled() {
        let tx = area.x + off_x + dx as u16 * CELL_WIDTH;
        let ty = area.y + off_y + dy as u16;
        if tx < area.right() && ty < area.bottom() {
            paint_block(buf, tx, ty, color);
        }
    }
}

/// Overlay centred on the board. Returns its rect for the fade effect.
fn draw_game_over(frame: &mut Frame, state: &GameState, theme: &Theme, board: Rect) -> Rect {
    let popup_w = 22u16.min(board.width);
    let popup_h = 7u16.min(board.height);
    let popup = Rect {
        x: board.x + board.width.saturating_sub(popup_w) / 2,
        y: board.y + board.height.saturating_sub(popup_h) / 2,
        width: popup_w,
        height: popup_h,
    };
    let text = Style::default().fg(theme.text).bg(theme.panel);
    let lines = vec![
        Line::from(Span::styled(
            " GAME OVER ",
            Style::default()
                .fg(Color::White)
                .bg(theme.text)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(format!(" Score: {} ", state.score), text)),
        Line::from(Span::styled(format!(" Best: {} ", state.high_score), text)),
        Line::from(Span::styled(" R Restart  Q Quit ", text)),
    ];
    Clear.render(popup, frame.buffer_mut());
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .style(Style::default().bg(theme.panel))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.text).bg(theme.panel)),
        )
        .render(popup, frame.buffer_mut());
    popup
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::BoardSize;
    use crate::game::GameConfig;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn buffer_text(buf: &Buffer) -> String {
        buf.content().iter().map(|c| c.symbol()).collect()
    }

    #[test]
    fn test_draw_shows_scores_and_next() {
        let state = GameState::new(
            GameConfig {
                board: BoardSize::default(),
                seed: Some(11),
            },
            12,
        );
        let theme = Theme::classic();
        let mut terminal = Terminal::new(TestBackend::new(60, 24)).unwrap();
        let (mut effect, mut time) = (None, None);
        terminal
            .draw(|f| draw(f, &state, &theme, &mut effect, &mut time, Instant::now()))
            .unwrap();
        let text = buffer_text(terminal.backend().buffer());
        assert!(text.contains("HI-SCORE: 12"));
        assert!(text.contains("NEXT SHAPE"));
        assert!(text.contains('█'));
        assert!(effect.is_none());
    }

    #[test]
    fn test_draw_survives_tiny_terminal() {
        let state = GameState::new(GameConfig::default(), 0);
        let theme = Theme::classic();
        let mut terminal = Terminal::new(TestBackend::new(10, 5)).unwrap();
        let (mut effect, mut time) = (None, None);
        terminal
            .draw(|f| draw(f, &state, &theme, &mut effect, &mut time, Instant::now()))
            .unwrap();
    }

    #[test]
    fn test_draw_largest_board_in_small_terminal() {
        let board = BoardSize::from_pixels(255, 255, 1).unwrap();
        let state = GameState::new(GameConfig { board, seed: Some(2) }, 0);
        let theme = Theme::classic();
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        let (mut effect, mut time) = (None, None);
        terminal
            .draw(|f| draw(f, &state, &theme, &mut effect, &mut time, Instant::now()))
            .unwrap();
    }
}
