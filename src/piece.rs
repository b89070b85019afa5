//! Tetromino shapes, their fixed colours, and the falling piece.

use rand::Rng;
use rand::seq::SliceRandom;

/// One of the seven piece colours. The empty sentinel lives in [`crate::board::Cell`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockColor {
    Cyan,
    Yellow,
    Magenta,
    Orange,
    Blue,
    Green,
    Red,
}

impl BlockColor {
    /// Position in the palette (0..7), used to index theme colours.
    pub fn index(self) -> usize {
        match self {
            Self::Cyan => 0,
            Self::Yellow => 1,
            Self::Magenta => 2,
            Self::Orange => 3,
            Self::Blue => 4,
            Self::Green => 5,
            Self::Red => 6,
        }
    }
}

/// Tetromino kinds in palette order (I, O, T, L, J, S, Z).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TetrominoKind {
    I,
    O,
    T,
    L,
    J,
    S,
    Z,
}

impl TetrominoKind {
    pub const ALL: [Self; 7] = [Self::I, Self::O, Self::T, Self::L, Self::J, Self::S, Self::Z];

    /// Spawn orientation as rows of filled flags.
    fn rows(self) -> &'static [&'static [u8]] {
        match self {
            Self::I => &[&[1, 1, 1, 1]],
            Self::O => &[&[1, 1], &[1, 1]],
            Self::T => &[&[0, 1, 0], &[1, 1, 1]],
            Self::L => &[&[1, 0, 0], &[1, 1, 1]],
            Self::J => &[&[0, 0, 1], &[1, 1, 1]],
            Self::S => &[&[0, 1, 1], &[1, 1, 0]],
            Self::Z => &[&[1, 1, 0], &[0, 1, 1]],
        }
    }

    pub fn shape(self) -> Shape {
        Shape::from_rows(self.rows())
    }

    /// Fixed colour pairing; rotation never changes it.
    pub fn color(self) -> BlockColor {
        match self {
            Self::I => BlockColor::Cyan,
            Self::O => BlockColor::Yellow,
            Self::T => BlockColor::Magenta,
            Self::L => BlockColor::Orange,
            Self::J => BlockColor::Blue,
            Self::S => BlockColor::Green,
            Self::Z => BlockColor::Red,
        }
    }

    /// Independent uniform draw over the seven kinds (no bag).
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        *Self::ALL.choose(rng).unwrap_or(&Self::I)
    }
}

/// Rectangular boolean matrix; `cells[row][col]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shape {
    cells: Vec<Vec<bool>>,
}

impl Shape {
    fn from_rows(rows: &[&[u8]]) -> Self {
        Self {
            cells: rows
                .iter()
                .map(|row| row.iter().map(|&c| c != 0).collect())
                .collect(),
        }
    }

    pub fn height(&self) -> usize {
        self.cells.len()
    }

    pub fn width(&self) -> usize {
        self.cells.first().map_or(0, Vec::len)
    }

    /// Clockwise quarter turn: reverse the row order, then transpose.
    /// For an R x C matrix the result is C x R with `out[i][j] = in[R-1-j][i]`.
    pub fn rotated(&self) -> Self {
        let (h, w) = (self.height(), self.width());
        let cells = (0..w)
            .map(|i| (0..h).map(|j| self.cells[h - 1 - j][i]).collect())
            .collect();
        Self { cells }
    }

    /// Offsets `(dx, dy)` of every filled cell, row-major.
    pub fn filled(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.cells.iter().enumerate().flat_map(|(dy, row)| {
            row.iter()
                .enumerate()
                .filter(|(_, filled)| **filled)
                .map(move |(dx, _)| (dx, dy))
        })
    }
}

/// The falling piece. `x`/`y` is the board position of the shape's top-left corner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Piece {
    pub kind: TetrominoKind,
    pub shape: Shape,
    color: BlockColor,
    pub x: i32,
    pub y: i32,
}

impl Piece {
    /// New piece of `kind`, horizontally centred on a board `columns` wide, at row 0.
    pub fn new(kind: TetrominoKind, columns: usize) -> Self {
        let shape = kind.shape();
        let x = (columns / 2) as i32 - (shape.width() / 2) as i32;
        Self {
            kind,
            shape,
            color: kind.color(),
            x,
            y: 0,
        }
    }

    pub fn random<R: Rng + ?Sized>(rng: &mut R, columns: usize) -> Self {
        Self::new(TetrominoKind::random(rng), columns)
    }

    pub fn color(&self) -> BlockColor {
        self.color
    }

    /// Rotate in place. Position is untouched; collision decides whether it sticks.
    pub fn rotate(&mut self) {
        self.shape = self.shape.rotated();
    }

    /// Absolute board coordinates of every filled cell (may lie off the board).
    pub fn cells(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        self.shape
            .filled()
            .map(|(dx, dy)| (self.x + dx as i32, self.y + dy as i32))
    }
}
