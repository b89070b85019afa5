//! Board model: locked cells, the per-tick grid, collision, lock-in and line clears.

use crate::piece::{BlockColor, Piece};
use std::collections::HashMap;
use thiserror::Error;

/// Board coordinate `(column, row)`; row 0 is the top.
pub type Position = (usize, usize);

/// Settled cells. The single source of truth for occupancy.
pub type LockedCells = HashMap<Position, BlockColor>;

/// Narrowest board that still fits the I piece lying flat.
const MIN_COLUMNS: usize = 4;
const MIN_ROWS: usize = 2;
/// Largest board the terminal renderer can lay out in `u16` cell math.
pub const MAX_COLUMNS: usize = 255;
pub const MAX_ROWS: usize = 255;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GeometryError {
    #[error("cell size must be greater than zero")]
    ZeroCellSize,
    #[error("board {axis} of {pixels}px is not a multiple of the {cell}px cell size")]
    NotMultiple {
        axis: &'static str,
        pixels: u32,
        cell: u32,
    },
    #[error("board of {columns}x{rows} cells is too small for the pieces")]
    TooSmall { columns: usize, rows: usize },
    #[error(
        "board of {columns}x{rows} cells exceeds the {max_columns}x{max_rows} limit",
        max_columns = MAX_COLUMNS,
        max_rows = MAX_ROWS
    )]
    TooLarge { columns: usize, rows: usize },
}

/// Board dimensions in cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardSize {
    pub columns: usize,
    pub rows: usize,
}

impl Default for BoardSize {
    fn default() -> Self {
        Self {
            columns: 10,
            rows: 20,
        }
    }
}

impl BoardSize {
    /// Derive the cell grid from a pixel board, e.g. 300x600 at 30px -> 10x20.
    pub fn from_pixels(width: u32, height: u32, cell: u32) -> Result<Self, GeometryError> {
        if cell == 0 {
            return Err(GeometryError::ZeroCellSize);
        }
        for (axis, pixels) in [("width", width), ("height", height)] {
            if pixels % cell != 0 {
                return Err(GeometryError::NotMultiple { axis, pixels, cell });
            }
        }
        let size = Self {
            columns: (width / cell) as usize,
            rows: (height / cell) as usize,
        };
        if size.columns < MIN_COLUMNS || size.rows < MIN_ROWS {
            return Err(GeometryError::TooSmall {
                columns: size.columns,
                rows: size.rows,
            });
        }
        if size.columns > MAX_COLUMNS || size.rows > MAX_ROWS {
            return Err(GeometryError::TooLarge {
                columns: size.columns,
                rows: size.rows,
            });
        }
        Ok(size)
    }
}

/// Single cell: either the empty sentinel or a settled colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cell {
    #[default]
    Empty,
    Block(BlockColor),
}

/// Rendered rows x columns view of the locked cells. Rebuilt every tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    size: BoardSize,
    /// rows[y][x]; rows[0] is the top.
    rows: Vec<Vec<Cell>>,
}

impl Grid {
    /// Every cell absent from `locked` is empty. Entries outside the board are ignored.
    pub fn from_locked(size: BoardSize, locked: &LockedCells) -> Self {
        let mut rows = vec![vec![Cell::Empty; size.columns]; size.rows];
        for (&(x, y), &color) in locked {
            if let Some(cell) = rows.get_mut(y).and_then(|row| row.get_mut(x)) {
                *cell = Cell::Block(color);
            }
        }
        Self { size, rows }
    }

    pub fn size(&self) -> BoardSize {
        self.size
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> Option<Cell> {
        self.rows.get(y).and_then(|row| row.get(x)).copied()
    }

    pub fn row_is_full(&self, y: usize) -> bool {
        self.rows
            .get(y)
            .is_some_and(|row| row.iter().all(|c| *c != Cell::Empty))
    }

    /// True if any filled cell of `piece` leaves the board sideways, sits below
    /// the floor, or overlaps an occupied cell. Cells above row 0 only check columns.
    pub fn collides(&self, piece: &Piece) -> bool {
        let columns = self.size.columns as i32;
        let rows = self.size.rows as i32;
        piece.cells().any(|(x, y)| {
            if x < 0 || x >= columns || y >= rows {
                return true;
            }
            if y < 0 {
                return false;
            }
            self.get(x as usize, y as usize) != Some(Cell::Empty)
        })
    }
}

/// Write every filled cell of `piece` into `locked` with the piece's colour.
/// Callers only lock a piece at a position that passed [`Grid::collides`].
pub fn lock_piece(piece: &Piece, locked: &mut LockedCells) {
    for (x, y) in piece.cells() {
        if x >= 0 && y >= 0 {
            locked.insert((x as usize, y as usize), piece.color());
        }
    }
}

/// Remove every full row of `grid` from `locked`, then compact the survivors
/// downward. Returns the number of rows removed.
///
/// Each surviving cell drops by the number of cleared rows *below* it, not by
/// the total cleared count. The two agree when every cleared row lies under all
/// survivors; when a middle row clears, cells beneath it stay put instead of
/// being pushed through the floor or onto each other.
pub fn clear_rows(grid: &Grid, locked: &mut LockedCells) -> usize {
    let size = grid.size();
    let full: Vec<usize> = (0..size.rows)
        .rev()
        .filter(|&y| grid.row_is_full(y))
        .collect();
    if full.is_empty() {
        return 0;
    }
    locked.retain(|&(_, y), _| !full.contains(&y));

    // Bottom-up so a cell never lands on one that has not moved yet.
    let mut keys: Vec<Position> = locked.keys().copied().collect();
    keys.sort_unstable_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    for (x, y) in keys {
        let drop = full.iter().filter(|&&cleared| cleared > y).count();
        if drop == 0 {
            continue;
        }
        if let Some(color) = locked.remove(&(x, y)) {
            let new_y = y + drop;
            if new_y < size.rows {
                locked.insert((x, new_y), color);
            }
        }
    }
    full.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::piece::TetrominoKind;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::collections::HashSet;

    const SIZE: BoardSize = BoardSize {
        columns: 10,
        rows: 20,
    };

    fn fill_row(locked: &mut LockedCells, y: usize) {
        for x in 0..SIZE.columns {
            locked.insert((x, y), BlockColor::Blue);
        }
    }

    #[test]
    fn test_geometry_from_default_pixels() {
        assert_eq!(BoardSize::from_pixels(300, 600, 30), Ok(SIZE));
    }

    #[test]
    fn test_geometry_rejects_uneven_and_zero() {
        assert_eq!(
            BoardSize::from_pixels(310, 600, 30),
            Err(GeometryError::NotMultiple {
                axis: "width",
                pixels: 310,
                cell: 30
            })
        );
        assert_eq!(
            BoardSize::from_pixels(300, 600, 0),
            Err(GeometryError::ZeroCellSize)
        );
        assert!(matches!(
            BoardSize::from_pixels(90, 600, 30),
            Err(GeometryError::TooSmall { .. })
        ));
    }

    #[test]
    fn test_geometry_rejects_oversized_board() {
        assert_eq!(
            BoardSize::from_pixels(40_000, 600, 1),
            Err(GeometryError::TooLarge {
                columns: 40_000,
                rows: 600
            })
        );
        assert!(matches!(
            BoardSize::from_pixels(10, 256, 1),
            Err(GeometryError::TooLarge { .. })
        ));
        let largest = BoardSize::from_pixels(255, 255, 1).unwrap();
        assert_eq!((largest.columns, largest.rows), (MAX_COLUMNS, MAX_ROWS));
    }

    #[test]
    fn test_grid_reflects_locked_cells_only() {
        let mut locked = LockedCells::new();
        locked.insert((2, 7), BlockColor::Red);
        let grid = Grid::from_locked(SIZE, &locked);
        for y in 0..SIZE.rows {
            for x in 0..SIZE.columns {
                let expected = if (x, y) == (2, 7) {
                    Cell::Block(BlockColor::Red)
                } else {
                    Cell::Empty
                };
                assert_eq!(grid.get(x, y), Some(expected));
            }
        }
        assert_eq!(grid.get(SIZE.columns, 0), None);
    }

    #[test]
    fn test_collision_bounds() {
        let grid = Grid::from_locked(SIZE, &LockedCells::new());
        let mut piece = Piece::new(TetrominoKind::O, SIZE.columns);
        assert!(!grid.collides(&piece));

        piece.x = -1;
        assert!(grid.collides(&piece));
        piece.x = SIZE.columns as i32 - 1;
        assert!(grid.collides(&piece));
        piece.x = SIZE.columns as i32 - 2;
        assert!(!grid.collides(&piece));

        piece.y = SIZE.rows as i32 - 1;
        assert!(grid.collides(&piece));
        piece.y = SIZE.rows as i32 - 2;
        assert!(!grid.collides(&piece));
    }

    #[test]
    fn test_collision_ignores_empty_shape_cells() {
        // S: [[0,1,1],[1,1,0]]; its top-left corner is empty.
        let mut locked = LockedCells::new();
        locked.insert((0, 10), BlockColor::Red);
        let grid = Grid::from_locked(SIZE, &locked);
        let mut piece = Piece::new(TetrominoKind::S, SIZE.columns);
        piece.x = 0;
        piece.y = 10;
        assert!(!grid.collides(&piece));
        piece.y = 9;
        assert!(grid.collides(&piece));
    }

    #[test]
    fn test_collision_matches_brute_force() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..300 {
            let mut locked = LockedCells::new();
            for _ in 0..rng.gen_range(0..40) {
                let pos = (rng.gen_range(0..SIZE.columns), rng.gen_range(0..SIZE.rows));
                locked.insert(pos, BlockColor::Green);
            }
            let grid = Grid::from_locked(SIZE, &locked);
            let kind = TetrominoKind::ALL[rng.gen_range(0..7)];
            let mut piece = Piece::new(kind, SIZE.columns);
            for _ in 0..rng.gen_range(0..4) {
                piece.rotate();
            }
            piece.x = rng.gen_range(-3..SIZE.columns as i32 + 1);
            piece.y = rng.gen_range(0..SIZE.rows as i32 + 1);

            let expected = piece.cells().any(|(x, y)| {
                x < 0
                    || x >= SIZE.columns as i32
                    || y >= SIZE.rows as i32
                    || locked.contains_key(&(x as usize, y as usize))
            });
            assert_eq!(grid.collides(&piece), expected);
        }
    }

    #[test]
    fn test_lock_piece_writes_color() {
        let mut piece = Piece::new(TetrominoKind::T, SIZE.columns);
        piece.y = 3;
        let mut locked = LockedCells::new();
        lock_piece(&piece, &mut locked);
        assert_eq!(locked.len(), 4);
        assert_eq!(locked.get(&(5, 3)), Some(&BlockColor::Magenta));
        assert_eq!(locked.get(&(4, 4)), Some(&BlockColor::Magenta));
    }

    #[test]
    fn test_clear_rows_without_full_rows_is_noop() {
        let mut locked = LockedCells::new();
        locked.insert((0, 19), BlockColor::Cyan);
        locked.insert((9, 5), BlockColor::Orange);
        for x in 0..SIZE.columns - 1 {
            locked.insert((x, 18), BlockColor::Blue);
        }
        let before = locked.clone();
        let grid = Grid::from_locked(SIZE, &locked);
        assert_eq!(clear_rows(&grid, &mut locked), 0);
        assert_eq!(locked, before);
    }

    #[test]
    fn test_clear_bottom_row_drops_cell_above() {
        let mut locked = LockedCells::new();
        fill_row(&mut locked, SIZE.rows - 1);
        locked.insert((3, SIZE.rows - 2), BlockColor::Yellow);
        let grid = Grid::from_locked(SIZE, &locked);

        assert_eq!(clear_rows(&grid, &mut locked), 1);
        assert_eq!(locked.len(), 1);
        assert_eq!(locked.get(&(3, SIZE.rows - 1)), Some(&BlockColor::Yellow));
        assert!(!locked.contains_key(&(3, SIZE.rows - 2)));
    }

    #[test]
    fn test_clear_two_rows_shifts_by_two() {
        let mut locked = LockedCells::new();
        fill_row(&mut locked, 19);
        fill_row(&mut locked, 18);
        locked.insert((0, 17), BlockColor::Red);
        locked.insert((0, 16), BlockColor::Green);
        let grid = Grid::from_locked(SIZE, &locked);

        assert_eq!(clear_rows(&grid, &mut locked), 2);
        assert_eq!(locked.get(&(0, 19)), Some(&BlockColor::Red));
        assert_eq!(locked.get(&(0, 18)), Some(&BlockColor::Green));
        assert_eq!(locked.len(), 2);
    }

    #[test]
    fn test_clear_middle_row_keeps_cells_below() {
        let mut locked = LockedCells::new();
        locked.insert((1, 19), BlockColor::Cyan);
        fill_row(&mut locked, 18);
        locked.insert((2, 17), BlockColor::Red);
        let grid = Grid::from_locked(SIZE, &locked);

        assert_eq!(clear_rows(&grid, &mut locked), 1);
        assert_eq!(locked.get(&(1, 19)), Some(&BlockColor::Cyan));
        assert_eq!(locked.get(&(2, 18)), Some(&BlockColor::Red));
        assert_eq!(locked.len(), 2);
    }

    #[test]
    fn test_compaction_keys_stay_unique_and_in_range() {
        let mut rng = StdRng::seed_from_u64(1234);
        for _ in 0..200 {
            let mut locked = LockedCells::new();
            for y in 0..SIZE.rows {
                if rng.gen_bool(0.3) {
                    fill_row(&mut locked, y);
                } else {
                    for x in 0..SIZE.columns {
                        if rng.gen_bool(0.5) {
                            locked.insert((x, y), BlockColor::Orange);
                        }
                    }
                }
            }
            let grid = Grid::from_locked(SIZE, &locked);
            let full = (0..SIZE.rows).filter(|&y| grid.row_is_full(y)).count();
            let survivors = locked.len() - full * SIZE.columns;

            assert_eq!(clear_rows(&grid, &mut locked), full);
            assert_eq!(locked.len(), survivors);
            let unique: HashSet<_> = locked.keys().collect();
            assert_eq!(unique.len(), locked.len());
            assert!(
                locked
                    .keys()
                    .all(|&(x, y)| x < SIZE.columns && y < SIZE.rows)
            );
            let after = Grid::from_locked(SIZE, &locked);
            assert!((0..SIZE.rows).all(|y| !after.row_is_full(y)));
        }
    }
}
