//! N×N board with precomputed winning combos and cell index mapping.
//!
//! Combos are generated once, in a fixed order: every row, then every
//! column, then the primary diagonal, then the anti-diagonal. Win scans
//! walk that order and stop at the first match, so when one move completes
//! two lines the row is reported before the column or diagonal.

use crate::error::{NoughtsError, NoughtsResult};
use crate::messages::Symbol;

/// Default board edge length.
pub const DEFAULT_BOARD_SIZE: usize = 3;

/// A `(row, col)` board coordinate.
pub type Coord = (usize, usize);

/// One board cell: its coordinate and the symbol placed there, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Move {
    pub row: usize,
    pub col: usize,
    pub symbol: Option<Symbol>,
}

impl Move {
    pub fn empty(row: usize, col: usize) -> Self {
        Self {
            row,
            col,
            symbol: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Board {
    size: usize,
    cells: Vec<Vec<Move>>,
    combos: Vec<Vec<Coord>>,
    index: Vec<Coord>,
}

impl Board {
    /// Create an empty board of `size`×`size` cells.
    pub fn new(size: usize) -> Self {
        let cells = (0..size)
            .map(|row| (0..size).map(|col| Move::empty(row, col)).collect::<Vec<_>>())
            .collect();
        Self {
            size,
            cells,
            combos: winning_combos(size),
            index: cell_index(size),
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of cells on the board.
    pub fn cell_count(&self) -> usize {
        self.index.len()
    }

    /// All winning combos in scan order.
    pub fn combos(&self) -> &[Vec<Coord>] {
        &self.combos
    }

    /// Translate a linear (row-major) cell index to a coordinate.
    pub fn coord(&self, cell: usize) -> Option<Coord> {
        self.index.get(cell).copied()
    }

    pub fn get(&self, row: usize, col: usize) -> Option<&Move> {
        self.cells.get(row).and_then(|r| r.get(col))
    }

    /// Place `symbol` on `cell`.
    ///
    /// Fails with [`NoughtsError::InvalidCell`] for an index outside the
    /// board and [`NoughtsError::CellOccupied`] if the cell already holds a
    /// symbol; the board is left untouched in both cases.
    pub fn place(&mut self, cell: usize, symbol: Symbol) -> NoughtsResult<Move> {
        let (row, col) = self.coord(cell).ok_or(NoughtsError::InvalidCell(cell))?;
        let slot = &mut self.cells[row][col];
        if slot.symbol.is_some() {
            return Err(NoughtsError::CellOccupied(cell));
        }
        slot.symbol = Some(symbol);
        Ok(*slot)
    }

    /// First combo, in generation order, fully held by a single symbol.
    pub fn winning_line(&self) -> Option<(Symbol, &[Coord])> {
        self.combos.iter().find_map(|combo| {
            let (first_row, first_col) = *combo.first()?;
            let symbol = self.cells[first_row][first_col].symbol?;
            combo
                .iter()
                .all(|&(row, col)| self.cells[row][col].symbol == Some(symbol))
                .then_some((symbol, combo.as_slice()))
        })
    }

    /// Whether every cell holds a symbol.
    pub fn is_full(&self) -> bool {
        self.cells.iter().flatten().all(|m| m.symbol.is_some())
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new(DEFAULT_BOARD_SIZE)
    }
}

/// Rows, then columns, then the primary diagonal, then the anti-diagonal.
fn winning_combos(size: usize) -> Vec<Vec<Coord>> {
    let rows = (0..size).map(|row| (0..size).map(|col| (row, col)).collect::<Vec<Coord>>());
    let cols = (0..size).map(|col| (0..size).map(|row| (row, col)).collect::<Vec<Coord>>());
    let diagonal: Vec<Coord> = (0..size).map(|i| (i, i)).collect();
    let anti_diagonal: Vec<Coord> = (0..size).map(|i| (i, size - 1 - i)).collect();

    rows.chain(cols)
        .chain([diagonal, anti_diagonal])
        .collect()
}

fn cell_index(size: usize) -> Vec<Coord> {
    (0..size)
        .flat_map(|row| (0..size).map(move |col| (row, col)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn combo_count_and_shape() {
        for size in 1..=6 {
            let board = Board::new(size);
            assert_eq!(board.combos().len(), 2 * size + 2, "size {size}");
            for combo in board.combos() {
                assert_eq!(combo.len(), size);
                let distinct: HashSet<_> = combo.iter().collect();
                assert_eq!(distinct.len(), size);
                assert!(combo.iter().all(|&(r, c)| r < size && c < size));
            }
        }
    }

    #[test]
    fn combo_generation_order() {
        let board = Board::new(3);
        let combos = board.combos();
        assert_eq!(combos[0], vec![(0, 0), (0, 1), (0, 2)]);
        assert_eq!(combos[2], vec![(2, 0), (2, 1), (2, 2)]);
        assert_eq!(combos[3], vec![(0, 0), (1, 0), (2, 0)]);
        assert_eq!(combos[5], vec![(0, 2), (1, 2), (2, 2)]);
        assert_eq!(combos[6], vec![(0, 0), (1, 1), (2, 2)]);
        assert_eq!(combos[7], vec![(0, 2), (1, 1), (2, 0)]);
    }

    #[test]
    fn cell_index_is_row_major() {
        let board = Board::new(3);
        assert_eq!(board.cell_count(), 9);
        assert_eq!(board.coord(0), Some((0, 0)));
        assert_eq!(board.coord(2), Some((0, 2)));
        assert_eq!(board.coord(3), Some((1, 0)));
        assert_eq!(board.coord(8), Some((2, 2)));
        assert_eq!(board.coord(9), None);
    }

    #[test]
    fn place_rejects_occupied_and_out_of_range() {
        let mut board = Board::new(3);
        let mv = board.place(4, Symbol::X).unwrap();
        assert_eq!(mv, Move { row: 1, col: 1, symbol: Some(Symbol::X) });

        assert!(matches!(board.place(4, Symbol::O), Err(NoughtsError::CellOccupied(4))));
        assert_eq!(board.get(1, 1).unwrap().symbol, Some(Symbol::X));

        assert!(matches!(board.place(9, Symbol::O), Err(NoughtsError::InvalidCell(9))));
    }

    #[test]
    fn empty_board_has_no_winner() {
        let board = Board::new(3);
        assert!(board.winning_line().is_none());
        assert!(!board.is_full());
    }

    #[test]
    fn column_win_detected() {
        let mut board = Board::new(3);
        for cell in [1, 4, 7] {
            board.place(cell, Symbol::O).unwrap();
        }
        let (symbol, line) = board.winning_line().unwrap();
        assert_eq!(symbol, Symbol::O);
        assert_eq!(line, &[(0, 1), (1, 1), (2, 1)]);
    }

    #[test]
    fn row_reported_before_diagonal() {
        let mut board = Board::new(3);
        // Top row and primary diagonal both complete.
        for cell in [0, 1, 2, 4, 8] {
            board.place(cell, Symbol::X).unwrap();
        }
        let (_, line) = board.winning_line().unwrap();
        assert_eq!(line, &[(0, 0), (0, 1), (0, 2)]);
    }

    #[test]
    fn anti_diagonal_win() {
        let mut board = Board::new(4);
        for cell in [3, 6, 9, 12] {
            board.place(cell, Symbol::X).unwrap();
        }
        let (_, line) = board.winning_line().unwrap();
        assert_eq!(line, &[(0, 3), (1, 2), (2, 1), (3, 0)]);
    }
}
