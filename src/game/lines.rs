//! Winning line enumeration for both games

use std::sync::OnceLock;

use super::GameKind;

static TIC_TAC_TOE_LINES: OnceLock<Vec<Vec<usize>>> = OnceLock::new();
static CONNECT4_LINES: OnceLock<Vec<Vec<usize>>> = OnceLock::new();

/// Directions scanned when building lines: rows, columns, diagonals, anti-diagonals.
const DIRECTIONS: [(isize, isize); 4] = [(0, 1), (1, 0), (1, 1), (1, -1)];

/// Every window of `connect` cells that wins the game when filled by one player.
///
/// Lines are grouped by direction, so for Tic-Tac-Toe the order is the three
/// rows, the three columns, the diagonal and then the anti-diagonal.
pub fn lines(kind: GameKind) -> &'static [Vec<usize>] {
    match kind {
        GameKind::TicTacToe => TIC_TAC_TOE_LINES.get_or_init(|| build_lines(kind)),
        GameKind::Connect4 => CONNECT4_LINES.get_or_init(|| build_lines(kind)),
    }
}

fn build_lines(kind: GameKind) -> Vec<Vec<usize>> {
    let rows = kind.rows() as isize;
    let cols = kind.cols() as isize;
    let span = kind.connect() as isize - 1;

    let mut lines = Vec::new();
    for (dr, dc) in DIRECTIONS {
        for row in 0..rows {
            for col in 0..cols {
                let end_row = row + dr * span;
                let end_col = col + dc * span;
                if !(0..rows).contains(&end_row) || !(0..cols).contains(&end_col) {
                    continue;
                }
                let line = (0..=span)
                    .map(|step| ((row + dr * step) * cols + (col + dc * step)) as usize)
                    .collect();
                lines.push(line);
            }
        }
    }
    lines
}
