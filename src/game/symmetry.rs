//! Board symmetries used to share Q-values between equivalent positions

use serde::{Deserialize, Serialize};

use super::{BoardState, Cell, GameKind, MAX_CELLS};

/// A symmetry of the board: an optional left-right mirror followed by a
/// clockwise rotation.
///
/// Tic-Tac-Toe uses the full dihedral group of the square (8 elements).
/// Connect-4 is only symmetric under the mirror, since gravity fixes the
/// vertical axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Symmetry {
    /// Rotation in degrees (0, 90, 180, 270)
    pub rotation: u16,
    /// Whether to mirror columns before rotating
    pub reflection: bool,
}

impl Symmetry {
    pub fn identity() -> Self {
        Symmetry {
            rotation: 0,
            reflection: false,
        }
    }

    /// All symmetries that preserve the rules of `kind`.
    pub fn all(kind: GameKind) -> Vec<Symmetry> {
        match kind {
            GameKind::TicTacToe => {
                let mut transforms = Vec::with_capacity(8);
                for rotation in [0, 90, 180, 270] {
                    transforms.push(Symmetry {
                        rotation,
                        reflection: false,
                    });
                    transforms.push(Symmetry {
                        rotation,
                        reflection: true,
                    });
                }
                transforms
            }
            GameKind::Connect4 => vec![
                Symmetry::identity(),
                Symmetry {
                    rotation: 0,
                    reflection: true,
                },
            ],
        }
    }

    /// Map a cell index to its image under this symmetry.
    pub fn transform_cell(&self, kind: GameKind, idx: usize) -> usize {
        let cols = kind.cols();
        let (mut row, mut col) = (idx / cols, idx % cols);

        if self.reflection {
            col = cols - 1 - col;
        }

        // Rotations only occur on square boards.
        let n = kind.rows();
        for _ in 0..(self.rotation / 90) {
            let new_row = col;
            let new_col = n - 1 - row;
            row = new_row;
            col = new_col;
        }

        row * cols + col
    }

    /// Map an action to its image under this symmetry.
    pub fn transform_action(&self, kind: GameKind, action: usize) -> usize {
        match kind {
            GameKind::TicTacToe => self.transform_cell(kind, action),
            GameKind::Connect4 if self.reflection => kind.cols() - 1 - action,
            GameKind::Connect4 => action,
        }
    }

    pub fn inverse(&self) -> Symmetry {
        if self.reflection {
            // mirror-then-rotate is always an involution
            *self
        } else {
            Symmetry {
                rotation: (360 - self.rotation) % 360,
                reflection: false,
            }
        }
    }
}

impl BoardState {
    /// Apply a symmetry to the board
    pub fn transform(&self, symmetry: &Symmetry) -> Self {
        let mut cells = [Cell::Empty; MAX_CELLS];
        for idx in 0..self.kind.cells() {
            cells[symmetry.transform_cell(self.kind, idx)] = self.cells[idx];
        }
        BoardState {
            kind: self.kind,
            cells,
            to_move: self.to_move,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inverse_round_trips_every_cell() {
        for kind in [GameKind::TicTacToe, GameKind::Connect4] {
            for symmetry in Symmetry::all(kind) {
                let inverse = symmetry.inverse();
                for idx in 0..kind.cells() {
                    let image = symmetry.transform_cell(kind, idx);
                    assert_eq!(inverse.transform_cell(kind, image), idx);
                }
            }
        }
    }

    #[test]
    fn test_connect4_mirror_maps_columns() {
        let mirror = Symmetry {
            rotation: 0,
            reflection: true,
        };
        assert_eq!(mirror.transform_action(GameKind::Connect4, 0), 6);
        assert_eq!(mirror.transform_action(GameKind::Connect4, 3), 3);
        // bottom-left corner goes to bottom-right
        assert_eq!(mirror.transform_cell(GameKind::Connect4, 35), 41);
    }

    #[test]
    fn test_rotation_moves_corner_clockwise() {
        let quarter = Symmetry {
            rotation: 90,
            reflection: false,
        };
        assert_eq!(quarter.transform_cell(GameKind::TicTacToe, 0), 2);
        assert_eq!(quarter.transform_cell(GameKind::TicTacToe, 4), 4);
    }
}
