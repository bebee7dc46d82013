//! Board state representation and basic operations

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{GameOutcome, lines::lines, symmetry::Symmetry};
use crate::{Error, Result, types::StateKey};

/// Cell capacity of the largest supported board (Connect-4, 6x7).
pub const MAX_CELLS: usize = 42;

/// Which game a board belongs to
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    clap::ValueEnum,
)]
pub enum GameKind {
    #[serde(rename = "ttt")]
    #[value(name = "ttt", alias = "tictactoe")]
    TicTacToe,
    #[serde(rename = "con4")]
    #[value(name = "con4", alias = "connect4")]
    Connect4,
}

impl GameKind {
    pub fn rows(self) -> usize {
        match self {
            GameKind::TicTacToe => 3,
            GameKind::Connect4 => 6,
        }
    }

    pub fn cols(self) -> usize {
        match self {
            GameKind::TicTacToe => 3,
            GameKind::Connect4 => 7,
        }
    }

    pub fn cells(self) -> usize {
        self.rows() * self.cols()
    }

    /// Pieces in a row needed to win
    pub fn connect(self) -> usize {
        match self {
            GameKind::TicTacToe => 3,
            GameKind::Connect4 => 4,
        }
    }

    /// Size of the action space: cells for Tic-Tac-Toe, columns for Connect-4
    pub fn num_actions(self) -> usize {
        match self {
            GameKind::TicTacToe => self.cells(),
            GameKind::Connect4 => self.cols(),
        }
    }

    /// Short tag used in file names, CSV rows and state keys
    pub fn tag(self) -> &'static str {
        match self {
            GameKind::TicTacToe => "ttt",
            GameKind::Connect4 => "con4",
        }
    }

    pub fn from_tag(tag: &str) -> Option<GameKind> {
        match tag {
            "ttt" => Some(GameKind::TicTacToe),
            "con4" => Some(GameKind::Connect4),
            _ => None,
        }
    }

    /// Display symbol for a player (X/O for Tic-Tac-Toe, R/Y for Connect-4)
    pub fn symbol(self, player: Player) -> char {
        match (self, player) {
            (GameKind::TicTacToe, Player::One) => 'X',
            (GameKind::TicTacToe, Player::Two) => 'O',
            (GameKind::Connect4, Player::One) => 'R',
            (GameKind::Connect4, Player::Two) => 'Y',
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            GameKind::TicTacToe => "Tic-Tac-Toe",
            GameKind::Connect4 => "Connect-4",
        }
    }
}

impl fmt::Display for GameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// A player in the game; `One` always opens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Player {
    One,
    Two,
}

impl Player {
    /// Get the opponent player
    pub fn opponent(self) -> Player {
        match self {
            Player::One => Player::Two,
            Player::Two => Player::One,
        }
    }

    /// Zero-based index, handy for per-player arrays
    pub fn index(self) -> usize {
        match self {
            Player::One => 0,
            Player::Two => 1,
        }
    }

    /// One-based player number as written to CSV outcomes
    pub fn number(self) -> u8 {
        self.index() as u8 + 1
    }

    pub fn both() -> [Player; 2] {
        [Player::One, Player::Two]
    }
}

/// A cell on the board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cell {
    Empty,
    Piece(Player),
}

/// Complete board state including cells and whose turn it is
///
/// Cells are stored row-major with row 0 at the top. Only the first
/// `kind.cells()` entries are meaningful; the rest stay empty so that the
/// type remains `Copy` for both board sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BoardState {
    pub kind: GameKind,
    pub cells: [Cell; MAX_CELLS],
    pub to_move: Player,
}

/// Cached result of canonicalization for efficient repeated operations.
#[derive(Debug, Clone)]
pub struct CanonicalContext {
    pub kind: GameKind,
    /// The transform that maps the original board onto the canonical one
    pub transform: Symmetry,
    /// Perspective key of the canonical board
    pub key: StateKey,
}

impl CanonicalContext {
    /// Map an action from original coordinates to canonical coordinates
    pub fn map_move_to_canonical(&self, action: usize) -> usize {
        self.transform.transform_action(self.kind, action)
    }

    /// Map an action from canonical coordinates back to original coordinates
    pub fn map_canonical_to_original(&self, action: usize) -> usize {
        self.transform.inverse().transform_action(self.kind, action)
    }

    /// Map a list of legal actions into canonical coordinates
    pub fn canonical_moves(&self, actions: &[usize]) -> Vec<usize> {
        actions
            .iter()
            .map(|&action| self.map_move_to_canonical(action))
            .collect()
    }
}

impl BoardState {
    /// Create a new empty board with player one to move
    pub fn new(kind: GameKind) -> Self {
        BoardState {
            kind,
            cells: [Cell::Empty; MAX_CELLS],
            to_move: Player::One,
        }
    }

    /// Build a board from one string per row (top row first).
    ///
    /// Pieces use the game's symbols (`X`/`O` or `R`/`Y`, any case) and empty
    /// cells are `.`, `-` or `_`. The player to move is inferred from the
    /// piece counts.
    pub fn from_rows(kind: GameKind, rows: &[&str]) -> Result<Self> {
        let context = rows.join("/");
        if rows.len() != kind.rows() {
            return Err(invalid_board(
                &context,
                format!("expected {} rows, got {}", kind.rows(), rows.len()),
            ));
        }

        let one = kind.symbol(Player::One);
        let two = kind.symbol(Player::Two);
        let mut cells = [Cell::Empty; MAX_CELLS];
        for (row, text) in rows.iter().enumerate() {
            let chars: Vec<char> = text.chars().filter(|c| !c.is_whitespace()).collect();
            if chars.len() != kind.cols() {
                return Err(invalid_board(
                    &context,
                    format!(
                        "row {row} has {} cells, expected {}",
                        chars.len(),
                        kind.cols()
                    ),
                ));
            }
            for (col, c) in chars.into_iter().enumerate() {
                let upper = c.to_ascii_uppercase();
                cells[row * kind.cols() + col] = match upper {
                    '.' | '-' | '_' => Cell::Empty,
                    c if c == one => Cell::Piece(Player::One),
                    c if c == two => Cell::Piece(Player::Two),
                    other => {
                        return Err(invalid_board(
                            &context,
                            format!("unexpected character '{other}' at row {row}, column {col}"),
                        ));
                    }
                };
            }
        }

        let (ones, twos) = count_pieces(kind, &cells);
        let to_move = if ones == twos {
            Player::One
        } else if ones == twos + 1 {
            Player::Two
        } else {
            return Err(invalid_board(
                &context,
                format!("piece counts {one}={ones}, {two}={twos} are unbalanced"),
            ));
        };

        let board = BoardState {
            kind,
            cells,
            to_move,
        };
        board.validate(&context)?;
        Ok(board)
    }

    /// Rebuild a board from a perspective key produced by [`Self::perspective_key`].
    ///
    /// The key does not record colours, so the mover is inferred from the
    /// piece counts; the result is equivalent to the original position.
    pub fn from_perspective_key(key: &str) -> Result<Self> {
        let bad_key = || Error::InvalidStateKey {
            key: key.to_string(),
            expected: "<tag>:<row>/<row>/... using 1, 0 and .".to_string(),
        };

        let (tag, body) = key.split_once(':').ok_or_else(bad_key)?;
        let kind = GameKind::from_tag(tag).ok_or_else(bad_key)?;
        let rows: Vec<&str> = body.split('/').collect();
        if rows.len() != kind.rows() || rows.iter().any(|row| row.len() != kind.cols()) {
            return Err(bad_key());
        }

        let mut mine = Vec::new();
        let mut theirs = Vec::new();
        for (row, text) in rows.iter().enumerate() {
            for (col, c) in text.chars().enumerate() {
                let idx = row * kind.cols() + col;
                match c {
                    '1' => mine.push(idx),
                    '0' => theirs.push(idx),
                    '.' => {}
                    _ => return Err(bad_key()),
                }
            }
        }

        let mover = if mine.len() == theirs.len() {
            Player::One
        } else if theirs.len() == mine.len() + 1 {
            Player::Two
        } else {
            return Err(bad_key());
        };

        let mut cells = [Cell::Empty; MAX_CELLS];
        for idx in mine {
            cells[idx] = Cell::Piece(mover);
        }
        for idx in theirs {
            cells[idx] = Cell::Piece(mover.opponent());
        }

        let board = BoardState {
            kind,
            cells,
            to_move: mover,
        };
        board.validate(key)?;
        Ok(board)
    }

    fn validate(&self, context: &str) -> Result<()> {
        if self.kind == GameKind::Connect4 {
            let cols = self.kind.cols();
            for idx in 0..self.kind.cells() - cols {
                if self.cells[idx] != Cell::Empty && self.cells[idx + cols] == Cell::Empty {
                    return Err(invalid_board(
                        context,
                        format!(
                            "piece at row {}, column {} is floating",
                            idx / cols,
                            idx % cols
                        ),
                    ));
                }
            }
        }
        if self.has_won(Player::One) && self.has_won(Player::Two) {
            return Err(invalid_board(
                context,
                "both players cannot have winning lines".to_string(),
            ));
        }
        Ok(())
    }

    /// Get cell at index (row-major)
    pub fn get(&self, idx: usize) -> Cell {
        self.cells[idx]
    }

    /// Get cell at (row, col)
    pub fn cell(&self, row: usize, col: usize) -> Cell {
        self.cells[row * self.kind.cols() + col]
    }

    /// Number of occupied cells
    pub fn occupied_count(&self) -> usize {
        let (ones, twos) = count_pieces(self.kind, &self.cells);
        ones + twos
    }

    /// Whether a piece could be placed in this cell right now, ignoring
    /// whose turn it is. Connect-4 cells must rest on the floor or another piece.
    pub fn is_playable_cell(&self, idx: usize) -> bool {
        if self.cells[idx] != Cell::Empty {
            return false;
        }
        match self.kind {
            GameKind::TicTacToe => true,
            GameKind::Connect4 => {
                let below = idx + self.kind.cols();
                below >= self.kind.cells() || self.cells[below] != Cell::Empty
            }
        }
    }

    /// The action that drops a piece into a playable cell
    pub fn action_for_cell(&self, idx: usize) -> usize {
        match self.kind {
            GameKind::TicTacToe => idx,
            GameKind::Connect4 => idx % self.kind.cols(),
        }
    }

    /// The cell a piece would occupy if `action` were played, if any
    pub fn landing_cell(&self, action: usize) -> Option<usize> {
        if action >= self.kind.num_actions() {
            return None;
        }
        match self.kind {
            GameKind::TicTacToe => (self.cells[action] == Cell::Empty).then_some(action),
            GameKind::Connect4 => {
                let cols = self.kind.cols();
                (0..self.kind.rows())
                    .rev()
                    .map(|row| row * cols + action)
                    .find(|&idx| self.cells[idx] == Cell::Empty)
            }
        }
    }

    /// Whether `action` can be played in this position
    pub fn is_legal(&self, action: usize) -> bool {
        !self.is_terminal() && self.landing_cell(action).is_some()
    }

    /// Get legal actions (empty when the game is over)
    pub fn legal_moves(&self) -> Vec<usize> {
        if self.is_terminal() {
            return Vec::new();
        }
        (0..self.kind.num_actions())
            .filter(|&action| self.landing_cell(action).is_some())
            .collect()
    }

    /// Make a move and return a new board state
    #[must_use = "make_move returns a new board state; the original is unchanged"]
    pub fn make_move(&self, action: usize) -> Result<BoardState> {
        if self.is_terminal() {
            return Err(Error::GameOver);
        }
        let idx = self.landing_cell(action).ok_or_else(|| Error::InvalidMove {
            action,
            game: self.kind.tag().to_string(),
        })?;

        let mut next = *self;
        next.cells[idx] = Cell::Piece(self.to_move);
        next.to_move = self.to_move.opponent();
        Ok(next)
    }

    /// Check whether a player has a complete line
    pub fn has_won(&self, player: Player) -> bool {
        let target = Cell::Piece(player);
        lines(self.kind)
            .iter()
            .any(|line| line.iter().all(|&idx| self.cells[idx] == target))
    }

    /// Get the winner if there is one
    pub fn winner(&self) -> Option<Player> {
        Player::both().into_iter().find(|&p| self.has_won(p))
    }

    pub fn is_full(&self) -> bool {
        self.cells[..self.kind.cells()]
            .iter()
            .all(|&cell| cell != Cell::Empty)
    }

    pub fn is_terminal(&self) -> bool {
        self.winner().is_some() || self.is_full()
    }

    pub fn is_draw(&self) -> bool {
        self.winner().is_none() && self.is_full()
    }

    /// Final outcome, or `None` while the game is still running
    pub fn outcome(&self) -> Option<GameOutcome> {
        if let Some(winner) = self.winner() {
            Some(GameOutcome::Win(winner))
        } else if self.is_full() {
            Some(GameOutcome::Draw)
        } else {
            None
        }
    }

    /// Actions that immediately complete a line for `player`, in line scan
    /// order without duplicates. Empty once the game is over.
    pub fn winning_moves(&self, player: Player) -> Vec<usize> {
        if self.is_terminal() {
            return Vec::new();
        }
        let target = Cell::Piece(player);
        let mut moves = Vec::new();
        for line in lines(self.kind) {
            let mut owned = 0;
            let mut empty = None;
            let mut blocked = false;
            for &idx in line {
                match self.cells[idx] {
                    cell if cell == target => owned += 1,
                    Cell::Empty if empty.is_none() => empty = Some(idx),
                    _ => {
                        blocked = true;
                        break;
                    }
                }
            }
            if blocked || owned != line.len() - 1 {
                continue;
            }
            if let Some(idx) = empty
                && self.is_playable_cell(idx)
            {
                let action = self.action_for_cell(idx);
                if !moves.contains(&action) {
                    moves.push(action);
                }
            }
        }
        moves
    }

    /// Encode the board from the point of view of the player to move.
    ///
    /// Own pieces are `1`, opponent pieces `0`, empty cells `.`; rows are
    /// separated by `/` and the key is prefixed with the game tag, e.g.
    /// `ttt:1../.0./...`.
    pub fn perspective_key(&self) -> String {
        let cols = self.kind.cols();
        let mut key = String::with_capacity(self.kind.cells() + self.kind.rows() + 5);
        key.push_str(self.kind.tag());
        key.push(':');
        for idx in 0..self.kind.cells() {
            if idx > 0 && idx.is_multiple_of(cols) {
                key.push('/');
            }
            key.push(match self.cells[idx] {
                Cell::Empty => '.',
                Cell::Piece(p) if p == self.to_move => '1',
                Cell::Piece(_) => '0',
            });
        }
        key
    }

    /// Find the symmetry that gives the lexicographically smallest
    /// perspective key, and cache it with that key.
    pub fn canonical_context(&self) -> CanonicalContext {
        let mut best: Option<(String, Symmetry)> = None;
        for symmetry in Symmetry::all(self.kind) {
            let key = self.transform(&symmetry).perspective_key();
            let better = match &best {
                Some((best_key, _)) => key < *best_key,
                None => true,
            };
            if better {
                best = Some((key, symmetry));
            }
        }
        let (key, transform) =
            best.unwrap_or_else(|| (self.perspective_key(), Symmetry::identity()));
        CanonicalContext {
            kind: self.kind,
            transform,
            key: StateKey::from_canonical(key),
        }
    }
}

impl fmt::Display for BoardState {
    /// Render the board in world coordinates with row indices on the left,
    /// column indices underneath and the player to move on the last line.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = self.kind;
        for row in 0..kind.rows() {
            write!(f, "{row}")?;
            for col in 0..kind.cols() {
                let symbol = match self.cell(row, col) {
                    Cell::Empty => '.',
                    Cell::Piece(p) => kind.symbol(p),
                };
                write!(f, " {symbol}")?;
            }
            writeln!(f)?;
        }
        write!(f, " ")?;
        for col in 0..kind.cols() {
            write!(f, " {col}")?;
        }
        writeln!(f)?;
        write!(f, "next turn = {}", kind.symbol(self.to_move))
    }
}

fn count_pieces(kind: GameKind, cells: &[Cell; MAX_CELLS]) -> (usize, usize) {
    cells[..kind.cells()]
        .iter()
        .fold((0, 0), |(ones, twos), cell| match cell {
            Cell::Piece(Player::One) => (ones + 1, twos),
            Cell::Piece(Player::Two) => (ones, twos + 1),
            Cell::Empty => (ones, twos),
        })
}

fn invalid_board(context: &str, reason: String) -> Error {
    Error::InvalidBoard {
        context: context.to_string(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_board_has_all_actions() {
        let ttt = BoardState::new(GameKind::TicTacToe);
        assert_eq!(ttt.legal_moves(), (0..9).collect::<Vec<_>>());
        let con4 = BoardState::new(GameKind::Connect4);
        assert_eq!(con4.legal_moves(), (0..7).collect::<Vec<_>>());
        assert_eq!(con4.to_move, Player::One);
    }

    #[test]
    fn test_connect4_pieces_fall_to_lowest_row() -> Result<()> {
        let board = BoardState::new(GameKind::Connect4)
            .make_move(3)?
            .make_move(3)?;
        assert_eq!(board.cell(5, 3), Cell::Piece(Player::One));
        assert_eq!(board.cell(4, 3), Cell::Piece(Player::Two));
        assert_eq!(board.cell(3, 3), Cell::Empty);
        Ok(())
    }

    #[test]
    fn test_full_column_is_illegal() -> Result<()> {
        let mut board = BoardState::new(GameKind::Connect4);
        for _ in 0..6 {
            board = board.make_move(0)?;
        }
        assert!(!board.legal_moves().contains(&0));
        assert!(matches!(
            board.make_move(0),
            Err(Error::InvalidMove { action: 0, .. })
        ));
        Ok(())
    }

    #[test]
    fn test_occupied_cell_is_illegal() -> Result<()> {
        let board = BoardState::new(GameKind::TicTacToe).make_move(4)?;
        assert!(board.make_move(4).is_err());
        assert!(board.make_move(9).is_err());
        Ok(())
    }

    #[test]
    fn test_wins_in_every_direction() -> Result<()> {
        let row = BoardState::from_rows(GameKind::TicTacToe, &["XXX", "OO.", "..."])?;
        assert_eq!(row.winner(), Some(Player::One));
        let col = BoardState::from_rows(GameKind::TicTacToe, &["OX.", "OX.", ".X."])?;
        assert_eq!(col.winner(), Some(Player::One));
        let anti = BoardState::from_rows(GameKind::TicTacToe, &["XXO", "XO.", "O.."])?;
        assert_eq!(anti.winner(), Some(Player::Two));

        let diag = BoardState::from_rows(
            GameKind::Connect4,
            &[
                ".......", ".......", "...R...", "..RY...", ".RYY...", "RYYRR..",
            ],
        )?;
        assert_eq!(diag.winner(), Some(Player::One));
        assert!(diag.is_terminal());
        assert!(diag.legal_moves().is_empty());
        Ok(())
    }

    #[test]
    fn test_draw_detection() -> Result<()> {
        let board = BoardState::from_rows(GameKind::TicTacToe, &["XOX", "XOO", "OXX"])?;
        assert!(board.is_draw());
        assert_eq!(board.outcome(), Some(GameOutcome::Draw));
        Ok(())
    }

    #[test]
    fn test_from_rows_rejects_floating_piece() {
        let result = BoardState::from_rows(
            GameKind::Connect4,
            &[
                ".......", ".......", ".......", ".......", "...R...", ".......",
            ],
        );
        assert!(matches!(result, Err(Error::InvalidBoard { .. })));
    }

    #[test]
    fn test_winning_moves_respects_gravity() -> Result<()> {
        // R's row threat at (4,2) has nothing beneath it; only the
        // anti-diagonal through (2,6) is playable.
        let board = BoardState::from_rows(
            GameKind::Connect4,
            &[
                ".......", ".......", ".......", ".....RY", "...RRRY", "...RYYY",
            ],
        )?;
        assert_eq!(board.to_move, Player::One);
        assert_eq!(board.winning_moves(Player::One), vec![6]);
        assert_eq!(board.winning_moves(Player::Two), vec![6]);
        Ok(())
    }

    #[test]
    fn test_perspective_key_swaps_with_mover() -> Result<()> {
        let board = BoardState::new(GameKind::TicTacToe).make_move(0)?;
        assert_eq!(board.perspective_key(), "ttt:0../.../...");
        let board = board.make_move(4)?;
        assert_eq!(board.perspective_key(), "ttt:1../.0./...");
        Ok(())
    }

    #[test]
    fn test_perspective_key_round_trip() -> Result<()> {
        let board = BoardState::new(GameKind::Connect4)
            .make_move(3)?
            .make_move(4)?
            .make_move(3)?;
        let key = board.perspective_key();
        let rebuilt = BoardState::from_perspective_key(&key)?;
        assert_eq!(rebuilt, board);
        Ok(())
    }

    #[test]
    fn test_canonical_context_identifies_symmetric_openings() -> Result<()> {
        let corner = BoardState::new(GameKind::TicTacToe).make_move(0)?;
        let other_corner = BoardState::new(GameKind::TicTacToe).make_move(8)?;
        assert_eq!(
            corner.canonical_context().key,
            other_corner.canonical_context().key
        );

        let left = BoardState::new(GameKind::Connect4).make_move(0)?;
        let right = BoardState::new(GameKind::Connect4).make_move(6)?;
        let ctx = right.canonical_context();
        assert_eq!(left.canonical_context().key, ctx.key);
        let canonical = ctx.map_move_to_canonical(2);
        assert_eq!(ctx.map_canonical_to_original(canonical), 2);
        Ok(())
    }

    #[test]
    fn test_display_format() -> Result<()> {
        let board = BoardState::new(GameKind::TicTacToe).make_move(4)?;
        let rendered = board.to_string();
        assert_eq!(rendered, "0 . . .\n1 . X .\n2 . . .\n  0 1 2\nnext turn = O");
        Ok(())
    }
}
