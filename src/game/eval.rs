//! Static position heuristics
//!
//! These scores serve two purposes: they are the leaf values of the minimax
//! search and the immediate rewards handed out during Q-learning self-play.
//! Every score is taken from the point of view of a given player `me`, and
//! depends on whether `me` moves next.

use super::{BoardState, Cell, GameKind, Player, lines::lines};

/// Reward for trying to play an action that is not legal.
pub const ILLEGAL_MOVE_PENALTY: f64 = -150.0;

/// Score a position for `me`.
pub fn evaluate(state: &BoardState, me: Player, my_turn_next: bool) -> f64 {
    match state.kind {
        GameKind::TicTacToe => tic_tac_toe_value(state, me, my_turn_next),
        GameKind::Connect4 => connect4_value(state, me, my_turn_next),
    }
}

/// Immediate reward for the player to move taking `action`: the value of the
/// resulting position with the opponent to move next.
pub fn reward(state: &BoardState, action: usize) -> f64 {
    let me = state.to_move;
    match state.make_move(action) {
        Ok(next) => evaluate(&next, me, false),
        Err(_) => ILLEGAL_MOVE_PENALTY,
    }
}

/// Value of one Tic-Tac-Toe line for a player holding `mine` of its cells.
///
/// | line (me=1, opp=0, free=-) | value |
/// |----------------------------|-------|
/// | 1 1 1                      | 4     |
/// | - 1 1                      | 3     |
/// | - - 1                      | 2     |
/// | - 1 0                      | 1     |
/// | - - -                      | 1     |
/// | - - 0                      | 0     |
/// | - 0 0                      | -1    |
/// | 0 0 0                      | -3    |
pub fn line_value(mine: usize, theirs: usize, free: usize) -> i32 {
    let (mine, theirs, free) = (mine as i32, theirs as i32, free as i32);
    let mut value = 0;
    if mine == 3 {
        value += 4;
    }
    if free > 0 {
        value += (mine + 1) - ((3 - mine) - free);
    }
    if theirs == 3 {
        value -= 3;
    }
    value
}

fn tic_tac_toe_value(state: &BoardState, me: Player, my_turn_next: bool) -> f64 {
    let values: Vec<i32> = lines(state.kind)
        .iter()
        .map(|line| {
            let (mut mine, mut theirs, mut free) = (0, 0, 0);
            for &idx in line {
                match state.cells[idx] {
                    Cell::Empty => free += 1,
                    Cell::Piece(p) if p == me => mine += 1,
                    Cell::Piece(_) => theirs += 1,
                }
            }
            line_value(mine, theirs, free)
        })
        .collect();

    let count = |target: i32| values.iter().filter(|&&v| v == target).count();
    let mean = || values.iter().sum::<i32>() as f64 / values.len() as f64;

    if count(4) > 0 {
        return 10.0;
    }
    if count(-3) > 0 {
        return -10.0;
    }

    if my_turn_next {
        if count(3) > 0 {
            5.0
        } else if count(-1) == 1 {
            1.0
        } else if count(-1) > 1 {
            -5.0
        } else {
            mean()
        }
    } else if count(-1) > 0 {
        -5.0
    } else if count(3) == 1 {
        0.0
    } else if count(3) > 1 {
        5.0
    } else {
        mean()
    }
}

/// Number of windows in which `player` needs one more piece and that piece
/// can be dropped right now.
pub fn open_threats(state: &BoardState, player: Player) -> usize {
    let target = Cell::Piece(player);
    lines(state.kind)
        .iter()
        .filter(|line| {
            let owned = line.iter().filter(|&&idx| state.cells[idx] == target).count();
            let empty: Vec<usize> = line
                .iter()
                .copied()
                .filter(|&idx| state.cells[idx] == Cell::Empty)
                .collect();
            owned == line.len() - 1 && empty.len() == 1 && state.is_playable_cell(empty[0])
        })
        .count()
}

fn connect4_value(state: &BoardState, me: Player, my_turn_next: bool) -> f64 {
    if state.has_won(me) {
        return 100.0;
    }
    if state.has_won(me.opponent()) {
        return -100.0;
    }

    let mine = open_threats(state, me);
    let theirs = open_threats(state, me.opponent());

    if my_turn_next {
        if mine > 0 {
            50.0
        } else if theirs > 1 {
            -50.0
        } else if theirs == 1 {
            10.0
        } else {
            1.0
        }
    } else if theirs > 0 {
        -50.0
    } else if mine > 1 {
        10.0 * mine as f64
    } else {
        0.0
    }
}
