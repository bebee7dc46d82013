//! Observer port - abstraction for match observation and data collection
//!
//! Sessions report what happens to every attached observer, so console
//! output, log files, CSV rows and progress bars stay out of the game loop.

use crate::{
    Result,
    game::{BoardState, Move},
    pipeline::{GameReport, SessionInfo, SessionSummary},
};

/// Observer trait for monitoring a match session
///
/// # Event Sequence
///
/// 1. `on_session_start(info)` - Once at the beginning
/// 2. For each game:
///    - `on_game_start(info, game_num, board)`
///    - `on_move(info, game_num, mv, board)` - After each move is applied
///    - `on_game_end(info, report)`
/// 3. `on_session_end(info, summary)` - Once at the end
///
/// Game numbers are 1-based. Every method defaults to a no-op.
///
/// # Examples
///
/// ```no_run
/// use tabq::{pipeline::GameReport, pipeline::SessionInfo, ports::Observer};
///
/// struct CountingObserver {
///     games: usize,
/// }
///
/// impl Observer for CountingObserver {
///     fn on_game_end(&mut self, _info: &SessionInfo, _report: &GameReport) -> tabq::Result<()> {
///         self.games += 1;
///         Ok(())
///     }
/// }
/// ```
pub trait Observer: Send {
    fn on_session_start(&mut self, _info: &SessionInfo) -> Result<()> {
        Ok(())
    }

    /// Called before the first move of a game, with the starting board.
    fn on_game_start(
        &mut self,
        _info: &SessionInfo,
        _game_num: usize,
        _board: &BoardState,
    ) -> Result<()> {
        Ok(())
    }

    /// Called after a move has been applied; `board` is the new position.
    fn on_move(
        &mut self,
        _info: &SessionInfo,
        _game_num: usize,
        _mv: &Move,
        _board: &BoardState,
    ) -> Result<()> {
        Ok(())
    }

    fn on_game_end(&mut self, _info: &SessionInfo, _report: &GameReport) -> Result<()> {
        Ok(())
    }

    fn on_session_end(&mut self, _info: &SessionInfo, _summary: &SessionSummary) -> Result<()> {
        Ok(())
    }
}
