//! A human player at the terminal

use std::io::{self, BufRead, BufReader, Stdin, Stdout, Write};

use crate::{
    Error, Result,
    game::{BoardState, GameKind},
    ports::Learner,
};

/// Manual learner - asks for moves on `output` and reads them from `input`.
///
/// Tic-Tac-Toe moves are entered as `row col`, Connect-4 moves as a column.
/// Malformed or illegal input is reported and asked for again; the end of
/// the input stream is an error.
pub struct ManualLearner<R, W> {
    name: String,
    input: R,
    output: W,
}

impl ManualLearner<BufReader<Stdin>, Stdout> {
    /// Read from stdin and prompt on stdout
    pub fn stdio(name: impl Into<String>) -> Self {
        Self::new(name, BufReader::new(io::stdin()), io::stdout())
    }
}

impl<R: BufRead, W: Write> ManualLearner<R, W> {
    pub fn new(name: impl Into<String>, input: R, output: W) -> Self {
        Self {
            name: name.into(),
            input,
            output,
        }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    fn prompt(&mut self, text: &str) -> Result<()> {
        write!(self.output, "{text}").map_err(|e| Error::io("write prompt", e))?;
        self.output.flush().map_err(|e| Error::io("flush prompt", e))
    }

    fn read_line(&mut self) -> Result<String> {
        let mut line = String::new();
        let read = self
            .input
            .read_line(&mut line)
            .map_err(|e| Error::io("read move", e))?;
        if read == 0 {
            return Err(Error::InputClosed);
        }
        Ok(line)
    }
}

/// Parse a move as typed by the user into an action
pub fn parse_manual_move(kind: GameKind, text: &str) -> Option<usize> {
    let numbers: Vec<usize> = text
        .split_whitespace()
        .map(str::parse)
        .collect::<std::result::Result<_, _>>()
        .ok()?;
    match (kind, numbers.as_slice()) {
        (GameKind::TicTacToe, &[row, col]) if row < kind.rows() && col < kind.cols() => {
            Some(row * kind.cols() + col)
        }
        (GameKind::Connect4, &[col]) if col < kind.cols() => Some(col),
        _ => None,
    }
}

impl<R, W> Learner for ManualLearner<R, W>
where
    R: BufRead + Send + 'static,
    W: Write + Send + 'static,
{
    fn select_move(&mut self, state: &BoardState) -> Result<usize> {
        if state.is_terminal() {
            return Err(Error::NoValidMoves);
        }
        let prompt = match state.kind {
            GameKind::TicTacToe => "Enter row and column separated by a space: ",
            GameKind::Connect4 => "Enter column: ",
        };
        loop {
            self.prompt(prompt)?;
            let line = self.read_line()?;
            match parse_manual_move(state.kind, &line) {
                Some(action) if state.is_legal(action) => return Ok(action),
                Some(_) => self.prompt("That move is not legal, try again.\n")?,
                None => self.prompt("Could not read that move, try again.\n")?,
            }
        }
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn test_parse_manual_move() {
        assert_eq!(parse_manual_move(GameKind::TicTacToe, "1 2\n"), Some(5));
        assert_eq!(parse_manual_move(GameKind::TicTacToe, "3 0"), None);
        assert_eq!(parse_manual_move(GameKind::TicTacToe, "1"), None);
        assert_eq!(parse_manual_move(GameKind::Connect4, " 6 "), Some(6));
        assert_eq!(parse_manual_move(GameKind::Connect4, "7"), None);
        assert_eq!(parse_manual_move(GameKind::Connect4, "x"), None);
    }

    #[test]
    fn test_reprompts_until_legal() -> Result<()> {
        let board = BoardState::new(GameKind::TicTacToe).make_move(4)?;
        let input = Cursor::new("oops\n1 1\n0 2\n");
        let mut human = ManualLearner::new("manual", input, Vec::new());
        assert_eq!(human.select_move(&board)?, 2);

        let output = String::from_utf8(human.into_output()).unwrap_or_default();
        assert_eq!(output.matches("Enter row and column").count(), 3);
        assert!(output.contains("Could not read"));
        assert!(output.contains("not legal"));
        Ok(())
    }

    #[test]
    fn test_end_of_input_is_an_error() {
        let board = BoardState::new(GameKind::Connect4);
        let mut human = ManualLearner::new("manual", Cursor::new(""), Vec::new());
        assert!(matches!(
            human.select_move(&board),
            Err(Error::InputClosed)
        ));
    }
}
