//! Observers for match sessions
//!
//! Observers keep reporting out of the game loop: console text, session log
//! files, CSV rows, progress bars and in-memory tallies are all attached to a
//! [`Session`](super::Session) the same way.

use std::{
    fs::{self, File, OpenOptions},
    io::{self, Stdout, Write},
    path::{Path, PathBuf},
};

use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};

use super::session::{GameReport, SessionInfo, SessionSummary};
use crate::{
    Error, Result,
    game::{BoardState, GameOutcome, Move, Player},
    ports::Observer,
};

/// Which metrics are reported
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsChannels {
    pub game: bool,
    pub session: bool,
}

/// What a text observer reports
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channels {
    /// The board after every move
    pub moves: bool,
    /// "Playing ..." lines at the start of sessions and games
    pub status: bool,
    pub metrics: MetricsChannels,
}

impl Channels {
    /// Session metrics only, the usual experiment output
    pub fn session_metrics() -> Self {
        Self {
            metrics: MetricsChannels {
                game: false,
                session: true,
            },
            ..Self::default()
        }
    }

    /// Moves, status and per-game metrics, for watching single games
    pub fn game_play() -> Self {
        Self {
            moves: true,
            status: true,
            metrics: MetricsChannels {
                game: true,
                session: false,
            },
        }
    }

    pub fn all() -> Self {
        Self {
            moves: true,
            status: true,
            metrics: MetricsChannels {
                game: true,
                session: true,
            },
        }
    }
}

fn session_status(info: &SessionInfo) -> String {
    format!(
        "Playing Session (World '{}', Session '{}')",
        info.world.tag(),
        info.session_id
    )
}

fn game_status(info: &SessionInfo, game_num: usize) -> String {
    format!(
        "Playing Game (World '{}', Session '{}', Game '{}')",
        info.world.tag(),
        info.session_id,
        game_num
    )
}

fn metrics_text(
    info: &SessionInfo,
    game_num: Option<usize>,
    metrics: &serde_json::Value,
) -> Result<String> {
    let scope = match game_num {
        Some(game_num) => format!(
            "World '{}', Session '{}', Game '{}'",
            info.world.tag(),
            info.session_id,
            game_num
        ),
        None => format!("World '{}', Session '{}'", info.world.tag(), info.session_id),
    };
    Ok(format!(
        "Metrics ({scope}): {}",
        serde_json::to_string_pretty(metrics)?
    ))
}

/// Formats session events as text blocks according to [`Channels`]
#[derive(Debug, Clone, Copy)]
struct TextReport {
    channels: Channels,
}

impl TextReport {
    fn session_start(&self, info: &SessionInfo) -> Option<String> {
        self.channels.status.then(|| session_status(info))
    }

    fn game_start(&self, info: &SessionInfo, game_num: usize, board: &BoardState) -> Vec<String> {
        let mut blocks = Vec::new();
        if self.channels.status {
            blocks.push(game_status(info, game_num));
        }
        if self.channels.moves {
            blocks.push(board.to_string());
        }
        blocks
    }

    fn moved(&self, board: &BoardState) -> Option<String> {
        self.channels.moves.then(|| board.to_string())
    }

    fn game_end(&self, info: &SessionInfo, report: &GameReport) -> Result<Option<String>> {
        if !self.channels.metrics.game {
            return Ok(None);
        }
        metrics_text(info, Some(report.game_num), &report.metrics_json()).map(Some)
    }

    fn session_end(&self, info: &SessionInfo, summary: &SessionSummary) -> Result<Option<String>> {
        if !self.channels.metrics.session {
            return Ok(None);
        }
        metrics_text(info, None, &summary.metrics_json()).map(Some)
    }
}

/// Prints session events to a writer, stdout by default
pub struct ConsoleObserver<W = Stdout> {
    report: TextReport,
    out: W,
}

impl ConsoleObserver<Stdout> {
    pub fn stdout(channels: Channels) -> Self {
        Self::new(channels, io::stdout())
    }
}

impl<W: Write> ConsoleObserver<W> {
    pub fn new(channels: Channels, out: W) -> Self {
        Self {
            report: TextReport { channels },
            out,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, block: &str) -> Result<()> {
        writeln!(self.out, "\n{block}").map_err(|e| Error::io("write console output", e))
    }
}

impl<W: Write + Send> Observer for ConsoleObserver<W> {
    fn on_session_start(&mut self, info: &SessionInfo) -> Result<()> {
        if let Some(block) = self.report.session_start(info) {
            self.emit(&block)?;
        }
        Ok(())
    }

    fn on_game_start(
        &mut self,
        info: &SessionInfo,
        game_num: usize,
        board: &BoardState,
    ) -> Result<()> {
        for block in self.report.game_start(info, game_num, board) {
            self.emit(&block)?;
        }
        Ok(())
    }

    fn on_move(
        &mut self,
        _info: &SessionInfo,
        _game_num: usize,
        _mv: &Move,
        board: &BoardState,
    ) -> Result<()> {
        if let Some(block) = self.report.moved(board) {
            self.emit(&block)?;
        }
        Ok(())
    }

    fn on_game_end(&mut self, info: &SessionInfo, report: &GameReport) -> Result<()> {
        if let Some(block) = self.report.game_end(info, report)? {
            self.emit(&block)?;
        }
        Ok(())
    }

    fn on_session_end(&mut self, info: &SessionInfo, summary: &SessionSummary) -> Result<()> {
        if let Some(block) = self.report.session_end(info, summary)? {
            self.emit(&block)?;
        }
        self.out.flush().map_err(|e| Error::io("flush console output", e))
    }
}

/// Appends session events to `{folder}/{tag}_{session}_{timestamp}.log`
///
/// The file is opened when the session starts, since the name depends on the
/// session timestamp.
pub struct LogFileObserver {
    report: TextReport,
    folder: PathBuf,
    file: Option<File>,
    path: Option<PathBuf>,
}

impl LogFileObserver {
    pub fn new(folder: impl Into<PathBuf>, channels: Channels) -> Self {
        Self {
            report: TextReport { channels },
            folder: folder.into(),
            file: None,
            path: None,
        }
    }

    pub fn log_path(folder: &Path, info: &SessionInfo) -> PathBuf {
        folder.join(format!(
            "{}_{}_{}.log",
            info.world.tag(),
            info.session_id,
            info.session_timestamp
        ))
    }

    /// Path of the current log file, once the session has started
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn append(&mut self, block: &str) -> Result<()> {
        let Some(file) = self.file.as_mut() else {
            return Ok(());
        };
        write!(file, "\n{block}\n").map_err(|e| Error::io("append to session log", e))
    }
}

impl Observer for LogFileObserver {
    fn on_session_start(&mut self, info: &SessionInfo) -> Result<()> {
        fs::create_dir_all(&self.folder)
            .map_err(|e| Error::io(format!("create {}", self.folder.display()), e))?;
        let path = Self::log_path(&self.folder, info);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| Error::io(format!("open {}", path.display()), e))?;
        self.file = Some(file);
        self.path = Some(path);

        if let Some(block) = self.report.session_start(info) {
            self.append(&block)?;
        }
        Ok(())
    }

    fn on_game_start(
        &mut self,
        info: &SessionInfo,
        game_num: usize,
        board: &BoardState,
    ) -> Result<()> {
        for block in self.report.game_start(info, game_num, board) {
            self.append(&block)?;
        }
        Ok(())
    }

    fn on_move(
        &mut self,
        _info: &SessionInfo,
        _game_num: usize,
        _mv: &Move,
        board: &BoardState,
    ) -> Result<()> {
        if let Some(block) = self.report.moved(board) {
            self.append(&block)?;
        }
        Ok(())
    }

    fn on_game_end(&mut self, info: &SessionInfo, report: &GameReport) -> Result<()> {
        if let Some(block) = self.report.game_end(info, report)? {
            self.append(&block)?;
        }
        Ok(())
    }

    fn on_session_end(&mut self, info: &SessionInfo, summary: &SessionSummary) -> Result<()> {
        if let Some(block) = self.report.session_end(info, summary)? {
            self.append(&block)?;
        }
        if let Some(file) = self.file.as_mut() {
            file.flush().map_err(|e| Error::io("flush session log", e))?;
        }
        Ok(())
    }
}

pub const CSV_HEADER: [&str; 11] = [
    "world_type",
    "player1",
    "player2",
    "outcome",
    "avg_milliseconds_per_move_player1",
    "avg_milliseconds_per_move_player2",
    "num_moves",
    "session_id",
    "session_timestamp",
    "game_num",
    "milliseconds",
];

/// One CSV row per game
#[derive(Debug, Serialize)]
struct GameRow<'a> {
    world_type: &'a str,
    player1: &'a str,
    player2: &'a str,
    outcome: u8,
    avg_milliseconds_per_move_player1: f64,
    avg_milliseconds_per_move_player2: f64,
    num_moves: usize,
    session_id: &'a str,
    session_timestamp: &'a str,
    game_num: usize,
    milliseconds: f64,
}

/// Appends one row per game to `{folder}/{filename}.csv`
///
/// The header is written only when the file is new or empty, so several
/// sessions can share one file.
pub struct CsvObserver {
    path: PathBuf,
    writer: Option<csv::Writer<File>>,
}

impl CsvObserver {
    pub fn new(folder: impl AsRef<Path>, filename: &str) -> Self {
        Self {
            path: folder.as_ref().join(format!("{filename}.csv")),
            writer: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Observer for CsvObserver {
    fn on_session_start(&mut self, _info: &SessionInfo) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| Error::io(format!("create {}", parent.display()), e))?;
        }
        let is_new = fs::metadata(&self.path).ok().is_none_or(|meta| meta.len() == 0);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| Error::io(format!("open {}", self.path.display()), e))?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        if is_new {
            writer.write_record(CSV_HEADER)?;
            writer
                .flush()
                .map_err(|e| Error::io(format!("write {}", self.path.display()), e))?;
        }
        self.writer = Some(writer);
        Ok(())
    }

    fn on_game_end(&mut self, info: &SessionInfo, report: &GameReport) -> Result<()> {
        let Some(writer) = self.writer.as_mut() else {
            return Ok(());
        };
        writer.serialize(GameRow {
            world_type: info.world.tag(),
            player1: &info.player_names[0],
            player2: &info.player_names[1],
            outcome: report.outcome.winner_number(),
            avg_milliseconds_per_move_player1: report.player(Player::One).avg_milliseconds_per_move,
            avg_milliseconds_per_move_player2: report.player(Player::Two).avg_milliseconds_per_move,
            num_moves: report.num_moves(),
            session_id: &info.session_id,
            session_timestamp: &info.session_timestamp,
            game_num: report.game_num,
            milliseconds: report.milliseconds,
        })?;
        writer
            .flush()
            .map_err(|e| Error::io(format!("write {}", self.path.display()), e))
    }

    fn on_session_end(&mut self, _info: &SessionInfo, _summary: &SessionSummary) -> Result<()> {
        self.writer = None;
        Ok(())
    }
}

/// Progress bar observer - Shows session progress
pub struct ProgressObserver {
    progress_bar: Option<ProgressBar>,
    wins: usize,
    draws: usize,
    losses: usize,
}

impl ProgressObserver {
    pub fn new() -> Self {
        Self {
            progress_bar: None,
            wins: 0,
            draws: 0,
            losses: 0,
        }
    }

    fn message(&self) -> String {
        format!("{} D:{} L:{}", self.wins, self.draws, self.losses)
    }
}

impl Default for ProgressObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl Observer for ProgressObserver {
    fn on_session_start(&mut self, info: &SessionInfo) -> Result<()> {
        let pb = ProgressBar::new(info.num_games as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} games (W:{msg})")
                .map_err(|e| Error::ProgressBarTemplate {
                    message: e.to_string(),
                })?
                .progress_chars("=>-"),
        );
        self.progress_bar = Some(pb);
        Ok(())
    }

    fn on_game_end(&mut self, _info: &SessionInfo, report: &GameReport) -> Result<()> {
        // Counted from player one's side
        match report.outcome {
            GameOutcome::Win(Player::One) => self.wins += 1,
            GameOutcome::Win(Player::Two) => self.losses += 1,
            GameOutcome::Draw => self.draws += 1,
        }

        if let Some(pb) = &self.progress_bar {
            pb.set_position(report.game_num as u64);
            pb.set_message(self.message());
        }
        Ok(())
    }

    fn on_session_end(&mut self, _info: &SessionInfo, _summary: &SessionSummary) -> Result<()> {
        if let Some(pb) = &self.progress_bar {
            pb.finish_with_message(self.message());
        }
        Ok(())
    }
}

/// Metrics observer - Tracks results from player one's side
pub struct MetricsObserver {
    wins: usize,
    draws: usize,
    losses: usize,
    total_games: usize,
    move_counts: Vec<usize>,
}

impl MetricsObserver {
    pub fn new() -> Self {
        Self {
            wins: 0,
            draws: 0,
            losses: 0,
            total_games: 0,
            move_counts: Vec::new(),
        }
    }

    pub fn win_rate(&self) -> f64 {
        crate::utils::rate(self.wins, self.total_games)
    }

    pub fn draw_rate(&self) -> f64 {
        crate::utils::rate(self.draws, self.total_games)
    }

    pub fn loss_rate(&self) -> f64 {
        crate::utils::rate(self.losses, self.total_games)
    }

    /// Get average game length
    pub fn avg_game_length(&self) -> f64 {
        if self.move_counts.is_empty() {
            0.0
        } else {
            self.move_counts.iter().sum::<usize>() as f64 / self.move_counts.len() as f64
        }
    }

    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            total_games: self.total_games,
            wins: self.wins,
            draws: self.draws,
            losses: self.losses,
            win_rate: self.win_rate(),
            draw_rate: self.draw_rate(),
            loss_rate: self.loss_rate(),
            avg_game_length: self.avg_game_length(),
        }
    }
}

/// Summary of session metrics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSummary {
    pub total_games: usize,
    pub wins: usize,
    pub draws: usize,
    pub losses: usize,
    pub win_rate: f64,
    pub draw_rate: f64,
    pub loss_rate: f64,
    pub avg_game_length: f64,
}

impl Default for MetricsObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl Observer for MetricsObserver {
    fn on_game_start(
        &mut self,
        _info: &SessionInfo,
        _game_num: usize,
        _board: &BoardState,
    ) -> Result<()> {
        self.move_counts.push(0);
        Ok(())
    }

    fn on_move(
        &mut self,
        _info: &SessionInfo,
        _game_num: usize,
        _mv: &Move,
        _board: &BoardState,
    ) -> Result<()> {
        if let Some(last) = self.move_counts.last_mut() {
            *last += 1;
        }
        Ok(())
    }

    fn on_game_end(&mut self, _info: &SessionInfo, report: &GameReport) -> Result<()> {
        self.total_games += 1;
        match report.outcome {
            GameOutcome::Win(Player::One) => self.wins += 1,
            GameOutcome::Win(Player::Two) => self.losses += 1,
            GameOutcome::Draw => self.draws += 1,
        }
        Ok(())
    }
}

/// Where a session's text and CSV output goes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Console channels
    pub print: Option<Channels>,
    /// Log file channels
    pub log: Option<Channels>,
    /// CSV file name, without extension
    pub csv: Option<String>,
}

impl OutputConfig {
    /// Print and log session metrics, one CSV row per game
    pub fn session_metrics(csv: impl Into<String>) -> Self {
        Self {
            print: Some(Channels::session_metrics()),
            log: Some(Channels::session_metrics()),
            csv: Some(csv.into()),
        }
    }

    /// Build the observers for this configuration. Log and CSV output are
    /// skipped when their folder is not given.
    pub fn observers(
        &self,
        logs_folder: Option<&Path>,
        csv_folder: Option<&Path>,
    ) -> Vec<Box<dyn Observer>> {
        let mut observers: Vec<Box<dyn Observer>> = Vec::new();
        if let Some(channels) = self.print {
            observers.push(Box::new(ConsoleObserver::stdout(channels)));
        }
        if let (Some(channels), Some(folder)) = (self.log, logs_folder) {
            observers.push(Box::new(LogFileObserver::new(folder, channels)));
        }
        if let (Some(filename), Some(folder)) = (&self.csv, csv_folder) {
            observers.push(Box::new(CsvObserver::new(folder, filename)));
        }
        observers
    }
}
