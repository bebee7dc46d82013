//! Saving and loading Q-tables
//!
//! Files are JSON by default; `.msgpack` and `.mpk` select MessagePack.

use std::{
    collections::BTreeMap,
    fmt,
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::Path,
};

use log::info;
use serde::{Deserialize, Serialize};

use crate::{
    Error, Result,
    game::GameKind,
    q_learning::q_table::{ActionValues, QTable},
};

/// Hyperparameters and bookkeeping stored next to the table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingMetadata {
    pub alpha: f64,
    pub gamma: f64,
    /// Episodes over both seats in the run that produced the file
    pub episodes: u64,
    /// Accumulated training minutes, including resumed runs
    pub minutes: u64,
    pub saved_at: String,
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveFormat {
    Json,
    MsgPack,
}

impl SaveFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") | None => Ok(SaveFormat::Json),
            Some("msgpack") | Some("mpk") => Ok(SaveFormat::MsgPack),
            Some(_) => Err(Error::UnsupportedFormat {
                path: path.display().to_string(),
            }),
        }
    }
}

/// On-disk form of a Q-table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedQTable {
    pub version: u32,
    pub game: GameKind,
    pub table: BTreeMap<String, ActionValues>,
    pub metadata: TrainingMetadata,
}

impl SavedQTable {
    pub const VERSION: u32 = 1;

    pub fn from_table(game: GameKind, table: &QTable, metadata: TrainingMetadata) -> Self {
        Self {
            version: Self::VERSION,
            game,
            table: table.entries().clone(),
            metadata,
        }
    }

    pub fn to_table(&self) -> Result<QTable> {
        if self.version != Self::VERSION {
            return Err(Error::UnsupportedVersion {
                found: self.version,
                expected: Self::VERSION,
            });
        }
        Ok(QTable::from_entries(
            self.table.clone(),
            self.metadata.alpha,
            self.metadata.gamma,
        ))
    }

    /// Check the file was trained for `expected`
    pub fn expect_game(&self, expected: GameKind) -> Result<()> {
        if self.game != expected {
            return Err(Error::GameMismatch {
                expected: expected.tag().to_string(),
                found: self.game.tag().to_string(),
            });
        }
        Ok(())
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let format = SaveFormat::from_path(path)?;
        let file = File::create(path)
            .map_err(|e| Error::io(format!("create {}", path.display()), e))?;
        let mut writer = BufWriter::new(file);

        match format {
            SaveFormat::Json => serde_json::to_writer_pretty(&mut writer, self)?,
            SaveFormat::MsgPack => rmp_serde::encode::write_named(&mut writer, self)?,
        }
        writer
            .flush()
            .map_err(|e| Error::io(format!("write {}", path.display()), e))?;

        info!("Saved Q table at {}", path.display());
        Ok(())
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let format = SaveFormat::from_path(path)?;
        let file = File::open(path)
            .map_err(|e| Error::io(format!("open {}", path.display()), e))?;
        let reader = BufReader::new(file);

        let saved: SavedQTable = match format {
            SaveFormat::Json => serde_json::from_reader(reader)?,
            SaveFormat::MsgPack => rmp_serde::decode::from_read(reader)?,
        };
        if saved.version != Self::VERSION {
            return Err(Error::UnsupportedVersion {
                found: saved.version,
                expected: Self::VERSION,
            });
        }
        info!("Loaded Q table from {}", path.display());
        Ok(saved)
    }
}

/// File name convention for saved tables:
/// `{datetime}{tag}{alpha}alpha{gamma}gamma{episodes}episodes{minutes}mins`
#[derive(Debug, Clone, PartialEq)]
pub struct QTableFileName {
    pub datetime: String,
    pub game: GameKind,
    pub alpha: f64,
    pub gamma: f64,
    pub episodes: u64,
    pub minutes: u64,
}

impl QTableFileName {
    /// The name with the given extension appended
    pub fn with_extension(&self, extension: &str) -> String {
        format!("{self}.{extension}")
    }

    /// Training minutes recorded in an earlier file name, i.e. the number
    /// between `episodes` and `mins`.
    pub fn previous_minutes(path: &Path) -> Option<u64> {
        let name = path.file_name()?.to_str()?;
        let start = name.find("episodes")? + "episodes".len();
        let end = name.rfind("mins")?;
        name.get(start..end)?.parse().ok()
    }
}

impl fmt::Display for QTableFileName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}alpha{}gamma{}episodes{}mins",
            self.datetime,
            self.game.tag(),
            self.alpha,
            self.gamma,
            self.episodes,
            self.minutes
        )
    }
}
