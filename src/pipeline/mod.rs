//! Match sessions and their observers
//!
//! A [`Session`] plays a series of games between two [`Learner`]s. What gets
//! printed, logged or written to CSV is decided by the observers attached to
//! it, usually built from an [`OutputConfig`].

pub mod observers;
pub mod session;

pub use observers::{
    CSV_HEADER, Channels, ConsoleObserver, CsvObserver, LogFileObserver, MetricsChannels,
    MetricsObserver, MetricsSummary, OutputConfig, ProgressObserver,
};
pub use session::{
    GameReport, PlayerGameStats, PlayerStats, Session, SessionConfig, SessionInfo, SessionSummary,
};

pub use crate::ports::{Learner, Observer};
