//! Error types for drcalo-hub

use crate::event::Phase;
use thiserror::Error;

/// Result type for drcalo-hub operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in drcalo-hub
///
/// All of them end the current event. Frames committed before the error are
/// already with the sink and stay untouched.
#[derive(Debug, Error)]
pub enum Error {
    /// Commit attempted while no run (and so no sink) is open
    #[error("no open output: commit attempted outside of a run")]
    NoOpenOutput,

    /// A run is already open
    #[error("run {0} is already open")]
    RunAlreadyOpen(i32),

    /// The committer stopped and no longer accepts frames
    #[error("sink closed: the committer is no longer accepting frames")]
    SinkClosed,

    /// Event operation called in the wrong phase
    #[error("cannot {operation} while event is {found}")]
    InvalidPhase {
        operation: &'static str,
        found: Phase,
    },

    /// Configuration could not be loaded
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A worker or committer thread panicked
    #[error("{0} thread panicked")]
    Panicked(&'static str),

    /// Core error
    #[error("core error: {0}")]
    Core(#[from] drcalo_core::Error),
}

impl Error {
    pub(crate) fn invalid_phase(operation: &'static str, found: Phase) -> Self {
        Error::InvalidPhase { operation, found }
    }
}

// Compile-time check that Error is Send + Sync, so worker threads can hand
// errors back to the caller.
fn _assert_error_send_sync<T: Send + Sync>() {}
fn _error_is_send_sync() {
    _assert_error_send_sync::<Error>();
}
