//! Error types for drcalo-core

use crate::{TouchPoint, VolumeId};
use thiserror::Error;

/// Core error type
///
/// Everything here is fatal for the event being processed. Recoverable
/// faults (dangling track references) go through
/// [`Diagnostics`](crate::Diagnostics) instead.
#[derive(Error, Debug)]
pub enum Error {
    #[error("cell resolution failed in {volume} at copy number {}: {reason}", .touch.copy_number)]
    CellResolution {
        volume: VolumeId,
        touch: TouchPoint,
        reason: String,
    },

    #[error("unknown sensitive volume: {0}")]
    UnknownVolume(VolumeId),

    #[error("invalid cell id encoding: {0}")]
    InvalidEncoding(String),

    #[error("collection name already taken: {0}")]
    CollectionNameTaken(String),

    #[error("sink error: {0}")]
    Sink(String),
}

impl Error {
    /// Build a cell resolution error
    pub fn cell_resolution(
        volume: &VolumeId,
        touch: &TouchPoint,
        reason: impl Into<String>,
    ) -> Self {
        Error::CellResolution {
            volume: volume.clone(),
            touch: *touch,
            reason: reason.into(),
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
