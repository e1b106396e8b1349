//! Step records consumed from the transport engine

use crate::{TrackId, Vec3};
use serde::{Deserialize, Serialize};

/// PDG code the transport engine assigns to optical photons
pub const OPTICAL_PHOTON_PDG: i32 = -22;

/// Position and global time of one end of a step
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct StepPoint {
    pub position: Vec3,
    pub time: f64,
}

impl StepPoint {
    pub fn new(position: Vec3, time: f64) -> Self {
        Self { position, time }
    }
}

/// Geometry handle of the volume touched by a step
///
/// Only the replica copy number is carried; turning it into a cell key is
/// the job of a [`CellResolver`](crate::CellResolver).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TouchPoint {
    pub copy_number: i32,
}

impl TouchPoint {
    pub fn new(copy_number: i32) -> Self {
        Self { copy_number }
    }
}

/// One elementary transport step
///
/// Read-only for the core. Energies and times are in internal units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    /// Total energy deposited during the step
    pub energy_deposit: f64,
    /// Start of the step
    pub pre: StepPoint,
    /// End of the step
    pub post: StepPoint,
    /// Track that made the step
    pub track_id: TrackId,
    /// PDG code of the track's particle
    pub pdg: i32,
    /// Name of the process that created the track (`None` for primaries)
    pub creator_process: Option<String>,
    /// Ordinal of this step along its track, starting at 1
    pub step_number: u32,
    /// Volume touched at the pre-step point
    pub touch: TouchPoint,
}

impl StepRecord {
    /// Whether the stepping particle is an optical photon
    pub fn is_optical_photon(&self) -> bool {
        self.pdg == OPTICAL_PHOTON_PDG
    }

    /// Whether this is the first transport step of its track
    pub fn is_first_step(&self) -> bool {
        self.step_number == 1
    }

    /// Mean of the pre- and post-step global times
    pub fn mean_time(&self) -> f64 {
        (self.pre.time + self.post.time) / 2.0
    }

    /// Whether the step deposited no energy
    pub fn is_zero_deposit(&self) -> bool {
        self.energy_deposit == 0.0
    }
}
