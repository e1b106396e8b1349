//! Aggregated hits and the per-volume hit table

use crate::{CellId, Contribution, ReadoutKind, Vec3, VolumeId};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Aggregated response of one cell within one event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hit {
    /// Cell key
    pub cell_id: CellId,
    /// Nominal center of the cell, fixed when the hit is created
    pub position: Vec3,
    /// Sum of deposited energy (internal units)
    pub energy_deposit: f64,
    /// Number of Cerenkov photons produced in the cell
    pub n_cerenkov_prod: u32,
    /// Number of scintillation photons produced in the cell
    pub n_scintillation_prod: u32,
    /// Sum of Cerenkov production times
    pub t_sum_cerenkov: f64,
    /// Sum of scintillation production times
    pub t_sum_scintillation: f64,
    /// One entry per recorded step, in arrival order
    pub contributions: Vec<Contribution>,
}

impl Hit {
    /// Create an empty hit for a cell
    pub fn new(cell_id: CellId, position: Vec3) -> Self {
        Self {
            cell_id,
            position,
            energy_deposit: 0.0,
            n_cerenkov_prod: 0,
            n_scintillation_prod: 0,
            t_sum_cerenkov: 0.0,
            t_sum_scintillation: 0.0,
            contributions: Vec::new(),
        }
    }

    /// Record a Cerenkov photon produced at `time`
    pub fn count_cerenkov(&mut self, time: f64) {
        self.n_cerenkov_prod += 1;
        self.t_sum_cerenkov += time;
    }

    /// Record a scintillation photon produced at `time`
    pub fn count_scintillation(&mut self, time: f64) {
        self.n_scintillation_prod += 1;
        self.t_sum_scintillation += time;
    }
}

/// Hits of one sensitive volume for the current event
///
/// Keyed by cell, at most one hit per cell. Iteration follows the order in
/// which cells were first touched, so identical step sequences produce
/// identical tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HitTable {
    volume: VolumeId,
    kind: ReadoutKind,
    hits: IndexMap<CellId, Hit>,
}

impl HitTable {
    /// Create an empty table
    pub fn new(volume: impl Into<VolumeId>, kind: ReadoutKind) -> Self {
        Self {
            volume: volume.into(),
            kind,
            hits: IndexMap::new(),
        }
    }

    /// Volume this table belongs to
    pub fn volume(&self) -> &VolumeId {
        &self.volume
    }

    /// Readout kind of the volume
    pub fn kind(&self) -> ReadoutKind {
        self.kind
    }

    /// Get the hit for a cell
    pub fn get(&self, cell_id: CellId) -> Option<&Hit> {
        self.hits.get(&cell_id)
    }

    /// Whether a cell already has a hit
    pub fn contains(&self, cell_id: CellId) -> bool {
        self.hits.contains_key(&cell_id)
    }

    /// Get the hit for a cell, creating it with `position` if absent
    pub fn get_or_insert(&mut self, cell_id: CellId, position: Vec3) -> &mut Hit {
        self.hits
            .entry(cell_id)
            .or_insert_with(|| Hit::new(cell_id, position))
    }

    /// Number of hits
    pub fn len(&self) -> usize {
        self.hits.len()
    }

    /// Whether the table has no hits
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    /// Iterate hits in first-touch order
    pub fn iter(&self) -> impl Iterator<Item = &Hit> {
        self.hits.values()
    }

    /// Total deposited energy over all hits
    pub fn total_energy(&self) -> f64 {
        self.hits.values().map(|h| h.energy_deposit).sum()
    }

    /// Drop all hits
    pub fn clear(&mut self) {
        self.hits.clear();
    }
}
