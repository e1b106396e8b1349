//! Per-event channel for recoverable data-consistency faults
//!
//! A broken parent link or an unattributable contribution does not stop the
//! event: the single edge or contribution is skipped, the fault is logged,
//! and it is kept here so callers can inspect what was dropped.

use crate::{CellId, TrackId, VolumeId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A recoverable fault found while building an event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Diagnostic {
    /// A particle lists a parent that is not in the snapshot
    DanglingParent { particle: TrackId, parent: TrackId },
    /// A particle lists a daughter that is not in the snapshot
    DanglingDaughter { particle: TrackId, daughter: TrackId },
    /// A contribution names a track with no output particle
    UnresolvedContribution {
        volume: VolumeId,
        cell_id: CellId,
        track: TrackId,
    },
    /// The snapshot listed the same track twice; the later entry won
    DuplicateTrack { track: TrackId },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::DanglingParent { particle, parent } => {
                write!(f, "particle {} references missing parent {}", particle, parent)
            }
            Diagnostic::DanglingDaughter { particle, daughter } => {
                write!(
                    f,
                    "particle {} references missing daughter {}",
                    particle, daughter
                )
            }
            Diagnostic::UnresolvedContribution {
                volume,
                cell_id,
                track,
            } => write!(
                f,
                "contribution from {} in {}/{} has no particle",
                track, volume, cell_id
            ),
            Diagnostic::DuplicateTrack { track } => {
                write!(f, "{} appears twice in particle snapshot", track)
            }
        }
    }
}

/// Collected diagnostics of one event
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record and log a fault
    pub fn report(&mut self, diagnostic: Diagnostic) {
        tracing::warn!(fault = %diagnostic, "skipping inconsistent reference");
        self.entries.push(diagnostic);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    /// Number of skipped parent/daughter edges
    pub fn skipped_edges(&self) -> usize {
        self.entries
            .iter()
            .filter(|d| {
                matches!(
                    d,
                    Diagnostic::DanglingParent { .. } | Diagnostic::DanglingDaughter { .. }
                )
            })
            .count()
    }

    /// Number of dropped contributions
    pub fn dropped_contributions(&self) -> usize {
        self.entries
            .iter()
            .filter(|d| matches!(d, Diagnostic::UnresolvedContribution { .. }))
            .count()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Take all entries, leaving the collection empty
    pub fn take(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.entries)
    }
}
