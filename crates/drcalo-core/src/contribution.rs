//! Per-step provenance of an energy deposit

use crate::{StepRecord, TrackId, Vec3};
use serde::{Deserialize, Serialize};

/// One recorded unit of provenance linking a deposit to its track
///
/// Contributions are never merged: a hit keeps one per step it received.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Contribution {
    /// Track that deposited the energy
    pub source_track: TrackId,
    /// Deposited energy (internal units)
    pub energy: f64,
    /// Global time at the end of the step
    pub time: f64,
    /// Midpoint of the step
    pub position: Vec3,
    /// PDG code of the depositing particle
    pub pdg: i32,
}

impl Contribution {
    /// Extract the contribution carried by a step
    pub fn from_step(step: &StepRecord) -> Self {
        Self {
            source_track: step.track_id,
            energy: step.energy_deposit,
            time: step.post.time,
            position: step.pre.position.midpoint(&step.post.position),
            pdg: step.pdg,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{StepPoint, TouchPoint};

    #[test]
    fn test_from_step() {
        let step = StepRecord {
            energy_deposit: 1.5,
            pre: StepPoint::new(Vec3::new(0.0, 0.0, 0.0), 1.0),
            post: StepPoint::new(Vec3::new(2.0, 0.0, 4.0), 2.0),
            track_id: TrackId(7),
            pdg: 11,
            creator_process: Some("eIoni".to_string()),
            step_number: 4,
            touch: TouchPoint::new(12),
        };

        let c = Contribution::from_step(&step);
        assert_eq!(c.source_track, TrackId(7));
        assert_eq!(c.energy, 1.5);
        assert_eq!(c.time, 2.0);
        assert_eq!(c.position, Vec3::new(1.0, 0.0, 2.0));
        assert_eq!(c.pdg, 11);
    }
}
