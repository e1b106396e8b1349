//! Optical photon production counting
//!
//! Photons are counted where they are produced, not while they propagate:
//! only the first transport step of an optical photon is classified, and
//! only the two known production processes feed a channel. Anything else
//! still deposits energy through the aggregator but is attributed to no
//! channel.

use crate::StepRecord;
use serde::{Deserialize, Serialize};

/// Creator process tag of Cerenkov photons
pub const CERENKOV_PROCESS: &str = "CerenkovPhys";
/// Creator process tag of scintillation photons
pub const SCINTILLATION_PROCESS: &str = "ScintillationPhys";

/// Classification of a step with respect to the photon channels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PhotonClass {
    /// First step of a Cerenkov photon
    CerenkovFirst,
    /// First step of a scintillation photon
    ScintillationFirst,
    /// Not counted in any channel
    Other,
}

impl PhotonClass {
    /// Whether this class feeds a channel counter
    pub fn is_counted(&self) -> bool {
        !matches!(self, PhotonClass::Other)
    }
}

/// Classify a step by species, creator process and step ordinal
pub fn classify(step: &StepRecord) -> PhotonClass {
    if !step.is_optical_photon() || !step.is_first_step() {
        return PhotonClass::Other;
    }

    match step.creator_process.as_deref() {
        Some(CERENKOV_PROCESS) => PhotonClass::CerenkovFirst,
        Some(SCINTILLATION_PROCESS) => PhotonClass::ScintillationFirst,
        _ => PhotonClass::Other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{StepPoint, TouchPoint, TrackId, Vec3, OPTICAL_PHOTON_PDG};

    fn photon(process: Option<&str>, step_number: u32) -> StepRecord {
        StepRecord {
            energy_deposit: 0.0,
            pre: StepPoint::new(Vec3::ZERO, 0.0),
            post: StepPoint::new(Vec3::ZERO, 1.0),
            track_id: TrackId(100),
            pdg: OPTICAL_PHOTON_PDG,
            creator_process: process.map(str::to_string),
            step_number,
            touch: TouchPoint::new(1),
        }
    }

    #[test]
    fn test_first_steps_are_classified() {
        assert_eq!(
            classify(&photon(Some(CERENKOV_PROCESS), 1)),
            PhotonClass::CerenkovFirst
        );
        assert_eq!(
            classify(&photon(Some(SCINTILLATION_PROCESS), 1)),
            PhotonClass::ScintillationFirst
        );
    }

    #[test]
    fn test_later_steps_are_not_counted() {
        assert_eq!(classify(&photon(Some(CERENKOV_PROCESS), 2)), PhotonClass::Other);
        assert_eq!(
            classify(&photon(Some(SCINTILLATION_PROCESS), 7)),
            PhotonClass::Other
        );
    }

    #[test]
    fn test_unknown_process_is_other() {
        assert_eq!(classify(&photon(Some("OpWLS"), 1)), PhotonClass::Other);
        assert_eq!(classify(&photon(None, 1)), PhotonClass::Other);
    }

    #[test]
    fn test_charged_particle_is_other() {
        let mut step = photon(Some(CERENKOV_PROCESS), 1);
        step.pdg = 11;
        assert_eq!(classify(&step), PhotonClass::Other);
        assert!(!classify(&step).is_counted());
    }
}
