//! Logical output records
//!
//! All records are in output units (GeV, mm, ns). Relations are plain
//! indices: a particle refers to others by [`ParticleIndex`], and a hit owns
//! the contiguous range of contributions it wrote into its volume's
//! contribution collection.

use crate::ParticleIndex;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Bit positions of the packed simulator status word
pub mod sim_status {
    pub const CREATED_IN_SIMULATION: u32 = 30;
    pub const BACKSCATTER: u32 = 29;
    pub const VERTEX_IS_NOT_ENDPOINT_OF_PARENT: u32 = 28;
    pub const DECAYED_IN_TRACKER: u32 = 27;
    pub const DECAYED_IN_CALORIMETER: u32 = 26;
    pub const HAS_LEFT_DETECTOR: u32 = 25;
    pub const STOPPED: u32 = 24;
    pub const OVERLAY: u32 = 23;
}

/// Run and event identification of an event frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EventHeader {
    pub run_number: i32,
    pub event_number: i32,
    /// Seconds since the Unix epoch at serialization
    pub time_stamp: u64,
    pub weight: f64,
}

/// One particle of the output graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McParticle {
    pub pdg: i32,
    pub generator_status: i32,
    pub simulator_status: u32,
    pub charge: f32,
    pub time: f32,
    pub mass: f64,
    pub vertex: [f64; 3],
    pub endpoint: [f64; 3],
    pub momentum: [f32; 3],
    pub momentum_at_endpoint: [f32; 3],
    pub spin: [f32; 3],
    pub color_flow: [i32; 2],
    pub parents: Vec<ParticleIndex>,
    pub daughters: Vec<ParticleIndex>,
}

impl McParticle {
    fn bit(&self, bit: u32) -> bool {
        self.simulator_status & (1 << bit) != 0
    }

    /// Set or clear one simulator status bit
    pub fn set_sim_bit(&mut self, bit: u32, value: bool) {
        if value {
            self.simulator_status |= 1 << bit;
        } else {
            self.simulator_status &= !(1 << bit);
        }
    }

    pub fn is_created_in_simulation(&self) -> bool {
        self.bit(sim_status::CREATED_IN_SIMULATION)
    }

    pub fn is_backscatter(&self) -> bool {
        self.bit(sim_status::BACKSCATTER)
    }

    pub fn vertex_is_not_endpoint_of_parent(&self) -> bool {
        self.bit(sim_status::VERTEX_IS_NOT_ENDPOINT_OF_PARENT)
    }

    pub fn is_decayed_in_tracker(&self) -> bool {
        self.bit(sim_status::DECAYED_IN_TRACKER)
    }

    pub fn is_decayed_in_calorimeter(&self) -> bool {
        self.bit(sim_status::DECAYED_IN_CALORIMETER)
    }

    pub fn has_left_detector(&self) -> bool {
        self.bit(sim_status::HAS_LEFT_DETECTOR)
    }

    pub fn is_stopped(&self) -> bool {
        self.bit(sim_status::STOPPED)
    }

    pub fn is_overlay(&self) -> bool {
        self.bit(sim_status::OVERLAY)
    }

    /// Energy from momentum and mass
    pub fn energy(&self) -> f64 {
        let [px, py, pz] = self.momentum.map(f64::from);
        (px * px + py * py + pz * pz + self.mass * self.mass).sqrt()
    }
}

/// One deposit of a hit, attributed to an output particle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HitContribution {
    pub pdg: i32,
    pub energy: f32,
    pub time: f32,
    pub step_position: [f32; 3],
    pub particle: ParticleIndex,
}

/// Dual-readout calorimeter hit
///
/// Average production times are `None` only under the omit policy for a
/// channel with no produced photons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrCalorimeterHit {
    pub cell_id: u64,
    pub energy: f32,
    pub position: [f32; 3],
    pub n_cerenkov_prod: u32,
    pub n_scintillation_prod: u32,
    pub t_avg_cerenkov: Option<f32>,
    pub t_avg_scintillation: Option<f32>,
    pub contributions_begin: usize,
    pub contributions_end: usize,
}

impl DrCalorimeterHit {
    /// Range of this hit in its contribution collection
    pub fn contributions(&self) -> Range<usize> {
        self.contributions_begin..self.contributions_end
    }
}

/// Plain calorimeter hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalorimeterHit {
    pub cell_id: u64,
    pub energy: f32,
    pub position: [f32; 3],
    pub contributions_begin: usize,
    pub contributions_end: usize,
}

impl CalorimeterHit {
    /// Range of this hit in its contribution collection
    pub fn contributions(&self) -> Range<usize> {
        self.contributions_begin..self.contributions_end
    }
}
