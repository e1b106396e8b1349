//! drcalo Core - Hit aggregation and particle provenance
//!
//! This crate provides the per-event data model of a dual-readout calorimeter
//! response:
//! - Step records consumed from the transport engine (`StepRecord`)
//! - Per-volume hit tables keyed by cell (`HitTable`, `HitAggregator`)
//! - Optical photon production counting (`photon`)
//! - The dense particle graph built from a particle snapshot (`graph`)
//! - Provenance resolution of deposit contributions into particle indices
//! - Output records, frames and the `FrameSink` trait
//!
//! ## Event Flow
//!
//! ```text
//! steps ──► HitAggregator ──► HitTable (one per volume)
//!                                   │
//! particles ──► graph::build ──► IdentifierMap
//!                                   │
//!                         provenance::resolve ──► ResolvedHit
//! ```
//!
//! drcalo-core does not know about threads or output targets. The commit
//! state machine and the single-writer committer live in `drcalo-hub`.

pub mod aggregator;
pub mod cell_id;
mod contribution;
mod diagnostics;
mod error;
pub mod frame;
pub mod graph;
mod hit;
mod identity;
pub mod particle;
pub mod photon;
pub mod provenance;
pub mod readout;
pub mod record;
mod step;
pub mod units;
mod vector;

pub use aggregator::HitAggregator;
pub use cell_id::CellIdLayout;
pub use contribution::Contribution;
pub use diagnostics::{Diagnostic, Diagnostics};
pub use error::{Error, Result};
pub use frame::{
    contributions_name, Collection, Frame, FrameSink, MemorySink, ParamValue, EVENT_HEADER,
    MC_PARTICLES,
};
pub use graph::{IdentifierMap, ParticleGraph};
pub use hit::{Hit, HitTable};
pub use identity::{CellId, ParticleIndex, TrackId, VolumeId};
pub use particle::{Particle, ParticleSet, StatusFlags};
pub use photon::PhotonClass;
pub use provenance::{ResolvedContribution, ResolvedHit, ResolvedTable};
pub use readout::{
    CellResolver, Detector, ReadoutKind, ResolvedCell, SensitiveVolume, ZeroEnergyPolicy,
};
pub use record::{CalorimeterHit, DrCalorimeterHit, EventHeader, HitContribution, McParticle};
pub use step::{StepPoint, StepRecord, TouchPoint, OPTICAL_PHOTON_PDG};
pub use vector::Vec3;
