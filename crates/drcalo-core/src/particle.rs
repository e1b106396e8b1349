//! Simulated particles as supplied by the transport engine
//!
//! A [`ParticleSet`] is the full snapshot of one event's kept particles.
//! It is handed over once per event, after stepping is done.

use crate::{Diagnostic, Diagnostics, TrackId, Vec3};
use bitflags::bitflags;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

bitflags! {
    /// Status bits carried by a simulated particle
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct StatusFlags: u32 {
        /// Stable particle from the generator
        const GEN_STABLE = 1 << 0;
        /// Decayed particle from the generator
        const GEN_DECAYED = 1 << 1;
        /// Documentation entry from the generator
        const GEN_DOCUMENTATION = 1 << 2;
        /// Beam particle
        const GEN_BEAM = 1 << 3;
        /// Any other generator status
        const GEN_OTHER = 1 << 4;

        /// Created during simulation rather than by the generator
        const SIM_CREATED = 1 << 8;
        /// Backscattered from a calorimeter surface
        const SIM_BACKSCATTER = 1 << 9;
        /// Vertex is not the endpoint of the parent
        const SIM_PARENT_RADIATED = 1 << 10;
        /// Decayed in the tracking region
        const SIM_DECAY_TRACKER = 1 << 11;
        /// Decayed in the calorimeter
        const SIM_DECAY_CALO = 1 << 12;
        /// Left the world volume
        const SIM_LEFT_DETECTOR = 1 << 13;
        /// Stopped inside the detector
        const SIM_STOPPED = 1 << 14;
    }
}

/// One simulated particle, in internal units
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    pub track_id: TrackId,
    pub pdg: i32,
    /// Generator status given explicitly by the generator (0 = not given)
    pub gen_status: i32,
    pub status: StatusFlags,
    pub charge: f32,
    pub mass: f64,
    /// Creation time
    pub time: f64,
    /// Momentum at creation
    pub momentum: Vec3,
    /// Momentum at the endpoint
    pub momentum_end: Vec3,
    /// Production vertex
    pub vertex: Vec3,
    pub endpoint: Vec3,
    pub spin: [f32; 3],
    pub color_flow: [i32; 2],
    pub parents: BTreeSet<TrackId>,
    pub daughters: BTreeSet<TrackId>,
}

impl Particle {
    /// Create a particle with zeroed kinematics
    pub fn new(track_id: TrackId, pdg: i32) -> Self {
        Self {
            track_id,
            pdg,
            gen_status: 0,
            status: StatusFlags::empty(),
            charge: 0.0,
            mass: 0.0,
            time: 0.0,
            momentum: Vec3::ZERO,
            momentum_end: Vec3::ZERO,
            vertex: Vec3::ZERO,
            endpoint: Vec3::ZERO,
            spin: [0.0; 3],
            color_flow: [0; 2],
            parents: BTreeSet::new(),
            daughters: BTreeSet::new(),
        }
    }

    pub fn with_status(mut self, status: StatusFlags) -> Self {
        self.status = status;
        self
    }

    pub fn with_parent(mut self, parent: TrackId) -> Self {
        self.parents.insert(parent);
        self
    }

    pub fn with_daughter(mut self, daughter: TrackId) -> Self {
        self.daughters.insert(daughter);
        self
    }
}

/// Snapshot of one event's particles
///
/// Keeps insertion order, which becomes the output order. Tracks that were
/// not kept can be mapped onto the kept particle that absorbs their
/// deposits via [`add_equivalence`](Self::add_equivalence).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParticleSet {
    particles: IndexMap<TrackId, Particle>,
    equivalences: IndexMap<TrackId, TrackId>,
}

impl ParticleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a particle
    ///
    /// A second particle with the same track id replaces the first in place
    /// and is reported as a [`Diagnostic::DuplicateTrack`].
    pub fn insert(&mut self, particle: Particle, diagnostics: &mut Diagnostics) {
        let track = particle.track_id;
        if self.particles.insert(track, particle).is_some() {
            diagnostics.report(Diagnostic::DuplicateTrack { track });
        }
    }

    /// Record that deposits of `track` belong to particle `kept`
    pub fn add_equivalence(&mut self, track: TrackId, kept: TrackId) {
        self.equivalences.insert(track, kept);
    }

    /// Track id under which deposits of `track` are attributed
    pub fn equivalent(&self, track: TrackId) -> TrackId {
        self.equivalences.get(&track).copied().unwrap_or(track)
    }

    pub fn get(&self, track: TrackId) -> Option<&Particle> {
        self.particles.get(&track)
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Particles in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Particle> {
        self.particles.values()
    }

    pub fn clear(&mut self) {
        self.particles.clear();
        self.equivalences.clear();
    }
}

impl FromIterator<Particle> for ParticleSet {
    /// Collect particles; duplicates are logged and the later one kept
    fn from_iter<I: IntoIterator<Item = Particle>>(iter: I) -> Self {
        let mut set = ParticleSet::new();
        let mut diagnostics = Diagnostics::new();
        for particle in iter {
            set.insert(particle, &mut diagnostics);
        }
        set
    }
}
