//! Particle graph construction
//!
//! Turns an event's [`ParticleSet`] into a dense array of [`McParticle`]
//! records and an [`IdentifierMap`] from track id to output index. Runs in
//! two passes: the first assigns indices in snapshot order and converts
//! kinematics, the second resolves parent and daughter ids into index edges.
//! An id that is missing from the map costs only that one edge.
//!
//! The builder does not look for cycles: the output is acyclic exactly when
//! the input relation is.

use crate::record::{sim_status, McParticle};
use crate::units::{self, to_gev, to_ns};
use crate::{Diagnostic, Diagnostics, Particle, ParticleIndex, ParticleSet, StatusFlags, TrackId};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Track id to output index, built once per event
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IdentifierMap {
    indices: IndexMap<TrackId, ParticleIndex>,
}

impl IdentifierMap {
    /// Output index of a track
    pub fn get(&self, track: TrackId) -> Option<ParticleIndex> {
        self.indices.get(&track).copied()
    }

    pub fn contains(&self, track: TrackId) -> bool {
        self.indices.contains_key(&track)
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// (track, index) pairs in index order
    pub fn iter(&self) -> impl Iterator<Item = (TrackId, ParticleIndex)> + '_ {
        self.indices.iter().map(|(t, i)| (*t, *i))
    }
}

/// Output particles plus the map used to reach them
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParticleGraph {
    pub particles: Vec<McParticle>,
    pub ids: IdentifierMap,
}

impl ParticleGraph {
    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Particle at an output index
    pub fn get(&self, index: ParticleIndex) -> Option<&McParticle> {
        self.particles.get(index.raw())
    }

    /// Particle for a track id
    pub fn by_track(&self, track: TrackId) -> Option<&McParticle> {
        self.ids.get(track).and_then(|i| self.get(i))
    }

    /// Total number of parent edges
    pub fn parent_edges(&self) -> usize {
        self.particles.iter().map(|p| p.parents.len()).sum()
    }

    /// Total number of daughter edges
    pub fn daughter_edges(&self) -> usize {
        self.particles.iter().map(|p| p.daughters.len()).sum()
    }
}

/// Generator status from explicit status or status bits
///
/// An explicit non-zero status wins. Otherwise the first set class of
/// stable(1), decayed(2), documentation(3), beam(4), other(9) is used,
/// and 0 when none is set. Particles created in simulation always get 0.
pub fn generator_status(particle: &Particle) -> i32 {
    let flags = particle.status;
    if flags.contains(StatusFlags::SIM_CREATED) {
        return 0;
    }
    if particle.gen_status != 0 {
        return particle.gen_status;
    }

    const PRECEDENCE: [(StatusFlags, i32); 5] = [
        (StatusFlags::GEN_STABLE, 1),
        (StatusFlags::GEN_DECAYED, 2),
        (StatusFlags::GEN_DOCUMENTATION, 3),
        (StatusFlags::GEN_BEAM, 4),
        (StatusFlags::GEN_OTHER, 9),
    ];
    PRECEDENCE
        .iter()
        .find(|(flag, _)| flags.contains(*flag))
        .map(|(_, code)| *code)
        .unwrap_or(0)
}

/// Simulation status flags and the simulator status bit each one sets
const SIM_STATUS_BITS: [(StatusFlags, u32); 7] = [
    (StatusFlags::SIM_CREATED, sim_status::CREATED_IN_SIMULATION),
    (StatusFlags::SIM_BACKSCATTER, sim_status::BACKSCATTER),
    (
        StatusFlags::SIM_PARENT_RADIATED,
        sim_status::VERTEX_IS_NOT_ENDPOINT_OF_PARENT,
    ),
    (StatusFlags::SIM_DECAY_TRACKER, sim_status::DECAYED_IN_TRACKER),
    (StatusFlags::SIM_DECAY_CALO, sim_status::DECAYED_IN_CALORIMETER),
    (StatusFlags::SIM_LEFT_DETECTOR, sim_status::HAS_LEFT_DETECTOR),
    (StatusFlags::SIM_STOPPED, sim_status::STOPPED),
];

fn convert(particle: &Particle) -> McParticle {
    let mut record = McParticle {
        pdg: particle.pdg,
        generator_status: generator_status(particle),
        simulator_status: 0,
        charge: particle.charge,
        time: to_ns(particle.time) as f32,
        mass: to_gev(particle.mass),
        vertex: particle.vertex.in_units(units::MM),
        endpoint: particle.endpoint.in_units(units::MM),
        momentum: particle.momentum.in_units_f32(units::GEV),
        momentum_at_endpoint: particle.momentum_end.in_units_f32(units::GEV),
        spin: particle.spin,
        color_flow: particle.color_flow,
        parents: Vec::new(),
        daughters: Vec::new(),
    };
    for (flag, bit) in SIM_STATUS_BITS {
        record.set_sim_bit(bit, particle.status.contains(flag));
    }
    record
}

/// Build the dense particle graph of an event
pub fn build(set: &ParticleSet, diagnostics: &mut Diagnostics) -> ParticleGraph {
    let mut graph = ParticleGraph {
        particles: Vec::with_capacity(set.len()),
        ids: IdentifierMap::default(),
    };

    for particle in set.iter() {
        let index = ParticleIndex(graph.particles.len());
        graph.ids.indices.insert(particle.track_id, index);
        graph.particles.push(convert(particle));
    }

    for (i, particle) in set.iter().enumerate() {
        let mut daughters = Vec::with_capacity(particle.daughters.len());
        for &daughter in &particle.daughters {
            match graph.ids.get(daughter) {
                Some(index) => daughters.push(index),
                None => diagnostics.report(Diagnostic::DanglingDaughter {
                    particle: particle.track_id,
                    daughter,
                }),
            }
        }

        let mut parents = Vec::with_capacity(particle.parents.len());
        for &parent in particle.parents.iter().filter(|p| p.is_valid()) {
            match graph.ids.get(parent) {
                Some(index) => parents.push(index),
                None => diagnostics.report(Diagnostic::DanglingParent {
                    particle: particle.track_id,
                    parent,
                }),
            }
        }

        let out = &mut graph.particles[i];
        out.daughters = daughters;
        out.parents = parents;
    }

    tracing::debug!(
        particles = graph.len(),
        parent_edges = graph.parent_edges(),
        daughter_edges = graph.daughter_edges(),
        "built particle graph"
    );
    graph
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::{CM, GEV, MEV};
    use crate::Vec3;

    fn chain() -> ParticleSet {
        // 1 -> {2, 3}, 3 -> {4}
        [
            Particle::new(TrackId(1), 23)
                .with_status(StatusFlags::GEN_DECAYED)
                .with_parent(TrackId(-1))
                .with_daughter(TrackId(2))
                .with_daughter(TrackId(3)),
            Particle::new(TrackId(2), 11)
                .with_status(StatusFlags::GEN_STABLE)
                .with_parent(TrackId(1)),
            Particle::new(TrackId(3), -11)
                .with_status(StatusFlags::GEN_STABLE)
                .with_parent(TrackId(1))
                .with_daughter(TrackId(4)),
            Particle::new(TrackId(4), 22)
                .with_status(StatusFlags::SIM_CREATED)
                .with_parent(TrackId(3)),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_density_and_edges() {
        let set = chain();
        let mut diag = Diagnostics::new();
        let graph = build(&set, &mut diag);

        assert_eq!(graph.len(), set.len());
        assert_eq!(graph.ids.len(), 4);
        assert!(diag.is_empty());

        // Negative parent ids are not edges
        assert!(graph.particles[0].parents.is_empty());
        assert_eq!(
            graph.particles[0].daughters,
            vec![ParticleIndex(1), ParticleIndex(2)]
        );
        assert_eq!(graph.particles[3].parents, vec![ParticleIndex(2)]);
        assert_eq!(graph.parent_edges(), 3);
        assert_eq!(graph.daughter_edges(), 3);
    }

    #[test]
    fn test_indices_follow_insertion_order() {
        let set: ParticleSet = [30, 10, 20]
            .into_iter()
            .map(|id| Particle::new(TrackId(id), 22))
            .collect();
        let graph = build(&set, &mut Diagnostics::new());

        assert_eq!(graph.ids.get(TrackId(30)), Some(ParticleIndex(0)));
        assert_eq!(graph.ids.get(TrackId(10)), Some(ParticleIndex(1)));
        assert_eq!(graph.ids.get(TrackId(20)), Some(ParticleIndex(2)));
    }

    #[test]
    fn test_dangling_parent_skips_one_edge() {
        let mut set = chain();
        let mut diag = Diagnostics::new();
        let reference = build(&set, &mut diag);

        let broken = set.get(TrackId(2)).unwrap().clone().with_parent(TrackId(77));
        set.insert(broken, &mut diag);
        diag.clear();
        let graph = build(&set, &mut diag);

        assert_eq!(diag.skipped_edges(), 1);
        assert_eq!(
            diag.iter().next(),
            Some(&Diagnostic::DanglingParent {
                particle: TrackId(2),
                parent: TrackId(77),
            })
        );
        assert_eq!(graph, reference);
    }

    #[test]
    fn test_dangling_daughter() {
        let set: ParticleSet = [Particle::new(TrackId(1), 22)
            .with_daughter(TrackId(2))
            .with_daughter(TrackId(5))]
        .into_iter()
        .chain([Particle::new(TrackId(2), 11)])
        .collect();
        let mut diag = Diagnostics::new();
        let graph = build(&set, &mut diag);

        assert_eq!(graph.particles[0].daughters, vec![ParticleIndex(1)]);
        assert_eq!(diag.skipped_edges(), 1);
    }

    #[test]
    fn test_generator_status_precedence() {
        let p = |flags| Particle::new(TrackId(1), 11).with_status(flags);

        assert_eq!(
            generator_status(&p(StatusFlags::GEN_STABLE | StatusFlags::GEN_BEAM)),
            1
        );
        assert_eq!(
            generator_status(&p(StatusFlags::GEN_DECAYED | StatusFlags::GEN_OTHER)),
            2
        );
        assert_eq!(generator_status(&p(StatusFlags::GEN_DOCUMENTATION)), 3);
        assert_eq!(generator_status(&p(StatusFlags::GEN_BEAM)), 4);
        assert_eq!(generator_status(&p(StatusFlags::GEN_OTHER)), 9);
        assert_eq!(generator_status(&p(StatusFlags::empty())), 0);
    }

    #[test]
    fn test_explicit_status_and_sim_created() {
        let mut p = Particle::new(TrackId(1), 11).with_status(StatusFlags::GEN_STABLE);
        p.gen_status = 21;
        assert_eq!(generator_status(&p), 21);

        p.status.insert(StatusFlags::SIM_CREATED);
        assert_eq!(generator_status(&p), 0);
    }

    #[test]
    fn test_unit_conversion() {
        let mut p = Particle::new(TrackId(1), 211);
        p.momentum = Vec3::new(2.0 * GEV, 0.0, 500.0 * MEV);
        p.vertex = Vec3::new(1.0 * CM, 0.0, 0.0);
        p.mass = 139.57 * MEV;
        p.time = 3.0;
        p.status = StatusFlags::SIM_CREATED | StatusFlags::SIM_LEFT_DETECTOR;

        let set: ParticleSet = [p].into_iter().collect();
        let graph = build(&set, &mut Diagnostics::new());
        let out = &graph.particles[0];

        assert_eq!(out.momentum, [2.0, 0.0, 0.5]);
        assert_eq!(out.vertex, [10.0, 0.0, 0.0]);
        assert!((out.mass - 0.13957).abs() < 1e-9);
        assert_eq!(out.time, 3.0);
        assert!(out.is_created_in_simulation());
        assert!(out.has_left_detector());
        assert!(!out.is_stopped());
    }

    #[test]
    fn test_simulator_status_word() {
        let mut p = Particle::new(TrackId(1), 22);
        p.status = StatusFlags::all();
        let set: ParticleSet = [p].into_iter().collect();
        let graph = build(&set, &mut Diagnostics::new());

        // Bits 30..24; overlay (23) is never set and generator flags map to nothing
        assert_eq!(graph.particles[0].simulator_status, 0x7f00_0000);
        assert!(!graph.particles[0].is_overlay());
    }

    #[test]
    fn test_deterministic_build() {
        let a = build(&chain(), &mut Diagnostics::new());
        let b = build(&chain(), &mut Diagnostics::new());
        assert_eq!(ron::to_string(&a).unwrap(), ron::to_string(&b).unwrap());
    }
}
