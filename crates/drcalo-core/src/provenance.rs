//! Provenance resolution of hit contributions
//!
//! Rewrites the transient track ids of a hit's contributions into output
//! particle indices. Runs once per event, after the [`IdentifierMap`] is
//! built. A contribution whose track has no particle is dropped on its own;
//! the rest of the hit is kept as is.

use crate::{
    CellId, Contribution, Diagnostic, Diagnostics, Hit, HitTable, IdentifierMap, ParticleIndex,
    ParticleSet, ReadoutKind, Vec3, VolumeId,
};
use serde::{Deserialize, Serialize};

/// A contribution attributed to an output particle, still in internal units
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResolvedContribution {
    pub particle: ParticleIndex,
    pub energy: f64,
    pub time: f64,
    pub position: Vec3,
    pub pdg: i32,
}

/// A hit whose contributions point into the particle graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedHit {
    pub cell_id: CellId,
    pub position: Vec3,
    pub energy_deposit: f64,
    pub n_cerenkov_prod: u32,
    pub n_scintillation_prod: u32,
    pub t_sum_cerenkov: f64,
    pub t_sum_scintillation: f64,
    pub contributions: Vec<ResolvedContribution>,
}

/// Resolved hits of one volume
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedTable {
    pub volume: VolumeId,
    pub kind: ReadoutKind,
    pub hits: Vec<ResolvedHit>,
}

fn resolve_contribution(
    contribution: &Contribution,
    ids: &IdentifierMap,
    particles: &ParticleSet,
) -> Option<ResolvedContribution> {
    let track = particles.equivalent(contribution.source_track);
    ids.get(track).map(|particle| ResolvedContribution {
        particle,
        energy: contribution.energy,
        time: contribution.time,
        position: contribution.position,
        pdg: contribution.pdg,
    })
}

/// Resolve the contributions of one hit
///
/// Track ids are first translated through the snapshot's equivalences.
pub fn resolve(
    volume: &VolumeId,
    hit: &Hit,
    ids: &IdentifierMap,
    particles: &ParticleSet,
    diagnostics: &mut Diagnostics,
) -> ResolvedHit {
    let mut contributions = Vec::with_capacity(hit.contributions.len());
    for contribution in &hit.contributions {
        match resolve_contribution(contribution, ids, particles) {
            Some(resolved) => contributions.push(resolved),
            None => diagnostics.report(Diagnostic::UnresolvedContribution {
                volume: volume.clone(),
                cell_id: hit.cell_id,
                track: contribution.source_track,
            }),
        }
    }

    ResolvedHit {
        cell_id: hit.cell_id,
        position: hit.position,
        energy_deposit: hit.energy_deposit,
        n_cerenkov_prod: hit.n_cerenkov_prod,
        n_scintillation_prod: hit.n_scintillation_prod,
        t_sum_cerenkov: hit.t_sum_cerenkov,
        t_sum_scintillation: hit.t_sum_scintillation,
        contributions,
    }
}

/// Resolve every hit of a table, in table order
pub fn resolve_table(
    table: &HitTable,
    ids: &IdentifierMap,
    particles: &ParticleSet,
    diagnostics: &mut Diagnostics,
) -> ResolvedTable {
    ResolvedTable {
        volume: table.volume().clone(),
        kind: table.kind(),
        hits: table
            .iter()
            .map(|hit| resolve(table.volume(), hit, ids, particles, diagnostics))
            .collect(),
    }
}
