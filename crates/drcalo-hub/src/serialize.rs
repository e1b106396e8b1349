//! Record serialization of resolved hits
//!
//! Pure functions from resolved per-volume tables to output records.
//! Every derived value is computed here, once, in output units: hit energy
//! in GeV, positions in mm, times in ns, and the average photon production
//! time of each channel as `t_sum / n_prod`.
//!
//! Each volume yields two collections: its hits, and the flat list of their
//! contributions. A hit points into the latter by a `begin..end` range.

use drcalo_core::units::{self, to_gev, to_ns};
use drcalo_core::{
    CalorimeterHit, Collection, DrCalorimeterHit, HitContribution, ReadoutKind,
    ResolvedContribution, ResolvedHit, ResolvedTable,
};
use serde::{Deserialize, Serialize};

/// Average time written for a channel that produced no photons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AverageTimePolicy {
    /// Write 0.0
    #[default]
    Zero,
    /// Write NaN
    NaN,
    /// Leave the field out
    Omit,
}

impl AverageTimePolicy {
    /// Average of `count` times summing to `sum`, in ns
    pub fn average(&self, sum: f64, count: u32) -> Option<f32> {
        if count > 0 {
            return Some(to_ns(sum / f64::from(count)) as f32);
        }
        match self {
            AverageTimePolicy::Zero => Some(0.0),
            AverageTimePolicy::NaN => Some(f32::NAN),
            AverageTimePolicy::Omit => None,
        }
    }
}

/// The two collections written for one volume
#[derive(Debug, Clone, PartialEq)]
pub struct VolumeCollections {
    pub hits: Collection,
    pub contributions: Collection,
}

pub fn contribution_record(contribution: &ResolvedContribution) -> HitContribution {
    HitContribution {
        pdg: contribution.pdg,
        energy: to_gev(contribution.energy) as f32,
        time: to_ns(contribution.time) as f32,
        step_position: contribution.position.in_units_f32(units::MM),
        particle: contribution.particle,
    }
}

/// Append the hit's contributions and return their range
fn push_contributions(
    hit: &ResolvedHit,
    out: &mut Vec<HitContribution>,
) -> std::ops::Range<usize> {
    let begin = out.len();
    out.extend(hit.contributions.iter().map(contribution_record));
    begin..out.len()
}

pub fn dr_hit_record(
    hit: &ResolvedHit,
    policy: AverageTimePolicy,
    out: &mut Vec<HitContribution>,
) -> DrCalorimeterHit {
    let range = push_contributions(hit, out);
    DrCalorimeterHit {
        cell_id: hit.cell_id.raw(),
        energy: to_gev(hit.energy_deposit) as f32,
        position: hit.position.in_units_f32(units::MM),
        n_cerenkov_prod: hit.n_cerenkov_prod,
        n_scintillation_prod: hit.n_scintillation_prod,
        t_avg_cerenkov: policy.average(hit.t_sum_cerenkov, hit.n_cerenkov_prod),
        t_avg_scintillation: policy.average(hit.t_sum_scintillation, hit.n_scintillation_prod),
        contributions_begin: range.start,
        contributions_end: range.end,
    }
}

pub fn calo_hit_record(hit: &ResolvedHit, out: &mut Vec<HitContribution>) -> CalorimeterHit {
    let range = push_contributions(hit, out);
    CalorimeterHit {
        cell_id: hit.cell_id.raw(),
        energy: to_gev(hit.energy_deposit) as f32,
        position: hit.position.in_units_f32(units::MM),
        contributions_begin: range.start,
        contributions_end: range.end,
    }
}

/// Serialize one resolved table, dispatching on its readout kind
pub fn serialize_table(table: &ResolvedTable, policy: AverageTimePolicy) -> VolumeCollections {
    let mut contributions = Vec::new();
    let hits = match table.kind {
        ReadoutKind::DualReadout => Collection::DrCalorimeterHits(
            table
                .hits
                .iter()
                .map(|hit| dr_hit_record(hit, policy, &mut contributions))
                .collect(),
        ),
        ReadoutKind::Calorimeter => Collection::CalorimeterHits(
            table
                .hits
                .iter()
                .map(|hit| calo_hit_record(hit, &mut contributions))
                .collect(),
        ),
    };
    VolumeCollections {
        hits,
        contributions: Collection::Contributions(contributions),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drcalo_core::units::{GEV, NS};
    use drcalo_core::{CellId, ParticleIndex, Vec3, VolumeId};

    fn contribution(particle: usize, energy: f64) -> ResolvedContribution {
        ResolvedContribution {
            particle: ParticleIndex(particle),
            energy,
            time: 2.0 * NS,
            position: Vec3::new(1.0, 2.0, 3.0),
            pdg: 11,
        }
    }

    fn hit(cell: u64, contributions: Vec<ResolvedContribution>) -> ResolvedHit {
        ResolvedHit {
            cell_id: CellId(cell),
            position: Vec3::new(0.0, 0.0, 10.0),
            energy_deposit: contributions.iter().map(|c| c.energy).sum(),
            n_cerenkov_prod: 0,
            n_scintillation_prod: 0,
            t_sum_cerenkov: 0.0,
            t_sum_scintillation: 0.0,
            contributions,
        }
    }

    #[test]
    fn test_average_time_policies() {
        assert_eq!(AverageTimePolicy::Zero.average(30.0, 3), Some(10.0));
        assert_eq!(AverageTimePolicy::Zero.average(0.0, 0), Some(0.0));
        assert!(AverageTimePolicy::NaN.average(0.0, 0).unwrap().is_nan());
        assert_eq!(AverageTimePolicy::Omit.average(0.0, 0), None);
        assert_eq!(AverageTimePolicy::Omit.average(8.0, 2), Some(4.0));
    }

    #[test]
    fn test_scenario_cell_42_record() {
        let mut resolved = hit(
            42,
            vec![
                contribution(0, 1.0 * GEV),
                contribution(0, 2.5 * GEV),
                contribution(1, 0.5 * GEV),
            ],
        );
        resolved.n_cerenkov_prod = 1;
        resolved.t_sum_cerenkov = 10.0 * NS;

        let mut out = Vec::new();
        let record = dr_hit_record(&resolved, AverageTimePolicy::Zero, &mut out);

        assert_eq!(record.cell_id, 42);
        assert_eq!(record.energy, 4.0);
        assert_eq!(record.n_cerenkov_prod, 1);
        assert_eq!(record.t_avg_cerenkov, Some(10.0));
        assert_eq!(record.t_avg_scintillation, Some(0.0));
        assert_eq!(record.contributions().len(), 3);
        assert_eq!(out[0].energy, 1.0);
        assert_eq!(out[0].time, 2.0);
        assert_eq!(out[0].step_position, [1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_contribution_ranges_are_contiguous() {
        let table = ResolvedTable {
            volume: VolumeId::from("cal"),
            kind: ReadoutKind::Calorimeter,
            hits: vec![
                hit(1, vec![contribution(0, 1.0), contribution(1, 1.0)]),
                hit(2, Vec::new()),
                hit(3, vec![contribution(2, 1.0)]),
            ],
        };

        let collections = serialize_table(&table, AverageTimePolicy::Zero);
        let Collection::CalorimeterHits(hits) = &collections.hits else {
            panic!("expected calorimeter hits");
        };
        assert_eq!(hits[0].contributions(), 0..2);
        assert_eq!(hits[1].contributions(), 2..2);
        assert_eq!(hits[2].contributions(), 2..3);
        assert_eq!(collections.contributions.len(), 3);
    }

    #[test]
    fn test_dispatch_on_kind() {
        let table = ResolvedTable {
            volume: VolumeId::from("dr"),
            kind: ReadoutKind::DualReadout,
            hits: vec![hit(1, Vec::new())],
        };
        let collections = serialize_table(&table, AverageTimePolicy::Omit);
        let Collection::DrCalorimeterHits(hits) = &collections.hits else {
            panic!("expected dual-readout hits");
        };
        assert_eq!(hits[0].t_avg_cerenkov, None);
    }
}
