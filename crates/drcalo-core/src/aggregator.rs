//! Hit aggregation: one step in, one hit table update out
//!
//! For every step the aggregator
//! 1. resolves the touched cell,
//! 2. creates the cell's hit on first touch, positioned at the cell center
//!    (not at the step),
//! 3. adds the step's deposit to the hit,
//! 4. counts first steps of Cerenkov/scintillation photons with their
//!    mean step time (dual-readout volumes only),
//! 5. appends the step's contribution.
//!
//! The zero-energy policy of the volume decides whether steps without a
//! deposit take part in 2, 3 and 5.

use crate::photon::{self, PhotonClass};
use crate::{
    CellResolver, Contribution, Error, HitTable, Result, SensitiveVolume, StepRecord,
    ZeroEnergyPolicy,
};

/// Aggregates the steps of one sensitive volume into its hit table
///
/// The aggregator borrows the table mutably, so a table can only ever be
/// fed by one aggregator at a time.
pub struct HitAggregator<'a> {
    volume: &'a SensitiveVolume,
    resolver: &'a dyn CellResolver,
    table: &'a mut HitTable,
}

impl<'a> HitAggregator<'a> {
    pub fn new(
        volume: &'a SensitiveVolume,
        resolver: &'a dyn CellResolver,
        table: &'a mut HitTable,
    ) -> Self {
        Self {
            volume,
            resolver,
            table,
        }
    }

    /// Process one step
    ///
    /// Returns `Ok(true)` when the step touched a hit and `Ok(false)` when
    /// the zero-energy policy filtered it out. Fails only when the cell
    /// cannot be resolved.
    pub fn on_step(&mut self, step: &StepRecord) -> Result<bool> {
        let class = if self.volume.kind.counts_photons() {
            photon::classify(step)
        } else {
            PhotonClass::Other
        };

        let record_contribution = match self.volume.zero_energy {
            ZeroEnergyPolicy::Keep => true,
            ZeroEnergyPolicy::Skip => !step.is_zero_deposit(),
        };
        if !record_contribution && !class.is_counted() {
            return Ok(false);
        }

        let cell = self
            .resolver
            .resolve(&self.volume.name, &step.touch)
            .map_err(|e| match e {
                err @ Error::CellResolution { .. } => err,
                other => Error::cell_resolution(&self.volume.name, &step.touch, other.to_string()),
            })?;

        let hit = self.table.get_or_insert(cell.cell_id, cell.center);

        match class {
            PhotonClass::CerenkovFirst => hit.count_cerenkov(step.mean_time()),
            PhotonClass::ScintillationFirst => hit.count_scintillation(step.mean_time()),
            PhotonClass::Other => {}
        }

        if record_contribution {
            hit.energy_deposit += step.energy_deposit;
            hit.contributions.push(Contribution::from_step(step));
        }

        Ok(true)
    }

    /// Process a batch of steps, stopping at the first fatal error
    pub fn on_steps<'s>(&mut self, steps: impl IntoIterator<Item = &'s StepRecord>) -> Result<usize> {
        let mut touched = 0;
        for step in steps {
            if self.on_step(step)? {
                touched += 1;
            }
        }
        Ok(touched)
    }

    /// The table being filled
    pub fn table(&self) -> &HitTable {
        self.table
    }
}
