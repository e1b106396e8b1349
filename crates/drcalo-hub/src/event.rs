//! Per-event context and its phase machine
//!
//! An [`EventContext`] owns everything one event accumulates: a hit table
//! per sensitive volume, the particle snapshot, the particle graph and the
//! diagnostics. Nothing here is shared, so distinct events can run on
//! distinct threads without locks.
//!
//! ```text
//! Idle ──begin──► Accumulating ──build_graph──► GraphBuilt ──serialize──► Committed
//!  ▲                                                                         │
//!  └──────────────────────────────── reset ◄─────────────────────────────────┘
//! ```

use crate::config::CommitConfig;
use crate::error::{Error, Result};
use crate::serialize::serialize_table;
use drcalo_core::{
    contributions_name, graph, provenance, Collection, Detector, Diagnostics, EventHeader, Frame,
    HitAggregator, HitTable, ParamValue, ParticleGraph, ParticleSet, ResolvedTable, StepRecord,
    VolumeId,
};
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;

pub use drcalo_core::{EVENT_HEADER, MC_PARTICLES};

/// Event parameter carrying the event weight
pub const EVENT_WEIGHTS: &str = "EventWeights";

/// Lifecycle phase of an event context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Idle,
    Accumulating,
    GraphBuilt,
    Committed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Idle => "idle",
            Phase::Accumulating => "accumulating",
            Phase::GraphBuilt => "graph-built",
            Phase::Committed => "committed",
        };
        f.write_str(name)
    }
}

/// State of one event from its first step to its committed frame
pub struct EventContext {
    detector: Arc<Detector>,
    phase: Phase,
    event_number: i32,
    tables: IndexMap<VolumeId, HitTable>,
    particles: ParticleSet,
    graph: Option<ParticleGraph>,
    resolved: Vec<ResolvedTable>,
    parameters: IndexMap<String, ParamValue>,
    diagnostics: Diagnostics,
}

impl EventContext {
    /// Create an idle context with one empty hit table per detector volume
    pub fn new(detector: Arc<Detector>) -> Self {
        let tables = detector
            .volumes()
            .map(|v| (v.name.clone(), HitTable::new(v.name.clone(), v.kind)))
            .collect();
        Self {
            detector,
            phase: Phase::Idle,
            event_number: 0,
            tables,
            particles: ParticleSet::new(),
            graph: None,
            resolved: Vec::new(),
            parameters: IndexMap::new(),
            diagnostics: Diagnostics::new(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn event_number(&self) -> i32 {
        self.event_number
    }

    pub fn detector(&self) -> &Detector {
        &self.detector
    }

    fn expect_phase(&self, expected: Phase, operation: &'static str) -> Result<()> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(Error::invalid_phase(operation, self.phase))
        }
    }

    // ========================================================================
    // Accumulation
    // ========================================================================

    /// Start a new event; all per-event containers are cleared
    pub fn begin(&mut self, event_number: i32) -> Result<()> {
        self.expect_phase(Phase::Idle, "begin an event")?;
        self.clear();
        self.event_number = event_number;
        self.phase = Phase::Accumulating;
        tracing::debug!(event = event_number, "event accumulating");
        Ok(())
    }

    /// Feed one step of `volume` to its hit table
    ///
    /// Returns whether the step touched a hit.
    pub fn on_step(&mut self, volume: &VolumeId, step: &StepRecord) -> Result<bool> {
        self.expect_phase(Phase::Accumulating, "process a step")?;
        let detector = &self.detector;
        let sensitive = detector
            .volume(volume)
            .ok_or_else(|| drcalo_core::Error::UnknownVolume(volume.clone()))?;
        let table = self
            .tables
            .get_mut(volume)
            .ok_or_else(|| drcalo_core::Error::UnknownVolume(volume.clone()))?;

        HitAggregator::new(sensitive, detector.resolver(), table)
            .on_step(step)
            .map_err(|e| {
                tracing::error!(event = self.event_number, volume = %volume, error = %e, "step aborted event");
                Error::from(e)
            })
    }

    /// Feed a batch of steps of one volume
    pub fn on_steps<'s>(
        &mut self,
        volume: &VolumeId,
        steps: impl IntoIterator<Item = &'s StepRecord>,
    ) -> Result<usize> {
        let mut touched = 0;
        for step in steps {
            if self.on_step(volume, step)? {
                touched += 1;
            }
        }
        Ok(touched)
    }

    /// Hand over the event's particle snapshot, replacing any earlier one
    pub fn set_particles(&mut self, particles: ParticleSet) -> Result<()> {
        self.expect_phase(Phase::Accumulating, "set particles")?;
        self.particles = particles;
        Ok(())
    }

    /// Attach an event parameter to the frame
    pub fn set_parameter(&mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Result<()> {
        if matches!(self.phase, Phase::Idle | Phase::Committed) {
            return Err(Error::invalid_phase("set a parameter", self.phase));
        }
        self.parameters.insert(name.into(), value.into());
        Ok(())
    }

    pub fn table(&self, volume: &VolumeId) -> Option<&HitTable> {
        self.tables.get(volume)
    }

    pub fn tables(&self) -> impl Iterator<Item = &HitTable> {
        self.tables.values()
    }

    pub fn particles(&self) -> &ParticleSet {
        &self.particles
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    // ========================================================================
    // Graph and provenance
    // ========================================================================

    /// Build the particle graph, then resolve every hit table against it
    ///
    /// Runs exactly once per event, after all steps are in.
    pub fn build_graph(&mut self) -> Result<()> {
        self.expect_phase(Phase::Accumulating, "build the particle graph")?;

        let graph = graph::build(&self.particles, &mut self.diagnostics);
        self.resolved = self
            .tables
            .values()
            .map(|table| {
                provenance::resolve_table(table, &graph.ids, &self.particles, &mut self.diagnostics)
            })
            .collect();
        self.graph = Some(graph);
        self.phase = Phase::GraphBuilt;

        tracing::debug!(
            event = self.event_number,
            volumes = self.resolved.len(),
            diagnostics = self.diagnostics.len(),
            "graph built"
        );
        Ok(())
    }

    pub fn graph(&self) -> Option<&ParticleGraph> {
        self.graph.as_ref()
    }

    pub fn resolved(&self) -> &[ResolvedTable] {
        &self.resolved
    }

    // ========================================================================
    // Serialization
    // ========================================================================

    /// Serialize the event into one frame
    ///
    /// Collections are written in a fixed order: header, particles, then per
    /// volume its hits followed by their contributions. The header weight is
    /// taken from the `EventWeights` parameter when set and is 0.0 otherwise.
    pub fn serialize(&mut self, run_number: i32, config: &CommitConfig) -> Result<Frame> {
        self.expect_phase(Phase::GraphBuilt, "serialize")?;

        let mut frame = Frame::new();
        let weight = self
            .parameters
            .get(EVENT_WEIGHTS)
            .and_then(ParamValue::as_f64)
            .unwrap_or(0.0);
        let header = EventHeader {
            run_number: config.run_number(run_number),
            event_number: config.event_number(self.event_number),
            time_stamp: chrono::Utc::now().timestamp().max(0) as u64,
            weight,
        };
        frame.put(EVENT_HEADER, Collection::EventHeader(vec![header]));

        let particles = self.graph.take().map(|g| g.particles).unwrap_or_default();
        frame.put(MC_PARTICLES, Collection::McParticles(particles));

        for table in &self.resolved {
            let collections = serialize_table(table, config.average_time);
            frame.put(table.volume.as_str(), collections.hits);
            frame.put(contributions_name(table.volume.as_str()), collections.contributions);
        }

        for (name, value) in &config.event_parameters_int {
            frame.put_parameter(name.as_str(), *value);
        }
        for (name, value) in &config.event_parameters_float {
            frame.put_parameter(name.as_str(), *value);
        }
        for (name, value) in &config.event_parameters_string {
            frame.put_parameter(name.as_str(), value.as_str());
        }
        for (name, value) in &self.parameters {
            frame.put_parameter(name.as_str(), value.clone());
        }

        self.phase = Phase::Committed;
        Ok(frame)
    }

    /// Drop all per-event state and return to idle
    ///
    /// Valid in any phase; an aborted event is discarded this way.
    pub fn reset(&mut self) {
        self.clear();
        self.phase = Phase::Idle;
    }

    fn clear(&mut self) {
        for table in self.tables.values_mut() {
            table.clear();
        }
        self.particles.clear();
        self.graph = None;
        self.resolved.clear();
        self.parameters.clear();
        self.diagnostics.clear();
    }
}

impl fmt::Debug for EventContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventContext")
            .field("phase", &self.phase)
            .field("event_number", &self.event_number)
            .field("tables", &self.tables.len())
            .field("particles", &self.particles.len())
            .field("diagnostics", &self.diagnostics.len())
            .finish()
    }
}
