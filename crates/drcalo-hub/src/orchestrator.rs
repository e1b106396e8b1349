//! Orchestrator - run lifecycle and event commit
//!
//! The orchestrator owns the detector description and the configuration,
//! and, while a run is open, the committer holding the sink. Events are
//! processed on caller-owned [`EventContext`]s; committing one serializes
//! it and hands the frame to the committer.
//!
//! ## Run Lifecycle
//!
//! ```text
//! begin_run(run, sink)
//!   ├── begin_event ─► on_step* ─► end_event_and_commit   (any number, any thread)
//!   └── process_events(inputs)                            (worker_count threads)
//! end_run(parameters) ─► "runs" frame, "metadata" frame ─► sink
//! ```

use crate::committer::Committer;
use crate::config::CommitConfig;
use crate::error::{Error, Result};
use crate::event::{EventContext, Phase};
use drcalo_core::{Detector, Frame, FrameSink, ParamValue, ParticleSet, StepRecord, VolumeId};
use indexmap::IndexMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

/// Section of the run frame
pub const RUNS_SECTION: &str = "runs";
/// Section of the metadata frame
pub const METADATA_SECTION: &str = "metadata";

/// Everything needed to process one event without interaction
#[derive(Debug, Clone, Default)]
pub struct EventInput {
    pub event_number: i32,
    /// Steps in arrival order, tagged with their volume
    pub steps: Vec<(VolumeId, StepRecord)>,
    pub particles: ParticleSet,
    pub parameters: IndexMap<String, ParamValue>,
}

impl EventInput {
    pub fn new(event_number: i32) -> Self {
        Self {
            event_number,
            ..Self::default()
        }
    }

    pub fn with_step(mut self, volume: impl Into<VolumeId>, step: StepRecord) -> Self {
        self.steps.push((volume.into(), step));
        self
    }

    pub fn with_particles(mut self, particles: ParticleSet) -> Self {
        self.particles = particles;
        self
    }

    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }
}

struct OpenRun<S: FrameSink + 'static> {
    run_number: i32,
    committer: Committer<S>,
    /// Event frames handed to the committer
    events: AtomicU64,
}

/// Coordinates events of a run and the single committer writing them
pub struct Orchestrator<S: FrameSink + 'static> {
    detector: Arc<Detector>,
    config: CommitConfig,
    run: Option<OpenRun<S>>,
}

impl<S: FrameSink + 'static> Orchestrator<S> {
    pub fn new(detector: Arc<Detector>, config: CommitConfig) -> Self {
        Self {
            detector,
            config,
            run: None,
        }
    }

    pub fn config(&self) -> &CommitConfig {
        &self.config
    }

    pub fn detector(&self) -> &Arc<Detector> {
        &self.detector
    }

    /// Run number of the open run, as passed to `begin_run`
    pub fn run_number(&self) -> Option<i32> {
        self.run.as_ref().map(|r| r.run_number)
    }

    pub fn is_run_open(&self) -> bool {
        self.run.is_some()
    }

    /// Frames committed in the open run
    pub fn committed(&self) -> u64 {
        self.run.as_ref().map_or(0, |r| r.committer.written())
    }

    // ========================================================================
    // Run lifecycle
    // ========================================================================

    /// Open a run writing into `sink`
    pub fn begin_run(&mut self, run_number: i32, sink: S) -> Result<()> {
        if let Some(open) = &self.run {
            return Err(Error::RunAlreadyOpen(open.run_number));
        }
        self.run = Some(OpenRun {
            run_number,
            committer: Committer::spawn(sink, self.config.queue_depth),
            events: AtomicU64::new(0),
        });
        tracing::info!(
            run = run_number,
            detector = self.detector.name(),
            workers = self.config.worker_count(),
            "run started"
        );
        Ok(())
    }

    /// Write the run and metadata frames, close the run and return the sink
    pub fn end_run(&mut self, parameters: IndexMap<String, ParamValue>) -> Result<S> {
        let open = self.run.take().ok_or(Error::NoOpenOutput)?;

        let events = open.events.load(Ordering::Acquire);
        let submitted = open
            .committer
            .submit(RUNS_SECTION, self.run_frame(open.run_number, parameters))
            .and_then(|_| open.committer.submit(METADATA_SECTION, self.metadata_frame(events)));

        // A stopped committer reports its own write error from finish
        let written = open.committer.written();
        let sink = open.committer.finish()?;
        submitted?;
        tracing::info!(run = open.run_number, events, frames = written, "run finished");
        Ok(sink)
    }

    fn run_frame(&self, run_number: i32, parameters: IndexMap<String, ParamValue>) -> Frame {
        let mut frame = Frame::new();
        for (name, value) in &self.config.run_header {
            frame.put_parameter(name.as_str(), value.as_str());
        }
        frame.put_parameter("runNumber", self.config.run_number(run_number));
        frame.put_parameter("drcaloVersion", env!("CARGO_PKG_VERSION"));
        frame.put_parameter("detectorName", self.detector.name());
        for (name, value) in parameters {
            frame.put_parameter(name, value);
        }
        frame
    }

    /// Cell key encodings of the hit collections written during the run
    ///
    /// Every event frame carries one collection per volume, so the encodings
    /// are present exactly when at least one event was committed.
    fn metadata_frame(&self, events: u64) -> Frame {
        let mut frame = Frame::new();
        if events == 0 {
            return frame;
        }
        for volume in self.detector.volumes() {
            frame.put_parameter(
                format!("{}__CellIDEncoding", volume.name),
                volume.encoding.as_str(),
            );
        }
        frame
    }

    // ========================================================================
    // Events
    // ========================================================================

    /// Fresh idle context for this detector
    pub fn new_context(&self) -> EventContext {
        EventContext::new(Arc::clone(&self.detector))
    }

    /// Context already accumulating `event_number`
    pub fn begin_event(&self, event_number: i32) -> Result<EventContext> {
        let mut ctx = self.new_context();
        ctx.begin(event_number)?;
        Ok(ctx)
    }

    /// Build the graph if still pending, serialize, and queue the frame
    ///
    /// On success the context is reset to idle. Without an open run this
    /// fails with [`Error::NoOpenOutput`] and leaves the context as is.
    pub fn end_event_and_commit(&self, ctx: &mut EventContext) -> Result<()> {
        let Some(open) = &self.run else {
            tracing::error!(event = ctx.event_number(), "commit without open output");
            return Err(Error::NoOpenOutput);
        };

        if ctx.phase() == Phase::Accumulating {
            ctx.build_graph()?;
        }
        let frame = ctx.serialize(open.run_number, &self.config)?;
        let event = ctx.event_number();
        ctx.reset();

        open.committer
            .submit(self.config.section_name.as_str(), frame)?;
        open.events.fetch_add(1, Ordering::AcqRel);
        tracing::debug!(run = open.run_number, event, "event committed");
        Ok(())
    }

    /// Process one event from start to commit on `ctx`
    ///
    /// A failing event leaves `ctx` reset, ready for the next one.
    pub fn process_event(&self, ctx: &mut EventContext, input: EventInput) -> Result<()> {
        let result = self.run_event(ctx, input);
        if result.is_err() {
            ctx.reset();
        }
        result
    }

    fn run_event(&self, ctx: &mut EventContext, input: EventInput) -> Result<()> {
        ctx.begin(input.event_number)?;
        for (volume, step) in &input.steps {
            ctx.on_step(volume, step)?;
        }
        ctx.set_particles(input.particles)?;
        for (name, value) in input.parameters {
            ctx.set_parameter(name, value)?;
        }
        self.end_event_and_commit(ctx)
    }

    /// Process distinct events on `worker_count` threads
    ///
    /// Each worker owns one context and takes the next input from a shared
    /// queue. The first failure stops all workers from taking new events and
    /// is returned; events committed before it stay committed.
    pub fn process_events<I>(&self, inputs: I) -> Result<usize>
    where
        I: IntoIterator<Item = EventInput>,
        I::IntoIter: Send,
    {
        if self.run.is_none() {
            return Err(Error::NoOpenOutput);
        }

        let queue = &Mutex::new(inputs.into_iter());
        let failed = &AtomicBool::new(false);
        let workers = self.config.worker_count();

        let results: Vec<Result<usize>> = thread::scope(|scope| {
            let handles: Vec<_> = (0..workers)
                .map(move |_| {
                    scope.spawn(move || {
                        let mut ctx = self.new_context();
                        let mut processed = 0;
                        while !failed.load(Ordering::Acquire) {
                            let next = queue
                                .lock()
                                .map_err(|_| Error::Panicked("worker"))?
                                .next();
                            let Some(input) = next else { break };
                            if let Err(e) = self.process_event(&mut ctx, input) {
                                failed.store(true, Ordering::Release);
                                return Err(e);
                            }
                            processed += 1;
                        }
                        Ok(processed)
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().unwrap_or(Err(Error::Panicked("worker"))))
                .collect()
        });

        let mut total = 0;
        for result in results {
            total += result?;
        }
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drcalo_core::{
        CellId, Collection, MemorySink, Particle, ResolvedCell, SensitiveVolume, StepPoint,
        TouchPoint, TrackId, Vec3,
    };

    fn resolver(volume: &VolumeId, touch: &TouchPoint) -> drcalo_core::Result<ResolvedCell> {
        if touch.copy_number < 0 {
            return Err(drcalo_core::Error::cell_resolution(volume, touch, "no cell"));
        }
        Ok(ResolvedCell::new(
            CellId(touch.copy_number as u64),
            Vec3::new(0.0, 0.0, touch.copy_number as f64),
        ))
    }

    fn detector() -> Arc<Detector> {
        Arc::new(
            Detector::new("SCEPCal", resolver)
                .with_volume(SensitiveVolume::dual_readout("SCEPCalHits"))
                .unwrap()
                .with_volume(SensitiveVolume::calorimeter("TimingHits"))
                .unwrap(),
        )
    }

    fn step(cell: i32, energy: f64, track: i32) -> StepRecord {
        StepRecord {
            energy_deposit: energy,
            pre: StepPoint::new(Vec3::ZERO, 0.0),
            post: StepPoint::new(Vec3::new(0.0, 0.0, 1.0), 1.0),
            track_id: TrackId(track),
            pdg: 211,
            creator_process: None,
            step_number: 4,
            touch: TouchPoint::new(cell),
        }
    }

    fn input(event: i32) -> EventInput {
        let particles: ParticleSet = [1, 2]
            .into_iter()
            .map(|id| Particle::new(TrackId(id), 211))
            .collect();
        EventInput::new(event)
            .with_step("SCEPCalHits", step(event, 10.0, 1))
            .with_step("SCEPCalHits", step(event, 5.0, 2))
            .with_step("TimingHits", step(1, 1.0, 2))
            .with_particles(particles)
    }

    fn orchestrator(workers: usize) -> Orchestrator<MemorySink> {
        Orchestrator::new(detector(), CommitConfig::with_worker_count(workers))
    }

    #[test]
    fn test_commit_without_run_is_fatal() {
        let orch = orchestrator(1);
        let mut ctx = orch.begin_event(1).unwrap();
        ctx.on_step(&VolumeId::from("SCEPCalHits"), &step(3, 1.0, 1))
            .unwrap();

        assert!(matches!(
            orch.end_event_and_commit(&mut ctx),
            Err(Error::NoOpenOutput)
        ));
        assert_eq!(ctx.phase(), Phase::Accumulating);
    }

    #[test]
    fn test_run_lifecycle() {
        let mut orch = orchestrator(1);
        assert!(matches!(orch.end_run(IndexMap::new()), Err(Error::NoOpenOutput)));

        orch.begin_run(5, MemorySink::new()).unwrap();
        assert!(matches!(
            orch.begin_run(6, MemorySink::new()),
            Err(Error::RunAlreadyOpen(5))
        ));

        let mut ctx = orch.new_context();
        orch.process_event(&mut ctx, input(0)).unwrap();
        orch.process_event(&mut ctx, input(1)).unwrap();

        let mut params = IndexMap::new();
        params.insert("energy".to_string(), ParamValue::Double(240.0));
        let sink = orch.end_run(params).unwrap();

        let sections: Vec<&str> = sink.frames().iter().map(|(s, _)| s.as_str()).collect();
        assert_eq!(sections, vec!["events", "events", "runs", "metadata"]);
        assert!(sink.is_finished());
        assert!(!orch.is_run_open());

        let run = &sink.frames()[2].1;
        assert_eq!(run.parameter("runNumber"), Some(&ParamValue::Int(5)));
        assert_eq!(
            run.parameter("detectorName").and_then(ParamValue::as_str),
            Some("SCEPCal")
        );
        assert_eq!(run.parameter("energy"), Some(&ParamValue::Double(240.0)));

        let metadata = &sink.frames()[3].1;
        assert_eq!(
            metadata
                .parameter("SCEPCalHits__CellIDEncoding")
                .and_then(ParamValue::as_str),
            Some("system:4,eta:11,phi:11,depth:4")
        );
        assert!(metadata.parameter("TimingHits__CellIDEncoding").is_some());
    }

    #[test]
    fn test_empty_run_has_no_encodings() {
        let mut orch = orchestrator(1);
        orch.begin_run(1, MemorySink::new()).unwrap();
        let sink = orch.end_run(IndexMap::new()).unwrap();

        let sections: Vec<&str> = sink.frames().iter().map(|(s, _)| s.as_str()).collect();
        assert_eq!(sections, vec!["runs", "metadata"]);
        assert_eq!(sink.frames()[1].1.parameter_count(), 0);

        // A failed event commits nothing either
        orch.begin_run(2, MemorySink::new()).unwrap();
        let broken = input(0).with_step("SCEPCalHits", step(-1, 1.0, 1));
        assert!(orch.process_event(&mut orch.new_context(), broken).is_err());
        let sink = orch.end_run(IndexMap::new()).unwrap();
        assert_eq!(sink.section("metadata").next().unwrap().parameter_count(), 0);
    }

    #[test]
    fn test_offsets_and_section_name() {
        let mut config = CommitConfig::default();
        config.run_number_offset = 100;
        config.event_number_offset = 1000;
        config.section_name = "sim".to_string();
        config.run_header.insert("site".into(), "lab".into());
        let mut orch = Orchestrator::new(detector(), config);

        orch.begin_run(2, MemorySink::new()).unwrap();
        orch.process_event(&mut orch.new_context(), input(3)).unwrap();
        let sink = orch.end_run(IndexMap::new()).unwrap();

        let (section, event) = &sink.frames()[0];
        assert_eq!(section, "sim");
        let header = event.event_header().unwrap();
        assert_eq!(header.run_number, 102);
        assert_eq!(header.event_number, 1003);

        let run = &sink.frames()[1].1;
        assert_eq!(run.parameter("runNumber"), Some(&ParamValue::Int(102)));
        assert_eq!(run.parameter("site").and_then(ParamValue::as_str), Some("lab"));
    }

    #[test]
    fn test_empty_event_after_commit() {
        let mut orch = orchestrator(1);
        orch.begin_run(0, MemorySink::new()).unwrap();

        let mut ctx = orch.new_context();
        orch.process_event(&mut ctx, input(0)).unwrap();
        assert_eq!(ctx.phase(), Phase::Idle);
        assert!(ctx.tables().all(|t| t.is_empty()));
        assert!(ctx.particles().is_empty());

        ctx.begin(1).unwrap();
        orch.end_event_and_commit(&mut ctx).unwrap();

        let sink = orch.end_run(IndexMap::new()).unwrap();
        let empty = &sink.frames()[1].1;
        assert_eq!(empty.event_header().unwrap().event_number, 1);
        assert!(empty.particles("MCParticles").unwrap().is_empty());
        assert!(empty.dr_hits("SCEPCalHits").unwrap().is_empty());
        assert!(empty.calo_hits("TimingHits").unwrap().is_empty());
    }

    #[test]
    fn test_failed_event_keeps_prior_frames() {
        let mut orch = orchestrator(1);
        orch.begin_run(0, MemorySink::new()).unwrap();

        let mut ctx = orch.new_context();
        orch.process_event(&mut ctx, input(0)).unwrap();

        let broken = input(1).with_step("SCEPCalHits", step(-1, 1.0, 1));
        let result = orch.process_event(&mut ctx, broken);
        assert!(matches!(
            result,
            Err(Error::Core(drcalo_core::Error::CellResolution { .. }))
        ));
        assert_eq!(ctx.phase(), Phase::Idle);

        orch.process_event(&mut ctx, input(2)).unwrap();
        let sink = orch.end_run(IndexMap::new()).unwrap();

        let events: Vec<i32> = sink
            .section("events")
            .filter_map(|f| f.event_header().map(|h| h.event_number))
            .collect();
        assert_eq!(events, vec![0, 2]);
    }

    #[test]
    fn test_process_events_parallel() {
        let mut orch = orchestrator(4);
        orch.begin_run(0, MemorySink::new()).unwrap();

        let processed = orch.process_events((0..40).map(input)).unwrap();
        assert_eq!(processed, 40);

        let sink = orch.end_run(IndexMap::new()).unwrap();
        let mut events: Vec<i32> = sink
            .section("events")
            .filter_map(|f| f.event_header().map(|h| h.event_number))
            .collect();
        events.sort_unstable();
        assert_eq!(events, (0..40).collect::<Vec<_>>());

        // Each event's hits stay within its own frame
        for frame in sink.section("events") {
            let event = frame.event_header().unwrap().event_number;
            let hits = frame.dr_hits("SCEPCalHits").unwrap();
            assert_eq!(hits.len(), 1);
            assert_eq!(hits[0].cell_id, event as u64);
            assert_eq!(hits[0].contributions().len(), 2);
        }
    }

    #[test]
    fn test_process_events_stops_on_failure() {
        let mut orch = orchestrator(2);
        orch.begin_run(0, MemorySink::new()).unwrap();

        let inputs =
            (0..5).map(|n| if n == 2 { input(n).with_step("Nowhere", step(1, 1.0, 1)) } else { input(n) });
        let result = orch.process_events(inputs);
        assert!(matches!(
            result,
            Err(Error::Core(drcalo_core::Error::UnknownVolume(_)))
        ));
        assert!(orch.end_run(IndexMap::new()).is_ok());
    }

    #[test]
    fn test_deterministic_collections() {
        let collect = || {
            let mut orch = orchestrator(1);
            orch.begin_run(0, MemorySink::new()).unwrap();
            orch.process_events((0..3).map(input)).unwrap();
            let sink = orch.end_run(IndexMap::new()).unwrap();
            sink.section("events")
                .map(|f| {
                    f.collections()
                        .filter(|(name, _)| *name != "EventHeader")
                        .map(|(name, c)| (name.to_string(), c.clone()))
                        .collect::<Vec<(String, Collection)>>()
                })
                .collect::<Vec<_>>()
        };

        let first = ron::to_string(&collect()).unwrap();
        let second = ron::to_string(&collect()).unwrap();
        assert_eq!(first, second);
    }
}
