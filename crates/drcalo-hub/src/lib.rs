//! drcalo Hub - Event commit orchestration
//!
//! This crate drives per-event processing on top of `drcalo-core` and owns
//! the one writer that persists frames.
//!
//! ## Architecture
//!
//! ```text
//! Orchestrator (detector + config)
//!  │
//!  ├── EventContext[] ← one per event in flight, never shared
//!  │    └── HitTable per volume, ParticleSet, ParticleGraph
//!  │
//!  └── Committer ← single owner of the FrameSink
//!       └── bounded queue of (section, Frame)
//! ```
//!
//! ## Key Components
//!
//! - [`Orchestrator`]: run lifecycle, event commit, parallel event driver
//! - [`EventContext`]: per-event state machine `Idle → Accumulating → GraphBuilt → Committed`
//! - [`Committer`]: background thread writing frames one at a time
//! - [`CommitConfig`]: worker count, offsets and constant frame parameters
//!
//! ## Design Principles
//!
//! 1. **Events never share state** - a hit table belongs to exactly one context
//! 2. **One writer** - only the committer thread touches the sink
//! 3. **drcalo-core stays single-threaded** - all threading lives here

pub mod committer;
mod config;
mod error;
pub mod event;
mod orchestrator;
pub mod serialize;

pub use committer::Committer;
pub use config::{max_cores, CommitConfig, EVENTS_SECTION};
pub use error::{Error, Result};
pub use event::{EventContext, Phase};
pub use orchestrator::{EventInput, Orchestrator, METADATA_SECTION, RUNS_SECTION};
pub use serialize::AverageTimePolicy;
