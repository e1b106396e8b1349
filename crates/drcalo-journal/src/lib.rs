//! drcalo Journal - Frame persistence and export
//!
//! This crate provides concrete [`FrameSink`](drcalo_core::FrameSink)
//! implementations and the tools to look at what they wrote:
//!
//! - **RonStreamSink**: one `(section, frame)` RON line per committed frame
//! - **JsonLinesSink**: the same as JSON lines (`serde_json` feature)
//! - **run_output_path**: per-run output file naming
//! - **read_frames**: read a RON stream back
//! - **Exporter**: summarize frames as text, CSV, RON or JSON
//!
//! # Example
//!
//! ```rust,ignore
//! use drcalo_hub::{CommitConfig, Orchestrator};
//! use drcalo_journal::{run_output_path, Exporter, RonStreamSink};
//!
//! let mut config = CommitConfig::default();
//! config.output = Some("sim.ron".into());
//! config.files_by_run = true;
//! let path = run_output_path("sim.ron", 7, true);
//!
//! let sink = RonStreamSink::for_run(&config, 7)?;
//! let mut orchestrator = Orchestrator::new(detector, config);
//! orchestrator.begin_run(7, sink)?;
//! orchestrator.process_events(inputs)?;
//! orchestrator.end_run(Default::default())?;
//!
//! let frames = drcalo_journal::read_frames(std::io::BufReader::new(std::fs::File::open(&path)?))?;
//! println!("{}", Exporter::new(&frames).to_text());
//! ```

mod error;
mod exporter;
mod path;
mod reader;
mod sink;

pub use error::{Error, Result};
pub use exporter::{ExportFormat, ExportStats, Exporter};
pub use path::run_output_path;
pub use reader::{read_frames, section};
#[cfg(feature = "serde_json")]
pub use sink::JsonLinesSink;
pub use sink::RonStreamSink;
