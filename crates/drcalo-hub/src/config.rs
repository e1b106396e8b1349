//! Commit Configuration - worker count, committer queue and output metadata
//!
//! Everything the orchestrator needs besides the detector and the sink:
//! how many events run in parallel, how far the committer may fall behind,
//! which section event frames go to, the number offsets, and the constant
//! parameters stamped on every run and event frame.
//!
//! The configuration is plain serde data and can be loaded from RON:
//!
//! ```
//! use drcalo_hub::CommitConfig;
//!
//! let config = CommitConfig::from_ron_str(r#"(
//!     section_name: "events",
//!     run_number_offset: 100,
//!     event_parameters_int: { "beamPolarization": 1 },
//! )"#).unwrap();
//!
//! assert_eq!(config.run_number_offset, 100);
//! assert_eq!(config.worker_count(), 1);
//! ```

use crate::error::{Error, Result};
use crate::serialize::AverageTimePolicy;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default section of event frames
pub const EVENTS_SECTION: &str = "events";

/// Configuration for the commit orchestrator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommitConfig {
    /// Number of events processed concurrently by `process_events`
    ///
    /// Clamped to `[1, max_cores()]`.
    worker_count: usize,

    /// Frames the committer queue holds before submitters block
    pub queue_depth: usize,

    /// Section event frames are written to
    pub section_name: String,

    /// Added to the run number when positive
    pub run_number_offset: i32,

    /// Added to every event number when positive
    pub event_number_offset: i32,

    /// Whether each run gets its own output file
    pub files_by_run: bool,

    /// Output file the sink is created for, if file backed
    pub output: Option<PathBuf>,

    /// How average photon times are written for empty channels
    pub average_time: AverageTimePolicy,

    /// Constant entries of every run frame
    pub run_header: IndexMap<String, String>,

    /// Constant integer parameters of every event frame
    pub event_parameters_int: IndexMap<String, i32>,

    /// Constant float parameters of every event frame
    pub event_parameters_float: IndexMap<String, f32>,

    /// Constant string parameters of every event frame
    pub event_parameters_string: IndexMap<String, String>,
}

impl CommitConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a configuration with the given worker count
    ///
    /// The count is clamped to `[1, max_cores()]`.
    ///
    /// ```
    /// use drcalo_hub::CommitConfig;
    ///
    /// let config = CommitConfig::with_worker_count(4);
    /// assert_eq!(config.worker_count(), 4.min(drcalo_hub::max_cores()));
    /// ```
    pub fn with_worker_count(worker_count: usize) -> Self {
        let mut config = Self::default();
        config.set_worker_count(worker_count);
        config
    }

    /// Parse a RON document; missing fields take their defaults
    pub fn from_ron_str(text: &str) -> Result<Self> {
        let mut config: CommitConfig =
            ron::from_str(text).map_err(|e| Error::Config(e.to_string()))?;
        config.set_worker_count(config.worker_count);
        config.queue_depth = config.queue_depth.max(1);
        Ok(config)
    }

    /// Render as pretty RON
    pub fn to_ron_string(&self) -> Result<String> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| Error::Config(e.to_string()))
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Set the worker count, clamped to `[1, max_cores()]`
    pub fn set_worker_count(&mut self, n: usize) {
        self.worker_count = n.clamp(1, max_cores());
    }

    pub fn is_single_worker(&self) -> bool {
        self.worker_count == 1
    }

    /// Run number as written, offset applied
    pub fn run_number(&self, run: i32) -> i32 {
        with_offset(run, self.run_number_offset)
    }

    /// Event number as written, offset applied
    pub fn event_number(&self, event: i32) -> i32 {
        with_offset(event, self.event_number_offset)
    }
}

impl Default for CommitConfig {
    fn default() -> Self {
        Self {
            worker_count: 1,
            queue_depth: 16,
            section_name: EVENTS_SECTION.to_string(),
            run_number_offset: 0,
            event_number_offset: 0,
            files_by_run: false,
            output: None,
            average_time: AverageTimePolicy::default(),
            run_header: IndexMap::new(),
            event_parameters_int: IndexMap::new(),
            event_parameters_float: IndexMap::new(),
            event_parameters_string: IndexMap::new(),
        }
    }
}

// Offsets only ever shift numbers up; zero and negative offsets are ignored.
fn with_offset(number: i32, offset: i32) -> i32 {
    if offset > 0 {
        number + offset
    } else {
        number
    }
}

/// Get the maximum available cores on this system
///
/// ```
/// assert!(drcalo_hub::max_cores() >= 1);
/// ```
pub fn max_cores() -> usize {
    num_cpus::get()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let config = CommitConfig::default();
        assert!(config.is_single_worker());
        assert_eq!(config.section_name, "events");
        assert_eq!(config.average_time, AverageTimePolicy::Zero);
        assert!(!config.files_by_run);
    }

    #[test]
    fn test_worker_count_clamped() {
        assert_eq!(CommitConfig::with_worker_count(0).worker_count(), 1);
        assert_eq!(
            CommitConfig::with_worker_count(10000).worker_count(),
            max_cores()
        );

        let mut config = CommitConfig::default();
        config.set_worker_count(2);
        assert_eq!(config.worker_count(), 2.min(max_cores()));
    }

    #[test]
    fn test_offsets_only_when_positive() {
        let mut config = CommitConfig::default();
        assert_eq!(config.run_number(3), 3);

        config.run_number_offset = 1000;
        config.event_number_offset = -5;
        assert_eq!(config.run_number(3), 1003);
        assert_eq!(config.event_number(7), 7);
    }

    #[test]
    fn test_from_ron() {
        let config = CommitConfig::from_ron_str(
            r#"(
                worker_count: 0,
                queue_depth: 0,
                section_name: "sim",
                files_by_run: true,
                output: Some("out.ron"),
                average_time: Omit,
                run_header: { "detector": "SCEPCal" },
                event_parameters_float: { "sqrtS": 240.0 },
            )"#,
        )
        .unwrap();

        assert_eq!(config.worker_count(), 1);
        assert_eq!(config.queue_depth, 1);
        assert_eq!(config.section_name, "sim");
        assert!(config.files_by_run);
        assert_eq!(config.output, Some(PathBuf::from("out.ron")));
        assert_eq!(config.average_time, AverageTimePolicy::Omit);
        assert_eq!(config.run_header["detector"], "SCEPCal");
        assert_eq!(config.event_parameters_float["sqrtS"], 240.0);
    }

    #[test]
    fn test_from_ron_invalid() {
        let result = CommitConfig::from_ron_str("(section_name: 5)");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_ron_roundtrip() {
        let mut config = CommitConfig::default();
        config.run_header.insert("a".into(), "b".into());
        let text = config.to_ron_string().unwrap();
        assert_eq!(CommitConfig::from_ron_str(&text).unwrap(), config);
    }
}
