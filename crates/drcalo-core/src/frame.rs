//! Frames: named record collections plus typed parameters
//!
//! A frame is the unit handed to a [`FrameSink`]. Event frames go into the
//! configured event section, the run frame into `runs`, and the encoding
//! metadata into `metadata`. Collections and parameters keep insertion
//! order, so two identical inputs produce identical frames.

use crate::{CalorimeterHit, DrCalorimeterHit, EventHeader, HitContribution, McParticle, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Name of the header collection in event frames
pub const EVENT_HEADER: &str = "EventHeader";
/// Name of the particle collection in event frames
pub const MC_PARTICLES: &str = "MCParticles";

/// Name of the contribution collection written next to a volume's hits
pub fn contributions_name(volume: &str) -> String {
    format!("{}Contributions", volume)
}

/// A frame parameter value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParamValue {
    Int(i64),
    Float(f32),
    Double(f64),
    String(String),
}

impl ParamValue {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            ParamValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Numeric value widened to f64
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParamValue::Int(v) => Some(*v as f64),
            ParamValue::Float(v) => Some(f64::from(*v)),
            ParamValue::Double(v) => Some(*v),
            ParamValue::String(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Int(v) => write!(f, "{}", v),
            ParamValue::Float(v) => write!(f, "{}", v),
            ParamValue::Double(v) => write!(f, "{}", v),
            ParamValue::String(v) => write!(f, "{:?}", v),
        }
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Int(v)
    }
}

impl From<i32> for ParamValue {
    fn from(v: i32) -> Self {
        ParamValue::Int(i64::from(v))
    }
}

impl From<f32> for ParamValue {
    fn from(v: f32) -> Self {
        ParamValue::Float(v)
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Double(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::String(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        ParamValue::String(v)
    }
}

/// A typed collection of output records
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Collection {
    EventHeader(Vec<EventHeader>),
    McParticles(Vec<McParticle>),
    DrCalorimeterHits(Vec<DrCalorimeterHit>),
    CalorimeterHits(Vec<CalorimeterHit>),
    Contributions(Vec<HitContribution>),
}

impl Collection {
    pub fn len(&self) -> usize {
        match self {
            Collection::EventHeader(v) => v.len(),
            Collection::McParticles(v) => v.len(),
            Collection::DrCalorimeterHits(v) => v.len(),
            Collection::CalorimeterHits(v) => v.len(),
            Collection::Contributions(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Record type name, as shown in exports
    pub fn type_name(&self) -> &'static str {
        match self {
            Collection::EventHeader(_) => "EventHeader",
            Collection::McParticles(_) => "MCParticle",
            Collection::DrCalorimeterHits(_) => "DRCalorimeterHit",
            Collection::CalorimeterHits(_) => "CalorimeterHit",
            Collection::Contributions(_) => "CaloHitContribution",
        }
    }
}

/// Named collections and parameters written as one unit
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    collections: IndexMap<String, Collection>,
    parameters: IndexMap<String, ParamValue>,
}

impl Frame {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a collection; a second put under the same name replaces the first
    pub fn put(&mut self, name: impl Into<String>, collection: Collection) {
        self.collections.insert(name.into(), collection);
    }

    pub fn put_parameter(&mut self, name: impl Into<String>, value: impl Into<ParamValue>) {
        self.parameters.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&Collection> {
        self.collections.get(name)
    }

    pub fn parameter(&self, name: &str) -> Option<&ParamValue> {
        self.parameters.get(name)
    }

    pub fn collections(&self) -> impl Iterator<Item = (&str, &Collection)> {
        self.collections.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn parameters(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.parameters.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn collection_count(&self) -> usize {
        self.collections.len()
    }

    pub fn parameter_count(&self) -> usize {
        self.parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collections.is_empty() && self.parameters.is_empty()
    }

    // ========================================================================
    // Typed accessors
    // ========================================================================

    pub fn event_header(&self) -> Option<&EventHeader> {
        match self.collections.get("EventHeader") {
            Some(Collection::EventHeader(v)) => v.first(),
            _ => None,
        }
    }

    pub fn particles(&self, name: &str) -> Option<&[McParticle]> {
        match self.collections.get(name) {
            Some(Collection::McParticles(v)) => Some(v),
            _ => None,
        }
    }

    pub fn dr_hits(&self, name: &str) -> Option<&[DrCalorimeterHit]> {
        match self.collections.get(name) {
            Some(Collection::DrCalorimeterHits(v)) => Some(v),
            _ => None,
        }
    }

    pub fn calo_hits(&self, name: &str) -> Option<&[CalorimeterHit]> {
        match self.collections.get(name) {
            Some(Collection::CalorimeterHits(v)) => Some(v),
            _ => None,
        }
    }

    pub fn contributions(&self, name: &str) -> Option<&[HitContribution]> {
        match self.collections.get(name) {
            Some(Collection::Contributions(v)) => Some(v),
            _ => None,
        }
    }
}

/// Destination of committed frames
///
/// A sink is owned by exactly one committer at a time; it never sees two
/// frames concurrently. `finish` is called once, after the last frame.
pub trait FrameSink: Send {
    fn write_frame(&mut self, section: &str, frame: &Frame) -> Result<()>;

    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<S: FrameSink + ?Sized> FrameSink for Box<S> {
    fn write_frame(&mut self, section: &str, frame: &Frame) -> Result<()> {
        (**self).write_frame(section, frame)
    }

    fn finish(&mut self) -> Result<()> {
        (**self).finish()
    }
}

/// Sink keeping every frame in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    frames: Vec<(String, Frame)>,
    finished: bool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All frames in write order, with their section
    pub fn frames(&self) -> &[(String, Frame)] {
        &self.frames
    }

    /// Frames of one section in write order
    pub fn section<'a>(&'a self, section: &'a str) -> impl Iterator<Item = &'a Frame> + 'a {
        self.frames
            .iter()
            .filter(move |(s, _)| s == section)
            .map(|(_, f)| f)
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn into_frames(self) -> Vec<(String, Frame)> {
        self.frames
    }
}

impl FrameSink for MemorySink {
    fn write_frame(&mut self, section: &str, frame: &Frame) -> Result<()> {
        self.frames.push((section.to_string(), frame.clone()));
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.finished = true;
        Ok(())
    }
}
