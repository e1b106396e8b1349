//! Export frames to various formats

use crate::{Error, Result};
use drcalo_core::{Collection, Frame};
use serde::Serialize;
use std::io::Write;

/// Export format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// RON format (Rust Object Notation)
    Ron,
    /// JSON format (requires serde_json feature)
    Json,
    /// CSV format (hits only)
    Csv,
    /// Human-readable text format
    Text,
}

/// Exporter for committed frames
pub struct Exporter<'a> {
    frames: &'a [(String, Frame)],
}

impl<'a> Exporter<'a> {
    pub fn new(frames: &'a [(String, Frame)]) -> Self {
        Self { frames }
    }

    /// Export to a string in the specified format
    pub fn export(&self, format: ExportFormat) -> Result<String> {
        match format {
            ExportFormat::Ron => self.to_ron(),
            ExportFormat::Json => self.to_json(),
            ExportFormat::Csv => Ok(self.to_csv()),
            ExportFormat::Text => Ok(self.to_text()),
        }
    }

    /// Export to a writer
    pub fn export_to<W: Write>(&self, writer: &mut W, format: ExportFormat) -> Result<()> {
        let content = self.export(format)?;
        writer
            .write_all(content.as_bytes())
            .map_err(|e| Error::ExportError(e.to_string()))?;
        Ok(())
    }

    pub fn stats(&self) -> ExportStats {
        let mut stats = ExportStats {
            frames: self.frames.len(),
            ..ExportStats::default()
        };
        for (_, frame) in self.frames {
            if frame.event_header().is_some() {
                stats.events += 1;
            }
            for (_, collection) in frame.collections() {
                match collection {
                    Collection::McParticles(v) => stats.particles += v.len(),
                    Collection::DrCalorimeterHits(v) => stats.hits += v.len(),
                    Collection::CalorimeterHits(v) => stats.hits += v.len(),
                    Collection::Contributions(v) => stats.contributions += v.len(),
                    Collection::EventHeader(_) => {}
                }
            }
        }
        stats
    }

    /// Export to RON format
    pub fn to_ron(&self) -> Result<String> {
        ron::ser::to_string_pretty(&self.export_data(), ron::ser::PrettyConfig::default())
            .map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Export to JSON format
    #[cfg(feature = "serde_json")]
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.export_data())
            .map_err(|e| Error::Serialization(e.to_string()))
    }

    #[cfg(not(feature = "serde_json"))]
    pub fn to_json(&self) -> Result<String> {
        Err(Error::ExportError(
            "JSON export requires the 'serde_json' feature".to_string(),
        ))
    }

    /// One row per hit of every event frame
    pub fn to_csv(&self) -> String {
        let mut output = String::new();
        output.push_str(
            "event,collection,cell_id,energy,n_cerenkov,n_scintillation,t_avg_cerenkov,t_avg_scintillation,contributions\n",
        );

        let optional = |v: Option<f32>| v.map(|t| t.to_string()).unwrap_or_default();
        for (_, frame) in self.frames {
            let Some(header) = frame.event_header() else {
                continue;
            };
            for (name, collection) in frame.collections() {
                match collection {
                    Collection::DrCalorimeterHits(hits) => {
                        for hit in hits {
                            output.push_str(&format!(
                                "{},{},{},{},{},{},{},{},{}\n",
                                header.event_number,
                                name,
                                hit.cell_id,
                                hit.energy,
                                hit.n_cerenkov_prod,
                                hit.n_scintillation_prod,
                                optional(hit.t_avg_cerenkov),
                                optional(hit.t_avg_scintillation),
                                hit.contributions().len()
                            ));
                        }
                    }
                    Collection::CalorimeterHits(hits) => {
                        for hit in hits {
                            output.push_str(&format!(
                                "{},{},{},{},,,,,{}\n",
                                header.event_number,
                                name,
                                hit.cell_id,
                                hit.energy,
                                hit.contributions().len()
                            ));
                        }
                    }
                    _ => {}
                }
            }
        }
        output
    }

    /// Export to human-readable text format
    pub fn to_text(&self) -> String {
        let mut output = String::new();
        let stats = self.stats();

        output.push_str("=== Frame Export ===\n\n");
        output.push_str(&format!("Frames: {}\n", stats.frames));
        output.push_str(&format!("Events: {}\n", stats.events));
        output.push_str(&format!("Particles: {}\n", stats.particles));
        output.push_str(&format!("Hits: {}\n", stats.hits));
        output.push_str(&format!("Contributions: {}\n", stats.contributions));

        output.push_str("\n=== Frames ===\n");

        for (section, frame) in self.frames {
            match frame.event_header() {
                Some(h) => output.push_str(&format!(
                    "\n--- {} run {} event {} ---\n",
                    section, h.run_number, h.event_number
                )),
                None => output.push_str(&format!("\n--- {} ---\n", section)),
            }
            for (name, collection) in frame.collections() {
                output.push_str(&format!(
                    "  {} [{}] x{}\n",
                    name,
                    collection.type_name(),
                    collection.len()
                ));
            }
            for (name, value) in frame.parameters() {
                output.push_str(&format!("  [PARAM] {}={}\n", name, value));
            }
        }

        output
    }

    fn export_data(&self) -> ExportData<'a> {
        ExportData {
            version: 1,
            stats: self.stats(),
            frames: self.frames,
        }
    }
}

/// Totals over the exported frames
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExportStats {
    pub frames: usize,
    pub events: usize,
    pub particles: usize,
    pub hits: usize,
    pub contributions: usize,
}

#[derive(Debug, Serialize)]
struct ExportData<'a> {
    version: u32,
    stats: ExportStats,
    frames: &'a [(String, Frame)],
}
