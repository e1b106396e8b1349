//! Stream sinks writing one frame per line
//!
//! Each committed frame becomes one line holding the tuple
//! `(section, frame)`. The stream is append-only and can be read back with
//! [`read_frames`](crate::read_frames).

use crate::{run_output_path, Error, Result};
use drcalo_core::{Frame, FrameSink};
use drcalo_hub::CommitConfig;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Writes frames as RON, one document per line
#[derive(Debug)]
pub struct RonStreamSink<W: Write + Send> {
    writer: W,
    frames: u64,
}

impl<W: Write + Send> RonStreamSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, frames: 0 }
    }

    /// Frames written so far
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_line(&mut self, section: &str, frame: &Frame) -> Result<()> {
        let line =
            ron::to_string(&(section, frame)).map_err(|e| Error::Serialization(e.to_string()))?;
        writeln!(self.writer, "{}", line)?;
        self.frames += 1;
        Ok(())
    }
}

impl RonStreamSink<BufWriter<File>> {
    /// Create (or truncate) a buffered file sink
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::create(path)?;
        tracing::info!(path = %path.display(), "opened RON frame stream");
        Ok(Self::new(BufWriter::new(file)))
    }

    /// Open the output file of `run` as named by the commit configuration
    ///
    /// The file is `config.output`, tagged with the run number (offset
    /// applied) when `config.files_by_run` is set.
    pub fn for_run(config: &CommitConfig, run: i32) -> Result<Self> {
        let base = config.output.as_ref().ok_or(Error::NoOutputPath)?;
        Self::create(run_output_path(base, config.run_number(run), config.files_by_run))
    }
}

impl<W: Write + Send> FrameSink for RonStreamSink<W> {
    fn write_frame(&mut self, section: &str, frame: &Frame) -> drcalo_core::Result<()> {
        self.write_line(section, frame)?;
        Ok(())
    }

    fn finish(&mut self) -> drcalo_core::Result<()> {
        self.writer.flush().map_err(Error::from)?;
        tracing::debug!(frames = self.frames, "RON frame stream closed");
        Ok(())
    }
}

/// Writes frames as JSON, one object per line
#[cfg(feature = "serde_json")]
#[derive(Debug)]
pub struct JsonLinesSink<W: Write + Send> {
    writer: W,
    frames: u64,
}

#[cfg(feature = "serde_json")]
impl<W: Write + Send> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, frames: 0 }
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

#[cfg(feature = "serde_json")]
impl JsonLinesSink<BufWriter<File>> {
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::create(path.as_ref())?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

#[cfg(feature = "serde_json")]
impl<W: Write + Send> FrameSink for JsonLinesSink<W> {
    fn write_frame(&mut self, section: &str, frame: &Frame) -> drcalo_core::Result<()> {
        let line = serde_json::to_string(&(section, frame))
            .map_err(|e| Error::Serialization(e.to_string()))?;
        writeln!(self.writer, "{}", line).map_err(Error::from)?;
        self.frames += 1;
        Ok(())
    }

    fn finish(&mut self) -> drcalo_core::Result<()> {
        self.writer.flush().map_err(Error::from)?;
        Ok(())
    }
}
