//! Single-owner frame committer
//!
//! The committer thread is the only code that ever touches the sink.
//! Producers hand finished frames over a bounded channel; the thread writes
//! them one at a time, in arrival order. A full queue blocks the submitter,
//! which is the only back-pressure in the pipeline.
//!
//! A failed write stops the thread. Every later submit sees
//! [`Error::SinkClosed`], and [`Committer::finish`] returns the write error.

use crate::error::{Error, Result};
use drcalo_core::{Frame, FrameSink};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, SyncSender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

struct Envelope {
    section: String,
    frame: Frame,
}

/// Handle to the committer thread owning a sink of type `S`
pub struct Committer<S: FrameSink + 'static> {
    sender: Option<SyncSender<Envelope>>,
    handle: Option<JoinHandle<Result<S>>>,
    written: Arc<AtomicU64>,
}

impl<S: FrameSink + 'static> Committer<S> {
    /// Move `sink` onto a new committer thread
    ///
    /// `queue_depth` frames may wait before submitters block (at least 1).
    pub fn spawn(mut sink: S, queue_depth: usize) -> Self {
        let (sender, receiver) = mpsc::sync_channel::<Envelope>(queue_depth.max(1));
        let written = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&written);

        let handle = thread::spawn(move || {
            for envelope in receiver {
                if let Err(e) = sink.write_frame(&envelope.section, &envelope.frame) {
                    tracing::error!(section = %envelope.section, error = %e, "frame write failed, committer stopping");
                    return Err(Error::from(e));
                }
                counter.fetch_add(1, Ordering::Relaxed);
            }
            sink.finish()?;
            Ok(sink)
        });

        Self {
            sender: Some(sender),
            handle: Some(handle),
            written,
        }
    }

    /// Queue a frame for writing
    pub fn submit(&self, section: impl Into<String>, frame: Frame) -> Result<()> {
        let sender = self.sender.as_ref().ok_or(Error::SinkClosed)?;
        sender
            .send(Envelope {
                section: section.into(),
                frame,
            })
            .map_err(|_| Error::SinkClosed)
    }

    /// Frames written so far
    pub fn written(&self) -> u64 {
        self.written.load(Ordering::Relaxed)
    }

    /// Drain the queue, finish the sink and hand it back
    pub fn finish(mut self) -> Result<S> {
        self.sender.take();
        let handle = self.handle.take().ok_or(Error::SinkClosed)?;
        handle.join().map_err(|_| Error::Panicked("committer"))?
    }
}

impl<S: FrameSink + 'static> Drop for Committer<S> {
    fn drop(&mut self) {
        self.sender.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drcalo_core::{MemorySink, ParamValue};

    fn frame(n: i64) -> Frame {
        let mut frame = Frame::new();
        frame.put_parameter("n", n);
        frame
    }

    /// Fails on the write with the given index
    struct FailingSink {
        fail_at: usize,
        inner: MemorySink,
    }

    impl FrameSink for FailingSink {
        fn write_frame(&mut self, section: &str, frame: &Frame) -> drcalo_core::Result<()> {
            if self.inner.len() == self.fail_at {
                return Err(drcalo_core::Error::Sink("disk full".into()));
            }
            self.inner.write_frame(section, frame)
        }
    }

    #[test]
    fn test_frames_written_in_order() {
        let committer = Committer::spawn(MemorySink::new(), 2);
        for n in 0..10 {
            committer.submit("events", frame(n)).unwrap();
        }
        let sink = committer.finish().unwrap();

        assert!(sink.is_finished());
        let ns: Vec<Option<i64>> = sink
            .frames()
            .iter()
            .map(|(_, f)| f.parameter("n").and_then(ParamValue::as_int))
            .collect();
        assert_eq!(ns, (0..10).map(Some).collect::<Vec<_>>());
    }

    #[test]
    fn test_concurrent_submitters() {
        let committer = Committer::spawn(MemorySink::new(), 1);
        thread::scope(|scope| {
            for worker in 0..4 {
                let committer = &committer;
                scope.spawn(move || {
                    for n in 0..25 {
                        committer.submit("events", frame(worker * 100 + n)).unwrap();
                    }
                });
            }
        });
        assert_eq!(committer.finish().unwrap().len(), 100);
    }

    #[test]
    fn test_write_error_closes_sink() {
        let sink = FailingSink {
            fail_at: 1,
            inner: MemorySink::new(),
        };
        let committer = Committer::spawn(sink, 1);
        committer.submit("events", frame(0)).unwrap();
        committer.submit("events", frame(1)).unwrap();

        // The thread stops after the failed write; later submits fail once
        // the queue is gone.
        let mut closed = false;
        for n in 2..100 {
            if let Err(e) = committer.submit("events", frame(n)) {
                assert!(matches!(e, Error::SinkClosed));
                closed = true;
                break;
            }
            thread::sleep(std::time::Duration::from_millis(1));
        }
        assert!(closed);
        assert_eq!(committer.written(), 1);
        assert!(matches!(
            committer.finish(),
            Err(Error::Core(drcalo_core::Error::Sink(_)))
        ));
    }
}
