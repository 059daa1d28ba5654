//! One counting run over a whole video, with its JSON summary.

use std::fmt::Display;
use std::fs::File;
use std::io::{BufRead, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::counter::{CountingLine, CrossingEvent, FrameReport};
use crate::error::Result;
use crate::integration::{CountingPipeline, DetectionSource, ReplayDetector};
use crate::tally::TallySnapshot;
use crate::tracker::{ByteTracker, IdentityTracker};

/// What a finished run reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Frames handed to the pipeline, skipped ones included
    pub frames: u64,
    pub line: CountingLine,
    pub tally: TallySnapshot,
    pub crossings: Vec<CrossingEvent>,
    /// Indices of frames whose detection failed and was skipped
    pub skipped_frames: Vec<u64>,
}

impl RunSummary {
    pub fn to_writer(&self, writer: impl Write) -> Result<()> {
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        self.to_writer(&mut writer)?;
        writer.flush()?;
        Ok(())
    }
}

/// A [`CountingPipeline`] plus the bookkeeping of one run.
pub struct CountingSession<D: DetectionSource, T: IdentityTracker = ByteTracker> {
    pipeline: CountingPipeline<D, T>,
    summary: RunSummary,
    skip_failed: bool,
}

impl<D: DetectionSource, T: IdentityTracker> CountingSession<D, T>
where
    D::Error: Display,
{
    /// With `skip_failed`, a frame whose detection fails is logged and
    /// recorded instead of ending the run.
    pub fn new(pipeline: CountingPipeline<D, T>, skip_failed: bool) -> Self {
        let counter = pipeline.counter();
        let summary = RunSummary {
            frames: 0,
            line: counter.line(),
            tally: counter.snapshot(),
            crossings: Vec::new(),
            skipped_frames: Vec::new(),
        };
        Self {
            pipeline,
            summary,
            skip_failed,
        }
    }

    /// Run one frame through the pipeline.
    ///
    /// Returns `Ok(None)` for a failed frame that was skipped.
    pub fn step(
        &mut self,
        input: &[u8],
        width: u32,
        height: u32,
    ) -> Result<Option<FrameReport>, D::Error> {
        let frame_index = self.pipeline.frames_processed();
        self.summary.frames += 1;

        match self.pipeline.process_frame(input, width, height) {
            Ok(report) => {
                self.summary.crossings.extend(report.crossings.iter().cloned());
                self.summary.tally.clone_from(&report.tally);
                Ok(Some(report))
            }
            Err(err) if self.skip_failed => {
                warn!(frame_index, error = %err, "detection failed, skipping frame");
                self.summary.skipped_frames.push(frame_index);
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    pub fn pipeline(&self) -> &CountingPipeline<D, T> {
        &self.pipeline
    }

    pub fn summary(&self) -> &RunSummary {
        &self.summary
    }

    pub fn into_summary(self) -> RunSummary {
        self.summary
    }
}

impl<R: BufRead, T: IdentityTracker> CountingSession<ReplayDetector<R>, T> {
    /// Play recorded detections without pixels.
    ///
    /// Runs `frames` frames when given, otherwise until the last recorded
    /// line has been consumed.
    pub fn run_recorded(&mut self, frames: Option<u64>, width: u32, height: u32) -> Result<()> {
        loop {
            let done = match frames {
                Some(limit) => self.pipeline.frames_processed() >= limit,
                None => self.pipeline.detector_mut().is_exhausted()?,
            };
            if done {
                return Ok(());
            }
            self.step(&[], width, height)?;
        }
    }
}
