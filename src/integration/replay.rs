//! Detector that replays detections recorded earlier as JSON Lines.
//!
//! Each non-blank line holds one frame:
//!
//! ```text
//! {"frame": 12, "detections": [{"x1": 10, "y1": 20, "x2": 50, "y2": 80, "score": 0.9, "label": "car"}]}
//! ```
//!
//! Frames must appear in increasing order; frames without a line have no
//! detections.

use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::integration::{DetectionBuilder, DetectionSource};
use crate::tracker::{Detection, Rect};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
    #[serde(default = "full_confidence")]
    pub score: f32,
    pub label: String,
}

impl ReplayBox {
    pub fn rect(&self) -> Rect {
        Rect::from_tlbr(self.x1, self.y1, self.x2, self.y2)
    }
}

fn full_confidence() -> f32 {
    1.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayFrame {
    pub frame: u64,
    #[serde(default)]
    pub detections: Vec<ReplayBox>,
}

pub struct ReplayDetector<R> {
    lines: Lines<R>,
    line_no: usize,
    /// Next non-blank line, read but not parsed yet
    raw: Option<String>,
    pending: Option<ReplayFrame>,
    next_frame: u64,
    last_frame: Option<u64>,
}

impl ReplayDetector<BufReader<File>> {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::from_reader(BufReader::new(File::open(path)?)))
    }
}

impl<R: BufRead> ReplayDetector<R> {
    pub fn from_reader(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_no: 0,
            raw: None,
            pending: None,
            next_frame: 0,
            last_frame: None,
        }
    }

    /// Index of the frame the next `detect` call answers for.
    pub fn next_frame(&self) -> u64 {
        self.next_frame
    }

    /// Highest frame index read from the input so far.
    pub fn last_frame(&self) -> Option<u64> {
        self.last_frame
    }

    /// Whether every recorded line has been consumed.
    ///
    /// Only reads ahead; a malformed line is reported by the `detect` call
    /// that reaches it.
    pub fn is_exhausted(&mut self) -> Result<bool> {
        Ok(self.pending.is_none() && !self.peek_line()?)
    }

    fn peek_line(&mut self) -> Result<bool> {
        if self.raw.is_none() {
            for line in self.lines.by_ref() {
                self.line_no += 1;
                let line = line?;
                if !line.trim().is_empty() {
                    self.raw = Some(line);
                    break;
                }
            }
        }
        Ok(self.raw.is_some())
    }

    fn read_record(&mut self) -> Result<Option<&ReplayFrame>> {
        if self.pending.is_none() && self.peek_line()? {
            if let Some(line) = self.raw.take() {
                let record = self.parse(&line)?;
                self.last_frame = Some(record.frame);
                self.pending = Some(record);
            }
        }
        Ok(self.pending.as_ref())
    }

    fn parse(&self, line: &str) -> Result<ReplayFrame> {
        let fail = |reason: String| Error::Replay {
            line: self.line_no,
            reason,
        };

        let record: ReplayFrame =
            serde_json::from_str(line).map_err(|e| fail(e.to_string()))?;
        if let Some(last) = self.last_frame {
            if record.frame <= last {
                return Err(fail(format!(
                    "frame {} does not follow frame {last}",
                    record.frame
                )));
            }
        }
        if let Some(b) = record.detections.iter().find(|b| b.rect().is_empty()) {
            return Err(fail(format!(
                "degenerate box ({}, {}, {}, {}) for {:?}",
                b.x1, b.y1, b.x2, b.y2, b.label
            )));
        }

        Ok(record)
    }

    fn take_frame(&mut self, frame: u64) -> Result<Vec<Detection>> {
        let due = match self.read_record()? {
            Some(record) => record.frame <= frame,
            None => false,
        };
        if !due {
            return Ok(Vec::new());
        }

        let Some(record) = self.pending.take() else {
            return Ok(Vec::new());
        };
        if record.frame < frame {
            return Err(Error::Replay {
                line: self.line_no,
                reason: format!("frame {} was already played", record.frame),
            });
        }

        Ok(record
            .detections
            .into_iter()
            .map(|b| {
                DetectionBuilder::new(b.label)
                    .tlbr(b.x1, b.y1, b.x2, b.y2)
                    .score(b.score)
                    .build()
            })
            .collect())
    }
}

impl<R: BufRead> DetectionSource for ReplayDetector<R> {
    type Error = Error;

    fn detect(
        &mut self,
        _input: &[u8],
        _width: u32,
        _height: u32,
    ) -> Result<Vec<Detection>, Self::Error> {
        let frame = self.next_frame;
        self.next_frame += 1;
        self.take_frame(frame)
    }
}
