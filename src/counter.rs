//! Line-crossing counter.
//!
//! Every tracked identity moves through `UNSEEN -> COUNTED` exactly once: the
//! first frame its box center lies strictly inside the band around the
//! counting line, its class tally is incremented and the identity is recorded.
//! Recorded identities are never counted again, wherever they go afterwards,
//! so an object lingering on the line still yields a single count. Objects
//! already inside the band on their first observed frame are counted
//! immediately.
//!
//! Fast objects that jump over the band between two sampled frames are missed;
//! the band trades that for robustness to jitter and low frame rates.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::tally::{ClassTally, TallySnapshot};
use crate::tracker::{TrackId, TrackedObject};

/// Half-height of the counting band, in pixels.
pub const DEFAULT_BAND_MARGIN: i32 = 10;

/// A horizontal counting line with the band around it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountingLine {
    /// Pixel row of the line
    pub y: i32,
    /// The band is `(y - margin, y + margin)`, both ends excluded
    pub margin: i32,
}

impl CountingLine {
    pub fn new(y: i32, margin: i32) -> Self {
        Self { y, margin }
    }

    /// Line through the middle row of a frame of the given height.
    pub fn at_midpoint(frame_height: u32) -> Self {
        Self::new((frame_height / 2) as i32, DEFAULT_BAND_MARGIN)
    }

    pub fn with_margin(self, margin: i32) -> Self {
        Self { margin, ..self }
    }

    #[inline]
    pub fn in_band(&self, center_y: i32) -> bool {
        self.y - self.margin < center_y && center_y < self.y + self.margin
    }
}

/// Outcome of evaluating one tracked object on one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrossingDecision {
    /// The object just entered the band; `tally` is its class count after the increment.
    Counted { tally: u64 },
    /// The identity was counted on an earlier frame.
    AlreadyCounted,
    /// Not counted yet and currently outside the band.
    OutsideBand,
    /// The label is not one of the counted classes.
    Ignored,
}

impl CrossingDecision {
    pub fn is_counted(&self) -> bool {
        matches!(self, Self::Counted { .. })
    }
}

/// A count registered for one identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossingEvent {
    pub frame_index: u64,
    pub track_id: TrackId,
    pub label: String,
    pub center_y: i32,
}

/// Everything that happened while evaluating one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameReport {
    pub frame_index: u64,
    pub objects: Vec<TrackedObject>,
    pub crossings: Vec<CrossingEvent>,
    pub tally: TallySnapshot,
}

/// Per-video counting state.
#[derive(Debug, Clone)]
pub struct CrossingCounter {
    line: CountingLine,
    counted_ids: HashSet<TrackId>,
    count_by_class: Vec<ClassTally>,
}

impl CrossingCounter {
    /// Start a counter with every class at zero; repeated labels are kept once.
    pub fn new<I, S>(line: CountingLine, classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut count_by_class: Vec<ClassTally> = Vec::new();
        for label in classes {
            let label = label.into();
            if count_by_class.iter().all(|c| c.label != label) {
                count_by_class.push(ClassTally { label, count: 0 });
            }
        }
        Self {
            line,
            counted_ids: HashSet::new(),
            count_by_class,
        }
    }

    /// Counter for a video of the given height, line at the middle row.
    pub fn for_frame<I, S>(frame_height: u32, classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(CountingLine::at_midpoint(frame_height), classes)
    }

    pub fn line(&self) -> CountingLine {
        self.line
    }

    pub fn is_counted(&self, track_id: TrackId) -> bool {
        self.counted_ids.contains(&track_id)
    }

    /// Number of identities counted so far.
    pub fn counted_len(&self) -> usize {
        self.counted_ids.len()
    }

    pub fn snapshot(&self) -> TallySnapshot {
        TallySnapshot::new(self.count_by_class.clone())
    }

    pub fn evaluate(&mut self, object: &TrackedObject, frame_index: u64) -> CrossingDecision {
        let Some(slot) = self
            .count_by_class
            .iter_mut()
            .find(|c| c.label == object.label)
        else {
            return CrossingDecision::Ignored;
        };

        if self.counted_ids.contains(&object.track_id) {
            return CrossingDecision::AlreadyCounted;
        }

        let center_y = object.bbox.center_row();
        if !self.line.in_band(center_y) {
            return CrossingDecision::OutsideBand;
        }

        self.counted_ids.insert(object.track_id);
        slot.count += 1;
        debug!(
            frame_index,
            track_id = %object.track_id,
            label = %object.label,
            center_y,
            tally = slot.count,
            "object crossed counting line"
        );
        CrossingDecision::Counted { tally: slot.count }
    }

    /// Evaluate all objects of one frame and collect the crossings that fired.
    pub fn evaluate_frame(&mut self, frame_index: u64, objects: Vec<TrackedObject>) -> FrameReport {
        let crossings = objects
            .iter()
            .filter(|object| self.evaluate(object, frame_index).is_counted())
            .map(|object| CrossingEvent {
                frame_index,
                track_id: object.track_id,
                label: object.label.clone(),
                center_y: object.bbox.center_row(),
            })
            .collect();

        FrameReport {
            frame_index,
            objects,
            crossings,
            tally: self.snapshot(),
        }
    }
}
