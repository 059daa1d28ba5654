//! Identity tracking: turns per-frame detections into objects with stable ids.

mod byte_tracker;
mod detection;
mod kalman_filter;
mod matching;
mod rect;
mod strack;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use byte_tracker::{ByteTracker, TrackerConfig};
pub use detection::Detection;
pub use rect::Rect;
pub use strack::{STrack, TrackState};

/// Identity token assigned by a tracker.
///
/// Stable across frames for as long as the object stays trackable and never
/// reused for another physical object within one video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackId(pub u64);

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<u64> for TrackId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// A detection that a tracker has bound to a persistent identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedObject {
    pub track_id: TrackId,
    pub label: String,
    pub bbox: Rect,
    pub score: f32,
}

impl TrackedObject {
    pub fn new(track_id: impl Into<TrackId>, label: impl Into<String>, bbox: Rect, score: f32) -> Self {
        Self {
            track_id: track_id.into(),
            label: label.into(),
            bbox,
            score,
        }
    }
}

/// Capability of assigning stable identities to the detections of successive frames.
///
/// Counting only relies on this trait, so any tracking algorithm (or a scripted
/// sequence in tests) can drive it.
pub trait IdentityTracker {
    /// Consume the current frame's detections and return the confirmed tracks.
    fn update(&mut self, detections: Vec<Detection>) -> Vec<TrackedObject>;
}

impl<T: IdentityTracker + ?Sized> IdentityTracker for Box<T> {
    fn update(&mut self, detections: Vec<Detection>) -> Vec<TrackedObject> {
        (**self).update(detections)
    }
}
