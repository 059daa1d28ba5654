//! Line-crossing object counting over tracked video detections.
//!
//! Each frame flows through a [`DetectionSource`], a [`ClassFilter`], an
//! [`IdentityTracker`] (ByteTrack by default) and finally the
//! [`CrossingCounter`], which tallies every identity at most once when its
//! center enters the band around a horizontal counting line.

pub mod config;
pub mod counter;
pub mod error;
pub mod filter;
pub mod integration;
pub mod render;
pub mod tally;
pub mod tracker;

#[cfg(feature = "opencv")]
pub mod video;

pub use config::CountingConfig;
pub use counter::{CountingLine, CrossingCounter, CrossingDecision, CrossingEvent, FrameReport};
pub use error::{Error, Result};
pub use filter::ClassFilter;
pub use integration::{
    ClassVocabulary, CountingPipeline, CountingSession, DetectionBuilder, DetectionSource,
    ReplayDetector, RunSummary,
};
pub use render::{Bgr, BoxOverlay, Overlay};
pub use tally::{ClassTally, TallySnapshot};
pub use tracker::{ByteTracker, Detection, IdentityTracker, Rect, TrackId, TrackedObject, TrackerConfig};
