//! Integration of detection backends with tracking and counting.
//!
//! A [`DetectionSource`] produces labeled boxes for each frame; the
//! [`CountingPipeline`] chains it with the class filter, an identity tracker
//! and the crossing counter.

mod builder;
mod detector;
mod pipeline;
mod replay;
mod session;
mod vocabulary;

pub use builder::{BoxLayout, DetectionBuilder};
pub use detector::DetectionSource;
pub use pipeline::CountingPipeline;
pub use replay::{ReplayBox, ReplayDetector, ReplayFrame};
pub use session::{CountingSession, RunSummary};
pub use vocabulary::ClassVocabulary;

#[cfg(feature = "burn-backend")]
mod burn_backend;

#[cfg(feature = "burn-backend")]
pub use burn_backend::{BurnDetector, BurnDetectorError, BurnModel, RawDetection};
