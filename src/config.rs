//! Run configuration, loadable from JSON.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::counter::{CountingLine, CrossingCounter, DEFAULT_BAND_MARGIN};
use crate::error::{Error, Result};
use crate::filter::ClassFilter;
use crate::tracker::TrackerConfig;

/// Container extensions accepted for input videos.
pub const INPUT_CONTAINERS: [&str; 3] = ["mp4", "mov", "avi"];

/// Reject input paths whose extension is not a supported container.
pub fn check_input_container(path: &Path) -> Result<()> {
    let supported = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| INPUT_CONTAINERS.iter().any(|c| ext.eq_ignore_ascii_case(c)));
    if supported {
        Ok(())
    } else {
        Err(Error::UnsupportedContainer(path.to_path_buf()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CountingConfig {
    /// Classes that are tracked and counted, in overlay order
    pub classes: Vec<String>,
    /// Half-height of the counting band in pixels
    pub band_margin: i32,
    pub tracker: TrackerConfig,
}

impl Default for CountingConfig {
    fn default() -> Self {
        Self {
            classes: vec!["car".into(), "truck".into()],
            band_margin: DEFAULT_BAND_MARGIN,
            tracker: TrackerConfig::default(),
        }
    }
}

impl CountingConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_json_str(&fs::read_to_string(path)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.classes.is_empty() {
            return Err(Error::Config("`classes` must not be empty".into()));
        }
        if self.band_margin <= 0 {
            return Err(Error::Config(format!(
                "`band_margin` must be positive, got {}",
                self.band_margin
            )));
        }
        if self.tracker.frame_rate <= 0.0 {
            return Err(Error::Config("`tracker.frame_rate` must be positive".into()));
        }
        Ok(())
    }

    pub fn class_filter(&self) -> Result<ClassFilter> {
        ClassFilter::new(self.classes.iter().cloned())
    }

    /// Counting line through the middle row of a frame of the given height.
    pub fn counting_line(&self, frame_height: u32) -> CountingLine {
        CountingLine::at_midpoint(frame_height).with_margin(self.band_margin)
    }

    pub fn crossing_counter(&self, frame_height: u32) -> CrossingCounter {
        CrossingCounter::new(self.counting_line(frame_height), self.classes.iter().cloned())
    }
}
