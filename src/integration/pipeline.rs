//! CountingPipeline for combining detection, tracking and line counting.

use tracing::debug;

use crate::config::CountingConfig;
use crate::counter::{CrossingCounter, FrameReport};
use crate::error::Result;
use crate::filter::ClassFilter;
use crate::integration::DetectionSource;
use crate::tracker::{ByteTracker, IdentityTracker};

const PROGRESS_EVERY: u64 = 100;

/// Detector, class filter, tracker and crossing counter run in strict frame order.
///
/// One pipeline processes exactly one video: the counter state it owns is
/// created with it and dropped with it.
pub struct CountingPipeline<D: DetectionSource, T: IdentityTracker = ByteTracker> {
    detector: D,
    filter: ClassFilter,
    tracker: T,
    counter: CrossingCounter,
    frame_index: u64,
}

impl<D: DetectionSource> CountingPipeline<D, ByteTracker> {
    /// Pipeline backed by ByteTrack configured from `config.tracker`.
    pub fn from_config(detector: D, config: &CountingConfig, frame_height: u32) -> Result<Self> {
        let tracker = ByteTracker::new(config.tracker.clone());
        Self::new(detector, tracker, config, frame_height)
    }
}

impl<D: DetectionSource, T: IdentityTracker> CountingPipeline<D, T> {
    pub fn new(detector: D, tracker: T, config: &CountingConfig, frame_height: u32) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            detector,
            filter: config.class_filter()?,
            tracker,
            counter: config.crossing_counter(frame_height),
            frame_index: 0,
        })
    }

    /// Detect, filter, track and count the next frame.
    ///
    /// A detector error consumes the frame index, so a caller may log it and
    /// carry on with the following frame.
    pub fn process_frame(
        &mut self,
        input: &[u8],
        width: u32,
        height: u32,
    ) -> Result<FrameReport, D::Error> {
        let frame_index = self.frame_index;
        self.frame_index += 1;

        let detections = self.detector.detect(input, width, height)?;
        let detections = self.filter.retain(detections);
        let tracked = self.tracker.update(detections);
        let report = self.counter.evaluate_frame(frame_index, tracked);

        if frame_index % PROGRESS_EVERY == 0 {
            debug!(
                frame_index,
                tracked = report.objects.len(),
                counted = self.counter.counted_len(),
                "processed frame"
            );
        }
        Ok(report)
    }

    /// Number of frames handed to the pipeline so far.
    pub fn frames_processed(&self) -> u64 {
        self.frame_index
    }

    pub fn detector(&self) -> &D {
        &self.detector
    }

    pub fn detector_mut(&mut self) -> &mut D {
        &mut self.detector
    }

    pub fn tracker(&self) -> &T {
        &self.tracker
    }

    pub fn counter(&self) -> &CrossingCounter {
        &self.counter
    }

    pub fn filter(&self) -> &ClassFilter {
        &self.filter
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::Detection;

    /// Emits one car sliding down 10 px per frame, plus a person in the band.
    struct MockDetector {
        frame: u32,
    }

    impl DetectionSource for MockDetector {
        type Error = std::convert::Infallible;

        fn detect(
            &mut self,
            _input: &[u8],
            _width: u32,
            _height: u32,
        ) -> Result<Vec<Detection>, Self::Error> {
            let top = 150.0 + 10.0 * self.frame as f32;
            self.frame += 1;
            Ok(vec![
                Detection::new(100.0, top, 160.0, top + 40.0, 0.9, "car"),
                Detection::new(300.0, 180.0, 330.0, 220.0, 0.9, "person"),
            ])
        }
    }

    #[test]
    fn test_tracker_pipeline_counts_car_once() {
        let config = CountingConfig::default();
        let mut pipeline =
            CountingPipeline::from_config(MockDetector { frame: 0 }, &config, 400).unwrap();

        let mut crossings = 0;
        for _ in 0..15 {
            let report = pipeline.process_frame(&[], 640, 400).unwrap();
            assert!(report.objects.iter().all(|o| o.label == "car"));
            crossings += report.crossings.len();
        }

        assert_eq!(crossings, 1);
        assert_eq!(pipeline.frames_processed(), 15);
        assert_eq!(pipeline.counter().snapshot().get("car"), Some(1));
        assert_eq!(pipeline.counter().snapshot().get("truck"), Some(0));
    }
}
