//! Single object track (STrack) for multi-object tracking.

use nalgebra::Vector4;
use tracing::warn;

use crate::tracker::TrackId;
use crate::tracker::detection::Detection;
use crate::tracker::kalman_filter::{Covariance, KalmanFilter, Mean};
use crate::tracker::rect::Rect;

/// Lifecycle of a track inside the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrackState {
    /// Created from a detection, not yet confirmed
    #[default]
    New,
    Tracked,
    /// Missed recently, kept for re-identification
    Lost,
}

#[derive(Debug, Clone)]
struct MotionState {
    mean: Mean,
    covariance: Covariance,
}

#[derive(Debug, Clone)]
pub struct STrack {
    /// Identity; `TrackId(0)` until the track is activated
    pub track_id: TrackId,
    pub label: String,
    pub state: TrackState,
    pub is_activated: bool,
    pub score: f32,
    /// Last frame this track was updated on
    pub frame_id: u32,
    pub start_frame: u32,
    pub tracklet_len: u32,
    /// Box of the most recently matched detection
    pub detected: Rect,
    motion: Option<MotionState>,
}

fn measurement(rect: &Rect) -> Vector4<f64> {
    let [cx, cy, a, h] = rect.to_xyah();
    Vector4::new(cx.into(), cy.into(), a.into(), h.into())
}

impl STrack {
    pub fn new(detection: Detection) -> Self {
        Self {
            track_id: TrackId(0),
            label: detection.label,
            state: TrackState::New,
            is_activated: false,
            score: detection.score,
            frame_id: 0,
            start_frame: 0,
            tracklet_len: 0,
            detected: detection.bbox,
            motion: None,
        }
    }

    /// Box used for association: the filtered estimate once the Kalman state exists.
    pub fn rect(&self) -> Rect {
        match &self.motion {
            Some(m) => Rect::from_xyah(
                m.mean[0] as f32,
                m.mean[1] as f32,
                m.mean[2] as f32,
                m.mean[3] as f32,
            ),
            None => self.detected,
        }
    }

    pub fn end_frame(&self) -> u32 {
        self.frame_id
    }

    pub fn activate(&mut self, kalman_filter: &KalmanFilter, frame_id: u32, track_id: TrackId) {
        let (mean, covariance) = kalman_filter.initiate(measurement(&self.detected));

        self.track_id = track_id;
        self.motion = Some(MotionState { mean, covariance });
        self.tracklet_len = 0;
        self.state = TrackState::Tracked;
        // Only tracks born on the very first frame are confirmed without a second sighting.
        self.is_activated = frame_id == 1;
        self.frame_id = frame_id;
        self.start_frame = frame_id;
    }

    pub fn re_activate(
        &mut self,
        new_track: &STrack,
        kalman_filter: &KalmanFilter,
        frame_id: u32,
        new_id: Option<TrackId>,
    ) {
        self.correct(new_track, kalman_filter);
        self.tracklet_len = 0;
        self.state = TrackState::Tracked;
        self.is_activated = true;
        self.frame_id = frame_id;
        self.score = new_track.score;
        self.detected = new_track.detected;
        self.label.clone_from(&new_track.label);

        if let Some(id) = new_id {
            self.track_id = id;
        }
    }

    pub fn update(&mut self, new_track: &STrack, kalman_filter: &KalmanFilter, frame_id: u32) {
        self.frame_id = frame_id;
        self.tracklet_len += 1;
        self.correct(new_track, kalman_filter);
        self.state = TrackState::Tracked;
        self.is_activated = true;
        self.score = new_track.score;
        self.detected = new_track.detected;
        self.label.clone_from(&new_track.label);
    }

    fn correct(&mut self, new_track: &STrack, kalman_filter: &KalmanFilter) {
        let Some(motion) = &mut self.motion else {
            return;
        };
        match kalman_filter.update(&motion.mean, &motion.covariance, measurement(&new_track.detected)) {
            Some((mean, covariance)) => {
                motion.mean = mean;
                motion.covariance = covariance;
            }
            None => warn!(
                track_id = %self.track_id,
                "singular innovation covariance, keeping predicted state"
            ),
        }
    }

    pub fn predict(&mut self, kalman_filter: &KalmanFilter) {
        let tracked = self.state == TrackState::Tracked;
        if let Some(motion) = &mut self.motion {
            let mut mean = motion.mean;
            if !tracked {
                mean[7] = 0.0;
            }
            let (mean, covariance) = kalman_filter.predict(&mean, &motion.covariance);
            motion.mean = mean;
            motion.covariance = covariance;
        }
    }

    pub fn mark_lost(&mut self) {
        self.state = TrackState::Lost;
    }
}
