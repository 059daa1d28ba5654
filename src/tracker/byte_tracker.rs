//! ByteTrack association over labeled detections.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::tracker::detection::Detection;
use crate::tracker::kalman_filter::KalmanFilter;
use crate::tracker::matching::{self, Assignment};
use crate::tracker::rect::Rect;
use crate::tracker::strack::{STrack, TrackState};
use crate::tracker::{IdentityTracker, TrackId, TrackedObject};

/// Detections at or below this score are discarded outright.
const LOW_SCORE_FLOOR: f32 = 0.1;
const SECOND_MATCH_THRESH: f32 = 0.5;
const UNCONFIRMED_MATCH_THRESH: f32 = 0.7;
/// IoU above which a tracked and a lost track are considered the same object.
const DUPLICATE_IOU: f32 = 0.85;

/// Configuration for the [`ByteTracker`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Score splitting high from low confidence detections
    pub track_thresh: f32,
    /// Maximum fused cost accepted in the first association
    pub match_thresh: f32,
    /// Frames a lost track is kept (at 30 fps)
    pub track_buffer: u32,
    pub frame_rate: f32,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            track_thresh: 0.5,
            match_thresh: 0.8,
            track_buffer: 30,
            frame_rate: 30.0,
        }
    }
}

pub struct ByteTracker {
    tracked_stracks: Vec<STrack>,
    lost_stracks: Vec<STrack>,
    frame_id: u32,
    next_id: u64,
    config: TrackerConfig,
    max_time_lost: u32,
    kalman_filter: KalmanFilter,
}

impl Default for ByteTracker {
    fn default() -> Self {
        Self::new(TrackerConfig::default())
    }
}

impl ByteTracker {
    pub fn new(config: TrackerConfig) -> Self {
        let max_time_lost = (config.frame_rate / 30.0 * config.track_buffer as f32) as u32;
        Self {
            tracked_stracks: Vec::new(),
            lost_stracks: Vec::new(),
            frame_id: 0,
            next_id: 0,
            config,
            max_time_lost,
            kalman_filter: KalmanFilter::default(),
        }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Number of frames processed so far.
    pub fn frame_id(&self) -> u32 {
        self.frame_id
    }

    fn next_track_id(&mut self) -> TrackId {
        self.next_id += 1;
        TrackId(self.next_id)
    }

    /// Run one ByteTrack step and return the activated tracks.
    pub fn update_stracks(&mut self, detections: Vec<Detection>) -> Vec<STrack> {
        self.frame_id += 1;
        let frame_id = self.frame_id;

        let mut activated = Vec::new();
        let mut refound = Vec::new();
        let mut lost = Vec::new();

        let (high, low): (Vec<_>, Vec<_>) = detections
            .into_iter()
            .filter(|d| d.score > LOW_SCORE_FLOOR)
            .partition(|d| d.score >= self.config.track_thresh);
        let high: Vec<STrack> = high.into_iter().map(STrack::new).collect();
        let low: Vec<STrack> = low.into_iter().map(STrack::new).collect();

        let (confirmed, mut unconfirmed): (Vec<_>, Vec<_>) = self
            .tracked_stracks
            .drain(..)
            .partition(|t| t.is_activated);

        // First association: high score detections against confirmed and lost tracks.
        let mut pool = joint_stracks(confirmed, &self.lost_stracks);
        for track in &mut pool {
            track.predict(&self.kalman_filter);
        }

        let first = associate(&pool, &high, self.config.match_thresh, true);
        for &(itrack, idet) in &first.matches {
            let mut track = pool[itrack].clone();
            self.absorb(&mut track, &high[idet], &mut activated, &mut refound);
        }

        // Second association: leftover tracked tracks against low score detections.
        let remaining: Vec<STrack> = first
            .unmatched_tracks
            .iter()
            .map(|&i| &pool[i])
            .filter(|t| t.state == TrackState::Tracked)
            .cloned()
            .collect();

        let second = associate(&remaining, &low, SECOND_MATCH_THRESH, false);
        for &(itrack, idet) in &second.matches {
            let mut track = remaining[itrack].clone();
            self.absorb(&mut track, &low[idet], &mut activated, &mut refound);
        }
        for &i in &second.unmatched_tracks {
            let mut track = remaining[i].clone();
            if track.state != TrackState::Lost {
                track.mark_lost();
                lost.push(track);
            }
        }

        // Unconfirmed tracks usually have a single frame behind them.
        let leftovers: Vec<STrack> = first
            .unmatched_detections
            .iter()
            .map(|&i| high[i].clone())
            .collect();
        let third = associate(&unconfirmed, &leftovers, UNCONFIRMED_MATCH_THRESH, true);
        for &(itrack, idet) in &third.matches {
            unconfirmed[itrack].update(&leftovers[idet], &self.kalman_filter, frame_id);
            activated.push(unconfirmed[itrack].clone());
        }

        // New tracks from confident, unmatched detections.
        for &i in &third.unmatched_detections {
            let mut track = leftovers[i].clone();
            if track.score < self.config.track_thresh + 0.1 {
                continue;
            }
            let id = self.next_track_id();
            track.activate(&self.kalman_filter, frame_id, id);
            activated.push(track);
        }

        // Age out lost tracks.
        for track in self.lost_stracks.drain(..) {
            if frame_id - track.end_frame() <= self.max_time_lost {
                lost.push(track);
            }
        }

        let tracked: Vec<STrack> = activated
            .into_iter()
            .chain(refound)
            .filter(|t| t.state == TrackState::Tracked)
            .collect();
        let lost = sub_stracks(lost, &tracked);

        let (tracked, lost) = remove_duplicate_stracks(tracked, lost);
        self.tracked_stracks = tracked;
        self.lost_stracks = lost;

        self.tracked_stracks
            .iter()
            .filter(|t| t.is_activated)
            .cloned()
            .collect()
    }

    fn absorb(
        &self,
        track: &mut STrack,
        det: &STrack,
        activated: &mut Vec<STrack>,
        refound: &mut Vec<STrack>,
    ) {
        if track.state == TrackState::Tracked {
            track.update(det, &self.kalman_filter, self.frame_id);
            activated.push(track.clone());
        } else {
            track.re_activate(det, &self.kalman_filter, self.frame_id, None);
            refound.push(track.clone());
        }
    }
}

/// Tracked objects carry the box of the detection matched on this frame; the
/// Kalman estimate is only used for association.
impl IdentityTracker for ByteTracker {
    fn update(&mut self, detections: Vec<Detection>) -> Vec<TrackedObject> {
        self.update_stracks(detections)
            .into_iter()
            .map(|t| TrackedObject {
                bbox: t.detected,
                track_id: t.track_id,
                label: t.label,
                score: t.score,
            })
            .collect()
    }
}

fn associate(tracks: &[STrack], dets: &[STrack], thresh: f32, fuse: bool) -> Assignment {
    let track_rects: Vec<Rect> = tracks.iter().map(STrack::rect).collect();
    let det_rects: Vec<Rect> = dets.iter().map(STrack::rect).collect();
    let mut dists = matching::iou_distance(&track_rects, &det_rects);
    if fuse {
        let scores: Vec<f32> = dets.iter().map(|d| d.score).collect();
        matching::fuse_score(&mut dists, &scores);
    }
    matching::linear_assignment(&dists, thresh)
}

fn joint_stracks(tlista: Vec<STrack>, tlistb: &[STrack]) -> Vec<STrack> {
    let mut seen: HashSet<TrackId> = tlista.iter().map(|t| t.track_id).collect();
    let mut res = tlista;
    res.extend(tlistb.iter().filter(|t| seen.insert(t.track_id)).cloned());
    res
}

fn sub_stracks(tlista: Vec<STrack>, tlistb: &[STrack]) -> Vec<STrack> {
    let b_ids: HashSet<TrackId> = tlistb.iter().map(|t| t.track_id).collect();
    tlista
        .into_iter()
        .filter(|t| !b_ids.contains(&t.track_id))
        .collect()
}

/// Drop the shorter-lived member of every tracked/lost pair that overlaps heavily.
fn remove_duplicate_stracks(a: Vec<STrack>, b: Vec<STrack>) -> (Vec<STrack>, Vec<STrack>) {
    if a.is_empty() || b.is_empty() {
        return (a, b);
    }

    let a_rects: Vec<Rect> = a.iter().map(STrack::rect).collect();
    let b_rects: Vec<Rect> = b.iter().map(STrack::rect).collect();
    let dists = matching::iou_distance(&a_rects, &b_rects);

    let mut dup_a = vec![false; a.len()];
    let mut dup_b = vec![false; b.len()];
    for ((i, j), &dist) in dists.indexed_iter() {
        if dist < 1.0 - DUPLICATE_IOU {
            let age_a = a[i].frame_id - a[i].start_frame;
            let age_b = b[j].frame_id - b[j].start_frame;
            if age_a > age_b {
                dup_b[j] = true;
            } else {
                dup_a[i] = true;
            }
        }
    }

    let keep = |tracks: Vec<STrack>, dup: &[bool]| -> Vec<STrack> {
        tracks
            .into_iter()
            .zip(dup)
            .filter_map(|(t, &d)| (!d).then_some(t))
            .collect()
    };
    (keep(a, &dup_a), keep(b, &dup_b))
}
