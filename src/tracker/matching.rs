//! Cost matrices and linear assignment between tracks and detections.

use ndarray::{Array2, Axis};
use tracing::warn;

use crate::tracker::rect::Rect;

/// Cost of an impossible pairing in the padded square matrix.
const PADDING_COST: f64 = 1e6;

/// `1 - IoU` for every (track, detection) pair.
pub fn iou_distance(track_boxes: &[Rect], det_boxes: &[Rect]) -> Array2<f32> {
    Array2::from_shape_fn((track_boxes.len(), det_boxes.len()), |(i, j)| {
        1.0 - track_boxes[i].iou(&det_boxes[j])
    })
}

/// Weight the IoU similarity of each column by its detection score.
pub fn fuse_score(cost_matrix: &mut Array2<f32>, scores: &[f32]) {
    for mut row in cost_matrix.axis_iter_mut(Axis(0)) {
        for (cost, score) in row.iter_mut().zip(scores) {
            *cost = 1.0 - (1.0 - *cost) * score;
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Assignment {
    pub matches: Vec<(usize, usize)>,
    pub unmatched_tracks: Vec<usize>,
    pub unmatched_detections: Vec<usize>,
}

/// Solve the assignment with LAPJV and drop pairs whose cost exceeds `thresh`.
pub fn linear_assignment(cost_matrix: &Array2<f32>, thresh: f32) -> Assignment {
    let (num_rows, num_cols) = cost_matrix.dim();

    if num_rows == 0 || num_cols == 0 {
        return Assignment {
            matches: vec![],
            unmatched_tracks: (0..num_rows).collect(),
            unmatched_detections: (0..num_cols).collect(),
        };
    }

    let size = num_rows.max(num_cols);
    let padded = Array2::from_shape_fn((size, size), |(i, j)| {
        if i < num_rows && j < num_cols {
            f64::from(cost_matrix[[i, j]])
        } else {
            PADDING_COST
        }
    });

    let mut assignment = Assignment::default();
    let mut detection_free = vec![true; num_cols];

    match lapjv::lapjv(&padded) {
        Ok((row_to_col, _)) => {
            for (row, &col) in row_to_col.iter().enumerate().take(num_rows) {
                if col < num_cols && cost_matrix[[row, col]] <= thresh {
                    assignment.matches.push((row, col));
                    detection_free[col] = false;
                } else {
                    assignment.unmatched_tracks.push(row);
                }
            }
        }
        Err(err) => {
            warn!("linear assignment failed, leaving all tracks unmatched: {err:?}");
            assignment.unmatched_tracks = (0..num_rows).collect();
        }
    }

    assignment.unmatched_detections = detection_free
        .iter()
        .enumerate()
        .filter_map(|(i, &free)| free.then_some(i))
        .collect();
    assignment
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assignment_respects_threshold() {
        let tracks = [Rect::from_tlwh(0.0, 0.0, 10.0, 10.0), Rect::from_tlwh(100.0, 100.0, 10.0, 10.0)];
        let dets = [Rect::from_tlwh(1.0, 1.0, 10.0, 10.0), Rect::from_tlwh(300.0, 300.0, 10.0, 10.0)];

        let result = linear_assignment(&iou_distance(&tracks, &dets), 0.8);
        assert_eq!(result.matches, vec![(0, 0)]);
        assert_eq!(result.unmatched_tracks, vec![1]);
        assert_eq!(result.unmatched_detections, vec![1]);
    }

    #[test]
    fn test_empty_side() {
        let result = linear_assignment(&Array2::zeros((0, 3)), 0.5);
        assert!(result.matches.is_empty());
        assert_eq!(result.unmatched_detections, vec![0, 1, 2]);
    }

    #[test]
    fn test_fuse_score_scales_similarity() {
        let mut cost = Array2::from_elem((1, 2), 0.2f32);
        fuse_score(&mut cost, &[1.0, 0.5]);
        assert!((cost[[0, 0]] - 0.2).abs() < 1e-6);
        assert!((cost[[0, 1]] - 0.6).abs() < 1e-6);
    }
}
