use serde::{Deserialize, Serialize};

use crate::tracker::rect::Rect;

/// One labeled box reported by a detector for a single frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Bounding box, built from TLBR corners (x1, y1, x2, y2)
    pub bbox: Rect,
    /// Detection confidence score
    pub score: f32,
    /// Class label from the detector's vocabulary
    pub label: String,
}

impl Detection {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32, score: f32, label: impl Into<String>) -> Self {
        Self {
            bbox: Rect::from_tlbr(x1, y1, x2, y2),
            score,
            label: label.into(),
        }
    }

    pub fn from_rect(bbox: Rect, score: f32, label: impl Into<String>) -> Self {
        Self {
            bbox,
            score,
            label: label.into(),
        }
    }
}
