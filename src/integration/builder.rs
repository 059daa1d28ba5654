//! Turning raw detector coordinates into [`Detection`]s.

use crate::tracker::{Detection, Rect};

/// How a detector lays out the four numbers of a box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BoxLayout {
    /// Corners: x1, y1, x2, y2
    #[default]
    Tlbr,
    /// Center and size: cx, cy, w, h (YOLO heads)
    Xywh,
}

impl BoxLayout {
    pub fn to_rect(self, [a, b, c, d]: [f32; 4]) -> Rect {
        match self {
            BoxLayout::Tlbr => Rect::from_tlbr(a, b, c, d),
            BoxLayout::Xywh => Rect::from_center(a, b, c, d),
        }
    }
}

/// Builds one labeled detection; the score defaults to full confidence.
#[derive(Debug, Clone)]
pub struct DetectionBuilder {
    label: String,
    bbox: Rect,
    score: f32,
}

impl DetectionBuilder {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            bbox: Rect::default(),
            score: 1.0,
        }
    }

    pub fn bbox(mut self, layout: BoxLayout, coords: [f32; 4]) -> Self {
        self.bbox = layout.to_rect(coords);
        self
    }

    pub fn tlbr(self, x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        self.bbox(BoxLayout::Tlbr, [x1, y1, x2, y2])
    }

    pub fn score(mut self, score: f32) -> Self {
        self.score = score;
        self
    }

    pub fn build(self) -> Detection {
        Detection::from_rect(self.bbox, self.score, self.label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yolo_layout() {
        let det = DetectionBuilder::new("truck")
            .bbox(BoxLayout::Xywh, [30.0, 50.0, 40.0, 60.0])
            .score(0.95)
            .build();

        assert_eq!(det.score, 0.95);
        assert_eq!(det.label, "truck");
        assert_eq!(det.bbox.to_tlbr(), [10.0, 20.0, 50.0, 80.0]);
    }

    #[test]
    fn test_default_score() {
        let det = DetectionBuilder::new("car").tlbr(0.0, 0.0, 4.0, 4.0).build();
        assert_eq!(det.score, 1.0);
        assert_eq!(det.bbox.center_row(), 2);
    }
}
