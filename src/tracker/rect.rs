use serde::{Deserialize, Serialize};

/// Axis-aligned box in image coordinates, kept as its two corners.
///
/// The tracker's Kalman filter works in XYAH space (center x, center y,
/// aspect ratio w/h, height); [`Rect::to_xyah`] and [`Rect::from_xyah`]
/// convert in and out of it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl Rect {
    pub fn from_tlbr(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Box from its top-left corner and size.
    pub fn from_tlwh(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self::from_tlbr(x, y, x + width, y + height)
    }

    pub fn from_center(cx: f32, cy: f32, width: f32, height: f32) -> Self {
        Self::from_tlwh(cx - width / 2.0, cy - height / 2.0, width, height)
    }

    pub fn from_xyah(cx: f32, cy: f32, aspect_ratio: f32, height: f32) -> Self {
        Self::from_center(cx, cy, aspect_ratio * height, height)
    }

    pub fn to_tlbr(&self) -> [f32; 4] {
        [self.x1, self.y1, self.x2, self.y2]
    }

    pub fn to_xyah(&self) -> [f32; 4] {
        let (cx, cy) = self.center();
        let aspect_ratio = if self.height() > 0.0 {
            self.width() / self.height()
        } else {
            0.0
        };
        [cx, cy, aspect_ratio, self.height()]
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.x2 - self.x1
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.y2 - self.y1
    }

    pub fn center(&self) -> (f32, f32) {
        ((self.x1 + self.x2) / 2.0, (self.y1 + self.y2) / 2.0)
    }

    /// True when the box has no area.
    pub fn is_empty(&self) -> bool {
        self.x1 >= self.x2 || self.y1 >= self.y2
    }

    /// Corners snapped to whole pixels, truncating toward zero.
    pub fn pixel_tlbr(&self) -> [i32; 4] {
        self.to_tlbr().map(|v| v as i32)
    }

    /// Integer row of the box center, computed from the pixel corners.
    pub fn center_row(&self) -> i32 {
        let [_, y1, _, y2] = self.pixel_tlbr();
        (y1 + y2).div_euclid(2)
    }

    pub fn area(&self) -> f32 {
        self.width().max(0.0) * self.height().max(0.0)
    }

    pub fn iou(&self, other: &Rect) -> f32 {
        let overlap = Rect::from_tlbr(
            self.x1.max(other.x1),
            self.y1.max(other.y1),
            self.x2.min(other.x2),
            self.y2.min(other.y2),
        );
        let inter = overlap.area();
        let union = self.area() + other.area() - inter;
        if union > 0.0 { inter / union } else { 0.0 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_xyah() {
        let rect = Rect::from_tlwh(10.0, 20.0, 30.0, 40.0);
        assert_eq!(rect.to_tlbr(), [10.0, 20.0, 40.0, 60.0]);

        let [cx, cy, a, h] = rect.to_xyah();
        assert_eq!((cx, cy, h), (25.0, 40.0, 40.0));
        assert!((a - 0.75).abs() < 1e-6);

        let back = Rect::from_xyah(cx, cy, a, h);
        assert!((back.x1 - 10.0).abs() < 1e-5);
        assert!((back.x2 - 40.0).abs() < 1e-5);
    }

    #[test]
    fn test_center_row_truncates_then_floors() {
        // int(10.9) = 10, int(21.7) = 21, (10 + 21) // 2 = 15
        let rect = Rect::from_tlbr(0.0, 10.9, 5.0, 21.7);
        assert_eq!(rect.pixel_tlbr(), [0, 10, 5, 21]);
        assert_eq!(rect.center_row(), 15);

        // Truncation is toward zero above the frame, flooring stays downward.
        let above = Rect::from_tlbr(0.0, -3.5, 5.0, 0.0);
        assert_eq!(above.pixel_tlbr()[1], -3);
        assert_eq!(above.center_row(), -2);
    }

    #[test]
    fn test_iou_and_empty() {
        let a = Rect::from_tlwh(0.0, 0.0, 10.0, 10.0);
        let b = Rect::from_tlwh(5.0, 5.0, 10.0, 10.0);

        assert!((a.iou(&b) - 25.0 / 175.0).abs() < 1e-6);
        assert!((a.iou(&a) - 1.0).abs() < 1e-6);
        assert_eq!(a.iou(&Rect::from_tlwh(20.0, 20.0, 10.0, 10.0)), 0.0);
        assert!(Rect::from_tlbr(3.0, 0.0, 3.0, 9.0).is_empty());
        assert!(!a.is_empty());
    }
}
