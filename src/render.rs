//! Drawing instructions for an annotated frame.
//!
//! An [`Overlay`] is plain data; the video sink rasterizes it onto the frame.

use serde::Serialize;

use crate::counter::CountingLine;
use crate::tally::{TallySnapshot, capitalize};
use crate::tracker::{TrackId, TrackedObject};

pub const BOX_THICKNESS: i32 = 2;
pub const CAPTION_SCALE: f64 = 0.6;
pub const TALLY_SCALE: f64 = 0.8;
pub const TEXT_THICKNESS: i32 = 2;

/// Pixels between a caption baseline and the top of its box.
const CAPTION_LIFT: i32 = 10;
const TALLY_ORIGIN: (i32, i32) = (20, 40);

/// Color in OpenCV channel order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Bgr(pub u8, pub u8, pub u8);

impl Bgr {
    pub const GREEN: Bgr = Bgr(0, 255, 0);
    pub const BLUE: Bgr = Bgr(255, 0, 0);
    pub const RED: Bgr = Bgr(0, 0, 255);
    pub const CYAN: Bgr = Bgr(255, 255, 0);

    /// Box color for a class: green for cars, blue for everything else.
    pub fn for_label(label: &str) -> Bgr {
        if label == "car" { Bgr::GREEN } else { Bgr::BLUE }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxOverlay {
    pub track_id: TrackId,
    /// Pixel corners (x1, y1, x2, y2)
    pub corners: [i32; 4],
    /// e.g. `Car #7`
    pub caption: String,
    pub caption_origin: (i32, i32),
    pub color: Bgr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LineOverlay {
    pub from: (i32, i32),
    pub to: (i32, i32),
    pub color: Bgr,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Overlay {
    pub boxes: Vec<BoxOverlay>,
    pub line: LineOverlay,
    pub tally_text: String,
    pub tally_origin: (i32, i32),
    pub tally_color: Bgr,
}

impl Overlay {
    pub fn build(
        frame_width: u32,
        objects: &[TrackedObject],
        line: CountingLine,
        tally: &TallySnapshot,
    ) -> Self {
        let boxes = objects
            .iter()
            .map(|object| {
                let corners = object.bbox.pixel_tlbr();
                BoxOverlay {
                    track_id: object.track_id,
                    corners,
                    caption: format!("{} #{}", capitalize(&object.label), object.track_id),
                    caption_origin: (corners[0], corners[1] - CAPTION_LIFT),
                    color: Bgr::for_label(&object.label),
                }
            })
            .collect();

        Self {
            boxes,
            line: LineOverlay {
                from: (0, line.y),
                to: (frame_width as i32, line.y),
                color: Bgr::RED,
            },
            tally_text: tally.overlay_text(),
            tally_origin: TALLY_ORIGIN,
            tally_color: Bgr::CYAN,
        }
    }
}
