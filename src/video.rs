//! Video decoding, overlay rasterization and encoding through OpenCV.

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use opencv::core::{Mat, Point, Rect as CvRect, Scalar, Size};
use opencv::prelude::*;
use opencv::{imgproc, videoio};
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::render::{BOX_THICKNESS, Bgr, CAPTION_SCALE, Overlay, TALLY_SCALE, TEXT_THICKNESS};

const FALLBACK_FPS: f64 = 30.0;

fn path_str(path: &Path) -> Result<&str> {
    path.to_str().ok_or_else(|| Error::VideoOpen(path.to_path_buf()))
}

/// Sequential reader over the frames of a video file.
pub struct FrameSource {
    capture: videoio::VideoCapture,
    width: u32,
    height: u32,
    fps: f64,
    frame_count: Option<u64>,
}

impl FrameSource {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let capture = videoio::VideoCapture::from_file(path_str(path)?, videoio::CAP_ANY)?;
        if !capture.is_opened()? {
            return Err(Error::VideoOpen(path.to_path_buf()));
        }

        let width = capture.get(videoio::CAP_PROP_FRAME_WIDTH)? as u32;
        let height = capture.get(videoio::CAP_PROP_FRAME_HEIGHT)? as u32;
        if width == 0 || height == 0 {
            return Err(Error::VideoOpen(path.to_path_buf()));
        }

        let mut fps = capture.get(videoio::CAP_PROP_FPS)?;
        if !(fps.is_finite() && fps > 0.0) {
            warn!(path = %path.display(), fps, "no usable frame rate, assuming {FALLBACK_FPS}");
            fps = FALLBACK_FPS;
        }

        let frame_count = capture.get(videoio::CAP_PROP_FRAME_COUNT)?;
        let frame_count = (frame_count > 0.0).then_some(frame_count as u64);

        info!(path = %path.display(), width, height, fps, ?frame_count, "opened input video");
        Ok(Self {
            capture,
            width,
            height,
            fps,
            frame_count,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn fps(&self) -> f64 {
        self.fps
    }

    /// Frame count advertised by the container, if any.
    pub fn frame_count(&self) -> Option<u64> {
        self.frame_count
    }

    /// Next decoded BGR frame, or `None` at end of stream.
    pub fn read_frame(&mut self) -> Result<Option<Mat>> {
        let mut frame = Mat::default();
        if !self.capture.read(&mut frame)? || frame.empty() {
            return Ok(None);
        }
        Ok(Some(frame))
    }
}

/// Packed BGR bytes of a frame, copying only when the rows are not contiguous.
pub fn frame_bytes(frame: &Mat) -> Result<Cow<'_, [u8]>> {
    if frame.is_continuous() {
        Ok(Cow::Borrowed(frame.data_bytes()?))
    } else {
        Ok(Cow::Owned(frame.try_clone()?.data_bytes()?.to_vec()))
    }
}

fn scalar(color: Bgr) -> Scalar {
    Scalar::new(color.0.into(), color.1.into(), color.2.into(), 0.0)
}

/// Rasterize the overlay onto a BGR frame in place.
pub fn draw_overlay(frame: &mut Mat, overlay: &Overlay) -> Result<()> {
    for b in &overlay.boxes {
        let [x1, y1, x2, y2] = b.corners;
        let color = scalar(b.color);
        imgproc::rectangle(
            frame,
            CvRect::new(x1, y1, x2 - x1, y2 - y1),
            color,
            BOX_THICKNESS,
            imgproc::LINE_8,
            0,
        )?;
        imgproc::put_text(
            frame,
            &b.caption,
            Point::new(b.caption_origin.0, b.caption_origin.1),
            imgproc::FONT_HERSHEY_SIMPLEX,
            CAPTION_SCALE,
            color,
            TEXT_THICKNESS,
            imgproc::LINE_8,
            false,
        )?;
    }

    let line = overlay.line;
    imgproc::line(
        frame,
        Point::new(line.from.0, line.from.1),
        Point::new(line.to.0, line.to.1),
        scalar(line.color),
        BOX_THICKNESS,
        imgproc::LINE_8,
        0,
    )?;

    imgproc::put_text(
        frame,
        &overlay.tally_text,
        Point::new(overlay.tally_origin.0, overlay.tally_origin.1),
        imgproc::FONT_HERSHEY_SIMPLEX,
        TALLY_SCALE,
        scalar(overlay.tally_color),
        TEXT_THICKNESS,
        imgproc::LINE_8,
        false,
    )?;
    Ok(())
}

/// MP4 writer at the input's resolution and frame rate.
pub struct VideoSink {
    writer: videoio::VideoWriter,
    path: PathBuf,
    frames_written: u64,
}

impl VideoSink {
    pub fn create(path: impl AsRef<Path>, width: u32, height: u32, fps: f64) -> Result<Self> {
        let path = path.as_ref();
        let fourcc = videoio::VideoWriter::fourcc('m', 'p', '4', 'v')?;
        let writer = videoio::VideoWriter::new(
            path_str(path)?,
            fourcc,
            fps,
            Size::new(width as i32, height as i32),
            true,
        )?;
        if !writer.is_opened()? {
            return Err(Error::VideoOpen(path.to_path_buf()));
        }
        Ok(Self {
            writer,
            path: path.to_path_buf(),
            frames_written: 0,
        })
    }

    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    /// Draw `overlay` (when given) onto the frame and append it to the stream.
    pub fn write(&mut self, frame: &mut Mat, overlay: Option<&Overlay>) -> Result<()> {
        if let Some(overlay) = overlay {
            draw_overlay(frame, overlay)?;
        }
        self.writer.write(&*frame)?;
        self.frames_written += 1;
        Ok(())
    }

    pub fn release(mut self) -> Result<()> {
        self.writer.release()?;
        info!(path = %self.path.display(), frames = self.frames_written, "wrote output video");
        Ok(())
    }
}
