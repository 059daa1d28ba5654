use crate::tracker::Detection;

/// Per-frame source of labeled boxes.
///
/// A source is called exactly once per frame, in frame order, with the frame
/// as tightly packed 8-bit BGR rows (what OpenCV decodes to). Sources that do
/// not look at pixels, such as [`ReplayDetector`](super::ReplayDetector),
/// ignore the buffer and may be handed an empty slice.
///
/// ```ignore
/// struct Fixed;
///
/// impl DetectionSource for Fixed {
///     type Error = std::convert::Infallible;
///
///     fn detect(&mut self, _: &[u8], _: u32, _: u32) -> Result<Vec<Detection>, Self::Error> {
///         Ok(vec![Detection::new(10.0, 20.0, 50.0, 80.0, 0.9, "car")])
///     }
/// }
/// ```
pub trait DetectionSource {
    type Error;

    fn detect(
        &mut self,
        input: &[u8],
        width: u32,
        height: u32,
    ) -> Result<Vec<Detection>, Self::Error>;
}

impl<D: DetectionSource + ?Sized> DetectionSource for &mut D {
    type Error = D::Error;

    fn detect(&mut self, input: &[u8], width: u32, height: u32) -> Result<Vec<Detection>, D::Error> {
        (**self).detect(input, width, height)
    }
}

impl<D: DetectionSource + ?Sized> DetectionSource for Box<D> {
    type Error = D::Error;

    fn detect(&mut self, input: &[u8], width: u32, height: u32) -> Result<Vec<Detection>, D::Error> {
        (**self).detect(input, width, height)
    }
}
