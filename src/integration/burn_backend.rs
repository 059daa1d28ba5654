//! Burn inference backend for object detection.
//!
//! `BurnDetector` wraps any model implementing [`BurnModel`] and turns its raw
//! outputs into labeled detections through a [`ClassVocabulary`].
//!
//! # Example
//!
//! ```ignore
//! use linecount_rs::integration::{BurnDetector, BurnModel, ClassVocabulary, RawDetection};
//! use burn::backend::NdArray;
//!
//! struct MyYoloModel { /* ... */ }
//!
//! impl BurnModel<NdArray> for MyYoloModel {
//!     fn forward(&self, input: burn::tensor::Tensor<NdArray, 4>) -> Vec<RawDetection> {
//!         // Run inference
//!     }
//! }
//!
//! let detector = BurnDetector::new(MyYoloModel::load("model.bin"), Default::default(), ClassVocabulary::coco());
//! ```

use burn::prelude::*;
use burn::tensor::Tensor;
use thiserror::Error;
use tracing::trace;

use super::{BoxLayout, ClassVocabulary, DetectionBuilder, DetectionSource};
use crate::tracker::Detection;

#[derive(Debug, Clone, Error)]
pub enum BurnDetectorError {
    #[error("frame buffer holds {got} bytes, expected {expected} for {width}x{height} BGR")]
    InvalidFrameSize {
        width: u32,
        height: u32,
        expected: usize,
        got: usize,
    },
    #[error("frame is {width}x{height} but the model expects {model_width}x{model_height}")]
    UnsupportedResolution {
        width: u32,
        height: u32,
        model_width: u32,
        model_height: u32,
    },
}

/// Raw detection output from the model, after its own NMS.
#[derive(Debug, Clone)]
pub struct RawDetection {
    /// Box coordinates in the model's [`BurnModel::bbox_layout`]
    pub bbox: [f32; 4],
    pub score: f32,
    /// Index into the model's class vocabulary
    pub class_id: usize,
}

/// Trait for Burn-based detection models.
pub trait BurnModel<B: Backend>: Send + Sync {
    /// Run a forward pass on a `[1, 3, height, width]` RGB tensor in `[0, 1]`.
    fn forward(&self, input: Tensor<B, 4>) -> Vec<RawDetection>;

    /// Expected input size as (height, width).
    fn input_size(&self) -> (u32, u32) {
        (640, 640)
    }

    fn bbox_layout(&self) -> BoxLayout {
        BoxLayout::Xywh
    }
}

pub struct BurnDetector<B: Backend, M: BurnModel<B>> {
    model: M,
    device: B::Device,
    vocabulary: ClassVocabulary,
    conf_threshold: f32,
}

impl<B: Backend, M: BurnModel<B>> BurnDetector<B, M> {
    pub fn new(model: M, device: B::Device, vocabulary: ClassVocabulary) -> Self {
        Self {
            model,
            device,
            vocabulary,
            conf_threshold: 0.25,
        }
    }

    pub fn with_conf_threshold(mut self, threshold: f32) -> Self {
        self.conf_threshold = threshold;
        self
    }

    /// Convert a packed BGR frame into a normalized planar RGB tensor.
    pub fn preprocess(
        &self,
        input: &[u8],
        width: u32,
        height: u32,
    ) -> Result<Tensor<B, 4>, BurnDetectorError> {
        let (model_height, model_width) = self.model.input_size();
        if (height, width) != (model_height, model_width) {
            return Err(BurnDetectorError::UnsupportedResolution {
                width,
                height,
                model_width,
                model_height,
            });
        }

        let plane = (width * height) as usize;
        if input.len() != plane * 3 {
            return Err(BurnDetectorError::InvalidFrameSize {
                width,
                height,
                expected: plane * 3,
                got: input.len(),
            });
        }

        let mut data = vec![0.0f32; plane * 3];
        for (i, bgr) in input.chunks_exact(3).enumerate() {
            data[i] = bgr[2] as f32 / 255.0;
            data[plane + i] = bgr[1] as f32 / 255.0;
            data[2 * plane + i] = bgr[0] as f32 / 255.0;
        }

        Ok(
            Tensor::<B, 1>::from_floats(data.as_slice(), &self.device).reshape([
                1,
                3,
                height as usize,
                width as usize,
            ]),
        )
    }

    /// Keep confident detections whose class id the vocabulary knows.
    fn postprocess(&self, raw_detections: Vec<RawDetection>) -> Vec<Detection> {
        raw_detections
            .into_iter()
            .filter(|d| d.score >= self.conf_threshold)
            .filter_map(|d| {
                let Some(label) = self.vocabulary.label(d.class_id) else {
                    trace!(class_id = d.class_id, "dropping detection with unknown class id");
                    return None;
                };
                Some(
                    DetectionBuilder::new(label)
                        .bbox(self.model.bbox_layout(), d.bbox)
                        .score(d.score)
                        .build(),
                )
            })
            .collect()
    }
}

impl<B: Backend, M: BurnModel<B>> DetectionSource for BurnDetector<B, M> {
    type Error = BurnDetectorError;

    fn detect(
        &mut self,
        input: &[u8],
        width: u32,
        height: u32,
    ) -> Result<Vec<Detection>, Self::Error> {
        let tensor = self.preprocess(input, width, height)?;
        let raw_detections = self.model.forward(tensor);
        Ok(self.postprocess(raw_detections))
    }
}
