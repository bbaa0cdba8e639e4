//! Detection model inference
//!
//! The model is consumed as a black box: one input tensor in, four parallel
//! output tensors out (boxes, scores, classes, valid-count). The ONNX runtime
//! is wrapped behind [`DetectionModel`] so the rest of the pipeline never sees
//! it directly.

use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use image::RgbImage;
use image::imageops::FilterType;
use ndarray::{Array4, ArrayViewD};
use ort::session::Session;
use ort::session::builder::GraphOptimizationLevel;
use ort::value::Tensor;

use crate::{Error, Result};

/// Model input resolution (square), matching the exported detection model
pub const MODEL_INPUT_SIZE: u32 = 640;

/// Raw per-frame model output: parallel detection arrays
#[derive(Debug, Clone, Default)]
pub struct RawDetections {
    /// Bounding boxes, one `[y, x, height, width]` entry per detection
    pub boxes: Vec<[f32; 4]>,
    /// Confidence score per detection
    pub scores: Vec<f32>,
    /// Class index per detection (float, as emitted by the model)
    pub classes: Vec<f32>,
    /// Number of valid entries in the parallel arrays
    pub valid: usize,
}

/// Trait for detection model backends
#[async_trait]
pub trait DetectionModel: Send + Sync {
    /// Run inference on a single frame
    ///
    /// # Errors
    ///
    /// Returns error if inference fails
    async fn infer(&self, frame: &RgbImage) -> Result<RawDetections>;

    /// Backend name for logging
    fn name(&self) -> &'static str;
}

/// ONNX-backed gesture detection model
pub struct OnnxGestureModel {
    session: Mutex<Session>,
    input_name: String,
    output_names: Vec<String>,
}

impl OnnxGestureModel {
    /// Load a model from an ONNX file
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be loaded or the model does not expose
    /// the expected four output tensors
    pub fn load(path: &Path) -> Result<Self> {
        let session = Session::builder()
            .and_then(|b| Ok(b.with_optimization_level(GraphOptimizationLevel::Level3)?))
            .and_then(|mut b| b.commit_from_file(path))
            .map_err(|e| Error::Model(format!("failed to load {}: {e}", path.display())))?;

        let input_name = session
            .inputs()
            .first()
            .map(|i| i.name().to_string())
            .ok_or_else(|| Error::Model("model has no input tensor".to_string()))?;

        let output_names: Vec<String> =
            session.outputs().iter().map(|o| o.name().to_string()).collect();
        if output_names.len() < 4 {
            return Err(Error::Model(format!(
                "expected 4 output tensors (boxes, scores, classes, valid-count), found {}",
                output_names.len()
            )));
        }

        tracing::info!(
            path = %path.display(),
            input = %input_name,
            outputs = ?output_names,
            "detection model loaded"
        );

        Ok(Self {
            session: Mutex::new(session),
            input_name,
            output_names,
        })
    }
}

#[async_trait]
impl DetectionModel for OnnxGestureModel {
    async fn infer(&self, frame: &RgbImage) -> Result<RawDetections> {
        let input = preprocess(frame);
        let tensor =
            Tensor::from_array(input).map_err(|e| Error::Inference(e.to_string()))?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| Error::Inference("model session poisoned".to_string()))?;

        let outputs = session
            .run(ort::inputs![self.input_name.as_str() => tensor])
            .map_err(|e| Error::Inference(e.to_string()))?;

        let boxes_view = outputs[self.output_names[0].as_str()]
            .try_extract_array::<f32>()
            .map_err(|e| Error::Inference(format!("boxes tensor: {e}")))?;
        let scores_view = outputs[self.output_names[1].as_str()]
            .try_extract_array::<f32>()
            .map_err(|e| Error::Inference(format!("scores tensor: {e}")))?;
        let classes_view = outputs[self.output_names[2].as_str()]
            .try_extract_array::<f32>()
            .map_err(|e| Error::Inference(format!("classes tensor: {e}")))?;

        // The NMS export emits valid-count as int32; older exports use float.
        #[allow(clippy::cast_precision_loss)]
        let valid_value = outputs[self.output_names[3].as_str()]
            .try_extract_array::<i32>()
            .map(|v| v.iter().next().copied().unwrap_or(0) as f32)
            .or_else(|_| {
                outputs[self.output_names[3].as_str()]
                    .try_extract_array::<f32>()
                    .map(|v| v.iter().next().copied().unwrap_or(0.0))
            })
            .map_err(|e| Error::Inference(format!("valid-count tensor: {e}")))?;

        collect_detections(&boxes_view, &scores_view, &classes_view, valid_value)
    }

    fn name(&self) -> &'static str {
        "onnx"
    }
}

/// Gather the parallel output tensors into [`RawDetections`]
///
/// Validates shapes before indexing: boxes must carry at least as many
/// entries as scores with 4 coordinates each, and classes must cover every
/// score. A nonconforming model surfaces an inference error.
fn collect_detections(
    boxes_view: &ArrayViewD<'_, f32>,
    scores_view: &ArrayViewD<'_, f32>,
    classes_view: &ArrayViewD<'_, f32>,
    valid_value: f32,
) -> Result<RawDetections> {
    if boxes_view.ndim() != 3 || scores_view.ndim() != 2 || classes_view.ndim() != 2 {
        return Err(Error::Inference(format!(
            "unexpected output shapes: boxes {:?}, scores {:?}, classes {:?}",
            boxes_view.shape(),
            scores_view.shape(),
            classes_view.shape()
        )));
    }

    let n = scores_view.shape()[1];
    if boxes_view.shape()[1] < n || boxes_view.shape()[2] < 4 || classes_view.shape()[1] < n {
        return Err(Error::Inference(format!(
            "mismatched output shapes: boxes {:?}, classes {:?} do not cover {n} scores",
            boxes_view.shape(),
            classes_view.shape()
        )));
    }

    let mut boxes = Vec::with_capacity(n);
    let mut scores = Vec::with_capacity(n);
    let mut classes = Vec::with_capacity(n);
    for i in 0..n {
        boxes.push([
            boxes_view[[0, i, 0]],
            boxes_view[[0, i, 1]],
            boxes_view[[0, i, 2]],
            boxes_view[[0, i, 3]],
        ]);
        scores.push(scores_view[[0, i]]);
        classes.push(classes_view[[0, i]]);
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let valid = (valid_value.max(0.0) as usize).min(n);

    Ok(RawDetections {
        boxes,
        scores,
        classes,
        valid,
    })
}

/// Resize a frame to the model input resolution and normalize to `[0, 1]` NHWC
fn preprocess(frame: &RgbImage) -> Array4<f32> {
    let size = MODEL_INPUT_SIZE;
    let resized = image::imageops::resize(frame, size, size, FilterType::Triangle);

    let mut input = Array4::<f32>::zeros((1, size as usize, size as usize, 3));
    for (x, y, pixel) in resized.enumerate_pixels() {
        for channel in 0..3 {
            input[[0, y as usize, x as usize, channel]] = f32::from(pixel[channel]) / 255.0;
        }
    }
    input
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array2, Array3};

    #[test]
    fn collect_gathers_parallel_arrays() {
        let boxes = Array3::<f32>::from_elem((1, 2, 4), 0.25).into_dyn();
        let mut scores = Array2::<f32>::zeros((1, 2));
        scores[[0, 0]] = 0.9;
        scores[[0, 1]] = 0.4;
        let scores = scores.into_dyn();
        let classes = Array2::<f32>::from_elem((1, 2), 3.0).into_dyn();

        let raw =
            collect_detections(&boxes.view(), &scores.view(), &classes.view(), 2.0).unwrap();
        assert_eq!(raw.valid, 2);
        assert_eq!(raw.scores, vec![0.9, 0.4]);
        assert_eq!(raw.boxes[0], [0.25; 4]);
    }

    #[test]
    fn short_boxes_tensor_is_an_error_not_a_panic() {
        let boxes = Array3::<f32>::zeros((1, 1, 4)).into_dyn();
        let scores = Array2::<f32>::zeros((1, 3)).into_dyn();
        let classes = Array2::<f32>::zeros((1, 3)).into_dyn();

        let result = collect_detections(&boxes.view(), &scores.view(), &classes.view(), 1.0);
        assert!(matches!(result, Err(Error::Inference(_))));
    }

    #[test]
    fn narrow_box_coordinates_are_an_error() {
        let boxes = Array3::<f32>::zeros((1, 2, 2)).into_dyn();
        let scores = Array2::<f32>::zeros((1, 2)).into_dyn();
        let classes = Array2::<f32>::zeros((1, 2)).into_dyn();

        let result = collect_detections(&boxes.view(), &scores.view(), &classes.view(), 1.0);
        assert!(matches!(result, Err(Error::Inference(_))));
    }

    #[test]
    fn short_classes_tensor_is_an_error_not_a_panic() {
        let boxes = Array3::<f32>::zeros((1, 3, 4)).into_dyn();
        let scores = Array2::<f32>::zeros((1, 3)).into_dyn();
        let classes = Array2::<f32>::zeros((1, 1)).into_dyn();

        let result = collect_detections(&boxes.view(), &scores.view(), &classes.view(), 1.0);
        assert!(matches!(result, Err(Error::Inference(_))));
    }

    #[test]
    fn preprocess_normalizes_and_resizes() {
        let frame = RgbImage::from_pixel(32, 32, image::Rgb([255, 128, 0]));
        let input = preprocess(&frame);

        assert_eq!(
            input.shape(),
            &[1, MODEL_INPUT_SIZE as usize, MODEL_INPUT_SIZE as usize, 3]
        );
        assert!((input[[0, 0, 0, 0]] - 1.0).abs() < 1e-6);
        assert!(input[[0, 0, 0, 2]].abs() < 1e-6);
    }
}
