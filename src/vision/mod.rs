//! Vision pipeline: camera capture, model inference, and detection decoding

mod capture;
mod detector;
mod model;

pub use capture::{CameraCapture, FrameHandle};
pub use detector::{Detection, GestureDetector};
pub use model::{DetectionModel, MODEL_INPUT_SIZE, OnnxGestureModel, RawDetections};
