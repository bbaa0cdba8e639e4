//! Detection pipeline
//!
//! Drives the capture loop: on a fixed timer, grab the latest frame and run
//! detection. When the detected label changes, refine it, synthesize speech,
//! and queue playback. Ticks run serialized inside one task; a tick that
//! outlasts the interval delays the next one rather than overlapping it.
//! Tick failures are logged and end that tick only.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::Result;
use crate::config::VisionConfig;
use crate::refiner::TextRefiner;
use crate::speech::{PlaybackHandle, SpeechService};
use crate::vision::{CameraCapture, DetectionModel, FrameHandle, GestureDetector};

/// Gesture-to-speech detection pipeline
pub struct GesturePipeline {
    capture: CameraCapture,
    model: Arc<dyn DetectionModel>,
    detector: GestureDetector,
    refiner: Arc<TextRefiner>,
    speech: Arc<SpeechService>,
    interval: Duration,
    running: Arc<AtomicBool>,
    task: Option<JoinHandle<()>>,
}

impl GesturePipeline {
    /// Create a pipeline from the vision config and its collaborators
    #[must_use]
    pub fn new(
        vision: &VisionConfig,
        model: Arc<dyn DetectionModel>,
        refiner: Arc<TextRefiner>,
        speech: Arc<SpeechService>,
    ) -> Self {
        Self {
            capture: CameraCapture::new(vision.camera_index),
            model,
            detector: GestureDetector::new(vision.gesture_map(), vision.confidence_threshold),
            refiner,
            speech,
            interval: Duration::from_millis(vision.interval_ms),
            running: Arc::new(AtomicBool::new(false)),
            task: None,
        }
    }

    /// Shared flag reporting whether the loop is running
    #[must_use]
    pub fn running_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    /// Whether the loop is currently running
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.task.is_some()
    }

    /// Start the capture loop
    ///
    /// Acquires the camera and schedules detection ticks. On failure no state
    /// is changed, so a failed start can be retried.
    ///
    /// # Errors
    ///
    /// Returns error if the camera or playback thread cannot be started
    pub fn start(&mut self) -> Result<()> {
        if self.task.is_some() {
            return Ok(());
        }

        self.capture.start()?;

        let playback = match PlaybackHandle::spawn() {
            Ok(playback) => playback,
            Err(e) => {
                self.capture.stop();
                return Err(e);
            }
        };

        self.running.store(true, Ordering::SeqCst);

        let frames = self.capture.frame_handle();
        let model = Arc::clone(&self.model);
        let detector = self.detector.clone();
        let refiner = Arc::clone(&self.refiner);
        let speech = Arc::clone(&self.speech);
        let running = Arc::clone(&self.running);
        let interval = self.interval;

        self.task = Some(tokio::spawn(async move {
            let mut gate = LabelGate::default();
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            while running.load(Ordering::SeqCst) {
                ticker.tick().await;
                if !running.load(Ordering::SeqCst) {
                    break;
                }
                if let Err(e) = run_tick(
                    &frames,
                    model.as_ref(),
                    &detector,
                    &refiner,
                    &speech,
                    &playback,
                    &mut gate,
                )
                .await
                {
                    tracing::error!(error = %e, "detection tick failed");
                }
            }
        }));

        tracing::info!(interval_ms = self.interval.as_millis(), "detection pipeline started");
        Ok(())
    }

    /// Stop the loop and release the camera
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.capture.stop();
        tracing::info!("detection pipeline stopped");
    }
}

impl Drop for GesturePipeline {
    fn drop(&mut self) {
        if self.task.is_some() {
            self.stop();
        }
    }
}

/// One detection tick: detect, gate on label change, refine, speak
async fn run_tick(
    frames: &FrameHandle,
    model: &dyn DetectionModel,
    detector: &GestureDetector,
    refiner: &TextRefiner,
    speech: &SpeechService,
    playback: &PlaybackHandle,
    gate: &mut LabelGate,
) -> Result<()> {
    let Some(frame) = frames.latest() else {
        return Ok(());
    };

    let Some(detection) = detector.detect(model, &frame).await? else {
        return Ok(());
    };

    tracing::trace!(
        label = %detection.label,
        confidence = detection.confidence,
        "gesture detected"
    );

    if !gate.accept(&detection.label) {
        return Ok(());
    }

    tracing::info!(
        label = %detection.label,
        confidence = detection.confidence,
        "gesture changed"
    );

    let refined = refiner.refine(&detection.label).await?;
    let audio = speech.fetch(&refined).await?;
    playback.play(audio);

    tracing::info!(text = %refined, "speaking");
    Ok(())
}

/// Change-detection gate over emitted labels
///
/// Only a label different from the previously accepted one passes; repeats of
/// the same gesture across consecutive ticks do not re-trigger the chain.
#[derive(Debug, Default)]
pub struct LabelGate {
    last: Option<String>,
}

impl LabelGate {
    /// Accept the label if it differs from the last accepted one
    pub fn accept(&mut self, label: &str) -> bool {
        if self.last.as_deref() == Some(label) {
            return false;
        }
        self.last = Some(label.to_string());
        true
    }

    /// Forget the last accepted label
    pub fn reset(&mut self) {
        self.last = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gesture::GestureMap;
    use crate::vision::RawDetections;
    use async_trait::async_trait;
    use image::RgbImage;

    #[test]
    fn gate_passes_first_label() {
        let mut gate = LabelGate::default();
        assert!(gate.accept("fist"));
    }

    #[test]
    fn gate_blocks_repeated_label() {
        let mut gate = LabelGate::default();
        assert!(gate.accept("fist"));
        assert!(!gate.accept("fist"));
        assert!(!gate.accept("fist"));
    }

    #[test]
    fn gate_passes_label_change() {
        let mut gate = LabelGate::default();
        assert!(gate.accept("fist"));
        assert!(gate.accept("open_palm"));
        assert!(gate.accept("fist"));
    }

    #[test]
    fn gate_reset_forgets_last_label() {
        let mut gate = LabelGate::default();
        assert!(gate.accept("fist"));
        gate.reset();
        assert!(gate.accept("fist"));
    }

    struct StubModel {
        raw: RawDetections,
    }

    #[async_trait]
    impl DetectionModel for StubModel {
        async fn infer(&self, _frame: &RgbImage) -> crate::Result<RawDetections> {
            Ok(self.raw.clone())
        }

        fn name(&self) -> &'static str {
            "stub"
        }
    }

    #[tokio::test]
    async fn detect_decodes_model_output() {
        let model = StubModel {
            raw: RawDetections {
                boxes: vec![[0.0; 4]],
                scores: vec![0.8],
                classes: vec![4.0],
                valid: 1,
            },
        };
        let detector = GestureDetector::new(GestureMap::default(), 0.5);
        let frame = RgbImage::new(8, 8);

        let detection = detector.detect(&model, &frame).await.unwrap().unwrap();
        assert_eq!(detection.label, "fist");
    }
}
