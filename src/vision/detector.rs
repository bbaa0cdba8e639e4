//! Detection decoding
//!
//! Turns raw model output into at most one gesture decision per frame: scan
//! all valid detections, keep the single highest score above the confidence
//! threshold, and map its class index through the gesture table. No temporal
//! smoothing and no multi-object handling; ties keep the first entry seen.

use image::RgbImage;

use super::{DetectionModel, RawDetections};
use crate::Result;
use crate::gesture::GestureMap;

/// A single accepted detection
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    /// Gesture label, or the unknown sentinel for unmapped class indices
    pub label: String,
    /// Model confidence score
    pub confidence: f32,
    /// Bounding box as `[y, x, height, width]` in model input coordinates
    pub bbox: [f32; 4],
}

/// Decodes raw model output into gesture decisions
#[derive(Debug, Clone)]
pub struct GestureDetector {
    gestures: GestureMap,
    threshold: f32,
}

impl GestureDetector {
    /// Create a detector with the given gesture table and confidence threshold
    #[must_use]
    pub const fn new(gestures: GestureMap, threshold: f32) -> Self {
        Self { gestures, threshold }
    }

    /// Run inference on a frame and decode the result
    ///
    /// # Errors
    ///
    /// Returns error if inference fails
    pub async fn detect(
        &self,
        model: &dyn DetectionModel,
        frame: &RgbImage,
    ) -> Result<Option<Detection>> {
        let raw = model.infer(frame).await?;
        Ok(self.decode(&raw))
    }

    /// Decode raw detections into at most one gesture
    ///
    /// Returns `None` when no valid detection scores above the threshold.
    #[must_use]
    pub fn decode(&self, raw: &RawDetections) -> Option<Detection> {
        let valid = raw.valid.min(raw.scores.len()).min(raw.classes.len());

        let mut best: Option<(usize, f32)> = None;
        for i in 0..valid {
            let score = raw.scores[i];
            if score > self.threshold && best.is_none_or(|(_, top)| score > top) {
                best = Some((i, score));
            }
        }

        best.map(|(i, confidence)| {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let class_index = raw.classes[i].round().max(0.0) as usize;
            Detection {
                label: self.gestures.label_for(class_index).to_string(),
                confidence,
                bbox: raw.boxes.get(i).copied().unwrap_or_default(),
            }
        })
    }

    /// The configured confidence threshold
    #[must_use]
    pub const fn threshold(&self) -> f32 {
        self.threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gesture::UNKNOWN_LABEL;

    fn raw(scores: &[f32], classes: &[f32], valid: usize) -> RawDetections {
        RawDetections {
            boxes: vec![[0.0; 4]; scores.len()],
            scores: scores.to_vec(),
            classes: classes.to_vec(),
            valid,
        }
    }

    fn detector() -> GestureDetector {
        GestureDetector::new(GestureMap::default(), 0.5)
    }

    #[test]
    fn no_score_above_threshold_emits_nothing() {
        let result = detector().decode(&raw(&[0.5, 0.3, 0.49], &[0.0, 1.0, 2.0], 3));
        assert!(result.is_none());
    }

    #[test]
    fn highest_score_wins() {
        let result = detector()
            .decode(&raw(&[0.6, 0.9, 0.7], &[0.0, 4.0, 2.0], 3))
            .unwrap();
        assert_eq!(result.label, "fist");
        assert!((result.confidence - 0.9).abs() < f32::EPSILON);
    }

    #[test]
    fn tie_keeps_first_seen() {
        let result = detector()
            .decode(&raw(&[0.8, 0.8], &[1.0, 3.0], 2))
            .unwrap();
        assert_eq!(result.label, "open_palm");
    }

    #[test]
    fn unmapped_class_is_unknown() {
        let result = detector().decode(&raw(&[0.9], &[42.0], 1)).unwrap();
        assert_eq!(result.label, UNKNOWN_LABEL);
    }

    #[test]
    fn entries_past_valid_count_are_ignored() {
        // High score at index 1, but only the first entry is valid
        let result = detector().decode(&raw(&[0.2, 0.95], &[0.0, 4.0], 1));
        assert!(result.is_none());
    }

    #[test]
    fn class_index_is_rounded() {
        let result = detector().decode(&raw(&[0.9], &[3.6], 1)).unwrap();
        assert_eq!(result.label, "fist");
    }
}
