//! Gesture label table
//!
//! Maps model class indices to gesture names. The table is closed: it is fixed
//! at process start and any index outside it resolves to [`UNKNOWN_LABEL`].

/// Sentinel label for class indices not present in the table
pub const UNKNOWN_LABEL: &str = "unknown";

/// Built-in gesture labels, indexed by model class
pub const DEFAULT_GESTURES: [&str; 5] =
    ["thumbs_up", "open_palm", "pointing", "peace_sign", "fist"];

/// Closed mapping from class index to gesture label
#[derive(Debug, Clone)]
pub struct GestureMap {
    labels: Vec<String>,
}

impl GestureMap {
    /// Create a gesture map from an ordered label list
    #[must_use]
    pub fn from_labels(labels: Vec<String>) -> Self {
        Self { labels }
    }

    /// Resolve a class index to its label
    ///
    /// Indices outside the table resolve to [`UNKNOWN_LABEL`].
    #[must_use]
    pub fn label_for(&self, class_index: usize) -> &str {
        self.labels
            .get(class_index)
            .map_or(UNKNOWN_LABEL, String::as_str)
    }

    /// Number of known gestures
    #[must_use]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Whether the table is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// All known labels, in class-index order
    #[must_use]
    pub fn labels(&self) -> &[String] {
        &self.labels
    }
}

impl Default for GestureMap {
    fn default() -> Self {
        Self::from_labels(DEFAULT_GESTURES.iter().map(ToString::to_string).collect())
    }
}
