use std::cmp::Ordering;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// The task kind every session asks its provider for unless configured otherwise.
pub const TEXT_CLASSIFICATION: &str = "text-classification";

/// A single label/confidence pair as produced by a loaded model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPrediction {
    /// The predicted category (e.g. "POSITIVE")
    pub label: String,
    /// Confidence score in `[0, 1]`
    pub score: f32,
}

impl RawPrediction {
    pub fn new(label: impl Into<String>, score: f32) -> Self {
        Self {
            label: label.into(),
            score,
        }
    }
}

/// A loaded, callable classifier.
///
/// Implementations return predictions ordered by descending confidence and
/// never return an empty list on success.
#[async_trait]
pub trait TextClassifier: Send + Sync {
    /// Runs the model against `text`
    async fn classify(&self, text: &str) -> anyhow::Result<Vec<RawPrediction>>;
}

/// Produces classifiers for a task kind and model identifier.
///
/// A provider owns downloading and caching of model weights. A session calls
/// `load` at most once per successful load.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Loads the model identified by `model` for the given `task`
    async fn load(&self, task: &str, model: &str) -> anyhow::Result<Arc<dyn TextClassifier>>;
}

/// Returns the highest-confidence prediction.
///
/// Ties keep the earliest entry, so a provider that honours the descending
/// ordering always yields its first element.
pub(crate) fn top_prediction(predictions: Vec<RawPrediction>) -> Option<RawPrediction> {
    predictions.into_iter().fold(None, |best, candidate| match best {
        Some(current) if candidate.score.partial_cmp(&current.score) != Some(Ordering::Greater) => {
            Some(current)
        }
        _ => Some(candidate),
    })
}
