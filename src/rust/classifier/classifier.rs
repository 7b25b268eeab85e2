use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use log::{debug, error, warn};

use super::decoder::{decode_prediction, Prediction};
use super::decoder::ScoreVector;
use super::encoder::{FeatureVector, TextEncoder};
use super::error::ClassifierError;
use super::labels::LabelTable;
use super::model::ScoringModel;
use crate::config::ClassifierConfig;

/// The only failure value callers of [`Classifier::predict`] ever see.
pub const ERROR_SENTINEL: &str = "error";

/// Encodes text, scores it with the model and decodes the winning label.
///
/// # Thread Safety
///
/// The vocabulary and label tables are read-only after construction and the
/// model is required to be `Send + Sync`, so a `Classifier` can be shared
/// across threads with `Arc`.
///
/// ```rust
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use emotion_classifier::{Classifier, ClassifierError, FeatureVector, ScoreVector,
///     ScoringModel, VocabularyTable, LabelTable};
///
/// struct Fixed;
/// impl ScoringModel for Fixed {
///     fn score(&self, _: &FeatureVector) -> Result<ScoreVector, ClassifierError> {
///         Ok(ScoreVector::from(vec![0.1, 0.9]))
///     }
/// }
///
/// let classifier = Classifier::builder()
///     .with_vocabulary(VocabularyTable::from_pairs([("happy", 3)]))
///     .with_labels(LabelTable::from_labels(["sadness", "joy"]))
///     .with_scoring_model(Fixed)
///     .build()?;
///
/// assert_eq!(classifier.predict("I am happy"), "joy");
/// # Ok(())
/// # }
/// ```
pub struct Classifier {
    pub(crate) encoder: TextEncoder,
    pub(crate) labels: Arc<LabelTable>,
    pub(crate) model: Arc<dyn ScoringModel>,
    pub(crate) inference_timeout: Option<Duration>,
}

// Compile-time verification of thread-safety
const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn verify_thread_safety() {
        assert_send_sync::<Classifier>();
    }
};

impl std::fmt::Debug for Classifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Classifier")
            .field("encoder", &self.encoder)
            .field("labels", &self.labels)
            .field("inference_timeout", &self.inference_timeout)
            .finish_non_exhaustive()
    }
}

impl Classifier {
    /// Creates a new ClassifierBuilder for fluent construction
    pub fn builder() -> super::builder::ClassifierBuilder {
        super::builder::ClassifierBuilder::new()
    }

    /// Loads tables from the configured files and opens the model lazily.
    pub fn from_config(config: &ClassifierConfig) -> Result<Self, ClassifierError> {
        super::builder::ClassifierBuilder::from_config(config).build()
    }

    /// Returns information about the classifier's current state
    pub fn info(&self) -> super::ClassifierInfo {
        super::ClassifierInfo {
            max_len: self.encoder.max_len(),
            vocabulary_size: self.encoder.vocabulary().len(),
            oov_index: self.encoder.oov_index(),
            num_classes: self.labels.len(),
            class_labels: self.labels.as_slice().to_vec(),
        }
    }

    pub fn encoder(&self) -> &TextEncoder {
        &self.encoder
    }

    pub fn labels(&self) -> &LabelTable {
        &self.labels
    }

    /// Bound applied to every model call made by [`classify`](Self::classify).
    pub fn inference_timeout(&self) -> Option<Duration> {
        self.inference_timeout
    }

    /// Classifies `text`, keeping the cause of any failure.
    ///
    /// Empty or punctuation-only text is not an error: it encodes to an
    /// all-padding vector and is scored like any other input. A panicking
    /// model is reported as [`ClassifierError::Inference`]. With an
    /// inference timeout configured, the model runs on its own thread and a
    /// call past the bound fails with [`ClassifierError::InferenceTimeout`].
    pub fn classify(&self, text: &str) -> Result<Prediction, ClassifierError> {
        let features = self.encoder.encode(text);
        let scores = match self.inference_timeout {
            Some(limit) => self.score_bounded(features, limit)?,
            None => score_guarded(&*self.model, &features)?,
        };
        decode_prediction(&scores.to_vec(), &self.labels)
    }

    /// Classifies `text`, returning the label or [`ERROR_SENTINEL`].
    pub fn predict(&self, text: &str) -> String {
        Self::flatten(self.classify(text))
    }

    /// Like [`classify`](Self::classify), bounding the model call by `timeout`.
    ///
    /// The model runs on tokio's blocking pool; a call that exceeds the bound
    /// is abandoned and reported as [`ClassifierError::InferenceTimeout`].
    pub async fn classify_with_timeout(
        &self,
        text: &str,
        timeout: Duration,
    ) -> Result<Prediction, ClassifierError> {
        let features = self.encoder.encode(text);
        let model = Arc::clone(&self.model);
        let task = tokio::task::spawn_blocking(move || score_guarded(&*model, &features));

        let scores = match tokio::time::timeout(timeout, task).await {
            Ok(Ok(result)) => result?,
            Ok(Err(join_error)) => {
                return Err(ClassifierError::Inference(format!("Scoring task failed: {}", join_error)))
            }
            Err(_) => return Err(ClassifierError::InferenceTimeout(timeout)),
        };
        decode_prediction(&scores.to_vec(), &self.labels)
    }

    /// Like [`predict`](Self::predict), bounding the model call by `timeout`.
    pub async fn predict_with_timeout(&self, text: &str, timeout: Duration) -> String {
        Self::flatten(self.classify_with_timeout(text, timeout).await)
    }

    fn score_bounded(&self, features: FeatureVector, limit: Duration) -> Result<ScoreVector, ClassifierError> {
        let model = Arc::clone(&self.model);
        let (sender, receiver) = mpsc::channel();
        thread::Builder::new()
            .name("emotion-classifier-score".into())
            .spawn(move || {
                // The receiver is gone once the caller has timed out.
                let _ = sender.send(score_guarded(&*model, &features));
            })
            .map_err(|e| ClassifierError::Inference(format!("Failed to start scoring thread: {}", e)))?;

        match receiver.recv_timeout(limit) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => {
                warn!("Model call exceeded {:?}, abandoning it", limit);
                Err(ClassifierError::InferenceTimeout(limit))
            }
            Err(RecvTimeoutError::Disconnected) => {
                Err(ClassifierError::Inference("Scoring thread exited without a result".into()))
            }
        }
    }

    fn flatten(result: Result<Prediction, ClassifierError>) -> String {
        match result {
            Ok(prediction) => {
                debug!("Predicted '{}' (score {:.4})", prediction.label, prediction.score);
                prediction.label
            }
            Err(e) => {
                error!("Prediction failed [{}]: {}", e.kind(), e);
                ERROR_SENTINEL.to_string()
            }
        }
    }
}

/// Runs the model, turning a panic into an inference error.
fn score_guarded(model: &dyn ScoringModel, features: &FeatureVector) -> Result<ScoreVector, ClassifierError> {
    catch_unwind(AssertUnwindSafe(|| model.score(features))).unwrap_or_else(|panic| {
        Err(ClassifierError::Inference(format!(
            "Scoring model panicked: {}",
            panic_message(panic.as_ref())
        )))
    })
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        msg
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg
    } else {
        "unknown panic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FeatureVector, ScoreVector, VocabularyTable};

    struct Fixed(Vec<f32>);

    impl ScoringModel for Fixed {
        fn score(&self, _features: &FeatureVector) -> Result<ScoreVector, ClassifierError> {
            Ok(ScoreVector::from(self.0.clone()))
        }
    }

    fn classifier(scores: Vec<f32>) -> Classifier {
        Classifier::builder()
            .with_vocabulary(VocabularyTable::from_pairs([("joy", 1)]))
            .with_labels(LabelTable::from_labels(["joy", "sadness", "anger"]))
            .with_scoring_model(Fixed(scores))
            .build()
            .unwrap()
    }

    #[test]
    fn test_class_info() {
        let info = classifier(vec![0.2, 0.3, 0.5]).info();
        assert_eq!(info.num_classes, 3);
        assert_eq!(info.max_len, 100);
        assert_eq!(info.vocabulary_size, 1);
        assert_eq!(info.class_labels[2], "anger");
    }

    #[test]
    fn test_mismatch_flattens_to_sentinel() {
        let classifier = classifier(vec![0.2, 0.8]);
        assert!(matches!(
            classifier.classify("anything"),
            Err(ClassifierError::LabelCountMismatch { scores: 2, labels: 3 })
        ));
        assert_eq!(classifier.predict("anything"), ERROR_SENTINEL);
    }

    #[test]
    fn test_panic_message() {
        let boxed: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(boxed.as_ref()), "boom");
        let boxed: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(boxed.as_ref()), "bang");
        let boxed: Box<dyn Any + Send> = Box::new(7u8);
        assert_eq!(panic_message(boxed.as_ref()), "unknown panic");
    }

    #[test]
    fn test_empty_text_is_scored() {
        let classifier = classifier(vec![0.2, 0.3, 0.5]);
        assert_eq!(classifier.predict(""), "anger");
    }
}
