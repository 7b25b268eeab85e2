use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use log::{info, warn};

use super::classifier::Classifier;
use super::encoder::{OovPolicy, TextEncoder, DEFAULT_MAX_LEN};
use super::error::ClassifierError;
use super::labels::LabelTable;
use super::model::{LazyOnnxModel, OnnxModelConfig, ScoringModel, SessionLifecycle};
use super::vocabulary::VocabularyTable;
use crate::config::ClassifierConfig;
use crate::runtime::RuntimeConfig;

/// Where the vocabulary comes from.
#[derive(Debug)]
enum VocabularySource {
    File(PathBuf),
    Table(Arc<VocabularyTable>),
}

#[derive(Debug)]
enum LabelSource {
    File(PathBuf),
    Table(Arc<LabelTable>),
}

/// A builder for constructing a Classifier with a fluent interface.
pub struct ClassifierBuilder {
    vocabulary: Option<VocabularySource>,
    labels: Option<LabelSource>,
    max_len: usize,
    oov_policy: OovPolicy,
    model: Option<Arc<dyn ScoringModel>>,
    onnx: Option<OnnxModelConfig>,
    lifecycle: SessionLifecycle,
    /// Overrides the runtime of the ONNX config when set
    runtime_config: Option<RuntimeConfig>,
    inference_timeout: Option<Duration>,
}

impl Default for ClassifierBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ClassifierBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassifierBuilder")
            .field("vocabulary", &self.vocabulary)
            .field("labels", &self.labels)
            .field("max_len", &self.max_len)
            .field("oov_policy", &self.oov_policy)
            .field("has_model", &self.model.is_some())
            .field("onnx", &self.onnx)
            .field("lifecycle", &self.lifecycle)
            .field("runtime_config", &self.runtime_config)
            .field("inference_timeout", &self.inference_timeout)
            .finish()
    }
}

impl ClassifierBuilder {
    /// Creates a new empty ClassifierBuilder instance with default configuration
    ///
    /// # Example
    /// ```
    /// use emotion_classifier::ClassifierBuilder;
    ///
    /// let builder = ClassifierBuilder::new();
    /// ```
    pub fn new() -> Self {
        Self {
            vocabulary: None,
            labels: None,
            max_len: DEFAULT_MAX_LEN,
            oov_policy: OovPolicy::Pad,
            model: None,
            onnx: None,
            lifecycle: SessionLifecycle::Shared,
            runtime_config: None,
            inference_timeout: None,
        }
    }

    /// Starts a builder from a configuration, with the ONNX model opened lazily.
    pub fn from_config(config: &ClassifierConfig) -> Self {
        let mut onnx = OnnxModelConfig::new(&config.model_path);
        onnx.input_name = config.input_name.clone();
        onnx.output_name = config.output_name.clone();

        let builder = Self::new()
            .with_vocabulary_file(&config.vocabulary_path)
            .with_labels_file(&config.labels_path)
            .with_max_len(config.max_len)
            .with_oov_policy(config.oov_policy.clone())
            .with_runtime_config(config.runtime.clone())
            .with_session_lifecycle(config.lifecycle)
            .with_onnx_model(onnx);

        match config.inference_timeout_ms {
            Some(ms) => builder.with_inference_timeout(Duration::from_millis(ms)),
            None => builder,
        }
    }

    /// Reads the vocabulary from a `<token> <index>` file at build time.
    /// A missing file gives an empty vocabulary.
    pub fn with_vocabulary_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.vocabulary = Some(VocabularySource::File(path.into()));
        self
    }

    pub fn with_vocabulary(mut self, vocabulary: impl Into<Arc<VocabularyTable>>) -> Self {
        self.vocabulary = Some(VocabularySource::Table(vocabulary.into()));
        self
    }

    /// Reads labels from a one-per-line file at build time.
    /// A missing file gives an empty table, and every prediction then fails.
    pub fn with_labels_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.labels = Some(LabelSource::File(path.into()));
        self
    }

    pub fn with_labels(mut self, labels: impl Into<Arc<LabelTable>>) -> Self {
        self.labels = Some(LabelSource::Table(labels.into()));
        self
    }

    /// Sets the fixed feature vector length (default 100).
    pub fn with_max_len(mut self, max_len: usize) -> Self {
        self.max_len = max_len;
        self
    }

    pub fn with_oov_policy(mut self, policy: OovPolicy) -> Self {
        self.oov_policy = policy;
        self
    }

    /// Uses an already constructed scoring model.
    ///
    /// Replaces any ONNX model configured earlier.
    pub fn with_scoring_model(mut self, model: impl ScoringModel + 'static) -> Self {
        self.model = Some(Arc::new(model));
        self.onnx = None;
        self
    }

    /// Uses an ONNX model file, opened on the first prediction.
    ///
    /// Replaces any scoring model set earlier.
    pub fn with_onnx_model(mut self, config: OnnxModelConfig) -> Self {
        self.onnx = Some(config);
        self.model = None;
        self
    }

    /// Sets the runtime configuration for ONNX model execution
    ///
    /// # Example
    /// ```
    /// use emotion_classifier::{ClassifierBuilder, RuntimeConfig};
    ///
    /// let config = RuntimeConfig::default();
    /// let builder = ClassifierBuilder::new()
    ///     .with_runtime_config(config);
    /// ```
    pub fn with_runtime_config(mut self, config: RuntimeConfig) -> Self {
        self.runtime_config = Some(config);
        self
    }

    /// Bounds every model call; a slower call fails with `InferenceTimeout`.
    pub fn with_inference_timeout(mut self, timeout: Duration) -> Self {
        self.inference_timeout = Some(timeout);
        self
    }

    pub fn with_session_lifecycle(mut self, lifecycle: SessionLifecycle) -> Self {
        self.lifecycle = lifecycle;
        self
    }

    /// Builds and returns the final Classifier instance
    ///
    /// Table files are read here; the ONNX model is not opened until the
    /// first prediction, so a missing model surfaces as a `ModelLoad` failure
    /// on that call rather than here.
    ///
    /// # Returns
    /// * `Result<Classifier, ClassifierError>` - The constructed Classifier if successful, or an error if:
    ///   - No vocabulary, labels or model were given
    ///   - `max_len` is zero
    ///   - The OOV policy names a token the vocabulary does not contain
    pub fn build(self) -> Result<Classifier, ClassifierError> {
        let vocabulary = match self.vocabulary {
            Some(VocabularySource::File(path)) => Arc::new(VocabularyTable::load(path)),
            Some(VocabularySource::Table(table)) => table,
            None => return Err(ClassifierError::BuildError("A vocabulary must be set".into())),
        };
        let labels = match self.labels {
            Some(LabelSource::File(path)) => Arc::new(LabelTable::load(path)),
            Some(LabelSource::Table(table)) => table,
            None => return Err(ClassifierError::BuildError("Labels must be set".into())),
        };

        let model: Arc<dyn ScoringModel> = match (self.model, self.onnx) {
            (Some(model), _) => model,
            (None, Some(onnx)) => {
                let onnx = Self::effective_onnx_config(onnx, self.runtime_config);
                Arc::new(LazyOnnxModel::new(onnx, self.lifecycle))
            }
            (None, None) => return Err(ClassifierError::BuildError("A scoring model must be set".into())),
        };

        if self.inference_timeout == Some(Duration::ZERO) {
            return Err(ClassifierError::BuildError("Inference timeout must be positive".into()));
        }

        let encoder = TextEncoder::with_oov_policy(vocabulary, self.max_len, self.oov_policy)?;

        if labels.is_empty() {
            warn!("Classifier built with no labels; every prediction will fail");
        }
        info!(
            "Classifier ready: {} vocabulary entries, {} labels, max_len {}",
            encoder.vocabulary().len(),
            labels.len(),
            encoder.max_len()
        );

        Ok(Classifier {
            encoder,
            labels,
            model,
            inference_timeout: self.inference_timeout,
        })
    }

    fn effective_onnx_config(mut onnx: OnnxModelConfig, runtime: Option<RuntimeConfig>) -> OnnxModelConfig {
        if let Some(runtime) = runtime {
            onnx.runtime = runtime;
        }
        onnx
    }
}
