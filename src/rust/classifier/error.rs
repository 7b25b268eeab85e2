use ort::Error as OrtError;
use std::fmt;
use std::time::Duration;

/// Represents the different types of errors that can occur in the classification pipeline.
///
/// The flat `"error"` string returned by [`Classifier::predict`](crate::Classifier::predict)
/// is produced from these variants; callers that need the cause use
/// [`Classifier::classify`](crate::Classifier::classify) instead.
#[derive(Debug)]
pub enum ClassifierError {
    /// The scoring model could not be initialized (missing artifact, corrupt format)
    ModelLoad(String),
    /// The scoring model accepted input but failed while scoring it
    Inference(String),
    /// The scoring model did not answer within the configured bound
    InferenceTimeout(Duration),
    /// The score vector width disagrees with the label table width
    LabelCountMismatch { scores: usize, labels: usize },
    /// Error occurred while assembling a classifier
    BuildError(String),
    /// Error occurred while reading or interpreting configuration
    ConfigError(String),
    /// Error occurred due to invalid input parameters
    ValidationError(String),
}

impl ClassifierError {
    /// Short, stable name of the failure kind, used as a logging key.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ModelLoad(_) => "model_load",
            Self::Inference(_) => "inference",
            Self::InferenceTimeout(_) => "inference_timeout",
            Self::LabelCountMismatch { .. } => "label_count_mismatch",
            Self::BuildError(_) => "build",
            Self::ConfigError(_) => "config",
            Self::ValidationError(_) => "validation",
        }
    }
}

impl fmt::Display for ClassifierError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ModelLoad(msg) => write!(f, "Model load error: {}", msg),
            Self::Inference(msg) => write!(f, "Inference error: {}", msg),
            Self::InferenceTimeout(limit) => write!(f, "Inference timed out after {:?}", limit),
            Self::LabelCountMismatch { scores, labels } => write!(
                f,
                "Label count mismatch: model produced {} scores but {} labels are loaded",
                scores, labels
            ),
            Self::BuildError(msg) => write!(f, "Build error: {}", msg),
            Self::ConfigError(msg) => write!(f, "Config error: {}", msg),
            Self::ValidationError(msg) => write!(f, "Validation error: {}", msg),
        }
    }
}

impl std::error::Error for ClassifierError {}

// Runtime errors raised outside of session creation happen while scoring.
impl From<OrtError> for ClassifierError {
    fn from(err: OrtError) -> Self {
        ClassifierError::Inference(err.to_string())
    }
}
