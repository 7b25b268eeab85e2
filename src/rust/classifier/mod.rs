mod error;
mod vocabulary;
mod labels;
pub mod encoder;
pub mod decoder;
pub mod model;
pub mod builder;
mod classifier;

pub use error::ClassifierError;
pub use vocabulary::{VocabularyTable, MAX_INDEX};
pub use labels::LabelTable;
pub use encoder::{FeatureVector, OovPolicy, TextEncoder, DEFAULT_MAX_LEN};
pub use decoder::{Prediction, ScoreVector};
pub use model::{LazyOnnxModel, OnnxModel, OnnxModelConfig, ScoringModel, SessionLifecycle};
pub use builder::ClassifierBuilder;
pub use classifier::{Classifier, ERROR_SENTINEL};

/// Information about the current state and configuration of a classifier
#[derive(Debug, Clone)]
pub struct ClassifierInfo {
    /// Fixed length of every feature vector
    pub max_len: usize,
    /// Number of entries in the vocabulary
    pub vocabulary_size: usize,
    /// Index assigned to out-of-vocabulary tokens
    pub oov_index: u32,
    /// Number of classes the model scores
    pub num_classes: usize,
    /// Labels of the classes, in class-index order
    pub class_labels: Vec<String>,
}
