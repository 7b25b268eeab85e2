//! Text emotion classifier: vocabulary encoding, ONNX scoring and label decoding.
//!
//! Raw text is split on whitespace, normalized to lower-case alphanumeric
//! tokens, indexed through a vocabulary and padded or truncated to a fixed
//! length. A pre-trained model scores that vector and the highest-scoring
//! class is looked up in the label table.
//!
//! # Basic Usage
//!
//! ```rust,no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use emotion_classifier::{Classifier, ClassifierConfig};
//!
//! // model.onnx, word_index.txt and labels.txt in /opt/herta
//! let classifier = Classifier::from_config(&ClassifierConfig::from_base_dir("/opt/herta"))?;
//!
//! // Either a label from labels.txt or "error"
//! let label = classifier.predict("i feel like the world is against me");
//! println!("Predicted emotion: {}", label);
//!
//! // The typed result keeps the failure cause and all scores
//! let prediction = classifier.classify("what a lovely surprise")?;
//! println!("{} ({:.2})", prediction.label, prediction.score);
//! # Ok(())
//! # }
//! ```
//!
//! # Encoding only
//!
//! ```rust
//! use std::sync::Arc;
//! use emotion_classifier::{TextEncoder, VocabularyTable};
//!
//! let vocabulary = VocabularyTable::from_pairs([("hello", 5), ("world", 7)]);
//! let encoder = TextEncoder::new(Arc::new(vocabulary), 4).unwrap();
//! assert_eq!(encoder.encode("Hello !!! world").to_vec(), vec![5.0, 7.0, 0.0, 0.0]);
//! ```

pub mod classifier;
pub mod config;
pub mod display;
pub mod artifacts;
pub mod ffi;
mod runtime;

pub use classifier::{
    Classifier, ClassifierBuilder, ClassifierError, ClassifierInfo, FeatureVector, LabelTable,
    LazyOnnxModel, OnnxModel, OnnxModelConfig, OovPolicy, Prediction, ScoreVector, ScoringModel,
    SessionLifecycle, TextEncoder, VocabularyTable, DEFAULT_MAX_LEN, ERROR_SENTINEL, MAX_INDEX,
};
pub use classifier::decoder::{argmax, decode, decode_prediction};
pub use config::ClassifierConfig;
pub use display::DisplayState;
pub use artifacts::{ArtifactBundle, ArtifactError, ArtifactKind, ArtifactStore, RemoteFile};
pub use runtime::{create_session_builder, OptimizationLevel, RuntimeConfig};

pub fn init_logger() {
    env_logger::init();
}
