//! Adjustable settings of the classification pipeline.
//!
//! Every path, tensor name and length the pipeline depends on lives in
//! [`ClassifierConfig`]. It can be built from a base directory holding the
//! usual artifact layout, read from a JSON file, or assembled in code.

use std::fs;
use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};

use crate::classifier::{ClassifierError, OovPolicy, SessionLifecycle, DEFAULT_MAX_LEN};
use crate::runtime::RuntimeConfig;

pub const MODEL_FILE: &str = "model.onnx";
pub const VOCABULARY_FILE: &str = "word_index.txt";
pub const LABELS_FILE: &str = "labels.txt";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub vocabulary_path: PathBuf,
    pub labels_path: PathBuf,
    pub model_path: PathBuf,
    pub max_len: usize,
    /// Input tensor name; the graph's first input when unset
    pub input_name: Option<String>,
    /// Output tensor name; the graph's first output when unset
    pub output_name: Option<String>,
    pub oov_policy: OovPolicy,
    pub lifecycle: SessionLifecycle,
    /// Upper bound on a single model call, in milliseconds
    pub inference_timeout_ms: Option<u64>,
    pub runtime: RuntimeConfig,
}

impl Default for ClassifierConfig {
    /// Artifacts in the current working directory.
    fn default() -> Self {
        Self::from_base_dir(".")
    }
}

impl ClassifierConfig {
    /// Expects `model.onnx`, `word_index.txt` and `labels.txt` in `base_dir`.
    pub fn from_base_dir(base_dir: impl AsRef<Path>) -> Self {
        let base_dir = base_dir.as_ref();
        Self {
            vocabulary_path: base_dir.join(VOCABULARY_FILE),
            labels_path: base_dir.join(LABELS_FILE),
            model_path: base_dir.join(MODEL_FILE),
            max_len: DEFAULT_MAX_LEN,
            input_name: None,
            output_name: None,
            oov_policy: OovPolicy::Pad,
            lifecycle: SessionLifecycle::Shared,
            inference_timeout_ms: None,
            runtime: RuntimeConfig::default(),
        }
    }

    /// Reads a JSON config. Missing fields take their defaults and relative
    /// paths are resolved against the config file's directory.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ClassifierError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| ClassifierError::ConfigError(format!("Failed to read {}: {}", path.display(), e)))?;
        let mut config: Self = serde_json::from_str(&content)
            .map_err(|e| ClassifierError::ConfigError(format!("Invalid config {}: {}", path.display(), e)))?;

        if let Some(dir) = path.parent() {
            config.resolve_relative_to(dir);
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ClassifierError> {
        if self.max_len == 0 {
            return Err(ClassifierError::ConfigError("max_len must be at least 1".into()));
        }
        if self.inference_timeout_ms == Some(0) {
            return Err(ClassifierError::ConfigError("inference_timeout_ms must be positive".into()));
        }
        Ok(())
    }

    fn resolve_relative_to(&mut self, dir: &Path) {
        for path in [&mut self.vocabulary_path, &mut self.labels_path, &mut self.model_path] {
            if path.is_relative() {
                *path = dir.join(&*path);
            }
        }
    }
}
