use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use ndarray::Array2;
use ort::session::Session;
use ort::value::Tensor;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use super::decoder::ScoreVector;
use super::encoder::FeatureVector;
use super::error::ClassifierError;
use crate::runtime::{create_session_builder, RuntimeConfig};

/// Anything that turns a feature vector into one score per class.
///
/// Implementations are shared across threads by [`Classifier`](crate::Classifier),
/// so `score` must be safe to call concurrently or serialize internally.
pub trait ScoringModel: Send + Sync {
    fn score(&self, features: &FeatureVector) -> Result<ScoreVector, ClassifierError>;
}

impl<M: ScoringModel + ?Sized> ScoringModel for Arc<M> {
    fn score(&self, features: &FeatureVector) -> Result<ScoreVector, ClassifierError> {
        (**self).score(features)
    }
}

impl<M: ScoringModel + ?Sized> ScoringModel for Box<M> {
    fn score(&self, features: &FeatureVector) -> Result<ScoreVector, ClassifierError> {
        (**self).score(features)
    }
}

/// When ONNX sessions are created and released.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionLifecycle {
    /// Create the session on first use and keep it for later calls.
    #[default]
    Shared,
    /// Create a session for every call and drop it afterwards.
    PerCall,
}

/// Where to find an ONNX model and how to talk to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnnxModelConfig {
    pub model_path: PathBuf,
    /// Input tensor name; the graph's first input when unset
    #[serde(default)]
    pub input_name: Option<String>,
    /// Output tensor name; the graph's first output when unset
    #[serde(default)]
    pub output_name: Option<String>,
    #[serde(default)]
    pub runtime: RuntimeConfig,
}

impl OnnxModelConfig {
    pub fn new(model_path: impl Into<PathBuf>) -> Self {
        Self {
            model_path: model_path.into(),
            input_name: None,
            output_name: None,
            runtime: RuntimeConfig::default(),
        }
    }
}

/// An open ONNX Runtime session scoring `[1, max_len]` float inputs.
///
/// ONNX Runtime allows concurrent `run` calls on one session, so a shared
/// `OnnxModel` is not locked while scoring.
pub struct OnnxModel {
    session: Session,
    input_name: String,
    output_name: String,
    model_path: PathBuf,
}

impl OnnxModel {
    /// Opens the model and resolves its tensor names.
    ///
    /// # Errors
    /// `ModelLoad` if the file is missing, the runtime rejects it, or a
    /// configured tensor name is not part of the graph.
    pub fn load(config: &OnnxModelConfig) -> Result<Self, ClassifierError> {
        let model_path = &config.model_path;
        if !model_path.exists() {
            return Err(ClassifierError::ModelLoad(format!("Model file not found: {}", model_path.display())));
        }

        let session = create_session_builder(&config.runtime)?
            .commit_from_file(model_path)
            .map_err(|e| ClassifierError::ModelLoad(format!("Failed to open {}: {}", model_path.display(), e)))?;

        let input_names: Vec<&str> = session.inputs.iter().map(|i| i.name.as_str()).collect();
        let output_names: Vec<&str> = session.outputs.iter().map(|o| o.name.as_str()).collect();
        let input_name = Self::resolve_name("input", config.input_name.as_deref(), &input_names)?;
        let output_name = Self::resolve_name("output", config.output_name.as_deref(), &output_names)?;

        info!("Model {:?} loaded (input '{}', output '{}')", model_path, input_name, output_name);

        Ok(Self {
            session,
            input_name,
            output_name,
            model_path: model_path.clone(),
        })
    }

    pub fn input_name(&self) -> &str {
        &self.input_name
    }

    pub fn output_name(&self) -> &str {
        &self.output_name
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    fn resolve_name(kind: &str, wanted: Option<&str>, available: &[&str]) -> Result<String, ClassifierError> {
        match wanted {
            Some(name) if available.contains(&name) => Ok(name.to_string()),
            Some(name) => Err(ClassifierError::ModelLoad(format!(
                "Model has no {} tensor named '{}' (available: {:?})",
                kind, name, available
            ))),
            None => available.first().map(|n| n.to_string()).ok_or_else(|| {
                ClassifierError::ModelLoad(format!("Model must have at least 1 {} tensor", kind))
            }),
        }
    }
}

impl ScoringModel for OnnxModel {
    fn score(&self, features: &FeatureVector) -> Result<ScoreVector, ClassifierError> {
        let input_array = Array2::from_shape_vec((1, features.len()), features.to_vec())
            .map_err(|e| ClassifierError::Inference(format!("Failed to create input array: {}", e)))?;
        let input_dyn = input_array.into_dyn();
        let input = input_dyn.as_standard_layout();

        let mut input_tensors = HashMap::new();
        input_tensors.insert(
            self.input_name.as_str(),
            Tensor::from_array(&input)
                .map_err(|e| ClassifierError::Inference(format!("Failed to create input tensor: {}", e)))?,
        );

        let outputs = self.session.run(input_tensors)
            .map_err(|e| ClassifierError::Inference(format!("Failed to run model: {}", e)))?;
        let output_tensor = outputs[self.output_name.as_str()].try_extract_tensor::<f32>()
            .map_err(|e| ClassifierError::Inference(format!("Failed to extract output tensor: {}", e)))?;

        if output_tensor.shape().first().is_some_and(|&batch| batch != 1) {
            return Err(ClassifierError::Inference(format!(
                "Expected a batch of one, got output shape {:?}",
                output_tensor.shape()
            )));
        }

        let scores: ScoreVector = output_tensor.iter().copied().collect();
        debug!("Model produced {} scores", scores.len());
        Ok(scores)
    }
}

/// An ONNX model opened on demand.
///
/// A failed load is returned to the caller and nothing is cached, so the next
/// call tries again. With [`SessionLifecycle::Shared`] the first successful
/// session is kept; with [`SessionLifecycle::PerCall`] every call opens and
/// drops its own session.
pub struct LazyOnnxModel {
    config: OnnxModelConfig,
    lifecycle: SessionLifecycle,
    loaded: Mutex<Option<Arc<OnnxModel>>>,
}

impl LazyOnnxModel {
    pub fn new(config: OnnxModelConfig, lifecycle: SessionLifecycle) -> Self {
        Self {
            config,
            lifecycle,
            loaded: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &OnnxModelConfig {
        &self.config
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.lock().map(|slot| slot.is_some()).unwrap_or(false)
    }

    /// Returns the shared session, opening it if needed.
    pub fn get_or_load(&self) -> Result<Arc<OnnxModel>, ClassifierError> {
        if self.lifecycle == SessionLifecycle::PerCall {
            return OnnxModel::load(&self.config).map(Arc::new);
        }

        // Loading happens under the lock so concurrent first calls open one session.
        let mut slot = self.loaded.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(model) = slot.as_ref() {
            return Ok(Arc::clone(model));
        }
        match OnnxModel::load(&self.config) {
            Ok(model) => {
                let model = Arc::new(model);
                *slot = Some(Arc::clone(&model));
                Ok(model)
            }
            Err(e) => {
                warn!("Model load failed, will retry on next call: {}", e);
                Err(e)
            }
        }
    }
}

impl std::fmt::Debug for OnnxModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxModel")
            .field("model_path", &self.model_path)
            .field("input_name", &self.input_name)
            .field("output_name", &self.output_name)
            .finish_non_exhaustive()
    }
}

impl std::fmt::Debug for LazyOnnxModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LazyOnnxModel")
            .field("model_path", &self.config.model_path)
            .field("lifecycle", &self.lifecycle)
            .field("loaded", &self.is_loaded())
            .finish()
    }
}

impl ScoringModel for LazyOnnxModel {
    fn score(&self, features: &FeatureVector) -> Result<ScoreVector, ClassifierError> {
        let model = self.get_or_load()?;
        model.score(features)
    }
}
