use std::sync::Mutex;
use lazy_static::lazy_static;
use ort::session::builder::{GraphOptimizationLevel, SessionBuilder};
use ort::session::Session;
use serde::{Deserialize, Serialize};

use crate::classifier::ClassifierError;

lazy_static! {
    // Set once the process-wide ONNX environment is committed. A failed
    // attempt leaves it unset so the next session request tries again.
    static ref ENVIRONMENT: Mutex<bool> = Mutex::new(false);
}

/// Graph optimization level, mirrored from ONNX Runtime so it can live in config files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizationLevel {
    Disable,
    Level1,
    Level2,
    #[default]
    Level3,
}

impl From<OptimizationLevel> for GraphOptimizationLevel {
    fn from(level: OptimizationLevel) -> Self {
        match level {
            OptimizationLevel::Disable => GraphOptimizationLevel::Disable,
            OptimizationLevel::Level1 => GraphOptimizationLevel::Level1,
            OptimizationLevel::Level2 => GraphOptimizationLevel::Level2,
            OptimizationLevel::Level3 => GraphOptimizationLevel::Level3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub inter_threads: usize,
    pub intra_threads: usize,
    pub optimization_level: OptimizationLevel,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            inter_threads: 0, // Let ONNX Runtime decide
            intra_threads: 0, // Let ONNX Runtime decide
            optimization_level: OptimizationLevel::Level3,
        }
    }
}

pub fn ensure_initialized() -> Result<(), ClassifierError> {
    let mut initialized = ENVIRONMENT.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    if *initialized {
        return Ok(());
    }
    ort::init()
        .with_name("emotion-classifier")
        .commit()
        .map_err(|e| ClassifierError::ModelLoad(format!("ONNX Runtime environment: {}", e)))?;
    *initialized = true;
    Ok(())
}

pub fn create_session_builder(config: &RuntimeConfig) -> Result<SessionBuilder, ClassifierError> {
    ensure_initialized()?;
    let load_err = |e: ort::Error| ClassifierError::ModelLoad(e.to_string());

    let mut builder = Session::builder().map_err(load_err)?;

    // Configure threading
    if config.inter_threads > 0 {
        builder = builder.with_inter_threads(config.inter_threads).map_err(load_err)?;
    }
    if config.intra_threads > 0 {
        builder = builder.with_intra_threads(config.intra_threads).map_err(load_err)?;
    }

    builder
        .with_optimization_level(config.optimization_level.into())
        .map_err(load_err)
}
