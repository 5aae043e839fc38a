//! Predictive model artifact and lifecycle.
//!
//! The artifact is a JSON file describing a small feed-forward network:
//! 8 inputs → ReLU hidden layer → 4 sigmoid outputs in [0, 1], mapped to
//! the four 0–100 sub-scores. `ModelHandle` owns the process-wide model
//! reference: it is written only by `load()` (startup or explicit reload)
//! and read by scoring. A failed load clears the handle, leaving the
//! pipeline in formula-fallback mode until the next reload.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tokio::sync::{RwLock, RwLockReadGuard};

use crate::services::scorer::{
    clamp_score, feature_vector, EventDescriptor, RiskPrediction, RiskScorer, FEATURE_DIM,
};
use crate::services::weather::WeatherObservation;

/// Number of model outputs (one per sub-score).
pub const OUTPUT_DIM: usize = 4;

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("failed to read model artifact: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse model artifact: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid model shape: {0}")]
    Shape(String),

    #[error("model produced a non-finite output")]
    NonFiniteOutput,
}

/// One dense layer: `output[i] = dot(weights[i], input) + bias[i]`.
#[derive(Debug, Clone, Deserialize)]
pub struct DenseLayer {
    pub weights: Vec<Vec<f64>>,
    pub bias: Vec<f64>,
}

impl DenseLayer {
    /// Check that every weight row has `input_dim` columns and the bias
    /// matches the row count. Returns the layer's output dimension.
    fn validate(&self, name: &str, input_dim: usize) -> Result<usize, ModelError> {
        if self.weights.is_empty() {
            return Err(ModelError::Shape(format!("{} layer has no weights", name)));
        }
        for (i, row) in self.weights.iter().enumerate() {
            if row.len() != input_dim {
                return Err(ModelError::Shape(format!(
                    "{} layer row {} has {} columns, expected {}",
                    name,
                    i,
                    row.len(),
                    input_dim
                )));
            }
        }
        if self.bias.len() != self.weights.len() {
            return Err(ModelError::Shape(format!(
                "{} layer has {} bias values for {} rows",
                name,
                self.bias.len(),
                self.weights.len()
            )));
        }
        Ok(self.weights.len())
    }

    fn forward(&self, input: &[f64]) -> Vec<f64> {
        self.weights
            .iter()
            .zip(&self.bias)
            .map(|(row, bias)| row.iter().zip(input).map(|(w, x)| w * x).sum::<f64>() + bias)
            .collect()
    }
}

/// Deserialized, shape-validated model.
#[derive(Debug, Clone, Deserialize)]
pub struct RiskModel {
    pub hidden: DenseLayer,
    pub output: DenseLayer,
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

impl RiskModel {
    /// Parse and validate an artifact from raw JSON bytes.
    pub fn from_json(bytes: &[u8]) -> Result<RiskModel, ModelError> {
        let model: RiskModel = serde_json::from_slice(bytes)?;
        let hidden_dim = model.hidden.validate("hidden", FEATURE_DIM)?;
        let output_dim = model.output.validate("output", hidden_dim)?;
        if output_dim != OUTPUT_DIM {
            return Err(ModelError::Shape(format!(
                "output layer has {} rows, expected {}",
                output_dim, OUTPUT_DIM
            )));
        }
        Ok(model)
    }

    /// Run the network. Outputs are sigmoid-activated, so each lies in
    /// (0, 1); non-finite results are treated as an inference failure.
    pub fn infer(&self, features: &[f64; FEATURE_DIM]) -> Result<[f64; OUTPUT_DIM], ModelError> {
        let hidden: Vec<f64> = self
            .hidden
            .forward(features)
            .into_iter()
            .map(|v| v.max(0.0))
            .collect();
        let raw = self.output.forward(&hidden);

        let mut outputs = [0.0; OUTPUT_DIM];
        for (out, value) in outputs.iter_mut().zip(raw) {
            let activated = sigmoid(value);
            if !activated.is_finite() {
                return Err(ModelError::NonFiniteOutput);
            }
            *out = activated;
        }
        Ok(outputs)
    }
}

/// A successfully loaded model plus load metadata.
#[derive(Debug, Clone)]
pub struct LoadedModel {
    pub model: RiskModel,
    pub loaded_at: DateTime<Utc>,
}

/// Snapshot of the handle for the model status endpoint.
#[derive(Debug, Clone)]
pub struct ModelStatus {
    pub loaded: bool,
    pub path: String,
    pub loaded_at: Option<DateTime<Utc>>,
}

/// Process-wide, swappable model reference.
///
/// Single-writer discipline: only `load()` takes the write lock; request
/// handlers take read locks for the duration of one inference.
#[derive(Clone)]
pub struct ModelHandle {
    path: PathBuf,
    inner: Arc<RwLock<Option<LoadedModel>>>,
}

impl ModelHandle {
    /// Create an empty handle. The pipeline stays in fallback mode until
    /// `load()` succeeds.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            inner: Arc::new(RwLock::new(None)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load (or reload) the artifact from disk. On failure the handle is
    /// cleared: scoring falls back to the formula until the next reload.
    pub async fn load(&self) -> Result<(), ModelError> {
        match Self::read_artifact(&self.path).await {
            Ok(model) => {
                *self.inner.write().await = Some(LoadedModel {
                    model,
                    loaded_at: Utc::now(),
                });
                tracing::info!("Model loaded from {}", self.path.display());
                Ok(())
            }
            Err(e) => {
                *self.inner.write().await = None;
                Err(e)
            }
        }
    }

    async fn read_artifact(path: &Path) -> Result<RiskModel, ModelError> {
        let bytes = tokio::fs::read(path).await?;
        RiskModel::from_json(&bytes)
    }

    pub async fn read(&self) -> RwLockReadGuard<'_, Option<LoadedModel>> {
        self.inner.read().await
    }

    pub async fn status(&self) -> ModelStatus {
        let guard = self.inner.read().await;
        ModelStatus {
            loaded: guard.is_some(),
            path: self.path.display().to_string(),
            loaded_at: guard.as_ref().map(|loaded| loaded.loaded_at),
        }
    }
}

/// Scoring strategy backed by a loaded model.
pub struct ModelScorer<'a> {
    model: &'a RiskModel,
}

impl<'a> ModelScorer<'a> {
    pub fn new(model: &'a RiskModel) -> Self {
        Self { model }
    }
}

impl RiskScorer for ModelScorer<'_> {
    fn score(
        &self,
        weather: &WeatherObservation,
        event: &EventDescriptor,
    ) -> Result<RiskPrediction, ModelError> {
        let features = feature_vector(weather, event.sport);
        let outputs = self.model.infer(&features)?;
        Ok(RiskPrediction {
            performance_impact: clamp_score(outputs[0] * 100.0),
            injury_probability: clamp_score(outputs[1] * 100.0),
            disruption_probability: clamp_score(outputs[2] * 100.0),
            overall_risk: clamp_score(outputs[3] * 100.0),
        })
    }
}
