//! Dense forward-pass adapter backed by Candle
//!
//! The network is a fixed 20 → 10 → 1 MLP:
//! `sigmoid(relu(x·W1 + b1)·W2 + b2)`. Two artifact layouts are read:
//!
//! - **npy**: a flat array. 221 elements are sliced into W1 (20×10), b1 (10),
//!   W2 (10×1), b2 (1). A `(2074, 2)` array is a legacy tabular artifact that
//!   cannot drive the network; scoring degrades to the heuristic over the
//!   features recoverable from the vector. Other shapes are rejected.
//! - **safetensors**: tensors named `w1`, `b1`, `w2`, `b2`, each validated
//!   against its expected shape by name.
//!
//! Every failure in this adapter, a missing artifact included, yields a
//! `neural-fallback` heuristic result instead of an error.

use crate::adapter::ModelAdapter;
use crate::artifact_cache::{load_through, ArtifactCache};
use crate::features::{index, FeatureMap, FeatureVector, FEATURE_COUNT};
use crate::heuristic::HeuristicScorer;
use candle_core::{DType, Device, Tensor};
use phishguard_core::{Error, Label, ModelResult, Result, Variant};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Hidden layer width
pub const HIDDEN_UNITS: usize = 10;

/// Total parameter count of the flat layout
pub const DENSE_PARAM_COUNT: usize = FEATURE_COUNT * HIDDEN_UNITS + HIDDEN_UNITS + HIDDEN_UNITS + 1;

/// Shape of the legacy tabular artifact
pub const LEGACY_TABLE_SHAPE: [usize; 2] = [2074, 2];

/// Vector positions a legacy tabular artifact can still vouch for
const LEGACY_RECOVERABLE: [usize; 16] = [
    index::URL_LENGTH,
    index::DOMAIN_LENGTH,
    index::PATH_LENGTH,
    index::QUERY_LENGTH,
    index::NUM_DOTS,
    index::NUM_HYPHENS,
    index::NUM_UNDERSCORES,
    index::NUM_SLASHES,
    index::HAS_IP,
    index::HAS_SHORTENER,
    index::HAS_SUSPICIOUS_KEYWORDS,
    index::SUBDOMAIN_COUNT,
    index::HAS_WWW,
    index::IS_HTTPS,
    index::PATH_DEPTH,
    index::HAS_FILE_EXTENSION,
];

/// On-disk layout of a neural artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactFormat {
    /// Flat numpy array
    Npy,
    /// Named tensors
    SafeTensors,
}

impl ArtifactFormat {
    /// Infer from the file extension; anything but `.safetensors` is npy
    pub fn infer(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("safetensors") => Self::SafeTensors,
            _ => Self::Npy,
        }
    }
}

fn candle_err(e: candle_core::Error) -> Error {
    Error::inference(e.to_string())
}

/// Weights of the 20 → 10 → 1 network
#[derive(Debug, Clone)]
pub struct DenseNetwork {
    w1: Tensor,
    b1: Tensor,
    w2: Tensor,
    b2: Tensor,
}

impl DenseNetwork {
    /// Slice a flat parameter array in W1, b1, W2, b2 order
    pub fn from_flat(values: &[f64]) -> Result<Self> {
        if values.len() != DENSE_PARAM_COUNT {
            return Err(Error::shape(
                format!("{} parameters", DENSE_PARAM_COUNT),
                format!("{} parameters", values.len()),
            ));
        }

        let device = Device::Cpu;
        let w1_end = FEATURE_COUNT * HIDDEN_UNITS;
        let b1_end = w1_end + HIDDEN_UNITS;
        let w2_end = b1_end + HIDDEN_UNITS;

        let build = || -> candle_core::Result<Self> {
            Ok(Self {
                w1: Tensor::from_slice(&values[..w1_end], (FEATURE_COUNT, HIDDEN_UNITS), &device)?,
                b1: Tensor::from_slice(&values[w1_end..b1_end], HIDDEN_UNITS, &device)?,
                w2: Tensor::from_slice(&values[b1_end..w2_end], (HIDDEN_UNITS, 1), &device)?,
                b2: Tensor::from_slice(&values[w2_end..], 1, &device)?,
            })
        };
        build().map_err(candle_err)
    }

    /// Build from named tensors, checking each shape
    pub fn from_named(mut tensors: HashMap<String, Tensor>) -> Result<Self> {
        let mut take = |name: &str, shape: &[usize]| -> Result<Tensor> {
            let tensor = tensors
                .remove(name)
                .ok_or_else(|| Error::artifact(format!("missing tensor '{}'", name)))?;
            if tensor.dims() != shape {
                return Err(Error::shape(
                    format!("{} {:?}", name, shape),
                    format!("{} {:?}", name, tensor.dims()),
                ));
            }
            tensor.to_dtype(DType::F64).map_err(candle_err)
        };

        Ok(Self {
            w1: take("w1", &[FEATURE_COUNT, HIDDEN_UNITS])?,
            b1: take("b1", &[HIDDEN_UNITS])?,
            w2: take("w2", &[HIDDEN_UNITS, 1])?,
            b2: take("b2", &[1])?,
        })
    }

    /// Squashed output in (0, 1)
    pub fn forward(&self, features: &FeatureVector) -> Result<f64> {
        let run = || -> candle_core::Result<Vec<f64>> {
            let x = Tensor::from_slice(features.as_slice(), (1, FEATURE_COUNT), &Device::Cpu)?;
            let hidden = x.matmul(&self.w1)?.broadcast_add(&self.b1)?.relu()?;
            let logits = hidden.matmul(&self.w2)?.broadcast_add(&self.b2)?;
            candle_nn::ops::sigmoid(&logits)?.flatten_all()?.to_vec1::<f64>()
        };

        let output = run().map_err(candle_err)?;
        output
            .first()
            .copied()
            .ok_or_else(|| Error::inference("network produced no output"))
    }
}

/// A parsed neural artifact
#[derive(Debug, Clone)]
pub enum NeuralArtifact {
    /// Usable network weights
    Dense(DenseNetwork),
    /// Legacy tabular artifact; scored heuristically
    LegacyTable,
}

impl NeuralArtifact {
    /// Read and classify an artifact file
    pub fn load(path: &Path, format: ArtifactFormat) -> Result<Self> {
        if !path.exists() {
            return Err(Error::ArtifactNotFound(path.to_path_buf()));
        }

        match format {
            ArtifactFormat::Npy => {
                let tensor = Tensor::read_npy(path).map_err(|e| {
                    Error::artifact(format!("Failed to read {}: {}", path.display(), e))
                })?;
                Self::from_flat_tensor(&tensor)
            }
            ArtifactFormat::SafeTensors => {
                let tensors = candle_core::safetensors::load(path, &Device::Cpu).map_err(|e| {
                    Error::artifact(format!("Failed to read {}: {}", path.display(), e))
                })?;
                DenseNetwork::from_named(tensors).map(Self::Dense)
            }
        }
    }

    /// Decide the layout of a flat array from its shape
    pub fn from_flat_tensor(tensor: &Tensor) -> Result<Self> {
        if tensor.dims() == LEGACY_TABLE_SHAPE {
            return Ok(Self::LegacyTable);
        }
        if tensor.elem_count() != DENSE_PARAM_COUNT {
            return Err(Error::shape(
                format!("{} elements or shape {:?}", DENSE_PARAM_COUNT, LEGACY_TABLE_SHAPE),
                format!("shape {:?}", tensor.dims()),
            ));
        }

        let values = tensor
            .flatten_all()
            .and_then(|t| t.to_dtype(DType::F64))
            .and_then(|t| t.to_vec1::<f64>())
            .map_err(candle_err)?;
        DenseNetwork::from_flat(&values).map(Self::Dense)
    }
}

/// Adapter running the dense network
pub struct NeuralAdapter {
    path: PathBuf,
    format: ArtifactFormat,
    heuristic: Arc<HeuristicScorer>,
    cache: Option<Arc<ArtifactCache<NeuralArtifact>>>,
}

impl NeuralAdapter {
    /// Create an adapter reading from `path`
    pub fn new(path: impl Into<PathBuf>, heuristic: Arc<HeuristicScorer>) -> Self {
        let path = path.into();
        Self {
            format: ArtifactFormat::infer(&path),
            path,
            heuristic,
            cache: None,
        }
    }

    /// Override the inferred artifact format
    pub fn with_format(mut self, format: ArtifactFormat) -> Self {
        self.format = format;
        self
    }

    /// Share parsed artifacts through a cache
    pub fn with_cache(mut self, cache: Arc<ArtifactCache<NeuralArtifact>>) -> Self {
        self.cache = Some(cache);
        self
    }

    fn predict(&self, features: &FeatureMap) -> Result<ModelResult> {
        let format = self.format;
        let artifact = load_through(self.cache.as_deref(), &self.path, |p| {
            NeuralArtifact::load(p, format)
        })?;

        match artifact.as_ref() {
            NeuralArtifact::Dense(network) => {
                let p = network.forward(&features.vector())?;
                let (label, confidence) = if p > 0.5 {
                    (Label::Phishing, p)
                } else {
                    (Label::Legitimate, 1.0 - p)
                };
                Ok(ModelResult::new(label, confidence, Variant::Neural.tag()))
            }
            NeuralArtifact::LegacyTable => {
                tracing::debug!(path = %self.path.display(), "legacy tabular artifact, scoring recoverable features");
                let recovered = features.vector().retain(&LEGACY_RECOVERABLE);
                let assessment = self.heuristic.assess_vector(&recovered, "");
                Ok(ModelResult::new(
                    assessment.label,
                    assessment.confidence,
                    Variant::Neural.fallback(),
                ))
            }
        }
    }
}

impl ModelAdapter for NeuralAdapter {
    fn score(&self, features: &FeatureMap) -> Result<ModelResult> {
        match self.predict(features) {
            Ok(result) => Ok(result),
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "neural artifact unusable, falling back to heuristic"
                );
                Ok(self.heuristic.result(features, Variant::Neural.fallback()))
            }
        }
    }

    fn variant(&self) -> Variant {
        Variant::Neural
    }
}
