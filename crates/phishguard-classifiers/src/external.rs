//! Externally trained probabilistic classifiers
//!
//! Artifacts are JSON documents describing a two-class model that exposes
//! class probabilities and, optionally, the order of its class labels
//! (`1` = phishing, `0` = legitimate).
//!
//! Unlike the neural adapter, failures here (missing artifact, width
//! mismatch, malformed model) are returned to the caller; the dispatcher
//! is what degrades them to the heuristic.

use crate::adapter::ModelAdapter;
use crate::artifact_cache::{load_through, ArtifactCache};
use crate::features::{index, FeatureMap};
use phishguard_core::{Error, Label, ModelResult, Result, Variant};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Width that selects the compact length-only input
pub const COMPACT_WIDTH: usize = 4;

/// Features fed to compact models
const COMPACT_FEATURES: [usize; COMPACT_WIDTH] = [
    index::URL_LENGTH,
    index::DOMAIN_LENGTH,
    index::PATH_LENGTH,
    index::QUERY_LENGTH,
];

/// Class value that denotes phishing in a `classes` list
const PHISHING_CLASS: i64 = 1;

/// Two-class classifier exposing probabilities
pub trait ProbabilisticClassifier: Send + Sync {
    /// Per-class probabilities for one sample
    fn predict_proba(&self, sample: &[f64]) -> Result<Vec<f64>>;

    /// Class labels in probability order, when the model records them
    fn classes(&self) -> Option<&[i64]>;
}

/// Node of a serialized decision tree
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TreeNode {
    /// Go left when `sample[feature] <= threshold`
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    /// Per-class sample counts or weights
    Leaf { value: Vec<f64> },
}

/// Serialized external classifier
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExternalModel {
    LogisticRegression {
        #[serde(default)]
        classes: Option<Vec<i64>>,
        coefficients: Vec<f64>,
        intercept: f64,
    },
    DecisionTree {
        #[serde(default)]
        classes: Option<Vec<i64>>,
        nodes: Vec<TreeNode>,
    },
}

impl ExternalModel {
    /// Read a model from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::ArtifactNotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    fn walk_tree(nodes: &[TreeNode], sample: &[f64]) -> Result<Vec<f64>> {
        let mut current = 0;
        // A well-formed tree reaches a leaf in fewer steps than it has nodes
        for _ in 0..nodes.len() {
            match nodes.get(current) {
                Some(TreeNode::Leaf { value }) => {
                    let total: f64 = value.iter().sum();
                    if total <= 0.0 || !total.is_finite() {
                        return Err(Error::artifact("decision tree leaf has no mass"));
                    }
                    return Ok(value.iter().map(|v| v / total).collect());
                }
                Some(TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    let value = sample.get(*feature).ok_or_else(|| {
                        Error::shape(
                            format!("feature index < {}", sample.len()),
                            format!("feature index {}", feature),
                        )
                    })?;
                    current = if *value <= *threshold { *left } else { *right };
                }
                None => {
                    return Err(Error::artifact(format!(
                        "decision tree references missing node {}",
                        current
                    )))
                }
            }
        }
        Err(Error::artifact("decision tree contains a cycle"))
    }
}

impl ProbabilisticClassifier for ExternalModel {
    fn predict_proba(&self, sample: &[f64]) -> Result<Vec<f64>> {
        match self {
            Self::LogisticRegression {
                coefficients,
                intercept,
                ..
            } => {
                if coefficients.len() != sample.len() {
                    return Err(Error::shape(
                        format!("{} features", coefficients.len()),
                        format!("{} features", sample.len()),
                    ));
                }
                let z: f64 = coefficients
                    .iter()
                    .zip(sample)
                    .map(|(c, x)| c * x)
                    .sum::<f64>()
                    + intercept;
                let positive = 1.0 / (1.0 + (-z).exp());
                Ok(vec![1.0 - positive, positive])
            }
            Self::DecisionTree { nodes, .. } => Self::walk_tree(nodes, sample),
        }
    }

    fn classes(&self) -> Option<&[i64]> {
        match self {
            Self::LogisticRegression { classes, .. } | Self::DecisionTree { classes, .. } => {
                classes.as_deref()
            }
        }
    }
}

/// Turn class probabilities into a label and confidence
///
/// With a two-entry class list the phishing probability is looked up by
/// class value; otherwise position 1 is taken as phishing and confidence is
/// the largest probability.
pub fn interpret(proba: &[f64], classes: Option<&[i64]>) -> Result<(Label, f64)> {
    if proba.len() < 2 {
        return Err(Error::shape(
            "2 class probabilities",
            format!("{} class probabilities", proba.len()),
        ));
    }

    match classes {
        Some(classes) if classes.len() == 2 => {
            let phishing = if classes[1] == PHISHING_CLASS {
                proba[1]
            } else {
                proba[0]
            };
            if phishing > 0.5 {
                Ok((Label::Phishing, phishing))
            } else {
                Ok((Label::Legitimate, 1.0 - phishing))
            }
        }
        _ => {
            let label = if proba[1] > 0.5 {
                Label::Phishing
            } else {
                Label::Legitimate
            };
            let confidence = proba.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            Ok((label, confidence))
        }
    }
}

/// Adapter over a serialized external classifier
pub struct ExternalAdapter {
    path: PathBuf,
    feature_count: usize,
    cache: Option<Arc<ArtifactCache<ExternalModel>>>,
}

impl ExternalAdapter {
    /// Create an adapter; `feature_count` of 4 feeds only the length features
    pub fn new(path: impl Into<PathBuf>, feature_count: usize) -> Self {
        Self {
            path: path.into(),
            feature_count,
            cache: None,
        }
    }

    /// Share parsed artifacts through a cache
    pub fn with_cache(mut self, cache: Arc<ArtifactCache<ExternalModel>>) -> Self {
        self.cache = Some(cache);
        self
    }

    fn sample(&self, features: &FeatureMap) -> Vec<f64> {
        let vector = features.vector();
        if self.feature_count == COMPACT_WIDTH {
            vector.select(&COMPACT_FEATURES)
        } else {
            vector.to_vec()
        }
    }
}

impl ModelAdapter for ExternalAdapter {
    fn score(&self, features: &FeatureMap) -> Result<ModelResult> {
        let model = load_through(self.cache.as_deref(), &self.path, ExternalModel::load)?;
        let proba = model.predict_proba(&self.sample(features))?;
        let (label, confidence) = interpret(&proba, model.classes())?;
        Ok(ModelResult::new(label, confidence, Variant::External.tag()))
    }

    fn variant(&self) -> Variant {
        Variant::External
    }
}
