//! Engine configuration
//!
//! Loaded once at start-up and read-only afterwards. Example:
//!
//! ```yaml
//! cache_artifacts: true
//! heuristic:
//!   threshold: 0.4
//! models:
//!   primary:
//!     enabled: true
//!     type: neural
//!     weight: 0.5
//!     path: models/primary.npy
//!   rule_based:
//!     enabled: true
//!     type: heuristic
//!     weight: 0.5
//! ```

use crate::features::FEATURE_COUNT;
use crate::heuristic::DEFAULT_THRESHOLD;
use crate::neural::ArtifactFormat;
use phishguard_core::{Error, Result, Variant};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Top-level engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Keep parsed artifacts in memory until reload
    #[serde(default = "default_true")]
    pub cache_artifacts: bool,

    /// Heuristic scorer settings
    #[serde(default)]
    pub heuristic: HeuristicConfig,

    /// Model configurations by id
    #[serde(default)]
    pub models: BTreeMap<String, ModelSpec>,
}

/// Heuristic scorer settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeuristicConfig {
    /// Scores strictly above this are phishing
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

impl Default for HeuristicConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
        }
    }
}

/// Configuration for a single model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSpec {
    /// Take part in ensemble scans
    #[serde(default)]
    pub enabled: bool,

    /// Scoring strategy
    #[serde(rename = "type")]
    pub variant: Variant,

    /// Ensemble weight (finite, >= 0)
    #[serde(default = "default_weight")]
    pub weight: f64,

    /// Artifact path for neural and external models
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Input width the external model expects (4 or 20)
    #[serde(default = "default_feature_count")]
    pub feature_count: usize,

    /// Neural artifact layout; inferred from the extension when absent
    #[serde(default)]
    pub format: Option<ArtifactFormat>,
}

impl ModelSpec {
    /// Create a spec for the given variant with default settings
    pub fn new(variant: Variant) -> Self {
        Self {
            enabled: true,
            variant,
            weight: default_weight(),
            path: None,
            feature_count: default_feature_count(),
            format: None,
        }
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_feature_count(mut self, feature_count: usize) -> Self {
        self.feature_count = feature_count;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Artifact path, required for variants that load one
    pub fn artifact_path(&self, id: &str) -> Result<&Path> {
        self.path.as_deref().ok_or_else(|| {
            Error::config(format!("model '{}' ({}) requires a 'path'", id, self.variant))
        })
    }
}

fn default_true() -> bool {
    true
}

fn default_threshold() -> f64 {
    DEFAULT_THRESHOLD
}

fn default_weight() -> f64 {
    1.0
}

fn default_feature_count() -> usize {
    FEATURE_COUNT
}

impl Default for EngineConfig {
    fn default() -> Self {
        let mut models = BTreeMap::new();
        models.insert("rule_based".to_string(), ModelSpec::new(Variant::Heuristic));
        Self {
            cache_artifacts: true,
            heuristic: HeuristicConfig::default(),
            models,
        }
    }
}

impl EngineConfig {
    /// Parse and validate YAML
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from file; relative artifact paths resolve against its directory
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let mut config = Self::from_yaml(&content)?;

        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        Ok(config)
    }

    /// Load from file when it exists, defaults otherwise
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::from_file(path)
        } else {
            tracing::info!(path = %path.display(), "no configuration file, using defaults");
            Ok(Self::default())
        }
    }

    /// Make relative artifact paths relative to `base`
    pub fn resolve_paths(&mut self, base: &Path) {
        for spec in self.models.values_mut() {
            if let Some(path) = &spec.path {
                if path.is_relative() {
                    spec.path = Some(base.join(path));
                }
            }
        }
    }

    /// Check weights and required fields
    pub fn validate(&self) -> Result<()> {
        if !self.heuristic.threshold.is_finite() {
            return Err(Error::config("heuristic threshold must be finite"));
        }

        for (id, spec) in &self.models {
            if !spec.weight.is_finite() || spec.weight < 0.0 {
                return Err(Error::config(format!(
                    "model '{}' has invalid weight {}; weights must be finite and non-negative",
                    id, spec.weight
                )));
            }
            if matches!(spec.variant, Variant::Neural | Variant::External) {
                spec.artifact_path(id)?;
            }
        }

        let heuristic_enabled = self
            .enabled_models()
            .any(|(_, spec)| spec.variant == Variant::Heuristic && spec.weight > 0.0);
        if !heuristic_enabled {
            tracing::warn!("no weighted heuristic model is enabled; ensemble may carry zero total weight");
        }

        Ok(())
    }

    /// Enabled models in id order
    pub fn enabled_models(&self) -> impl Iterator<Item = (&String, &ModelSpec)> {
        self.models.iter().filter(|(_, spec)| spec.enabled)
    }

    /// Ids of every configured model
    pub fn model_names(&self) -> Vec<String> {
        self.models.keys().cloned().collect()
    }
}
