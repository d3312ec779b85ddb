//! Model registry: configuration to adapters

use crate::adapter::{HeuristicAdapter, ModelAdapter};
use crate::artifact_cache::ArtifactCache;
use crate::config::{EngineConfig, ModelSpec};
use crate::experimental::ExperimentalAdapter;
use crate::external::{ExternalAdapter, ExternalModel};
use crate::heuristic::HeuristicScorer;
use crate::neural::{NeuralAdapter, NeuralArtifact};
use phishguard_core::{Error, Result, Variant};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

/// A configured model and its adapter
#[derive(Clone)]
pub struct RegisteredModel {
    pub id: String,
    pub weight: f64,
    pub enabled: bool,
    pub adapter: Arc<dyn ModelAdapter>,
}

impl std::fmt::Debug for RegisteredModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredModel")
            .field("id", &self.id)
            .field("weight", &self.weight)
            .field("enabled", &self.enabled)
            .field("variant", &self.adapter.variant())
            .finish()
    }
}

/// Registry of model adapters keyed by id
///
/// Owns the shared heuristic scorer and the artifact caches so that
/// every adapter built from one configuration shares them.
pub struct AdapterRegistry {
    heuristic: Arc<HeuristicScorer>,
    neural_cache: Option<Arc<ArtifactCache<NeuralArtifact>>>,
    external_cache: Option<Arc<ArtifactCache<ExternalModel>>>,
    models: BTreeMap<String, RegisteredModel>,
}

impl AdapterRegistry {
    /// Create an empty registry around a heuristic scorer
    pub fn new(heuristic: Arc<HeuristicScorer>) -> Self {
        Self {
            heuristic,
            neural_cache: None,
            external_cache: None,
            models: BTreeMap::new(),
        }
    }

    /// Enable artifact caching for adapters built after this call
    pub fn with_artifact_cache(mut self) -> Self {
        self.neural_cache = Some(Arc::new(ArtifactCache::new()));
        self.external_cache = Some(Arc::new(ArtifactCache::new()));
        self
    }

    /// Build a registry from configuration
    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        config.validate()?;

        let heuristic = HeuristicScorer::new()?.with_threshold(config.heuristic.threshold);
        let mut registry = Self::new(Arc::new(heuristic));
        if config.cache_artifacts {
            registry = registry.with_artifact_cache();
        }

        info!("Initializing model registry with {} models", config.models.len());

        for (id, spec) in &config.models {
            let adapter = registry.build_adapter(id, spec)?;
            registry.insert(id.clone(), spec.weight, spec.enabled, adapter);
        }

        info!(
            enabled = registry.enabled().count(),
            total = registry.len(),
            caching = config.cache_artifacts,
            "model registry initialized"
        );

        Ok(registry)
    }

    /// Build the adapter for one configured model
    pub fn build_adapter(&self, id: &str, spec: &ModelSpec) -> Result<Arc<dyn ModelAdapter>> {
        let adapter: Arc<dyn ModelAdapter> = match spec.variant {
            Variant::Neural => {
                let mut adapter =
                    NeuralAdapter::new(spec.artifact_path(id)?, Arc::clone(&self.heuristic));
                if let Some(format) = spec.format {
                    adapter = adapter.with_format(format);
                }
                if let Some(cache) = &self.neural_cache {
                    adapter = adapter.with_cache(Arc::clone(cache));
                }
                Arc::new(adapter)
            }
            Variant::External => {
                let mut adapter = ExternalAdapter::new(spec.artifact_path(id)?, spec.feature_count);
                if let Some(cache) = &self.external_cache {
                    adapter = adapter.with_cache(Arc::clone(cache));
                }
                Arc::new(adapter)
            }
            Variant::Heuristic => Arc::new(HeuristicAdapter::new(Arc::clone(&self.heuristic))),
            Variant::Experimental => Arc::new(ExperimentalAdapter::new()),
            Variant::Unknown => {
                warn!(model = id, "unrecognized model type, scoring with heuristic");
                Arc::new(HeuristicAdapter::standing_in_for(
                    Arc::clone(&self.heuristic),
                    Variant::Unknown,
                ))
            }
        };
        Ok(adapter)
    }

    /// Register an adapter directly, enabled
    pub fn register(
        &mut self,
        id: impl Into<String>,
        weight: f64,
        adapter: Arc<dyn ModelAdapter>,
    ) -> Result<()> {
        if !weight.is_finite() || weight < 0.0 {
            return Err(Error::config(format!(
                "invalid weight {} for model; weights must be finite and non-negative",
                weight
            )));
        }
        self.insert(id.into(), weight, true, adapter);
        Ok(())
    }

    fn insert(&mut self, id: String, weight: f64, enabled: bool, adapter: Arc<dyn ModelAdapter>) {
        let model = RegisteredModel {
            id: id.clone(),
            weight,
            enabled,
            adapter,
        };
        self.models.insert(id, model);
    }

    /// Look up a model by id, enabled or not
    pub fn get(&self, id: &str) -> Option<&RegisteredModel> {
        self.models.get(id)
    }

    /// Enabled models in id order
    pub fn enabled(&self) -> impl Iterator<Item = &RegisteredModel> {
        self.models.values().filter(|m| m.enabled)
    }

    /// Shared heuristic scorer
    pub fn heuristic(&self) -> &Arc<HeuristicScorer> {
        &self.heuristic
    }

    /// Drop every cached artifact; the next scan reloads from disk
    pub fn reload(&self) {
        if let Some(cache) = &self.neural_cache {
            cache.clear();
        }
        if let Some(cache) = &self.external_cache {
            cache.clear();
        }
        info!("artifact caches cleared");
    }

    /// Number of cached artifacts across both caches
    pub fn cached_artifacts(&self) -> usize {
        self.neural_cache.as_ref().map_or(0, |c| c.len())
            + self.external_cache.as_ref().map_or(0, |c| c.len())
    }

    pub fn model_names(&self) -> Vec<String> {
        self.models.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}
