//! Ensemble coordinator
//!
//! Extracts features once per input, dispatches them to every enabled
//! model and combines the per-model results into a weighted verdict.
//! A scan is synchronous; [`Ensemble::scan_batch`] runs many scans on
//! tokio's blocking pool.

use crate::adapter::dispatch;
use crate::config::EngineConfig;
use crate::features::{FeatureExtractor, FeatureMap};
use crate::heuristic::HeuristicScorer;
use crate::registry::AdapterRegistry;
use futures::future::join_all;
use phishguard_core::{EnsembleVerdict, Error, Label, ModelResult, Result, Variant};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

/// Features and verdict for one input
#[derive(Debug, Clone, Serialize)]
pub struct Scan {
    pub features: FeatureMap,
    pub verdict: EnsembleVerdict,
}

/// Weighted-vote ensemble over the configured models
pub struct Ensemble {
    extractor: FeatureExtractor,
    registry: AdapterRegistry,
}

impl Ensemble {
    /// Build an ensemble from configuration
    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        let registry = AdapterRegistry::from_config(config)?;
        Self::from_registry(registry)
    }

    /// Wrap an already populated registry
    pub fn from_registry(registry: AdapterRegistry) -> Result<Self> {
        let ensemble = Self {
            extractor: FeatureExtractor::new()?,
            registry,
        };
        info!(
            models = ?ensemble.registry.model_names(),
            "ensemble ready"
        );
        Ok(ensemble)
    }

    /// Extract features only
    pub fn features(&self, input: &str) -> FeatureMap {
        self.extractor.extract(input)
    }

    /// Scan an input with every enabled model
    pub fn scan(&self, input: &str) -> Scan {
        let start = Instant::now();
        let features = self.extractor.extract(input);
        let heuristic = self.registry.heuristic();

        let mut votes = Vec::new();
        let mut model_results = BTreeMap::new();
        let mut models_used = Vec::new();

        for model in self.registry.enabled() {
            let result = dispatch(&model.id, model.adapter.as_ref(), &features, heuristic);
            votes.push((model.weight, result.clone()));
            model_results.insert(model.id.clone(), result);
            models_used.push(model.id.clone());
        }

        let (label, confidence) = weighted_vote(votes.iter().map(|(w, r)| (*w, r)));
        let verdict = EnsembleVerdict {
            label,
            confidence,
            model_results,
            models_used,
            ensemble_type: EnsembleVerdict::WEIGHTED_AVERAGE.to_string(),
        };

        let elapsed_us = start.elapsed().as_micros() as u64;
        metrics::counter!("phishguard_scans_total", "label" => label.as_str()).increment(1);
        metrics::histogram!("phishguard_scan_latency_us").record(elapsed_us as f64);

        debug!(
            label = %verdict.label,
            confidence = verdict.confidence,
            models = verdict.models_used.len(),
            degraded = verdict.degraded(),
            latency_us = elapsed_us,
            "scan complete"
        );

        Scan { features, verdict }
    }

    /// Score an input with one configured model, enabled or not
    pub fn score_model(&self, input: &str, model_id: &str) -> Result<ModelResult> {
        let model = self
            .registry
            .get(model_id)
            .ok_or_else(|| Error::UnknownModel(model_id.to_string()))?;
        let features = self.extractor.extract(input);
        Ok(dispatch(
            &model.id,
            model.adapter.as_ref(),
            &features,
            self.registry.heuristic(),
        ))
    }

    /// Scan many inputs concurrently; results keep input order
    pub async fn scan_batch(self: &Arc<Self>, inputs: Vec<String>) -> Vec<Scan> {
        let futures: Vec<_> = inputs
            .into_iter()
            .map(|input| {
                let ensemble = Arc::clone(self);
                async move {
                    let task = {
                        let ensemble = Arc::clone(&ensemble);
                        let input = input.clone();
                        tokio::task::spawn_blocking(move || ensemble.scan(&input))
                    };
                    match task.await {
                        Ok(scan) => scan,
                        Err(e) => {
                            error!(error = %e, "scan task failed, using heuristic verdict");
                            ensemble.heuristic_scan(&input)
                        }
                    }
                }
            })
            .collect();

        join_all(futures).await
    }

    /// Heuristic-only scan used when a batch task cannot complete
    fn heuristic_scan(&self, input: &str) -> Scan {
        let features = self.extractor.extract(input);
        let result = self
            .registry
            .heuristic()
            .result(&features, Variant::Heuristic.fallback());
        let id = Variant::Heuristic.as_str().to_string();

        let verdict = EnsembleVerdict {
            label: result.label,
            confidence: result.confidence,
            model_results: BTreeMap::from([(id.clone(), result)]),
            models_used: vec![id],
            ensemble_type: EnsembleVerdict::WEIGHTED_AVERAGE.to_string(),
        };
        Scan { features, verdict }
    }

    /// Invalidate cached artifacts
    pub fn reload(&self) {
        self.registry.reload();
    }

    pub fn registry(&self) -> &AdapterRegistry {
        &self.registry
    }

    pub fn heuristic(&self) -> &HeuristicScorer {
        self.registry.heuristic()
    }
}

/// Combine weighted results into a label and confidence
///
/// Each result adds `confidence * weight` to the sum for its label. Both
/// sums are normalized by the total weight and the larger one wins; ties
/// go to legitimate. With zero total weight the verdict is legitimate at
/// 0.5.
pub fn weighted_vote<'a>(votes: impl IntoIterator<Item = (f64, &'a ModelResult)>) -> (Label, f64) {
    let mut phishing = 0.0;
    let mut legitimate = 0.0;
    let mut total = 0.0;

    for (weight, result) in votes {
        let contribution = result.confidence * weight;
        match result.label {
            Label::Phishing => phishing += contribution,
            Label::Legitimate => legitimate += contribution,
        }
        total += weight;
    }

    if total <= 0.0 {
        return (Label::Legitimate, 0.5);
    }

    let phishing = phishing / total;
    let legitimate = legitimate / total;
    if phishing > legitimate {
        (Label::Phishing, phishing.clamp(0.0, 1.0))
    } else {
        (Label::Legitimate, legitimate.clamp(0.0, 1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::{HeuristicAdapter, ModelAdapter};

    fn result(label: Label, confidence: f64) -> ModelResult {
        ModelResult::new(label, confidence, Variant::Heuristic.tag())
    }

    #[test]
    fn test_weighted_vote_majority() {
        let a = result(Label::Phishing, 0.9);
        let b = result(Label::Legitimate, 0.6);
        let (label, confidence) = weighted_vote([(0.7, &a), (0.3, &b)]);
        assert_eq!(label, Label::Phishing);
        assert!((confidence - 0.63).abs() < 1e-9);
    }

    #[test]
    fn test_weighted_vote_tie_is_legitimate() {
        let a = result(Label::Phishing, 0.8);
        let b = result(Label::Legitimate, 0.8);
        let (label, confidence) = weighted_vote([(0.5, &a), (0.5, &b)]);
        assert_eq!(label, Label::Legitimate);
        assert!((confidence - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_weighted_vote_zero_weight() {
        let a = result(Label::Phishing, 1.0);
        assert_eq!(weighted_vote([(0.0, &a)]), (Label::Legitimate, 0.5));
        assert_eq!(weighted_vote(std::iter::empty()), (Label::Legitimate, 0.5));
    }

    #[test]
    fn test_default_config_scan() {
        let ensemble = Ensemble::from_config(&EngineConfig::default()).unwrap();
        let scan = ensemble.scan("https://example.com");

        assert_eq!(scan.verdict.label, Label::Legitimate);
        assert_eq!(scan.verdict.confidence, 1.0);
        assert_eq!(scan.verdict.models_used, vec!["rule_based".to_string()]);
        assert_eq!(scan.verdict.ensemble_type, "weighted_average");
        assert!(!scan.verdict.degraded());
        assert_eq!(scan.features.url_length, 19);
    }

    #[test]
    fn test_score_model_unknown_id() {
        let ensemble = Ensemble::from_config(&EngineConfig::default()).unwrap();
        let err = ensemble.score_model("https://example.com", "nope").unwrap_err();
        assert!(matches!(err, Error::UnknownModel(id) if id == "nope"));
    }

    #[test]
    fn test_score_model_by_id() {
        let scorer = Arc::new(HeuristicScorer::new().unwrap());
        let mut registry = AdapterRegistry::new(Arc::clone(&scorer));
        let adapter: Arc<dyn ModelAdapter> = Arc::new(HeuristicAdapter::new(scorer));
        registry.register("rule_based", 1.0, adapter).unwrap();

        let ensemble = Ensemble::from_registry(registry).unwrap();
        let r = ensemble.score_model("http://192.168.1.1", "rule_based").unwrap();
        assert_eq!(r.label, Label::Phishing);
    }

    #[tokio::test]
    async fn test_scan_batch_preserves_order() {
        let ensemble = Arc::new(Ensemble::from_config(&EngineConfig::default()).unwrap());
        let inputs = vec![
            "https://example.com".to_string(),
            "http://192.168.1.1".to_string(),
            "https://example.org".to_string(),
        ];

        let scans = ensemble.scan_batch(inputs).await;
        let labels: Vec<_> = scans.iter().map(|s| s.verdict.label).collect();
        assert_eq!(labels, vec![Label::Legitimate, Label::Phishing, Label::Legitimate]);
    }
}
