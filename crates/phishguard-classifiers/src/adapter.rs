//! Model adapter trait and fallback-safe dispatch

use crate::features::FeatureMap;
use crate::heuristic::HeuristicScorer;
use phishguard_core::{ModelResult, ModelTag, Result, Variant};
use std::sync::Arc;
use std::time::Instant;

/// Trait for all scoring strategies
///
/// Every variant consumes the same feature map and produces a uniform
/// [`ModelResult`]. Implementations may return errors; [`dispatch`] turns
/// them into tagged heuristic results.
pub trait ModelAdapter: Send + Sync {
    /// Score the given features
    fn score(&self, features: &FeatureMap) -> Result<ModelResult>;

    /// Get the variant this adapter implements
    fn variant(&self) -> Variant;
}

/// Score with one adapter; never fails
///
/// Adapter errors degrade to the heuristic scorer, tagged
/// `<variant>-fallback` so callers can observe the degradation.
pub fn dispatch(
    model_id: &str,
    adapter: &dyn ModelAdapter,
    features: &FeatureMap,
    heuristic: &HeuristicScorer,
) -> ModelResult {
    let start = Instant::now();

    let result = match adapter.score(features) {
        Ok(result) => result,
        Err(e) => {
            tracing::warn!(
                model = model_id,
                variant = %adapter.variant(),
                error = %e,
                "model failed, falling back to heuristic"
            );
            heuristic.result(features, adapter.variant().fallback())
        }
    };

    if result.variant.is_fallback() {
        metrics::counter!("phishguard_fallbacks_total", "variant" => adapter.variant().as_str())
            .increment(1);
    }

    // Re-clamp: adapters outside this crate construct results too
    let result = ModelResult::new(result.label, result.confidence, result.variant)
        .with_latency(start.elapsed().as_micros() as u64);

    tracing::debug!(
        model = model_id,
        label = %result.label,
        confidence = result.confidence,
        variant = %result.variant,
        latency_us = result.latency_us,
        "model scored"
    );

    result
}

/// Adapter backed directly by the heuristic scorer
pub struct HeuristicAdapter {
    scorer: Arc<HeuristicScorer>,
    variant: Variant,
}

impl HeuristicAdapter {
    /// Create a heuristic adapter
    pub fn new(scorer: Arc<HeuristicScorer>) -> Self {
        Self {
            scorer,
            variant: Variant::Heuristic,
        }
    }

    /// Heuristic scoring on behalf of a variant that cannot run, such as an
    /// unrecognized configuration tag
    pub fn standing_in_for(scorer: Arc<HeuristicScorer>, variant: Variant) -> Self {
        Self { scorer, variant }
    }

    fn tag(&self) -> ModelTag {
        match self.variant {
            Variant::Heuristic => Variant::Heuristic.tag(),
            other => other.fallback(),
        }
    }
}

impl ModelAdapter for HeuristicAdapter {
    fn score(&self, features: &FeatureMap) -> Result<ModelResult> {
        Ok(self.scorer.result(features, self.tag()))
    }

    fn variant(&self) -> Variant {
        self.variant
    }
}
