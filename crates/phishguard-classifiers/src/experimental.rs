//! Placeholder experimental model
//!
//! Returns a uniformly random label with confidence drawn from
//! [0.6, 0.9). It exists to exercise the variant dispatch path, is
//! deliberately non-deterministic, and must be left out of any
//! determinism checks. Use [`ExperimentalAdapter::with_seed`] in tests.

use crate::adapter::ModelAdapter;
use crate::features::FeatureMap;
use parking_lot::Mutex;
use phishguard_core::{Label, ModelResult, Result, Variant};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::ops::Range;

/// Range the placeholder confidence is drawn from
pub const CONFIDENCE_RANGE: Range<f64> = 0.6..0.9;

/// Random-output adapter
pub struct ExperimentalAdapter {
    rng: Mutex<StdRng>,
}

impl ExperimentalAdapter {
    /// Create an adapter seeded from OS entropy
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Create a reproducible adapter
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Default for ExperimentalAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelAdapter for ExperimentalAdapter {
    fn score(&self, _features: &FeatureMap) -> Result<ModelResult> {
        let mut rng = self.rng.lock();
        let label = if rng.gen_bool(0.5) {
            Label::Phishing
        } else {
            Label::Legitimate
        };
        let confidence = rng.gen_range(CONFIDENCE_RANGE);
        Ok(ModelResult::new(label, confidence, Variant::Experimental.tag()))
    }

    fn variant(&self) -> Variant {
        Variant::Experimental
    }
}
