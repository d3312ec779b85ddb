//! Mock adapters for testing
//!
//! Configurable implementations of the ModelAdapter trait for exercising
//! ensemble voting, fallback dispatch and call accounting.

#![allow(dead_code)]

use phishguard_classifiers::{FeatureMap, ModelAdapter};
use phishguard_core::{Error, Label, ModelResult, Result, Variant};
use std::sync::atomic::{AtomicU32, Ordering};

/// An adapter returning a fixed result
pub struct MockAdapter {
    label: Label,
    confidence: f64,
    variant: Variant,
    call_count: AtomicU32,
}

impl MockAdapter {
    /// Create a mock voting `label` with full confidence
    pub fn new(label: Label) -> Self {
        Self {
            label,
            confidence: 1.0,
            variant: Variant::Experimental,
            call_count: AtomicU32::new(0),
        }
    }

    pub fn phishing() -> Self {
        Self::new(Label::Phishing)
    }

    pub fn legitimate() -> Self {
        Self::new(Label::Legitimate)
    }

    /// Set the confidence this adapter will return (not clamped here)
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }

    /// Set the variant this adapter reports
    pub fn with_variant(mut self, variant: Variant) -> Self {
        self.variant = variant;
        self
    }

    /// Get the number of times score was called
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }
}

impl ModelAdapter for MockAdapter {
    fn score(&self, _features: &FeatureMap) -> Result<ModelResult> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        Ok(ModelResult {
            label: self.label,
            confidence: self.confidence,
            variant: self.variant.tag(),
            latency_us: 0,
        })
    }

    fn variant(&self) -> Variant {
        self.variant
    }
}

/// An adapter that always fails, for exercising the fallback path
pub struct FailingAdapter {
    variant: Variant,
    message: String,
    call_count: AtomicU32,
}

impl FailingAdapter {
    pub fn new(variant: Variant) -> Self {
        Self {
            variant,
            message: "simulated model failure".to_string(),
            call_count: AtomicU32::new(0),
        }
    }

    /// Set a custom error message
    pub fn with_error(mut self, message: &str) -> Self {
        self.message = message.to_string();
        self
    }

    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }
}

impl ModelAdapter for FailingAdapter {
    fn score(&self, _features: &FeatureMap) -> Result<ModelResult> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        Err(Error::artifact(self.message.clone()))
    }

    fn variant(&self) -> Variant {
        self.variant
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use phishguard_classifiers::FeatureExtractor;

    #[test]
    fn test_mock_adapter_basic() {
        let features = FeatureExtractor::new().unwrap().extract("https://example.com");
        let adapter = MockAdapter::phishing().with_confidence(0.8);

        let result = adapter.score(&features).unwrap();
        assert_eq!(result.label, Label::Phishing);
        assert_eq!(result.confidence, 0.8);
        assert_eq!(adapter.call_count(), 1);
    }

    #[test]
    fn test_failing_adapter() {
        let features = FeatureExtractor::new().unwrap().extract("https://example.com");
        let adapter = FailingAdapter::new(Variant::External).with_error("custom");

        let err = adapter.score(&features).unwrap_err();
        assert!(err.to_string().contains("custom"));
        assert_eq!(adapter.call_count(), 1);
    }
}
