//! Core types for PhishGuard

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Canonical verdict label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    Phishing,
    Legitimate,
}

impl Label {
    /// Wire name of the label
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Phishing => "phishing",
            Self::Legitimate => "legitimate",
        }
    }

    /// Whether this label flags the input
    pub fn is_phishing(&self) -> bool {
        matches!(self, Self::Phishing)
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scoring strategy a configured model uses
///
/// Legacy tags from older deployments are accepted as aliases. Any other
/// tag deserializes as [`Variant::Unknown`] and is scored heuristically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    /// Fixed-topology dense network over the feature vector
    #[serde(alias = "q_learning")]
    Neural,

    /// Externally trained probabilistic classifier
    #[serde(alias = "sklearn")]
    External,

    /// Additive rule engine
    #[serde(alias = "rule_based")]
    Heuristic,

    /// Random placeholder model (non-deterministic)
    Experimental,

    /// Unrecognized tag
    #[serde(other)]
    Unknown,
}

impl Variant {
    /// Wire name of the variant
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Neural => "neural",
            Self::External => "external",
            Self::Heuristic => "heuristic",
            Self::Experimental => "experimental",
            Self::Unknown => "unknown",
        }
    }

    /// Tag for a result this variant produced itself
    pub fn tag(self) -> ModelTag {
        ModelTag {
            variant: self,
            fallback: false,
        }
    }

    /// Tag for a heuristic result standing in for this variant
    pub fn fallback(self) -> ModelTag {
        ModelTag {
            variant: self,
            fallback: true,
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Variant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "neural" | "q_learning" => Ok(Self::Neural),
            "external" | "sklearn" => Ok(Self::External),
            "heuristic" | "rule_based" => Ok(Self::Heuristic),
            "experimental" => Ok(Self::Experimental),
            "unknown" => Ok(Self::Unknown),
            other => Err(format!("unrecognized variant '{}'", other)),
        }
    }
}

/// Which variant produced a result, and whether it degraded to the heuristic
///
/// Rendered as `neural`, `neural-fallback`, `external-fallback`, ...
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct ModelTag {
    pub variant: Variant,
    pub fallback: bool,
}

impl ModelTag {
    /// Whether the result came from the heuristic fallback path
    pub fn is_fallback(&self) -> bool {
        self.fallback
    }
}

impl fmt::Display for ModelTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.fallback {
            write!(f, "{}-fallback", self.variant)
        } else {
            write!(f, "{}", self.variant)
        }
    }
}

impl From<ModelTag> for String {
    fn from(tag: ModelTag) -> Self {
        tag.to_string()
    }
}

impl TryFrom<String> for ModelTag {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.strip_suffix("-fallback") {
            Some(base) => Ok(base.parse::<Variant>()?.fallback()),
            None => Ok(s.parse::<Variant>()?.tag()),
        }
    }
}

/// Clamp a confidence into [0, 1]; NaN maps to 0
pub fn clamp_confidence(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Result of scoring with a single model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelResult {
    /// Predicted label
    pub label: Label,

    /// Confidence in the label (0.0-1.0)
    pub confidence: f64,

    /// Variant that produced the result
    pub variant: ModelTag,

    /// Latency in microseconds
    #[serde(default)]
    pub latency_us: u64,
}

impl ModelResult {
    /// Create a new result, clamping the confidence into range
    pub fn new(label: Label, confidence: f64, variant: ModelTag) -> Self {
        Self {
            label,
            confidence: clamp_confidence(confidence),
            variant,
            latency_us: 0,
        }
    }

    /// Attach a measured latency
    pub fn with_latency(mut self, latency_us: u64) -> Self {
        self.latency_us = latency_us;
        self
    }
}

/// Final weighted decision for one scan request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnsembleVerdict {
    /// Winning label
    pub label: Label,

    /// Normalized weighted score of the winning label (0.0-1.0)
    pub confidence: f64,

    /// Every invoked model's result, keyed by model id
    pub model_results: BTreeMap<String, ModelResult>,

    /// Ids of the models that were invoked, in invocation order
    pub models_used: Vec<String>,

    /// Aggregation method
    pub ensemble_type: String,
}

impl EnsembleVerdict {
    /// Aggregation method name reported on every verdict
    pub const WEIGHTED_AVERAGE: &'static str = "weighted_average";

    /// Whether any model degraded to the heuristic fallback
    pub fn degraded(&self) -> bool {
        self.model_results.values().any(|r| r.variant.is_fallback())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_wire_names() {
        assert_eq!(Label::Phishing.to_string(), "phishing");
        assert_eq!(
            serde_json::to_string(&Label::Legitimate).unwrap(),
            "\"legitimate\""
        );
    }

    #[test]
    fn test_variant_aliases_and_unknown() {
        let v: Variant = serde_yaml::from_str("q_learning").unwrap();
        assert_eq!(v, Variant::Neural);
        let v: Variant = serde_yaml::from_str("sklearn").unwrap();
        assert_eq!(v, Variant::External);
        let v: Variant = serde_yaml::from_str("rule_based").unwrap();
        assert_eq!(v, Variant::Heuristic);
        let v: Variant = serde_yaml::from_str("quantum_forest").unwrap();
        assert_eq!(v, Variant::Unknown);
    }

    #[test]
    fn test_model_tag_rendering() {
        assert_eq!(Variant::Neural.tag().to_string(), "neural");
        assert_eq!(Variant::Neural.fallback().to_string(), "neural-fallback");

        let json = serde_json::to_string(&Variant::External.fallback()).unwrap();
        assert_eq!(json, "\"external-fallback\"");

        let tag: ModelTag = serde_json::from_str("\"heuristic\"").unwrap();
        assert_eq!(tag, Variant::Heuristic.tag());
        let tag: ModelTag = serde_json::from_str("\"neural-fallback\"").unwrap();
        assert!(tag.is_fallback());
    }

    #[test]
    fn test_model_result_clamps_confidence() {
        let r = ModelResult::new(Label::Phishing, 1.7, Variant::Heuristic.tag());
        assert_eq!(r.confidence, 1.0);
        let r = ModelResult::new(Label::Legitimate, -0.2, Variant::Heuristic.tag());
        assert_eq!(r.confidence, 0.0);
        let r = ModelResult::new(Label::Legitimate, f64::NAN, Variant::Heuristic.tag());
        assert_eq!(r.confidence, 0.0);
    }
}
