//! Additive rule-based scorer
//!
//! Every indicator that holds adds a fixed weight to a risk score starting
//! at zero. Scores above the threshold are labelled phishing. Confidence is
//! the distance-style value `score` (phishing) or `1 - score` (legitimate),
//! clamped to [0, 1]; it is not a calibrated probability.
//!
//! This scorer cannot fail and is the fallback for every other variant.

use crate::features::{index, FeatureMap, FeatureVector};
use aho_corasick::AhoCorasick;
use phishguard_core::{Error, Label, ModelResult, ModelTag, Result};

/// Default decision threshold
pub const DEFAULT_THRESHOLD: f64 = 0.4;

/// Webmail and exchange-portal markers commonly spoofed by credential lures
pub const WEBMAIL_PATTERNS: &[&str] = &["zimbra", "exchange", "owa", "webmail", "mail"];

// High-risk indicators
const IP_AUTHORITY_WEIGHT: f64 = 0.4;
const SHORTENER_WEIGHT: f64 = 0.3;

// Medium-risk indicators
const KEYWORD_WEIGHT: f64 = 0.25;
const LONG_URL_WEIGHT: f64 = 0.15;
const MANY_DOTS_WEIGHT: f64 = 0.15;
const MANY_SUBDOMAINS_WEIGHT: f64 = 0.15;
const INSECURE_SCHEME_WEIGHT: f64 = 0.15;

// Structural indicators
const DEEP_PATH_WEIGHT: f64 = 0.2;
const HYPHENS_WEIGHT: f64 = 0.1;
const UNDERSCORES_WEIGHT: f64 = 0.1;
const LONG_DOMAIN_WEIGHT: f64 = 0.1;
const FILE_IN_DEEP_PATH_WEIGHT: f64 = 0.15;
const WEBMAIL_WEIGHT: f64 = 0.2;

const MAX_URL_LENGTH: f64 = 80.0;
const MAX_DOTS: f64 = 2.0;
const MAX_SUBDOMAINS: f64 = 1.0;
const MAX_PATH_DEPTH: f64 = 4.0;
const MAX_HYPHENS: f64 = 2.0;
const MAX_UNDERSCORES: f64 = 1.0;
const MAX_DOMAIN_LENGTH: f64 = 30.0;
const FILE_PATH_DEPTH: f64 = 3.0;

/// Outcome of one heuristic evaluation
#[derive(Debug, Clone, PartialEq)]
pub struct HeuristicAssessment {
    pub label: Label,
    pub confidence: f64,

    /// Raw accumulated risk score
    pub score: f64,

    /// Names of the rules that fired, in evaluation order
    pub triggered: Vec<&'static str>,
}

/// Additive rule engine over the feature vector
pub struct HeuristicScorer {
    threshold: f64,
    webmail: AhoCorasick,
}

impl HeuristicScorer {
    /// Create a scorer with the default threshold
    pub fn new() -> Result<Self> {
        Ok(Self {
            threshold: DEFAULT_THRESHOLD,
            webmail: AhoCorasick::new(WEBMAIL_PATTERNS)
                .map_err(|e| Error::internal(format!("Failed to build webmail matcher: {}", e)))?,
        })
    }

    /// Override the decision threshold
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Assess a full feature map
    pub fn assess(&self, features: &FeatureMap) -> HeuristicAssessment {
        self.assess_vector(&features.vector(), &features.url_lower)
    }

    /// Assess a bare vector; pass an empty `url_lower` when the input text
    /// is unavailable and the webmail bonus cannot apply
    pub fn assess_vector(&self, v: &FeatureVector, url_lower: &str) -> HeuristicAssessment {
        let mut score = 0.0;
        let mut triggered = Vec::new();

        let mut hit = |name: &'static str, weight: f64| {
            score += weight;
            triggered.push(name);
        };

        if v.flag(index::HAS_IP) {
            hit("ip_authority", IP_AUTHORITY_WEIGHT);
        }
        if v.flag(index::HAS_SHORTENER) {
            hit("shortener", SHORTENER_WEIGHT);
        }

        if v.flag(index::HAS_SUSPICIOUS_KEYWORDS) {
            hit("suspicious_keyword", KEYWORD_WEIGHT);
        }
        if v.get(index::URL_LENGTH) > MAX_URL_LENGTH {
            hit("long_url", LONG_URL_WEIGHT);
        }
        if v.get(index::NUM_DOTS) > MAX_DOTS {
            hit("many_dots", MANY_DOTS_WEIGHT);
        }
        if v.get(index::SUBDOMAIN_COUNT) > MAX_SUBDOMAINS {
            hit("many_subdomains", MANY_SUBDOMAINS_WEIGHT);
        }
        if !v.flag(index::IS_HTTPS) {
            hit("insecure_scheme", INSECURE_SCHEME_WEIGHT);
        }

        if v.get(index::PATH_DEPTH) > MAX_PATH_DEPTH {
            hit("deep_path", DEEP_PATH_WEIGHT);
        }
        if v.get(index::NUM_HYPHENS) > MAX_HYPHENS {
            hit("many_hyphens", HYPHENS_WEIGHT);
        }
        if v.get(index::NUM_UNDERSCORES) > MAX_UNDERSCORES {
            hit("many_underscores", UNDERSCORES_WEIGHT);
        }
        if v.get(index::DOMAIN_LENGTH) > MAX_DOMAIN_LENGTH {
            hit("long_domain", LONG_DOMAIN_WEIGHT);
        }
        if v.flag(index::HAS_FILE_EXTENSION) && v.get(index::PATH_DEPTH) > FILE_PATH_DEPTH {
            hit("file_in_deep_path", FILE_IN_DEEP_PATH_WEIGHT);
        }

        if self.webmail.is_match(url_lower) {
            hit("webmail_portal", WEBMAIL_WEIGHT);
        }

        let label = if score > self.threshold {
            Label::Phishing
        } else {
            Label::Legitimate
        };
        let confidence = match label {
            Label::Phishing => score,
            Label::Legitimate => 1.0 - score,
        }
        .clamp(0.0, 1.0);

        HeuristicAssessment {
            label,
            confidence,
            score,
            triggered,
        }
    }

    /// Score a feature map and tag the result
    pub fn result(&self, features: &FeatureMap, tag: ModelTag) -> ModelResult {
        let assessment = self.assess(features);
        tracing::debug!(
            tag = %tag,
            score = assessment.score,
            rules = ?assessment.triggered,
            "heuristic assessment"
        );
        ModelResult::new(assessment.label, assessment.confidence, tag)
    }
}

impl Default for HeuristicScorer {
    fn default() -> Self {
        Self::new().expect("Failed to create heuristic scorer")
    }
}
