//! PhishGuard Classifiers
//!
//! Feature extraction and multi-model scoring for phishing detection.
//!
//! A scan runs in three steps:
//! - Extract a fixed 20-field feature map from the input string
//! - Dispatch it to every enabled model (neural, external, heuristic, experimental)
//! - Combine the per-model results into a weighted verdict
//!
//! Model failures never escape a scan: any adapter error degrades to the
//! heuristic scorer and the result is tagged `<variant>-fallback`.

pub mod adapter;
pub mod artifact_cache;
pub mod config;
pub mod ensemble;
pub mod experimental;
pub mod external;
pub mod features;
pub mod heuristic;
pub mod neural;
pub mod registry;

pub use adapter::{dispatch, HeuristicAdapter, ModelAdapter};
pub use artifact_cache::ArtifactCache;
pub use config::{EngineConfig, HeuristicConfig, ModelSpec};
pub use ensemble::{weighted_vote, Ensemble, Scan};
pub use experimental::ExperimentalAdapter;
pub use external::{ExternalAdapter, ExternalModel, ProbabilisticClassifier};
pub use features::{FeatureExtractor, FeatureMap, FeatureVector, FEATURE_COUNT, FEATURE_NAMES};
pub use heuristic::{HeuristicAssessment, HeuristicScorer};
pub use neural::{ArtifactFormat, DenseNetwork, NeuralAdapter, NeuralArtifact};
pub use registry::{AdapterRegistry, RegisteredModel};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::adapter::ModelAdapter;
    pub use crate::config::EngineConfig;
    pub use crate::ensemble::{Ensemble, Scan};
    pub use crate::features::{FeatureExtractor, FeatureMap};
    pub use crate::heuristic::HeuristicScorer;
    pub use phishguard_core::prelude::*;
}
