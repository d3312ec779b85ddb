//! Latency benchmarks for the scan path
//!
//! Covers feature extraction, heuristic scoring, a full ensemble scan
//! (including a neural artifact loaded through the cache) and batch scans.
//!
//! Run with: cargo bench -p phishguard-classifiers

use candle_core::{Device, Tensor};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use phishguard_classifiers::neural::DENSE_PARAM_COUNT;
use phishguard_classifiers::{EngineConfig, Ensemble, FeatureExtractor, HeuristicScorer, ModelSpec};
use phishguard_core::Variant;
use std::sync::Arc;
use tokio::runtime::Runtime;

const INPUTS: &[(&str, &str)] = &[
    ("clean", "https://example.com"),
    ("ip_literal", "http://192.168.1.1/login"),
    ("shortener", "https://bit.ly/abc123"),
    (
        "long_webmail",
        "http://secure-account-update.webmail.example-portal.com/owa/auth/logon.aspx?replaceCurrent=1&url=https%3a%2f%2fmail",
    ),
    ("not_a_url", "verify your account now"),
];

/// Feature extraction (pure string scanning)
fn benchmark_extraction(c: &mut Criterion) {
    let extractor = FeatureExtractor::new().expect("Failed to create extractor");

    let mut group = c.benchmark_group("Feature_Extraction");
    group.sample_size(200);

    for (name, input) in INPUTS {
        group.bench_with_input(BenchmarkId::new("extract", name), input, |b, input| {
            b.iter(|| extractor.extract(black_box(input)));
        });
    }

    group.finish();
}

/// Heuristic scoring over pre-extracted features
fn benchmark_heuristic(c: &mut Criterion) {
    let extractor = FeatureExtractor::new().expect("Failed to create extractor");
    let scorer = HeuristicScorer::new().expect("Failed to create heuristic scorer");

    let mut group = c.benchmark_group("Heuristic_Scorer");
    group.sample_size(200);

    for (name, input) in INPUTS {
        let features = extractor.extract(input);
        group.bench_with_input(BenchmarkId::new("assess", name), &features, |b, features| {
            b.iter(|| scorer.assess(black_box(features)));
        });
    }

    group.finish();
}

/// Full ensemble scans: heuristic only, and heuristic plus cached network
fn benchmark_ensemble(c: &mut Criterion) {
    let dir = tempfile::TempDir::new().expect("Failed to create temp dir");
    let artifact = dir.path().join("primary.npy");
    Tensor::zeros(DENSE_PARAM_COUNT, candle_core::DType::F64, &Device::Cpu)
        .and_then(|t| t.write_npy(&artifact))
        .expect("Failed to write artifact");

    let heuristic_only = Ensemble::from_config(&EngineConfig::default())
        .expect("Failed to build ensemble");

    let mut config = EngineConfig::default();
    config.models.insert(
        "primary".to_string(),
        ModelSpec::new(Variant::Neural).with_weight(0.5).with_path(&artifact),
    );
    let with_network = Ensemble::from_config(&config).expect("Failed to build ensemble");

    let mut group = c.benchmark_group("Ensemble_Scan");
    group.sample_size(100);

    group.bench_function("heuristic_only", |b| {
        b.iter(|| heuristic_only.scan(black_box("http://192.168.1.1/login")));
    });

    group.bench_function("heuristic_and_network", |b| {
        b.iter(|| with_network.scan(black_box("http://192.168.1.1/login")));
    });

    group.finish();
}

/// Concurrent batch scans on the blocking pool
fn benchmark_batch(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let ensemble = Arc::new(
        Ensemble::from_config(&EngineConfig::default()).expect("Failed to build ensemble"),
    );

    let mut group = c.benchmark_group("Batch_Scan");
    group.sample_size(50);

    for size in [16usize, 128] {
        let inputs: Vec<String> = INPUTS
            .iter()
            .cycle()
            .take(size)
            .map(|(_, input)| input.to_string())
            .collect();

        group.bench_with_input(BenchmarkId::new("scan_batch", size), &inputs, |b, inputs| {
            b.iter(|| rt.block_on(ensemble.scan_batch(black_box(inputs.clone()))));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_extraction,
    benchmark_heuristic,
    benchmark_ensemble,
    benchmark_batch
);
criterion_main!(benches);
