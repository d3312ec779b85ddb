//! PhishGuard CLI
//!
//! Thin host around the scoring engine: loads configuration, initialises
//! logging and prints JSON results to stdout. Logs go to stderr.

use anyhow::{Context, Result};
use clap::Parser;
use phishguard_classifiers::{EngineConfig, Ensemble, Scan};
use phishguard_core::ModelResult;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

mod cli;

use cli::{Cli, Commands};

/// JSON output for a scanned input
#[derive(Serialize)]
struct ScanReport<'a> {
    input: &'a str,
    #[serde(flatten)]
    scan: &'a Scan,
}

/// JSON output for a single-model score
#[derive(Serialize)]
struct ModelReport<'a> {
    input: &'a str,
    model: &'a str,
    result: &'a ModelResult,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.log_json);

    let config = load_config(&cli.config, cli.threshold)?;
    let ensemble = Arc::new(Ensemble::from_config(&config)?);

    match &cli.command {
        Commands::Scan { input } => {
            let scan = ensemble.scan(input);
            print_json(&ScanReport { input, scan: &scan })?;
        }

        Commands::Model { id, input } => {
            let result = ensemble.score_model(input, id)?;
            print_json(&ModelReport {
                input,
                model: id,
                result: &result,
            })?;
        }

        Commands::Batch { file } => {
            let inputs = read_batch_inputs(file).await?;
            info!(count = inputs.len(), file = %file.display(), "scanning batch");

            let scans = ensemble.scan_batch(inputs.clone()).await;
            for (input, scan) in inputs.iter().zip(&scans) {
                println!("{}", serde_json::to_string(&ScanReport { input, scan })?);
            }
        }

        Commands::Features { input } => {
            print_json(&ensemble.features(input))?;
        }
    }

    Ok(())
}

/// Load the engine configuration, applying command-line overrides
fn load_config(path: &Path, threshold: Option<f64>) -> Result<EngineConfig> {
    let mut config = EngineConfig::load_or_default(path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?;

    if let Some(threshold) = threshold {
        config.heuristic.threshold = threshold;
        config.validate()?;
    }

    debug!(
        models = ?config.model_names(),
        threshold = config.heuristic.threshold,
        "configuration loaded"
    );
    Ok(config)
}

/// Read one input per non-blank line
async fn read_batch_inputs(path: &Path) -> Result<Vec<String>> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read batch file {}", path.display()))?;

    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Initialize tracing/logging
fn init_tracing(verbose: bool, json: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("phishguard=debug,phishguard_classifiers=debug")
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("phishguard=info,phishguard_classifiers=info"))
    };

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use tempfile::TempDir;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_model_subcommand() {
        let cli = Cli::try_parse_from([
            "phishguard",
            "--threshold",
            "0.5",
            "model",
            "rule_based",
            "http://10.0.0.1",
        ])
        .unwrap();
        assert_eq!(cli.threshold, Some(0.5));
        assert!(matches!(
            cli.command,
            Commands::Model { ref id, ref input } if id == "rule_based" && input == "http://10.0.0.1"
        ));
    }

    #[test]
    fn test_load_config_threshold_override() {
        let config = load_config(Path::new("/nonexistent/phishguard.yaml"), Some(0.7)).unwrap();
        assert_eq!(config.heuristic.threshold, 0.7);
        assert!(load_config(Path::new("/nonexistent/phishguard.yaml"), Some(f64::NAN)).is_err());
    }

    #[test]
    fn test_load_config_reports_bad_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("phishguard.yaml");
        std::fs::write(&path, "models:\n  a:\n    type: heuristic\n    weight: -2\n").unwrap();

        let err = load_config(&path, None).unwrap_err();
        assert!(format!("{:#}", err).contains("invalid weight"));
    }

    #[tokio::test]
    async fn test_read_batch_inputs_skips_blank_lines() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("urls.txt");
        std::fs::write(&path, "https://example.com\n\n  http://10.0.0.1  \n").unwrap();

        let inputs = read_batch_inputs(&path).await.unwrap();
        assert_eq!(inputs, vec!["https://example.com", "http://10.0.0.1"]);
    }

    #[test]
    fn test_scan_report_shape() {
        let ensemble = Ensemble::from_config(&EngineConfig::default()).unwrap();
        let scan = ensemble.scan("https://example.com");
        let value = serde_json::to_value(ScanReport {
            input: "https://example.com",
            scan: &scan,
        })
        .unwrap();

        assert_eq!(value["input"], "https://example.com");
        assert_eq!(value["features"]["url_length"], 19);
        assert_eq!(value["features"]["is_https"], 1);
        assert_eq!(value["verdict"]["label"], "legitimate");
        assert_eq!(value["verdict"]["ensemble_type"], "weighted_average");
        assert_eq!(
            value["verdict"]["model_results"]["rule_based"]["variant"],
            "heuristic"
        );
    }
}
