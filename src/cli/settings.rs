//! Loading of the run configuration and the resources it names.
//!
//! Precedence: CLI flags, then the TOML file given with `--config`, then the
//! built-in defaults.

use anyhow::{bail, Context, Result};
use log::{info, warn};
use std::path::Path;
use std::sync::Arc;

use lipidann::chain::ChainParams;
use lipidann::config::PipelineConfig;
use lipidann::feature::FeatureTable;
use lipidann::formula::{ExternalDecomposer, FormulaDecomposer, MassDecomposer};
use lipidann::model::{
    AdductPredictor, ChainRanker, ClassPredictor, EvidenceChainRanker, SoftmaxClassifier,
};
use lipidann::pipeline::PredictionContext;
use lipidann::reference::InMemoryReferenceStore;
use lipidann::rules::RuleTable;

use super::RunArgs;

/// Configuration from `--config` with command-line overrides applied
pub fn load_config(run: &RunArgs) -> Result<PipelineConfig> {
    let mut config = match &run.config {
        Some(path) => PipelineConfig::from_file(path)
            .with_context(|| format!("Failed to load config file: {}", path.display()))?,
        None => PipelineConfig::default(),
    };

    if let Some(ms1_tol) = run.ms1_tol {
        config.search.ms1_tol = ms1_tol;
        config.search.is_ppm = run.ppm;
    } else if run.ppm {
        config.search.is_ppm = true;
    }
    if let Some(ms2_tol) = run.ms2_tol {
        config.search.ms2_tol = ms2_tol;
    }
    if let Some(threshold) = run.ms2_threshold {
        config.search.ms2_threshold = threshold;
    }
    if let Some(method) = run.method {
        config.search.method = method;
    }
    if let Some(threads) = run.threads {
        config.runtime.threads = threads;
    }
    if let Some(library) = &run.library {
        config.artifacts.reference = Some(library.clone());
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

/// Read the feature table, logging rejected rows
pub fn load_features(path: &Path) -> Result<FeatureTable> {
    let table = FeatureTable::from_path(path)
        .with_context(|| format!("Failed to read feature table: {}", path.display()))?;
    info!(
        "Loaded {} features from {}",
        table.features.len(),
        path.display()
    );
    if !table.errors.is_empty() {
        warn!("{} input rows rejected", table.errors.len());
    }
    Ok(table)
}

/// Reference library named by the configuration
pub fn load_store(config: &PipelineConfig) -> Result<InMemoryReferenceStore> {
    let Some(path) = &config.artifacts.reference else {
        bail!("No reference library: pass --library or set artifacts.reference");
    };
    InMemoryReferenceStore::from_path(path)
        .with_context(|| format!("Failed to load reference library: {}", path.display()))
}

/// Rule table from `artifacts.rules`, or the bundled one
pub fn load_rules(config: &PipelineConfig) -> Result<RuleTable> {
    match &config.artifacts.rules {
        Some(path) => RuleTable::from_file(path)
            .with_context(|| format!("Failed to load rule table: {}", path.display())),
        None => RuleTable::builtin().context("Bundled rule table is invalid"),
    }
}

fn load_softmax(path: &Path, what: &str) -> Result<SoftmaxClassifier> {
    SoftmaxClassifier::from_path(path)
        .with_context(|| format!("Failed to load {what}: {}", path.display()))
}

/// Models and rules of the prediction stages
pub fn load_prediction(config: &PipelineConfig) -> Result<PredictionContext> {
    let Some(class_path) = &config.artifacts.class_model else {
        bail!("No class model: pass --class-model or set artifacts.class_model");
    };
    let class_model: Arc<dyn ClassPredictor> = Arc::new(load_softmax(class_path, "class model")?);

    let adduct_model: Option<Arc<dyn AdductPredictor>> = match &config.artifacts.adduct_model {
        Some(path) => Some(Arc::new(load_softmax(path, "adduct model")?)),
        None => None,
    };

    let chain_ranker: Arc<dyn ChainRanker> = match &config.artifacts.chain_priors {
        Some(path) => Arc::new(
            EvidenceChainRanker::from_path(path)
                .with_context(|| format!("Failed to load chain priors: {}", path.display()))?,
        ),
        None => Arc::new(EvidenceChainRanker::default()),
    };

    Ok(PredictionContext {
        rules: Arc::new(load_rules(config)?),
        class_model,
        adduct_model,
        chain_ranker,
    })
}

/// External decomposer from `artifacts.decomposer`, or the built-in one
pub fn decomposer(config: &PipelineConfig) -> Result<Box<dyn FormulaDecomposer>> {
    match config.artifacts.decomposer.as_deref() {
        None => Ok(Box::new(MassDecomposer::default())),
        Some([]) => bail!("artifacts.decomposer must name a program"),
        Some([program, args @ ..]) => {
            info!("Using external decomposer: {program}");
            Ok(Box::new(ExternalDecomposer::new(program.as_str(), args.to_vec())))
        }
    }
}

/// Summary line for `check-config`
pub fn describe(config: &PipelineConfig) -> Vec<String> {
    let ChainParams {
        min_carbons,
        max_carbons,
        max_double_bonds,
        ..
    } = config.chains;
    vec![
        format!(
            "search: ms1_tol {} {}, ms2_tol {} Da, threshold {}, method {}",
            config.search.ms1_tol,
            if config.search.is_ppm { "ppm" } else { "Da" },
            config.search.ms2_tol,
            config.search.ms2_threshold,
            config.search.method
        ),
        format!(
            "rules: {} (ms1 {} ppm, ms2 {} ppm)",
            if config.rules.no_rules { "disabled" } else { "enabled" },
            config.rules.ms1_tol,
            config.rules.ms2_tol
        ),
        format!("chains: C{min_carbons}-C{max_carbons}, up to {max_double_bonds} double bonds"),
        format!(
            "runtime: {} threads, {} attempts",
            if config.runtime.threads == 0 {
                "all".to_string()
            } else {
                config.runtime.threads.to_string()
            },
            config.runtime.retry_attempts
        ),
    ]
}
