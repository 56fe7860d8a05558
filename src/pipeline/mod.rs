//! # Batch Pipeline
//!
//! Runs the annotation cascade over a feature collection:
//!
//! ```text
//! features ─► search ─┬─ matched ───────────────────────────────┐
//!                     └─ unmatched ─► adduct ─► class ─► chains ─┴─► records
//! features ─► formula (alternate branch, optional class hints)
//! ```
//!
//! Every stage is an independent-row map over features on the rayon pool; the
//! shared resources (reference store, rule table, models) are read-only
//! `Arc`s held by the context structs, loaded once before the run.
//!
//! A failing feature never aborts a batch. Its error is recorded as a
//! [`RowFailure`] and the feature still gets an output row with every
//! identity field missing. A [`CancellationToken`] stops the remaining
//! features between rows; results computed so far are returned with
//! `cancelled` set.

mod cancel;
mod summary;


use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use log::{info, warn};
use rayon::prelude::*;
use serde::Serialize;

use crate::annotate::{
    matched_record, predicted_record, AdductAssignment, AnnotationError, AnnotationRecord,
};
use crate::chain::{ChainQuery, ChainResolver};
use crate::chemistry::{Adduct, Category, LipidClass};
use crate::classify::{ClassResolver, DecisionSource, Resolution};
use crate::config::{ConfigError, PipelineConfig};
use crate::feature::Feature;
use crate::formula::{
    CompositionConstraint, DecomposerError, FormulaAnnotation, FormulaDecomposer, FormulaResolver,
};
use crate::model::{AdductPredictor, ChainRanker, ClassPredictor, ModelInput};
use crate::reference::{ReferenceStore, ReferenceStoreError};
use crate::retry::RetryPolicy;
use crate::rules::RuleTable;
use crate::search::{DatabaseSearch, MatchedFeature, SearchOutcome, UnmatchedFeature};

pub use cancel::CancellationToken;
pub use summary::RunSummary;

/// Resources of the prediction stages
#[derive(Clone)]
pub struct PredictionContext {
    /// Rule table of the class resolver
    pub rules: Arc<RuleTable>,
    /// Class model (stage B)
    pub class_model: Arc<dyn ClassPredictor>,
    /// Adduct model; the input adduct is used when absent
    pub adduct_model: Option<Arc<dyn AdductPredictor>>,
    /// Multi-chain ranking model
    pub chain_ranker: Arc<dyn ChainRanker>,
}

/// Resources of the full cascade
#[derive(Clone)]
pub struct AnnotationContext {
    /// Reference library
    pub store: Arc<dyn ReferenceStore>,
    /// Prediction resources
    pub prediction: PredictionContext,
}

/// Stage a row failure happened in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Database search
    Search,
    /// Adduct prediction
    Adduct,
    /// Class resolution
    Class,
    /// Chain inference
    Chain,
    /// Formula resolution
    Formula,
}

/// Error captured for one feature
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowFailure {
    /// Feature key
    pub feature_id: String,
    /// Failing stage
    pub stage: Stage,
    /// Error kind label
    pub kind: String,
    /// Error message
    pub message: String,
}

impl RowFailure {
    fn new(feature: &Feature, stage: Stage, error: &AnnotationError) -> Self {
        Self {
            feature_id: feature.id.clone(),
            stage,
            kind: error.kind().to_string(),
            message: error.to_string(),
        }
    }

    fn formula(feature: &Feature, error: &DecomposerError) -> Self {
        let kind = match error {
            DecomposerError::Transient(_) => "transient",
            DecomposerError::Fatal(_) => "fatal",
            DecomposerError::InvalidInput(_) => "invalid_input",
            DecomposerError::IoError(_) => "io",
            DecomposerError::CsvError(_) => "output",
        };
        Self {
            feature_id: feature.id.clone(),
            stage: Stage::Formula,
            kind: kind.to_string(),
            message: error.to_string(),
        }
    }
}

/// Adduct stage output of one feature
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdductPrediction {
    /// Feature key
    pub feature_id: String,
    /// Adduct given in the input
    pub input_adduct: String,
    /// Adduct used downstream
    pub adduct: String,
    /// Predictor confidence
    pub confidence: Option<f64>,
}

/// Class stage output of one feature
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassPrediction {
    /// Feature key
    pub feature_id: String,
    /// Resolved class
    pub class: Option<String>,
    /// Category from the class table
    pub category: Option<Category>,
    /// Chain count from the class table
    pub num_chain: Option<usize>,
    /// Decision confidence
    pub confidence: Option<f64>,
    /// Decision source
    pub source: DecisionSource,
    /// Why the decision is invalid
    pub reason: Option<String>,
}

impl ClassPrediction {
    fn new(feature: &Feature, resolution: &Resolution) -> Self {
        let decision = resolution.decision();
        Self {
            feature_id: feature.id.clone(),
            class: decision.map(|d| d.class.name.to_string()),
            category: decision.map(|d| d.category()),
            num_chain: decision.map(|d| d.num_chain()),
            confidence: decision.and_then(|d| d.confidence),
            source: resolution.source(),
            reason: match resolution {
                Resolution::Invalid(e) => Some(e.to_string()),
                _ => None,
            },
        }
    }
}

/// Output of the search stage
#[derive(Debug, Default)]
pub struct SearchReport {
    /// Accepted library matches
    pub matched: Vec<MatchedFeature>,
    /// Features without an accepted match
    pub unmatched: Vec<UnmatchedFeature>,
    /// Rows whose store query failed
    pub failures: Vec<RowFailure>,
    /// Whether the batch was cancelled
    pub cancelled: bool,
}

/// Output of the prediction stages
#[derive(Debug, Default)]
pub struct PredictionReport {
    /// Adduct stage rows
    pub adducts: Vec<AdductPrediction>,
    /// Class stage rows
    pub classes: Vec<ClassPrediction>,
    /// Aggregated records, failed rows included
    pub records: Vec<AnnotationRecord>,
    /// Row failures
    pub failures: Vec<RowFailure>,
    /// Whether the batch was cancelled
    pub cancelled: bool,
}

/// Output of the full cascade
#[derive(Debug, Default)]
pub struct AnnotationReport {
    /// Search stage output
    pub search: SearchReport,
    /// Prediction stage output
    pub prediction: PredictionReport,
    /// Final records in input order
    pub records: Vec<AnnotationRecord>,
    /// Features submitted to the batch
    pub features: usize,
    /// Whether the batch was cancelled
    pub cancelled: bool,
}

impl AnnotationReport {
    /// All row failures, search first
    pub fn failures(&self) -> impl Iterator<Item = &RowFailure> {
        self.search.failures.iter().chain(&self.prediction.failures)
    }
}

/// Output of the formula branch
#[derive(Debug, Default)]
pub struct FormulaReport {
    /// Per-feature formula results
    pub annotations: Vec<FormulaAnnotation>,
    /// Row failures
    pub failures: Vec<RowFailure>,
    /// Whether the batch was cancelled
    pub cancelled: bool,
}

struct PredictedRow {
    adduct: Option<AdductPrediction>,
    class: Option<ClassPrediction>,
    record: AnnotationRecord,
    failure: Option<RowFailure>,
}

/// Batch runner
pub struct Pipeline {
    config: PipelineConfig,
    pool: Option<Arc<rayon::ThreadPool>>,
    cancel: CancellationToken,
}

impl Pipeline {
    /// Validate `config` and set up the worker pool
    pub fn new(config: PipelineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let pool = match config.runtime.threads {
            0 => None,
            threads => Some(Arc::new(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .build()
                    .map_err(|e| ConfigError::Invalid(format!("cannot start thread pool: {e}")))?,
            )),
        };
        Ok(Self {
            config,
            pool,
            cancel: CancellationToken::new(),
        })
    }

    /// Use `token` for cooperative cancellation
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Token that cancels this pipeline's batches
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Validated configuration
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    fn retry(&self) -> RetryPolicy {
        self.config.retry_policy()
    }

    /// Map `f` over `features` in parallel, skipping rows once cancelled.
    /// Results keep input order.
    fn map_rows<'f, T, F>(&self, features: &[&'f Feature], f: F) -> (Vec<T>, bool)
    where
        T: Send,
        F: Fn(&'f Feature) -> T + Sync + Send,
    {
        let run = || {
            features
                .par_iter()
                .map(|&feature| (!self.cancel.is_cancelled()).then(|| f(feature)))
                .collect::<Vec<Option<T>>>()
        };
        let rows = match &self.pool {
            Some(pool) => pool.install(run),
            None => run(),
        };
        let cancelled = rows.iter().any(Option::is_none);
        if cancelled {
            warn!(
                "Batch cancelled: {} of {} features processed",
                rows.iter().filter(|r| r.is_some()).count(),
                rows.len()
            );
        }
        (rows.into_iter().flatten().collect(), cancelled)
    }

    /// Split features into library matches and unmatched features
    pub fn search(&self, store: &dyn ReferenceStore, features: &[Feature]) -> SearchReport {
        let search = DatabaseSearch::new(self.config.search_params());
        let retry = self.retry();
        let refs: Vec<&Feature> = features.iter().collect();

        let (rows, cancelled) = self.map_rows(&refs, |feature| {
            retry
                .run(
                    "reference query",
                    || search.search_feature(store, feature),
                    ReferenceStoreError::is_transient,
                )
                .map_err(|e| RowFailure::new(feature, Stage::Search, &AnnotationError::Store(e)))
        });

        let mut report = SearchReport {
            cancelled,
            ..SearchReport::default()
        };
        for row in rows {
            match row {
                Ok(SearchOutcome::Matched(m)) => report.matched.push(m),
                Ok(SearchOutcome::Unmatched(u)) => report.unmatched.push(u),
                Err(failure) => report.failures.push(failure),
            }
        }
        info!(
            "Search: {} matched, {} unmatched, {} failed",
            report.matched.len(),
            report.unmatched.len(),
            report.failures.len()
        );
        report
    }

    /// Adduct, class and chain prediction for `features`
    pub fn predict(&self, ctx: &PredictionContext, features: &[&Feature]) -> PredictionReport {
        let (rows, cancelled) = self.map_rows(features, |feature| self.predict_feature(ctx, feature));

        let mut report = PredictionReport {
            cancelled,
            ..PredictionReport::default()
        };
        for row in rows {
            report.adducts.extend(row.adduct);
            report.classes.extend(row.class);
            report.failures.extend(row.failure);
            report.records.push(row.record);
        }

        let rule_based = report
            .classes
            .iter()
            .filter(|c| c.source == DecisionSource::RuleBased)
            .count();
        let model_based = report
            .classes
            .iter()
            .filter(|c| c.source == DecisionSource::ModelBased)
            .count();
        info!(
            "Prediction: {} rule-based, {} model-based, {} invalid, {} failed",
            rule_based,
            model_based,
            report.classes.len() - rule_based - model_based,
            report.failures.len()
        );
        report
    }

    fn predict_feature(&self, ctx: &PredictionContext, feature: &Feature) -> PredictedRow {
        let failed = |stage: Stage, error: AnnotationError, adduct: Option<AdductPrediction>| {
            warn!("Feature {} failed in {:?} stage: {}", feature.id, stage, error);
            PredictedRow {
                adduct,
                class: None,
                record: unannotated_record(feature),
                failure: Some(RowFailure::new(feature, stage, &error)),
            }
        };

        let assignment = match &ctx.adduct_model {
            Some(model) => match model.predict_adduct(&ModelInput::for_adduct(feature)) {
                Ok(prediction) => AdductAssignment {
                    adduct: prediction.label,
                    confidence: prediction.confidence.map(|c| c.clamp(0.0, 1.0)),
                },
                Err(e) => return failed(Stage::Adduct, e.into(), None),
            },
            None => AdductAssignment::from_input(feature),
        };
        let adduct_row = AdductPrediction {
            feature_id: feature.id.clone(),
            input_adduct: feature.adduct.clone(),
            adduct: assignment.adduct.clone(),
            confidence: assignment.confidence,
        };

        let resolver = ClassResolver::new(
            &ctx.rules,
            ctx.class_model.as_ref(),
            self.config.rules,
            self.config.chains,
        );
        let resolution = match resolver.resolve(feature, &assignment.adduct) {
            Ok(resolution) => resolution,
            Err(e) => return failed(Stage::Class, e.into(), Some(adduct_row)),
        };

        let adduct = Adduct::lookup_for_mode(&assignment.adduct, feature.ion_mode);
        let chains = match (resolution.decision(), adduct) {
            (Some(decision), Some(adduct)) => {
                let query = ChainQuery {
                    class: decision.class,
                    neutral_mass: adduct.neutral_mass(feature.precursor_mz),
                    precursor_mz: feature.precursor_mz,
                    ion_mode: feature.ion_mode,
                    fragments: &feature.fragments,
                    spectrum: &feature.spectrum,
                };
                match ChainResolver::new(ctx.chain_ranker.as_ref(), self.config.chains)
                    .resolve(&query)
                {
                    Ok(chains) => chains,
                    Err(e) => return failed(Stage::Chain, e.into(), Some(adduct_row)),
                }
            }
            _ => Vec::new(),
        };

        PredictedRow {
            adduct: Some(adduct_row),
            class: Some(ClassPrediction::new(feature, &resolution)),
            record: predicted_record(feature, &assignment, &resolution, chains),
            failure: None,
        }
    }

    /// Full cascade: search, then prediction for unmatched features
    pub fn annotate(&self, ctx: &AnnotationContext, features: &[Feature]) -> AnnotationReport {
        let search = self.search(ctx.store.as_ref(), features);

        let dark_ids: HashSet<&str> = search
            .unmatched
            .iter()
            .map(|u| u.feature_id.as_str())
            .collect();
        let dark: Vec<&Feature> = features
            .iter()
            .filter(|f| dark_ids.contains(f.id.as_str()))
            .collect();
        let prediction = if search.cancelled {
            PredictionReport {
                cancelled: true,
                ..PredictionReport::default()
            }
        } else {
            self.predict(&ctx.prediction, &dark)
        };

        let failed_ids: HashSet<&str> = search
            .failures
            .iter()
            .map(|r| r.feature_id.as_str())
            .collect();
        let failed_search: Vec<AnnotationRecord> = features
            .iter()
            .filter(|f| failed_ids.contains(f.id.as_str()))
            .map(unannotated_record)
            .collect();

        let order: HashMap<&str, usize> = features
            .iter()
            .enumerate()
            .map(|(i, f)| (f.id.as_str(), i))
            .collect();
        let mut records: Vec<AnnotationRecord> = search
            .matched
            .iter()
            .map(matched_record)
            .chain(prediction.records.iter().cloned())
            .chain(failed_search)
            .collect();
        records.sort_by_key(|r| order.get(r.feature_id.as_str()).copied().unwrap_or(usize::MAX));

        let cancelled = search.cancelled || prediction.cancelled;
        info!(
            "Annotated {} of {} features{}",
            records.len(),
            features.len(),
            if cancelled { " (cancelled)" } else { "" }
        );
        AnnotationReport {
            search,
            prediction,
            records,
            features: features.len(),
            cancelled,
        }
    }

    /// Formula branch; `constraints` maps feature ids to class hints
    pub fn resolve_formulas(
        &self,
        decomposer: &dyn FormulaDecomposer,
        features: &[Feature],
        constraints: &HashMap<String, CompositionConstraint>,
    ) -> FormulaReport {
        let resolver = FormulaResolver::new(decomposer, self.config.formula, self.retry());
        let refs: Vec<&Feature> = features.iter().collect();
        let (rows, cancelled) = self.map_rows(&refs, |feature| {
            let constraint = constraints.get(&feature.id).copied().unwrap_or_default();
            resolver
                .resolve(feature, constraint)
                .map_err(|e| RowFailure::formula(feature, &e))
        });

        let mut report = FormulaReport {
            cancelled,
            ..FormulaReport::default()
        };
        for row in rows {
            match row {
                Ok(annotation) => report.annotations.push(annotation),
                Err(failure) => report.failures.push(failure),
            }
        }
        info!(
            "Formula: {} resolved, {} failed",
            report.annotations.len(),
            report.failures.len()
        );
        report
    }
}

/// Class hints for the formula branch from annotation records
pub fn formula_constraints(records: &[AnnotationRecord]) -> HashMap<String, CompositionConstraint> {
    records
        .iter()
        .filter_map(|record| {
            let constraint = match (
                record.class.as_deref().and_then(LipidClass::lookup),
                record.category,
            ) {
                (Some(class), _) => CompositionConstraint::Class(class),
                (None, Some(category)) => CompositionConstraint::Category(category),
                (None, None) => return None,
            };
            Some((record.feature_id.clone(), constraint))
        })
        .collect()
}

fn unannotated_record(feature: &Feature) -> AnnotationRecord {
    AnnotationRecord {
        feature_id: feature.id.clone(),
        name: None,
        precursor_mz: feature.precursor_mz,
        ion_mode: feature.ion_mode,
        adduct: Some(feature.adduct.clone()),
        class: None,
        category: None,
        num_chain: None,
        pred_confidence: None,
        chains: Vec::new(),
    }
}
