//! # lipidann - Lipid Annotation for LC-MS/MS Features
//!
//! `lipidann` annotates unidentified lipid features (precursor m/z, ion mode,
//! adduct, MS2 spectrum) with a lipid class, chain composition and name.
//!
//! ## Cascade
//!
//! ```text
//! features ─► database search ─┬─ matched ─────────────────────────────────┐
//!                              └─ dark ─► adduct ─► class ─► chains ─► name ┴─► records
//! ```
//!
//! 1. **Database search**: library candidates within the MS1 tolerance are
//!    scored by MS2 similarity; the best one above the threshold wins.
//! 2. **Class resolution**: a declarative rule table decides when exactly one
//!    class explains both the precursor mass and the diagnostic fragments;
//!    otherwise the class model decides.
//! 3. **Chain composition**: single-chain classes are solved by mass balance,
//!    multi-chain classes are ranked by a model. Compositions are canonical.
//! 4. **Aggregation**: names like `PC 16:0_18:1` and a merged confidence.
//!
//! A separate formula branch decomposes precursor masses into CHNOPS formulas
//! and re-ranks them with the class output when available.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use lipidann::prelude::*;
//!
//! let table = FeatureTable::from_path("features.csv")?;
//! let store = InMemoryReferenceStore::from_path("library.csv")?;
//!
//! let context = AnnotationContext {
//!     store: Arc::new(store),
//!     prediction: PredictionContext {
//!         rules: Arc::new(RuleTable::builtin()?),
//!         class_model: Arc::new(SoftmaxClassifier::from_path("class_model.json")?),
//!         adduct_model: None,
//!         chain_ranker: Arc::new(EvidenceChainRanker::default()),
//!     },
//! };
//!
//! let pipeline = Pipeline::new(PipelineConfig::default())?;
//! let report = pipeline.annotate(&context, &table.features);
//! for record in &report.records {
//!     println!("{} {:?}", record.feature_id, record.name);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Modules
//!
//! - [`chemistry`]: element masses, formulas, adduct and lipid class tables
//! - [`feature`]: feature table ingestion and validated spectra
//! - [`similarity`]: spectral similarity methods
//! - [`reference`]: reference library store
//! - [`search`]: database search stage
//! - [`rules`]: rule table of the class resolver
//! - [`model`]: predictor traits and bundled model artifacts
//! - [`classify`]: hybrid rule/model class resolver
//! - [`chain`]: chain compositions, mass balance and ranking
//! - [`annotate`]: record assembly and naming
//! - [`formula`]: formula decomposition and re-ranking
//! - [`pipeline`]: parallel batch runner
//! - [`config`]: TOML configuration
//! - [`output`]: CSV, JSON and Parquet artifacts

#![warn(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]
#![allow(clippy::too_many_arguments)]

pub mod annotate;
pub mod chain;
pub mod chemistry;
pub mod classify;
pub mod config;
pub mod feature;
pub mod formula;
pub mod model;
pub mod output;
pub mod pipeline;
pub mod reference;
pub mod retry;
pub mod rules;
pub mod search;
pub mod similarity;

/// Re-export commonly used types for convenience
pub mod prelude {
    pub use crate::annotate::{AnnotationError, AnnotationRecord};
    pub use crate::chain::{Chain, ChainComposition, ChainParams, RankedComposition};
    pub use crate::chemistry::{Adduct, Category, Formula, LipidClass};
    pub use crate::classify::{ClassResolver, DecisionSource, Resolution};
    pub use crate::config::{ConfigError, PipelineConfig};
    pub use crate::feature::{Feature, FeatureTable, IngestError, IonMode, Spectrum};
    pub use crate::formula::{
        CompositionConstraint, ExternalDecomposer, FormulaDecomposer, FormulaResolver,
        MassDecomposer,
    };
    pub use crate::model::{
        AdductPredictor, ChainRanker, ClassPredictor, EvidenceChainRanker, ModelError,
        SoftmaxClassifier,
    };
    pub use crate::output::{OutputDir, OutputError};
    pub use crate::pipeline::{
        AnnotationContext, AnnotationReport, CancellationToken, Pipeline, PredictionContext,
        RunSummary,
    };
    pub use crate::reference::{InMemoryReferenceStore, ReferenceStore, ReferenceStoreError};
    pub use crate::rules::RuleTable;
    pub use crate::search::{DatabaseSearch, SearchParams};
    pub use crate::similarity::SimilarityMethod;
}
