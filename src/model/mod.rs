//! # Model Artifacts
//!
//! Statistical predictors are consumed as opaque `predict` capabilities. The
//! traits here are the only surface the cascade relies on; they are object safe
//! and `Send + Sync` so one loaded artifact can be shared across worker threads.
//!
//! Bundled implementations:
//!
//! - [`SoftmaxClassifier`]: a linear softmax model loaded from JSON, usable as
//!   adduct predictor and as class predictor
//! - [`EvidenceChainRanker`]: scores mass-consistent chain combinations by acyl
//!   fragment evidence plus per-chain priors

mod chain_ranker;
mod error;
mod softmax;


use serde::Serialize;

use crate::chain::{ChainParams, ChainQuery, RankedComposition};
use crate::feature::{Feature, FragmentVector, IonMode};

pub use chain_ranker::EvidenceChainRanker;
pub use error::ModelError;
pub use softmax::{SoftmaxArtifact, SoftmaxClassifier};

/// Model input assembled from a feature
#[derive(Debug, Clone, Copy)]
pub struct ModelInput<'a> {
    /// Precursor m/z (rounded to 2 decimals for adduct prediction)
    pub precursor_mz: f64,
    /// Ion mode
    pub ion_mode: IonMode,
    /// Adduct token, when known
    pub adduct: Option<&'a str>,
    /// Fragment-presence vector
    pub fragments: &'a FragmentVector,
}

impl<'a> ModelInput<'a> {
    /// Input for adduct prediction: m/z rounded to 2 decimals, no adduct
    pub fn for_adduct(feature: &'a Feature) -> Self {
        Self {
            precursor_mz: (feature.precursor_mz * 100.0).round() / 100.0,
            ion_mode: feature.ion_mode,
            adduct: None,
            fragments: &feature.fragments,
        }
    }

    /// Input for class prediction with the resolved adduct
    pub fn for_class(feature: &'a Feature, adduct: &'a str) -> Self {
        Self {
            precursor_mz: feature.precursor_mz,
            ion_mode: feature.ion_mode,
            adduct: Some(adduct),
            fragments: &feature.fragments,
        }
    }
}

/// A predicted label with an optional probability
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    /// Predicted label
    pub label: String,
    /// Probability in [0, 1], missing when the model cannot produce one
    pub confidence: Option<f64>,
}

/// Predicts the adduct of a feature. Deterministic and stateless between calls.
pub trait AdductPredictor: Send + Sync {
    /// Predict `(adduct, confidence?)`
    fn predict_adduct(&self, input: &ModelInput<'_>) -> Result<Prediction, ModelError>;
}

/// Predicts the lipid class of a feature
pub trait ClassPredictor: Send + Sync {
    /// Predict `(class, confidence?)`
    fn predict_class(&self, input: &ModelInput<'_>) -> Result<Prediction, ModelError>;
}

/// Ranks chain compositions for multi-chain classes
pub trait ChainRanker: Send + Sync {
    /// The `limit` most probable compositions, best first. Candidates need not be
    /// canonical; the caller canonicalizes and re-checks the mass balance.
    fn rank(
        &self,
        query: &ChainQuery<'_>,
        params: &ChainParams,
        limit: usize,
    ) -> Result<Vec<RankedComposition>, ModelError>;
}
