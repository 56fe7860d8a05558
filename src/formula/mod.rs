//! # Formula Resolution
//!
//! An alternate branch that proposes elemental formulas for a feature. The
//! decomposition itself is a black-box [`FormulaDecomposer`]:
//!
//! - [`MassDecomposer`]: built-in CHNOPS enumeration
//! - [`ExternalDecomposer`]: an external program fed a SIRIUS `.ms` file
//!
//! Candidates are re-ranked with the elemental constraints of the class (or
//! category) when the class cascade has produced one, and the top `top_n` are
//! reported with the best as `predicted_formula`. Transient decomposer
//! failures are retried under the configured [`RetryPolicy`].

mod decomposer;
mod error;
pub mod exchange;
mod external;
mod rerank;

#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};

use crate::chemistry::{Adduct, Formula};
use crate::feature::{Feature, Spectrum};
use crate::retry::RetryPolicy;

pub use decomposer::{ElementBounds, MassDecomposer};
pub use error::DecomposerError;
pub use external::{parse_output, ExternalDecomposer, EXIT_TEMPFAIL};
pub use rerank::{rerank, CompositionConstraint, RankedFormula};

/// Tolerances and output size of the formula branch
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormulaParams {
    /// Precursor tolerance in ppm
    pub ms1_ppm: f64,
    /// Fragment tolerance in ppm
    pub ms2_ppm: f64,
    /// Number of candidates reported
    pub top_n: usize,
}

impl Default for FormulaParams {
    fn default() -> Self {
        Self {
            ms1_ppm: 5.0,
            ms2_ppm: 10.0,
            top_n: 5,
        }
    }
}

/// Input to a decomposer
#[derive(Debug, Clone, Copy)]
pub struct DecompositionRequest<'a> {
    /// Feature key
    pub feature_id: &'a str,
    /// Observed precursor m/z
    pub precursor_mz: f64,
    /// Resolved adduct
    pub adduct: &'static Adduct,
    /// Neutral mass implied by precursor and adduct
    pub neutral_mass: f64,
    /// MS2 spectrum
    pub spectrum: &'a Spectrum,
    /// Precursor tolerance in ppm
    pub ms1_ppm: f64,
    /// Fragment tolerance in ppm
    pub ms2_ppm: f64,
}

/// A neutral formula proposed by a decomposer
#[derive(Debug, Clone, PartialEq)]
pub struct FormulaCandidate {
    /// Neutral formula
    pub formula: Formula,
    /// Decomposer score, higher is better
    pub score: f64,
    /// Precursor error in ppm, if known
    pub mass_error_ppm: Option<f64>,
}

/// Mass-decomposition capability
pub trait FormulaDecomposer: Send + Sync {
    /// Ranked candidate formulas for one feature
    fn decompose(
        &self,
        request: &DecompositionRequest<'_>,
    ) -> Result<Vec<FormulaCandidate>, DecomposerError>;
}

/// Formula result of one feature
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormulaAnnotation {
    /// Feature key
    pub feature_id: String,
    /// Best formula after re-ranking
    pub predicted_formula: Option<String>,
    /// Top candidates, best first
    pub candidates: Vec<RankedFormula>,
}

/// Runs decomposition and re-ranking for features
#[derive(Clone, Copy)]
pub struct FormulaResolver<'a> {
    decomposer: &'a dyn FormulaDecomposer,
    params: FormulaParams,
    retry: RetryPolicy,
}

impl<'a> FormulaResolver<'a> {
    /// Create a resolver
    pub fn new(decomposer: &'a dyn FormulaDecomposer, params: FormulaParams, retry: RetryPolicy) -> Self {
        Self {
            decomposer,
            params,
            retry,
        }
    }

    /// Decompose `feature` and re-rank under `constraint`
    pub fn resolve(
        &self,
        feature: &Feature,
        constraint: CompositionConstraint,
    ) -> Result<FormulaAnnotation, DecomposerError> {
        let adduct = Adduct::lookup_for_mode(&feature.adduct, feature.ion_mode).ok_or_else(|| {
            DecomposerError::InvalidInput(format!(
                "unknown adduct '{}' for {} mode",
                feature.adduct, feature.ion_mode
            ))
        })?;
        let request = DecompositionRequest {
            feature_id: &feature.id,
            precursor_mz: feature.precursor_mz,
            adduct,
            neutral_mass: adduct.neutral_mass(feature.precursor_mz),
            spectrum: &feature.spectrum,
            ms1_ppm: self.params.ms1_ppm,
            ms2_ppm: self.params.ms2_ppm,
        };

        let candidates = self.retry.run(
            "formula decomposition",
            || self.decomposer.decompose(&request),
            DecomposerError::is_transient,
        )?;
        let candidates = rerank(candidates, constraint, self.params.top_n);

        Ok(FormulaAnnotation {
            feature_id: feature.id.clone(),
            predicted_formula: candidates.first().map(|c| c.formula.clone()),
            candidates,
        })
    }
}
