//! # Database Search
//!
//! Separates features into library matches and unmatched ("dark") features.
//!
//! For each feature the candidates are the reference entries whose theoretical
//! precursor m/z for the feature's adduct is within the MS1 tolerance. Each
//! candidate is scored with [`crate::similarity::similarity`]; the best-scoring
//! candidate is accepted when its score reaches the MS2 threshold, ties going to
//! the smaller absolute mass error. No candidate, or a best score below the
//! threshold, is an ordinary unmatched outcome, not an error.

mod tolerance;


use serde::{Deserialize, Serialize};

use crate::chemistry::{ppm_diff, Adduct};
use crate::feature::{Feature, IonMode};
use crate::reference::{ReferenceStore, ReferenceStoreError};
use crate::similarity::{similarity, SimilarityMethod};

pub use tolerance::Ms1Tolerance;

/// Parameters of the database search stage
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchParams {
    /// Precursor tolerance
    pub ms1_tolerance: Ms1Tolerance,
    /// Fragment peak-matching tolerance in Da
    pub ms2_tolerance: f64,
    /// Similarity algorithm
    pub method: SimilarityMethod,
    /// Minimum similarity for acceptance, in [0, 1]
    pub ms2_threshold: f64,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            ms1_tolerance: Ms1Tolerance::Da(0.005),
            ms2_tolerance: 0.02,
            method: SimilarityMethod::default(),
            ms2_threshold: 0.7,
        }
    }
}

/// Score of one feature against its best candidate
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResult {
    /// Feature key
    pub feature_id: String,
    /// Store identifier of the reference
    pub reference_id: usize,
    /// Signed precursor error against the theoretical m/z
    pub mass_diff_ppm: f64,
    /// MS2 similarity
    pub similarity: f64,
    /// Whether the similarity reached the threshold
    pub accepted: bool,
}

/// A feature annotated from the library
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchedFeature {
    /// Feature key
    pub feature_id: String,
    /// Observed precursor m/z
    pub precursor_mz: f64,
    /// Ion mode
    pub ion_mode: IonMode,
    /// Adduct used for the lookup
    pub adduct: String,
    /// Reference compound name
    pub name: String,
    /// Reference formula
    pub formula: String,
    /// Reference class label
    pub class: String,
    /// Reference category label
    pub category: String,
    /// Store identifier of the reference
    pub reference_id: usize,
    /// Signed precursor error in ppm
    pub mass_diff_ppm: f64,
    /// MS2 similarity
    pub similarity: f64,
}

/// A feature without an accepted library match
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnmatchedFeature {
    /// Feature key
    pub feature_id: String,
    /// Observed precursor m/z
    pub precursor_mz: f64,
    /// Ion mode
    pub ion_mode: IonMode,
    /// Adduct used for the lookup
    pub adduct: String,
    /// Candidates inside the MS1 window
    pub candidates: usize,
    /// Best similarity among candidates, if any
    pub best_similarity: Option<f64>,
}

/// Outcome of searching one feature
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    /// Accepted library match
    Matched(MatchedFeature),
    /// No accepted match
    Unmatched(UnmatchedFeature),
}

/// The database search engine
#[derive(Debug, Clone, Copy, Default)]
pub struct DatabaseSearch {
    params: SearchParams,
}

impl DatabaseSearch {
    /// Create a search engine with the given parameters
    pub fn new(params: SearchParams) -> Self {
        Self { params }
    }

    /// Search parameters
    pub fn params(&self) -> &SearchParams {
        &self.params
    }

    /// Best-scoring candidate for `feature` and the number of candidates.
    pub fn best_match(
        &self,
        store: &dyn ReferenceStore,
        feature: &Feature,
    ) -> Result<(Option<MatchResult>, usize), ReferenceStoreError> {
        let adduct = lookup_token(&feature.adduct);
        let (lower, upper) = self.params.ms1_tolerance.window(feature.precursor_mz);
        let hits = store.query(adduct, lower, upper)?;

        let mut best: Option<MatchResult> = None;
        let mut candidates = 0;
        for hit in hits {
            if !self
                .params
                .ms1_tolerance
                .accepts(feature.precursor_mz, hit.theoretical_mz)
            {
                continue;
            }
            candidates += 1;
            let score = similarity(
                &feature.spectrum,
                &hit.entry.spectrum,
                self.params.ms2_tolerance,
                self.params.method,
            );
            let mass_diff_ppm = ppm_diff(feature.precursor_mz, hit.theoretical_mz);
            let better = match &best {
                None => true,
                Some(current) => {
                    score > current.similarity
                        || (score == current.similarity
                            && mass_diff_ppm.abs() < current.mass_diff_ppm.abs())
                }
            };
            if better {
                best = Some(MatchResult {
                    feature_id: feature.id.clone(),
                    reference_id: hit.reference_id,
                    mass_diff_ppm,
                    similarity: score,
                    accepted: score >= self.params.ms2_threshold,
                });
            }
        }

        Ok((best, candidates))
    }

    /// Search one feature and split into matched / unmatched
    pub fn search_feature(
        &self,
        store: &dyn ReferenceStore,
        feature: &Feature,
    ) -> Result<SearchOutcome, ReferenceStoreError> {
        let (best, candidates) = self.best_match(store, feature)?;
        let adduct = lookup_token(&feature.adduct).to_string();

        if let Some(result) = best.as_ref().filter(|r| r.accepted) {
            if let Some(entry) = store.get(result.reference_id) {
                return Ok(SearchOutcome::Matched(MatchedFeature {
                    feature_id: feature.id.clone(),
                    precursor_mz: feature.precursor_mz,
                    ion_mode: feature.ion_mode,
                    adduct,
                    name: entry.name.clone(),
                    formula: entry.formula.clone(),
                    class: entry.class.clone(),
                    category: entry.category.clone(),
                    reference_id: result.reference_id,
                    mass_diff_ppm: result.mass_diff_ppm,
                    similarity: result.similarity,
                }));
            }
        }

        Ok(SearchOutcome::Unmatched(UnmatchedFeature {
            feature_id: feature.id.clone(),
            precursor_mz: feature.precursor_mz,
            ion_mode: feature.ion_mode,
            adduct,
            candidates,
            best_similarity: best.map(|r| r.similarity),
        }))
    }
}

fn lookup_token(adduct: &str) -> &str {
    Adduct::lookup(adduct).map_or(adduct.trim(), |a| a.name)
}
