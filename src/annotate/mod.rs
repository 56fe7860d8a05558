//! # Aggregation and Naming
//!
//! Turns the outputs of the cascade into final [`AnnotationRecord`]s:
//!
//! - `pred_confidence` is the mean of whichever adduct, class and rank-1
//!   chain confidences are present; missing ones are left out, not zeroed
//! - names are `"{class} {chains}"` from the top-ranked canonical composition
//!   with absent `0:0` slots omitted
//! - database matches keep the reference name and report their spectral
//!   similarity as confidence
//!
//! Records carry no intermediate columns (fragment vectors, raw stage output).

mod error;


use serde::Serialize;

use crate::chain::{ChainComposition, RankedComposition, CHAIN_RANKS};
use crate::chemistry::{Category, LipidClass};
use crate::classify::Resolution;
use crate::feature::{Feature, IonMode};
use crate::search::MatchedFeature;

pub use error::AnnotationError;

/// Adduct used for a feature, predicted or taken from the input
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdductAssignment {
    /// Adduct token
    pub adduct: String,
    /// Predictor confidence; missing when the input adduct was kept
    pub confidence: Option<f64>,
}

impl AdductAssignment {
    /// Keep the feature's own adduct token
    pub fn from_input(feature: &Feature) -> Self {
        Self {
            adduct: feature.adduct.trim().to_string(),
            confidence: None,
        }
    }
}

/// Final annotation of one feature
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnotationRecord {
    /// Feature identifier
    pub feature_id: String,
    /// Lipid name, e.g. `PC 16:0_18:1`
    pub name: Option<String>,
    /// Observed precursor m/z
    pub precursor_mz: f64,
    /// Ion mode
    pub ion_mode: IonMode,
    /// Adduct token
    pub adduct: Option<String>,
    /// Class abbreviation
    pub class: Option<String>,
    /// Class category
    pub category: Option<Category>,
    /// Chain slots of the class
    pub num_chain: Option<usize>,
    /// Merged confidence
    pub pred_confidence: Option<f64>,
    /// Up to three ranked chain compositions, best first
    pub chains: Vec<RankedComposition>,
}

impl AnnotationRecord {
    /// Composition at rank 1..=3
    pub fn chain_rank(&self, rank: usize) -> Option<&RankedComposition> {
        rank.checked_sub(1).and_then(|i| self.chains.get(i))
    }
}

/// Mean of the present values; `None` when none are present
pub fn merge_confidence(values: &[Option<f64>]) -> Option<f64> {
    let present: Vec<f64> = values.iter().flatten().copied().collect();
    if present.is_empty() {
        return None;
    }
    Some(present.iter().sum::<f64>() / present.len() as f64)
}

/// `"{class} {C1}:{DB1}_{C2}:{DB2}"`; the bare class when no chain is present
pub fn lipid_name(class: &str, composition: Option<&ChainComposition>) -> String {
    match composition.map(ChainComposition::notation) {
        Some(chains) if !chains.is_empty() => format!("{class} {chains}"),
        _ => class.to_string(),
    }
}

/// Record for a database match
pub fn matched_record(matched: &MatchedFeature) -> AnnotationRecord {
    let class = LipidClass::lookup(&matched.class);
    AnnotationRecord {
        feature_id: matched.feature_id.clone(),
        name: Some(matched.name.clone()),
        precursor_mz: matched.precursor_mz,
        ion_mode: matched.ion_mode,
        adduct: Some(matched.adduct.clone()),
        class: Some(matched.class.clone()),
        category: matched
            .category
            .parse::<Category>()
            .ok()
            .or(class.map(|c| c.category)),
        num_chain: class.map(|c| c.num_chain),
        pred_confidence: Some(matched.similarity.clamp(0.0, 1.0)),
        chains: Vec::new(),
    }
}

/// Record for a feature annotated by prediction
pub fn predicted_record(
    feature: &Feature,
    adduct: &AdductAssignment,
    resolution: &Resolution,
    chains: Vec<RankedComposition>,
) -> AnnotationRecord {
    let Some(decision) = resolution.decision() else {
        return AnnotationRecord {
            feature_id: feature.id.clone(),
            name: None,
            precursor_mz: feature.precursor_mz,
            ion_mode: feature.ion_mode,
            adduct: Some(adduct.adduct.clone()),
            class: None,
            category: None,
            num_chain: None,
            pred_confidence: merge_confidence(&[adduct.confidence]),
            chains: Vec::new(),
        };
    };

    let chains: Vec<RankedComposition> = chains
        .into_iter()
        .take(CHAIN_RANKS)
        .map(|ranked| RankedComposition {
            composition: ranked.composition.canonical(),
            confidence: ranked.confidence,
        })
        .collect();

    let top = chains.first();
    let name = lipid_name(decision.class.name, top.map(|r| &r.composition));
    let pred_confidence = merge_confidence(&[
        adduct.confidence,
        decision.confidence,
        top.and_then(|r| r.confidence),
    ]);

    AnnotationRecord {
        feature_id: feature.id.clone(),
        name: Some(name),
        precursor_mz: feature.precursor_mz,
        ion_mode: feature.ion_mode,
        adduct: Some(adduct.adduct.clone()),
        class: Some(decision.class.name.to_string()),
        category: Some(decision.category()),
        num_chain: Some(decision.num_chain()),
        pred_confidence,
        chains,
    }
}
