//! # Class Resolution
//!
//! Two stages, tried in order:
//!
//! 1. **Rules**: the [`RuleTable`] is evaluated; a single class agreed on by
//!    the mass and fragment signatures is accepted with a fixed confidence.
//! 2. **Model**: otherwise (or always, with `no_rules`) the class predictor is
//!    asked for a label and confidence.
//!
//! The outcome is an explicit [`Resolution`]. Unknown adducts and unknown class
//! labels end in [`Resolution::Invalid`] with every downstream field missing;
//! they are not errors of the batch.


use std::fmt;

use log::debug;
use serde::Serialize;

use crate::annotate::AnnotationError;
use crate::chain::ChainParams;
use crate::chemistry::{Adduct, Category, LipidClass};
use crate::feature::Feature;
use crate::model::{ClassPredictor, ModelError, ModelInput};
use crate::rules::{RuleParams, RuleTable};

/// Where a class decision came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DecisionSource {
    /// Decided by the rule table
    RuleBased,
    /// Decided by the class model
    ModelBased,
    /// Adduct or class could not be resolved
    Invalid,
}

impl DecisionSource {
    /// Label used in tables
    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionSource::RuleBased => "rule-based",
            DecisionSource::ModelBased => "model-based",
            DecisionSource::Invalid => "invalid",
        }
    }
}

impl fmt::Display for DecisionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resolved class with its confidence
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassDecision {
    /// Entry of the class table
    pub class: &'static LipidClass,
    /// Confidence in [0, 1], missing for uncalibrated models
    pub confidence: Option<f64>,
}

impl ClassDecision {
    /// Category from the class table
    pub fn category(&self) -> Category {
        self.class.category
    }

    /// Chain count from the class table
    pub fn num_chain(&self) -> usize {
        self.class.num_chain
    }
}

/// Outcome of class resolution for one feature
#[derive(Debug)]
pub enum Resolution {
    /// Singleton rule decision
    RuleBased(ClassDecision),
    /// Model decision
    ModelBased(ClassDecision),
    /// Adduct or class unresolved; downstream fields stay missing
    Invalid(AnnotationError),
}

impl Resolution {
    /// The decision, unless invalid
    pub fn decision(&self) -> Option<&ClassDecision> {
        match self {
            Resolution::RuleBased(d) | Resolution::ModelBased(d) => Some(d),
            Resolution::Invalid(_) => None,
        }
    }

    /// Tag of the outcome
    pub fn source(&self) -> DecisionSource {
        match self {
            Resolution::RuleBased(_) => DecisionSource::RuleBased,
            Resolution::ModelBased(_) => DecisionSource::ModelBased,
            Resolution::Invalid(_) => DecisionSource::Invalid,
        }
    }
}

/// Composes the rule table and the class predictor
#[derive(Clone, Copy)]
pub struct ClassResolver<'a> {
    rules: &'a RuleTable,
    model: &'a dyn ClassPredictor,
    params: RuleParams,
    chains: ChainParams,
}

impl<'a> ClassResolver<'a> {
    /// Create a resolver
    pub fn new(
        rules: &'a RuleTable,
        model: &'a dyn ClassPredictor,
        params: RuleParams,
        chains: ChainParams,
    ) -> Self {
        Self {
            rules,
            model,
            params,
            chains,
        }
    }

    /// Resolve the class of `feature` given its resolved adduct token.
    ///
    /// Only a failing model is an error; unknown adducts and labels are
    /// reported as [`Resolution::Invalid`].
    pub fn resolve(&self, feature: &Feature, adduct: &str) -> Result<Resolution, ModelError> {
        let Some(adduct) = Adduct::lookup_for_mode(adduct, feature.ion_mode) else {
            return Ok(Resolution::Invalid(AnnotationError::UnknownAdduct {
                adduct: adduct.to_string(),
                ion_mode: feature.ion_mode,
            }));
        };

        if !self.params.no_rules {
            let evaluation = self
                .rules
                .evaluate(feature, adduct, &self.params, &self.chains);
            if let Some(class) = evaluation.decision() {
                debug!("Feature {}: rule-based {}", feature.id, class.name);
                return Ok(Resolution::RuleBased(ClassDecision {
                    class,
                    confidence: Some(self.params.confidence),
                }));
            }
        }

        let prediction = self
            .model
            .predict_class(&ModelInput::for_class(feature, adduct.name))?;
        match LipidClass::lookup(&prediction.label) {
            Some(class) => {
                debug!("Feature {}: model-based {}", feature.id, class.name);
                Ok(Resolution::ModelBased(ClassDecision {
                    class,
                    confidence: prediction.confidence.map(|c| c.clamp(0.0, 1.0)),
                }))
            }
            None => Ok(Resolution::Invalid(AnnotationError::UnknownClass(
                prediction.label,
            ))),
        }
    }
}
