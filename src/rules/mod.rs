//! # Diagnostic Rules
//!
//! The rule stage of class resolution is data, not code: a [`RuleTable`] is a
//! list of per-class signatures loaded from TOML and evaluated by one generic
//! function. A bundled table ([`RuleTable::builtin`]) covers the common
//! glycerophospholipid, sphingolipid and sterol headgroup fragments; a custom
//! table can be supplied to replace it.
//!
//! ```toml
//! [[rule]]
//! class = "PE"
//! ion_mode = "positive"
//! adducts = ["[M+H]+"]
//! neutral_losses = [141.0191]
//! forbidden_fragments = [184.0733]
//! ```
//!
//! Every rule yields two independent verdicts. The mass signature holds when
//! the ion mode and adduct match, the neutral mass is explained by the class
//! backbone plus some chain composition within `ms1_tol` ppm, and every
//! neutral loss is observed. The fragment signature holds when all required
//! fragments are present and no forbidden fragment is, within `ms2_tol` ppm.
//! A rule with neither required nor forbidden fragments has no fragment
//! signature.

mod error;


use std::collections::BTreeSet;
use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::chain::mass_balance::{is_mass_consistent, ChainParams};
use crate::chemistry::{nominal_mz, Adduct, LipidClass};
use crate::feature::{Feature, IonMode};

pub use error::RuleTableError;

const BUILTIN_RULES: &str = include_str!("../../data/default_rules.toml");

/// Tolerances and switches of the rule stage
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleParams {
    /// Precursor mass tolerance in ppm
    pub ms1_tol: f64,
    /// Fragment tolerance in ppm
    pub ms2_tol: f64,
    /// Skip the rule stage entirely
    pub no_rules: bool,
    /// Confidence reported for rule-based decisions
    pub confidence: f64,
}

impl Default for RuleParams {
    fn default() -> Self {
        Self {
            ms1_tol: 10.0,
            ms2_tol: 20.0,
            no_rules: false,
            confidence: 0.99,
        }
    }
}

/// One class signature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassRule {
    /// Class name from the class table
    pub class: String,
    /// Polarity the signature applies to
    pub ion_mode: IonMode,
    /// Accepted adducts; empty means any adduct of the ion mode
    #[serde(default)]
    pub adducts: Vec<String>,
    /// Neutral losses from the precursor that must be observed, in Da
    #[serde(default)]
    pub neutral_losses: Vec<f64>,
    /// Fragment m/z that must be present
    #[serde(default)]
    pub required_fragments: Vec<f64>,
    /// Fragment m/z that must be absent
    #[serde(default)]
    pub forbidden_fragments: Vec<f64>,
}

impl ClassRule {
    fn has_fragment_signature(&self) -> bool {
        !self.required_fragments.is_empty() || !self.forbidden_fragments.is_empty()
    }

    fn accepts_adduct(&self, adduct: &Adduct) -> bool {
        self.adducts.is_empty()
            || self
                .adducts
                .iter()
                .filter_map(|a| Adduct::lookup(a))
                .any(|a| a.name == adduct.name)
    }
}

/// Candidate classes produced by the rule stage for one feature
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleEvaluation {
    /// Classes whose mass signature holds
    pub mass_based: BTreeSet<&'static str>,
    /// Classes whose fragment signature holds
    pub fragment_based: BTreeSet<&'static str>,
}

impl RuleEvaluation {
    /// The class both signature sets agree on, when there is exactly one
    pub fn decision(&self) -> Option<&'static LipidClass> {
        let mut common = self.mass_based.intersection(&self.fragment_based);
        match (common.next(), common.next()) {
            (Some(name), None) => LipidClass::lookup(name),
            _ => None,
        }
    }
}

/// Declarative rule table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleTable {
    #[serde(rename = "rule", default)]
    rules: Vec<ClassRule>,
}

impl RuleTable {
    /// Bundled default rules
    pub fn builtin() -> Result<Self, RuleTableError> {
        Self::from_str(BUILTIN_RULES)
    }

    /// Load rules from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, RuleTableError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Parse and validate rules from a TOML string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, RuleTableError> {
        let table: RuleTable = toml::from_str(content)?;
        table.validate()?;
        Ok(table)
    }

    /// Build a table from rules already in memory
    pub fn from_rules(rules: Vec<ClassRule>) -> Result<Self, RuleTableError> {
        let table = Self { rules };
        table.validate()?;
        Ok(table)
    }

    fn validate(&self) -> Result<(), RuleTableError> {
        for (index, rule) in self.rules.iter().enumerate() {
            let invalid = |message: String| RuleTableError::InvalidRule {
                index,
                class: rule.class.clone(),
                message,
            };
            if LipidClass::lookup(&rule.class).is_none() {
                return Err(invalid("unknown lipid class".into()));
            }
            for token in &rule.adducts {
                match Adduct::lookup(token) {
                    None => return Err(invalid(format!("unknown adduct '{token}'"))),
                    Some(a) if a.ion_mode() != rule.ion_mode => {
                        return Err(invalid(format!(
                            "adduct '{token}' does not match ion mode {}",
                            rule.ion_mode
                        )))
                    }
                    Some(_) => {}
                }
            }
            if let Some(mass) = rule
                .neutral_losses
                .iter()
                .chain(&rule.required_fragments)
                .chain(&rule.forbidden_fragments)
                .find(|m| !m.is_finite() || **m <= 0.0)
            {
                return Err(invalid(format!("masses must be positive, got {mass}")));
            }
        }
        Ok(())
    }

    /// Rules in table order
    pub fn rules(&self) -> &[ClassRule] {
        &self.rules
    }

    /// Number of rules
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// True for a table without rules
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Evaluate every rule against `feature` with the adduct already resolved.
    pub fn evaluate(
        &self,
        feature: &Feature,
        adduct: &Adduct,
        params: &RuleParams,
        chains: &ChainParams,
    ) -> RuleEvaluation {
        let mut evaluation = RuleEvaluation::default();
        let neutral_mass = adduct.neutral_mass(feature.precursor_mz);
        let mass_params = ChainParams {
            mass_tol_ppm: params.ms1_tol,
            even_carbons_only: false,
            ..*chains
        };
        let observed = |mz: f64| {
            feature.spectrum.contains_mz(mz, params.ms2_tol)
                || feature.fragments.is_present(nominal_mz(mz))
        };

        for rule in &self.rules {
            let Some(class) = LipidClass::lookup(&rule.class) else {
                continue;
            };
            if rule.ion_mode != feature.ion_mode {
                continue;
            }

            if rule.has_fragment_signature()
                && rule.required_fragments.iter().all(|&mz| observed(mz))
                && !rule.forbidden_fragments.iter().any(|&mz| observed(mz))
            {
                evaluation.fragment_based.insert(class.name);
            }

            if rule.accepts_adduct(adduct)
                && rule
                    .neutral_losses
                    .iter()
                    .all(|&loss| observed(feature.precursor_mz - loss))
                && is_mass_consistent(neutral_mass, class, &mass_params)
            {
                evaluation.mass_based.insert(class.name);
            }
        }

        debug!(
            "Rules for feature {}: mass {:?}, fragments {:?}",
            feature.id, evaluation.mass_based, evaluation.fragment_based
        );
        evaluation
    }
}
