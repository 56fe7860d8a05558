//! # Chain Composition
//!
//! Fatty-acyl chain assignments for a resolved lipid class.
//!
//! A [`ChainComposition`] holds exactly `num_chain` `(carbons, double_bonds)`
//! pairs. Its canonical order is descending carbon count, ties broken by
//! descending double-bond count; a `0:0` chain marks an absent slot that is
//! left out of names but still counts towards `num_chain`. Names render the
//! canonical order reversed (`PC 16:0_18:1`).
//!
//! Single-chain classes are solved algebraically by [`mass_balance`]; classes
//! with two or more chains go through a [`crate::model::ChainRanker`] whose
//! candidates are checked against the same mass balance before being reported.

pub mod mass_balance;
mod resolver;

#[cfg(test)]
mod tests;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::chemistry::{chain_increment, LipidClass};

pub use mass_balance::{
    ChainParams, TotalComposition, MAX_CHAIN_CARBONS, MAX_CHAIN_DOUBLE_BONDS,
};
pub use resolver::{ChainQuery, ChainResolver};

/// Number of ranked chain candidates reported per feature
pub const CHAIN_RANKS: usize = 3;

/// One acyl chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Chain {
    /// Carbon count
    pub carbons: u32,
    /// Double-bond count
    pub double_bonds: u32,
}

impl Chain {
    /// The absent-slot marker `0:0`
    pub const ABSENT: Chain = Chain { carbons: 0, double_bonds: 0 };

    /// Create a chain
    pub const fn new(carbons: u32, double_bonds: u32) -> Self {
        Self { carbons, double_bonds }
    }

    /// True for the `0:0` absent-slot marker
    pub fn is_absent(&self) -> bool {
        *self == Chain::ABSENT
    }

    /// Mass this chain adds to the class backbone
    pub fn mass(&self) -> f64 {
        chain_increment(self.carbons, self.double_bonds)
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.carbons, self.double_bonds)
    }
}

impl FromStr for Chain {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (c, db) = s
            .trim()
            .split_once(':')
            .ok_or_else(|| format!("chain must be C:DB, got '{s}'"))?;
        let carbons = c.trim().parse().map_err(|_| format!("invalid carbon count in '{s}'"))?;
        let double_bonds = db
            .trim()
            .parse()
            .map_err(|_| format!("invalid double-bond count in '{s}'"))?;
        Ok(Chain::new(carbons, double_bonds))
    }
}

/// Ordered chain assignment of one lipid
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChainComposition {
    chains: Vec<Chain>,
}

impl ChainComposition {
    /// Wrap chains as given (not canonicalized)
    pub fn new(chains: Vec<Chain>) -> Self {
        Self { chains }
    }

    /// Chains in their current order
    pub fn chains(&self) -> &[Chain] {
        &self.chains
    }

    /// Number of chain slots, absent slots included
    pub fn num_chain(&self) -> usize {
        self.chains.len()
    }

    /// Sort into canonical order (descending carbons, then double bonds)
    pub fn canonicalize(&mut self) {
        self.chains.sort_by(|a, b| b.cmp(a));
    }

    /// Canonicalized copy
    pub fn canonical(mut self) -> Self {
        self.canonicalize();
        self
    }

    /// True when already in canonical order
    pub fn is_canonical(&self) -> bool {
        self.chains.windows(2).all(|w| w[0] >= w[1])
    }

    /// Summed carbon and double-bond counts over present chains
    pub fn totals(&self) -> Chain {
        self.chains.iter().fold(Chain::ABSENT, |acc, c| {
            Chain::new(acc.carbons + c.carbons, acc.double_bonds + c.double_bonds)
        })
    }

    /// Mass added by all chains
    pub fn chain_mass(&self) -> f64 {
        self.chains.iter().map(Chain::mass).sum()
    }

    /// Neutral mass of `class` with these chains
    pub fn neutral_mass(&self, class: &LipidClass) -> f64 {
        class.backbone_mass() + self.chain_mass()
    }

    /// `C:DB_C:DB` notation with absent slots omitted.
    ///
    /// Names list chains from the shortest up, i.e. the canonical order read
    /// backwards, so `[18:1, 16:0]` is written `16:0_18:1`.
    pub fn notation(&self) -> String {
        self.chains
            .iter()
            .rev()
            .filter(|c| !c.is_absent())
            .map(Chain::to_string)
            .collect::<Vec<_>>()
            .join("_")
    }
}

impl fmt::Display for ChainComposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.notation())
    }
}

/// A chain composition candidate with its confidence
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedComposition {
    /// Canonical composition
    pub composition: ChainComposition,
    /// Confidence in [0, 1], missing when the producer has none
    pub confidence: Option<f64>,
}
