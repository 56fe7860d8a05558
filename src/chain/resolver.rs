use std::collections::HashSet;

use log::debug;

use super::mass_balance::{solve_single_chain, ChainParams};
use super::{ChainComposition, RankedComposition, CHAIN_RANKS};
use crate::chemistry::{ppm_diff, LipidClass};
use crate::feature::{FragmentVector, IonMode, Spectrum};
use crate::model::{ChainRanker, ModelError};

/// Inputs for chain inference of one feature
#[derive(Debug, Clone, Copy)]
pub struct ChainQuery<'a> {
    /// Resolved lipid class
    pub class: &'static LipidClass,
    /// Neutral mass implied by precursor m/z and adduct
    pub neutral_mass: f64,
    /// Observed precursor m/z
    pub precursor_mz: f64,
    /// Ion mode
    pub ion_mode: IonMode,
    /// Fragment-presence vector
    pub fragments: &'a FragmentVector,
    /// MS2 spectrum
    pub spectrum: &'a Spectrum,
}

/// Resolves ranked chain compositions for a classified feature
#[derive(Clone, Copy)]
pub struct ChainResolver<'a> {
    ranker: &'a dyn ChainRanker,
    params: ChainParams,
}

impl<'a> ChainResolver<'a> {
    /// Create a resolver around a multi-chain ranking model
    pub fn new(ranker: &'a dyn ChainRanker, params: ChainParams) -> Self {
        Self { ranker, params }
    }

    /// Up to [`CHAIN_RANKS`] canonical candidates, best first.
    ///
    /// Single-chain classes are solved by mass balance with confidence 1.0.
    /// Ranker candidates with the wrong number of slots or an inconsistent mass
    /// are discarded.
    pub fn resolve(&self, query: &ChainQuery<'_>) -> Result<Vec<RankedComposition>, ModelError> {
        let class = query.class;
        if class.num_chain == 1 {
            return Ok(solve_single_chain(query.neutral_mass, class, &self.params)
                .map(|(chain, _)| RankedComposition {
                    composition: ChainComposition::new(vec![chain]),
                    confidence: Some(1.0),
                })
                .into_iter()
                .collect());
        }

        let candidates = self.ranker.rank(query, &self.params, CHAIN_RANKS)?;
        let mut seen = HashSet::new();
        let mut ranked = Vec::with_capacity(CHAIN_RANKS);
        for candidate in candidates {
            let composition = candidate.composition.canonical();
            if composition.num_chain() != class.num_chain {
                debug!(
                    "Dropping {} candidate {}: expected {} chains",
                    class.name, composition, class.num_chain
                );
                continue;
            }
            let residual = ppm_diff(query.neutral_mass, composition.neutral_mass(class));
            if residual.abs() > self.params.mass_tol_ppm {
                debug!(
                    "Dropping {} candidate {}: mass residual {:.2} ppm",
                    class.name, composition, residual
                );
                continue;
            }
            if !seen.insert(composition.clone()) {
                continue;
            }
            ranked.push(RankedComposition {
                composition,
                confidence: candidate.confidence.map(|c| c.clamp(0.0, 1.0)),
            });
            if ranked.len() == CHAIN_RANKS {
                break;
            }
        }
        Ok(ranked)
    }
}
