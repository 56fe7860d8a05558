use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::Deserialize;

use super::{ChainRanker, ModelError};
use crate::chain::mass_balance::{distribute, solve_totals};
use crate::chain::{Chain, ChainComposition, ChainParams, ChainQuery, RankedComposition};
use crate::chemistry::{nominal_mz, PROTON_MASS, WATER_MASS};
use crate::feature::IonMode;

/// Fragment tolerance for acyl evidence lookups in the MS2 spectrum
const EVIDENCE_TOL_PPM: f64 = 20.0;

/// Upper bound on enumerated distributions per feature
const MAX_CANDIDATES: usize = 20_000;

const BUILTIN_PRIORS: &[(u32, u32, f64)] = &[
    (14, 0, 0.3),
    (16, 0, 1.0),
    (16, 1, 0.4),
    (18, 0, 0.8),
    (18, 1, 1.0),
    (18, 2, 0.8),
    (18, 3, 0.3),
    (20, 3, 0.2),
    (20, 4, 0.6),
    (20, 5, 0.2),
    (22, 4, 0.1),
    (22, 5, 0.2),
    (22, 6, 0.5),
    (24, 0, 0.1),
    (24, 1, 0.2),
];

#[derive(Debug, Deserialize)]
struct RankerArtifact {
    #[serde(default = "default_evidence_weight")]
    evidence_weight: f64,
    #[serde(default)]
    priors: HashMap<String, f64>,
}

fn default_evidence_weight() -> f64 {
    2.0
}

/// Chain ranking model: enumerates chain distributions consistent with the
/// mass balance and scores each chain by acyl fragment evidence plus a prior.
///
/// Evidence per chain is the presence of its fatty-acid carboxylate anion in
/// negative mode, or of the precursor after losing the free acid or ketene in
/// positive mode. Composition scores are sums over chains; confidences are the
/// softmax over all enumerated compositions.
#[derive(Debug, Clone)]
pub struct EvidenceChainRanker {
    evidence_weight: f64,
    priors: HashMap<Chain, f64>,
}

impl Default for EvidenceChainRanker {
    fn default() -> Self {
        Self {
            evidence_weight: default_evidence_weight(),
            priors: BUILTIN_PRIORS
                .iter()
                .map(|&(c, db, w)| (Chain::new(c, db), w))
                .collect(),
        }
    }
}

impl EvidenceChainRanker {
    /// Load priors from JSON: `{"evidence_weight": 2.0, "priors": {"16:0": 1.0}}`
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ModelError> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| ModelError::Artifact(format!("{}: {e}", path.display())))?;
        let artifact: RankerArtifact = serde_json::from_reader(BufReader::new(file))?;
        Self::from_artifact(artifact)
    }

    /// Parse from a JSON string
    pub fn from_json(json: &str) -> Result<Self, ModelError> {
        Self::from_artifact(serde_json::from_str(json)?)
    }

    fn from_artifact(artifact: RankerArtifact) -> Result<Self, ModelError> {
        if !artifact.evidence_weight.is_finite() {
            return Err(ModelError::Artifact("evidence_weight must be finite".into()));
        }
        let mut priors = HashMap::new();
        for (key, weight) in artifact.priors {
            let chain: Chain = key.parse().map_err(ModelError::Artifact)?;
            if !weight.is_finite() {
                return Err(ModelError::Artifact(format!("prior for {key} is not finite")));
            }
            priors.insert(chain, weight);
        }
        Ok(Self {
            evidence_weight: artifact.evidence_weight,
            priors,
        })
    }

    fn chain_score(&self, chain: Chain, query: &ChainQuery<'_>) -> f64 {
        if chain.is_absent() {
            return 0.0;
        }
        let prior = self.priors.get(&chain).copied().unwrap_or(0.0);
        let observed = |mz: f64| {
            mz > 0.0
                && (query.fragments.is_present(nominal_mz(mz))
                    || query.spectrum.contains_mz(mz, EVIDENCE_TOL_PPM))
        };
        let fatty_acid = chain.mass() + WATER_MASS;
        let evidence = match query.ion_mode {
            IonMode::Negative => observed(fatty_acid - PROTON_MASS),
            IonMode::Positive => {
                observed(query.precursor_mz - fatty_acid) || observed(query.precursor_mz - chain.mass())
            }
        };
        prior + if evidence { self.evidence_weight } else { 0.0 }
    }
}

impl ChainRanker for EvidenceChainRanker {
    fn rank(
        &self,
        query: &ChainQuery<'_>,
        params: &ChainParams,
        limit: usize,
    ) -> Result<Vec<RankedComposition>, ModelError> {
        let class = query.class;
        let Some(totals) = solve_totals(query.neutral_mass, class, class.num_chain as u32, params)
        else {
            return Ok(Vec::new());
        };

        let mut candidates = distribute(
            &totals,
            class.num_chain,
            params,
            params.even_carbons_only,
            MAX_CANDIDATES,
        );
        if candidates.is_empty() && params.even_carbons_only {
            candidates = distribute(&totals, class.num_chain, params, false, MAX_CANDIDATES);
        }
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let mut scored: Vec<(f64, ChainComposition)> = candidates
            .into_iter()
            .map(|chains| {
                let score = chains.iter().map(|&c| self.chain_score(c, query)).sum();
                (score, ChainComposition::new(chains).canonical())
            })
            .collect();

        let max = scored.iter().map(|(s, _)| *s).fold(f64::NEG_INFINITY, f64::max);
        let total: f64 = scored.iter().map(|(s, _)| (s - max).exp()).sum();
        scored.sort_by(|a, b| b.0.total_cmp(&a.0).then_with(|| b.1.chains().cmp(a.1.chains())));

        Ok(scored
            .into_iter()
            .take(limit)
            .map(|(score, composition)| RankedComposition {
                composition,
                confidence: Some((score - max).exp() / total),
            })
            .collect())
    }
}
