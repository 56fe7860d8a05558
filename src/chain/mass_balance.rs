//! Algebraic mass balance: `neutral mass = backbone + Σ chain increments`.
//!
//! The summed increment of `n` present chains depends only on the totals
//! `(ΣC, ΣDB)`, so totals are solved first by a small integer search and then
//! distributed over chain slots.

use serde::{Deserialize, Serialize};

use super::Chain;
use crate::chemistry::{ppm_diff, total_chain_increment, LipidClass};

/// Largest per-chain carbon count a configuration may allow
pub const MAX_CHAIN_CARBONS: u32 = 100;

/// Largest per-chain double-bond count a configuration may allow
pub const MAX_CHAIN_DOUBLE_BONDS: u32 = 30;

/// Bounds and tolerance for chain inference
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainParams {
    /// Mass-balance tolerance in ppm of the neutral mass
    pub mass_tol_ppm: f64,
    /// Smallest carbon count of a single chain
    pub min_carbons: u32,
    /// Largest carbon count of a single chain
    pub max_carbons: u32,
    /// Largest double-bond count of a single chain
    pub max_double_bonds: u32,
    /// Restrict multi-chain candidates to even carbon counts
    pub even_carbons_only: bool,
}

impl Default for ChainParams {
    fn default() -> Self {
        Self {
            mass_tol_ppm: 10.0,
            min_carbons: 2,
            max_carbons: 36,
            max_double_bonds: 12,
            even_carbons_only: true,
        }
    }
}

impl ChainParams {
    /// Whether a single chain lies inside the configured bounds
    pub fn allows(&self, chain: Chain, even_only: bool) -> bool {
        chain.carbons >= self.min_carbons
            && chain.carbons <= self.max_carbons
            && chain.double_bonds <= self.max_double_bonds
            && chain.double_bonds * 2 <= chain.carbons
            && (!even_only || chain.carbons % 2 == 0)
    }
}

/// Summed chain composition solving the mass balance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TotalComposition {
    /// Number of present chains
    pub chain_count: u32,
    /// Total carbons
    pub carbons: u32,
    /// Total double bonds
    pub double_bonds: u32,
    /// Signed residual of the neutral mass against the solution, in ppm
    pub residual_ppm: f64,
}

/// Solve `(ΣC, ΣDB)` for `chain_count` present chains of `class` so that the
/// residual is minimal and within `params.mass_tol_ppm`.
///
/// Deterministic: ties are resolved towards fewer carbons, then fewer double
/// bonds.
pub fn solve_totals(
    neutral_mass: f64,
    class: &LipidClass,
    chain_count: u32,
    params: &ChainParams,
) -> Option<TotalComposition> {
    if chain_count == 0 || !neutral_mass.is_finite() || neutral_mass <= 0.0 {
        return None;
    }
    let min_carbons = chain_count.checked_mul(params.min_carbons)?;
    let max_carbons = chain_count.checked_mul(params.max_carbons)?;
    let max_double_bonds = chain_count.saturating_mul(params.max_double_bonds);
    let backbone = class.backbone_mass();
    let mut best: Option<TotalComposition> = None;

    for carbons in min_carbons..=max_carbons {
        let max_db = max_double_bonds.min(carbons / 2);
        for double_bonds in 0..=max_db {
            let mass = backbone + total_chain_increment(chain_count, carbons, double_bonds);
            let residual_ppm = ppm_diff(neutral_mass, mass);
            if residual_ppm.abs() > params.mass_tol_ppm {
                continue;
            }
            if best.map_or(true, |b| residual_ppm.abs() < b.residual_ppm.abs()) {
                best = Some(TotalComposition {
                    chain_count,
                    carbons,
                    double_bonds,
                    residual_ppm,
                });
            }
        }
    }
    best
}

/// Solve a single-chain class directly; no model is involved.
pub fn solve_single_chain(
    neutral_mass: f64,
    class: &LipidClass,
    params: &ChainParams,
) -> Option<(Chain, f64)> {
    let totals = solve_totals(neutral_mass, class, 1, params)?;
    let chain = Chain::new(totals.carbons, totals.double_bonds);
    params
        .allows(chain, false)
        .then_some((chain, totals.residual_ppm))
}

/// True when some chain composition of `class` explains `neutral_mass`
pub fn is_mass_consistent(neutral_mass: f64, class: &LipidClass, params: &ChainParams) -> bool {
    solve_totals(neutral_mass, class, class.num_chain as u32, params).is_some()
}

/// All canonical distributions of `totals` over `totals.chain_count` chains,
/// padded with absent slots up to `slots`. Stops after `limit` results.
pub fn distribute(
    totals: &TotalComposition,
    slots: usize,
    params: &ChainParams,
    even_only: bool,
    limit: usize,
) -> Vec<Vec<Chain>> {
    let mut out = Vec::new();
    let mut current = Vec::with_capacity(slots);
    distribute_into(
        totals.chain_count,
        totals.carbons,
        totals.double_bonds,
        None,
        params,
        even_only,
        limit,
        &mut current,
        &mut out,
    );
    for chains in &mut out {
        chains.resize(slots.max(chains.len()), Chain::ABSENT);
    }
    out
}

#[allow(clippy::too_many_arguments)]
fn distribute_into(
    remaining: u32,
    carbons: u32,
    double_bonds: u32,
    previous: Option<Chain>,
    params: &ChainParams,
    even_only: bool,
    limit: usize,
    current: &mut Vec<Chain>,
    out: &mut Vec<Vec<Chain>>,
) {
    if out.len() >= limit {
        return;
    }
    if remaining == 1 {
        let last = Chain::new(carbons, double_bonds);
        if params.allows(last, even_only) && previous.map_or(true, |p| last <= p) {
            current.push(last);
            out.push(current.clone());
            current.pop();
        }
        return;
    }

    let rest = remaining - 1;
    let upper = params.max_carbons.min(carbons.saturating_sub(rest * params.min_carbons));
    for c in (params.min_carbons..=upper).rev() {
        let left = carbons - c;
        if left < rest * params.min_carbons || left > rest * params.max_carbons {
            continue;
        }
        let max_db = params.max_double_bonds.min(double_bonds).min(c / 2);
        for db in (0..=max_db).rev() {
            let chain = Chain::new(c, db);
            if !params.allows(chain, even_only) || previous.map_or(false, |p| chain > p) {
                continue;
            }
            current.push(chain);
            distribute_into(
                rest,
                left,
                double_bonds - db,
                Some(chain),
                params,
                even_only,
                limit,
                current,
                out,
            );
            current.pop();
            if out.len() >= limit {
                return;
            }
        }
    }
}
