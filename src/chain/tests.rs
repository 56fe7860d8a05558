use proptest::prelude::*;

use super::mass_balance::{distribute, is_mass_consistent, solve_single_chain, solve_totals};
use super::*;
use crate::chemistry::{LipidClass, PROTON_MASS};
use crate::feature::{FragmentVector, IonMode, Spectrum};
use crate::model::{ChainRanker, ModelError};

fn class(name: &str) -> &'static LipidClass {
    LipidClass::lookup(name).unwrap()
}

#[test]
fn test_canonical_order() {
    let composition = ChainComposition::new(vec![
        Chain::new(16, 0),
        Chain::new(18, 1),
        Chain::new(18, 2),
    ])
    .canonical();
    assert_eq!(
        composition.chains(),
        &[Chain::new(18, 2), Chain::new(18, 1), Chain::new(16, 0)]
    );
    assert!(composition.is_canonical());
}

#[test]
fn test_name_omits_absent_slots() {
    let composition = ChainComposition::new(vec![Chain::ABSENT, Chain::new(18, 1)]).canonical();
    assert_eq!(composition.num_chain(), 2);
    assert_eq!(composition.notation(), "18:1");
}

#[test]
fn test_pc_notation() {
    let composition = ChainComposition::new(vec![Chain::new(16, 0), Chain::new(18, 1)]).canonical();
    assert_eq!(composition.to_string(), "16:0_18:1");
    assert!((composition.neutral_mass(class("PC")) - 759.5778).abs() < 1e-3);
}

#[test]
fn test_chain_parse() {
    assert_eq!("18:1".parse::<Chain>().unwrap(), Chain::new(18, 1));
    assert!("18".parse::<Chain>().is_err());
    assert!("a:b".parse::<Chain>().is_err());
}

#[test]
fn test_single_chain_solution() {
    let lpc = class("LPC");
    let neutral = ChainComposition::new(vec![Chain::new(16, 0)]).neutral_mass(lpc);
    let params = ChainParams::default();

    let (chain, residual) = solve_single_chain(neutral + 0.001, lpc, &params).unwrap();
    assert_eq!(chain, Chain::new(16, 0));
    assert!(residual.abs() <= params.mass_tol_ppm);

    // repeated calls give the same answer
    assert_eq!(solve_single_chain(neutral + 0.001, lpc, &params).unwrap().0, chain);
}

#[test]
fn test_single_chain_out_of_tolerance() {
    let lpc = class("LPC");
    let neutral = ChainComposition::new(vec![Chain::new(16, 0)]).neutral_mass(lpc);
    assert!(solve_single_chain(neutral + 0.05, lpc, &ChainParams::default()).is_none());
    assert!(!is_mass_consistent(neutral + 0.05, lpc, &ChainParams::default()));
}

#[test]
fn test_unvalidated_carbon_bound_does_not_overflow() {
    let params = ChainParams {
        max_carbons: 2_000_000_000,
        max_double_bonds: 2_000_000_000,
        ..ChainParams::default()
    };
    let cl = class("CL");
    assert!(!is_mass_consistent(1400.0, cl, &params));
    assert!(solve_totals(1400.0, cl, 4, &params).is_none());
}

#[test]
fn test_totals_and_distribution() {
    let pc = class("PC");
    let params = ChainParams::default();
    let totals = solve_totals(759.5778, pc, 2, &params).unwrap();
    assert_eq!((totals.carbons, totals.double_bonds), (34, 1));

    let options = distribute(&totals, 2, &params, true, 1000);
    assert!(options.contains(&vec![Chain::new(18, 1), Chain::new(16, 0)]));
    for chains in &options {
        assert!(ChainComposition::new(chains.clone()).is_canonical());
        let sum = ChainComposition::new(chains.clone()).totals();
        assert_eq!(sum, Chain::new(34, 1));
        assert!(chains.iter().all(|c| c.carbons % 2 == 0));
    }
}

#[test]
fn test_distribution_pads_absent_slots() {
    let params = ChainParams::default();
    let totals = TotalComposition {
        chain_count: 1,
        carbons: 18,
        double_bonds: 1,
        residual_ppm: 0.0,
    };
    let options = distribute(&totals, 3, &params, true, 10);
    assert_eq!(options, vec![vec![Chain::new(18, 1), Chain::ABSENT, Chain::ABSENT]]);
}

struct FixedRanker(Vec<RankedComposition>);

impl ChainRanker for FixedRanker {
    fn rank(
        &self,
        _query: &ChainQuery<'_>,
        _params: &ChainParams,
        _limit: usize,
    ) -> Result<Vec<RankedComposition>, ModelError> {
        Ok(self.0.clone())
    }
}

struct PanickingRanker;

impl ChainRanker for PanickingRanker {
    fn rank(
        &self,
        _query: &ChainQuery<'_>,
        _params: &ChainParams,
        _limit: usize,
    ) -> Result<Vec<RankedComposition>, ModelError> {
        panic!("single-chain classes must not call the ranker")
    }
}

fn ranked(chains: &[(u32, u32)], confidence: f64) -> RankedComposition {
    RankedComposition {
        composition: ChainComposition::new(chains.iter().map(|&(c, db)| Chain::new(c, db)).collect()),
        confidence: Some(confidence),
    }
}

#[test]
fn test_resolver_single_chain_skips_model() {
    let lpc = class("LPC");
    let neutral = ChainComposition::new(vec![Chain::new(18, 1)]).neutral_mass(lpc);
    let fragments = FragmentVector::new();
    let spectrum = Spectrum::empty();
    let query = ChainQuery {
        class: lpc,
        neutral_mass: neutral,
        precursor_mz: neutral + PROTON_MASS,
        ion_mode: IonMode::Positive,
        fragments: &fragments,
        spectrum: &spectrum,
    };

    let result = ChainResolver::new(&PanickingRanker, ChainParams::default())
        .resolve(&query)
        .unwrap();
    assert_eq!(result.len(), 1);
    assert_eq!(result[0].composition.chains(), &[Chain::new(18, 1)]);
    assert_eq!(result[0].confidence, Some(1.0));
}

#[test]
fn test_resolver_canonicalizes_and_filters() {
    let pc = class("PC");
    let fragments = FragmentVector::new();
    let spectrum = Spectrum::empty();
    let query = ChainQuery {
        class: pc,
        neutral_mass: 759.5778,
        precursor_mz: 760.5851,
        ion_mode: IonMode::Positive,
        fragments: &fragments,
        spectrum: &spectrum,
    };
    let ranker = FixedRanker(vec![
        ranked(&[(16, 0), (18, 1)], 0.97),
        ranked(&[(18, 1), (16, 0)], 0.5),
        ranked(&[(16, 0), (18, 2)], 0.4),
        ranked(&[(34, 1)], 0.3),
        ranked(&[(18, 0), (16, 1)], 1.4),
    ]);

    let result = ChainResolver::new(&ranker, ChainParams::default())
        .resolve(&query)
        .unwrap();
    assert_eq!(result.len(), 2);
    assert_eq!(result[0].composition.chains(), &[Chain::new(18, 1), Chain::new(16, 0)]);
    assert_eq!(result[0].confidence, Some(0.97));
    assert_eq!(result[1].composition.chains(), &[Chain::new(18, 0), Chain::new(16, 1)]);
    assert_eq!(result[1].confidence, Some(1.0));
}

proptest! {
    #[test]
    fn prop_canonicalize_idempotent(chains in prop::collection::vec((0u32..40, 0u32..8), 1..5)) {
        let composition = ChainComposition::new(
            chains.into_iter().map(|(c, db)| Chain::new(c, db)).collect(),
        );
        let once = composition.canonical();
        let twice = once.clone().canonical();
        prop_assert!(once.is_canonical());
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn prop_canonical_order_ignores_input_order(mut chains in prop::collection::vec((0u32..40, 0u32..8), 1..5)) {
        let a = ChainComposition::new(chains.iter().map(|&(c, db)| Chain::new(c, db)).collect()).canonical();
        chains.reverse();
        let b = ChainComposition::new(chains.iter().map(|&(c, db)| Chain::new(c, db)).collect()).canonical();
        prop_assert_eq!(a, b);
    }
}
