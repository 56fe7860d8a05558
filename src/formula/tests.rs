use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use super::*;
use crate::chemistry::{Category, LipidClass};
use crate::feature::IonMode;

fn pc_feature() -> Feature {
    Feature::new(
        "f1",
        760.5851,
        IonMode::Positive,
        "[M+H]+",
        Spectrum::new(vec![(184.0733, 100.0), (577.5190, 20.0)]).unwrap(),
    )
}

fn candidate(formula: &str, score: f64) -> FormulaCandidate {
    FormulaCandidate {
        formula: formula.parse().unwrap(),
        score,
        mass_error_ppm: None,
    }
}

#[test]
fn test_write_ms_block() {
    let feature = pc_feature();
    let adduct = Adduct::lookup("[M+H]+").unwrap();
    let request = DecompositionRequest {
        feature_id: &feature.id,
        precursor_mz: feature.precursor_mz,
        adduct,
        neutral_mass: adduct.neutral_mass(feature.precursor_mz),
        spectrum: &feature.spectrum,
        ms1_ppm: 5.0,
        ms2_ppm: 10.0,
    };
    let mut buffer = Vec::new();
    exchange::write_ms(&mut buffer, &request).unwrap();
    let text = String::from_utf8(buffer).unwrap();

    assert!(text.starts_with(">compound f1\n"));
    assert!(text.contains(">parentmass 760.585100\n"));
    assert!(text.contains(">ionization [M+H]+\n"));
    assert!(text.contains(">ms2\n184.073300 100\n"));
}

#[test]
fn test_mass_decomposer_finds_pc() {
    let decomposer = MassDecomposer::default();
    let found = decomposer.decompose_mass(759.5778, 5.0);
    assert!(found.iter().any(|(f, _)| f.to_string() == "C42H82NO8P"));
    assert!(found.iter().all(|(f, e)| f.rdbe() >= 0.0 && e.abs() <= 5.0));
}

#[test]
fn test_resolver_with_class_constraint() {
    let decomposer = MassDecomposer::default();
    let resolver = FormulaResolver::new(&decomposer, FormulaParams::default(), RetryPolicy::none());
    let annotation = resolver
        .resolve(
            &pc_feature(),
            CompositionConstraint::Class(LipidClass::lookup("PC").unwrap()),
        )
        .unwrap();

    assert_eq!(annotation.predicted_formula.as_deref(), Some("C42H82NO8P"));
    assert!(annotation.candidates.len() <= 5);
    assert!(annotation.candidates[0].satisfies_constraint);
    assert_eq!(annotation.candidates[0].rank, 1);
}

#[test]
fn test_rerank_prefers_constraint() {
    let ranked = rerank(
        vec![
            candidate("C44H80O9", 0.9),
            candidate("C42H82NO8P", 0.6),
            candidate("C41H80NO8P", 0.7),
        ],
        CompositionConstraint::Category(Category::Glycerophospholipids),
        2,
    );
    let formulas: Vec<&str> = ranked.iter().map(|r| r.formula.as_str()).collect();
    assert_eq!(formulas, ["C41H80NO8P", "C42H82NO8P"]);
    assert!(ranked.iter().all(|r| r.satisfies_constraint));
}

#[test]
fn test_rerank_unconstrained_keeps_score_order() {
    let ranked = rerank(
        vec![candidate("C42H82NO8P", 0.6), candidate("C44H80O9", 0.9)],
        CompositionConstraint::Unconstrained,
        5,
    );
    assert_eq!(ranked[0].formula, "C44H80O9");
    assert_eq!(ranked.len(), 2);
}

#[test]
fn test_class_constraint_counts_heteroatoms() {
    let pe = CompositionConstraint::Class(LipidClass::lookup("PE").unwrap());
    assert!(pe.is_satisfied(&"C39H76NO8P".parse().unwrap()));
    assert!(!pe.is_satisfied(&"C39H76N2O8P".parse().unwrap()));
    let tg = CompositionConstraint::Category(Category::Glycerolipids);
    assert!(!tg.is_satisfied(&"C39H76NO8P".parse().unwrap()));
}

#[test]
fn test_parse_output() {
    let out = b"formula,score\nC42H82NO8P, 0.9\nC44H80O9,0.95\n";
    let candidates = parse_output(out).unwrap();
    assert_eq!(candidates[0].formula.to_string(), "C44H80O9");
    assert_eq!(candidates.len(), 2);

    assert!(parse_output(b"formula,score\nXx9,1.0\n").is_err());
}

struct FlakyDecomposer {
    calls: AtomicUsize,
    failures: usize,
}

impl FormulaDecomposer for FlakyDecomposer {
    fn decompose(
        &self,
        _request: &DecompositionRequest<'_>,
    ) -> Result<Vec<FormulaCandidate>, DecomposerError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.failures {
            Err(DecomposerError::Transient("busy".into()))
        } else {
            Ok(vec![candidate("C42H82NO8P", 1.0)])
        }
    }
}

#[test]
fn test_transient_failures_are_retried() {
    let decomposer = FlakyDecomposer {
        calls: AtomicUsize::new(0),
        failures: 2,
    };
    let retry = RetryPolicy {
        max_attempts: 3,
        backoff: Duration::ZERO,
    };
    let resolver = FormulaResolver::new(&decomposer, FormulaParams::default(), retry);
    let annotation = resolver
        .resolve(&pc_feature(), CompositionConstraint::Unconstrained)
        .unwrap();

    assert_eq!(annotation.predicted_formula.as_deref(), Some("C42H82NO8P"));
    assert_eq!(decomposer.calls.load(Ordering::SeqCst), 3);
}

#[test]
fn test_retry_budget_exhausted() {
    let decomposer = FlakyDecomposer {
        calls: AtomicUsize::new(0),
        failures: 10,
    };
    let retry = RetryPolicy {
        max_attempts: 2,
        backoff: Duration::ZERO,
    };
    let resolver = FormulaResolver::new(&decomposer, FormulaParams::default(), retry);
    let err = resolver
        .resolve(&pc_feature(), CompositionConstraint::Unconstrained)
        .unwrap_err();
    assert!(err.is_transient());
    assert_eq!(decomposer.calls.load(Ordering::SeqCst), 2);
}

#[test]
fn test_unknown_adduct_rejected() {
    let mut feature = pc_feature();
    feature.adduct = "[M-H]-".into();
    let decomposer = MassDecomposer::default();
    let resolver = FormulaResolver::new(&decomposer, FormulaParams::default(), RetryPolicy::none());
    assert!(matches!(
        resolver.resolve(&feature, CompositionConstraint::Unconstrained),
        Err(DecomposerError::InvalidInput(_))
    ));
}

#[cfg(unix)]
#[test]
fn test_external_decomposer() {
    let ok = ExternalDecomposer::new(
        "sh",
        vec![
            "-c".into(),
            "test -s \"$0\" && printf 'formula,score\\nC42H82NO8P,0.8\\n'".into(),
            "{input}".into(),
        ],
    );
    let resolver = FormulaResolver::new(&ok, FormulaParams::default(), RetryPolicy::none());
    let annotation = resolver
        .resolve(&pc_feature(), CompositionConstraint::Unconstrained)
        .unwrap();
    assert_eq!(annotation.predicted_formula.as_deref(), Some("C42H82NO8P"));

    let busy = ExternalDecomposer::new("sh", vec!["-c".into(), "exit 75".into()]);
    let err = FormulaResolver::new(&busy, FormulaParams::default(), RetryPolicy::none())
        .resolve(&pc_feature(), CompositionConstraint::Unconstrained)
        .unwrap_err();
    assert!(err.is_transient());

    let broken = ExternalDecomposer::new("sh", vec!["-c".into(), "exit 2".into()]);
    let err = FormulaResolver::new(&broken, FormulaParams::default(), RetryPolicy::none())
        .resolve(&pc_feature(), CompositionConstraint::Unconstrained)
        .unwrap_err();
    assert!(matches!(err, DecomposerError::Fatal(_)));
}
