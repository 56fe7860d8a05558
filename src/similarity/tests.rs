use super::*;
use proptest::prelude::*;

fn spectrum(pairs: &[(f64, f64)]) -> Spectrum {
    Spectrum::new(pairs.iter().copied()).unwrap()
}

fn pc_like() -> Spectrum {
    spectrum(&[(184.0733, 1000.0), (478.3292, 120.0), (496.3398, 250.0), (504.3449, 80.0)])
}

#[test]
fn test_identical_spectra_score_one() {
    let s = pc_like();
    for method in SimilarityMethod::ALL {
        let score = similarity(&s, &s, 0.01, method);
        assert!((score - 1.0).abs() < 1e-9, "{method}: {score}");
    }
}

#[test]
fn test_empty_spectrum_scores_zero() {
    let s = pc_like();
    for method in SimilarityMethod::ALL {
        assert_eq!(similarity(&Spectrum::empty(), &s, 0.01, method), 0.0);
        assert_eq!(similarity(&s, &Spectrum::empty(), 0.01, method), 0.0);
    }
}

#[test]
fn test_disjoint_spectra_score_zero() {
    let a = spectrum(&[(100.0, 10.0), (200.0, 20.0)]);
    let b = spectrum(&[(300.0, 10.0), (400.0, 20.0)]);
    for method in SimilarityMethod::ALL {
        let score = similarity(&a, &b, 0.01, method);
        assert!(score.abs() < 1e-9, "{method}: {score}");
    }
}

#[test]
fn test_unmatched_peaks_lower_dot_product() {
    let a = spectrum(&[(100.0, 10.0), (200.0, 10.0)]);
    let b = spectrum(&[(100.0, 10.0), (200.0, 10.0), (300.0, 10.0)]);
    let score = similarity(&a, &b, 0.01, SimilarityMethod::DotProduct);
    // 2 / (sqrt(2) * sqrt(3))
    assert!((score - 2.0 / (2f64.sqrt() * 3f64.sqrt())).abs() < 1e-9);
}

#[test]
fn test_weighting_reduces_dominant_peak_influence() {
    let a = spectrum(&[(100.0, 10_000.0), (200.0, 10.0), (300.0, 10.0)]);
    let b = spectrum(&[(100.0, 10_000.0), (250.0, 10.0), (350.0, 10.0)]);
    let plain = similarity(&a, &b, 0.01, SimilarityMethod::DotProduct);
    let weighted = similarity(&a, &b, 0.01, SimilarityMethod::WeightedDotProduct);
    assert!(weighted < plain);
}

#[test]
fn test_peaks_used_once() {
    let query = [
        Peak { mz: 100.00, intensity: 10.0 },
        Peak { mz: 100.01, intensity: 5.0 },
    ];
    let reference = [Peak { mz: 100.005, intensity: 8.0 }];
    let pairs = match_peaks(&query, &reference, 0.02);
    assert_eq!(pairs, vec![(0, 0)]);
}

#[test]
fn test_tolerance_excludes_distant_peaks() {
    let query = [Peak { mz: 100.0, intensity: 10.0 }];
    let reference = [Peak { mz: 100.05, intensity: 10.0 }];
    assert!(match_peaks(&query, &reference, 0.01).is_empty());
    assert_eq!(match_peaks(&query, &reference, 0.1), vec![(0, 0)]);
}

#[test]
fn test_method_names_roundtrip() {
    for method in SimilarityMethod::ALL {
        assert_eq!(method.as_str().parse::<SimilarityMethod>().unwrap(), method);
    }
    assert!("cosine".parse::<SimilarityMethod>().is_err());
}

fn arb_spectrum() -> impl Strategy<Value = Spectrum> {
    prop::collection::vec((50.0f64..1000.0, 0.1f64..1e6), 1..40)
        .prop_map(|pairs| Spectrum::new(pairs).unwrap())
}

proptest! {
    /// Every method stays within [0, 1] for arbitrary spectra
    #[test]
    fn test_score_bounds(a in arb_spectrum(), b in arb_spectrum(), tol in 0.0f64..0.5) {
        for method in SimilarityMethod::ALL {
            let score = similarity(&a, &b, tol, method);
            prop_assert!((0.0..=1.0).contains(&score), "{} gave {}", method, score);
        }
    }

    /// Self-similarity is 1.0 for any non-empty spectrum
    #[test]
    fn test_self_similarity(a in arb_spectrum(), tol in 0.0f64..0.5) {
        for method in SimilarityMethod::ALL {
            let score = similarity(&a, &a, tol, method);
            prop_assert!((score - 1.0).abs() < 1e-6, "{} gave {}", method, score);
        }
    }
}
