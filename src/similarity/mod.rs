//! # Spectral Similarity
//!
//! Scores a query MS2 spectrum against a reference spectrum. Peaks are paired
//! greedily by descending intensity product; each peak is used at most once and
//! only pairs within the absolute m/z tolerance are kept. Unmatched peaks add no
//! similarity mass but still count towards each spectrum's norm or entropy.
//!
//! | Method | Definition |
//! |--------|------------|
//! | `dot_product` | cosine of matched intensities over the full L2 norms |
//! | `weighted_dot_product` | `dot_product` on `intensity^0.5` |
//! | `entropy_similarity` | spectral entropy similarity with low-entropy reweighting |
//! | `unweighted_entropy_similarity` | spectral entropy similarity on raw intensities |
//!
//! The entropy similarity is `1 - (2*S(AB) - S(A) - S(B)) / ln 4` where `S` is the
//! Shannon entropy of a sum-normalized spectrum and `AB` is the 1:1 merge of both
//! spectra (Li et al., Nature Methods 2021). In the weighted variant a spectrum
//! with entropy `S < 3` has its intensities raised to `0.25 + 0.25*S` first.
//!
//! All scores lie in `[0, 1]`; identical non-empty spectra score 1.0 and an empty
//! spectrum on either side scores 0.0.

mod matching;

#[cfg(test)]
mod tests;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::feature::{Peak, Spectrum};

pub use matching::match_peaks;

/// Power-law exponent applied to intensities by `weighted_dot_product`
pub const DOT_PRODUCT_INTENSITY_POWER: f64 = 0.5;

/// Spectra with entropy below this are reweighted by the weighted entropy method
const ENTROPY_WEIGHT_CUTOFF: f64 = 3.0;

/// Selectable similarity algorithm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityMethod {
    /// Cosine similarity
    DotProduct,
    /// Cosine similarity on power-law transformed intensities
    WeightedDotProduct,
    /// Spectral entropy similarity with intensity reweighting
    #[default]
    EntropySimilarity,
    /// Spectral entropy similarity without reweighting
    UnweightedEntropySimilarity,
}

impl SimilarityMethod {
    /// All methods
    pub const ALL: [SimilarityMethod; 4] = [
        SimilarityMethod::DotProduct,
        SimilarityMethod::WeightedDotProduct,
        SimilarityMethod::EntropySimilarity,
        SimilarityMethod::UnweightedEntropySimilarity,
    ];

    /// Configuration name
    pub fn as_str(&self) -> &'static str {
        match self {
            SimilarityMethod::DotProduct => "dot_product",
            SimilarityMethod::WeightedDotProduct => "weighted_dot_product",
            SimilarityMethod::EntropySimilarity => "entropy_similarity",
            SimilarityMethod::UnweightedEntropySimilarity => "unweighted_entropy_similarity",
        }
    }
}

impl fmt::Display for SimilarityMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SimilarityMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SimilarityMethod::ALL
            .iter()
            .copied()
            .find(|m| m.as_str() == s.trim())
            .ok_or_else(|| format!("unknown similarity method '{s}'"))
    }
}

/// Score `query` against `reference` with the given peak tolerance (Da).
pub fn similarity(
    query: &Spectrum,
    reference: &Spectrum,
    tolerance: f64,
    method: SimilarityMethod,
) -> f64 {
    let (a, b) = (query.peaks(), reference.peaks());
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let pairs = match_peaks(a, b, tolerance);

    let score = match method {
        SimilarityMethod::DotProduct => cosine(a, b, &pairs, |x| x),
        SimilarityMethod::WeightedDotProduct => {
            cosine(a, b, &pairs, |x| x.powf(DOT_PRODUCT_INTENSITY_POWER))
        }
        SimilarityMethod::EntropySimilarity => entropy_similarity(a, b, &pairs, true),
        SimilarityMethod::UnweightedEntropySimilarity => entropy_similarity(a, b, &pairs, false),
    };
    score.clamp(0.0, 1.0)
}

fn cosine(a: &[Peak], b: &[Peak], pairs: &[(usize, usize)], transform: impl Fn(f64) -> f64) -> f64 {
    let norm_a = a.iter().map(|p| transform(p.intensity).powi(2)).sum::<f64>().sqrt();
    let norm_b = b.iter().map(|p| transform(p.intensity).powi(2)).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    let dot: f64 = pairs
        .iter()
        .map(|&(i, j)| transform(a[i].intensity) * transform(b[j].intensity))
        .sum();
    dot / (norm_a * norm_b)
}

fn entropy_similarity(a: &[Peak], b: &[Peak], pairs: &[(usize, usize)], weighted: bool) -> f64 {
    let pa = distribution(a, weighted);
    let pb = distribution(b, weighted);
    if pa.is_empty() || pb.is_empty() {
        return 0.0;
    }

    let mut used_a = vec![false; pa.len()];
    let mut used_b = vec![false; pb.len()];
    let mut merged = Vec::with_capacity(pa.len() + pb.len());
    for &(i, j) in pairs {
        used_a[i] = true;
        used_b[j] = true;
        merged.push((pa[i] + pb[j]) / 2.0);
    }
    merged.extend(pa.iter().zip(&used_a).filter(|(_, &u)| !u).map(|(p, _)| p / 2.0));
    merged.extend(pb.iter().zip(&used_b).filter(|(_, &u)| !u).map(|(p, _)| p / 2.0));

    let s_ab = shannon_entropy(&merged);
    let s_a = shannon_entropy(&pa);
    let s_b = shannon_entropy(&pb);
    1.0 - (2.0 * s_ab - s_a - s_b) / 4f64.ln()
}

/// Sum-normalized intensities, optionally entropy-reweighted
fn distribution(peaks: &[Peak], weighted: bool) -> Vec<f64> {
    let mut p = normalize(peaks.iter().map(|p| p.intensity).collect());
    if weighted {
        let entropy = shannon_entropy(&p);
        if entropy < ENTROPY_WEIGHT_CUTOFF {
            let weight = 0.25 + 0.25 * entropy;
            p = normalize(p.into_iter().map(|x| x.powf(weight)).collect());
        }
    }
    p
}

fn normalize(values: Vec<f64>) -> Vec<f64> {
    let total: f64 = values.iter().sum();
    if total <= 0.0 {
        return Vec::new();
    }
    values.into_iter().map(|v| v / total).collect()
}

fn shannon_entropy(p: &[f64]) -> f64 {
    p.iter().filter(|&&x| x > 0.0).map(|&x| -x * x.ln()).sum()
}
