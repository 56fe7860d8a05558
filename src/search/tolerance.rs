use serde::{Deserialize, Serialize};

/// Precursor (MS1) tolerance, relative or absolute
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "unit", content = "value", rename_all = "lowercase")]
pub enum Ms1Tolerance {
    /// Parts per million of the reference m/z: `|Δ| / reference * 1e6 <= tol`
    Ppm(f64),
    /// Absolute Daltons: `|Δ| <= tol`
    Da(f64),
}

impl Ms1Tolerance {
    /// Build from a value and the `is_ppm` flag
    pub fn new(value: f64, is_ppm: bool) -> Self {
        if is_ppm {
            Ms1Tolerance::Ppm(value)
        } else {
            Ms1Tolerance::Da(value)
        }
    }

    /// Tolerance value regardless of unit
    pub fn value(&self) -> f64 {
        match *self {
            Ms1Tolerance::Ppm(v) | Ms1Tolerance::Da(v) => v,
        }
    }

    /// Whether `observed` is within tolerance of `reference`
    pub fn accepts(&self, observed: f64, reference: f64) -> bool {
        let delta = (observed - reference).abs();
        match *self {
            Ms1Tolerance::Ppm(tol) => delta / reference * 1e6 <= tol,
            Ms1Tolerance::Da(tol) => delta <= tol,
        }
    }

    /// Reference m/z window that can satisfy [`Ms1Tolerance::accepts`] for
    /// `observed`. Slightly padded; candidates are re-checked exactly.
    pub fn window(&self, observed: f64) -> (f64, f64) {
        match *self {
            Ms1Tolerance::Ppm(tol) => {
                let f = tol * 1e-6;
                let upper = if f < 1.0 { observed / (1.0 - f) } else { f64::INFINITY };
                (observed / (1.0 + f) * (1.0 - 1e-12), upper * (1.0 + 1e-12))
            }
            Ms1Tolerance::Da(tol) => (observed - tol - 1e-12, observed + tol + 1e-12),
        }
    }
}
