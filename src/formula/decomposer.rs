use super::{DecomposerError, DecompositionRequest, FormulaCandidate, FormulaDecomposer};
use crate::chemistry::{ppm_diff, Element, Formula, PROTON_MASS};
use crate::feature::IonMode;

const C: f64 = Element::C.monoisotopic_mass();
const H: f64 = Element::H.monoisotopic_mass();
const N: f64 = Element::N.monoisotopic_mass();
const O: f64 = Element::O.monoisotopic_mass();
const P: f64 = Element::P.monoisotopic_mass();
const S: f64 = Element::S.monoisotopic_mass();

/// Upper element counts searched by [`MassDecomposer`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElementBounds {
    /// Maximum carbons
    pub carbons: i32,
    /// Maximum nitrogens
    pub nitrogens: i32,
    /// Maximum oxygens
    pub oxygens: i32,
    /// Maximum phosphorus atoms
    pub phosphorus: i32,
    /// Maximum sulfur atoms
    pub sulfur: i32,
}

impl Default for ElementBounds {
    fn default() -> Self {
        Self {
            carbons: 120,
            nitrogens: 4,
            oxygens: 24,
            phosphorus: 2,
            sulfur: 1,
        }
    }
}

/// Built-in CHNOPS decomposer.
///
/// Enumerates neutral formulas within `ms1_ppm` of the neutral mass, keeps
/// those with a non-negative integer RDBE, and scores each by its precursor
/// error and by the intensity share of the strongest MS2 peaks it explains as
/// a sub-formula fragment or neutral loss.
#[derive(Debug, Clone, Copy)]
pub struct MassDecomposer {
    bounds: ElementBounds,
    max_candidates: usize,
    max_fragments: usize,
}

impl Default for MassDecomposer {
    fn default() -> Self {
        Self {
            bounds: ElementBounds::default(),
            max_candidates: 50,
            max_fragments: 10,
        }
    }
}

impl MassDecomposer {
    /// Decomposer with custom element bounds
    pub fn with_bounds(bounds: ElementBounds) -> Self {
        Self {
            bounds,
            ..Self::default()
        }
    }

    /// All formulas within `tol_ppm` of `mass`, best mass error first
    pub fn decompose_mass(&self, mass: f64, tol_ppm: f64) -> Vec<(Formula, f64)> {
        let mut found = Vec::new();
        let b = &self.bounds;
        for s in 0..=b.sulfur {
            for p in 0..=b.phosphorus {
                for n in 0..=b.nitrogens {
                    for o in 0..=b.oxygens {
                        let rest = mass - s as f64 * S - p as f64 * P - n as f64 * N - o as f64 * O;
                        if rest < 0.0 {
                            break;
                        }
                        let max_c = b.carbons.min((rest / C) as i32);
                        for c in 1..=max_c {
                            let h = ((rest - c as f64 * C) / H).round() as i32;
                            if h < 0 {
                                continue;
                            }
                            let candidate = c as f64 * C
                                + h as f64 * H
                                + n as f64 * N
                                + o as f64 * O
                                + p as f64 * P
                                + s as f64 * S;
                            let error = ppm_diff(mass, candidate);
                            if error.abs() > tol_ppm {
                                continue;
                            }
                            let formula = Formula::from_counts([
                                (Element::C, c),
                                (Element::H, h),
                                (Element::N, n),
                                (Element::O, o),
                                (Element::P, p),
                                (Element::S, s),
                            ]);
                            let rdbe = formula.rdbe();
                            if rdbe < 0.0 || rdbe.fract() != 0.0 {
                                continue;
                            }
                            found.push((formula, error));
                        }
                    }
                }
            }
        }
        found.sort_by(|a, b| a.1.abs().total_cmp(&b.1.abs()));
        found
    }

    fn explained_share(&self, formula: &Formula, request: &DecompositionRequest<'_>) -> Option<f64> {
        let mut peaks: Vec<_> = request.spectrum.peaks().to_vec();
        if peaks.is_empty() {
            return None;
        }
        peaks.sort_by(|a, b| b.intensity.total_cmp(&a.intensity));
        peaks.truncate(self.max_fragments);

        let total: f64 = peaks.iter().map(|p| p.intensity).sum();
        let charge_shift = match request.adduct.ion_mode() {
            IonMode::Positive => -PROTON_MASS,
            IonMode::Negative => PROTON_MASS,
        };
        let explained: f64 = peaks
            .iter()
            .filter(|peak| {
                let tol = peak.mz * request.ms2_ppm * 1e-6;
                let fragment = peak.mz + charge_shift;
                let loss = request.precursor_mz - peak.mz;
                is_subformula_mass(fragment, tol, formula) || is_subformula_mass(loss, tol, formula)
            })
            .map(|p| p.intensity)
            .sum();
        Some(explained / total)
    }
}

/// True when some sub-formula of `parent` has a mass within `tol` Da of `mass`
fn is_subformula_mass(mass: f64, tol: f64, parent: &Formula) -> bool {
    if mass <= tol {
        return false;
    }
    for s in 0..=parent.count(Element::S) {
        for p in 0..=parent.count(Element::P) {
            for n in 0..=parent.count(Element::N) {
                for o in 0..=parent.count(Element::O) {
                    let rest = mass - s as f64 * S - p as f64 * P - n as f64 * N - o as f64 * O;
                    if rest < -tol {
                        break;
                    }
                    for c in 0..=parent.count(Element::C).min((rest / C) as i32 + 1) {
                        let h = ((rest - c as f64 * C) / H).round() as i32;
                        if h < 0 || h > parent.count(Element::H) {
                            continue;
                        }
                        if (rest - c as f64 * C - h as f64 * H).abs() <= tol {
                            return true;
                        }
                    }
                }
            }
        }
    }
    false
}

impl FormulaDecomposer for MassDecomposer {
    fn decompose(
        &self,
        request: &DecompositionRequest<'_>,
    ) -> Result<Vec<FormulaCandidate>, DecomposerError> {
        let mut candidates: Vec<FormulaCandidate> = self
            .decompose_mass(request.neutral_mass, request.ms1_ppm)
            .into_iter()
            .take(self.max_candidates)
            .map(|(formula, error)| {
                let mass_score = 1.0 - error.abs() / request.ms1_ppm.max(f64::EPSILON);
                let score = match self.explained_share(&formula, request) {
                    Some(share) => 0.5 * mass_score + 0.5 * share,
                    None => mass_score,
                };
                FormulaCandidate {
                    formula,
                    score,
                    mass_error_ppm: Some(error),
                }
            })
            .collect();
        candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
        Ok(candidates)
    }
}
