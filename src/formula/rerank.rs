use serde::Serialize;

use super::FormulaCandidate;
use crate::chemistry::{Category, Element, Formula, LipidClass};

/// Elemental constraint derived from the class cascade, when available
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum CompositionConstraint {
    /// Heteroatom counts (N, P, S) must equal the class backbone's
    Class(&'static LipidClass),
    /// Loose per-category heteroatom requirements
    Category(Category),
    /// No class information
    #[default]
    Unconstrained,
}

impl CompositionConstraint {
    /// Whether `formula` satisfies the constraint
    pub fn is_satisfied(&self, formula: &Formula) -> bool {
        let n = formula.count(Element::N);
        let p = formula.count(Element::P);
        let s = formula.count(Element::S);
        match self {
            CompositionConstraint::Class(class) => {
                let backbone = class.backbone_formula();
                n == backbone.count(Element::N)
                    && p == backbone.count(Element::P)
                    && s == backbone.count(Element::S)
            }
            CompositionConstraint::Category(category) => match category {
                Category::Glycerophospholipids => p >= 1 && s == 0,
                Category::Sphingolipids => n >= 1 && s == 0,
                Category::Glycerolipids | Category::SterolLipids => n == 0 && p == 0 && s == 0,
                Category::FattyAcyls => p == 0 && s == 0,
            },
            CompositionConstraint::Unconstrained => true,
        }
    }
}

/// One re-ranked formula candidate
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedFormula {
    /// 1-based rank after re-ranking
    pub rank: usize,
    /// Hill-notation formula
    pub formula: String,
    /// Decomposer score
    pub score: f64,
    /// Precursor error, when the decomposer reports it
    pub mass_error_ppm: Option<f64>,
    /// Whether the class constraint holds
    pub satisfies_constraint: bool,
}

/// Candidates satisfying the constraint first, then by descending score; the
/// first `top_n` are kept.
pub fn rerank(
    candidates: Vec<FormulaCandidate>,
    constraint: CompositionConstraint,
    top_n: usize,
) -> Vec<RankedFormula> {
    let mut scored: Vec<(bool, FormulaCandidate)> = candidates
        .into_iter()
        .map(|c| (constraint.is_satisfied(&c.formula), c))
        .collect();
    scored.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| b.1.score.total_cmp(&a.1.score)));

    scored
        .into_iter()
        .take(top_n)
        .enumerate()
        .map(|(i, (satisfied, candidate))| RankedFormula {
            rank: i + 1,
            formula: candidate.formula.to_string(),
            score: candidate.score,
            mass_error_ppm: candidate.mass_error_ppm,
            satisfies_constraint: satisfied,
        })
        .collect()
}
