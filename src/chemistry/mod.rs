//! # Chemistry Tables
//!
//! Mass constants and the static lookup tables the annotation cascade is built on:
//!
//! - [`Formula`]: elemental formulas with monoisotopic mass arithmetic
//! - [`Adduct`]: ionization forms relating neutral mass and precursor m/z
//! - [`LipidClass`]: the class → (category, chain count, backbone) table
//!
//! Chain masses follow the acyl convention: a chain with `C` carbons and `DB`
//! double bonds adds `C(C) H(2C-2DB-2) O(1)` to the class backbone, where the
//! backbone is the lipid with every chain slot replaced by hydrogen.

mod adduct;
mod formula;
mod lipid_class;

#[cfg(test)]
mod tests;

pub use adduct::{Adduct, ADDUCTS};
pub use formula::{Element, Formula, FormulaError};
pub use lipid_class::{Category, LipidClass, LIPID_CLASSES};

/// Mass of a proton in Da
pub const PROTON_MASS: f64 = 1.007_276_466_812;

/// Mass of an electron in Da
pub const ELECTRON_MASS: f64 = 0.000_548_579_909_46;

/// Monoisotopic mass of water in Da
pub const WATER_MASS: f64 = 2.0 * Element::H.monoisotopic_mass() + Element::O.monoisotopic_mass();

/// Mass added to a backbone by one acyl chain with the given carbon and double bond counts.
///
/// An absent slot (0:0) contributes nothing.
pub fn chain_increment(carbons: u32, double_bonds: u32) -> f64 {
    if carbons == 0 && double_bonds == 0 {
        return 0.0;
    }
    let hydrogens = 2.0 * carbons as f64 - 2.0 * double_bonds as f64 - 2.0;
    carbons as f64 * Element::C.monoisotopic_mass()
        + hydrogens * Element::H.monoisotopic_mass()
        + Element::O.monoisotopic_mass()
}

/// Combined increment of `chain_count` present chains with the given totals.
///
/// The sum of per-chain increments only depends on the totals, which lets the
/// mass balance be solved before chains are distributed.
pub fn total_chain_increment(chain_count: u32, carbons: u32, double_bonds: u32) -> f64 {
    if chain_count == 0 {
        return 0.0;
    }
    let n = chain_count as f64;
    let hydrogens = 2.0 * carbons as f64 - 2.0 * double_bonds as f64 - 2.0 * n;
    carbons as f64 * Element::C.monoisotopic_mass()
        + hydrogens * Element::H.monoisotopic_mass()
        + n * Element::O.monoisotopic_mass()
}

/// Signed mass difference in parts per million of `observed` against `reference`
pub fn ppm_diff(observed: f64, reference: f64) -> f64 {
    (observed - reference) / reference * 1e6
}

/// Nominal (integer) mass key used by fragment-presence vectors
pub fn nominal_mz(mz: f64) -> u32 {
    mz.round().max(0.0) as u32
}
