//! # Reference Store
//!
//! Read-only access to the spectral reference library. The annotation cascade
//! only needs one query: all entries whose theoretical precursor m/z for a given
//! adduct falls inside an m/z window. [`ReferenceStore`] captures that contract so
//! a database-backed store or a test fake can stand in for the bundled
//! [`InMemoryReferenceStore`].

mod error;
mod loader;
mod store;

#[cfg(test)]
mod tests;

use std::collections::BTreeMap;

use serde::Serialize;

use crate::feature::Spectrum;

pub use error::ReferenceStoreError;
pub use store::InMemoryReferenceStore;

/// One library compound. Immutable after loading.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReferenceEntry {
    /// Compound name, e.g. `PC 16:0_18:1`
    pub name: String,
    /// Molecular formula
    pub formula: String,
    /// Class label, e.g. `PC`
    pub class: String,
    /// Category label, e.g. `Glycerophospholipids`
    pub category: String,
    /// Neutral monoisotopic mass in Da
    pub neutral_mass: f64,
    /// Theoretical precursor m/z per adduct token
    pub precursor_mz: BTreeMap<String, f64>,
    /// Reference MS2 spectrum
    #[serde(skip)]
    pub spectrum: Spectrum,
}

/// A candidate returned by a store query
#[derive(Debug, Clone, Copy)]
pub struct ReferenceHit<'a> {
    /// Stable identifier of the entry within the store
    pub reference_id: usize,
    /// The entry itself
    pub entry: &'a ReferenceEntry,
    /// Theoretical precursor m/z for the queried adduct
    pub theoretical_mz: f64,
}

/// Read-only query interface of a reference library
pub trait ReferenceStore: Send + Sync {
    /// All entries whose theoretical m/z for `adduct` lies in `[lower_mz, upper_mz]`,
    /// in ascending m/z order.
    fn query(
        &self,
        adduct: &str,
        lower_mz: f64,
        upper_mz: f64,
    ) -> Result<Vec<ReferenceHit<'_>>, ReferenceStoreError>;

    /// Entry by identifier
    fn get(&self, reference_id: usize) -> Option<&ReferenceEntry>;

    /// Number of entries in the store
    fn len(&self) -> usize;

    /// True when the store holds no entries
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
