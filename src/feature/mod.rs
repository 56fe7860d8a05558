//! # Feature Ingestion
//!
//! Features are the unidentified LC-MS/MS signals to annotate. They enter the
//! crate through a tabular contract (see [`FeatureTable`]) and are validated
//! once at that boundary:
//!
//! - the MS2 text encoding is parsed into a [`Spectrum`] with strictly
//!   increasing m/z and non-negative intensities
//! - `mz_*` columns become a binary [`FragmentVector`]
//! - `ion_mode` must be `positive` or `negative`
//!
//! A row that violates the contract is reported as an [`IngestError`] and left
//! out of the returned features; the rest of the table is unaffected.

mod error;
mod spectrum;
mod table;

#[cfg(test)]
mod tests;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use error::IngestError;
pub use spectrum::{Peak, Spectrum, SpectrumError};
pub use table::FeatureTable;

/// Ionization polarity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IonMode {
    /// Positive ion mode
    Positive,
    /// Negative ion mode
    Negative,
}

impl IonMode {
    /// Lowercase label used in tables
    pub fn as_str(&self) -> &'static str {
        match self {
            IonMode::Positive => "positive",
            IonMode::Negative => "negative",
        }
    }
}

impl fmt::Display for IonMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IonMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "positive" | "pos" | "+" | "1" => Ok(IonMode::Positive),
            "negative" | "neg" | "-" | "-1" => Ok(IonMode::Negative),
            other => Err(format!("ion mode must be positive or negative, got '{other}'")),
        }
    }
}

/// Binary fragment-presence features keyed by nominal fragment m/z
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FragmentVector {
    values: BTreeMap<u32, bool>,
}

impl FragmentVector {
    /// Create an empty vector
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the presence flag for a nominal m/z
    pub fn set(&mut self, nominal_mz: u32, present: bool) {
        self.values.insert(nominal_mz, present);
    }

    /// True when the fragment at `nominal_mz` is flagged present
    pub fn is_present(&self, nominal_mz: u32) -> bool {
        self.values.get(&nominal_mz).copied().unwrap_or(false)
    }

    /// Value of the feature as 0.0 / 1.0
    pub fn value(&self, nominal_mz: u32) -> f64 {
        if self.is_present(nominal_mz) {
            1.0
        } else {
            0.0
        }
    }

    /// Nominal m/z keys flagged present, ascending
    pub fn present(&self) -> impl Iterator<Item = u32> + '_ {
        self.values.iter().filter(|(_, &v)| v).map(|(&k, _)| k)
    }

    /// Number of columns carried by the vector
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when the vector carries no columns
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl FromIterator<u32> for FragmentVector {
    fn from_iter<T: IntoIterator<Item = u32>>(iter: T) -> Self {
        let mut vector = FragmentVector::new();
        for key in iter {
            vector.set(key, true);
        }
        vector
    }
}

/// An unidentified LC-MS/MS feature. Immutable after ingestion; annotation
/// results are kept in separate records keyed by [`Feature::id`].
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    /// Unique row key (`index` column)
    pub id: String,
    /// Precursor m/z
    pub precursor_mz: f64,
    /// Ionization polarity
    pub ion_mode: IonMode,
    /// Adduct token as provided, e.g. `[M+H]+`
    pub adduct: String,
    /// Validated MS2 spectrum (may be empty)
    pub spectrum: Spectrum,
    /// Binary fragment-presence vector
    pub fragments: FragmentVector,
}

impl Feature {
    /// Create a feature with an empty fragment vector
    pub fn new(
        id: impl Into<String>,
        precursor_mz: f64,
        ion_mode: IonMode,
        adduct: impl Into<String>,
        spectrum: Spectrum,
    ) -> Self {
        Self {
            id: id.into(),
            precursor_mz,
            ion_mode,
            adduct: adduct.into(),
            spectrum,
            fragments: FragmentVector::new(),
        }
    }

    /// Attach a fragment-presence vector
    pub fn with_fragments(mut self, fragments: FragmentVector) -> Self {
        self.fragments = fragments;
        self
    }

    /// Check the ingestion contract for a programmatically built feature.
    pub fn validate_contract(&self) -> Result<(), IngestError> {
        if self.id.trim().is_empty() {
            return Err(IngestError::invalid_field(&self.id, "index", "must not be empty"));
        }
        if !self.precursor_mz.is_finite() || self.precursor_mz <= 0.0 {
            return Err(IngestError::invalid_field(
                &self.id,
                "precursor_mz",
                format!("must be a positive finite number, got {}", self.precursor_mz),
            ));
        }
        Ok(())
    }
}
