use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use log::info;

use super::{InMemoryReferenceStore, ReferenceEntry, ReferenceStoreError};
use crate::chemistry::{Adduct, Formula, LipidClass, ADDUCTS};
use crate::feature::{IonMode, Spectrum};

impl InMemoryReferenceStore {
    /// Load a reference library; `.tsv`/`.txt` files are tab-delimited.
    ///
    /// Recognized columns (case-insensitive): `name`, `formula`, `class`,
    /// `category`, `exact_mass`, `ion_mode`, `adduct`, `precursor_mz`, `ms2`.
    /// Only `name`, `class` and one of `formula`/`exact_mass` are required.
    /// Theoretical m/z values are computed from the neutral mass for every
    /// adduct of the entry's `ion_mode`, or every supported adduct when the
    /// column is absent or empty; an explicit `adduct` + `precursor_mz` pair
    /// overrides the computed value.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ReferenceStoreError> {
        let path = path.as_ref();
        let delimiter = match path.extension().and_then(|e| e.to_str()) {
            Some("tsv") | Some("txt") => b'\t',
            _ => b',',
        };
        let file = File::open(path).map_err(|e| {
            ReferenceStoreError::Unavailable(format!("{}: {e}", path.display()))
        })?;
        let store = Self::from_reader(BufReader::new(file), delimiter)?;
        info!(
            "Loaded {} reference entries from {}",
            store.entries().len(),
            path.display()
        );
        Ok(store)
    }

    /// Load a reference library from any reader
    pub fn from_reader<R: Read>(reader: R, delimiter: u8) -> Result<Self, ReferenceStoreError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .flexible(true)
            .has_headers(true)
            .from_reader(reader);

        let headers: Vec<String> = csv_reader
            .headers()?
            .iter()
            .map(|s| s.trim().to_lowercase())
            .collect();
        let find = |name: &str| headers.iter().position(|h| h == name);
        let name_col =
            find("name").ok_or_else(|| ReferenceStoreError::MissingColumn("name".into()))?;
        let class_col =
            find("class").ok_or_else(|| ReferenceStoreError::MissingColumn("class".into()))?;
        let formula_col = find("formula");
        let mass_col = find("exact_mass").or_else(|| find("neutral_mass"));
        if formula_col.is_none() && mass_col.is_none() {
            return Err(ReferenceStoreError::MissingColumn("formula or exact_mass".into()));
        }
        let category_col = find("category");
        let ion_mode_col = find("ion_mode");
        let adduct_col = find("adduct");
        let precursor_col = find("precursor_mz");
        let ms2_col = find("ms2");

        let mut entries = Vec::new();
        for (row, record) in csv_reader.records().enumerate() {
            let record = record?;
            let field = |col: Option<usize>| col.and_then(|i| record.get(i)).unwrap_or("").trim();

            let name = match field(Some(name_col)) {
                "" => format!("row {}", row + 1),
                n => n.to_string(),
            };
            let invalid = |message: String| ReferenceStoreError::InvalidEntry {
                name: name.clone(),
                message,
            };

            let class = field(Some(class_col)).to_string();
            let formula = field(formula_col).to_string();
            let neutral_mass = match field(mass_col) {
                "" => formula
                    .parse::<Formula>()
                    .map_err(|e| invalid(e.to_string()))?
                    .monoisotopic_mass(),
                text => text
                    .parse::<f64>()
                    .map_err(|_| invalid(format!("exact_mass is not a number: '{text}'")))?,
            };
            if !neutral_mass.is_finite() || neutral_mass <= 0.0 {
                return Err(invalid(format!("neutral mass must be positive, got {neutral_mass}")));
            }

            let category = match field(category_col) {
                "" => LipidClass::lookup(&class)
                    .map(|c| c.category.to_string())
                    .unwrap_or_default(),
                c => c.to_string(),
            };

            let adducts: Vec<&Adduct> = match field(ion_mode_col) {
                "" => ADDUCTS.iter().collect(),
                text => Adduct::for_mode(text.parse::<IonMode>().map_err(invalid)?).collect(),
            };
            let mut precursor_mz: BTreeMap<String, f64> = adducts
                .into_iter()
                .map(|a| (a.name.to_string(), a.precursor_mz(neutral_mass)))
                .collect();
            let adduct = field(adduct_col);
            if !adduct.is_empty() {
                let token = Adduct::lookup(adduct).map_or(adduct, |a| a.name);
                if let Ok(mz) = field(precursor_col).parse::<f64>() {
                    precursor_mz.insert(token.to_string(), mz);
                }
            }

            let spectrum = Spectrum::parse(field(ms2_col)).map_err(|e| invalid(e.to_string()))?;

            entries.push(ReferenceEntry {
                name,
                formula,
                class,
                category,
                neutral_mass,
                precursor_mz,
                spectrum,
            });
        }

        Ok(InMemoryReferenceStore::new(entries))
    }
}
