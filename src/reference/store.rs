use std::collections::HashMap;

use super::{ReferenceEntry, ReferenceHit, ReferenceStore, ReferenceStoreError};

/// Reference library held in memory with a per-adduct index sorted by
/// theoretical m/z; window queries are two binary searches.
#[derive(Debug, Clone, Default)]
pub struct InMemoryReferenceStore {
    entries: Vec<ReferenceEntry>,
    index: HashMap<String, Vec<(f64, usize)>>,
}

impl InMemoryReferenceStore {
    /// Build a store from entries
    pub fn new(entries: Vec<ReferenceEntry>) -> Self {
        let mut index: HashMap<String, Vec<(f64, usize)>> = HashMap::new();
        for (id, entry) in entries.iter().enumerate() {
            for (adduct, &mz) in &entry.precursor_mz {
                if mz.is_finite() {
                    index.entry(adduct.clone()).or_default().push((mz, id));
                }
            }
        }
        for list in index.values_mut() {
            list.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        }
        Self { entries, index }
    }

    /// All entries in load order
    pub fn entries(&self) -> &[ReferenceEntry] {
        &self.entries
    }
}

impl ReferenceStore for InMemoryReferenceStore {
    fn query(
        &self,
        adduct: &str,
        lower_mz: f64,
        upper_mz: f64,
    ) -> Result<Vec<ReferenceHit<'_>>, ReferenceStoreError> {
        let Some(list) = self.index.get(adduct.trim()) else {
            return Ok(Vec::new());
        };
        let start = list.partition_point(|(mz, _)| *mz < lower_mz);
        let end = list.partition_point(|(mz, _)| *mz <= upper_mz);
        if start >= end {
            return Ok(Vec::new());
        }
        Ok(list[start..end]
            .iter()
            .map(|&(mz, id)| ReferenceHit {
                reference_id: id,
                entry: &self.entries[id],
                theoretical_mz: mz,
            })
            .collect())
    }

    fn get(&self, reference_id: usize) -> Option<&ReferenceEntry> {
        self.entries.get(reference_id)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}
