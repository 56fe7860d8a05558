use serde::{Deserialize, Serialize};

/// A malformed spectrum encoding or peak list
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{0}")]
pub struct SpectrumError(pub String);

/// A centroided fragment peak
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Peak {
    /// Mass-to-charge ratio
    pub mz: f64,
    /// Signal intensity (non-negative)
    pub intensity: f64,
}

/// Validated MS2 spectrum
///
/// Invariants:
/// - m/z values are positive, finite and strictly increasing
/// - intensities are finite and positive (zero-intensity peaks are dropped)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Spectrum {
    peaks: Vec<Peak>,
}

impl Spectrum {
    /// An empty spectrum
    pub fn empty() -> Self {
        Self::default()
    }

    /// Validate and normalize a list of `(mz, intensity)` pairs.
    ///
    /// Peaks are sorted by m/z; peaks sharing an m/z are merged by summing
    /// intensity.
    pub fn new(pairs: impl IntoIterator<Item = (f64, f64)>) -> Result<Self, SpectrumError> {
        let mut peaks = Vec::new();
        for (mz, intensity) in pairs {
            if !mz.is_finite() || mz <= 0.0 {
                return Err(SpectrumError(format!("m/z must be positive and finite, got {mz}")));
            }
            if !intensity.is_finite() || intensity < 0.0 {
                return Err(SpectrumError(format!(
                    "intensity must be non-negative and finite, got {intensity}"
                )));
            }
            if intensity > 0.0 {
                peaks.push(Peak { mz, intensity });
            }
        }

        peaks.sort_by(|a, b| a.mz.total_cmp(&b.mz));
        let mut merged: Vec<Peak> = Vec::with_capacity(peaks.len());
        for peak in peaks {
            match merged.last_mut() {
                Some(last) if last.mz == peak.mz => last.intensity += peak.intensity,
                _ => merged.push(peak),
            }
        }

        Ok(Self { peaks: merged })
    }

    /// Parse the textual MS2 encoding.
    ///
    /// Accepted forms:
    /// - list of pairs: `[[100.1, 20.0], [150.2, 35.5]]` (parentheses allowed)
    /// - whitespace/semicolon separated `mz:intensity` tokens: `100.1:20 150.2:35.5`
    /// - blank text or `[]` for an empty spectrum
    pub fn parse(text: &str) -> Result<Self, SpectrumError> {
        let text = text.trim();
        if text.is_empty() || text == "[]" || text == "()" {
            return Ok(Self::empty());
        }

        if text.starts_with('[') || text.starts_with('(') {
            let normalized: String = text
                .chars()
                .map(|c| match c {
                    '(' => '[',
                    ')' => ']',
                    other => other,
                })
                .collect();
            let pairs: Vec<(f64, f64)> = serde_json::from_str(&normalized)
                .map_err(|e| SpectrumError(format!("invalid list-of-pairs encoding: {e}")))?;
            return Self::new(pairs);
        }

        let mut pairs = Vec::new();
        for token in text.split(|c: char| c.is_whitespace() || c == ';' || c == ',') {
            if token.is_empty() {
                continue;
            }
            let (mz, intensity) = token
                .split_once(':')
                .ok_or_else(|| SpectrumError(format!("expected mz:intensity, got '{token}'")))?;
            let mz: f64 = mz
                .trim()
                .parse()
                .map_err(|_| SpectrumError(format!("non-numeric m/z '{mz}'")))?;
            let intensity: f64 = intensity
                .trim()
                .parse()
                .map_err(|_| SpectrumError(format!("non-numeric intensity '{intensity}'")))?;
            pairs.push((mz, intensity));
        }
        Self::new(pairs)
    }

    /// Peaks in ascending m/z order
    pub fn peaks(&self) -> &[Peak] {
        &self.peaks
    }

    /// Number of peaks
    pub fn len(&self) -> usize {
        self.peaks.len()
    }

    /// True for a spectrum without peaks
    pub fn is_empty(&self) -> bool {
        self.peaks.is_empty()
    }

    /// True when a peak lies within `tol_ppm` of `mz`
    pub fn contains_mz(&self, mz: f64, tol_ppm: f64) -> bool {
        let tol = mz * tol_ppm * 1e-6;
        let start = self.peaks.partition_point(|p| p.mz < mz - tol);
        self.peaks
            .get(start)
            .map_or(false, |p| p.mz <= mz + tol)
    }
}
