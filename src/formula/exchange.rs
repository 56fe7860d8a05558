//! SIRIUS-compatible `.ms` peak lists.
//!
//! ```text
//! >compound f1
//! >parentmass 760.5851
//! >ionization [M+H]+
//! >charge 1
//!
//! >ms2
//! 184.0733 100
//! ```

use std::io::{self, Write};

use super::DecompositionRequest;

/// Write one compound block
pub fn write_ms<W: Write>(writer: &mut W, request: &DecompositionRequest<'_>) -> io::Result<()> {
    writeln!(writer, ">compound {}", request.feature_id)?;
    writeln!(writer, ">parentmass {:.6}", request.precursor_mz)?;
    writeln!(writer, ">ionization {}", request.adduct.name)?;
    writeln!(writer, ">charge {}", request.adduct.charge)?;
    writeln!(writer, ">ppm-max {}", request.ms1_ppm)?;
    writeln!(writer, ">ppm-max-ms2 {}", request.ms2_ppm)?;
    writeln!(writer)?;
    writeln!(writer, ">ms1")?;
    writeln!(writer, "{:.6} 100", request.precursor_mz)?;
    if !request.spectrum.is_empty() {
        writeln!(writer)?;
        writeln!(writer, ">ms2")?;
        for peak in request.spectrum.peaks() {
            writeln!(writer, "{:.6} {}", peak.mz, peak.intensity)?;
        }
    }
    Ok(())
}
