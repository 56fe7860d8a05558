use super::{Element, ELECTRON_MASS, PROTON_MASS};
use crate::feature::IonMode;

const H: f64 = Element::H.monoisotopic_mass();
const C: f64 = Element::C.monoisotopic_mass();
const N: f64 = Element::N.monoisotopic_mass();
const O: f64 = Element::O.monoisotopic_mass();

/// An ionization form relating neutral mass `M` to the observed precursor m/z
///
/// `mz = (multimer * M + delta) / |charge|`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Adduct {
    /// Canonical token, e.g. `[M+H]+`
    pub name: &'static str,
    /// Signed charge state
    pub charge: i8,
    /// Number of molecules in the ion
    pub multimer: u8,
    /// Mass added to `multimer * M` (electron mass included)
    pub delta: f64,
}

/// Supported adducts
pub static ADDUCTS: &[Adduct] = &[
    Adduct { name: "[M+H]+", charge: 1, multimer: 1, delta: PROTON_MASS },
    Adduct { name: "[M+Na]+", charge: 1, multimer: 1, delta: 22.989_769_280_9 - ELECTRON_MASS },
    Adduct { name: "[M+NH4]+", charge: 1, multimer: 1, delta: N + 4.0 * H - ELECTRON_MASS },
    Adduct { name: "[M+K]+", charge: 1, multimer: 1, delta: 38.963_706_68 - ELECTRON_MASS },
    Adduct { name: "[M-H2O+H]+", charge: 1, multimer: 1, delta: PROTON_MASS - 2.0 * H - O },
    Adduct { name: "[M+2H]2+", charge: 2, multimer: 1, delta: 2.0 * PROTON_MASS },
    Adduct { name: "[M-H]-", charge: -1, multimer: 1, delta: -PROTON_MASS },
    Adduct { name: "[M+HCOO]-", charge: -1, multimer: 1, delta: C + H + 2.0 * O + ELECTRON_MASS },
    Adduct { name: "[M+CH3COO]-", charge: -1, multimer: 1, delta: 2.0 * C + 3.0 * H + 2.0 * O + ELECTRON_MASS },
    Adduct { name: "[M+Cl]-", charge: -1, multimer: 1, delta: 34.968_852_68 + ELECTRON_MASS },
    Adduct { name: "[M-CH3]-", charge: -1, multimer: 1, delta: -(C + 3.0 * H) + ELECTRON_MASS },
    Adduct { name: "[M-2H]2-", charge: -2, multimer: 1, delta: -2.0 * PROTON_MASS },
];

impl Adduct {
    /// Look up an adduct by token; surrounding whitespace and `[M+HCOO-H]-` style
    /// formate spelling are accepted.
    pub fn lookup(token: &str) -> Option<&'static Adduct> {
        let token = token.trim();
        let token = match token {
            "[M+FA-H]-" | "[M+HCOO-H]-" | "[M+COOH]-" => "[M+HCOO]-",
            "[M+OAc]-" | "[M+CH3COO-H]-" => "[M+CH3COO]-",
            other => other,
        };
        ADDUCTS.iter().find(|a| a.name == token)
    }

    /// Look up an adduct and require its polarity to agree with `ion_mode`
    pub fn lookup_for_mode(token: &str, ion_mode: IonMode) -> Option<&'static Adduct> {
        Self::lookup(token).filter(|a| a.ion_mode() == ion_mode)
    }

    /// Adducts observable in the given ion mode
    pub fn for_mode(ion_mode: IonMode) -> impl Iterator<Item = &'static Adduct> {
        ADDUCTS.iter().filter(move |a| a.ion_mode() == ion_mode)
    }

    /// Polarity implied by the charge sign
    pub fn ion_mode(&self) -> IonMode {
        if self.charge > 0 {
            IonMode::Positive
        } else {
            IonMode::Negative
        }
    }

    /// Theoretical precursor m/z of a neutral molecule with mass `neutral_mass`
    pub fn precursor_mz(&self, neutral_mass: f64) -> f64 {
        (self.multimer as f64 * neutral_mass + self.delta) / self.charge.unsigned_abs() as f64
    }

    /// Neutral mass implied by an observed precursor m/z
    pub fn neutral_mass(&self, precursor_mz: f64) -> f64 {
        (precursor_mz * self.charge.unsigned_abs() as f64 - self.delta) / self.multimer as f64
    }
}
