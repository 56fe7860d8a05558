use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Errors raised while parsing an elemental formula
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FormulaError {
    /// Element symbol not covered by the lipid element set
    #[error("unknown element '{0}'")]
    UnknownElement(String),

    /// Formula text is not `SymbolCount` pairs
    #[error("malformed formula '{0}'")]
    Malformed(String),
}

/// Elements occurring in lipids and their common adduct ions
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Element {
    /// Carbon
    C,
    /// Hydrogen
    H,
    /// Nitrogen
    N,
    /// Oxygen
    O,
    /// Phosphorus
    P,
    /// Sulfur
    S,
    /// Sodium
    Na,
    /// Potassium
    K,
    /// Chlorine
    Cl,
}

impl Element {
    /// All supported elements in Hill order (C, H, then alphabetical)
    pub const ALL: [Element; 9] = [
        Element::C,
        Element::H,
        Element::Cl,
        Element::K,
        Element::N,
        Element::Na,
        Element::O,
        Element::P,
        Element::S,
    ];

    /// Monoisotopic mass of the most abundant isotope
    pub const fn monoisotopic_mass(self) -> f64 {
        match self {
            Element::C => 12.0,
            Element::H => 1.007_825_032_07,
            Element::N => 14.003_074_004_8,
            Element::O => 15.994_914_619_56,
            Element::P => 30.973_761_63,
            Element::S => 31.972_071_00,
            Element::Na => 22.989_769_280_9,
            Element::K => 38.963_706_68,
            Element::Cl => 34.968_852_68,
        }
    }

    /// Element symbol
    pub const fn symbol(self) -> &'static str {
        match self {
            Element::C => "C",
            Element::H => "H",
            Element::N => "N",
            Element::O => "O",
            Element::P => "P",
            Element::S => "S",
            Element::Na => "Na",
            Element::K => "K",
            Element::Cl => "Cl",
        }
    }

    fn from_symbol(symbol: &str) -> Option<Self> {
        Element::ALL.iter().copied().find(|e| e.symbol() == symbol)
    }
}

/// An elemental composition such as `C42H82NO8P`
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Formula {
    counts: BTreeMap<Element, i32>,
}

impl Formula {
    /// Create an empty formula
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a formula from element counts, dropping zero entries
    pub fn from_counts(counts: impl IntoIterator<Item = (Element, i32)>) -> Self {
        let mut formula = Self::new();
        for (element, count) in counts {
            formula.add(element, count);
        }
        formula
    }

    /// Add `count` atoms of `element` (negative counts subtract), saturating
    /// at the `i32` bounds
    pub fn add(&mut self, element: Element, count: i32) {
        let total = self.count(element).saturating_add(count);
        self.set(element, total);
    }

    /// Add `count` atoms of `element`; `None` when the count would overflow
    fn checked_add(&mut self, element: Element, count: i32) -> Option<()> {
        let total = self.count(element).checked_add(count)?;
        self.set(element, total);
        Some(())
    }

    fn set(&mut self, element: Element, count: i32) {
        if count == 0 {
            self.counts.remove(&element);
        } else {
            self.counts.insert(element, count);
        }
    }

    /// Number of atoms of `element`
    pub fn count(&self, element: Element) -> i32 {
        self.counts.get(&element).copied().unwrap_or(0)
    }

    /// Monoisotopic mass in Da
    pub fn monoisotopic_mass(&self) -> f64 {
        self.counts
            .iter()
            .map(|(element, &count)| element.monoisotopic_mass() * count as f64)
            .sum()
    }

    /// Ring-plus-double-bond equivalents, treating P as trivalent
    pub fn rdbe(&self) -> f64 {
        let c = self.count(Element::C) as f64;
        let monovalent = (self.count(Element::H)
            + self.count(Element::Na)
            + self.count(Element::K)
            + self.count(Element::Cl)) as f64;
        let trivalent = (self.count(Element::N) + self.count(Element::P)) as f64;
        c - monovalent / 2.0 + trivalent / 2.0 + 1.0
    }
}

impl FromStr for Formula {
    type Err = FormulaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        if text.is_empty() {
            return Err(FormulaError::Malformed(s.to_string()));
        }

        let chars: Vec<char> = text.chars().collect();
        let mut formula = Formula::new();
        let mut i = 0;
        while i < chars.len() {
            if !chars[i].is_ascii_uppercase() {
                return Err(FormulaError::Malformed(s.to_string()));
            }
            let mut symbol = chars[i].to_string();
            i += 1;
            while i < chars.len() && chars[i].is_ascii_lowercase() {
                symbol.push(chars[i]);
                i += 1;
            }
            let start = i;
            while i < chars.len() && chars[i].is_ascii_digit() {
                i += 1;
            }
            let count = if start == i {
                1
            } else {
                chars[start..i]
                    .iter()
                    .collect::<String>()
                    .parse::<i32>()
                    .map_err(|_| FormulaError::Malformed(s.to_string()))?
            };
            let element = Element::from_symbol(&symbol)
                .ok_or_else(|| FormulaError::UnknownElement(symbol.clone()))?;
            formula
                .checked_add(element, count)
                .ok_or_else(|| FormulaError::Malformed(s.to_string()))?;
        }

        Ok(formula)
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for element in Element::ALL {
            match self.count(element) {
                0 => {}
                1 => write!(f, "{}", element.symbol())?,
                n => write!(f, "{}{}", element.symbol(), n)?,
            }
        }
        Ok(())
    }
}
