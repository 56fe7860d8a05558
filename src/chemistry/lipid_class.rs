use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{Element, Formula};

/// Top level of the two-level lipid taxonomy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    /// Fatty acids and conjugates (FA, CAR)
    #[serde(rename = "Fatty Acyls")]
    FattyAcyls,
    /// Acylglycerols (MG, DG, TG)
    Glycerolipids,
    /// Phospholipids on a glycerol backbone
    Glycerophospholipids,
    /// Lipids on a sphingoid base
    Sphingolipids,
    /// Sterols and sterol esters
    #[serde(rename = "Sterol Lipids")]
    SterolLipids,
}

impl Category {
    /// Human-readable label
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::FattyAcyls => "Fatty Acyls",
            Category::Glycerolipids => "Glycerolipids",
            Category::Glycerophospholipids => "Glycerophospholipids",
            Category::Sphingolipids => "Sphingolipids",
            Category::SterolLipids => "Sterol Lipids",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '_')
            .collect::<String>()
            .to_lowercase();
        match normalized.as_str() {
            "fattyacyls" => Ok(Category::FattyAcyls),
            "glycerolipids" => Ok(Category::Glycerolipids),
            "glycerophospholipids" => Ok(Category::Glycerophospholipids),
            "sphingolipids" => Ok(Category::Sphingolipids),
            "sterollipids" => Ok(Category::SterolLipids),
            _ => Err(format!("unknown lipid category '{s}'")),
        }
    }
}

/// Static description of a lipid class
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LipidClass {
    /// Class abbreviation, e.g. `PC`
    pub name: &'static str,
    /// Taxonomy category
    pub category: Category,
    /// Number of chain slots (1-4)
    pub num_chain: usize,
    /// Backbone composition with every chain slot replaced by hydrogen
    pub backbone: &'static [(Element, i32)],
}

use Element::{C, H, N, O, P};

const GPC: &[(Element, i32)] = &[(C, 8), (H, 20), (N, 1), (O, 6), (P, 1)];
const GPE: &[(Element, i32)] = &[(C, 5), (H, 14), (N, 1), (O, 6), (P, 1)];
const GPS: &[(Element, i32)] = &[(C, 6), (H, 14), (N, 1), (O, 8), (P, 1)];
const GPG: &[(Element, i32)] = &[(C, 6), (H, 15), (O, 8), (P, 1)];
const GPI: &[(Element, i32)] = &[(C, 9), (H, 19), (O, 11), (P, 1)];
const GP: &[(Element, i32)] = &[(C, 3), (H, 9), (O, 6), (P, 1)];
const GLYCEROL: &[(Element, i32)] = &[(C, 3), (H, 8), (O, 3)];
const CHOLESTEROL: &[(Element, i32)] = &[(C, 27), (H, 46), (O, 1)];
const WATER: &[(Element, i32)] = &[(H, 2), (O, 1)];
const CARNITINE: &[(Element, i32)] = &[(C, 7), (H, 15), (N, 1), (O, 3)];
const CERAMIDE: &[(Element, i32)] = &[(H, 5), (N, 1), (O, 1)];
const HEXCERAMIDE: &[(Element, i32)] = &[(C, 6), (H, 15), (N, 1), (O, 6)];
const SPHINGOMYELIN: &[(Element, i32)] = &[(C, 5), (H, 17), (N, 2), (O, 4), (P, 1)];
const CARDIOLIPIN: &[(Element, i32)] = &[(C, 9), (H, 22), (O, 13), (P, 2)];

macro_rules! class {
    ($name:literal, $category:ident, $chains:literal, $backbone:ident) => {
        LipidClass {
            name: $name,
            category: Category::$category,
            num_chain: $chains,
            backbone: $backbone,
        }
    };
}

/// The class → (category, chain count, backbone) lookup table
pub static LIPID_CLASSES: &[LipidClass] = &[
    class!("PC", Glycerophospholipids, 2, GPC),
    class!("PE", Glycerophospholipids, 2, GPE),
    class!("PS", Glycerophospholipids, 2, GPS),
    class!("PG", Glycerophospholipids, 2, GPG),
    class!("PI", Glycerophospholipids, 2, GPI),
    class!("PA", Glycerophospholipids, 2, GP),
    class!("LPC", Glycerophospholipids, 1, GPC),
    class!("LPE", Glycerophospholipids, 1, GPE),
    class!("LPS", Glycerophospholipids, 1, GPS),
    class!("LPG", Glycerophospholipids, 1, GPG),
    class!("LPI", Glycerophospholipids, 1, GPI),
    class!("LPA", Glycerophospholipids, 1, GP),
    class!("CL", Glycerophospholipids, 4, CARDIOLIPIN),
    class!("MG", Glycerolipids, 1, GLYCEROL),
    class!("DG", Glycerolipids, 2, GLYCEROL),
    class!("TG", Glycerolipids, 3, GLYCEROL),
    class!("CE", SterolLipids, 1, CHOLESTEROL),
    class!("FA", FattyAcyls, 1, WATER),
    class!("CAR", FattyAcyls, 1, CARNITINE),
    class!("Cer", Sphingolipids, 2, CERAMIDE),
    class!("HexCer", Sphingolipids, 2, HEXCERAMIDE),
    class!("SM", Sphingolipids, 2, SPHINGOMYELIN),
];

impl LipidClass {
    /// Look up a class by its abbreviation
    pub fn lookup(name: &str) -> Option<&'static LipidClass> {
        let name = name.trim();
        LIPID_CLASSES.iter().find(|c| c.name == name)
    }

    /// Backbone as a [`Formula`]
    pub fn backbone_formula(&self) -> Formula {
        Formula::from_counts(self.backbone.iter().copied())
    }

    /// Monoisotopic backbone mass in Da
    pub fn backbone_mass(&self) -> f64 {
        self.backbone
            .iter()
            .map(|(element, count)| element.monoisotopic_mass() * *count as f64)
            .sum()
    }
}
