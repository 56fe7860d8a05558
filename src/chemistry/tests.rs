use super::*;
use crate::feature::IonMode;

fn close(a: f64, b: f64, tol: f64) -> bool {
    (a - b).abs() < tol
}

#[test]
fn test_formula_parse_and_mass() {
    let pc: Formula = "C42H82NO8P".parse().unwrap();
    assert_eq!(pc.count(Element::C), 42);
    assert_eq!(pc.count(Element::N), 1);
    assert_eq!(pc.count(Element::P), 1);
    assert!(close(pc.monoisotopic_mass(), 759.577_8, 1e-3));
    assert_eq!(pc.to_string(), "C42H82NO8P");
}

#[test]
fn test_formula_rejects_unknown_element() {
    assert!(matches!(
        "C6H12Xe".parse::<Formula>(),
        Err(FormulaError::UnknownElement(_))
    ));
    assert!(matches!("6CH".parse::<Formula>(), Err(FormulaError::Malformed(_))));
    assert!("".parse::<Formula>().is_err());
}

#[test]
fn test_formula_rejects_count_overflow() {
    assert!(matches!(
        "C2147483647C1".parse::<Formula>(),
        Err(FormulaError::Malformed(_))
    ));
    assert!(matches!("C99999999999".parse::<Formula>(), Err(FormulaError::Malformed(_))));

    let repeated: Formula = "CH3CH2OH".parse().unwrap();
    assert_eq!(repeated.count(Element::C), 2);
    assert_eq!(repeated.count(Element::H), 6);
}

#[test]
fn test_two_letter_symbols() {
    let salt: Formula = "NaCl".parse().unwrap();
    assert_eq!(salt.count(Element::Na), 1);
    assert_eq!(salt.count(Element::Cl), 1);
    assert_eq!(salt.count(Element::C), 0);
}

#[test]
fn test_pc_backbone_plus_chains() {
    let pc = LipidClass::lookup("PC").unwrap();
    let neutral = pc.backbone_mass() + chain_increment(16, 0) + chain_increment(18, 1);
    assert!(close(neutral, 759.577_8, 1e-3));

    let adduct = Adduct::lookup("[M+H]+").unwrap();
    assert!(close(adduct.precursor_mz(neutral), 760.585_1, 1e-3));
    assert!(close(adduct.neutral_mass(adduct.precursor_mz(neutral)), neutral, 1e-9));
}

#[test]
fn test_total_increment_matches_sum_of_chains() {
    let sum = chain_increment(16, 0) + chain_increment(18, 1) + chain_increment(20, 4);
    assert!(close(total_chain_increment(3, 54, 5), sum, 1e-9));
    assert_eq!(chain_increment(0, 0), 0.0);
}

#[test]
fn test_class_table_formulas() {
    // TG 16:0_18:1_18:1 = C55H102O6
    let tg = LipidClass::lookup("TG").unwrap();
    let expected: Formula = "C55H102O6".parse().unwrap();
    let mass = tg.backbone_mass()
        + chain_increment(16, 0)
        + chain_increment(18, 1)
        + chain_increment(18, 1);
    assert!(close(mass, expected.monoisotopic_mass(), 1e-6));

    // Cer 18:1_16:0 = C34H67NO3
    let cer = LipidClass::lookup("Cer").unwrap();
    let expected: Formula = "C34H67NO3".parse().unwrap();
    let mass = cer.backbone_mass() + chain_increment(18, 1) + chain_increment(16, 0);
    assert!(close(mass, expected.monoisotopic_mass(), 1e-6));

    assert_eq!(LipidClass::lookup("CL").unwrap().num_chain, 4);
    assert_eq!(
        LipidClass::lookup("SM").unwrap().category,
        Category::Sphingolipids
    );
    assert!(LipidClass::lookup("XYZ").is_none());
}

#[test]
fn test_adduct_polarity() {
    assert!(Adduct::lookup_for_mode("[M+H]+", IonMode::Positive).is_some());
    assert!(Adduct::lookup_for_mode("[M+H]+", IonMode::Negative).is_none());
    assert_eq!(
        Adduct::lookup("[M+FA-H]-").map(|a| a.name),
        Some("[M+HCOO]-")
    );
    assert!(Adduct::for_mode(IonMode::Negative).all(|a| a.charge < 0));
}

#[test]
fn test_doubly_charged_adduct() {
    let adduct = Adduct::lookup("[M-2H]2-").unwrap();
    let neutral = 1_447.965;
    let mz = adduct.precursor_mz(neutral);
    assert!(close(mz, (neutral - 2.0 * PROTON_MASS) / 2.0, 1e-9));
    assert!(close(adduct.neutral_mass(mz), neutral, 1e-9));
}

#[test]
fn test_category_parse() {
    assert_eq!(
        "Glycerophospholipids".parse::<Category>().unwrap(),
        Category::Glycerophospholipids
    );
    assert_eq!("fatty acyls".parse::<Category>().unwrap(), Category::FattyAcyls);
    assert!("Proteins".parse::<Category>().is_err());
}
