use super::*;

const LIBRARY: &str = "name,formula,class,category,MS2
PC 16:0_18:1,C42H82NO8P,PC,Glycerophospholipids,\"[[184.0733, 100.0], [496.3398, 20.0]]\"
PE 16:0_18:1,C39H76NO8P,PE,,\"[[577.5190, 100.0]]\"
";

#[test]
fn test_load_library_computes_adduct_mz() {
    let store = InMemoryReferenceStore::from_reader(LIBRARY.as_bytes(), b',').unwrap();
    assert_eq!(store.len(), 2);

    let pc = store.get(0).unwrap();
    assert!((pc.neutral_mass - 759.5778).abs() < 1e-3);
    assert!((pc.precursor_mz["[M+H]+"] - 760.5851).abs() < 1e-3);
    assert_eq!(pc.spectrum.len(), 2);

    // category filled in from the class table
    assert_eq!(store.get(1).unwrap().category, "Glycerophospholipids");
}

#[test]
fn test_window_query() {
    let store = InMemoryReferenceStore::from_reader(LIBRARY.as_bytes(), b',').unwrap();

    let hits = store.query("[M+H]+", 760.58, 760.59).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].entry.name, "PC 16:0_18:1");

    assert!(store.query("[M+H]+", 100.0, 200.0).unwrap().is_empty());
    assert!(store.query("[M+Xe]+", 0.0, 2000.0).unwrap().is_empty());

    let all = store.query("[M+H]+", 0.0, 2000.0).unwrap();
    assert_eq!(all.len(), 2);
    assert!(all[0].theoretical_mz <= all[1].theoretical_mz);
}

#[test]
fn test_explicit_precursor_overrides_computed() {
    let library = "name,class,exact_mass,adduct,precursor_mz\nX,PC,759.5778,[M+H]+,760.6000\n";
    let store = InMemoryReferenceStore::from_reader(library.as_bytes(), b',').unwrap();
    assert_eq!(store.get(0).unwrap().precursor_mz["[M+H]+"], 760.6);
}

#[test]
fn test_malformed_reference_spectrum_is_fatal() {
    let library = "name,class,formula,ms2\nX,PC,C42H82NO8P,\"[[184.07, -1.0]]\"\n";
    let err = InMemoryReferenceStore::from_reader(library.as_bytes(), b',').unwrap_err();
    assert!(matches!(err, ReferenceStoreError::InvalidEntry { .. }));
}

#[test]
fn test_missing_mass_columns() {
    let library = "name,class\nX,PC\n";
    let err = InMemoryReferenceStore::from_reader(library.as_bytes(), b',').unwrap_err();
    assert!(matches!(err, ReferenceStoreError::MissingColumn(_)));
}

#[test]
fn test_overflowing_formula_is_invalid_entry() {
    let library = "name,class,formula\nX,PC,C2147483647C1\n";
    let err = InMemoryReferenceStore::from_reader(library.as_bytes(), b',').unwrap_err();
    assert!(matches!(err, ReferenceStoreError::InvalidEntry { .. }));
}

#[test]
fn test_ion_mode_column_limits_adducts() {
    let library = "name,class,formula,ion_mode
PC 16:0_18:1,PC,C42H82NO8P,positive
PE 16:0_18:1,PE,C39H76NO8P,
";
    let store = InMemoryReferenceStore::from_reader(library.as_bytes(), b',').unwrap();

    let pc = store.get(0).unwrap();
    assert!(pc.precursor_mz.contains_key("[M+H]+"));
    assert!(!pc.precursor_mz.contains_key("[M-H]-"));

    let pe = store.get(1).unwrap();
    assert!(pe.precursor_mz.contains_key("[M+H]+"));
    assert!(pe.precursor_mz.contains_key("[M-H]-"));

    assert_eq!(store.query("[M-H]-", 0.0, 2000.0).unwrap().len(), 1);
}

#[test]
fn test_invalid_ion_mode_is_invalid_entry() {
    let library = "name,class,formula,ion_mode\nX,PC,C42H82NO8P,sideways\n";
    let err = InMemoryReferenceStore::from_reader(library.as_bytes(), b',').unwrap_err();
    assert!(matches!(err, ReferenceStoreError::InvalidEntry { .. }));
}
