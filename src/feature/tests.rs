use super::*;

const TABLE: &str = "\
index,precursor_mz,ion_mode,adduct,MS2,mz_184,mz_104
f1,760.5851,positive,[M+H]+,\"[[184.0733, 100.0], [104.1070, 12.5]]\",1,1
f2,716.5236,negative,[M-H]-,196.04:20 140.01:100,0,0
f3,760.5851,positive,[M+H]+,\"[[184.07, -1.0]]\",1,0
f4,abc,positive,[M+H]+,,0,0
f5,500.0,sideways,[M+H]+,,0,0
f1,760.5851,positive,[M+H]+,,0,0
";

#[test]
fn test_spectrum_parse_list_of_pairs() {
    let spectrum = Spectrum::parse("[[150.2, 35.5], [100.1, 20.0]]").unwrap();
    assert_eq!(spectrum.len(), 2);
    assert_eq!(spectrum.peaks()[0].mz, 100.1);
    assert_eq!(spectrum.peaks()[1].intensity, 35.5);
}

#[test]
fn test_spectrum_parse_tuples_and_tokens() {
    let tuples = Spectrum::parse("((100.1, 20.0), (150.2, 35.5))").unwrap();
    let tokens = Spectrum::parse("100.1:20 150.2:35.5").unwrap();
    assert_eq!(tuples, tokens);
}

#[test]
fn test_spectrum_parse_empty_forms() {
    for text in ["", "  ", "[]", "()"] {
        assert!(Spectrum::parse(text).unwrap().is_empty());
    }
}

#[test]
fn test_spectrum_rejects_bad_values() {
    assert!(Spectrum::parse("[[100.0, -5.0]]").is_err());
    assert!(Spectrum::parse("100.0:abc").is_err());
    assert!(Spectrum::parse("[[100.0, 1.0]").is_err());
    assert!(Spectrum::parse("100.0").is_err());
    assert!(Spectrum::new(vec![(0.0, 1.0)]).is_err());
}

#[test]
fn test_spectrum_merges_duplicates_and_drops_zeros() {
    let spectrum = Spectrum::new(vec![(200.0, 1.0), (100.0, 0.0), (200.0, 2.0)]).unwrap();
    assert_eq!(spectrum.peaks(), &[Peak { mz: 200.0, intensity: 3.0 }]);
}

#[test]
fn test_contains_mz_ppm_window() {
    let spectrum = Spectrum::new(vec![(184.0733, 100.0)]).unwrap();
    assert!(spectrum.contains_mz(184.0735, 5.0));
    assert!(!spectrum.contains_mz(184.0800, 5.0));
}

#[test]
fn test_ion_mode_parse() {
    assert_eq!("Positive".parse::<IonMode>().unwrap(), IonMode::Positive);
    assert_eq!("neg".parse::<IonMode>().unwrap(), IonMode::Negative);
    assert!("both".parse::<IonMode>().is_err());
}

#[test]
fn test_feature_table_isolates_bad_rows() {
    let table = FeatureTable::from_reader(TABLE.as_bytes(), b',').unwrap();

    let ids: Vec<&str> = table.features.iter().map(|f| f.id.as_str()).collect();
    assert_eq!(ids, ["f1", "f2"]);

    let kinds: Vec<&str> = table.errors.iter().map(IngestError::kind).collect();
    assert_eq!(
        kinds,
        ["spectrum_parse", "invalid_field", "invalid_field", "duplicate_index"]
    );
    assert_eq!(table.errors[0].row_index(), Some("f3"));
}

#[test]
fn test_feature_table_isolates_undecodable_rows() {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(b"index,precursor_mz,ion_mode,adduct,MS2\n");
    bytes.extend_from_slice(b"f1,760.5851,positive,[M+H]+,184.0733:100\n");
    bytes.extend_from_slice(b"f2,760.5851,positive,[M+H]+,\"[[184.07\xff, 1.0]]\"\n");
    bytes.extend_from_slice(b"f3,716.5236,negative,[M-H]-,140.01:100\n");
    bytes.extend_from_slice(b"f4,716.5236,negative,[M\xfeH]-,\n");

    let table = FeatureTable::from_reader(bytes.as_slice(), b',').unwrap();

    let ids: Vec<&str> = table.features.iter().map(|f| f.id.as_str()).collect();
    assert_eq!(ids, ["f1", "f3"]);
    let kinds: Vec<&str> = table.errors.iter().map(IngestError::kind).collect();
    assert_eq!(kinds, ["spectrum_parse", "invalid_field"]);
    assert_eq!(table.errors[0].row_index(), Some("f2"));
    assert!(matches!(
        &table.errors[1],
        IngestError::InvalidField { column, .. } if column == "adduct"
    ));
}

#[test]
fn test_feature_table_fragment_vector() {
    let table = FeatureTable::from_reader(TABLE.as_bytes(), b',').unwrap();
    let f1 = &table.features[0];
    assert!(f1.fragments.is_present(184));
    assert!(f1.fragments.is_present(104));
    assert_eq!(f1.fragments.len(), 2);

    let f2 = &table.features[1];
    assert_eq!(f2.fragments.present().count(), 0);
    assert_eq!(f2.spectrum.len(), 2);
    assert_eq!(f2.ion_mode, IonMode::Negative);
}

#[test]
fn test_feature_table_missing_column() {
    let csv = "index,precursor_mz,adduct\nf1,760.5851,[M+H]+\n";
    let err = FeatureTable::from_reader(csv.as_bytes(), b',').unwrap_err();
    assert!(matches!(err, IngestError::MissingColumn(c) if c == "ion_mode"));
}

#[test]
fn test_feature_table_unnamed_index_column() {
    let tsv = "\tprecursor_mz\tion_mode\tadduct\n0\t760.5851\tpositive\t[M+H]+\n";
    let table = FeatureTable::from_reader(tsv.as_bytes(), b'\t').unwrap();
    assert_eq!(table.features[0].id, "0");
    assert!(table.features[0].spectrum.is_empty());
}

#[test]
fn test_validate_contract() {
    let feature = Feature::new("x", -1.0, IonMode::Positive, "[M+H]+", Spectrum::empty());
    assert!(matches!(
        feature.validate_contract(),
        Err(IngestError::InvalidField { ref column, .. }) if column == "precursor_mz"
    ));
}
