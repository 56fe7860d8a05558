use super::*;
use crate::chain::{Chain, ChainComposition, RankedComposition};
use crate::feature::IngestError;

fn record() -> AnnotationRecord {
    AnnotationRecord {
        feature_id: "f1".into(),
        name: Some("PC 16:0_18:1".into()),
        precursor_mz: 760.5851,
        ion_mode: IonMode::Positive,
        adduct: Some("[M+H]+".into()),
        class: Some("PC".into()),
        category: Some(Category::Glycerophospholipids),
        num_chain: Some(2),
        pred_confidence: Some(0.9),
        chains: vec![
            RankedComposition {
                composition: ChainComposition::new(vec![Chain::new(18, 1), Chain::new(16, 0)]),
                confidence: Some(0.8),
            },
            RankedComposition {
                composition: ChainComposition::new(vec![Chain::new(18, 0), Chain::new(16, 1)]),
                confidence: Some(0.1),
            },
        ],
    }
}

fn unannotated() -> AnnotationRecord {
    AnnotationRecord {
        feature_id: "f2".into(),
        name: None,
        precursor_mz: 500.0,
        ion_mode: IonMode::Negative,
        adduct: Some("[M-H]-".into()),
        class: None,
        category: None,
        num_chain: None,
        pred_confidence: None,
        chains: Vec::new(),
    }
}

#[test]
fn test_annotation_row_flattens_ranks() {
    let row = AnnotationRow::from(&record());
    assert_eq!(row.chain_rank1.as_deref(), Some("16:0_18:1"));
    assert_eq!(row.chain_rank1_confidence, Some(0.8));
    assert_eq!(row.chain_rank2.as_deref(), Some("16:1_18:0"));
    assert_eq!(row.chain_rank3, None);
    assert_eq!(row.chain_rank3_confidence, None);
}

#[test]
fn test_annotation_csv_columns() {
    let mut buffer = Vec::new();
    let rows = [record(), unannotated()];
    let count = write_csv(&mut buffer, rows.iter().map(AnnotationRow::from)).unwrap();
    assert_eq!(count, 2);

    let text = String::from_utf8(buffer).unwrap();
    let mut lines = text.lines();
    assert_eq!(
        lines.next().unwrap(),
        "index,name,precursor_mz,ion_mode,adduct,class,category,num_chain,pred_confidence,\
         chain_rank1,chain_rank1_confidence,chain_rank2,chain_rank2_confidence,\
         chain_rank3,chain_rank3_confidence"
    );
    assert_eq!(
        lines.next().unwrap(),
        "f1,PC 16:0_18:1,760.5851,positive,[M+H]+,PC,Glycerophospholipids,2,0.9,\
         16:0_18:1,0.8,16:1_18:0,0.1,,"
    );
    assert_eq!(lines.next().unwrap(), "f2,,500.0,negative,[M-H]-,,,,,,,,,,");
}

#[test]
fn test_output_dir_writes_tables() {
    let dir = tempfile::tempdir().unwrap();
    let mut out = OutputDir::create(dir.path().join("run")).unwrap();
    out.write_records(&[record(), unannotated()]).unwrap();
    out.write_ingestion_errors(&[IngestError::DuplicateIndex("f1".into())])
        .unwrap();
    let stats = out.finish();

    assert_eq!(stats.rows_written, 3);
    let errors = std::fs::read_to_string(dir.path().join("run/ingestion_errors.csv")).unwrap();
    assert!(errors.starts_with("index,kind,message\nf1,duplicate_index,"));
    assert!(dir.path().join("run/annotations.csv").exists());
}

#[test]
fn test_chain_rows() {
    let records = [record(), unannotated()];
    let rows: Vec<ChainRow> = chain_rows(&records).collect();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1].rank, 2);
    assert_eq!(rows[1].class, "PC");
    assert_eq!(rows[1].chains, "16:1_18:0");
}

#[cfg(feature = "parquet_output")]
#[test]
fn test_parquet_annotation_table() {
    use ::parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("annotations.parquet");
    let mut writer = AnnotationParquetWriter::new_file(&path, ParquetWriterConfig::default()).unwrap();
    writer.write_records(&[record(), unannotated()]).unwrap();
    let stats = writer.finish().unwrap();
    assert_eq!(stats.rows_written, 2);

    let reader = ParquetRecordBatchReaderBuilder::try_new(std::fs::File::open(&path).unwrap())
        .unwrap()
        .build()
        .unwrap();
    let batches: Vec<_> = reader.map(|b| b.unwrap()).collect();
    let rows: usize = batches.iter().map(|b| b.num_rows()).sum();
    assert_eq!(rows, 2);
    assert_eq!(batches[0].num_columns(), 15);
    assert_eq!(batches[0].schema().field(9).name(), "chain_rank1");
}
