//! Parquet export of the final annotation table.
//!
//! One row per feature with the same columns as `annotations.csv`. Files are
//! ZSTD-compressed and carry the writer version in the key-value metadata.

use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Builder, StringBuilder, UInt32Builder};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::basic::{Compression, ZstdLevel};
use parquet::file::properties::{EnabledStatistics, WriterProperties};
use parquet::format::KeyValue;

use super::OutputError;
use crate::annotate::AnnotationRecord;
use crate::chain::CHAIN_RANKS;

/// Configuration for the Parquet writer
#[derive(Debug, Clone)]
pub struct ParquetWriterConfig {
    /// ZSTD level
    pub compression_level: i32,
    /// Target row group size
    pub row_group_size: usize,
    /// Whether to write column statistics
    pub write_statistics: bool,
}

impl Default for ParquetWriterConfig {
    fn default() -> Self {
        Self {
            compression_level: 3,
            row_group_size: 64 * 1024,
            write_statistics: true,
        }
    }
}

impl ParquetWriterConfig {
    fn to_writer_properties(&self) -> WriterProperties {
        let compression = Compression::ZSTD(
            ZstdLevel::try_new(self.compression_level).unwrap_or_default(),
        );
        let statistics = if self.write_statistics {
            EnabledStatistics::Chunk
        } else {
            EnabledStatistics::None
        };
        WriterProperties::builder()
            .set_compression(compression)
            .set_statistics_enabled(statistics)
            .set_max_row_group_size(self.row_group_size)
            .set_key_value_metadata(Some(vec![KeyValue {
                key: "lipidann:version".to_string(),
                value: Some(env!("CARGO_PKG_VERSION").to_string()),
            }]))
            .build()
    }
}

/// Arrow schema of the annotation table
pub fn annotation_schema() -> SchemaRef {
    let mut fields = vec![
        Field::new("index", DataType::Utf8, false),
        Field::new("name", DataType::Utf8, true),
        Field::new("precursor_mz", DataType::Float64, false),
        Field::new("ion_mode", DataType::Utf8, false),
        Field::new("adduct", DataType::Utf8, true),
        Field::new("class", DataType::Utf8, true),
        Field::new("category", DataType::Utf8, true),
        Field::new("num_chain", DataType::UInt32, true),
        Field::new("pred_confidence", DataType::Float64, true),
    ];
    for rank in 1..=CHAIN_RANKS {
        fields.push(Field::new(format!("chain_rank{rank}"), DataType::Utf8, true));
        fields.push(Field::new(
            format!("chain_rank{rank}_confidence"),
            DataType::Float64,
            true,
        ));
    }
    Arc::new(Schema::new(fields))
}

/// Streaming writer for annotation Parquet files
pub struct AnnotationParquetWriter<W: Write + Send> {
    writer: ArrowWriter<W>,
    schema: SchemaRef,
    rows_written: usize,
}

impl AnnotationParquetWriter<File> {
    /// Create a writer to a file path
    pub fn new_file<P: AsRef<Path>>(
        path: P,
        config: ParquetWriterConfig,
    ) -> Result<Self, OutputError> {
        let file = File::create(path)?;
        Self::new(file, config)
    }
}

impl<W: Write + Send> AnnotationParquetWriter<W> {
    /// Create a writer to any `Write` implementation
    pub fn new(writer: W, config: ParquetWriterConfig) -> Result<Self, OutputError> {
        let schema = annotation_schema();
        let props = config.to_writer_properties();
        let writer = ArrowWriter::try_new(writer, schema.clone(), Some(props))?;
        Ok(Self {
            writer,
            schema,
            rows_written: 0,
        })
    }

    /// Write a batch of records
    pub fn write_records(&mut self, records: &[AnnotationRecord]) -> Result<(), OutputError> {
        if records.is_empty() {
            return Ok(());
        }

        let n = records.len();
        let mut index = StringBuilder::with_capacity(n, n * 8);
        let mut name = StringBuilder::with_capacity(n, n * 16);
        let mut precursor_mz = Float64Builder::with_capacity(n);
        let mut ion_mode = StringBuilder::with_capacity(n, n * 8);
        let mut adduct = StringBuilder::with_capacity(n, n * 8);
        let mut class = StringBuilder::with_capacity(n, n * 4);
        let mut category = StringBuilder::with_capacity(n, n * 20);
        let mut num_chain = UInt32Builder::with_capacity(n);
        let mut confidence = Float64Builder::with_capacity(n);
        let mut ranks: Vec<(StringBuilder, Float64Builder)> = (0..CHAIN_RANKS)
            .map(|_| (StringBuilder::with_capacity(n, n * 10), Float64Builder::with_capacity(n)))
            .collect();

        for record in records {
            index.append_value(&record.feature_id);
            name.append_option(record.name.as_deref());
            precursor_mz.append_value(record.precursor_mz);
            ion_mode.append_value(record.ion_mode.as_str());
            adduct.append_option(record.adduct.as_deref());
            class.append_option(record.class.as_deref());
            category.append_option(record.category.map(|c| c.as_str()));
            num_chain.append_option(record.num_chain.map(|c| c as u32));
            confidence.append_option(record.pred_confidence);
            for (i, (chains, chain_confidence)) in ranks.iter_mut().enumerate() {
                let ranked = record.chain_rank(i + 1);
                chains.append_option(ranked.map(|r| r.composition.notation()));
                chain_confidence.append_option(ranked.and_then(|r| r.confidence));
            }
        }

        let mut arrays: Vec<ArrayRef> = vec![
            Arc::new(index.finish()),
            Arc::new(name.finish()),
            Arc::new(precursor_mz.finish()),
            Arc::new(ion_mode.finish()),
            Arc::new(adduct.finish()),
            Arc::new(class.finish()),
            Arc::new(category.finish()),
            Arc::new(num_chain.finish()),
            Arc::new(confidence.finish()),
        ];
        for (mut chains, mut chain_confidence) in ranks {
            arrays.push(Arc::new(chains.finish()));
            arrays.push(Arc::new(chain_confidence.finish()));
        }

        let batch = RecordBatch::try_new(self.schema.clone(), arrays)?;
        self.writer.write(&batch)?;
        self.rows_written += n;
        Ok(())
    }

    /// Flush buffered rows and finalize the file
    pub fn finish(self) -> Result<ParquetWriterStats, OutputError> {
        let metadata = self.writer.close()?;
        Ok(ParquetWriterStats {
            rows_written: self.rows_written,
            row_groups_written: metadata.row_groups.len(),
        })
    }
}

/// Statistics from a completed Parquet write
#[derive(Debug, Clone)]
pub struct ParquetWriterStats {
    /// Records written
    pub rows_written: usize,
    /// Row groups in the file
    pub row_groups_written: usize,
}

impl std::fmt::Display for ParquetWriterStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Wrote {} annotation rows in {} row groups",
            self.rows_written, self.row_groups_written
        )
    }
}
