//! # Output Artifacts
//!
//! A run writes its tables into one directory:
//!
//! ```text
//! out/
//! ├── matched.csv              # library matches
//! ├── dark.csv                 # features without an accepted match
//! ├── adduct_predictions.csv   # per-stage prediction tables
//! ├── class_predictions.csv
//! ├── chain_predictions.csv
//! ├── annotations.csv          # final AnnotationRecord table
//! ├── annotations.parquet      # same columns, with `parquet_output`
//! ├── failures.csv             # row failures of any stage
//! ├── ingestion_errors.csv     # rejected input rows
//! ├── formulas.csv             # formula branch, when it ran
//! └── summary.json
//! ```
//!
//! Tables are written with `csv` + `serde`; rows are flat structs so every
//! column is a scalar.

mod error;
#[cfg(feature = "parquet_output")]
mod columnar;

#[cfg(test)]
mod tests;

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::Serialize;

use crate::annotate::AnnotationRecord;
use crate::chain::CHAIN_RANKS;
use crate::chemistry::Category;
use crate::feature::{IngestError, IonMode};
use crate::pipeline::{AnnotationReport, FormulaReport, RunSummary, SearchReport};

pub use error::OutputError;
#[cfg(feature = "parquet_output")]
pub use columnar::{AnnotationParquetWriter, ParquetWriterConfig, ParquetWriterStats};

/// Flat row of the final annotation table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnotationRow {
    /// Feature key
    pub index: String,
    /// Lipid name
    pub name: Option<String>,
    /// Precursor m/z
    pub precursor_mz: f64,
    /// Ion mode
    pub ion_mode: IonMode,
    /// Adduct token
    pub adduct: Option<String>,
    /// Class abbreviation
    pub class: Option<String>,
    /// Class category
    pub category: Option<Category>,
    /// Chain slots
    pub num_chain: Option<usize>,
    /// Merged confidence
    pub pred_confidence: Option<f64>,
    /// Rank-1 composition
    pub chain_rank1: Option<String>,
    /// Rank-1 confidence
    pub chain_rank1_confidence: Option<f64>,
    /// Rank-2 composition
    pub chain_rank2: Option<String>,
    /// Rank-2 confidence
    pub chain_rank2_confidence: Option<f64>,
    /// Rank-3 composition
    pub chain_rank3: Option<String>,
    /// Rank-3 confidence
    pub chain_rank3_confidence: Option<f64>,
}

impl From<&AnnotationRecord> for AnnotationRow {
    fn from(record: &AnnotationRecord) -> Self {
        let rank = |i: usize| record.chain_rank(i);
        let composition = |i: usize| rank(i).map(|r| r.composition.notation());
        let confidence = |i: usize| rank(i).and_then(|r| r.confidence);
        Self {
            index: record.feature_id.clone(),
            name: record.name.clone(),
            precursor_mz: record.precursor_mz,
            ion_mode: record.ion_mode,
            adduct: record.adduct.clone(),
            class: record.class.clone(),
            category: record.category,
            num_chain: record.num_chain,
            pred_confidence: record.pred_confidence,
            chain_rank1: composition(1),
            chain_rank1_confidence: confidence(1),
            chain_rank2: composition(2),
            chain_rank2_confidence: confidence(2),
            chain_rank3: composition(3),
            chain_rank3_confidence: confidence(3),
        }
    }
}

/// Chain stage row: ranked compositions of one feature
#[derive(Debug, Clone, PartialEq, Serialize)]
struct ChainRow {
    index: String,
    class: String,
    rank: usize,
    chains: String,
    confidence: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
struct IngestionRow {
    index: Option<String>,
    kind: &'static str,
    message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
struct FormulaRow<'a> {
    index: &'a str,
    rank: usize,
    formula: &'a str,
    score: f64,
    mass_error_ppm: Option<f64>,
    satisfies_constraint: bool,
    predicted: bool,
}

/// Serialize `rows` as CSV into `writer`; returns the row count
pub fn write_csv<W, T, I>(writer: W, rows: I) -> Result<usize, OutputError>
where
    W: Write,
    T: Serialize,
    I: IntoIterator<Item = T>,
{
    let mut csv_writer = csv::Writer::from_writer(writer);
    let mut count = 0;
    for row in rows {
        csv_writer.serialize(row)?;
        count += 1;
    }
    csv_writer.flush()?;
    Ok(count)
}

/// Statistics from writing an output directory
#[derive(Debug, Clone, Default)]
pub struct OutputStats {
    /// Files written
    pub files_written: usize,
    /// Data rows over all tables
    pub rows_written: usize,
}

impl std::fmt::Display for OutputStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Wrote {} rows to {} files", self.rows_written, self.files_written)
    }
}

/// Output directory of one run
pub struct OutputDir {
    root: PathBuf,
    stats: OutputStats,
}

impl OutputDir {
    /// Create `root` (and parents) if missing
    pub fn create<P: AsRef<Path>>(root: P) -> Result<Self, OutputError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self {
            root,
            stats: OutputStats::default(),
        })
    }

    /// Path of a file inside the directory
    pub fn path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    fn table<T, I>(&mut self, name: &str, rows: I) -> Result<usize, OutputError>
    where
        T: Serialize,
        I: IntoIterator<Item = T>,
    {
        let file = BufWriter::new(File::create(self.path(name))?);
        let count = write_csv(file, rows)?;
        debug!("Wrote {count} rows to {name}");
        self.stats.files_written += 1;
        self.stats.rows_written += count;
        Ok(count)
    }

    /// Search, prediction, final and failure tables of an annotation run
    pub fn write_annotation(&mut self, report: &AnnotationReport) -> Result<(), OutputError> {
        self.table("matched.csv", &report.search.matched)?;
        self.table("dark.csv", &report.search.unmatched)?;
        self.table("adduct_predictions.csv", &report.prediction.adducts)?;
        self.table("class_predictions.csv", &report.prediction.classes)?;
        self.table("chain_predictions.csv", chain_rows(&report.prediction.records))?;
        self.write_records(&report.records)?;
        self.table("failures.csv", report.failures())?;
        Ok(())
    }

    /// Search tables only
    pub fn write_search(&mut self, report: &SearchReport) -> Result<(), OutputError> {
        self.table("matched.csv", &report.matched)?;
        self.table("dark.csv", &report.unmatched)?;
        self.table("failures.csv", &report.failures)?;
        Ok(())
    }

    /// Final annotation table as CSV, plus Parquet when enabled
    pub fn write_records(&mut self, records: &[AnnotationRecord]) -> Result<(), OutputError> {
        self.table("annotations.csv", records.iter().map(AnnotationRow::from))?;

        #[cfg(feature = "parquet_output")]
        {
            let mut writer = AnnotationParquetWriter::new_file(
                self.path("annotations.parquet"),
                ParquetWriterConfig::default(),
            )?;
            writer.write_records(records)?;
            let stats = writer.finish()?;
            debug!("{stats}");
            self.stats.files_written += 1;
        }
        Ok(())
    }

    /// Rejected input rows
    pub fn write_ingestion_errors(&mut self, errors: &[IngestError]) -> Result<(), OutputError> {
        let rows = errors.iter().map(|e| IngestionRow {
            index: e.row_index().map(str::to_string),
            kind: e.kind(),
            message: e.to_string(),
        });
        self.table("ingestion_errors.csv", rows)?;
        Ok(())
    }

    /// Formula branch candidates, one row per ranked formula
    pub fn write_formulas(&mut self, report: &FormulaReport) -> Result<(), OutputError> {
        let rows = report.annotations.iter().flat_map(|annotation| {
            annotation.candidates.iter().map(move |c| FormulaRow {
                index: &annotation.feature_id,
                rank: c.rank,
                formula: &c.formula,
                score: c.score,
                mass_error_ppm: c.mass_error_ppm,
                satisfies_constraint: c.satisfies_constraint,
                predicted: annotation.predicted_formula.as_deref() == Some(c.formula.as_str()),
            })
        });
        self.table("formulas.csv", rows)?;
        self.table("formula_failures.csv", &report.failures)?;
        Ok(())
    }

    /// Run summary as pretty JSON
    pub fn write_summary(&mut self, summary: &RunSummary) -> Result<(), OutputError> {
        let file = BufWriter::new(File::create(self.path("summary.json"))?);
        serde_json::to_writer_pretty(file, summary)?;
        self.stats.files_written += 1;
        Ok(())
    }

    /// Finish and report what was written
    pub fn finish(self) -> OutputStats {
        info!("{} in {}", self.stats, self.root.display());
        self.stats
    }
}

fn chain_rows(records: &[AnnotationRecord]) -> impl Iterator<Item = ChainRow> + '_ {
    records.iter().flat_map(|record| {
        let class = record.class.clone().unwrap_or_default();
        record
            .chains
            .iter()
            .take(CHAIN_RANKS)
            .enumerate()
            .map(move |(i, ranked)| ChainRow {
                index: record.feature_id.clone(),
                class: class.clone(),
                rank: i + 1,
                chains: ranked.composition.notation(),
                confidence: ranked.confidence,
            })
    })
}
